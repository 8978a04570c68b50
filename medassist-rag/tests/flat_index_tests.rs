//! Property tests for flat index search ordering and persistence.

use std::collections::HashMap;

use medassist_rag::document::Chunk;
use medassist_rag::flat::{DistanceMetric, FlatIndex};
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

fn arb_metric() -> impl Strategy<Value = DistanceMetric> {
    prop_oneof![Just(DistanceMetric::L2), Just(DistanceMetric::Cosine)]
}

fn chunks_for(texts: &[String]) -> Vec<Chunk> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| Chunk {
            id: format!("c{i}"),
            text: text.clone(),
            metadata: HashMap::new(),
        })
        .collect()
}

mod prop_flat_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Results are at most `min(k, len)` long and ordered best first
        /// under the index's metric.
        #[test]
        fn results_ordered_and_bounded(
            vectors in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            k in 1usize..25,
            metric in arb_metric(),
        ) {
            let texts: Vec<String> = (0..vectors.len()).map(|i| format!("text {i}")).collect();
            let mut index = FlatIndex::new("test-model", DIM, metric);
            index.add(chunks_for(&texts), vectors.clone()).unwrap();

            let results = index.search(&query, k).unwrap();

            prop_assert_eq!(results.len(), k.min(vectors.len()));
            for window in results.windows(2) {
                if metric.higher_is_better() {
                    prop_assert!(window[0].score >= window[1].score);
                } else {
                    prop_assert!(window[0].score <= window[1].score);
                }
            }
        }

        /// Searching an entry's own vector returns that entry first under L2.
        #[test]
        fn own_vector_is_nearest(
            vectors in proptest::collection::vec(arb_normalized_embedding(DIM), 1..10),
            pick in any::<prop::sample::Index>(),
        ) {
            let texts: Vec<String> = (0..vectors.len()).map(|i| format!("text {i}")).collect();
            let mut index = FlatIndex::new("test-model", DIM, DistanceMetric::L2);
            index.add(chunks_for(&texts), vectors.clone()).unwrap();

            let target = pick.index(vectors.len());
            let best = &index.search(&vectors[target], 1).unwrap()[0];
            prop_assert!(best.score <= 1e-6);
        }

        /// Saving and loading preserves every search result.
        #[test]
        fn save_then_load_preserves_results(
            vectors in proptest::collection::vec(arb_normalized_embedding(DIM), 1..12),
            query in arb_normalized_embedding(DIM),
        ) {
            let dir = tempfile::tempdir().unwrap();
            let texts: Vec<String> = (0..vectors.len()).map(|i| format!("text {i}")).collect();
            let mut index = FlatIndex::new("test-model", DIM, DistanceMetric::L2);
            index.add(chunks_for(&texts), vectors.clone()).unwrap();

            index.save(dir.path()).unwrap();
            let loaded = FlatIndex::load(dir.path(), "test-model").unwrap();

            let before = index.search(&query, vectors.len()).unwrap();
            let after = loaded.search(&query, vectors.len()).unwrap();
            prop_assert_eq!(before.len(), after.len());
            for (b, a) in before.iter().zip(after.iter()) {
                prop_assert_eq!(&b.chunk, &a.chunk);
                prop_assert!((b.score - a.score).abs() < 1e-5);
            }
        }
    }
}
