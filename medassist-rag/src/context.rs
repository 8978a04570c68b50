//! Rendering retrieved chunks into a prompt context block.

/// Render retrieved texts as numbered source blocks separated by blank lines.
///
/// Accepts anything exposing its text, such as [`Document`](crate::Document)
/// or [`Chunk`](crate::Chunk). Numbering starts at 1. An empty slice yields an
/// empty string.
///
/// ```
/// use medassist_rag::{Document, format_context};
///
/// let docs = vec![Document::new("A"), Document::new("B")];
/// assert_eq!(format_context(&docs), "[Source 1]\nA\n\n[Source 2]\nB");
/// ```
pub fn format_context<T: AsRef<str>>(items: &[T]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("[Source {}]\n{}", i + 1, item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn empty_input_is_empty_string() {
        let none: [Document; 0] = [];
        assert_eq!(format_context(&none), "");
    }

    #[test]
    fn single_source() {
        assert_eq!(format_context(&[Document::new("only")]), "[Source 1]\nonly");
    }
}
