//! Final answer rendering with a deduplicated source list.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::document::SourceMetadata;

const SOURCES_HEADER: &str = "**Fuentes Consultadas (Contexto Recuperado):**";
const NO_SOURCES_BULLET: &str = "- *No se recuperaron fuentes específicas del contexto.*";

/// Append the citation block to `answer`.
///
/// Sources are deduplicated on `(title, locator)` and listed in sorted
/// order, so the output depends only on the set of sources.
pub fn format_response(answer: &str, sources: &[SourceMetadata]) -> String {
    let unique: BTreeSet<(&str, &str)> =
        sources.iter().map(|s| (s.title.as_str(), s.source_locator.as_str())).collect();

    let mut out = format!("{answer}\n\n---\n{SOURCES_HEADER}\n");
    if unique.is_empty() {
        out.push_str(NO_SOURCES_BULLET);
        out.push('\n');
    }
    for (title, locator) in unique {
        let _ = writeln!(out, "- {title} (Archivo: {locator})");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_collapse_and_sort() {
        let sources = vec![
            SourceMetadata::new("Ley 10", "ley_10.pdf"),
            SourceMetadata::new("Decreto 5", "decreto_5.pdf"),
            SourceMetadata::new("Ley 10", "ley_10.pdf"),
        ];
        assert_eq!(
            format_response("Respuesta.", &sources),
            "Respuesta.\n\n---\n**Fuentes Consultadas (Contexto Recuperado):**\n\
             - Decreto 5 (Archivo: decreto_5.pdf)\n\
             - Ley 10 (Archivo: ley_10.pdf)\n"
        );
    }

    #[test]
    fn no_sources_uses_placeholder_bullet() {
        assert_eq!(
            format_response("Nada.", &[]),
            "Nada.\n\n---\n**Fuentes Consultadas (Contexto Recuperado):**\n\
             - *No se recuperaron fuentes específicas del contexto.*\n"
        );
    }

    #[test]
    fn same_title_different_locator_are_distinct() {
        let sources = vec![
            SourceMetadata::new("Decreto 5", "a.pdf"),
            SourceMetadata::new("Decreto 5", "b.pdf"),
        ];
        assert_eq!(format_response("x", &sources).matches("- Decreto 5").count(), 2);
    }

    #[test]
    fn formatting_is_deterministic() {
        let sources = vec![SourceMetadata::new("B", "b"), SourceMetadata::new("A", "a")];
        let reversed: Vec<SourceMetadata> = sources.iter().rev().cloned().collect();
        assert_eq!(format_response("x", &sources), format_response("x", &reversed));
    }
}
