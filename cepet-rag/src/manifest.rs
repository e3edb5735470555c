//! Ingestion manifest parsing and validation.
//!
//! The manifest is a JSON array with one object per source document. Keys
//! use the corpus' Spanish names (`titulo`, `fecha`, `tipo`, `emisor`,
//! `categorias`, `temas`, `archivo`); English aliases are accepted too.
//! Every field is required. A single malformed entry rejects the whole
//! manifest, naming the offending entry.

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::document::SourceDocumentSpec;
use crate::error::{RagError, Result};

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(alias = "title")]
    titulo: Option<String>,
    #[serde(alias = "date")]
    fecha: Option<String>,
    #[serde(alias = "type")]
    tipo: Option<String>,
    #[serde(alias = "issuer")]
    emisor: Option<String>,
    #[serde(alias = "categories")]
    categorias: Option<Vec<String>>,
    #[serde(alias = "themes")]
    temas: Option<Vec<String>>,
    #[serde(alias = "file")]
    archivo: Option<String>,
}

/// Parse and validate a manifest document.
pub fn parse_manifest(json: &str) -> Result<Vec<SourceDocumentSpec>> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| RagError::DataIntegrityError(format!("manifest is not a JSON array: {e}")))?;

    entries
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let label = entry_label(index, &value);
            let raw: RawEntry = serde_json::from_value(value)
                .map_err(|e| RagError::DataIntegrityError(format!("{label}: {e}")))?;
            validate(raw)
                .map_err(|problem| RagError::DataIntegrityError(format!("{label}: {problem}")))
        })
        .collect()
}

/// Read and validate the manifest file at `path`.
pub async fn load_manifest(path: impl AsRef<Path>) -> Result<Vec<SourceDocumentSpec>> {
    let path = path.as_ref();
    let json = tokio::fs::read_to_string(path).await.map_err(|e| RagError::LoadError {
        locator: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_manifest(&json)
}

fn entry_label(index: usize, value: &serde_json::Value) -> String {
    let title = ["titulo", "title"]
        .iter()
        .find_map(|key| value.get(key).and_then(|t| t.as_str()))
        .filter(|t| !t.trim().is_empty());
    match title {
        Some(title) => format!("manifest entry {index} ('{title}')"),
        None => format!("manifest entry {index}"),
    }
}

fn required(field: &str, value: Option<String>) -> std::result::Result<String, String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("missing required field '{field}'"))
}

fn names(field: &str, value: Option<Vec<String>>) -> std::result::Result<Vec<String>, String> {
    let values = value.ok_or_else(|| format!("missing required field '{field}'"))?;
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for name in values {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(format!("'{field}' contains an empty name"));
        }
        if !out.contains(&name) {
            out.push(name);
        }
    }
    Ok(out)
}

fn validate(raw: RawEntry) -> std::result::Result<SourceDocumentSpec, String> {
    let date = required("fecha", raw.fecha)?;
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| format!("'fecha' must be YYYY-MM-DD, got '{date}'"))?;

    Ok(SourceDocumentSpec {
        title: required("titulo", raw.titulo)?,
        date,
        type_name: required("tipo", raw.tipo)?,
        issuer_name: required("emisor", raw.emisor)?,
        categories: names("categorias", raw.categorias)?,
        themes: names("temas", raw.temas)?,
        locator: required("archivo", raw.archivo)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"[
        {
            "titulo": "Decreto 5",
            "fecha": "2021-03-15",
            "tipo": "Decreto",
            "emisor": "Ministerio de Educación",
            "categorias": ["Educación", "Educación"],
            "temas": ["CEPET", "Formación técnica"],
            "archivo": "docs/decreto_5.txt"
        },
        {
            "title": "Ley 10",
            "date": "2019-01-02",
            "type": "Ley",
            "issuer": "Congreso Nacional",
            "categories": [],
            "themes": ["Becas"],
            "file": "docs/ley_10.txt"
        }
    ]"#;

    #[test]
    fn parses_spanish_and_english_keys() {
        let specs = parse_manifest(MANIFEST).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].issuer_name, "Ministerio de Educación");
        assert_eq!(specs[0].date, NaiveDate::from_ymd_opt(2021, 3, 15).unwrap());
        assert_eq!(specs[1].locator, "docs/ley_10.txt");
        assert!(specs[1].categories.is_empty());
    }

    #[test]
    fn duplicate_names_collapse() {
        let specs = parse_manifest(MANIFEST).unwrap();
        assert_eq!(specs[0].categories, vec!["Educación".to_string()]);
    }

    #[test]
    fn missing_field_names_the_entry() {
        let json = r#"[{"titulo": "Resolución 7", "fecha": "2020-01-01", "tipo": "Resolución",
                        "categorias": [], "temas": [], "archivo": "docs/r7.txt"}]"#;
        let err = parse_manifest(json).unwrap_err().to_string();
        assert!(err.contains("Resolución 7"), "{err}");
        assert!(err.contains("emisor"), "{err}");
    }

    #[test]
    fn missing_title_falls_back_to_index() {
        let json = r#"[{"fecha": "2020-01-01"}]"#;
        let err = parse_manifest(json).unwrap_err().to_string();
        assert!(err.contains("manifest entry 0"), "{err}");
    }

    #[test]
    fn bad_date_is_rejected() {
        let json = r#"[{"titulo": "X", "fecha": "15/03/2021", "tipo": "Ley", "emisor": "E",
                        "categorias": [], "temas": [], "archivo": "x.txt"}]"#;
        assert!(matches!(parse_manifest(json), Err(RagError::DataIntegrityError(_))));
    }

    #[test]
    fn non_array_is_rejected() {
        assert!(parse_manifest(r#"{"titulo": "X"}"#).is_err());
    }
}
