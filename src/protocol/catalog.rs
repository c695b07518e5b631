//! Static model catalog returned by `GET /api/tags`

use serde::Serialize;

/// Qualifier appended to every advertised model name
pub const LATEST_TAG: &str = ":latest";

/// Identifiers advertised to clients, in catalog order
pub const CATALOG_MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4.1-nano",
    "gpt-4.1-mini",
    "gpt-4.1",
    "gpt-3.5",
    "tts",
    "base64",
    "dall-e-3",
];

#[derive(Debug, Clone, Serialize)]
pub struct TagsResponse {
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelEntry {
    pub name: String,
    pub model: String,
    pub modified_at: &'static str,
    pub size: u64,
    pub digest: &'static str,
    pub details: ModelDetails,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelDetails {
    pub parent_model: &'static str,
    pub format: &'static str,
    pub family: String,
    pub families: Vec<String>,
    pub parameter_size: &'static str,
    pub quantization_level: &'static str,
}

impl ModelEntry {
    fn new(base: &str) -> Self {
        let tagged = with_latest_tag(base);
        Self {
            name: tagged.clone(),
            model: tagged,
            modified_at: "2025-01-01T00:00:00Z",
            size: 0,
            digest: "0000000000000000000000000000000000000000000000000000000000000000",
            details: ModelDetails {
                parent_model: "",
                format: "openai",
                family: base.to_string(),
                families: vec![base.to_string()],
                parameter_size: "unknown",
                quantization_level: "unknown",
            },
        }
    }
}

/// Append the `:latest` qualifier unless the name already has a tag
pub fn with_latest_tag(base: &str) -> String {
    if base.contains(':') {
        base.to_string()
    } else {
        format!("{}{}", base, LATEST_TAG)
    }
}

/// Build the catalog document
pub fn catalog() -> TagsResponse {
    TagsResponse {
        models: CATALOG_MODELS.iter().map(|m| ModelEntry::new(m)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_entry_is_tagged() {
        let doc = catalog();
        assert_eq!(doc.models.len(), CATALOG_MODELS.len());
        for entry in &doc.models {
            assert!(entry.name.ends_with(":latest"), "{}", entry.name);
            assert_eq!(entry.name, entry.model);
        }
    }

    #[test]
    fn test_family_is_base_identifier() {
        let doc = catalog();
        let dalle = doc
            .models
            .iter()
            .find(|m| m.name == "dall-e-3:latest")
            .expect("dall-e-3 advertised");
        assert_eq!(dalle.details.family, "dall-e-3");
        assert_eq!(dalle.details.families, vec!["dall-e-3".to_string()]);
    }

    #[test]
    fn test_with_latest_tag_keeps_existing_tag() {
        assert_eq!(with_latest_tag("tts"), "tts:latest");
        assert_eq!(with_latest_tag("tts:latest"), "tts:latest");
    }

    #[test]
    fn test_catalog_json_shape() {
        let json = serde_json::to_value(catalog()).unwrap();
        let first = &json["models"][0];
        assert_eq!(first["name"], "gpt-4o:latest");
        assert!(first["details"]["families"].is_array());
        assert!(first["size"].is_u64());
    }
}
