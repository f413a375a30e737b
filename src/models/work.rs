//! Work records, in wire shape and in canonical form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A work as it arrives off the wire.
///
/// Every field is optional or defaulted: the remote service is not trusted to
/// be schema-stable, and callers request arbitrary field projections, so a
/// record may carry any subset of these. Unmodeled fields land in `extra` and
/// pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawWork {
    /// Work identifier, usually URL-shaped (`https://openalex.org/W123`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Plain-text abstract, if the record already carries one.
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,

    /// Sparse word-to-positions representation the API ships in place of the
    /// plain abstract text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_inverted_index: Option<HashMap<String, Vec<usize>>>,

    /// Identifiers of the works this record cites, usually URL-shaped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_works: Vec<String>,

    /// Nested topic classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_topic: Option<RawTopic>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cited_by_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cited_by_api_url: Option<String>,

    /// Hop at which the record entered the graph; stamped by the expander.
    #[serde(default)]
    pub hop_layer: u32,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Nested topic classification as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTopic {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub field: Option<DisplayName>,
    #[serde(default)]
    pub domain: Option<DisplayName>,
}

/// A `{ "display_name": ... }` wrapper object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayName {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A canonical work record.
///
/// Produced by [`crate::graph::normalize_work`]. The identity fields (`id`,
/// `doi`, `title`) are either `None` or already canonicalized, and the raw
/// inverted-index abstract and nested topic shapes never survive past
/// normalization. Serializing a `Work` and feeding it back through
/// [`RawWork`] and normalization yields the same `Work`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Work {
    /// Bare work identifier, stripped of the URL prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Lowercased, trimmed DOI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    /// Casefolded title with internal whitespace collapsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Reconstructed plain-text abstract.
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,

    /// Bare identifiers of the works this record cites.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_works: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cited_by_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cited_by_api_url: Option<String>,

    /// Hop at which the record was first admitted (0 for seed works).
    #[serde(default)]
    pub hop_layer: u32,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_work_deserializes_sparse_projection() {
        let raw: RawWork = serde_json::from_value(json!({
            "id": "https://openalex.org/W42",
            "title": "A Title",
            "cited_by_count": 7
        }))
        .unwrap();

        assert_eq!(raw.id.as_deref(), Some("https://openalex.org/W42"));
        assert_eq!(raw.cited_by_count, Some(7));
        assert!(raw.doi.is_none());
        assert!(raw.referenced_works.is_empty());
        assert_eq!(raw.hop_layer, 0);
    }

    #[test]
    fn unmodeled_fields_pass_through_extra() {
        let raw: RawWork = serde_json::from_value(json!({
            "id": "W1",
            "language": "en",
            "is_retracted": false
        }))
        .unwrap();

        assert_eq!(raw.extra.get("language"), Some(&json!("en")));
        assert_eq!(raw.extra.get("is_retracted"), Some(&json!(false)));

        let round = serde_json::to_value(&raw).unwrap();
        assert_eq!(round.get("language"), Some(&json!("en")));
    }

    #[test]
    fn raw_topic_tolerates_missing_levels() {
        let raw: RawWork = serde_json::from_value(json!({
            "primary_topic": { "display_name": "Topology" }
        }))
        .unwrap();

        let topic = raw.primary_topic.unwrap();
        assert_eq!(topic.display_name.as_deref(), Some("Topology"));
        assert!(topic.field.is_none());
        assert!(topic.domain.is_none());
    }
}
