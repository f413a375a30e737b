//! Pure field-normalization helpers for raw work records.
//!
//! Everything here is side-effect free and idempotent: feeding an
//! already-canonical record through [`normalize_work`] again returns it
//! unchanged.

use std::collections::HashMap;

use crate::models::{RawWork, Work};

/// Casefold a title and collapse internal whitespace runs to single spaces.
///
/// `None` and all-whitespace input both map to `None`.
pub fn normalize_title(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    Some(lowered.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Trim and lowercase a DOI; empty input maps to `None`.
pub fn normalize_doi(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Strip the URL prefix from an identifier, keeping the final path segment.
///
/// Already-bare identifiers pass through unchanged, so
/// `extract_id(extract_id(x)) == extract_id(x)`.
pub fn extract_id(raw: &str) -> &str {
    match raw.rsplit_once('/') {
        Some((_, tail)) => tail,
        None => raw,
    }
}

/// Rebuild a plain-text abstract from the sparse word-to-positions index.
///
/// Returns `None` when the index yields no positions or the joined text is
/// empty. When two words claim the same position the one seen later in
/// iteration order wins; upstream data occasionally contains such collisions
/// and this mirrors how they have always been resolved.
pub fn reconstruct_abstract(inverted: &HashMap<String, Vec<usize>>) -> Option<String> {
    let max_pos = inverted.values().flatten().copied().max()?;
    let mut slots = vec![""; max_pos + 1];
    for (word, positions) in inverted {
        for &pos in positions {
            slots[pos] = word.as_str();
        }
    }
    let text = slots.join(" ").trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Convert a wire-shape record into its canonical form.
///
/// Identity fields are canonicalized, the abstract is rebuilt from the
/// inverted index, topic/field/domain display names are lifted out of the
/// nested classification and every referenced-work identifier is stripped to
/// its bare form. The raw inverted index and nested topic do not survive
/// into the output. Runs in one pass over the record.
pub fn normalize_work(raw: RawWork) -> Work {
    let RawWork {
        id,
        doi,
        title,
        abstract_text,
        abstract_inverted_index,
        referenced_works,
        primary_topic,
        topic,
        field,
        domain,
        publication_year,
        cited_by_count,
        cited_by_api_url,
        hop_layer,
        extra,
    } = raw;

    let abstract_text = match &abstract_inverted_index {
        Some(inverted) => reconstruct_abstract(inverted),
        // A record that already carries plain text keeps it.
        None => abstract_text.filter(|text| !text.trim().is_empty()),
    };

    let (topic, field, domain) = match primary_topic {
        Some(nested) => (
            nested.display_name,
            nested.field.and_then(|f| f.display_name),
            nested.domain.and_then(|d| d.display_name),
        ),
        // No nested classification: keep whatever flat names are present.
        None => (topic, field, domain),
    };

    Work {
        id: id
            .as_deref()
            .map(extract_id)
            .filter(|bare| !bare.is_empty())
            .map(str::to_owned),
        doi: normalize_doi(doi.as_deref()),
        title: normalize_title(title.as_deref()),
        abstract_text,
        referenced_works: referenced_works
            .iter()
            .filter(|r| !r.is_empty())
            .map(|r| extract_id(r).to_string())
            .collect(),
        topic,
        field,
        domain,
        publication_year,
        cited_by_count,
        cited_by_api_url,
        hop_layer,
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn title_trims_casefolds_and_collapses() {
        assert_eq!(
            normalize_title(Some("  The  QUICK\tbrown\n fox ")),
            Some("the quick brown fox".to_string())
        );
        assert_eq!(normalize_title(Some("")), None);
        assert_eq!(normalize_title(Some("   ")), None);
        assert_eq!(normalize_title(None), None);
    }

    #[test]
    fn title_normalization_is_idempotent() {
        let once = normalize_title(Some("  Graphs  AND   Citations "));
        let twice = normalize_title(once.as_deref());
        assert_eq!(once, twice);
    }

    #[test]
    fn doi_lowercases_and_trims() {
        assert_eq!(
            normalize_doi(Some(" 10.1234/ABC.DEF ")),
            Some("10.1234/abc.def".to_string())
        );
        assert_eq!(normalize_doi(Some("  ")), None);
        assert_eq!(normalize_doi(None), None);
    }

    #[test]
    fn extract_id_takes_final_segment() {
        assert_eq!(extract_id("https://openalex.org/W123"), "W123");
        assert_eq!(extract_id("W123"), "W123");
        assert_eq!(extract_id(extract_id("https://openalex.org/W123")), "W123");
    }

    #[test]
    fn abstract_reconstruction_orders_words() {
        let inverted: HashMap<String, Vec<usize>> =
            [("the".to_string(), vec![0, 2]), ("fox".to_string(), vec![1])]
                .into_iter()
                .collect();
        assert_eq!(reconstruct_abstract(&inverted), Some("the fox the".to_string()));
    }

    #[test]
    fn abstract_reconstruction_handles_empty_index() {
        let empty: HashMap<String, Vec<usize>> = HashMap::new();
        assert_eq!(reconstruct_abstract(&empty), None);

        let no_positions: HashMap<String, Vec<usize>> =
            [("orphan".to_string(), Vec::new())].into_iter().collect();
        assert_eq!(reconstruct_abstract(&no_positions), None);
    }

    #[test]
    fn abstract_reconstruction_keeps_position_gaps() {
        let inverted: HashMap<String, Vec<usize>> =
            [("start".to_string(), vec![0]), ("end".to_string(), vec![3])]
                .into_iter()
                .collect();
        // Unclaimed slots stay empty; the join preserves them as extra spaces.
        assert_eq!(reconstruct_abstract(&inverted), Some("start   end".to_string()));
    }

    #[test]
    fn normalize_work_produces_canonical_fields() {
        let raw: RawWork = serde_json::from_value(json!({
            "id": "https://openalex.org/W100",
            "doi": " 10.1000/XYZ ",
            "title": "  On   Citation GRAPHS ",
            "abstract_inverted_index": { "alpha": [0], "beta": [1] },
            "referenced_works": ["https://openalex.org/W1", "W2", ""],
            "primary_topic": {
                "display_name": "Graph Theory",
                "field": { "display_name": "Mathematics" },
                "domain": { "display_name": "Physical Sciences" }
            },
            "publication_year": 1999,
            "cited_by_count": 12
        }))
        .unwrap();

        let work = normalize_work(raw);
        assert_eq!(work.id.as_deref(), Some("W100"));
        assert_eq!(work.doi.as_deref(), Some("10.1000/xyz"));
        assert_eq!(work.title.as_deref(), Some("on citation graphs"));
        assert_eq!(work.abstract_text.as_deref(), Some("alpha beta"));
        assert_eq!(work.referenced_works, vec!["W1", "W2"]);
        assert_eq!(work.topic.as_deref(), Some("Graph Theory"));
        assert_eq!(work.field.as_deref(), Some("Mathematics"));
        assert_eq!(work.domain.as_deref(), Some("Physical Sciences"));
        assert_eq!(work.publication_year, Some(1999));
    }

    #[test]
    fn normalize_work_null_propagates_missing_topic() {
        let work = normalize_work(RawWork {
            id: Some("W7".to_string()),
            ..RawWork::default()
        });
        assert!(work.topic.is_none());
        assert!(work.field.is_none());
        assert!(work.domain.is_none());
    }

    #[test]
    fn normalization_round_trips_through_wire_shape() {
        let raw: RawWork = serde_json::from_value(json!({
            "id": "https://openalex.org/W100",
            "doi": "10.1000/XYZ",
            "title": " Some  Title ",
            "abstract_inverted_index": { "only": [0] },
            "referenced_works": ["https://openalex.org/W1"],
            "primary_topic": { "display_name": "Topic" },
            "publication_year": 2001,
            "language": "en"
        }))
        .unwrap();

        let once = normalize_work(raw);
        let wire = serde_json::to_value(&once).unwrap();
        let reparsed: RawWork = serde_json::from_value(wire).unwrap();
        let twice = normalize_work(reparsed);
        assert_eq!(once, twice);
    }
}
