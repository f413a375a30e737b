//! Identity-key deduplication of work records.

use std::collections::HashSet;

use crate::graph::normalize::normalize_work;
use crate::models::{RawWork, Work};

/// Registry of previously seen identity keys plus the records kept so far.
///
/// A record is a duplicate when it shares any single non-null identity key
/// (bare work ID, DOI or normalized title) with an earlier admission; one
/// shared signal is enough to merge two payloads into one logical work, which
/// tolerates inconsistent metadata across API pages. The first-seen record
/// wins. One `Deduper` covers one graph-build session; its key sets only
/// grow and nothing persists across sessions.
#[derive(Debug, Default)]
pub struct Deduper {
    seen_ids: HashSet<String>,
    seen_dois: HashSet<String>,
    seen_titles: HashSet<String>,
    kept: Vec<Work>,
}

impl Deduper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a raw record, stamp its hop and keep it if no identity key
    /// has been seen before. Returns whether the record was admitted.
    pub fn admit(&mut self, mut raw: RawWork, hop: u32) -> bool {
        raw.hop_layer = hop;
        self.admit_work(normalize_work(raw))
    }

    /// Admit an already-canonical record under the same identity rules.
    ///
    /// Used when reseeding an expansion from previously collected works.
    pub fn admit_work(&mut self, work: Work) -> bool {
        let duplicate = work
            .id
            .as_ref()
            .is_some_and(|id| self.seen_ids.contains(id))
            || work
                .doi
                .as_ref()
                .is_some_and(|doi| self.seen_dois.contains(doi))
            || work
                .title
                .as_ref()
                .is_some_and(|title| self.seen_titles.contains(title));
        if duplicate {
            return false;
        }

        if let Some(id) = &work.id {
            self.seen_ids.insert(id.clone());
        }
        if let Some(doi) = &work.doi {
            self.seen_dois.insert(doi.clone());
        }
        if let Some(title) = &work.title {
            self.seen_titles.insert(title.clone());
        }
        self.kept.push(work);
        true
    }

    /// Records admitted so far, in admission order.
    pub fn kept(&self) -> &[Work] {
        &self.kept
    }

    /// Consume the deduper, returning the admitted records.
    pub fn into_kept(self) -> Vec<Work> {
        self.kept
    }

    pub fn len(&self) -> usize {
        self.kept.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: Option<&str>, doi: Option<&str>, title: Option<&str>) -> RawWork {
        RawWork {
            id: id.map(str::to_owned),
            doi: doi.map(str::to_owned),
            title: title.map(str::to_owned),
            ..RawWork::default()
        }
    }

    #[test]
    fn rejects_repeat_of_any_identity_key() {
        let mut dedup = Deduper::new();
        assert!(dedup.admit(raw(Some("W1"), Some("10.1/a"), Some("First Paper")), 0));

        // Same ID, everything else different.
        assert!(!dedup.admit(raw(Some("W1"), Some("10.1/b"), Some("Other")), 0));
        // Same DOI under a different ID.
        assert!(!dedup.admit(raw(Some("W2"), Some("10.1/A"), Some("Another")), 0));
        // Same normalized title under fresh ID and DOI.
        assert!(!dedup.admit(raw(Some("W3"), Some("10.1/c"), Some("  first   PAPER ")), 0));

        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn first_seen_record_wins() {
        let mut dedup = Deduper::new();
        let mut first = raw(Some("W1"), None, Some("Shared Title"));
        first.publication_year = Some(1990);
        let mut second = raw(Some("W2"), None, Some("Shared Title"));
        second.publication_year = Some(2020);

        assert!(dedup.admit(first, 0));
        assert!(!dedup.admit(second, 0));
        assert_eq!(dedup.kept()[0].publication_year, Some(1990));
    }

    #[test]
    fn all_null_identity_records_are_always_admitted() {
        let mut dedup = Deduper::new();
        assert!(dedup.admit(raw(None, None, None), 0));
        assert!(dedup.admit(raw(None, None, None), 1));
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn admission_stamps_hop_and_preserves_order() {
        let mut dedup = Deduper::new();
        dedup.admit(raw(Some("https://openalex.org/W1"), None, None), 0);
        dedup.admit(raw(Some("W2"), None, None), 3);

        let kept = dedup.kept();
        assert_eq!(kept[0].id.as_deref(), Some("W1"));
        assert_eq!(kept[0].hop_layer, 0);
        assert_eq!(kept[1].id.as_deref(), Some("W2"));
        assert_eq!(kept[1].hop_layer, 3);
    }

    #[test]
    fn url_and_bare_forms_of_one_id_collide() {
        let mut dedup = Deduper::new();
        assert!(dedup.admit(raw(Some("https://openalex.org/W9"), None, None), 0));
        assert!(!dedup.admit(raw(Some("W9"), None, None), 1));
    }

    #[test]
    fn reseeding_with_canonical_works_rejects_known_keys() {
        let mut dedup = Deduper::new();
        dedup.admit(raw(Some("W1"), None, None), 0);
        let kept = dedup.into_kept();

        let mut fresh = Deduper::new();
        for work in kept {
            assert!(fresh.admit_work(work));
        }
        assert!(!fresh.admit(raw(Some("W1"), None, None), 1));
    }
}
