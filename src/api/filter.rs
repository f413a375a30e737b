//! Typed composition of works-API filter predicates.

use crate::api::ApiError;

/// Builder for the comma-separated `filter` query parameter.
///
/// Clauses render in a fixed order as `field:value` pairs, e.g.
/// `cites:W1|W2,cited_by_count:>20,publication_year:>1920`. Rendering
/// validates every identifier before a request is issued, since a stray
/// delimiter inside a value would silently corrupt the whole predicate.
#[derive(Debug, Clone, Default)]
pub struct WorkFilter {
    cites: Vec<String>,
    ids: Vec<String>,
    min_citations: Option<u32>,
    year_after: Option<i32>,
}

impl WorkFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to works citing any of the given bare work IDs.
    pub fn cites<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cites.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Restrict to the given bare work IDs themselves.
    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Keep only works cited more than `n` times.
    pub fn min_citations(mut self, n: u32) -> Self {
        self.min_citations = Some(n);
        self
    }

    /// Keep only works published strictly after `year`.
    pub fn year_after(mut self, year: i32) -> Self {
        self.year_after = Some(year);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.cites.is_empty()
            && self.ids.is_empty()
            && self.min_citations.is_none()
            && self.year_after.is_none()
    }

    /// Render the filter string, rejecting values that would corrupt the
    /// delimited composition.
    pub fn render(&self) -> Result<String, ApiError> {
        let mut clauses = Vec::new();
        if !self.cites.is_empty() {
            clauses.push(format!("cites:{}", join_ids(&self.cites)?));
        }
        if !self.ids.is_empty() {
            clauses.push(format!("ids.openalex:{}", join_ids(&self.ids)?));
        }
        if let Some(n) = self.min_citations {
            clauses.push(format!("cited_by_count:>{n}"));
        }
        if let Some(year) = self.year_after {
            clauses.push(format!("publication_year:>{year}"));
        }
        Ok(clauses.join(","))
    }
}

fn join_ids(ids: &[String]) -> Result<String, ApiError> {
    for id in ids {
        if id.is_empty() || id.contains([',', ':', '|']) {
            return Err(ApiError::InvalidRequest(format!(
                "work ID {id:?} cannot appear in a filter clause"
            )));
        }
    }
    Ok(ids.join("|"))
}
