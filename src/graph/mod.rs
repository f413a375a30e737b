//! Citation-graph construction: field normalization, identity-key
//! deduplication and breadth-first frontier expansion.

mod dedup;
mod expand;
mod normalize;

pub use dedup::Deduper;
pub use expand::{
    build_seed, expand, ExpandError, ExpandOptions, Expansion, SeedOptions, DEFAULT_SELECT,
};
pub use normalize::{
    extract_id, normalize_doi, normalize_title, normalize_work, reconstruct_abstract,
};
