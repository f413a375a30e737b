//! Hop-by-hop frontier expansion of a citation graph.

use std::collections::HashSet;
use std::time::Duration;

use futures_util::stream::FuturesUnordered;
use futures_util::{pin_mut, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::info;

use crate::api::{ApiClient, ApiError, WorkFilter, WorksQuery};
use crate::config::Config;
use crate::graph::{extract_id, Deduper};
use crate::models::{RawWork, Work};

/// Default field projection for graph building.
pub const DEFAULT_SELECT: &str = "id,doi,title,publication_year,cited_by_count,cited_by_api_url";

/// Filters applied while streaming the hop-0 seed query.
#[derive(Debug, Clone)]
pub struct SeedOptions {
    /// Minimum citation count (exclusive); 0 disables the clause.
    pub min_citations: u32,
    /// Minimum publication year (exclusive).
    pub year_after: Option<i32>,
    /// Comma-separated field projection, or `None` for full records.
    pub select: Option<String>,
    pub per_page: usize,
    /// Suppress progress output.
    pub quiet: bool,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            min_citations: 20,
            year_after: Some(1920),
            select: Some(DEFAULT_SELECT.to_string()),
            per_page: 200,
            quiet: false,
        }
    }
}

impl From<&Config> for SeedOptions {
    fn from(config: &Config) -> Self {
        Self {
            min_citations: config.expand.min_citations,
            year_after: Some(config.expand.year_after),
            select: Some(config.expand.select.clone()),
            per_page: config.api.per_page,
            quiet: false,
        }
    }
}

/// Tuning for one expansion run.
#[derive(Debug, Clone)]
pub struct ExpandOptions {
    /// Citation hops to walk outward from the seed.
    pub hops: u32,
    /// Minimum citation count (exclusive) for citing works; 0 disables the
    /// clause.
    pub min_citations: u32,
    /// Minimum publication year (exclusive) for citing works.
    pub year_after: Option<i32>,
    /// Comma-separated field projection, or `None` for full records.
    pub select: Option<String>,
    /// Frontier IDs per citing-works request.
    pub chunk_size: usize,
    pub per_page: usize,
    /// Optional pause between hops to smooth request load.
    pub hop_delay: Duration,
    /// Suppress progress output.
    pub quiet: bool,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            hops: 1,
            min_citations: 20,
            year_after: Some(1920),
            select: Some(DEFAULT_SELECT.to_string()),
            chunk_size: 100,
            per_page: 200,
            hop_delay: Duration::ZERO,
            quiet: false,
        }
    }
}

impl From<&Config> for ExpandOptions {
    fn from(config: &Config) -> Self {
        Self {
            hops: config.expand.hops,
            min_citations: config.expand.min_citations,
            year_after: Some(config.expand.year_after),
            select: Some(config.expand.select.clone()),
            chunk_size: config.expand.chunk_size,
            per_page: config.api.per_page,
            hop_delay: Duration::from_secs_f64(config.expand.hop_delay_secs.max(0.0)),
            quiet: false,
        }
    }
}

/// Result of one expansion run: the full deduplicated record set plus the
/// records first admitted at each hop, in hop order.
#[derive(Debug, Default)]
pub struct Expansion {
    pub works: Vec<Work>,
    pub layers: Vec<Vec<Work>>,
}

/// An expansion aborted by a fetch failure.
///
/// Carries everything collected before the failing hop so a caller can
/// reseed a fresh run from the partial layers instead of starting over.
/// Partial results from the failing hop itself are discarded, never merged.
#[derive(Debug, Error)]
#[error("expansion aborted at hop {hop} after collecting {collected} works")]
pub struct ExpandError {
    /// The hop whose fetch failed.
    pub hop: u32,
    /// Works collected across the seed and all completed hops.
    pub collected: usize,
    /// The seed and every completed layer.
    pub partial: Expansion,
    #[source]
    pub source: ApiError,
}

/// Build a deduplicated hop-0 seed set from a search query.
pub async fn build_seed(
    client: &ApiClient,
    search: &str,
    opts: &SeedOptions,
) -> Result<Vec<Work>, ApiError> {
    let mut filter = WorkFilter::new();
    if opts.min_citations > 0 {
        filter = filter.min_citations(opts.min_citations);
    }
    if let Some(year) = opts.year_after {
        filter = filter.year_after(year);
    }
    let query = WorksQuery::default()
        .search(search)
        .filter(filter)
        .select(opts.select.as_deref())
        .per_page(opts.per_page);

    let bar = spinner("building seed", opts.quiet);
    let mut dedup = Deduper::new();
    let mut fetched = 0usize;
    {
        let stream = client.stream_works(&query);
        pin_mut!(stream);
        while let Some(raw) = stream.next().await {
            dedup.admit(raw?, 0);
            fetched += 1;
            bar.inc(1);
        }
    }
    bar.finish_and_clear();

    info!("seed: kept {} of {} fetched works", dedup.len(), fetched);
    Ok(dedup.into_kept())
}

/// Expand a seed set outward by `opts.hops` citation hops.
///
/// Each hop fetches every work citing the current frontier in bounded
/// concurrent chunks, admits the previously unseen records as that hop's
/// layer and recomputes the frontier from the freshly admitted IDs minus
/// everything already seen, so no node is ever expanded twice. Expansion
/// stops early once a hop admits nothing new.
///
/// Dropping the returned future cancels all outstanding requests for the
/// current hop.
pub async fn expand(
    client: &ApiClient,
    seed: Vec<Work>,
    opts: &ExpandOptions,
) -> Result<Expansion, ExpandError> {
    let mut dedup = Deduper::new();
    for mut work in seed {
        work.hop_layer = 0;
        dedup.admit_work(work);
    }

    let mut seen_ids: HashSet<String> = dedup
        .kept()
        .iter()
        .filter_map(|work| work.id.clone())
        .collect();
    // Sorted frontiers keep chunk composition reproducible across runs.
    let mut frontier: Vec<String> = seen_ids.iter().cloned().collect();
    frontier.sort_unstable();
    let mut layers: Vec<Vec<Work>> = Vec::new();

    for hop in 1..=opts.hops {
        if frontier.is_empty() {
            break;
        }
        info!("hop {hop}: expanding a frontier of {} works", frontier.len());

        let citing = match collect_citing(client, &frontier, opts).await {
            Ok(works) => works,
            Err(source) => {
                let collected = dedup.len();
                return Err(ExpandError {
                    hop,
                    collected,
                    partial: Expansion {
                        works: dedup.into_kept(),
                        layers,
                    },
                    source,
                });
            }
        };
        info!("hop {hop}: fetched {} citing works (raw)", citing.len());

        let mut layer = Vec::new();
        for raw in citing {
            if dedup.admit(raw, hop) {
                if let Some(admitted) = dedup.kept().last() {
                    layer.push(admitted.clone());
                }
            }
        }

        let new_ids: HashSet<String> =
            layer.iter().filter_map(|work| work.id.clone()).collect();
        frontier = new_ids.difference(&seen_ids).cloned().collect();
        frontier.sort_unstable();
        seen_ids.extend(new_ids);

        info!("hop {hop}: {} new works, {} total", layer.len(), dedup.len());
        layers.push(layer);

        if frontier.is_empty() {
            info!("no new frontier to expand");
            break;
        }
        if opts.hop_delay > Duration::ZERO && hop < opts.hops {
            tokio::time::sleep(opts.hop_delay).await;
        }
    }

    Ok(Expansion {
        works: dedup.into_kept(),
        layers,
    })
}

/// Fetch all works citing any ID in the frontier, one concurrent request per
/// fixed-size ID chunk.
///
/// Chunks complete in any order; the hop's result is the union of every
/// completion and nothing is surfaced until all chunks are in. The first
/// failure aborts the hop and drops the remaining in-flight chunks.
async fn collect_citing(
    client: &ApiClient,
    frontier: &[String],
    opts: &ExpandOptions,
) -> Result<Vec<RawWork>, ApiError> {
    let chunks: Vec<&[String]> = frontier.chunks(opts.chunk_size.max(1)).collect();
    let bar = chunk_bar(chunks.len(), opts.quiet);

    let mut tasks: FuturesUnordered<_> = chunks
        .into_iter()
        .map(|chunk| fetch_citing_chunk(client, chunk, opts))
        .collect();

    let mut citing = Vec::new();
    while let Some(result) = tasks.next().await {
        citing.extend(result?);
        bar.inc(1);
    }
    bar.finish_and_clear();
    Ok(citing)
}

/// Fetch every work citing any ID in one frontier chunk, paginating through
/// the full result set.
async fn fetch_citing_chunk(
    client: &ApiClient,
    chunk: &[String],
    opts: &ExpandOptions,
) -> Result<Vec<RawWork>, ApiError> {
    let mut filter = WorkFilter::new().cites(chunk.iter().map(|id| extract_id(id).to_string()));
    if opts.min_citations > 0 {
        filter = filter.min_citations(opts.min_citations);
    }
    if let Some(year) = opts.year_after {
        filter = filter.year_after(year);
    }
    let query = WorksQuery::default()
        .filter(filter)
        .select(opts.select.as_deref())
        .per_page(opts.per_page);

    let mut works = Vec::new();
    let stream = client.stream_works(&query);
    pin_mut!(stream);
    while let Some(raw) = stream.next().await {
        works.push(raw?);
    }
    Ok(works)
}

fn spinner(message: &'static str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}: {pos} works").unwrap(),
    );
    bar.set_message(message);
    bar
}

fn chunk_bar(chunks: usize, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(chunks as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} collecting citing works {wide_bar} {pos}/{len}")
            .unwrap(),
    );
    bar
}
