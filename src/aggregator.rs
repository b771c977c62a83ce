//! Joins the stored identifiers with live YouTube metadata.
//!
//! Lookups run strictly one after another in store order. A failed lookup is
//! logged and the identifier is left out of the result; only a store failure
//! or an empty store stops the whole request.

use tracing::{debug, info, warn};

use crate::store::{IdentifierSource, StoreError};
use crate::youtube::{EnrichedVideo, LookupError, VideoLookup};

pub const EMPTY_CATALOG_MESSAGE: &str =
    "No videos found in database. Please seed the database first.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error while fetching videos";

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("No videos found in database. Please seed the database first.")]
    EmptyCatalog,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

/// Outcome of a single identifier's lookup, kept in store order.
pub type LookupOutcome = (String, Result<EnrichedVideo, LookupError>);

/// Runs one lookup per stored identifier and returns every outcome.
pub fn collect_outcomes(
    store: &dyn IdentifierSource,
    lookup: &dyn VideoLookup,
) -> Result<Vec<LookupOutcome>, AggregateError> {
    let identifiers = store.list_identifiers()?;
    info!("Found {} videos in database", identifiers.len());

    if identifiers.is_empty() {
        return Err(AggregateError::EmptyCatalog);
    }

    Ok(identifiers
        .into_iter()
        .map(|stored| {
            debug!(video_id = %stored.video_id, "fetching video details");
            let result = lookup.fetch_video(&stored.video_id);
            (stored.video_id, result)
        })
        .collect())
}

/// Builds the `/api/videos` payload: successes only, failures logged.
pub fn enrich_all(
    store: &dyn IdentifierSource,
    lookup: &dyn VideoLookup,
) -> Result<Vec<EnrichedVideo>, AggregateError> {
    let outcomes = collect_outcomes(store, lookup)?;
    let total = outcomes.len();

    let videos: Vec<EnrichedVideo> = outcomes
        .into_iter()
        .filter_map(|(video_id, result)| match result {
            Ok(video) => Some(video),
            Err(err) => {
                warn!(%video_id, error = %err, "failed to fetch video details");
                None
            }
        })
        .collect();

    info!(
        succeeded = videos.len(),
        failed = total - videos.len(),
        "enrichment finished"
    );
    Ok(videos)
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeLookup, FakeStore};
    use super::*;

    fn ids(videos: &[EnrichedVideo]) -> Vec<&str> {
        videos.iter().map(|video| video.video_id.as_str()).collect()
    }

    #[test]
    fn failures_are_omitted_and_order_kept() {
        let store = FakeStore::with_ids(&["a", "b", "c", "d", "e"]);
        let lookup = FakeLookup::failing(&["b", "d"]);

        let videos = enrich_all(&store, &lookup).unwrap();
        assert_eq!(ids(&videos), vec!["a", "c", "e"]);
        assert_eq!(lookup.calls(), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn all_failures_yield_empty_list() {
        let store = FakeStore::with_ids(&["a", "b"]);
        let lookup = FakeLookup::failing(&["a", "b"]);

        let videos = enrich_all(&store, &lookup).unwrap();
        assert!(videos.is_empty());
        assert_eq!(lookup.calls().len(), 2);
    }

    #[test]
    fn empty_store_is_empty_catalog_without_lookups() {
        let store = FakeStore::with_ids(&[]);
        let lookup = FakeLookup::default();

        let err = enrich_all(&store, &lookup).unwrap_err();
        assert!(matches!(err, AggregateError::EmptyCatalog));
        assert_eq!(err.to_string(), EMPTY_CATALOG_MESSAGE);
        assert!(lookup.calls().is_empty());
    }

    #[test]
    fn store_failure_skips_upstream() {
        let store = FakeStore::unreachable();
        let lookup = FakeLookup::default();

        let err = enrich_all(&store, &lookup).unwrap_err();
        assert!(matches!(err, AggregateError::Store(_)));
        assert!(lookup.calls().is_empty());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let store = FakeStore::with_ids(&["x", "y", "z"]);
        let lookup = FakeLookup::failing(&["y"]);

        let first = enrich_all(&store, &lookup).unwrap();
        let second = enrich_all(&store, &lookup).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn outcomes_pair_each_identifier_with_its_result() {
        let store = FakeStore::with_ids(&["ok", "bad"]);
        let lookup = FakeLookup::failing(&["bad"]);

        let outcomes = collect_outcomes(&store, &lookup).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].0, "ok");
        assert!(outcomes[0].1.is_ok());
        assert_eq!(outcomes[1].0, "bad");
        assert!(matches!(outcomes[1].1, Err(LookupError::NotFound(_))));
    }
}
