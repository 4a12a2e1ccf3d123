//! Request-level orchestration of circuit searches

use crate::cancel::CancelToken;
use crate::circuit::{CircuitSearcher, FailureReason, SearchResult, SearchStatus};
use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::limits::validate_origins;
use crate::locate::LabelLocator;
use crate::store::NodeStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// A circuit search request: a label and the origins it was seen from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitRequest {
    pub label: char,
    pub origin_addresses: Vec<String>,
}

impl CircuitRequest {
    pub fn new(label: char, origin_addresses: Vec<String>) -> Self {
        Self {
            label,
            origin_addresses,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_origins(&self.origin_addresses)?;
        Ok(())
    }
}

/// Entry point: resolves label nodes for a request and searches each
pub struct CircuitEngine<S: NodeStore> {
    store: S,
    config: SearchConfig,
}

impl<S: NodeStore> CircuitEngine<S> {
    pub fn new(store: S, config: SearchConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run a request with the configured seed
    pub async fn run(&self, request: &CircuitRequest, cancel: &CancelToken) -> Result<SearchResult> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.run_with_rng(request, cancel, &mut rng).await
    }

    /// Run a request with a caller-supplied RNG
    ///
    /// The configured timeout applies here too. Returns `Err` only for
    /// invalid input or configuration. Search outcomes, including store
    /// outages and cancellation, are reported in the [`SearchResult`].
    pub async fn run_with_rng<R>(
        &self,
        request: &CircuitRequest,
        cancel: &CancelToken,
        rng: &mut R,
    ) -> Result<SearchResult>
    where
        R: Rng + Send + ?Sized,
    {
        request.validate()?;
        self.config.validate()?;
        let first_origin = request.origin_addresses[0].as_str();
        let cancel = match self.config.timeout() {
            Some(timeout) => cancel.clone().with_timeout(timeout),
            None => cancel.clone(),
        };

        tracing::info!(
            "Searching label '{}' from {} origin(s)",
            request.label,
            request.origin_addresses.len()
        );

        let locator = LabelLocator::new(&self.store, &cancel);
        let mut candidates = match locator.gather(&request.origin_addresses, request.label).await {
            Ok(candidates) => candidates,
            Err(Error::Cancelled) => {
                return Ok(SearchResult::without_label_node(first_origin, SearchStatus::Cancelled))
            }
            Err(e) => {
                tracing::warn!("Label lookup for '{}' failed: {}", request.label, e);
                let mut result = SearchResult::without_label_node(first_origin, SearchStatus::Failed);
                result.failure_reason = Some(FailureReason::Unavailable {
                    message: e.to_string(),
                });
                return Ok(result);
            }
        };

        if candidates.is_empty() {
            tracing::info!("No label node for '{}'", request.label);
            return Ok(SearchResult::without_label_node(first_origin, SearchStatus::Failed));
        }

        // Stable, so equal counts keep first-seen order
        candidates.sort_by(|a, b| b.count.cmp(&a.count));

        let searcher = CircuitSearcher::new(&self.store, &self.config, &cancel);
        let mut best: Option<SearchResult> = None;

        for candidate in &candidates {
            let tries = self.config.tries.unwrap_or(candidate.count);
            if candidate.registered() {
                tracing::debug!("{} has no edge from any origin, using the registry", candidate.address);
            }
            let result = searcher
                .search(candidate.origin(), &candidate.address, tries, rng)
                .await;

            match result.status {
                SearchStatus::Succeeded | SearchStatus::Cancelled => return Ok(result),
                SearchStatus::Failed => {
                    if matches!(result.failure_reason, Some(FailureReason::Unavailable { .. })) {
                        return Ok(result);
                    }
                    if best.as_ref().map_or(true, |b| result.tries_used > b.tries_used) {
                        best = Some(result);
                    }
                }
            }
        }

        Ok(best.unwrap_or_else(|| SearchResult::without_label_node(first_origin, SearchStatus::Failed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Direction;
    use crate::selector::SelectionPolicy;
    use crate::testing::{edge, FixtureStore};
    use std::time::Duration;

    use Direction::{Down, Forward, Up};

    fn scenario_a() -> FixtureStore {
        FixtureStore::new()
            .node("O", vec![edge(Forward, 'x', 1.0, "D"), edge(Up, 'a', 1.0, "B")])
            .node("D", vec![edge(Up, 'b', 1.0, "B"), edge(Forward, 'c', 1.0, "O")])
            .node("B", vec![edge(Down, 'd', 1.0, "D")])
    }

    fn request(label: char, origins: &[&str]) -> CircuitRequest {
        CircuitRequest::new(label, origins.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn test_request_scenario_a() {
        let engine = CircuitEngine::new(scenario_a(), SearchConfig::default().with_seed(9));

        let result = engine
            .run(&request('x', &["O"]), &CancelToken::new())
            .await
            .unwrap();

        assert!(result.succeeded());
        assert_eq!(result.label_node.as_deref(), Some("D"));
        assert_eq!(result.path, vec!["O", "D", "B", "D", "O"]);
    }

    #[test]
    fn test_request_wire_format() {
        let parsed: CircuitRequest =
            serde_json::from_str(r#"{"label":"x","originAddresses":["a","b"]}"#).unwrap();
        assert_eq!(parsed, request('x', &["a", "b"]));

        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["originAddresses"][1], "b");
    }

    #[tokio::test]
    async fn test_request_validation() {
        let engine = CircuitEngine::new(scenario_a(), SearchConfig::default());
        let err = engine
            .run(&request('x', &[]), &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_most_common_candidate_searched_first() {
        // Two origins point at L (which closes back through O2), one at M
        let store = FixtureStore::new()
            .node("O1", vec![edge(Forward, 'x', 1.0, "M")])
            .node("O2", vec![edge(Forward, 'x', 1.0, "L")])
            .node("O3", vec![edge(Forward, 'x', 1.0, "L")])
            .node("M", vec![])
            .node("L", vec![edge(Up, 'a', 1.0, "T")])
            .node("T", vec![edge(Down, 'b', 1.0, "O2")]);
        let config = SearchConfig::default().with_policy(SelectionPolicy::MaxWeight);
        let engine = CircuitEngine::new(store, config);

        let result = engine
            .run(&request('x', &["O1", "O2", "O3"]), &CancelToken::new())
            .await
            .unwrap();

        assert!(result.succeeded());
        assert_eq!(result.origin, "O2");
        assert_eq!(result.path, vec!["O2", "L", "T", "O2"]);
        assert_eq!(result.verify_steps, 1);
    }

    #[tokio::test]
    async fn test_reports_failure_with_most_tries() {
        let store = FixtureStore::new()
            .node("O1", vec![edge(Forward, 'x', 1.0, "M")])
            .node("O2", vec![edge(Forward, 'x', 1.0, "L")])
            .node("O3", vec![edge(Forward, 'x', 1.0, "L")])
            .node("M", vec![])
            .node("L", vec![]);
        let engine = CircuitEngine::new(store, SearchConfig::default());

        let result = engine
            .run(&request('x', &["O1", "O2", "O3"]), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(result.status, SearchStatus::Failed);
        assert_eq!(result.label_node.as_deref(), Some("L"));
        assert_eq!(result.tries_used, 3);
    }

    #[tokio::test]
    async fn test_configured_tries_override_count() {
        let store = FixtureStore::new()
            .node("O", vec![edge(Forward, 'x', 1.0, "L")])
            .node("L", vec![]);
        let engine = CircuitEngine::new(store, SearchConfig::default().with_tries(4));

        let result = engine
            .run(&request('x', &["O"]), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(result.tries_used, 5);
    }

    #[tokio::test]
    async fn test_cancelled_before_lookup() {
        let engine = CircuitEngine::new(scenario_a(), SearchConfig::default());
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = engine.run(&request('x', &["O"]), &cancel).await.unwrap();
        assert_eq!(result.status, SearchStatus::Cancelled);
        assert!(result.label_node.is_none());
    }

    #[tokio::test]
    async fn test_search_starts_from_linked_origin() {
        // O1 has no label edge and falls back to the registered R
        let store = FixtureStore::new()
            .node("O1", vec![])
            .node("O2", vec![edge(Forward, 'x', 1.0, "R")])
            .node("R", vec![edge(Up, 'a', 1.0, "T")])
            .node("T", vec![edge(Down, 'b', 1.0, "O2")])
            .label('x', "R");
        let engine = CircuitEngine::new(store, SearchConfig::default().with_seed(3));

        let result = engine
            .run(&request('x', &["O1", "O2"]), &CancelToken::new())
            .await
            .unwrap();

        assert!(result.succeeded());
        assert_eq!(result.origin, "O2");
        assert_eq!(result.path, vec!["O2", "R", "T", "O2"]);
    }

    #[tokio::test]
    async fn test_timeout_cancels_pending_search() {
        // The climb stalls on a node whose fetch never completes
        let store = FixtureStore::new()
            .node("O", vec![edge(Forward, 'x', 1.0, "L")])
            .node("L", vec![edge(Up, 'a', 1.0, "H")])
            .node("H", vec![])
            .hanging("H");
        let config = SearchConfig::default()
            .with_seed(1)
            .with_timeout(Duration::from_millis(20));
        let engine = CircuitEngine::new(store, config);

        let result = engine
            .run(&request('x', &["O"]), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(result.status, SearchStatus::Cancelled);
        assert_eq!(result.label_node.as_deref(), Some("L"));
        assert_eq!(engine.store().fetches(), 3);
    }

    #[tokio::test]
    async fn test_timeout_applies_with_caller_rng() {
        let store = FixtureStore::new()
            .node("O", vec![edge(Forward, 'x', 1.0, "L")])
            .node("L", vec![])
            .hanging("L");
        let engine = CircuitEngine::new(
            store,
            SearchConfig::default().with_timeout(Duration::from_millis(20)),
        );
        let mut rng = StdRng::seed_from_u64(5);

        let result = engine
            .run_with_rng(&request('x', &["O"]), &CancelToken::new(), &mut rng)
            .await
            .unwrap();

        assert_eq!(result.status, SearchStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_unavailable_origin_reported() {
        let engine = CircuitEngine::new(
            FixtureStore::new().node("O", vec![]).unavailable("O"),
            SearchConfig::default(),
        );

        let result = engine
            .run(&request('x', &["O"]), &CancelToken::new())
            .await
            .unwrap();
        assert!(matches!(result.into_result(), Err(Error::Unavailable(_))));
    }
}
