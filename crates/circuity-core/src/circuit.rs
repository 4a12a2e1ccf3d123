//! Circuit search: climb, descend, verify, retry
//!
//! A try climbs `up` from the label node until no `up` edge remains (the big
//! node), descends `down` until no `down` edge remains, then walks
//! `forward`/`backward` until it meets the origin (success) or the label
//! node (a circuit that leaves the origin out, which is a failure). All
//! three phases draw from one step budget per try.

use crate::cancel::CancelToken;
use crate::config::SearchConfig;
use crate::edge::Direction;
use crate::error::{Error, Result};
use crate::selector::WeightedSelector;
use crate::store::NodeStore;
use crate::walk::{WalkEngine, WalkQuery, WalkStatus};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Search phase, for progress logs and failure reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Climbing,
    Descending,
    Verifying,
}

/// Final state of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Succeeded,
    Failed,
    Cancelled,
}

/// Why the last try of a failed search failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// No eligible edge during a phase that must keep moving
    Blocked { phase: Phase },
    /// The try's step budget ran out during a phase
    LimitReached { phase: Phase },
    /// Verification hit its hard ceiling
    LimitExceeded { limit: usize },
    /// Verification met the label node before the origin
    ClosedWithoutOrigin,
    /// An edge pointed at a node the store does not have
    DanglingEdge { address: String },
    /// The store failed; the search stopped without retrying
    Unavailable { message: String },
    /// No label node could be resolved for any origin
    NoLabelNode,
}

/// Outcome of a circuit search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub status: SearchStatus,

    pub origin: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_node: Option<String>,

    /// Top of the climb in the reported try
    #[serde(skip_serializing_if = "Option::is_none")]
    pub big_node: Option<String>,

    /// Addresses of the reported try, starting at the origin
    pub path: Vec<String>,

    /// Steps taken by the reported try
    pub steps_taken: usize,

    /// Verification checks made by the reported try (the node the descent
    /// ended on counts as the first)
    pub verify_steps: usize,

    /// Steps taken across all tries
    pub total_steps: usize,

    pub tries_used: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
}

impl SearchResult {
    pub fn succeeded(&self) -> bool {
        self.status == SearchStatus::Succeeded
    }

    /// Result for a search that never got to a label node
    pub fn without_label_node(origin: impl Into<String>, status: SearchStatus) -> Self {
        let origin = origin.into();
        Self {
            status,
            path: vec![origin.clone()],
            origin,
            label_node: None,
            big_node: None,
            steps_taken: 0,
            verify_steps: 0,
            total_steps: 0,
            tries_used: 0,
            failure_reason: (status == SearchStatus::Failed).then_some(FailureReason::NoLabelNode),
        }
    }

    /// Convert into the realized path, or a typed error for anything but
    /// success.
    pub fn into_result(self) -> Result<Vec<String>> {
        match (self.status, self.failure_reason) {
            (SearchStatus::Succeeded, _) => Ok(self.path),
            (SearchStatus::Cancelled, _) => Err(Error::Cancelled),
            (_, Some(FailureReason::Unavailable { message })) => Err(Error::Unavailable(message)),
            (_, Some(FailureReason::NoLabelNode)) => Err(Error::NotFound(format!(
                "label node reachable from {}",
                self.origin
            ))),
            _ => Err(Error::RetriesExhausted {
                tries: self.tries_used,
            }),
        }
    }
}

/// State of one try
#[derive(Debug)]
struct Attempt {
    path: Vec<String>,
    steps: usize,
    verify_steps: usize,
    big_node: Option<String>,
    failure: Option<FailureReason>,
}

impl Attempt {
    fn new(origin: &str, label_node: &str) -> Self {
        let mut path = vec![origin.to_string()];
        if label_node != origin {
            path.push(label_node.to_string());
        }
        Self {
            path,
            steps: 0,
            verify_steps: 0,
            big_node: None,
            failure: None,
        }
    }

    fn tip(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    fn fail(&mut self, reason: FailureReason) {
        self.failure = Some(reason);
    }
}

/// Runs the climb → descend → verify protocol with a retry budget
pub struct CircuitSearcher<'a, S: NodeStore + ?Sized> {
    walker: WalkEngine<'a, S>,
    config: &'a SearchConfig,
}

impl<'a, S: NodeStore + ?Sized> CircuitSearcher<'a, S> {
    pub fn new(store: &'a S, config: &'a SearchConfig, cancel: &'a CancelToken) -> Self {
        Self {
            walker: WalkEngine::new(store, WeightedSelector::new(config.policy), cancel),
            config,
        }
    }

    /// Search for a circuit through `origin` and `label_node`
    ///
    /// Makes up to `tries_remaining + 1` tries. Store outages end the search
    /// at once as `Failed` without spending the retry budget; cancellation
    /// ends it as `Cancelled`.
    pub async fn search<R>(
        &self,
        origin: &str,
        label_node: &str,
        tries_remaining: usize,
        rng: &mut R,
    ) -> SearchResult
    where
        R: Rng + Send + ?Sized,
    {
        let mut tries_remaining = tries_remaining;
        let mut tries_used = 0;
        let mut total_steps = 0;

        loop {
            tries_used += 1;
            let mut attempt = Attempt::new(origin, label_node);
            let outcome = self.attempt(origin, label_node, &mut attempt, rng).await;
            total_steps += attempt.steps;

            let status = match outcome {
                Ok(()) if attempt.failure.is_none() => SearchStatus::Succeeded,
                Ok(()) => SearchStatus::Failed,
                Err(Error::Cancelled) => {
                    tracing::info!("Search from {} cancelled during try {}", origin, tries_used);
                    SearchStatus::Cancelled
                }
                Err(e) => {
                    tracing::warn!("Search from {} stopped: {}", origin, e);
                    attempt.fail(FailureReason::Unavailable {
                        message: e.to_string(),
                    });
                    SearchStatus::Failed
                }
            };

            let retry = status == SearchStatus::Failed
                && tries_remaining > 0
                && !matches!(attempt.failure, Some(FailureReason::Unavailable { .. }));

            if retry {
                tracing::debug!(
                    "Try {} from {} failed ({:?}), {} tries remaining",
                    tries_used,
                    origin,
                    attempt.failure,
                    tries_remaining
                );
                tries_remaining -= 1;
                continue;
            }

            if status == SearchStatus::Succeeded {
                tracing::info!(
                    "Circuit found from {} via {} in {} steps (try {})",
                    origin,
                    label_node,
                    attempt.steps,
                    tries_used
                );
            }

            return SearchResult {
                status,
                origin: origin.to_string(),
                label_node: Some(label_node.to_string()),
                big_node: attempt.big_node,
                path: attempt.path,
                steps_taken: attempt.steps,
                verify_steps: attempt.verify_steps,
                total_steps,
                tries_used,
                failure_reason: attempt.failure,
            };
        }
    }

    /// One try. `Ok` covers both success and per-try failure (recorded on
    /// the attempt); `Err` ends the whole search.
    async fn attempt<R>(
        &self,
        origin: &str,
        label_node: &str,
        attempt: &mut Attempt,
        rng: &mut R,
    ) -> Result<()>
    where
        R: Rng + Send + ?Sized,
    {
        match self.climb_descend_verify(origin, label_node, attempt, rng).await {
            Err(Error::NotFound(address)) => {
                attempt.fail(FailureReason::DanglingEdge { address });
                Ok(())
            }
            Err(Error::LimitExceeded { limit }) => {
                attempt.fail(FailureReason::LimitExceeded { limit });
                Ok(())
            }
            other => other,
        }
    }

    async fn climb_descend_verify<R>(
        &self,
        origin: &str,
        label_node: &str,
        attempt: &mut Attempt,
        rng: &mut R,
    ) -> Result<()>
    where
        R: Rng + Send + ?Sized,
    {
        // Climbing
        if !self.run_phase(Phase::Climbing, attempt, rng).await? {
            return Ok(());
        }
        attempt.big_node = Some(attempt.tip().to_string());

        // Descending
        if !self.run_phase(Phase::Descending, attempt, rng).await? {
            return Ok(());
        }

        // Verifying
        self.verify(origin, label_node, attempt, rng).await
    }

    /// Walk one phase to exhaustion; false when the try failed
    async fn run_phase<R>(&self, phase: Phase, attempt: &mut Attempt, rng: &mut R) -> Result<bool>
    where
        R: Rng + Send + ?Sized,
    {
        let direction = match phase {
            Phase::Climbing => Direction::Up,
            _ => Direction::Down,
        };
        let query = WalkQuery::new(attempt.tip())
            .with_directions(&[direction])
            .with_step_limit(self.remaining(attempt));

        let walk = self.walker.walk(&query, |_| false, rng).await?;
        attempt.steps += walk.steps();
        attempt.path.extend(walk.path);

        tracing::debug!("{:?} from {} ended {:?} at {}", phase, query.start, walk.status, attempt.tip());

        match walk.status {
            WalkStatus::Blocked => Ok(true),
            WalkStatus::LimitReached | WalkStatus::Found => {
                attempt.fail(FailureReason::LimitReached { phase });
                Ok(false)
            }
        }
    }

    async fn verify<R>(
        &self,
        origin: &str,
        label_node: &str,
        attempt: &mut Attempt,
        rng: &mut R,
    ) -> Result<()>
    where
        R: Rng + Send + ?Sized,
    {
        // The node the descent ended on is the first check
        attempt.verify_steps = 1;
        if attempt.tip() == origin {
            return Ok(());
        }

        let ceiling = self.config.verify_ceiling;
        let ceiling_steps = ceiling.saturating_sub(1);
        let remaining = self.remaining(attempt);

        let query = WalkQuery::new(attempt.tip())
            .with_directions(&[Direction::Forward, Direction::Backward])
            .with_step_limit(remaining.min(ceiling_steps));
        let walk = self
            .walker
            .walk(&query, |x| x == origin || x == label_node, rng)
            .await?;

        attempt.steps += walk.steps();
        attempt.verify_steps += walk.steps();
        attempt.path.extend(walk.path.iter().cloned());

        match walk.status {
            WalkStatus::Found if walk.end() == origin => Ok(()),
            WalkStatus::Found => {
                tracing::debug!(
                    "Closed a circuit at {} without the origin {} ({} steps)",
                    label_node,
                    origin,
                    attempt.steps
                );
                attempt.fail(FailureReason::ClosedWithoutOrigin);
                Ok(())
            }
            WalkStatus::Blocked => {
                attempt.fail(FailureReason::Blocked {
                    phase: Phase::Verifying,
                });
                Ok(())
            }
            WalkStatus::LimitReached if ceiling_steps <= remaining => {
                Err(Error::LimitExceeded { limit: ceiling })
            }
            WalkStatus::LimitReached => {
                attempt.fail(FailureReason::LimitReached {
                    phase: Phase::Verifying,
                });
                Ok(())
            }
        }
    }

    fn remaining(&self, attempt: &Attempt) -> usize {
        self.config.step_limit.saturating_sub(attempt.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectionPolicy;
    use crate::testing::{edge, FixtureStore};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use Direction::{Backward, Down, Forward, Up};

    /// O -x-> D, D -up-> B, B -down-> D, D -forward-> O
    fn scenario_a() -> FixtureStore {
        FixtureStore::new()
            .node("O", vec![edge(Forward, 'x', 1.0, "D"), edge(Up, 'a', 1.0, "B")])
            .node("D", vec![edge(Up, 'b', 1.0, "B"), edge(Forward, 'c', 1.0, "O")])
            .node("B", vec![edge(Down, 'd', 1.0, "D")])
    }

    fn max_weight() -> SearchConfig {
        SearchConfig::default().with_policy(SelectionPolicy::MaxWeight)
    }

    #[tokio::test]
    async fn test_scenario_a_succeeds() {
        let store = scenario_a();
        let config = SearchConfig::default();
        let cancel = CancelToken::new();
        let mut rng = StdRng::seed_from_u64(3);

        let result = CircuitSearcher::new(&store, &config, &cancel)
            .search("O", "D", 1, &mut rng)
            .await;

        assert!(result.succeeded());
        assert_eq!(result.path, vec!["O", "D", "B", "D", "O"]);
        assert_eq!(result.big_node.as_deref(), Some("B"));
        assert_eq!(result.steps_taken, 3);
        assert_eq!(result.verify_steps, 2);
        assert_eq!(result.tries_used, 1);
        assert!(result.failure_reason.is_none());
        assert_eq!(result.into_result().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_scenario_b_dead_end_exhausts_tries() {
        let store = FixtureStore::new()
            .node("O", vec![edge(Forward, 'x', 1.0, "D")])
            .node("D", vec![edge(Up, 'b', 1.0, "B"), edge(Forward, 'c', 1.0, "Z")])
            .node("B", vec![edge(Down, 'd', 1.0, "D")])
            .node("Z", vec![]);
        let config = max_weight();
        let cancel = CancelToken::new();
        let mut rng = StdRng::seed_from_u64(3);

        let result = CircuitSearcher::new(&store, &config, &cancel)
            .search("O", "D", 2, &mut rng)
            .await;

        assert_eq!(result.status, SearchStatus::Failed);
        assert_eq!(result.tries_used, 3);
        assert_eq!(
            result.failure_reason,
            Some(FailureReason::Blocked {
                phase: Phase::Verifying
            })
        );
        assert_eq!(result.path, vec!["O", "D", "B", "D", "Z"]);
        assert!(matches!(
            result.into_result(),
            Err(Error::RetriesExhausted { tries: 3 })
        ));
    }

    #[tokio::test]
    async fn test_origin_is_label_node() {
        // O -up-> B -down-> O
        let store = FixtureStore::new()
            .node("O", vec![edge(Up, 'a', 1.0, "B")])
            .node("B", vec![edge(Down, 'b', 1.0, "O")]);
        let config = max_weight();
        let cancel = CancelToken::new();
        let mut rng = StdRng::seed_from_u64(0);

        let result = CircuitSearcher::new(&store, &config, &cancel)
            .search("O", "O", 0, &mut rng)
            .await;

        assert!(result.succeeded());
        assert_eq!(result.verify_steps, 1);
        assert_eq!(result.path, vec!["O", "B", "O"]);
    }

    #[tokio::test]
    async fn test_label_node_before_origin_fails() {
        // L -up-> B -down-> M -forward-> L
        let store = FixtureStore::new()
            .node("O", vec![edge(Forward, 'x', 1.0, "L")])
            .node("L", vec![edge(Up, 'a', 1.0, "B")])
            .node("B", vec![edge(Down, 'b', 1.0, "M")])
            .node("M", vec![edge(Forward, 'c', 1.0, "L")]);
        let config = max_weight();
        let cancel = CancelToken::new();
        let mut rng = StdRng::seed_from_u64(0);

        let result = CircuitSearcher::new(&store, &config, &cancel)
            .search("O", "L", 0, &mut rng)
            .await;

        assert_eq!(result.status, SearchStatus::Failed);
        assert_eq!(result.failure_reason, Some(FailureReason::ClosedWithoutOrigin));
        assert_eq!(result.path, vec!["O", "L", "B", "M", "L"]);
    }

    #[tokio::test]
    async fn test_terminates_on_adversarial_cycles() {
        // The verification phase loops M <-> N forever
        let store = FixtureStore::new()
            .node("L", vec![edge(Up, 'a', 1.0, "B")])
            .node("B", vec![edge(Down, 'b', 1.0, "M")])
            .node("M", vec![edge(Forward, 'c', 1.0, "N"), edge(Backward, 'd', 2.0, "N")])
            .node("N", vec![edge(Forward, 'e', 1.0, "M")]);
        let config = SearchConfig::default()
            .with_step_limit(10)
            .with_verify_ceiling(100);
        let cancel = CancelToken::new();
        let mut rng = StdRng::seed_from_u64(11);
        let tries = 3;

        let result = CircuitSearcher::new(&store, &config, &cancel)
            .search("O", "L", tries, &mut rng)
            .await;

        assert_eq!(result.status, SearchStatus::Failed);
        assert_eq!(result.tries_used, tries + 1);
        assert!(result.steps_taken <= config.step_limit);
        assert!(result.total_steps <= config.step_limit * (tries + 1));
        assert_eq!(
            result.failure_reason,
            Some(FailureReason::LimitReached {
                phase: Phase::Verifying
            })
        );
    }

    #[tokio::test]
    async fn test_climb_limit_reached() {
        let store = FixtureStore::new()
            .node("L", vec![edge(Up, 'a', 1.0, "B")])
            .node("B", vec![edge(Up, 'b', 1.0, "L")]);
        let config = max_weight().with_step_limit(4);
        let cancel = CancelToken::new();
        let mut rng = StdRng::seed_from_u64(0);

        let result = CircuitSearcher::new(&store, &config, &cancel)
            .search("O", "L", 0, &mut rng)
            .await;

        assert_eq!(
            result.failure_reason,
            Some(FailureReason::LimitReached {
                phase: Phase::Climbing
            })
        );
        assert_eq!(result.steps_taken, 4);
        assert!(result.big_node.is_none());
    }

    #[tokio::test]
    async fn test_verify_ceiling_exceeded() {
        let store = FixtureStore::new()
            .node("L", vec![edge(Up, 'a', 1.0, "B")])
            .node("B", vec![edge(Down, 'b', 1.0, "M")])
            .node("M", vec![edge(Forward, 'c', 1.0, "N")])
            .node("N", vec![edge(Forward, 'e', 1.0, "M")]);
        let config = max_weight().with_verify_ceiling(4);
        let cancel = CancelToken::new();
        let mut rng = StdRng::seed_from_u64(0);

        let result = CircuitSearcher::new(&store, &config, &cancel)
            .search("O", "L", 1, &mut rng)
            .await;

        assert_eq!(result.failure_reason, Some(FailureReason::LimitExceeded { limit: 4 }));
        assert_eq!(result.verify_steps, 4);
        assert_eq!(result.tries_used, 2);
    }

    #[tokio::test]
    async fn test_unavailable_does_not_retry() {
        let store = FixtureStore::new()
            .node("L", vec![edge(Up, 'a', 1.0, "B")])
            .node("B", vec![])
            .unavailable("B");
        let config = max_weight();
        let cancel = CancelToken::new();
        let mut rng = StdRng::seed_from_u64(0);

        let result = CircuitSearcher::new(&store, &config, &cancel)
            .search("O", "L", 5, &mut rng)
            .await;

        assert_eq!(result.status, SearchStatus::Failed);
        assert_eq!(result.tries_used, 1);
        assert!(matches!(
            result.failure_reason,
            Some(FailureReason::Unavailable { .. })
        ));
        assert!(matches!(result.into_result(), Err(Error::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_dangling_edge_is_retried() {
        let store = FixtureStore::new()
            .node("L", vec![edge(Up, 'a', 1.0, "B")])
            .node("B", vec![edge(Down, 'b', 1.0, "ghost")]);
        let config = max_weight();
        let cancel = CancelToken::new();
        let mut rng = StdRng::seed_from_u64(0);

        let result = CircuitSearcher::new(&store, &config, &cancel)
            .search("O", "L", 2, &mut rng)
            .await;

        assert_eq!(result.tries_used, 3);
        assert_eq!(
            result.failure_reason,
            Some(FailureReason::DanglingEdge {
                address: "ghost".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_cancelled_search() {
        let store = scenario_a();
        let config = SearchConfig::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut rng = StdRng::seed_from_u64(0);

        let result = CircuitSearcher::new(&store, &config, &cancel)
            .search("O", "D", 3, &mut rng)
            .await;

        assert_eq!(result.status, SearchStatus::Cancelled);
        assert!(result.failure_reason.is_none());
        assert_eq!(result.tries_used, 1);
        assert!(matches!(result.into_result(), Err(Error::Cancelled)));
    }
}
