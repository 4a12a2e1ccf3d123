//! Next-edge selection policies

use crate::edge::Edge;
use crate::error::{Error, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// How the next edge is chosen among candidates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// Probability proportional to weight; zero-weight edges never drawn
    #[default]
    WeightedRandom,
    /// Highest weight, ties to the greatest destination address
    MaxWeight,
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WeightedRandom => f.write_str("weighted-random"),
            Self::MaxWeight => f.write_str("max-weight"),
        }
    }
}

impl FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "weighted-random" | "random" => Ok(Self::WeightedRandom),
            "max-weight" | "max" => Ok(Self::MaxWeight),
            other => Err(format!("unknown selection policy '{}'", other)),
        }
    }
}

/// Picks the next edge from a candidate set
///
/// Selection is a pure function of the candidates, the policy and the
/// caller-supplied RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedSelector {
    policy: SelectionPolicy,
}

impl WeightedSelector {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Select the next edge, or [`Error::NoCandidateEdges`] when nothing is
    /// eligible under the policy.
    pub fn select<'a, R, I>(&self, candidates: I, rng: &mut R) -> Result<&'a Edge>
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = &'a Edge>,
    {
        match self.policy {
            SelectionPolicy::WeightedRandom => Self::weighted_random(candidates, rng),
            SelectionPolicy::MaxWeight => Self::max_weight(candidates),
        }
    }

    fn weighted_random<'a, R, I>(candidates: I, rng: &mut R) -> Result<&'a Edge>
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = &'a Edge>,
    {
        let eligible: Vec<&Edge> = candidates.into_iter().filter(|e| e.weight > 0.0).collect();
        match eligible.len() {
            0 => Err(Error::NoCandidateEdges),
            1 => Ok(eligible[0]),
            _ => {
                let index = WeightedIndex::new(eligible.iter().map(|e| e.weight))
                    .map_err(|_| Error::NoCandidateEdges)?;
                Ok(eligible[index.sample(rng)])
            }
        }
    }

    fn max_weight<'a, I>(candidates: I) -> Result<&'a Edge>
    where
        I: IntoIterator<Item = &'a Edge>,
    {
        candidates
            .into_iter()
            .max_by(|a, b| compare_for_max(a, b))
            .ok_or(Error::NoCandidateEdges)
    }
}

/// Total order used by deterministic selection: weight, then destination,
/// then encoded key.
pub(crate) fn compare_for_max(a: &Edge, b: &Edge) -> Ordering {
    a.weight
        .partial_cmp(&b.weight)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.destination.cmp(&b.destination))
        .then_with(|| a.key().cmp(&b.key()))
}

/// Order used for label lookups: weight, then encoded key
pub(crate) fn compare_for_label(a: &Edge, b: &Edge) -> Ordering {
    a.weight
        .partial_cmp(&b.weight)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.key().cmp(&b.key()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Direction;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn edges() -> Vec<Edge> {
        vec![
            Edge::new(Direction::Up, 'a', 1.0, "A"),
            Edge::new(Direction::Up, 'b', 3.0, "B"),
            Edge::new(Direction::Up, 'c', 3.0, "C"),
            Edge::new(Direction::Up, 'd', 0.0, "D"),
        ]
    }

    #[test]
    fn test_max_weight_is_deterministic() {
        let selector = WeightedSelector::new(SelectionPolicy::MaxWeight);
        let edges = edges();
        let mut rng = StdRng::seed_from_u64(1);

        let first = selector.select(&edges, &mut rng).unwrap().clone();
        for _ in 0..20 {
            assert_eq!(selector.select(&edges, &mut rng).unwrap(), &first);
        }
        // Tie on weight 3.0 goes to the greater destination
        assert_eq!(first.destination, "C");
    }

    #[test]
    fn test_weighted_random_single_nonzero() {
        let selector = WeightedSelector::new(SelectionPolicy::WeightedRandom);
        let edges = vec![
            Edge::new(Direction::Up, 'a', 0.0, "A"),
            Edge::new(Direction::Up, 'b', 0.7, "B"),
            Edge::new(Direction::Up, 'c', 0.0, "C"),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(selector.select(&edges, &mut rng).unwrap().destination, "B");
        }
    }

    #[test]
    fn test_weighted_random_all_zero() {
        let selector = WeightedSelector::new(SelectionPolicy::WeightedRandom);
        let edges = vec![
            Edge::new(Direction::Up, 'a', 0.0, "A"),
            Edge::new(Direction::Up, 'b', 0.0, "B"),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(
            selector.select(&edges, &mut rng),
            Err(Error::NoCandidateEdges)
        ));
    }

    #[test]
    fn test_empty_candidates() {
        let mut rng = StdRng::seed_from_u64(0);
        for policy in [SelectionPolicy::WeightedRandom, SelectionPolicy::MaxWeight] {
            let selector = WeightedSelector::new(policy);
            assert!(matches!(
                selector.select(std::iter::empty(), &mut rng),
                Err(Error::NoCandidateEdges)
            ));
        }
    }

    #[test]
    fn test_weighted_random_reproducible_under_seed() {
        let selector = WeightedSelector::new(SelectionPolicy::WeightedRandom);
        let edges = edges();

        let draw = |seed: u64| -> Vec<String> {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..16)
                .map(|_| selector.select(&edges, &mut rng).unwrap().destination.clone())
                .collect()
        };
        assert_eq!(draw(42), draw(42));
        assert!(draw(42).iter().all(|d| d != "D"));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "max-weight".parse::<SelectionPolicy>().unwrap(),
            SelectionPolicy::MaxWeight
        );
        assert_eq!(SelectionPolicy::default().to_string(), "weighted-random");
        assert!("greedy".parse::<SelectionPolicy>().is_err());
    }
}
