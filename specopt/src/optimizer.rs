//! Parallel variant scoring and greedy selection of speculation offsets.

use expect::{ConditionalCalculator, SimpleCalculator};
use lenscheme::{ConditionalScheme, SchemeError, SimpleScheme};
use rayon::prelude::*;

/// A probabilistic scheme that can score a candidate L-vector.
///
/// Each call builds a fresh calculator (and so a fresh, empty memoization
/// cache) from a cloned scheme, rather than sharing one cache behind a lock:
/// this is what lets [`SimpleOptimizer::optimize`] hand every variant to its
/// own `rayon` task without any of them contending over shared state.
pub trait Evaluable: Clone + Sync {
    /// Expected number of codewords the chain commits for this variant.
    fn score(&self, w: usize, variant: &[usize]) -> f64;
}

impl Evaluable for SimpleScheme {
    fn score(&self, w: usize, variant: &[usize]) -> f64 {
        SimpleCalculator::new(self.clone()).score(w, variant)
    }
}

impl Evaluable for ConditionalScheme {
    fn score(&self, w: usize, variant: &[usize]) -> f64 {
        ConditionalCalculator::new(self.clone()).score(w, variant)
    }
}

/// Chooses the best-scoring L-vector among a set of candidates, or a greedy
/// approximation, for a given probabilistic scheme.
pub struct SimpleOptimizer<S: Evaluable> {
    scheme: S,
}

impl<S: Evaluable> SimpleOptimizer<S> {
    /// Builds an optimizer over `scheme`.
    pub fn new(scheme: S) -> Self {
        Self { scheme }
    }

    /// Scores every candidate in `variants` in parallel (via `rayon`'s
    /// work-stealing `par_iter`, one independent calculator per variant) and
    /// returns the best-scoring one. `None` if `variants` is empty or every
    /// variant scores `0.0` or below (matching the grounding scripts'
    /// `best_score = 0` starting point).
    pub fn optimize(&self, w: usize, variants: &[Vec<usize>]) -> (f64, Option<Vec<usize>>) {
        variants
            .par_iter()
            .map(|variant| (self.scheme.score(w, variant), Some(variant.clone())))
            .reduce(
                || (0.0_f64, None),
                |a, b| if b.0 > a.0 { b } else { a },
            )
    }
}

impl SimpleOptimizer<SimpleScheme> {
    /// The top-`w` outcomes by probability, as an L-vector, with its score.
    fn greedy_top(&self, w: usize) -> Result<(f64, Vec<usize>), SchemeError> {
        let mut variant = self.scheme.get_top(w)?;
        variant.sort_unstable();
        let score = self.scheme.score(w, &variant);
        Ok((score, variant))
    }

    /// Greedy choice of a speculation offset vector: for `r == 1`, the top-w
    /// outcomes by probability; for `r > 1`, the top-w outcomes by summed
    /// priority across the sum-of-`1..=r`-draws distributions.
    pub fn greedy(&self, w: usize, r: usize) -> Result<(f64, Vec<usize>), SchemeError> {
        if r == 1 {
            return self.greedy_top(w);
        }

        let mut priorities: std::collections::HashMap<usize, f64> =
            std::collections::HashMap::new();
        for r_candidate in 1..=r {
            let future_scheme = self.scheme.get_scheme_for_sum(r_candidate);
            for (outcome, probability) in future_scheme.compact() {
                *priorities.entry(outcome).or_insert(0.0) += probability;
            }
        }

        let mut ranked: Vec<(usize, f64)> = priorities.into_iter().collect();
        // Summed probabilities from `get_scheme_for_sum`, each itself
        // renormalized over a strictly positive total, so always finite.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

        if w > ranked.len() {
            return Err(SchemeError::ImpossibleRequest {
                requested: w,
                max: ranked.len(),
            });
        }

        let mut variant: Vec<usize> = ranked[..w].iter().map(|(o, _)| *o).collect();
        variant.sort_unstable();
        let score = self.scheme.score(w, &variant);
        Ok((score, variant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimize_picks_the_highest_scoring_variant() {
        let scheme = SimpleScheme::new(vec![1, 2, 3], vec![0.2, 0.3, 0.5]);
        let optimizer = SimpleOptimizer::new(scheme);
        let variants = vec![vec![1, 2], vec![2, 3], vec![1, 3]];
        let (score, variant) = optimizer.optimize(2, &variants);
        assert!(score > 0.0);
        assert!(variant.is_some());
    }

    #[test]
    fn greedy_r1_matches_top_w() {
        let scheme = SimpleScheme::new(vec![1, 2, 3], vec![0.2, 0.3, 0.5]);
        let optimizer = SimpleOptimizer::new(scheme);
        let (_, variant) = optimizer.greedy(2, 1).unwrap();
        assert_eq!(variant, vec![2, 3]);
    }

    #[test]
    fn greedy_rejects_impossible_width() {
        let scheme = SimpleScheme::new(vec![1, 2], vec![0.5, 0.5]);
        let optimizer = SimpleOptimizer::new(scheme);
        // r=2 widens the candidate outcomes to {1,2,3,4}; w=5 still can't be met.
        assert!(optimizer.greedy(5, 2).is_err());
    }
}
