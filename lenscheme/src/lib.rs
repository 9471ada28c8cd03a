//! Probabilistic schemes over codeword-length outcomes: a flat,
//! context-free distribution ([`SimpleScheme`]) and a k-gram-conditioned
//! distribution ([`ConditionalScheme`]).

use std::collections::HashMap;

use fsum::FSum;
use kgram::KGramModel;
use thiserror::Error;

/// Errors raised by scheme queries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemeError {
    /// `get_top(n)` was asked for more outcomes than the scheme supports.
    #[error("{requested} outcomes are impossible, max is {max}")]
    ImpossibleRequest {
        /// The number of outcomes requested.
        requested: usize,
        /// The number actually available.
        max: usize,
    },
}

/// A flat distribution over codeword-length outcomes.
#[derive(Debug, Clone)]
pub struct SimpleScheme {
    outcomes: Vec<usize>,
    probabilities: Vec<f64>,
}

impl SimpleScheme {
    /// Builds a scheme from parallel `outcomes`/`probabilities` vectors.
    pub fn new(outcomes: Vec<usize>, probabilities: Vec<f64>) -> Self {
        Self {
            outcomes,
            probabilities,
        }
    }

    /// Probability of `outcome`, or `0.0` if it's not in the support.
    pub fn p(&self, outcome: usize) -> f64 {
        self.outcomes
            .iter()
            .position(|&o| o == outcome)
            .map(|i| self.probabilities[i])
            .unwrap_or(0.0)
    }

    /// All `(outcome, probability)` pairs.
    pub fn compact(&self) -> Vec<(usize, f64)> {
        self.outcomes
            .iter()
            .copied()
            .zip(self.probabilities.iter().copied())
            .collect()
    }

    /// The `n` outcomes with highest probability, descending.
    pub fn get_top(&self, n: usize) -> Result<Vec<usize>, SchemeError> {
        let mut pairs = self.compact();
        if n > pairs.len() {
            return Err(SchemeError::ImpossibleRequest {
                requested: n,
                max: pairs.len(),
            });
        }
        // Probabilities are finite by construction (see `ConditionalScheme::new`'s
        // division invariant below); partial_cmp never sees a NaN here.
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        Ok(pairs.into_iter().take(n).map(|(o, _)| o).collect())
    }

    /// The distribution of the sum of `r` i.i.d. draws from this scheme,
    /// computed by direct discrete convolution (see the crate-level note on
    /// why this replaces an FFT-based computation).
    pub fn get_scheme_for_sum(&self, r: usize) -> SimpleScheme {
        assert!(r >= 1, "get_scheme_for_sum is only defined for r >= 1");
        let max_outcome = *self.outcomes.iter().max().expect("non-empty scheme");
        let base: Vec<f64> = (0..=max_outcome).map(|o| self.p(o)).collect();

        let mut acc = base.clone();
        for _ in 1..r {
            acc = convolve(&acc, &base);
        }

        let eps = f64::EPSILON;
        let mut selected_outcomes = Vec::new();
        let mut selected_probabilities = Vec::new();
        for (outcome, &prob) in acc.iter().enumerate() {
            if prob > eps && outcome >= r {
                selected_outcomes.push(outcome);
                selected_probabilities.push(prob);
            }
        }

        let total = FSum::with_all(&selected_probabilities).value();
        for prob in &mut selected_probabilities {
            *prob /= total;
        }

        SimpleScheme::new(selected_outcomes, selected_probabilities)
    }
}

/// Direct convolution of two finite discrete distributions, indexed from 0.
fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut result = vec![0.0; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0.0 {
            continue;
        }
        for (j, &bj) in b.iter().enumerate() {
            result[i + j] += ai * bj;
        }
    }
    result
}

/// A distribution over the next codeword length, conditioned on a context
/// (the previous k-1 lengths), built from a trained [`KGramModel`].
#[derive(Debug, Clone)]
pub struct ConditionalScheme {
    map: HashMap<Vec<usize>, HashMap<usize, f64>>,
    context_probability: HashMap<Vec<usize>, f64>,
    outcome_frequencies: HashMap<usize, u64>,
}

impl ConditionalScheme {
    /// Builds the scheme from a model's accumulated k-gram frequencies.
    pub fn new(model: &KGramModel) -> Self {
        let mut map: HashMap<Vec<usize>, HashMap<usize, f64>> = HashMap::new();
        let mut context_counts: HashMap<Vec<usize>, Vec<f64>> = HashMap::new();
        let mut all_counts: Vec<f64> = Vec::new();

        for (kgram, &frequency) in model.frequencies() {
            let frequency = frequency as f64;
            let (outcome, context) = kgram.split_last().expect("k-gram is non-empty");
            let context = context.to_vec();
            *map.entry(context.clone())
                .or_default()
                .entry(*outcome)
                .or_insert(0.0) += frequency;
            context_counts.entry(context).or_default().push(frequency);
            all_counts.push(frequency);
        }

        let context_count: HashMap<Vec<usize>, f64> = context_counts
            .into_iter()
            .map(|(ctx, counts)| (ctx, FSum::with_all(&counts).value()))
            .collect();
        let total = FSum::with_all(&all_counts).value();

        // `cc` and `total` are both sums of one or more positive k-gram
        // frequencies: `context_count` only has an entry for a context that
        // contributed at least one frequency to `map`, and `total` sums the
        // same frequencies across every context, so both are always > 0 here
        // and these divisions never produce NaN.
        for (context, outcomes) in map.iter_mut() {
            let cc = context_count[context];
            for prob in outcomes.values_mut() {
                *prob /= cc;
            }
        }

        let context_probability = context_count
            .into_iter()
            .map(|(ctx, cc)| (ctx, cc / total))
            .collect();

        Self {
            map,
            context_probability,
            outcome_frequencies: model.outcome_frequencies().clone(),
        }
    }

    /// Probability of `outcome` given `context`; `0.0` outside the support.
    pub fn p(&self, outcome: usize, context: &[usize]) -> f64 {
        self.map
            .get(context)
            .and_then(|outcomes| outcomes.get(&outcome))
            .copied()
            .unwrap_or(0.0)
    }

    /// Marginal probability of observing `context`.
    pub fn p_context(&self, context: &[usize]) -> f64 {
        self.context_probability
            .get(context)
            .copied()
            .unwrap_or(0.0)
    }

    /// Every observed context paired with its marginal probability.
    pub fn contexts_and_probabilities(&self) -> impl Iterator<Item = (&Vec<usize>, f64)> {
        self.context_probability.iter().map(|(c, &p)| (c, p))
    }

    /// Top-`n` outcomes by overall (context-free) marginal frequency.
    pub fn most_frequent_outcomes(&self, n: usize) -> Vec<usize> {
        let mut entries: Vec<(usize, u64)> = self
            .outcome_frequencies
            .iter()
            .map(|(&o, &f)| (o, f))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.into_iter().take(n).map(|(o, _)| o).collect()
    }

    /// Top-`n` outcomes observed under `context`, by conditional probability.
    pub fn most_frequent_outcomes_on_context(&self, n: usize, context: &[usize]) -> Vec<usize> {
        let Some(outcomes) = self.map.get(context) else {
            return Vec::new();
        };
        let mut entries: Vec<(usize, f64)> = outcomes.iter().map(|(&o, &p)| (o, p)).collect();
        // Same finiteness guarantee as `get_top`: these come from the same
        // never-zero-denominator division in `new`.
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        entries.into_iter().take(n).map(|(o, _)| o).collect()
    }

    /// For every observed context, the sorted top-`n` outcomes, padded with
    /// globally most-frequent outcomes not already present when a context
    /// has fewer than `n` distinct seen outcomes.
    pub fn build_assignment_table(&self, n: usize) -> HashMap<Vec<usize>, Vec<usize>> {
        let fallback = self.most_frequent_outcomes(self.outcome_frequencies.len());
        let mut table = HashMap::new();

        for context in self.map.keys() {
            let mut vec = self.most_frequent_outcomes_on_context(n, context);
            if vec.len() < n {
                for &outcome in &fallback {
                    if vec.len() == n {
                        break;
                    }
                    if !vec.contains(&outcome) {
                        vec.push(outcome);
                    }
                }
            }
            vec.sort();
            table.insert(context.clone(), vec);
        }

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_scheme_p_and_top() {
        let scheme = SimpleScheme::new(vec![1, 2, 3], vec![0.5, 0.3, 0.2]);
        assert_eq!(scheme.p(2), 0.3);
        assert_eq!(scheme.p(9), 0.0);
        assert_eq!(scheme.get_top(2).unwrap(), vec![1, 2]);
        assert!(matches!(
            scheme.get_top(10),
            Err(SchemeError::ImpossibleRequest { requested: 10, max: 3 })
        ));
    }

    #[test]
    fn scheme_for_sum_matches_hand_convolution_for_two_draws() {
        // P(1)=0.5, P(2)=0.5; sum of 2 draws: P(2)=0.25, P(3)=0.5, P(4)=0.25.
        let scheme = SimpleScheme::new(vec![1, 2], vec![0.5, 0.5]);
        let sum_scheme = scheme.get_scheme_for_sum(2);
        assert!((sum_scheme.p(2) - 0.25).abs() < 1e-9);
        assert!((sum_scheme.p(3) - 0.5).abs() < 1e-9);
        assert!((sum_scheme.p(4) - 0.25).abs() < 1e-9);
        assert_eq!(sum_scheme.p(1), 0.0);
    }

    #[test]
    fn conditional_scheme_from_kgram_model() {
        let mut model = KGramModel::new(2);
        model.train(&[1, 2, 1, 2, 1, 2, 1]);
        let scheme = ConditionalScheme::new(&model);
        // Every observed context should have a conditional distribution summing to 1.
        for (context, _) in scheme.contexts_and_probabilities() {
            let total: f64 = scheme
                .map
                .get(context)
                .unwrap()
                .values()
                .sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn assignment_table_pads_short_contexts() {
        let mut model = KGramModel::new(2);
        model.train(&[1, 2, 1, 3, 1, 2]);
        let scheme = ConditionalScheme::new(&model);
        let table = scheme.build_assignment_table(2);
        for vec in table.values() {
            assert_eq!(vec.len(), 2);
        }
    }
}
