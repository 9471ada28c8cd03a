//! The per-run result object, serialized to JSON so a simulation's numbers
//! are machine-diffable.

use std::collections::HashMap;

use serde::Serialize;

/// Summary statistics for one completed simulation run.
#[derive(Serialize, Debug)]
pub struct SimulationResult {
    pub speculation_width: usize,
    pub predictor_name: String,
    pub successful_decodes: u64,
    pub mean_truly_guesses: f64,
    pub total_attempts: u64,
    pub mean_codewords: f64,
    pub min_codewords: usize,
    pub max_codewords: usize,
    pub std_codewords: f64,
    pub codeword_throughput_counts: HashMap<usize, u64>,
    pub predictor_cardinality: usize,
}

impl SimulationResult {
    /// Builds a result from one decoder run's raw per-round sequences.
    pub fn from_run(
        speculation_width: usize,
        predictor_name: impl Into<String>,
        predictor_cardinality: usize,
        successes: u64,
        tries: u64,
        commits_per_round: &[usize],
        truly_guessed_per_round: &[u32],
    ) -> Self {
        let mean_codewords = mean(commits_per_round);
        let std_codewords = std_dev(commits_per_round, mean_codewords);
        let min_codewords = commits_per_round.iter().copied().min().unwrap_or(0);
        let max_codewords = commits_per_round.iter().copied().max().unwrap_or(0);

        let mut codeword_throughput_counts = HashMap::new();
        for &count in commits_per_round {
            *codeword_throughput_counts.entry(count).or_insert(0) += 1;
        }

        let mean_truly_guesses = mean_u32(truly_guessed_per_round);

        Self {
            speculation_width,
            predictor_name: predictor_name.into(),
            successful_decodes: successes,
            mean_truly_guesses,
            total_attempts: tries,
            mean_codewords,
            min_codewords,
            max_codewords,
            std_codewords,
            codeword_throughput_counts,
            predictor_cardinality,
        }
    }
}

fn mean(values: &[usize]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<usize>() as f64 / values.len() as f64
}

fn mean_u32(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[usize], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|&v| {
            let diff = v as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_commit_counts() {
        let result = SimulationResult::from_run(2, "Static", 4, 10, 15, &[1, 2, 1, 3], &[1, 0, 1, 1]);
        assert_eq!(result.min_codewords, 1);
        assert_eq!(result.max_codewords, 3);
        assert!((result.mean_codewords - 1.75).abs() < 1e-9);
        assert_eq!(result.codeword_throughput_counts[&1], 2);
        assert!((result.mean_truly_guesses - 0.75).abs() < 1e-9);
    }

    #[test]
    fn empty_rounds_summarize_to_zero() {
        let result = SimulationResult::from_run(2, "Static", 0, 0, 0, &[], &[]);
        assert_eq!(result.mean_codewords, 0.0);
        assert_eq!(result.min_codewords, 0);
    }
}
