//! The length-predictor family: static, dynamic (k-gram-conditioned), and
//! zero-order reconstruction from raw data.

use std::collections::HashMap;

use huffcode::{build_tree, generate_codes};

/// Capability set shared by every length predictor.
///
/// Modeled as a single trait with provided default methods for the optional
/// capabilities (`predict`, `train_on_data`, `reconstruct`), rather than a
/// class hierarchy: a predictor opts into training or reconstruction simply
/// by overriding the corresponding default.
pub trait Predictor {
    /// Returns `n` predicted forward lengths without consuming any input.
    fn implicitly_predict(&self, n: usize) -> Vec<usize>;

    /// Folds one observed length into the predictor's internal context.
    fn feed(&mut self, length: usize);

    /// Convenience: `feed(previous)` followed by `implicitly_predict(n)`.
    fn predict(&mut self, previous: usize, n: usize) -> Vec<usize> {
        self.feed(previous);
        self.implicitly_predict(n)
    }

    /// Size of this predictor's internal table (assignment table length,
    /// prediction vector length, or similar — predictor-specific).
    fn cardinality(&self) -> usize;

    /// Human-readable predictor name, for reporting.
    fn name(&self) -> &str;

    /// Whether this predictor needs training/reconstruction before use.
    fn requires_training(&self) -> bool {
        false
    }

    /// Trains the predictor on a length sequence. No-op unless overridden.
    fn train_on_data(&mut self, _lengths: &[usize]) {}

    /// Rebuilds the predictor from raw byte data. No-op unless overridden.
    fn reconstruct(&mut self, _data: &[u8]) {}
}

/// Holds a fixed L-vector produced by offline optimization.
pub struct StaticPredictor {
    prediction_table: Vec<usize>,
}

impl StaticPredictor {
    /// Builds a predictor that always returns (a prefix of) `prediction_vector`.
    pub fn new(prediction_vector: Vec<usize>) -> Self {
        Self {
            prediction_table: prediction_vector,
        }
    }
}

impl Predictor for StaticPredictor {
    fn implicitly_predict(&self, n: usize) -> Vec<usize> {
        self.prediction_table[..n.min(self.prediction_table.len())].to_vec()
    }

    fn feed(&mut self, _length: usize) {}

    fn cardinality(&self) -> usize {
        self.prediction_table.len()
    }

    fn name(&self) -> &str {
        "StaticPredictor"
    }
}

/// Holds a context window of recent lengths and an assignment table mapping
/// each observed context to its L-vector, falling back to a fixed variant
/// for contexts never seen during optimization.
pub struct DynamicPredictor {
    assignment_table: HashMap<Vec<usize>, Vec<usize>>,
    context: Vec<usize>,
    backup_variant: Vec<usize>,
}

impl DynamicPredictor {
    /// Builds a predictor over a pre-computed assignment table.
    pub fn new(
        assignment_table: HashMap<Vec<usize>, Vec<usize>>,
        initial_context: Vec<usize>,
        mut backup_variant: Vec<usize>,
    ) -> Self {
        backup_variant.sort_unstable();
        Self {
            assignment_table,
            context: initial_context,
            backup_variant,
        }
    }

    /// The predictor's current context window.
    pub fn context(&self) -> &[usize] {
        &self.context
    }
}

impl Predictor for DynamicPredictor {
    fn implicitly_predict(&self, n: usize) -> Vec<usize> {
        if let Some(variant) = self.assignment_table.get(&self.context) {
            variant[..n.min(variant.len())].to_vec()
        } else {
            self.backup_variant[..n.min(self.backup_variant.len())].to_vec()
        }
    }

    fn feed(&mut self, length: usize) {
        if !self.context.is_empty() {
            self.context.remove(0);
        }
        self.context.push(length);
    }

    fn cardinality(&self) -> usize {
        self.assignment_table.len()
    }

    fn name(&self) -> &str {
        "DynamicPredictor"
    }
}

/// Reconstructs a zero-order (context-free) length prediction directly from
/// raw byte data, by building the Huffman code over its byte frequencies and
/// ranking lengths by their induced probability mass.
#[derive(Default)]
pub struct ZeroOrderPredictor {
    codes: HashMap<usize, u64>,
    prediction_table: Vec<usize>,
}

impl ZeroOrderPredictor {
    /// An empty reconstructor; call [`Predictor::reconstruct`] before use.
    pub fn new() -> Self {
        Self::default()
    }

    fn reconstruct_length_probabilities(&self) -> HashMap<usize, f64> {
        let mut probabilities = HashMap::new();
        for (&length, &count) in &self.codes {
            *probabilities.entry(length).or_insert(0.0) += 2f64.powi(-(length as i32)) * count as f64;
        }
        probabilities
    }

    fn form_prediction(&mut self) {
        let probabilities = self.reconstruct_length_probabilities();
        let mut ranked: Vec<(usize, f64)> = probabilities.into_iter().collect();
        // `2f64.powi(-length) * count` is finite and non-negative for every
        // observed code length, so partial_cmp never sees a NaN here.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        self.prediction_table = ranked.into_iter().map(|(length, _)| length).collect();
    }
}

impl Predictor for ZeroOrderPredictor {
    fn implicitly_predict(&self, n: usize) -> Vec<usize> {
        self.prediction_table[..n.min(self.prediction_table.len())].to_vec()
    }

    fn feed(&mut self, _length: usize) {}

    fn cardinality(&self) -> usize {
        self.prediction_table.len()
    }

    fn name(&self) -> &str {
        "ZeroOrderProbabilitiesReconstructor"
    }

    fn requires_training(&self) -> bool {
        false
    }

    fn reconstruct(&mut self, data: &[u8]) {
        let mut frequencies: HashMap<u8, u64> = HashMap::new();
        for &byte in data {
            *frequencies.entry(byte).or_insert(0) += 1;
        }
        let tree = build_tree(&frequencies);
        let codes = generate_codes(&tree);

        let mut length_counts: HashMap<usize, u64> = HashMap::new();
        for code in codes.values() {
            *length_counts.entry(code.len()).or_insert(0) += 1;
        }

        self.codes = length_counts;
        self.form_prediction();
    }
}
