//! A sliding-window k-gram frequency model over a sequence of outcomes
//! (in this system, codeword bit-lengths).

use std::collections::HashMap;

/// Accumulates k-gram and marginal-outcome frequencies over a fed sequence.
///
/// The window is initialized with `k` sentinel (`None`) slots. Feeding an
/// outcome shifts the window and appends it; the window only starts
/// contributing complete k-grams once every sentinel has been pushed out —
/// and even then, the k-gram for the round that *first* completes the window
/// is not counted, only k-grams formed from rounds after that (mirroring the
/// grounding model exactly: a k-gram counts a transition, and the first full
/// window has no preceding transition to count).
#[derive(Debug, Clone)]
pub struct KGramModel {
    k: usize,
    window: Vec<Option<usize>>,
    is_ok: bool,
    alphabet: std::collections::HashSet<usize>,
    outcome_frequencies: HashMap<usize, u64>,
    kgram_frequencies: HashMap<Vec<usize>, u64>,
}

impl KGramModel {
    /// Creates a model with window size `k`.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            window: vec![None; k],
            is_ok: false,
            alphabet: std::collections::HashSet::new(),
            outcome_frequencies: HashMap::new(),
            kgram_frequencies: HashMap::new(),
        }
    }

    /// Window size.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of distinct outcomes seen so far.
    pub fn number_of_outcomes(&self) -> usize {
        self.outcome_frequencies.len()
    }

    /// The alphabet of outcomes seen so far.
    pub fn alphabet(&self) -> &std::collections::HashSet<usize> {
        &self.alphabet
    }

    /// Observed k-gram frequencies, keyed by the full window tuple.
    pub fn frequencies(&self) -> &HashMap<Vec<usize>, u64> {
        &self.kgram_frequencies
    }

    /// Observed marginal outcome frequencies.
    pub fn outcome_frequencies(&self) -> &HashMap<usize, u64> {
        &self.outcome_frequencies
    }

    /// Feeds one outcome into the model.
    pub fn feed(&mut self, symbol: usize) {
        self.window.remove(0);
        self.window.push(Some(symbol));

        *self.outcome_frequencies.entry(symbol).or_insert(0) += 1;
        self.alphabet.insert(symbol);

        if self.is_ok {
            let key: Vec<usize> = self.window.iter().map(|o| o.unwrap()).collect();
            *self.kgram_frequencies.entry(key).or_insert(0) += 1;
        } else if self.window.iter().all(Option::is_some) {
            self.is_ok = true;
        }
    }

    /// Feeds a whole sample, in order.
    pub fn train(&mut self, sample: &[usize]) {
        for &s in sample {
            self.feed(s);
        }
    }

    /// Top-`n` outcomes by marginal frequency, descending. Ties are broken
    /// arbitrarily (by whatever order the underlying hash map yields).
    pub fn most_frequent_outcomes(&self, n: usize) -> Vec<usize> {
        let mut entries: Vec<(usize, u64)> = self
            .outcome_frequencies
            .iter()
            .map(|(&o, &f)| (o, f))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.into_iter().take(n).map(|(o, _)| o).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_must_fill_before_counting_kgrams() {
        let mut model = KGramModel::new(3);
        model.train(&[1, 2, 3]);
        // First full window (1,2,3) forms on the 3rd feed, but per the
        // grounding semantics that round doesn't get counted yet.
        assert!(model.frequencies().is_empty());

        model.feed(4);
        // Window is now (2,3,4); this is the first counted k-gram.
        assert_eq!(model.frequencies().get(&vec![2, 3, 4]), Some(&1));
    }

    #[test]
    fn marginal_outcome_frequencies_count_every_feed() {
        let mut model = KGramModel::new(2);
        model.train(&[1, 1, 2]);
        assert_eq!(model.outcome_frequencies().get(&1), Some(&2));
        assert_eq!(model.outcome_frequencies().get(&2), Some(&1));
        assert_eq!(model.number_of_outcomes(), 2);
    }

    #[test]
    fn most_frequent_outcomes_orders_by_count() {
        let mut model = KGramModel::new(1);
        model.train(&[5, 5, 5, 7, 7, 9]);
        assert_eq!(model.most_frequent_outcomes(2), vec![5, 7]);
    }

    #[test]
    fn repeated_full_windows_accumulate() {
        let mut model = KGramModel::new(2);
        model.train(&[1, 2, 1, 2, 1, 2]);
        // windows after the first full one: (2,1),(1,2),(2,1),(1,2)
        assert_eq!(model.frequencies().get(&vec![2, 1]), Some(&2));
        assert_eq!(model.frequencies().get(&vec![1, 2]), Some(&2));
    }
}
