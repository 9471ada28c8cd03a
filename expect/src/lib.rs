//! Memoized calculators for the expected number of codewords a speculative
//! chain commits, given an L-vector (and, for the conditional form, a
//! context).

use std::cell::RefCell;
use std::collections::HashMap;

use lenscheme::{ConditionalScheme, SimpleScheme};

fn sorted(l_vec: &[usize]) -> Vec<usize> {
    let mut v = l_vec.to_vec();
    v.sort_unstable();
    v
}

/// `drop_and_shift(L, i)`: offsets strictly past `L[i]`, shifted so `L[i]`
/// becomes the new origin. Entries equal to `L[i]` are dropped (a repeated
/// offset can't start a second, distinct codeword at the same position).
fn drop_and_shift(l_vec: &[usize], i: usize) -> Vec<usize> {
    let pivot = l_vec[i];
    l_vec[i + 1..]
        .iter()
        .filter(|&&x| x > pivot)
        .map(|&x| x - pivot)
        .collect()
}

/// Expectation-of-commits calculator over a context-free [`SimpleScheme`].
///
/// The cache is owned by the instance (a plain `HashMap` behind a
/// `RefCell`, not a shared lock) so that parallel optimizer workers each get
/// their own calculator and never contend on this cache.
pub struct SimpleCalculator {
    scheme: SimpleScheme,
    cache: RefCell<HashMap<(usize, Vec<usize>), f64>>,
}

impl SimpleCalculator {
    /// Builds a calculator over `scheme`.
    pub fn new(scheme: SimpleScheme) -> Self {
        Self {
            scheme,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// `score(w, L) = E(w, sort(L))`.
    pub fn score(&self, w: usize, l_vec: &[usize]) -> f64 {
        self.expectation_sorted(w, &sorted(l_vec))
    }

    /// The underlying scheme, for callers (like the `greedy` optimizer
    /// path) that need `get_top`/`get_scheme_for_sum` directly.
    pub fn scheme(&self) -> &SimpleScheme {
        &self.scheme
    }

    /// Expected number of codewords the chain contains, given the (already
    /// sorted) L-vector `l_vec` restricted to its first `w` entries.
    pub fn expectation_sorted(&self, w: usize, l_vec: &[usize]) -> f64 {
        if w == 0 {
            return 0.0;
        }
        let key = (w, l_vec.to_vec());
        if let Some(&cached) = self.cache.borrow().get(&key) {
            return cached;
        }

        let mut res = 0.0;
        for i in 0..w {
            let Some(&li) = l_vec.get(i) else {
                continue;
            };
            let new_l = drop_and_shift(l_vec, i);
            let new_w = w - (i + 1);
            res += self.scheme.p(li) * (1.0 + self.expectation_sorted(new_w, &new_l));
        }

        self.cache.borrow_mut().insert(key, res);
        res
    }
}

/// Expectation-of-commits calculator over a context-conditioned
/// [`ConditionalScheme`].
pub struct ConditionalCalculator {
    scheme: ConditionalScheme,
    cache: RefCell<HashMap<(usize, Vec<usize>, Vec<usize>), f64>>,
}

impl ConditionalCalculator {
    /// Builds a calculator over `scheme`.
    pub fn new(scheme: ConditionalScheme) -> Self {
        Self {
            scheme,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// `score(w, L) = complete_expectation_sorted(w, sort(L))`.
    pub fn score(&self, w: usize, l_vec: &[usize]) -> f64 {
        self.complete_expectation_sorted(w, &sorted(l_vec))
    }

    /// `E(w, L, ctx)`, memoized on `(w, L, ctx)`.
    pub fn expectation_sorted(&self, w: usize, l_vec: &[usize], context: &[usize]) -> f64 {
        if w == 0 {
            return 0.0;
        }
        let key = (w, l_vec.to_vec(), context.to_vec());
        if let Some(&cached) = self.cache.borrow().get(&key) {
            return cached;
        }

        let mut res = 0.0;
        for i in 0..w {
            let Some(&li) = l_vec.get(i) else {
                continue;
            };
            let new_l = drop_and_shift(l_vec, i);
            let mut new_context = context.to_vec();
            if !new_context.is_empty() {
                new_context.remove(0);
            }
            new_context.push(li);
            let new_w = w - (i + 1);
            res += self.scheme.p(li, context)
                * (1.0 + self.expectation_sorted(new_w, &new_l, &new_context));
        }

        self.cache.borrow_mut().insert(key, res);
        res
    }

    /// `Σ_ctx p(ctx) · E(w, L, ctx)` over every observed context.
    pub fn complete_expectation_sorted(&self, w: usize, l_vec: &[usize]) -> f64 {
        let mut res = 0.0;
        for (context, p) in self.scheme.contexts_and_probabilities() {
            res += p * self.expectation_sorted(w, l_vec, context);
        }
        res
    }

    /// Like [`Self::complete_expectation_sorted`], but the L-vector used for
    /// each context is produced by `assign(context)` rather than fixed.
    pub fn complete_expectation_sorted_with_assignment(
        &self,
        w: usize,
        assign: impl Fn(&[usize]) -> Vec<usize>,
    ) -> f64 {
        let mut res = 0.0;
        for (context, p) in self.scheme.contexts_and_probabilities() {
            res += p * self.expectation_sorted(w, &assign(context), context);
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgram::KGramModel;

    #[test]
    fn zero_width_always_scores_zero() {
        let scheme = SimpleScheme::new(vec![1, 2], vec![0.5, 0.5]);
        let calc = SimpleCalculator::new(scheme);
        assert_eq!(calc.score(0, &[3, 5]), 0.0);
    }

    #[test]
    fn single_offset_reduces_to_its_own_probability() {
        let scheme = SimpleScheme::new(vec![1, 2, 3], vec![0.2, 0.3, 0.5]);
        let calc = SimpleCalculator::new(scheme);
        // E(1, (2,)) = p(2) * (1 + E(0, ())) = p(2)
        assert!((calc.score(1, &[2]) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn memoized_result_matches_recomputation() {
        let scheme = SimpleScheme::new(vec![1, 2, 3], vec![0.2, 0.3, 0.5]);
        let calc = SimpleCalculator::new(scheme);
        let first = calc.score(2, &[1, 3]);
        let second = calc.score(2, &[1, 3]);
        assert_eq!(first, second);
    }

    #[test]
    fn conditional_calculator_over_trained_model() {
        let mut model = KGramModel::new(2);
        model.train(&[1, 2, 1, 2, 1, 2, 1]);
        let scheme = lenscheme::ConditionalScheme::new(&model);
        let calc = ConditionalCalculator::new(scheme);
        let score = calc.score(1, &[2]);
        assert!(score >= 0.0 && score <= 1.0);
    }
}
