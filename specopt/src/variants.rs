//! Enumerates candidate L-vectors ("variants") to feed to [`crate::SimpleOptimizer`].

use std::collections::HashSet;

/// Generates combination-with-replacement based variants (and a baseline
/// fallback set) over a fixed codeword-length alphabet.
pub struct VariantsGenerator {
    lengths: Vec<usize>,
}

impl VariantsGenerator {
    /// Builds a generator over the given codeword lengths.
    pub fn new(lengths: Vec<usize>) -> Self {
        Self { lengths }
    }

    /// All cumulative sums reachable by choosing `r` lengths (with
    /// replacement) and partial-summing them, in every order.
    fn for_future(&self, r: usize) -> HashSet<usize> {
        let mut result = HashSet::new();
        for combo in combinations_with_replacement(&self.lengths, r) {
            let mut sum = 0usize;
            for length in combo {
                sum += length;
                result.insert(sum);
            }
        }
        result
    }

    /// Every size-`w` subset of `for_future(r)`, sorted, as a candidate
    /// L-vector.
    pub fn generate_v_set(&self, r: usize, w: usize) -> HashSet<Vec<usize>> {
        let variants: Vec<usize> = self.for_future(r).into_iter().collect();
        let mut v_set = HashSet::new();
        for combo in combinations(&variants, w) {
            let mut sorted = combo;
            sorted.sort_unstable();
            v_set.insert(sorted);
        }
        v_set
    }

    /// The `j`-fold sums of the length alphabet with itself, as a sorted
    /// vector (with `0` always included as the zero-fold sum).
    fn j_set(&self, j: usize) -> Vec<usize> {
        if j == 0 {
            return vec![0];
        }
        let previous = self.j_set(j - 1);
        let mut result = HashSet::new();
        for &l_r in &previous {
            for &l_base in &self.lengths {
                result.insert(l_base + l_r);
            }
        }
        let mut v: Vec<usize> = result.into_iter().collect();
        v.sort_unstable();
        v
    }

    /// Grows the union of `j_set(1)..j_set(j)` until it has at least `n`
    /// elements, then returns its smallest `n`, sorted.
    pub fn get_baseline_set(&self, n: usize) -> Vec<usize> {
        self.get_baseline_set_from(n, 1)
    }

    fn get_baseline_set_from(&self, n: usize, j: usize) -> Vec<usize> {
        let mut result = HashSet::new();
        for k in 1..=j {
            result.extend(self.j_set(k));
        }
        if result.len() < n {
            return self.get_baseline_set_from(n, j + 1);
        }
        let mut v: Vec<usize> = result.into_iter().collect();
        v.sort_unstable();
        v.truncate(n);
        v
    }
}

fn combinations_with_replacement(items: &[usize], r: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(r);
    combinations_with_replacement_helper(items, r, 0, &mut current, &mut out);
    out
}

fn combinations_with_replacement_helper(
    items: &[usize],
    r: usize,
    start: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if current.len() == r {
        out.push(current.clone());
        return;
    }
    for i in start..items.len() {
        current.push(items[i]);
        combinations_with_replacement_helper(items, r, i, current, out);
        current.pop();
    }
}

fn combinations(items: &[usize], w: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(w);
    combinations_helper(items, w, 0, &mut current, &mut out);
    out
}

fn combinations_helper(
    items: &[usize],
    w: usize,
    start: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if current.len() == w {
        out.push(current.clone());
        return;
    }
    for i in start..items.len() {
        current.push(items[i]);
        combinations_helper(items, w, i + 1, current, out);
        current.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_future_contains_every_prefix_sum() {
        let generator = VariantsGenerator::new(vec![1, 2]);
        // combinations_with_replacement of size 2: (1,1),(1,2),(2,2)
        // prefix sums: 1,2 / 1,3 / 2,4
        let v_set = generator.generate_v_set(2, 2);
        assert!(v_set.contains(&vec![1, 2]));
    }

    #[test]
    fn baseline_set_grows_until_it_has_n_elements() {
        let generator = VariantsGenerator::new(vec![1, 2]);
        let baseline = generator.get_baseline_set(3);
        assert_eq!(baseline.len(), 3);
        assert!(baseline.windows(2).all(|w| w[0] <= w[1]));
    }
}
