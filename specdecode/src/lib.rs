//! The speculative decoder: launches `w+1` single-symbol decode attempts per
//! round at offsets predicted ahead of time, and stitches the longest
//! consecutive chain anchored at the current bit position.

use std::collections::HashMap;

use huffcode::Node;
use log::{debug, trace};
use predict::Predictor;
use rayon::prelude::*;
use symdecode::{SingleDecoder, SingleDecodingResult};

/// Decodes a Huffman-coded bit string by speculatively decoding ahead at
/// predicted offsets, falling back to the mandatory offset-0 attempt when
/// speculation misses.
///
/// Holds `w+1` single-symbol decoders sharing one decode tree, the
/// speculation width `w`, a predictor, and cursor state. Because every round
/// always attempts offset 0 against the same tree a non-speculative decoder
/// would use, the committed output is bit-for-bit identical to what
/// non-speculative decoding would produce — speculation can only shrink a
/// round's chain, never change a decoded symbol.
pub struct SpeculativeDecoder<S, P: Predictor> {
    decoders: Vec<SingleDecoder<S>>,
    w: usize,
    predictor: P,
    position: usize,
    previous: Option<S>,
    chain_length_limit: Option<usize>,
}

impl<S: Clone + Send + Sync, P: Predictor> SpeculativeDecoder<S, P> {
    /// Builds a decoder with speculation width `w` over `tree`, using
    /// `predictor` to choose forward offsets each round.
    pub fn new(tree: Option<Node<S>>, w: usize, predictor: P) -> Self {
        let decoders = (0..=w).map(|_| SingleDecoder::new(tree.clone())).collect();
        Self {
            decoders,
            w,
            predictor,
            position: 0,
            previous: None,
            chain_length_limit: None,
        }
    }

    /// Caps the number of codewords committed per round (mostly useful for
    /// exercising the truncation path in tests and simulations).
    pub fn with_chain_length_limit(mut self, limit: usize) -> Self {
        self.chain_length_limit = Some(limit);
        self
    }

    /// The predictor's current "truly guessed" signal plus one speculation
    /// round starting at `position`: the maximal consecutive chain of
    /// successful attempts anchored at offset 0, and whether the mandatory
    /// attempt's length also appeared among the predicted lengths.
    pub fn speculate(
        &mut self,
        bits: &str,
        position: usize,
    ) -> (Vec<SingleDecodingResult<S>>, u32) {
        let predicted = self.predictor.implicitly_predict(self.w);
        let mut offsets = Vec::with_capacity(self.w + 1);
        offsets.push(0usize);
        offsets.extend(predicted.iter().copied());

        let bits_len = bits.len();
        let attempts: Vec<Option<(usize, SingleDecodingResult<S>)>> = self
            .decoders
            .par_iter_mut()
            .zip(offsets.par_iter())
            .map(|(decoder, &offset)| {
                let attempt_position = position + offset;
                if attempt_position < bits_len {
                    let result = decoder.decode(bits, attempt_position);
                    if result.was_decoded {
                        return Some((offset, result));
                    }
                }
                None
            })
            .collect();

        let successes: HashMap<usize, SingleDecodingResult<S>> =
            attempts.into_iter().flatten().collect();

        let Some(first) = successes.get(&0) else {
            return (Vec::new(), 0);
        };

        let truly_guessed = if predicted.contains(&first.length) { 1 } else { 0 };

        let mut chain = Vec::new();
        let mut offset = 0usize;
        while let Some(result) = successes.get(&offset) {
            offset += result.length;
            chain.push(result.clone());
        }

        if let Some(limit) = self.chain_length_limit {
            chain.truncate(limit);
        }

        (chain, truly_guessed)
    }

    /// Decodes the whole bit string, round by round, until no progress can
    /// be made (the remainder of `bits` is then trailing/malformed data).
    ///
    /// Returns the decoded symbols, `(successes, tries)` totals, and the
    /// per-round commit-length and truly-guessed sequences.
    pub fn decode(&mut self, bits: &str) -> (Vec<S>, (u64, u64), Vec<usize>, Vec<u32>) {
        self.position = 0;
        let mut output = Vec::new();
        let mut successes = 0u64;
        let mut tries = 0u64;
        let mut commits_per_round = Vec::new();
        let mut truly_guessed_per_round = Vec::new();

        while self.position < bits.len() {
            tries += (self.w + 1) as u64;
            let (chain, truly_guessed) = self.speculate(bits, self.position);
            if chain.is_empty() {
                debug!(
                    "speculative decode stopped at bit position {}: no forward progress",
                    self.position
                );
                break;
            }

            trace!(
                "round at {}: committed {} codeword(s), truly_guessed={}",
                self.position,
                chain.len(),
                truly_guessed
            );
            successes += chain.len() as u64;
            commits_per_round.push(chain.len());
            truly_guessed_per_round.push(truly_guessed);

            self.previous = chain[0].symbol.clone();
            let mut advance = 0usize;
            for result in &chain {
                if let Some(symbol) = &result.symbol {
                    output.push(symbol.clone());
                }
                self.predictor.feed(result.length);
                advance += result.length;
            }
            self.position += advance;
        }

        debug!(
            "speculative decode finished: {} symbols, {} successes / {} tries",
            output.len(),
            successes,
            tries
        );
        (output, (successes, tries), commits_per_round, truly_guessed_per_round)
    }

    /// Resets cursor state (`position`, `previous`) and every decoder's
    /// statistics, without rebuilding the decode tree or predictor.
    pub fn flush(&mut self) {
        self.position = 0;
        self.previous = None;
        for decoder in &mut self.decoders {
            decoder.reset_statistics();
        }
    }

    /// The cursor's current bit position.
    pub fn position(&self) -> usize {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huffcode::{build_tree, generate_codes};
    use maplit::hashmap;
    use predict::StaticPredictor;

    fn setup() -> (Option<Node<char>>, String) {
        let histogram = hashmap! {'a' => 5u64, 'b' => 2u64, 'c' => 1u64};
        let tree = build_tree(&histogram);
        let codes = generate_codes(&tree);
        let data: Vec<char> = "abacabacaaab".chars().collect();
        let encoded = huffcode::encode(&data, &codes).unwrap();
        (tree, encoded)
    }

    #[test]
    fn speculative_decode_matches_non_speculative_decode() {
        let (tree, encoded) = setup();
        let expected = huffcode::decode(&encoded, &tree).unwrap();

        let predictor = StaticPredictor::new(vec![1, 2]);
        let mut decoder = SpeculativeDecoder::new(tree, 2, predictor);
        let (decoded, (successes, tries), commits, guessed) = decoder.decode(&encoded);

        assert_eq!(decoded, expected);
        assert!(tries >= successes);
        assert_eq!(commits.len(), guessed.len());
    }

    #[test]
    fn empty_bits_produce_no_output() {
        let (tree, _) = setup();
        let predictor = StaticPredictor::new(vec![1, 2]);
        let mut decoder = SpeculativeDecoder::new(tree, 2, predictor);
        let (decoded, (successes, tries), commits, _) = decoder.decode("");
        assert!(decoded.is_empty());
        assert_eq!(successes, 0);
        assert_eq!(tries, 0);
        assert!(commits.is_empty());
    }

    #[test]
    fn flush_resets_decoder_statistics() {
        let (tree, encoded) = setup();
        let predictor = StaticPredictor::new(vec![1, 2]);
        let mut decoder = SpeculativeDecoder::new(tree, 2, predictor);
        decoder.decode(&encoded);
        decoder.flush();
        assert_eq!(decoder.position(), 0);
    }

    #[test]
    fn chain_length_limit_truncates_commits() {
        let (tree, encoded) = setup();
        let predictor = StaticPredictor::new(vec![1, 2]);
        let mut decoder = SpeculativeDecoder::new(tree, 2, predictor).with_chain_length_limit(1);
        let (_, _, commits, _) = decoder.decode(&encoded);
        assert!(commits.iter().all(|&c| c <= 1));
    }
}
