//! A stateless, single-codeword, bit-level Huffman decoder.
//!
//! Unlike [`huffcode::decode`], which walks an entire bit string end to end,
//! [`SingleDecoder`] decodes exactly one codeword starting at an arbitrary
//! bit position and reports how many bits it consumed. This is the building
//! block the speculative decoder (`specdecode`) launches `w+1` copies of, one
//! per predicted offset.

use huffcode::Node;

/// Result of one [`SingleDecoder::decode`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleDecodingResult<S> {
    /// Whether a complete codeword was decoded.
    pub was_decoded: bool,
    /// The decoded symbol, present iff `was_decoded`.
    pub symbol: Option<S>,
    /// Number of bits consumed — meaningful even on failure (how far the
    /// walk got before it had to give up).
    pub length: usize,
}

/// Running counters kept by a [`SingleDecoder`] across calls.
///
/// Purely descriptive: nothing in this crate or `specdecode` branches on
/// these values, they only feed reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodingStatistics {
    /// Total number of `decode` calls.
    pub total: u64,
    /// Calls that returned `was_decoded == true`.
    pub successful: u64,
    /// Calls that returned `was_decoded == false`.
    pub failed: u64,
    /// Sum of `length` across all calls.
    pub total_bits_consumed: u64,
    /// Successful calls that took the single-symbol-tree fast path.
    pub single_symbol_fast_path: u64,
}

impl DecodingStatistics {
    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = DecodingStatistics::default();
    }
}

/// Decodes one codeword at a time from an arbitrary bit offset, against a
/// fixed decode tree.
///
/// "Stateless" refers to the decoding contract itself: no cursor is carried
/// between calls, and the same `(bits, position)` pair always yields the
/// same result. The instance does still accumulate [`DecodingStatistics`]
/// across calls, which `reset_statistics` clears.
#[derive(Debug, Clone)]
pub struct SingleDecoder<S> {
    tree: Option<Node<S>>,
    statistics: DecodingStatistics,
}

impl<S: Clone> SingleDecoder<S> {
    /// Builds a decoder over the given (possibly absent) decode tree.
    pub fn new(tree: Option<Node<S>>) -> Self {
        Self {
            tree,
            statistics: DecodingStatistics::default(),
        }
    }

    /// Current statistics snapshot.
    pub fn statistics(&self) -> DecodingStatistics {
        self.statistics
    }

    /// Zeroes the statistics counters.
    pub fn reset_statistics(&mut self) {
        self.statistics.reset();
    }

    /// Attempts to consume one codeword starting at `position` (a bit index
    /// into `bits`, which must contain only `'0'`/`'1'` characters).
    pub fn decode(&mut self, bits: &str, position: usize) -> SingleDecodingResult<S> {
        self.statistics.total += 1;
        let bytes = bits.as_bytes();

        let Some(root) = self.tree.as_ref() else {
            self.statistics.failed += 1;
            return SingleDecodingResult {
                was_decoded: false,
                symbol: None,
                length: 0,
            };
        };
        if bytes.is_empty() || position >= bytes.len() {
            self.statistics.failed += 1;
            return SingleDecodingResult {
                was_decoded: false,
                symbol: None,
                length: 0,
            };
        }

        if let Node::Leaf { symbol, .. } = root {
            self.statistics.successful += 1;
            self.statistics.single_symbol_fast_path += 1;
            self.statistics.total_bits_consumed += 1;
            return SingleDecodingResult {
                was_decoded: true,
                symbol: Some(symbol.clone()),
                length: 1,
            };
        }

        let mut current = root;
        let mut consumed = 0usize;
        let mut idx = position;
        while idx < bytes.len() {
            let Node::Internal { left, right, .. } = current else {
                unreachable!("leaves return before looping back here")
            };
            let next = match bytes[idx] {
                b'0' => left.as_deref(),
                b'1' => right.as_deref(),
                _ => None,
            };
            let Some(next_node) = next else {
                self.statistics.failed += 1;
                self.statistics.total_bits_consumed += consumed as u64;
                return SingleDecodingResult {
                    was_decoded: false,
                    symbol: None,
                    length: consumed,
                };
            };
            consumed += 1;
            idx += 1;
            current = next_node;
            if let Node::Leaf { symbol, .. } = current {
                self.statistics.successful += 1;
                self.statistics.total_bits_consumed += consumed as u64;
                return SingleDecodingResult {
                    was_decoded: true,
                    symbol: Some(symbol.clone()),
                    length: consumed,
                };
            }
        }

        self.statistics.failed += 1;
        self.statistics.total_bits_consumed += consumed as u64;
        SingleDecodingResult {
            was_decoded: false,
            symbol: None,
            length: consumed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huffcode::{build_tree, generate_codes};
    use maplit::hashmap;

    fn tree() -> Option<Node<char>> {
        build_tree(&hashmap! {'a' => 5u64, 'b' => 2u64, 'c' => 1u64})
    }

    #[test]
    fn empty_or_out_of_range_fails_without_consuming() {
        let mut decoder = SingleDecoder::new(tree());
        assert_eq!(
            decoder.decode("", 0),
            SingleDecodingResult {
                was_decoded: false,
                symbol: None,
                length: 0
            }
        );
        let encoded = encode_str(&tree(), "a");
        assert_eq!(
            decoder.decode(&encoded, encoded.len()),
            SingleDecodingResult {
                was_decoded: false,
                symbol: None,
                length: 0
            }
        );
    }

    #[test]
    fn null_tree_always_fails() {
        let mut decoder: SingleDecoder<char> = SingleDecoder::new(None);
        assert_eq!(
            decoder.decode("01", 0),
            SingleDecodingResult {
                was_decoded: false,
                symbol: None,
                length: 0
            }
        );
    }

    #[test]
    fn single_symbol_tree_charges_exactly_one_bit() {
        let single = build_tree(&hashmap! {'x' => 1u64});
        let mut decoder = SingleDecoder::new(single);
        let result = decoder.decode("1", 0);
        assert_eq!(result.was_decoded, true);
        assert_eq!(result.symbol, Some('x'));
        assert_eq!(result.length, 1);
        assert_eq!(decoder.statistics().single_symbol_fast_path, 1);
    }

    #[test]
    fn decodes_one_codeword_from_an_arbitrary_offset() {
        let t = tree();
        let codes = generate_codes(&t);
        let encoded = huffcode::encode(&['b', 'a'], &codes).unwrap();
        let mut decoder = SingleDecoder::new(t);
        let first = decoder.decode(&encoded, 0);
        assert!(first.was_decoded);
        assert_eq!(first.symbol, Some('b'));
        let second = decoder.decode(&encoded, first.length);
        assert_eq!(second.symbol, Some('a'));
    }

    #[test]
    fn invalid_character_fails_with_bits_consumed_so_far() {
        let t = tree();
        let mut decoder = SingleDecoder::new(t);
        // 'b' has a two-bit code starting with the bit that leads away from 'a';
        // corrupt the second bit to something invalid.
        let result = decoder.decode("1x", 0);
        assert!(!result.was_decoded);
        assert_eq!(result.length, 1);
    }

    #[test]
    fn statistics_accumulate_and_reset() {
        let t = tree();
        let codes = generate_codes(&t);
        let encoded = huffcode::encode(&['a'], &codes).unwrap();
        let mut decoder = SingleDecoder::new(t);
        decoder.decode(&encoded, 0);
        decoder.decode("", 0);
        assert_eq!(decoder.statistics().total, 2);
        assert_eq!(decoder.statistics().successful, 1);
        assert_eq!(decoder.statistics().failed, 1);
        decoder.reset_statistics();
        assert_eq!(decoder.statistics(), DecodingStatistics::default());
    }

    fn encode_str(tree: &Option<Node<char>>, s: &str) -> String {
        let codes = generate_codes(tree);
        let symbols: Vec<char> = s.chars().collect();
        huffcode::encode(&symbols, &codes).unwrap()
    }
}
