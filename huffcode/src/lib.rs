#![doc = include_str!("../README.md")]

//! Canonical Huffman tree construction, code generation, encoding and decoding.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;

use thiserror::Error;

/// Errors raised by the operations in this crate.
///
/// This mirrors the error taxonomy of the speculative decoder's design: only
/// the kinds that can actually occur in `huffcode` (`UnknownSymbol` and
/// `MalformedCodestream`) are ever constructed; `InvalidArgument` exists for
/// forward compatibility with callers that validate histograms before they
/// reach this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HuffmanError {
    /// The caller passed something this crate's type signatures already rule
    /// out at compile time; reserved for callers layered on top.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// `encode` was asked to encode a symbol with no entry in the code table.
    #[error("symbol has no assigned code")]
    UnknownSymbol,
    /// `decode` tried to descend into a child that doesn't exist.
    #[error("codestream is malformed: no child at bit {bit_index}")]
    MalformedCodestream {
        /// Index (from the start of `bits`) of the offending bit.
        bit_index: usize,
    },
}

/// A node of a Huffman tree: either a leaf carrying a symbol, or an internal
/// node carrying up to two children.
///
/// Internal nodes produced by [`build_tree`] always have both children
/// populated (every internal node is the fusion of two popped heap entries).
/// Internal nodes produced by [`build_decoding_tree`] may have either child
/// missing, since that tree is grown incrementally, one bit at a time, from
/// codes alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<S> {
    /// A leaf carrying one symbol.
    Leaf {
        /// The symbol this leaf decodes to.
        symbol: S,
        /// Number of occurrences used to build this leaf (zero for decode
        /// trees built from codes alone).
        frequency: u64,
    },
    /// An internal node with up to two children.
    Internal {
        /// Sum of the frequencies of the subtree (zero for decode trees).
        frequency: u64,
        /// Left child, reached by bit `'0'`.
        left: Option<Box<Node<S>>>,
        /// Right child, reached by bit `'1'`.
        right: Option<Box<Node<S>>>,
    },
}

impl<S> Node<S> {
    /// Returns the frequency stored at this node.
    pub fn frequency(&self) -> u64 {
        match self {
            Node::Leaf { frequency, .. } => *frequency,
            Node::Internal { frequency, .. } => *frequency,
        }
    }

    /// Returns the symbol if this node is a leaf.
    pub fn symbol(&self) -> Option<&S> {
        match self {
            Node::Leaf { symbol, .. } => Some(symbol),
            Node::Internal { .. } => None,
        }
    }
}

/// Heap entry used by [`build_tree`]; order by frequency, then by insertion
/// order, so that identical inputs always fuse nodes in the same order.
struct HeapEntry<S> {
    freq: u64,
    seq: usize,
    node: Node<S>,
}

impl<S> PartialEq for HeapEntry<S> {
    fn eq(&self, other: &Self) -> bool {
        self.freq == other.freq && self.seq == other.seq
    }
}
impl<S> Eq for HeapEntry<S> {}

impl<S> PartialOrd for HeapEntry<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> Ord for HeapEntry<S> {
    /// Reversed so that `BinaryHeap` (a max-heap) pops the smallest
    /// frequency first, breaking ties by earliest insertion.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .freq
            .cmp(&self.freq)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Builds a Huffman tree from a frequency histogram.
///
/// Returns `None` for an empty histogram. A single-entry histogram yields a
/// solitary leaf (never wrapped in an internal node) — the root-is-a-leaf
/// case that [`generate_codes`] and [`decode`] special-case.
pub fn build_tree<S: Clone>(histogram: &HashMap<S, u64>) -> Option<Node<S>> {
    if histogram.is_empty() {
        return None;
    }
    if histogram.len() == 1 {
        let (symbol, &frequency) = histogram.iter().next().unwrap();
        return Some(Node::Leaf {
            symbol: symbol.clone(),
            frequency,
        });
    }

    let mut seq = 0usize;
    let mut heap: BinaryHeap<HeapEntry<S>> = histogram
        .iter()
        .map(|(symbol, &frequency)| {
            let entry = HeapEntry {
                freq: frequency,
                seq,
                node: Node::Leaf {
                    symbol: symbol.clone(),
                    frequency,
                },
            };
            seq += 1;
            entry
        })
        .collect();

    while heap.len() > 1 {
        let left = heap.pop().unwrap();
        let right = heap.pop().unwrap();
        let frequency = left.freq + right.freq;
        let merged = Node::Internal {
            frequency,
            left: Some(Box::new(left.node)),
            right: Some(Box::new(right.node)),
        };
        heap.push(HeapEntry {
            freq: frequency,
            seq,
            node: merged,
        });
        seq += 1;
    }

    Some(heap.pop().unwrap().node)
}

/// Depth-first traversal emitting `'0'` for a left descent, `'1'` for a right
/// descent. A leaf at the root (single-symbol alphabet) is special-cased to
/// the one-bit code `"0"`.
pub fn generate_codes<S: Clone + Eq + Hash>(tree: &Option<Node<S>>) -> HashMap<S, String> {
    let mut codes = HashMap::new();
    let Some(root) = tree else {
        return codes;
    };
    if let Node::Leaf { symbol, .. } = root {
        codes.insert(symbol.clone(), "0".to_string());
        return codes;
    }
    let mut current_code = String::new();
    collect_codes(root, &mut current_code, &mut codes);
    codes
}

fn collect_codes<S: Clone + Eq + Hash>(
    node: &Node<S>,
    current_code: &mut String,
    codes: &mut HashMap<S, String>,
) {
    match node {
        Node::Leaf { symbol, .. } => {
            codes.insert(symbol.clone(), current_code.clone());
        }
        Node::Internal { left, right, .. } => {
            if let Some(left) = left {
                current_code.push('0');
                collect_codes(left, current_code, codes);
                current_code.pop();
            }
            if let Some(right) = right {
                current_code.push('1');
                collect_codes(right, current_code, codes);
                current_code.pop();
            }
        }
    }
}

/// Encodes a sequence of symbols as a bit string, concatenating each
/// symbol's code in order.
pub fn encode<S: Eq + Hash>(
    sequence: &[S],
    codes: &HashMap<S, String>,
) -> Result<String, HuffmanError> {
    let mut bits = String::new();
    for symbol in sequence {
        let code = codes.get(symbol).ok_or(HuffmanError::UnknownSymbol)?;
        bits.push_str(code);
    }
    Ok(bits)
}

/// Decodes a bit string against a Huffman tree, restarting at the root after
/// every emitted symbol.
///
/// A bare leaf at the root (single-symbol alphabet) is special-cased: every
/// bit in `bits` decodes to one copy of that symbol, regardless of its
/// value, so the output length equals the input bit length.
pub fn decode<S: Clone>(bits: &str, tree: &Option<Node<S>>) -> Result<Vec<S>, HuffmanError> {
    let Some(root) = tree else {
        return Ok(Vec::new());
    };
    if let Node::Leaf { symbol, .. } = root {
        return Ok(bits.chars().map(|_| symbol.clone()).collect());
    }

    let mut decoded = Vec::new();
    let mut current = root;
    for (bit_index, bit) in bits.chars().enumerate() {
        let Node::Internal { left, right, .. } = current else {
            unreachable!("leaves reset `current` to the root before the next bit")
        };
        let next = match bit {
            '0' => left.as_deref(),
            '1' => right.as_deref(),
            _ => None,
        };
        current = next.ok_or(HuffmanError::MalformedCodestream { bit_index })?;

        if let Node::Leaf { symbol, .. } = current {
            decoded.push(symbol.clone());
            current = root;
        }
    }
    Ok(decoded)
}

/// Builds a decode tree from a code table alone — no frequency information
/// is available, so every node in the returned tree has frequency zero.
/// Downstream code must not rely on frequencies of nodes built this way.
pub fn build_decoding_tree<S: Clone>(codes: &HashMap<S, String>) -> Option<Node<S>> {
    if codes.is_empty() {
        return None;
    }

    let mut root = Node::Internal {
        frequency: 0,
        left: None,
        right: None,
    };

    for (symbol, code) in codes {
        let mut current = &mut root;
        for bit in code.chars() {
            let Node::Internal { left, right, .. } = current else {
                unreachable!("only internal nodes are ever attached to mid-walk")
            };
            let slot = match bit {
                '0' => left,
                '1' => right,
                other => panic!("code contains non-binary character {other:?}"),
            };
            current = slot.get_or_insert_with(|| {
                Box::new(Node::Internal {
                    frequency: 0,
                    left: None,
                    right: None,
                })
            });
        }
        match current {
            Node::Internal {
                frequency,
                left,
                right,
            } if left.is_none() && right.is_none() => {
                *current = Node::Leaf {
                    symbol: symbol.clone(),
                    frequency: *frequency,
                };
            }
            _ => panic!("code {code:?} collides with a shorter, previously assigned code"),
        }
    }

    Some(root)
}

/// `(|original| * char_size) / |encoded|`; returns `0.0` (undefined) if
/// either side is empty.
pub fn compression_ratio(original_len: usize, encoded_len: usize, char_size: u32) -> f64 {
    if original_len == 0 || encoded_len == 0 {
        return 0.0;
    }
    (original_len as f64 * char_size as f64) / encoded_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;

    #[test]
    fn empty_histogram() {
        let histogram: HashMap<char, u64> = hashmap! {};
        let tree = build_tree(&histogram);
        assert!(tree.is_none());
        let codes = generate_codes(&tree);
        assert!(codes.is_empty());
        assert_eq!(decode::<char>("", &tree).unwrap(), vec![]);
    }

    #[test]
    fn single_symbol_alphabet() {
        let histogram = hashmap! {'x' => 7u64};
        let tree = build_tree(&histogram);
        let codes = generate_codes(&tree);
        assert_eq!(codes, hashmap! {'x' => "0".to_string()});

        let encoded = encode(&['x', 'x', 'x', 'x'], &codes).unwrap();
        assert_eq!(encoded, "0000");

        // Any bit string of length L decodes to L copies of x, regardless of value.
        let decoded = decode(&"1010", &tree).unwrap();
        assert_eq!(decoded, vec!['x', 'x', 'x', 'x']);
    }

    #[test]
    fn three_symbol_roundtrip() {
        // a:5, b:2, c:1 -> canonical lengths {a:1, b:2, c:2}.
        let histogram = hashmap! {'a' => 5u64, 'b' => 2u64, 'c' => 1u64};
        let tree = build_tree(&histogram);
        let codes = generate_codes(&tree);
        let mut lengths: Vec<_> = codes.iter().map(|(s, c)| (*s, c.len())).collect();
        lengths.sort();
        assert_eq!(lengths, vec![('a', 1), ('b', 2), ('c', 2)]);

        let data: Vec<char> = "abacab".chars().collect();
        let encoded = encode(&data, &codes).unwrap();
        let decoded = decode(&encoded, &tree).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn kraft_sum_equality_for_complete_tree() {
        let histogram = hashmap! {'d' => 12u64, 'e' => 11u64, 'f' => 10u64, 'a' => 3u64, 'b' => 2u64, 'c' => 1u64};
        let tree = build_tree(&histogram);
        let codes = generate_codes(&tree);
        let kraft: f64 = codes.values().map(|c| 2f64.powi(-(c.len() as i32))).sum();
        assert!((kraft - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_symbol_errors() {
        let histogram = hashmap! {'a' => 1u64, 'b' => 1u64};
        let tree = build_tree(&histogram);
        let codes = generate_codes(&tree);
        let err = encode(&['z'], &codes).unwrap_err();
        assert_eq!(err, HuffmanError::UnknownSymbol);
    }

    #[test]
    fn malformed_codestream_on_missing_child() {
        // A decode tree built pathologically from a single code {'s': "0"} has
        // no right child at the root: walking "1" must fail.
        let codes = hashmap! {'s' => "0".to_string()};
        let tree = build_decoding_tree(&codes);
        let err = decode(&"1", &tree).unwrap_err();
        assert_eq!(err, HuffmanError::MalformedCodestream { bit_index: 0 });
    }

    #[test]
    fn decoding_tree_isomorphic_to_huffman_tree() {
        let histogram = hashmap! {'a' => 5u64, 'b' => 2u64, 'c' => 1u64};
        let tree = build_tree(&histogram);
        let codes = generate_codes(&tree);
        let decoding_tree = build_decoding_tree(&codes);
        let mut from_tree = generate_codes(&tree).into_iter().collect::<Vec<_>>();
        let mut from_decoding_tree = generate_codes(&decoding_tree).into_iter().collect::<Vec<_>>();
        from_tree.sort();
        from_decoding_tree.sort();
        assert_eq!(from_tree, from_decoding_tree);
    }

    #[test]
    fn compression_ratio_is_undefined_when_empty() {
        assert_eq!(compression_ratio(0, 10, 8), 0.0);
        assert_eq!(compression_ratio(10, 0, 8), 0.0);
        assert_eq!(compression_ratio(10, 40, 8), 2.0);
    }
}
