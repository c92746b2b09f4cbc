//! Huffman tree construction
//!
//! Builds the optimal prefix-code tree from a [`FrequencyTable`] with the
//! classic greedy algorithm. Construction is deterministic: the same table
//! always yields the same tree, which is what lets the decoder rebuild the
//! encoder's tree from the serialized frequencies alone.

use crate::error::{CompressError, Result};
use crate::frequency::FrequencyTable;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffNode {
    Leaf {
        symbol: u8,
        freq: u64,
    },
    Internal {
        freq: u64,
        left: Box<HuffNode>,
        right: Box<HuffNode>,
    },
}

impl HuffNode {
    pub fn freq(&self) -> u64 {
        match self {
            HuffNode::Leaf { freq, .. } | HuffNode::Internal { freq, .. } => *freq,
        }
    }

    pub fn symbol(&self) -> Option<u8> {
        match self {
            HuffNode::Leaf { symbol, .. } => Some(*symbol),
            HuffNode::Internal { .. } => None,
        }
    }

    /// Child reached by following `bit` (false = left, true = right).
    pub fn child(&self, bit: bool) -> Option<&HuffNode> {
        match self {
            HuffNode::Leaf { .. } => None,
            HuffNode::Internal { left, right, .. } => Some(if bit { &**right } else { &**left }),
        }
    }

    fn merge(left: HuffNode, right: HuffNode) -> HuffNode {
        HuffNode::Internal {
            freq: left.freq().saturating_add(right.freq()),
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// Heap entry ordered by ascending frequency, then ascending insertion sequence.
#[derive(Debug)]
struct Pending {
    seq: usize,
    node: HuffNode,
}

impl Eq for Pending {}
impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap
        other
            .node
            .freq()
            .cmp(&self.node.freq())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    root: HuffNode,
}

impl HuffmanTree {
    /// Build the tree for `table`.
    ///
    /// Leaves are seeded in ascending symbol order and merged nodes are
    /// numbered after them, so equal frequencies are resolved by which node
    /// entered the queue first. The first node removed becomes the left child.
    pub fn build(table: &FrequencyTable) -> Result<Self> {
        let mut heap = BinaryHeap::with_capacity(table.symbol_count());
        let mut seq = 0usize;
        for (symbol, freq) in table.iter() {
            heap.push(Pending {
                seq,
                node: HuffNode::Leaf { symbol, freq },
            });
            seq += 1;
        }

        while heap.len() > 1 {
            let (Some(left), Some(right)) = (heap.pop(), heap.pop()) else {
                break;
            };
            heap.push(Pending {
                seq,
                node: HuffNode::merge(left.node, right.node),
            });
            seq += 1;
        }

        let root = heap
            .pop()
            .map(|p| p.node)
            .ok_or_else(|| CompressError::InvalidHeader("frequency table is empty".into()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &HuffNode {
        &self.root
    }

    /// True when the tree holds a single symbol and the root is that leaf.
    pub fn is_single_symbol(&self) -> bool {
        matches!(self.root, HuffNode::Leaf { .. })
    }

    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            match node {
                HuffNode::Leaf { .. } => count += 1,
                HuffNode::Internal { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        count
    }

    /// Length of the longest root-to-leaf path (at least 1).
    pub fn depth(&self) -> usize {
        fn walk(node: &HuffNode) -> usize {
            match node {
                HuffNode::Leaf { .. } => 0,
                HuffNode::Internal { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_frequency_is_total() {
        let table = FrequencyTable::from_bytes(b"hello world hello world hello");
        let tree = HuffmanTree::build(&table).unwrap();
        assert_eq!(tree.root().freq(), table.total().unwrap());
        assert_eq!(tree.leaf_count(), table.symbol_count());
    }

    #[test]
    fn test_abacaba_shape() {
        // C(1) and B(2) merge first, then that node (3) merges with A(4).
        let table = FrequencyTable::from_bytes(b"ABACABA");
        let tree = HuffmanTree::build(&table).unwrap();
        let HuffNode::Internal { left, right, freq } = tree.root() else {
            panic!("expected internal root");
        };
        assert_eq!(*freq, 7);
        assert_eq!(right.symbol(), Some(b'A'));
        assert_eq!(left.child(false).and_then(HuffNode::symbol), Some(b'C'));
        assert_eq!(left.child(true).and_then(HuffNode::symbol), Some(b'B'));
    }

    #[test]
    fn test_single_symbol_tree() {
        let table = FrequencyTable::from_bytes(&[b'A'; 1000]);
        let tree = HuffmanTree::build(&table).unwrap();
        assert!(tree.is_single_symbol());
        assert_eq!(tree.root().symbol(), Some(b'A'));
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(HuffmanTree::build(&FrequencyTable::default()).is_err());
    }

    #[test]
    fn test_build_is_deterministic() {
        // All-equal frequencies exercise every tie-break.
        let data: Vec<u8> = (0..=255).collect();
        let table = FrequencyTable::from_bytes(&data);
        let a = HuffmanTree::build(&table).unwrap();
        let b = HuffmanTree::build(&table).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.depth(), 8);
    }
}
