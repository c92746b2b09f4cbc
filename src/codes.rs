//! Code table generation from a Huffman tree

use crate::frequency::FrequencyTable;
use crate::tree::{HuffNode, HuffmanTree};

/// Maps each present symbol to its bit string (false = 0, true = 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: Vec<Option<Vec<bool>>>,
}

impl CodeTable {
    pub fn from_tree(tree: &HuffmanTree) -> Self {
        let mut codes = vec![None; 256];
        build_codes(tree.root(), Vec::new(), &mut codes);
        Self { codes }
    }

    pub fn get(&self, symbol: u8) -> Option<&[bool]> {
        self.codes[symbol as usize].as_deref()
    }

    pub fn len(&self) -> usize {
        self.codes.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Present symbols and their codes in ascending byte order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &[bool])> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(s, c)| c.as_deref().map(|code| (s as u8, code)))
    }

    /// Code for `symbol` rendered as a string of '0' and '1'.
    pub fn code_string(&self, symbol: u8) -> Option<String> {
        self.get(symbol)
            .map(|code| code.iter().map(|&b| if b { '1' } else { '0' }).collect())
    }

    /// Total number of bits needed to encode input with these frequencies.
    pub fn encoded_bits(&self, table: &FrequencyTable) -> u64 {
        table
            .iter()
            .map(|(s, f)| f * self.get(s).map_or(0, |c| c.len() as u64))
            .sum()
    }

    /// Checks that no code is a prefix of another symbol's code.
    pub fn is_prefix_free(&self) -> bool {
        let mut codes: Vec<&[bool]> = self.iter().map(|(_, c)| c).collect();
        // After sorting, a prefix always sorts directly before some code it prefixes.
        codes.sort();
        codes.windows(2).all(|w| !w[1].starts_with(w[0]))
    }
}

fn build_codes(node: &HuffNode, prefix: Vec<bool>, codes: &mut [Option<Vec<bool>>]) {
    match node {
        HuffNode::Leaf { symbol, .. } => {
            let code = if prefix.is_empty() { vec![false] } else { prefix };
            codes[*symbol as usize] = Some(code);
        }
        HuffNode::Internal { left, right, .. } => {
            let mut p = prefix.clone();
            p.push(false);
            build_codes(left, p, codes);
            let mut p = prefix;
            p.push(true);
            build_codes(right, p, codes);
        }
    }
}
