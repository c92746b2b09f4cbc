//! Byte frequency counting

use crate::error::{CompressError, Result};

/// Occurrence counts for each of the 256 byte values.
///
/// Symbols with a zero count are treated as absent: they are skipped by
/// [`FrequencyTable::iter`] and never serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; 256],
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self { counts: [0; 256] }
    }
}

impl FrequencyTable {
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut counts = [0u64; 256];
        for &b in data {
            counts[b as usize] += 1;
        }
        Self { counts }
    }

    /// Rebuild a table from serialized `(symbol, frequency)` pairs.
    ///
    /// Pairs must name distinct symbols with nonzero frequencies.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u8, u64)>,
    {
        let mut table = Self::default();
        for (symbol, freq) in pairs {
            if freq == 0 {
                return Err(CompressError::InvalidHeader(format!(
                    "symbol {symbol:#04x} has zero frequency"
                )));
            }
            if table.counts[symbol as usize] != 0 {
                return Err(CompressError::InvalidHeader(format!(
                    "symbol {symbol:#04x} listed twice"
                )));
            }
            table.counts[symbol as usize] = freq;
        }
        Ok(table)
    }

    pub fn get(&self, symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }

    /// Number of distinct symbols present.
    pub fn symbol_count(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Sum of all counts, or `None` if it overflows a `u64`.
    pub fn total(&self) -> Option<u64> {
        self.counts.iter().try_fold(0u64, |acc, &c| acc.checked_add(c))
    }

    /// Present symbols in ascending byte order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0)
            .map(|(s, &c)| (s as u8, c))
    }

    /// Shannon entropy of the distribution in bits per symbol.
    pub fn entropy_bits(&self) -> f64 {
        let total = match self.total() {
            Some(0) | None => return 0.0,
            Some(t) => t as f64,
        };
        self.iter()
            .map(|(_, f)| {
                let p = f as f64 / total;
                -p * p.log2()
            })
            .sum()
    }
}
