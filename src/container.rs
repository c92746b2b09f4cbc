//! The HUB1 container format
//!
//! Byte layout, multi-byte integers little-endian:
//!
//! ```text
//! offset  size            field
//! 0       4               magic "HUB1"
//! 4       8               original length
//! 12      2               symbol count (1..=256)
//! 14      count * 9       {symbol: u8, frequency: u64} in ascending symbol order
//! ..      ..              bit-packed payload, MSB first, zero padded
//! end-8   8               total encoded bit count
//! ```
//!
//! The tree is never stored. The decoder rebuilds it from the frequency
//! table with the same deterministic builder the encoder used.

use crate::bits::{self, BitUnpacker};
use crate::codes::CodeTable;
use crate::error::{CompressError, Result};
use crate::frequency::FrequencyTable;
use crate::tree::HuffmanTree;
use serde::Serialize;
use std::io::Write;
use tracing::debug;

pub const MAGIC: [u8; 4] = *b"HUB1";
/// Magic, original length and symbol count.
pub const HEADER_LEN: usize = 4 + 8 + 2;
pub const ENTRY_LEN: usize = 1 + 8;
pub const TRAILER_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    original_len: u64,
    frequencies: FrequencyTable,
    payload: Vec<u8>,
    total_bits: u64,
}

/// Outcome of the integrity checks run while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Integrity {
    Ok,
    /// Trailer bit count does not fit the payload length.
    BitCountMismatch { recorded: u64, payload_bytes: u64 },
    /// Fewer symbols decoded than the header promised.
    SizeMismatch { expected: u64, actual: u64 },
    /// All symbols decoded but recorded bits were left over.
    UnusedBits { recorded: u64, consumed: u64 },
    /// A bit at `position` cannot begin any code.
    CorruptPayload { position: u64 },
}

impl Integrity {
    pub fn is_ok(&self) -> bool {
        matches!(self, Integrity::Ok)
    }

    pub fn into_error(self) -> Option<CompressError> {
        match self {
            Integrity::Ok => None,
            Integrity::BitCountMismatch {
                recorded,
                payload_bytes,
            } => Some(CompressError::BitCountMismatch {
                recorded,
                payload_bytes,
            }),
            Integrity::SizeMismatch { expected, actual } => {
                Some(CompressError::SizeMismatch { expected, actual })
            }
            Integrity::UnusedBits { recorded, consumed } => {
                Some(CompressError::CorruptPayload(format!(
                    "{} of {} recorded bits were not consumed",
                    recorded - consumed,
                    recorded
                )))
            }
            Integrity::CorruptPayload { position } => Some(CompressError::CorruptPayload(
                format!("bit 1 at position {position} in a single-symbol stream"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub data: Vec<u8>,
    pub integrity: Integrity,
}

impl Decoded {
    /// The decoded bytes, or the integrity failure if any check failed.
    pub fn into_verified(self) -> Result<Vec<u8>> {
        match self.integrity.into_error() {
            None => Ok(self.data),
            Some(err) => Err(err),
        }
    }
}

/// Per-symbol entry in a [`ContainerSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolEntry {
    pub symbol: u8,
    pub frequency: u64,
    pub code: String,
}

/// Header-level description of a container, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerSummary {
    pub original_len: u64,
    pub symbol_count: usize,
    pub payload_bytes: usize,
    pub total_bits: u64,
    pub container_len: usize,
    pub entropy_bits: f64,
    pub symbols: Vec<SymbolEntry>,
}

impl Container {
    /// Build the container for `data`. Empty input is rejected.
    pub fn encode(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(CompressError::EmptyInput);
        }
        let frequencies = FrequencyTable::from_bytes(data);
        let tree = HuffmanTree::build(&frequencies)?;
        let codes = CodeTable::from_tree(&tree);
        debug!(
            symbols = frequencies.symbol_count(),
            depth = tree.depth(),
            "built huffman tree"
        );

        let expected_bits = codes.encoded_bits(&frequencies);
        let (payload, total_bits) = bits::pack(data, &codes, expected_bits)?;
        debug_assert_eq!(total_bits, expected_bits);

        Ok(Self {
            original_len: data.len() as u64,
            frequencies,
            payload,
            total_bits,
        })
    }

    pub fn original_len(&self) -> u64 {
        self.original_len
    }

    pub fn frequencies(&self) -> &FrequencyTable {
        &self.frequencies
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn total_bits(&self) -> u64 {
        self.total_bits
    }

    /// Size of the serialized container in bytes.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.frequencies.symbol_count() * ENTRY_LEN + self.payload.len() + TRAILER_LEN
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&MAGIC)?;
        out.write_all(&self.original_len.to_le_bytes())?;
        // 256 symbols do not fit in a u8, hence the u16.
        let symbol_count = self.frequencies.symbol_count() as u16;
        out.write_all(&symbol_count.to_le_bytes())?;
        for (symbol, freq) in self.frequencies.iter() {
            out.write_all(&[symbol])?;
            out.write_all(&freq.to_le_bytes())?;
        }
        out.write_all(&self.payload)?;
        out.write_all(&self.total_bits.to_le_bytes())?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut output = Vec::with_capacity(self.encoded_len());
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut output);
        output
    }

    /// Parse and validate the header, frequency table and trailer.
    ///
    /// Payload consistency is not checked here; that is reported by
    /// [`Container::decode`].
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(data);

        let magic = cursor.take(4, "magic").map_err(|_| CompressError::BadMagic {
            found: data.to_vec(),
        })?;
        if magic != MAGIC {
            return Err(CompressError::BadMagic {
                found: magic.to_vec(),
            });
        }

        let original_len = cursor.u64_le("original length")?;
        let symbol_count = cursor.u16_le("symbol count")? as usize;
        if !(1..=256).contains(&symbol_count) {
            return Err(CompressError::InvalidHeader(format!(
                "symbol count {symbol_count} outside 1..=256"
            )));
        }

        let table_len = symbol_count * ENTRY_LEN;
        if cursor.remaining() < table_len {
            return Err(CompressError::Truncated("frequency table"));
        }
        let mut pairs = Vec::with_capacity(symbol_count);
        for _ in 0..symbol_count {
            let symbol = cursor.u8("symbol")?;
            let freq = cursor.u64_le("frequency")?;
            pairs.push((symbol, freq));
        }
        let frequencies = FrequencyTable::from_pairs(pairs)?;

        match frequencies.total() {
            Some(total) if total == original_len => {}
            Some(total) => {
                return Err(CompressError::InvalidHeader(format!(
                    "frequencies sum to {total} but original length is {original_len}"
                )))
            }
            None => {
                return Err(CompressError::InvalidHeader(
                    "frequency sum overflows".into(),
                ))
            }
        }

        if cursor.remaining() < TRAILER_LEN {
            return Err(CompressError::Truncated("bit count trailer"));
        }
        let payload_len = cursor.remaining() - TRAILER_LEN;
        let payload = cursor.take(payload_len, "payload")?.to_vec();
        let total_bits = cursor.u64_le("bit count trailer")?;

        Ok(Self {
            original_len,
            frequencies,
            payload,
            total_bits,
        })
    }

    /// Rebuild the tree and decode the payload.
    ///
    /// Integrity failures do not abort decoding; they are reported in
    /// [`Decoded::integrity`] alongside whatever could be recovered.
    pub fn decode(&self) -> Result<Decoded> {
        let tree = HuffmanTree::build(&self.frequencies)?;

        let payload_bytes = self.payload.len() as u64;
        let bit_count_ok = self.total_bits.div_ceil(8) == payload_bytes;

        let mut unpacker = BitUnpacker::new(&self.payload, self.total_bits);
        let unpacked = bits::unpack(&mut unpacker, &tree, self.original_len)?;
        let produced = unpacked.data.len() as u64;

        let integrity = if let Some(position) = unpacked.corrupt_at {
            Integrity::CorruptPayload { position }
        } else if !bit_count_ok {
            Integrity::BitCountMismatch {
                recorded: self.total_bits,
                payload_bytes,
            }
        } else if produced != self.original_len {
            Integrity::SizeMismatch {
                expected: self.original_len,
                actual: produced,
            }
        } else if unpacked.bits_consumed != self.total_bits {
            Integrity::UnusedBits {
                recorded: self.total_bits,
                consumed: unpacked.bits_consumed,
            }
        } else {
            Integrity::Ok
        };

        Ok(Decoded {
            data: unpacked.data,
            integrity,
        })
    }

    pub fn summary(&self) -> Result<ContainerSummary> {
        let tree = HuffmanTree::build(&self.frequencies)?;
        let codes = CodeTable::from_tree(&tree);
        let symbols = self
            .frequencies
            .iter()
            .map(|(symbol, frequency)| SymbolEntry {
                symbol,
                frequency,
                code: codes.code_string(symbol).unwrap_or_default(),
            })
            .collect();

        Ok(ContainerSummary {
            original_len: self.original_len,
            symbol_count: self.frequencies.symbol_count(),
            payload_bytes: self.payload.len(),
            total_bits: self.total_bits,
            container_len: self.encoded_len(),
            entropy_bits: self.frequencies.entropy_bits(),
            symbols,
        })
    }
}

struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(CompressError::Truncated(field));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self, field: &'static str) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    fn u16_le(&mut self, field: &'static str) -> Result<u16> {
        let b = self.take(2, field)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u64_le(&mut self, field: &'static str) -> Result<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8, field)?);
        Ok(u64::from_le_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_abacaba() {
        let container = Container::encode(b"ABACABA").unwrap();
        let bytes = container.to_bytes();

        assert_eq!(&bytes[0..4], b"HUB1");
        assert_eq!(u64::from_le_bytes(bytes[4..12].try_into().unwrap()), 7);
        assert_eq!(u16::from_le_bytes([bytes[12], bytes[13]]), 3);
        // Entries in ascending symbol order.
        assert_eq!(bytes[14], b'A');
        assert_eq!(u64::from_le_bytes(bytes[15..23].try_into().unwrap()), 4);
        assert_eq!(bytes[23], b'B');
        assert_eq!(bytes[32], b'C');
        // 10 bits of payload in 2 bytes, then the trailer.
        assert_eq!(bytes.len(), HEADER_LEN + 3 * ENTRY_LEN + 2 + TRAILER_LEN);
        let trailer = &bytes[bytes.len() - 8..];
        assert_eq!(u64::from_le_bytes(trailer.try_into().unwrap()), 10);
        assert_eq!(bytes.len(), container.encoded_len());
    }

    #[test]
    fn test_write_to_matches_to_bytes() {
        let container = Container::encode(b"mississippi").unwrap();
        let mut written = Vec::new();
        container.write_to(&mut written).unwrap();
        assert_eq!(written, container.to_bytes());
    }

    #[test]
    fn test_parse_decode_roundtrip() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(10);
        let bytes = Container::encode(&data).unwrap().to_bytes();
        let parsed = Container::parse(&bytes).unwrap();
        assert_eq!(parsed.frequencies().total(), Some(parsed.original_len()));
        let decoded = parsed.decode().unwrap();
        assert!(decoded.integrity.is_ok());
        assert_eq!(decoded.data, data);
    }

    #[test]
    fn test_all_256_symbols_header() {
        let data: Vec<u8> = (0..=255).collect();
        let bytes = Container::encode(&data).unwrap().to_bytes();
        assert_eq!(u16::from_le_bytes([bytes[12], bytes[13]]), 256);
        let decoded = Container::parse(&bytes).unwrap().decode().unwrap();
        assert_eq!(decoded.into_verified().unwrap(), data);
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(Container::encode(b""), Err(CompressError::EmptyInput)));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = Container::encode(b"hello").unwrap().to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            Container::parse(&bytes),
            Err(CompressError::BadMagic { .. })
        ));
        assert!(matches!(
            Container::parse(b"HU"),
            Err(CompressError::BadMagic { .. })
        ));
    }

    #[test]
    fn test_truncated_header_and_table() {
        let bytes = Container::encode(b"hello").unwrap().to_bytes();
        assert!(matches!(
            Container::parse(&bytes[..10]),
            Err(CompressError::Truncated("original length"))
        ));
        assert!(matches!(
            Container::parse(&bytes[..13]),
            Err(CompressError::Truncated("symbol count"))
        ));
        assert!(matches!(
            Container::parse(&bytes[..20]),
            Err(CompressError::Truncated("frequency table"))
        ));
        let table_end = HEADER_LEN + 4 * ENTRY_LEN;
        assert!(matches!(
            Container::parse(&bytes[..table_end + 3]),
            Err(CompressError::Truncated("bit count trailer"))
        ));
    }

    #[test]
    fn test_invalid_symbol_count() {
        let mut bytes = Container::encode(b"hello").unwrap().to_bytes();
        bytes[12] = 0;
        bytes[13] = 0;
        assert!(matches!(
            Container::parse(&bytes),
            Err(CompressError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_frequency_sum_must_match_length() {
        let mut bytes = Container::encode(b"hello").unwrap().to_bytes();
        bytes[4] = 6;
        assert!(matches!(
            Container::parse(&bytes),
            Err(CompressError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_dropped_payload_byte_is_integrity_failure() {
        let data = b"abracadabra alakazam".repeat(4);
        let mut bytes = Container::encode(&data).unwrap().to_bytes();
        let last_payload = bytes.len() - TRAILER_LEN - 1;
        bytes.remove(last_payload);

        let decoded = Container::parse(&bytes).unwrap().decode().unwrap();
        assert!(matches!(
            decoded.integrity,
            Integrity::BitCountMismatch { .. }
        ));
        assert!(decoded.data.len() < data.len());
        assert!(decoded.into_verified().unwrap_err().is_integrity());
    }

    #[test]
    fn test_single_symbol_bit_flip_is_reported() {
        let mut bytes = Container::encode(&[b'A'; 16]).unwrap().to_bytes();
        let last_payload = bytes.len() - TRAILER_LEN - 1;
        bytes[last_payload] |= 0x01;

        let decoded = Container::parse(&bytes).unwrap().decode().unwrap();
        assert_eq!(decoded.integrity, Integrity::CorruptPayload { position: 15 });
        assert_eq!(decoded.data, vec![b'A'; 15]);
        assert!(decoded.into_verified().unwrap_err().is_integrity());
    }

    #[test]
    fn test_short_bit_count_is_size_mismatch() {
        let data = b"aaaaabbbc";
        let container = Container::encode(data).unwrap();
        let shortened = Container {
            total_bits: container.total_bits() - 2,
            ..container
        };
        let decoded = shortened.decode().unwrap();
        assert_eq!(
            decoded.integrity,
            Integrity::SizeMismatch {
                expected: data.len() as u64,
                actual: decoded.data.len() as u64,
            }
        );
    }

    #[test]
    fn test_summary_lists_codes() {
        let container = Container::encode(b"ABACABA").unwrap();
        let summary = container.summary().unwrap();
        assert_eq!(summary.symbol_count, 3);
        assert_eq!(summary.total_bits, 10);
        assert_eq!(summary.symbols[0].symbol, b'A');
        assert_eq!(summary.symbols[0].code, "1");
        assert_eq!(summary.container_len, container.to_bytes().len());
    }
}
