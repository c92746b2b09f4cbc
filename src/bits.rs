//! MSB-first bit packing of Huffman codes and tree-guided unpacking.

use crate::codes::CodeTable;
use crate::error::{CompressError, Result};
use crate::tree::{HuffNode, HuffmanTree};
use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

/// Accumulates code bits into bytes, most significant bit first.
pub struct BitPacker {
    writer: BitWriter<Vec<u8>, BigEndian>,
    bit_count: u64,
}

impl Default for BitPacker {
    fn default() -> Self {
        Self::new()
    }
}

impl BitPacker {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            writer: BitWriter::endian(Vec::with_capacity(bytes), BigEndian),
            bit_count: 0,
        }
    }

    pub fn push_code(&mut self, code: &[bool]) -> Result<()> {
        for &bit in code {
            self.writer.write_bit(bit)?;
        }
        self.bit_count += code.len() as u64;
        Ok(())
    }

    /// Zero-pads the final partial byte and returns the bytes with the
    /// number of meaningful bits.
    pub fn finish(mut self) -> Result<(Vec<u8>, u64)> {
        self.writer.byte_align()?;
        Ok((self.writer.into_writer(), self.bit_count))
    }
}

/// Encode `data` with `codes`, returning packed bytes and the real bit count.
pub fn pack(data: &[u8], codes: &CodeTable, expected_bits: u64) -> Result<(Vec<u8>, u64)> {
    let mut packer = BitPacker::with_capacity(expected_bits.div_ceil(8) as usize);
    for &byte in data {
        let code = codes.get(byte).ok_or_else(|| {
            CompressError::CorruptPayload(format!("byte {byte:#04x} has no code"))
        })?;
        packer.push_code(code)?;
    }
    packer.finish()
}

/// Reads at most `limit` bits from a packed payload, MSB first.
pub struct BitUnpacker<'a> {
    reader: BitReader<&'a [u8], BigEndian>,
    remaining: u64,
}

impl<'a> BitUnpacker<'a> {
    /// The limit is clamped to the bits actually present in `payload`.
    pub fn new(payload: &'a [u8], limit: u64) -> Self {
        let available = (payload.len() as u64).saturating_mul(8);
        Self {
            reader: BitReader::endian(payload, BigEndian),
            remaining: limit.min(available),
        }
    }

    pub fn next_bit(&mut self) -> Result<Option<bool>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(self.reader.read_bit()?))
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

/// Result of walking the payload against a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unpacked {
    pub data: Vec<u8>,
    pub bits_consumed: u64,
    /// Bit position where the walk hit a bit no code can start with.
    pub corrupt_at: Option<u64>,
}

/// Decode symbols by walking `tree` bit by bit until `max_symbols` have been
/// produced or the unpacker is exhausted, whichever happens first.
///
/// A `1` bit in a single-symbol stream stops the walk and is reported in
/// [`Unpacked::corrupt_at`] with the symbols decoded before it.
pub fn unpack(
    unpacker: &mut BitUnpacker<'_>,
    tree: &HuffmanTree,
    max_symbols: u64,
) -> Result<Unpacked> {
    let root = tree.root();
    // Every symbol costs at least one bit.
    let capacity = max_symbols.min(unpacker.remaining()).min(1 << 24);
    let mut data = Vec::with_capacity(capacity as usize);
    let mut bits_consumed = 0u64;
    let mut corrupt_at = None;
    let mut cursor = root;

    while (data.len() as u64) < max_symbols {
        let Some(bit) = unpacker.next_bit()? else {
            break;
        };
        bits_consumed += 1;

        if let HuffNode::Leaf { symbol, .. } = root {
            if bit {
                corrupt_at = Some(bits_consumed - 1);
                break;
            }
            data.push(*symbol);
            continue;
        }

        // An internal node always has both children, so child() cannot miss here.
        cursor = match cursor.child(bit) {
            Some(next) => next,
            None => return Err(CompressError::CorruptPayload("walked past a leaf".into())),
        };
        if let HuffNode::Leaf { symbol, .. } = cursor {
            data.push(*symbol);
            cursor = root;
        }
    }

    Ok(Unpacked {
        data,
        bits_consumed,
        corrupt_at,
    })
}
