// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For reading FLAC's bit-packed fields

use crate::Error;
use bitstream_io::{BigEndian, BitRead, BitReader};

/// A big-endian bit cursor over some byte source
///
/// Bytes are pulled from the source only as they are needed,
/// so a cursor never reads beyond the last field requested.
///
/// # Example
/// ```
/// use flac_decoder::bitstream::BitCursor;
///
/// let data: &[u8] = &[0b1011_0001, 0b1000_0000];
/// let mut c = BitCursor::new(data);
/// assert_eq!(c.read_unsigned(4).unwrap(), 0b1011);
/// assert_eq!(c.read_signed(3).unwrap(), 0);
/// assert_eq!(c.read_unary_zero_run().unwrap(), 0);
/// assert_eq!(c.read_rice_signed(1).unwrap(), 0);
/// ```
pub struct BitCursor<R> {
    reader: BitReader<R, BigEndian>,
}

impl<R: std::io::Read> BitCursor<R> {
    /// Wraps byte source in new cursor
    pub fn new(reader: R) -> Self {
        Self {
            reader: BitReader::endian(reader, BigEndian),
        }
    }

    /// Reads a single bit
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool, Error> {
        self.reader.read_bit().map_err(Error::from)
    }

    /// Reads unsigned value of the given size
    ///
    /// A size of 0 always yields 0 without consuming anything.
    ///
    /// # Panics
    ///
    /// Panics if `bits` is larger than 64.
    #[inline]
    pub fn read_unsigned(&mut self, bits: u32) -> Result<u64, Error> {
        assert!(bits <= 64, "cannot read more than 64 bits at once");

        match bits {
            0 => Ok(0),
            bits => self.reader.read_var::<u64>(bits).map_err(Error::from),
        }
    }

    /// Reads two's complement signed value of the given size
    ///
    /// # Panics
    ///
    /// Panics if `bits` is larger than 64.
    #[inline]
    pub fn read_signed(&mut self, bits: u32) -> Result<i64, Error> {
        match bits {
            0 => Ok(0),
            bits => {
                let shift = 64 - bits;
                Ok(((self.read_unsigned(bits)? << shift) as i64) >> shift)
            }
        }
    }

    /// Counts 0 bits until the next 1 bit, which is consumed
    #[inline]
    pub fn read_unary_zero_run(&mut self) -> Result<u32, Error> {
        self.reader.read_unary::<1>().map_err(Error::from)
    }

    /// Reads a Rice-coded signed value with the given parameter
    ///
    /// The unary-coded quotient and `k`-bit remainder
    /// are combined and then folded back to a signed value.
    ///
    /// # Example
    /// ```
    /// use flac_decoder::bitstream::BitCursor;
    ///
    /// // quotient 2, remainder 0b01 → 9 → -5
    /// let data: &[u8] = &[0b001_01_000];
    /// assert_eq!(BitCursor::new(data).read_rice_signed(2).unwrap(), -5);
    /// ```
    #[inline]
    pub fn read_rice_signed(&mut self, k: u32) -> Result<i64, Error> {
        debug_assert!(k <= 32);

        let quotient = u64::from(self.read_unary_zero_run()?);
        let remainder = self.read_unsigned(k)?;
        Ok(zigzag_decode((quotient << k) | remainder))
    }

    /// Discards any bits remaining in the current partial byte
    #[inline]
    pub fn align_to_byte(&mut self) {
        self.reader.byte_align()
    }

    /// Whether the cursor currently sits on a byte boundary
    #[inline]
    pub fn byte_aligned(&self) -> bool {
        self.reader.byte_aligned()
    }

    /// Reads the given number of whole bytes
    pub fn read_bytes(&mut self, bytes: usize) -> Result<Vec<u8>, Error> {
        self.reader.read_to_vec(bytes).map_err(Error::from)
    }
}

/// Folds an unsigned value to a signed one
///
/// Even values map to `v / 2`, odd values to `-(v + 1) / 2`.
///
/// ```
/// use flac_decoder::bitstream::zigzag_decode;
///
/// assert_eq!(
///     (0..7).map(zigzag_decode).collect::<Vec<_>>(),
///     [0, -1, 1, -2, 2, -3, 3],
/// );
/// ```
#[inline]
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// The inverse of [`zigzag_decode`]
#[inline]
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}
