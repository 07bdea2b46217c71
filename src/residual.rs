// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For decoding partitioned Rice residuals
//!
//! | Bits | Field | Meaning |
//! |-----:|-------|---------|
//! | 2    | coding method | 4-bit or 5-bit Rice parameters
//! | 4    | partition order | 2ⁿ partitions
//! |      | partitions | partition₀, partition₁, …
//!
//! Each partition starts with its Rice parameter.
//! A parameter of all 1 bits is an escape code,
//! followed by a 5-bit width and the partition's
//! residuals as plain signed values of that width.
//!
//! The first partition is shorter than the rest
//! by the predictor's order, since those samples
//! are stored as warm-up samples instead.

use crate::Error;
use crate::bitstream::BitCursor;
use std::io::Read;

/// A residual's coding method
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CodingMethod {
    /// Partitions with 4-bit Rice parameters
    Rice,
    /// Partitions with 5-bit Rice parameters
    Rice2,
}

impl CodingMethod {
    /// Size of each partition's Rice parameter, in bits
    #[inline]
    pub fn parameter_bits(self) -> u32 {
        match self {
            Self::Rice => 4,
            Self::Rice2 => 5,
        }
    }

    /// The parameter value indicating an escaped partition
    #[inline]
    pub fn escape_code(self) -> u32 {
        (1 << self.parameter_bits()) - 1
    }
}

/// How a residual partition's values are stored
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PartitionCoding {
    /// Rice-coded with the given parameter
    Rice(u32),
    /// Plain signed values of the given width
    Escaped(u32),
}

/// Reads an entire residual block
///
/// Returns `block_size - predictor_order` residual values.
///
/// # Errors
///
/// Returns an error if the coding method is reserved,
/// the partition count doesn't divide the block size,
/// the first partition is too small for the predictor,
/// or a residual doesn't fit in 32 bits.
///
/// # Example
/// ```
/// use flac_decoder::bitstream::BitCursor;
/// use flac_decoder::residual::read_residual;
///
/// let data: &[u8] = &[
///     0b00_0000_00, // Rice, partition order 0, parameter…
///     0b01_10_11_01, // …0b0001, residual 0, residual -1, residual 1…
///     0b0_0000000,   // …residual 1 continued
/// ];
/// let mut r = BitCursor::new(data);
/// assert_eq!(read_residual(&mut r, 4, 1).unwrap(), vec![0, -1, 1]);
/// ```
pub fn read_residual<R: Read>(
    r: &mut BitCursor<R>,
    block_size: usize,
    predictor_order: usize,
) -> Result<Vec<i32>, Error> {
    let method = match r.read_unsigned(2)? {
        0 => CodingMethod::Rice,
        1 => CodingMethod::Rice2,
        _ => return Err(Error::InvalidCodingMethod),
    };
    let partition_order = r.read_unsigned(4)?;
    let partition_count = 1usize << partition_order;

    if block_size % partition_count != 0 {
        return Err(Error::InvalidPartitionOrder);
    }
    let partition_len = block_size / partition_count;
    let first_partition_len = partition_len
        .checked_sub(predictor_order)
        .ok_or(Error::ExcessivePredictorOrder)?;

    let mut residuals = Vec::with_capacity(block_size - predictor_order);

    read_partition(r, method, first_partition_len, &mut residuals)?;
    for _ in 1..partition_count {
        read_partition(r, method, partition_len, &mut residuals)?;
    }

    Ok(residuals)
}

fn read_partition<R: Read>(
    r: &mut BitCursor<R>,
    method: CodingMethod,
    len: usize,
    residuals: &mut Vec<i32>,
) -> Result<(), Error> {
    let coding = match r.read_unsigned(method.parameter_bits())? as u32 {
        escape if escape == method.escape_code() => {
            PartitionCoding::Escaped(r.read_unsigned(5)? as u32)
        }
        parameter => PartitionCoding::Rice(parameter),
    };

    match coding {
        PartitionCoding::Rice(parameter) => {
            for _ in 0..len {
                residuals.push(
                    i32::try_from(r.read_rice_signed(parameter)?)
                        .map_err(|_| Error::ResidualOverflow)?,
                );
            }
        }
        PartitionCoding::Escaped(bits) => {
            // widths are below 32 bits, so values always fit
            for _ in 0..len {
                residuals.push(r.read_signed(bits)? as i32);
            }
        }
    }

    Ok(())
}
