// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For decoding a single channel of a FLAC frame
//!
//! | Bits | Field | Meaning |
//! |-----:|-------|---------|
//! | 1    | padding | always 0
//! | 6    | type  | CONSTANT, VERBATIM, FIXED or LPC
//! | 1    | wasted bits flag |
//! | 0+   | wasted bits | unary-coded count, minus 1
//! |      | subframe data | depends on type

use crate::Error;
use crate::bitstream::BitCursor;
use arrayvec::ArrayVec;
use std::io::Read;

/// The largest LPC predictor order
pub const MAX_LPC_ORDER: usize = 32;

/// The largest FIXED predictor order
pub const MAX_FIXED_ORDER: usize = 4;

/// The widest subframe, the side channel of a 32-bit stream
pub const MAX_BITS_PER_SAMPLE: u32 = 33;

const FIXED_COEFFICIENTS: [&[i32]; MAX_FIXED_ORDER + 1] =
    [&[], &[1], &[2, -1], &[3, -3, 1], &[4, -6, 4, -1]];

/// An integer type subframes decode to
///
/// Every subframe fits in `i32` except the side channel
/// of a 32-bit stream, which needs `i64`.
pub trait Sample: Copy + From<i32> + Into<i64> + TryFrom<i64> {
    /// Size of the type, in bits
    const BITS: u32;

    /// Shifts the sample left, giving 0 once every bit is shifted out
    fn shift_left(self, bits: u32) -> Self;
}

impl Sample for i32 {
    const BITS: u32 = i32::BITS;

    #[inline]
    fn shift_left(self, bits: u32) -> Self {
        self.checked_shl(bits).unwrap_or(0)
    }
}

impl Sample for i64 {
    const BITS: u32 = i64::BITS;

    #[inline]
    fn shift_left(self, bits: u32) -> Self {
        self.checked_shl(bits).unwrap_or(0)
    }
}

/// A decoded subframe header and its coded data
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Subframe {
    /// Full sample size, including wasted bits
    pub bits_per_sample: u32,
    /// Number of samples
    pub block_size: usize,
    /// Number of low 0 bits removed from every sample
    pub wasted_bits: u32,
    /// How the subframe's samples are coded
    pub coding: Coding,
}

/// A subframe's coded samples
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Coding {
    /// Every sample has the same value
    Constant(i64),
    /// Every sample is stored as-is
    Verbatim(Vec<i64>),
    /// Samples are predicted by a fixed polynomial
    Fixed {
        /// Predictor order, from 0 to 4
        order: u8,
        /// The first `order` samples, stored as-is
        warm_up: ArrayVec<i64, MAX_FIXED_ORDER>,
        /// Prediction errors for the remaining samples
        residual: Vec<i32>,
    },
    /// Samples are predicted by stored coefficients
    Lpc {
        /// Precision of each coefficient, in bits
        precision: u32,
        /// Right shift applied to each prediction
        shift: u32,
        /// Predictor coefficients, one per order
        coefficients: ArrayVec<i32, MAX_LPC_ORDER>,
        /// The first `order` samples, stored as-is
        warm_up: ArrayVec<i64, MAX_LPC_ORDER>,
        /// Prediction errors for the remaining samples
        residual: Vec<i32>,
    },
}

impl Subframe {
    /// Reads subframe from the given cursor
    ///
    /// `bits_per_sample` is the subframe's full sample size,
    /// including the extra bit of any side channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the subframe header is invalid,
    /// its samples would exceed 33 bits,
    /// or its coded data is invalid.
    ///
    /// # Example
    /// ```
    /// use flac_decoder::bitstream::BitCursor;
    /// use flac_decoder::subframe::{Coding, Subframe};
    ///
    /// let data: &[u8] = &[
    ///     0b0_000000_1, // CONSTANT with wasted bits
    ///     0b001_00101,  // 3 wasted bits, then 5-bit sample
    /// ];
    /// let subframe = Subframe::read(&mut BitCursor::new(data), 8, 4).unwrap();
    /// assert_eq!(subframe.wasted_bits, 3);
    /// assert_eq!(subframe.coding, Coding::Constant(5));
    ///
    /// let mut samples = [0; 4];
    /// subframe.decode(&mut samples).unwrap();
    /// assert_eq!(samples, [40, 40, 40, 40]);
    /// ```
    pub fn read<R: Read>(
        r: &mut BitCursor<R>,
        bits_per_sample: u32,
        block_size: usize,
    ) -> Result<Self, Error> {
        use crate::residual::read_residual;

        if bits_per_sample > MAX_BITS_PER_SAMPLE {
            return Err(Error::ExcessiveBitsPerSample);
        }
        if r.read_bit()? {
            return Err(Error::ReservedBitSet);
        }
        let type_code = r.read_unsigned(6)?;
        let wasted_bits = match r.read_bit()? {
            true => r.read_unary_zero_run()? + 1,
            false => 0,
        };

        let bps = bits_per_sample
            .checked_sub(wasted_bits)
            .ok_or(Error::ExcessiveWastedBits)?;

        log::trace!("subframe type {type_code:#08b}, {wasted_bits} wasted bits");

        let coding = match type_code {
            0b000000 => Coding::Constant(r.read_signed(bps)?),
            0b000001 => Coding::Verbatim(
                (0..block_size)
                    .map(|_| r.read_signed(bps))
                    .collect::<Result<_, _>>()?,
            ),
            code @ 0b001000..=0b001100 => {
                let order = (code - 0b001000) as usize;
                if order > block_size {
                    return Err(Error::ExcessivePredictorOrder);
                }
                let warm_up = read_warm_up(r, bps, order)?;

                Coding::Fixed {
                    order: order as u8,
                    warm_up,
                    residual: read_residual(r, block_size, order)?,
                }
            }
            code @ 0b100000..=0b111111 => {
                let order = (code - 0b011111) as usize;
                if order > block_size {
                    return Err(Error::ExcessivePredictorOrder);
                }
                let warm_up = read_warm_up(r, bps, order)?;
                let precision = match r.read_unsigned(4)? {
                    0b1111 => return Err(Error::InvalidLpcPrecision),
                    p => p as u32 + 1,
                };
                let shift = match r.read_signed(5)? {
                    s if s < 0 => return Err(Error::NegativeLpcShift),
                    s => s as u32,
                };
                let coefficients = (0..order)
                    .map(|_| r.read_signed(precision).map(|c| c as i32))
                    .collect::<Result<_, _>>()?;

                Coding::Lpc {
                    precision,
                    shift,
                    coefficients,
                    warm_up,
                    residual: read_residual(r, block_size, order)?,
                }
            }
            _ => return Err(Error::InvalidSubframeType),
        };

        Ok(Self {
            bits_per_sample,
            block_size,
            wasted_bits,
            coding,
        })
    }

    /// Decodes subframe to samples
    ///
    /// Predictions are computed and wasted bits restored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExcessiveBitsPerSample`] if the subframe
    /// is wider than `S`, or [`Error::PredictionOverflow`] if
    /// a predicted sample doesn't fit in `S`.
    ///
    /// # Panics
    ///
    /// Panics if `samples` isn't [`Subframe::block_size`] long.
    ///
    /// # Example
    /// ```
    /// use flac_decoder::Error;
    /// use flac_decoder::bitstream::BitCursor;
    /// use flac_decoder::subframe::Subframe;
    ///
    /// // 33-bit VERBATIM sample of -2³²
    /// let data: &[u8] = &[0b0_000001_0, 0x80, 0x00, 0x00, 0x00, 0x00];
    /// let subframe = Subframe::read(&mut BitCursor::new(data), 33, 1).unwrap();
    ///
    /// let mut wide = [0i64];
    /// subframe.decode(&mut wide).unwrap();
    /// assert_eq!(wide, [-(1 << 32)]);
    ///
    /// let mut narrow = [0i32];
    /// assert!(matches!(subframe.decode(&mut narrow), Err(Error::ExcessiveBitsPerSample)));
    /// ```
    pub fn decode<S: Sample>(&self, samples: &mut [S]) -> Result<(), Error> {
        assert_eq!(samples.len(), self.block_size);

        if self.bits_per_sample > S::BITS {
            return Err(Error::ExcessiveBitsPerSample);
        }

        match &self.coding {
            Coding::Constant(sample) => samples.fill(stored(*sample)?),
            Coding::Verbatim(verbatim) => copy_stored(samples, verbatim)?,
            Coding::Fixed {
                order,
                warm_up,
                residual,
            } => {
                let (head, tail) = samples.split_at_mut(usize::from(*order));
                copy_stored(head, warm_up)?;
                copy_residual(tail, residual);
                restore_fixed(usize::from(*order), samples)?;
            }
            Coding::Lpc {
                shift,
                coefficients,
                warm_up,
                residual,
                ..
            } => {
                let (head, tail) = samples.split_at_mut(coefficients.len());
                copy_stored(head, warm_up)?;
                copy_residual(tail, residual);
                restore_lpc(coefficients, *shift, samples)?;
            }
        }

        if self.wasted_bits > 0 {
            samples
                .iter_mut()
                .for_each(|s| *s = s.shift_left(self.wasted_bits));
        }

        Ok(())
    }
}

fn stored<S: Sample>(sample: i64) -> Result<S, Error> {
    S::try_from(sample).map_err(|_| Error::ExcessiveBitsPerSample)
}

fn copy_stored<S: Sample>(samples: &mut [S], stored_samples: &[i64]) -> Result<(), Error> {
    for (s, v) in samples.iter_mut().zip(stored_samples) {
        *s = stored(*v)?;
    }
    Ok(())
}

fn copy_residual<S: Sample>(samples: &mut [S], residual: &[i32]) {
    for (s, r) in samples.iter_mut().zip(residual) {
        *s = S::from(*r);
    }
}

fn read_warm_up<R: Read, const MAX: usize>(
    r: &mut BitCursor<R>,
    bits_per_sample: u32,
    order: usize,
) -> Result<ArrayVec<i64, MAX>, Error> {
    (0..order).map(|_| r.read_signed(bits_per_sample)).collect()
}

/// Restores samples predicted by a FIXED subframe of the given order
///
/// The first `order` samples are warm-up samples
/// and the rest are residuals, which are replaced
/// by their predicted values.
///
/// # Errors
///
/// Returns [`Error::PredictionOverflow`] if
/// a predicted sample doesn't fit in `S`.
///
/// # Panics
///
/// Panics if `order` is larger than 4.
///
/// # Example
/// ```
/// use flac_decoder::subframe::restore_fixed;
///
/// let mut samples = [10, 0, 0, 0];
/// restore_fixed(1, &mut samples).unwrap();
/// assert_eq!(samples, [10, 10, 10, 10]);
/// ```
#[inline]
pub fn restore_fixed<S: Sample>(order: usize, samples: &mut [S]) -> Result<(), Error> {
    restore_lpc(FIXED_COEFFICIENTS[order], 0, samples)
}

/// Restores samples predicted by the given LPC coefficients and shift
///
/// Each sample past the warm-up samples becomes
/// `residual + ((Σ coefficient[j] × sample[i - 1 - j]) >> shift)`.
///
/// # Errors
///
/// Returns [`Error::PredictionOverflow`] if
/// a predicted sample doesn't fit in `S`.
///
/// # Example
/// ```
/// use flac_decoder::subframe::restore_lpc;
///
/// // predicts half the sum of the previous two samples
/// let mut samples = [8, 4, 0, 1];
/// restore_lpc(&[1, 1], 1, &mut samples).unwrap();
/// assert_eq!(samples, [8, 4, 6, 6]);
/// ```
pub fn restore_lpc<S: Sample>(
    coefficients: &[i32],
    shift: u32,
    samples: &mut [S],
) -> Result<(), Error> {
    let order = coefficients.len();

    for i in order..samples.len() {
        let prediction = coefficients
            .iter()
            .zip(samples[i - order..i].iter().rev())
            .try_fold(0i64, |sum, (c, s)| {
                sum.checked_add(i64::from(*c).checked_mul((*s).into())?)
            })
            .ok_or(Error::PredictionOverflow)?
            >> shift;

        let residual: i64 = samples[i].into();
        samples[i] = residual
            .checked_add(prediction)
            .and_then(|sample| S::try_from(sample).ok())
            .ok_or(Error::PredictionOverflow)?;
    }

    Ok(())
}
