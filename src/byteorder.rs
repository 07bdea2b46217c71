// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Byte order for PCM output
//!
//! Samples are written as signed, two's complement integers
//! using only as many bytes as their bits-per-sample requires.

/// The order in which a sample's bytes are written
pub trait Endianness {
    /// Writes the low `buf.len()` bytes of the sample to `buf`
    ///
    /// # Panics
    ///
    /// Panics if `buf` is longer than 4 bytes.
    fn write_sample(sample: i32, buf: &mut [u8]);
}

/// Least significant byte first
///
/// MD5 signatures are calculated over samples in this order,
/// and WAVE files store them this way.
///
/// ```
/// use flac_decoder::byteorder::{Endianness, LittleEndian};
///
/// let mut buf = [0; 3];
/// LittleEndian::write_sample(-2, &mut buf);
/// assert_eq!(buf, [0xfe, 0xff, 0xff]);
/// ```
pub struct LittleEndian;

impl Endianness for LittleEndian {
    #[inline]
    fn write_sample(sample: i32, buf: &mut [u8]) {
        buf.copy_from_slice(&sample.to_le_bytes()[..buf.len()]);
    }
}

/// Most significant byte first, as AIFF files store samples
///
/// ```
/// use flac_decoder::byteorder::{BigEndian, Endianness};
///
/// let mut buf = [0; 3];
/// BigEndian::write_sample(0x123456, &mut buf);
/// assert_eq!(buf, [0x12, 0x34, 0x56]);
/// ```
pub struct BigEndian;

impl Endianness for BigEndian {
    #[inline]
    fn write_sample(sample: i32, buf: &mut [u8]) {
        buf.copy_from_slice(&sample.to_be_bytes()[4 - buf.len()..]);
    }
}

#[cfg(test)]
mod test {
    use super::{BigEndian, Endianness, LittleEndian};
    use bitstream_io::{BitWrite, BitWriter};

    // bitstream-io writing signed values of the same width
    // should always agree with our own output
    fn check<F: bitstream_io::Endianness, E: Endianness>(bytes: usize, sample: i32) {
        let mut expected = vec![0; bytes];
        let mut w = BitWriter::<_, F>::new(expected.as_mut_slice());
        let written = match bytes {
            1 => w.write::<8, i32>(sample),
            2 => w.write::<16, i32>(sample),
            3 => w.write::<24, i32>(sample),
            _ => w.write::<32, i32>(sample),
        };
        written.unwrap();
        drop(w);

        let mut buf = vec![0; bytes];
        E::write_sample(sample, &mut buf);
        assert_eq!(buf, expected, "{sample} as {bytes} bytes");
    }

    fn check_all<F: bitstream_io::Endianness, E: Endianness>() {
        for sample in i8::MIN..=i8::MAX {
            check::<F, E>(1, sample.into());
        }

        for sample in i16::MIN..=i16::MAX {
            check::<F, E>(2, sample.into());
        }

        for sample in ((-1 << 23)..(1 << 23)).step_by(97) {
            check::<F, E>(3, sample);
        }

        for sample in [i32::MIN, -1 << 24, -1, 0, 1, 1 << 24, i32::MAX] {
            check::<F, E>(4, sample);
        }
    }

    #[test]
    fn little_endian() {
        check_all::<bitstream_io::LittleEndian, LittleEndian>()
    }

    #[test]
    fn big_endian() {
        check_all::<bitstream_io::BigEndian, BigEndian>()
    }
}
