// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For calculating the checksums that guard FLAC frames
//!
//! Each frame header ends with a CRC-8 of the header's bytes
//! and each frame ends with a CRC-16 of the entire frame.
//! When a checksum is run over its own data *and* the stored
//! checksum value, a valid result is always 0.
//!
//! ```
//! use flac_decoder::crc::{Checksum, Crc8};
//!
//! let mut crc = Crc8::default();
//! crc.update_bytes(&[0xff, 0xf8, 0x69, 0x08, 0x00, 0x13]);
//! assert_eq!(crc.value(), 0x64);
//! crc.update(0x64);
//! assert!(crc.valid());
//! ```

/// A running checksum
pub trait Checksum: Default {
    /// Adds byte to checksum
    fn update(&mut self, byte: u8);

    /// Adds all bytes to checksum
    fn update_bytes(&mut self, bytes: &[u8]) {
        bytes.iter().for_each(|b| self.update(*b))
    }

    /// Whether the checksum is valid
    ///
    /// This is only meaningful once the stored checksum
    /// has been run through the checksum itself.
    fn valid(&self) -> bool;
}

const fn crc8_table() -> [u8; 256] {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x07
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const fn crc16_table() -> [u16; 256] {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x8005
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const CRC8: [u8; 256] = crc8_table();
const CRC16: [u16; 256] = crc16_table();

/// CRC-8 with polynomial x⁸ + x² + x¹ + x⁰, as used by frame headers
#[derive(Copy, Clone, Debug, Default)]
pub struct Crc8(u8);

impl Crc8 {
    /// The checksum's current value
    #[inline]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Checksum for Crc8 {
    #[inline]
    fn update(&mut self, byte: u8) {
        self.0 = CRC8[usize::from(self.0 ^ byte)];
    }

    #[inline]
    fn valid(&self) -> bool {
        self.0 == 0
    }
}

/// CRC-16 with polynomial x¹⁶ + x¹⁵ + x² + x⁰, as used by frame footers
#[derive(Copy, Clone, Debug, Default)]
pub struct Crc16(u16);

impl Crc16 {
    /// The checksum's current value
    #[inline]
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl Checksum for Crc16 {
    #[inline]
    fn update(&mut self, byte: u8) {
        self.0 = (self.0 << 8) ^ CRC16[usize::from((self.0 >> 8) as u8 ^ byte)];
    }

    #[inline]
    fn valid(&self) -> bool {
        self.0 == 0
    }
}

/// A reader which updates a checksum with every byte read
pub struct CrcReader<R, C> {
    reader: R,
    checksum: C,
}

impl<R, C: Checksum> CrcReader<R, C> {
    /// Wraps reader with a fresh checksum
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            checksum: C::default(),
        }
    }

    /// Consumes reader and returns its checksum
    pub fn into_checksum(self) -> C {
        self.checksum
    }
}

impl<R: std::io::Read, C: Checksum> std::io::Read for CrcReader<R, C> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf).inspect(|amt_read| {
            self.checksum.update_bytes(&buf[0..*amt_read]);
        })
    }
}
