// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Builds small FLAC streams bit by bit for decoding tests

#![allow(dead_code)]

use bitstream_io::{BigEndian, BitWrite, BitWriter};
use flac_decoder::bitstream::zigzag_encode;
use flac_decoder::crc::{Checksum, Crc8, Crc16};

pub type Writer = BitWriter<Vec<u8>, BigEndian>;

pub fn writer() -> Writer {
    BitWriter::endian(Vec::new(), BigEndian)
}

/// Writes the low `bits` bits of a signed value
pub fn write_signed(w: &mut Writer, bits: u32, value: i64) {
    if bits > 0 {
        let mask = u64::MAX >> (64 - bits);
        w.write_var::<u64>(bits, (value as u64) & mask).unwrap();
    }
}

pub fn write_unsigned(w: &mut Writer, bits: u32, value: u64) {
    if bits > 0 {
        w.write_var::<u64>(bits, value).unwrap();
    }
}

/// Writes a Rice-coded signed value
pub fn write_rice(w: &mut Writer, k: u32, value: i64) {
    let folded = zigzag_encode(value);
    w.write_unary::<1>((folded >> k) as u32).unwrap();
    write_unsigned(w, k, folded & ((1u64 << k) - 1));
}

#[derive(Clone, Debug)]
pub struct Info {
    pub min_block_size: u16,
    pub max_block_size: u16,
    pub sample_rate: u32,
    pub channels: u8,
    pub bits_per_sample: u8,
    pub total_samples: u64,
    pub md5: [u8; 16],
}

impl Info {
    pub fn new(sample_rate: u32, channels: u8, bits_per_sample: u8, block_size: u16) -> Self {
        Self {
            min_block_size: block_size,
            max_block_size: block_size,
            sample_rate,
            channels,
            bits_per_sample,
            total_samples: 0,
            md5: [0; 16],
        }
    }

    /// The 34 bytes of a STREAMINFO block's contents
    pub fn streaminfo(&self) -> Vec<u8> {
        let mut w = writer();
        w.write::<16, u16>(self.min_block_size).unwrap();
        w.write::<16, u16>(self.max_block_size).unwrap();
        w.write::<24, u32>(0).unwrap();
        w.write::<24, u32>(0).unwrap();
        w.write::<20, u32>(self.sample_rate).unwrap();
        w.write::<3, u8>(self.channels - 1).unwrap();
        w.write::<5, u8>(self.bits_per_sample - 1).unwrap();
        w.write::<36, u64>(self.total_samples).unwrap();
        w.write_bytes(&self.md5).unwrap();
        w.into_writer()
    }
}

/// A metadata block header followed by its contents
pub fn block(last: bool, block_type: u8, contents: &[u8]) -> Vec<u8> {
    let mut w = writer();
    w.write_bit(last).unwrap();
    w.write::<7, u8>(block_type).unwrap();
    w.write::<24, u32>(contents.len() as u32).unwrap();
    w.write_bytes(contents).unwrap();
    w.into_writer()
}

/// The "fLaC" tag, a STREAMINFO block and any additional blocks
pub fn stream_start(info: &Info, blocks: &[(u8, Vec<u8>)]) -> Vec<u8> {
    let mut bytes = b"fLaC".to_vec();
    bytes.extend(block(blocks.is_empty(), 0, &info.streaminfo()));
    for (i, (block_type, contents)) in blocks.iter().enumerate() {
        bytes.extend(block(i + 1 == blocks.len(), *block_type, contents));
    }
    bytes
}

/// Frame header fields, as stored
#[derive(Clone, Debug)]
pub struct Header {
    pub variable: bool,
    pub block_size_code: u8,
    pub sample_rate_code: u8,
    pub channel_code: u8,
    pub bps_code: u8,
    pub number: u64,
    pub block_size: u32,
    pub sample_rate: u32,
}

impl Header {
    /// A header with a 16-bit inline block size
    /// and all other fields from STREAMINFO
    pub fn new(block_size: u32, channel_code: u8, number: u64) -> Self {
        Self {
            variable: false,
            block_size_code: 0b0111,
            sample_rate_code: 0b0000,
            channel_code,
            bps_code: 0b000,
            number,
            block_size,
            sample_rate: 0,
        }
    }

    fn write(&self, w: &mut Writer) {
        w.write::<14, u16>(0b11111111111110).unwrap();
        w.write_bit(false).unwrap();
        w.write_bit(self.variable).unwrap();
        w.write::<4, u8>(self.block_size_code).unwrap();
        w.write::<4, u8>(self.sample_rate_code).unwrap();
        w.write::<4, u8>(self.channel_code).unwrap();
        w.write::<3, u8>(self.bps_code).unwrap();
        w.write_bit(false).unwrap();
        write_utf8(w, self.number);
        match self.block_size_code {
            0b0110 => w.write::<8, u32>(self.block_size - 1).unwrap(),
            0b0111 => w.write::<16, u32>(self.block_size - 1).unwrap(),
            _ => {}
        }
        match self.sample_rate_code {
            0b1100 => w.write::<8, u32>(self.sample_rate / 1000).unwrap(),
            0b1101 => w.write::<16, u32>(self.sample_rate).unwrap(),
            0b1110 => w.write::<16, u32>(self.sample_rate / 10).unwrap(),
            _ => {}
        }
    }
}

fn write_utf8(w: &mut Writer, number: u64) {
    if number < 0x80 {
        w.write::<8, u8>(number as u8).unwrap();
    } else {
        let bytes = (2..=7u32)
            .find(|b| number < 1 << (5 * b + 1))
            .expect("frame number too large");
        w.write::<8, u8>(!(0xFF >> bytes) | (number >> (6 * (bytes - 1))) as u8)
            .unwrap();
        for i in (0..bytes - 1).rev() {
            w.write::<8, u8>(0x80 | ((number >> (6 * i)) & 0x3F) as u8)
                .unwrap();
        }
    }
}

/// A complete frame with valid CRC-8 and CRC-16
///
/// `subframes` writes the frame's subframes,
/// which are padded to a whole byte afterward.
pub fn frame(header: &Header, subframes: impl FnOnce(&mut Writer)) -> Vec<u8> {
    let mut w = writer();
    header.write(&mut w);
    let mut bytes = w.into_writer();
    let mut crc8 = Crc8::default();
    crc8.update_bytes(&bytes);
    bytes.push(crc8.value());

    let mut w = writer();
    subframes(&mut w);
    w.byte_align().unwrap();
    bytes.extend(w.into_writer());

    let mut crc16 = Crc16::default();
    crc16.update_bytes(&bytes);
    bytes.extend(crc16.value().to_be_bytes());
    bytes
}

pub fn subframe_header(w: &mut Writer, type_code: u8, wasted_bits: u32) {
    w.write_bit(false).unwrap();
    w.write::<6, u8>(type_code).unwrap();
    match wasted_bits {
        0 => w.write_bit(false).unwrap(),
        wasted => {
            w.write_bit(true).unwrap();
            w.write_unary::<1>(wasted - 1).unwrap();
        }
    }
}

pub fn constant(w: &mut Writer, bits_per_sample: u32, value: i32) {
    subframe_header(w, 0b000000, 0);
    write_signed(w, bits_per_sample, value.into());
}

pub fn verbatim(w: &mut Writer, bits_per_sample: u32, samples: &[i32]) {
    subframe_header(w, 0b000001, 0);
    for s in samples {
        write_signed(w, bits_per_sample, (*s).into());
    }
}

/// A Rice parameter suited to the given residual values
pub fn rice_parameter(residual: &[i64]) -> u32 {
    residual
        .iter()
        .map(|r| zigzag_encode(*r))
        .max()
        .and_then(|m| m.checked_ilog2())
        .unwrap_or(0)
        .min(14)
}

/// A single-partition residual with the given Rice parameter
pub fn residual(w: &mut Writer, rice_parameter: u32, residual: &[i64]) {
    w.write::<2, u8>(0).unwrap();
    w.write::<4, u8>(0).unwrap();
    w.write::<4, u32>(rice_parameter).unwrap();
    for r in residual {
        write_rice(w, rice_parameter, *r);
    }
}

/// Prediction errors of samples against the given coefficients
pub fn prediction_residual(coefficients: &[i64], shift: u32, samples: &[i32]) -> Vec<i64> {
    let order = coefficients.len();
    (order..samples.len())
        .map(|i| {
            let prediction = coefficients
                .iter()
                .zip(samples[i - order..i].iter().rev())
                .map(|(c, s)| c * i64::from(*s))
                .sum::<i64>()
                >> shift;
            i64::from(samples[i]) - prediction
        })
        .collect()
}

pub const FIXED: [&[i64]; 5] = [&[], &[1], &[2, -1], &[3, -3, 1], &[4, -6, 4, -1]];

pub fn fixed(w: &mut Writer, bits_per_sample: u32, order: usize, samples: &[i32]) {
    fixed_wasted(w, bits_per_sample, 0, order, samples)
}

/// A FIXED subframe whose `samples` are stored with
/// `wasted_bits` low bits removed from a `bits_per_sample` width
pub fn fixed_wasted(
    w: &mut Writer,
    bits_per_sample: u32,
    wasted_bits: u32,
    order: usize,
    samples: &[i32],
) {
    subframe_header(w, 0b001000 + order as u8, wasted_bits);
    for s in &samples[..order] {
        write_signed(w, bits_per_sample - wasted_bits, (*s).into());
    }
    let errors = prediction_residual(FIXED[order], 0, samples);
    residual(w, rice_parameter(&errors), &errors);
}

pub fn lpc(
    w: &mut Writer,
    bits_per_sample: u32,
    precision: u32,
    shift: u32,
    coefficients: &[i64],
    samples: &[i32],
) {
    lpc_wasted(w, bits_per_sample, 0, precision, shift, coefficients, samples)
}

/// An LPC subframe whose `samples` are stored with
/// `wasted_bits` low bits removed from a `bits_per_sample` width
pub fn lpc_wasted(
    w: &mut Writer,
    bits_per_sample: u32,
    wasted_bits: u32,
    precision: u32,
    shift: u32,
    coefficients: &[i64],
    samples: &[i32],
) {
    let order = coefficients.len();
    subframe_header(w, 0b011111 + order as u8, wasted_bits);
    for s in &samples[..order] {
        write_signed(w, bits_per_sample - wasted_bits, (*s).into());
    }
    w.write::<4, u32>(precision - 1).unwrap();
    w.write::<5, u32>(shift).unwrap();
    for c in coefficients {
        write_signed(w, precision, *c);
    }
    let errors = prediction_residual(coefficients, shift, samples);
    residual(w, rice_parameter(&errors), &errors);
}

/// MD5 of samples, interleaved as little-endian bytes
pub fn md5_of(channels: &[Vec<i32>], bytes_per_sample: usize) -> [u8; 16] {
    let mut context = md5::Context::new();
    for i in 0..channels[0].len() {
        for channel in channels {
            context.consume(&channel[i].to_le_bytes()[..bytes_per_sample]);
        }
    }
    context.compute().0
}
