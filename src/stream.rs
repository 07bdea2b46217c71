// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For handling FLAC frame headers

use crate::Error;
use crate::bitstream::BitCursor;
use crate::metadata::Streaminfo;
use std::io::Read;

/// The 14-bit code every frame header starts with
pub const SYNC_CODE: u64 = 0b11111111111110;

/// How a stream's frames are numbered
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlockingStrategy {
    /// Frames have a fixed size and carry their frame number
    Fixed,
    /// Frames may vary in size and carry their first sample's number
    Variable,
}

/// A FLAC frame header
///
/// | Bits | Field | Meaning |
/// |-----:|-------|---------|
/// | 14   | sync code | `0b11111111111110`
/// | 1    | reserved  | always 0
/// | 1    | `blocking_strategy` | fixed or variable
/// | 4    | block size code |
/// | 4    | sample rate code |
/// | 4    | `channel_assignment` |
/// | 3    | bits-per-sample code |
/// | 1    | reserved  | always 0
/// | 8-56 | `number` | UTF-8 style coded frame or sample number
/// | 0/8/16 | block size | if requested by its code
/// | 0/8/16 | sample rate | if requested by its code
/// | 8    | `crc8` | CRC-8 of all preceding header bytes
///
/// # Example
/// ```
/// use flac_decoder::bitstream::BitCursor;
/// use flac_decoder::metadata::Streaminfo;
/// use flac_decoder::stream::{BlockingStrategy, ChannelAssignment, FrameHeader};
/// use bitstream_io::{BitReader, BitRead, BigEndian};
///
/// let streaminfo: &[u8] = &[
///     0x10, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
///     0x0a, 0xc4, 0x40, 0xf0, 0x00, 0x00, 0xac, 0x44, 0x00, 0x00,
///     0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
///     0x00, 0x00, 0x00, 0x00,
/// ];
/// let streaminfo = BitReader::endian(streaminfo, BigEndian)
///     .parse::<Streaminfo>()
///     .unwrap();
///
/// let header: &[u8] = &[0xff, 0xf8, 0x69, 0x08, 0x00, 0x13, 0x64];
/// let header = FrameHeader::read(header, &streaminfo).unwrap();
///
/// assert_eq!(header.blocking_strategy, BlockingStrategy::Fixed);
/// assert_eq!(header.block_size, 20);
/// assert_eq!(header.sample_rate, 44100);
/// assert_eq!(header.channel_assignment, ChannelAssignment::Independent(1));
/// assert_eq!(header.bits_per_sample, 16);
/// assert_eq!(header.number, 0);
/// assert_eq!(header.crc8, 0x64);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FrameHeader {
    /// Whether the frame's number counts frames or samples
    pub blocking_strategy: BlockingStrategy,
    /// Number of samples in each of the frame's channels
    pub block_size: u32,
    /// Sample rate, in Hz
    pub sample_rate: u32,
    /// How the frame's channels are stored
    pub channel_assignment: ChannelAssignment,
    /// Bits in each output sample
    pub bits_per_sample: u32,
    /// Frame number for fixed-size blocks,
    /// or the first sample's number for variable-sized blocks
    pub number: u64,
    /// The header's stored CRC-8
    pub crc8: u8,
}

impl FrameHeader {
    /// Parses and checksums a frame header from the given reader
    ///
    /// # Errors
    ///
    /// Returns any error from [`FrameHeader::parse`],
    /// or [`Error::Crc8Mismatch`] if the header's bytes
    /// don't match its stored CRC-8.
    pub fn read<R: Read>(reader: R, streaminfo: &Streaminfo) -> Result<Self, Error> {
        use crate::crc::{Checksum, Crc8, CrcReader};

        let mut crc8: CrcReader<_, Crc8> = CrcReader::new(reader);
        let header = Self::parse(&mut BitCursor::new(crc8.by_ref()), streaminfo)?;

        match crc8.into_checksum().valid() {
            true => Ok(header),
            false => Err(Error::Crc8Mismatch),
        }
    }

    /// Parses a frame header from the given cursor
    /// without checking its CRC-8
    ///
    /// Fields coded as "from STREAMINFO" are taken from `streaminfo`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync code is wrong,
    /// a reserved bit or code is used,
    /// or the byte source runs out.
    pub fn parse<R: Read>(r: &mut BitCursor<R>, streaminfo: &Streaminfo) -> Result<Self, Error> {
        if r.read_unsigned(14)? != SYNC_CODE {
            return Err(Error::InvalidSyncCode);
        }
        if r.read_bit()? {
            return Err(Error::ReservedBitSet);
        }
        let blocking_strategy = match r.read_bit()? {
            false => BlockingStrategy::Fixed,
            true => BlockingStrategy::Variable,
        };
        // all codes are 4 bits or less
        let encoded_block_size = r.read_unsigned(4)? as u8;
        let encoded_sample_rate = r.read_unsigned(4)? as u8;
        let encoded_channels = r.read_unsigned(4)? as u8;
        let encoded_bps = r.read_unsigned(3)? as u8;
        if r.read_bit()? {
            return Err(Error::ReservedBitSet);
        }
        let number = read_frame_number(r)?;

        let header = Self {
            blocking_strategy,
            number,
            block_size: match encoded_block_size {
                0b0000 => return Err(Error::InvalidBlockSize),
                0b0001 => 192,
                v @ 0b0010..=0b0101 => 576 << (v - 2),
                0b0110 => r.read_unsigned(8)? as u32 + 1,
                0b0111 => r.read_unsigned(16)? as u32 + 1,
                v => 256 << (v - 8),
            },
            sample_rate: match encoded_sample_rate {
                0b0000 => streaminfo.sample_rate,
                0b0001 => 88200,
                0b0010 => 176400,
                0b0011 => 192000,
                0b0100 => 8000,
                0b0101 => 16000,
                0b0110 => 22050,
                0b0111 => 24000,
                0b1000 => 32000,
                0b1001 => 44100,
                0b1010 => 48000,
                0b1011 => 96000,
                0b1100 => r.read_unsigned(8)? as u32 * 1000,
                0b1101 => r.read_unsigned(16)? as u32,
                0b1110 => r.read_unsigned(16)? as u32 * 10,
                _ => return Err(Error::InvalidSampleRate),
            },
            channel_assignment: match encoded_channels {
                c @ 0b0000..=0b0111 => ChannelAssignment::Independent(c + 1),
                0b1000 => ChannelAssignment::LeftSide,
                0b1001 => ChannelAssignment::SideRight,
                0b1010 => ChannelAssignment::MidSide,
                _ => return Err(Error::InvalidChannels),
            },
            bits_per_sample: match encoded_bps {
                0b000 => u32::from(streaminfo.bits_per_sample),
                0b001 => 8,
                0b010 => 12,
                0b011 => return Err(Error::InvalidBitsPerSample),
                0b100 => 16,
                0b101 => 20,
                0b110 => 24,
                _ => 32,
            },
            crc8: r.read_unsigned(8)? as u8,
        };

        log::trace!("{header:?}");

        Ok(header)
    }
}

/// How a frame's channels are stored
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChannelAssignment {
    /// Channels are stored independently
    Independent(u8),
    /// Channel 0 is left, channel 1 is side
    LeftSide,
    /// Channel 0 is side, channel 1 is right
    SideRight,
    /// Channel 0 is mid, channel 1 is side
    MidSide,
}

impl ChannelAssignment {
    /// Total number of channels in the frame
    #[inline]
    pub fn channel_count(&self) -> u8 {
        match self {
            Self::Independent(c) => *c,
            Self::LeftSide | Self::SideRight | Self::MidSide => 2,
        }
    }

    /// The index of the subframe stored with one extra bit-per-sample, if any
    #[inline]
    pub fn side_channel(&self) -> Option<usize> {
        match self {
            Self::Independent(_) => None,
            Self::LeftSide | Self::MidSide => Some(1),
            Self::SideRight => Some(0),
        }
    }
}

// A leading run of N 1 bits gives an N-byte number,
// with a single 0 bit marking a 1-byte number.
fn read_frame_number<R: Read>(r: &mut BitCursor<R>) -> Result<u64, Error> {
    let mut bytes = 0;
    while r.read_bit()? {
        bytes += 1;
        if bytes > 7 {
            return Err(Error::InvalidFrameNumber);
        }
    }

    match bytes {
        0 => r.read_unsigned(7),
        1 => Err(Error::InvalidFrameNumber),
        bytes => {
            let mut number = r.read_unsigned(7 - bytes)?;
            for _ in 1..bytes {
                match r.read_unsigned(2)? {
                    0b10 => {
                        number = number << 6 | r.read_unsigned(6)?;
                    }
                    _ => return Err(Error::InvalidFrameNumber),
                }
            }
            Ok(number)
        }
    }
}
