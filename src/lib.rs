// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A library for decoding FLAC streams to PCM samples
//!
//! Decoding is pull-based: a [`decode::Decoder`] reads a stream's
//! metadata blocks when opened and then yields one
//! [`audio::Frame`] of per-channel samples per call
//! until the underlying byte source is exhausted.
//!
//! ```text
//! ┌──────┬────────────┬───────────┬───┬───────────┬─────────┬─────────┬───┐
//! │ fLaC │ STREAMINFO │ metadata… │   │ frame hdr │ subfr 0 │ subfr 1 │ … │
//! └──────┴────────────┴───────────┴───┴───────────┴─────────┴─────────┴───┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use flac_decoder::decode::Decoder;
//! use flac_decoder::metadata::Metadata;
//! use std::fs::File;
//!
//! let mut decoder = Decoder::new(File::open("sample.flac").unwrap()).unwrap();
//! println!("{} Hz, {} channels", decoder.sample_rate(), decoder.channel_count());
//!
//! while let Some(frame) = decoder.read_frame().unwrap() {
//!     for channel in frame.channels() {
//!         assert_eq!(channel.len(), frame.pcm_frames());
//!     }
//! }
//! ```

pub mod audio;
pub mod bitstream;
pub mod byteorder;
pub mod crc;
pub mod decode;
pub mod metadata;
pub mod residual;
pub mod stream;
pub mod subframe;

/// A FLAC decoding error
#[derive(Debug)]
pub enum Error {
    /// A general I/O error from the underlying stream
    Io(std::io::Error),
    /// The byte source ran out in the middle of a field
    UnexpectedEof,
    /// A UTF-8 formatting error
    Utf8(std::string::FromUtf8Error),
    /// A FLAC file missing its initial "fLaC" file tag
    MissingFlacTag,
    /// A FLAC file missing its initial STREAMINFO block
    MissingStreaminfo,
    /// A FLAC file containing multiple STREAMINFO blocks
    MultipleStreaminfo,
    /// A FLAC file containing multiple SEEKTABLE blocks
    MultipleSeekTable,
    /// A FLAC file containing multiple VORBIS_COMMENT blocks
    MultipleVorbisComment,
    /// A SEEKTABLE block whose size isn't evenly divisible by 18
    InvalidSeekTableSize,
    /// A SEEKTABLE point whose offset does not increment properly
    InvalidSeekTablePoint,
    /// A PICTURE block with an undefined picture type
    InvalidPictureType,
    /// A metadata block with the invalid type code 127
    InvalidMetadataBlock,
    /// A metadata block whose contents don't match its size
    InvalidMetadataBlockSize,
    /// An APPLICATION block too small to hold its ID
    InsufficientApplicationBlock,
    /// A stream whose bits-per-sample isn't supported by this decoder
    UnsupportedBitsPerSample,
    /// A frame header with an invalid sync code
    InvalidSyncCode,
    /// A frame or subframe header with a reserved bit set
    ReservedBitSet,
    /// A frame header with an invalid block size code
    InvalidBlockSize,
    /// A frame header with an invalid sample rate code
    InvalidSampleRate,
    /// A frame header with a reserved channel assignment
    InvalidChannels,
    /// A frame header with a reserved bits-per-sample code
    InvalidBitsPerSample,
    /// A frame header with a malformed frame or sample number
    InvalidFrameNumber,
    /// A frame whose channel count differs from STREAMINFO
    ChannelCountMismatch,
    /// A frame whose bits-per-sample differs from STREAMINFO
    BitsPerSampleMismatch,
    /// A frame header whose CRC-8 doesn't match its contents
    Crc8Mismatch,
    /// A frame whose CRC-16 doesn't match its contents
    Crc16Mismatch,
    /// A subframe header with a reserved type code
    InvalidSubframeType,
    /// A subframe with more wasted bits than bits-per-sample
    ExcessiveWastedBits,
    /// A subframe wider than 33 bits, or too wide for its output samples
    ExcessiveBitsPerSample,
    /// An LPC subframe with an invalid coefficient precision
    InvalidLpcPrecision,
    /// An LPC subframe with a negative coefficient shift
    NegativeLpcShift,
    /// A residual with an unsupported coding method
    InvalidCodingMethod,
    /// A residual whose partition count doesn't divide the block size
    InvalidPartitionOrder,
    /// A predictor order larger than the residual's first partition
    ExcessivePredictorOrder,
    /// A residual value too large to be represented
    ResidualOverflow,
    /// A predicted sample too large to be represented
    PredictionOverflow,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Self::UnexpectedEof,
            _ => Self::Io(err),
        }
    }
}

impl From<std::string::FromUtf8Error> for Error {
    #[inline]
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::Utf8(err)
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Io(err) => err.fmt(f),
            Self::UnexpectedEof => "unexpected end of stream".fmt(f),
            Self::Utf8(err) => err.fmt(f),
            Self::MissingFlacTag => "stream does not start with \"fLaC\"".fmt(f),
            Self::MissingStreaminfo => "first metadata block is not STREAMINFO".fmt(f),
            Self::MultipleStreaminfo => "more than one STREAMINFO block".fmt(f),
            Self::MultipleSeekTable => "more than one SEEKTABLE block".fmt(f),
            Self::MultipleVorbisComment => "more than one VORBIS_COMMENT block".fmt(f),
            Self::InvalidSeekTableSize => "SEEKTABLE size not a multiple of 18 bytes".fmt(f),
            Self::InvalidSeekTablePoint => "SEEKTABLE points out of order".fmt(f),
            Self::InvalidPictureType => "undefined PICTURE type".fmt(f),
            Self::InvalidMetadataBlock => "metadata block type 127".fmt(f),
            Self::InvalidMetadataBlockSize => "metadata block contents differ from its size".fmt(f),
            Self::InsufficientApplicationBlock => "APPLICATION block shorter than its ID".fmt(f),
            Self::UnsupportedBitsPerSample => "unsupported bits-per-sample".fmt(f),
            Self::InvalidSyncCode => "invalid frame sync code".fmt(f),
            Self::ReservedBitSet => "reserved bit set".fmt(f),
            Self::InvalidBlockSize => "invalid frame block size".fmt(f),
            Self::InvalidSampleRate => "invalid frame sample rate".fmt(f),
            Self::InvalidChannels => "invalid frame channel assignment".fmt(f),
            Self::InvalidBitsPerSample => "invalid frame bits-per-sample".fmt(f),
            Self::InvalidFrameNumber => "invalid frame number".fmt(f),
            Self::ChannelCountMismatch => "frame channel count differs from stream".fmt(f),
            Self::BitsPerSampleMismatch => "frame bits-per-sample differs from stream".fmt(f),
            Self::Crc8Mismatch => "CRC-8 mismatch in frame header".fmt(f),
            Self::Crc16Mismatch => "CRC-16 mismatch in frame".fmt(f),
            Self::InvalidSubframeType => "invalid subframe type".fmt(f),
            Self::ExcessiveWastedBits => "excessive wasted bits in subframe".fmt(f),
            Self::ExcessiveBitsPerSample => "subframe bits-per-sample too large".fmt(f),
            Self::InvalidLpcPrecision => "invalid LPC coefficient precision".fmt(f),
            Self::NegativeLpcShift => "negative LPC coefficient shift".fmt(f),
            Self::InvalidCodingMethod => "invalid residual coding method".fmt(f),
            Self::InvalidPartitionOrder => {
                "residual partition count does not divide block size".fmt(f)
            }
            Self::ExcessivePredictorOrder => {
                "predictor order exceeds residual partition size".fmt(f)
            }
            Self::ResidualOverflow => "residual value overflow".fmt(f),
            Self::PredictionOverflow => "predicted sample overflow".fmt(f),
        }
    }
}
