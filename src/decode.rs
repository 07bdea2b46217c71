// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For decoding FLAC files to PCM samples

use crate::Error;
use crate::audio::Frame;
use crate::metadata::{BlockList, Metadata, Streaminfo};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// FLAC decoding options
///
/// # Example
/// ```
/// use flac_decoder::decode::DecodingOptions;
///
/// let options = DecodingOptions::default()
///     .verify_crc(false)
///     .verify_md5(true);
/// ```
#[derive(Copy, Clone, Debug)]
pub struct DecodingOptions {
    verify_crc: bool,
    verify_md5: bool,
}

impl Default for DecodingOptions {
    fn default() -> Self {
        Self {
            verify_crc: true,
            verify_md5: false,
        }
    }
}

impl DecodingOptions {
    /// Whether to check each frame's CRC-8 and CRC-16
    ///
    /// The default is `true`.
    pub fn verify_crc(self, verify_crc: bool) -> Self {
        Self { verify_crc, ..self }
    }

    /// Whether to calculate the MD5 of all decoded samples
    ///
    /// This is required for [`Decoder::verify`] to compare
    /// against the stream's stored MD5.
    /// The default is `false`.
    pub fn verify_md5(self, verify_md5: bool) -> Self {
        Self { verify_md5, ..self }
    }
}

/// The result of a stream verification
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Verified {
    /// All samples decoded and the MD5 signature matches
    MD5Match,
    /// All samples decoded but the MD5 signature doesn't match
    MD5Mismatch,
    /// All samples decoded but no MD5 signature is available
    NoMD5,
}

/// A FLAC decoder
///
/// Metadata is read when the decoder is opened,
/// and frames are decoded one at a time afterward.
pub struct Decoder<R> {
    reader: BufReader<R>,
    blocks: BlockList,
    options: DecodingOptions,
    md5: Option<md5::Context>,
    side: Vec<i64>,
    samples_read: u64,
    failed: bool,
}

impl<R: Read> Decoder<R> {
    /// Builds a new FLAC decoder from the given stream
    /// with default options
    ///
    /// This assumes the stream is positioned at the start
    /// of the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial FLAC metadata
    /// is invalid or an I/O error occurs reading
    /// the initial metadata.
    #[inline]
    pub fn new(reader: R) -> Result<Self, Error> {
        Self::with_options(reader, DecodingOptions::default())
    }

    /// Builds a new FLAC decoder from the given stream
    /// with the given options
    ///
    /// # Errors
    ///
    /// Returns an error if the initial FLAC metadata
    /// is invalid, an I/O error occurs reading
    /// the initial metadata, or the stream's
    /// bits-per-sample isn't a whole number of bytes.
    pub fn with_options(reader: R, options: DecodingOptions) -> Result<Self, Error> {
        let mut reader = BufReader::new(reader);
        let blocks = BlockList::read(reader.by_ref())?;

        if blocks.bits_per_sample() % 8 != 0 {
            return Err(Error::UnsupportedBitsPerSample);
        }

        log::debug!(
            "opened stream: {} Hz, {} channels, {} bits-per-sample",
            blocks.sample_rate(),
            blocks.channel_count(),
            blocks.bits_per_sample(),
        );

        Ok(Self {
            reader,
            md5: options.verify_md5.then(md5::Context::new),
            blocks,
            options,
            side: Vec::new(),
            samples_read: 0,
            failed: false,
        })
    }

    /// Returns the stream's STREAMINFO block
    #[inline]
    pub fn streaminfo(&self) -> &Streaminfo {
        self.blocks.streaminfo()
    }

    /// Returns all the stream's metadata blocks
    #[inline]
    pub fn metadata(&self) -> &BlockList {
        &self.blocks
    }

    /// Returns the number of channel-independent samples decoded so far
    #[inline]
    pub fn samples_read(&self) -> u64 {
        self.samples_read
    }

    /// Reads a whole FLAC frame
    ///
    /// Returns `Ok(None)` if the stream ends
    /// exactly at a frame boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs when reading
    /// the stream, or if the stream data is invalid.
    pub fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        use crate::bitstream::BitCursor;
        use crate::crc::{Checksum, Crc16, CrcReader};
        use crate::stream::{ChannelAssignment, FrameHeader};
        use crate::subframe::Subframe;

        if self.reader.fill_buf()?.is_empty() {
            return Ok(None);
        }

        let streaminfo = self.blocks.streaminfo();
        let mut crc16_reader: CrcReader<_, Crc16> = CrcReader::new(self.reader.by_ref());

        let header = match self.options.verify_crc {
            true => FrameHeader::read(crc16_reader.by_ref(), streaminfo)?,
            false => FrameHeader::parse(&mut BitCursor::new(crc16_reader.by_ref()), streaminfo)?,
        };

        if header.channel_assignment.channel_count() != streaminfo.channels.get() {
            return Err(Error::ChannelCountMismatch);
        }
        if header.bits_per_sample != u32::from(streaminfo.bits_per_sample) {
            return Err(Error::BitsPerSampleMismatch);
        }

        let block_size = header.block_size as usize;
        let bits_per_sample = header.bits_per_sample;
        let mut samples =
            vec![0; block_size * usize::from(header.channel_assignment.channel_count())];

        let mut reader = BitCursor::new(crc16_reader.by_ref());
        let side_index = header.channel_assignment.side_channel();

        // the side channel is one bit wider, which is 33 bits
        // for a 32-bit stream, so it's decoded separately
        for (index, channel) in samples.chunks_exact_mut(block_size).enumerate() {
            match side_index == Some(index) {
                true => {
                    self.side.clear();
                    self.side.resize(block_size, 0);
                    Subframe::read(&mut reader, bits_per_sample + 1, block_size)?
                        .decode(&mut self.side)?;
                }
                false => {
                    Subframe::read(&mut reader, bits_per_sample, block_size)?.decode(channel)?;
                }
            }
        }

        let (first, second) = samples.split_at_mut(block_size);
        match header.channel_assignment {
            ChannelAssignment::Independent(_) => {}
            ChannelAssignment::LeftSide => decorrelate_left_side(first, &self.side, second),
            ChannelAssignment::SideRight => decorrelate_side_right(&self.side, second, first),
            ChannelAssignment::MidSide => decorrelate_mid_side(first, &self.side, second),
        }

        reader.align_to_byte();
        let crc16 = reader.read_unsigned(16)? as u16;
        drop(reader);

        if self.options.verify_crc && !crc16_reader.into_checksum().valid() {
            return Err(Error::Crc16Mismatch);
        }

        let frame = Frame::new(header, samples, crc16);

        if let Some(md5) = self.md5.as_mut() {
            md5.consume(frame.to_bytes::<crate::byteorder::LittleEndian>());
        }
        self.samples_read += frame.pcm_frames() as u64;

        Ok(Some(frame))
    }

    /// Decodes all remaining frames and checks the stream's MD5
    ///
    /// MD5 signatures can only be compared if the decoder
    /// was opened with [`DecodingOptions::verify_md5`] enabled,
    /// and no MD5 is reported otherwise.
    ///
    /// # Errors
    ///
    /// Returns any error from decoding the remaining frames.
    pub fn verify(mut self) -> Result<Verified, Error> {
        while self.read_frame()?.is_some() {}

        match (self.md5, self.blocks.md5()) {
            (Some(context), Some(stored)) => {
                let calculated = context.compute();
                log::debug!("calculated MD5 {calculated:x}, stored MD5 {stored:02x?}");
                match calculated.0 == *stored {
                    true => Ok(Verified::MD5Match),
                    false => Ok(Verified::MD5Mismatch),
                }
            }
            (None, _) => {
                log::warn!("MD5 calculation not enabled for this decoder");
                Ok(Verified::NoMD5)
            }
            (Some(_), None) => {
                log::warn!("stream has no MD5 signature to verify");
                Ok(Verified::NoMD5)
            }
        }
    }
}

impl<R: Read> Metadata for Decoder<R> {
    fn channel_count(&self) -> u8 {
        self.blocks.channel_count()
    }

    fn sample_rate(&self) -> u32 {
        self.blocks.sample_rate()
    }

    fn bits_per_sample(&self) -> u32 {
        self.blocks.bits_per_sample()
    }

    fn total_samples(&self) -> Option<u64> {
        self.blocks.total_samples()
    }

    fn md5(&self) -> Option<&[u8; 16]> {
        self.blocks.md5()
    }
}

impl<R: Read> Iterator for Decoder<R> {
    type Item = Result<Frame, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let result = self.read_frame().transpose();
        if let Some(Err(_)) = &result {
            self.failed = true;
        }
        result
    }
}

/// Decodes the FLAC file at the given path and checks its MD5
///
/// # Errors
///
/// Returns an error if the file can't be opened
/// or any of its metadata or frames are invalid.
pub fn verify<P: AsRef<Path>>(path: P) -> Result<Verified, Error> {
    Decoder::with_options(
        std::fs::File::open(path.as_ref())?,
        DecodingOptions::default().verify_md5(true),
    )?
    .verify()
}

/// Rebuilds the right channel from left and side channels
///
/// ```
/// use flac_decoder::decode::decorrelate_left_side;
///
/// let mut right = [0];
/// decorrelate_left_side(&[100], &[20], &mut right);
/// assert_eq!(right, [80]);
/// ```
pub fn decorrelate_left_side(left: &[i32], side: &[i64], right: &mut [i32]) {
    for ((l, s), r) in left.iter().zip(side).zip(right) {
        *r = (i64::from(*l) - s) as i32;
    }
}

/// Rebuilds the left channel from side and right channels
///
/// ```
/// use flac_decoder::decode::decorrelate_side_right;
///
/// let mut left = [0];
/// decorrelate_side_right(&[20], &[80], &mut left);
/// assert_eq!(left, [100]);
/// ```
pub fn decorrelate_side_right(side: &[i64], right: &[i32], left: &mut [i32]) {
    for ((s, r), l) in side.iter().zip(right).zip(left) {
        *l = (s + i64::from(*r)) as i32;
    }
}

/// Rebuilds left and right channels from mid and side channels
///
/// The mid channel is replaced by the left channel in place.
///
/// ```
/// use flac_decoder::decode::decorrelate_mid_side;
///
/// let mut mid = [90];
/// let mut right = [0];
/// decorrelate_mid_side(&mut mid, &[20], &mut right);
/// assert_eq!((mid, right), ([100], [80]));
/// ```
pub fn decorrelate_mid_side(mid: &mut [i32], side: &[i64], right: &mut [i32]) {
    for ((m, s), r) in mid.iter_mut().zip(side).zip(right) {
        let mid = (i64::from(*m) << 1) | (s & 1);
        *m = ((mid + s) >> 1) as i32;
        *r = ((mid - s) >> 1) as i32;
    }
}
