// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Decoded audio frames

use crate::byteorder::Endianness;
use crate::stream::FrameHeader;

/// One frame's worth of decoded samples
///
/// Samples are held planar, with every channel
/// exactly one block long and stored back to back.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    header: FrameHeader,
    samples: Vec<i32>,
    block_size: usize,
    crc16: u16,
}

impl Frame {
    /// # Panics
    ///
    /// Panics unless `samples` holds exactly one block
    /// per channel in the header's channel assignment.
    pub(crate) fn new(header: FrameHeader, samples: Vec<i32>, crc16: u16) -> Self {
        let block_size = header.block_size as usize;
        assert_eq!(
            samples.len(),
            block_size * usize::from(header.channel_assignment.channel_count())
        );

        Self {
            header,
            samples,
            block_size,
            crc16,
        }
    }

    /// The header this frame was decoded from
    #[inline]
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// The CRC-16 from the frame's footer
    #[inline]
    pub fn crc16(&self) -> u16 {
        self.crc16
    }

    /// Samples per channel
    #[inline]
    pub fn pcm_frames(&self) -> usize {
        self.block_size
    }

    /// Number of channels in the frame
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.samples.len() / self.block_size
    }

    /// Samples per second, per channel
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.header.sample_rate
    }

    /// Size of each output sample, in bits
    #[inline]
    pub fn bits_per_sample(&self) -> u32 {
        self.header.bits_per_sample
    }

    /// Bytes needed to hold a single sample
    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample().div_ceil(8) as usize
    }

    /// Bytes needed to hold every sample in the frame
    #[inline]
    pub fn bytes_len(&self) -> usize {
        self.samples.len() * self.bytes_per_sample()
    }

    /// The samples of a single channel, in the
    /// order given by the frame's channel assignment
    pub fn channel(&self, index: usize) -> Option<&[i32]> {
        let start = index.checked_mul(self.block_size)?;
        self.samples.get(start..start.checked_add(self.block_size)?)
    }

    /// Each channel's samples, in channel order
    #[inline]
    pub fn channels(&self) -> std::slice::ChunksExact<'_, i32> {
        self.samples.chunks_exact(self.block_size)
    }

    /// Every sample, interleaved by channel
    ///
    /// ```
    /// use flac_decoder::decode::Decoder;
    ///
    /// let flac: &[u8] = &[
    ///     0x66, 0x4c, 0x61, 0x43, 0x80, 0x00, 0x00, 0x22,
    ///     0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
    ///     0x00, 0x00, 0x0a, 0xc4, 0x42, 0xf0, 0x00, 0x00,
    ///     0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ///     0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ///     0x00, 0x00,
    ///     // frame header
    ///     0xff, 0xf8, 0x69, 0x18, 0x00, 0x00, 0xbf,
    ///     // two VERBATIM subframes, one sample each
    ///     0x02, 0x02, 0x01, 0x02, 0xfe, 0xff,
    ///     // CRC-16
    ///     0x91, 0x22,
    /// ];
    ///
    /// let frame = Decoder::new(flac).unwrap().read_frame().unwrap().unwrap();
    /// assert_eq!(frame.iter().collect::<Vec<_>>(), [0x0201, -0x0101]);
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.block_size).flat_map(move |i| self.channels().map(move |channel| channel[i]))
    }

    /// Takes each channel's samples, in channel order
    pub fn into_channels(self) -> Vec<Vec<i32>> {
        self.channels().map(<[i32]>::to_vec).collect()
    }

    /// Writes every sample to `buf`, interleaved by channel,
    /// using [`Frame::bytes_per_sample`] bytes each
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than [`Frame::bytes_len`].
    ///
    /// # Example
    /// ```
    /// use flac_decoder::byteorder::LittleEndian;
    /// use flac_decoder::decode::Decoder;
    ///
    /// let flac: &[u8] = &[
    ///     0x66, 0x4c, 0x61, 0x43, 0x80, 0x00, 0x00, 0x22,
    ///     0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
    ///     0x00, 0x00, 0x0a, 0xc4, 0x42, 0xf0, 0x00, 0x00,
    ///     0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ///     0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ///     0x00, 0x00,
    ///     0xff, 0xf8, 0x69, 0x18, 0x00, 0x00, 0xbf,
    ///     0x02, 0x02, 0x01, 0x02, 0xfe, 0xff,
    ///     0x91, 0x22,
    /// ];
    ///
    /// let frame = Decoder::new(flac).unwrap().read_frame().unwrap().unwrap();
    /// let mut buf = vec![0; frame.bytes_len()];
    /// frame.to_buf::<LittleEndian>(&mut buf);
    /// assert_eq!(buf, [0x01, 0x02, 0xff, 0xfe]);
    /// ```
    pub fn to_buf<E: Endianness>(&self, buf: &mut [u8]) {
        let bytes = self.bytes_per_sample();
        assert!(buf.len() >= self.bytes_len(), "output buffer too small");

        for (sample, out) in self.iter().zip(buf.chunks_exact_mut(bytes)) {
            E::write_sample(sample, out);
        }
    }

    /// Every sample as bytes, interleaved by channel
    pub fn to_bytes<E: Endianness>(&self) -> Vec<u8> {
        let mut buf = vec![0; self.bytes_len()];
        self.to_buf::<E>(&mut buf);
        buf
    }
}
