// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::Error;
use bitstream_io::{BitRead, FromBitStream};

/// Reads a count-prefixed list of entries
fn read_list<R, T>(r: &mut R) -> Result<Vec<T>, T::Error>
where
    R: BitRead + ?Sized,
    T: FromBitStream,
    T::Error: From<std::io::Error>,
{
    let count = r.read_to::<u8>()?;
    (0..count).map(|_| r.parse()).collect()
}

/// The track layout of a CD or other disc
///
/// | Bits | Field |
/// |-----:|-------|
/// | 1024 | `catalog_number`, NUL-padded ASCII |
/// | 64   | `lead_in_samples` |
/// | 1    | `is_cdda` |
/// | 2071 | reserved |
/// | 8    | track count |
/// |      | [`CuesheetTrack`]s |
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Cuesheet {
    /// The media catalog number, padded with NUL bytes
    pub catalog_number: Box<[u8; 128]>,
    /// Samples in the disc's lead-in
    pub lead_in_samples: u64,
    /// Set if this is a Compact Disc
    pub is_cdda: bool,
    /// The disc's tracks, ending with the lead-out
    pub tracks: Vec<CuesheetTrack>,
}

impl Cuesheet {
    const RESERVED_BITS: u32 = 7 + 258 * 8;

    /// The catalog number without its NUL padding
    pub fn catalog(&self) -> &[u8] {
        let len = self.catalog_number.len()
            - self
                .catalog_number
                .iter()
                .rev()
                .take_while(|b| **b == 0)
                .count();
        &self.catalog_number[..len]
    }
}

impl FromBitStream for Cuesheet {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        let catalog_number = Box::new(r.read_to::<[u8; 128]>()?);
        let lead_in_samples = r.read_to()?;
        let is_cdda = r.read_bit()?;
        r.skip(Self::RESERVED_BITS)?;

        Ok(Self {
            catalog_number,
            lead_in_samples,
            is_cdda,
            tracks: read_list(r)?,
        })
    }
}

/// A single track of a [`Cuesheet`]
///
/// | Bits | Field |
/// |-----:|-------|
/// | 64   | `offset` |
/// | 8    | `number` |
/// | 96   | `isrc`, all 0 if absent |
/// | 1    | `non_audio` |
/// | 1    | `pre_emphasis` |
/// | 110  | reserved |
/// | 8    | index point count |
/// |      | [`CuesheetIndexPoint`]s |
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CuesheetTrack {
    /// First sample of the track, from the start of the stream
    pub offset: u64,
    /// Track number, where 170 or 255 is the lead-out
    pub number: u8,
    /// International Standard Recording Code
    pub isrc: Option<[u8; 12]>,
    /// Set for data tracks
    pub non_audio: bool,
    /// Set if the audio was recorded with pre-emphasis
    pub pre_emphasis: bool,
    /// Index points within the track
    pub index_points: Vec<CuesheetIndexPoint>,
}

impl CuesheetTrack {
    const RESERVED_BITS: u32 = 6 + 13 * 8;
}

impl FromBitStream for CuesheetTrack {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        let offset = r.read_to()?;
        let number = r.read_to()?;
        let isrc = r.read_to::<[u8; 12]>()?;
        let non_audio = r.read_bit()?;
        let pre_emphasis = r.read_bit()?;
        r.skip(Self::RESERVED_BITS)?;

        Ok(Self {
            offset,
            number,
            isrc: (isrc != [0; 12]).then_some(isrc),
            non_audio,
            pre_emphasis,
            index_points: read_list(r)?,
        })
    }
}

/// A position within a [`CuesheetTrack`]
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CuesheetIndexPoint {
    /// Samples from the start of the track
    pub offset: u64,
    /// The index number, 0 for a pregap
    pub number: u8,
}

impl FromBitStream for CuesheetIndexPoint {
    type Error = std::io::Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        let offset = r.read_to()?;
        let number = r.read_to()?;
        r.skip(24)?;
        Ok(Self { offset, number })
    }
}
