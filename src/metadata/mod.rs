// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For reading the metadata chain at the start of a FLAC stream
//!
//! After the "fLaC" tag comes a chain of metadata blocks,
//! each with a 4 byte header and its own contents.
//! The final block in the chain has its header's `last` flag set,
//! and the first audio frame follows immediately after it.
//!
//! | Type code | Block | Occurs |
//! |----------:|-------|--------|
//! | 0 | [`Streaminfo`] | exactly once, always first |
//! | 1 | [`Padding`] | any number of times |
//! | 2 | [`Application`] | any number of times |
//! | 3 | [`SeekTable`] | at most once |
//! | 4 | [`VorbisComment`] | at most once |
//! | 5 | [`Cuesheet`] | any number of times |
//! | 6 | [`Picture`] | any number of times |
//! | 7-126 | [`Reserved`] | any number of times |
//! | 127 | invalid | never |
//!
//! Apart from VORBIS_COMMENT's length prefixes,
//! every integer in the chain is big-endian.

use crate::Error;
use bitstream_io::{
    BigEndian, BitRead, BitReader, FromBitStream, FromBitStreamUsing, FromBitStreamWith,
    LittleEndian,
};
use std::collections::BTreeMap;
use std::io::Read;
use std::num::NonZero;
use std::time::Duration;

mod cuesheet;

pub use cuesheet::{Cuesheet, CuesheetIndexPoint, CuesheetTrack};

/// Stream-wide properties every decoded stream shares
///
/// These are what a caller needs to hand decoded
/// samples off to some other container or output device.
pub trait Metadata {
    /// Number of channels, from 1 to 8
    fn channel_count(&self) -> u8;

    /// Samples per second, per channel
    fn sample_rate(&self) -> u32;

    /// Size of each sample, in bits
    fn bits_per_sample(&self) -> u32;

    /// Samples per channel in the whole stream, if known
    fn total_samples(&self) -> Option<u64> {
        None
    }

    /// The MD5 signature of the whole stream's samples, if known
    ///
    /// The signature covers samples interleaved by channel
    /// and stored as signed, little-endian bytes.
    fn md5(&self) -> Option<&[u8; 16]> {
        None
    }

    /// Size of the whole stream's samples as PCM bytes, if known
    fn decoded_len(&self) -> Option<u64> {
        let bytes_per_sample = u64::from(self.bits_per_sample().div_ceil(8));

        self.total_samples()
            .map(|samples| samples * u64::from(self.channel_count()) * bytes_per_sample)
    }

    /// Playing time of the whole stream, if known
    fn duration(&self) -> Option<Duration> {
        let rate = u64::from(self.sample_rate());

        match (self.total_samples(), rate) {
            (Some(samples), 1..) => Some(
                Duration::from_secs(samples / rate)
                    + Duration::from_nanos((samples % rate) * 1_000_000_000 / rate),
            ),
            _ => None,
        }
    }
}

/// The 4 bytes preceding each metadata block's contents
///
/// | Bits | Field | Meaning |
/// |-----:|-------|---------|
/// | 1    | `last` | whether audio frames follow this block |
/// | 7    | `block_type` | what the contents hold |
/// | 24   | `size` | length of the contents, in bytes |
///
/// # Example
/// ```
/// use bitstream_io::{BitReader, BitRead, BigEndian};
/// use flac_decoder::metadata::{BlockHeader, BlockType};
///
/// let data: &[u8] = &[0x01, 0x00, 0x02, 0x00];
/// let header = BitReader::endian(data, BigEndian)
///     .parse::<BlockHeader>()
///     .unwrap();
/// assert!(!header.last);
/// assert_eq!(header.block_type, BlockType::Padding);
/// assert_eq!(header.size.get(), 512);
/// ```
#[derive(Debug, Eq, PartialEq)]
pub struct BlockHeader {
    /// Set on the final block of the chain
    pub last: bool,
    /// The kind of block that follows
    pub block_type: BlockType,
    /// Length of the block's contents
    pub size: BlockSize,
}

impl FromBitStream for BlockHeader {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        Ok(Self {
            last: r.read_bit()?,
            block_type: r.parse()?,
            size: r.parse()?,
        })
    }
}

/// The kind of a metadata block
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum BlockType {
    /// Type 0
    Streaminfo,
    /// Type 1
    Padding,
    /// Type 2
    Application,
    /// Type 3
    SeekTable,
    /// Type 4
    VorbisComment,
    /// Type 5
    Cuesheet,
    /// Type 6
    Picture,
    /// Any type from 7 to 126
    Reserved(u8),
}

impl BlockType {
    /// The block type's name in the format documentation
    pub fn name(self) -> &'static str {
        match self {
            Self::Streaminfo => "STREAMINFO",
            Self::Padding => "PADDING",
            Self::Application => "APPLICATION",
            Self::SeekTable => "SEEKTABLE",
            Self::VorbisComment => "VORBIS_COMMENT",
            Self::Cuesheet => "CUESHEET",
            Self::Picture => "PICTURE",
            Self::Reserved(_) => "RESERVED",
        }
    }

    /// The block type's 7-bit code
    pub fn code(self) -> u8 {
        match self {
            Self::Streaminfo => 0,
            Self::Padding => 1,
            Self::Application => 2,
            Self::SeekTable => 3,
            Self::VorbisComment => 4,
            Self::Cuesheet => 5,
            Self::Picture => 6,
            Self::Reserved(code) => code,
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

impl TryFrom<u8> for BlockType {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Error> {
        Ok(match code {
            0 => Self::Streaminfo,
            1 => Self::Padding,
            2 => Self::Application,
            3 => Self::SeekTable,
            4 => Self::VorbisComment,
            5 => Self::Cuesheet,
            6 => Self::Picture,
            7..=126 => Self::Reserved(code),
            _ => return Err(Error::InvalidMetadataBlock),
        })
    }
}

impl FromBitStream for BlockType {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        r.read::<7, u8>()?.try_into()
    }
}

/// A metadata block's 24-bit content length, in bytes
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct BlockSize(u32);

impl BlockSize {
    /// The length in bytes
    #[inline]
    pub fn get(&self) -> u32 {
        self.0
    }

    /// The length in bits
    #[inline]
    fn bits(&self) -> u32 {
        self.0 * 8
    }
}

impl FromBitStream for BlockSize {
    type Error = std::io::Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        r.read::<24, u32>().map(Self)
    }
}

impl From<u8> for BlockSize {
    fn from(size: u8) -> Self {
        Self(size.into())
    }
}

impl From<u16> for BlockSize {
    fn from(size: u16) -> Self {
        Self(size.into())
    }
}

/// Where a [`BlockReader`] is in the metadata chain
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ChainState {
    /// Expecting the "fLaC" tag
    Tag,
    /// Expecting the STREAMINFO block
    Streaminfo,
    /// Expecting any block besides STREAMINFO
    Blocks,
    /// The last block has been read, or reading failed
    Done,
}

/// An iterator over a stream's metadata blocks
///
/// Yields each block in stream order and stops after
/// the one flagged as last.
/// Once a block fails to read, nothing more is yielded.
pub struct BlockReader<R: std::io::Read> {
    reader: R,
    state: ChainState,
    seek_table_read: bool,
    vorbis_comment_read: bool,
}

impl<R: std::io::Read> BlockReader<R> {
    /// Reads blocks from the given source, which should
    /// be positioned at the stream's "fLaC" tag
    ///
    /// Since many small reads are performed,
    /// a raw `File` should be wrapped in a `BufReader` first.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            state: ChainState::Tag,
            seek_table_read: false,
            vorbis_comment_read: false,
        }
    }

    fn read_tag(&mut self) -> Result<(), Error> {
        let mut tag = [0; 4];
        self.reader.read_exact(&mut tag)?;
        match &tag {
            b"fLaC" => Ok(()),
            _ => Err(Error::MissingFlacTag),
        }
    }

    fn read_block(&mut self) -> Result<(Block, bool), Error> {
        let header: BlockHeader = BitReader::endian(&mut self.reader, BigEndian).parse()?;

        log::debug!(
            "{} block, {} bytes{}",
            header.block_type,
            header.size.get(),
            if header.last { ", last in chain" } else { "" }
        );

        // a block's contents must fill its size exactly
        let mut contents = BitReader::endian(
            self.reader.by_ref().take(header.size.get().into()),
            BigEndian,
        );
        let block = contents.parse_with(&header)?;

        match contents.into_reader().limit() {
            0 => Ok((block, header.last)),
            _ => Err(Error::InvalidMetadataBlockSize),
        }
    }

    fn check_block(&mut self, block: &Block) -> Result<(), Error> {
        let first = self.state == ChainState::Streaminfo;

        match block {
            Block::Streaminfo(_) if first => Ok(()),
            _ if first => Err(Error::MissingStreaminfo),
            Block::Streaminfo(_) => Err(Error::MultipleStreaminfo),
            Block::SeekTable(_) if self.seek_table_read => Err(Error::MultipleSeekTable),
            Block::SeekTable(_) => {
                self.seek_table_read = true;
                Ok(())
            }
            Block::VorbisComment(_) if self.vorbis_comment_read => {
                Err(Error::MultipleVorbisComment)
            }
            Block::VorbisComment(_) => {
                self.vorbis_comment_read = true;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn next_block(&mut self) -> Result<Option<Block>, Error> {
        loop {
            match self.state {
                ChainState::Done => return Ok(None),
                ChainState::Tag => {
                    self.read_tag()?;
                    self.state = ChainState::Streaminfo;
                }
                ChainState::Streaminfo | ChainState::Blocks => {
                    let (block, last) = self.read_block()?;
                    self.check_block(&block)?;
                    self.state = match last {
                        true => ChainState::Done,
                        false => ChainState::Blocks,
                    };
                    return Ok(Some(block));
                }
            }
        }
    }
}

impl<R: std::io::Read> Iterator for BlockReader<R> {
    type Item = Result<Block, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.next_block();
        if result.is_err() {
            self.state = ChainState::Done;
        }
        result.transpose()
    }
}

/// Iterates over the metadata blocks of the given stream
///
/// The stream should be positioned at its "fLaC" tag.
/// Once iteration finishes without error,
/// the stream sits at the start of the first audio frame.
pub fn read_blocks<R: std::io::Read>(r: R) -> BlockReader<R> {
    BlockReader::new(r)
}

/// A single metadata block of any type
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Block {
    /// Stream properties
    Streaminfo(Streaminfo),
    /// Unused space
    Padding(Padding),
    /// Third-party application data
    Application(Application),
    /// Seek points into the audio frames
    SeekTable(SeekTable),
    /// Textual tags
    VorbisComment(VorbisComment),
    /// A disc's track layout
    Cuesheet(Cuesheet),
    /// An embedded image
    Picture(Picture),
    /// Contents of a type this decoder doesn't recognize
    Reserved(Reserved),
}

impl Block {
    /// The block's type
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Streaminfo(_) => BlockType::Streaminfo,
            Self::Padding(_) => BlockType::Padding,
            Self::Application(_) => BlockType::Application,
            Self::SeekTable(_) => BlockType::SeekTable,
            Self::VorbisComment(_) => BlockType::VorbisComment,
            Self::Cuesheet(_) => BlockType::Cuesheet,
            Self::Picture(_) => BlockType::Picture,
            Self::Reserved(reserved) => BlockType::Reserved(reserved.block_type),
        }
    }
}

impl FromBitStreamWith<'_> for Block {
    type Context = BlockHeader;
    type Error = Error;

    // reads contents only, the header having been read already
    fn from_reader<R: BitRead + ?Sized>(
        r: &mut R,
        header: &BlockHeader,
    ) -> Result<Self, Self::Error> {
        let size = header.size;

        Ok(match header.block_type {
            BlockType::Streaminfo => Self::Streaminfo(r.parse()?),
            BlockType::Padding => Self::Padding(r.parse_using(size)?),
            BlockType::Application => Self::Application(r.parse_using(size)?),
            BlockType::SeekTable => Self::SeekTable(r.parse_using(size)?),
            BlockType::VorbisComment => Self::VorbisComment(r.parse()?),
            BlockType::Cuesheet => Self::Cuesheet(r.parse()?),
            BlockType::Picture => Self::Picture(r.parse()?),
            BlockType::Reserved(block_type) => {
                r.skip(size.bits())?;
                Self::Reserved(Reserved { block_type, size })
            }
        })
    }
}

/// A block type which can be pulled out of a [`Block`]
pub trait MetadataBlock: Into<Block> + Sized {
    /// Returns the block's contents if it's of our type
    fn try_from_block(block: &Block) -> Option<&Self>;
}

macro_rules! metadata_block {
    ($variant:ident) => {
        impl MetadataBlock for $variant {
            fn try_from_block(block: &Block) -> Option<&Self> {
                match block {
                    Block::$variant(b) => Some(b),
                    _ => None,
                }
            }
        }

        impl From<$variant> for Block {
            fn from(b: $variant) -> Self {
                Self::$variant(b)
            }
        }
    };
}

/// Properties of the stream as a whole
///
/// Always the first block in the chain, and never repeated.
///
/// | Bits | Field |
/// |-----:|-------|
/// | 16   | `minimum_block_size` |
/// | 16   | `maximum_block_size` |
/// | 24   | `minimum_frame_size` |
/// | 24   | `maximum_frame_size` |
/// | 20   | `sample_rate` |
/// | 3    | `channels` - 1 |
/// | 5    | `bits_per_sample` - 1 |
/// | 36   | `total_samples` |
/// | 128  | `md5` |
///
/// Frame sizes, total samples and MD5 are all zero when unknown.
///
/// # Example
/// ```
/// use bitstream_io::{BitReader, BitRead, BigEndian};
/// use flac_decoder::metadata::Streaminfo;
/// use std::num::NonZero;
///
/// let mut data = vec![
///     0x04, 0x80,             // 1152
///     0x12, 0x00,             // 4608
///     0x00, 0x00, 0x00,       // unknown
///     0x00, 0x00, 0x00,       // unknown
///     0x17, 0x70, 0x03, 0x70, // 96000 Hz, 2 channels, 24 bits, …
///     0x00, 0x00, 0x00, 0x00, // …unknown total
/// ];
/// data.extend([0; 16]);       // no MD5
///
/// let streaminfo = BitReader::endian(data.as_slice(), BigEndian)
///     .parse::<Streaminfo>()
///     .unwrap();
///
/// assert_eq!(
///     streaminfo,
///     Streaminfo {
///         minimum_block_size: 1152,
///         maximum_block_size: 4608,
///         minimum_frame_size: None,
///         maximum_frame_size: None,
///         sample_rate: 96000,
///         channels: NonZero::new(2).unwrap(),
///         bits_per_sample: 24,
///         total_samples: None,
///         md5: None,
///     },
/// );
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Streaminfo {
    /// Smallest block size of any frame but the last, in samples
    pub minimum_block_size: u16,
    /// Largest block size of any frame, in samples
    pub maximum_block_size: u16,
    /// Smallest frame in the stream, in bytes
    pub minimum_frame_size: Option<NonZero<u32>>,
    /// Largest frame in the stream, in bytes
    pub maximum_frame_size: Option<NonZero<u32>>,
    /// Samples per second, per channel
    pub sample_rate: u32,
    /// From 1 to 8
    pub channels: NonZero<u8>,
    /// From 1 to 32
    pub bits_per_sample: u8,
    /// Samples per channel in the whole stream
    pub total_samples: Option<NonZero<u64>>,
    /// Signature of the stream's decoded samples
    pub md5: Option<[u8; 16]>,
}

metadata_block!(Streaminfo);

impl FromBitStream for Streaminfo {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        let minimum_block_size = r.read_to()?;
        let maximum_block_size = r.read_to()?;
        let minimum_frame_size = NonZero::new(r.read::<24, u32>()?);
        let maximum_frame_size = NonZero::new(r.read::<24, u32>()?);
        let sample_rate = r.read::<20, u32>()?;
        let channels = NonZero::<u8>::MIN.saturating_add(r.read::<3, u8>()?);
        let bits_per_sample = r.read::<5, u8>()? + 1;
        let total_samples = NonZero::new(r.read::<36, u64>()?);
        let md5 = r.read_to::<[u8; 16]>()?;

        Ok(Self {
            minimum_block_size,
            maximum_block_size,
            minimum_frame_size,
            maximum_frame_size,
            sample_rate,
            channels,
            bits_per_sample,
            total_samples,
            md5: (md5 != [0; 16]).then_some(md5),
        })
    }
}

impl Metadata for Streaminfo {
    fn channel_count(&self) -> u8 {
        self.channels.get()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn bits_per_sample(&self) -> u32 {
        u32::from(self.bits_per_sample)
    }

    fn total_samples(&self) -> Option<u64> {
        self.total_samples.map(NonZero::get)
    }

    fn md5(&self) -> Option<&[u8; 16]> {
        self.md5.as_ref()
    }
}

/// Unused space in the metadata chain
///
/// Its contents are skipped rather than stored.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Padding {
    /// Length of the skipped space
    pub size: BlockSize,
}

metadata_block!(Padding);

impl FromBitStreamUsing for Padding {
    type Context = BlockSize;
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R, size: BlockSize) -> Result<Self, Self::Error> {
        r.skip(size.bits())?;
        Ok(Self { size })
    }
}

/// Data belonging to some third-party application
///
/// A 32-bit registered ID followed by opaque data
/// filling the rest of the block.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Application {
    /// Registered application ID, usually 4 ASCII characters
    pub id: u32,
    /// Everything after the ID
    pub data: Vec<u8>,
}

metadata_block!(Application);

impl FromBitStreamUsing for Application {
    type Context = BlockSize;
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R, size: BlockSize) -> Result<Self, Self::Error> {
        match size.get().checked_sub(4) {
            Some(data_len) => Ok(Self {
                id: r.read_to()?,
                data: r.read_to_vec(data_len as usize)?,
            }),
            None => Err(Error::InsufficientApplicationBlock),
        }
    }
}

/// Points for seeking into the stream's audio frames
///
/// The block is nothing but 18 byte seek points.
/// Apart from placeholders, their sample offsets
/// must be in strictly increasing order.
///
/// # Example
/// ```
/// use bitstream_io::{BitReader, BitRead, BigEndian};
/// use flac_decoder::metadata::{BlockSize, SeekPoint, SeekTable};
///
/// let mut data = vec![];
/// data.extend(4096u64.to_be_bytes());
/// data.extend(2000u64.to_be_bytes());
/// data.extend(4096u16.to_be_bytes());
/// data.extend(u64::MAX.to_be_bytes());
/// data.extend([0; 10]);
///
/// let table = BitReader::endian(data.as_slice(), BigEndian)
///     .parse_using::<SeekTable>(BlockSize::from(36u8))
///     .unwrap();
///
/// assert_eq!(
///     table.points,
///     [
///         SeekPoint { sample_offset: Some(4096), byte_offset: 2000, frame_samples: 4096 },
///         SeekPoint { sample_offset: None, byte_offset: 0, frame_samples: 0 },
///     ],
/// );
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SeekTable {
    /// Seek points, in stream order
    pub points: Vec<SeekPoint>,
}

metadata_block!(SeekTable);

impl FromBitStreamUsing for SeekTable {
    type Context = BlockSize;
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R, size: BlockSize) -> Result<Self, Self::Error> {
        if size.get() % SeekPoint::SIZE != 0 {
            return Err(Error::InvalidSeekTableSize);
        }

        let points = (0..size.get() / SeekPoint::SIZE)
            .map(|_| r.parse::<SeekPoint>())
            .collect::<Result<Vec<_>, _>>()?;

        match points
            .iter()
            .filter_map(|p| p.sample_offset)
            .is_sorted_by(|a, b| a < b)
        {
            true => Ok(Self { points }),
            false => Err(Error::InvalidSeekTablePoint),
        }
    }
}

/// A single entry in a [`SeekTable`]
///
/// | Bits | Field |
/// |-----:|-------|
/// | 64   | `sample_offset`, all 1 bits for a placeholder |
/// | 64   | `byte_offset` |
/// | 16   | `frame_samples` |
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SeekPoint {
    /// First sample of the target frame,
    /// or `None` for a placeholder
    pub sample_offset: Option<u64>,
    /// Bytes from the first frame's header to the target frame's header
    pub byte_offset: u64,
    /// Samples in the target frame
    pub frame_samples: u16,
}

impl SeekPoint {
    const SIZE: u32 = 18;
}

impl FromBitStream for SeekPoint {
    type Error = std::io::Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        let sample_offset = r.read_to::<u64>()?;

        Ok(Self {
            sample_offset: (sample_offset != u64::MAX).then_some(sample_offset),
            byte_offset: r.read_to()?,
            frame_samples: r.read_to()?,
        })
    }
}

/// Textual tags
///
/// Unlike everything else in the chain,
/// the block's length prefixes are little-endian.
///
/// | Bits | Field |
/// |-----:|-------|
/// | 32   | vendor string length |
/// |      | vendor string, UTF-8 |
/// | 32   | field count |
/// | 32   | field₀ length |
/// |      | field₀, UTF-8 |
/// |      | ⋮ |
///
/// Each field is a `NAME=value` pair.
/// Names are stored uppercased and a later field
/// replaces an earlier one with the same name.
/// Fields with no `=` are skipped.
///
/// # Example
/// ```
/// use bitstream_io::{BitReader, BitRead, LittleEndian};
/// use flac_decoder::metadata::VorbisComment;
///
/// let data: &[u8] = &[
///     0x05, 0x00, 0x00, 0x00, b't', b'e', b's', b't', b's',
///     0x02, 0x00, 0x00, 0x00,
///     0x07, 0x00, 0x00, 0x00, b't', b'i', b't', b'l', b'e', b'=', b'A',
///     0x07, 0x00, 0x00, 0x00, b'T', b'I', b'T', b'L', b'E', b'=', b'B',
/// ];
///
/// let comment = BitReader::endian(data, LittleEndian)
///     .parse::<VorbisComment>()
///     .unwrap();
/// assert_eq!(comment.vendor_string, "tests");
/// assert_eq!(comment.field("Title"), Some("B"));
/// assert_eq!(comment.fields.len(), 1);
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct VorbisComment {
    /// The encoding software's name
    pub vendor_string: String,
    /// Values keyed by uppercased field name
    pub fields: BTreeMap<String, String>,
}

impl VorbisComment {
    /// The track's title
    pub const TITLE: &str = "TITLE";

    /// The track's artist
    pub const ARTIST: &str = "ARTIST";

    /// The album the track belongs to
    pub const ALBUM: &str = "ALBUM";

    /// Looks up a field's value by name, ignoring case
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_uppercase())
            .map(String::as_str)
    }
}

metadata_block!(VorbisComment);

impl FromBitStream for VorbisComment {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        fn read_string<R: BitRead + ?Sized>(r: &mut R) -> Result<String, Error> {
            let len = r.read_as_to::<LittleEndian, u32>()?;
            Ok(String::from_utf8(r.read_to_vec(len as usize)?)?)
        }

        let vendor_string = read_string(r)?;
        let mut fields = BTreeMap::new();

        for _ in 0..r.read_as_to::<LittleEndian, u32>()? {
            match read_string(r)?.split_once('=') {
                Some((name, value)) => {
                    fields.insert(name.to_ascii_uppercase(), value.to_owned());
                }
                None => log::warn!("skipping VORBIS_COMMENT field without '='"),
            }
        }

        Ok(Self {
            vendor_string,
            fields,
        })
    }
}

/// An embedded image, such as cover art
///
/// | Bits | Field |
/// |-----:|-------|
/// | 32   | `picture_type` |
/// | 32   | media type length |
/// |      | `media_type`, ASCII |
/// | 32   | description length |
/// |      | `description`, UTF-8 |
/// | 32   | `width` |
/// | 32   | `height` |
/// | 32   | `color_depth` |
/// | 32   | `colors_used`, 0 if not indexed |
/// | 32   | data length |
/// |      | `data` |
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Picture {
    /// What the image depicts
    pub picture_type: PictureType,
    /// The image's MIME type, such as `image/png`
    pub media_type: String,
    /// Free-form description
    pub description: String,
    /// In pixels
    pub width: u32,
    /// In pixels
    pub height: u32,
    /// Bits per pixel
    pub color_depth: u32,
    /// Palette size of an indexed-color image
    pub colors_used: Option<NonZero<u32>>,
    /// The encoded image file
    pub data: Vec<u8>,
}

metadata_block!(Picture);

impl FromBitStream for Picture {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Error> {
        fn read_prefixed<R: BitRead + ?Sized>(r: &mut R) -> std::io::Result<Vec<u8>> {
            let len = r.read_to::<u32>()?;
            r.read_to_vec(len as usize)
        }

        let picture_type = r.parse()?;
        let media_type = String::from_utf8(read_prefixed(r)?)?;
        let description = String::from_utf8(read_prefixed(r)?)?;

        Ok(Self {
            picture_type,
            media_type,
            description,
            width: r.read_to()?,
            height: r.read_to()?,
            color_depth: r.read_to()?,
            colors_used: NonZero::new(r.read_to::<u32>()?),
            data: read_prefixed(r)?,
        })
    }
}

/// What a [`Picture`] depicts
///
/// Discriminants are the type's code in the PICTURE block.
#[derive(Copy, Debug, Clone, Eq, PartialEq)]
pub enum PictureType {
    Other = 0,
    /// A 32×32 PNG file icon
    Png32x32 = 1,
    /// Any other file icon
    GeneralFileIcon = 2,
    FrontCover = 3,
    BackCover = 4,
    LinerNotes = 5,
    /// A physical medium's label
    MediaLabel = 6,
    /// The lead artist or soloist
    LeadArtist = 7,
    Artist = 8,
    Conductor = 9,
    /// The band or orchestra
    Band = 10,
    Composer = 11,
    /// The lyricist or text writer
    Lyricist = 12,
    RecordingLocation = 13,
    DuringRecording = 14,
    DuringPerformance = 15,
    /// A movie or video screen capture
    ScreenCapture = 16,
    /// A bright colored fish
    Fish = 17,
    Illustration = 18,
    /// The band or artist's logo
    BandLogo = 19,
    /// The publisher or studio's logo
    PublisherLogo = 20,
}

impl PictureType {
    const ALL: [Self; 21] = [
        Self::Other,
        Self::Png32x32,
        Self::GeneralFileIcon,
        Self::FrontCover,
        Self::BackCover,
        Self::LinerNotes,
        Self::MediaLabel,
        Self::LeadArtist,
        Self::Artist,
        Self::Conductor,
        Self::Band,
        Self::Composer,
        Self::Lyricist,
        Self::RecordingLocation,
        Self::DuringRecording,
        Self::DuringPerformance,
        Self::ScreenCapture,
        Self::Fish,
        Self::Illustration,
        Self::BandLogo,
        Self::PublisherLogo,
    ];

    /// A human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Self::Other => "other",
            Self::Png32x32 => "32×32 PNG icon",
            Self::GeneralFileIcon => "file icon",
            Self::FrontCover => "front cover",
            Self::BackCover => "back cover",
            Self::LinerNotes => "liner notes",
            Self::MediaLabel => "media label",
            Self::LeadArtist => "lead artist",
            Self::Artist => "artist",
            Self::Conductor => "conductor",
            Self::Band => "band",
            Self::Composer => "composer",
            Self::Lyricist => "lyricist",
            Self::RecordingLocation => "recording location",
            Self::DuringRecording => "during recording",
            Self::DuringPerformance => "during performance",
            Self::ScreenCapture => "screen capture",
            Self::Fish => "bright colored fish",
            Self::Illustration => "illustration",
            Self::BandLogo => "band logo",
            Self::PublisherLogo => "publisher logo",
        }
    }
}

impl std::fmt::Display for PictureType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.label().fmt(f)
    }
}

impl FromBitStream for PictureType {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Error> {
        usize::try_from(r.read_to::<u32>()?)
            .ok()
            .and_then(|code| Self::ALL.get(code).copied())
            .ok_or(Error::InvalidPictureType)
    }
}

metadata_block!(Cuesheet);

/// A block of a reserved type, whose contents are skipped
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Reserved {
    /// From 7 to 126
    pub block_type: u8,
    /// Length of the skipped contents
    pub size: BlockSize,
}

/// A stream's whole metadata chain
///
/// # Example
/// ```
/// use flac_decoder::metadata::{BlockList, Metadata, Padding};
///
/// let mut data = b"fLaC".to_vec();
/// data.extend([0x00, 0x00, 0x00, 0x22]);        // STREAMINFO header
/// data.extend([0x10, 0x00, 0x10, 0x00]);        // block sizes
/// data.extend([0; 6]);                          // frame sizes
/// data.extend([0x0a, 0xc4, 0x40, 0xf0]);        // 44100 Hz, 1 channel, 16 bits
/// data.extend([0; 4 + 16]);                     // total samples, MD5
/// data.extend([0x81, 0x00, 0x00, 0x04]);        // last, PADDING header
/// data.extend([0; 4]);
///
/// let blocks = BlockList::read(data.as_slice()).unwrap();
/// assert_eq!(blocks.sample_rate(), 44100);
/// assert_eq!(blocks.get::<Padding>().map(|p| p.size.get()), Some(4));
/// ```
#[derive(Clone, Debug)]
pub struct BlockList {
    streaminfo: Streaminfo,
    blocks: Vec<Block>,
}

impl BlockList {
    /// Starts a chain with just the given STREAMINFO
    pub fn new(streaminfo: Streaminfo) -> Self {
        Self {
            streaminfo,
            blocks: Vec::new(),
        }
    }

    /// Reads a whole chain from the given reader
    ///
    /// The reader should be positioned at the stream's "fLaC" tag,
    /// and is left at the start of the first audio frame.
    ///
    /// # Errors
    ///
    /// Returns any error from reading or validating the chain.
    pub fn read<R: std::io::Read>(reader: R) -> Result<Self, Error> {
        read_blocks(reader).collect::<Result<Result<Self, Error>, Error>>()?
    }

    /// The chain's STREAMINFO block
    pub fn streaminfo(&self) -> &Streaminfo {
        &self.streaminfo
    }

    /// Every block after STREAMINFO, in stream order
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// The first block of the given type, if any
    pub fn get<B: MetadataBlock>(&self) -> Option<&B> {
        self.blocks.iter().find_map(B::try_from_block)
    }

    /// Every block of the given type, in stream order
    pub fn get_all<'b, B: MetadataBlock + 'b>(&'b self) -> impl Iterator<Item = &'b B> {
        self.blocks.iter().filter_map(B::try_from_block)
    }
}

impl FromIterator<Block> for Result<BlockList, Error> {
    fn from_iter<T: IntoIterator<Item = Block>>(iter: T) -> Self {
        let mut iter = iter.into_iter();

        let Some(Block::Streaminfo(streaminfo)) = iter.next() else {
            return Err(Error::MissingStreaminfo);
        };

        let mut list = BlockList::new(streaminfo);
        for block in iter {
            if let Block::Streaminfo(_) = block {
                return Err(Error::MultipleStreaminfo);
            }
            list.blocks.push(block);
        }
        Ok(list)
    }
}

impl Metadata for BlockList {
    fn channel_count(&self) -> u8 {
        self.streaminfo.channel_count()
    }

    fn sample_rate(&self) -> u32 {
        self.streaminfo.sample_rate()
    }

    fn bits_per_sample(&self) -> u32 {
        self.streaminfo.bits_per_sample()
    }

    fn total_samples(&self) -> Option<u64> {
        self.streaminfo.total_samples()
    }

    fn md5(&self) -> Option<&[u8; 16]> {
        self.streaminfo.md5()
    }
}
