// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

mod common;

use common::{Info, block, stream_start};
use flac_decoder::Error;
use flac_decoder::metadata::{
    Application, Block, BlockList, BlockType, Cuesheet, Metadata, Padding, Picture, PictureType,
    SeekPoint, SeekTable, VorbisComment, read_blocks,
};

fn vorbis_comment(vendor: &str, fields: &[&str]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend((vendor.len() as u32).to_le_bytes());
    bytes.extend(vendor.as_bytes());
    bytes.extend((fields.len() as u32).to_le_bytes());
    for field in fields {
        bytes.extend((field.len() as u32).to_le_bytes());
        bytes.extend(field.as_bytes());
    }
    bytes
}

fn seek_table(points: &[(u64, u64, u16)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (sample, offset, samples) in points {
        bytes.extend(sample.to_be_bytes());
        bytes.extend(offset.to_be_bytes());
        bytes.extend(samples.to_be_bytes());
    }
    bytes
}

fn picture(picture_type: u32, media_type: &str, description: &str, data: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend(picture_type.to_be_bytes());
    bytes.extend((media_type.len() as u32).to_be_bytes());
    bytes.extend(media_type.as_bytes());
    bytes.extend((description.len() as u32).to_be_bytes());
    bytes.extend(description.as_bytes());
    bytes.extend(640u32.to_be_bytes());
    bytes.extend(480u32.to_be_bytes());
    bytes.extend(24u32.to_be_bytes());
    bytes.extend(0u32.to_be_bytes());
    bytes.extend((data.len() as u32).to_be_bytes());
    bytes.extend(data);
    bytes
}

#[test]
fn test_streaminfo() {
    let mut info = Info::new(44100, 2, 16, 4096);
    info.total_samples = 44100 * 3;
    info.md5 = [0x5a; 16];

    let blocks = BlockList::read(stream_start(&info, &[]).as_slice()).unwrap();
    let streaminfo = blocks.streaminfo();

    assert_eq!(streaminfo.minimum_block_size, 4096);
    assert_eq!(streaminfo.maximum_block_size, 4096);
    assert_eq!(streaminfo.minimum_frame_size, None);
    assert_eq!(streaminfo.maximum_frame_size, None);
    assert_eq!(blocks.sample_rate(), 44100);
    assert_eq!(blocks.channel_count(), 2);
    assert_eq!(blocks.bits_per_sample(), 16);
    assert_eq!(blocks.total_samples(), Some(44100 * 3));
    assert_eq!(blocks.md5(), Some(&[0x5a; 16]));
    assert_eq!(blocks.duration(), Some(std::time::Duration::from_secs(3)));
    assert_eq!(blocks.decoded_len(), Some(44100 * 3 * 2 * 2));

    // unknown values are zeroes
    let blocks = BlockList::read(stream_start(&Info::new(8000, 1, 8, 16), &[]).as_slice()).unwrap();
    assert_eq!(blocks.total_samples(), None);
    assert_eq!(blocks.md5(), None);
    assert_eq!(blocks.duration(), None);
}

#[test]
fn test_block_chain() {
    let info = Info::new(44100, 1, 16, 4096);
    let mut application = b"test".to_vec();
    application.extend([1, 2, 3]);

    let mut stream = stream_start(
        &info,
        &[
            (1, vec![0; 10]),
            (2, application),
            (4, vorbis_comment("vendor", &["ARTIST=Someone"])),
            (9, vec![0xff; 5]),
        ],
    );
    let frames = [0xff, 0xf8, 0x00];
    stream.extend(frames);

    let mut reader = stream.as_slice();
    let blocks = read_blocks(&mut reader).collect::<Result<Vec<_>, _>>().unwrap();

    // reading stops at the block with its last flag set
    assert_eq!(reader, frames);

    assert_eq!(
        blocks.iter().map(|b| b.block_type()).collect::<Vec<_>>(),
        [
            BlockType::Streaminfo,
            BlockType::Padding,
            BlockType::Application,
            BlockType::VorbisComment,
            BlockType::Reserved(9),
        ],
    );
    assert_eq!(
        blocks[1],
        Block::Padding(Padding {
            size: 10u8.into()
        })
    );
    assert_eq!(
        blocks[2],
        Block::Application(Application {
            id: u32::from_be_bytes(*b"test"),
            data: vec![1, 2, 3],
        })
    );
    match &blocks[4] {
        Block::Reserved(reserved) => {
            assert_eq!(reserved.block_type, 9);
            assert_eq!(reserved.size.get(), 5);
        }
        other => panic!("unexpected block {other:?}"),
    }
}

#[test]
fn test_last_streaminfo() {
    // blocks after the last one belong to the audio stream
    let info = Info::new(44100, 1, 16, 4096);
    let mut stream = stream_start(&info, &[]);
    let trailing = block(true, 1, &[0; 4]);
    stream.extend(&trailing);

    let mut reader = stream.as_slice();
    let blocks = BlockList::read(&mut reader).unwrap();
    assert_eq!(blocks.blocks().count(), 0);
    assert_eq!(reader, trailing);
}

#[test]
fn test_typed_access() {
    let info = Info::new(48000, 2, 24, 4096);
    let blocks = BlockList::read(
        stream_start(
            &info,
            &[
                (6, picture(3, "image/png", "front", &[1, 2, 3, 4])),
                (3, seek_table(&[(0, 0, 4096), (4096, 1000, 4096)])),
                (6, picture(4, "image/jpeg", "back", &[5])),
                (
                    4,
                    vorbis_comment(
                        "reference libFLAC",
                        &["title=First", "Title=Second", "no separator", "ALBUM=x=y"],
                    ),
                ),
            ],
        )
        .as_slice(),
    )
    .unwrap();

    let pictures = blocks.get_all::<Picture>().collect::<Vec<_>>();
    assert_eq!(pictures.len(), 2);
    assert_eq!(pictures[0].picture_type, PictureType::FrontCover);
    assert_eq!(pictures[0].media_type, "image/png");
    assert_eq!(pictures[0].description, "front");
    assert_eq!((pictures[0].width, pictures[0].height), (640, 480));
    assert_eq!(pictures[0].color_depth, 24);
    assert_eq!(pictures[0].colors_used, None);
    assert_eq!(pictures[0].data, [1, 2, 3, 4]);
    assert_eq!(pictures[1].picture_type, PictureType::BackCover);
    assert_eq!(blocks.get::<Picture>(), Some(pictures[0]));

    assert_eq!(
        blocks.get::<SeekTable>().map(|s| s.points.as_slice()),
        Some(
            [
                SeekPoint {
                    sample_offset: Some(0),
                    byte_offset: 0,
                    frame_samples: 4096,
                },
                SeekPoint {
                    sample_offset: Some(4096),
                    byte_offset: 1000,
                    frame_samples: 4096,
                },
            ]
            .as_slice()
        ),
    );

    let comment = blocks.get::<VorbisComment>().unwrap();
    assert_eq!(comment.vendor_string, "reference libFLAC");
    assert_eq!(comment.field(VorbisComment::TITLE), Some("Second"));
    assert_eq!(comment.field("album"), Some("x=y"));
    assert_eq!(comment.field(VorbisComment::ALBUM), Some("x=y"));
    assert_eq!(comment.field(VorbisComment::ARTIST), None);
    assert_eq!(comment.fields.len(), 2);

    assert!(blocks.get::<Cuesheet>().is_none());
}

#[test]
fn test_cuesheet() {
    let mut cuesheet = Vec::new();
    let mut catalog = [0; 128];
    catalog[..13].copy_from_slice(b"1234567890123");
    cuesheet.extend(catalog);
    cuesheet.extend(88200u64.to_be_bytes());
    cuesheet.push(0b1000_0000);
    cuesheet.extend([0; 258]);
    cuesheet.push(2);

    // track 1, with two index points
    cuesheet.extend(0u64.to_be_bytes());
    cuesheet.push(1);
    cuesheet.extend(b"USABC1234567");
    cuesheet.push(0b0100_0000);
    cuesheet.extend([0; 13]);
    cuesheet.push(2);
    cuesheet.extend(0u64.to_be_bytes());
    cuesheet.extend([0, 0, 0, 0]);
    cuesheet.extend(588u64.to_be_bytes());
    cuesheet.extend([1, 0, 0, 0]);

    // lead-out track
    cuesheet.extend(441000u64.to_be_bytes());
    cuesheet.push(170);
    cuesheet.extend([0; 12]);
    cuesheet.push(0);
    cuesheet.extend([0; 13]);
    cuesheet.push(0);

    let blocks = BlockList::read(
        stream_start(&Info::new(44100, 2, 16, 4096), &[(5, cuesheet)]).as_slice(),
    )
    .unwrap();

    let cuesheet = blocks.get::<Cuesheet>().unwrap();
    assert_eq!(cuesheet.catalog(), b"1234567890123");
    assert_eq!(cuesheet.lead_in_samples, 88200);
    assert!(cuesheet.is_cdda);
    assert_eq!(cuesheet.tracks.len(), 2);

    let track = &cuesheet.tracks[0];
    assert_eq!(track.number, 1);
    assert_eq!(track.isrc.as_ref(), Some(b"USABC1234567"));
    assert!(!track.non_audio);
    assert!(track.pre_emphasis);
    assert_eq!(
        track
            .index_points
            .iter()
            .map(|p| (p.offset, p.number))
            .collect::<Vec<_>>(),
        [(0, 0), (588, 1)],
    );

    let lead_out = &cuesheet.tracks[1];
    assert_eq!(lead_out.offset, 441000);
    assert_eq!(lead_out.number, 170);
    assert_eq!(lead_out.isrc, None);
    assert!(lead_out.index_points.is_empty());
}

fn read_error(stream: &[u8]) -> Error {
    match BlockList::read(stream) {
        Ok(blocks) => panic!("unexpected success: {blocks:?}"),
        Err(err) => err,
    }
}

#[test]
fn test_invalid_chains() {
    let info = Info::new(44100, 2, 16, 4096);

    // bad tag
    let mut stream = stream_start(&info, &[]);
    stream[0] = b'F';
    assert!(matches!(read_error(&stream), Error::MissingFlacTag));

    // empty and truncated streams
    assert!(matches!(read_error(&[]), Error::UnexpectedEof));
    assert!(matches!(read_error(b"fLaC"), Error::UnexpectedEof));
    let stream = stream_start(&info, &[]);
    assert!(matches!(
        read_error(&stream[..stream.len() - 1]),
        Error::UnexpectedEof
    ));

    // first block isn't STREAMINFO
    let mut stream = b"fLaC".to_vec();
    stream.extend(block(false, 1, &[0; 4]));
    stream.extend(block(true, 0, &info.streaminfo()));
    assert!(matches!(read_error(&stream), Error::MissingStreaminfo));

    // duplicated blocks
    let stream = stream_start(&info, &[(0, info.streaminfo())]);
    assert!(matches!(read_error(&stream), Error::MultipleStreaminfo));
    let stream = stream_start(&info, &[(3, seek_table(&[])), (3, seek_table(&[]))]);
    assert!(matches!(read_error(&stream), Error::MultipleSeekTable));
    let stream = stream_start(
        &info,
        &[(4, vorbis_comment("a", &[])), (4, vorbis_comment("b", &[]))],
    );
    assert!(matches!(read_error(&stream), Error::MultipleVorbisComment));

    // type 127 is invalid
    let stream = stream_start(&info, &[(127, vec![])]);
    assert!(matches!(read_error(&stream), Error::InvalidMetadataBlock));

    // block contents don't match block size
    let mut contents = info.streaminfo();
    contents.push(0);
    let mut stream = b"fLaC".to_vec();
    stream.extend(block(true, 0, &contents));
    assert!(matches!(read_error(&stream), Error::InvalidMetadataBlockSize));

    // seek table not a multiple of 18 bytes
    let stream = stream_start(&info, &[(3, vec![0; 17])]);
    assert!(matches!(read_error(&stream), Error::InvalidSeekTableSize));

    // seek points out of order
    let stream = stream_start(&info, &[(3, seek_table(&[(4096, 0, 1), (0, 0, 1)]))]);
    assert!(matches!(read_error(&stream), Error::InvalidSeekTablePoint));

    // application block without room for ID
    let stream = stream_start(&info, &[(2, vec![0; 3])]);
    assert!(matches!(
        read_error(&stream),
        Error::InsufficientApplicationBlock
    ));

    // reserved picture type
    let stream = stream_start(&info, &[(6, picture(21, "image/png", "", &[]))]);
    assert!(matches!(read_error(&stream), Error::InvalidPictureType));
}

#[test]
fn test_block_reader_stops_after_error() {
    let info = Info::new(44100, 2, 16, 4096);
    let stream = stream_start(&info, &[(127, vec![]), (1, vec![0; 4])]);
    let mut blocks = read_blocks(stream.as_slice());

    assert!(matches!(blocks.next(), Some(Ok(Block::Streaminfo(_)))));
    assert!(matches!(blocks.next(), Some(Err(Error::InvalidMetadataBlock))));
    assert!(blocks.next().is_none());
}
