// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Prints every metadata block of each FLAC file given,
//! in the spirit of "metaflac --list"

use flac_decoder::Error;
use flac_decoder::metadata::{Block, Cuesheet, Metadata, Picture, SeekTable, read_blocks};
use std::ffi::OsString;
use std::fmt::Display;
use std::io::BufReader;

fn main() {
    for path in std::env::args_os().skip(1) {
        if let Err(err) = list(&path) {
            eprintln!("{}: {err}", path.display());
        }
    }
}

fn list(path: &OsString) -> Result<(), Error> {
    let file = std::fs::File::open(path)?;
    println!("{}", path.display());

    for (index, block) in read_blocks(BufReader::new(file)).enumerate() {
        let block = block?;
        let mut report = Report::default();
        report.row(0, "block", index);
        report.row(0, "type", block.block_type());
        describe(&mut report, block);
        report.print();
    }

    Ok(())
}

/// Indented "label: value" rows for a single block
#[derive(Default)]
struct Report {
    rows: Vec<(usize, &'static str, String)>,
}

impl Report {
    fn row(&mut self, depth: usize, label: &'static str, value: impl Display) {
        self.rows.push((depth, label, value.to_string()));
    }

    fn print(self) {
        for (depth, label, value) in self.rows {
            println!("{:indent$}{label}: {value}", "", indent = 2 + depth * 2);
        }
    }
}

fn describe(report: &mut Report, block: Block) {
    match block {
        Block::Streaminfo(info) => {
            report.row(1, "block sizes", Range(info.minimum_block_size, info.maximum_block_size));
            report.row(
                1,
                "frame sizes",
                Range(
                    Unknown(info.minimum_frame_size),
                    Unknown(info.maximum_frame_size),
                ),
            );
            report.row(1, "sample rate", info.sample_rate);
            report.row(1, "channels", info.channels);
            report.row(1, "bits per sample", info.bits_per_sample);
            report.row(1, "total samples", Unknown(info.total_samples));
            if let Some(duration) = info.duration() {
                report.row(1, "duration", format_args!("{:.3}s", duration.as_secs_f64()));
            }
            report.row(1, "MD5", Unknown(info.md5.as_ref().map(|md5| Hex(md5))));
        }
        Block::Padding(padding) => report.row(1, "bytes", padding.size.get()),
        Block::Application(app) => {
            report.row(1, "id", Hex(&app.id.to_be_bytes()));
            report.row(1, "bytes", app.data.len());
        }
        Block::SeekTable(table) => describe_seek_table(report, &table),
        Block::VorbisComment(comment) => {
            report.row(1, "vendor", comment.vendor_string);
            for (key, value) in comment.fields {
                report.row(2, "field", format_args!("{key}={value}"));
            }
        }
        Block::Cuesheet(cuesheet) => describe_cuesheet(report, &cuesheet),
        Block::Picture(picture) => describe_picture(report, &picture),
        Block::Reserved(reserved) => {
            report.row(1, "code", reserved.block_type);
            report.row(1, "bytes", reserved.size.get());
        }
    }
}

fn describe_seek_table(report: &mut Report, table: &SeekTable) {
    report.row(1, "points", table.points.len());
    for point in &table.points {
        match point.sample_offset {
            Some(sample) => report.row(
                2,
                "point",
                format_args!(
                    "sample {sample} at byte {} ({} samples)",
                    point.byte_offset, point.frame_samples
                ),
            ),
            None => report.row(2, "point", "placeholder"),
        }
    }
}

fn describe_cuesheet(report: &mut Report, cuesheet: &Cuesheet) {
    report.row(1, "catalog", String::from_utf8_lossy(cuesheet.catalog()));
    report.row(1, "lead-in samples", cuesheet.lead_in_samples);
    report.row(1, "CD-DA", cuesheet.is_cdda);

    for track in &cuesheet.tracks {
        report.row(2, "track", track.number);
        report.row(3, "offset", track.offset);
        if let Some(isrc) = &track.isrc {
            report.row(3, "ISRC", String::from_utf8_lossy(isrc));
        }
        report.row(3, "audio", !track.non_audio);
        report.row(3, "pre-emphasis", track.pre_emphasis);
        for index in &track.index_points {
            report.row(
                4,
                "index",
                format_args!("{} at {}", index.number, index.offset),
            );
        }
    }
}

fn describe_picture(report: &mut Report, picture: &Picture) {
    report.row(1, "kind", picture.picture_type);
    report.row(1, "media type", &picture.media_type);
    report.row(1, "description", &picture.description);
    report.row(
        1,
        "dimensions",
        format_args!(
            "{}x{} at {} bits",
            picture.width, picture.height, picture.color_depth
        ),
    );
    report.row(1, "palette colors", Unknown(picture.colors_used));
    report.row(1, "bytes", picture.data.len());
}

/// An optional field, displayed as "unknown" when absent
struct Unknown<T>(Option<T>);

impl<T: Display> Display for Unknown<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(value) => value.fmt(f),
            None => f.write_str("unknown"),
        }
    }
}

struct Range<T>(T, T);

impl<T: Display> Display for Range<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.0, self.1)
    }
}

struct Hex<'b>(&'b [u8]);

impl Display for Hex<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
    }
}
