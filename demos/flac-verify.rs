// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Fully decodes each FLAC file given and compares its samples
//! against the stored MD5 signature, in the spirit of "flac -t"

use flac_decoder::decode::{Verified, verify};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut failures = 0usize;

    for path in std::env::args_os().skip(1) {
        let status = match verify(&path) {
            Ok(Verified::MD5Match) => "ok".to_owned(),
            Ok(Verified::NoMD5) => "ok, no MD5 to compare".to_owned(),
            Ok(Verified::MD5Mismatch) => {
                failures += 1;
                "FAILED, MD5 mismatch".to_owned()
            }
            Err(err) => {
                failures += 1;
                format!("FAILED, {err}")
            }
        };
        println!("{}: {status}", path.display());
    }

    match failures {
        0 => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
