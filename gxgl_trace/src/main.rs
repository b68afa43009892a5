//! A program for tracing the GX commands that a GL scene compiles to.
//!
//! The input is a JSON scene script: a list of state-setting calls and draws.
//! The output is json listing, for each draw, the recorded GX commands and any
//! features that were dropped along the way.
//!
//! Log output is controlled with `RUST_LOG`, e.g. `RUST_LOG=gxgl=debug`.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

use std::{fs, process};

use clap::{App, Arg, ArgGroup};
use script::Script;

mod script;

fn main() {
    env_logger::init();

    let matches = App::new("gxgl_trace")
        .about("Outputs the GX commands recorded for a GL scene script as json")
        .arg(
            Arg::with_name("script")
                .value_name("FILE")
                .required(true)
                .help("path to the scene script"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("FILE")
                .help("path to the output JSON file"),
        )
        .arg(
            Arg::with_name("stdout")
                .long("stdout")
                .help("print the JSON text to stdout"),
        )
        .group(
            ArgGroup::with_name("output-option")
                .args(&["output", "stdout"])
                .required(true)
                .multiple(true),
        )
        .get_matches();

    let script_filename = matches.value_of("script").unwrap_or_default();
    let script = Script::read(script_filename).unwrap_or_else(|error| {
        eprintln!("Error while reading {}: {}", script_filename, error);
        process::exit(1);
    });

    let trace = script.run();
    for draw in &trace.draws {
        if !draw.applied {
            log::info!("draw {} was skipped", draw.draw);
        }
    }
    if let Some(error) = &trace.error {
        eprintln!("Warning: a call was rejected: {}", error);
    }

    let trace_json = serde_json::to_string_pretty(&trace).unwrap_or_else(|error| {
        eprintln!("Error while serializing: {}", error);
        process::exit(1);
    });

    if let Some(output_filename) = matches.value_of("output") {
        fs::write(output_filename, &trace_json).unwrap_or_else(|error| {
            eprintln!("Error while writing {}: {}", output_filename, error);
            process::exit(1);
        });
    }
    if matches.is_present("stdout") {
        print!("{}", trace_json);
    }
}
