//! Example: Extract the block stream from a DOCX file
//!
//! Usage: cargo run --example extract -- path/to/document.docx [--preserve-breaks]
//!
//! Prints the `{blocks, stats}` JSON that the `stylecast` CLI accepts as
//! a pre-extracted input.

use std::env;
use std::process::ExitCode;

use stylecast_ooxml::DocxExtractor;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("Usage: {} <path/to/document.docx> [--preserve-breaks]", args[0]);
        return ExitCode::FAILURE;
    };
    let preserve_breaks = args.iter().any(|a| a == "--preserve-breaks");

    let extracted = DocxExtractor::new()
        .with_preserve_breaks(preserve_breaks)
        .extract_file(path);
    for warning in &extracted.stats.warnings {
        eprintln!("warning: {}", warning);
    }

    match extracted.to_json() {
        Ok(json) => {
            println!("{}", json);
            if extracted.stats.severe_warnings().is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("Error serializing block stream: {}", e);
            ExitCode::FAILURE
        }
    }
}
