//! X12 837 claims file parser.
//!
//! Reads an X12 claim file, decodes the first 837 transaction, and prints
//! the claim tree as JSON or a human-readable summary. Documents whose
//! implementation reference is not a known 837 variant fall back to a
//! structural report of the generic document.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};

use claim::{parse_837, MapError};
use x12_claims_host::{render_json, structural_summary, summary};

#[derive(Parser)]
#[command(name = "claims-parse", version, about = "Parse X12 837 claim files to JSON")]
struct Args {
    /// Input X12 file
    input: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    output: Output,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Fail when the file ends inside an unterminated segment
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    Json,
    Summary,
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(&args.input)?;

    let doc = if args.strict {
        document::parse_document_strict(&bytes)?
    } else {
        document::parse_document(&bytes)?
    };

    match parse_837(&doc) {
        Ok(mapped) => {
            for warning in &mapped.warnings {
                eprintln!("warning: {warning}");
            }
            match args.output {
                Output::Json => println!("{}", render_json(&mapped, args.pretty)?),
                Output::Summary => print!("{}", summary(&doc, &mapped)),
            }
        }
        Err(MapError::UnsupportedImplementation(reference)) => {
            // The generic layer still parsed the document; report what we
            // can instead of failing outright.
            eprintln!("warning: unsupported implementation reference {reference:?}, structural output only");
            print!("{}", structural_summary(&doc));
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
