//! Analyse a single certificate image and write its overlay.
//!
//! Usage:
//! ```sh
//! cargo run --example analyze_certificate -- certificate.png overlay.png
//! ```

use std::env;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <overlay>", args[0]);
        process::exit(1);
    }

    let input = &args[1];
    let overlay = &args[2];

    let result = certscan::process_file(input.as_ref(), Some(overlay.as_ref()));

    match &result.analysis {
        Some(analysis) if result.success => {
            println!("{}", analysis.report.verdict.summary());
            println!("{}", analysis.report.verdict.detail());
            println!("{}", analysis.stats);
        }
        _ => {
            eprintln!("Error: {}", result.message);
            process::exit(1);
        }
    }
}
