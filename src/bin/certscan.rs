use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use certscan::{default_overlay_path, process_file, Analysis, Severity, Verdict};

#[derive(Parser)]
#[command(
    name = "certscan",
    about = "Detect blank space in a certificate image and validate its layout",
    version,
    after_help = "Exit status: 0 when the layout is valid or has minor issues, \
                  1 when the image cannot be processed, 2 on critical layout issues."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input certificate image
    input: PathBuf,

    /// Where to write the overlay image (default: {name}_overlay.png)
    #[arg(short, long)]
    overlay: Option<PathBuf>,

    /// Do not write an overlay image
    #[arg(long, conflicts_with = "overlay")]
    no_overlay: bool,

    /// Print the full analysis as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if !cli.input.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input.display());
        process::exit(1);
    }

    let overlay = if cli.no_overlay {
        None
    } else {
        Some(
            cli.overlay
                .clone()
                .unwrap_or_else(|| default_overlay_path(&cli.input)),
        )
    };

    let result = process_file(&cli.input, overlay.as_deref());

    let Some(analysis) = &result.analysis else {
        eprintln!("[FAIL] {}: {}", cli.input.display(), result.message);
        process::exit(1);
    };

    if cli.json {
        match serde_json::to_string_pretty(analysis) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: Failed to serialize analysis: {e}");
                process::exit(1);
            }
        }
    }

    if !cli.quiet {
        print_analysis(&cli.input, analysis, cli.verbose);
        if result.success {
            if let Some(path) = &overlay {
                eprintln!("Overlay: {}", path.display());
            }
        }
    }

    if !result.success {
        eprintln!("[FAIL] {}: {}", cli.input.display(), result.message);
        process::exit(1);
    }

    if matches!(analysis.report.verdict, Verdict::Critical { .. }) {
        process::exit(2);
    }
}

fn print_analysis(path: &Path, analysis: &Analysis, verbose: bool) {
    let filename = path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );
    let verdict = &analysis.report.verdict;

    let tag = match verdict {
        Verdict::Valid => "OK",
        Verdict::Minor { .. } => "WARN",
        Verdict::Critical { .. } => "CRITICAL",
    };
    eprintln!("[{tag}] {filename}: {verdict}");
    if !matches!(verdict, Verdict::Valid) {
        eprintln!("  -> {}", verdict.detail());
    }

    for issue in &analysis.report.issues {
        let label = match issue.severity {
            Severity::High => "critical",
            Severity::Medium => "minor",
        };
        let worst = issue
            .overlaps
            .iter()
            .map(|o| o.percentage)
            .fold(0.0_f64, f64::max);
        eprintln!(
            "  {}: {label}, {worst:.0}% blank ({} overlapping area(s))",
            issue.region,
            issue.overlaps.len()
        );
    }

    if verbose {
        eprintln!();
        for (i, area) in analysis.blank_regions.iter().enumerate() {
            eprintln!(
                "  Blank area {}: {}x{} at ({}, {})",
                i + 1,
                area.width,
                area.height,
                area.x,
                area.y
            );
        }
        eprintln!();
        eprintln!("{}", analysis.stats);
    }
}
