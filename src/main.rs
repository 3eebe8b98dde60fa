use anyhow::Result;
use clap::Parser;
use genescreen::config::{Program, ScreenConfig, DEFAULT_CUTOFF, DEFAULT_TOLERANCE};
use genescreen::sample::{load_targets, screen_samples, Sample, SampleResult};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "genescreen")]
#[command(version)]
#[command(about = "Consolidate and annotate tabular BLAST hits from genome assembly screens", long_about = None)]
struct Cli {
    /// Report files, one per sample; the sample name is the file stem
    #[arg(short, long, required = true, num_args = 1..)]
    reports: Vec<PathBuf>,

    /// Reference target FASTA file(s) used in the search
    #[arg(short, long, num_args = 1..)]
    targets: Vec<PathBuf>,

    /// BLAST program that produced the reports
    #[arg(short, long, value_enum, default_value = "blastn")]
    program: Program,

    /// Percent-identity cutoff; rows below it are dropped
    #[arg(long, default_value_t = DEFAULT_CUTOFF)]
    cutoff: f64,

    /// Fuzzy-merge tolerance in base pairs
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: usize,

    /// Align inexact winners against their reference and index mismatches
    #[arg(short, long, default_value_t = false)]
    align: bool,

    /// Write detections here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = ScreenConfig {
        program: cli.program,
        cutoff: cli.cutoff,
        tolerance: cli.tolerance,
    };
    let targets = load_targets(&cli.targets)?;

    let samples: Vec<Sample> = cli
        .reports
        .iter()
        .map(|path| Sample {
            name: path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            report: path.clone(),
        })
        .collect();

    let results = screen_samples(&samples, &targets, &config, cli.align);
    write_detections(&results, cli.out.as_ref())?;
    Ok(())
}

/// Print one line per winning hit as plain tab-separated text. This is a
/// demo consumer of the in-memory results; real reporting layers build their
/// own views from `SampleResult`.
fn write_detections(results: &[SampleResult], out: Option<&PathBuf>) -> Result<()> {
    let stdout = io::stdout();
    let mut writer: Box<dyn Write> = if let Some(path) = out {
        Box::new(BufWriter::new(File::create(path)?))
    } else {
        Box::new(BufWriter::new(stdout.lock()))
    };

    for result in results {
        if result.winners.is_empty() {
            writeln!(writer, "{}", result.name)?;
            continue;
        }
        for hit in &result.winners {
            let summary = hit.summary();
            match result.annotations.get(&hit.target_id) {
                Some(record) => {
                    writeln!(writer, "{}\t{}\t{}", result.name, summary, record.aa_identity)?
                }
                None => writeln!(writer, "{}\t{}\t-", result.name, summary)?,
            }
        }
    }
    Ok(())
}
