use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use transcript_report::orchestrator::{discover_items, DEFAULT_OUTPUT_DIR};
use transcript_report::report::summary::{self, SuccessObjective, ThroughputObjective};
use transcript_report::{
    ChartRenderer, Orchestrator, ProcessingTiming, ReportConfig, SessionSummary,
};

#[derive(Parser, Debug)]
#[command(name = "transcript-report")]
#[command(author, version, about = "Build HTML reports, charts and QoS summaries for transcription runs")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only warnings and the final summary
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate HTML reports for transcribed items
    Report {
        /// Directory holding transcripts, timed text, logs and charts
        dir: PathBuf,

        /// Items to report on (default: every .txt in DIR)
        items: Vec<String>,

        /// Output file (.html or .json), single item only
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for generated reports
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        report_dir: PathBuf,

        /// Transcription model shown in the metadata
        #[arg(long, default_value = "small")]
        model: String,

        /// Transcription language shown in the metadata
        #[arg(long, default_value = "fr")]
        language: String,

        /// Transcription date shown in the metadata (default: now)
        #[arg(long)]
        date: Option<String>,

        /// Audio duration in seconds, for the duration and throughput cards
        #[arg(long, requires = "processing_secs")]
        audio_secs: Option<f64>,

        /// Processing time in seconds, for the duration and throughput cards
        #[arg(long, requires = "audio_secs")]
        processing_secs: Option<f64>,

        /// Number of parallel workers (default: number of CPUs)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Open the report in the browser when done
        #[arg(long)]
        open: bool,
    },

    /// Render cpu/memory/power charts from the monitoring CSVs in DIR
    Charts {
        /// Directory holding monitoring_*.csv
        dir: PathBuf,

        /// Where to write the PNGs (default: DIR)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Output resolution
        #[arg(long, default_value = "300")]
        dpi: f32,
    },

    /// Write the QoS summary for a session metrics JSON file
    Summary {
        /// Session metrics (JSON)
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for the summary when --output is not given
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        report_dir: PathBuf,
    },
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let result = match args.command {
        Command::Report {
            dir,
            items,
            output,
            report_dir,
            model,
            language,
            date,
            audio_secs,
            processing_secs,
            jobs,
            open,
        } => {
            let mut config = ReportConfig::new()
                .with_output_dir(report_dir)
                .with_model(model)
                .with_language(language);
            if let Some(date) = date {
                config = config.with_date(date);
            }
            if let (Some(audio), Some(processing)) = (audio_secs, processing_secs) {
                config = config.with_timing(ProcessingTiming {
                    audio_duration_secs: audio,
                    processing_time_secs: processing,
                });
            }
            run_report(&dir, items, output, config, jobs, open, args.quiet)
        }
        Command::Charts { dir, out_dir, dpi } => {
            let out_dir = out_dir.unwrap_or_else(|| dir.clone());
            run_charts(&dir, &out_dir, dpi, args.quiet)
        }
        Command::Summary {
            input,
            output,
            report_dir,
        } => {
            let output = output.unwrap_or_else(|| report_dir.join("summary_report.txt"));
            run_summary(&input, &output, args.quiet)
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {:#}", e);
            std::process::exit(1);
        }
    }
}

/// `RUST_LOG` wins; otherwise the verbosity flags pick the level.
fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns `Ok(false)` when at least one item failed.
fn run_report(
    dir: &Path,
    items: Vec<String>,
    output: Option<PathBuf>,
    config: ReportConfig,
    jobs: Option<usize>,
    open: bool,
    quiet: bool,
) -> Result<bool> {
    let items = if items.is_empty() {
        discover_items(dir).with_context(|| format!("cannot list {}", dir.display()))?
    } else {
        items
    };

    if items.is_empty() {
        bail!("no transcript (.txt) found in {}", dir.display());
    }
    if output.is_some() && items.len() > 1 {
        bail!("--output needs exactly one item ({} given)", items.len());
    }

    if let Some(jobs) = jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    if !quiet {
        eprintln!("\x1b[1mTranscription reports\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!("Found {} item(s) in {}\n", items.len(), dir.display());
    }

    let orchestrator = Orchestrator::new(config);

    let (written, all_ok) = if let Some(ref path) = output {
        let path = orchestrator
            .generate(dir, &items[0], Some(path))
            .with_context(|| format!("report for {} failed", items[0]))?;
        if !quiet {
            eprintln!("\x1b[32mReport saved: {}\x1b[0m", path.display());
        }
        (vec![path], true)
    } else {
        let pb = if !quiet && items.len() > 1 {
            let pb = ProgressBar::new(items.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .context("invalid progress template")?
                    .progress_chars("=>-"),
            );
            Some(pb)
        } else {
            None
        };

        let outcome = orchestrator.generate_batch(dir, &items, |done| {
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(done.item.clone());
            }
        });

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        if !quiet {
            for (item, path) in outcome.succeeded() {
                println!("\x1b[32m{:<8}\x1b[0m {:<30} {}", "[OK]", item, path.display());
            }
        }
        for (item, err) in outcome.failed() {
            println!("\x1b[31m{:<8}\x1b[0m {:<30} {}", "[FAILED]", item, err);
        }

        let failed = outcome.failed().count();
        if !quiet {
            eprintln!("\n{}", "─".repeat(70));
            eprintln!("\x1b[1mSummary:\x1b[0m");
            eprintln!("  \x1b[32m✓ Generated:\x1b[0m {}", outcome.items.len() - failed);
            if failed > 0 {
                eprintln!("  \x1b[31m✗ Failed:\x1b[0m    {}", failed);
            }
        }

        let written: Vec<PathBuf> = outcome.succeeded().map(|(_, p)| p.to_path_buf()).collect();
        (written, failed == 0)
    };

    if open {
        for path in &written {
            if let Err(e) = open::that(path) {
                eprintln!("Failed to open report: {}", e);
            }
        }
    }

    Ok(all_ok)
}

/// Returns `Ok(false)` when any chart could not be rendered.
fn run_charts(dir: &Path, out_dir: &Path, dpi: f32, quiet: bool) -> Result<bool> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let outcome = ChartRenderer::new().with_dpi(dpi).render_all(dir, out_dir);

    if !quiet {
        for path in &outcome.written {
            eprintln!("  \x1b[32m✓\x1b[0m {}", path.display());
        }
    }
    for (kind, err) in &outcome.failed {
        let color = if err.is_missing() { "\x1b[90m" } else { "\x1b[31m" };
        eprintln!("  {}✗ {}\x1b[0m {}", color, kind.image_file(), err);
    }

    Ok(outcome.failed.is_empty())
}

fn run_summary(input: &Path, output: &Path, quiet: bool) -> Result<bool> {
    let session = SessionSummary::read_json(input)
        .with_context(|| format!("cannot load session metrics from {}", input.display()))?;

    summary::write_summary(output, &session)
        .with_context(|| format!("cannot write summary to {}", output.display()))?;

    if !quiet {
        print!("{}", summary::render(&session));
        eprintln!("\n\x1b[32mSummary saved: {}\x1b[0m", output.display());
    }

    let met = ThroughputObjective::evaluate(session.throughput).is_met()
        && SuccessObjective::evaluate(session.success_rate).is_met();
    if !met && !quiet {
        eprintln!("\x1b[33mQoS objectives not met\x1b[0m");
    }
    Ok(true)
}
