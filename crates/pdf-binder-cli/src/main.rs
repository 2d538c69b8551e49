//! PDF Binder CLI - Command line tool for combining images and PDFs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_binder_core::{AppConfig, PageAssembler};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pdf-bind")]
#[command(author, version, about = "Combine images and PDFs into one document", long_about = None)]
struct Args {
    /// Input files (PDFs and images), in output order
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output PDF file
    #[arg(short, long, default_value = "combined.pdf")]
    output: PathBuf,

    /// Write per-page preview PNGs into this directory
    #[arg(long, value_name = "DIR")]
    thumbnails: Option<PathBuf>,

    /// List the page plan without writing the output
    #[arg(long)]
    dry_run: bool,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    let mut assembler = PageAssembler::new(config);

    // Setup progress bar
    #[allow(clippy::cast_possible_truncation)]
    let pb = ProgressBar::new(args.inputs.len() as u64);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    // Add files one at a time so failures surface next to the right name
    for path in &args.inputs {
        pb.set_message(path.display().to_string());

        let report = assembler.add_files(std::slice::from_ref(path));
        for (failed, error) in &report.failures {
            pb.println(format!("warning: {}: {}", failed.display(), error));
        }

        pb.inc(1);
    }
    pb.finish_and_clear();

    if assembler.is_empty() {
        anyhow::bail!("no pages to combine (no supported input files)");
    }

    info!("{} input files, {} pages", args.inputs.len(), assembler.len());

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("{}", assembler.status());
    }

    if let Some(dir) = &args.thumbnails {
        write_thumbnails(&assembler, dir)?;
    }

    if args.dry_run {
        #[allow(clippy::print_stdout)]
        {
            for label in assembler.labels() {
                println!("{label}");
            }
        }
        return Ok(());
    }

    let out = assembler
        .export(&args.output)
        .context("Failed to export combined PDF")?;

    #[allow(clippy::print_stdout)]
    {
        println!("Combined PDF saved to: {}", out.display());
    }

    Ok(())
}

/// Dump a preview PNG per page into `dir`, numbered by position.
fn write_thumbnails(assembler: &PageAssembler, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .context(format!("Failed to create directory: {}", dir.display()))?;

    for (index, page) in assembler.pages().iter().enumerate() {
        let bitmap = assembler.thumbnail(page);
        let path = dir.join(format!("page-{:03}.png", index + 1));
        bitmap
            .save(&path)
            .context(format!("Failed to write thumbnail: {}", path.display()))?;
        info!(page = %page, thumbnail = %path.display(), "wrote preview");
    }

    Ok(())
}
