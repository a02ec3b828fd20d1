//! CLI tool for building purification reports from run workbooks.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use purification_core::ReportModel;
use purification_pptx::PptxParser;
use purification_report::{ReportAssembler, ReportOptions};
use purification_xlsx::WorkbookReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Build a slide report from a purification-run workbook.
#[derive(Parser, Debug)]
#[command(name = "purification-report")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the report and save it next to the workbook
    Generate {
        /// Input workbook (.xlsx)
        workbook: PathBuf,

        /// Output directory (default: the workbook's directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory holding marker.jpg and arrow.png
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Organization shown on the cover
        #[arg(long)]
        organization: Option<String>,
    },

    /// Print the derived report model as JSON
    Model {
        /// Input workbook (.xlsx)
        workbook: PathBuf,
    },

    /// Print the text of each slide of a saved report
    Outline {
        /// Report (.pptx)
        report: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Warning: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Generate {
            workbook,
            output,
            assets,
            organization,
        } => generate(&workbook, output, assets, organization),
        Command::Model { workbook } => print_model(&workbook),
        Command::Outline { report } => print_outline(&report),
    }
}

fn generate(
    workbook: &Path,
    output: Option<PathBuf>,
    assets: Option<PathBuf>,
    organization: Option<String>,
) -> Result<()> {
    let mut options = ReportOptions::new();
    if let Some(dir) = output {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        options = options.with_output_dir(dir);
    }
    if let Some(dir) = assets {
        options = options.with_assets_dir(dir);
    }
    if let Some(organization) = organization {
        options = options.with_organization(organization);
    }

    let report = ReportAssembler::new(options)
        .generate(workbook)
        .with_context(|| format!("Failed to build a report from {}", workbook.display()))?;
    println!("{}", report.display());
    Ok(())
}

fn print_model(workbook: &Path) -> Result<()> {
    let records = WorkbookReader::new()
        .read(workbook)
        .with_context(|| format!("Failed to read {}", workbook.display()))?;
    let model = ReportModel::from_workbook(&records);
    println!("{}", serde_json::to_string_pretty(&model)?);
    Ok(())
}

fn print_outline(report: &Path) -> Result<()> {
    let outline = PptxParser::new()
        .open(report)
        .with_context(|| format!("Failed to open {}", report.display()))?;

    for slide in &outline.slides {
        println!("--- Slide {} ---", slide.number);
        for text in slide.texts() {
            println!("{}", text);
        }
    }
    log::debug!("{} slides in {}", outline.slide_count(), outline.source);
    Ok(())
}
