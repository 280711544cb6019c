//! Labelrecon: reconcile image labelling status across dataset folders.
//!
//! Several people (or several passes) often label copies of the same image
//! set. Labelrecon scans each copy, decides per image whether it carries a
//! label file, lines the copies up by image name and reports where they
//! disagree, as a spreadsheet and a terminal summary. It can also render the
//! defect mask and an outlined overlay for a single labelled image.
//!
//! # Modules
//!
//! - [`scan`]: Per-folder label presence classification
//! - [`reconcile`]: Cross-folder reconciliation and its report types
//! - [`emit`]: XLSX and CSV report emission
//! - [`mask`]: Polygon label files, masks and overlays
//! - [`config`]: YAML configuration for the compare command
//! - [`error`]: Error types for labelrecon operations

pub mod config;
pub mod emit;
pub mod error;
pub mod mask;
pub mod reconcile;
pub mod scan;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;

pub use error::LabelReconError;

use emit::{EmitOptions, EmitSummary, ReportFormat, RowFilter, DEFAULT_REPORT_FILE};
use reconcile::{AbsentPolicy, Grouping, ReconcileOptions, ReconcileReport};
use scan::ScanOptions;

/// The labelrecon CLI application.
#[derive(Parser)]
#[command(name = "labelrecon")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Compare labelling status across folders and write a report.
    Compare(CompareArgs),
    /// Render the defect mask (and optionally an overlay) for one image.
    Mask(MaskArgs),
}

/// Arguments for the compare subcommand.
#[derive(clap::Args)]
struct CompareArgs {
    /// Folder roots to compare, in column order.
    folders: Vec<PathBuf>,

    /// YAML config file; flags given here take precedence.
    #[arg(long, env = "LABELRECON_CONFIG")]
    config: Option<PathBuf>,

    /// Compare each subfolder common to all roots separately.
    #[arg(long)]
    group_by_subfolder: bool,

    /// Only write rows where the folders disagree.
    #[arg(long)]
    conflicts_only: bool,

    /// How an image missing from a folder is compared ('conflict' or 'ignore').
    #[arg(long)]
    absent_policy: Option<String>,

    /// Image file extension (repeatable, default: bmp).
    #[arg(long = "image-ext")]
    image_ext: Vec<String>,

    /// Label file extension (repeatable, default: json).
    #[arg(long = "label-ext")]
    label_ext: Vec<String>,

    /// Report destination (default: comparison_result.xlsx).
    #[arg(long, env = "LABELRECON_OUT")]
    out: Option<PathBuf>,

    /// Report file format ('xlsx' or 'csv'); inferred from --out if omitted.
    #[arg(long)]
    format: Option<String>,

    /// Output format for the terminal summary ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,

    /// Exit non-zero if any conflict was found.
    #[arg(long)]
    strict: bool,
}

/// Arguments for the mask subcommand.
#[derive(clap::Args)]
struct MaskArgs {
    /// Source image.
    #[arg(long)]
    image: PathBuf,

    /// Polygon label file for the image.
    #[arg(long)]
    label: PathBuf,

    /// Directory to write the mask (and overlay) into.
    #[arg(long)]
    out_dir: PathBuf,

    /// Also write the outlined overlay as <stem>_vis.<ext>.
    #[arg(long)]
    overlay: bool,
}

/// Fully resolved settings for one compare run.
struct CompareSettings {
    folders: Vec<PathBuf>,
    reconcile: ReconcileOptions,
    emit: EmitOptions,
    out: PathBuf,
}

#[derive(Serialize)]
struct CompareOutput<'a> {
    report: &'a ReconcileReport,
    artifact: &'a EmitSummary,
}

/// Run the labelrecon CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LabelReconError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Compare(args)) => run_compare(args),
        Some(Commands::Mask(args)) => run_mask(args),
        None => {
            println!("labelrecon {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Reconcile image labelling status across dataset folders.");
            println!();
            println!("Run 'labelrecon --help' for usage information.");
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

/// Execute the compare subcommand.
fn run_compare(args: CompareArgs) -> Result<(), LabelReconError> {
    let output = args.output.clone();
    let strict = args.strict;
    let settings = resolve_compare_settings(args)?;

    let report = reconcile::reconcile(&settings.folders, &settings.reconcile)?;
    let summary = emit::emit(&report, &settings.out, &settings.emit)?;

    match output.as_str() {
        "json" => {
            let out = CompareOutput {
                report: &report,
                artifact: &summary,
            };
            let json = serde_json::to_string_pretty(&out).map_err(LabelReconError::ReportJson)?;
            println!("{}", json);
        }
        _ => {
            print!("{}", report);
            println!(
                "Wrote {} row(s) to {}",
                summary.rows,
                summary.path.display()
            );
        }
    }

    let conflict_count = report.conflict_count();
    if strict && conflict_count > 0 {
        Err(LabelReconError::ConflictsFound { conflict_count })
    } else {
        Ok(())
    }
}

/// Merges command-line flags over the optional config file.
fn resolve_compare_settings(args: CompareArgs) -> Result<CompareSettings, LabelReconError> {
    let file = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::CompareConfig::default(),
    };

    let folders = if args.folders.is_empty() {
        file.folders
    } else {
        args.folders
    };
    if folders.is_empty() {
        return Err(LabelReconError::InvalidArguments(
            "no folders given (pass them as arguments or under 'folders' in --config)".to_string(),
        ));
    }

    let absent_policy = match args.absent_policy.as_deref() {
        Some("conflict") => AbsentPolicy::Conflict,
        Some("ignore") => AbsentPolicy::Ignore,
        Some(other) => {
            return Err(LabelReconError::InvalidArguments(format!(
                "unknown absent policy '{}' (supported: conflict, ignore)",
                other
            )));
        }
        None => file.absent_policy.unwrap_or_default(),
    };

    let grouping = if args.group_by_subfolder || file.group_by_subfolder {
        Grouping::BySubfolder
    } else {
        Grouping::Flat
    };

    let defaults = ScanOptions::default();
    let scan = ScanOptions {
        image_extensions: first_non_empty([args.image_ext, file.image_extensions])
            .unwrap_or(defaults.image_extensions),
        label_extensions: first_non_empty([args.label_ext, file.label_extensions])
            .unwrap_or(defaults.label_extensions),
    };

    let out = args
        .out
        .or(file.out)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_FILE));

    let format = match args.format.as_deref() {
        Some(name) => ReportFormat::parse(name)?,
        None => file.format.unwrap_or_else(|| ReportFormat::infer(&out)),
    };

    let filter = if args.conflicts_only || file.conflicts_only {
        RowFilter::ConflictsOnly
    } else {
        RowFilter::All
    };

    Ok(CompareSettings {
        folders,
        reconcile: ReconcileOptions {
            grouping,
            absent_policy,
            scan,
        },
        emit: EmitOptions { format, filter },
        out,
    })
}

fn first_non_empty<const N: usize>(candidates: [Vec<String>; N]) -> Option<Vec<String>> {
    candidates.into_iter().find(|list| !list.is_empty())
}

/// Execute the mask subcommand.
fn run_mask(args: MaskArgs) -> Result<(), LabelReconError> {
    let rendered = mask::render_mask_and_overlay(&args.image, &args.label)?;
    let outputs = mask::write_mask_outputs(&rendered, &args.image, &args.out_dir, args.overlay)?;

    println!("Wrote mask to {}", outputs.mask.display());
    if let Some(overlay) = outputs.overlay {
        println!("Wrote overlay to {}", overlay.display());
    }
    Ok(())
}
