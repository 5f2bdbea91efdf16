use avif_batch::convert::{self, BatchRequest};
use avif_batch::encoder::AvifEnc;
use avif_batch::formats::ImageFormat;
use avif_batch::naming::NamingOptions;
use avif_batch::output::{self, Report, ReportItem};
use avif_batch::{config, pool, scan};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "avif-batch")]
#[command(version, about = "Batch-convert images to AVIF with parallel avifenc workers")]
#[command(long_about = "\
Batch-convert images to AVIF with parallel avifenc workers

Scans a directory tree for images, then converts every file of one source
format with avifenc. Existing files are never overwritten: taken names get a
numeric suffix (photo.avif, photo-1.avif, ...).

Supported source formats: jpg (jpeg), png, bmp, tiff, webp, heic

Output names:
  default       {date}_{random}.avif       e.g. 20240309_a1b2c3.avif
  --keep-name   {original name}.avif       e.g. IMG_0042.avif
  --prefix P    P_ prepended to either form

Run 'avif-batch gen-config' to generate a documented avif-batch.toml.")]
struct Cli {
    /// Config file (avif-batch.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List image file types found in a directory
    List {
        /// Directory to scan
        #[arg(long, default_value = ".")]
        input: PathBuf,
    },
    /// Convert all files of one format
    Convert(ConvertArgs),
    /// Print a stock avif-batch.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Directory to scan for image files
    #[arg(long, default_value = ".")]
    input: PathBuf,

    /// Source format to convert (jpg, jpeg, png, bmp, tiff, webp, heic)
    #[arg(long)]
    format: ImageFormat,

    /// Output directory (default: same as input)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Prefix for output filenames
    #[arg(long)]
    prefix: Option<String>,

    /// Keep original filename (only change extension)
    #[arg(long)]
    keep_name: bool,

    /// Number of parallel conversion workers
    #[arg(long, allow_negative_numbers = true)]
    workers: Option<i64>,

    /// Show what would be converted without converting
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON report of every conversion to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match cli.command {
        Command::List { input } => {
            let scanned = scan::scan(&input)?;
            output::print_inventory(&scanned.inventory);
        }
        Command::Convert(args) => {
            let cfg = config::load_config(cli.config.as_deref())?;
            let prefix = args.prefix.or(Some(cfg.naming.prefix.clone()));
            let request = BatchRequest {
                input: args.input,
                output: args.output,
                format: args.format,
                naming: NamingOptions::new(prefix, args.keep_name || cfg.naming.keep_name),
                workers: args.workers.unwrap_or(cfg.processing.workers),
                target_ext: cfg.encoder.extension.clone(),
            };

            let scanned = scan::scan(&request.input)?;
            output::print_inventory(&scanned.inventory);
            let plan = convert::plan_from_scan(&request, scanned)?;

            println!();
            println!(
                "{}",
                output::format_batch_header(
                    plan.jobs.len(),
                    request.format,
                    &request.target_ext,
                    pool::effective_workers(request.workers),
                )
            );

            if args.dry_run {
                output::print_preview(&convert::preview(&plan, &request));
                return Ok(ExitCode::SUCCESS);
            }

            let encoder = AvifEnc::from_config(&cfg.encoder);
            let mut items = Vec::new();
            let summary = convert::execute(plan, &request, &encoder, |result| {
                output::print_result(result);
                if args.report.is_some() {
                    items.push(ReportItem::from(result));
                }
            })?;
            output::print_summary(&summary);

            if let Some(path) = &args.report {
                Report::new(summary, items).write(path)?;
                tracing::info!(report = %path.display(), "report written");
            }

            if summary.failed > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Log to stderr; stdout carries the conversion report. `RUST_LOG` overrides the default filter.
fn setup_logging(verbose: bool) {
    let default = if verbose {
        "avif_batch=debug,warn"
    } else {
        "avif_batch=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
