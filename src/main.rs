// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use bin_checker::{
    export_to_path, logging, pipeline, CheckOutcome, CheckRequest, FilterColumn, FilterSelection,
    LookupResult, UploadSource, AWAITING_UPLOADS_MESSAGE, EXPORT_FILE_NAME,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bin-checker", version, about = "BIN Checker & Filter Tool")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive terminal page (default)
    Tui(Uploads),

    /// Run the pipeline once and write the filtered CSV
    Check(CheckArgs),
}

#[derive(Args, Default)]
struct Uploads {
    /// BIN database (CSV with BIN, Issuer, Brand, Type, CountryName)
    #[arg(short, long)]
    reference: Option<PathBuf>,

    /// BIN list to check (CSV with a single column)
    #[arg(short = 'l', long)]
    check_list: Option<PathBuf>,

    /// Where the filtered CSV is written
    #[arg(short, long, default_value = EXPORT_FILE_NAME)]
    output: PathBuf,
}

impl Uploads {
    fn request(&self) -> CheckRequest {
        CheckRequest::new(
            self.reference.clone().map(UploadSource::Path),
            self.check_list.clone().map(UploadSource::Path),
        )
    }
}

#[derive(Args)]
struct CheckArgs {
    #[command(flatten)]
    uploads: Uploads,

    #[arg(long = "issuer", value_name = "ISSUER")]
    issuers: Vec<String>,

    #[arg(long = "brand", value_name = "BRAND")]
    brands: Vec<String>,

    #[arg(long = "type", value_name = "TYPE")]
    types: Vec<String>,

    #[arg(long = "country", value_name = "COUNTRY")]
    countries: Vec<String>,

    /// Look up a single BIN in the BIN database
    #[arg(long)]
    lookup: Option<String>,
}

impl CheckArgs {
    fn filters(&self) -> FilterSelection {
        let mut filters = FilterSelection::new();
        for (column, values) in [
            (FilterColumn::Issuer, &self.issuers),
            (FilterColumn::Brand, &self.brands),
            (FilterColumn::Type, &self.types),
            (FilterColumn::CountryName, &self.countries),
        ] {
            for value in values {
                filters.select(column, value.clone());
            }
        }
        filters
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Check(args)) => {
            logging::init("bin_checker=info");
            run_check(args)
        }
        Some(Command::Tui(uploads)) => run_ui_mode(uploads),
        None => run_ui_mode(Uploads {
            output: PathBuf::from(EXPORT_FILE_NAME),
            ..Default::default()
        }),
    }
}

fn run_check(args: CheckArgs) -> Result<()> {
    let mut request = args.uploads.request().with_filters(args.filters());
    request.lookup = args.lookup.clone();

    let report = match pipeline::run(&request).context("Failed to check BIN list")? {
        CheckOutcome::AwaitingUploads => {
            println!("{}", AWAITING_UPLOADS_MESSAGE);
            return Ok(());
        }
        CheckOutcome::Ready(report) => report,
    };

    println!("{}", report.summary);

    export_to_path(&report.filtered, &args.uploads.output)
        .with_context(|| format!("Failed to write {}", args.uploads.output.display()))?;
    println!("✓ Wrote {}", args.uploads.output.display());

    match &report.lookup {
        Some(result @ LookupResult::Found { rows, .. }) => {
            println!("\n{} {} ({} rows)", result.message(), result.query(), rows.len());
            let csv = bin_checker::to_csv_bytes(rows)?;
            print!("{}", String::from_utf8_lossy(&csv));
        }
        Some(result @ LookupResult::NotFound { .. }) => {
            println!("\n⚠ {} ({})", result.message(), result.query());
        }
        None => {}
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(uploads: Uploads) -> Result<()> {
    // No subscriber here: the TUI owns the terminal
    let request = uploads.request();

    let report = match pipeline::run(&request).context("Failed to check BIN list")? {
        CheckOutcome::AwaitingUploads => {
            println!("{}", AWAITING_UPLOADS_MESSAGE);
            println!("   Run: bin-checker tui --reference <BIN_DB.csv> --check-list <BIN_LIST.csv>");
            return Ok(());
        }
        CheckOutcome::Ready(report) => *report,
    };

    let mut app = ui::App::new(request, report, uploads.output);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_uploads: Uploads) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: bin-checker check --reference <BIN_DB.csv> --check-list <BIN_LIST.csv>");
    std::process::exit(1);
}
