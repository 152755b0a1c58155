//! qmerge CLI - Merge Qualtrics values/labels exports
//!
//! # Main Commands
//!
//! ```bash
//! qmerge serve                                  # Start HTTP server (port 3000)
//! qmerge combine --pre-values a.csv ...         # Pre + post waves, all artifacts
//! qmerge merge values.csv labels.csv -o out.xlsx
//! ```
//!
//! # Single Artifacts
//!
//! ```bash
//! qmerge dictionary values.csv labels.csv -o dictionary.docx
//! qmerge spss values.csv labels.csv --prefix pre -o pre_spss.csv
//! qmerge duplicates values.csv labels.csv      # List repeated RecordIDs
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use qualtrics_merge::export::{spss_csv, xlsx};
use qualtrics_merge::{
    process_files, process_survey, save_document, Dataset, DatasetKind, DatasetResult, DuplicateReport,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "qmerge")]
#[command(about = "Merge Qualtrics values/labels CSV exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge one values/labels pair into a workbook
    Merge {
        /// Values export (numeric codes)
        values: PathBuf,

        /// Labels export (choice text)
        labels: PathBuf,

        /// Dataset name, used as the sheet name
        #[arg(short, long, default_value = "Survey")]
        name: String,

        /// Column prefix for the SPSS file
        #[arg(short, long, default_value = "pre")]
        prefix: String,

        /// Output workbook
        #[arg(short, long, default_value = "merged.xlsx")]
        output: PathBuf,

        /// Also write the value dictionary (.docx or .md)
        #[arg(long)]
        dictionary: Option<PathBuf>,

        /// Also write the SPSS CSV
        #[arg(long)]
        spss: Option<PathBuf>,
    },

    /// Merge pre and post waves and write every artifact
    Combine {
        #[arg(long)]
        pre_values: PathBuf,

        #[arg(long)]
        pre_labels: PathBuf,

        #[arg(long)]
        post_values: PathBuf,

        #[arg(long)]
        post_labels: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Dictionary document format
        #[arg(long, value_enum, default_value_t = DictionaryFormat::Docx)]
        dictionary_format: DictionaryFormat,
    },

    /// Write the value dictionary of a merged pair
    Dictionary {
        values: PathBuf,
        labels: PathBuf,

        /// Output document (.docx, anything else is Markdown)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write the SPSS-ready CSV of a merged pair
    Spss {
        values: PathBuf,
        labels: PathBuf,

        /// Column prefix, e.g. "pre" or "post"
        #[arg(short, long, default_value = "pre")]
        prefix: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List RecordIDs shared by several rows
    Duplicates {
        values: PathBuf,
        labels: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "QMERGE_PORT", default_value = "3000")]
        port: u16,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DictionaryFormat {
    Docx,
    Md,
}

impl DictionaryFormat {
    fn extension(self) -> &'static str {
        match self {
            DictionaryFormat::Docx => "docx",
            DictionaryFormat::Md => "md",
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Merge {
            values,
            labels,
            name,
            prefix,
            output,
            dictionary,
            spss,
        } => cmd_merge(
            &values,
            &labels,
            &name,
            &prefix,
            &output,
            dictionary.as_deref(),
            spss.as_deref(),
        ),

        Commands::Combine {
            pre_values,
            pre_labels,
            post_values,
            post_labels,
            output,
            dictionary_format,
        } => cmd_combine(
            [pre_values.as_path(), pre_labels.as_path()],
            [post_values.as_path(), post_labels.as_path()],
            &output,
            dictionary_format,
        ),

        Commands::Dictionary { values, labels, output } => cmd_dictionary(&values, &labels, &output),

        Commands::Spss {
            values,
            labels,
            prefix,
            output,
        } => cmd_spss(&values, &labels, &prefix, output.as_deref()),

        Commands::Duplicates { values, labels, output } => cmd_duplicates(&values, &labels, output.as_deref()),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load(values: &Path, labels: &Path, name: &str, prefix: &str) -> Result<DatasetResult, Box<dyn std::error::Error>> {
    eprintln!("📄 Merging: {} + {}", values.display(), labels.display());

    let result = process_files(name, prefix, values, labels)?;
    eprintln!("   Rows: {}", result.summary.rows);
    eprintln!("   Columns: {} ({} questions)", result.summary.columns, result.summary.questions);

    for warning in &result.outcome.warnings {
        eprintln!("   ⚠️  {}", warning);
    }
    if result.summary.duplicate_rows > 0 {
        eprintln!("   ⚠️  {} rows share a RecordID", result.summary.duplicate_rows);
    }

    Ok(result)
}

fn cmd_merge(
    values: &Path,
    labels: &Path,
    name: &str,
    prefix: &str,
    output: &Path,
    dictionary: Option<&Path>,
    spss: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = load(values, labels, name, prefix)?;

    xlsx::save_workbook(&[(result.name.as_str(), result.table())], output)?;
    eprintln!("💾 Workbook written to: {}", output.display());

    if let Some(path) = dictionary {
        save_document(&result.dictionary(), path)?;
        eprintln!("💾 Dictionary written to: {}", path.display());
    }

    if let Some(path) = spss {
        spss_csv::save_spss_csv(&result.spss(), path)?;
        eprintln!("💾 SPSS file written to: {}", path.display());
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_combine(
    pre: [&Path; 2],
    post: [&Path; 2],
    output: &Path,
    format: DictionaryFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let pre = Dataset::from_files(DatasetKind::Pre, pre[0], pre[1])?;
    let post = Dataset::from_files(DatasetKind::Post, post[0], post[1])?;

    let result = process_survey(&pre, &post)?;
    for dataset in result.datasets() {
        eprintln!(
            "📊 {}: {} rows, {} questions, {} duplicate rows",
            dataset.name, dataset.summary.rows, dataset.summary.questions, dataset.summary.duplicate_rows
        );
        for warning in &dataset.outcome.warnings {
            eprintln!("   ⚠️  {}", warning);
        }
    }

    for path in result.write_outputs(output, format.extension())? {
        eprintln!("💾 {}", path.display());
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_dictionary(values: &Path, labels: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let result = load(values, labels, "Survey", "pre")?;
    let document = result.dictionary();
    eprintln!("📖 {} questions with coded values", document.headings(2).len());

    save_document(&document, output)?;
    eprintln!("💾 Output written to: {}", output.display());
    Ok(())
}

fn cmd_spss(values: &Path, labels: &Path, prefix: &str, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let content = spss_output(values, labels, prefix)?;
    write_output(&content, output)
}

fn spss_output(values: &Path, labels: &Path, prefix: &str) -> Result<String, Box<dyn std::error::Error>> {
    let result = load(values, labels, "Survey", prefix)?;
    let spss = result.spss();
    eprintln!("   SPSS columns: {}", spss.columns().len());

    Ok(spss_csv::spss_csv_string(&spss)?)
}

fn cmd_duplicates(values: &Path, labels: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let result = load(values, labels, "Survey", "pre")?;

    if result.summary.duplicate_ids.is_empty() {
        eprintln!("✅ Every RecordID is unique");
    }

    let reports: Vec<DuplicateReport> = result.summary.duplicate_ids.iter().map(DuplicateReport::from).collect();
    let json = serde_json::to_string_pretty(&reports)?;
    write_output(&json, output)
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    qualtrics_merge::server::start_server(port).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            emit(content, std::io::stdout().lock())?;
        }
    }
    Ok(())
}

/// Write `content` as-is, adding a final newline only when it lacks one.
fn emit<W: Write>(content: &str, mut out: W) -> std::io::Result<()> {
    out.write_all(content.as_bytes())?;
    if !content.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    out.flush()
}
