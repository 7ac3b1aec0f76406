//! pdfstruct CLI - PDF layout reconstruction tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfstruct::{
    render, Document, DocumentContent, DocumentSource, ExtractOptions, JsonFormat, PdfSource,
};

const JSON_FILE: &str = "extracted_data.json";
const CSV_FILE: &str = "extracted_data.csv";
const IMAGES_DIR: &str = "images";

#[derive(Parser)]
#[command(name = "pdfstruct")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Reconstruct PDF layout into structured JSON and CSV", long_about = None)]
struct Cli {
    /// Input PDF file (or primitives dump with --primitives)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT_DIR", default_value = "output")]
    output: PathBuf,

    #[command(flatten)]
    extract: ExtractArgs,

    /// Write compact JSON
    #[arg(long)]
    compact: bool,

    /// Skip the CSV export
    #[arg(long)]
    no_csv: bool,

    /// Do not write image files
    #[arg(long)]
    no_images: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show document metadata and language statistics
    Info {
        /// Input PDF file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Print the metadata as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Show version information
    Version,
}

/// Options shared by every command that runs the pipeline.
#[derive(Args, Clone)]
struct ExtractArgs {
    /// Input is a JSON primitives dump instead of a PDF
    #[arg(long)]
    primitives: bool,

    /// Skip vector chart detection
    #[arg(long)]
    no_chart_extraction: bool,

    /// Skip per-block feature enrichment
    #[arg(long)]
    no_ml_features: bool,

    /// Keep column blocks separate
    #[arg(long)]
    no_column_join: bool,

    /// Process pages one at a time
    #[arg(long)]
    sequential: bool,

    /// JSON file overriding pipeline constants
    #[arg(long, value_name = "FILE", env = "PDFSTRUCT_CONFIG")]
    config: Option<PathBuf>,
}

impl ExtractArgs {
    fn options(&self) -> pdfstruct::Result<ExtractOptions> {
        let mut options = match &self.config {
            Some(path) => ExtractOptions::from_json_file(path)?,
            None => ExtractOptions::default(),
        };
        if self.no_chart_extraction {
            options = options.without_charts();
        }
        if self.no_ml_features {
            options = options.without_features();
        }
        if self.no_column_join {
            options = options.with_column_join(false);
        }
        if self.sequential {
            options = options.sequential();
        }
        Ok(options)
    }

    fn open(&self, input: &Path) -> pdfstruct::Result<Box<dyn DocumentSource>> {
        if self.primitives {
            Ok(Box::new(DocumentContent::from_json_file(input)?))
        } else {
            Ok(Box::new(PdfSource::open(input)?))
        }
    }

    fn run(&self, input: &Path) -> pdfstruct::Result<Document> {
        let options = self.options()?;
        let source = self.open(input)?;
        Ok(pdfstruct::extract_source(source.as_ref(), options))
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Info {
            ref input,
            json,
            ref extract,
        }) => cmd_info(input, json, extract),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            if let Some(ref input) = cli.input {
                cmd_extract(input, &cli)
            } else {
                println!("{}", "Usage: pdfstruct <INPUT> [OUTPUT_DIR]".yellow());
                println!("       pdfstruct --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Files written by an extraction run.
struct Written {
    json: PathBuf,
    csv: Option<(PathBuf, usize)>,
    images: usize,
}

fn write_outputs(
    doc: &mut Document,
    output_dir: &Path,
    cli: &Cli,
    pb: &ProgressBar,
) -> Result<Written, Box<dyn std::error::Error>> {
    fs::create_dir_all(output_dir)?;

    let mut images = 0;
    if !cli.no_images {
        pb.set_message("Writing images...");
        let prefix = format!("{}/", IMAGES_DIR);
        images = doc.write_images(&output_dir.join(IMAGES_DIR), &prefix)?;
    }
    pb.inc(1);

    pb.set_message("Writing JSON...");
    let format = if cli.compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = output_dir.join(JSON_FILE);
    render::write_json(doc, &json, format)?;
    pb.inc(1);

    let mut csv = None;
    if !cli.no_csv {
        pb.set_message("Writing CSV...");
        let path = output_dir.join(CSV_FILE);
        let rows = render::write_csv_file(doc, &path)?;
        csv = Some((path, rows));
    }
    pb.inc(1);

    Ok(Written { json, csv, images })
}

fn cmd_extract(input: &Path, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Reconstructing layout...");
    let mut doc = cli.extract.run(input)?;
    pb.inc(1);

    let written = write_outputs(&mut doc, &cli.output, cli, &pb)?;
    pb.finish_with_message("Done!");
    log::info!(
        "{}: {} pages, {} blocks written to {}",
        input.display(),
        doc.page_count(),
        doc.block_count(),
        cli.output.display()
    );

    print_summary(&doc);

    println!("\n{}", "Output files:".green().bold());
    let branch = |last: bool| (if last { "└─" } else { "├─" }).dimmed();
    println!(
        "  {} {}",
        branch(written.csv.is_none() && written.images == 0),
        written.json.display()
    );
    if let Some((path, rows)) = &written.csv {
        println!("  {} {} ({} rows)", branch(written.images == 0), path.display(), rows);
    }
    if written.images > 0 {
        println!(
            "  {} {}/ ({} files)",
            branch(true),
            cli.output.join(IMAGES_DIR).display(),
            written.images
        );
    }

    Ok(())
}

fn print_summary(doc: &Document) {
    let tables: usize = doc.pages.iter().map(|p| p.tables.len()).sum();
    let figures: usize = doc.pages.iter().map(|p| p.figures.len()).sum();
    let images: usize = doc.pages.iter().map(|p| p.images.len()).sum();

    println!();
    println!("{}", "Extraction Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Pages".bold(), doc.page_count());
    println!("{}: {}", "Content blocks".bold(), doc.block_count());
    println!("{}: {}", "Tables".bold(), tables);
    println!("{}: {}", "Figures".bold(), figures);
    println!("{}: {}", "Images".bold(), images);
    println!("{}: {}", "Primary language".bold(), doc.metadata.primary_language);
}

fn cmd_info(input: &Path, json: bool, extract: &ExtractArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut args = extract.clone();
    args.no_ml_features = true;
    let doc = args.run(input)?;
    let meta = &doc.metadata;

    if json {
        println!("{}", serde_json::to_string_pretty(meta)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Pages".bold(), meta.page_count);

    if let Some(ref title) = meta.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = meta.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref created) = meta.creation_date {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = meta.modification_date {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Languages".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    if meta.languages.is_empty() {
        println!("{}", "No language detected".dimmed());
    }
    for share in &meta.languages {
        println!(
            "{} ({}): {} blocks, {:.2}%",
            share.name.bold(),
            share.code,
            share.frequency,
            share.percentage
        );
    }
    for share in &meta.writing_systems {
        println!(
            "{}: {} blocks, {:.2}%",
            share.system.as_str().bold(),
            share.count,
            share.percentage
        );
    }

    print_summary(&doc);

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfstruct".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF layout reconstruction tool");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    use pdfstruct::source::{PageContent, RawRun};
    use pdfstruct::BBox;

    fn make_dump(dir: &Path) -> PathBuf {
        let mut page = PageContent::new(1, 600.0, 800.0);
        for i in 0..3 {
            let y = 120.0 + i as f32 * 14.0;
            page.runs.push(RawRun::new(
                "Imports rose sharply in the second half of the year across all sectors",
                BBox::new(50.0, y, 550.0, y + 11.0),
                11.0,
            ));
        }
        let path = dir.join("dump.json");
        let json = DocumentContent::new(vec![page]).to_json().unwrap();
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_flags_map_to_options() {
        let cli = Cli::try_parse_from([
            "pdfstruct",
            "in.pdf",
            "--no-chart-extraction",
            "--no-ml-features",
            "--no-column-join",
            "--sequential",
        ])
        .unwrap();
        let options = cli.extract.options().unwrap();

        assert!(!options.extract_charts);
        assert!(!options.ml_features);
        assert!(!options.join_columns);
        assert!(!options.parallel);
        assert_eq!(cli.output, PathBuf::from("output"));
    }

    #[test]
    fn test_info_subcommand() {
        let cli = Cli::try_parse_from(["pdfstruct", "info", "in.pdf", "--json", "--sequential"]).unwrap();
        match cli.command {
            Some(Commands::Info { input, json, extract }) => {
                assert_eq!(input, PathBuf::from("in.pdf"));
                assert!(json);
                assert!(!extract.options().unwrap().parallel);
            }
            _ => panic!("expected info subcommand"),
        }
    }

    #[test]
    fn test_default_options() {
        let cli = Cli::try_parse_from(["pdfstruct", "in.pdf", "out"]).unwrap();
        assert_eq!(cli.extract.options().unwrap(), ExtractOptions::default());
        assert_eq!(cli.output, PathBuf::from("out"));
    }

    #[test]
    fn test_extract_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let dump = make_dump(dir.path());
        let out = dir.path().join("out");
        let cli = Cli::try_parse_from([
            OsStr::new("pdfstruct"),
            dump.as_os_str(),
            out.as_os_str(),
            OsStr::new("--primitives"),
        ])
        .unwrap();

        let mut doc = cli.extract.run(&dump).unwrap();
        let written = write_outputs(&mut doc, &out, &cli, &ProgressBar::hidden()).unwrap();

        assert!(written.json.exists());
        let (csv, rows) = written.csv.unwrap();
        assert!(csv.exists());
        assert_eq!(rows, doc.block_count());
        assert_eq!(written.images, 0);

        let json = fs::read_to_string(out.join(JSON_FILE)).unwrap();
        let back = render::from_json(&json).unwrap();
        assert_eq!(back.metadata.source_file.as_deref(), Some("dump.json"));
    }
}
