//! docthumb CLI - Word document thumbnail tool
//!
//! A command-line tool for producing thumbnails of DOCX files.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use docthumb::docx::DocxDocument;
use docthumb::{Block, Dimensions, DocumentSource, ThumbnailResolver};
use image::{DynamicImage, ImageFormat};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

/// Thumbnails for Word documents
#[derive(Parser)]
#[command(
    name = "docthumb",
    author = "iyulab",
    version,
    about = "Create thumbnails of Word documents",
    long_about = "docthumb - Thumbnail extraction and rendering for DOCX files.\n\n\
                  Uses the preview embedded in the document when present, and renders\n\
                  the first page otherwise."
)]
struct Cli {
    /// Log pipeline decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write thumbnails of a document
    #[command(visible_alias = "thumb")]
    Thumbnail {
        /// Input file path
        input: PathBuf,

        /// Thumbnail size as WIDTHxHEIGHT (repeatable)
        #[arg(short, long = "size", default_value = "256x256")]
        sizes: Vec<Dimensions>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Image format
        #[arg(short, long, default_value = "png")]
        format: OutputFormat,
    },

    /// Show document preview information
    Info {
        /// Input file path
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

/// Thumbnail image format
#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Thumbnail {
            input,
            sizes,
            output,
            format,
        } => {
            let pb = create_spinner("Opening document...");

            let doc = DocxDocument::open(&input)?;
            pb.set_message("Generating thumbnails...");
            let thumbnails = ThumbnailResolver::new().resolve(&doc, &sizes)?;

            fs::create_dir_all(&output)?;
            let stem = input
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned();

            let mut written = Vec::with_capacity(thumbnails.len());
            for (index, thumbnail) in thumbnails.into_iter().enumerate() {
                let path = output.join(output_name(&stem, &sizes, index, format));
                save(thumbnail, &path, format)?;
                written.push(path);
            }

            pb.finish_and_clear();
            for path in &written {
                println!("{} Wrote {}", "✓".green().bold(), path.display());
            }
        }

        Commands::Info { input, json } => {
            let pb = create_spinner("Analyzing document...");

            let doc = DocxDocument::open(&input)?;
            let preview = doc.thumbnail_part()?;
            let usable_preview = doc.embedded_preview()?.is_present();
            let page = doc.native_page_size()?;
            let content = doc.content()?;
            let tables = content
                .blocks
                .iter()
                .filter(|b| matches!(b, Block::Table(_)))
                .count();
            let paragraphs = content.paragraphs().count();

            pb.finish_and_clear();

            if json {
                let info = serde_json::json!({
                    "file": doc.identifier(),
                    "title": content.title,
                    "embedded_preview": preview,
                    "preview_usable": usable_preview,
                    "page_size": page,
                    "page_setup": content.page,
                    "paragraphs": paragraphs,
                    "tables": tables,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
                return Ok(());
            }

            println!("{}", "Document Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            if let Some(ref title) = content.title {
                println!("{}: {}", "Title".bold(), title);
            }
            match page {
                Some(size) => println!("{}: {} px", "Page size".bold(), size),
                None => println!("{}: {}", "Page size".bold(), "not declared".yellow()),
            }
            match (&preview, usable_preview) {
                (Some(part), true) => println!("{}: {}", "Embedded preview".bold(), part),
                (Some(part), false) => println!(
                    "{}: {} ({})",
                    "Embedded preview".bold(),
                    part,
                    "not usable, will render".yellow()
                ),
                (None, _) => println!("{}: {}", "Embedded preview".bold(), "none".yellow()),
            }

            println!("\n{}", "Content Statistics".cyan().bold());
            println!("{}", "─".repeat(40));
            println!("{}: {}", "Paragraphs".bold(), paragraphs);
            println!("{}: {}", "Tables".bold(), tables);
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

/// `{stem}-{WxH}.{ext}`, with the target index appended when a size repeats.
fn output_name(stem: &str, sizes: &[Dimensions], index: usize, format: OutputFormat) -> String {
    let size = sizes[index];
    if sizes.iter().filter(|&&s| s == size).count() > 1 {
        format!("{}-{}-{}.{}", stem, size, index, format.extension())
    } else {
        format!("{}-{}.{}", stem, size, format.extension())
    }
}

fn save(
    thumbnail: docthumb::RasterImage,
    path: &Path,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Png => thumbnail.save_with_format(path, ImageFormat::Png)?,
        // JPEG has no alpha channel
        OutputFormat::Jpeg => DynamicImage::ImageRgba8(thumbnail)
            .to_rgb8()
            .save_with_format(path, ImageFormat::Jpeg)?,
    }
    Ok(())
}

fn print_version() {
    println!("{} {}", "docthumb".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Thumbnail extraction and rendering for Word documents");
    println!();
    println!("Supported formats: DOCX");
    println!("Repository: https://github.com/iyulab/docthumb");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
