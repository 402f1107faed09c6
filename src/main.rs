use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use docblocks::export::{DirectoryUploader, Exporter, JsonExporter};
use docblocks::ocr::TesseractBridge;
use docblocks::pdf::{
    renderer::DEFAULT_DPI, EmbeddedImageExtractor, PageRenderer, PageTextReader, PdfReader,
};
use docblocks::pipeline::{LayoutConfig, LayoutPipeline, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "docblocks")]
#[command(version, about = "Content region detection and block classification for page images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct EngineArgs {
    /// JSON file overriding detector, merge, classifier and annotation settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tesseract executable
    #[arg(long, env = "DOCBLOCKS_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// Tesseract language(s), e.g. "eng" or "eng+deu"
    #[arg(long, env = "DOCBLOCKS_LANG", default_value = "eng")]
    lang: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    /// Embedded text layer plus segmentation of each embedded image
    Low,
    /// Rasterize every page and segment it
    High,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Segment and classify a single page image
    Segment {
        /// Input image path
        input: PathBuf,

        /// Output directory (default: ./<input_name>_output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        engine: EngineArgs,

        /// Disable progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Render every page of a PDF and segment each one
    Pdf {
        /// Input PDF file path
        input: PathBuf,

        /// Output directory (default: ./<input_name>_output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Extraction mode
        #[arg(long, value_enum, default_value_t = Resolution::High)]
        res: Resolution,

        /// Rendering DPI (high resolution mode)
        #[arg(long, default_value_t = DEFAULT_DPI)]
        dpi: u32,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Segment multiple page images
    Batch {
        /// Input image files
        inputs: Vec<PathBuf>,

        /// Output directory for all results
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Show information about a PDF file
    Info {
        /// Input PDF file path
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Segment {
            input,
            output,
            engine,
            quiet,
        } => segment_single(input, output, &engine, quiet),
        Commands::Pdf {
            input,
            output,
            res,
            dpi,
            engine,
        } => segment_pdf(input, output, res, dpi, &engine),
        Commands::Batch {
            inputs,
            output,
            engine,
        } => segment_batch(inputs, output, &engine),
        Commands::Info { input } => show_info(input),
    }
}

fn default_output_dir(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    PathBuf::from(format!("{}_output", stem))
}

fn load_layout_config(engine: &EngineArgs) -> Result<LayoutConfig> {
    match &engine.config {
        Some(path) => LayoutConfig::from_json_file(path),
        None => Ok(LayoutConfig::default()),
    }
}

fn build_pipeline(
    config: &PipelineConfig,
    engine: &EngineArgs,
) -> LayoutPipeline<TesseractBridge, DirectoryUploader> {
    let ocr = TesseractBridge::new()
        .with_program(engine.tesseract.clone())
        .with_lang(engine.lang.clone());
    let uploader = DirectoryUploader::new(config.output.clone()).with_folder("segmented");
    LayoutPipeline::new(&config.layout, ocr, uploader)
}

fn segment_single(
    input: PathBuf,
    output: Option<PathBuf>,
    engine: &EngineArgs,
    quiet: bool,
) -> Result<()> {
    if !input.is_file() {
        anyhow::bail!("Input is not a file: {}", input.display());
    }

    let output_dir = output.unwrap_or_else(|| default_output_dir(&input));
    let config = PipelineConfig::new(input.clone(), output_dir.clone(), DEFAULT_DPI)
        .with_layout(load_layout_config(engine)?);

    if !quiet {
        println!("[*] Processing: {}", input.display());
        println!("[*] Output: {}", output_dir.display());
    }

    let pipeline = build_pipeline(&config, engine);
    let layout = pipeline
        .run_path(&config.input)
        .with_context(|| format!("Failed to process image: {}", input.display()))?;

    JsonExporter::new(output_dir.clone())
        .export(&layout)
        .with_context(|| format!("Failed to export to: {}", output_dir.display()))?;

    if !quiet {
        println!("[+] {} block(s) found", layout.blocks.len());
        for block in &layout.blocks {
            let c = block.coordinates;
            println!(
                "    {:<18} at x:{} y:{} w:{} h:{}",
                block.classification, c.left, c.top, c.width, c.height
            );
        }
        println!("\n[✓] Done! Results saved to: {}", output_dir.display());
    }

    Ok(())
}

fn segment_pdf(
    input: PathBuf,
    output: Option<PathBuf>,
    res: Resolution,
    dpi: u32,
    engine: &EngineArgs,
) -> Result<()> {
    let output_dir = output.unwrap_or_else(|| default_output_dir(&input));
    let config = PipelineConfig::new(input.clone(), output_dir.clone(), dpi)
        .with_layout(load_layout_config(engine)?);

    println!("[*] Processing: {}", input.display());
    println!("[*] Output: {}", output_dir.display());
    match res {
        Resolution::High => println!("[*] Mode: high resolution, {} DPI", dpi),
        Resolution::Low => println!("[*] Mode: low resolution"),
    }

    let reader = PdfReader::new(config.input.clone())
        .with_context(|| format!("Failed to open PDF: {}", input.display()))?;
    let pipeline = build_pipeline(&config, engine);
    let exporter = JsonExporter::new(output_dir.clone());

    match res {
        Resolution::High => {
            let renderer = PageRenderer::new(output_dir.join("pages"), config.dpi);
            let document = pipeline
                .run_pdf(&reader, &renderer)
                .with_context(|| format!("Failed to process PDF: {}", input.display()))?;
            exporter
                .export(&document)
                .with_context(|| format!("Failed to export to: {}", output_dir.display()))?;

            println!(
                "\n[✓] Done! {}/{} page(s) processed, results saved to: {}",
                document.metadata.pages_processed,
                document.metadata.total_pages,
                output_dir.display()
            );
        }
        Resolution::Low => {
            let images = EmbeddedImageExtractor::new(output_dir.join("images"));
            let document = pipeline
                .run_pdf_embedded(&reader, &PageTextReader::new(), &images)
                .with_context(|| format!("Failed to process PDF: {}", input.display()))?;
            exporter
                .export(&document)
                .with_context(|| format!("Failed to export to: {}", output_dir.display()))?;

            println!(
                "\n[✓] Done! {} text page(s), {} image(s) from {} page(s), results saved to: {}",
                document.metadata.text_extractions_count,
                document.metadata.image_extractions_count,
                document.metadata.total_pages,
                output_dir.display()
            );
        }
    }

    Ok(())
}

fn segment_batch(inputs: Vec<PathBuf>, output: Option<PathBuf>, engine: &EngineArgs) -> Result<()> {
    if inputs.is_empty() {
        anyhow::bail!("No input files specified");
    }

    let base_output = output.unwrap_or_else(|| PathBuf::from("batch_output"));

    println!("[*] Batch processing {} file(s)", inputs.len());
    println!("[*] Base output: {}\n", base_output.display());

    let mut success = 0;
    let mut failed = 0;

    for (i, input) in inputs.iter().enumerate() {
        println!("[{}/{}] Processing: {}", i + 1, inputs.len(), input.display());

        if !input.exists() {
            eprintln!("  [!] Skipped: file does not exist");
            failed += 1;
            continue;
        }

        let output_dir = match input.file_stem() {
            Some(stem) => base_output.join(stem),
            None => base_output.join(format!("input_{:03}", i + 1)),
        };

        match segment_single(input.clone(), Some(output_dir), engine, true) {
            Ok(_) => {
                println!("  [✓] Success");
                success += 1;
            }
            Err(e) => {
                eprintln!("  [✗] Failed: {:#}", e);
                failed += 1;
            }
        }
    }

    println!("\n[*] Summary: {} succeeded, {} failed", success, failed);

    if failed > 0 {
        anyhow::bail!("{} file(s) failed to process", failed);
    }

    Ok(())
}

fn show_info(input: PathBuf) -> Result<()> {
    let reader = PdfReader::new(input.clone())
        .with_context(|| format!("Failed to open PDF: {}", input.display()))?;

    let page_count = reader.page_count()?;

    println!("PDF Information");
    println!("===============");
    println!("File: {}", input.display());
    println!("Pages: {}", page_count);

    Ok(())
}
