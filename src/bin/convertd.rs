//! CLI binary for edgequake-convert.
//!
//! `convertd serve` runs the HTTP service; `convertd convert` runs one
//! conversion locally; `convertd list` prints the conversion table.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_convert::materialize::{Base64Response, EncodedFile, SUCCESS_MESSAGE};
use edgequake_convert::pipeline::encode::to_base64;
use edgequake_convert::pipeline::engine;
use edgequake_convert::pipeline::input::{fetch_remote, is_url};
use edgequake_convert::{
    convert_tag, serve, shutdown_signal, AppState, ConversionConfig, ConvertError, InputFile,
    OutputMode, ServerConfig, CONVERSIONS,
};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  convertd serve --bind 0.0.0.0:8000 --public-base-url https://convert.example.com
  convertd convert pdf-to-word report.pdf -o out/
  convertd convert pdf-to-jpg https://example.com/slides.pdf --output-mode stream
  convertd convert html-to-pdf page.html --output-mode base64 > page.json

PDFIUM:
  Every conversion needs the pdfium shared library. It is looked up in
  PDFIUM_LIB_PATH (file or directory), then the working directory, then the
  system library paths.
"#;

/// Convert images and office documents to and from PDF.
#[derive(Parser, Debug)]
#[command(
    name = "convertd",
    version,
    about = "Convert images and office documents to and from PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log filter used when RUST_LOG is unset (e.g. info, debug, edgequake_convert=trace).
    #[arg(long, global = true, env = "CONVERT_LOG", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "CONVERT_LOG_JSON")]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP conversion service.
    Serve(ServeArgs),
    /// Convert one local file or URL.
    Convert(ConvertArgs),
    /// List the supported conversions.
    List,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "CONVERT_BIND", default_value = "127.0.0.1:8000")]
    bind: String,

    /// Directory where link-mode results are stored.
    #[arg(long, env = "CONVERT_OUTPUT_DIR", default_value = "static/converted_files")]
    output_dir: PathBuf,

    /// Base of the download URLs handed to clients. Default: http://<bind>.
    #[arg(long, env = "CONVERT_PUBLIC_BASE_URL")]
    public_base_url: Option<String>,

    /// Largest accepted upload, in MiB.
    #[arg(long, env = "CONVERT_MAX_UPLOAD_MB", default_value_t = 50)]
    max_upload_mb: usize,

    /// Output mode of POST /process when the request names none (link, base64, stream).
    #[arg(long, env = "CONVERT_DEFAULT_OUTPUT", default_value = "link")]
    default_output: String,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Conversion tag, e.g. pdf-to-word (see `convertd list`).
    tag: String,

    /// Local file path or HTTP/HTTPS URL.
    input: String,

    /// Directory to write results into.
    #[arg(short, long, env = "CONVERT_OUT", default_value = ".")]
    output: PathBuf,

    /// link: one file per artifact; stream: a single file (ZIP when several);
    /// base64: JSON on stdout.
    #[arg(long, env = "CONVERT_OUTPUT_MODE", default_value = "link")]
    output_mode: String,

    /// Largest remote input to download, in MiB.
    #[arg(long, env = "CONVERT_MAX_DOWNLOAD_MB", default_value_t = 50)]
    max_download_mb: usize,

    #[command(flatten)]
    engine: EngineArgs,
}

/// Flags shared by `serve` and `convert`.
#[derive(Args, Debug)]
struct EngineArgs {
    /// Rendering DPI for pdf-to-jpg (72–400).
    #[arg(long, env = "CONVERT_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Longest side of a rendered page, in pixels.
    #[arg(long, env = "CONVERT_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,

    /// JPEG quality (1–100).
    #[arg(long, env = "CONVERT_JPEG_QUALITY", default_value_t = 85,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Pixel density assumed when sizing image pages in jpg-to-pdf.
    #[arg(long, env = "CONVERT_IMAGE_DPI", default_value_t = 96)]
    image_dpi: u32,

    /// Font size of generated PDF text, in points.
    #[arg(long, env = "CONVERT_FONT_SIZE", default_value_t = 12.0)]
    font_size: f32,

    /// Line height of generated PDF text, in millimetres.
    #[arg(long, env = "CONVERT_LINE_HEIGHT_MM", default_value_t = 10.0)]
    line_height_mm: f32,

    /// Password for encrypted input PDFs.
    #[arg(long, env = "CONVERT_PDF_PASSWORD")]
    pdf_password: Option<String>,

    /// pdfium shared library (file or directory).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Timeout for downloading remote inputs, in seconds.
    #[arg(long, env = "CONVERT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Convert(args) => run_convert(args).await,
        Command::List => {
            run_list();
            Ok(())
        }
    }
}

/// `RUST_LOG` wins over `--log-level`; a bad filter falls back to `info`.
fn init_tracing(level: &str, json: bool) {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match level.parse::<EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: log level '{level}' is not a valid tracing filter ({e}); \
                     falling back to 'info'"
                );
                EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(io::stderr);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let conversion = build_config(&args.engine)?;
    if !engine::is_available(&conversion) {
        warn!("pdfium library not found; conversions will fail until PDFIUM_LIB_PATH is set");
    }

    let server = ServerConfig {
        public_base_url: args
            .public_base_url
            .unwrap_or_else(|| format!("http://{}", args.bind)),
        bind_address: args.bind,
        output_dir: args.output_dir,
        max_upload_bytes: args.max_upload_mb.saturating_mul(1024 * 1024),
        default_output: args.default_output.parse()?,
    };

    info!(version = env!("CARGO_PKG_VERSION"), "convertd starting");
    let listener = tokio::net::TcpListener::bind(&server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", server.bind_address))?;
    let state = AppState::new(server, conversion)
        .await
        .context("Failed to prepare the output directory")?;

    serve(listener, state, shutdown_signal())
        .await
        .context("HTTP server failed")?;
    Ok(())
}

async fn run_convert(args: ConvertArgs) -> Result<()> {
    let config = build_config(&args.engine)?;
    let mode: OutputMode = args.output_mode.parse()?;

    let input = if is_url(&args.input) {
        let max_bytes = args.max_download_mb.saturating_mul(1024 * 1024);
        fetch_remote(&args.input, config.download_timeout_secs, max_bytes).await?
    } else {
        InputFile::from_path(Path::new(&args.input))
            .await
            .with_context(|| format!("Failed to read {}", args.input))?
    };
    let stem = input.stem();

    let output = convert_tag(&args.tag, input, &config).await?;
    let stats = output.stats.clone();

    match mode {
        OutputMode::Link => {
            tokio::fs::create_dir_all(&args.output)
                .await
                .with_context(|| format!("Failed to create {}", args.output.display()))?;
            for artifact in &output.artifacts {
                let path = args.output.join(&artifact.file_name);
                write_file(&path, &artifact.bytes).await?;
            }
        }
        OutputMode::Stream => {
            let kind = output.kind;
            let bundle = output
                .bundle(&stem)
                .map_err(|e| ConvertError::from_stage(kind.label(), e))?;
            tokio::fs::create_dir_all(&args.output)
                .await
                .with_context(|| format!("Failed to create {}", args.output.display()))?;
            write_file(&args.output.join(&bundle.file_name), &bundle.bytes).await?;
        }
        OutputMode::Base64 => {
            let body = Base64Response {
                message: SUCCESS_MESSAGE.to_string(),
                file_type: output.kind.tag().to_string(),
                files: output
                    .artifacts
                    .iter()
                    .map(|a| EncodedFile {
                        file_name: a.file_name.clone(),
                        content_type: a.content_type.to_string(),
                        data: to_base64(&a.bytes),
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    eprintln!(
        "Converted {} bytes into {} file(s), {} bytes in {}ms",
        stats.input_bytes, stats.artifact_count, stats.output_bytes, stats.duration_ms
    );
    Ok(())
}

fn run_list() {
    println!("{:<14} {:<14} {:<5} ACCEPTS", "TAG", "LABEL", "OUT");
    for spec in CONVERSIONS.iter() {
        println!(
            "{:<14} {:<14} {:<5} {}",
            spec.tag,
            spec.label,
            spec.output.extension(),
            spec.accepts.join(", ")
        );
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{}", path.display());
    Ok(())
}

/// Map CLI flags to `ConversionConfig`.
fn build_config(args: &EngineArgs) -> Result<ConversionConfig> {
    if args.max_pixels == 0 {
        bail!("--max-pixels must be positive");
    }
    let mut builder = ConversionConfig::builder()
        .dpi(args.dpi)
        .max_rendered_pixels(args.max_pixels)
        .jpeg_quality(args.jpeg_quality)
        .image_dpi(args.image_dpi)
        .font_size(args.font_size)
        .line_height_mm(args.line_height_mm)
        .download_timeout_secs(args.download_timeout);
    if let Some(pwd) = &args.pdf_password {
        builder = builder.pdf_password(pwd.clone());
    }
    if let Some(path) = &args.pdfium_lib_path {
        builder = builder.pdfium_lib_path(path.clone());
    }
    builder.build().context("Invalid conversion settings")
}
