#![allow(clippy::uninlined_format_args)]

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use gradient_export::dom::{Document, SvgNode};
use gradient_export::export::SnapshotTarget;
use gradient_export::palette::{extract_palette, HistogramPaletteExtractor};
use gradient_export::{
    download, estimate, normalize, BlobStore, BlobVariant, DirectorySink, ExportConfig,
    ExportFormat, GradientCard, GradientSpec, LinearVariant, RasterExporter, ScaleFactor,
};
use std::path::{Path, PathBuf};

/// gradient-export: Export gradients and SVG snapshots to PNG, JPEG and WebP
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Path to an export configuration JSON file
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (repeat for more)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export a linear gradient
    Linear {
        /// Colors in gradient order
        #[clap(short, long, num_args = 1.., required = true)]
        colors: Vec<String>,

        /// Direction in degrees, 0 pointing up and 90 pointing right
        #[clap(short, long, default_value_t = 90.0, allow_negative_numbers = true)]
        angle: f64,

        /// Stop placement. One of default, smooth
        #[clap(long, default_value = "default")]
        variant: LinearVariant,

        #[clap(flatten)]
        size: SizeArgs,

        #[clap(flatten)]
        encode: EncodeArgs,

        #[clap(flatten)]
        save: SaveArgs,
    },

    /// Export a blob gradient
    Blob {
        /// Blob colors; at most four are used
        #[clap(short, long, num_args = 1.., required = true)]
        colors: Vec<String>,

        /// Background treatment. One of light, dark, random
        #[clap(long, default_value = "dark")]
        variant: BlobVariant,

        /// Seed for a reproducible layout
        #[clap(long)]
        seed: Option<u64>,

        /// Rich layout: jittered centers, varied sizes and shuffled colors
        #[clap(long)]
        rich: bool,

        #[clap(flatten)]
        size: SizeArgs,

        #[clap(flatten)]
        encode: EncodeArgs,

        #[clap(flatten)]
        save: SaveArgs,
    },

    /// Export a gradient described by a JSON file
    Spec {
        /// Path to the gradient JSON file
        input: PathBuf,

        /// Seed for a reproducible blob layout
        #[clap(long)]
        seed: Option<u64>,

        #[clap(flatten)]
        size: SizeArgs,

        #[clap(flatten)]
        encode: EncodeArgs,

        #[clap(flatten)]
        save: SaveArgs,
    },

    /// Rasterize an SVG file at its intrinsic size
    Svg {
        /// Path to the SVG file
        input: PathBuf,

        #[clap(flatten)]
        encode: EncodeArgs,

        #[clap(flatten)]
        save: SaveArgs,
    },

    /// Print the approximate size of an export
    Estimate {
        #[clap(flatten)]
        size: SizeArgs,

        #[clap(flatten)]
        encode: EncodeArgs,
    },

    /// Print colors in canvas-drawable notation
    Normalize {
        /// CSS color tokens
        #[clap(required = true)]
        tokens: Vec<String>,
    },

    /// Print the dominant colors of an image
    Palette {
        /// Path to the image file
        input: PathBuf,

        /// Number of colors to extract
        #[clap(short = 'n', long, default_value_t = 5)]
        count: usize,
    },
}

#[derive(Args, Debug)]
struct SizeArgs {
    /// Container width in CSS pixels
    #[clap(long, default_value_t = 800)]
    width: u32,

    /// Container height in CSS pixels
    #[clap(long, default_value_t = 450)]
    height: u32,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Resolution multiplier. One of 1, 2, 3
    #[clap(short, long, default_value_t = 1, value_parser = parse_scale)]
    scale: u32,

    /// Output format. One of png, jpg, webp
    #[clap(short, long, default_value = "png")]
    format: ExportFormat,
}

impl EncodeArgs {
    fn scale_factor(&self) -> ScaleFactor {
        // parse_scale already rejected anything else
        ScaleFactor::try_from(self.scale).unwrap_or_default()
    }
}

#[derive(Args, Debug)]
struct SaveArgs {
    /// Directory to write the file into
    #[clap(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// File name without extension
    #[clap(long)]
    file_name: Option<String>,
}

fn parse_scale(value: &str) -> Result<u32, String> {
    let scale: u32 = value.parse().map_err(|e| format!("{}", e))?;
    ScaleFactor::try_from(scale).map_err(|e| e.to_string())?;
    Ok(scale)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn rng(seed: Option<u64>) -> fastrand::Rng {
    seed.map(fastrand::Rng::with_seed)
        .unwrap_or_else(fastrand::Rng::new)
}

/// Export a card and write it into the output directory. Returns the saved path.
async fn export_card(
    card: GradientCard,
    exporter: &RasterExporter,
    encode: &EncodeArgs,
    save: &SaveArgs,
) -> anyhow::Result<PathBuf> {
    let card = match &save.file_name {
        Some(base) => card.with_file_name_base(base),
        None => card,
    };
    let store = BlobStore::new();
    let mut sink = DirectorySink::new(&save.output_dir);
    let name = card
        .export(
            exporter,
            encode.scale_factor(),
            encode.format,
            &store,
            &mut sink,
        )
        .await?;
    Ok(sink.path_for(&name))
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read input file: {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => ExportConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ExportConfig::default(),
    };
    let exporter = RasterExporter::new(config);

    match cli.command {
        Commands::Linear {
            colors,
            angle,
            variant,
            size,
            encode,
            save,
        } => {
            let spec = GradientSpec::Linear {
                colors,
                angle_degrees: angle,
                variant,
            };
            let card = GradientCard::new(
                spec,
                size.width,
                size.height,
                &exporter,
                fastrand::Rng::new(),
                false,
            );
            let path = export_card(card, &exporter, &encode, &save).await?;
            println!("{}", path.display());
        }
        Commands::Blob {
            colors,
            variant,
            seed,
            rich,
            size,
            encode,
            save,
        } => {
            let spec = GradientSpec::Blob {
                colors,
                variant,
                blobs: Vec::new(),
            };
            let card = GradientCard::new(
                spec,
                size.width,
                size.height,
                &exporter,
                rng(seed),
                rich,
            );
            let path = export_card(card, &exporter, &encode, &save).await?;
            println!("{}", path.display());
        }
        Commands::Spec {
            input,
            seed,
            size,
            encode,
            save,
        } => {
            let json = String::from_utf8(read_file(&input)?)
                .with_context(|| format!("{} is not UTF-8", input.display()))?;
            let spec = GradientSpec::from_json(&json)
                .with_context(|| format!("Failed to parse gradient {}", input.display()))?;
            let card = GradientCard::new(
                spec,
                size.width,
                size.height,
                &exporter,
                rng(seed),
                false,
            );
            let path = export_card(card, &exporter, &encode, &save).await?;
            println!("{}", path.display());
        }
        Commands::Svg {
            input,
            encode,
            save,
        } => {
            let markup = String::from_utf8(read_file(&input)?)
                .with_context(|| format!("{} is not UTF-8", input.display()))?;
            let node = SvgNode::from_markup(&markup)?;
            let base = match &save.file_name {
                Some(base) => base.clone(),
                None => input
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or("gradient")
                    .to_string(),
            };
            let result = exporter
                .export_snapshot(
                    SnapshotTarget::Svg(&node),
                    &Document::new(),
                    None,
                    encode.scale_factor(),
                    encode.format,
                    Some(&base),
                )
                .await?;
            let store = BlobStore::new();
            let mut sink = DirectorySink::new(&save.output_dir);
            let name = download(result, &store, &mut sink)?;
            println!("{}", sink.path_for(&name).display());
        }
        Commands::Estimate { size, encode } => {
            println!(
                "{}",
                estimate(size.width, size.height, encode.scale_factor(), encode.format)
            );
        }
        Commands::Normalize { tokens } => {
            for token in &tokens {
                println!("{}", normalize(token));
            }
        }
        Commands::Palette { input, count } => {
            if count == 0 {
                bail!("--count must be at least 1");
            }
            let bytes = read_file(&input)?;
            let colors = extract_palette(&HistogramPaletteExtractor::default(), &bytes, count)?;
            for color in colors {
                println!("{}", color);
            }
        }
    }

    Ok(())
}
