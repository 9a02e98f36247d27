use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use imgpress::batch::ConflictStrategy;
use imgpress::formats::OutputSelection;
use imgpress::processing::QualityPreset;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "imgpress",
    about = "Batch image compression and conversion that never silently overwrites",
    long_about = "imgpress compresses images in their own format or converts them to WebP/AVIF. \
                  Output collisions are detected before anything is written and resolved per \
                  batch by replacing, skipping, or auto-renaming. EXIF metadata can be kept, \
                  inspected, or stripped.",
    version,
    after_help = "EXAMPLES:\n  \
    imgpress process ./photos -o ./out -q 80 --on-conflict rename\n  \
    imgpress process \"./shots/*.png\" -o ./web -f webp --preset web\n  \
    imgpress conflicts ./photos -o ./out -f avif\n  \
    imgpress exif photo.jpg\n  \
    imgpress strip photo.jpg clean.jpg"
)]
pub struct Args {
    #[arg(long, global = true, help = "Only print errors")]
    pub quiet: bool,

    #[arg(short = 'v', long, global = true, help = "Print debug logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Compress in the input's own format
    Keep,
    Webp,
    Avif,
}

impl From<FormatArg> for OutputSelection {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Keep => OutputSelection::KeepOriginal,
            FormatArg::Webp => OutputSelection::WebP,
            FormatArg::Avif => OutputSelection::Avif,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConflictArg {
    Replace,
    Skip,
    Rename,
}

impl From<ConflictArg> for ConflictStrategy {
    fn from(arg: ConflictArg) -> Self {
        match arg {
            ConflictArg::Replace => ConflictStrategy::Replace,
            ConflictArg::Skip => ConflictStrategy::Skip,
            ConflictArg::Rename => ConflictStrategy::AutoRename,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    /// Quality 75
    Web,
    /// Quality 85
    Balanced,
    /// Quality 95
    High,
}

impl From<PresetArg> for QualityPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Web => QualityPreset::Web,
            PresetArg::Balanced => QualityPreset::Balanced,
            PresetArg::High => QualityPreset::High,
        }
    }
}

/// Inputs and output selection shared by `process` and `conflicts`.
#[derive(ClapArgs)]
pub struct Target {
    #[arg(
        required = true,
        help = "Input files, directories, or glob patterns",
        long_help = "Each input can be a file, a directory, or a glob expression. \
                     Examples: './images', './images/*.jpg'"
    )]
    pub inputs: Vec<String>,

    #[arg(short = 'o', long, help = "Output directory")]
    pub output: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "keep",
        help = "Output format",
        long_help = "keep re-encodes each image in its own format; webp and avif convert. \
                     AVIF is only available when built with the `avif` feature."
    )]
    pub format: FormatArg,

    #[arg(short = 'r', long, help = "Descend into subdirectories")]
    pub recursive: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Compress or convert images into an output directory",
        long_about = "Process every input in parallel. Existing outputs are resolved with \
                      --on-conflict before any file is written."
    )]
    Process {
        #[command(flatten)]
        target: Target,

        #[arg(
            short = 'q',
            long,
            allow_negative_numbers = true,
            help = "Quality 1-100 (default: 85, out-of-range values are clamped)",
            long_help = "Encoder quality. For PNG, which is lossless, it picks the deflater: \
                         >=90 uses Zopfli, >=70 high libdeflate, below that standard libdeflate."
        )]
        quality: Option<i64>,

        #[arg(
            short = 'p',
            long,
            value_enum,
            conflicts_with = "quality",
            help = "Named quality preset"
        )]
        preset: Option<PresetArg>,

        #[arg(long, help = "Write outputs without EXIF or ICC metadata")]
        strip_metadata: bool,

        #[arg(
            long,
            value_enum,
            default_value = "skip",
            help = "What to do when an output already exists"
        )]
        on_conflict: ConflictArg,

        #[arg(
            short = 'j',
            long,
            help = "Number of parallel threads (default: one per CPU)"
        )]
        threads: Option<usize>,

        #[arg(long, help = "Print the batch report as JSON")]
        json: bool,
    },

    #[command(about = "List inputs whose output path already exists")]
    Conflicts {
        #[command(flatten)]
        target: Target,

        #[arg(long, help = "Print conflicts as JSON")]
        json: bool,
    },

    #[command(about = "List the output formats this build can write")]
    Formats,

    #[command(about = "Print the EXIF tags of an image")]
    Exif {
        #[arg(help = "Image file path")]
        input: PathBuf,

        #[arg(long, help = "Print tags as JSON")]
        json: bool,
    },

    #[command(about = "Rewrite an image without any metadata")]
    Strip {
        #[arg(help = "Input image file path")]
        input: PathBuf,

        #[arg(help = "Output image file path")]
        output: PathBuf,
    },

    #[command(
        about = "Display image information",
        long_about = "Analyze and display information about an image file including \
                      dimensions, format, file size, metadata, and suggestions."
    )]
    Info {
        #[arg(help = "Image file path to analyze")]
        input: PathBuf,

        #[arg(long, help = "Print information as JSON")]
        json: bool,
    },
}
