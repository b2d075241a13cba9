//! cyan - layered color-managed canvas tool
//!
//! Opens images and projects, edits layer stacks, converts between RGB, CMYK
//! and gray working spaces and manages ICC profiles.

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use cyan_canvas::Settings;
use cyan_core::Colorspace;
use cyan_icc::Intent;
use cyan_ops::CompositeOp;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "cyan")]
#[command(author, version, about = "Layered color-managed canvas tool")]
#[command(long_about = "
Builds layered canvases from images, composites them and converts them
between RGB, CMYK and gray using ICC profiles.

Examples:
  cyan info photo.jpg                      # Canvas, profile and layers
  cyan new poster.cyan -W 2480 -H 3508 -c cmyk --profile coated.icc
  cyan layer add poster.cyan logo.png --at 1
  cyan layer set poster.cyan 1 --composite multiply --opacity 0.6
  cyan convert poster.cyan rgb -o poster-rgb.cyan --intent relative
  cyan flatten poster.cyan poster.tif
  cyan profiles list --colorspace cmyk
  cyan settings set-profile cmyk coated.icc
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (repeat for more)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show canvas, profile and layer information
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// List, describe and edit ICC profiles
    #[command(subcommand)]
    Profiles(ProfilesCommand),

    /// Create a blank project
    New(NewArgs),

    /// Edit the layers of a project
    #[command(subcommand, visible_alias = "l")]
    Layer(LayerCommand),

    /// Composite all visible layers into one image
    #[command(visible_alias = "f")]
    Flatten(FlattenArgs),

    /// Convert an image or project to another colorspace
    #[command(visible_alias = "c")]
    Convert(ConvertArgs),

    /// Show or change persisted settings
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Args)]
struct InfoArgs {
    /// Images or projects
    #[arg(required = true)]
    input: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum ProfilesCommand {
    /// List installed profiles for a colorspace
    List(ProfilesListArgs),
    /// Show profile metadata
    Describe(ProfilesDescribeArgs),
    /// Rewrite description and/or copyright
    Edit(ProfilesEditArgs),
}

#[derive(Args)]
struct ProfilesListArgs {
    /// Colorspace: rgb, cmyk, gray
    #[arg(short, long, default_value = "rgb")]
    colorspace: Colorspace,

    /// Scan these directories instead of the system locations
    #[arg(short, long)]
    dir: Vec<PathBuf>,
}

#[derive(Args)]
struct ProfilesDescribeArgs {
    /// Profile files
    #[arg(required = true)]
    input: Vec<PathBuf>,
}

#[derive(Args)]
struct ProfilesEditArgs {
    /// Source profile
    input: PathBuf,

    /// Output profile (defaults to rewriting the source)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// New description
    #[arg(short, long)]
    description: Option<String>,

    /// New copyright
    #[arg(long)]
    copyright: Option<String>,
}

#[derive(Args)]
struct NewArgs {
    /// Output project
    output: PathBuf,

    /// Width in pixels
    #[arg(short = 'W', long)]
    width: u32,

    /// Height in pixels
    #[arg(short = 'H', long)]
    height: u32,

    /// Colorspace: rgb, cmyk, gray
    #[arg(short, long, default_value = "rgb")]
    colorspace: Colorspace,

    /// ICC profile (defaults to the configured one)
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Canvas label
    #[arg(short, long)]
    label: Option<String>,
}

#[derive(Subcommand)]
enum LayerCommand {
    /// Add an image as a new layer
    Add(LayerAddArgs),
    /// Remove the layer at a position
    Remove(LayerRemoveArgs),
    /// Change layer properties
    Set(LayerSetArgs),
    /// Move a layer to another position
    Move(LayerMoveArgs),
    /// Write one layer to an image file
    Export(LayerExportArgs),
}

#[derive(Args)]
struct LayerAddArgs {
    /// Project to edit
    project: PathBuf,

    /// Image to add
    image: PathBuf,

    /// Stacking position (default: top)
    #[arg(long)]
    at: Option<usize>,
}

#[derive(Args)]
struct LayerRemoveArgs {
    /// Project to edit
    project: PathBuf,

    /// Layer position (0 = bottom)
    position: usize,
}

#[derive(Args)]
struct LayerSetArgs {
    /// Project to edit
    project: PathBuf,

    /// Layer position (0 = bottom)
    position: usize,

    /// Composite operator (over, multiply, screen, ...)
    #[arg(long)]
    composite: Option<CompositeOp>,

    /// Opacity 0.0-1.0
    #[arg(long)]
    opacity: Option<f64>,

    /// Visibility
    #[arg(long)]
    visible: Option<bool>,

    /// Layer label
    #[arg(long)]
    label: Option<String>,

    /// Offset as X,Y
    #[arg(long, value_parser = commands::parse_offset, allow_hyphen_values = true)]
    offset: Option<(i32, i32)>,
}

#[derive(Args)]
struct LayerMoveArgs {
    /// Project to edit
    project: PathBuf,

    /// Current position
    from: usize,

    /// New position
    to: usize,
}

#[derive(Args)]
struct LayerExportArgs {
    /// Project to read
    project: PathBuf,

    /// Layer position (0 = bottom)
    position: usize,

    /// Output image (format from extension)
    output: PathBuf,
}

#[derive(Args)]
struct FlattenArgs {
    /// Image or project
    input: PathBuf,

    /// Output image (format from extension)
    output: PathBuf,
}

#[derive(Args)]
struct ConvertArgs {
    /// Image or project
    input: PathBuf,

    /// Target colorspace: rgb, cmyk, gray
    colorspace: Colorspace,

    /// Output project (defaults to the input project, or the input with a .cyan extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Destination profile (defaults to the configured one)
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Rendering intent (name or code)
    #[arg(short, long)]
    intent: Option<Intent>,

    /// Black-point compensation: true or false (defaults to the configured one)
    #[arg(long)]
    black_point: Option<bool>,
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the current settings
    Show,
    /// Set or clear the default profile for a colorspace
    SetProfile(SetProfileArgs),
    /// Set the default rendering intent and black-point compensation
    SetIntent(SetIntentArgs),
}

#[derive(Args)]
struct SetProfileArgs {
    /// Colorspace: rgb, cmyk, gray
    colorspace: Colorspace,

    /// Profile path; omit to clear
    path: Option<PathBuf>,
}

#[derive(Args)]
struct SetIntentArgs {
    /// Rendering intent (name or code)
    intent: Intent,

    /// Black-point compensation
    #[arg(long)]
    blackpoint: Option<bool>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::level_filters::LevelFilter::WARN,
        1 => tracing::level_filters::LevelFilter::INFO,
        2 => tracing::level_filters::LevelFilter::DEBUG,
        _ => tracing::level_filters::LevelFilter::TRACE,
    };
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn settings_path(cli: &Cli) -> Option<PathBuf> {
    cli.settings.clone().or_else(Settings::default_path)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings_path = settings_path(&cli);
    let settings = match &settings_path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings: {}", path.display()))?,
        None => Settings::default(),
    };

    match cli.command {
        Commands::Info(args) => commands::info::run(args, settings),
        Commands::Profiles(cmd) => commands::profiles::run(cmd),
        Commands::New(args) => commands::new::run(args, settings),
        Commands::Layer(cmd) => commands::layer::run(cmd, settings),
        Commands::Flatten(args) => commands::flatten::run(args, settings),
        Commands::Convert(args) => commands::convert::run(args, settings),
        Commands::Settings(cmd) => commands::settings::run(cmd, settings, settings_path),
    }
}
