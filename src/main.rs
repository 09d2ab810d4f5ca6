// ABOUTME: Main entry point for the deckhand program.
// ABOUTME: Provides the CLI for building, validating and theming presentations.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use deckhand::theme::{self, PresetName, ThemeInput};
use deckhand::{outline, table, utils, CancelToken, Config, ImageData, MediaLibrary, Session};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a PPTX file from a JSON outline
    Build(BuildArgs),

    /// Check a JSON outline without exporting it
    Validate(ValidateArgs),

    /// Print a preset theme as JSON
    Theme(ThemeArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Path to the JSON outline
    #[arg(short, long)]
    input: PathBuf,

    /// Path to the output PPTX file
    #[arg(short, long)]
    output: PathBuf,

    /// Preset theme: professional, minimalist or creative
    #[arg(long, conflicts_with = "theme_file")]
    preset: Option<String>,

    /// JSON theme file
    #[arg(long)]
    theme_file: Option<PathBuf>,

    /// Directory of images referenced by the outline
    #[arg(long)]
    media: Option<PathBuf>,

    /// Logo placed on every slide
    #[arg(long)]
    logo: Option<PathBuf>,

    /// JSON file with the tables dataset charts read from
    #[arg(long)]
    tables: Option<PathBuf>,

    /// Presentation title
    #[arg(long)]
    title: Option<String>,

    /// Aspect ratio: 4:3 or 16:9
    #[arg(long)]
    aspect_ratio: Option<String>,
}

#[derive(Args)]
struct ValidateArgs {
    /// Path to the JSON outline
    #[arg(short, long)]
    input: PathBuf,

    /// Directory of images referenced by the outline
    #[arg(long)]
    media: Option<PathBuf>,
}

#[derive(Args)]
struct ThemeArgs {
    /// Preset to print
    #[arg(long, default_value = "professional")]
    preset: String,
}

fn load_media(dir: &Option<PathBuf>) -> anyhow::Result<MediaLibrary> {
    match dir {
        Some(dir) => Ok(MediaLibrary::load_dir(dir)?),
        None => Ok(MediaLibrary::new()),
    }
}

fn build(args: &BuildArgs) -> anyhow::Result<()> {
    let config = Config::from_env();
    let mut session = Session::from_config(config.clone());

    let media = load_media(&args.media)?;
    let json = utils::read_text_file(&args.input)?;
    session.import_json(&json, &media)?;

    let theme = match (&args.preset, &args.theme_file) {
        (Some(preset), _) => Some(ThemeInput::Preset(preset.parse::<PresetName>()?)),
        (None, Some(path)) => {
            let json = utils::read_text_file(path)?;
            Some(ThemeInput::Custom(serde_json::from_str(&json).with_context(|| {
                format!("Invalid theme file {:?}", path)
            })?))
        }
        (None, None) => None,
    };
    if let Some(theme) = theme {
        session.set_theme(theme)?;
    }

    if let Some(path) = &args.logo {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "logo".to_string());
        let logo = ImageData::new(&name, utils::read_binary_file(path)?)?;
        session.set_logo(Some(logo))?;
    }

    let tables = match &args.tables {
        Some(path) => table::bindings_from_json(&utils::read_text_file(path)?)?,
        None => Default::default(),
    };

    let export_config = config.get_export_config(
        args.title.clone(),
        args.aspect_ratio.clone(),
        None,
        None,
    );
    deckhand::export_to_file(
        session.document(),
        &tables,
        &export_config,
        &args.output,
        &CancelToken::new(),
    )?;
    println!(
        "Built {} slides: {:?}",
        session.document().len(),
        args.output
    );
    Ok(())
}

fn validate(args: &ValidateArgs) -> anyhow::Result<()> {
    let media = load_media(&args.media)?;
    let json = utils::read_text_file(&args.input)?;
    let document = outline::parse_with_media(&json, &media)?;
    info!("Outline {:?} is valid", args.input);
    println!("Outline is valid: {} slides", document.len());
    Ok(())
}

fn print_theme(args: &ThemeArgs) -> anyhow::Result<()> {
    let preset: PresetName = args.preset.parse()?;
    println!("{}", theme::to_json(&preset.theme())?);
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Build(args)) => build(args),
        Some(Commands::Validate(args)) => validate(args),
        Some(Commands::Theme(args)) => print_theme(args),
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
