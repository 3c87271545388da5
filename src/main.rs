// ABOUTME: Main entry point for the bibslide program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use anyhow::{anyhow, bail, Context};
use bibslide::lookup::DEFAULT_TRANSLATION;
use bibslide::{
    export, export_png, watch_source, CommandSpeech, Config, ExportFormat,
    ExportOptions, JsonFileStore, MemoryStore, Mode, PasteType, Preferences, PreferencesStore,
    Session, SourceFile, SourceKind, SuperSearchClient, Theme, WatchConfig,
};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export slides as a PowerPoint presentation
    Pptx(ExportArgs),

    /// Export slides as a PDF document
    Pdf(ExportArgs),

    /// Export slides as a standalone HTML slideshow
    Html(ExportArgs),

    /// Capture slides as PNG images with a headless browser
    Png(PngArgs),

    /// Print the text of the chunked slides
    Slides(SlidesArgs),

    /// Read a slide aloud with the text-to-speech command
    Say(SayArgs),

    /// Watch a source file and regenerate exports on change
    Watch(WatchArgs),
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct SourceInput {
    /// Bible passage JSON file
    #[arg(long)]
    bible: Option<PathBuf>,

    /// Song JSON file
    #[arg(long)]
    song: Option<PathBuf>,

    /// Plain text file with pasted lines
    #[arg(long)]
    paste: Option<PathBuf>,

    /// Passage reference or search terms fetched from the lookup service
    #[arg(long)]
    lookup: Option<String>,
}

#[derive(Args, Debug)]
struct SourceArgs {
    #[command(flatten)]
    input: SourceInput,

    /// How pasted text is paginated: 'bible' or 'song'
    #[arg(long, default_value = "bible")]
    paste_type: PasteType,

    /// Translation code used with --lookup
    #[arg(long, default_value = DEFAULT_TRANSLATION)]
    translation: String,
}

#[derive(Args, Debug)]
struct StyleArgs {
    /// Font family
    #[arg(long)]
    font: Option<String>,

    /// Base font size
    #[arg(long)]
    font_size: Option<u32>,

    /// Background color (hex)
    #[arg(long)]
    bg_color: Option<String>,

    /// Text color (hex), computed from the background when omitted
    #[arg(long)]
    text_color: Option<String>,

    /// Background brightness percent
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..=100))]
    brightness: Option<i32>,

    /// Background image: data URI, URL or local path
    #[arg(long)]
    bg_image: Option<String>,

    /// Accent theme: light, dark, worship, gold or nature
    #[arg(long)]
    theme: Option<Theme>,

    /// Church name shown on every slide
    #[arg(long)]
    church_name: Option<String>,

    /// Verses per slide for bible passages and pasted bible text
    #[arg(long)]
    verses_per_slide: Option<usize>,

    /// Lines per slide for songs and pasted song text
    #[arg(long)]
    lines_per_slide: Option<usize>,

    /// Store these style options as the new defaults
    #[arg(long)]
    save_style: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    style: StyleArgs,

    /// Directory receiving the exported file
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Args, Debug)]
struct PngArgs {
    #[command(flatten)]
    export: ExportArgs,

    /// Capture only this slide (1-based)
    #[arg(long)]
    index: Option<usize>,

    /// Capture width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Capture height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Browser timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Args, Debug)]
struct SlidesArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    style: StyleArgs,

    /// Print only this slide (1-based)
    #[arg(long)]
    index: Option<usize>,
}

#[derive(Args, Debug)]
struct SayArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    style: StyleArgs,

    /// Slide to read (1-based)
    #[arg(long, default_value_t = 1)]
    index: usize,
}

#[derive(Args, Debug)]
struct WatchArgs {
    #[command(flatten)]
    export: ExportArgs,

    /// Formats to regenerate
    #[arg(long, value_delimiter = ',', default_value = "html")]
    formats: Vec<ExportFormat>,

    /// Debounce time in milliseconds
    #[arg(long, default_value_t = 500)]
    debounce_ms: u64,

    /// Serve the HTML export over HTTP
    #[arg(long)]
    serve: bool,

    /// Port for the HTTP server
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

fn preferences_store(config: &Config) -> Box<dyn PreferencesStore> {
    if let Some(path) = &config.preferences_path {
        return Box::new(JsonFileStore::new(path));
    }
    match JsonFileStore::in_config_dir() {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("Preferences will not persist: {}", e);
            Box::new(MemoryStore::new())
        }
    }
}

/// Stored preferences with the command-line overrides applied
fn merged_preferences(store: &dyn PreferencesStore, args: &StyleArgs) -> Preferences {
    let mut preferences = store.load().unwrap_or_else(|e| {
        warn!("Failed to load preferences, using defaults: {}", e);
        Preferences::default()
    });

    let style = &mut preferences.style;
    if let Some(font) = &args.font {
        style.font = font.clone();
    }
    if let Some(size) = args.font_size {
        style.font_size = size;
    }
    if let Some(color) = &args.bg_color {
        style.bg_color = color.clone();
    }
    if let Some(color) = &args.text_color {
        style.text_color = Some(color.clone());
    }
    if let Some(brightness) = args.brightness {
        style.brightness = brightness;
    }
    if let Some(image) = &args.bg_image {
        style.bg_image = Some(image.clone());
    }
    if let Some(theme) = args.theme {
        preferences.theme = theme;
    }
    if let Some(name) = &args.church_name {
        preferences.church_name = Some(name.clone());
    }
    if let Some(verses) = args.verses_per_slide {
        preferences.chunking.verses_per_slide = verses;
    }
    if let Some(lines) = args.lines_per_slide {
        preferences.chunking.lines_per_slide = lines;
    }
    preferences
}

fn source_file(args: &SourceArgs) -> Option<SourceFile> {
    let input = &args.input;
    if let Some(path) = &input.bible {
        Some(SourceFile::new(path, SourceKind::Bible))
    } else if let Some(path) = &input.song {
        Some(SourceFile::new(path, SourceKind::Song))
    } else {
        input
            .paste
            .as_ref()
            .map(|path| SourceFile::new(path, SourceKind::Paste(args.paste_type)))
    }
}

/// Build a session holding the requested source and style
fn open_session(config: &Config, source: &SourceArgs, style: &StyleArgs) -> anyhow::Result<Session> {
    let store = preferences_store(config);
    let preferences = merged_preferences(store.as_ref(), style);
    if style.save_style {
        store
            .save(&preferences)
            .context("Failed to save style preferences")?;
    }

    let mut session = Session::from_preferences(Mode::Bible, &preferences);
    if let Some(file) = source_file(source) {
        session.set_source(file.load()?);
    } else if let Some(query) = &source.input.lookup {
        let client = SuperSearchClient::new(config.lookup_config(None, None))?;
        session.lookup(&client, query, &source.translation)?;
    }
    Ok(session)
}

fn run_export(config: &Config, format: ExportFormat, args: &ExportArgs) -> anyhow::Result<()> {
    let session = open_session(config, &args.source, &args.style)?;
    let Some(deck) = session.deck() else {
        println!("Nothing to export: the source has no content.");
        return Ok(());
    };

    let capture = config.capture_config(None, None, None);
    let written = export(format, &deck, session.options(), &args.output_dir, &capture)?;
    for path in written {
        println!("{} written: {:?}", format.extension().to_uppercase(), path);
    }
    Ok(())
}

fn run_png(config: &Config, args: &PngArgs) -> anyhow::Result<()> {
    let session = open_session(config, &args.export.source, &args.export.style)?;
    let Some(deck) = session.deck() else {
        println!("Nothing to export: the source has no content.");
        return Ok(());
    };

    let index = match args.index {
        Some(0) => bail!("Slide numbers start at 1"),
        Some(n) => Some(n - 1),
        None => None,
    };
    let capture = config.capture_config(args.width, args.height, args.timeout_ms);
    let written = export_png(
        &deck,
        session.options(),
        &args.export.output_dir,
        index,
        &capture,
    )?;

    if written.is_empty() {
        println!("No PNG written, see the log for capture errors.");
    }
    for path in written {
        println!("PNG written: {:?}", path);
    }
    Ok(())
}

fn run_slides(config: &Config, args: &SlidesArgs) -> anyhow::Result<()> {
    let mut session = open_session(config, &args.source, &args.style)?;
    let total = session.slides().len();
    if total == 0 {
        println!("No slides.");
        return Ok(());
    }

    let wanted: Vec<usize> = match args.index {
        Some(n) if (1..=total).contains(&n) => vec![n - 1],
        Some(n) => bail!("Slide {} does not exist, the deck has {} slides", n, total),
        None => (0..total).collect(),
    };

    for index in wanted {
        let presenter = session.presenter_mut();
        presenter.go_to(index);
        if args.index.is_none() {
            println!("--- {} ---", presenter.slide_counter());
        }
        println!("{}", presenter.current_text().unwrap_or_default());
    }
    Ok(())
}

fn run_say(config: &Config, args: &SayArgs) -> anyhow::Result<()> {
    let mut session = open_session(config, &args.source, &args.style)?;
    let total = session.slides().len();
    if args.index == 0 || args.index > total {
        bail!("Slide {} does not exist, the deck has {} slides", args.index, total);
    }

    let presenter = session.presenter_mut();
    presenter.go_to(args.index - 1);
    presenter.speak(&CommandSpeech::new(&config.tts_command));
    Ok(())
}

fn run_watch(config: &Config, args: &WatchArgs) -> anyhow::Result<()> {
    let file = source_file(&args.export.source)
        .ok_or_else(|| anyhow!("Watch mode needs a source file (--bible, --song or --paste)"))?;

    let store = preferences_store(config);
    let preferences = merged_preferences(store.as_ref(), &args.export.style);
    if args.export.style.save_style {
        store.save(&preferences)?;
    }

    let mut watch_config = WatchConfig::new(file, args.export.output_dir.clone());
    watch_config.formats = args.formats.clone();
    watch_config.params = preferences.chunking;
    watch_config.options = ExportOptions {
        style: preferences.style,
        theme: preferences.theme,
        church_name: preferences.church_name,
    };
    watch_config.debounce_ms = args.debounce_ms;
    watch_config.serve = args.serve;
    watch_config.port = args.port;

    info!("Starting watch mode for {:?}", watch_config.source.path);
    watch_source(watch_config, config)?;
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env();

    match &cli.command {
        Some(Commands::Pptx(args)) => run_export(&config, ExportFormat::Pptx, args),
        Some(Commands::Pdf(args)) => run_export(&config, ExportFormat::Pdf, args),
        Some(Commands::Html(args)) => run_export(&config, ExportFormat::Html, args),
        Some(Commands::Png(args)) => run_png(&config, args),
        Some(Commands::Slides(args)) => run_slides(&config, args),
        Some(Commands::Say(args)) => run_say(&config, args),
        Some(Commands::Watch(args)) => run_watch(&config, args),
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

