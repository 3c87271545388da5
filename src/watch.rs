// ABOUTME: Watch module for monitoring source changes and regenerating exports
// ABOUTME: Provides file watching, auto-regeneration and an optional local HTML server

use log::{debug, error, info};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{mpsc, Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};
use notify_debouncer_full::new_debouncer;
use tiny_http::{Header, Response, Server, StatusCode};

use crate::chunk::build_deck;
use crate::config::Config as AppConfig;
use crate::content::{ChunkingParameters, ExportOptions, SourceFile};
use crate::errors::{Result, SlideError};
use crate::export::{export, ExportFormat};
use crate::utils;

/// Configuration for watch mode
pub struct WatchConfig {
    /// Source file to watch
    pub source: SourceFile,

    /// Directory receiving every export
    pub output_dir: PathBuf,

    /// Formats regenerated on each change
    pub formats: Vec<ExportFormat>,

    pub params: ChunkingParameters,
    pub options: ExportOptions,

    /// Debounce time in milliseconds
    pub debounce_ms: u64,

    /// Whether to serve the HTML export using a local web server
    pub serve: bool,

    /// Port for local web server
    pub port: u16,
}

impl WatchConfig {
    pub fn new(source: SourceFile, output_dir: PathBuf) -> Self {
        Self {
            source,
            output_dir,
            formats: vec![ExportFormat::Html],
            params: ChunkingParameters::default(),
            options: ExportOptions::default(),
            debounce_ms: 500,
            serve: false,
            port: 8080,
        }
    }
}

/// HTML file served at "/", replaced after every regeneration
type ServedPage = Arc<RwLock<Option<PathBuf>>>;

fn content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("html") => "text/html; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("pdf") => "application/pdf",
        Some("pptx") => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
        _ => "application/octet-stream",
    }
}

/// Map a request path onto a file inside `root`. Paths escaping the root are
/// rejected.
fn resolve_request(root: &Path, url_path: &str, index: Option<&PathBuf>) -> Option<PathBuf> {
    let clean = url_path.split('?').next().unwrap_or_default();
    let clean = clean.trim_start_matches('/');
    if clean.is_empty() {
        return index.cloned();
    }
    let relative = Path::new(clean);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(relative))
}

/// Start a simple HTTP server for the output directory
fn start_server(output_dir: PathBuf, page: ServedPage, port: u16) -> Result<()> {
    let server = Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| SlideError::WatchError(format!("Failed to start HTTP server: {}", e)))?;

    thread::spawn(move || {
        info!("HTTP server listening on http://localhost:{}", port);
        println!("HTTP server listening on http://localhost:{}", port);

        for request in server.incoming_requests() {
            let index = page.read().ok().and_then(|p| p.clone());
            let file_path = resolve_request(&output_dir, request.url(), index.as_ref());
            debug!("Request for {:?} -> {:?}", request.url(), file_path);

            let response = match file_path.filter(|p| p.is_file()) {
                Some(path) => match fs::read(&path) {
                    Ok(content) => {
                        let mut response = Response::from_data(content);
                        if let Ok(header) =
                            Header::from_bytes("Content-Type", content_type(&path))
                        {
                            response = response.with_header(header);
                        }
                        response
                    }
                    Err(e) => {
                        error!("Failed to read file {:?}: {}", path, e);
                        Response::from_data(format!("Failed to read file: {}", e).into_bytes())
                            .with_status_code(StatusCode(500))
                    }
                },
                None => Response::from_data(b"404 Not Found".to_vec())
                    .with_status_code(StatusCode(404)),
            };

            if let Err(e) = request.respond(response) {
                error!("Failed to send response: {}", e);
            }
        }
    });

    Ok(())
}

/// Reload the source and write every configured format
fn regenerate_outputs(config: &WatchConfig, app_config: &AppConfig, page: &ServedPage) -> Result<()> {
    info!("Regenerating outputs...");

    let source = config.source.load()?;
    let deck = build_deck(&source, &config.params);
    if deck.is_empty() {
        info!("Source has no content, nothing to export");
        return Ok(());
    }

    let capture = app_config.capture_config(None, None, None);
    for format in &config.formats {
        let written = export(*format, &deck, &config.options, &config.output_dir, &capture)?;
        info!("{} regenerated: {:?}", format, written);

        if *format == ExportFormat::Html {
            if let (Some(html), Ok(mut served)) = (written.first(), page.write()) {
                *served = Some(html.clone());
            }
        }
    }

    Ok(())
}

/// Watch a source file and regenerate exports whenever it changes
pub fn watch_source(config: WatchConfig, app_config: &AppConfig) -> Result<()> {
    utils::validate_file_exists(&config.source.path)?;
    utils::ensure_directory_exists(&config.output_dir)?;

    let page: ServedPage = Arc::new(RwLock::new(None));

    // Initial generation
    regenerate_outputs(&config, app_config, &page)?;

    if config.serve {
        start_server(config.output_dir.clone(), page.clone(), config.port)?;
    }

    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(config.debounce_ms), None, tx)
        .map_err(|e| SlideError::WatchError(format!("Failed to create file watcher: {}", e)))?;

    // Watch the containing directory so editors that replace the file are seen
    let watch_path = match config.source.path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let abs_watch_path = utils::get_absolute_path(watch_path)?;
    let source_abs = utils::get_absolute_path(&config.source.path)?;

    debouncer
        .watcher()
        .watch(&abs_watch_path, RecursiveMode::NonRecursive)
        .map_err(|e| {
            SlideError::WatchError(format!(
                "Failed to start watching directory {:?}: {}",
                abs_watch_path, e
            ))
        })?;

    info!("Watching for changes in {:?}", config.source.path);
    println!(
        "Watching for changes in {:?} (Press Ctrl+C to stop)",
        config.source.path
    );

    let mut last_processed = Instant::now();
    for result in rx {
        match result {
            Ok(events) => {
                let relevant = events.iter().any(|event| {
                    event
                        .paths
                        .iter()
                        .any(|path| is_source_path(path, &config.source.path, &source_abs))
                });

                let now = Instant::now();
                if relevant
                    && now.duration_since(last_processed) > Duration::from_millis(config.debounce_ms)
                {
                    match regenerate_outputs(&config, app_config, &page) {
                        Ok(()) => {
                            info!("Regenerated outputs successfully");
                            last_processed = now;
                        }
                        Err(e) => error!("Failed to regenerate outputs: {}", e),
                    }
                }
            }
            Err(errors) => error!("Watch error: {:?}", errors),
        }
    }

    Ok(())
}

fn is_source_path(path: &Path, source: &Path, source_abs: &Path) -> bool {
    if path == source || path == source_abs {
        return true;
    }
    utils::get_absolute_path(path)
        .map(|abs| abs == source_abs)
        .unwrap_or(false)
}
