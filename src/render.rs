// ABOUTME: Browser rendering module for the bibslide application
// ABOUTME: Captures PNG images of the slide surface using a headless browser

use crate::errors::{Result, SlideError};
use crate::preview::{Surface, SURFACE_CLASS};
use crate::utils;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use log::{debug, info, warn};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Configuration for browser capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    pub timeout_ms: u64,
    pub browser_path: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            timeout_ms: 30000, // 30 seconds
            browser_path: None,
        }
    }
}

fn browser_error(message: String) -> SlideError {
    SlideError::BrowserError {
        message,
        source: None,
    }
}

fn launch_browser(config: &CaptureConfig) -> Result<Browser> {
    let mut launch_options_builder = LaunchOptionsBuilder::default();
    launch_options_builder.window_size(Some((config.width, config.height)));
    launch_options_builder.headless(true);

    if let Some(browser_path) = &config.browser_path {
        launch_options_builder.path(Some(browser_path.into()));
    } else if let Ok(path) = env::var("BROWSER_PATH") {
        if !path.is_empty() {
            launch_options_builder.path(Some(path.into()));
        }
    }

    let launch_options = launch_options_builder
        .build()
        .map_err(|e| browser_error(format!("Failed to build browser options: {:?}", e)))?;

    info!("Launching headless browser");
    Browser::new(launch_options).map_err(|e| browser_error(format!("Failed to launch browser: {}", e)))
}

/// Load one surface document and screenshot the surface element
fn capture_one(tab: &Arc<Tab>, surface: &Surface, config: &CaptureConfig) -> Result<Vec<u8>> {
    let html_path = env::temp_dir().join(format!("bibslide-{}.html", uuid::Uuid::new_v4()));
    fs::write(&html_path, surface.to_html(config.width, config.height))?;
    let url = format!("file://{}", html_path.to_string_lossy());
    debug!("Opening surface at URL: {}", url);

    let captured = (|| -> Result<Vec<u8>> {
        tab.navigate_to(&url)
            .map_err(|e| browser_error(format!("Failed to navigate to surface: {}", e)))?;
        tab.wait_until_navigated()
            .map_err(|e| browser_error(format!("Navigation failed: {}", e)))?;
        let element = tab
            .wait_for_element_with_custom_timeout(
                &format!(".{}", SURFACE_CLASS),
                Duration::from_millis(config.timeout_ms),
            )
            .map_err(|e| browser_error(format!("Slide surface not found: {}", e)))?;
        element
            .capture_screenshot(CaptureScreenshotFormatOption::Png)
            .map_err(|e| browser_error(format!("Failed to capture screenshot: {}", e)))
    })();

    utils::remove_quietly(&html_path);
    captured
}

fn capture_all(
    surfaces: &[(usize, Surface)],
    stem: &str,
    output_dir: &Path,
    config: &CaptureConfig,
) -> Result<Vec<PathBuf>> {
    let browser = launch_browser(config)?;
    let tab = browser
        .new_tab()
        .map_err(|e| browser_error(format!("Failed to create new tab: {}", e)))?;

    let mut output_files = Vec::with_capacity(surfaces.len());
    for (index, surface) in surfaces {
        let output_file = png_path(output_dir, stem, *index);
        info!("Rendering {:?}", output_file);
        if let Some(path) = store_capture(output_file, *index, capture_one(&tab, surface, config)) {
            output_files.push(path);
        }
    }
    Ok(output_files)
}

/// Write one captured slide. Failures are logged and leave no file, so
/// later slides are still attempted.
fn store_capture(output_file: PathBuf, index: usize, captured: Result<Vec<u8>>) -> Option<PathBuf> {
    let png = match captured {
        Ok(png) => png,
        Err(e) => {
            warn!("Failed to capture slide {}: {}", index + 1, e);
            return None;
        }
    };
    match utils::write_atomically(&output_file, &png) {
        Ok(()) => Some(output_file),
        Err(e) => {
            warn!("Failed to write {:?}: {}", output_file, e);
            None
        }
    }
}

/// `{stem}_{n}.png` with a 1-based slide number
pub fn png_path(output_dir: &Path, stem: &str, index: usize) -> PathBuf {
    output_dir.join(format!("{}_{}.png", stem, index + 1))
}

/// Capture slide surfaces as PNG files.
///
/// `surfaces` pairs each surface with its 0-based slide index. Capture
/// failures are logged and produce no file; they never fail the export.
pub fn capture_surfaces(
    surfaces: &[(usize, Surface)],
    stem: &str,
    output_dir: &Path,
    config: &CaptureConfig,
) -> Result<Vec<PathBuf>> {
    if surfaces.is_empty() {
        return Ok(Vec::new());
    }
    utils::ensure_directory_exists(output_dir)?;

    let start_time = Instant::now();
    match capture_all(surfaces, stem, output_dir, config) {
        Ok(files) => {
            info!(
                "Rendering complete. Captured {} slides in {:.2} seconds",
                files.len(),
                start_time.elapsed().as_secs_f64()
            );
            Ok(files)
        }
        Err(e) => {
            warn!("PNG capture failed: {}", e);
            Ok(Vec::new())
        }
    }
}
