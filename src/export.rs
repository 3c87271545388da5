// ABOUTME: Export dispatch for the bibslide application
// ABOUTME: Loads the background once and writes each output format atomically

use crate::chunk::Deck;
use crate::content::ExportOptions;
use crate::errors::{Result, SlideError};
use crate::html::generate_html;
use crate::pdf::build_pdf;
use crate::pptx::build_pptx;
use crate::preview::Surface;
use crate::render::{capture_surfaces, CaptureConfig};
use crate::resources::BackgroundImage;
use crate::utils::{output_path, write_atomically};
use log::info;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pptx,
    Pdf,
    Html,
    Png,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pptx => "pptx",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
            ExportFormat::Png => "png",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pptx" => Ok(ExportFormat::Pptx),
            "pdf" => Ok(ExportFormat::Pdf),
            "html" => Ok(ExportFormat::Html),
            "png" => Ok(ExportFormat::Png),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Resolve the configured background image, if any
pub fn load_background(options: &ExportOptions) -> Result<Option<BackgroundImage>> {
    match options.style.bg_image.as_deref().map(str::trim) {
        Some(reference) if !reference.is_empty() => Ok(Some(BackgroundImage::load(reference)?)),
        _ => Ok(None),
    }
}

fn write_document(deck: &Deck, output_dir: &Path, format: ExportFormat, bytes: &[u8]) -> Result<PathBuf> {
    let path = output_path(output_dir, &deck.stem, format.extension());
    write_atomically(&path, bytes)?;
    info!("{} written: {:?}", format.extension().to_uppercase(), path);
    Ok(path)
}

/// `{stem}.pptx`, or nothing for an empty deck
pub fn export_pptx(deck: &Deck, options: &ExportOptions, output_dir: &Path) -> Result<Option<PathBuf>> {
    if deck.is_empty() {
        return Ok(None);
    }
    let background = load_background(options)?;
    let bytes = build_pptx(deck, options, background.as_ref())?;
    write_document(deck, output_dir, ExportFormat::Pptx, &bytes).map(Some)
}

/// `{stem}.pdf`, or nothing for an empty deck
pub fn export_pdf(deck: &Deck, options: &ExportOptions, output_dir: &Path) -> Result<Option<PathBuf>> {
    if deck.is_empty() {
        return Ok(None);
    }
    let background = load_background(options)?;
    let bytes = build_pdf(deck, options, background.as_ref())?;
    write_document(deck, output_dir, ExportFormat::Pdf, &bytes).map(Some)
}

/// `{stem}.html`, or nothing for an empty deck
pub fn export_html(deck: &Deck, options: &ExportOptions, output_dir: &Path) -> Result<Option<PathBuf>> {
    if deck.is_empty() {
        return Ok(None);
    }
    let background = load_background(options)?;
    let html = generate_html(deck, options, background.as_ref());
    write_document(deck, output_dir, ExportFormat::Html, html.as_bytes()).map(Some)
}

/// `{stem}_{n}.png` for one slide, or for every slide when `index` is `None`
pub fn export_png(
    deck: &Deck,
    options: &ExportOptions,
    output_dir: &Path,
    index: Option<usize>,
    capture: &CaptureConfig,
) -> Result<Vec<PathBuf>> {
    if deck.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(index) = index {
        if index >= deck.slides.len() {
            return Err(SlideError::ValidationError(format!(
                "Slide {} does not exist, the deck has {} slides",
                index + 1,
                deck.slides.len()
            )));
        }
    }

    let background = load_background(options)?.map(|image| image.to_data_uri());
    let surfaces: Vec<(usize, Surface)> = deck
        .slides
        .iter()
        .enumerate()
        .filter(|(i, _)| index.map_or(true, |wanted| wanted == *i))
        .map(|(i, slide)| {
            (
                i,
                Surface::new(&slide.text, &options.style, background.as_deref(), false),
            )
        })
        .collect();

    capture_surfaces(&surfaces, &deck.stem, output_dir, capture)
}

/// Export a deck in one format, returning the files written
pub fn export(
    format: ExportFormat,
    deck: &Deck,
    options: &ExportOptions,
    output_dir: &Path,
    capture: &CaptureConfig,
) -> Result<Vec<PathBuf>> {
    let written = match format {
        ExportFormat::Pptx => export_pptx(deck, options, output_dir)?.into_iter().collect(),
        ExportFormat::Pdf => export_pdf(deck, options, output_dir)?.into_iter().collect(),
        ExportFormat::Html => export_html(deck, options, output_dir)?.into_iter().collect(),
        ExportFormat::Png => export_png(deck, options, output_dir, None, capture)?,
    };
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::build_deck;
    use crate::content::{BibleContent, ChunkingParameters, SourceContent};
    use tempfile::TempDir;

    fn empty_deck() -> Deck {
        build_deck(
            &SourceContent::Bible(BibleContent {
                book: "John".to_string(),
                chapter: 3,
                verses: vec![],
                translation: None,
            }),
            &ChunkingParameters::default(),
        )
    }

    #[test]
    fn test_empty_deck_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let options = ExportOptions::default();
        let capture = CaptureConfig::default();
        for format in [
            ExportFormat::Pptx,
            ExportFormat::Pdf,
            ExportFormat::Html,
            ExportFormat::Png,
        ] {
            let written = export(format, &empty_deck(), &options, dir.path(), &capture).unwrap();
            assert!(written.is_empty());
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PDF".parse::<ExportFormat>(), Ok(ExportFormat::Pdf));
        assert!("docx".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Pptx.to_string(), "pptx");
    }

    #[test]
    fn test_blank_background_reference_is_ignored() {
        let mut options = ExportOptions::default();
        options.style.bg_image = Some("  ".to_string());
        assert!(load_background(&options).unwrap().is_none());
    }
}
