// ABOUTME: Data model for slide sources, style options and chunking parameters
// ABOUTME: Loads bible passages, songs and pasted text from files

use crate::color::Theme;
use crate::errors::{SlideError, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub number: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibleContent {
    pub book: String,
    pub chapter: u32,
    #[serde(default)]
    pub verses: Vec<Verse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongPart {
    #[serde(default)]
    pub part: String,
    #[serde(default)]
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongContent {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default)]
    pub lyrics: Vec<SongPart>,
}

/// Which chunk size governs pasted text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasteType {
    #[default]
    Bible,
    Song,
}

impl FromStr for PasteType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bible" => Ok(PasteType::Bible),
            "song" => Ok(PasteType::Song),
            other => Err(format!("Unknown paste type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastedContent {
    pub text: String,
    #[serde(default)]
    pub paste_type: PasteType,
}

/// The single active slide source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SourceContent {
    Bible(BibleContent),
    Song(SongContent),
    #[serde(rename = "paste")]
    Pasted(PastedContent),
}

/// The three input modes, one per `SourceContent` variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Bible,
    Song,
    Paste,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Bible => "bible",
            Mode::Song => "song",
            Mode::Paste => "paste",
        };
        f.write_str(name)
    }
}

impl SourceContent {
    pub fn mode(&self) -> Mode {
        match self {
            SourceContent::Bible(_) => Mode::Bible,
            SourceContent::Song(_) => Mode::Song,
            SourceContent::Pasted(_) => Mode::Paste,
        }
    }

    /// Load a bible passage from a JSON file
    pub fn load_bible(path: &Path) -> Result<Self> {
        let bible: BibleContent = read_json(path)?;
        info!(
            "Loaded {} {} with {} verses",
            bible.book,
            bible.chapter,
            bible.verses.len()
        );
        Ok(SourceContent::Bible(bible))
    }

    /// Load a song from a JSON file
    pub fn load_song(path: &Path) -> Result<Self> {
        let song: SongContent = read_json(path)?;
        info!("Loaded song {:?} with {} parts", song.title, song.lyrics.len());
        Ok(SourceContent::Song(song))
    }

    /// Load pasted text from a plain text file
    pub fn load_pasted(path: &Path, paste_type: PasteType) -> Result<Self> {
        if !path.exists() {
            return Err(SlideError::PathNotFoundError(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        info!("Loaded {} bytes of pasted text", text.len());
        Ok(SourceContent::Pasted(PastedContent { text, paste_type }))
    }
}

/// How a source file on disk is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Bible,
    Song,
    Paste(PasteType),
}

/// A source file that can be reloaded, e.g. when it changes on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub kind: SourceKind,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, kind: SourceKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn load(&self) -> Result<SourceContent> {
        match self.kind {
            SourceKind::Bible => SourceContent::load_bible(&self.path),
            SourceKind::Song => SourceContent::load_song(&self.path),
            SourceKind::Paste(paste_type) => SourceContent::load_pasted(&self.path, paste_type),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(SlideError::PathNotFoundError(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Visual configuration applied uniformly to the preview and every export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOptions {
    pub font: String,
    pub font_size: u32,
    pub bg_color: String,
    pub text_color: Option<String>,
    pub brightness: i32,
    pub bg_image: Option<String>,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            font: "Arial".to_string(),
            font_size: 32,
            bg_color: "#ffffff".to_string(),
            text_color: None,
            brightness: 100,
            bg_image: None,
        }
    }
}

impl StyleOptions {
    /// Background color after the brightness adjustment
    pub fn adjusted_background(&self) -> String {
        crate::color::adjust_brightness(&self.bg_color, self.clamped_brightness())
    }

    /// Explicit text color, or the one derived from the background
    pub fn text_color(&self) -> String {
        crate::color::resolve_text_color(
            self.text_color.as_deref(),
            &self.bg_color,
            self.clamped_brightness(),
        )
    }

    /// Brightness clamped to its documented 1..=100 range
    pub fn clamped_brightness(&self) -> i32 {
        self.brightness.clamp(1, 100)
    }
}

/// Group sizes for each pagination policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingParameters {
    pub verses_per_slide: usize,
    pub lines_per_slide: usize,
}

impl Default for ChunkingParameters {
    fn default() -> Self {
        Self {
            verses_per_slide: 1,
            lines_per_slide: 2,
        }
    }
}

impl ChunkingParameters {
    pub fn new(verses_per_slide: usize, lines_per_slide: usize) -> Self {
        Self {
            verses_per_slide,
            lines_per_slide,
        }
    }

    pub fn verses(&self) -> usize {
        self.verses_per_slide.max(1)
    }

    pub fn lines(&self) -> usize {
        self.lines_per_slide.max(1)
    }
}

/// Everything an exporter needs besides the slides themselves
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub style: StyleOptions,
    pub theme: Theme,
    pub church_name: Option<String>,
}

impl ExportOptions {
    pub fn accent(&self) -> &'static str {
        self.theme.accent()
    }

    pub fn church_name(&self) -> Option<&str> {
        self.church_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_source_round_trips_with_mode_tag() {
        let json = r#"{"mode":"paste","text":"a\nb","paste_type":"song"}"#;
        let source: SourceContent = serde_json::from_str(json).unwrap();
        assert_eq!(source.mode(), Mode::Paste);
        match source {
            SourceContent::Pasted(pasted) => assert_eq!(pasted.paste_type, PasteType::Song),
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn test_load_song_with_optional_fields_missing() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            r#"{"title":"Amazing Grace","lyrics":[{"part":"Verse 1","lines":["a","b"]}]}"#,
        )
        .unwrap();

        let source = SourceContent::load_song(file.path()).unwrap();
        match source {
            SourceContent::Song(song) => {
                assert_eq!(song.title, "Amazing Grace");
                assert!(song.author.is_none());
                assert_eq!(song.lyrics[0].lines, vec!["a", "b"]);
            }
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = SourceContent::load_bible(Path::new("/nonexistent/john3.json"));
        assert!(matches!(result, Err(SlideError::PathNotFoundError(_))));
    }

    #[test]
    fn test_style_defaults_from_partial_json() {
        let style: StyleOptions = serde_json::from_str(r##"{"bg_color":"#0f172a"}"##).unwrap();
        assert_eq!(style.font, "Arial");
        assert_eq!(style.font_size, 32);
        assert_eq!(style.text_color(), "#000000");

        let dimmed = StyleOptions {
            brightness: 70,
            ..style
        };
        assert_eq!(dimmed.text_color(), "#ffffff");
    }

    #[test]
    fn test_out_of_range_brightness_is_clamped_everywhere() {
        let style = |brightness| StyleOptions {
            bg_color: "#888888".to_string(),
            brightness,
            ..Default::default()
        };
        assert_eq!(style(0).adjusted_background(), style(1).adjusted_background());
        assert_eq!(style(0).text_color(), style(1).text_color());
        assert_eq!(style(150).adjusted_background(), "#888888");
        assert_eq!(style(150).text_color(), style(100).text_color());
        assert_eq!(style(150).clamped_brightness(), 100);
    }

    #[test]
    fn test_chunk_sizes_clamp_to_one() {
        let params = ChunkingParameters::new(0, 0);
        assert_eq!(params.verses(), 1);
        assert_eq!(params.lines(), 1);
    }

    #[test]
    fn test_blank_church_name_is_ignored() {
        let options = ExportOptions {
            church_name: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(options.church_name(), None);
    }
}
