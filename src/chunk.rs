// ABOUTME: Slide chunker shared by the preview and every export renderer
// ABOUTME: Partitions verses, song parts and pasted lines into ordered slide groups

use crate::content::{
    BibleContent, ChunkingParameters, PasteType, PastedContent, SongContent, SourceContent, Verse,
};

/// One paginated block of text, rendered verbatim
pub type Slide = String;

/// File stem used when the source has no identity of its own
pub const PASTED_STEM: &str = "BibSlide_Pasted";

/// Opening slide of a song deck
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleSlide {
    pub title: String,
    pub author: Option<String>,
}

/// A chunked group together with the decorations exporters draw around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckSlide {
    pub text: Slide,
    /// Number of verses or lines in the group
    pub units: usize,
    /// Song part label (verse, chorus...)
    pub label: Option<String>,
    /// Reference or attribution caption drawn under the text
    pub caption: Option<String>,
}

impl DeckSlide {
    /// Groups holding more than two units are drawn with a smaller font
    pub fn is_dense(&self) -> bool {
        self.units > 2
    }
}

/// The structured result of chunking a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    pub title: Option<TitleSlide>,
    pub slides: Vec<DeckSlide>,
    pub stem: String,
}

impl Deck {
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Slide texts in order, identical to `chunk`
    pub fn texts(&self) -> Vec<Slide> {
        self.slides.iter().map(|s| s.text.clone()).collect()
    }

    /// Number of pages an export produces, title slide included
    pub fn page_count(&self) -> usize {
        self.slides.len() + usize::from(self.title.is_some())
    }
}

/// Partition a source into slide texts.
///
/// Pure and deterministic: the same source and parameters always produce the
/// same sequence, and an empty source produces no slides.
pub fn chunk(source: &SourceContent, params: &ChunkingParameters) -> Vec<Slide> {
    build_deck(source, params).texts()
}

/// Partition a source into a deck with per-slide decorations
pub fn build_deck(source: &SourceContent, params: &ChunkingParameters) -> Deck {
    match source {
        SourceContent::Bible(bible) => bible_deck(bible, params.verses()),
        SourceContent::Song(song) => song_deck(song, params.lines()),
        SourceContent::Pasted(pasted) => {
            let size = match pasted.paste_type {
                PasteType::Bible => params.verses(),
                PasteType::Song => params.lines(),
            };
            pasted_deck(pasted, size)
        }
    }
}

fn bible_deck(bible: &BibleContent, size: usize) -> Deck {
    let slides = bible
        .verses
        .chunks(size)
        .map(|group| DeckSlide {
            text: group
                .iter()
                .map(|v| format!("{}. {}", v.number, v.text))
                .collect::<Vec<_>>()
                .join("\n\n"),
            units: group.len(),
            label: None,
            caption: Some(verse_reference(bible, group)),
        })
        .collect();

    Deck {
        title: None,
        slides,
        stem: sanitize_stem(&format!("{}_{}", bible.book, bible.chapter)),
    }
}

/// "John 3:16" or "John 3:16-17" for a group of verses
fn verse_reference(bible: &BibleContent, group: &[Verse]) -> String {
    let first = group.first().map(|v| v.number).unwrap_or_default();
    match group.last() {
        Some(last) if group.len() > 1 => {
            format!("{} {}:{}-{}", bible.book, bible.chapter, first, last.number)
        }
        _ => format!("{} {}:{}", bible.book, bible.chapter, first),
    }
}

fn song_deck(song: &SongContent, size: usize) -> Deck {
    let caption = format!(
        "{} — {}",
        song.title,
        song.author.as_deref().unwrap_or_default()
    );

    // Groups restart at every part boundary.
    let slides: Vec<DeckSlide> = song
        .lyrics
        .iter()
        .flat_map(|part| {
            let label = Some(part.part.trim())
                .filter(|p| !p.is_empty())
                .map(str::to_string);
            let caption = caption.clone();
            part.lines.chunks(size).map(move |group| DeckSlide {
                text: group.join("\n"),
                units: group.len(),
                label: label.clone(),
                caption: Some(caption.clone()),
            })
        })
        .collect();

    Deck {
        title: if slides.is_empty() {
            None
        } else {
            Some(TitleSlide {
                title: song.title.clone(),
                author: song
                    .author
                    .clone()
                    .filter(|author| !author.trim().is_empty()),
            })
        },
        slides,
        stem: sanitize_stem(&whitespace_to_underscores(&song.title)),
    }
}

fn pasted_deck(pasted: &PastedContent, size: usize) -> Deck {
    let lines: Vec<&str> = pasted
        .text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect();

    let slides = lines
        .chunks(size)
        .map(|group| DeckSlide {
            text: group.join("\n"),
            units: group.len(),
            label: None,
            caption: None,
        })
        .collect();

    Deck {
        title: None,
        slides,
        stem: PASTED_STEM.to_string(),
    }
}

fn whitespace_to_underscores(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut in_space = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Replace characters that are not allowed in file names
fn sanitize_stem(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.trim_matches('_').is_empty() {
        PASTED_STEM.to_string()
    } else {
        cleaned
    }
}
