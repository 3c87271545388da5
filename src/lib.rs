// ABOUTME: Library module for the bibslide program.
// ABOUTME: Paginates scripture, songs and pasted text into slides and exports them.

// Reexport modules
pub mod chunk;
pub mod color;
pub mod config;
pub mod content;
pub mod errors;
pub mod export;
pub mod html;
pub mod lookup;
pub mod pdf;
pub mod pptx;
pub mod preview;
pub mod render;
pub mod resources;
pub mod session;
pub mod store;
pub mod utils;
pub mod watch;

// Reexport common types and functions
pub use chunk::{build_deck, chunk, Deck, DeckSlide, Slide, TitleSlide};
pub use color::{adjust_brightness, Theme};
pub use config::Config;
pub use content::{
    BibleContent, ChunkingParameters, ExportOptions, Mode, PasteType, PastedContent, SongContent,
    SongPart, SourceContent, SourceFile, SourceKind, StyleOptions, Verse,
};
pub use errors::{Result, SlideError};
pub use export::{export, export_html, export_pdf, export_png, export_pptx, ExportFormat};
pub use lookup::{LookupError, PassageLookup, SuperSearchClient};
pub use preview::{CommandSpeech, Presenter, SpeechSynthesizer, Surface};
pub use render::CaptureConfig;
pub use session::Session;
pub use store::{JsonFileStore, MemoryStore, Preferences, PreferencesStore};
pub use watch::{watch_source, WatchConfig};

#[cfg(test)]
mod tests;
