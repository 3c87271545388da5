use bibslide::{
    build_deck, export, ChunkingParameters, ExportFormat, ExportOptions, Session, SourceFile,
    SourceKind,
};
use bibslide::render::CaptureConfig;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const JOHN_3: &str = r#"{
    "book": "John",
    "chapter": 3,
    "translation": "kjv",
    "verses": [
        {"number": 16, "text": "For God so loved the world"},
        {"number": 17, "text": "For God sent not his Son"},
        {"number": 18, "text": "He that believeth on him"}
    ]
}"#;

fn count_files_with_extension(dir: &Path, extension: &str) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().map_or(false, |ext| ext == extension))
        .count()
}

fn write_source(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_bible_file_exports_every_document_format() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_source(temp_dir.path(), "john3.json", JOHN_3);
    let source = SourceFile::new(&path, SourceKind::Bible).load().unwrap();

    let deck = build_deck(&source, &ChunkingParameters::new(2, 2));
    assert_eq!(deck.stem, "John_3");
    assert_eq!(deck.slides.len(), 2);

    let out = temp_dir.path().join("out");
    fs::create_dir(&out).unwrap();
    let options = ExportOptions {
        church_name: Some("Grace Chapel".to_string()),
        ..Default::default()
    };
    for format in [ExportFormat::Pptx, ExportFormat::Pdf, ExportFormat::Html] {
        let written = export(format, &deck, &options, &out, &CaptureConfig::default()).unwrap();
        assert_eq!(written, vec![out.join(format!("John_3.{}", format))]);
    }

    let pdf = lopdf::Document::load(out.join("John_3.pdf")).unwrap();
    assert_eq!(pdf.get_pages().len(), 2);

    let html = fs::read_to_string(out.join("John_3.html")).unwrap();
    assert!(html.contains("Grace Chapel"));
    assert!(html.contains("John 3:16-17"));
    assert!(html.contains("18. He that believeth on him"));
}

#[test]
fn test_song_pdf_has_title_page() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_source(
        temp_dir.path(),
        "song.json",
        r#"{"title":"How Great Thou Art","author":"Carl Boberg","lyrics":[
            {"part":"Verse 1","lines":["O Lord my God","when I in awesome wonder","consider all"]}
        ]}"#,
    );
    let source = SourceFile::new(&path, SourceKind::Song).load().unwrap();
    let deck = build_deck(&source, &ChunkingParameters::new(1, 2));

    let written = export(
        ExportFormat::Pdf,
        &deck,
        &ExportOptions::default(),
        temp_dir.path(),
        &CaptureConfig::default(),
    )
    .unwrap();
    assert_eq!(written, vec![temp_dir.path().join("How_Great_Thou_Art.pdf")]);

    // Title page plus two lyric groups
    let pdf = lopdf::Document::load(&written[0]).unwrap();
    assert_eq!(pdf.get_pages().len(), 3);
}

#[test]
fn test_pasted_text_uses_fixed_stem() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_source(temp_dir.path(), "paste.txt", "first\n\nsecond\nthird\n");
    let source = SourceFile::new(&path, SourceKind::Paste(bibslide::PasteType::Bible))
        .load()
        .unwrap();

    let deck = build_deck(&source, &ChunkingParameters::default());
    assert_eq!(deck.texts(), vec!["first", "second", "third"]);

    export(
        ExportFormat::Html,
        &deck,
        &ExportOptions::default(),
        temp_dir.path(),
        &CaptureConfig::default(),
    )
    .unwrap();
    assert!(temp_dir.path().join("BibSlide_Pasted.html").is_file());
}

#[test]
fn test_blank_paste_exports_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_source(temp_dir.path(), "paste.txt", "\n   \n\n");

    let mut session = Session::default();
    session.set_source(
        SourceFile::new(&path, SourceKind::Paste(bibslide::PasteType::Song))
            .load()
            .unwrap(),
    );
    assert!(session.slides().is_empty());
    assert!(session.deck().is_none());
    assert_eq!(count_files_with_extension(temp_dir.path(), "html"), 0);
}

#[test]
#[ignore = "requires a local Chrome or Chromium"]
fn test_png_export_with_browser() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_source(temp_dir.path(), "john3.json", JOHN_3);
    let source = SourceFile::new(&path, SourceKind::Bible).load().unwrap();
    let deck = build_deck(&source, &ChunkingParameters::default());

    let written = export(
        ExportFormat::Png,
        &deck,
        &ExportOptions::default(),
        temp_dir.path(),
        &CaptureConfig::default(),
    )
    .unwrap();
    assert_eq!(written.len(), 3);
    assert_eq!(count_files_with_extension(temp_dir.path(), "png"), 3);
    assert!(temp_dir.path().join("John_3_1.png").is_file());
}
