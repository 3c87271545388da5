use super::*;
use crate::color::normalize;

fn john_3(verses: u32) -> SourceContent {
    SourceContent::Bible(BibleContent {
        book: "John".to_string(),
        chapter: 3,
        verses: (1..=verses)
            .map(|number| Verse {
                number,
                text: format!("verse {}", number),
            })
            .collect(),
        translation: Some("kjv".to_string()),
    })
}

#[test]
fn test_bible_pairs_leave_last_verse_alone() {
    let slides = chunk(&john_3(3), &ChunkingParameters::new(2, 2));
    assert_eq!(slides.len(), 2);
    assert_eq!(slides[1], "3. verse 3");
}

#[test]
fn test_song_parts_are_chunked_separately() {
    let song = SourceContent::Song(SongContent {
        title: "Song".to_string(),
        author: None,
        collection: None,
        lyrics: vec![
            SongPart {
                part: "Verse1".to_string(),
                lines: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            },
            SongPart {
                part: "Chorus".to_string(),
                lines: vec!["d".to_string(), "e".to_string()],
            },
        ],
    });
    assert_eq!(
        chunk(&song, &ChunkingParameters::new(1, 2)),
        vec!["a\nb", "c", "d\ne"]
    );
}

#[test]
fn test_pasted_song_skips_blank_lines() {
    let pasted = SourceContent::Pasted(PastedContent {
        text: "line1\n\nline2\nline3".to_string(),
        paste_type: PasteType::Song,
    });
    assert_eq!(
        chunk(&pasted, &ChunkingParameters::new(1, 2)),
        vec!["line1\nline2", "line3"]
    );
}

#[test]
fn test_half_brightness_darkens_grey() {
    assert_eq!(adjust_brightness("#888888", 50), "#080808");
}

#[test]
fn test_full_brightness_is_identity() {
    for hex in ["#888888", "1E3A8A", "#ffffff", "#000000", "#0f172a"] {
        assert_eq!(adjust_brightness(hex, 100), normalize(hex));
    }
}

#[test]
fn test_brightness_is_monotonic() {
    let channel = |hex: &str| u8::from_str_radix(&hex[1..3], 16).unwrap();
    let mut previous = 0;
    for percent in 1..=100 {
        let value = channel(&adjust_brightness("#c08040", percent));
        assert!(value >= previous, "percent {} went darker", percent);
        previous = value;
    }
}

#[test]
fn test_rechunking_resets_presenter_index() {
    let mut session = Session::default();
    session.set_source(john_3(5));
    session.presenter_mut().go_to(4);

    session.set_params(ChunkingParameters::new(3, 2));
    assert_eq!(session.slides().len(), 2);
    assert_eq!(session.presenter().current(), 0);
}

#[test]
fn test_deck_texts_match_chunk() {
    let params = ChunkingParameters::new(2, 3);
    let source = john_3(7);
    assert_eq!(build_deck(&source, &params).texts(), chunk(&source, &params));
}

#[test]
fn test_presenter_wraps_over_chunked_slides() {
    let mut presenter = Presenter::new(chunk(&john_3(3), &ChunkingParameters::default()));
    presenter.previous();
    assert_eq!(presenter.current(), 2);
    presenter.next();
    assert_eq!(presenter.current(), 0);
    assert_eq!(presenter.slide_counter(), "Slide 1 / 3");
}
