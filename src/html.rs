// ABOUTME: HTML generation module for the bibslide application
// ABOUTME: Produces a self-contained slideshow document with keyboard and button navigation

use crate::chunk::Deck;
use crate::content::ExportOptions;
use crate::resources::BackgroundImage;
use crate::utils::escape_html;
use log::info;

const NAVIGATION_SCRIPT: &str = r#"<script>
    let current = 0;
    const slides = document.querySelectorAll('.slide');
    function show(n) {
        slides[current].classList.remove('active');
        current = (n + slides.length) % slides.length;
        slides[current].classList.add('active');
    }
    function next() { show(current + 1); }
    function prev() { show(current - 1); }
    document.addEventListener('keydown', (e) => {
        if (e.key === 'ArrowRight' || e.key === ' ') next();
        if (e.key === 'ArrowLeft') prev();
    });
</script>"#;

/// Generate the slideshow document.
///
/// Every slide is a `.slide` div, only the first is `active`. The background
/// image, when present, is inlined as a data URI so the file stands alone.
pub fn generate_html(
    deck: &Deck,
    options: &ExportOptions,
    background: Option<&BackgroundImage>,
) -> String {
    info!("Generating HTML slideshow with {} slides", deck.page_count());

    let style = &options.style;
    let background_color = style.adjusted_background();
    let text_color = style.text_color();
    let background_image = background.map(|image| image.to_data_uri());
    let overlay = background
        .is_some()
        .then(|| f64::from(100 - style.clamped_brightness()) / 100.0)
        .filter(|opacity| *opacity > 0.0);

    let title = deck
        .title
        .as_ref()
        .map(|t| t.title.clone())
        .unwrap_or_else(|| "BibSlide Presentation".to_string());

    let mut html_doc = String::from("<!DOCTYPE html>\n<html lang=\"ht\">\n<head>\n");
    html_doc.push_str("<meta charset=\"UTF-8\">\n");
    html_doc.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html_doc.push_str(&format!("<title>{}</title>\n", escape_html(&title)));
    html_doc.push_str("<style>\n");
    html_doc.push_str(&format!(
        "body {{ margin: 0; background: #000; color: #fff; font-family: '{}', sans-serif; overflow: hidden; }}\n",
        escape_html(&style.font)
    ));
    html_doc.push_str(
        ".slide { display: none; position: relative; height: 100vh; width: 100vw; flex-direction: column; \
         align-items: center; justify-content: center; text-align: center; padding: 2rem; box-sizing: border-box; \
         background-size: cover; background-position: center; }\n",
    );
    html_doc.push_str(".slide.active { display: flex; }\n");
    html_doc.push_str(".overlay { position: absolute; inset: 0; background: #000; }\n");
    html_doc.push_str(&format!(
        ".text {{ position: relative; font-size: {}px; line-height: 1.4; white-space: pre-wrap; max-width: 90%; }}\n",
        f64::from(style.font_size) * 1.5
    ));
    html_doc.push_str(".title { font-size: 64px; font-weight: bold; }\n");
    html_doc.push_str(&format!(
        ".accent {{ position: relative; color: {}; }}\n",
        escape_html(options.accent())
    ));
    html_doc.push_str(".church { position: absolute; top: 20px; right: 40px; font-style: italic; }\n");
    html_doc.push_str(".part { position: absolute; top: 20px; left: 40px; font-weight: bold; text-transform: uppercase; }\n");
    html_doc.push_str(".caption { position: absolute; bottom: 30px; }\n");
    html_doc.push_str(
        ".controls { position: fixed; bottom: 20px; right: 20px; display: flex; gap: 10px; opacity: 0.3; transition: opacity 0.3s; }\n",
    );
    html_doc.push_str(".controls:hover { opacity: 1; }\n");
    html_doc.push_str(
        "button { background: rgba(255,255,255,0.2); border: none; color: white; padding: 10px 20px; border-radius: 5px; cursor: pointer; }\n",
    );
    html_doc.push_str("</style>\n</head>\n<body>\n");

    let slide_style = match &background_image {
        Some(uri) => format!(
            "background-color: {}; color: {}; background-image: url('{}')",
            escape_html(&background_color),
            escape_html(&text_color),
            escape_html(uri)
        ),
        None => format!(
            "background-color: {}; color: {}; background-image: none",
            escape_html(&background_color),
            escape_html(&text_color)
        ),
    };
    let overlay_div = overlay
        .map(|opacity| format!("<div class=\"overlay\" style=\"opacity: {:.2}\"></div>", opacity))
        .unwrap_or_default();

    let mut bodies: Vec<String> = Vec::with_capacity(deck.page_count());
    if let Some(title) = &deck.title {
        let mut body = format!(
            "<div class=\"text title\">{}</div>",
            escape_html(&title.title)
        );
        if let Some(author) = &title.author {
            body.push_str(&format!(
                "<div class=\"accent\">Otè: {}</div>",
                escape_html(author)
            ));
        }
        bodies.push(body);
    }
    for slide in &deck.slides {
        let mut body = String::new();
        if let Some(church) = options.church_name() {
            body.push_str(&format!(
                "<div class=\"accent church\">{}</div>",
                escape_html(church)
            ));
        }
        if let Some(label) = &slide.label {
            body.push_str(&format!(
                "<div class=\"accent part\">{}</div>",
                escape_html(label)
            ));
        }
        body.push_str(&format!(
            "<div class=\"text\">{}</div>",
            escape_html(&slide.text)
        ));
        if let Some(caption) = &slide.caption {
            body.push_str(&format!(
                "<div class=\"accent caption\">{}</div>",
                escape_html(caption)
            ));
        }
        bodies.push(body);
    }

    for (i, body) in bodies.iter().enumerate() {
        let class = if i == 0 { "slide active" } else { "slide" };
        html_doc.push_str(&format!(
            "<div class=\"{}\" style=\"{}\">{}{}</div>\n",
            class, slide_style, overlay_div, body
        ));
    }

    html_doc.push_str("<div class=\"controls\">\n");
    html_doc.push_str("<button onclick=\"prev()\">Anvan</button>\n");
    html_doc.push_str("<button onclick=\"next()\">Apre</button>\n");
    html_doc.push_str("</div>\n");
    html_doc.push_str(NAVIGATION_SCRIPT);
    html_doc.push_str("\n</body>\n</html>");

    html_doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::build_deck;
    use crate::content::{
        ChunkingParameters, PasteType, PastedContent, SongContent, SongPart, SourceContent,
    };

    fn pasted(text: &str) -> Deck {
        build_deck(
            &SourceContent::Pasted(PastedContent {
                text: text.to_string(),
                paste_type: PasteType::Song,
            }),
            &ChunkingParameters::new(1, 1),
        )
    }

    #[test]
    fn test_only_first_slide_is_active() {
        let html = generate_html(&pasted("one\ntwo\nthree"), &ExportOptions::default(), None);
        assert_eq!(html.matches("<div class=\"slide active\"").count(), 1);
        assert_eq!(html.matches("<div class=\"slide\"").count(), 2);
        assert!(html.contains("ArrowRight"));
        assert!(html.contains("ArrowLeft"));
        assert!(html.contains("e.key === ' '"));
    }

    #[test]
    fn test_slide_text_is_escaped() {
        let html = generate_html(
            &pasted("<script>alert('x')</script>"),
            &ExportOptions::default(),
            None,
        );
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert(&apos;x&apos;)&lt;/script&gt;"));
    }

    #[test]
    fn test_uses_adjusted_background_and_text_color() {
        let mut options = ExportOptions::default();
        options.style.bg_color = "#888888".to_string();
        options.style.brightness = 50;
        let html = generate_html(&pasted("a"), &options, None);
        assert!(html.contains("background-color: #080808; color: #000000"));
    }

    #[test]
    fn test_song_title_slide_leads() {
        let song = SourceContent::Song(SongContent {
            title: "Amazing Grace".to_string(),
            author: Some("John Newton".to_string()),
            collection: None,
            lyrics: vec![SongPart {
                part: "verse 1".to_string(),
                lines: vec!["Amazing grace".to_string()],
            }],
        });
        let deck = build_deck(&song, &ChunkingParameters::default());
        let html = generate_html(&deck, &ExportOptions::default(), None);

        let title = html.find("text title").unwrap();
        let lyric = html.find(">Amazing grace<").unwrap();
        assert!(title < lyric);
        assert!(html.contains("Otè: John Newton"));
    }
}
