// ABOUTME: Live preview model for the bibslide application
// ABOUTME: Presenter navigation, fullscreen timers and the slide surface used for PNG capture

use crate::chunk::Slide;
use crate::content::StyleOptions;
use crate::utils::escape_html;
use log::{debug, info, warn};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Default auto-advance interval
pub const DEFAULT_AUTOPLAY_INTERVAL: Duration = Duration::from_millis(5000);

/// CSS class of the captured element
pub const SURFACE_CLASS: &str = "slide-surface";

#[derive(Debug, Clone, Copy)]
struct AutoPlay {
    interval: Duration,
    last_advance: Instant,
}

/// Navigation and presentation state over a chunked slide sequence
#[derive(Debug, Clone)]
pub struct Presenter {
    slides: Vec<Slide>,
    current: usize,
    black_screen: bool,
    fullscreen_since: Option<Instant>,
    autoplay: Option<AutoPlay>,
    autoplay_interval: Duration,
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Presenter {
    pub fn new(slides: Vec<Slide>) -> Self {
        Self {
            slides,
            current: 0,
            black_screen: false,
            fullscreen_since: None,
            autoplay: None,
            autoplay_interval: DEFAULT_AUTOPLAY_INTERVAL,
        }
    }

    /// Replace the slide sequence. The index returns to the first slide
    /// whenever the number of slides changes.
    pub fn set_slides(&mut self, slides: Vec<Slide>) {
        if slides.len() != self.slides.len() {
            debug!(
                "Slide count changed from {} to {}, resetting index",
                self.slides.len(),
                slides.len()
            );
            self.current = 0;
        }
        self.slides = slides;
        if self.slides.is_empty() {
            self.autoplay = None;
        }
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Jump to a slide, wrapping out-of-range indexes
    pub fn go_to(&mut self, index: usize) {
        if !self.slides.is_empty() {
            self.current = index % self.slides.len();
        }
    }

    pub fn next(&mut self) {
        if !self.slides.is_empty() {
            self.current = (self.current + 1) % self.slides.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.slides.is_empty() {
            self.current = if self.current == 0 {
                self.slides.len() - 1
            } else {
                self.current - 1
            };
        }
    }

    /// Raw text of the displayed slide, as handed to share/copy targets
    pub fn current_text(&self) -> Option<&str> {
        self.slides.get(self.current).map(String::as_str)
    }

    /// "Slide 2 / 7"
    pub fn slide_counter(&self) -> String {
        format!("Slide {} / {}", self.current + 1, self.slides.len())
    }

    pub fn is_black_screen(&self) -> bool {
        self.black_screen
    }

    pub fn toggle_black_screen(&mut self) {
        self.black_screen = !self.black_screen;
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen_since.is_some()
    }

    pub fn enter_fullscreen(&mut self, now: Instant) {
        info!("Entering presentation mode");
        self.fullscreen_since = Some(now);
    }

    /// Leaving fullscreen stops the elapsed timer and lifts the black screen
    pub fn exit_fullscreen(&mut self) {
        info!("Leaving presentation mode");
        self.fullscreen_since = None;
        self.black_screen = false;
    }

    /// Time spent in fullscreen, zero when not presenting
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.fullscreen_since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or_default()
    }

    /// Elapsed time as "MM:SS"
    pub fn elapsed_label(&self, now: Instant) -> String {
        format_elapsed(self.elapsed(now))
    }

    pub fn is_autoplaying(&self) -> bool {
        self.autoplay.is_some()
    }

    pub fn set_autoplay_interval(&mut self, interval: Duration) {
        self.autoplay_interval = interval.max(Duration::from_millis(1));
        if let Some(autoplay) = self.autoplay.as_mut() {
            autoplay.interval = self.autoplay_interval;
        }
    }

    pub fn toggle_autoplay(&mut self, now: Instant) {
        self.autoplay = match self.autoplay {
            Some(_) => None,
            None if !self.slides.is_empty() => Some(AutoPlay {
                interval: self.autoplay_interval,
                last_advance: now,
            }),
            None => None,
        };
    }

    /// Advance once per elapsed auto-play interval
    pub fn tick(&mut self, now: Instant) {
        let Some(mut autoplay) = self.autoplay else {
            return;
        };
        while now.saturating_duration_since(autoplay.last_advance) >= autoplay.interval {
            autoplay.last_advance += autoplay.interval;
            self.next();
        }
        self.autoplay = Some(autoplay);
    }

    /// Hand the displayed text to a speech synthesizer without waiting for it
    pub fn speak(&self, synthesizer: &dyn SpeechSynthesizer) {
        match self.current_text() {
            Some(text) => synthesizer.speak(text),
            None => debug!("Nothing to read aloud"),
        }
    }

    /// Visual description of the displayed slide
    pub fn surface(&self, style: &StyleOptions, background_image: Option<&str>) -> Option<Surface> {
        let text = self.current_text()?;
        Some(Surface::new(text, style, background_image, self.black_screen))
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Everything drawn on one visible slide: background, overlay and text
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub text: String,
    pub background: String,
    pub background_image: Option<String>,
    /// Opacity of the black layer over the background image
    pub overlay_opacity: Option<f64>,
    pub text_color: String,
    pub font: String,
    pub font_size: u32,
    pub black_screen: bool,
}

impl Surface {
    pub fn new(
        text: &str,
        style: &StyleOptions,
        background_image: Option<&str>,
        black_screen: bool,
    ) -> Self {
        let brightness = style.clamped_brightness();
        Self {
            text: text.to_string(),
            background: style.adjusted_background(),
            background_image: background_image.map(str::to_string),
            overlay_opacity: background_image.map(|_| f64::from(100 - brightness) / 100.0),
            text_color: style.text_color(),
            font: style.font.clone(),
            font_size: style.font_size,
            black_screen,
        }
    }

    /// Standalone document holding only the slide surface. Navigation buttons,
    /// counters and timers are never part of it.
    pub fn to_html(&self, width: u32, height: u32) -> String {
        let (background, color) = if self.black_screen {
            ("#000000".to_string(), "#000000".to_string())
        } else {
            (self.background.clone(), self.text_color.clone())
        };

        let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n");
        html.push_str("<style>\n");
        html.push_str("html, body { margin: 0; padding: 0; background: transparent; }\n");
        html.push_str(&format!(
            ".{class} {{ position: relative; width: {w}px; height: {h}px; overflow: hidden; \
             display: flex; align-items: center; justify-content: center; text-align: center; \
             background-color: {bg}; background-size: cover; background-position: center; \
             color: {color}; font-family: '{font}', sans-serif; font-size: {size}px; }}\n",
            class = SURFACE_CLASS,
            w = width,
            h = height,
            bg = escape_html(&background),
            color = escape_html(&color),
            font = escape_html(&self.font),
            size = self.font_size,
        ));
        html.push_str(".overlay { position: absolute; inset: 0; background-color: black; }\n");
        html.push_str(
            ".text { position: relative; z-index: 10; padding: 2rem 4rem; line-height: 1.375; white-space: pre-wrap; }\n",
        );
        html.push_str("</style>\n</head>\n<body>\n");

        let image_style = match (&self.background_image, self.black_screen) {
            (Some(image), false) => format!(
                " style=\"background-image: url('{}')\"",
                escape_html(image)
            ),
            _ => String::new(),
        };
        html.push_str(&format!("<div class=\"{}\"{}>\n", SURFACE_CLASS, image_style));

        if !self.black_screen {
            if let Some(opacity) = self.overlay_opacity {
                html.push_str(&format!(
                    "<div class=\"overlay\" style=\"opacity: {:.2}\"></div>\n",
                    opacity
                ));
            }
            html.push_str(&format!(
                "<div class=\"text\">{}</div>\n",
                escape_html(&self.text)
            ));
        }

        html.push_str("</div>\n</body>\n</html>");
        html
    }
}

/// Text-to-speech collaborator
pub trait SpeechSynthesizer {
    /// Start reading the text aloud. Completion is never reported back.
    fn speak(&self, text: &str);
}

/// Speech through an external program such as `espeak`
pub struct CommandSpeech {
    pub program: String,
    pub language: String,
}

impl CommandSpeech {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            language: "fr-FR".to_string(),
        }
    }
}

impl SpeechSynthesizer for CommandSpeech {
    fn speak(&self, text: &str) {
        let spawned = Command::new(&self.program)
            .arg("-v")
            .arg(&self.language)
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => debug!("Speech started with pid {}", child.id()),
            Err(e) => warn!("Failed to start speech program {}: {}", self.program, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn slides(n: usize) -> Vec<Slide> {
        (1..=n).map(|i| format!("slide {}", i)).collect()
    }

    #[test]
    fn test_navigation_wraps() {
        let mut presenter = Presenter::new(slides(3));
        presenter.previous();
        assert_eq!(presenter.current(), 2);
        presenter.next();
        assert_eq!(presenter.current(), 0);
        presenter.go_to(7);
        assert_eq!(presenter.current(), 1);
    }

    #[test]
    fn test_navigation_on_empty_deck_is_noop() {
        let mut presenter = Presenter::default();
        presenter.next();
        presenter.previous();
        assert_eq!(presenter.current(), 0);
        assert_eq!(presenter.current_text(), None);
    }

    #[test]
    fn test_index_resets_when_slide_count_changes() {
        let mut presenter = Presenter::new(slides(5));
        presenter.go_to(4);
        presenter.set_slides(slides(2));
        assert_eq!(presenter.current(), 0);
        assert_eq!(presenter.current_text(), Some("slide 1"));
    }

    #[test]
    fn test_index_kept_when_slide_count_is_unchanged() {
        let mut presenter = Presenter::new(slides(3));
        presenter.go_to(2);
        presenter.set_slides(vec!["x".into(), "y".into(), "z".into()]);
        assert_eq!(presenter.current_text(), Some("z"));
    }

    #[test]
    fn test_fullscreen_timer_starts_and_resets() {
        let start = Instant::now();
        let mut presenter = Presenter::new(slides(2));
        presenter.enter_fullscreen(start);
        assert!(presenter.is_fullscreen());
        assert_eq!(presenter.elapsed_label(start + Duration::from_secs(75)), "01:15");

        presenter.toggle_black_screen();
        presenter.exit_fullscreen();
        assert!(!presenter.is_fullscreen());
        assert!(!presenter.is_black_screen());
        assert_eq!(presenter.elapsed(start + Duration::from_secs(90)), Duration::ZERO);
    }

    #[test]
    fn test_autoplay_advances_per_interval() {
        let start = Instant::now();
        let mut presenter = Presenter::new(slides(3));
        presenter.toggle_autoplay(start);

        presenter.tick(start + Duration::from_millis(4999));
        assert_eq!(presenter.current(), 0);
        presenter.tick(start + Duration::from_millis(5000));
        assert_eq!(presenter.current(), 1);
        presenter.tick(start + Duration::from_millis(15000));
        assert_eq!(presenter.current(), 0);

        presenter.toggle_autoplay(start);
        assert!(!presenter.is_autoplaying());
        presenter.tick(start + Duration::from_secs(60));
        assert_eq!(presenter.current(), 0);
    }

    #[test]
    fn test_autoplay_interval_change_applies_while_running() {
        let start = Instant::now();
        let mut presenter = Presenter::new(slides(3));
        presenter.toggle_autoplay(start);
        assert!(presenter.is_autoplaying());

        presenter.set_autoplay_interval(Duration::from_secs(1));
        presenter.tick(start + Duration::from_secs(2));
        assert_eq!(presenter.current(), 2);
    }

    #[test]
    fn test_surface_excludes_controls() {
        let presenter = Presenter::new(slides(4));
        let style = StyleOptions::default();
        let html = presenter.surface(&style, None).unwrap().to_html(1280, 720);
        assert!(html.contains("slide 1"));
        assert!(!html.contains("Slide 1 / 4"));
        assert!(!html.contains("<button"));
        assert!(!html.contains("class=\"overlay\""));
    }

    #[test]
    fn test_surface_overlay_uses_complementary_opacity() {
        let style = StyleOptions {
            brightness: 30,
            ..Default::default()
        };
        let surface = Surface::new("text", &style, Some("data:image/png;base64,AAAA"), false);
        assert_eq!(surface.overlay_opacity, Some(0.7));
        assert!(surface.to_html(640, 360).contains("opacity: 0.70"));
    }

    #[test]
    fn test_black_screen_hides_text() {
        let mut presenter = Presenter::new(vec!["<secret>".to_string()]);
        presenter.toggle_black_screen();
        let html = presenter
            .surface(&StyleOptions::default(), None)
            .unwrap()
            .to_html(1280, 720);
        assert!(!html.contains("secret"));
        assert!(html.contains("background-color: #000000"));
    }

    struct Recorder(RefCell<Vec<String>>);

    impl SpeechSynthesizer for Recorder {
        fn speak(&self, text: &str) {
            self.0.borrow_mut().push(text.to_string());
        }
    }

    #[test]
    fn test_speak_hands_off_current_text() {
        let recorder = Recorder(RefCell::new(Vec::new()));
        let mut presenter = Presenter::new(slides(2));
        presenter.next();
        presenter.speak(&recorder);
        assert_eq!(recorder.0.borrow().as_slice(), ["slide 2".to_string()]);
    }
}
