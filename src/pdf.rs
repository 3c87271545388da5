// ABOUTME: PDF generation module for the bibslide application
// ABOUTME: Draws every slide onto a fixed 1280x720 page with the standard PDF fonts

use crate::chunk::{Deck, DeckSlide, TitleSlide};
use crate::color::to_rgb;
use crate::content::ExportOptions;
use crate::errors::Result;
use crate::resources::BackgroundImage;
use log::{debug, info};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

pub const PAGE_WIDTH: f64 = 1280.0;
pub const PAGE_HEIGHT: f64 = 720.0;

/// Maximum width of a wrapped body line
const WRAP_WIDTH: f64 = 1000.0;
const LINE_HEIGHT: f64 = 1.2;

const FONT_KEY: &str = "F1";
const IMAGE_KEY: &str = "Im1";
const OVERLAY_KEY: &str = "GS1";

/// A standard Type1 face with an average glyph width used for layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardFont {
    pub base_font: &'static str,
    /// Average advance as a fraction of the font size
    pub average_width: f64,
}

impl StandardFont {
    /// Closest standard face for a font family name
    pub fn for_family(family: &str) -> Self {
        let family = family.to_lowercase();
        if family.contains("courier") || family.contains("mono") {
            Self {
                base_font: "Courier",
                average_width: 0.6,
            }
        } else if (family.contains("times") || family.contains("georgia") || family.contains("serif"))
            && !family.contains("sans")
        {
            Self {
                base_font: "Times-Roman",
                average_width: 0.45,
            }
        } else {
            Self {
                base_font: "Helvetica",
                average_width: 0.5,
            }
        }
    }

    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        text.chars().count() as f64 * self.average_width * size
    }

    /// Wrap text to `max_width` page units. Explicit newlines are kept,
    /// including blank lines.
    pub fn wrap(&self, text: &str, size: f64, max_width: f64) -> Vec<String> {
        let columns = ((max_width / (self.average_width * size)).floor() as usize).max(1);
        text.split('\n')
            .flat_map(|line| {
                if line.trim().is_empty() {
                    vec![String::new()]
                } else {
                    textwrap::wrap(line, columns)
                        .into_iter()
                        .map(|l| l.into_owned())
                        .collect()
                }
            })
            .collect()
    }
}

/// Encode text for a WinAnsiEncoding font. Characters outside the code
/// page become '?'.
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            'œ' => 0x9c,
            'Œ' => 0x8c,
            _ => b'?',
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

/// Builds the content stream of one page in top-down coordinates
struct PageWriter {
    font: StandardFont,
    operations: Vec<Operation>,
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

impl PageWriter {
    fn new(font: StandardFont) -> Self {
        Self {
            font,
            operations: Vec::new(),
        }
    }

    fn fill_color(&mut self, hex: &str) {
        let (r, g, b) = to_rgb(hex);
        self.operations.push(Operation::new(
            "rg",
            vec![
                real(f64::from(r) / 255.0),
                real(f64::from(g) / 255.0),
                real(f64::from(b) / 255.0),
            ],
        ));
    }

    fn full_page_rect(&mut self) {
        self.operations.push(Operation::new(
            "re",
            vec![real(0.0), real(0.0), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
        ));
        self.operations.push(Operation::new("f", vec![]));
    }

    fn solid_background(&mut self, hex: &str) {
        self.operations.push(Operation::new("q", vec![]));
        self.fill_color(hex);
        self.full_page_rect();
        self.operations.push(Operation::new("Q", vec![]));
    }

    fn image_background(&mut self, overlay: bool) {
        self.operations.push(Operation::new("q", vec![]));
        self.operations.push(Operation::new(
            "cm",
            vec![
                real(PAGE_WIDTH),
                real(0.0),
                real(0.0),
                real(PAGE_HEIGHT),
                real(0.0),
                real(0.0),
            ],
        ));
        self.operations
            .push(Operation::new("Do", vec![Object::from(IMAGE_KEY)]));
        self.operations.push(Operation::new("Q", vec![]));

        if overlay {
            self.operations.push(Operation::new("q", vec![]));
            self.operations
                .push(Operation::new("gs", vec![Object::from(OVERLAY_KEY)]));
            self.fill_color("#000000");
            self.full_page_rect();
            self.operations.push(Operation::new("Q", vec![]));
        }
    }

    /// Draw one line with its baseline at `y` measured from the top edge
    fn text(&mut self, text: &str, size: f64, color: &str, x: f64, y: f64, align: Align) {
        if text.is_empty() {
            return;
        }
        let width = self.font.text_width(text, size);
        let left = match align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };

        self.operations.push(Operation::new("BT", vec![]));
        self.operations.push(Operation::new(
            "Tf",
            vec![Object::from(FONT_KEY), real(size)],
        ));
        self.fill_color(color);
        self.operations.push(Operation::new(
            "Td",
            vec![real(left), real(PAGE_HEIGHT - y)],
        ));
        self.operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(win_ansi(text))],
        ));
        self.operations.push(Operation::new("ET", vec![]));
    }

    fn finish(self) -> Result<Vec<u8>> {
        Ok(Content {
            operations: self.operations,
        }
        .encode()?)
    }
}

struct PdfStyle<'a> {
    options: &'a ExportOptions,
    font: StandardFont,
    background: String,
    text_color: String,
    accent: &'static str,
    has_image: bool,
}

impl<'a> PdfStyle<'a> {
    fn page(&self) -> PageWriter {
        let mut page = PageWriter::new(self.font);
        if self.has_image {
            page.image_background(self.options.style.clamped_brightness() < 100);
        } else {
            page.solid_background(&self.background);
        }
        page
    }
}

fn title_page(style: &PdfStyle, title: &TitleSlide) -> Result<Vec<u8>> {
    const TITLE_SIZE: f64 = 64.0;
    let mut page = style.page();

    // Long titles wrap into a block centred on the single-line baseline.
    let lines = style.font.wrap(&title.title, TITLE_SIZE, WRAP_WIDTH);
    let step = TITLE_SIZE * LINE_HEIGHT;
    let first_y = 300.0 - lines.len().saturating_sub(1) as f64 * step / 2.0;
    let mut last_y = first_y;
    for (i, line) in lines.iter().enumerate() {
        last_y = first_y + i as f64 * step;
        page.text(
            line,
            TITLE_SIZE,
            &style.text_color,
            PAGE_WIDTH / 2.0,
            last_y,
            Align::Center,
        );
    }
    if let Some(author) = &title.author {
        page.text(
            &format!("Otè: {}", author),
            32.0,
            style.accent,
            PAGE_WIDTH / 2.0,
            last_y + 80.0,
            Align::Center,
        );
    }
    page.finish()
}

fn content_page(style: &PdfStyle, slide: &DeckSlide, is_song: bool) -> Result<Vec<u8>> {
    let mut page = style.page();

    if let Some(church) = style.options.church_name() {
        page.text(church, 24.0, style.accent, 1200.0, 40.0, Align::Right);
    }
    if let Some(label) = &slide.label {
        page.text(&label.to_uppercase(), 24.0, style.accent, 40.0, 40.0, Align::Left);
    }

    let base = f64::from(style.options.style.font_size);
    let size = if slide.is_dense() { base * 1.2 } else { base * 1.5 };
    let lines = style.font.wrap(&slide.text, size, WRAP_WIDTH);
    let block_height = lines.len() as f64 * size * LINE_HEIGHT;
    let y_start = (PAGE_HEIGHT - block_height) / 2.0 + size;
    for (i, line) in lines.iter().enumerate() {
        page.text(
            line,
            size,
            &style.text_color,
            PAGE_WIDTH / 2.0,
            y_start + i as f64 * size * LINE_HEIGHT,
            Align::Center,
        );
    }

    if let Some(caption) = &slide.caption {
        let size = if is_song { 20.0 } else { 28.0 };
        page.text(caption, size, style.accent, PAGE_WIDTH / 2.0, 680.0, Align::Center);
    }

    page.finish()
}

fn image_xobject(image: &BackgroundImage) -> Result<Stream> {
    let rgb = image.decode()?.to_rgb8();
    let (width, height) = rgb.dimensions();
    debug!("Embedding {}x{} background image", width, height);
    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb.into_raw(),
    ))
}

fn add_page(doc: &mut Document, pages_id: ObjectId, content: Vec<u8>) -> ObjectId {
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    })
}

/// Build a complete PDF in memory, one page per slide and the song title
/// page first.
pub fn build_pdf(
    deck: &Deck,
    options: &ExportOptions,
    background: Option<&BackgroundImage>,
) -> Result<Vec<u8>> {
    let style = PdfStyle {
        options,
        font: StandardFont::for_family(&options.style.font),
        background: options.style.adjusted_background(),
        text_color: options.style.text_color(),
        accent: options.accent(),
        has_image: background.is_some(),
    };
    info!(
        "Creating PDF with {} pages using {}",
        deck.page_count(),
        style.font.base_font
    );

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => style.font.base_font,
        "Encoding" => "WinAnsiEncoding",
    });
    let mut resources = dictionary! {
        "Font" => dictionary! { FONT_KEY => font_id },
    };
    if let Some(image) = background {
        let image_id = doc.add_object(image_xobject(image)?);
        let alpha = f64::from(100 - options.style.clamped_brightness()) / 100.0;
        resources.set("XObject", dictionary! { IMAGE_KEY => image_id });
        resources.set(
            "ExtGState",
            dictionary! {
                OVERLAY_KEY => dictionary! {
                    "Type" => "ExtGState",
                    "ca" => real(alpha),
                    "CA" => real(alpha),
                },
            },
        );
    }
    let resources_id = doc.add_object(resources);

    let is_song = deck.title.is_some();
    let mut kids: Vec<Object> = Vec::with_capacity(deck.page_count());
    if let Some(title) = &deck.title {
        kids.push(add_page(&mut doc, pages_id, title_page(&style, title)?).into());
    }
    for slide in &deck.slides {
        kids.push(add_page(&mut doc, pages_id, content_page(&style, slide, is_song)?).into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let title = deck
        .title
        .as_ref()
        .map(|t| t.title.clone())
        .unwrap_or_else(|| deck.stem.replace('_', " "));
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(win_ansi(&title)),
        "Producer" => Object::string_literal("bibslide"),
        "CreationDate" => Object::string_literal(
            chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()
        ),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
