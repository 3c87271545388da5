// ABOUTME: PPTX generation module for the bibslide application
// ABOUTME: Writes chunked slides as native PowerPoint text slides with styled backgrounds

use crate::chunk::{Deck, DeckSlide, TitleSlide};
use crate::color::ooxml_hex;
use crate::content::ExportOptions;
use crate::errors::Result;
use crate::resources::BackgroundImage;
use log::info;
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use zip::{write::FileOptions, ZipWriter};

/// English Metric Units per inch
const EMU_PER_INCH: f64 = 914_400.0;

/// 16:9 slide, 10in x 5.625in
const SLIDE_CX: i64 = 9_144_000;
const SLIDE_CY: i64 = 5_143_500;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    fn attr(&self) -> &'static str {
        match self {
            Align::Left => "l",
            Align::Center => "ctr",
            Align::Right => "r",
        }
    }
}

/// A positioned text frame
#[derive(Debug, Clone)]
struct TextBox<'a> {
    name: &'a str,
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
    text: &'a str,
    size_pt: u32,
    color: String,
    font: Option<&'a str>,
    bold: bool,
    italic: bool,
    align: Align,
    middle: bool,
}

impl<'a> TextBox<'a> {
    fn new(name: &'a str, text: &'a str, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            name,
            x: emu(x),
            y: emu(y),
            cx: emu(w),
            cy: emu(h),
            text,
            size_pt: 18,
            color: "000000".to_string(),
            font: None,
            bold: false,
            italic: false,
            align: Align::Center,
            middle: false,
        }
    }

    fn to_xml(&self, id: usize) -> String {
        let mut run_props = format!(r#"lang="en-US" sz="{}""#, self.size_pt * 100);
        if self.bold {
            run_props.push_str(r#" b="1""#);
        }
        if self.italic {
            run_props.push_str(r#" i="1""#);
        }
        let font = self
            .font
            .map(|f| {
                let face = escape(f);
                format!(r#"<a:latin typeface="{face}"/><a:cs typeface="{face}"/>"#)
            })
            .unwrap_or_default();
        let fill = format!(r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#, self.color);

        let paragraphs: String = self
            .text
            .split('\n')
            .map(|line| {
                if line.is_empty() {
                    format!(
                        r#"<a:p><a:pPr algn="{}"/><a:endParaRPr {}/></a:p>"#,
                        self.align.attr(),
                        run_props
                    )
                } else {
                    format!(
                        r#"<a:p><a:pPr algn="{}"/><a:r><a:rPr {} dirty="0">{}{}</a:rPr><a:t>{}</a:t></a:r></a:p>"#,
                        self.align.attr(),
                        run_props,
                        fill,
                        font,
                        escape(line)
                    )
                }
            })
            .collect();

        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr><p:txBody><a:bodyPr wrap="square" lIns="91440" tIns="45720" rIns="91440" bIns="45720" rtlCol="0" anchor="{anchor}"><a:noAutofit/></a:bodyPr><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#,
            id = id,
            name = escape(self.name),
            x = self.x,
            y = self.y,
            cx = self.cx,
            cy = self.cy,
            anchor = if self.middle { "ctr" } else { "t" },
            paragraphs = paragraphs,
        )
    }
}

/// Black full-slide rectangle. The transparency is the brightness percent.
fn overlay_xml(id: usize, transparency: i32) -> String {
    let alpha = (100 - transparency.clamp(0, 100)) * 1000;
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Brightness Overlay"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:solidFill><a:srgbClr val="000000"><a:alpha val="{alpha}"/></a:srgbClr></a:solidFill><a:ln><a:noFill/></a:ln></p:spPr></p:sp>"#,
        id = id,
        cx = SLIDE_CX,
        cy = SLIDE_CY,
        alpha = alpha,
    )
}

/// Shared background state for every slide of one export
struct SlideStyle<'a> {
    options: &'a ExportOptions,
    background: String,
    text_color: String,
    accent: String,
    has_image: bool,
}

impl<'a> SlideStyle<'a> {
    fn new(options: &'a ExportOptions, has_image: bool) -> Self {
        Self {
            options,
            background: ooxml_hex(&options.style.adjusted_background()),
            text_color: ooxml_hex(&options.style.text_color()),
            accent: ooxml_hex(options.accent()),
            has_image,
        }
    }

    fn background_xml(&self) -> String {
        if self.has_image {
            r#"<p:bg><p:bgPr><a:blipFill dpi="0" rotWithShape="1"><a:blip r:embed="rId2"/><a:srcRect/><a:stretch><a:fillRect/></a:stretch></a:blipFill><a:effectLst/></p:bgPr></p:bg>"#.to_string()
        } else {
            format!(
                r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
                self.background
            )
        }
    }

    fn overlay(&self) -> Option<i32> {
        let brightness = self.options.style.clamped_brightness();
        (self.has_image && brightness < 100).then_some(brightness)
    }
}

fn slide_xml(style: &SlideStyle, shapes: &[TextBox]) -> String {
    let mut tree = String::new();
    let mut next_id = 2;
    if let Some(transparency) = style.overlay() {
        tree.push_str(&overlay_xml(next_id, transparency));
        next_id += 1;
    }
    for (offset, text_box) in shapes.iter().enumerate() {
        tree.push_str(&text_box.to_xml(next_id + offset));
    }

    format!(
        r#"{header}
<p:sld {ns}><p:cSld>{bg}<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>{tree}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        header = XML_HEADER,
        ns = NS,
        bg = style.background_xml(),
        tree = tree,
    )
}

fn title_slide_xml(style: &SlideStyle, title: &TitleSlide) -> String {
    let author_line = title.author.as_ref().map(|author| format!("Otè: {}", author));
    let mut shapes = Vec::new();

    let mut heading = TextBox::new("Title", &title.title, 1.0, 2.5, 8.0, 1.0);
    heading.size_pt = 44;
    heading.bold = true;
    heading.color = style.text_color.clone();
    heading.font = Some(&style.options.style.font);
    heading.middle = true;
    shapes.push(heading);

    if let Some(author_line) = &author_line {
        let mut author = TextBox::new("Author", author_line, 1.0, 4.0, 8.0, 0.5);
        author.italic = true;
        author.color = style.accent.clone();
        shapes.push(author);
    }

    slide_xml(style, &shapes)
}

fn content_slide_xml(style: &SlideStyle, slide: &DeckSlide, is_song: bool) -> String {
    let part_label = slide.label.as_ref().map(|l| l.to_uppercase());
    let mut shapes = Vec::new();

    if let Some(church) = style.options.church_name() {
        let mut label = TextBox::new("Church Name", church, 0.5, 0.3, 9.0, 0.5);
        label.size_pt = 14;
        label.italic = true;
        label.align = Align::Right;
        label.color = style.accent.clone();
        shapes.push(label);
    }

    if let Some(part_label) = &part_label {
        let mut label = TextBox::new("Part", part_label, 0.5, 0.3, 9.0, 0.5);
        label.size_pt = 14;
        label.bold = true;
        label.align = Align::Left;
        label.color = style.accent.clone();
        shapes.push(label);
    }

    let base_size = style.options.style.font_size;
    let mut body = TextBox::new("Slide Text", &slide.text, 1.0, 1.0, 8.0, 3.375);
    body.size_pt = if slide.is_dense() {
        base_size.saturating_sub(8).max(1)
    } else {
        base_size.max(1)
    };
    body.color = style.text_color.clone();
    body.font = Some(&style.options.style.font);
    body.middle = true;
    shapes.push(body);

    if let Some(caption) = &slide.caption {
        let mut reference = TextBox::new("Caption", caption, 0.5, 4.8, 9.0, 0.5);
        reference.size_pt = if is_song { 12 } else { 18 };
        reference.bold = !is_song;
        reference.color = style.accent.clone();
        shapes.push(reference);
    }

    slide_xml(style, &shapes)
}

/// Title written to the document properties
fn document_title(deck: &Deck) -> String {
    deck.title
        .as_ref()
        .map(|t| t.title.clone())
        .unwrap_or_else(|| deck.stem.replace('_', " "))
}

/// Build a complete PPTX archive in memory.
///
/// One slide per deck slide, preceded by the title slide for songs.
pub fn build_pptx(
    deck: &Deck,
    options: &ExportOptions,
    background: Option<&BackgroundImage>,
) -> Result<Vec<u8>> {
    let style = SlideStyle::new(options, background.is_some());
    let is_song = deck.title.is_some();

    let mut slides: Vec<String> = Vec::with_capacity(deck.page_count());
    if let Some(title) = &deck.title {
        slides.push(title_slide_xml(&style, title));
    }
    for slide in &deck.slides {
        slides.push(content_slide_xml(&style, slide, is_song));
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = FileOptions::default();

    info!("Creating PPTX structure: [Content_Types].xml");
    zip.start_file("[Content_Types].xml", opts)?;
    let content_types = format!(
        r#"{header}
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="jpeg" ContentType="image/jpeg"/><Default Extension="png" ContentType="image/png"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>{slides}</Types>"#,
        header = XML_HEADER,
        slides = (1..=slides.len())
            .map(|i| format!(r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#, i))
            .collect::<String>()
    );
    zip.write_all(content_types.as_bytes())?;

    info!("Creating PPTX structure: _rels/.rels");
    zip.start_file("_rels/.rels", opts)?;
    let rels = format!(
        r#"{}
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/></Relationships>"#,
        XML_HEADER
    );
    zip.write_all(rels.as_bytes())?;

    info!("Creating PPTX structure: docProps");
    zip.start_file("docProps/app.xml", opts)?;
    let app_xml = format!(
        r#"{}
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>bibslide</Application><PresentationFormat>On-screen Show (16:9)</PresentationFormat><Slides>{}</Slides></Properties>"#,
        XML_HEADER,
        slides.len()
    );
    zip.write_all(app_xml.as_bytes())?;

    zip.start_file("docProps/core.xml", opts)?;
    let core_xml = format!(
        r#"{}
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{}</dc:title><dc:creator>bibslide</dc:creator><dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created><cp:revision>1</cp:revision></cp:coreProperties>"#,
        XML_HEADER,
        escape(&document_title(deck)),
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );
    zip.write_all(core_xml.as_bytes())?;

    info!("Creating PPTX structure: ppt/_rels/presentation.xml.rels");
    zip.start_file("ppt/_rels/presentation.xml.rels", opts)?;
    let mut pres_rels = format!(
        r#"{}
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/>"#,
        XML_HEADER
    );
    for i in 1..=slides.len() {
        pres_rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
            i + 2,
            i
        ));
    }
    pres_rels.push_str("</Relationships>");
    zip.write_all(pres_rels.as_bytes())?;

    info!("Creating PPTX structure: ppt/presentation.xml");
    zip.start_file("ppt/presentation.xml", opts)?;
    let presentation_xml = format!(
        r#"{header}
<p:presentation {ns} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{slide_ids}</p:sldIdLst><p:sldSz cx="{cx}" cy="{cy}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
        header = XML_HEADER,
        ns = NS,
        slide_ids = (1..=slides.len())
            .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + i, i + 2))
            .collect::<String>(),
        cx = SLIDE_CX,
        cy = SLIDE_CY
    );
    zip.write_all(presentation_xml.as_bytes())?;

    info!("Creating PPTX structure: master, layout and theme");
    zip.start_file("ppt/slideMasters/slideMaster1.xml", opts)?;
    zip.write_all(slide_master_xml().as_bytes())?;
    zip.start_file("ppt/slideMasters/_rels/slideMaster1.xml.rels", opts)?;
    zip.write_all(
        format!(
            r#"{}
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/></Relationships>"#,
            XML_HEADER
        )
        .as_bytes(),
    )?;
    zip.start_file("ppt/slideLayouts/slideLayout1.xml", opts)?;
    zip.write_all(slide_layout_xml().as_bytes())?;
    zip.start_file("ppt/slideLayouts/_rels/slideLayout1.xml.rels", opts)?;
    zip.write_all(
        format!(
            r#"{}
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#,
            XML_HEADER
        )
        .as_bytes(),
    )?;
    zip.start_file("ppt/theme/theme1.xml", opts)?;
    zip.write_all(theme_xml().as_bytes())?;

    let media_name = background.map(|image| format!("background.{}", image.extension()));
    if let (Some(image), Some(name)) = (background, &media_name) {
        info!("Adding background image to PPTX: ppt/media/{}", name);
        zip.start_file(format!("ppt/media/{}", name), opts)?;
        zip.write_all(&image.bytes)?;
    }

    for (i, slide) in slides.iter().enumerate() {
        let slide_num = i + 1;
        info!("Creating slide XML: ppt/slides/slide{}.xml", slide_num);

        zip.start_file(format!("ppt/slides/_rels/slide{}.xml.rels", slide_num), opts)?;
        let image_rel = media_name
            .as_ref()
            .map(|name| {
                format!(
                    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/{}"/>"#,
                    name
                )
            })
            .unwrap_or_default();
        let slide_rels = format!(
            r#"{}
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>{}</Relationships>"#,
            XML_HEADER, image_rel
        );
        zip.write_all(slide_rels.as_bytes())?;

        zip.start_file(format!("ppt/slides/slide{}.xml", slide_num), opts)?;
        zip.write_all(slide.as_bytes())?;
    }

    info!("Finalizing PPTX archive");
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn slide_master_xml() -> String {
    format!(
        r#"{header}
<p:sldMaster {ns}><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst><p:txStyles><p:titleStyle><a:lvl1pPr><a:defRPr sz="4400"/></a:lvl1pPr></p:titleStyle><p:bodyStyle><a:lvl1pPr><a:defRPr sz="3200"/></a:lvl1pPr></p:bodyStyle><p:otherStyle><a:lvl1pPr><a:defRPr sz="1800"/></a:lvl1pPr></p:otherStyle></p:txStyles></p:sldMaster>"#,
        header = XML_HEADER,
        ns = NS
    )
}

fn slide_layout_xml() -> String {
    format!(
        r#"{header}
<p:sldLayout {ns} type="blank" preserve="1"><p:cSld name="Blank"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        header = XML_HEADER,
        ns = NS
    )
}

fn theme_xml() -> String {
    let colors = [
        ("dk1", "000000"),
        ("lt1", "FFFFFF"),
        ("dk2", "1E293B"),
        ("lt2", "F8FAFC"),
        ("accent1", "4F46E5"),
        ("accent2", "6366F1"),
        ("accent3", "60A5FA"),
        ("accent4", "F59E0B"),
        ("accent5", "34D399"),
        ("accent6", "1E3A8A"),
        ("hlink", "0563C1"),
        ("folHlink", "954F72"),
    ]
    .iter()
    .map(|(name, hex)| format!(r#"<a:{name}><a:srgbClr val="{hex}"/></a:{name}>"#))
    .collect::<String>();

    let fill = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = r#"<a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#;
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";

    format!(
        r#"{header}
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="bibslide"><a:themeElements><a:clrScheme name="bibslide">{colors}</a:clrScheme><a:fontScheme name="bibslide"><a:majorFont><a:latin typeface="Arial"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Arial"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="bibslide"><a:fillStyleLst>{fill}{fill}{fill}</a:fillStyleLst><a:lnStyleLst>{line}{line}{line}</a:lnStyleLst><a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst><a:bgFillStyleLst>{fill}{fill}{fill}</a:bgFillStyleLst></a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"#,
        header = XML_HEADER,
        colors = colors,
        fill = fill,
        line = line,
        effect = effect
    )
}
