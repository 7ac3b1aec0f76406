//! PDF input backed by lopdf.
//!
//! Walks each page's content stream once and records what the layout
//! pipeline needs: text runs with their font size and style, stroked and
//! filled path geometry, and image XObject placements. Everything is
//! converted to a top-left origin.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use super::{
    Curve, DocumentSource, ImagePlacement, LineSegment, PageContent, RawRun, SourceMetadata,
};
use crate::error::{Error, Result};
use crate::geometry::BBox;
use crate::language::is_spaceless_script_char;

/// Default page size (US Letter) when a page has no usable MediaBox.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Filled paths thinner than this are drawn rules rather than shapes.
const FILLED_RULE_THICKNESS: f32 = 3.0;

/// TJ adjustment (thousandths of an em) treated as a word break.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A PDF document opened for layout reconstruction.
pub struct PdfSource {
    doc: LopdfDocument,
    pages: BTreeMap<u32, ObjectId>,
    source_file: Option<String>,
}

impl PdfSource {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let mut source = Self::from_bytes(&data)?;
        source.source_file = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string());
        Ok(source)
    }

    /// Open a PDF held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if !looks_like_pdf(data) {
            return Err(Error::UnknownFormat);
        }

        let doc = LopdfDocument::load_mem(data)?;
        let pages = doc.get_pages();
        log::debug!("PdfSource: opened document with {} pages", pages.len());
        Ok(Self {
            doc,
            pages,
            source_file: None,
        })
    }

    /// PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn page_id(&self, number: u32) -> Result<ObjectId> {
        self.pages
            .get(&number)
            .copied()
            .ok_or(Error::PageOutOfRange(number, self.pages.len() as u32))
    }

    /// Look up a page attribute, following the `Parent` chain for inherited keys.
    fn inherited<'a>(&'a self, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
        let mut dict = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..32 {
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    fn page_size(&self, page_id: ObjectId) -> (f32, f32) {
        let media_box = self
            .inherited(page_id, b"MediaBox")
            .and_then(|obj| obj.as_array().ok())
            .filter(|array| array.len() >= 4)
            .map(|array| {
                let num = |i: usize| number(self.resolve(&array[i])).unwrap_or(0.0);
                ((num(2) - num(0)).abs(), (num(3) - num(1)).abs())
            });

        match media_box {
            Some((w, h)) if w > 0.0 && h > 0.0 => (w, h),
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    fn xobjects(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let resources = self.inherited(page_id, b"Resources")?.as_dict().ok()?;
        let xobjects = resources.get(b"XObject").ok()?;
        self.resolve(xobjects).as_dict().ok()
    }

    fn decode_text(
        &self,
        fonts: &BTreeMap<Vec<u8>, &Dictionary>,
        font: &[u8],
        bytes: &[u8],
    ) -> String {
        if let Some(font_dict) = fonts.get(font) {
            if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }

    fn extract_image(&self, xobjects: &Dictionary, name: &[u8]) -> Result<Option<(String, Vec<u8>)>> {
        let obj = xobjects
            .get(name)
            .map_err(|_| Error::ImageExtract(format!("missing XObject {}", String::from_utf8_lossy(name))))?;
        let stream = match self.resolve(obj) {
            Object::Stream(stream) => stream,
            _ => return Err(Error::ImageExtract("XObject is not a stream".to_string())),
        };

        let is_image = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|s| s.as_name_str().ok())
            == Some("Image");
        if !is_image {
            return Ok(None);
        }

        let filter = match stream.dict.get(b"Filter").map(|f| self.resolve(f)) {
            Ok(Object::Name(n)) => String::from_utf8_lossy(n).to_string(),
            Ok(Object::Array(arr)) => arr
                .last()
                .and_then(|f| f.as_name_str().ok())
                .unwrap_or("")
                .to_string(),
            _ => String::new(),
        };

        let image = match filter.as_str() {
            "DCTDecode" => ("jpeg".to_string(), stream.content.clone()),
            "JPXDecode" => ("jp2".to_string(), stream.content.clone()),
            "" => ("raw".to_string(), stream.content.clone()),
            _ => {
                let decoded = stream
                    .decompressed_content()
                    .map_err(|e| Error::ImageExtract(e.to_string()))?;
                ("raw".to_string(), decoded)
            }
        };
        Ok(Some(image))
    }

    fn extract_metadata(&self) -> SourceMetadata {
        let mut metadata = SourceMetadata {
            source_file: self.source_file.clone(),
            ..Default::default()
        };

        let info = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .map(|obj| self.resolve(obj))
            .and_then(|obj| obj.as_dict().ok());

        if let Some(info) = info {
            metadata.title = get_string_from_dict(info, b"Title").filter(|s| !s.trim().is_empty());
            metadata.author = get_string_from_dict(info, b"Author").filter(|s| !s.trim().is_empty());
            metadata.creation_date =
                get_string_from_dict(info, b"CreationDate").and_then(|d| parse_pdf_date(&d));
            metadata.modification_date =
                get_string_from_dict(info, b"ModDate").and_then(|d| parse_pdf_date(&d));
        }

        metadata
    }

    /// Interpret one page's content stream.
    fn read_page(&self, page_number: u32) -> Result<PageContent> {
        let page_id = self.page_id(page_number)?;
        let (width, height) = self.page_size(page_id);
        let mut page = PageContent::new(page_number, width, height);

        let fonts = self.doc.get_page_fonts(page_id)?;
        let base_fonts: BTreeMap<Vec<u8>, String> = fonts
            .iter()
            .map(|(name, dict)| {
                let base = dict
                    .get(b"BaseFont")
                    .ok()
                    .and_then(|o| o.as_name().ok())
                    .map(|n| String::from_utf8_lossy(n).to_string())
                    .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
                (name.clone(), base)
            })
            .collect();
        let xobjects = self.xobjects(page_id);

        let data = self.doc.get_page_content(page_id)?;
        let content = Content::decode(&data)?;

        let mut state = PageState::new(height);
        for op in &content.operations {
            let operands = &op.operands;
            let num = |i: usize| operands.get(i).and_then(number).unwrap_or(0.0);

            match op.operator.as_str() {
                "q" => state.ctm_stack.push(state.ctm),
                "Q" => {
                    if let Some(ctm) = state.ctm_stack.pop() {
                        state.ctm = ctm;
                    }
                }
                "cm" if operands.len() >= 6 => {
                    let m = Matrix::new(num(0), num(1), num(2), num(3), num(4), num(5));
                    state.ctm = m.multiply(&state.ctm);
                }

                // Text state
                "BT" => {
                    state.tm = Matrix::IDENTITY;
                    state.tlm = Matrix::IDENTITY;
                }
                "Tf" if operands.len() >= 2 => {
                    if let Object::Name(name) = &operands[0] {
                        state.font = name.clone();
                    }
                    state.font_size = num(1);
                }
                "TL" => state.leading = Some(num(0)),
                "Td" => state.move_line(num(0), num(1)),
                "TD" => {
                    state.leading = Some(-num(1));
                    state.move_line(num(0), num(1));
                }
                "Tm" if operands.len() >= 6 => {
                    state.tm = Matrix::new(num(0), num(1), num(2), num(3), num(4), num(5));
                    state.tlm = state.tm;
                }
                "T*" => state.next_line(),

                // Text showing
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        let text = self.decode_text(&fonts, &state.font, bytes);
                        state.show_text(text, &base_fonts, &mut page.runs);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        let mut combined = String::new();
                        for item in items {
                            match item {
                                Object::String(bytes, _) => {
                                    combined.push_str(&self.decode_text(&fonts, &state.font, bytes));
                                }
                                other => {
                                    let adjustment = -number(other).unwrap_or(0.0);
                                    let ends_with_space = combined.ends_with(' ')
                                        || combined.ends_with('\u{00A0}');
                                    if adjustment > TJ_SPACE_THRESHOLD && !ends_with_space {
                                        if let Some(c) = combined.chars().last() {
                                            if !is_spaceless_script_char(c) {
                                                combined.push(' ');
                                            }
                                        }
                                    }
                                }
                            }
                        }
                        state.show_text(combined, &base_fonts, &mut page.runs);
                    }
                }
                "'" | "\"" => {
                    state.next_line();
                    let idx = if op.operator == "\"" { 2 } else { 0 };
                    if let Some(Object::String(bytes, _)) = operands.get(idx) {
                        let text = self.decode_text(&fonts, &state.font, bytes);
                        state.show_text(text, &base_fonts, &mut page.runs);
                    }
                }

                // Path construction
                "m" => state.move_to(num(0), num(1)),
                "l" => state.line_to(num(0), num(1)),
                "re" => state.rectangle(num(0), num(1), num(2), num(3)),
                "h" => state.close_path(),
                "c" => state.curve_to(&[(num(0), num(1)), (num(2), num(3)), (num(4), num(5))]),
                "v" => state.curve_to(&[(num(0), num(1)), (num(2), num(3))]),
                "y" => state.curve_to(&[(num(0), num(1)), (num(2), num(3))]),

                // Path painting
                "S" | "s" | "B" | "B*" | "b" | "b*" => {
                    state.paint(true, &mut page.lines, &mut page.curves);
                }
                "f" | "F" | "f*" => state.paint(false, &mut page.lines, &mut page.curves),
                "n" => state.discard_path(),

                // XObjects
                "Do" => {
                    let (Some(Object::Name(name)), Some(xobjects)) = (operands.first(), xobjects)
                    else {
                        continue;
                    };
                    match self.extract_image(xobjects, name) {
                        Ok(Some((format, data))) => page.images.push(ImagePlacement {
                            bbox: state.unit_square_bbox(),
                            format,
                            data,
                        }),
                        Ok(None) => {}
                        Err(e) => log::warn!("Skipping image on page {}: {}", page_number, e),
                    }
                }
                _ => {}
            }
        }

        log::debug!(
            "PdfSource: page {} has {} runs, {} lines, {} curves, {} images",
            page_number,
            page.runs.len(),
            page.lines.len(),
            page.curves.len(),
            page.images.len()
        );
        Ok(page)
    }
}

impl DocumentSource for PdfSource {
    fn metadata(&self) -> SourceMetadata {
        self.extract_metadata()
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page(&self, number: u32) -> Result<PageContent> {
        self.read_page(number)
    }
}

/// 2D affine transform in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    /// Vertical scale factor.
    fn scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Graphics and text state while walking a content stream.
struct PageState {
    height: f32,
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    font: Vec<u8>,
    font_size: f32,
    leading: Option<f32>,
    current: (f32, f32),
    subpath_start: (f32, f32),
    pending_lines: Vec<LineSegment>,
    pending_curve: Vec<(f32, f32)>,
}

impl PageState {
    fn new(height: f32) -> Self {
        Self {
            height,
            ctm: Matrix::IDENTITY,
            ctm_stack: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            font: Vec::new(),
            font_size: 12.0,
            leading: None,
            current: (0.0, 0.0),
            subpath_start: (0.0, 0.0),
            pending_lines: Vec::new(),
            pending_curve: Vec::new(),
        }
    }

    /// User space to top-left page space.
    fn to_page(&self, x: f32, y: f32) -> (f32, f32) {
        let (px, py) = self.ctm.apply(x, y);
        (px, self.height - py)
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translation(tx, ty).multiply(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = self.leading.unwrap_or(self.font_size * 1.2);
        self.move_line(0.0, -leading);
    }

    fn show_text(&mut self, text: String, base_fonts: &BTreeMap<Vec<u8>, String>, runs: &mut Vec<RawRun>) {
        let char_count = text.chars().count();
        let trm = self.tm.multiply(&self.ctm);
        let size = self.font_size * trm.scale();

        if !text.trim().is_empty() && size > 0.0 {
            let (x, y) = trm.apply(0.0, 0.0);
            let width = char_count as f32 * size * 0.5;
            let top = self.height - (y + size * 0.8);
            let bottom = self.height - (y - size * 0.2);

            let font_name = base_fonts
                .get(&self.font)
                .cloned()
                .unwrap_or_else(|| String::from_utf8_lossy(&self.font).to_string());
            let lower = font_name.to_lowercase();

            runs.push(RawRun {
                text,
                bbox: BBox::new(x, top, x + width, bottom),
                font_size: size,
                bold: lower.contains("bold") || lower.contains("black") || lower.contains("heavy"),
                italic: lower.contains("italic") || lower.contains("oblique"),
                font_name: Some(font_name),
            });
        }

        // Advance past the shown text so consecutive operators do not overlap.
        let advance = char_count as f32 * self.font_size * 0.5;
        self.tm = Matrix::translation(advance, 0.0).multiply(&self.tm);
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.current = self.to_page(x, y);
        self.subpath_start = self.current;
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let to = self.to_page(x, y);
        self.pending_lines
            .push(LineSegment::new(self.current.0, self.current.1, to.0, to.1));
        self.current = to;
    }

    fn rectangle(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.move_to(x, y);
        self.line_to(x + w, y);
        self.line_to(x + w, y + h);
        self.line_to(x, y + h);
        self.close_path();
    }

    fn close_path(&mut self) {
        let (sx, sy) = self.subpath_start;
        if self.current != self.subpath_start {
            self.pending_lines
                .push(LineSegment::new(self.current.0, self.current.1, sx, sy));
        }
        self.current = self.subpath_start;
    }

    fn curve_to(&mut self, points: &[(f32, f32)]) {
        if self.pending_curve.is_empty() {
            self.pending_curve.push(self.current);
        }
        for &(x, y) in points {
            let p = self.to_page(x, y);
            self.pending_curve.push(p);
        }
        if let Some(&last) = self.pending_curve.last() {
            self.current = last;
        }
    }

    /// Flush the pending path. A filled path only yields rules when it is
    /// thin enough to be drawn as one; backgrounds and shaded boxes do not.
    fn paint(&mut self, stroked: bool, lines: &mut Vec<LineSegment>, curves: &mut Vec<Curve>) {
        if stroked || self.pending_is_thin() {
            lines.append(&mut self.pending_lines);
        } else {
            self.pending_lines.clear();
        }
        if self.pending_curve.len() >= 2 {
            curves.push(Curve {
                points: std::mem::take(&mut self.pending_curve),
            });
        }
        self.pending_curve.clear();
    }

    fn pending_is_thin(&self) -> bool {
        let Some(bbox) = self
            .pending_lines
            .iter()
            .map(|l| BBox::new(l.x0, l.y0, l.x1, l.y1))
            .reduce(|a, b| a.union(&b))
        else {
            return false;
        };
        bbox.width().min(bbox.height()) <= FILLED_RULE_THICKNESS
    }

    fn discard_path(&mut self) {
        self.pending_lines.clear();
        self.pending_curve.clear();
    }

    /// Page-space box of the unit square under the current transform.
    fn unit_square_bbox(&self) -> BBox {
        let corners = [
            self.to_page(0.0, 0.0),
            self.to_page(1.0, 0.0),
            self.to_page(0.0, 1.0),
            self.to_page(1.0, 1.0),
        ];
        corners
            .iter()
            .skip(1)
            .fold(BBox::new(corners[0].0, corners[0].1, corners[0].0, corners[0].1), |acc, &(x, y)| {
                acc.union(&BBox::new(x, y, x, y))
            })
    }
}

fn looks_like_pdf(data: &[u8]) -> bool {
    let head = &data[..data.len().min(1024)];
    head.windows(5).any(|w| w == b"%PDF-")
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Decode a string when the font gives no usable encoding.
fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // Latin-1
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_text_simple(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Parse a PDF date (`D:YYYYMMDDHHmmSS+HH'mm'`), normalized to UTC.
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);
    if s.len() < 4 {
        return None;
    }

    let field = |range: std::ops::Range<usize>, default: u32| -> u32 {
        s.get(range).and_then(|v| v.parse().ok()).unwrap_or(default)
    };
    let year: i32 = s.get(0..4)?.parse().ok()?;
    let naive = chrono::NaiveDate::from_ymd_opt(year, field(4..6, 1), field(6..8, 1))?
        .and_hms_opt(field(8..10, 0), field(10..12, 0), field(12..14, 0))?;

    // Timezone suffix: Z, +HH'mm' or -HH'mm'
    let offset_minutes = match s.get(14..15) {
        Some(sign @ ("+" | "-")) => {
            let hours = field(15..17, 0) as i64;
            let minutes = s
                .get(18..20)
                .and_then(|m| m.parse::<i64>().ok())
                .unwrap_or(0);
            let total = hours * 60 + minutes;
            if sign == "-" {
                -total
            } else {
                total
            }
        }
        _ => 0,
    };

    let utc = naive - chrono::Duration::minutes(offset_minutes);
    Some(chrono::DateTime::from_naive_utc_and_offset(utc, chrono::Utc))
}
