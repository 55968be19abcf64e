//! Per-page text extraction with vertical positions.
//!
//! This is the collaborator that turns document bytes into ordered
//! [`PageText`]s for the marker scanner. Two formats are supported:
//!
//! - **PDF** via `lopdf`: each page's content stream is walked, tracking the
//!   text and graphics matrices, and text shown on the same baseline is
//!   joined into one run positioned at that baseline (PDF user space, origin
//!   bottom-left). Strings are decoded through the page's font encodings.
//!   A page that comes back empty or garbled is re-read with `pdf-extract`,
//!   with synthetic line coordinates.
//! - **Plain text**: pages are separated by form feeds, one run per line.
//!
//! Pages may be extracted concurrently, see [`extract_pages`]; results are
//! always reassembled in page order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clause_nav_core::{CoordinateOrigin, PageText, TextRun};
use lopdf::content::Content;
use lopdf::{Object, ObjectId};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";

/// Baselines closer than this are treated as the same line.
const SAME_LINE_EPSILON: f64 = 0.5;
/// `TJ` adjustments below this (thousandths of an em) read as a word gap.
const TJ_WORD_GAP: f64 = -250.0;
/// Glyph advance as a fraction of the font size. No font metrics are read.
const APPROX_CHAR_WIDTH: f64 = 0.5;
/// A jump further right than this past the end of the previous text starts
/// a new run, so columns sharing a baseline stay apart.
const COLUMN_GAP_EMS: f64 = 4.0;
/// Used when text is shown before any `Tf`.
const DEFAULT_FONT_SIZE: f64 = 12.0;
/// Share of unreadable characters above which a page counts as garbled.
const GARBAGE_THRESHOLD: f64 = 0.15;

/// Extraction failure for one document. Other documents are unaffected.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),
    #[error("document is {size} bytes, larger than the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("text extraction failed: {0}")]
    Text(String),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("page {page}: {reason}")]
    Page { page: u32, reason: String },
    #[error("extraction task failed: {0}")]
    Task(String),
}

/// A document opened for page-by-page extraction.
///
/// Implementations must be safe to call from several blocking threads at
/// once; [`extract_pages`] fans pages out across the blocking pool.
pub trait PageExtractor: Send + Sync {
    fn page_count(&self) -> u32;

    /// Extract the 1-based page `number`.
    fn extract_page(&self, number: u32) -> Result<PageText, ExtractError>;

    /// Vertical axis convention of the coordinates this extractor reports.
    fn coordinate_origin(&self) -> CoordinateOrigin;

    /// Alternative extraction for a page whose text came back empty or
    /// garbled, usually a font encoding the primary path cannot read.
    fn fallback_page(&self, _number: u32) -> Result<Option<PageText>, ExtractError> {
        Ok(None)
    }
}

/// Ordered pages of one document plus the coordinate convention they use.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub pages: Vec<PageText>,
    pub origin: CoordinateOrigin,
}

/// Guess a content type from magic bytes, then from the file extension.
pub fn detect_content_type(path: &Path, head: &[u8]) -> Option<&'static str> {
    if head.starts_with(b"%PDF-") {
        return Some(MIME_PDF);
    }
    let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(MIME_PDF),
        "txt" | "text" | "md" => Some(MIME_TEXT),
        _ => None,
    }
}

/// Open `bytes` with the extractor for `content_type`.
pub fn open_extractor(
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<Arc<dyn PageExtractor>, ExtractError> {
    match content_type {
        MIME_PDF => Ok(Arc::new(PdfPages::open(bytes)?)),
        MIME_TEXT => Ok(Arc::new(PlainPages::open(bytes)?)),
        _ => Err(ExtractError::UnsupportedContentType(
            content_type.to_string(),
        )),
    }
}

/// Extract every page of a document, at most `concurrency` pages at a time.
///
/// The first page failure aborts the whole document.
pub async fn extract_pages(
    bytes: Vec<u8>,
    content_type: &str,
    concurrency: usize,
) -> Result<ExtractedDocument, ExtractError> {
    let content_type = content_type.to_string();
    let extractor = tokio::task::spawn_blocking(move || open_extractor(bytes, &content_type))
        .await
        .map_err(|e| ExtractError::Task(e.to_string()))??;

    extract_with(extractor, concurrency).await
}

/// Drive an already opened extractor. Exposed for custom extractors.
pub async fn extract_with(
    extractor: Arc<dyn PageExtractor>,
    concurrency: usize,
) -> Result<ExtractedDocument, ExtractError> {
    let count = extractor.page_count();
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for number in 1..=count {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ExtractError::Task(e.to_string()))?;
        let extractor = extractor.clone();
        tasks.spawn_blocking(move || {
            let _permit = permit;
            (number, extract_checked(extractor.as_ref(), number))
        });
    }

    let mut slots: Vec<Option<PageText>> = vec![None; count as usize];
    while let Some(joined) = tasks.join_next().await {
        let (number, page) = joined.map_err(|e| ExtractError::Task(e.to_string()))?;
        slots[(number - 1) as usize] = Some(page?);
    }

    Ok(ExtractedDocument {
        pages: slots.into_iter().flatten().collect(),
        origin: extractor.coordinate_origin(),
    })
}

/// Extract one page, numbered by its slot, falling back when it is unreadable.
fn extract_checked(extractor: &dyn PageExtractor, number: u32) -> Result<PageText, ExtractError> {
    let mut page = extractor.extract_page(number)?;
    page.number = number;
    if is_readable(&page) {
        return Ok(page);
    }
    match extractor.fallback_page(number)? {
        Some(mut alternative) if is_readable(&alternative) => {
            tracing::debug!(page = number, "using fallback text extraction");
            alternative.number = number;
            Ok(alternative)
        }
        _ => Ok(page),
    }
}

/// Whether a page has text and little of it is control, replacement or
/// private-use characters.
fn is_readable(page: &PageText) -> bool {
    let mut total = 0usize;
    let mut garbage = 0usize;
    for c in page.runs.iter().flat_map(|r| r.text.chars()) {
        total += 1;
        if is_garbage(c) {
            garbage += 1;
        }
    }
    total > 0 && garbage as f64 <= GARBAGE_THRESHOLD * total as f64
}

fn is_garbage(c: char) -> bool {
    matches!(c, '\u{FFFD}' | '\u{E000}'..='\u{F8FF}')
        || (c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
}

// ─── Plain text ─────────────────────────────────────────────────────────

/// Plain text document, paged on form feed characters.
pub struct PlainPages {
    pages: Vec<String>,
}

impl PlainPages {
    pub fn open(bytes: Vec<u8>) -> Result<Self, ExtractError> {
        let text = String::from_utf8(bytes).map_err(|e| ExtractError::Text(e.to_string()))?;
        let mut pages: Vec<String> = text.split('\x0c').map(str::to_string).collect();
        if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
            pages.pop();
        }
        Ok(Self { pages })
    }
}

impl PageExtractor for PlainPages {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn extract_page(&self, number: u32) -> Result<PageText, ExtractError> {
        let text = page_slot(&self.pages, number)?;
        let runs = text
            .lines()
            .enumerate()
            .map(|(i, line)| TextRun::new(line, i as f64))
            .collect();
        Ok(PageText::new(number, runs))
    }

    fn coordinate_origin(&self) -> CoordinateOrigin {
        CoordinateOrigin::TopDown
    }
}

fn page_slot<T>(pages: &[T], number: u32) -> Result<&T, ExtractError> {
    number
        .checked_sub(1)
        .and_then(|i| pages.get(i as usize))
        .ok_or_else(|| ExtractError::Page {
            page: number,
            reason: format!("document has {} pages", pages.len()),
        })
}

// ─── PDF ────────────────────────────────────────────────────────────────

/// PDF document parsed with `lopdf`.
pub struct PdfPages {
    doc: lopdf::Document,
    page_ids: Vec<ObjectId>,
    bytes: Vec<u8>,
    /// `pdf-extract` text per page, computed on the first fallback.
    fallback: OnceCell<Option<Vec<String>>>,
}

impl PdfPages {
    pub fn open(bytes: Vec<u8>) -> Result<Self, ExtractError> {
        let doc = lopdf::Document::load_mem(&bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(ExtractError::Pdf("document is encrypted".to_string()));
        }
        // `get_pages` is keyed by page number, so values come out in order.
        let page_ids = doc.get_pages().into_values().collect();
        Ok(Self {
            doc,
            page_ids,
            bytes,
            fallback: OnceCell::new(),
        })
    }
}

impl PageExtractor for PdfPages {
    fn page_count(&self) -> u32 {
        self.page_ids.len() as u32
    }

    fn extract_page(&self, number: u32) -> Result<PageText, ExtractError> {
        let page_id = *page_slot(&self.page_ids, number)?;
        let page_err = |reason: String| ExtractError::Page {
            page: number,
            reason,
        };
        let data = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| page_err(e.to_string()))?;
        let content = Content::decode(&data).map_err(|e| page_err(e.to_string()))?;

        let encodings: BTreeMap<Vec<u8>, _> = self
            .doc
            .get_page_fonts(page_id)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(name, font)| match font.get_font_encoding(&self.doc) {
                Ok(encoding) => Some((name, encoding)),
                Err(e) => {
                    tracing::debug!(
                        page = number,
                        font = %String::from_utf8_lossy(&name),
                        error = %e,
                        "unreadable font encoding"
                    );
                    None
                }
            })
            .collect();

        let mut walker = TextWalker::new(move |font: &[u8], bytes: &[u8]| {
            encodings
                .get(font)
                .and_then(|encoding| lopdf::Document::decode_text(encoding, bytes).ok())
        });
        for op in &content.operations {
            walker.apply(&op.operator, &op.operands);
        }
        Ok(PageText::new(number, walker.finish()))
    }

    fn coordinate_origin(&self) -> CoordinateOrigin {
        CoordinateOrigin::BottomUp
    }

    fn fallback_page(&self, number: u32) -> Result<Option<PageText>, ExtractError> {
        let texts = self.fallback.get_or_init(|| {
            match pdf_extract::extract_text_from_mem_by_pages(&self.bytes) {
                Ok(texts) => Some(texts),
                Err(e) => {
                    tracing::warn!(error = %e, "fallback PDF text extraction failed");
                    None
                }
            }
        });
        let Some(text) = texts
            .as_ref()
            .and_then(|texts| texts.get(number.checked_sub(1)? as usize))
        else {
            return Ok(None);
        };

        let lines: Vec<&str> = text.lines().collect();
        let top = lines.len() as f64;
        let runs = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(j, line)| TextRun::new(*line, top - j as f64))
            .collect();
        Ok(Some(PageText::new(number, runs)))
    }
}

/// Affine matrix `[a b c d e f]` in PDF's row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f64; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translate(tx: f64, ty: f64) -> Matrix {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self × other`
    fn then(&self, other: &Matrix) -> Matrix {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }
}

/// Decodes a shown string for the font resource name selected by `Tf`.
type FontDecoder<'a> = Box<dyn Fn(&[u8], &[u8]) -> Option<String> + 'a>;

/// Text collected for the current baseline.
struct OpenLine {
    text: String,
    y: f64,
    /// Start of the most recent chunk.
    last_x: f64,
    /// Estimated end of the text shown so far.
    end_x: f64,
}

/// Content stream interpreter that only tracks what text positioning needs.
struct TextWalker<'a> {
    decode: FontDecoder<'a>,
    font: Vec<u8>,
    font_size: f64,
    ctm: Matrix,
    saved: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    leading: f64,
    moved: bool,
    line: Option<OpenLine>,
    runs: Vec<TextRun>,
}

impl Default for TextWalker<'_> {
    fn default() -> Self {
        Self::new(|_: &[u8], _: &[u8]| None)
    }
}

impl<'a> TextWalker<'a> {
    fn new(decode: impl Fn(&[u8], &[u8]) -> Option<String> + 'a) -> Self {
        Self {
            decode: Box::new(decode),
            font: Vec::new(),
            font_size: 0.0,
            ctm: Matrix::IDENTITY,
            saved: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            leading: 0.0,
            moved: false,
            line: None,
            runs: Vec::new(),
        }
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "q" => self.saved.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.saved.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.ctm = m.then(&self.ctm);
                }
            }
            "BT" => {
                self.tm = Matrix::IDENTITY;
                self.tlm = Matrix::IDENTITY;
            }
            "Tf" => {
                if let [name, size] = operands {
                    if let Object::Name(name) = name {
                        self.font = name.clone();
                    }
                    if let Some(size) = number(size) {
                        self.font_size = size;
                    }
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.tm = m;
                    self.tlm = m;
                    self.moved = true;
                }
            }
            "Td" => {
                if let [tx, ty] = operands {
                    if let (Some(tx), Some(ty)) = (number(tx), number(ty)) {
                        self.move_line(tx, ty);
                    }
                }
            }
            "TD" => {
                if let [tx, ty] = operands {
                    if let (Some(tx), Some(ty)) = (number(tx), number(ty)) {
                        self.leading = -ty;
                        self.move_line(tx, ty);
                    }
                }
            }
            "TL" => {
                if let Some(tl) = operands.first().and_then(number) {
                    self.leading = tl;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(text) = operands.first().and_then(|o| self.text_of(o)) {
                    self.show(&text);
                }
            }
            "'" => {
                self.next_line();
                if let Some(text) = operands.first().and_then(|o| self.text_of(o)) {
                    self.show(&text);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(text) = operands.get(2).and_then(|o| self.text_of(o)) {
                    self.show(&text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let mut text = String::new();
                    for item in items {
                        if let Some(s) = self.text_of(item) {
                            text.push_str(&s);
                        } else if number(item).is_some_and(|n| n < TJ_WORD_GAP) {
                            text.push(' ');
                        }
                    }
                    self.show(&text);
                }
            }
            _ => {}
        }
    }

    /// Decode a string operand with the current font, or byte-wise when the
    /// font is unknown or cannot decode it.
    fn text_of(&self, obj: &Object) -> Option<String> {
        match obj {
            Object::String(bytes, _) => {
                Some((self.decode)(&self.font, bytes).unwrap_or_else(|| decode_pdf_string(bytes)))
            }
            _ => None,
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.tlm = Matrix::translate(tx, ty).then(&self.tlm);
        self.tm = self.tlm;
        self.moved = true;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn show(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let [a, b, _, _, x, y] = self.tm.then(&self.ctm).0;
        let size = if self.font_size > 0.0 {
            self.font_size
        } else {
            DEFAULT_FONT_SIZE
        };
        let em = size * a.hypot(b);
        let width = text.chars().count() as f64 * APPROX_CHAR_WIDTH * em;
        let moved = std::mem::take(&mut self.moved);

        if let Some(line) = &mut self.line {
            let same_baseline = (line.y - y).abs() <= SAME_LINE_EPSILON;
            // Without a positioning op the text matrix is not advanced, so
            // the chunk simply continues the line.
            let continues = !moved
                || (x >= line.last_x - SAME_LINE_EPSILON && x - line.end_x <= COLUMN_GAP_EMS * em);
            if same_baseline && continues {
                if moved
                    && !line.text.ends_with(char::is_whitespace)
                    && !text.starts_with(char::is_whitespace)
                {
                    line.text.push(' ');
                }
                line.text.push_str(text);
                if moved {
                    line.last_x = x;
                    line.end_x = x + width;
                } else {
                    line.end_x += width;
                }
                return;
            }
        }

        self.flush();
        self.line = Some(OpenLine {
            text: text.to_string(),
            y,
            last_x: x,
            end_x: x + width,
        });
    }

    fn flush(&mut self) {
        if let Some(line) = self.line.take() {
            self.runs.push(TextRun::new(line.text, line.y));
        }
    }

    fn finish(mut self) -> Vec<TextRun> {
        self.flush();
        self.runs
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    if operands.len() != 6 {
        return None;
    }
    let mut m = [0.0; 6];
    for (slot, obj) in m.iter_mut().zip(operands) {
        *slot = number(obj)?;
    }
    Some(Matrix(m))
}

/// UTF-16BE when BOM-prefixed, otherwise one char per byte.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::StringFormat;

    fn s(text: &str) -> Object {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    }

    fn n(v: i64) -> Object {
        Object::Integer(v)
    }

    fn walk(ops: &[(&str, Vec<Object>)]) -> Vec<TextRun> {
        let mut walker = TextWalker::default();
        for (op, operands) in ops {
            walker.apply(op, operands);
        }
        walker.finish()
    }

    #[test]
    fn unsupported_content_type_returns_error() {
        let err = open_extractor(b"foo".to_vec(), "application/octet-stream")
            .err()
            .unwrap();
        assert!(matches!(err, ExtractError::UnsupportedContentType(_)));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = open_extractor(b"not a pdf".to_vec(), MIME_PDF).err().unwrap();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn detects_content_type() {
        assert_eq!(detect_content_type(Path::new("a.bin"), b"%PDF-1.4"), Some(MIME_PDF));
        assert_eq!(detect_content_type(Path::new("a.PDF"), b""), Some(MIME_PDF));
        assert_eq!(detect_content_type(Path::new("notes.txt"), b"1.1"), Some(MIME_TEXT));
        assert_eq!(detect_content_type(Path::new("image.png"), b"\x89PNG"), None);
    }

    #[test]
    fn td_positions_and_same_line_joining() {
        let runs = walk(&[
            ("BT", vec![]),
            ("Td", vec![n(72), n(700)]),
            ("Tj", vec![s("1.1")]),
            ("Td", vec![n(30), n(0)]),
            ("Tj", vec![s("Scope")]),
            ("Td", vec![n(-30), n(-100)]),
            ("Tj", vec![s("Body text")]),
            ("ET", vec![]),
        ]);
        assert_eq!(runs, vec![TextRun::new("1.1 Scope", 700.0), TextRun::new("Body text", 600.0)]);
    }

    #[test]
    fn tm_leading_and_quote_operators() {
        let runs = walk(&[
            ("BT", vec![]),
            ("Tm", vec![n(1), n(0), n(0), n(1), n(50), n(800)]),
            ("TL", vec![n(14)]),
            ("Tj", vec![s("2.1 Definitions")]),
            ("'", vec![s("second")]),
            ("T*", vec![]),
            (
                "TJ",
                vec![Object::Array(vec![s("third"), Object::Integer(-400), s("line")])],
            ),
            ("ET", vec![]),
        ]);
        let ys: Vec<f64> = runs.iter().map(|r| r.y).collect();
        assert_eq!(ys, vec![800.0, 786.0, 772.0]);
        assert_eq!(runs[2].text, "third line");
    }

    #[test]
    fn ctm_translation_applies_to_baseline() {
        let runs = walk(&[
            ("q", vec![]),
            ("cm", vec![n(1), n(0), n(0), n(1), n(0), n(100)]),
            ("BT", vec![]),
            ("Td", vec![n(0), n(500)]),
            ("Tj", vec![s("3.1 Fees")]),
            ("ET", vec![]),
            ("Q", vec![]),
            ("BT", vec![]),
            ("Td", vec![n(0), n(500)]),
            ("Tj", vec![s("3.2 Costs")]),
            ("ET", vec![]),
        ]);
        assert_eq!(runs[0].y, 600.0);
        assert_eq!(runs[1].y, 500.0);
    }

    #[test]
    fn utf16_strings_decode() {
        let bytes = [0xFE, 0xFF, 0x00, 0x31, 0x00, 0x2E, 0x00, 0x32];
        assert_eq!(decode_pdf_string(&bytes), "1.2");
    }

    #[test]
    fn plain_text_pages_split_on_form_feed() {
        let doc = PlainPages::open(b"1.1 Scope\nbody\x0c2.1 Definitions\n\x0c".to_vec()).unwrap();
        assert_eq!(doc.page_count(), 2);
        let page = doc.extract_page(2).unwrap();
        assert_eq!(page.number, 2);
        assert_eq!(page.runs[0].text, "2.1 Definitions");
        assert!(doc.extract_page(3).is_err());
        assert!(doc.extract_page(0).is_err());
    }

    #[test]
    fn columns_sharing_a_baseline_stay_separate() {
        let runs = walk(&[
            ("BT", vec![]),
            ("Td", vec![n(72), n(500)]),
            ("Tj", vec![s("the insurer shall pay")]),
            ("Td", vec![n(250), n(0)]),
            ("Tj", vec![s("3.2 Exclusions")]),
            ("ET", vec![]),
        ]);
        assert_eq!(
            runs,
            vec![
                TextRun::new("the insurer shall pay", 500.0),
                TextRun::new("3.2 Exclusions", 500.0),
            ]
        );
    }

    #[test]
    fn moving_left_on_a_baseline_starts_a_new_run() {
        let runs = walk(&[
            ("BT", vec![]),
            ("Tf", vec![Object::Name(b"F1".to_vec()), n(10)]),
            ("Td", vec![n(300), n(400)]),
            ("Tj", vec![s("continued")]),
            ("Td", vec![n(-228), n(0)]),
            ("Tj", vec![s("4.1 Claims")]),
            ("ET", vec![]),
        ]);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].text, "4.1 Claims");
    }

    #[test]
    fn strings_decode_through_the_selected_font() {
        // F1 maps codes 1..=4 to "1", ".", " ", "S"; F2 is unknown.
        let mut walker = TextWalker::new(|font: &[u8], bytes: &[u8]| {
            (font == b"F1").then(|| {
                bytes
                    .iter()
                    .map(|b| match b {
                        1 => '1',
                        2 => '.',
                        3 => ' ',
                        4 => 'S',
                        _ => '?',
                    })
                    .collect()
            })
        });
        let coded = Object::String(vec![1, 2, 1, 3, 4], StringFormat::Hexadecimal);
        walker.apply("BT", &[]);
        walker.apply("Tf", &[Object::Name(b"F1".to_vec()), n(12)]);
        walker.apply("Td", &[n(72), n(700)]);
        walker.apply("Tj", &[coded]);
        walker.apply("Tf", &[Object::Name(b"F2".to_vec()), n(12)]);
        walker.apply("Td", &[n(0), n(-20)]);
        walker.apply("Tj", &[s("plain")]);
        walker.apply("ET", &[]);
        let runs = walker.finish();
        assert_eq!(runs[0].text, "1.1 S");
        assert_eq!(runs[1].text, "plain");
    }

    #[test]
    fn control_characters_make_a_page_unreadable() {
        let garbled = PageText::new(1, vec![TextRun::new("\u{1}\u{2}\u{1}\u{3}Scope", 700.0)]);
        let clean = PageText::new(1, vec![TextRun::new("1.1 Scope", 700.0)]);
        let empty = PageText::new(1, vec![]);
        assert!(!is_readable(&garbled));
        assert!(is_readable(&clean));
        assert!(!is_readable(&empty));
        assert!(is_readable(&PageText::new(1, vec![TextRun::new("a\tb", 0.0)])));
    }

    /// Page 2 comes back garbled and misnumbered; the fallback reads it.
    struct GarbledSecondPage;

    impl PageExtractor for GarbledSecondPage {
        fn page_count(&self) -> u32 {
            3
        }

        fn extract_page(&self, number: u32) -> Result<PageText, ExtractError> {
            let text = if number == 2 { "\u{1}\u{2}\u{1}" } else { "1.1 Scope" };
            Ok(PageText::new(0, vec![TextRun::new(text, 700.0)]))
        }

        fn coordinate_origin(&self) -> CoordinateOrigin {
            CoordinateOrigin::BottomUp
        }

        fn fallback_page(&self, number: u32) -> Result<Option<PageText>, ExtractError> {
            Ok(Some(PageText::new(
                number,
                vec![TextRun::new("2.1 Definitions", 1.0)],
            )))
        }
    }

    #[tokio::test]
    async fn garbled_pages_fall_back_one_at_a_time() {
        let doc = extract_with(Arc::new(GarbledSecondPage), 2).await.unwrap();
        let numbers: Vec<u32> = doc.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(doc.pages[0].runs[0].text, "1.1 Scope");
        assert_eq!(doc.pages[1].runs[0].text, "2.1 Definitions");
        assert_eq!(doc.pages[2].runs[0].text, "1.1 Scope");
    }

    #[tokio::test]
    async fn pages_are_reassembled_in_order() {
        let text = (1..=9)
            .map(|i| format!("{}.1 Heading {}", i, i))
            .collect::<Vec<_>>()
            .join("\x0c");
        let doc = extract_pages(text.into_bytes(), MIME_TEXT, 3).await.unwrap();
        let numbers: Vec<u32> = doc.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, (1..=9).collect::<Vec<_>>());
        assert_eq!(doc.pages[4].runs[0].text, "5.1 Heading 5");
        assert_eq!(doc.origin, CoordinateOrigin::TopDown);
    }
}
