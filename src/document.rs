//! Document-to-text conversion.
//!
//! Reads a local file and returns its text as numbered pages:
//!
//! ```text
//! Page 1: first page text on one line
//!
//! Page 2: ...
//! ```
//!
//! PDF is split per page, PPTX per slide, DOCX is a single page, and any
//! other file is read as UTF-8 text (one page). Line breaks inside a page
//! are replaced by spaces.

use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::DocumentError;
use crate::models::Document;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Pdf,
    Docx,
    Pptx,
    Text,
}

impl Format {
    fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Format::Pdf,
            "docx" => Format::Docx,
            "pptx" => Format::Pptx,
            _ => Format::Text,
        }
    }
}

/// Read a document from disk and convert it to page-joined text.
pub async fn read_document(path: &Path) -> Result<Document, DocumentError> {
    let bytes = tokio::fs::read(path).await?;
    let format = Format::from_path(path);

    let pages = tokio::task::spawn_blocking(move || extract_pages(&bytes, format))
        .await
        .map_err(|e| DocumentError::Io(std::io::Error::other(e)))??;

    debug!(path = %path.display(), ?format, pages = pages.len(), "document text extracted");

    Ok(Document {
        path: path.to_path_buf(),
        pages: pages.len(),
        text: join_pages(&pages),
    })
}

/// Join pages as `Page {n}: {text}\n\n`, flattening line breaks.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        let flat = page.as_ref().replace("\r\n", " ").replace(['\n', '\r'], " ");
        out.push_str(&format!("Page {}: {}\n\n", i + 1, flat.trim()));
    }
    out
}

fn extract_pages(bytes: &[u8], format: Format) -> Result<Vec<String>, DocumentError> {
    match format {
        Format::Pdf => pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| DocumentError::Pdf(e.to_string())),
        Format::Docx => extract_docx(bytes).map(|text| vec![text]),
        Format::Pptx => extract_pptx(bytes),
        Format::Text => Ok(vec![String::from_utf8_lossy(bytes).into_owned()]),
    }
}

fn open_archive(bytes: &[u8]) -> Result<zip::ZipArchive<std::io::Cursor<&[u8]>>, DocumentError> {
    zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| DocumentError::Ooxml(e.to_string()))
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
) -> Result<Vec<u8>, DocumentError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| DocumentError::Ooxml(format!("{}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| DocumentError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(DocumentError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, MAX_XML_ENTRY_BYTES
        )));
    }
    Ok(out)
}

fn extract_docx(bytes: &[u8]) -> Result<String, DocumentError> {
    let mut archive = open_archive(bytes)?;
    let xml = read_zip_entry_bounded(&mut archive, "word/document.xml")?;
    text_elements(&xml, "\n")
}

fn extract_pptx(bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
    let mut archive = open_archive(bytes)?;
    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    slide_names.sort_by_key(|name| {
        name.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });

    slide_names
        .iter()
        .map(|name| {
            let xml = read_zip_entry_bounded(&mut archive, name)?;
            text_elements(&xml, " ")
        })
        .collect()
}

/// Concatenate the text of every `<*:t>` element; paragraphs (`<*:p>`) are
/// separated by `paragraph_sep`.
fn text_elements(xml: &[u8], paragraph_sep: &str) -> Result<String, DocumentError> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" if !out.is_empty() && !out.ends_with(paragraph_sep) => {
                    out.push_str(paragraph_sep)
                }
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                let text = te
                    .unescape()
                    .map_err(|e| DocumentError::Ooxml(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(DocumentError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out.trim_end_matches(paragraph_sep).to_string())
}
