use anyhow::{Context, Result};
use lopdf::{Document, Object, ObjectId, SaveOptions};

use super::compression::CompressionProfile;

/// How far into a buffer the `%PDF-` marker may appear. Readers tolerate leading junk
/// before the header, so this does not have to be at offset zero.
const HEADER_SEARCH_WINDOW: usize = 1024;

#[derive(Debug)]
pub struct PdfDocument {
    pub doc: Document,
}

impl PdfDocument {
    pub fn load_mem(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes).context("Failed to parse PDF")?;
        Ok(Self::from_document(doc))
    }

    pub fn from_document(doc: Document) -> Self {
        PdfDocument { doc }
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get 1-indexed page object IDs
    pub fn page_ids(&self) -> Vec<(u32, ObjectId)> {
        let mut pages: Vec<_> = self.doc.get_pages().into_iter().collect();
        pages.sort_by_key(|(num, _)| *num);
        pages
    }

    /// Whether the trailer carries an encryption dictionary.
    pub fn is_encrypted(&self) -> bool {
        self.doc.trailer.get(b"Encrypt").is_ok()
    }

    /// Get metadata from the document info dictionary
    pub fn get_info(&self) -> PdfInfo {
        let mut info = PdfInfo::default();

        let dict = match self.doc.trailer.get(b"Info") {
            Ok(Object::Reference(info_ref)) => self.doc.get_dictionary(*info_ref).ok(),
            Ok(Object::Dictionary(dict)) => Some(dict),
            _ => None,
        };

        if let Some(dict) = dict {
            info.title = get_string_from_dict(dict, b"Title");
            info.author = get_string_from_dict(dict, b"Author");
            info.producer = get_string_from_dict(dict, b"Producer");
        }

        info.page_count = self.page_count();
        info
    }

    /// Build a new document holding only `pages` (1-indexed), in document order.
    ///
    /// Unselected pages are removed from a copy of the page tree and whatever they alone
    /// referenced is pruned, so fonts and images shared with kept pages survive.
    pub fn select_pages(&self, pages: &[u32]) -> Result<PdfDocument> {
        let all_pages = self.page_ids();
        let total = all_pages.len() as u32;

        for &page in pages {
            if page == 0 || page > total {
                anyhow::bail!("Page {} is out of range (1-{})", page, total);
            }
        }

        let pages_to_delete: Vec<u32> = all_pages
            .iter()
            .filter(|(num, _)| !pages.contains(num))
            .map(|(num, _)| *num)
            .collect();

        let mut new_doc = self.doc.clone();
        if !pages_to_delete.is_empty() {
            new_doc.delete_pages(&pages_to_delete);
            new_doc.prune_objects();
        }

        Ok(PdfDocument { doc: new_doc })
    }

    /// Serialize the document according to `profile`.
    pub fn save_to_vec(&mut self, profile: CompressionProfile) -> Result<Vec<u8>> {
        let policy = profile.policy();
        let mut buffer = Vec::new();

        if policy.compress {
            self.doc.compress();
        } else {
            self.doc.decompress();
        }

        if policy.use_object_streams {
            let mut options = SaveOptions::builder()
                .use_object_streams(true)
                .use_xref_streams(true);
            if let Some(per_stream) = policy.objects_per_stream {
                options = options.max_objects_per_stream(per_stream);
            }
            self.doc
                .save_with_options(&mut buffer, options.build())
                .with_context(|| format!("Failed to save PDF with {} compression", profile))?;
        } else {
            self.doc
                .save_to(&mut buffer)
                .with_context(|| format!("Failed to save PDF with {} compression", profile))?;
        }

        Ok(buffer)
    }
}

/// Cheap check for the `%PDF-` marker before handing bytes to the parser.
pub fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

#[derive(Debug, Default, Clone)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub producer: Option<String>,
    pub page_count: u32,
}

fn get_string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => None,
    })
}

fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    // UTF-16 BE with BOM, otherwise treat as PDFDocEncoding (approximated by Latin-1)
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let u16_chars: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        String::from_utf16(&u16_chars).ok()
    } else {
        Some(bytes.iter().map(|&b| b as char).collect())
    }
}
