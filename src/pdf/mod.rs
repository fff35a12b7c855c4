pub mod compression;
pub mod document;

pub use compression::CompressionProfile;
pub use document::{has_pdf_header, PdfDocument};
