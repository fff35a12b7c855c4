use anyhow::Result;
use std::path::PathBuf;

use crate::pdf::PdfDocument;
use crate::registry::DocumentRegistry;

use super::{collect_inputs, ingest_all};

pub fn run(inputs: &[PathBuf]) -> Result<()> {
    let files = collect_inputs(inputs)?;

    let mut registry = DocumentRegistry::new();
    let rejected = ingest_all(&mut registry, &files);

    for doc in registry.iter() {
        println!("File: {}", doc.name());
        println!("Pages: {}", doc.total_pages());
        println!("Range: {}", doc.page_range_expression);

        let info = PdfDocument::load_mem(doc.raw_bytes())?.get_info();
        if let Some(title) = &info.title {
            println!("Title: {}", title);
        }
        if let Some(author) = &info.author {
            println!("Author: {}", author);
        }
        if let Some(producer) = &info.producer {
            println!("Producer: {}", producer);
        }
        println!();
    }

    if rejected > 0 {
        anyhow::bail!("{} file(s) could not be read as PDF", rejected);
    }

    Ok(())
}
