use anyhow::Result;

use crate::page_range::{format_page_set, resolve_page_set};

pub fn run(expression: &str, total: u32) -> Result<()> {
    let pages = resolve_page_set(expression, total);

    if pages.is_empty() {
        anyhow::bail!("No valid pages in {:?} for a {}-page document", expression, total);
    }

    let listed: Vec<String> = pages.iter().map(u32::to_string).collect();
    println!("Pages: {}", listed.join(","));
    println!("Compact: {}", format_page_set(&pages));
    println!("Count: {}", pages.len());

    Ok(())
}
