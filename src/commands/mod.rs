pub mod info;
pub mod pages;
pub mod trim;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::registry::{check_declared_type, declared_type_for, DocumentRegistry, PDF_CONTENT_TYPE};

/// Expand the command-line inputs into files, in the order given. Directories are
/// walked recursively and contribute their PDF files in sorted order.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry =
                    entry.with_context(|| format!("Failed to walk {}", input.display()))?;
                if entry.file_type().is_file()
                    && declared_type_for(entry.path()) == PDF_CONTENT_TYPE
                {
                    found.push(entry.into_path());
                }
            }
            if found.is_empty() {
                log::warn!("No PDF files under {}", input.display());
            }
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }

    Ok(files)
}

/// Read `path` and add it to `registry`. Returns the registry position on success.
pub fn ingest_file(registry: &mut DocumentRegistry, path: &Path) -> Result<usize> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let declared_type = declared_type_for(path);

    check_declared_type(&name, declared_type)?;

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    registry.ingest(bytes, &name, declared_type)?;

    Ok(registry.len() - 1)
}

/// Ingest every file, reporting failures without stopping.
pub fn ingest_all(registry: &mut DocumentRegistry, files: &[PathBuf]) -> usize {
    let mut rejected = 0;
    for path in files {
        if let Err(e) = ingest_file(registry, path) {
            log::warn!("Skipping {}: {:#}", path.display(), e);
            eprintln!("warning: {:#}", e);
            rejected += 1;
        }
    }
    rejected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::sample_pdf;

    #[test]
    fn test_collect_inputs_walks_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.pdf"), sample_pdf(1)).unwrap();
        std::fs::write(dir.path().join("a.PDF"), sample_pdf(1)).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hi").unwrap();
        std::fs::write(dir.path().join("nested").join("c.pdf"), sample_pdf(1)).unwrap();

        let explicit = dir.path().join("notes.txt");
        let files = collect_inputs(&[explicit.clone(), dir.path().to_path_buf()]).unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["notes.txt", "a.PDF", "b.pdf", "c.pdf"]);
        assert_eq!(files[0], explicit);
    }

    #[test]
    fn test_ingest_all_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.pdf");
        let text = dir.path().join("notes.txt");
        let fake = dir.path().join("fake.pdf");
        let missing = dir.path().join("missing.pdf");
        std::fs::write(&good, sample_pdf(3)).unwrap();
        std::fs::write(&text, b"hi").unwrap();
        std::fs::write(&fake, b"not a pdf").unwrap();

        let mut registry = DocumentRegistry::new();
        let rejected = ingest_all(&mut registry, &[text, good, fake, missing]);

        assert_eq!(rejected, 3);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(0).unwrap().name(), "good.pdf");
        assert_eq!(registry.get(0).unwrap().total_pages(), 3);
    }
}
