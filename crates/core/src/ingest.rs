use crate::error::ExtractionError;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively lists the PDF files under `folder`, sorted by path so the
/// upload order is stable across runs.
pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// Reads each file into memory as one upload payload.
pub fn read_pdf_payloads(paths: &[PathBuf]) -> Result<Vec<Vec<u8>>, ExtractionError> {
    let mut payloads = Vec::with_capacity(paths.len());
    for path in paths {
        payloads.push(fs::read(path)?);
    }
    Ok(payloads)
}

#[cfg(test)]
mod tests {
    use super::{discover_pdf_files, read_pdf_payloads};
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn discover_pdf_files_is_recursive() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        let nested = base.join("nested");
        fs::create_dir(&nested)?;

        File::create(base.join("a.pdf")).and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;
        File::create(nested.join("b.pdf"))
            .and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;
        File::create(base.join("notes.txt")).and_then(|mut file| file.write_all(b"not a pdf"))?;

        let files = discover_pdf_files(base);
        assert_eq!(files.len(), 2);
        Ok(())
    }

    #[test]
    fn payloads_are_read_in_path_order() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.pdf"), b"first")?;
        fs::write(dir.path().join("b.pdf"), b"second")?;

        let files = discover_pdf_files(dir.path());
        let payloads = read_pdf_payloads(&files)?;
        assert_eq!(payloads, vec![b"first".to_vec(), b"second".to_vec()]);
        Ok(())
    }
}
