use std::path::Path;

use crate::error::{Error, Result};

pub const RESUME_EXTENSIONS: [&str; 5] = ["pdf", "doc", "docx", "txt", "rtf"];

pub fn check_resume_size(size: u64, limit: u64) -> Result<()> {
    if size > limit {
        return Err(Error::FileTooLarge { size, limit });
    }
    Ok(())
}

/// Checks the extension against the allow-list and sniffs the leading bytes of binary formats.
pub fn check_resume_file(file_name: &str, data: &[u8]) -> Result<String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !RESUME_EXTENSIONS.contains(&ext.as_str()) {
        return Err(Error::BadRequest(format!(
            "File type .{} is not allowed",
            if ext.is_empty() { "unknown" } else { &ext }
        )));
    }
    if data.is_empty() {
        return Err(Error::BadRequest("Uploaded file is empty".into()));
    }
    if ext == "pdf" && !data.starts_with(b"%PDF") {
        return Err(Error::BadRequest("Invalid PDF file content".into()));
    }
    // docx is a zip container
    if ext == "docx" && !data.starts_with(b"PK\x03\x04") {
        return Err(Error::BadRequest("Invalid DOCX file content".into()));
    }
    if ext == "doc" && !data.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) {
        return Err(Error::BadRequest("Invalid DOC file content".into()));
    }
    Ok(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_limit_is_inclusive() {
        assert!(check_resume_size(10, 10).is_ok());
        assert!(matches!(
            check_resume_size(11, 10),
            Err(Error::FileTooLarge { size: 11, limit: 10 })
        ));
    }

    #[test]
    fn pdf_needs_magic_bytes() {
        assert_eq!(check_resume_file("CV.PDF", b"%PDF-1.7 ...").unwrap(), "pdf");
        assert!(check_resume_file("cv.pdf", b"hello").is_err());
        assert!(check_resume_file("cv.exe", b"MZ").is_err());
        assert!(check_resume_file("cv", b"text").is_err());
        assert_eq!(check_resume_file("notes.txt", b"Rust, 5 years").unwrap(), "txt");
    }
}
