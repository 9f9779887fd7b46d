//! The opaque `ocr(png_path) -> string | error` boundary (§1 non-goal: OCR
//! itself is out of scope). A thin wrapper over `leptess` (Tesseract
//! bindings), mirroring the original's `pytesseract.image_to_string` call —
//! not a feature this crate specifies, just something concrete to call.

use std::path::Path;

use crate::error::{Error, Result};

/// Run OCR over `path` and return the extracted text, normalized per §4.E
/// step 4: each line stripped of leading/trailing whitespace, line breaks
/// preserved (no trailing newline, matching `'\n'.join(line.strip() for
/// line in text.splitlines())`).
pub fn ocr(path: &Path) -> Result<String> {
    let mut engine = leptess::LepTess::new(None, "eng").map_err(|e| Error::Ocr(e.to_string()))?;
    engine
        .set_image(path)
        .map_err(|e| Error::Ocr(e.to_string()))?;
    let raw = engine.get_utf8_text().map_err(|e| Error::Ocr(e.to_string()))?;
    Ok(normalize(&raw))
}

fn normalize(text: &str) -> String {
    text.lines().map(str::trim).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_whitespace_and_keeps_newlines() {
        assert_eq!(normalize("hello   \nworld  \n"), "hello\nworld");
    }

    #[test]
    fn normalize_of_blank_text_is_empty() {
        assert_eq!(normalize("   \n  \n"), "");
    }
}
