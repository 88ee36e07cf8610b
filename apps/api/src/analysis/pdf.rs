//! PDF text extraction for uploaded résumés.

use tracing::{debug, warn};

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Extracts the text of every page, in page order, from an uploaded PDF.
///
/// `pdf-extract` is synchronous and can panic on damaged files, so it runs on the
/// blocking pool and a panic is reported as an unreadable upload.
pub async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String, AppError> {
    if !looks_like_pdf(&bytes) {
        return Err(AppError::BadRequest(
            "Please upload a PDF file only.".to_string(),
        ));
    }

    let size = bytes.len();
    let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| {
            warn!("PDF extraction task aborted: {e}");
            AppError::BadRequest("Could not read the uploaded PDF".to_string())
        })?
        .map_err(|e| {
            warn!("PDF extraction failed: {e}");
            AppError::BadRequest(format!("Could not extract text from PDF: {e}"))
        })?;

    let text = normalize_extracted_text(&extracted);
    debug!("Extracted {} chars from {} byte PDF", text.chars().count(), size);
    Ok(text)
}

/// PDF files may carry leading junk before the header; readers accept it within the first KiB.
fn looks_like_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

/// Trims trailing whitespace per line and collapses runs of blank lines left by page breaks.
fn normalize_extracted_text(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = true;

    for line in raw.lines() {
        let line = line.trim_end_matches(|c: char| c.is_whitespace() || c == '\u{c}');
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        lines.push(if blank { "" } else { line });
        previous_blank = blank;
    }

    lines.join("\n").trim().to_string()
}

/// Builds a one-page PDF showing `text` in Helvetica, with a valid xref table.
#[cfg(test)]
pub(crate) fn single_page_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_at = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        xref.push_str(&format!("{offset:010} 00000 n \n"));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.extend_from_slice(xref.as_bytes());
    pdf
}
