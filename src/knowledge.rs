use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{ChatError, Result};

/// The two immutable text blobs the persona answers from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Knowledge {
    pub summary: String,
    pub profile: String,
}

impl Knowledge {
    pub fn load(summary_path: &Path, profile_path: &Path) -> Result<Self> {
        let summary = read_text(summary_path)?;
        let profile = if is_pdf(profile_path) {
            extract_pdf_text(profile_path)?
        } else {
            read_text(profile_path)?
        };
        info!(
            summary_chars = summary.len(),
            profile_chars = profile.len(),
            "knowledge loaded"
        );
        Ok(Self { summary, profile })
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ChatError::Knowledge {
        path: path.to_path_buf(),
        source,
    })
}

/// Page by page; pages that yield no text are skipped.
fn extract_pdf_text(path: &Path) -> Result<String> {
    let pdf_err = |source| ChatError::Pdf {
        path: path.to_path_buf(),
        source,
    };
    let doc = lopdf::Document::load(path).map_err(pdf_err)?;

    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        let page = doc.extract_text(&[*page_number]).map_err(pdf_err)?;
        if page.trim().is_empty() {
            debug!(page = page_number, "empty pdf page skipped");
            continue;
        }
        text.push_str(&page);
    }
    Ok(text)
}
