//! Attachment upload on the new form.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use chromiumoxide::{Element, Page};
use tracing::{debug, info, warn};

use crate::browser::{page as browser, Settler};
use crate::forms::fields::{
    EDITOR_TEXTAREA_SELECTOR, UPLOAD_CHOOSE_SELECTOR, UPLOAD_INPUT_SELECTORS,
};

/// Standard message every migrated protocol carries in the editor.
pub const UPLOAD_MESSAGE: &str = "Segue o projeto para compartilhamento de poste.";

/// Files to attach from a protocol folder: regular files only, dotfiles
/// skipped, sorted for a stable upload order.
pub fn list_local_files(folder: &Path) -> Vec<PathBuf> {
    if !folder.is_dir() {
        warn!("Attachment folder missing: {}", folder.display());
        return Vec::new();
    }
    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Could not list {}: {e}", folder.display());
            return Vec::new();
        }
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .collect();
    files.sort();
    files
}

/// Write the cover message and attach the files in one batch.
///
/// Returns how many files were actually attached; entries that vanished
/// between listing and upload are skipped with a warning.
pub async fn upload(page: &Page, settler: &Settler, files: &[PathBuf]) -> Result<usize> {
    write_cover_message(page, settler).await;

    if files.is_empty() {
        info!("No files to attach");
        return Ok(0);
    }

    let Some(input) = browser::find_first(page, UPLOAD_INPUT_SELECTORS).await else {
        bail!("Campo de upload não encontrado");
    };
    if !browser::is_visible(&input).await {
        reveal_upload_input(page, settler).await;
    }

    let valid: Vec<String> = files
        .iter()
        .filter(|path| {
            let present = path.exists();
            if !present {
                warn!("Skipping missing file: {}", path.display());
            }
            present
        })
        .map(|path| path.to_string_lossy().into_owned())
        .collect();
    if valid.is_empty() {
        info!("No files left to attach");
        return Ok(0);
    }

    info!("Attaching {} file(s)", valid.len());
    let count = valid.len();
    browser::set_file_input(page, &input, valid).await?;
    settler.upload().await;
    Ok(count)
}

async fn write_cover_message(page: &Page, settler: &Settler) {
    let el = match page.find_element(EDITOR_TEXTAREA_SELECTOR).await {
        Ok(el) => el,
        Err(_) => {
            warn!("Editor textarea not found, skipping the cover message");
            return;
        }
    };
    if let Err(e) = browser::fill_element(&el, UPLOAD_MESSAGE).await {
        warn!("Could not write the cover message: {e}");
        return;
    }
    settler.field().await;
    // The rich editor only syncs its hidden textarea on input.
    if let Err(e) = browser::dispatch_input_event(&el).await {
        debug!("Input event on the editor failed: {e}");
    }
    settler.event().await;
}

/// The upload widget hides the real input behind a styled button.
async fn reveal_upload_input(page: &Page, settler: &Settler) {
    let chooser = match page.find_element(UPLOAD_CHOOSE_SELECTOR).await {
        Ok(el) => Some(el),
        Err(_) => find_button_by_text(page, "selecionar").await,
    };
    let Some(chooser) = chooser else {
        debug!("No chooser button to click");
        return;
    };
    if let Err(e) = chooser.click().await {
        debug!("Chooser click failed: {e}");
    }
    settler.field().await;
}

async fn find_button_by_text(page: &Page, needle: &str) -> Option<Element> {
    let buttons = page.find_elements("button").await.ok()?;
    for el in buttons {
        if browser::element_text(&el)
            .await
            .to_lowercase()
            .contains(needle)
        {
            return Some(el);
        }
    }
    None
}
