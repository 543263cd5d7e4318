//! Extraction of filled fields from the legacy form.
//!
//! The legacy form is plain server-rendered JSF, so a single HTML
//! snapshot carries everything: values sit in `value` attributes,
//! selections in `selected`/`checked` attributes. Parsing the snapshot
//! with [`scraper`] keeps every read in one round trip.

use anyhow::Result;
use chromiumoxide::Page;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::browser::{page as browser, Settler};
use crate::models::FieldMap;

/// Text-like inputs worth capturing. Inputs with no `type` default to
/// text.
const TEXT_INPUT_SELECTOR: &str =
    "input[type=\"text\"], input[type=\"email\"], input[type=\"tel\"], input[type=\"number\"], input:not([type])";

/// Checked boxes render with the `checked` attribute on the server side.
const CHECKED_SELECTOR: &str =
    "input[type=\"checkbox\"][checked], input[type=\"radio\"][checked]";

/// Places the semicolon-joined street summary may hide, tried in order.
const ITINERARY_VALUE_SELECTORS: &[&str] = &[
    "input[type=\"hidden\"][value*=\";\"]",
    "textarea[value*=\";\"]",
    "input[value*=\";\"]",
    "textarea",
];

const ITINERARY_TABLE_SELECTOR: &str = "#form\\:tabs\\:tableLogradouros";

/// Open the legacy form for a protocol and extract its fields.
pub async fn extract(page: &Page, settler: &Settler, url: &str) -> Result<FieldMap> {
    info!("Opening legacy form at {url}");
    browser::navigate(page, url).await?;
    settler.page_load().await;

    let html = browser::page_html(page).await?;
    let fields = extract_fields(&html);
    info!("Extracted {} fields from the legacy form", fields.field_count());
    Ok(fields)
}

/// Parse every filled field out of a snapshot of the legacy form.
pub fn extract_fields(html: &str) -> FieldMap {
    let doc = Html::parse_document(html);
    let mut fields = FieldMap::new();

    collect_text_inputs(&doc, &mut fields);
    collect_textareas(&doc, &mut fields);
    collect_selects(&doc, &mut fields);
    collect_checked(&doc, &mut fields);
    fields.itinerary = extract_itinerary(&doc);
    fields
}

/// Key under which a field's value is stored.
fn field_key<'a>(el: &ElementRef<'a>) -> Option<&'a str> {
    el.value().attr("name").or_else(|| el.value().attr("id"))
}

/// JSF plumbing that must never be treated as user data.
fn is_framework_name(name: &str) -> bool {
    name.contains("j_idt") || name.contains("javax.faces.ViewState") || name == "form"
}

fn collect_text_inputs(doc: &Html, fields: &mut FieldMap) {
    let Ok(selector) = Selector::parse(TEXT_INPUT_SELECTOR) else {
        return;
    };
    for el in doc.select(&selector) {
        if let Some(name) = el.value().attr("name") {
            if is_framework_name(name) {
                continue;
            }
        }
        let Some(value) = el.value().attr("value") else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        if let Some(key) = field_key(&el) {
            fields.insert(key, value);
        }
    }
}

fn collect_textareas(doc: &Html, fields: &mut FieldMap) {
    let Ok(selector) = Selector::parse("textarea") else {
        return;
    };
    for el in doc.select(&selector) {
        if let Some(name) = el.value().attr("name") {
            if name.contains("j_idt") {
                continue;
            }
        }
        let value = el.text().collect::<String>();
        if value.is_empty() {
            continue;
        }
        if let Some(key) = field_key(&el) {
            fields.insert(key, &value);
        }
    }
}

fn collect_selects(doc: &Html, fields: &mut FieldMap) {
    let Ok(select_sel) = Selector::parse("select") else {
        return;
    };
    let Ok(option_sel) = Selector::parse("option") else {
        return;
    };
    for el in doc.select(&select_sel) {
        let mut selected: Option<String> = None;
        let mut first: Option<String> = None;
        for opt in el.select(&option_sel) {
            // Options without a value attribute fall back to their text.
            let value = opt
                .value()
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| opt.text().collect::<String>().trim().to_string());
            if first.is_none() {
                first = Some(value.clone());
            }
            if opt.value().attr("selected").is_some() {
                selected = Some(value);
                break;
            }
        }
        let Some(value) = selected.or(first) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        if let Some(key) = field_key(&el) {
            fields.insert(key, &value);
        }
    }
}

fn collect_checked(doc: &Html, fields: &mut FieldMap) {
    let Ok(selector) = Selector::parse(CHECKED_SELECTOR) else {
        return;
    };
    for el in doc.select(&selector) {
        let Some(value) = el.value().attr("value") else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        if let Some(key) = field_key(&el) {
            fields.insert(key, value);
        }
    }
}

/// Pull the itinerary street list out of the legacy form.
///
/// Newer revisions carry a semicolon-joined summary in a hidden field;
/// older ones only render the street table. Returns an empty list when
/// neither is present.
fn extract_itinerary(doc: &Html) -> Vec<String> {
    for css in ITINERARY_VALUE_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        for el in doc.select(&selector) {
            let value = if el.value().name() == "textarea" {
                el.text().collect::<String>()
            } else {
                el.value().attr("value").unwrap_or_default().to_string()
            };
            if !value.contains(';') {
                continue;
            }
            let streets: Vec<String> = value
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if !streets.is_empty() {
                debug!("Found {} itinerary streets in a summary field", streets.len());
                return streets;
            }
        }
    }

    let Ok(table_sel) = Selector::parse(ITINERARY_TABLE_SELECTOR) else {
        return Vec::new();
    };
    let Ok(row_sel) = Selector::parse("tbody tr:not(.ui-datatable-empty-message)") else {
        return Vec::new();
    };
    let Ok(cell_sel) = Selector::parse("td:first-child") else {
        return Vec::new();
    };
    if let Some(table) = doc.select(&table_sel).next() {
        let mut streets = Vec::new();
        for row in table.select(&row_sel) {
            if let Some(cell) = row.select(&cell_sel).next() {
                let text = cell.text().collect::<String>();
                let text = text.trim();
                if !text.is_empty() {
                    streets.push(text.to_string());
                }
            }
        }
        if !streets.is_empty() {
            debug!("Found {} itinerary streets in the table", streets.len());
            return streets;
        }
    }

    Vec::new()
}
