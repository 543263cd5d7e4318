//! Filling of the new form.
//!
//! The new form reloads parts of itself whenever a cascade select
//! changes, so every write here is paired with a settle wait. Nothing
//! in this module ever submits the form; it is left open for review.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::{Element, Page};
use tracing::{debug, info, warn};

use crate::browser::{page as browser, SelectOutcome, Settler};
use crate::config::Settings;
use crate::forms::fields::{
    AddressBlock, ATTACHMENTS_TAB_SELECTORS, CASCADE_FIELDS, CLIENT_AUTOFILL_FIELDS,
    CLIENT_TAB_SELECTOR, CNPJ_FIELD, INCLUDE_BUTTON_SELECTOR, ITINERARY_NEIGHBORHOOD,
    ITINERARY_STREET, OBSERVATIONS_SELECTOR, SERVICE_TAB_SELECTOR, TRUTHY_VALUES,
};
use crate::forms::itinerary::{self, ItineraryForm, ItineraryReport};
use crate::matching;
use crate::models::{FieldMap, MatchResult};

/// What reloads after a dependent select changes.
#[derive(Debug, Clone, Copy)]
enum Reload {
    /// The next select in the cascade repopulates.
    Cascade,
    /// Only the street dropdown repopulates.
    Street,
}

/// Outcome of one fill run.
#[derive(Debug, Default)]
pub struct FillReport {
    /// Generic fields written.
    pub filled: usize,
    /// Extracted fields with no counterpart on the new form.
    pub not_found: Vec<String>,
    pub itinerary: ItineraryReport,
}

/// Fill the new form from the extracted legacy data.
///
/// When an attachments folder was provided the generic field pass is
/// skipped and the page is left on the attachments tab, ready for the
/// upload step.
pub async fn fill(
    page: &Page,
    settler: &Settler,
    settings: &Settings,
    fields: &FieldMap,
    has_attachments: bool,
) -> Result<FillReport> {
    info!("Opening the new form");
    browser::navigate(page, settings.new_form_url()).await?;
    settler.page_load().await;

    click_tab(page, settler, SERVICE_TAB_SELECTOR).await;

    let mut filled = fill_address_cascade(page, settler, fields, AddressBlock::PointA).await;
    filled += fill_address_cascade(page, settler, fields, AddressBlock::PointB).await;

    let form = NewFormPage::new(page, settler);
    let itinerary = itinerary::reconcile(&form, fields).await;
    let mut report = FillReport {
        filled,
        itinerary,
        ..FillReport::default()
    };

    if let Some(cnpj) = fields.get(CNPJ_FIELD) {
        if !cnpj.is_empty() {
            fill_client_cnpj(page, settler, cnpj).await;
        }
    }

    if has_attachments {
        info!("Attachments folder provided, opening the attachments tab");
        if !switch_to_attachments_tab(page, settler).await {
            warn!("Could not open the attachments tab");
        }
        return Ok(report);
    }

    click_tab(page, settler, SERVICE_TAB_SELECTOR).await;
    let (generic, not_found) = fill_generic_fields(page, settler, fields).await;
    report.filled += generic;
    report.not_found = not_found;
    Ok(report)
}

/// Select a value in a cascade field and wait out the reload it kicks
/// off.
async fn fill_dependent_select(
    page: &Page,
    settler: &Settler,
    field: &str,
    value: &str,
    reload: Reload,
) -> bool {
    let selector = format!("select[name=\"{field}\"]");
    match browser::set_select_value(page, &selector, value).await {
        Ok(SelectOutcome::Selected) => {
            settler.event().await;
            match reload {
                Reload::Cascade => settler.cascade().await,
                Reload::Street => settler.street_reload().await,
            }
            true
        }
        Ok(SelectOutcome::NoOption) => {
            warn!("No option {value:?} in {field}");
            false
        }
        Ok(SelectOutcome::Missing) => {
            warn!("Select not found: {field}");
            false
        }
        Err(e) => {
            warn!("Selecting {value:?} in {field} failed: {e}");
            false
        }
    }
}

/// Fill one address block, top of the cascade first. Absent values are
/// skipped without disturbing the selects below them. Returns how many
/// selects took a value.
async fn fill_address_cascade(
    page: &Page,
    settler: &Settler,
    fields: &FieldMap,
    block: AddressBlock,
) -> usize {
    let steps = [
        (block.state_field(), Reload::Cascade),
        (block.city_field(), Reload::Cascade),
        (block.neighborhood_field(), Reload::Cascade),
        (block.street_field(), Reload::Street),
    ];
    let mut filled = 0;
    for (field, reload) in steps {
        let Some(value) = fields.get(&field) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        if fill_dependent_select(page, settler, &field, value, reload).await {
            filled += 1;
        }
    }
    filled
}

/// Click a tab anchor, ignoring failure; the form opens on the service
/// tab anyway.
async fn click_tab(page: &Page, settler: &Settler, selector: &str) {
    match page.find_element(selector).await {
        Ok(tab) => {
            if let Err(e) = tab.click().await {
                warn!("Tab click failed for {selector}: {e}");
            }
            settler.tab_switch().await;
        }
        Err(_) => debug!("Tab not found: {selector}"),
    }
}

/// Bring the attachments tab to the front.
///
/// The tab markup varied between portal revisions, hence the selector
/// fallbacks. After a click the panel's class tells whether the switch
/// took; when the panel cannot be located the click is trusted.
pub async fn switch_to_attachments_tab(page: &Page, settler: &Settler) -> bool {
    for css in ATTACHMENTS_TAB_SELECTORS {
        let Ok(tab) = page.find_element(*css).await else {
            continue;
        };
        if tab_is_active(&tab).await {
            debug!("Attachments tab already active");
            return true;
        }
        if let Err(e) = tab.click().await {
            warn!("Attachments tab click failed: {e}");
            continue;
        }
        settler.attachments_tab().await;
        match attachments_panel_hidden(page).await {
            Some(true) => {
                debug!("Panel still hidden after clicking {css}");
                continue;
            }
            _ => return true,
        }
    }
    list_available_tabs(page).await;
    false
}

async fn tab_is_active(tab: &Element) -> bool {
    let func = "function() { const li = this.closest('li'); return li ? li.className : ''; }";
    match tab.call_js_fn(func, false).await {
        Ok(ret) => {
            let class = ret
                .result
                .value
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            class.contains("ui-tabs-selected") || class.contains("ui-state-active")
        }
        Err(_) => false,
    }
}

/// None when the panel cannot be located at all.
async fn attachments_panel_hidden(page: &Page) -> Option<bool> {
    let script = r#"(() => {
        const panel = document.querySelector('#form\\:tabs\\:tabAnexo');
        if (!panel) return null;
        return panel.className.includes('ui-helper-hidden');
    })()"#;
    match page.evaluate(script).await {
        Ok(ret) => ret.value().and_then(|v| v.as_bool()),
        Err(_) => None,
    }
}

async fn list_available_tabs(page: &Page) {
    let script = r#"(() => {
        const tabs = Array.from(document.querySelectorAll('li a'))
            .map(a => (a.textContent || '').trim())
            .filter(t => t);
        return JSON.stringify(tabs);
    })()"#;
    match page.evaluate(script).await {
        Ok(ret) => match ret.into_value::<String>() {
            Ok(raw) => warn!("Attachments tab not found; tabs on the page: {raw}"),
            Err(_) => warn!("Attachments tab not found"),
        },
        Err(e) => warn!("Attachments tab not found and tab listing failed: {e}"),
    }
}

/// Fill the CNPJ on the client tab and blur it so the portal fetches
/// the client record and fills the rest of the tab itself.
async fn fill_client_cnpj(page: &Page, settler: &Settler, cnpj: &str) {
    info!("Filling the client CNPJ");
    click_tab(page, settler, CLIENT_TAB_SELECTOR).await;

    let selector = format!("input[name=\"{CNPJ_FIELD}\"]");
    let el = match page.find_element(selector).await {
        Ok(el) => el,
        Err(_) => {
            warn!("CNPJ field not found");
            return;
        }
    };
    if let Err(e) = browser::fill_element(&el, cnpj).await {
        warn!("Could not fill the CNPJ field: {e}");
        return;
    }
    settler.field().await;
    if let Err(e) = browser::blur_element(&el).await {
        warn!("Could not blur the CNPJ field: {e}");
    }
    settler.client_autofill().await;
}

/// Live-page implementation of the itinerary operations.
pub struct NewFormPage<'a> {
    page: &'a Page,
    settler: &'a Settler,
}

impl<'a> NewFormPage<'a> {
    pub fn new(page: &'a Page, settler: &'a Settler) -> Self {
        Self { page, settler }
    }
}

#[async_trait]
impl ItineraryForm for NewFormPage<'_> {
    async fn fill_dependent(&self, field: &str, value: &str) -> bool {
        fill_dependent_select(self.page, self.settler, field, value, Reload::Cascade).await
    }

    async fn find_street(&self, name: &str) -> bool {
        let selector = format!("select[name=\"{ITINERARY_STREET}\"]");
        let candidates = match browser::select_options(self.page, &selector).await {
            Ok(c) => c,
            Err(e) => {
                warn!("Could not read the street dropdown: {e}");
                return false;
            }
        };
        match matching::match_street(name, &candidates) {
            MatchResult::Match { value, score } => {
                debug!("Matched {name:?} with score {score:.2}");
                match browser::set_select_value(self.page, &selector, &value).await {
                    Ok(outcome) if outcome.is_selected() => {
                        self.settler.field().await;
                        true
                    }
                    Ok(_) => {
                        warn!("Street option vanished before selection: {name}");
                        false
                    }
                    Err(e) => {
                        warn!("Selecting street {name:?} failed: {e}");
                        false
                    }
                }
            }
            MatchResult::NoMatch => false,
        }
    }

    async fn neighborhood_values(&self) -> Vec<String> {
        let selector = format!("select[name=\"{ITINERARY_NEIGHBORHOOD}\"]");
        browser::select_option_values(self.page, &selector)
            .await
            .unwrap_or_default()
    }

    async fn include_street(&self) -> bool {
        match self.page.find_element(INCLUDE_BUTTON_SELECTOR).await {
            Ok(button) => match button.click().await {
                Ok(_) => {
                    self.settler.include_refresh().await;
                    true
                }
                Err(e) => {
                    warn!("Include button click failed: {e}");
                    false
                }
            },
            Err(_) => {
                warn!("Include button not found");
                false
            }
        }
    }

    async fn append_observations(&self, text: &str) {
        match self.page.find_element(OBSERVATIONS_SELECTOR).await {
            Ok(el) => {
                if let Err(e) = browser::append_to_element(&el, text).await {
                    warn!("Could not write to the observations field: {e}");
                }
            }
            Err(_) => warn!("Observations field not found"),
        }
    }
}

/// Fill every extracted field that is not handled by a dedicated pass.
async fn fill_generic_fields(
    page: &Page,
    settler: &Settler,
    fields: &FieldMap,
) -> (usize, Vec<String>) {
    let skip: HashSet<&str> = CASCADE_FIELDS
        .iter()
        .chain(CLIENT_AUTOFILL_FIELDS.iter())
        .copied()
        .chain(std::iter::once(CNPJ_FIELD))
        .collect();

    let mut filled = 0usize;
    let mut not_found = Vec::new();
    for (name, value) in &fields.values {
        if value.is_empty() || skip.contains(name.as_str()) {
            continue;
        }
        if fill_generic_field(page, settler, name, value).await {
            filled += 1;
        } else {
            not_found.push(name.clone());
        }
    }
    info!("Filled {filled} generic fields");
    if !not_found.is_empty() {
        warn!("Fields without a counterpart on the new form: {not_found:?}");
    }
    (filled, not_found)
}

async fn fill_generic_field(page: &Page, settler: &Settler, name: &str, value: &str) -> bool {
    let Some(el) = find_form_element(page, name).await else {
        debug!("Field not on the new form: {name}");
        return false;
    };
    match write_element_value(&el, value).await {
        Ok(true) => {
            settler.field().await;
            true
        }
        Ok(false) => {
            debug!("No option matched {value:?} for {name}");
            false
        }
        Err(e) => {
            warn!("Filling {name} failed: {e}");
            false
        }
    }
}

/// Locate a form element by name, then by id, ending with a bare name
/// match on any tag.
async fn find_form_element(page: &Page, name: &str) -> Option<Element> {
    let selectors = [
        format!("input[name=\"{name}\"]"),
        format!("textarea[name=\"{name}\"]"),
        format!("select[name=\"{name}\"]"),
        format!("input[id=\"{name}\"]"),
        format!("textarea[id=\"{name}\"]"),
        format!("select[id=\"{name}\"]"),
        format!("[name=\"{name}\"]"),
    ];
    for css in &selectors {
        if let Ok(el) = page.find_element(css.as_str()).await {
            return Some(el);
        }
    }
    None
}

/// Write a value in a way that fits the element: selects match by
/// value then label, checkboxes only ever get checked, everything
/// else is filled as text. Ok(false) means a select had no matching
/// option.
async fn write_element_value(el: &Element, value: &str) -> Result<bool> {
    let tag = browser::element_tag(el).await?;
    if tag == "select" {
        if browser::select_value_on(el, value).await?.is_selected() {
            return Ok(true);
        }
        return Ok(browser::select_label_on(el, value).await?.is_selected());
    }
    if tag == "input" {
        let kind = browser::element_type(el).await?;
        if kind == "checkbox" || kind == "radio" {
            if TRUTHY_VALUES.contains(&value.to_lowercase().as_str()) {
                browser::set_element_checked(el, true).await?;
            }
            return Ok(true);
        }
    }
    browser::fill_element(el, value).await?;
    Ok(true)
}
