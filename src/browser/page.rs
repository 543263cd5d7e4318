//! Element and page helpers for the portal's JSF/PrimeFaces widgets.
//!
//! Values are written through the DOM with bubbling `input`/`change`
//! events so the framework's AJAX listeners fire, and structured reads
//! come back as JSON strings parsed on this side.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::element::Element;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::StreetCandidate;
use crate::utils::js_string;

/// Time allowed for one navigation round trip.
const NAVIGATION_TIMEOUT_SECS: u64 = 60;

/// Outcome of driving a `<select>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Nothing matched the selector.
    Missing,
    /// The select exists but carries no matching option.
    NoOption,
    /// Value set and change event dispatched.
    Selected,
}

impl SelectOutcome {
    pub fn is_selected(&self) -> bool {
        matches!(self, SelectOutcome::Selected)
    }
}

/// Navigate and wait for the command to complete. Settling time for the
/// page's own scripts is the caller's concern.
pub async fn navigate(page: &Page, url: &str) -> Result<()> {
    debug!("Navigating to {}", url);
    let params = NavigateParams::builder()
        .url(url)
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid navigation params: {}", e))?;

    let timeout = Duration::from_secs(NAVIGATION_TIMEOUT_SECS);
    tokio::time::timeout(timeout, page.execute(params))
        .await
        .map_err(|_| anyhow::anyhow!("Navigation to {} timed out after {}s", url, NAVIGATION_TIMEOUT_SECS))?
        .map_err(|e| anyhow::anyhow!("Navigation to {} failed: {}", url, e))?;
    Ok(())
}

/// Current location of the page.
pub async fn current_url(page: &Page) -> Result<String> {
    let url: String = page
        .evaluate("window.location.href")
        .await?
        .into_value()?;
    Ok(url)
}

/// Full HTML of the page as the browser currently renders it.
pub async fn page_html(page: &Page) -> Result<String> {
    Ok(page.content().await?)
}

/// First element matching any of the selectors, tried in order.
pub async fn find_first(page: &Page, selectors: &[&str]) -> Option<Element> {
    for selector in selectors {
        if let Ok(el) = page.find_element(*selector).await {
            debug!("Matched selector {}", selector);
            return Some(el);
        }
    }
    None
}

/// Select an option by its `value` attribute.
pub async fn set_select_value(page: &Page, selector: &str, value: &str) -> Result<SelectOutcome> {
    let script = format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return 'missing';
            const opt = Array.from(el.options || []).find(o => o.value === {val});
            if (!opt) return 'no-option';
            el.value = {val};
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return 'selected';
        }})()"#,
        sel = js_string(selector),
        val = js_string(value),
    );
    let outcome: String = page.evaluate(script).await?.into_value()?;
    Ok(parse_select_outcome(&outcome))
}

/// Select an option by value directly on an already-located element.
pub async fn select_value_on(el: &Element, value: &str) -> Result<SelectOutcome> {
    let func = format!(
        r#"function() {{
            const opt = Array.from(this.options || []).find(o => o.value === {val});
            if (!opt) return 'no-option';
            this.value = {val};
            this.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return 'selected';
        }}"#,
        val = js_string(value),
    );
    let ret = el.call_js_fn(func, false).await?;
    let outcome = ret
        .result
        .value
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    Ok(parse_select_outcome(&outcome))
}

/// Select an option by visible label directly on an already-located
/// element, compared trimmed.
pub async fn select_label_on(el: &Element, label: &str) -> Result<SelectOutcome> {
    let func = format!(
        r#"function() {{
            const target = {val}.trim();
            const opt = Array.from(this.options || []).find(
                o => (o.textContent || '').trim() === target);
            if (!opt) return 'no-option';
            this.value = opt.value;
            this.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return 'selected';
        }}"#,
        val = js_string(label),
    );
    let ret = el.call_js_fn(func, false).await?;
    let outcome = ret
        .result
        .value
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    Ok(parse_select_outcome(&outcome))
}

fn parse_select_outcome(raw: &str) -> SelectOutcome {
    match raw {
        "selected" => SelectOutcome::Selected,
        "no-option" => SelectOutcome::NoOption,
        _ => SelectOutcome::Missing,
    }
}

#[derive(Debug, Deserialize)]
struct OptionPair {
    label: String,
    value: String,
}

/// Options of a select that carry both a non-empty value and a
/// non-blank label.
pub async fn select_options(page: &Page, selector: &str) -> Result<Vec<StreetCandidate>> {
    let script = format!(
        r#"JSON.stringify((() => {{
            const el = document.querySelector({sel});
            if (!el) return [];
            return Array.from(el.options || [])
                .filter(o => o.value && (o.textContent || '').trim())
                .map(o => ({{ label: (o.textContent || '').trim(), value: o.value }}));
        }})())"#,
        sel = js_string(selector),
    );
    let raw: String = page.evaluate(script).await?.into_value()?;
    let pairs: Vec<OptionPair> = serde_json::from_str(&raw)?;
    Ok(pairs
        .into_iter()
        .map(|p| StreetCandidate::new(&p.label, &p.value))
        .collect())
}

/// Non-empty option values of a select, labels not required.
pub async fn select_option_values(page: &Page, selector: &str) -> Result<Vec<String>> {
    let script = format!(
        r#"JSON.stringify((() => {{
            const el = document.querySelector({sel});
            if (!el) return [];
            return Array.from(el.options || []).map(o => o.value).filter(v => v);
        }})())"#,
        sel = js_string(selector),
    );
    let raw: String = page.evaluate(script).await?.into_value()?;
    Ok(serde_json::from_str(&raw)?)
}

/// Write a value into a text-like element, firing input and change.
pub async fn fill_element(el: &Element, value: &str) -> Result<()> {
    let func = format!(
        r#"function() {{
            this.value = {val};
            this.dispatchEvent(new Event('input', {{ bubbles: true }}));
            this.dispatchEvent(new Event('change', {{ bubbles: true }}));
        }}"#,
        val = js_string(value),
    );
    el.call_js_fn(func, false).await?;
    Ok(())
}

/// Append to a textarea's existing content, firing input and change.
pub async fn append_to_element(el: &Element, suffix: &str) -> Result<()> {
    let func = format!(
        r#"function() {{
            this.value = (this.value || '') + {val};
            this.dispatchEvent(new Event('input', {{ bubbles: true }}));
            this.dispatchEvent(new Event('change', {{ bubbles: true }}));
        }}"#,
        val = js_string(suffix),
    );
    el.call_js_fn(func, false).await?;
    Ok(())
}

/// Fire a bare input event, for widgets that only listen to that.
pub async fn dispatch_input_event(el: &Element) -> Result<()> {
    el.call_js_fn(
        "function() { this.dispatchEvent(new Event('input', { bubbles: true })); }",
        false,
    )
    .await?;
    Ok(())
}

/// Check or uncheck a checkbox or radio, firing change.
pub async fn set_element_checked(el: &Element, checked: bool) -> Result<()> {
    let func = format!(
        r#"function() {{
            this.checked = {checked};
            this.dispatchEvent(new Event('change', {{ bubbles: true }}));
        }}"#,
    );
    el.call_js_fn(func, false).await?;
    Ok(())
}

/// Blur an element, falling back to a Tab keystroke when the DOM call
/// is rejected.
pub async fn blur_element(el: &Element) -> Result<()> {
    if el
        .call_js_fn("function() { this.blur(); }", false)
        .await
        .is_err()
    {
        el.press_key("Tab").await?;
    }
    Ok(())
}

/// Whether the element takes part in layout (has an offset parent).
pub async fn is_visible(el: &Element) -> bool {
    match el
        .call_js_fn("function() { return this.offsetParent !== null; }", false)
        .await
    {
        Ok(ret) => ret.result.value.and_then(|v| v.as_bool()).unwrap_or(false),
        Err(_) => false,
    }
}

/// Lowercased tag name of an element.
pub async fn element_tag(el: &Element) -> Result<String> {
    let ret = el
        .call_js_fn("function() { return this.tagName.toLowerCase(); }", false)
        .await?;
    Ok(ret
        .result
        .value
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default())
}

/// Lowercased type attribute of an input, empty when absent.
pub async fn element_type(el: &Element) -> Result<String> {
    let ret = el
        .call_js_fn(
            "function() { return (this.getAttribute('type') || '').toLowerCase(); }",
            false,
        )
        .await?;
    Ok(ret
        .result
        .value
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default())
}

/// Trimmed visible text of an element, empty when unavailable.
pub async fn element_text(el: &Element) -> String {
    el.inner_text()
        .await
        .ok()
        .flatten()
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

/// Attach local files to a file input. The CDP call works even when the
/// input itself is hidden behind a styled chooser widget.
pub async fn set_file_input(page: &Page, el: &Element, files: Vec<String>) -> Result<()> {
    let params = SetFileInputFilesParams::builder()
        .files(files)
        .backend_node_id(el.backend_node_id)
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid file input params: {}", e))?;
    page.execute(params).await?;
    Ok(())
}

/// Inventory of the page's input elements as a JSON string, for
/// failure logs.
pub async fn describe_inputs(page: &Page) -> Result<String> {
    let raw: String = page
        .evaluate(
            r#"JSON.stringify(Array.from(document.querySelectorAll('input')).map(i => ({
                name: i.name || '', id: i.id || '', type: i.type || ''
            })))"#,
        )
        .await?
        .into_value()?;
    Ok(raw)
}

/// Full-page screenshot for debugging. Failures only log.
pub async fn save_debug_screenshot(page: &Page, name: &str) {
    let params = ScreenshotParams::builder().full_page(true).build();
    match page.save_screenshot(params, Path::new(name)).await {
        Ok(_) => warn!("Saved debug screenshot to {}", name),
        Err(e) => debug!("Could not save debug screenshot {}: {}", name, e),
    }
}
