//! Legacy-form-to-itinerary flow tests.
//!
//! Drives the extraction and street reconciliation stages together over
//! a real matcher, with the browser replaced by an in-memory form.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use pepmigrate::forms::extract::extract_fields;
use pepmigrate::forms::fields::{CASCADE_FIELDS, CLIENT_AUTOFILL_FIELDS, ITINERARY_NEIGHBORHOOD};
use pepmigrate::forms::{reconcile, ItineraryForm};
use pepmigrate::matching::match_street;
use pepmigrate::models::StreetCandidate;

/// Itinerary panel backed by in-memory dropdowns; street lookup runs
/// through the production matcher.
struct MemoryForm {
    /// Street options per neighborhood value.
    streets: HashMap<String, Vec<StreetCandidate>>,
    neighborhoods: Vec<String>,
    current_neighborhood: Mutex<String>,
    fills: Mutex<Vec<(String, String)>>,
    included: Mutex<Vec<String>>,
    selected: Mutex<Option<String>>,
    observations: Mutex<String>,
}

impl MemoryForm {
    fn new(streets: HashMap<String, Vec<StreetCandidate>>, neighborhoods: Vec<String>) -> Self {
        Self {
            streets,
            neighborhoods,
            current_neighborhood: Mutex::new(String::new()),
            fills: Mutex::new(Vec::new()),
            included: Mutex::new(Vec::new()),
            selected: Mutex::new(None),
            observations: Mutex::new(String::new()),
        }
    }
}

#[async_trait]
impl ItineraryForm for MemoryForm {
    async fn fill_dependent(&self, field: &str, value: &str) -> bool {
        self.fills
            .lock()
            .unwrap()
            .push((field.to_string(), value.to_string()));
        if field == ITINERARY_NEIGHBORHOOD {
            *self.current_neighborhood.lock().unwrap() = value.to_string();
        }
        true
    }

    async fn find_street(&self, name: &str) -> bool {
        let neighborhood = self.current_neighborhood.lock().unwrap().clone();
        let options = self.streets.get(&neighborhood).cloned().unwrap_or_default();
        match match_street(name, &options) {
            pepmigrate::models::MatchResult::Match { value, .. } => {
                *self.selected.lock().unwrap() = Some(value);
                true
            }
            pepmigrate::models::MatchResult::NoMatch => false,
        }
    }

    async fn neighborhood_values(&self) -> Vec<String> {
        self.neighborhoods.clone()
    }

    async fn include_street(&self) -> bool {
        if let Some(value) = self.selected.lock().unwrap().take() {
            self.included.lock().unwrap().push(value);
            return true;
        }
        false
    }

    async fn append_observations(&self, text: &str) {
        self.observations.lock().unwrap().push_str(text);
    }
}

/// The legacy form as the portal renders it for a small protocol:
/// one text field, a filled Point A cascade and a two-street itinerary.
const LEGACY_SNAPSHOT: &str = r#"
    <html><body><form id="form">
        <input type="text" name="form:tabs:nome" value="Maria">
        <input type="text" name="form:tabs:j_idt117" value="plumbing">
        <input type="hidden" name="javax.faces.ViewState" value="e1s1">
        <select name="form:tabs:estadoA">
            <option value="">Selecione</option>
            <option value="SC" selected>Santa Catarina</option>
        </select>
        <select name="form:tabs:municipioA">
            <option value="">Selecione</option>
            <option value="Joinville" selected>Joinville</option>
        </select>
        <select name="form:tabs:bairroA">
            <option value="">Selecione</option>
            <option value="Centro" selected>Centro</option>
        </select>
        <input type="hidden" name="form:tabs:resumoItinerario" value="Rua A; Rua B">
    </form></body></html>
"#;

#[tokio::test]
async fn test_legacy_snapshot_flows_into_the_itinerary() {
    let fields = extract_fields(LEGACY_SNAPSHOT);

    // Plain fields come out keyed by name, framework plumbing does not.
    assert_eq!(fields.get("form:tabs:nome"), Some("Maria"));
    assert!(!fields.contains("form:tabs:j_idt117"));
    assert!(!fields.contains("javax.faces.ViewState"));

    // The name field belongs to the generic fill pass, not the cascade.
    assert!(!CASCADE_FIELDS.contains(&"form:tabs:nome"));
    assert!(!CLIENT_AUTOFILL_FIELDS.contains(&"form:tabs:nome"));

    assert_eq!(fields.get("form:tabs:estadoA"), Some("SC"));
    assert_eq!(fields.get("form:tabs:municipioA"), Some("Joinville"));
    assert_eq!(fields.get("form:tabs:bairroA"), Some("Centro"));
    assert_eq!(fields.itinerary, vec!["Rua A", "Rua B"]);

    // Centro carries "Rua A" exactly; "Rua B" exists nowhere.
    let form = MemoryForm::new(
        HashMap::from([(
            "Centro".to_string(),
            vec![
                StreetCandidate::new("Rua A", "700"),
                StreetCandidate::new("Rua Outra", "701"),
            ],
        )]),
        vec![String::new(), "Centro".to_string(), "Bucarein".to_string()],
    );
    let report = reconcile(&form, &fields).await;

    assert_eq!(report.included, vec!["Rua A"]);
    assert_eq!(report.unmatched, vec!["Rua B"]);
    assert_eq!(*form.included.lock().unwrap(), vec!["700"]);

    // The cascade was seeded from Point A's extracted address.
    let fills = form.fills.lock().unwrap();
    assert_eq!(
        fills[0],
        ("form:tabs:estadoItinerario".to_string(), "SC".to_string())
    );
    assert_eq!(
        fills[1],
        (
            "form:tabs:municipioItinerario".to_string(),
            "Joinville".to_string()
        )
    );
    assert_eq!(
        fills[2],
        (
            "form:tabs:bairroItinerario".to_string(),
            "Centro".to_string()
        )
    );

    let note = form.observations.lock().unwrap().clone();
    assert!(note.contains("LOGRADOUROS NÃO ENCONTRADOS"));
    assert!(note.contains("• Rua B"));
    assert!(!note.contains("• Rua A"));
}

#[tokio::test]
async fn test_observations_append_keeps_existing_text() {
    let form = MemoryForm::new(HashMap::new(), Vec::new());
    *form.observations.lock().unwrap() = "Observação original do protocolo.".to_string();

    let mut fields = pepmigrate::models::FieldMap::new();
    fields.insert("form:tabs:estadoA", "SC");
    fields.insert("form:tabs:municipioA", "Joinville");
    fields.insert("form:tabs:bairroA", "Centro");
    fields.itinerary = vec!["Rua Fantasma".to_string()];

    let report = reconcile(&form, &fields).await;
    assert_eq!(report.unmatched, vec!["Rua Fantasma"]);

    let note = form.observations.lock().unwrap().clone();
    assert!(note.starts_with("Observação original do protocolo."));
    assert!(note.contains("• Rua Fantasma"));
}
