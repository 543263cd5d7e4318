//! Itinerary reconciliation.
//!
//! The legacy form stores its streets as free text; the new form only
//! accepts streets picked from a state/city/neighborhood cascade. For
//! each legacy street this module seeds the cascade from a reference
//! point, looks the street up in the resulting dropdown, sweeps the
//! remaining neighborhoods when that fails, and finally records
//! whatever could not be matched in the observations field so a human
//! can register it by hand.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::forms::fields::{
    AddressBlock, ITINERARY_CITY, ITINERARY_NEIGHBORHOOD, ITINERARY_STATE,
};
use crate::models::FieldMap;

/// Address used to seed an itinerary entry's cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePoint {
    pub state: String,
    pub city: String,
    pub neighborhood: String,
}

impl ReferencePoint {
    pub fn from_fields(fields: &FieldMap, block: AddressBlock) -> Self {
        Self {
            state: fields
                .get(&block.state_field())
                .unwrap_or_default()
                .to_string(),
            city: fields
                .get(&block.city_field())
                .unwrap_or_default()
                .to_string(),
            neighborhood: fields
                .get(&block.neighborhood_field())
                .unwrap_or_default()
                .to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.state.is_empty() && !self.city.is_empty() && !self.neighborhood.is_empty()
    }
}

/// What happened to each legacy street.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItineraryReport {
    pub included: Vec<String>,
    pub unmatched: Vec<String>,
}

/// The itinerary panel operations the reconciler drives. Implementors
/// own the waiting and the error handling; a failed operation simply
/// reports false.
#[async_trait]
pub trait ItineraryForm {
    /// Select a value in one of the cascade selects and wait for the
    /// dependent reload.
    async fn fill_dependent(&self, field: &str, value: &str) -> bool;

    /// Look a street up in the currently loaded street dropdown and
    /// select it when a good enough match exists.
    async fn find_street(&self, name: &str) -> bool;

    /// Values of the neighborhood dropdown's options.
    async fn neighborhood_values(&self) -> Vec<String>;

    /// Click the include button, moving the selected street into the
    /// itinerary table.
    async fn include_street(&self) -> bool;

    /// Append text to the observations field.
    async fn append_observations(&self, text: &str);
}

/// Reconcile the legacy street list against the new form.
///
/// Streets are seeded from Point A's address. When there are exactly
/// two streets and Point B is fully filled, the second street is seeded
/// from Point B instead. An incomplete Point A makes reconciliation
/// impossible and skips it entirely.
pub async fn reconcile(form: &impl ItineraryForm, fields: &FieldMap) -> ItineraryReport {
    let streets = &fields.itinerary;
    if streets.is_empty() {
        info!("No itinerary streets to reconcile");
        return ItineraryReport::default();
    }

    let point_a = ReferencePoint::from_fields(fields, AddressBlock::PointA);
    if !point_a.is_complete() {
        warn!("Point A address is incomplete, skipping the itinerary");
        return ItineraryReport::default();
    }
    let point_b = ReferencePoint::from_fields(fields, AddressBlock::PointB);
    let use_point_b = streets.len() == 2 && point_b.is_complete();

    info!("Reconciling {} itinerary streets", streets.len());
    let mut report = ItineraryReport::default();
    for (idx, street) in streets.iter().enumerate() {
        let reference = if use_point_b && idx == 1 {
            &point_b
        } else {
            &point_a
        };
        info!("Street {}/{}: {street}", idx + 1, streets.len());

        if !seed_cascade(form, reference).await {
            report.unmatched.push(street.clone());
            continue;
        }

        let mut found = form.find_street(street).await;
        if !found {
            info!("Not in the reference neighborhood, sweeping the others");
            found = sweep_neighborhoods(form, reference, street).await;
        }
        if !found {
            warn!("Street not found anywhere: {street}");
            report.unmatched.push(street.clone());
            continue;
        }

        if form.include_street().await {
            report.included.push(street.clone());
        } else {
            report.unmatched.push(street.clone());
        }
    }

    if !report.unmatched.is_empty() {
        form.append_observations(&unmatched_note(&report.unmatched))
            .await;
    }
    info!(
        "Itinerary done: {} included, {} unmatched",
        report.included.len(),
        report.unmatched.len()
    );
    report
}

async fn seed_cascade(form: &impl ItineraryForm, reference: &ReferencePoint) -> bool {
    form.fill_dependent(ITINERARY_STATE, &reference.state).await
        && form.fill_dependent(ITINERARY_CITY, &reference.city).await
        && form
            .fill_dependent(ITINERARY_NEIGHBORHOOD, &reference.neighborhood)
            .await
}

/// Try the street under every neighborhood of the reference city,
/// first hit wins.
async fn sweep_neighborhoods(
    form: &impl ItineraryForm,
    reference: &ReferencePoint,
    street: &str,
) -> bool {
    if !form.fill_dependent(ITINERARY_STATE, &reference.state).await {
        return false;
    }
    if !form.fill_dependent(ITINERARY_CITY, &reference.city).await {
        return false;
    }
    for value in form.neighborhood_values().await {
        if value.is_empty() {
            continue;
        }
        if !form.fill_dependent(ITINERARY_NEIGHBORHOOD, &value).await {
            continue;
        }
        if form.find_street(street).await {
            return true;
        }
    }
    false
}

/// Note appended to the observations field listing the streets that
/// must be registered by hand.
pub fn unmatched_note(unmatched: &[String]) -> String {
    let mut note =
        String::from("\n\n⚠️ ATENÇÃO - LOGRADOUROS NÃO ENCONTRADOS (CADASTRAR MANUALMENTE):\n");
    for street in unmatched {
        note.push_str(&format!("  • {street}\n"));
    }
    note
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeForm {
        /// Street labels available per neighborhood value.
        streets: HashMap<String, Vec<String>>,
        /// Option values of the neighborhood dropdown.
        neighborhoods: Vec<String>,
        /// Fields whose fill always fails.
        broken_fields: HashSet<&'static str>,
        include_fails: bool,
        current_neighborhood: Mutex<String>,
        fills: Mutex<Vec<(String, String)>>,
        includes: Mutex<usize>,
        note: Mutex<Option<String>>,
    }

    #[async_trait]
    impl ItineraryForm for FakeForm {
        async fn fill_dependent(&self, field: &str, value: &str) -> bool {
            self.fills
                .lock()
                .unwrap()
                .push((field.to_string(), value.to_string()));
            if self.broken_fields.contains(field) {
                return false;
            }
            if field == ITINERARY_NEIGHBORHOOD {
                *self.current_neighborhood.lock().unwrap() = value.to_string();
            }
            true
        }

        async fn find_street(&self, name: &str) -> bool {
            let neighborhood = self.current_neighborhood.lock().unwrap().clone();
            self.streets
                .get(&neighborhood)
                .is_some_and(|list| list.iter().any(|s| s == name))
        }

        async fn neighborhood_values(&self) -> Vec<String> {
            self.neighborhoods.clone()
        }

        async fn include_street(&self) -> bool {
            if self.include_fails {
                return false;
            }
            *self.includes.lock().unwrap() += 1;
            true
        }

        async fn append_observations(&self, text: &str) {
            *self.note.lock().unwrap() = Some(text.to_string());
        }
    }

    fn fields_with(streets: &[&str], point_a: (&str, &str, &str)) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("form:tabs:estadoA", point_a.0);
        fields.insert("form:tabs:municipioA", point_a.1);
        fields.insert("form:tabs:bairroA", point_a.2);
        fields.itinerary = streets.iter().map(|s| s.to_string()).collect();
        fields
    }

    fn add_point_b(fields: &mut FieldMap, point_b: (&str, &str, &str)) {
        fields.insert("form:tabs:estadoB", point_b.0);
        fields.insert("form:tabs:municipioB", point_b.1);
        fields.insert("form:tabs:bairroB", point_b.2);
    }

    #[tokio::test]
    async fn test_empty_itinerary_is_a_no_op() {
        let form = FakeForm::default();
        let fields = fields_with(&[], ("42", "100", "centro"));
        let report = reconcile(&form, &fields).await;
        assert_eq!(report, ItineraryReport::default());
        assert!(form.fills.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_point_a_skips_everything() {
        let form = FakeForm::default();
        let mut fields = fields_with(&["Rua A"], ("42", "100", "centro"));
        fields.values.remove("form:tabs:bairroA");
        let report = reconcile(&form, &fields).await;
        // Nothing is attempted and nothing is reported as unmatched.
        assert_eq!(report, ItineraryReport::default());
        assert!(form.note.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_street_in_reference_neighborhood_is_included() {
        let form = FakeForm {
            streets: HashMap::from([(
                "centro".to_string(),
                vec!["Rua das Flores".to_string()],
            )]),
            ..FakeForm::default()
        };
        let fields = fields_with(&["Rua das Flores"], ("42", "100", "centro"));
        let report = reconcile(&form, &fields).await;
        assert_eq!(report.included, vec!["Rua das Flores"]);
        assert!(report.unmatched.is_empty());
        assert_eq!(*form.includes.lock().unwrap(), 1);
        assert!(form.note.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sweep_finds_street_in_another_neighborhood() {
        let form = FakeForm {
            streets: HashMap::from([(
                "saco-grande".to_string(),
                vec!["Rua Delfino Conti".to_string()],
            )]),
            neighborhoods: vec![
                String::new(),
                "centro".to_string(),
                "saco-grande".to_string(),
            ],
            ..FakeForm::default()
        };
        let fields = fields_with(&["Rua Delfino Conti"], ("42", "100", "centro"));
        let report = reconcile(&form, &fields).await;
        assert_eq!(report.included, vec!["Rua Delfino Conti"]);
        assert!(report.unmatched.is_empty());
    }

    #[tokio::test]
    async fn test_unfindable_street_goes_to_observations() {
        let form = FakeForm {
            neighborhoods: vec!["centro".to_string()],
            ..FakeForm::default()
        };
        let fields = fields_with(&["Rua Inexistente"], ("42", "100", "centro"));
        let report = reconcile(&form, &fields).await;
        assert!(report.included.is_empty());
        assert_eq!(report.unmatched, vec!["Rua Inexistente"]);
        let note = form.note.lock().unwrap().clone().unwrap();
        assert!(note.contains("CADASTRAR MANUALMENTE"));
        assert!(note.contains("  • Rua Inexistente\n"));
    }

    #[tokio::test]
    async fn test_two_streets_seed_second_from_point_b() {
        let form = FakeForm {
            streets: HashMap::from([
                ("centro".to_string(), vec!["Rua Um".to_string()]),
                ("trindade".to_string(), vec!["Rua Dois".to_string()]),
            ]),
            ..FakeForm::default()
        };
        let mut fields = fields_with(&["Rua Um", "Rua Dois"], ("42", "100", "centro"));
        add_point_b(&mut fields, ("42", "100", "trindade"));
        let report = reconcile(&form, &fields).await;
        assert_eq!(report.included, vec!["Rua Um", "Rua Dois"]);

        // Entry two's cascade starts from Point B's address.
        let fills = form.fills.lock().unwrap();
        assert_eq!(fills[3], (ITINERARY_STATE.to_string(), "42".to_string()));
        assert_eq!(
            fills[5],
            (ITINERARY_NEIGHBORHOOD.to_string(), "trindade".to_string())
        );
    }

    #[tokio::test]
    async fn test_incomplete_point_b_keeps_both_streets_on_point_a() {
        let form = FakeForm {
            streets: HashMap::from([(
                "centro".to_string(),
                vec!["Rua Um".to_string(), "Rua Dois".to_string()],
            )]),
            ..FakeForm::default()
        };
        let mut fields = fields_with(&["Rua Um", "Rua Dois"], ("42", "100", "centro"));
        // Point B present but missing its neighborhood.
        fields.insert("form:tabs:estadoB", "43");
        fields.insert("form:tabs:municipioB", "200");
        let report = reconcile(&form, &fields).await;
        assert_eq!(report.included, vec!["Rua Um", "Rua Dois"]);

        let fills = form.fills.lock().unwrap();
        assert_eq!(fills[3], (ITINERARY_STATE.to_string(), "42".to_string()));
        assert_eq!(
            fills[5],
            (ITINERARY_NEIGHBORHOOD.to_string(), "centro".to_string())
        );
    }

    #[tokio::test]
    async fn test_three_streets_never_use_point_b() {
        let form = FakeForm {
            streets: HashMap::from([(
                "centro".to_string(),
                vec![
                    "Rua Um".to_string(),
                    "Rua Dois".to_string(),
                    "Rua Tres".to_string(),
                ],
            )]),
            ..FakeForm::default()
        };
        let mut fields =
            fields_with(&["Rua Um", "Rua Dois", "Rua Tres"], ("42", "100", "centro"));
        add_point_b(&mut fields, ("43", "200", "trindade"));
        let report = reconcile(&form, &fields).await;
        assert_eq!(report.included.len(), 3);

        let fills = form.fills.lock().unwrap();
        assert!(fills.iter().all(|(_, value)| value != "trindade"));
    }

    #[tokio::test]
    async fn test_broken_cascade_reports_both_streets() {
        let form = FakeForm {
            broken_fields: HashSet::from([ITINERARY_NEIGHBORHOOD]),
            ..FakeForm::default()
        };
        let fields = fields_with(&["Rua Um", "Rua Dois"], ("42", "100", "centro"));
        let report = reconcile(&form, &fields).await;
        assert!(report.included.is_empty());
        assert_eq!(report.unmatched, vec!["Rua Um", "Rua Dois"]);
        let note = form.note.lock().unwrap().clone().unwrap();
        assert!(note.contains("  • Rua Um\n"));
        assert!(note.contains("  • Rua Dois\n"));
    }

    #[tokio::test]
    async fn test_include_failure_marks_street_unmatched() {
        let form = FakeForm {
            streets: HashMap::from([("centro".to_string(), vec!["Rua Um".to_string()])]),
            include_fails: true,
            ..FakeForm::default()
        };
        let fields = fields_with(&["Rua Um"], ("42", "100", "centro"));
        let report = reconcile(&form, &fields).await;
        assert!(report.included.is_empty());
        assert_eq!(report.unmatched, vec!["Rua Um"]);
    }

    #[test]
    fn test_unmatched_note_format() {
        let note = unmatched_note(&["Rua A".to_string(), "Rua B".to_string()]);
        assert_eq!(
            note,
            "\n\n⚠️ ATENÇÃO - LOGRADOUROS NÃO ENCONTRADOS (CADASTRAR MANUALMENTE):\n  • Rua A\n  • Rua B\n"
        );
    }
}
