//! Component names and selectors for the new form.
//!
//! The new form is a PrimeFaces tabbed view; nearly every field lives
//! under the `form:tabs:` naming container. Auto-generated widget names
//! (`j_idt…`) are pinned to the portal revision this tool tracks.

/// State select of the itinerary panel.
pub const ITINERARY_STATE: &str = "form:tabs:estadoItinerario";
/// City select of the itinerary panel.
pub const ITINERARY_CITY: &str = "form:tabs:municipioItinerario";
/// Neighborhood select of the itinerary panel.
pub const ITINERARY_NEIGHBORHOOD: &str = "form:tabs:bairroItinerario";
/// Street select of the itinerary panel, reloaded by the cascade above.
pub const ITINERARY_STREET: &str = "form:tabs:logradouroItinerario";

/// Button that moves the selected street into the itinerary table and
/// clears the pickers.
pub const INCLUDE_BUTTON_SELECTOR: &str = "button[name=\"form:tabs:j_idt227\"]";

/// Free-text observations field where unmatched streets are reported.
pub const OBSERVATIONS_SELECTOR: &str = "textarea[name=\"form:tabs:j_idt238\"]";

/// Hidden textarea backing the rich editor on the attachments tab.
pub const EDITOR_TEXTAREA_SELECTOR: &str = "textarea[name=\"form:tabs:editor_input\"]";

/// CNPJ field on the client tab; blurring it makes the portal fetch
/// the client record and fill the rest of the tab.
pub const CNPJ_FIELD: &str = "form:tabs:cnpjCompPoste";

/// Tab anchors.
pub const SERVICE_TAB_SELECTOR: &str = "a[href=\"#form:tabs:tabServico\"]";
pub const CLIENT_TAB_SELECTOR: &str = "a[href=\"#form:tabs:tabCliente\"]";

/// Attachments tab anchor fallbacks, most specific first. The third is
/// positional (Serviço=0, Cliente=1, Anexos=2).
pub const ATTACHMENTS_TAB_SELECTORS: &[&str] = &[
    "a[href=\"#form:tabs:tabAnexo\"]",
    "a[href*=\"tabAnexo\"]",
    "li[data-index=\"2\"] a",
];

/// Panel of the attachments tab; hidden panels carry ui-helper-hidden.
pub const ATTACHMENTS_PANEL_SELECTOR: &str = "#form\\:tabs\\:tabAnexo";

/// File input fallbacks for the PrimeFaces upload widget.
pub const UPLOAD_INPUT_SELECTORS: &[&str] = &[
    "input[type=\"file\"][name*=\"j_idt358\"]",
    "input[type=\"file\"]",
    "input[type=\"file\"][id*=\"j_idt358\"]",
];

/// Styled chooser button that fronts the hidden file input.
pub const UPLOAD_CHOOSE_SELECTOR: &str = "span.ui-fileupload-choose";

/// Address cascade fields, handled before the generic pass and skipped
/// by it.
pub const CASCADE_FIELDS: &[&str] = &[
    "form:tabs:estadoA",
    "form:tabs:municipioA",
    "form:tabs:bairroA",
    "form:tabs:logradourosA",
    "form:tabs:estadoB",
    "form:tabs:municipioB",
    "form:tabs:bairroB",
    "form:tabs:logradourosB",
    "form:tabs:estadoItinerario",
    "form:tabs:municipioItinerario",
    "form:tabs:bairroItinerario",
    "form:tabs:logradouroItinerario",
];

/// Client tab fields the portal fills itself after the CNPJ blur; only
/// the CNPJ is ever written by this tool.
pub const CLIENT_AUTOFILL_FIELDS: &[&str] = &[
    "form:tabs:razaoSocial",
    "form:tabs:nmFantasia",
    "form:tabs:nmPessoaContato",
    "form:tabs:email",
    "form:tabs:celular",
    "form:tabs:foneEmergencia",
    "form:tabs:logradouroPJCompPoste",
    "form:tabs:nrLogrPJCompPoste",
    "form:tabs:complementoPJCompPoste",
    "form:tabs:bairroPJCompPoste",
    "form:tabs:cepPJCompPoste",
    "form:tabs:cidadePJCompPoste",
    "form:tabs:estadoPJCompPoste",
];

/// Values that check a checkbox or radio during the generic pass.
pub const TRUTHY_VALUES: &[&str] = &["true", "1", "on", "yes", "sim"];

/// One of the form's three address blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressBlock {
    PointA,
    PointB,
    Itinerary,
}

impl AddressBlock {
    pub fn suffix(&self) -> &'static str {
        match self {
            AddressBlock::PointA => "A",
            AddressBlock::PointB => "B",
            AddressBlock::Itinerary => "Itinerario",
        }
    }

    pub fn state_field(&self) -> String {
        format!("form:tabs:estado{}", self.suffix())
    }

    pub fn city_field(&self) -> String {
        format!("form:tabs:municipio{}", self.suffix())
    }

    pub fn neighborhood_field(&self) -> String {
        format!("form:tabs:bairro{}", self.suffix())
    }

    /// The A/B street selects are pluralized; the itinerary one is not.
    pub fn street_field(&self) -> String {
        match self {
            AddressBlock::Itinerary => ITINERARY_STREET.to_string(),
            _ => format!("form:tabs:logradouros{}", self.suffix()),
        }
    }
}
