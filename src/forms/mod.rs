//! Automation of the two portal forms: logging in, extracting the
//! legacy form, filling the new one and attaching files.

pub mod attachments;
pub mod extract;
pub mod fields;
pub mod itinerary;
pub mod login;
pub mod new_form;

pub use itinerary::{reconcile, ItineraryForm, ItineraryReport, ReferencePoint};
pub use new_form::FillReport;
