//! pepmigrate - CELESC PEP form migration automation.
//!
//! Drives a Chromium session through the PEP portal: reads a filled
//! legacy pole-sharing service form, then fills the replacement form
//! field by field (cascading address selects, fuzzy-matched itinerary
//! streets, client data and attachments), leaving submission to a
//! human reviewer.

pub mod browser;
pub mod cli;
pub mod config;
pub mod forms;
pub mod matching;
pub mod models;
pub mod server;
pub mod services;
pub mod utils;
