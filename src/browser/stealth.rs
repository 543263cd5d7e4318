//! Stealth evasion JavaScript installed before any portal script runs.
//!
//! The portal front end misbehaves when it detects automation, so the
//! usual webdriver fingerprints are masked and the locale fingerprint is
//! pinned to a Brazilian profile.

pub const STEALTH_SCRIPTS: &[&str] = &[
    // Remove webdriver property
    r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
        configurable: true
    });
    "#,
    // Minimal chrome object
    r#"
    window.chrome = { runtime: {} };
    "#,
    // Non-empty plugin list
    r#"
    Object.defineProperty(navigator, 'plugins', {
        get: () => [1, 2, 3, 4, 5],
        configurable: true
    });
    "#,
    // Brazilian language preference order
    r#"
    Object.defineProperty(navigator, 'languages', {
        get: () => ['pt-BR', 'pt', 'en'],
        configurable: true
    });
    "#,
];
