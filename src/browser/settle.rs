//! The wait-and-settle abstraction.
//!
//! The portal is a JSF application: nearly every mutation triggers a
//! server round trip that rewrites part of the DOM, with no completion
//! signal we can observe. All synchronization is therefore timed waits,
//! routed through one place so the delay strategy stays swappable.

use std::time::Duration;

use async_trait::async_trait;

/// Named durations for every fixed pause in a run.
#[derive(Debug, Clone)]
pub struct Delays {
    /// After an ordinary field fill (configurable).
    pub field: Duration,
    /// After setting a value, for the change/input event to register.
    pub event: Duration,
    /// After a cascade select, for dependent lists to repopulate.
    pub cascade: Duration,
    /// After selecting a street, for the option list to settle.
    pub street_reload: Duration,
    /// After navigating to a form page.
    pub page_load: Duration,
    /// After navigating to the login page, and after the submit round
    /// trip before checking where we landed.
    pub login_page: Duration,
    /// After clicking the login button or pressing Enter.
    pub login_submit: Duration,
    /// After switching to the Serviço or Dados Cliente tab.
    pub tab_switch: Duration,
    /// After switching to the Anexos tab.
    pub attachments_tab: Duration,
    /// After clicking the itinerary include button.
    pub include_refresh: Duration,
    /// After blurring the CNPJ field, while the host form auto-fills
    /// the client data.
    pub client_autofill: Duration,
    /// After submitting files to the upload control.
    pub upload: Duration,
}

impl Delays {
    /// The portal's working timings. Only the inter-field delay is
    /// user-configurable.
    pub fn standard(fill_delay_ms: u64) -> Self {
        Self {
            field: Duration::from_millis(fill_delay_ms),
            event: Duration::from_millis(500),
            cascade: Duration::from_millis(2000),
            street_reload: Duration::from_millis(1000),
            page_load: Duration::from_millis(3000),
            login_page: Duration::from_millis(2000),
            login_submit: Duration::from_millis(3000),
            tab_switch: Duration::from_millis(1000),
            attachments_tab: Duration::from_millis(2000),
            include_refresh: Duration::from_millis(2000),
            client_autofill: Duration::from_millis(3000),
            upload: Duration::from_millis(3000),
        }
    }

    /// All-zero delays for tests.
    pub fn none() -> Self {
        Self {
            field: Duration::ZERO,
            event: Duration::ZERO,
            cascade: Duration::ZERO,
            street_reload: Duration::ZERO,
            page_load: Duration::ZERO,
            login_page: Duration::ZERO,
            login_submit: Duration::ZERO,
            tab_switch: Duration::ZERO,
            attachments_tab: Duration::ZERO,
            include_refresh: Duration::ZERO,
            client_autofill: Duration::ZERO,
            upload: Duration::ZERO,
        }
    }
}

/// How a settle hint is honored.
#[async_trait]
pub trait SettlePolicy: Send + Sync {
    async fn settle(&self, hint: Duration);
}

/// Sleeps for exactly the hinted duration.
#[derive(Debug, Default)]
pub struct FixedSettle;

#[async_trait]
impl SettlePolicy for FixedSettle {
    async fn settle(&self, hint: Duration) {
        if !hint.is_zero() {
            tokio::time::sleep(hint).await;
        }
    }
}

/// The delay table bound to a policy; every wait in the codebase goes
/// through one of these named methods.
pub struct Settler {
    delays: Delays,
    policy: Box<dyn SettlePolicy>,
}

impl Settler {
    pub fn fixed(delays: Delays) -> Self {
        Self {
            delays,
            policy: Box::new(FixedSettle),
        }
    }

    pub fn with_policy(delays: Delays, policy: Box<dyn SettlePolicy>) -> Self {
        Self { delays, policy }
    }

    pub async fn field(&self) {
        self.policy.settle(self.delays.field).await;
    }

    pub async fn event(&self) {
        self.policy.settle(self.delays.event).await;
    }

    pub async fn cascade(&self) {
        self.policy.settle(self.delays.cascade).await;
    }

    pub async fn street_reload(&self) {
        self.policy.settle(self.delays.street_reload).await;
    }

    pub async fn page_load(&self) {
        self.policy.settle(self.delays.page_load).await;
    }

    pub async fn login_page(&self) {
        self.policy.settle(self.delays.login_page).await;
    }

    pub async fn login_submit(&self) {
        self.policy.settle(self.delays.login_submit).await;
    }

    pub async fn tab_switch(&self) {
        self.policy.settle(self.delays.tab_switch).await;
    }

    pub async fn attachments_tab(&self) {
        self.policy.settle(self.delays.attachments_tab).await;
    }

    pub async fn include_refresh(&self) {
        self.policy.settle(self.delays.include_refresh).await;
    }

    pub async fn client_autofill(&self) {
        self.policy.settle(self.delays.client_autofill).await;
    }

    pub async fn upload(&self) {
        self.policy.settle(self.delays.upload).await;
    }
}
