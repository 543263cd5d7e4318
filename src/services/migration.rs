//! End-to-end migration of a single protocol.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chromiumoxide::Page;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::browser::{page as browser, BrowserSession, Delays, Settler};
use crate::config::Settings;
use crate::forms::{attachments, extract, login, new_form};
use crate::models::{ProgressEvent, Step};

/// Counters from one finished run.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub fields_extracted: usize,
    pub fields_filled: usize,
    pub streets_included: usize,
    pub streets_unmatched: usize,
    pub files_uploaded: usize,
}

/// Drives one protocol from the legacy form into the new one.
///
/// The browser session survives the run on success and on failure so
/// both forms can be reviewed by hand; nothing is ever submitted.
/// Call [`Migrator::close`] to tear the browser down.
pub struct Migrator {
    settings: Settings,
    protocol: String,
    attachments_folder: Option<PathBuf>,
    session: Option<BrowserSession>,
}

impl Migrator {
    pub fn new(settings: Settings, protocol: &str, attachments_folder: Option<&Path>) -> Self {
        Self {
            settings,
            protocol: protocol.to_string(),
            attachments_folder: attachments_folder.map(Path::to_path_buf),
            session: None,
        }
    }

    /// Run the migration, reporting checkpoints on the channel.
    pub async fn run(
        &mut self,
        events: &UnboundedSender<ProgressEvent>,
    ) -> Result<MigrationReport> {
        info!("Starting migration of protocol {}", self.protocol);
        let session = BrowserSession::start(&self.settings).await?;
        let result = self.drive(&session, events).await;
        // Kept on failure too.
        self.session = Some(session);
        result
    }

    async fn drive(
        &self,
        session: &BrowserSession,
        events: &UnboundedSender<ProgressEvent>,
    ) -> Result<MigrationReport> {
        let settler = Settler::fixed(Delays::standard(self.settings.fill_delay_ms));
        let page = session.new_page().await?;

        let outcome = self.steps(session, &page, &settler, events).await;
        if let Err(e) = &outcome {
            warn!("Migration of {} failed: {e}", self.protocol);
            browser::save_debug_screenshot(&page, "debug_erro.png").await;
        }
        outcome
    }

    async fn steps(
        &self,
        session: &BrowserSession,
        page: &Page,
        settler: &Settler,
        events: &UnboundedSender<ProgressEvent>,
    ) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();

        emit(events, ProgressEvent::running(Step::Login, "Fazendo login..."));
        login::login(page, settler, &self.settings).await?;
        emit(
            events,
            ProgressEvent::ok(Step::Login, "Login realizado com sucesso"),
        );

        emit(
            events,
            ProgressEvent::running(Step::Extraction, "Extraindo dados do formulário antigo..."),
        );
        let url = self.settings.legacy_form_url(&self.protocol);
        let fields = extract::extract(page, settler, &url).await?;
        report.fields_extracted = fields.field_count();
        emit(
            events,
            ProgressEvent::ok(
                Step::Extraction,
                &format!("Dados extraídos: {} campos", fields.field_count()),
            ),
        );

        if fields.is_empty() {
            warn!("Legacy form came back empty, keeping it open for inspection");
            browser::save_debug_screenshot(page, "debug_formulario_antigo.png").await;
            return Ok(report);
        }

        emit(
            events,
            ProgressEvent::running(Step::Fill, "Abrindo formulário novo..."),
        );
        let form_page = session.new_page().await?;
        emit(
            events,
            ProgressEvent::running(Step::Fill, "Preenchendo campos..."),
        );
        let fill = new_form::fill(
            &form_page,
            settler,
            &self.settings,
            &fields,
            self.attachments_folder.is_some(),
        )
        .await?;
        report.fields_filled = fill.filled;
        report.streets_included = fill.itinerary.included.len();
        report.streets_unmatched = fill.itinerary.unmatched.len();
        emit(
            events,
            ProgressEvent::ok(Step::Fill, "Formulário preenchido com sucesso"),
        );

        if let Some(folder) = &self.attachments_folder {
            emit(
                events,
                ProgressEvent::running(Step::Attachments, "Listando arquivos..."),
            );
            let files = attachments::list_local_files(folder);
            emit(
                events,
                ProgressEvent::running(
                    Step::Attachments,
                    &format!("Fazendo upload de {} arquivo(s)...", files.len()),
                ),
            );
            match attachments::upload(&form_page, settler, &files).await {
                Ok(count) => {
                    report.files_uploaded = count;
                    emit(
                        events,
                        ProgressEvent::ok(
                            Step::Attachments,
                            &format!("Upload concluído: {} arquivo(s)", files.len()),
                        ),
                    );
                }
                Err(e) => {
                    // An upload failure never sinks the migration.
                    warn!("Attachment upload failed: {e}");
                    emit(
                        events,
                        ProgressEvent::failed(Step::Attachments, &format!("Erro: {e}")),
                    );
                }
            }
        }

        info!(
            "Migration of {} finished; both forms remain open for review",
            self.protocol
        );
        Ok(report)
    }

    /// Close the held browser session, if any.
    pub async fn close(mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
    }
}

fn emit(events: &UnboundedSender<ProgressEvent>, event: ProgressEvent) {
    // The receiver may already be gone; progress is best-effort.
    let _ = events.send(event);
}
