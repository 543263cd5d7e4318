//! Migration batch items and their progress reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of one migration item. Serialized with the pt-BR
/// labels the status page displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Executando")]
    Running,
    #[serde(rename = "Concluído")]
    Done,
    #[serde(rename = "Erro")]
    Error,
    #[serde(rename = "Cancelado")]
    Cancelled,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pendente",
            Self::Running => "Executando",
            Self::Done => "Concluído",
            Self::Error => "Erro",
            Self::Cancelled => "Cancelado",
        }
    }
}

/// The four stages a migration run reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Login,
    Extraction,
    Fill,
    Attachments,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Extraction => "Extração",
            Self::Fill => "Preenchimento",
            Self::Attachments => "Anexos",
        }
    }

    /// Overall progress percentage reached when this step is active.
    pub fn progress_pct(&self) -> u8 {
        match self {
            Self::Login => 20,
            Self::Extraction => 40,
            Self::Fill => 70,
            Self::Attachments => 90,
        }
    }
}

/// Per-step state, serialized as the symbol the status page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepState {
    #[serde(rename = "⏳")]
    Waiting,
    #[serde(rename = "🔄")]
    Running,
    #[serde(rename = "✅")]
    Ok,
    #[serde(rename = "❌")]
    Failed,
}

impl StepState {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Waiting => "⏳",
            Self::Running => "🔄",
            Self::Ok => "✅",
            Self::Failed => "❌",
        }
    }
}

/// States of all four steps, keyed on the wire by their display names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepBoard {
    #[serde(rename = "Login")]
    pub login: StepState,
    #[serde(rename = "Extração")]
    pub extraction: StepState,
    #[serde(rename = "Preenchimento")]
    pub fill: StepState,
    #[serde(rename = "Anexos")]
    pub attachments: StepState,
}

impl Default for StepBoard {
    fn default() -> Self {
        Self {
            login: StepState::Waiting,
            extraction: StepState::Waiting,
            fill: StepState::Waiting,
            attachments: StepState::Waiting,
        }
    }
}

impl StepBoard {
    pub fn set(&mut self, step: Step, state: StepState) {
        match step {
            Step::Login => self.login = state,
            Step::Extraction => self.extraction = state,
            Step::Fill => self.fill = state,
            Step::Attachments => self.attachments = state,
        }
    }

    pub fn get(&self, step: Step) -> StepState {
        match step {
            Step::Login => self.login,
            Step::Extraction => self.extraction,
            Step::Fill => self.fill,
            Step::Attachments => self.attachments,
        }
    }
}

/// One progress notification emitted by the orchestrator.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub step: Step,
    pub state: StepState,
    pub message: String,
}

impl ProgressEvent {
    pub fn running(step: Step, message: &str) -> Self {
        Self {
            step,
            state: StepState::Running,
            message: message.to_string(),
        }
    }

    pub fn ok(step: Step, message: &str) -> Self {
        Self {
            step,
            state: StepState::Ok,
            message: message.to_string(),
        }
    }

    pub fn failed(step: Step, message: &str) -> Self {
        Self {
            step,
            state: StepState::Failed,
            message: message.to_string(),
        }
    }
}

/// One protocol/folder pair tracked by the batch registry. Field names
/// match the JSON the status page polls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationItem {
    #[serde(rename = "protocolo")]
    pub protocol: String,
    #[serde(rename = "nome_pasta")]
    pub folder_name: String,
    #[serde(rename = "caminho_pasta")]
    pub folder_path: String,
    pub status: ItemStatus,
    #[serde(rename = "progresso")]
    pub progress: u8,
    #[serde(rename = "mensagem")]
    pub message: String,
    pub steps: StepBoard,
    #[serde(rename = "data_inicio", default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "data_fim", default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl MigrationItem {
    pub fn new(protocol: &str, folder_name: &str, folder_path: &str) -> Self {
        Self {
            protocol: protocol.to_string(),
            folder_name: folder_name.to_string(),
            folder_path: folder_path.to_string(),
            status: ItemStatus::Pending,
            progress: 0,
            message: String::new(),
            steps: StepBoard::default(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Mark the item as picked up by a worker.
    pub fn start(&mut self) {
        self.status = ItemStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Fold one progress event into the item.
    pub fn apply(&mut self, event: &ProgressEvent) {
        self.steps.set(event.step, event.state);
        self.message = event.message.clone();
        self.progress = event.step.progress_pct();
    }

    pub fn finish_ok(&mut self, message: &str) {
        self.status = ItemStatus::Done;
        self.progress = 100;
        self.message = message.to_string();
        self.finished_at = Some(Utc::now());
    }

    pub fn finish_error(&mut self, message: &str) {
        self.status = ItemStatus::Error;
        self.message = message.to_string();
        self.finished_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(ItemStatus::Pending.as_str(), "Pendente");
        assert_eq!(ItemStatus::Running.as_str(), "Executando");
        assert_eq!(ItemStatus::Done.as_str(), "Concluído");
        assert_eq!(ItemStatus::Error.as_str(), "Erro");
        assert_eq!(ItemStatus::Cancelled.as_str(), "Cancelado");
    }

    #[test]
    fn test_status_serializes_display_label() {
        let json = serde_json::to_string(&ItemStatus::Done).unwrap();
        assert_eq!(json, "\"Concluído\"");
    }

    #[test]
    fn test_step_progress_mapping() {
        assert_eq!(Step::Login.progress_pct(), 20);
        assert_eq!(Step::Extraction.progress_pct(), 40);
        assert_eq!(Step::Fill.progress_pct(), 70);
        assert_eq!(Step::Attachments.progress_pct(), 90);
    }

    #[test]
    fn test_step_display_names() {
        assert_eq!(Step::Extraction.as_str(), "Extração");
        assert_eq!(Step::Fill.as_str(), "Preenchimento");
    }

    #[test]
    fn test_board_starts_waiting() {
        let board = StepBoard::default();
        for step in [Step::Login, Step::Extraction, Step::Fill, Step::Attachments] {
            assert_eq!(board.get(step), StepState::Waiting);
        }
    }

    #[test]
    fn test_board_wire_format() {
        let mut board = StepBoard::default();
        board.set(Step::Login, StepState::Ok);
        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json["Login"], "✅");
        assert_eq!(json["Extração"], "⏳");
        assert_eq!(json["Preenchimento"], "⏳");
        assert_eq!(json["Anexos"], "⏳");
    }

    #[test]
    fn test_new_item_defaults() {
        let item = MigrationItem::new("123456", "cliente_a", "/base/cliente_a");
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.progress, 0);
        assert_eq!(item.message, "");
        assert!(item.started_at.is_none());
        assert!(item.finished_at.is_none());
    }

    #[test]
    fn test_apply_event_updates_progress() {
        let mut item = MigrationItem::new("1", "p", "/p");
        item.apply(&ProgressEvent::running(Step::Extraction, "Extraindo dados..."));
        assert_eq!(item.steps.extraction, StepState::Running);
        assert_eq!(item.message, "Extraindo dados...");
        assert_eq!(item.progress, 40);

        item.apply(&ProgressEvent::ok(Step::Fill, "Formulário preenchido"));
        assert_eq!(item.steps.fill, StepState::Ok);
        assert_eq!(item.progress, 70);
    }

    #[test]
    fn test_finish_transitions() {
        let mut item = MigrationItem::new("1", "p", "/p");
        item.start();
        assert_eq!(item.status, ItemStatus::Running);
        assert!(item.started_at.is_some());

        item.finish_ok("Migração concluída!");
        assert_eq!(item.status, ItemStatus::Done);
        assert_eq!(item.progress, 100);
        assert!(item.finished_at.is_some());
    }

    #[test]
    fn test_finish_error_keeps_progress() {
        let mut item = MigrationItem::new("1", "p", "/p");
        item.apply(&ProgressEvent::running(Step::Extraction, "Extraindo..."));
        item.finish_error("Erro: campo não encontrado");
        assert_eq!(item.status, ItemStatus::Error);
        // error leaves the last step percentage in place
        assert_eq!(item.progress, 40);
    }

    #[test]
    fn test_item_wire_names() {
        let item = MigrationItem::new("654321", "obra_x", "/base/obra_x");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["protocolo"], "654321");
        assert_eq!(json["nome_pasta"], "obra_x");
        assert_eq!(json["caminho_pasta"], "/base/obra_x");
        assert_eq!(json["status"], "Pendente");
        assert_eq!(json["progresso"], 0);
        assert_eq!(json["mensagem"], "");
        assert!(json["steps"].is_object());
        assert!(json.get("data_inicio").is_none());
    }
}
