use serde::Serialize;

use crate::controller::PanelUiState;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelEvent {
    StateChanged { state: PanelUiState },
    ActionStarted { action: String },
    ActionFinished { action: String, ok: bool },
}
