use serde::{Deserialize, Serialize};

use crate::domain::{MovementId, MovementKind};

/// Body of `POST /stock/move`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MoveRequest {
    pub product: String,
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub quantity: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MoveResponse {
    pub status: String,
    pub id: MovementId,
}

impl MoveResponse {
    pub fn recorded(id: MovementId) -> Self {
        Self {
            status: "recorded".to_string(),
            id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}
