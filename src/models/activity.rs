// src/models/activity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::auth::CurrentUser;

// Trilha de auditoria. Só observabilidade: nenhum fluxo lê daqui.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub actor_email: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    #[schema(value_type = Option<Object>)]
    pub changes: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub actor_id: Option<Uuid>,
    pub actor_email: Option<String>,
    pub action: &'static str,
    pub entity_type: &'static str,
    pub entity_id: Option<Uuid>,
    pub changes: Option<Value>,
}

impl NewActivity {
    pub fn by(actor: &CurrentUser, action: &'static str, entity_type: &'static str, entity_id: Uuid) -> Self {
        Self {
            actor_id: Some(actor.id),
            actor_email: Some(actor.email.clone()),
            action,
            entity_type,
            entity_id: Some(entity_id),
            changes: None,
        }
    }

    pub fn with_changes(mut self, changes: Value) -> Self {
        self.changes = Some(changes);
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFilter {
    pub entity_type: Option<String>,
}
