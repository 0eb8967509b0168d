// Email drafts kept as one JSON document per workspace, outside the
// relational store, and promoted into email templates when finished.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::models::NewEmailTemplate;
use crate::repository::{ListRepository, ListStoreError};

#[derive(Error, Debug)]
pub enum DraftError {
    #[error(transparent)]
    Store(#[from] ListStoreError),

    #[error("Draft {0} not found")]
    NotFound(u32),

    #[error("Invalid draft: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub id: u32,
    pub name: String,
    pub subject: Option<String>,
    pub preheader: Option<String>,
    pub content: JsonValue,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftInput {
    pub name: String,
    pub subject: Option<String>,
    pub preheader: Option<String>,
    #[serde(default)]
    pub content: JsonValue,
}

#[derive(Clone)]
pub struct DraftLibrary {
    repo: Arc<dyn ListRepository<EmailDraft>>,
    /// Held across every load-modify-save so writers never interleave
    writes: Arc<Mutex<()>>,
}

impl DraftLibrary {
    pub fn new(repo: Arc<dyn ListRepository<EmailDraft>>) -> Self {
        Self {
            repo,
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list(&self) -> Result<Vec<EmailDraft>, DraftError> {
        Ok(self.repo.load().await?)
    }

    pub async fn get(&self, id: u32) -> Result<EmailDraft, DraftError> {
        self.list()
            .await?
            .into_iter()
            .find(|d| d.id == id)
            .ok_or(DraftError::NotFound(id))
    }

    /// Create a draft, or overwrite `id` when given
    pub async fn save(&self, id: Option<u32>, input: DraftInput) -> Result<EmailDraft, DraftError> {
        if input.name.trim().is_empty() {
            return Err(DraftError::Invalid("name must not be blank".to_string()));
        }

        let _guard = self.writes.lock().await;
        let mut drafts = self.repo.load().await?;
        let id = match id {
            Some(id) if drafts.iter().any(|d| d.id == id) => id,
            Some(id) => return Err(DraftError::NotFound(id)),
            None => drafts.iter().map(|d| d.id).max().unwrap_or(0) + 1,
        };

        let draft = EmailDraft {
            id,
            name: input.name,
            subject: input.subject,
            preheader: input.preheader,
            content: input.content,
            updated_at: Utc::now(),
        };
        match drafts.iter_mut().find(|d| d.id == id) {
            Some(existing) => *existing = draft.clone(),
            None => drafts.push(draft.clone()),
        }

        self.repo.save(&drafts).await?;
        info!("Saved email draft {} ({})", draft.id, draft.name);
        Ok(draft)
    }

    pub async fn remove(&self, id: u32) -> Result<(), DraftError> {
        let _guard = self.writes.lock().await;
        let mut drafts = self.repo.load().await?;
        let before = drafts.len();
        drafts.retain(|d| d.id != id);
        if drafts.len() == before {
            return Err(DraftError::NotFound(id));
        }
        self.repo.save(&drafts).await?;
        Ok(())
    }

    /// Insert contract for turning a draft into a stored email template
    pub async fn to_template(
        &self,
        id: u32,
        user_id: Option<i32>,
    ) -> Result<NewEmailTemplate, DraftError> {
        let draft = self.get(id).await?;
        let content = if draft.content.is_null() {
            JsonValue::Object(Default::default())
        } else {
            draft.content
        };

        Ok(NewEmailTemplate {
            user_id,
            name: draft.name,
            category: Some("draft".to_string()),
            subject: draft.subject,
            preheader: draft.preheader,
            content,
            thumbnail: None,
            is_public: Some(false),
        })
    }
}
