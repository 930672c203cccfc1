//! Command structs for ledger operations.
//!
//! These types group parameters for write operations, keeping call sites
//! readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{AccountKind, EntryDraft};

/// Create an account in the chart of accounts.
#[derive(Clone, Debug)]
pub struct CreateAccountCmd {
    pub name: String,
    pub kind: AccountKind,
    pub category: Option<String>,
    pub active: bool,
}

impl CreateAccountCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            name: name.into(),
            kind,
            category: None,
            active: true,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Create a post.
#[derive(Clone, Debug)]
pub struct CreatePostCmd {
    pub author_id: String,
    pub persona: String,
    pub content: String,
    pub attachments: Vec<String>,
}

impl CreatePostCmd {
    #[must_use]
    pub fn new(
        author_id: impl Into<String>,
        persona: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            author_id: author_id.into(),
            persona: persona.into(),
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    #[must_use]
    pub fn attachment(mut self, reference: impl Into<String>) -> Self {
        self.attachments.push(reference.into());
        self
    }
}

/// Convert a post into a formal transaction.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub post_id: Uuid,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub created_by: String,
    pub entries: Vec<EntryDraft>,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn new(
        post_id: Uuid,
        description: impl Into<String>,
        occurred_at: DateTime<Utc>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            post_id,
            description: description.into(),
            occurred_at,
            created_by: created_by.into(),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn entry(mut self, entry: EntryDraft) -> Self {
        self.entries.push(entry);
        self
    }

    #[must_use]
    pub fn entries(mut self, entries: Vec<EntryDraft>) -> Self {
        self.entries = entries;
        self
    }
}

/// Patch for an existing transaction. `None` fields are left unchanged;
/// a `Some` entry set replaces the whole set atomically.
#[derive(Clone, Debug, Default)]
pub struct UpdateTransactionCmd {
    pub description: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub entries: Option<Vec<EntryDraft>>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    #[must_use]
    pub fn entries(mut self, entries: Vec<EntryDraft>) -> Self {
        self.entries = Some(entries);
        self
    }
}
