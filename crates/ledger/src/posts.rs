//! Posts.
//!
//! A [`Post`] is an informal free-text update. It may later spawn exactly one
//! transaction; the post then carries a back-reference for display. The link
//! is a lookup relation, not ownership: posts outlive their transactions.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger, util::parse_uuid};

/// Upper bound on post content length, in characters.
pub const MAX_CONTENT_CHARS: usize = 500;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: String,
    /// Display label the author posted under.
    pub persona: String,
    pub content: String,
    pub attachments: Vec<String>,
    /// Back-reference to the spawned transaction, if any. Set exactly once,
    /// at transaction creation, and never reassigned.
    pub transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        author_id: String,
        persona: String,
        content: String,
        attachments: Vec<String>,
    ) -> ResultLedger<Self> {
        if content.trim().is_empty() {
            return Err(LedgerError::InvalidPost(
                "content must not be empty".to_string(),
            ));
        }
        let chars = content.chars().count();
        if chars > MAX_CONTENT_CHARS {
            return Err(LedgerError::InvalidPost(format!(
                "content is {chars} characters, max is {MAX_CONTENT_CHARS}"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            author_id,
            persona,
            content,
            attachments,
            transaction_id: None,
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub author_id: String,
    pub persona: String,
    pub content: String,
    /// JSON array of attachment references.
    pub attachments: Option<String>,
    pub transaction_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Post> for ActiveModel {
    fn from(post: &Post) -> Self {
        let attachments = if post.attachments.is_empty() {
            None
        } else {
            serde_json::to_string(&post.attachments).ok()
        };
        Self {
            id: ActiveValue::Set(post.id.to_string()),
            author_id: ActiveValue::Set(post.author_id.clone()),
            persona: ActiveValue::Set(post.persona.clone()),
            content: ActiveValue::Set(post.content.clone()),
            attachments: ActiveValue::Set(attachments),
            transaction_id: ActiveValue::Set(post.transaction_id.map(|id| id.to_string())),
            created_at: ActiveValue::Set(post.created_at),
        }
    }
}

impl TryFrom<Model> for Post {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let attachments = match model.attachments.as_deref() {
            None => Vec::new(),
            Some(raw) => serde_json::from_str(raw)
                .map_err(|_| LedgerError::InvalidPost("invalid attachment list".to_string()))?,
        };
        Ok(Self {
            id: parse_uuid(&model.id, "post")?,
            author_id: model.author_id,
            persona: model.persona,
            content: model.content,
            attachments,
            transaction_id: model
                .transaction_id
                .as_deref()
                .map(|id| parse_uuid(id, "transaction"))
                .transpose()?,
            created_at: model.created_at,
        })
    }
}
