use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{CreatePostCmd, LedgerError, Post, ResultLedger, posts, util::parse_uuid};

use super::{Ledger, normalize_required_text, with_tx};

impl Ledger {
    /// Publishes a post. Content is bounded; see [`crate::MAX_CONTENT_CHARS`].
    ///
    /// Whether the post *sounds* financial is advisory metadata the caller
    /// derives via [`crate::suggests_financial`]; nothing here depends on it.
    pub async fn create_post(&self, cmd: CreatePostCmd) -> ResultLedger<Post> {
        let author_id = normalize_required_text(&cmd.author_id, "author id")?;
        let persona = normalize_required_text(&cmd.persona, "persona")?;
        let post = Post::new(author_id, persona, cmd.content, cmd.attachments)?;

        with_tx!(self, |db_tx| {
            posts::ActiveModel::from(&post).insert(&db_tx).await?;
            tracing::info!(id = %post.id, author = %post.author_id, "post created");
            Ok(post)
        })
    }

    /// Returns a post by id.
    pub async fn post(&self, post_id: Uuid) -> ResultLedger<Post> {
        let model = posts::Entity::find_by_id(post_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound("post not exists".to_string()))?;
        Post::try_from(model)
    }

    /// Lists the most recent posts, newest first.
    pub async fn list_recent_posts(&self, limit: u64) -> ResultLedger<Vec<Post>> {
        let models = posts::Entity::find()
            .order_by_desc(posts::Column::CreatedAt)
            .limit(limit)
            .all(&self.database)
            .await?;
        models.into_iter().map(Post::try_from).collect()
    }

    /// Returns the id of the transaction linked to a post, or `None` when the
    /// post has not been converted yet. Fails `NotFound` for unknown posts.
    pub async fn transaction_for_post(&self, post_id: Uuid) -> ResultLedger<Option<Uuid>> {
        let model = posts::Entity::find_by_id(post_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound("post not exists".to_string()))?;

        model
            .transaction_id
            .as_deref()
            .map(|id| parse_uuid(id, "transaction"))
            .transpose()
    }

    /// Writes the post→transaction back-reference.
    ///
    /// Conditional on the link still being unset, so two concurrent
    /// conversions of the same post serialize here: the loser's update
    /// touches zero rows and fails `PostAlreadyLinked`.
    pub(super) async fn link_post_to_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        post_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultLedger<()> {
        let result = posts::Entity::update_many()
            .col_expr(
                posts::Column::TransactionId,
                Expr::value(Some(transaction_id.to_string())),
            )
            .filter(posts::Column::Id.eq(post_id.to_string()))
            .filter(posts::Column::TransactionId.is_null())
            .exec(db_tx)
            .await?;

        if result.rows_affected == 0 {
            let exists = posts::Entity::find_by_id(post_id.to_string())
                .one(db_tx)
                .await?
                .is_some();
            if exists {
                tracing::warn!(post = %post_id, "post link race lost");
                return Err(LedgerError::PostAlreadyLinked(post_id.to_string()));
            }
            return Err(LedgerError::NotFound("post not exists".to_string()));
        }

        Ok(())
    }
}
