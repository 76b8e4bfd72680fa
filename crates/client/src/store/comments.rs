//! Comment operations.
//!
//! A comment lives in its own collection and is linked from the product's
//! `comments` array, so adding or removing one takes two writes. Both run as
//! a [`Saga`]: when the product write fails, the comment write is undone.

use catalog_core::{Comment, CommentDraft, CommentId, Product, ProductId};
use tracing::{debug, info, instrument, warn};

use super::{CatalogStore, SyncError};
use crate::api::{ApiError, CatalogApi};
use crate::saga::{Saga, SagaError};

impl<A: CatalogApi> CatalogStore<A> {
    #[instrument(skip(self, draft), fields(product_id = %product_id))]
    pub(super) async fn add_comment(
        &mut self,
        product_id: ProductId,
        draft: CommentDraft,
    ) -> Result<Comment, SyncError> {
        let comment = draft.into_comment(product_id);

        match create_and_link(&self.api, &comment).await {
            Ok((created, product)) => {
                self.sync_comment_links(&product);
                info!(comment_id = %created.id, "Comment added");
                Ok(created)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    #[instrument(skip(self), fields(product_id = %product_id, comment_id = %comment_id))]
    pub(super) async fn delete_comment(
        &mut self,
        product_id: ProductId,
        comment_id: CommentId,
    ) -> Result<(), SyncError> {
        match delete_and_unlink(&self.api, &product_id, &comment_id).await {
            Ok(product) => {
                self.sync_comment_links(&product);
                info!("Comment deleted");
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Best-effort removal of every comment attached to a deleted product.
    pub(super) async fn delete_orphaned_comments(&self, product_id: &ProductId) {
        let comments = match self.api.list_comments(product_id).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!(product_id = %product_id, error = %e, "Could not list comments to cascade");
                return;
            }
        };

        for comment in comments {
            match self.api.delete_comment(&comment.id).await {
                Ok(()) => debug!(comment_id = %comment.id, "Cascaded comment delete"),
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    warn!(comment_id = %comment.id, error = %e, "Cascaded comment delete failed");
                }
            }
        }
    }

    /// Adopt the comment links confirmed by the backend, if the product is
    /// held locally.
    fn sync_comment_links(&mut self, remote: &Product) {
        if let Some(local) = self.items.iter_mut().find(|p| p.id == remote.id) {
            local.comments.clone_from(&remote.comments);
            self.publish();
        } else {
            debug!(product_id = %remote.id, "Product not held locally, links not synced");
        }
    }
}

/// Create `comment`, then append its id to the owning product.
async fn create_and_link<A: CatalogApi>(
    api: &A,
    comment: &Comment,
) -> Result<(Comment, Product), SagaError> {
    let mut saga = Saga::new("add_comment");

    let created = saga
        .step_with("create_comment", api.create_comment(comment), |created| {
            let id = created.id.clone();
            Box::pin(async move { api.delete_comment(&id).await })
        })
        .await?;

    let product = saga
        .step("link_comment", async {
            let current = api.get_product(&comment.product_id).await?;
            api.replace_product(&current.with_comment(created.id.clone()))
                .await
        })
        .await?;

    saga.commit();
    Ok((created, product))
}

/// Delete the comment, then remove its id from the owning product.
///
/// The comment body is captured first so it can be re-created with the same
/// id and date if unlinking fails. A comment already gone remotely is still
/// unlinked.
async fn delete_and_unlink<A: CatalogApi>(
    api: &A,
    product_id: &ProductId,
    comment_id: &CommentId,
) -> Result<Product, SagaError> {
    let mut saga = Saga::new("delete_comment");

    let existing = saga
        .step("snapshot_comment", async {
            let comments = api.list_comments(product_id).await?;
            Ok::<_, ApiError>(comments.into_iter().find(|c| &c.id == comment_id))
        })
        .await?;

    saga.step_with(
        "delete_comment",
        async {
            match api.delete_comment(comment_id).await {
                Ok(()) => Ok(true),
                Err(e) if e.is_not_found() => Ok(false),
                Err(e) => Err(e),
            }
        },
        move |deleted| {
            let restore = existing.filter(|_| *deleted);
            Box::pin(async move {
                match restore {
                    Some(comment) => api.create_comment(&comment).await.map(|_| ()),
                    None => Ok(()),
                }
            })
        },
    )
    .await?;

    let product = saga
        .step("unlink_comment", async {
            let current = api.get_product(product_id).await?;
            api.replace_product(&current.without_comment(comment_id))
                .await
        })
        .await?;

    saga.commit();
    Ok(product)
}
