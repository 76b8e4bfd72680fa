//! Comment commands.

use std::io::Write;

use catalog_client::StoreHandle;
use catalog_core::{CommentDraft, CommentId, ProductId};

use super::CommentArgs;
use crate::error::CliError;

pub async fn add(
    store: &StoreHandle,
    args: CommentArgs,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let draft = CommentDraft::new(args.description).validate()?;
    let comment = store.add_comment(args.product_id.into(), draft).await?;

    writeln!(out, "Added comment {} to {}", comment.id, comment.product_id)?;
    Ok(())
}

pub async fn delete(
    store: &StoreHandle,
    product_id: ProductId,
    comment_id: CommentId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    store
        .delete_comment(product_id.clone(), comment_id.clone())
        .await?;

    writeln!(out, "Deleted comment {comment_id} from {product_id}")?;
    Ok(())
}
