//! Product commands.

use std::io::Write;

use catalog_client::StoreHandle;
use catalog_core::{ProductDraft, ProductId, ProductSortKey, sort_products};

use super::{ProductArgs, ProductEdits};
use crate::error::CliError;
use crate::render;

/// Load the catalog and print one row per product.
pub async fn list(
    store: &StoreHandle,
    sort: ProductSortKey,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let count = store.load().await?;
    if count == 0 {
        writeln!(out, "No products")?;
        return Ok(());
    }

    for product in sort_products(&store.snapshot().items, sort) {
        writeln!(out, "{}", render::product_row(&product))?;
    }
    Ok(())
}

/// Print a product and its comments.
pub async fn show(
    store: &StoreHandle,
    id: ProductId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    store.load().await?;
    let product = store
        .snapshot()
        .get(&id)
        .cloned()
        .ok_or(CliError::ProductNotFound(id))?;
    let comments = store.comments(product.id.clone()).await?;

    render::write_product(out, &product, &comments)?;
    Ok(())
}

pub async fn create(
    store: &StoreHandle,
    args: ProductArgs,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let draft = ProductDraft::from(args).validate()?;
    let product = store.create(draft).await?;

    writeln!(out, "Created {}", render::product_row(&product))?;
    Ok(())
}

/// Edit form: start from the current product, apply the changes, replace.
pub async fn update(
    store: &StoreHandle,
    id: ProductId,
    edits: ProductEdits,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if edits.is_empty() {
        return Err(CliError::NoChanges);
    }

    store.load().await?;
    let current = store
        .snapshot()
        .get(&id)
        .cloned()
        .ok_or(CliError::ProductNotFound(id))?;
    let draft = edits.apply_to(current.draft()).validate()?;
    let product = store.update(current.apply(draft)).await?;

    writeln!(out, "Updated {}", render::product_row(&product))?;
    Ok(())
}

pub async fn delete(
    store: &StoreHandle,
    id: ProductId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    store.delete(id.clone()).await?;

    writeln!(out, "Deleted {id}")?;
    Ok(())
}
