//! Plain-text rendering of catalog entities.

use std::io::{self, Write};

use catalog_core::{Comment, Product};

/// One line per product: id, name, count, size, weight and comment count.
pub fn product_row(product: &Product) -> String {
    format!(
        "{id}  {name:<24}  {count:>5}  {width}x{height}  {weight}  ({comments} comments)",
        id = product.id,
        name = product.name,
        count = product.count,
        width = product.size.width,
        height = product.size.height,
        weight = product.weight,
        comments = product.comments.len(),
    )
}

pub fn comment_row(comment: &Comment) -> String {
    format!(
        "{id}  {date}  {description}",
        id = comment.id,
        date = comment.date.format("%Y-%m-%d %H:%M"),
        description = comment.description,
    )
}

/// Full product view followed by its comments.
pub fn write_product(
    out: &mut impl Write,
    product: &Product,
    comments: &[Comment],
) -> io::Result<()> {
    writeln!(out, "{}", product.name)?;
    writeln!(out, "  id:      {}", product.id)?;
    writeln!(out, "  count:   {}", product.count)?;
    writeln!(
        out,
        "  size:    {} x {}",
        product.size.width, product.size.height
    )?;
    writeln!(out, "  weight:  {}", product.weight)?;
    writeln!(out, "  image:   {}", product.image_url)?;

    if comments.is_empty() {
        writeln!(out, "  no comments")?;
    } else {
        writeln!(out, "  comments:")?;
        for comment in comments {
            writeln!(out, "    {}", comment_row(comment))?;
        }
    }
    Ok(())
}
