//! `review add|delete`.

use std::io::Write;

use vitrine_client::{ApiError, ReviewDraft};
use vitrine_core::{ProductId, Rating};

use super::{CliError, Context, format_rating, stdout};

/// Review a product. The rating is checked before anything is sent.
///
/// # Errors
///
/// Returns `CliError::Api` for a rating outside 1-5, or with the server's
/// message if the review is rejected.
pub async fn add(
    ctx: &Context,
    id: &str,
    rating: u8,
    comment: Option<String>,
) -> Result<(), CliError> {
    let rating = Rating::new(rating).map_err(ApiError::from)?;
    let draft = ReviewDraft::new(rating, comment);

    let product = ctx
        .client()
        .submit_review(&ProductId::new(id), &draft)
        .await?;
    writeln!(
        stdout(),
        "Review saved. {} is now rated {}",
        product.title,
        format_rating(product.rating.avg, product.rating.total)
    )?;
    Ok(())
}

/// Delete your review of a product.
///
/// # Errors
///
/// Returns `CliError::Api` if the request fails.
pub async fn delete(ctx: &Context, id: &str) -> Result<(), CliError> {
    ctx.client().delete_review(&ProductId::new(id)).await?;
    writeln!(stdout(), "Review deleted")?;
    Ok(())
}
