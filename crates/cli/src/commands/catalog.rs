//! `products`, `product`, `categories`.

use std::io::Write;

use vitrine_client::{CatalogFilter, Product};
use vitrine_core::{CategoryId, ProductId, SortKey};

use super::{CliError, Context, format_rating, stdout};

/// List products, filtered by search text or by category.
///
/// # Errors
///
/// Returns `CliError::Api` if the request fails.
pub async fn products(
    ctx: &Context,
    search: Option<String>,
    category: Option<String>,
    sort: Option<SortKey>,
) -> Result<(), CliError> {
    let filter = match category {
        Some(id) => CatalogFilter::Category {
            id: CategoryId::new(id),
            sort,
        },
        None => CatalogFilter::All { search, sort },
    };

    let products = ctx.client().browse(&filter).await?;

    let mut out = stdout();
    if products.is_empty() {
        writeln!(out, "No products found")?;
        return Ok(());
    }
    for product in &products {
        write_product_line(&mut out, product)?;
    }
    Ok(())
}

/// Show one product with its reviews.
///
/// # Errors
///
/// Returns `CliError::Api` if either request fails.
pub async fn product(ctx: &Context, id: &str) -> Result<(), CliError> {
    let detail = ctx.client().product_detail(&ProductId::new(id)).await?;
    let product = &detail.product;

    let mut out = stdout();
    writeln!(out, "{}", product.title)?;
    writeln!(out, "Price:    {}", product.price)?;
    if let Some(name) = product.category.as_ref().and_then(|c| c.name()) {
        writeln!(out, "Category: {name}")?;
    }
    writeln!(
        out,
        "Rating:   {}",
        format_rating(product.rating.avg, product.rating.total)
    )?;
    if !product.sizes.is_empty() {
        writeln!(out, "Sizes:    {}", product.sizes.join(", "))?;
    }
    if let Some(description) = &product.description {
        writeln!(out, "\n{description}")?;
    }

    writeln!(out, "\nReviews ({})", detail.reviews.len())?;
    for review in &detail.reviews {
        let date = review
            .created_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        writeln!(out, "  {} {} {date}", review.rating, review.author_name())?;
        if let Some(comment) = &review.comment {
            writeln!(out, "    {comment}")?;
        }
    }
    Ok(())
}

/// List categories.
///
/// # Errors
///
/// Returns `CliError::Api` if the request fails.
pub async fn categories(ctx: &Context) -> Result<(), CliError> {
    let categories = ctx.client().list_categories().await?;

    let mut out = stdout();
    for category in &categories {
        writeln!(out, "{:<26} {}", category.id.as_str(), category.name)?;
    }
    Ok(())
}

fn write_product_line(out: &mut impl Write, product: &Product) -> std::io::Result<()> {
    writeln!(
        out,
        "{:<26} {:<40} {:>14}  {}",
        product.id.as_str(),
        product.title,
        product.price.to_string(),
        format_rating(product.rating.avg, product.rating.total)
    )
}
