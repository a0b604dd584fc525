//! `cart show|add|set|remove|clear`.
//!
//! Each invocation loads the server cart first so the optimistic controller
//! starts from the real state.

use std::io::Write;

use vitrine_client::Cart;
use vitrine_core::{ProductId, Quantity};

use super::{CliError, Context, stdout};

/// Print the cart.
///
/// # Errors
///
/// Returns `CliError::Api` if the cart cannot be loaded.
pub async fn show(ctx: &Context) -> Result<(), CliError> {
    if !ctx.session.is_authenticated() {
        writeln!(stdout(), "Sign in to see your cart")?;
        return Ok(());
    }
    let cart = ctx.cart.load().await?;
    write_cart(&cart)
}

/// Add `quantity` units of a product.
///
/// # Errors
///
/// Returns `CliError::Api` for a zero quantity, an unknown product, or when
/// signed out.
pub async fn add(ctx: &Context, id: &str, quantity: u32) -> Result<(), CliError> {
    let quantity = Quantity::new(quantity).map_err(vitrine_client::ApiError::from)?;
    ctx.cart.load().await?;
    let product = ctx.client().get_product(&ProductId::new(id)).await?;
    let cart = ctx.cart.add(&product, quantity).await?;
    write_cart(&cart)
}

/// Set a line's quantity; zero removes it.
///
/// # Errors
///
/// Returns `CliError::Api` if the update is rejected or when signed out.
pub async fn set(ctx: &Context, id: &str, quantity: u32) -> Result<(), CliError> {
    ctx.cart.load().await?;
    let cart = ctx
        .cart
        .set_quantity(&ProductId::new(id), quantity)
        .await?;
    write_cart(&cart)
}

/// Remove a line.
///
/// # Errors
///
/// Returns `CliError::Api` if the removal is rejected or when signed out.
pub async fn remove(ctx: &Context, id: &str) -> Result<(), CliError> {
    ctx.cart.load().await?;
    let cart = ctx.cart.remove(&ProductId::new(id)).await?;
    write_cart(&cart)
}

/// Empty the cart.
///
/// # Errors
///
/// Returns `CliError::Api` if the request fails or when signed out.
pub async fn clear(ctx: &Context) -> Result<(), CliError> {
    let cart = ctx.cart.clear().await?;
    write_cart(&cart)
}

fn write_cart(cart: &Cart) -> Result<(), CliError> {
    let mut out = stdout();
    if cart.is_empty() {
        writeln!(out, "Your cart is empty")?;
        return Ok(());
    }

    for item in cart.items() {
        let title = item
            .product
            .as_ref()
            .map_or("(unavailable)", |p| p.title.as_str());
        writeln!(
            out,
            "{:>3} x {:<40} {:>14}",
            item.quantity.get(),
            title,
            item.line_total().to_string()
        )?;
    }
    writeln!(out, "{} item(s), total {}", cart.item_count(), cart.total())?;
    Ok(())
}
