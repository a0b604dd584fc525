//! Server-side cart models.

use serde::{Deserialize, Serialize};
use vitrine_core::{Price, ProductId, Quantity};

/// Product fields the backend embeds in each cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub title: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product in this line. Unique within a cart.
    pub product_id: ProductId,
    /// Always at least one.
    pub quantity: Quantity,
    /// Missing when the product was removed from the catalog.
    #[serde(default)]
    pub product: Option<ProductSnapshot>,
}

impl CartItem {
    /// `price * quantity`, zero when the snapshot is missing.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product
            .as_ref()
            .map_or(Price::ZERO, |p| p.price.times(self.quantity.get()))
    }
}

/// The authenticated user's cart, in server order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "CartWire", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

/// Cart endpoints answer with a bare list or `{ "items": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CartWire {
    Wrapped { items: Vec<CartItem> },
    Bare(Vec<CartItem>),
}

impl From<CartWire> for Cart {
    fn from(wire: CartWire) -> Self {
        match wire {
            CartWire::Wrapped { items } | CartWire::Bare(items) => Self { items },
        }
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self {
        Self { items }
    }
}

impl Cart {
    /// Lines in server order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub(crate) const fn items_mut(&mut self) -> &mut Vec<CartItem> {
        &mut self.items
    }

    /// Line for `product_id`, if present.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Sum of line totals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity.get()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
