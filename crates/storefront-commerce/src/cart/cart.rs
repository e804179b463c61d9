//! Cart and cart item types.

use crate::cart::{CartPricing, LineItemPricing};
use crate::catalog::Product;
use crate::checkout::PreferenceItem;
use crate::error::CommerceError;
use crate::ids::CartItemId;
use crate::money::{self, Currency, Money};
use serde::{Deserialize, Serialize};

/// Maximum quantity allowed per cart line.
pub const MAX_QUANTITY_PER_ITEM: i64 = 9999;

/// A shopping cart.
///
/// Lines are keyed by [`CartItemId`]; adding an existing key bumps its
/// quantity instead of adding a second line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    /// Items in the cart, in insertion order.
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of an item.
    ///
    /// An existing line with the same id gains one unit (capped at
    /// [`MAX_QUANTITY_PER_ITEM`]); otherwise the item is appended with
    /// quantity 1 regardless of the quantity it carries. Returns the line's
    /// new quantity.
    pub fn add_item(&mut self, item: CartItem) -> i64 {
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing
                .quantity
                .saturating_add(1)
                .min(MAX_QUANTITY_PER_ITEM);
            return existing.quantity;
        }

        self.items.push(CartItem { quantity: 1, ..item });
        1
    }

    /// Set a line's quantity.
    ///
    /// Negative quantities are treated as 0 and lines at 0 are removed.
    /// Returns false if no line has this id.
    pub fn update_quantity(&mut self, id: &CartItemId, quantity: i64) -> bool {
        let quantity = quantity.clamp(0, MAX_QUANTITY_PER_ITEM);
        let Some(item) = self.items.iter_mut().find(|i| &i.id == id) else {
            return false;
        };
        item.quantity = quantity;
        self.items.retain(|i| i.quantity > 0);
        true
    }

    /// Remove a line from the cart.
    pub fn remove_item(&mut self, id: &CartItemId) -> bool {
        let len_before = self.items.len();
        self.items.retain(|i| &i.id != id);
        self.items.len() < len_before
    }

    /// Clear all items from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Get total item count (sum of quantities).
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Get number of distinct lines.
    pub fn unique_item_count(&self) -> usize {
        self.items.len()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get a line by id.
    pub fn get_item(&self, id: &CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// Sum of price * quantity across all lines.
    pub fn subtotal(&self) -> Result<Money, CommerceError> {
        let totals = self
            .items
            .iter()
            .map(CartItem::total)
            .collect::<Result<Vec<_>, _>>()?;
        Money::try_sum(totals.iter(), Currency::CLP).ok_or(CommerceError::Overflow)
    }

    /// Calculate cart pricing with a flat shipping amount.
    ///
    /// Returns error if arithmetic overflow occurs.
    pub fn calculate_pricing(&self, shipping: Money) -> Result<CartPricing, CommerceError> {
        let line_items = self
            .items
            .iter()
            .map(|item| {
                Ok(LineItemPricing {
                    item_id: item.id.clone(),
                    unit_price: item.price,
                    quantity: item.quantity,
                    total: item.total()?,
                })
            })
            .collect::<Result<Vec<_>, CommerceError>>()?;

        let subtotal = self.subtotal()?;
        let grand_total = subtotal.try_add(&shipping).ok_or_else(|| {
            CommerceError::CurrencyMismatch {
                expected: subtotal.currency.code().to_string(),
                got: shipping.currency.code().to_string(),
            }
        })?;

        Ok(CartPricing {
            subtotal,
            shipping_total: shipping,
            grand_total,
            line_items,
        })
    }

    /// Lines in the shape the create-preference endpoint accepts.
    pub fn to_preference_items(&self) -> Vec<PreferenceItem> {
        self.items
            .iter()
            .map(|item| PreferenceItem {
                id: item.id.to_string(),
                title: item.name.clone(),
                quantity: item.quantity,
                unit_price: item.price.to_decimal(),
            })
            .collect()
    }
}

/// A line in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    /// Cart key (product id, optionally suffixed with the variant option).
    pub id: CartItemId,
    /// Display name.
    pub name: String,
    /// Unit price in CLP.
    #[serde(with = "money::clp")]
    pub price: Money,
    /// Quantity.
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    /// Thumbnail URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

fn default_quantity() -> i64 {
    1
}

impl CartItem {
    /// Create a new cart line with quantity 1.
    pub fn new(id: impl Into<CartItemId>, name: impl Into<String>, price: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            quantity: 1,
            image: None,
        }
    }

    /// Cart line for a catalog product and optional variant option.
    pub fn for_product(product: &Product, option: Option<&str>) -> Self {
        Self {
            id: product.cart_item_id(option),
            name: product.display_name(option),
            price: product.price,
            quantity: 1,
            image: product.cover_image().map(str::to_string),
        }
    }

    /// price * quantity.
    pub fn total(&self) -> Result<Money, CommerceError> {
        self.price
            .try_multiply(self.quantity)
            .ok_or(CommerceError::Overflow)
    }
}
