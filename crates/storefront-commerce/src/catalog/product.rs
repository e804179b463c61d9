//! Product and variant types.

use crate::ids::{CartItemId, ProductId};
use crate::money::{self, Money};
use serde::{Deserialize, Serialize};

/// A product in the catalog.
///
/// Field names follow the storefront's JSON catalog (`compareAtPrice`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Selling price in CLP.
    #[serde(with = "money::clp")]
    pub price: Money,
    /// Previous price, shown struck through when higher than `price`.
    #[serde(
        with = "money::clp::option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub compare_at_price: Option<Money>,
    /// Full description.
    #[serde(default)]
    pub description: String,
    /// Image URLs, first one is the cover.
    #[serde(default)]
    pub images: Vec<String>,
    /// Variant dimensions (e.g. size).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<VariantType>,
    /// Category slug.
    pub category: String,
    /// Tags for filtering/search.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Product {
    /// Create a new product without variants.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            compare_at_price: None,
            description: String::new(),
            images: Vec::new(),
            variants: Vec::new(),
            category: category.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_compare_at_price(mut self, price: Money) -> Self {
        self.compare_at_price = Some(price);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.images.push(url.into());
        self
    }

    pub fn with_variant(mut self, variant: VariantType) -> Self {
        self.variants.push(variant);
        self
    }

    /// Add a tag if not already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Check if this product has selectable variants.
    pub fn has_variants(&self) -> bool {
        self.variants.iter().any(|v| !v.options.is_empty())
    }

    /// Check if this product is on sale (has a higher compare-at price).
    pub fn is_on_sale(&self) -> bool {
        self.compare_at_price
            .map(|cap| cap.amount_minor > self.price.amount_minor)
            .unwrap_or(false)
    }

    /// Calculate the discount percentage if on sale, rounded to a whole percent.
    pub fn discount_percent(&self) -> Option<u32> {
        self.compare_at_price.and_then(|cap| {
            if cap.amount_minor > self.price.amount_minor && cap.amount_minor > 0 {
                let savings = cap.amount_minor - self.price.amount_minor;
                Some(((savings as f64 / cap.amount_minor as f64) * 100.0).round() as u32)
            } else {
                None
            }
        })
    }

    /// Cover image, if any.
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Check whether `option` is one of the values offered by any variant.
    pub fn offers_option(&self, option: &str) -> bool {
        self.variants
            .iter()
            .any(|v| v.options.iter().any(|o| o == option))
    }

    /// Cart key for this product with an optional variant option.
    ///
    /// The same product in two sizes is two cart lines.
    pub fn cart_item_id(&self, option: Option<&str>) -> CartItemId {
        match option {
            Some(option) if !option.is_empty() => {
                CartItemId::new(format!("{}-{}", self.id, option))
            }
            _ => CartItemId::new(self.id.as_str()),
        }
    }

    /// Display name for a cart line, e.g. "Camiseta Minimal (M)".
    pub fn display_name(&self, option: Option<&str>) -> String {
        match option {
            Some(option) if !option.is_empty() => format!("{} ({})", self.name, option),
            _ => self.name.clone(),
        }
    }

    /// Case-insensitive match on name, description and tags.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&term))
    }
}

/// A variant dimension such as size or color.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariantType {
    /// Dimension name (e.g., "Talla").
    pub name: String,
    /// Values the customer can pick.
    pub options: Vec<String>,
}

impl VariantType {
    pub fn new<I, S>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            options: options.into_iter().map(Into::into).collect(),
        }
    }
}
