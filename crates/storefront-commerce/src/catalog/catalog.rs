//! In-memory product catalog.

use crate::catalog::{Product, VariantType};
use crate::error::CommerceError;
use crate::money::Money;
use serde::Serialize;
use std::collections::HashSet;

/// An ordered, read-only list of products.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate product ids.
    pub fn new(products: Vec<Product>) -> Result<Self, CommerceError> {
        let mut seen = HashSet::new();
        for product in &products {
            if !seen.insert(product.id.as_str()) {
                return Err(CommerceError::ValidationError(format!(
                    "duplicate product id {}",
                    product.id
                )));
            }
            if product.price.is_negative() {
                return Err(CommerceError::InvalidAmount(format!(
                    "product {} has a negative price",
                    product.id
                )));
            }
        }
        Ok(Self { products })
    }

    /// Parse a catalog from a JSON array of products.
    pub fn from_json(json: &str) -> Result<Self, CommerceError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::new(products)
    }

    /// The catalog the storefront ships with.
    pub fn builtin() -> Self {
        Self {
            products: vec![Product::new("1", "Camiseta Minimal", Money::clp(29990), "ropa")
                .with_compare_at_price(Money::clp(39990))
                .with_description("Camiseta de algodón orgánico")
                .with_image("https://placehold.co/600x600")
                .with_variant(VariantType::new("Talla", ["S", "M", "L"]))],
        }
    }

    /// Look up a product by id.
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Look up a product by id, failing with `ProductNotFound`.
    pub fn require(&self, id: &str) -> Result<&Product, CommerceError> {
        self.get(id)
            .ok_or_else(|| CommerceError::ProductNotFound(id.to_string()))
    }

    /// Products in a category (exact, case-insensitive slug match).
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> + 'a {
        self.products
            .iter()
            .filter(move |p| p.category.eq_ignore_ascii_case(category))
    }

    /// Products whose name, description or tags contain `term`.
    pub fn search<'a>(&'a self, term: &'a str) -> impl Iterator<Item = &'a Product> + 'a {
        self.products.iter().filter(move |p| p.matches(term))
    }

    /// Distinct category slugs, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.products.iter().map(|p| p.category.as_str()).collect();
        categories.sort_unstable();
        categories.dedup();
        categories
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        let mut mug = Product::new("2", "Taza Esmaltada", Money::clp(8990), "hogar")
            .with_description("Taza de acero esmaltado");
        mug.add_tag("camping");
        let cap = Product::new("3", "Jockey Bordado", Money::clp(14990), "ropa");
        Catalog::new(vec![
            Catalog::builtin().get("1").cloned().unwrap(),
            mug,
            cap,
        ])
        .unwrap()
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 1);
        let shirt = catalog.get("1").unwrap();
        assert_eq!(shirt.name, "Camiseta Minimal");
        assert_eq!(shirt.price, Money::clp(29990));
        assert_eq!(shirt.variants[0].options, vec!["S", "M", "L"]);
    }

    #[test]
    fn test_get_and_require() {
        let catalog = sample();
        assert!(catalog.get("2").is_some());
        assert!(catalog.get("99").is_none());
        assert!(matches!(
            catalog.require("99"),
            Err(CommerceError::ProductNotFound(id)) if id == "99"
        ));
    }

    #[test]
    fn test_by_category() {
        let catalog = sample();
        let ids: Vec<&str> = catalog.by_category("ROPA").map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(catalog.categories(), vec!["hogar", "ropa"]);
    }

    #[test]
    fn test_search() {
        let catalog = sample();
        let ids: Vec<&str> = catalog.search("camping").map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
        assert_eq!(catalog.search("").count(), 3);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let a = Product::new("1", "A", Money::clp(1), "x");
        let b = Product::new("1", "B", Money::clp(2), "x");
        assert!(matches!(
            Catalog::new(vec![a, b]),
            Err(CommerceError::ValidationError(_))
        ));
    }

    #[test]
    fn test_from_json() {
        let catalog = Catalog::from_json(
            r#"[{"id": "5", "name": "Polerón", "price": 45990, "category": "ropa"}]"#,
        )
        .unwrap();
        assert_eq!(catalog.get("5").unwrap().price, Money::clp(45990));

        assert!(Catalog::from_json("{not json").is_err());
        assert!(Catalog::from_json(r#"[{"id": "5", "name": "X", "price": -1, "category": "c"}]"#).is_err());
    }

    #[test]
    fn test_catalog_serializes_as_array() {
        let json = serde_json::to_value(Catalog::builtin()).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["id"], "1");
    }
}
