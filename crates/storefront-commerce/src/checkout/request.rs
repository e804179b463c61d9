//! Request bodies for the checkout endpoints.

use crate::checkout::CustomerDetails;
use crate::error::CommerceError;
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// One line of a Mercado Pago preference as sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreferenceItem {
    pub id: String,
    pub title: String,
    pub quantity: i64,
    /// Unit price in CLP; rounded to whole pesos when sent to the gateway.
    pub unit_price: f64,
}

impl PreferenceItem {
    pub fn unit_price_money(&self) -> Money {
        Money::from_decimal(self.unit_price, Currency::CLP)
    }

    /// unit_price (rounded) * quantity.
    pub fn total(&self) -> Result<Money, CommerceError> {
        self.unit_price_money()
            .try_multiply(self.quantity)
            .ok_or(CommerceError::Overflow)
    }

    fn validate(&self) -> Result<(), CommerceError> {
        if self.id.trim().is_empty() || self.title.trim().is_empty() {
            return Err(CommerceError::ValidationError(
                "Invalid item structure in request body".to_string(),
            ));
        }
        if self.quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(self.quantity));
        }
        if !self.unit_price.is_finite() || self.unit_price < 0.0 {
            return Err(CommerceError::InvalidAmount(format!(
                "unit_price {} for item {}",
                self.unit_price, self.id
            )));
        }
        Ok(())
    }
}

/// Body of the Mercado Pago checkout endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(flatten)]
    pub customer: CustomerDetails,
    #[serde(default)]
    pub items: Vec<PreferenceItem>,
    #[serde(default)]
    pub shipping_cost: f64,
}

impl CheckoutRequest {
    /// Validate the item list: non-empty, positive quantities, non-negative prices.
    pub fn validate_items(&self) -> Result<(), CommerceError> {
        if self.items.is_empty() {
            return Err(CommerceError::ValidationError(
                "Invalid or empty items array in request body".to_string(),
            ));
        }
        for item in &self.items {
            item.validate()?;
        }
        if !self.shipping_cost.is_finite() || self.shipping_cost < 0.0 {
            return Err(CommerceError::InvalidAmount(format!(
                "shippingCost {}",
                self.shipping_cost
            )));
        }
        Ok(())
    }

    pub fn shipping(&self) -> Money {
        Money::from_decimal(self.shipping_cost, Currency::CLP)
    }

    /// Items total plus shipping, in whole pesos.
    pub fn total(&self) -> Result<Money, CommerceError> {
        let totals = self
            .items
            .iter()
            .map(PreferenceItem::total)
            .collect::<Result<Vec<_>, _>>()?;
        Money::try_sum(totals.iter(), Currency::CLP)
            .and_then(|subtotal| subtotal.try_add(&self.shipping()))
            .ok_or(CommerceError::Overflow)
    }
}

/// Body of the Flow checkout endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowCheckoutRequest {
    #[serde(flatten)]
    pub customer: CustomerDetails,
    #[serde(default)]
    pub amount: f64,
}

impl FlowCheckoutRequest {
    /// Amount rounded to whole pesos; must be positive.
    pub fn amount(&self) -> Result<Money, CommerceError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(CommerceError::InvalidAmount(
                "Missing or invalid amount".to_string(),
            ));
        }
        let amount = Money::from_decimal(self.amount, Currency::CLP);
        if !amount.is_positive() {
            return Err(CommerceError::InvalidAmount(
                "Missing or invalid amount".to_string(),
            ));
        }
        Ok(amount)
    }
}
