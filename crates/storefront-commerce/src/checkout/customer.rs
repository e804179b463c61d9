//! Customer details and form validation.

use crate::checkout::regions;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Minimum number of digits in a phone number.
pub const MIN_PHONE_DIGITS: usize = 8;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("valid email regex"));

/// Customer data entered in the checkout form.
///
/// Accepts both the form's camelCase keys and the Spanish keys used by
/// older clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerDetails {
    #[serde(alias = "nombre")]
    pub first_name: String,
    #[serde(alias = "apellido")]
    pub last_name: String,
    pub email: String,
    #[serde(alias = "telefono")]
    pub phone: String,
    #[serde(alias = "direccion")]
    pub address: String,
    pub region: String,
    #[serde(alias = "comuna")]
    pub commune: String,
    /// Delivery notes for the carrier.
    #[serde(alias = "observacion")]
    pub observations: String,
}

impl CustomerDetails {
    /// Validate every field, collecting one message per failing field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.first_name.trim().is_empty() {
            errors.insert("firstName", "Nombre es requerido.");
        }
        if self.last_name.trim().is_empty() {
            errors.insert("lastName", "Apellido es requerido.");
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.insert("email", "Email es requerido.");
        } else if !is_valid_email(email) {
            errors.insert("email", "Formato de email inválido.");
        }

        let phone = normalize_phone(&self.phone);
        if self.phone.trim().is_empty() {
            errors.insert("phone", "Teléfono es requerido.");
        } else if phone.len() < MIN_PHONE_DIGITS {
            errors.insert("phone", "Teléfono debe tener al menos 8 dígitos.");
        }

        if self.address.trim().is_empty() {
            errors.insert("address", "Dirección es requerida.");
        }

        if self.region.trim().is_empty() {
            errors.insert("region", "Región es requerida.");
        } else if !regions::is_region(&self.region) {
            errors.insert("region", "Región inválida.");
        }

        if self.commune.trim().is_empty() {
            errors.insert("commune", "Comuna es requerida.");
        } else if regions::is_region(&self.region)
            && !regions::contains(&self.region, &self.commune)
        {
            errors.insert("commune", "Comuna no pertenece a la región seleccionada.");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Copy with surrounding whitespace trimmed and the phone reduced to digits.
    pub fn normalized(&self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: normalize_phone(&self.phone),
            address: self.address.trim().to_string(),
            region: self.region.trim().to_string(),
            commune: self.commune.trim().to_string(),
            observations: self.observations.trim().to_string(),
        }
    }

    /// "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Keep only the ASCII digits of a phone number.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Validation failures keyed by form field.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, &'static str>);

impl FieldErrors {
    fn insert(&mut self, field: &'static str, message: &'static str) {
        self.0.insert(field, message);
    }

    /// Message for a field, if it failed.
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{joined}")
    }
}

impl std::error::Error for FieldErrors {}
