use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use ordering_core::{Component, ValueObject};

/// Shipping address value object.
///
/// Compared structurally via its equality-component sequence; it has no
/// identity of its own and lives only on the order that carries it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    street: String,
    city: String,
    state: String,
    country: String,
    zip_code: String,
}

impl Address {
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        country: impl Into<String>,
        zip_code: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            state: state.into(),
            country: country.into(),
            zip_code: zip_code.into(),
        }
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn zip_code(&self) -> &str {
        &self.zip_code
    }
}

impl ValueObject for Address {
    fn equality_components(&self) -> Vec<Component> {
        vec![
            self.street.as_str().into(),
            self.city.as_str().into(),
            self.state.as_str().into(),
            self.country.as_str().into(),
            self.zip_code.as_str().into(),
        ]
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.value_eq(other)
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.value_hash());
    }
}
