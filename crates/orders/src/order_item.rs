use serde::{Deserialize, Serialize};

use ordering_core::{DomainError, DomainResult, ProductId};

/// One order line.
///
/// Prices are in the smallest currency unit (e.g. cents). Invariants, held
/// at construction and across every mutator:
/// - units > 0
/// - discount >= 0
/// - discount never exceeds units * unit price
///
/// Mutators are check-then-commit: a rejected change leaves the line exactly
/// as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    product_id: ProductId,
    product_name: String,
    unit_price: i64,
    discount: i64,
    picture_url: String,
    units: i64,
}

impl OrderItem {
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        unit_price: i64,
        discount: i64,
        picture_url: impl Into<String>,
        units: i64,
    ) -> DomainResult<Self> {
        if units <= 0 {
            return Err(DomainError::validation("invalid number of units"));
        }
        if unit_price < 0 {
            return Err(DomainError::validation("invalid unit price"));
        }
        check_discount(units, unit_price, discount)?;

        Ok(Self {
            product_id,
            product_name: product_name.into(),
            unit_price,
            discount,
            picture_url: picture_url.into(),
            units,
        })
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn unit_price(&self) -> i64 {
        self.unit_price
    }

    pub fn discount(&self) -> i64 {
        self.discount
    }

    pub fn picture_url(&self) -> &str {
        &self.picture_url
    }

    pub fn units(&self) -> i64 {
        self.units
    }

    /// units * unit price - discount.
    pub fn line_total(&self) -> i64 {
        self.units * self.unit_price - self.discount
    }

    /// Replace the discount, re-validating the line invariants first.
    pub fn set_new_discount(&mut self, discount: i64) -> DomainResult<()> {
        check_discount(self.units, self.unit_price, discount)?;
        self.discount = discount;
        Ok(())
    }

    /// Add units to the line. A negative delta is itself invalid.
    pub fn add_units(&mut self, units: i64) -> DomainResult<()> {
        if units < 0 {
            return Err(DomainError::validation("invalid units"));
        }
        let new_units = self
            .units
            .checked_add(units)
            .ok_or_else(|| DomainError::validation("units overflow"))?;
        check_discount(new_units, self.unit_price, self.discount)?;
        self.units = new_units;
        Ok(())
    }
}

fn check_discount(units: i64, unit_price: i64, discount: i64) -> DomainResult<()> {
    if discount < 0 {
        return Err(DomainError::validation("discount is not valid"));
    }
    let gross = units
        .checked_mul(unit_price)
        .ok_or_else(|| DomainError::validation("item total overflow"))?;
    if discount > gross {
        return Err(DomainError::validation(
            "the total of the order item is lower than the applied discount",
        ));
    }
    Ok(())
}
