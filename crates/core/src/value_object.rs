//! Value object contract: equality by component sequence, not identity.
//!
//! A value object is defined entirely by its attribute values. Two instances
//! are equal iff their ordered sequences of equality components are pairwise
//! equal; the hash is combined from the same components in the same order, so
//! it is always consistent with equality. Fields left out of the component
//! sequence do not participate in equality at all.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One element of a value object's equality sequence.
///
/// `None` compares equal to `None`, so optional members can participate in
/// equality without special-casing. `Nested` carries the component sequence
/// of an embedded value object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Component {
    None,
    Bool(bool),
    Int(i64),
    Text(String),
    Uuid(Uuid),
    /// Unix timestamp in milliseconds.
    Timestamp(i64),
    Nested(Vec<Component>),
}

impl From<bool> for Component {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Component {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Component {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Component {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Component {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Uuid> for Component {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<DateTime<Utc>> for Component {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value.timestamp_millis())
    }
}

impl<T> From<Option<T>> for Component
where
    T: Into<Component>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => Self::None,
        }
    }
}

/// Trait for immutable domain values compared structurally.
///
/// Implementors list their equality components in a fixed order; the provided
/// `value_eq`/`value_hash` derive equality and hashing from that sequence.
/// Sequences of different length are never equal. Implementors typically wire
/// `PartialEq`/`Hash` straight through these methods.
pub trait ValueObject: Clone + core::fmt::Debug {
    /// The ordered equality component sequence.
    fn equality_components(&self) -> Vec<Component>;

    fn value_eq(&self, other: &Self) -> bool {
        self.equality_components() == other.equality_components()
    }

    /// Hash combined from the components in sequence order.
    ///
    /// Equal objects always produce equal hashes.
    fn value_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for component in self.equality_components() {
            component.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Components of an embedded value object, for use inside a parent's
    /// component sequence.
    fn as_component(&self) -> Component {
        Component::Nested(self.equality_components())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Inner {
        a: i64,
        b: String,
    }

    impl ValueObject for Inner {
        fn equality_components(&self) -> Vec<Component> {
            vec![self.a.into(), self.b.clone().into()]
        }
    }

    #[derive(Debug, Clone)]
    struct Outer {
        a: i64,
        b: Option<String>,
        c: Uuid,
        d: Inner,
        /// Not part of the equality sequence.
        note: String,
    }

    impl ValueObject for Outer {
        fn equality_components(&self) -> Vec<Component> {
            vec![
                self.a.into(),
                self.b.clone().into(),
                self.c.into(),
                self.d.as_component(),
            ]
        }
    }

    fn sample() -> Outer {
        Outer {
            a: 1,
            b: Some("2".to_string()),
            c: Uuid::parse_str("97ea43f0-6fef-4fb7-8c67-9114a7ff6ec0").unwrap(),
            d: Inner {
                a: 2,
                b: "3".to_string(),
            },
            note: String::new(),
        }
    }

    #[test]
    fn equal_components_mean_equal_objects_and_equal_hashes() {
        let left = sample();
        let right = sample();
        assert!(left.value_eq(&right));
        assert_eq!(left.value_hash(), right.value_hash());
    }

    #[test]
    fn any_differing_component_breaks_equality() {
        let base = sample();

        let mut changed = sample();
        changed.a = 2;
        assert!(!base.value_eq(&changed));

        let mut changed = sample();
        changed.b = None;
        assert!(!base.value_eq(&changed));

        let mut changed = sample();
        changed.d.b = "4".to_string();
        assert!(!base.value_eq(&changed));
    }

    #[test]
    fn members_outside_the_sequence_do_not_affect_equality() {
        let left = sample();
        let mut right = sample();
        right.note = "xpto".to_string();
        assert!(left.value_eq(&right));
        assert_eq!(left.value_hash(), right.value_hash());
    }

    #[test]
    fn none_components_compare_equal() {
        let mut left = sample();
        left.b = None;
        let mut right = sample();
        right.b = None;
        assert!(left.value_eq(&right));
    }

    #[test]
    fn sequences_of_different_length_are_unequal() {
        let short = Inner {
            a: 1,
            b: "2".to_string(),
        };
        let padded = vec![Component::Int(1), Component::Text("2".to_string()), Component::None];
        assert_ne!(short.equality_components(), padded);
    }
}
