//! Write conditions, scan filters, and update expressions
//!
//! A [`Condition`] is evaluated against the item currently stored under the
//! target key (or `None` when there is none). The store evaluates it and
//! applies the write as one atomic step per key.

use crate::item::Item;
use eventkeel_core::Value;
use std::fmt;

/// Predicate over the current state of an item
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The attribute is present
    AttributeExists(String),
    /// The attribute is absent (true when there is no item at all)
    AttributeNotExists(String),
    /// The attribute is present and equal to the value
    Equals(String, Value),
    /// All conditions hold
    And(Vec<Condition>),
}

impl Condition {
    /// `attribute_exists(name)`
    pub fn attribute_exists(name: impl Into<String>) -> Self {
        Condition::AttributeExists(name.into())
    }

    /// `attribute_not_exists(name)`
    pub fn attribute_not_exists(name: impl Into<String>) -> Self {
        Condition::AttributeNotExists(name.into())
    }

    /// `name = value`
    pub fn equals(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Equals(name.into(), value.into())
    }

    /// Conjunction with another condition
    pub fn and(self, other: Condition) -> Self {
        match self {
            Condition::And(mut all) => {
                all.push(other);
                Condition::And(all)
            }
            first => Condition::And(vec![first, other]),
        }
    }

    /// Evaluate against the stored item
    pub fn evaluate(&self, item: Option<&Item>) -> bool {
        match self {
            Condition::AttributeExists(name) => item.map_or(false, |i| i.contains_key(name)),
            Condition::AttributeNotExists(name) => item.map_or(true, |i| !i.contains_key(name)),
            Condition::Equals(name, expected) => {
                item.and_then(|i| i.get(name)).map_or(false, |v| v == expected)
            }
            Condition::And(all) => all.iter().all(|c| c.evaluate(item)),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::AttributeExists(name) => write!(f, "attribute_exists({})", name),
            Condition::AttributeNotExists(name) => write!(f, "attribute_not_exists({})", name),
            Condition::Equals(name, value) => write!(f, "{} = {:?}", name, value),
            Condition::And(all) => {
                for (i, c) in all.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    write!(f, "{}", c)?;
                }
                Ok(())
            }
        }
    }
}

/// Attribute-level update applied to an existing item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateExpression {
    sets: Vec<(String, Value)>,
}

impl UpdateExpression {
    /// Create an empty update
    pub fn new() -> Self {
        Self::default()
    }

    /// `SET name = value`
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sets.push((name.into(), value.into()));
        self
    }

    /// Attributes assigned by this update, in order
    pub fn assignments(&self) -> &[(String, Value)] {
        &self.sets
    }

    /// Check if the update assigns nothing
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Apply the assignments to an item
    pub fn apply(&self, item: &mut Item) {
        for (name, value) in &self.sets {
            item.insert(name.clone(), value.clone());
        }
    }
}
