//! Identity-based deduplication
//!
//! Grouped resolution merges the values loaded for many keys into one
//! collection. An object reachable through several keys must appear once, and
//! "the same object" means the same allocation rather than deep equality, so
//! each value is reduced to an [`IdentityToken`] before it is compared.

use std::sync::Arc;

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::value::FieldValue;

/// Opaque identity of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityToken {
    /// All nulls share one identity
    Null,
    /// Address of a shared allocation
    Address(usize),
}

/// Extracts an identity token from a value
pub trait Identify {
    /// `None` means the value has no stable identity and is never merged
    fn identity(&self) -> Option<IdentityToken>;
}

impl Identify for FieldValue {
    fn identity(&self) -> Option<IdentityToken> {
        match self {
            FieldValue::Null => Some(IdentityToken::Null),
            FieldValue::Any(value) => Some(IdentityToken::Address(
                Arc::as_ptr(value) as *const () as usize,
            )),
            FieldValue::List(_) => None,
        }
    }
}

impl<T> Identify for Arc<T> {
    fn identity(&self) -> Option<IdentityToken> {
        Some(IdentityToken::Address(Arc::as_ptr(self) as *const () as usize))
    }
}

/// Insertion-ordered set keyed by identity
///
/// Holding every inserted value keeps its allocation alive, so an address
/// cannot be reused by a different value while the set exists.
#[derive(Debug)]
pub struct EntitySet<T> {
    entries: IndexMap<IdentityToken, T>,
    anonymous: Vec<(usize, T)>,
    inserted: usize,
}

impl<T: Identify> EntitySet<T> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            anonymous: Vec::new(),
            inserted: 0,
        }
    }

    /// Add a value unless one with the same identity is already present
    ///
    /// Returns `true` when the value was added.
    pub fn insert(&mut self, value: T) -> bool {
        let position = self.inserted;
        let added = match value.identity() {
            Some(token) => match self.entries.entry(token) {
                Entry::Occupied(_) => false,
                Entry::Vacant(slot) => {
                    slot.insert(value);
                    true
                }
            },
            None => {
                self.anonymous.push((position, value));
                true
            }
        };
        if added {
            self.inserted += 1;
        }
        added
    }

    /// Add every value of an iterator, in order
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, values: I) {
        for value in values {
            self.insert(value);
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        match value.identity() {
            Some(token) => self.entries.contains_key(&token),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inserted
    }

    pub fn is_empty(&self) -> bool {
        self.inserted == 0
    }

    /// Consume the set, yielding values in first-seen order
    pub fn into_vec(self) -> Vec<T> {
        if self.anonymous.is_empty() {
            return self.entries.into_values().collect();
        }

        // Interleave anonymous values back at the position they were inserted.
        let mut anonymous = self.anonymous.into_iter().peekable();
        let mut values = Vec::with_capacity(self.inserted);
        for value in self.entries.into_values() {
            while let Some((_, next)) = anonymous.next_if(|(at, _)| *at == values.len()) {
                values.push(next);
            }
            values.push(value);
        }
        values.extend(anonymous.map(|(_, value)| value));
        values
    }
}

impl<T: Identify> Default for EntitySet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Identify> FromIterator<T> for EntitySet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
