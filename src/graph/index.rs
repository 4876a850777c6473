//! Index types for graph elements.
//!
//! Vertices and edges are addressed by type-safe wrappers around a `u32` slot
//! number. Slots are stable for the lifetime of a [`Graph`](super::Graph):
//! deleting an element tombstones its slot, it never shifts or reuses it.

use std::fmt::{self, Debug};

/// Raw storage type of every index.
type Raw = u32;

/// Sentinel for "no element".
const INVALID: Raw = Raw::MAX;

/// A type-safe vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertId(Raw);

/// A type-safe edge index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct EdgeId(Raw);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new index from a raw slot number.
            ///
            /// # Panics
            /// Panics in debug builds if the slot does not fit in 32 bits.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < INVALID as usize, "index {} too large", index);
                Self(index as Raw)
            }

            /// Create an invalid/null index.
            #[inline]
            pub fn invalid() -> Self {
                Self(INVALID)
            }

            /// Get the raw slot number.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Check if this is a valid (non-null) index.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != INVALID
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.index())
                } else {
                    write!(f, "{}(INVALID)", $display)
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertId, "V");
impl_index_type!(EdgeId, "E");

/// Canonical key for an undirected vertex pair: smaller index first.
#[inline]
pub fn undirected(a: VertId, b: VertId) -> (VertId, VertId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vert_id() {
        let v = VertId::new(42);
        assert_eq!(v.index(), 42);
        assert!(v.is_valid());

        let invalid = VertId::invalid();
        assert!(!invalid.is_valid());
        assert_eq!(VertId::default(), invalid);
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", VertId::new(42)), "V(42)");
        assert_eq!(format!("{:?}", EdgeId::new(7)), "E(7)");
        assert_eq!(format!("{:?}", EdgeId::invalid()), "E(INVALID)");
    }

    #[test]
    fn test_undirected_key() {
        let a = VertId::new(9);
        let b = VertId::new(2);
        assert_eq!(undirected(a, b), (b, a));
        assert_eq!(undirected(b, a), (b, a));
    }
}
