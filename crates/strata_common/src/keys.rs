//! Opaque key newtypes for database entities.
//!
//! Every entity container hands out keys of a distinct type so an
//! [`InstanceKey`] can never be used to look up a net. Keys are thin `u32`
//! wrappers; they are assigned by [`NamedStore`](crate::store::NamedStore)
//! in add order and are never reused within a container's lifetime.

use serde::{Deserialize, Serialize};

/// Trait implemented by all key newtypes, providing the `u32` bijection the
/// stores need.
pub trait StoreKey: Copy + Ord {
    /// Creates a key from a raw `u32` value.
    fn from_raw(raw: u32) -> Self;

    /// Returns the raw `u32` value.
    fn as_raw(self) -> u32;
}

/// Defines an opaque `u32`-backed key newtype.
#[macro_export]
macro_rules! define_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug,
            serde::Serialize, serde::Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates a key from a raw `u32` value.
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// Returns the raw `u32` value.
            pub const fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl $crate::keys::StoreKey for $name {
            fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

/// A generic key used where no entity-specific type applies (tests, generic
/// plumbing).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct RawKey(u32);

impl RawKey {
    /// Creates a key from a raw `u32` value.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw `u32` value.
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

impl StoreKey for RawKey {
    fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    fn as_raw(self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    define_key!(
        /// Key type local to this test module.
        TestKey
    );

    #[test]
    fn roundtrip() {
        let k = TestKey::from_raw(42);
        assert_eq!(k.as_raw(), 42);
    }

    #[test]
    fn ordering_follows_raw_value() {
        assert!(TestKey::from_raw(1) < TestKey::from_raw(2));
    }

    #[test]
    fn hashable() {
        let mut set = HashSet::new();
        set.insert(TestKey::from_raw(1));
        set.insert(TestKey::from_raw(2));
        set.insert(TestKey::from_raw(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serde_roundtrip() {
        let k = RawKey::from_raw(99);
        let json = serde_json::to_string(&k).unwrap();
        let back: RawKey = serde_json::from_str(&json).unwrap();
        assert_eq!(k, back);
    }
}
