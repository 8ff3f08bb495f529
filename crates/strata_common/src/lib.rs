//! Shared foundation types for the strata place-and-route engine.
//!
//! This crate holds everything the higher layers agree on: integer geometry
//! in nanometers, opaque entity keys, the name-and-key indexed
//! [`NamedStore`](store::NamedStore) container, the common error taxonomy,
//! and the console logging sink.

#![warn(missing_docs)]

pub mod error;
pub mod geometry;
pub mod keys;
pub mod logging;
pub mod store;

pub use error::{ParseError, StrataError, StrataResult};
pub use geometry::{Coord64, Margins64, Orientation, Rect64, Size64};
pub use keys::StoreKey;
pub use store::{ListenerToken, Named, NamedStore, StoreEvent, StoreListener};
