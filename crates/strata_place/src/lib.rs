//! Placement engine: quadratic global placement and row legalization.
//!
//! The pipeline takes a design whose top netlist holds unplaced core cells
//! and fixed pads, and produces non-overlapping, row-aligned positions:
//!
//! 1. **Snapshot** - flatten the top netlist into a [`PlacerNetlist`]
//! 2. **Global place** - recursive-bisection quadratic placement
//!    ([`placer::Placer`])
//! 3. **Legalize** - Abacus-style cluster collapse per row
//!    ([`legalizer::Legalizer`])
//!
//! [`tools`] holds the HPWL/area/placement-file utilities shared by the
//! passes.

#![warn(missing_docs)]

pub mod legalizer;
pub mod placer;
pub mod snapshot;
pub mod tools;

pub use legalizer::{calc_row_cost, place_row, LegalCell, LegalRow, Legalizer};
pub use placer::{NetModel, Placer, PlacerOptions, PointF};
pub use snapshot::{GateId, NetId, PlaceGate, PlaceNet, PlacerNetlist};
