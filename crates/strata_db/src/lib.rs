//! The chip database: cells, pins, modules, nets, instances, netlists,
//! technology data and the floorplan.
//!
//! Every entity lives in a [`NamedStore`](strata_common::NamedStore) owned
//! by its library; all cross-references use the opaque key types defined
//! here, never references. The [`Design`] aggregate ties the libraries
//! together and designates the top module the passes operate on.

#![warn(missing_docs)]

pub mod cell;
pub mod celllib;
pub mod design;
pub mod floorplan;
pub mod instance;
pub mod module;
pub mod net;
pub mod netlist;
pub mod pin;
pub mod techlib;

pub use cell::{Cell, CellClass, CellSubclass, Symmetry};
pub use celllib::{CellLib, ModuleLib};
pub use design::Design;
pub use floorplan::{Floorplan, Region, Row, RowType};
pub use instance::{Archetype, Instance, InstanceType, PlacementStatus};
pub use module::Module;
pub use net::{Net, NetConnect};
pub use netlist::Netlist;
pub use pin::{IoDirection, LayerShapes, PinInfo, PinList};
pub use techlib::{LayerDirection, LayerInfo, LayerType, SiteClass, SiteInfo, TechLib};

use strata_common::define_key;

define_key!(
    /// Key of a [`Cell`] in the [`CellLib`].
    CellKey
);

define_key!(
    /// Key of a [`Module`] in the [`ModuleLib`].
    ModuleKey
);

define_key!(
    /// Key of an [`Instance`] in a [`Netlist`].
    InstanceKey
);

define_key!(
    /// Key of a [`Net`] in a [`Netlist`].
    NetKey
);

define_key!(
    /// Index of a pin within a cell's ordered [`PinList`].
    PinKey
);

define_key!(
    /// Key of a [`LayerInfo`] in the [`TechLib`].
    LayerKey
);

define_key!(
    /// Key of a [`SiteInfo`] in the [`TechLib`].
    SiteKey
);
