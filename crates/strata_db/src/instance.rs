//! Cell and module instances.

use crate::{CellKey, ModuleKey, NetKey, PinKey};
use serde::{Deserialize, Serialize};
use strata_common::{Coord64, Named, Orientation};

/// What an instance instantiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceType {
    /// Instance of an abstract (LEF-only) cell.
    Abstract,
    /// Instance of a library cell.
    Cell,
    /// Instance of a module (hierarchy).
    Module,
    /// Top-level port marker, bound to a `__INPIN`/`__OUTPIN`/`__IOPIN`
    /// pseudo-cell.
    Pin,
    /// Net connector realizing a Verilog `assign`, bound to `__NETCON`.
    NetCon,
}

/// Reference from an instance to its archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Archetype {
    /// A cell in the [`CellLib`](crate::CellLib).
    Cell(CellKey),
    /// A module in the [`ModuleLib`](crate::ModuleLib).
    Module(ModuleKey),
}

/// Placement state of an instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementStatus {
    /// State unknown.
    Undefined,
    /// Excluded from placement.
    Ignore,
    /// Not yet placed.
    #[default]
    Unplaced,
    /// Placed and movable.
    Placed,
    /// Placed and pinned down (pads, pre-placed macros).
    PlacedAndFixed,
}

/// An instantiation of a cell or module inside a netlist.
///
/// The pin-to-net table is private: it is sized to the archetype's pin count
/// at construction and kept consistent with the nets' connection lists by
/// [`Netlist::connect`](crate::Netlist::connect).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Instance name, unique within its netlist.
    pub name: String,
    /// What kind of archetype this instantiates.
    pub itype: InstanceType,
    /// The archetype reference.
    pub archetype: Archetype,
    /// Lower-left position in nm.
    pub pos: Coord64,
    /// Placement orientation.
    pub orientation: Orientation,
    /// Placement state.
    pub status: PlacementStatus,
    pin_to_net: Vec<Option<NetKey>>,
}

impl Instance {
    /// Creates an instance with `pin_count` unconnected pins.
    pub fn new(
        name: impl Into<String>,
        itype: InstanceType,
        archetype: Archetype,
        pin_count: usize,
    ) -> Self {
        Self {
            name: name.into(),
            itype,
            archetype,
            pos: Coord64::default(),
            orientation: Orientation::R0,
            status: PlacementStatus::Unplaced,
            pin_to_net: vec![None; pin_count],
        }
    }

    /// True when the instance is placed and pinned down.
    pub fn is_fixed(&self) -> bool {
        self.status == PlacementStatus::PlacedAndFixed
    }

    /// True when the instance is placed (fixed or movable).
    pub fn is_placed(&self) -> bool {
        matches!(
            self.status,
            PlacementStatus::Placed | PlacementStatus::PlacedAndFixed
        )
    }

    /// Number of pins.
    pub fn pin_count(&self) -> usize {
        self.pin_to_net.len()
    }

    /// The net connected to the given pin, if any.
    pub fn pin_net(&self, pin: PinKey) -> Option<NetKey> {
        self.pin_to_net
            .get(pin.as_raw() as usize)
            .copied()
            .flatten()
    }

    /// Sets (or clears) the net entry of a pin. Returns `false` when the
    /// pin index is out of range.
    pub(crate) fn set_pin_net(&mut self, pin: PinKey, net: Option<NetKey>) -> bool {
        match self.pin_to_net.get_mut(pin.as_raw() as usize) {
            Some(slot) => {
                *slot = net;
                true
            }
            None => false,
        }
    }

    /// Iterates `(pin, connected net)` over all pins in pin order.
    pub fn connections(&self) -> impl Iterator<Item = (PinKey, Option<NetKey>)> + '_ {
        self.pin_to_net
            .iter()
            .enumerate()
            .map(|(i, net)| (PinKey::from_raw(i as u32), *net))
    }
}

impl Named for Instance {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> Instance {
        Instance::new(
            "u1",
            InstanceType::Cell,
            Archetype::Cell(CellKey::from_raw(0)),
            2,
        )
    }

    #[test]
    fn status_predicates() {
        let mut ins = instance();
        assert!(!ins.is_placed());
        assert!(!ins.is_fixed());
        ins.status = PlacementStatus::Placed;
        assert!(ins.is_placed());
        assert!(!ins.is_fixed());
        ins.status = PlacementStatus::PlacedAndFixed;
        assert!(ins.is_placed());
        assert!(ins.is_fixed());
    }

    #[test]
    fn pin_table_bounds() {
        let mut ins = instance();
        let net = NetKey::from_raw(7);
        assert!(ins.set_pin_net(PinKey::from_raw(1), Some(net)));
        assert_eq!(ins.pin_net(PinKey::from_raw(1)), Some(net));
        assert_eq!(ins.pin_net(PinKey::from_raw(0)), None);
        assert!(!ins.set_pin_net(PinKey::from_raw(2), Some(net)));
        assert_eq!(ins.pin_net(PinKey::from_raw(9)), None);
    }

    #[test]
    fn connections_iterate_in_pin_order() {
        let mut ins = instance();
        ins.set_pin_net(PinKey::from_raw(0), Some(NetKey::from_raw(3)));
        let conns: Vec<_> = ins.connections().collect();
        assert_eq!(conns.len(), 2);
        assert_eq!(conns[0].1, Some(NetKey::from_raw(3)));
        assert_eq!(conns[1].1, None);
    }
}
