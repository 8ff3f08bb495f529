//! Pin descriptions and the ordered per-cell pin list.

use crate::PinKey;
use serde::{Deserialize, Serialize};
use strata_common::{Coord64, Named, Rect64};

/// Electrical direction of a pin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IoDirection {
    /// Not (yet) known - LEF and Liberty may each fill this in.
    #[default]
    Unknown,
    /// Input pin.
    Input,
    /// Output pin.
    Output,
    /// Tri-state output pin.
    OutputTri,
    /// Bidirectional pin.
    Io,
    /// Analog pin.
    Analog,
    /// Power supply pin.
    Power,
    /// Ground pin.
    Ground,
}

impl IoDirection {
    /// True for pins that accept a signal (INPUT or IO).
    pub fn is_input(self) -> bool {
        matches!(self, IoDirection::Input | IoDirection::Io)
    }

    /// True for pins that drive a signal (OUTPUT, OUTPUT_TRI or IO).
    pub fn is_output(self) -> bool {
        matches!(
            self,
            IoDirection::Output | IoDirection::OutputTri | IoDirection::Io
        )
    }

    /// True for power and ground pins.
    pub fn is_pg(self) -> bool {
        matches!(self, IoDirection::Power | IoDirection::Ground)
    }
}

/// Geometry on a single layer, used for pin shapes and obstructions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerShapes {
    /// Layer name as declared in the technology LEF.
    pub layer: String,
    /// Rectangles on that layer, cell-relative nm.
    pub rects: Vec<Rect64>,
}

/// Everything the library knows about one pin of a cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinInfo {
    /// Pin name, unique within the cell.
    pub name: String,
    /// Electrical direction.
    pub direction: IoDirection,
    /// Set when Liberty marks the pin as a clock.
    pub is_clock: bool,
    /// Pin offset within the cell, nm.
    pub offset: Coord64,
    /// Input capacitance in library units.
    pub cap_input: f64,
    /// Maximum output capacitance in library units.
    pub cap_max_output: f64,
    /// Maximum fan-out; 0 = unlimited.
    pub max_fanout: u32,
    /// Logic function string from Liberty.
    pub function: String,
    /// Tri-state enable function string from Liberty.
    pub tristate_function: String,
    /// Physical pin geometry per layer.
    pub shapes: Vec<LayerShapes>,
}

impl PinInfo {
    /// Creates a pin with the given name and everything else defaulted.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Named for PinInfo {
    fn name(&self) -> &str {
        &self.name
    }
}

/// The ordered, name-unique pin list of a cell.
///
/// Pin keys are dense indices into the declaration order; pins are never
/// removed, so keys stay valid for the cell's lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinList {
    pins: Vec<PinInfo>,
}

impl PinList {
    /// Creates an empty pin list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pins.
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// Returns `true` when the cell has no pins.
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Creates a pin, or returns the existing key when the name is already
    /// declared.
    pub fn create(&mut self, name: &str) -> PinKey {
        if let Some(key) = self.key_of(name) {
            return key;
        }
        let key = PinKey::from_raw(self.pins.len() as u32);
        self.pins.push(PinInfo::new(name));
        key
    }

    /// Looks up a pin by key.
    pub fn get(&self, key: PinKey) -> Option<&PinInfo> {
        self.pins.get(key.as_raw() as usize)
    }

    /// Looks up a pin by key, mutably.
    pub fn get_mut(&mut self, key: PinKey) -> Option<&mut PinInfo> {
        self.pins.get_mut(key.as_raw() as usize)
    }

    /// Returns the key of the named pin.
    pub fn key_of(&self, name: &str) -> Option<PinKey> {
        self.pins
            .iter()
            .position(|p| p.name == name)
            .map(|i| PinKey::from_raw(i as u32))
    }

    /// Looks up a pin by name.
    pub fn find(&self, name: &str) -> Option<(PinKey, &PinInfo)> {
        let key = self.key_of(name)?;
        Some((key, &self.pins[key.as_raw() as usize]))
    }

    /// Iterates `(key, pin)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (PinKey, &PinInfo)> {
        self.pins
            .iter()
            .enumerate()
            .map(|(i, p)| (PinKey::from_raw(i as u32), p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_predicates() {
        assert!(IoDirection::Input.is_input());
        assert!(IoDirection::Io.is_input());
        assert!(!IoDirection::Output.is_input());
        assert!(IoDirection::Output.is_output());
        assert!(IoDirection::OutputTri.is_output());
        assert!(IoDirection::Io.is_output());
        assert!(IoDirection::Power.is_pg());
        assert!(IoDirection::Ground.is_pg());
        assert!(!IoDirection::Input.is_pg());
    }

    #[test]
    fn create_is_idempotent() {
        let mut pins = PinList::new();
        let a = pins.create("A");
        let y = pins.create("Y");
        assert_ne!(a, y);
        assert_eq!(pins.create("A"), a);
        assert_eq!(pins.len(), 2);
    }

    #[test]
    fn keys_follow_declaration_order() {
        let mut pins = PinList::new();
        pins.create("A");
        pins.create("B");
        pins.create("Y");
        let names: Vec<&str> = pins.iter().map(|(_, p)| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "Y"]);
        assert_eq!(pins.key_of("Y").unwrap().as_raw(), 2);
    }

    #[test]
    fn lookup_by_name_and_key() {
        let mut pins = PinList::new();
        let key = pins.create("CLK");
        pins.get_mut(key).unwrap().is_clock = true;
        let (found, info) = pins.find("CLK").unwrap();
        assert_eq!(found, key);
        assert!(info.is_clock);
        assert!(pins.find("D").is_none());
    }
}
