//! Standard-cell descriptions.

use crate::pin::{LayerShapes, PinList};
use serde::{Deserialize, Serialize};
use strata_common::{Coord64, Named, Size64};

bitflags::bitflags! {
    /// Legal placement symmetries of a cell or site, from LEF `SYMMETRY`.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Symmetry: u8 {
        /// May be mirrored about the x axis.
        const X = 0b001;
        /// May be mirrored about the y axis.
        const Y = 0b010;
        /// May be rotated by 90 degrees.
        const R90 = 0b100;
    }
}

/// LEF `CLASS` of a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellClass {
    /// Ordinary standard cell placed in rows.
    #[default]
    Core,
    /// Cover cell (placement blockage artwork).
    Cover,
    /// Power ring cell.
    Ring,
    /// IO pad cell.
    Pad,
    /// Row end-cap cell.
    Endcap,
    /// Hard macro block.
    Block,
}

/// LEF class refinement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellSubclass {
    /// No subclass given.
    #[default]
    None,
    /// Feed-through cell.
    Feedthru,
    /// Tie-high cell.
    TieHigh,
    /// Tie-low cell.
    TieLow,
    /// Filler/spacer cell.
    Spacer,
    /// Decoupling capacitor cell.
    Decap,
    /// Well-tap cell.
    Welltap,
    /// Antenna diode cell.
    Antenna,
}

/// A library cell: geometry, electrical summary and its ordered pin list.
///
/// A cell can be abstract (LEF only, no logic information) - nothing here
/// distinguishes that beyond empty Liberty-sourced fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Cell name.
    pub name: String,
    /// Cell dimensions in nm.
    pub size: Size64,
    /// Placement offset (LEF `ORIGIN`), nm.
    pub offset: Coord64,
    /// Cell area in square micrometers (Liberty, falls back to size).
    pub area_um2: f64,
    /// Leakage power in library units.
    pub leakage_power: f64,
    /// Legal placement symmetries.
    pub symmetry: Symmetry,
    /// LEF class.
    pub class: CellClass,
    /// LEF subclass.
    pub subclass: CellSubclass,
    /// Name of the site this cell snaps to.
    pub site: String,
    /// Ordered pins.
    pub pins: PinList,
    /// Obstruction geometry per layer.
    pub obstructions: Vec<LayerShapes>,
}

impl Cell {
    /// Creates a named cell with everything else defaulted.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// True for CORE SPACER cells (fillers).
    pub fn is_core_filler(&self) -> bool {
        self.class == CellClass::Core && self.subclass == CellSubclass::Spacer
    }

    /// True for CORE DECAP cells.
    pub fn is_core_decap(&self) -> bool {
        self.class == CellClass::Core && self.subclass == CellSubclass::Decap
    }
}

impl Named for Cell {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetry_flags_combine() {
        let s = Symmetry::X | Symmetry::Y;
        assert!(s.contains(Symmetry::X));
        assert!(s.contains(Symmetry::Y));
        assert!(!s.contains(Symmetry::R90));
    }

    #[test]
    fn filler_and_decap_predicates() {
        let mut cell = Cell::new("FILL1");
        cell.subclass = CellSubclass::Spacer;
        assert!(cell.is_core_filler());
        assert!(!cell.is_core_decap());

        cell.subclass = CellSubclass::Decap;
        assert!(cell.is_core_decap());

        cell.class = CellClass::Pad;
        assert!(!cell.is_core_decap());
    }

    #[test]
    fn new_cell_defaults() {
        let cell = Cell::new("INV_X1");
        assert_eq!(cell.name, "INV_X1");
        assert_eq!(cell.class, CellClass::Core);
        assert!(cell.pins.is_empty());
        assert!(cell.size.is_null_size());
    }
}
