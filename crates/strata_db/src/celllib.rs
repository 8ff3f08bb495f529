//! Cell and module libraries.

use crate::pin::IoDirection;
use crate::{Cell, CellKey, Module, ModuleKey};
use strata_common::{NamedStore, StrataResult};

/// Names of the built-in pseudo-cells.
pub const NETCON_CELL: &str = "__NETCON";
/// Pseudo-cell backing top-level input ports.
pub const INPIN_CELL: &str = "__INPIN";
/// Pseudo-cell backing top-level output ports.
pub const OUTPIN_CELL: &str = "__OUTPIN";
/// Pseudo-cell backing top-level bidirectional ports.
pub const IOPIN_CELL: &str = "__IOPIN";

/// The standard-cell library.
///
/// A fresh or cleared library always contains the four pseudo-cells that
/// realize Verilog `assign` connectors (`__NETCON`) and top-level ports
/// (`__INPIN`, `__OUTPIN`, `__IOPIN`); all four have zero size and area.
#[derive(Debug)]
pub struct CellLib {
    /// The cell store.
    pub cells: NamedStore<CellKey, Cell>,
}

impl Default for CellLib {
    fn default() -> Self {
        let mut lib = Self {
            cells: NamedStore::new("cell"),
        };
        lib.create_pseudo_cells();
        lib
    }
}

impl CellLib {
    /// Creates a library containing only the pseudo-cells.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes everything and re-creates the pseudo-cells.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.create_pseudo_cells();
    }

    /// Creates a cell, or returns the existing key when the name is taken.
    pub fn create(&mut self, name: &str) -> StrataResult<CellKey> {
        if let Some(key) = self.cells.key_of(name) {
            return Ok(key);
        }
        self.cells.add(Cell::new(name))
    }

    /// Looks up a cell by name.
    pub fn lookup(&self, name: &str) -> Option<(CellKey, &Cell)> {
        self.cells.find_by_name(name)
    }

    fn create_pseudo_cells(&mut self) {
        {
            let key = self.create(NETCON_CELL).expect("empty store");
            let cell = self.cells.get_mut(key).expect("just created");
            let a = cell.pins.create("A");
            let y = cell.pins.create("Y");
            cell.pins.get_mut(a).expect("pin A").direction = IoDirection::Input;
            cell.pins.get_mut(y).expect("pin Y").direction = IoDirection::Output;
        }
        {
            let key = self.create(INPIN_CELL).expect("no duplicate");
            let cell = self.cells.get_mut(key).expect("just created");
            // inner connection: the port drives into the module
            let y = cell.pins.create("Y");
            cell.pins.get_mut(y).expect("pin Y").direction = IoDirection::Output;
        }
        {
            let key = self.create(OUTPIN_CELL).expect("no duplicate");
            let cell = self.cells.get_mut(key).expect("just created");
            let a = cell.pins.create("A");
            cell.pins.get_mut(a).expect("pin A").direction = IoDirection::Input;
        }
        {
            let key = self.create(IOPIN_CELL).expect("no duplicate");
            let cell = self.cells.get_mut(key).expect("just created");
            let io = cell.pins.create("IO");
            cell.pins.get_mut(io).expect("pin IO").direction = IoDirection::Io;
        }
    }
}

/// The module library.
#[derive(Debug)]
pub struct ModuleLib {
    /// The module store.
    pub modules: NamedStore<ModuleKey, Module>,
}

impl Default for ModuleLib {
    fn default() -> Self {
        Self {
            modules: NamedStore::new("module"),
        }
    }
}

impl ModuleLib {
    /// Creates an empty module library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all modules.
    pub fn clear(&mut self) {
        self.modules.clear();
    }

    /// Creates a module with an empty netlist.
    pub fn create(&mut self, name: &str) -> StrataResult<ModuleKey> {
        self.modules.add(Module::new(name))
    }

    /// Looks up a module by name.
    pub fn lookup(&self, name: &str) -> Option<(ModuleKey, &Module)> {
        self.modules.find_by_name(name)
    }
}
