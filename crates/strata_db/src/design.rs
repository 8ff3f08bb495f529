//! The design aggregate: all libraries, the floorplan and the top module.

use crate::{Archetype, CellLib, Floorplan, Instance, ModuleKey, ModuleLib, Netlist, TechLib};
use strata_common::{Coord64, Rect64, Size64};

/// Everything a pass operates on.
///
/// The design owns the libraries; passes receive `&mut Design` and use the
/// key-based accessors to navigate between entities.
#[derive(Debug, Default)]
pub struct Design {
    /// Standard cells, including the pseudo-cells.
    pub cell_lib: CellLib,
    /// Modules read from the netlist source.
    pub module_lib: ModuleLib,
    /// Technology data.
    pub tech_lib: TechLib,
    /// Die/core floorplan.
    pub floorplan: Floorplan,
    top_module: Option<ModuleKey>,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets everything; the cell library keeps its pseudo-cells.
    pub fn clear(&mut self) {
        self.cell_lib.clear();
        self.module_lib.clear();
        self.tech_lib.clear();
        self.floorplan.clear();
        self.top_module = None;
    }

    /// Selects the module subsequent passes operate on.
    ///
    /// Returns `false` when no module of that name exists.
    pub fn set_top_module(&mut self, name: &str) -> bool {
        match self.module_lib.modules.key_of(name) {
            Some(key) => {
                self.top_module = Some(key);
                true
            }
            None => false,
        }
    }

    /// The currently selected top module, if any.
    pub fn top_module(&self) -> Option<ModuleKey> {
        self.top_module
    }

    /// The top module's netlist.
    pub fn top_netlist(&self) -> Option<&Netlist> {
        let key = self.top_module?;
        self.module_lib.modules.get(key)?.netlist.as_ref()
    }

    /// The top module's netlist, mutably.
    pub fn top_netlist_mut(&mut self) -> Option<&mut Netlist> {
        let key = self.top_module?;
        self.module_lib.modules.get_mut(key)?.netlist.as_mut()
    }

    /// The size of an instance's archetype, nm.
    ///
    /// Unresolvable archetypes (dangling keys) count as zero-size, like the
    /// pseudo-cells.
    pub fn archetype_size(&self, instance: &Instance) -> Size64 {
        match instance.archetype {
            Archetype::Cell(key) => self
                .cell_lib
                .cells
                .get(key)
                .map(|c| c.size)
                .unwrap_or_default(),
            Archetype::Module(key) => self
                .module_lib
                .modules
                .get(key)
                .map(|m| m.cell.size)
                .unwrap_or_default(),
        }
    }

    /// The name of an instance's archetype.
    pub fn archetype_name(&self, instance: &Instance) -> Option<&str> {
        match instance.archetype {
            Archetype::Cell(key) => self.cell_lib.cells.get(key).map(|c| c.name.as_str()),
            Archetype::Module(key) => self
                .module_lib
                .modules
                .get(key)
                .map(|m| m.cell.name.as_str()),
        }
    }

    /// The center position of an instance.
    pub fn instance_center(&self, instance: &Instance) -> Coord64 {
        let size = self.archetype_size(instance);
        Coord64::new(instance.pos.x + size.x / 2, instance.pos.y + size.y / 2)
    }

    /// The bounding rectangle of an instance.
    pub fn instance_rect(&self, instance: &Instance) -> Rect64 {
        let size = self.archetype_size(instance);
        Rect64::new(instance.pos, instance.pos + size)
    }
}
