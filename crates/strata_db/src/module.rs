//! Modules: cells that own a netlist.

use crate::{Cell, Instance, InstanceKey, Netlist};
use strata_common::{Named, StrataError, StrataResult};

/// A module is a cell with (optionally) a netlist of its own.
///
/// A module without a netlist is a black box: it can be instantiated but
/// nothing can be added to it. The module's pins double as its port list,
/// in declaration order.
#[derive(Debug)]
pub struct Module {
    /// The cell part: name, size, pins (= ports), class.
    pub cell: Cell,
    /// The module contents; `None` marks a black box.
    pub netlist: Option<Netlist>,
}

impl Module {
    /// Creates a black-box module.
    pub fn new_black_box(name: impl Into<String>) -> Self {
        Self {
            cell: Cell::new(name),
            netlist: None,
        }
    }

    /// Creates a module with an empty netlist.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            cell: Cell::new(name),
            netlist: Some(Netlist::new()),
        }
    }

    /// Returns `true` when the module has no netlist.
    pub fn is_black_box(&self) -> bool {
        self.netlist.is_none()
    }

    /// Adds an instance to the module's netlist.
    ///
    /// Fails on a black box, an empty instance name, or a duplicate name.
    pub fn add_instance(&mut self, instance: Instance) -> StrataResult<InstanceKey> {
        if instance.name.is_empty() {
            return Err(StrataError::invalid_state(
                "cannot add an instance with an empty name",
            ));
        }
        let name = self.cell.name.clone();
        match &mut self.netlist {
            Some(netlist) => netlist.instances.add(instance),
            None => Err(StrataError::invalid_state(format!(
                "module '{name}' is a black box"
            ))),
        }
    }
}

impl Named for Module {
    fn name(&self) -> &str {
        &self.cell.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Archetype, CellKey, InstanceType};

    fn some_instance(name: &str) -> Instance {
        Instance::new(
            name,
            InstanceType::Cell,
            Archetype::Cell(CellKey::from_raw(0)),
            0,
        )
    }

    #[test]
    fn add_instance_to_module() {
        let mut m = Module::new("top");
        let key = m.add_instance(some_instance("u1")).unwrap();
        assert!(m.netlist.as_ref().unwrap().instances.get(key).is_some());
    }

    #[test]
    fn black_box_rejects_instances() {
        let mut m = Module::new_black_box("rom");
        assert!(m.is_black_box());
        let err = m.add_instance(some_instance("u1")).unwrap_err();
        assert!(matches!(err, StrataError::InvalidState(_)));
    }

    #[test]
    fn empty_name_rejected() {
        let mut m = Module::new("top");
        let err = m.add_instance(some_instance("")).unwrap_err();
        assert!(matches!(err, StrataError::InvalidState(_)));
    }
}
