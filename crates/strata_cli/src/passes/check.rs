//! Database integrity and connectivity check pass.

use super::{ParamDef, Params, Pass};
use petgraph::unionfind::UnionFind;
use std::collections::HashMap;
use strata_common::{StrataError, StrataResult};
use strata_db::{Design, InstanceKey};

/// `check` - verify netlist integrity and report connectivity.
pub struct CheckPass;

impl Pass for CheckPass {
    fn name(&self) -> &'static str {
        "check"
    }

    fn short_help(&self) -> &'static str {
        "verify netlist integrity and report connectivity"
    }

    fn help(&self) -> String {
        "check\n  Verifies that net connections and instance pin tables agree,\n\
         \x20 that no net references a missing instance, and reports the number\n\
         \x20 of connected components and floating instances.\n"
            .into()
    }

    fn param_defs(&self) -> &'static [ParamDef] {
        &[]
    }

    fn execute(&self, design: &mut Design, _params: &Params) -> StrataResult<()> {
        let netlist = design.top_netlist().ok_or_else(|| {
            StrataError::invalid_state("no top module with a netlist has been selected")
        })?;

        // dense indices for the union-find
        let mut index_of: HashMap<InstanceKey, usize> = HashMap::new();
        for (i, (key, _)) in netlist.instances.iter().enumerate() {
            index_of.insert(key, i);
        }

        let mut union_find: UnionFind<usize> = UnionFind::new(index_of.len().max(1));
        let mut errors = 0usize;

        for (net_key, net) in netlist.nets.iter() {
            let mut first: Option<usize> = None;
            for conn in net.connections() {
                let Some(instance) = netlist.instances.get(conn.instance) else {
                    log::error!(
                        "net '{}' references a missing instance (key {})",
                        net.name,
                        conn.instance.as_raw()
                    );
                    errors += 1;
                    continue;
                };
                // the two sides of the relation must agree
                if instance.pin_net(conn.pin) != Some(net_key) {
                    log::error!(
                        "net '{}' lists {}:{} but the instance does not record it",
                        net.name,
                        instance.name,
                        conn.pin.as_raw()
                    );
                    errors += 1;
                }
                let index = index_of[&conn.instance];
                match first {
                    Some(root) => {
                        union_find.union(root, index);
                    }
                    None => first = Some(index),
                }
            }
        }

        for (_, instance) in netlist.instances.iter() {
            for (pin, net) in instance.connections() {
                if let Some(net_key) = net {
                    match netlist.nets.get(net_key) {
                        Some(net_obj) => {
                            if !net_obj.has_connection(
                                netlist.instances.key_of(&instance.name).expect("iterating"),
                                pin,
                            ) {
                                log::error!(
                                    "instance '{}' pin {} records net '{}' but the net does not list it",
                                    instance.name,
                                    pin.as_raw(),
                                    net_obj.name
                                );
                                errors += 1;
                            }
                        }
                        None => {
                            log::error!(
                                "instance '{}' pin {} references a missing net (key {})",
                                instance.name,
                                pin.as_raw(),
                                net_key.as_raw()
                            );
                            errors += 1;
                        }
                    }
                }
            }
        }

        // connectivity report over instances that have at least one net
        let mut roots: HashMap<usize, usize> = HashMap::new();
        let mut floating = 0usize;
        for (key, instance) in netlist.instances.iter() {
            if instance.connections().any(|(_, net)| net.is_some()) {
                let root = union_find.find(index_of[&key]);
                *roots.entry(root).or_insert(0) += 1;
            } else {
                floating += 1;
                log::warn!("instance '{}' has no connected pins", instance.name);
            }
        }
        log::info!(
            "check: {} instances, {} nets, {} connected component(s), {} floating instance(s)",
            netlist.instances.len(),
            netlist.nets.len(),
            roots.len(),
            floating
        );

        if errors > 0 {
            return Err(StrataError::invalid_state(format!(
                "netlist check failed with {errors} error(s)"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrataConfig;
    use crate::passes::PassRegistry;
    use strata_db::{Archetype, Instance, InstanceType, PinKey};

    fn run_check(design: &mut Design) -> StrataResult<()> {
        let registry = PassRegistry::with_default_passes(&StrataConfig::default()).unwrap();
        registry.run(design, "check", &[])
    }

    #[test]
    fn clean_netlist_passes() {
        let mut design = Design::new();
        let cell = design.cell_lib.create("INV_X1").unwrap();
        {
            let cell = design.cell_lib.cells.get_mut(cell).unwrap();
            cell.pins.create("A");
            cell.pins.create("Y");
        }
        design.module_lib.create("top").unwrap();
        design.set_top_module("top");
        {
            let netlist = design.top_netlist_mut().unwrap();
            let u1 = netlist
                .instances
                .add(Instance::new("u1", InstanceType::Cell, Archetype::Cell(cell), 2))
                .unwrap();
            let u2 = netlist
                .instances
                .add(Instance::new("u2", InstanceType::Cell, Archetype::Cell(cell), 2))
                .unwrap();
            let n = netlist.create_net("n1").unwrap();
            netlist.connect(u1, PinKey::from_raw(1), n).unwrap();
            netlist.connect(u2, PinKey::from_raw(0), n).unwrap();
        }
        run_check(&mut design).unwrap();
    }

    #[test]
    fn no_top_module_fails() {
        let mut design = Design::new();
        assert!(run_check(&mut design).is_err());
    }
}
