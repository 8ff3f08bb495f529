//! Flat placement view of the top netlist.
//!
//! The placer and legalizer never walk the database directly; they work on
//! this snapshot, which resolves archetype sizes and power/ground pin flags
//! once, assigns dense indices in instance-key order (so every downstream
//! walk is deterministic), and keeps the instance keys around for the final
//! write-back.

use std::collections::HashMap;
use strata_db::{Archetype, Design, InstanceKey, Netlist};
use strata_common::{Coord64, Size64};

/// Dense index of a gate in the snapshot.
pub type GateId = usize;

/// Dense index of a net in the snapshot.
pub type NetId = usize;

/// One pin of a snapshot gate.
#[derive(Debug, Clone, Copy)]
pub struct GatePin {
    /// The connected net, if any.
    pub net: Option<NetId>,
    /// Set for power/ground pins, which the net model skips.
    pub is_pg: bool,
}

/// One instance in the snapshot.
#[derive(Debug, Clone)]
pub struct PlaceGate {
    /// The database instance behind this gate.
    pub key: InstanceKey,
    /// Instance name (for diagnostics).
    pub name: String,
    /// Archetype size, nm.
    pub size: Size64,
    /// True when the instance may not move.
    pub fixed: bool,
    /// Center position at snapshot time, nm.
    pub center: Coord64,
    /// Pins in pin order.
    pub pins: Vec<GatePin>,
}

/// One net in the snapshot.
#[derive(Debug, Clone, Default)]
pub struct PlaceNet {
    /// Net name (for diagnostics).
    pub name: String,
    /// Every connection of the net, as gate indices, in connection order.
    /// A gate appears once per connected pin.
    pub connections: Vec<GateId>,
}

impl PlaceNet {
    /// Number of connections (pins) on the net.
    pub fn degree(&self) -> usize {
        self.connections.len()
    }
}

/// The flat placement netlist.
#[derive(Debug, Default)]
pub struct PlacerNetlist {
    /// Gates in instance-key order.
    pub gates: Vec<PlaceGate>,
    /// Nets in net-key order.
    pub nets: Vec<PlaceNet>,
}

impl PlacerNetlist {
    /// Builds the snapshot from the design's top netlist.
    pub fn build(design: &Design, netlist: &Netlist) -> Self {
        let mut gate_index: HashMap<InstanceKey, GateId> = HashMap::new();
        let mut net_index = HashMap::new();

        let mut nets = Vec::with_capacity(netlist.nets.len());
        for (i, (net_key, net)) in netlist.nets.iter().enumerate() {
            net_index.insert(net_key, i);
            nets.push(PlaceNet {
                name: net.name.clone(),
                connections: Vec::new(),
            });
        }

        let mut gates = Vec::with_capacity(netlist.instances.len());
        for (gate_id, (ins_key, instance)) in netlist.instances.iter().enumerate() {
            gate_index.insert(ins_key, gate_id);

            let pins = instance
                .connections()
                .map(|(pin_key, net)| GatePin {
                    net: net.and_then(|n| net_index.get(&n).copied()),
                    is_pg: archetype_pin_is_pg(design, instance.archetype, pin_key),
                })
                .collect();

            gates.push(PlaceGate {
                key: ins_key,
                name: instance.name.clone(),
                size: design.archetype_size(instance),
                fixed: instance.is_fixed(),
                center: design.instance_center(instance),
                pins,
            });
        }

        for (i, (_, net)) in netlist.nets.iter().enumerate() {
            for conn in net.connections() {
                if let Some(&gate) = gate_index.get(&conn.instance) {
                    nets[i].connections.push(gate);
                }
            }
        }

        Self { gates, nets }
    }

    /// Indices of the movable (non-fixed) gates, in key order.
    pub fn movable_gates(&self) -> Vec<GateId> {
        self.gates
            .iter()
            .enumerate()
            .filter(|(_, g)| !g.fixed)
            .map(|(i, _)| i)
            .collect()
    }
}

fn archetype_pin_is_pg(design: &Design, archetype: Archetype, pin: strata_db::PinKey) -> bool {
    let pins = match archetype {
        Archetype::Cell(key) => design.cell_lib.cells.get(key).map(|c| &c.pins),
        Archetype::Module(key) => design.module_lib.modules.get(key).map(|m| &m.cell.pins),
    };
    pins.and_then(|p| p.get(pin))
        .map(|p| p.direction.is_pg())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_db::{
        Archetype, Instance, InstanceType, IoDirection, PinKey, PlacementStatus,
    };

    fn build_design() -> Design {
        let mut design = Design::new();
        let cell = design.cell_lib.create("AND2_X1").unwrap();
        {
            let cell = design.cell_lib.cells.get_mut(cell).unwrap();
            cell.size = Size64::new(400, 2000);
            for (name, dir) in [
                ("A", IoDirection::Input),
                ("B", IoDirection::Input),
                ("Y", IoDirection::Output),
                ("VDD", IoDirection::Power),
            ] {
                let key = cell.pins.create(name);
                cell.pins.get_mut(key).unwrap().direction = dir;
            }
        }
        design.module_lib.create("top").unwrap();
        design.set_top_module("top");

        let netlist = design.top_netlist_mut().unwrap();
        let cell_key = cell;
        let u1 = netlist
            .instances
            .add(Instance::new(
                "u1",
                InstanceType::Cell,
                Archetype::Cell(cell_key),
                4,
            ))
            .unwrap();
        let mut u2_ins = Instance::new("u2", InstanceType::Cell, Archetype::Cell(cell_key), 4);
        u2_ins.status = PlacementStatus::PlacedAndFixed;
        u2_ins.pos = Coord64::new(1000, 0);
        let u2 = netlist.instances.add(u2_ins).unwrap();

        let n = netlist.create_net("n1").unwrap();
        netlist.connect(u1, PinKey::from_raw(2), n).unwrap();
        netlist.connect(u2, PinKey::from_raw(0), n).unwrap();
        design
    }

    #[test]
    fn snapshot_resolves_sizes_and_flags() {
        let design = build_design();
        let snapshot = PlacerNetlist::build(&design, design.top_netlist().unwrap());

        assert_eq!(snapshot.gates.len(), 2);
        assert_eq!(snapshot.nets.len(), 1);

        let u1 = &snapshot.gates[0];
        assert_eq!(u1.size, Size64::new(400, 2000));
        assert!(!u1.fixed);
        assert!(!u1.pins[2].is_pg);
        assert!(u1.pins[3].is_pg);
        assert_eq!(u1.pins[2].net, Some(0));
        assert_eq!(u1.pins[0].net, None);

        let u2 = &snapshot.gates[1];
        assert!(u2.fixed);
        assert_eq!(u2.center, Coord64::new(1200, 1000));
    }

    #[test]
    fn net_connections_reference_gates() {
        let design = build_design();
        let snapshot = PlacerNetlist::build(&design, design.top_netlist().unwrap());
        assert_eq!(snapshot.nets[0].degree(), 2);
        assert_eq!(snapshot.nets[0].connections, vec![0, 1]);
    }

    #[test]
    fn movable_gates_excludes_fixed() {
        let design = build_design();
        let snapshot = PlacerNetlist::build(&design, design.top_netlist().unwrap());
        assert_eq!(snapshot.movable_gates(), vec![0]);
    }
}
