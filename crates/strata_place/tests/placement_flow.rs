//! End-to-end placement scenarios against the public API.

use strata_common::{Coord64, Size64};
use strata_db::{
    Archetype, CellKey, Design, Instance, InstanceKey, InstanceType, IoDirection, PinKey,
    PlacementStatus,
};
use strata_io::def::{write_def, DefWriterOptions};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_place::{
    calc_row_cost, place_row, tools, LegalCell, LegalRow, Legalizer, NetModel, Placer,
    PlacerOptions,
};

/// Creates an INV-like cell with an input pin A and an output pin Y.
fn create_inverter(design: &mut Design, name: &str, size: Size64) -> CellKey {
    let key = design.cell_lib.create(name).unwrap();
    let cell = design.cell_lib.cells.get_mut(key).unwrap();
    cell.size = size;
    let a = cell.pins.create("A");
    cell.pins.get_mut(a).unwrap().direction = IoDirection::Input;
    let y = cell.pins.create("Y");
    cell.pins.get_mut(y).unwrap().direction = IoDirection::Output;
    key
}

fn add_instance(design: &mut Design, name: &str, cell: CellKey) -> InstanceKey {
    design
        .top_netlist_mut()
        .unwrap()
        .instances
        .add(Instance::new(
            name,
            InstanceType::Cell,
            Archetype::Cell(cell),
            2,
        ))
        .unwrap()
}

fn pin_a() -> PinKey {
    PinKey::from_raw(0)
}

fn pin_y() -> PinKey {
    PinKey::from_raw(1)
}

/// Scenario: two gates, one net, a single row.
fn build_two_gate_design() -> Design {
    let mut design = Design::new();
    let inv = create_inverter(&mut design, "INV_X1", Size64::new(200, 2000));
    design.module_lib.create("top").unwrap();
    design.set_top_module("top");

    let u1 = add_instance(&mut design, "u1", inv);
    let u2 = add_instance(&mut design, "u2", inv);
    let netlist = design.top_netlist_mut().unwrap();
    let n1 = netlist.create_net("n1").unwrap();
    netlist.connect(u1, pin_y(), n1).unwrap();
    netlist.connect(u2, pin_a(), n1).unwrap();

    design.floorplan.core_size = Size64::new(10000, 2000);
    design.floorplan.min_cell_size = Size64::new(200, 2000);
    design.floorplan.create_rows().unwrap();
    design.tech_lib.database_microns = 100;
    design
}

#[test]
fn two_gate_placement() {
    let mut design = build_two_gate_design();
    Placer::new(PlacerOptions::default()).place(&mut design).unwrap();

    let netlist = design.top_netlist().unwrap();
    let (_, u1) = netlist.instances.find_by_name("u1").unwrap();
    let (_, u2) = netlist.instances.find_by_name("u2").unwrap();

    // both in row 0, at adjacent sites
    assert_eq!(u1.pos.y, 0);
    assert_eq!(u2.pos.y, 0);
    let mut xs = vec![u1.pos.x, u2.pos.x];
    xs.sort();
    assert_eq!(xs, vec![0, 200]);
    assert_eq!(u1.status, PlacementStatus::Placed);

    assert_eq!(tools::calc_hpwl(&design, netlist), 200.0);
}

#[test]
fn two_gate_def_output() {
    let mut design = build_two_gate_design();
    Placer::new(PlacerOptions::default()).place(&mut design).unwrap();

    let mut out = Vec::new();
    write_def(&mut out, &design, &DefWriterOptions::default()).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("- u1 INV_X1"));
    assert!(text.contains("- u2 INV_X1"));
    assert_eq!(text.matches("+ PLACED (").count(), 2);
    assert_eq!(text.matches(") N ;").count(), 2);
}

/// Two full runs on identical input must produce bit-identical DEF output.
#[test]
fn placement_is_deterministic() {
    let mut first = Vec::new();
    let mut second = Vec::new();
    for out in [&mut first, &mut second] {
        let mut design = build_two_gate_design();
        Placer::new(PlacerOptions::default()).place(&mut design).unwrap();
        write_def(out, &design, &DefWriterOptions::default()).unwrap();
    }
    assert_eq!(first, second);
}

/// Scenario: a cell larger than the core area must be rejected.
#[test]
fn over_utilization_is_rejected() {
    let mut design = Design::new();
    // 2 um^2 cell in a 1 um^2 core
    let big = create_inverter(&mut design, "BIG", Size64::new(2000, 1000));
    design.module_lib.create("top").unwrap();
    design.set_top_module("top");
    add_instance(&mut design, "u1", big);

    design.floorplan.core_size = Size64::new(1000, 1000);
    design.floorplan.min_cell_size = Size64::new(100, 1000);
    design.floorplan.create_rows().unwrap();

    let err = Placer::new(PlacerOptions::default())
        .place(&mut design)
        .unwrap_err();
    assert!(err.to_string().contains("region area smaller than cell area"));

    // the database keeps its pre-pass state
    let (_, u1) = design
        .top_netlist()
        .unwrap()
        .instances
        .find_by_name("u1")
        .unwrap();
    assert_eq!(u1.status, PlacementStatus::Unplaced);
}

/// Scenario: legalizer cluster merge on one row.
#[test]
fn cluster_merge_on_single_row() {
    let mut cells: Vec<LegalCell> = [0i64, 100, 200]
        .iter()
        .map(|&x| LegalCell {
            instance: InstanceKey::from_raw(0),
            name: String::new(),
            global_pos: Coord64::new(x, 0),
            size: Size64::new(400, 1000),
            weight: 1.0,
            legal_pos: Coord64::default(),
            orientation: strata_common::Orientation::R0,
        })
        .collect();

    let mut row = LegalRow::new(
        strata_common::Rect64::new(Coord64::new(0, 0), Coord64::new(1000, 1000)),
        strata_db::RowType::Normal,
    );
    row.cells = vec![0, 1, 2];

    place_row(&mut cells, &row, 100);
    assert_eq!(cells[0].legal_pos.x, 0);
    assert_eq!(cells[1].legal_pos.x, 400);
    assert_eq!(cells[2].legal_pos.x, 800);
    // 1200 nm of cells in a 1000 nm row: infeasible for the cost scan
    assert_eq!(calc_row_cost(&cells, &row), None);
}

/// Scenario: HPWL of a two-terminal net does not grow through placement.
#[test]
fn hpwl_does_not_grow_for_two_terminal_net() {
    let mut design = Design::new();
    let inv = create_inverter(&mut design, "INV_X1", Size64::new(200, 2000));
    design.module_lib.create("top").unwrap();
    design.set_top_module("top");

    // fixed anchor pad at the right edge of the core
    let (pad_cell, pseudo) = design.cell_lib.lookup("__INPIN").unwrap();
    let pad_pins = pseudo.pins.len();
    let mut pad = Instance::new(
        "in0",
        InstanceType::Pin,
        Archetype::Cell(pad_cell),
        pad_pins,
    );
    pad.pos = Coord64::new(9000, 1000);
    pad.status = PlacementStatus::PlacedAndFixed;
    let pad_key = design
        .top_netlist_mut()
        .unwrap()
        .instances
        .add(pad)
        .unwrap();

    let u1 = add_instance(&mut design, "u1", inv);
    let netlist = design.top_netlist_mut().unwrap();
    let n = netlist.create_net("n").unwrap();
    netlist.connect(pad_key, PinKey::from_raw(0), n).unwrap();
    netlist.connect(u1, pin_a(), n).unwrap();

    design.floorplan.core_size = Size64::new(10000, 2000);
    design.floorplan.min_cell_size = Size64::new(200, 2000);
    design.floorplan.create_rows().unwrap();

    let before = tools::calc_hpwl(&design, design.top_netlist().unwrap());
    Placer::new(PlacerOptions::default()).place(&mut design).unwrap();
    let after = tools::calc_hpwl(&design, design.top_netlist().unwrap());

    assert!(after <= before, "HPWL grew from {before} to {after}");
}

/// Builds a wider design: a chain of gates between two fixed pads.
fn build_chain_design(gates: usize, net_model: NetModel) -> (Design, PlacerOptions) {
    let mut design = Design::new();
    let inv = create_inverter(&mut design, "INV_X1", Size64::new(400, 2000));
    design.module_lib.create("top").unwrap();
    design.set_top_module("top");

    let (pad_cell, pseudo) = design.cell_lib.lookup("__INPIN").unwrap();
    let pad_pins = pseudo.pins.len();
    for (name, x) in [("in0", 0i64), ("in1", 19800)] {
        let mut pad = Instance::new(name, InstanceType::Pin, Archetype::Cell(pad_cell), pad_pins);
        pad.pos = Coord64::new(x, 4000);
        pad.status = PlacementStatus::PlacedAndFixed;
        design.top_netlist_mut().unwrap().instances.add(pad).unwrap();
    }

    let mut previous: Option<InstanceKey> = None;
    for i in 0..gates {
        let gate = add_instance(&mut design, &format!("u{i}"), inv);
        let netlist = design.top_netlist_mut().unwrap();
        let net = netlist.create_net(&format!("n{i}")).unwrap();
        match previous {
            Some(prev) => netlist.connect(prev, pin_y(), net).unwrap(),
            None => {
                let pad = netlist.instances.key_of("in0").unwrap();
                netlist.connect(pad, PinKey::from_raw(0), net).unwrap();
            }
        }
        netlist.connect(gate, pin_a(), net).unwrap();
        previous = Some(gate);
    }
    // tie the chain end to the other pad
    let netlist = design.top_netlist_mut().unwrap();
    let last_net = netlist.create_net("nend").unwrap();
    let pad = netlist.instances.key_of("in1").unwrap();
    netlist.connect(previous.unwrap(), pin_y(), last_net).unwrap();
    netlist.connect(pad, PinKey::from_raw(0), last_net).unwrap();

    design.floorplan.core_size = Size64::new(20000, 8000);
    design.floorplan.min_cell_size = Size64::new(200, 2000);
    design.floorplan.create_rows().unwrap();

    let options = PlacerOptions {
        max_levels: 3,
        min_region_instances: 2,
        net_model,
        ..Default::default()
    };
    (design, options)
}

fn assert_legal_placement(design: &Design) {
    let netlist = design.top_netlist().unwrap();
    let rows = &design.floorplan.rows;

    let mut rects = Vec::new();
    for (_, instance) in netlist.instances.iter() {
        if instance.itype != InstanceType::Cell {
            continue;
        }
        assert!(instance.is_placed(), "{} unplaced", instance.name);

        // row alignment: y on a row bottom, x on the site grid
        let row = rows
            .iter()
            .find(|r| r.rect.bottom() == instance.pos.y)
            .unwrap_or_else(|| panic!("{} not on a row: y={}", instance.name, instance.pos.y));
        assert_eq!(
            (instance.pos.x - row.rect.left()) % design.floorplan.min_cell_size.x,
            0,
            "{} off the site grid",
            instance.name
        );

        let rect = design.instance_rect(instance);
        let core = design.floorplan.core_rect();
        assert!(rect.ll.x >= core.ll.x && rect.ur.x <= core.ur.x);
        assert!(rect.ll.y >= core.ll.y && rect.ur.y <= core.ur.y);
        rects.push((instance.name.clone(), rect));
    }

    // pairwise disjoint
    for (i, (name_a, a)) in rects.iter().enumerate() {
        for (name_b, b) in rects.iter().skip(i + 1) {
            assert!(
                a.intersect(*b).is_none(),
                "{name_a} and {name_b} overlap: {a} vs {b}"
            );
        }
    }
}

#[test]
fn chain_placement_is_legal() {
    let (mut design, options) = build_chain_design(12, NetModel::Clique);
    Placer::new(options).place(&mut design).unwrap();
    assert_legal_placement(&design);
}

#[test]
fn chain_placement_legal_with_b2b_model() {
    let (mut design, options) = build_chain_design(12, NetModel::BoundToBound);
    Placer::new(options).place(&mut design).unwrap();
    assert_legal_placement(&design);
}

#[test]
fn fixed_instances_are_preserved() {
    let (mut design, options) = build_chain_design(8, NetModel::Clique);
    Placer::new(options).place(&mut design).unwrap();

    let netlist = design.top_netlist().unwrap();
    let (_, in0) = netlist.instances.find_by_name("in0").unwrap();
    assert_eq!(in0.pos, Coord64::new(0, 4000));
    assert!(in0.is_fixed());
    let (_, in1) = netlist.instances.find_by_name("in1").unwrap();
    assert_eq!(in1.pos, Coord64::new(19800, 4000));
}

/// A cell wider than every row cannot be legalized; the failure is
/// reported by name and the database rolls back to its pre-pass state.
#[test]
fn unlegalizable_cell_is_reported_and_rolled_back() {
    let mut design = Design::new();
    // fits the core by area but is wider than any row
    let wide = create_inverter(&mut design, "WIDE", Size64::new(3000, 1000));
    design.module_lib.create("top").unwrap();
    design.set_top_module("top");
    add_instance(&mut design, "u1", wide);

    design.floorplan.core_size = Size64::new(2000, 2000);
    design.floorplan.min_cell_size = Size64::new(100, 1000);
    design.floorplan.create_rows().unwrap();

    let err = Placer::new(PlacerOptions::default())
        .place(&mut design)
        .unwrap_err();
    assert!(err.to_string().contains("legalization failed"));
    assert!(err.to_string().contains("u1"));

    let (_, u1) = design
        .top_netlist()
        .unwrap()
        .instances
        .find_by_name("u1")
        .unwrap();
    assert_eq!(u1.status, PlacementStatus::Unplaced);
    assert_eq!(u1.pos, Coord64::default());
}

/// Seeded scatter: the legalizer must resolve arbitrary overlap piles into
/// a legal placement.
#[test]
fn legalizer_resolves_scattered_cells() {
    let mut design = Design::new();
    let inv = create_inverter(&mut design, "INV_X1", Size64::new(400, 2000));
    design.module_lib.create("top").unwrap();
    design.set_top_module("top");

    let mut rng = StdRng::seed_from_u64(42);
    for i in 0..40 {
        let key = add_instance(&mut design, &format!("u{i}"), inv);
        let netlist = design.top_netlist_mut().unwrap();
        let instance = netlist.instances.get_mut(key).unwrap();
        instance.pos = Coord64::new(rng.gen_range(0..16000), rng.gen_range(0..8000));
        instance.status = PlacementStatus::Placed;
    }

    design.floorplan.core_size = Size64::new(20000, 8000);
    design.floorplan.min_cell_size = Size64::new(200, 2000);
    design.floorplan.create_rows().unwrap();

    Legalizer::default().legalize(&mut design).unwrap();
    assert_legal_placement(&design);
}

#[test]
fn net_models_agree_on_two_pin_nets_feasibility() {
    // for 2-pin nets the clique and bound-to-bound formulations coincide,
    // so both must produce a legal, fully placed result
    let (mut clique_design, options) = build_chain_design(6, NetModel::Clique);
    Placer::new(options).place(&mut clique_design).unwrap();

    let (mut b2b_design, options) = build_chain_design(6, NetModel::BoundToBound);
    Placer::new(options).place(&mut b2b_design).unwrap();

    let clique_hpwl =
        tools::calc_hpwl(&clique_design, clique_design.top_netlist().unwrap());
    let b2b_hpwl = tools::calc_hpwl(&b2b_design, b2b_design.top_netlist().unwrap());
    assert!(clique_hpwl > 0.0);
    assert!(b2b_hpwl > 0.0);
}
