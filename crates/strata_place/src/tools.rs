//! Netlist measurement and reporting utilities.

use std::io::Write;
use strata_common::{Coord64, StrataResult};
use strata_db::{Design, Netlist};

/// Half-perimeter wire length over all nets, in nm.
///
/// Each net contributes the half-perimeter of the bounding box of its
/// connected instance centers; nets with fewer than two connections
/// contribute nothing.
pub fn calc_hpwl(design: &Design, netlist: &Netlist) -> f64 {
    let mut hpwl = 0.0f64;
    for (_, net) in netlist.nets.iter() {
        if net.num_connections() < 2 {
            continue;
        }
        let mut min = Coord64::new(i64::MAX, i64::MAX);
        let mut max = Coord64::new(i64::MIN, i64::MIN);
        let mut seen = false;
        for conn in net.connections() {
            let Some(instance) = netlist.instances.get(conn.instance) else {
                continue;
            };
            let center = design.instance_center(instance);
            min.x = min.x.min(center.x);
            min.y = min.y.min(center.y);
            max.x = max.x.max(center.x);
            max.y = max.y.max(center.y);
            seen = true;
        }
        if seen {
            hpwl += (max.x - min.x) as f64 + (max.y - min.y) as f64;
        }
    }
    hpwl
}

/// Total cell area of all instances, in square micrometers.
pub fn calc_total_cell_area(design: &Design, netlist: &Netlist) -> f64 {
    let mut um2 = 0.0f64;
    for (_, instance) in netlist.instances.iter() {
        let size = design.archetype_size(instance);
        um2 += (size.x as f64 / 1000.0) * (size.y as f64 / 1000.0);
    }
    um2
}

/// Writes one `x y w h` line per placed (or fixed) instance, in instance-key
/// order.
pub fn write_placement_file(
    out: &mut dyn Write,
    design: &Design,
    netlist: &Netlist,
) -> StrataResult<()> {
    for (_, instance) in netlist.instances.iter() {
        if instance.is_placed() {
            let size = design.archetype_size(instance);
            writeln!(
                out,
                "{} {} {} {}",
                instance.pos.x, instance.pos.y, size.x, size.y
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::Size64;
    use strata_db::{Archetype, Instance, InstanceType, PinKey, PlacementStatus};

    fn design_with_two_cells() -> Design {
        let mut design = Design::new();
        let cell = design.cell_lib.create("INV_X1").unwrap();
        {
            let cell = design.cell_lib.cells.get_mut(cell).unwrap();
            cell.size = Size64::new(200, 2000);
            cell.pins.create("A");
            cell.pins.create("Y");
        }
        design.module_lib.create("top").unwrap();
        design.set_top_module("top");

        let netlist = design.top_netlist_mut().unwrap();
        for (name, x) in [("u1", 0), ("u2", 1000)] {
            let mut ins = Instance::new(name, InstanceType::Cell, Archetype::Cell(cell), 2);
            ins.pos = Coord64::new(x, 0);
            ins.status = PlacementStatus::Placed;
            netlist.instances.add(ins).unwrap();
        }
        let u1 = design.top_netlist().unwrap().instances.key_of("u1").unwrap();
        let u2 = design.top_netlist().unwrap().instances.key_of("u2").unwrap();
        let netlist = design.top_netlist_mut().unwrap();
        let n = netlist.create_net("n1").unwrap();
        netlist.connect(u1, PinKey::from_raw(1), n).unwrap();
        netlist.connect(u2, PinKey::from_raw(0), n).unwrap();
        design
    }

    #[test]
    fn hpwl_of_two_cell_net() {
        let design = design_with_two_cells();
        let netlist = design.top_netlist().unwrap();
        // centers at (100,1000) and (1100,1000)
        assert_eq!(calc_hpwl(&design, netlist), 1000.0);
    }

    #[test]
    fn hpwl_skips_degenerate_nets() {
        let mut design = design_with_two_cells();
        {
            let netlist = design.top_netlist_mut().unwrap();
            let u1 = netlist.instances.key_of("u1").unwrap();
            let lonely = netlist.create_net("lonely").unwrap();
            netlist.connect(u1, PinKey::from_raw(0), lonely).unwrap();
        }
        let netlist = design.top_netlist().unwrap();
        assert_eq!(calc_hpwl(&design, netlist), 1000.0);
    }

    #[test]
    fn total_area_in_um2() {
        let design = design_with_two_cells();
        let netlist = design.top_netlist().unwrap();
        // two cells of 0.2 um x 2 um
        let area = calc_total_cell_area(&design, netlist);
        assert!((area - 0.8).abs() < 1e-9);
    }

    #[test]
    fn placement_file_lines() {
        let design = design_with_two_cells();
        let netlist = design.top_netlist().unwrap();
        let mut buffer = Vec::new();
        write_placement_file(&mut buffer, &design, netlist).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "0 0 200 2000\n1000 0 200 2000\n");
    }

    #[test]
    fn placement_file_skips_unplaced() {
        let mut design = design_with_two_cells();
        {
            let netlist = design.top_netlist_mut().unwrap();
            let (_, u1) = netlist.instances.find_by_name_mut("u1").unwrap();
            u1.status = PlacementStatus::Unplaced;
        }
        let netlist = design.top_netlist().unwrap();
        let mut buffer = Vec::new();
        write_placement_file(&mut buffer, &design, netlist).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
