//! Import/export flow: LEF + Liberty + Verilog in, DEF out and back.

use strata_common::{Coord64, Orientation};
use strata_db::{Design, InstanceType, PlacementStatus};
use strata_io::def::{read_def, write_def, DefWriterOptions};
use strata_io::lef::read_lef;
use strata_io::liberty::read_liberty;
use strata_io::verilog::read_verilog;

const LEF: &str = r#"
UNITS
  DATABASE MICRONS 100 ;
END UNITS
SITE core
  CLASS CORE ;
  SIZE 0.2 BY 2.0 ;
END core
MACRO INV_X1
  CLASS CORE ;
  SIZE 0.2 BY 2.0 ;
  SITE core ;
  PIN A
    DIRECTION INPUT ;
  END A
  PIN Y
    DIRECTION OUTPUT ;
  END Y
END INV_X1
END LIBRARY
"#;

const LIB: &str = r#"
library (demo) {
  capacitive_load_unit (1, pf);
  cell (INV_X1) {
    area : 0.4;
    pin (A) {
      direction : input;
      capacitance : 0.002;
    }
    pin (Y) {
      direction : output;
      function : "!A";
    }
  }
}
"#;

const NETLIST: &str = r#"
module top (a, y);
  input a;
  output y;
  wire n1;

  INV_X1 u1 ( .A(a), .Y(n1) );
  INV_X1 u2 ( .A(n1), .Y(y) );
endmodule
"#;

fn import_all() -> Design {
    let mut design = Design::new();
    read_lef(&mut design, LEF).unwrap();
    read_liberty(&mut design, LIB).unwrap();
    read_verilog(&mut design, NETLIST).unwrap();
    assert!(design.set_top_module("top"));
    design
}

#[test]
fn lef_liberty_verilog_combine() {
    let design = import_all();

    let (_, inv) = design.cell_lib.lookup("INV_X1").unwrap();
    assert_eq!(inv.size, Coord64::new(200, 2000));
    assert!((inv.area_um2 - 0.4).abs() < 1e-12);
    let (_, a) = inv.pins.find("A").unwrap();
    assert!((a.cap_input - 0.002).abs() < 1e-12);

    let netlist = design.top_netlist().unwrap();
    // two gates plus the two port instances
    assert_eq!(netlist.instances.len(), 4);
    assert_eq!(netlist.nets.len(), 3);
}

#[test]
fn def_round_trip_restores_placement() {
    let mut design = import_all();
    {
        let netlist = design.top_netlist_mut().unwrap();
        let (_, u1) = netlist.instances.find_by_name_mut("u1").unwrap();
        u1.pos = Coord64::new(500, 700);
        u1.orientation = Orientation::R90;
        u1.status = PlacementStatus::Placed;
        let (_, u2) = netlist.instances.find_by_name_mut("u2").unwrap();
        u2.pos = Coord64::new(1200, 0);
        u2.orientation = Orientation::MX;
        u2.status = PlacementStatus::PlacedAndFixed;
    }

    let mut out = Vec::new();
    write_def(&mut out, &design, &DefWriterOptions::default()).unwrap();
    let text = String::from_utf8(out).unwrap();

    // scrub the placement, then read it back
    {
        let netlist = design.top_netlist_mut().unwrap();
        for name in ["u1", "u2"] {
            let (_, ins) = netlist.instances.find_by_name_mut(name).unwrap();
            ins.pos = Coord64::default();
            ins.orientation = Orientation::R0;
            ins.status = PlacementStatus::Unplaced;
        }
    }
    read_def(&mut design, &text).unwrap();

    let netlist = design.top_netlist().unwrap();
    let (_, u1) = netlist.instances.find_by_name("u1").unwrap();
    assert_eq!(u1.pos, Coord64::new(500, 700));
    assert_eq!(u1.orientation, Orientation::R90);
    assert_eq!(u1.status, PlacementStatus::Placed);

    let (_, u2) = netlist.instances.find_by_name("u2").unwrap();
    assert_eq!(u2.pos, Coord64::new(1200, 0));
    assert_eq!(u2.orientation, Orientation::MX);
    assert!(u2.is_fixed());
}

#[test]
fn port_instances_survive_def_round_trip() {
    let mut design = import_all();
    let mut out = Vec::new();
    write_def(&mut out, &design, &DefWriterOptions::default()).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("- a __INPIN"));
    assert!(text.contains("- y __OUTPIN"));

    read_def(&mut design, &text).unwrap();
    let netlist = design.top_netlist().unwrap();
    let (_, a) = netlist.instances.find_by_name("a").unwrap();
    assert_eq!(a.itype, InstanceType::Pin);
    assert_eq!(a.status, PlacementStatus::Unplaced);
}
