//! DEF reader and writer for the `COMPONENTS` placement block.
//!
//! The reader updates positions, orientations and placement status of
//! instances that already exist in the top netlist. The writer emits a
//! DEF 5.4 `COMPONENTS` block; its output is byte-deterministic for a given
//! database state, which the regression tests rely on.

use crate::lex::{Cursor, LexConfig, Token, tokenize};
use std::io::Write;
use strata_common::{Coord64, Orientation, ParseError, StrataError, StrataResult};
use strata_db::{Design, PlacementStatus};

fn orientation_to_def(orientation: Orientation) -> &'static str {
    match orientation {
        Orientation::R0 => "N",
        Orientation::R90 => "W",
        Orientation::R180 => "S",
        Orientation::R270 => "E",
        Orientation::MX => "FS",
        Orientation::MX90 => "FW",
        Orientation::MY => "FN",
        Orientation::MY90 => "FE",
    }
}

fn orientation_from_def(text: &str) -> Option<Orientation> {
    match text {
        "N" => Some(Orientation::R0),
        "W" => Some(Orientation::R90),
        "S" => Some(Orientation::R180),
        "E" => Some(Orientation::R270),
        "FS" => Some(Orientation::MX),
        "FW" => Some(Orientation::MX90),
        "FN" => Some(Orientation::MY),
        "FE" => Some(Orientation::MY90),
    _ => None,
    }
}

/// Controls which instances the DEF writer emits.
#[derive(Debug, Clone, Copy)]
pub struct DefWriterOptions {
    /// Export CORE SPACER (filler) instances.
    pub export_fillers: bool,
    /// Export CORE DECAP instances.
    pub export_decap: bool,
}

impl Default for DefWriterOptions {
    fn default() -> Self {
        Self {
            export_fillers: false,
            export_decap: false,
        }
    }
}

fn database_units(design: &Design) -> i64 {
    let dbu = design.tech_lib.database_microns;
    if dbu == 0 {
        log::warn!("DEF database units not set; does your imported LEF specify it?");
        log::warn!("  assuming the value is 100");
        100
    } else {
        dbu
    }
}

/// Writes the design's top netlist as a DEF `COMPONENTS` block.
pub fn write_def(
    out: &mut dyn Write,
    design: &Design,
    options: &DefWriterOptions,
) -> StrataResult<()> {
    let module_key = design
        .top_module()
        .ok_or_else(|| StrataError::invalid_state("no top module has been selected"))?;
    let module = design
        .module_lib
        .modules
        .get(module_key)
        .expect("top module key is valid");
    let netlist = module
        .netlist
        .as_ref()
        .ok_or_else(|| StrataError::invalid_state("top module has no netlist"))?;

    let dbu = database_units(design);
    let to_def = |pos: Coord64| Coord64::new(pos.x * dbu / 1000, pos.y * dbu / 1000);

    let mut body = String::new();
    let mut count = 0usize;
    let mut skipped_fillers = 0usize;
    let mut skipped_decap = 0usize;

    for (_, instance) in netlist.instances.iter() {
        let archetype = design.archetype_name(instance).unwrap_or("UNKNOWN");
        if let strata_db::Archetype::Cell(cell_key) = instance.archetype {
            if let Some(cell) = design.cell_lib.cells.get(cell_key) {
                if !options.export_fillers && cell.is_core_filler() {
                    skipped_fillers += 1;
                    continue;
                }
                if !options.export_decap && cell.is_core_decap() {
                    skipped_decap += 1;
                    continue;
                }
            }
        }

        body.push_str(&format!("  - {} {}\n", instance.name, archetype));
        if instance.is_placed() {
            let pos = to_def(instance.pos);
            let status = if instance.is_fixed() { "FIXED" } else { "PLACED" };
            body.push_str(&format!(
                "    + {status} ( {} {} ) {} ;\n",
                pos.x,
                pos.y,
                orientation_to_def(instance.orientation)
            ));
        } else {
            body.push_str("    + UNPLACED ;\n");
        }
        count += 1;
    }

    writeln!(out, "VERSION 5.4 ;")?;
    writeln!(out, "BUSBITCHARS \"[]\" ;")?;
    writeln!(out, "DIVIDERCHAR \"/\" ;")?;
    writeln!(out, "DESIGN {} ;", module.cell.name)?;
    writeln!(out, "UNITS DISTANCE MICRONS {dbu} ;")?;
    writeln!(out, "COMPONENTS {count} ;")?;
    out.write_all(body.as_bytes())?;
    writeln!(out, "END COMPONENTS")?;
    writeln!(out, "END DESIGN")?;

    log::trace!(
        "DEF writer: exported {count} components, skipped {skipped_fillers} fillers and {skipped_decap} decap cells"
    );
    Ok(())
}

/// Reads a DEF stream, applying the `COMPONENTS` block to the top netlist.
pub fn read_def(design: &mut Design, source: &str) -> StrataResult<()> {
    if design.top_netlist().is_none() {
        return Err(StrataError::invalid_state(
            "no top module with a netlist has been selected",
        ));
    }

    let tokens = tokenize(source, &LexConfig::lefdef())?;
    let mut cursor = Cursor::new(tokens);
    let mut dbu = design.tech_lib.database_microns;

    while !cursor.at_eof() {
        let token = cursor.next();
        match token.text.as_str() {
            "UNITS" => {
                cursor.expect_ident("DISTANCE").map_err(StrataError::Parse)?;
                cursor.expect_ident("MICRONS").map_err(StrataError::Parse)?;
                dbu = cursor.expect_number().map_err(StrataError::Parse)? as i64;
                cursor.expect_punct(';').map_err(StrataError::Parse)?;
            }
            "COMPONENTS" => {
                cursor.expect_number().map_err(StrataError::Parse)?;
                cursor.expect_punct(';').map_err(StrataError::Parse)?;
                read_components(design, &mut cursor, if dbu == 0 { 100 } else { dbu })?;
            }
            "END" => {
                let what = cursor.next();
                if what.text == "DESIGN" {
                    break;
                }
            }
            _ => skip_statement(&mut cursor)?,
        }
    }
    Ok(())
}

fn skip_statement(cursor: &mut Cursor) -> StrataResult<()> {
    while !cursor.at_eof() {
        let token = cursor.next();
        if token.text == ";" {
            return Ok(());
        }
    }
    Ok(())
}

fn read_components(design: &mut Design, cursor: &mut Cursor, dbu: i64) -> StrataResult<()> {
    loop {
        if cursor.at_eof() {
            return Err(StrataError::Parse(
                cursor.error("unterminated COMPONENTS block"),
            ));
        }
        if cursor.eat_ident("END") {
            cursor
                .expect_ident("COMPONENTS")
                .map_err(StrataError::Parse)?;
            return Ok(());
        }
        let dash = cursor.next();
        if dash.text != "-" {
            return Err(StrataError::Parse(err_at(
                &dash,
                format!("expected '-', found '{}'", dash.text),
            )));
        }

        let ins_name = cursor.expect_ident("instance name").map_err(StrataError::Parse)?;
        let cell_ref = cursor.expect_ident("cell reference").map_err(StrataError::Parse)?;

        let mut status: Option<PlacementStatus> = None;
        let mut pos = Coord64::default();
        let mut orientation = Orientation::R0;

        while cursor.eat_punct('+') {
            let keyword = cursor.expect_ident("component attribute").map_err(StrataError::Parse)?;
            match keyword.text.as_str() {
                "PLACED" | "FIXED" => {
                    cursor.expect_punct('(').map_err(StrataError::Parse)?;
                    let x = cursor.expect_number().map_err(StrataError::Parse)?;
                    let y = cursor.expect_number().map_err(StrataError::Parse)?;
                    cursor.expect_punct(')').map_err(StrataError::Parse)?;
                    let orient = cursor.expect_ident("orientation").map_err(StrataError::Parse)?;
                    orientation = orientation_from_def(&orient.text).ok_or_else(|| {
                        StrataError::Parse(err_at(
                            &orient,
                            format!("unknown orientation '{}'", orient.text),
                        ))
                    })?;
                    pos = Coord64::new(x as i64 * 1000 / dbu, y as i64 * 1000 / dbu);
                    status = Some(if keyword.text == "FIXED" {
                        PlacementStatus::PlacedAndFixed
                    } else {
                        PlacementStatus::Placed
                    });
                }
                "UNPLACED" => status = Some(PlacementStatus::Unplaced),
                _ => {
                    // skip other component options up to the next '+' or ';'
                    while !cursor.at_eof() {
                        let peeked = cursor.peek();
                        if peeked.text == "+" || peeked.text == ";" {
                            break;
                        }
                        cursor.next();
                    }
                }
            }
        }
        cursor.expect_punct(';').map_err(StrataError::Parse)?;

        let netlist = design.top_netlist_mut().expect("checked in read_def");
        let Some((_, instance)) = netlist.instances.find_by_name_mut(&ins_name.text) else {
            return Err(StrataError::Parse(err_at(
                &ins_name,
                format!("instance '{}' does not exist in the top netlist", ins_name.text),
            )));
        };
        log::trace!(
            "DEF: component {} ({}) -> {:?}",
            ins_name.text,
            cell_ref.text,
            status
        );
        if let Some(status) = status {
            instance.status = status;
            if status != PlacementStatus::Unplaced {
                instance.pos = pos;
                instance.orientation = orientation;
            }
        }
    }
}

fn err_at(token: &Token, msg: impl Into<String>) -> ParseError {
    ParseError::new(token.line, token.col, msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::Size64;
    use strata_db::{Archetype, Instance, InstanceType};

    fn design_with_instance() -> Design {
        let mut design = Design::new();
        let cell = design.cell_lib.create("INV_X1").unwrap();
        design.cell_lib.cells.get_mut(cell).unwrap().size = Size64::new(200, 2000);
        design.tech_lib.database_microns = 100;
        design.module_lib.create("top").unwrap();
        design.set_top_module("top");
        design
            .top_netlist_mut()
            .unwrap()
            .instances
            .add(Instance::new(
                "u1",
                InstanceType::Cell,
                Archetype::Cell(cell),
                0,
            ))
            .unwrap();
        design
    }

    #[test]
    fn writes_unplaced_component() {
        let design = design_with_instance();
        let mut out = Vec::new();
        write_def(&mut out, &design, &DefWriterOptions::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("VERSION 5.4 ;"));
        assert!(text.contains("DESIGN top ;"));
        assert!(text.contains("COMPONENTS 1 ;"));
        assert!(text.contains("- u1 INV_X1"));
        assert!(text.contains("+ UNPLACED ;"));
        assert!(text.ends_with("END COMPONENTS\nEND DESIGN\n"));
    }

    #[test]
    fn orientation_round_trip_through_def() {
        let mut design = design_with_instance();
        {
            let netlist = design.top_netlist_mut().unwrap();
            let (_, u1) = netlist.instances.find_by_name_mut("u1").unwrap();
            u1.pos = Coord64::new(500, 700);
            u1.orientation = Orientation::R90;
            u1.status = PlacementStatus::Placed;
        }

        let mut out = Vec::new();
        write_def(&mut out, &design, &DefWriterOptions::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("+ PLACED ( 50 70 ) W ;"));

        // wipe and read back
        {
            let netlist = design.top_netlist_mut().unwrap();
            let (_, u1) = netlist.instances.find_by_name_mut("u1").unwrap();
            u1.pos = Coord64::default();
            u1.orientation = Orientation::R0;
            u1.status = PlacementStatus::Unplaced;
        }
        read_def(&mut design, &text).unwrap();

        let netlist = design.top_netlist().unwrap();
        let (_, u1) = netlist.instances.find_by_name("u1").unwrap();
        assert_eq!(u1.pos, Coord64::new(500, 700));
        assert_eq!(u1.orientation, Orientation::R90);
        assert_eq!(u1.status, PlacementStatus::Placed);
    }

    #[test]
    fn fixed_round_trip() {
        let mut design = design_with_instance();
        {
            let netlist = design.top_netlist_mut().unwrap();
            let (_, u1) = netlist.instances.find_by_name_mut("u1").unwrap();
            u1.pos = Coord64::new(1000, 0);
            u1.status = PlacementStatus::PlacedAndFixed;
        }
        let mut out = Vec::new();
        write_def(&mut out, &design, &DefWriterOptions::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("+ FIXED ( 100 0 ) N ;"));

        read_def(&mut design, &text).unwrap();
        let netlist = design.top_netlist().unwrap();
        let (_, u1) = netlist.instances.find_by_name("u1").unwrap();
        assert!(u1.is_fixed());
    }

    #[test]
    fn unknown_instance_is_an_error() {
        let mut design = design_with_instance();
        let def = "COMPONENTS 1 ;\n  - ghost INV_X1\n    + PLACED ( 0 0 ) N ;\nEND COMPONENTS\nEND DESIGN\n";
        let err = read_def(&mut design, def).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn deterministic_output() {
        let design = design_with_instance();
        let mut a = Vec::new();
        let mut b = Vec::new();
        write_def(&mut a, &design, &DefWriterOptions::default()).unwrap();
        write_def(&mut b, &design, &DefWriterOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fillers_skipped_by_default() {
        let mut design = design_with_instance();
        let filler = design.cell_lib.create("FILL1").unwrap();
        {
            let cell = design.cell_lib.cells.get_mut(filler).unwrap();
            cell.subclass = strata_db::CellSubclass::Spacer;
        }
        design
            .top_netlist_mut()
            .unwrap()
            .instances
            .add(Instance::new(
                "fill_0",
                InstanceType::Cell,
                Archetype::Cell(filler),
                0,
            ))
            .unwrap();

        let mut out = Vec::new();
        write_def(&mut out, &design, &DefWriterOptions::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("fill_0"));
        assert!(text.contains("COMPONENTS 1 ;"));

        let mut out = Vec::new();
        let options = DefWriterOptions {
            export_fillers: true,
            ..Default::default()
        };
        write_def(&mut out, &design, &options).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("fill_0"));
    }
}
