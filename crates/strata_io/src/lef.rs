//! LEF reader: technology layers, sites and cell abstracts.
//!
//! Distances in LEF are micrometers; everything is converted to integer
//! nanometers on the way into the database. Unknown statements are skipped
//! to their terminating `;` (or `END` for blocks) with a debug log, so
//! vendor extensions do not break the import.

use crate::lex::{Cursor, LexConfig, Token, TokenKind, tokenize};
use strata_common::{Coord64, ParseError, Rect64};
use strata_db::{
    CellClass, CellSubclass, Design, IoDirection, LayerDirection, LayerShapes, LayerType,
    SiteClass, Symmetry,
};

/// Converts a LEF micrometer value to integer nanometers.
fn to_nm(um: f64) -> i64 {
    (um * 1000.0).round() as i64
}

/// Reads a LEF stream into the design's technology and cell libraries.
pub fn read_lef(design: &mut Design, source: &str) -> Result<(), ParseError> {
    let tokens = tokenize(source, &LexConfig::lefdef())?;
    let mut cursor = Cursor::new(tokens);

    while !cursor.at_eof() {
        let token = cursor.next();
        match token.text.as_str() {
            "UNITS" => parse_units(design, &mut cursor)?,
            "MANUFACTURINGGRID" => {
                let grid = cursor.expect_number()?;
                cursor.expect_punct(';')?;
                design.tech_lib.manufacturing_grid = to_nm(grid);
            }
            "LAYER" => parse_layer(design, &mut cursor)?,
            "SITE" => parse_site(design, &mut cursor)?,
            "MACRO" => parse_macro(design, &mut cursor)?,
            "END" => {
                // END LIBRARY terminates the file
                if cursor.eat_ident("LIBRARY") {
                    break;
                }
                return Err(cursor.error("unexpected END"));
            }
            _ => {
                log::debug!("LEF: skipping '{}'", token.text);
                skip_statement(&mut cursor)?;
            }
        }
    }
    Ok(())
}

/// Skips to the next `;`.
fn skip_statement(cursor: &mut Cursor) -> Result<(), ParseError> {
    while !cursor.at_eof() {
        let token = cursor.next();
        if token.kind == TokenKind::Punct && token.text == ";" {
            return Ok(());
        }
    }
    Err(cursor.error("unexpected end of file inside statement"))
}

fn parse_units(design: &mut Design, cursor: &mut Cursor) -> Result<(), ParseError> {
    // LEF distances stay micrometers regardless of the declared precision;
    // the DATABASE MICRONS value is kept for the DEF reader and writer
    while !cursor.at_eof() {
        if cursor.eat_ident("END") {
            cursor.expect_ident("UNITS")?;
            return Ok(());
        }
        let token = cursor.next();
        if token.text == "DATABASE" {
            cursor.expect_ident("MICRONS")?;
            let dbu = cursor.expect_number()?;
            cursor.expect_punct(';')?;
            design.tech_lib.database_microns = dbu as i64;
        } else {
            skip_statement(cursor)?;
        }
    }
    Err(cursor.error("unterminated UNITS block"))
}

fn parse_layer(design: &mut Design, cursor: &mut Cursor) -> Result<(), ParseError> {
    let name = cursor.expect_ident("layer name")?;
    let key = design
        .tech_lib
        .create_layer(&name.text)
        .map_err(|e| error_at(&name, e.to_string()))?;

    let mut offset_seen = false;
    loop {
        if cursor.eat_ident("END") {
            cursor.expect_ident("layer name")?;
            break;
        }
        if cursor.at_eof() {
            return Err(cursor.error("unterminated LAYER block"));
        }
        let token = cursor.next();
        let layer = design
            .tech_lib
            .layers
            .get_mut(key)
            .expect("layer created above");
        match token.text.as_str() {
            "TYPE" => {
                let kind = cursor.expect_ident("layer type")?;
                layer.layer_type = match kind.text.as_str() {
                    "ROUTING" => LayerType::Routing,
                    "CUT" => LayerType::Cut,
                    "MASTERSLICE" => LayerType::Masterslice,
                    "OVERLAP" => LayerType::Overlap,
                    _ => LayerType::Undefined,
                };
                cursor.expect_punct(';')?;
            }
            "DIRECTION" => {
                let dir = cursor.expect_ident("layer direction")?;
                layer.direction = match dir.text.as_str() {
                    "HORIZONTAL" => LayerDirection::Horizontal,
                    "VERTICAL" => LayerDirection::Vertical,
                    _ => LayerDirection::Undefined,
                };
                cursor.expect_punct(';')?;
            }
            "PITCH" => {
                let x = cursor.expect_number()?;
                if cursor.eat_punct(';') {
                    layer.pitch = Coord64::new(to_nm(x), to_nm(x));
                } else {
                    let y = cursor.expect_number()?;
                    cursor.expect_punct(';')?;
                    layer.pitch = Coord64::new(to_nm(x), to_nm(y));
                }
            }
            "OFFSET" => {
                let x = cursor.expect_number()?;
                if cursor.eat_punct(';') {
                    layer.offset = Coord64::new(to_nm(x), to_nm(x));
                } else {
                    let y = cursor.expect_number()?;
                    cursor.expect_punct(';')?;
                    layer.offset = Coord64::new(to_nm(x), to_nm(y));
                }
                offset_seen = true;
            }
            "WIDTH" => {
                layer.width = to_nm(cursor.expect_number()?);
                cursor.expect_punct(';')?;
            }
            "SPACING" => {
                layer.spacing = to_nm(cursor.expect_number()?);
                cursor.expect_punct(';')?;
            }
            "RESISTANCE" => {
                // RESISTANCE RPERSQ value ;
                cursor.eat_ident("RPERSQ");
                layer.resistance = cursor.expect_number()?;
                cursor.expect_punct(';')?;
            }
            "CAPACITANCE" => {
                cursor.eat_ident("CPERSQDIST");
                layer.capacitance = cursor.expect_number()?;
                cursor.expect_punct(';')?;
            }
            "EDGECAPACITANCE" => {
                layer.edge_capacitance = cursor.expect_number()?;
                cursor.expect_punct(';')?;
            }
            "THICKNESS" => {
                layer.thickness = to_nm(cursor.expect_number()?);
                cursor.expect_punct(';')?;
            }
            "AREA" => {
                layer.min_area = cursor.expect_number()?;
                cursor.expect_punct(';')?;
            }
            _ => {
                log::debug!("LEF: skipping layer attribute '{}'", token.text);
                skip_statement(cursor)?;
            }
        }
    }

    // a missing offset defaults to half the pitch
    if !offset_seen {
        let layer = design
            .tech_lib
            .layers
            .get_mut(key)
            .expect("layer created above");
        layer.offset = Coord64::new(layer.pitch.x / 2, layer.pitch.y / 2);
    }
    Ok(())
}

fn parse_symmetry(cursor: &mut Cursor) -> Result<Symmetry, ParseError> {
    let mut symmetry = Symmetry::empty();
    while !cursor.eat_punct(';') {
        let token = cursor.expect_ident("symmetry flag")?;
        match token.text.as_str() {
            "X" => symmetry |= Symmetry::X,
            "Y" => symmetry |= Symmetry::Y,
            "R90" => symmetry |= Symmetry::R90,
            _ => return Err(error_at(&token, format!("unknown symmetry '{}'", token.text))),
        }
    }
    Ok(symmetry)
}

fn parse_site(design: &mut Design, cursor: &mut Cursor) -> Result<(), ParseError> {
    let name = cursor.expect_ident("site name")?;
    let key = design
        .tech_lib
        .create_site(&name.text)
        .map_err(|e| error_at(&name, e.to_string()))?;

    loop {
        if cursor.eat_ident("END") {
            cursor.expect_ident("site name")?;
            return Ok(());
        }
        if cursor.at_eof() {
            return Err(cursor.error("unterminated SITE block"));
        }
        let token = cursor.next();
        match token.text.as_str() {
            "CLASS" => {
                let class = cursor.expect_ident("site class")?;
                design.tech_lib.sites.get_mut(key).expect("site created").class =
                    match class.text.as_str() {
                        "CORE" => SiteClass::Core,
                        "PAD" => SiteClass::Pad,
                        _ => SiteClass::Undefined,
                    };
                cursor.expect_punct(';')?;
            }
            "SYMMETRY" => {
                let symmetry = parse_symmetry(cursor)?;
                design.tech_lib.sites.get_mut(key).expect("site created").symmetry = symmetry;
            }
            "SIZE" => {
                let x = cursor.expect_number()?;
                cursor.expect_ident("BY")?;
                let y = cursor.expect_number()?;
                cursor.expect_punct(';')?;
                design.tech_lib.sites.get_mut(key).expect("site created").size =
                    Coord64::new(to_nm(x), to_nm(y));
            }
            _ => {
                log::debug!("LEF: skipping site attribute '{}'", token.text);
                skip_statement(cursor)?;
            }
        }
    }
}

fn parse_macro_class(cursor: &mut Cursor) -> Result<(CellClass, CellSubclass), ParseError> {
    let class_token = cursor.expect_ident("macro class")?;
    let class = match class_token.text.as_str() {
        "CORE" => CellClass::Core,
        "COVER" => CellClass::Cover,
        "RING" => CellClass::Ring,
        "PAD" => CellClass::Pad,
        "ENDCAP" => CellClass::Endcap,
        "BLOCK" => CellClass::Block,
        _ => CellClass::Core,
    };
    let mut subclass = CellSubclass::None;
    if !cursor.eat_punct(';') {
        let sub_token = cursor.expect_ident("macro subclass")?;
        subclass = match sub_token.text.as_str() {
            "FEEDTHRU" => CellSubclass::Feedthru,
            "TIEHIGH" => CellSubclass::TieHigh,
            "TIELOW" => CellSubclass::TieLow,
            "SPACER" => CellSubclass::Spacer,
            "DECAP" => CellSubclass::Decap,
            "WELLTAP" => CellSubclass::Welltap,
            "ANTENNACELL" => CellSubclass::Antenna,
            _ => CellSubclass::None,
        };
        cursor.expect_punct(';')?;
    }
    Ok((class, subclass))
}

/// Parses `LAYER`/`RECT` geometry lists used by PORT and OBS blocks.
fn parse_geometry(cursor: &mut Cursor, terminator: &str) -> Result<Vec<LayerShapes>, ParseError> {
    let mut shapes: Vec<LayerShapes> = Vec::new();
    loop {
        if cursor.eat_ident("END") {
            if !terminator.is_empty() {
                cursor.expect_ident(terminator)?;
            }
            return Ok(shapes);
        }
        if cursor.at_eof() {
            return Err(cursor.error("unterminated geometry block"));
        }
        let token = cursor.next();
        match token.text.as_str() {
            "LAYER" => {
                let name = cursor.expect_ident("layer name")?;
                cursor.expect_punct(';')?;
                shapes.push(LayerShapes {
                    layer: name.text,
                    rects: Vec::new(),
                });
            }
            "RECT" => {
                let x1 = cursor.expect_number()?;
                let y1 = cursor.expect_number()?;
                let x2 = cursor.expect_number()?;
                let y2 = cursor.expect_number()?;
                cursor.expect_punct(';')?;
                let rect = Rect64::new(
                    Coord64::new(to_nm(x1.min(x2)), to_nm(y1.min(y2))),
                    Coord64::new(to_nm(x1.max(x2)), to_nm(y1.max(y2))),
                );
                match shapes.last_mut() {
                    Some(shape) => shape.rects.push(rect),
                    None => {
                        return Err(error_at(&token, "RECT before any LAYER"));
                    }
                }
            }
            _ => {
                log::debug!("LEF: skipping geometry '{}'", token.text);
                skip_statement(cursor)?;
            }
        }
    }
}

fn parse_pin(design: &mut Design, cursor: &mut Cursor, cell_name: &str) -> Result<(), ParseError> {
    let pin_name = cursor.expect_ident("pin name")?;
    let (cell_key, _) = design
        .cell_lib
        .lookup(cell_name)
        .expect("macro cell created before its pins");
    let pin_key = design
        .cell_lib
        .cells
        .get_mut(cell_key)
        .expect("cell exists")
        .pins
        .create(&pin_name.text);

    let mut direction = IoDirection::Unknown;
    let mut is_clock = false;
    let mut shapes: Vec<LayerShapes> = Vec::new();

    loop {
        if cursor.eat_ident("END") {
            cursor.expect_ident("pin name")?;
            break;
        }
        if cursor.at_eof() {
            return Err(cursor.error("unterminated PIN block"));
        }
        let token = cursor.next();
        match token.text.as_str() {
            "DIRECTION" => {
                let dir = cursor.expect_ident("pin direction")?;
                direction = match dir.text.as_str() {
                    "INPUT" => IoDirection::Input,
                    "OUTPUT" => {
                        if cursor.eat_ident("TRISTATE") {
                            IoDirection::OutputTri
                        } else {
                            IoDirection::Output
                        }
                    }
                    "INOUT" => IoDirection::Io,
                    _ => IoDirection::Unknown,
                };
                cursor.expect_punct(';')?;
            }
            "USE" => {
                let use_token = cursor.expect_ident("pin use")?;
                match use_token.text.as_str() {
                    "POWER" => direction = IoDirection::Power,
                    "GROUND" => direction = IoDirection::Ground,
                    "CLOCK" => is_clock = true,
                    "ANALOG" => direction = IoDirection::Analog,
                    _ => {}
                }
                cursor.expect_punct(';')?;
            }
            "PORT" => {
                let mut port_shapes = parse_geometry(cursor, "")?;
                shapes.append(&mut port_shapes);
            }
            _ => {
                log::debug!("LEF: skipping pin attribute '{}'", token.text);
                skip_statement(cursor)?;
            }
        }
    }

    // pin offset: center of the first port rectangle
    let offset = shapes
        .iter()
        .flat_map(|s| s.rects.first())
        .next()
        .map(|r| r.center())
        .unwrap_or_default();

    let cell = design
        .cell_lib
        .cells
        .get_mut(cell_key)
        .expect("cell exists");
    let pin = cell.pins.get_mut(pin_key).expect("pin created above");
    pin.direction = direction;
    pin.is_clock = is_clock;
    pin.offset = offset;
    pin.shapes = shapes;
    Ok(())
}

fn parse_macro(design: &mut Design, cursor: &mut Cursor) -> Result<(), ParseError> {
    let name = cursor.expect_ident("macro name")?;
    let cell_key = design
        .cell_lib
        .create(&name.text)
        .map_err(|e| error_at(&name, e.to_string()))?;

    loop {
        if cursor.eat_ident("END") {
            cursor.expect_ident("macro name")?;
            break;
        }
        if cursor.at_eof() {
            return Err(cursor.error("unterminated MACRO block"));
        }
        let token = cursor.next();
        match token.text.as_str() {
            "CLASS" => {
                let (class, subclass) = parse_macro_class(cursor)?;
                let cell = design.cell_lib.cells.get_mut(cell_key).expect("cell exists");
                cell.class = class;
                cell.subclass = subclass;
            }
            "ORIGIN" => {
                let x = cursor.expect_number()?;
                let y = cursor.expect_number()?;
                cursor.expect_punct(';')?;
                design.cell_lib.cells.get_mut(cell_key).expect("cell exists").offset =
                    Coord64::new(to_nm(x), to_nm(y));
            }
            "SIZE" => {
                let x = cursor.expect_number()?;
                cursor.expect_ident("BY")?;
                let y = cursor.expect_number()?;
                cursor.expect_punct(';')?;
                let cell = design.cell_lib.cells.get_mut(cell_key).expect("cell exists");
                cell.size = Coord64::new(to_nm(x), to_nm(y));
                cell.area_um2 = x * y;
            }
            "SYMMETRY" => {
                let symmetry = parse_symmetry(cursor)?;
                design.cell_lib.cells.get_mut(cell_key).expect("cell exists").symmetry = symmetry;
            }
            "SITE" => {
                let site = cursor.expect_ident("site name")?;
                cursor.expect_punct(';')?;
                design.cell_lib.cells.get_mut(cell_key).expect("cell exists").site = site.text;
            }
            "PIN" => parse_pin(design, cursor, &name.text)?,
            "OBS" => {
                let shapes = parse_geometry(cursor, "")?;
                design
                    .cell_lib
                    .cells
                    .get_mut(cell_key)
                    .expect("cell exists")
                    .obstructions = shapes;
            }
            "FOREIGN" => skip_statement(cursor)?,
            _ => {
                log::debug!("LEF: skipping macro attribute '{}'", token.text);
                skip_statement(cursor)?;
            }
        }
    }
    Ok(())
}

fn error_at(token: &Token, msg: impl Into<String>) -> ParseError {
    ParseError::new(token.line, token.col, msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEF: &str = r#"
VERSION 5.4 ;
UNITS
  DATABASE MICRONS 100 ;
END UNITS
MANUFACTURINGGRID 0.005 ;

LAYER metal1
  TYPE ROUTING ;
  DIRECTION HORIZONTAL ;
  PITCH 0.2 ;
  WIDTH 0.1 ;
  SPACING 0.1 ;
  RESISTANCE RPERSQ 0.08 ;
  THICKNESS 0.13 ;
END metal1

SITE core
  CLASS CORE ;
  SYMMETRY Y ;
  SIZE 0.2 BY 2.0 ;
END core

MACRO INV_X1
  CLASS CORE ;
  ORIGIN 0 0 ;
  SIZE 0.2 BY 2.0 ;
  SYMMETRY X Y ;
  SITE core ;
  PIN A
    DIRECTION INPUT ;
    PORT
      LAYER metal1 ;
      RECT 0.01 0.9 0.05 1.1 ;
    END
  END A
  PIN Y
    DIRECTION OUTPUT ;
  END Y
  PIN VDD
    DIRECTION INOUT ;
    USE POWER ;
  END VDD
END INV_X1
END LIBRARY
"#;

    #[test]
    fn reads_units_and_grid() {
        let mut design = Design::new();
        read_lef(&mut design, LEF).unwrap();
        assert_eq!(design.tech_lib.manufacturing_grid, 5);
        assert_eq!(design.tech_lib.database_microns, 100);
    }

    #[test]
    fn reads_layer_attributes() {
        let mut design = Design::new();
        read_lef(&mut design, LEF).unwrap();
        let (_, layer) = design.tech_lib.layers.find_by_name("metal1").unwrap();
        assert_eq!(layer.layer_type, LayerType::Routing);
        assert_eq!(layer.direction, LayerDirection::Horizontal);
        assert_eq!(layer.pitch, Coord64::new(200, 200));
        // no OFFSET given: defaults to half the pitch
        assert_eq!(layer.offset, Coord64::new(100, 100));
        assert_eq!(layer.width, 100);
        assert!((layer.resistance - 0.08).abs() < 1e-12);
    }

    #[test]
    fn reads_site() {
        let mut design = Design::new();
        read_lef(&mut design, LEF).unwrap();
        let (_, site) = design.tech_lib.sites.find_by_name("core").unwrap();
        assert_eq!(site.class, SiteClass::Core);
        assert_eq!(site.size, Coord64::new(200, 2000));
        assert_eq!(site.symmetry, Symmetry::Y);
    }

    #[test]
    fn reads_macro_and_pins() {
        let mut design = Design::new();
        read_lef(&mut design, LEF).unwrap();
        let (_, cell) = design.cell_lib.lookup("INV_X1").unwrap();
        assert_eq!(cell.size, Coord64::new(200, 2000));
        assert_eq!(cell.class, CellClass::Core);
        assert_eq!(cell.site, "core");
        assert_eq!(cell.symmetry, Symmetry::X | Symmetry::Y);
        assert!((cell.area_um2 - 0.4).abs() < 1e-12);

        let (_, a) = cell.pins.find("A").unwrap();
        assert_eq!(a.direction, IoDirection::Input);
        assert_eq!(a.shapes.len(), 1);
        assert_eq!(a.shapes[0].layer, "metal1");
        assert_eq!(a.offset, Coord64::new(30, 1000));

        let (_, vdd) = cell.pins.find("VDD").unwrap();
        assert!(vdd.direction.is_pg());
    }

    #[test]
    fn unknown_statements_are_skipped() {
        let mut design = Design::new();
        let lef = "NAMESCASESENSITIVE ON ;\nBUSBITCHARS \"[]\" ;\nEND LIBRARY\n";
        read_lef(&mut design, lef).unwrap();
    }

    #[test]
    fn truncated_macro_is_an_error() {
        let mut design = Design::new();
        let err = read_lef(&mut design, "MACRO X\n  CLASS CORE ;\n").unwrap_err();
        assert!(err.message.contains("unterminated"));
    }
}
