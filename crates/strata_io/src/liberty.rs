//! Liberty reader: electrical cell and pin attributes.
//!
//! Only the structural subset the placer cares about is read: cell area and
//! leakage, pin direction/capacitance/fan-out limits, logic function
//! strings and clock flags. Timing tables are skipped wholesale.

use crate::lex::{Cursor, LexConfig, TokenKind, tokenize};
use strata_common::ParseError;
use strata_db::{Design, IoDirection};

/// Header information collected from the `library` group.
#[derive(Debug, Clone, Default)]
pub struct LibertyInfo {
    /// Library name.
    pub name: String,
    /// Declared leakage power unit (e.g. `1nW`).
    pub leakage_power_unit: String,
    /// Declared capacitive load unit (e.g. `1 pf`).
    pub capacitive_load_unit: String,
    /// Number of cells created or updated.
    pub cells_updated: usize,
}

/// Reads a Liberty stream, augmenting cells already present from LEF and
/// creating the ones that are not.
pub fn read_liberty(design: &mut Design, source: &str) -> Result<LibertyInfo, ParseError> {
    let tokens = tokenize(source, &LexConfig::liberty())?;
    let mut cursor = Cursor::new(tokens);
    let mut info = LibertyInfo::default();

    cursor.expect_ident("library")?;
    cursor.expect_punct('(')?;
    info.name = cursor.next().text;
    cursor.expect_punct(')')?;
    cursor.expect_punct('{')?;

    while !cursor.eat_punct('}') {
        if cursor.at_eof() {
            return Err(cursor.error("unterminated library group"));
        }
        let token = cursor.expect_ident("library statement")?;
        match token.text.as_str() {
            "leakage_power_unit" => {
                cursor.expect_punct(':')?;
                info.leakage_power_unit = cursor.next().text;
                cursor.eat_punct(';');
            }
            "capacitive_load_unit" => {
                cursor.expect_punct('(')?;
                let value = cursor.expect_number()?;
                cursor.expect_punct(',')?;
                let unit = cursor.expect_ident("capacitance unit")?;
                cursor.expect_punct(')')?;
                cursor.eat_punct(';');
                info.capacitive_load_unit = format!("{value} {}", unit.text);
            }
            "cell" => {
                parse_cell(design, &mut cursor)?;
                info.cells_updated += 1;
            }
            _ => skip_statement_or_group(&mut cursor)?,
        }
    }
    Ok(info)
}

/// Consumes the remainder of an attribute (`: value... ;`), a complex
/// attribute (`(args) ;`) or a whole nested group (`(args) { ... }`).
fn skip_statement_or_group(cursor: &mut Cursor) -> Result<(), ParseError> {
    if cursor.eat_punct(':') {
        while !cursor.eat_punct(';') {
            if cursor.at_eof() {
                return Err(cursor.error("unterminated attribute"));
            }
            if cursor.peek().kind == TokenKind::Punct && cursor.peek().text == "}" {
                // attribute without a ';' before the closing brace
                return Ok(());
            }
            cursor.next();
        }
        return Ok(());
    }
    if cursor.eat_punct('(') {
        let mut depth = 1;
        while depth > 0 {
            if cursor.at_eof() {
                return Err(cursor.error("unterminated parameter list"));
            }
            let token = cursor.next();
            if token.kind == TokenKind::Punct {
                match token.text.as_str() {
                    "(" => depth += 1,
                    ")" => depth -= 1,
                    _ => {}
                }
            }
        }
        if cursor.eat_punct('{') {
            let mut depth = 1;
            while depth > 0 {
                if cursor.at_eof() {
                    return Err(cursor.error("unterminated group"));
                }
                let token = cursor.next();
                if token.kind == TokenKind::Punct {
                    match token.text.as_str() {
                        "{" => depth += 1,
                        "}" => depth -= 1,
                        _ => {}
                    }
                }
            }
        } else {
            cursor.eat_punct(';');
        }
        return Ok(());
    }
    Err(cursor.error("expected ':' or '(' after identifier"))
}

fn parse_cell(design: &mut Design, cursor: &mut Cursor) -> Result<(), ParseError> {
    cursor.expect_punct('(')?;
    let name = cursor.next();
    cursor.expect_punct(')')?;
    cursor.expect_punct('{')?;

    let cell_key = design
        .cell_lib
        .create(&name.text)
        .map_err(|e| ParseError::new(name.line, name.col, e.to_string()))?;

    while !cursor.eat_punct('}') {
        if cursor.at_eof() {
            return Err(cursor.error("unterminated cell group"));
        }
        let token = cursor.expect_ident("cell statement")?;
        match token.text.as_str() {
            "area" => {
                cursor.expect_punct(':')?;
                let area = cursor.expect_number()?;
                cursor.eat_punct(';');
                design.cell_lib.cells.get_mut(cell_key).expect("cell exists").area_um2 = area;
            }
            "cell_leakage_power" => {
                cursor.expect_punct(':')?;
                let leakage = cursor.expect_number()?;
                cursor.eat_punct(';');
                design
                    .cell_lib
                    .cells
                    .get_mut(cell_key)
                    .expect("cell exists")
                    .leakage_power = leakage;
            }
            "pin" => parse_pin(design, cursor, cell_key)?,
            _ => skip_statement_or_group(cursor)?,
        }
    }
    Ok(())
}

fn parse_pin(
    design: &mut Design,
    cursor: &mut Cursor,
    cell_key: strata_db::CellKey,
) -> Result<(), ParseError> {
    cursor.expect_punct('(')?;
    let name = cursor.next();
    cursor.expect_punct(')')?;
    cursor.expect_punct('{')?;

    let pin_key = design
        .cell_lib
        .cells
        .get_mut(cell_key)
        .expect("cell exists")
        .pins
        .create(&name.text);

    while !cursor.eat_punct('}') {
        if cursor.at_eof() {
            return Err(cursor.error("unterminated pin group"));
        }
        let token = cursor.expect_ident("pin statement")?;
        let pin = design
            .cell_lib
            .cells
            .get_mut(cell_key)
            .expect("cell exists")
            .pins
            .get_mut(pin_key)
            .expect("pin created above");
        match token.text.as_str() {
            "direction" => {
                cursor.expect_punct(':')?;
                let dir = cursor.next();
                cursor.eat_punct(';');
                // LEF wins when it already set a direction
                if pin.direction == IoDirection::Unknown {
                    pin.direction = match dir.text.as_str() {
                        "input" => IoDirection::Input,
                        "output" => IoDirection::Output,
                        "inout" => IoDirection::Io,
                        _ => IoDirection::Unknown,
                    };
                }
            }
            "capacitance" => {
                cursor.expect_punct(':')?;
                pin.cap_input = cursor.expect_number()?;
                cursor.eat_punct(';');
            }
            "max_capacitance" => {
                cursor.expect_punct(':')?;
                pin.cap_max_output = cursor.expect_number()?;
                cursor.eat_punct(';');
            }
            "max_fanout" => {
                cursor.expect_punct(':')?;
                pin.max_fanout = cursor.expect_number()? as u32;
                cursor.eat_punct(';');
            }
            "function" => {
                cursor.expect_punct(':')?;
                pin.function = cursor.next().text;
                cursor.eat_punct(';');
            }
            "three_state" => {
                cursor.expect_punct(':')?;
                pin.tristate_function = cursor.next().text;
                cursor.eat_punct(';');
            }
            "clock" => {
                cursor.expect_punct(':')?;
                let value = cursor.next();
                cursor.eat_punct(';');
                pin.is_clock = value.text == "true";
            }
            _ => skip_statement_or_group(cursor)?,
        }
    }
    Ok(())
}
