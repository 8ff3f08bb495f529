//! SPEF parasitics writer.
//!
//! Emits an IEEE 1481-2009 SPEF file with estimated parasitics: total net
//! load from the connected input-pin capacitances and a star of Manhattan
//! length derived resistances from each net's first connection. Pins are
//! taken to sit at their instance centers.

use std::io::Write;
use strata_common::{StrataError, StrataResult};
use strata_db::{Archetype, Design, Instance, InstanceType, IoDirection, Netlist, PinKey};

/// Tuning knobs for the estimated parasitics.
#[derive(Debug, Clone)]
pub struct SpefOptions {
    /// Sheet resistance used for the Manhattan resistance estimate, ohm/sq.
    pub r_per_sq: f64,
    /// Assumed track width, nm.
    pub track_width: i64,
    /// Fixed `*DATE` value; `None` stamps the current time (seconds since
    /// the epoch). Tests pin this for byte-stable output.
    pub date: Option<String>,
}

impl Default for SpefOptions {
    fn default() -> Self {
        Self {
            r_per_sq: 0.08,
            track_width: 300,
            date: None,
        }
    }
}

fn quoted(text: &str) -> String {
    format!("\"{text}\"")
}

fn escape_spef(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '[' || c == ']' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn pin_direction(design: &Design, instance: &Instance, pin: PinKey) -> IoDirection {
    let pins = match instance.archetype {
        Archetype::Cell(key) => design.cell_lib.cells.get(key).map(|c| &c.pins),
        Archetype::Module(key) => design.module_lib.modules.get(key).map(|m| &m.cell.pins),
    };
    pins.and_then(|p| p.get(pin))
        .map(|p| p.direction)
        .unwrap_or(IoDirection::Unknown)
}

fn pin_name(design: &Design, instance: &Instance, pin: PinKey) -> String {
    let pins = match instance.archetype {
        Archetype::Cell(key) => design.cell_lib.cells.get(key).map(|c| &c.pins),
        Archetype::Module(key) => design.module_lib.modules.get(key).map(|m| &m.cell.pins),
    };
    pins.and_then(|p| p.get(pin))
        .map(|p| p.name.clone())
        .unwrap_or_else(|| format!("pin{}", pin.as_raw()))
}

fn pin_cap(design: &Design, instance: &Instance, pin: PinKey) -> f64 {
    let pins = match instance.archetype {
        Archetype::Cell(key) => design.cell_lib.cells.get(key).map(|c| &c.pins),
        Archetype::Module(key) => design.module_lib.modules.get(key).map(|m| &m.cell.pins),
    };
    pins.and_then(|p| p.get(pin))
        .filter(|p| p.direction.is_input())
        .map(|p| p.cap_input)
        .unwrap_or(0.0)
}

fn direction_code(direction: IoDirection) -> Option<&'static str> {
    match direction {
        IoDirection::Input => Some("I"),
        IoDirection::Output => Some("O"),
        IoDirection::OutputTri | IoDirection::Io | IoDirection::Analog => Some("B"),
        IoDirection::Power | IoDirection::Ground | IoDirection::Unknown => None,
    }
}

/// Writes the design's top netlist parasitics as SPEF.
pub fn write_spef(out: &mut dyn Write, design: &Design, options: &SpefOptions) -> StrataResult<()> {
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

    let date = options.date.clone().unwrap_or_else(|| {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        now.to_string()
    });

    writeln!(out, "*SPEF        {}", quoted("IEEE 1481-2009"))?;
    writeln!(out, "*DESIGN      {}", quoted(&module.cell.name))?;
    writeln!(out, "*DATE        {}", quoted(&date))?;
    writeln!(out, "*VENDOR      {}", quoted("strata"))?;
    writeln!(out, "*PROGRAM     {}", quoted("strata"))?;
    writeln!(out, "*VERSION     {}", quoted("1.0"))?;
    writeln!(out, "*DESIGN_FLOW {}", quoted(""))?;
    writeln!(out, "*DIVIDER /")?;
    writeln!(out, "*DELIMITER :")?;
    writeln!(out, "*BUS_DELIMITER [ ]")?;
    writeln!(out, "*T_UNIT 1 NS")?;
    writeln!(out, "*C_UNIT 1 PF")?;
    writeln!(out, "*R_UNIT 1 OHM")?;
    writeln!(out, "*L_UNIT 1 HENRY")?;
    writeln!(out)?;

    writeln!(out, "*PORTS")?;
    for (_, port_pin) in module.cell.pins.iter() {
        if let Some(code) = direction_code(port_pin.direction) {
            writeln!(out, "{} {code}", escape_spef(&port_pin.name))?;
        }
    }
    writeln!(out)?;

    for (_, net) in netlist.nets.iter() {
        write_d_net(out, design, netlist, net, options)?;
    }
    Ok(())
}

fn write_d_net(
    out: &mut dyn Write,
    design: &Design,
    netlist: &Netlist,
    net: &strata_db::Net,
    options: &SpefOptions,
) -> StrataResult<()> {
    // total load: input pin capacitances, in pF
    let mut total_cap = 0.0f64;
    for conn in net.connections() {
        if let Some(instance) = netlist.instances.get(conn.instance) {
            total_cap += pin_cap(design, instance, conn.pin);
        }
    }

    writeln!(out, "*D_NET {} {total_cap}", escape_spef(&net.name))?;
    writeln!(out, "*CONN")?;
    for conn in net.connections() {
        let Some(instance) = netlist.instances.get(conn.instance) else {
            continue;
        };
        let direction = pin_direction(design, instance, conn.pin);
        let code = direction_code(direction).unwrap_or("B");
        if instance.itype == InstanceType::Pin {
            writeln!(out, "*P {} {code}", escape_spef(&instance.name))?;
        } else {
            writeln!(
                out,
                "*I {}:{} {code}",
                escape_spef(&instance.name),
                pin_name(design, instance, conn.pin)
            )?;
        }
    }

    // star resistances from the first connection to every other
    let mut connections = net.connections();
    if let Some(first) = connections.next() {
        if let Some(first_ins) = netlist.instances.get(first.instance) {
            let first_center = design.instance_center(first_ins);
            let first_name = if first_ins.itype == InstanceType::Pin {
                escape_spef(&first_ins.name)
            } else {
                format!(
                    "{}:{}",
                    escape_spef(&first_ins.name),
                    pin_name(design, first_ins, first.pin)
                )
            };

            let mut res_counter = 0usize;
            let mut res_body = String::new();
            for conn in connections {
                let Some(instance) = netlist.instances.get(conn.instance) else {
                    continue;
                };
                let center = design.instance_center(instance);
                let dist = first_center.manhattan_distance(center);
                let resistance =
                    dist as f64 / options.track_width as f64 * options.r_per_sq;
                let name = if instance.itype == InstanceType::Pin {
                    escape_spef(&instance.name)
                } else {
                    format!(
                        "{}:{}",
                        escape_spef(&instance.name),
                        pin_name(design, instance, conn.pin)
                    )
                };
                res_counter += 1;
                res_body.push_str(&format!(
                    "{res_counter} {first_name} {name} {resistance}\n"
                ));
            }
            if res_counter > 0 {
                writeln!(out, "*RES")?;
                out.write_all(res_body.as_bytes())?;
            }
        }
    }
    writeln!(out, "*END")?;
    writeln!(out)?;
    Ok(())
}
