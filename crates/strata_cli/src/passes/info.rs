//! Design summary pass.

use super::{ParamDef, Params, Pass};
use strata_common::StrataResult;
use strata_db::Design;
use strata_place::tools;

/// `info` - report library, floorplan and netlist statistics.
pub struct InfoPass;

impl Pass for InfoPass {
    fn name(&self) -> &'static str {
        "info"
    }

    fn short_help(&self) -> &'static str {
        "report design statistics"
    }

    fn help(&self) -> String {
        "info\n  Logs cell library, floorplan, netlist and placement statistics.\n".into()
    }

    fn param_defs(&self) -> &'static [ParamDef] {
        &[]
    }

    fn execute(&self, design: &mut Design, _params: &Params) -> StrataResult<()> {
        log::info!(
            "cells: {}  modules: {}  layers: {}  sites: {}",
            design.cell_lib.cells.len(),
            design.module_lib.modules.len(),
            design.tech_lib.layers.len(),
            design.tech_lib.sites.len()
        );

        let die = design.floorplan.die_size();
        log::info!(
            "floorplan: core {}x{} nm, die {}x{} nm, {} rows",
            design.floorplan.core_size.x,
            design.floorplan.core_size.y,
            die.x,
            die.y,
            design.floorplan.rows.len()
        );

        let Some(netlist) = design.top_netlist() else {
            log::info!("no top module selected");
            return Ok(());
        };

        let placed = netlist
            .instances
            .values()
            .filter(|ins| ins.is_placed())
            .count();
        log::info!(
            "top netlist: {} instances ({} placed), {} nets",
            netlist.instances.len(),
            placed,
            netlist.nets.len()
        );

        let cell_area = tools::calc_total_cell_area(design, netlist);
        let core = design.floorplan.core_size;
        if core.x > 0 && core.y > 0 {
            let core_area = core.x as f64 * 1e-3 * core.y as f64 * 1e-3;
            log::info!(
                "cell area {cell_area:.3} um^2, core utilization {:.2} percent",
                100.0 * cell_area / core_area
            );
        } else {
            log::info!("cell area {cell_area:.3} um^2");
        }

        log::info!(
            "HPWL = {:.6} *1e6 nm",
            tools::calc_hpwl(design, netlist) / 1.0e6
        );
        Ok(())
    }
}
