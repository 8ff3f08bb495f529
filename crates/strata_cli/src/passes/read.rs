//! File import passes.

use super::{ParamDef, Params, Pass};
use strata_common::{StrataError, StrataResult};
use strata_db::Design;

fn read_file(path: &str) -> StrataResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| StrataError::invalid_state(format!("cannot open '{path}': {e}")))
}

/// `read_lef <file>…` - import technology and cell abstracts.
pub struct ReadLefPass;

impl Pass for ReadLefPass {
    fn name(&self) -> &'static str {
        "read_lef"
    }

    fn short_help(&self) -> &'static str {
        "import technology and cell geometry from LEF files"
    }

    fn help(&self) -> String {
        "read_lef <file> [<file>…]\n  Imports layers, sites and macros into the database.\n".into()
    }

    fn param_defs(&self) -> &'static [ParamDef] {
        &[]
    }

    fn execute(&self, design: &mut Design, params: &Params) -> StrataResult<()> {
        if params.positional().is_empty() {
            return Err(StrataError::invalid_state("read_lef needs at least one file"));
        }
        for path in params.positional() {
            let source = read_file(path)?;
            strata_io::lef::read_lef(design, &source)?;
            log::info!(
                "loaded LEF '{path}': {} layers, {} sites, {} cells",
                design.tech_lib.layers.len(),
                design.tech_lib.sites.len(),
                design.cell_lib.cells.len()
            );
        }
        Ok(())
    }
}

/// `read_liberty <file>…` - import electrical cell data.
pub struct ReadLibertyPass;

impl Pass for ReadLibertyPass {
    fn name(&self) -> &'static str {
        "read_liberty"
    }

    fn short_help(&self) -> &'static str {
        "import cell and pin attributes from Liberty files"
    }

    fn help(&self) -> String {
        "read_liberty <file> [<file>…]\n  Augments cells with area, leakage and pin data.\n".into()
    }

    fn param_defs(&self) -> &'static [ParamDef] {
        &[]
    }

    fn execute(&self, design: &mut Design, params: &Params) -> StrataResult<()> {
        if params.positional().is_empty() {
            return Err(StrataError::invalid_state(
                "read_liberty needs at least one file",
            ));
        }
        for path in params.positional() {
            let source = read_file(path)?;
            let info = strata_io::liberty::read_liberty(design, &source)?;
            log::info!(
                "loaded Liberty '{path}' (library '{}'): {} cells",
                info.name,
                info.cells_updated
            );
        }
        Ok(())
    }
}

/// `read_verilog <file>` - import the gate-level netlist.
pub struct ReadVerilogPass;

impl Pass for ReadVerilogPass {
    fn name(&self) -> &'static str {
        "read_verilog"
    }

    fn short_help(&self) -> &'static str {
        "import a structural Verilog netlist"
    }

    fn help(&self) -> String {
        "read_verilog <file>\n  Creates modules, nets and instances from a gate-level netlist.\n"
            .into()
    }

    fn param_defs(&self) -> &'static [ParamDef] {
        &[]
    }

    fn execute(&self, design: &mut Design, params: &Params) -> StrataResult<()> {
        let [path] = params.positional() else {
            return Err(StrataError::invalid_state(
                "read_verilog needs exactly one file",
            ));
        };
        let source = read_file(path)?;
        strata_io::verilog::read_verilog(design, &source)?;
        Ok(())
    }
}

/// `read_def <file>` - apply placement from a DEF file.
pub struct ReadDefPass;

impl Pass for ReadDefPass {
    fn name(&self) -> &'static str {
        "read_def"
    }

    fn short_help(&self) -> &'static str {
        "apply component placement from a DEF file"
    }

    fn help(&self) -> String {
        "read_def <file>\n  Updates positions and orientations of existing instances.\n".into()
    }

    fn param_defs(&self) -> &'static [ParamDef] {
        &[]
    }

    fn execute(&self, design: &mut Design, params: &Params) -> StrataResult<()> {
        let [path] = params.positional() else {
            return Err(StrataError::invalid_state("read_def needs exactly one file"));
        };
        let source = read_file(path)?;
        strata_io::def::read_def(design, &source)
    }
}
