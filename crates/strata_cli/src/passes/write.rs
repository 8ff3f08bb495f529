//! File export passes.

use super::{ParamDef, Params, Pass};
use std::fs::File;
use std::io::BufWriter;
use strata_common::{StrataError, StrataResult};
use strata_db::Design;
use strata_io::def::DefWriterOptions;
use strata_io::spef::SpefOptions;

fn create_file(path: &str) -> StrataResult<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| StrataError::invalid_state(format!("cannot create '{path}': {e}")))
}

/// `write_def <file> [-fillers] [-decap]` - export placement as DEF.
pub struct WriteDefPass;

impl Pass for WriteDefPass {
    fn name(&self) -> &'static str {
        "write_def"
    }

    fn short_help(&self) -> &'static str {
        "export the top module placement as DEF"
    }

    fn help(&self) -> String {
        "write_def <file> [-fillers] [-decap]\n  Writes a DEF 5.4 COMPONENTS block.\n\
         \n  Options:\n    -fillers : also export filler cells\n    -decap   : also export decap cells\n"
            .into()
    }

    fn param_defs(&self) -> &'static [ParamDef] {
        const PARAMS: &[ParamDef] = &[
            ParamDef::new("fillers", 0, false),
            ParamDef::new("decap", 0, false),
        ];
        PARAMS
    }

    fn execute(&self, design: &mut Design, params: &Params) -> StrataResult<()> {
        let [path] = params.positional() else {
            return Err(StrataError::invalid_state(
                "write_def needs exactly one output file",
            ));
        };
        let options = DefWriterOptions {
            export_fillers: params.has("fillers"),
            export_decap: params.has("decap"),
        };
        let mut out = create_file(path)?;
        strata_io::def::write_def(&mut out, design, &options)?;
        log::info!("wrote DEF '{path}'");
        Ok(())
    }
}

/// `write_spef <file>` - export estimated parasitics.
pub struct WriteSpefPass;

impl Pass for WriteSpefPass {
    fn name(&self) -> &'static str {
        "write_spef"
    }

    fn short_help(&self) -> &'static str {
        "export estimated net parasitics as SPEF"
    }

    fn help(&self) -> String {
        "write_spef <file>\n  Writes Manhattan-estimated parasitics for every net.\n".into()
    }

    fn param_defs(&self) -> &'static [ParamDef] {
        &[]
    }

    fn execute(&self, design: &mut Design, params: &Params) -> StrataResult<()> {
        let [path] = params.positional() else {
            return Err(StrataError::invalid_state(
                "write_spef needs exactly one output file",
            ));
        };
        let mut out = create_file(path)?;
        strata_io::spef::write_spef(&mut out, design, &SpefOptions::default())?;
        log::info!("wrote SPEF '{path}'");
        Ok(())
    }
}

/// `write_placement <file>` - export `x y w h` placement lines.
pub struct WritePlacementPass;

impl Pass for WritePlacementPass {
    fn name(&self) -> &'static str {
        "write_placement"
    }

    fn short_help(&self) -> &'static str {
        "export placed instances as plain 'x y w h' lines"
    }

    fn help(&self) -> String {
        "write_placement <file>\n  One line per placed or fixed instance.\n".into()
    }

    fn param_defs(&self) -> &'static [ParamDef] {
        &[]
    }

    fn execute(&self, design: &mut Design, params: &Params) -> StrataResult<()> {
        let [path] = params.positional() else {
            return Err(StrataError::invalid_state(
                "write_placement needs exactly one output file",
            ));
        };
        let netlist = design.top_netlist().ok_or_else(|| {
            StrataError::invalid_state("no top module with a netlist has been selected")
        })?;
        let mut out = create_file(path)?;
        strata_place::tools::write_placement_file(&mut out, design, netlist)?;
        log::info!("wrote placement '{path}'");
        Ok(())
    }
}
