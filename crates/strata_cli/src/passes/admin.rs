//! Housekeeping passes: top module selection and database reset.

use super::{ParamDef, Params, Pass};
use strata_common::{StrataError, StrataResult};
use strata_db::Design;

/// `set_top <module>` - select the module subsequent passes operate on.
pub struct SetTopPass;

impl Pass for SetTopPass {
    fn name(&self) -> &'static str {
        "set_top"
    }

    fn short_help(&self) -> &'static str {
        "select the top module"
    }

    fn help(&self) -> String {
        "set_top <module>\n  Selects the module subsequent passes operate on.\n".into()
    }

    fn param_defs(&self) -> &'static [ParamDef] {
        &[]
    }

    fn execute(&self, design: &mut Design, params: &Params) -> StrataResult<()> {
        let [name] = params.positional() else {
            return Err(StrataError::invalid_state(
                "set_top needs exactly one module name",
            ));
        };
        if !design.set_top_module(name) {
            return Err(StrataError::NotFound {
                kind: "module",
                name: name.clone(),
            });
        }
        log::info!("top module is '{name}'");
        Ok(())
    }
}

/// `clear` - reset the whole database.
pub struct ClearPass;

impl Pass for ClearPass {
    fn name(&self) -> &'static str {
        "clear"
    }

    fn short_help(&self) -> &'static str {
        "reset the database"
    }

    fn help(&self) -> String {
        "clear\n  Drops all libraries, modules and the floorplan; the built-in\n\
         \x20 pseudo-cells are recreated.\n"
            .into()
    }

    fn param_defs(&self) -> &'static [ParamDef] {
        &[]
    }

    fn execute(&self, design: &mut Design, _params: &Params) -> StrataResult<()> {
        design.clear();
        log::info!("database cleared");
        Ok(())
    }
}
