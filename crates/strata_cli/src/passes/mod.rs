//! The pass framework: declared parameters, the pass trait and the
//! registry that parses argument lists and dispatches.

mod admin;
mod check;
mod floorplan;
mod info;
mod place;
mod read;
mod write;

use std::collections::HashMap;
use strata_common::{StrataError, StrataResult};
use strata_db::Design;

use crate::config::StrataConfig;

/// Declaration of one named parameter of a pass.
#[derive(Debug, Clone, Copy)]
pub struct ParamDef {
    /// Parameter name, used as `-name` on the command line.
    pub name: &'static str,
    /// Number of argument tokens the parameter consumes.
    pub arg_count: usize,
    /// When `true`, the pass fails if the parameter is missing.
    pub required: bool,
}

impl ParamDef {
    /// Shorthand constructor.
    pub const fn new(name: &'static str, arg_count: usize, required: bool) -> Self {
        Self {
            name,
            arg_count,
            required,
        }
    }
}

/// Parsed arguments handed to a pass.
#[derive(Debug, Default)]
pub struct Params {
    named: HashMap<String, Vec<String>>,
    positional: Vec<String>,
}

impl Params {
    /// True when the named parameter was given.
    pub fn has(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// The arguments of a named parameter.
    pub fn named(&self, name: &str) -> Option<&[String]> {
        self.named.get(name).map(|v| v.as_slice())
    }

    /// First argument of a named parameter.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.named.get(name)?.first().map(|s| s.as_str())
    }

    /// First argument of a named parameter, parsed.
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> StrataResult<Option<T>> {
        match self.value(name) {
            None => Ok(None),
            Some(text) => text.parse::<T>().map(Some).map_err(|_| {
                StrataError::invalid_state(format!("cannot parse -{name} value '{text}'"))
            }),
        }
    }

    /// The positional arguments.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }
}

/// One executable pass.
pub trait Pass {
    /// Pass name as used on the command line.
    fn name(&self) -> &'static str;

    /// One-line description.
    fn short_help(&self) -> &'static str;

    /// Full help text.
    fn help(&self) -> String;

    /// The declared named parameters.
    fn param_defs(&self) -> &'static [ParamDef];

    /// Runs the pass against the design.
    fn execute(&self, design: &mut Design, params: &Params) -> StrataResult<()>;
}

/// Registry of all known passes.
pub struct PassRegistry {
    passes: Vec<Box<dyn Pass>>,
}

impl PassRegistry {
    /// Builds the registry with the standard pass set.
    pub fn with_default_passes(config: &StrataConfig) -> StrataResult<Self> {
        let passes: Vec<Box<dyn Pass>> = vec![
            Box::new(read::ReadLefPass),
            Box::new(read::ReadLibertyPass),
            Box::new(read::ReadVerilogPass),
            Box::new(read::ReadDefPass),
            Box::new(write::WriteDefPass),
            Box::new(write::WriteSpefPass),
            Box::new(write::WritePlacementPass),
            Box::new(floorplan::FloorplanPass),
            Box::new(place::PlacePass::from_config(config)?),
            Box::new(check::CheckPass),
            Box::new(info::InfoPass),
            Box::new(admin::SetTopPass),
            Box::new(admin::ClearPass),
        ];
        Ok(Self { passes })
    }

    /// Iterates `(name, short help)` for every pass.
    pub fn list(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.passes.iter().map(|p| (p.name(), p.short_help()))
    }

    fn find(&self, name: &str) -> Option<&dyn Pass> {
        self.passes
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    /// Parses `args` against the pass's parameter declarations and runs it.
    pub fn run(&self, design: &mut Design, name: &str, args: &[String]) -> StrataResult<()> {
        let pass = self
            .find(name)
            .ok_or_else(|| StrataError::invalid_state(format!("unknown pass '{name}'")))?;

        let mut params = Params::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if let Some(param_name) = arg.strip_prefix('-') {
                if param_name == "help" {
                    println!("{}", pass.help());
                    return Ok(());
                }
                let def = pass
                    .param_defs()
                    .iter()
                    .find(|d| d.name == param_name)
                    .ok_or_else(|| {
                        StrataError::invalid_state(format!(
                            "pass '{name}' has no parameter '-{param_name}'"
                        ))
                    })?;
                let mut values = Vec::with_capacity(def.arg_count);
                for _ in 0..def.arg_count {
                    let value = iter.next().ok_or_else(|| {
                        StrataError::invalid_state(format!(
                            "parameter '-{param_name}' expects {} argument(s)",
                            def.arg_count
                        ))
                    })?;
                    values.push(value.clone());
                }
                params.named.insert(param_name.to_owned(), values);
            } else {
                params.positional.push(arg.clone());
            }
        }

        for def in pass.param_defs() {
            if def.required && !params.has(def.name) {
                return Err(StrataError::invalid_state(format!(
                    "pass '{name}' requires parameter '-{}'",
                    def.name
                )));
            }
        }

        pass.execute(design, &params)
    }
}

/// Runs a pass script: one `passname [args…]` line at a time, stopping at
/// the first failure.
///
/// Blank lines and `#` comments are skipped. The error message names the
/// failing line.
pub fn run_script(
    registry: &PassRegistry,
    design: &mut Design,
    script: &str,
) -> StrataResult<()> {
    for (index, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace().map(str::to_owned);
        let name = tokens.next().expect("non-empty line");
        let args: Vec<String> = tokens.collect();
        log::info!("running pass '{name}'");
        registry.run(design, &name, &args).map_err(|e| {
            StrataError::invalid_state(format!("line {}: pass '{name}': {e}", index + 1))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PassRegistry {
        PassRegistry::with_default_passes(&StrataConfig::default()).unwrap()
    }

    #[test]
    fn unknown_pass_fails() {
        let mut design = Design::new();
        let err = registry().run(&mut design, "route", &[]).unwrap_err();
        assert!(err.to_string().contains("unknown pass"));
    }

    #[test]
    fn unknown_parameter_fails() {
        let mut design = Design::new();
        let err = registry()
            .run(&mut design, "floorplan", &["-frobnicate".into()])
            .unwrap_err();
        assert!(err.to_string().contains("frobnicate"));
    }

    #[test]
    fn missing_required_parameter_fails() {
        let mut design = Design::new();
        let err = registry().run(&mut design, "floorplan", &[]).unwrap_err();
        assert!(err.to_string().contains("requires parameter"));
    }

    #[test]
    fn missing_parameter_arguments_fail() {
        let mut design = Design::new();
        let err = registry()
            .run(&mut design, "floorplan", &["-corewidth".into()])
            .unwrap_err();
        assert!(err.to_string().contains("expects 1 argument"));
    }

    #[test]
    fn script_reports_failing_line() {
        let mut design = Design::new();
        let script = "# comment\n\nset_top missing_module\n";
        let err = run_script(&registry(), &mut design, script).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn script_runs_passes_in_order() {
        let mut design = Design::new();
        design.module_lib.create("top").unwrap();
        let script = "set_top top\nfloorplan -corewidth 10000 -coreheight 2000 -mincellsize 200 2000\n";
        run_script(&registry(), &mut design, script).unwrap();
        assert!(design.top_module().is_some());
        assert_eq!(design.floorplan.rows.len(), 1);
    }

    #[test]
    fn registry_lists_passes() {
        let names: Vec<&str> = registry().list().map(|(n, _)| n).collect();
        assert!(names.contains(&"place"));
        assert!(names.contains(&"read_lef"));
        assert!(names.contains(&"write_def"));
    }
}
