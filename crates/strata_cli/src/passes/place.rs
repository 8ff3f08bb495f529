//! The placement pass: quadratic global placement plus legalization, or
//! manual placement of a single instance.

use super::{ParamDef, Params, Pass};
use crate::config::StrataConfig;
use strata_common::{Coord64, StrataError, StrataResult};
use strata_db::{Design, PlacementStatus};
use strata_place::{NetModel, Placer, PlacerOptions};

/// `place [-maxlevels n] [-mininstances n] [-netmodel m]` or
/// `place -ins <name> <x> <y> [-fix]`.
pub struct PlacePass {
    defaults: PlacerOptions,
}

impl PlacePass {
    /// Builds the pass with defaults taken from `strata.toml`.
    pub fn from_config(config: &StrataConfig) -> StrataResult<Self> {
        let mut defaults = PlacerOptions::default();
        if let Some(levels) = config.place.max_levels {
            defaults.max_levels = levels;
        }
        if let Some(min) = config.place.min_instances {
            defaults.min_region_instances = min;
        }
        defaults.net_model = config.net_model()?;
        Ok(Self { defaults })
    }

    fn place_instance(&self, design: &mut Design, params: &Params) -> StrataResult<()> {
        let values = params.named("ins").expect("checked by caller");
        let name = &values[0];
        let parse = |text: &String| {
            text.parse::<i64>().map_err(|_| {
                StrataError::invalid_state(format!("cannot parse coordinate '{text}'"))
            })
        };
        let x = parse(&values[1])?;
        let y = parse(&values[2])?;
        let fixed = params.has("fix");

        let netlist = design.top_netlist_mut().ok_or_else(|| {
            StrataError::invalid_state("no top module with a netlist has been selected")
        })?;
        let Some((_, instance)) = netlist.instances.find_by_name_mut(name) else {
            return Err(StrataError::NotFound {
                kind: "instance",
                name: name.clone(),
            });
        };
        instance.pos = Coord64::new(x, y);
        instance.status = if fixed {
            PlacementStatus::PlacedAndFixed
        } else {
            PlacementStatus::Placed
        };
        Ok(())
    }
}

impl Pass for PlacePass {
    fn name(&self) -> &'static str {
        "place"
    }

    fn short_help(&self) -> &'static str {
        "place the top module (or a single instance with -ins)"
    }

    fn help(&self) -> String {
        "place - quadratic placement and row legalization\n  Options:\n\
         \x20   -maxlevels <n>      : maximum bisection depth\n\
         \x20   -mininstances <n>   : stop subdividing below this region size\n\
         \x20   -netmodel <m>       : 'clique' or 'b2b'\n\
         \x20   -ins <name> <x> <y> : place one instance at a position instead\n\
         \x20   -fix                : with -ins, pin the instance down\n"
            .into()
    }

    fn param_defs(&self) -> &'static [ParamDef] {
        const PARAMS: &[ParamDef] = &[
            ParamDef::new("maxlevels", 1, false),
            ParamDef::new("mininstances", 1, false),
            ParamDef::new("netmodel", 1, false),
            ParamDef::new("ins", 3, false),
            ParamDef::new("fix", 0, false),
        ];
        PARAMS
    }

    fn execute(&self, design: &mut Design, params: &Params) -> StrataResult<()> {
        if params.has("ins") {
            return self.place_instance(design, params);
        }

        let mut options = self.defaults;
        if let Some(levels) = params.parse::<usize>("maxlevels")? {
            options.max_levels = levels;
        }
        if let Some(min) = params.parse::<usize>("mininstances")? {
            options.min_region_instances = min;
        }
        match params.value("netmodel") {
            None => {}
            Some("clique") => options.net_model = NetModel::Clique,
            Some("b2b") => options.net_model = NetModel::BoundToBound,
            Some(other) => {
                return Err(StrataError::invalid_state(format!(
                    "unknown net model '{other}' (expected 'clique' or 'b2b')"
                )))
            }
        }

        Placer::new(options).place(design)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::PassRegistry;
    use strata_db::{Archetype, Instance, InstanceType};

    fn design_with_instance() -> Design {
        let mut design = Design::new();
        let cell = design.cell_lib.create("INV_X1").unwrap();
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

    fn run(design: &mut Design, args: &[&str]) -> StrataResult<()> {
        let registry = PassRegistry::with_default_passes(&StrataConfig::default()).unwrap();
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        registry.run(design, "place", &args)
    }

    #[test]
    fn manual_instance_placement() {
        let mut design = design_with_instance();
        run(&mut design, &["-ins", "u1", "500", "700"]).unwrap();
        let (_, u1) = design.top_netlist().unwrap().instances.find_by_name("u1").unwrap();
        assert_eq!(u1.pos, Coord64::new(500, 700));
        assert_eq!(u1.status, PlacementStatus::Placed);
    }

    #[test]
    fn manual_fixed_placement() {
        let mut design = design_with_instance();
        run(&mut design, &["-ins", "u1", "0", "0", "-fix"]).unwrap();
        let (_, u1) = design.top_netlist().unwrap().instances.find_by_name("u1").unwrap();
        assert!(u1.is_fixed());
    }

    #[test]
    fn missing_instance_reported() {
        let mut design = design_with_instance();
        let err = run(&mut design, &["-ins", "ghost", "0", "0"]).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn global_place_requires_floorplan() {
        let mut design = design_with_instance();
        let err = run(&mut design, &[]).unwrap_err();
        assert!(err.to_string().contains("minimum cell size"));
    }

    #[test]
    fn bad_net_model_rejected() {
        let mut design = design_with_instance();
        let err = run(&mut design, &["-netmodel", "anneal"]).unwrap_err();
        assert!(err.to_string().contains("anneal"));
    }
}
