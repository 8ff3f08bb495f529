//! Floorplan creation pass.

use super::{ParamDef, Params, Pass};
use strata_common::{Margins64, Size64, StrataError, StrataResult};
use strata_db::{Design, SiteClass};

/// `floorplan -corewidth n -coreheight n [options]` - define the die and
/// create the placement rows.
pub struct FloorplanPass;

impl FloorplanPass {
    fn margins(params: &Params, name: &str) -> StrataResult<Option<Margins64>> {
        let Some(values) = params.named(name) else {
            return Ok(None);
        };
        let parse = |text: &str| {
            text.parse::<i64>().map_err(|_| {
                StrataError::invalid_state(format!("cannot parse -{name} value '{text}'"))
            })
        };
        // declared order: left right top bottom
        let left = parse(&values[0])?;
        let right = parse(&values[1])?;
        let top = parse(&values[2])?;
        let bottom = parse(&values[3])?;
        Ok(Some(Margins64::new(top, bottom, left, right)))
    }
}

impl Pass for FloorplanPass {
    fn name(&self) -> &'static str {
        "floorplan"
    }

    fn short_help(&self) -> &'static str {
        "create a floorplan and its placement rows"
    }

    fn help(&self) -> String {
        "floorplan - create a floorplan\n  Options:\n\
         \x20   -corewidth   : width of the core in nm                 [required]\n\
         \x20   -coreheight  : height of the core in nm                [required]\n\
         \x20   -coremargins : <left> <right> <top> <bottom> margins between core and IO, nm\n\
         \x20   -iomargins   : <left> <right> <top> <bottom> IO ring size, nm\n\
         \x20   -mincellsize : <width> <height> site size, nm (default: first CORE site)\n\
         \x20   -cornersize  : IO corner cell dimension, nm\n"
            .into()
    }

    fn param_defs(&self) -> &'static [ParamDef] {
        const PARAMS: &[ParamDef] = &[
            ParamDef::new("corewidth", 1, true),
            ParamDef::new("coreheight", 1, true),
            ParamDef::new("coremargins", 4, false),
            ParamDef::new("iomargins", 4, false),
            ParamDef::new("mincellsize", 2, false),
            ParamDef::new("cornersize", 1, false),
        ];
        PARAMS
    }

    fn execute(&self, design: &mut Design, params: &Params) -> StrataResult<()> {
        let width: i64 = params.parse("corewidth")?.expect("required");
        let height: i64 = params.parse("coreheight")?.expect("required");
        design.floorplan.core_size = Size64::new(width, height);

        if let Some(margins) = Self::margins(params, "coremargins")? {
            design.floorplan.io2core_margins = margins;
        }
        if let Some(margins) = Self::margins(params, "iomargins")? {
            design.floorplan.io_margins = margins;
        }
        if let Some(corner) = params.parse::<i64>("cornersize")? {
            design.floorplan.corner_cell_size = Size64::new(corner, corner);
        }

        let min_cell_size = match params.named("mincellsize") {
            Some(values) => {
                let parse = |text: &String| {
                    text.parse::<i64>().map_err(|_| {
                        StrataError::invalid_state(format!(
                            "cannot parse -mincellsize value '{text}'"
                        ))
                    })
                };
                Size64::new(parse(&values[0])?, parse(&values[1])?)
            }
            None => {
                // fall back to the first CORE site from the LEF
                design
                    .tech_lib
                    .sites
                    .values()
                    .find(|site| site.class == SiteClass::Core)
                    .map(|site| site.size)
                    .ok_or_else(|| {
                        StrataError::invalid_state(
                            "no -mincellsize given and no CORE site in the technology library",
                        )
                    })?
            }
        };
        design.floorplan.min_cell_size = min_cell_size;
        design.floorplan.create_rows()?;

        log::info!(
            "floorplan: core {}x{} nm, die {}x{} nm, {} rows",
            width,
            height,
            design.floorplan.die_size().x,
            design.floorplan.die_size().y,
            design.floorplan.rows.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrataConfig;
    use crate::passes::PassRegistry;

    fn run(design: &mut Design, args: &[&str]) -> StrataResult<()> {
        let registry = PassRegistry::with_default_passes(&StrataConfig::default()).unwrap();
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        registry.run(design, "floorplan", &args)
    }

    #[test]
    fn creates_rows_from_explicit_cell_size() {
        let mut design = Design::new();
        run(
            &mut design,
            &["-corewidth", "10000", "-coreheight", "6000", "-mincellsize", "200", "2000"],
        )
        .unwrap();
        assert_eq!(design.floorplan.rows.len(), 3);
        assert_eq!(design.floorplan.core_size, Size64::new(10000, 6000));
    }

    #[test]
    fn uses_core_site_when_no_cell_size_given() {
        let mut design = Design::new();
        let site = design.tech_lib.create_site("core").unwrap();
        {
            let site = design.tech_lib.sites.get_mut(site).unwrap();
            site.class = SiteClass::Core;
            site.size = Size64::new(200, 2000);
        }
        run(&mut design, &["-corewidth", "2000", "-coreheight", "4000"]).unwrap();
        assert_eq!(design.floorplan.min_cell_size, Size64::new(200, 2000));
        assert_eq!(design.floorplan.rows.len(), 2);
    }

    #[test]
    fn fails_without_site_or_cell_size() {
        let mut design = Design::new();
        let err = run(&mut design, &["-corewidth", "2000", "-coreheight", "4000"]).unwrap_err();
        assert!(err.to_string().contains("CORE site"));
    }

    #[test]
    fn margins_offset_the_core() {
        let mut design = Design::new();
        run(
            &mut design,
            &[
                "-corewidth", "2000", "-coreheight", "4000",
                "-coremargins", "100", "100", "50", "50",
                "-iomargins", "500", "500", "500", "500",
                "-mincellsize", "200", "2000",
            ],
        )
        .unwrap();
        let core = design.floorplan.core_rect();
        assert_eq!(core.left(), 600);
        assert_eq!(core.bottom(), 550);
        assert_eq!(design.floorplan.rows[0].rect.left(), 600);
    }
}
