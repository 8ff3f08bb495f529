//! Recursive-bisection quadratic placer.
//!
//! Each placement region contributes one symmetric positive definite system
//! per axis: every net pin pair adds weight `1/(k−1)` between its gates,
//! fixed and out-of-region neighbors are clamped onto the region boundary
//! and anchor the right-hand side (pseudo-terminals). After solving, the
//! region is cut in two - vertically on even levels, horizontally on odd -
//! and the sorted member list is split at its midpoint. The queue is
//! strictly FIFO, so runs are reproducible decision for decision.

use crate::legalizer::Legalizer;
use crate::snapshot::{GateId, PlacerNetlist};
use crate::tools;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;
use strata_algebra::{solve, JacobiPreconditioner, SolveInfo, SolveStatus, SolverOptions, SparseMatrix};
use strata_common::{Coord64, Rect64, StrataError, StrataResult};
use strata_db::{Design, InstanceType, PlacementStatus};

/// Single-precision working position used during global placement.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointF {
    /// x in nm.
    pub x: f32,
    /// y in nm.
    pub y: f32,
}

impl PointF {
    /// Truncates to integer nanometers.
    pub fn to_coord64(self) -> Coord64 {
        Coord64::new(self.x as i64, self.y as i64)
    }
}

impl From<Coord64> for PointF {
    fn from(c: Coord64) -> Self {
        Self {
            x: c.x as f32,
            y: c.y as f32,
        }
    }
}

impl fmt::Display for PointF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Quadratic net model used to build the placement systems.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NetModel {
    /// Every pin pair of a net gets weight `1/(k−1)`.
    #[default]
    Clique,
    /// Per axis, the two extremal pins connect to each other and every
    /// interior pin connects to both extremes, weight `1/(k−1)`.
    BoundToBound,
}

/// Placer tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct PlacerOptions {
    /// Maximum number of bisection levels.
    pub max_levels: usize,
    /// Regions with fewer members than this are not subdivided.
    pub min_region_instances: usize,
    /// Net model selection.
    pub net_model: NetModel,
    /// Solver settings shared by all regions.
    pub solver: SolverOptions,
}

impl Default for PlacerOptions {
    fn default() -> Self {
        Self {
            max_levels: 6,
            min_region_instances: 20,
            net_model: NetModel::Clique,
            solver: SolverOptions::default(),
        }
    }
}

/// A subdivision work item: a rectangle and the gates assigned to it.
#[derive(Debug, Clone)]
struct PlacementRegion {
    rect: Rect64,
    level: usize,
    members: Vec<GateId>,
}

impl PlacementRegion {
    /// Half-open containment test against the integer region rectangle.
    fn contains(&self, p: PointF) -> bool {
        p.x >= self.rect.ll.x as f32
            && p.x < self.rect.ur.x as f32
            && p.y >= self.rect.ll.y as f32
            && p.y < self.rect.ur.y as f32
    }

    /// Clamps a point onto the region rectangle (boundary inclusive).
    ///
    /// This is the pseudo-terminal propagation: out-of-region anchors act
    /// from the nearest boundary point.
    fn clamp(&self, p: PointF) -> PointF {
        PointF {
            x: p.x.clamp(self.rect.ll.x as f32, self.rect.ur.x as f32),
            y: p.y.clamp(self.rect.ll.y as f32, self.rect.ur.y as f32),
        }
    }
}

/// The recursive-bisection quadratic placer.
#[derive(Debug, Default)]
pub struct Placer {
    options: PlacerOptions,
}

impl Placer {
    /// Creates a placer with the given options.
    pub fn new(options: PlacerOptions) -> Self {
        Self { options }
    }

    /// Places the movable instances of the design's top netlist and runs
    /// the row legalizer on the result.
    ///
    /// On any failure the database is left exactly as it was.
    pub fn place(&self, design: &mut Design) -> StrataResult<()> {
        let netlist = design.top_netlist().ok_or_else(|| {
            StrataError::invalid_state("no top module with a netlist has been selected")
        })?;

        if design.floorplan.min_cell_size.is_null_size() {
            return Err(StrataError::invalid_state(
                "minimum cell size has not been defined for the core area",
            ));
        }
        if design.floorplan.rows.is_empty() {
            return Err(StrataError::invalid_state(
                "no rows have been defined in the floorplan",
            ));
        }
        for (_, instance) in netlist.instances.iter() {
            if instance.itype == InstanceType::Pin && !instance.is_fixed() {
                return Err(StrataError::invalid_state(format!(
                    "top-level pin '{}' is not placed and fixed",
                    instance.name
                )));
            }
        }

        let nm2um = 1.0e-3;
        let cell_area_um2 = tools::calc_total_cell_area(design, netlist);
        let core_size = design.floorplan.core_size;
        let region_area_um2 = core_size.x as f64 * nm2um * core_size.y as f64 * nm2um;
        if cell_area_um2 > region_area_um2 {
            return Err(StrataError::OverUtilization {
                cell_area_um2,
                region_area_um2,
            });
        }
        log::info!(
            "core utilization is {:.2} percent",
            100.0 * cell_area_um2 / region_area_um2
        );

        let snapshot = PlacerNetlist::build(design, netlist);
        let core = design.floorplan.core_rect();
        let core_center = PointF::from(core.center());
        let mut positions: Vec<PointF> = snapshot
            .gates
            .iter()
            .map(|g| {
                if g.fixed {
                    PointF::from(g.center)
                } else {
                    core_center
                }
            })
            .collect();

        let mut queue = VecDeque::new();
        queue.push_back(PlacementRegion {
            rect: core,
            level: 0,
            members: snapshot.movable_gates(),
        });
        self.cycle(&snapshot, &mut positions, &mut queue)?;

        // write back: snap to integer nm and mark the instances placed;
        // the previous state is kept so a legalization failure can undo it
        let netlist = design
            .top_netlist_mut()
            .expect("top netlist checked above");
        let mut saved = Vec::new();
        for (gate_id, gate) in snapshot.gates.iter().enumerate() {
            if gate.fixed {
                continue;
            }
            let center = positions[gate_id].to_coord64();
            if let Some(instance) = netlist.instances.get_mut(gate.key) {
                saved.push((gate.key, instance.pos, instance.orientation, instance.status));
                instance.pos =
                    Coord64::new(center.x - gate.size.x / 2, center.y - gate.size.y / 2);
                instance.status = PlacementStatus::Placed;
                log::trace!("ins {} -> pos {},{}", gate.name, instance.pos.x, instance.pos.y);
            }
        }

        log::info!("running row legalizer");
        if let Err(error) = Legalizer::default().legalize(design) {
            let netlist = design
                .top_netlist_mut()
                .expect("top netlist checked above");
            for (key, pos, orientation, status) in saved {
                if let Some(instance) = netlist.instances.get_mut(key) {
                    instance.pos = pos;
                    instance.orientation = orientation;
                    instance.status = status;
                }
            }
            return Err(error);
        }

        let netlist = design.top_netlist().expect("top netlist checked above");
        let hpwl = tools::calc_hpwl(design, netlist);
        log::info!("HPWL = {:.6} *1e6 nm", hpwl / 1.0e6);
        log::info!("placement done");
        Ok(())
    }

    /// Drains the FIFO region queue, placing and subdividing.
    fn cycle(
        &self,
        netlist: &PlacerNetlist,
        positions: &mut Vec<PointF>,
        queue: &mut VecDeque<PlacementRegion>,
    ) -> StrataResult<()> {
        while let Some(region) = queue.pop_front() {
            self.place_region(netlist, &region, positions)?;

            // a 1-member region would split into an empty sibling
            let split_floor = self.options.min_region_instances.max(2);
            if region.level < self.options.max_levels && region.members.len() >= split_floor {
                let (upper, lower) = split_region(region, positions);
                queue.push_back(upper);
                queue.push_back(lower);
            }
        }
        Ok(())
    }

    /// Builds and solves the region's systems, then updates the positions.
    fn place_region(
        &self,
        netlist: &PlacerNetlist,
        region: &PlacementRegion,
        positions: &mut [PointF],
    ) -> StrataResult<()> {
        let n = region.members.len();
        if n == 0 {
            return Ok(());
        }

        let mut gate2row: HashMap<GateId, usize> = HashMap::with_capacity(n);
        for (row, &gate) in region.members.iter().enumerate() {
            gate2row.insert(gate, row);
        }

        let (xs, ys) = match self.options.net_model {
            NetModel::Clique => {
                let (mut a, mut bx, mut by) =
                    build_clique_system(netlist, region, positions, &gate2row);
                anchor_floating_rows(
                    netlist,
                    region,
                    positions,
                    &mut a,
                    &mut bx,
                    Axis::X,
                    Some(by.as_mut_slice()),
                );
                let precond = JacobiPreconditioner::new(&a);
                let opts = self.options.solver;
                let ((xs, info_x), (ys, info_y)) = rayon::join(
                    || run_solve(&a, &bx, &precond, &opts),
                    || run_solve(&a, &by, &precond, &opts),
                );
                check_solve(info_x, "x")?;
                check_solve(info_y, "y")?;
                (xs, ys)
            }
            NetModel::BoundToBound => {
                let (mut ax, mut bx) =
                    build_b2b_system(netlist, region, positions, &gate2row, Axis::X);
                let (mut ay, mut by) =
                    build_b2b_system(netlist, region, positions, &gate2row, Axis::Y);
                anchor_floating_rows(netlist, region, positions, &mut ax, &mut bx, Axis::X, None);
                anchor_floating_rows(netlist, region, positions, &mut ay, &mut by, Axis::Y, None);
                let px = JacobiPreconditioner::new(&ax);
                let py = JacobiPreconditioner::new(&ay);
                let opts = self.options.solver;
                let ((xs, info_x), (ys, info_y)) = rayon::join(
                    || run_solve(&ax, &bx, &px, &opts),
                    || run_solve(&ay, &by, &py, &opts),
                );
                check_solve(info_x, "x")?;
                check_solve(info_y, "y")?;
                (xs, ys)
            }
        };

        let mut fixups = 0usize;
        for (row, &gate) in region.members.iter().enumerate() {
            let mut p = PointF {
                x: xs[row],
                y: ys[row],
            };
            if !region.contains(p) {
                fixups += 1;
                p = region.clamp(p);
            }
            positions[gate] = p;
        }
        if fixups > 0 {
            log::debug!(
                "region level {}: {} of {} solutions clamped to the region boundary",
                region.level,
                fixups,
                n
            );
        }
        Ok(())
    }
}

fn run_solve(
    a: &SparseMatrix,
    b: &[f32],
    precond: &JacobiPreconditioner,
    opts: &SolverOptions,
) -> (Vec<f32>, SolveInfo) {
    let mut x = Vec::new();
    let info = solve(a, b, &mut x, precond, opts);
    (x, info)
}

fn check_solve(info: SolveInfo, axis: &str) -> StrataResult<()> {
    match info.status {
        SolveStatus::Converged => Ok(()),
        SolveStatus::Breakdown => Err(StrataError::NumericFailure(format!(
            "conjugate gradient breakdown in {axis} system after {} iterations",
            info.iterations
        ))),
        SolveStatus::MaxIterations => Err(StrataError::NumericFailure(format!(
            "{axis} system did not converge: residual {} after {} iterations",
            info.residual, info.iterations
        ))),
    }
}

/// Clique model: one pass over the region members, mirroring the star walk
/// of the net connections (each ordered pair contributes once, which sums
/// to the clique Laplacian).
fn build_clique_system(
    netlist: &PlacerNetlist,
    region: &PlacementRegion,
    positions: &[PointF],
    gate2row: &HashMap<GateId, usize>,
) -> (SparseMatrix, Vec<f32>, Vec<f32>) {
    let n = region.members.len();
    let mut a = SparseMatrix::new(n);
    let mut bx = vec![0.0f32; n];
    let mut by = vec![0.0f32; n];

    for (row, &src) in region.members.iter().enumerate() {
        let gate = &netlist.gates[src];
        for pin in &gate.pins {
            if pin.is_pg {
                continue;
            }
            let Some(net_id) = pin.net else {
                log::warn!("net left unconnected on instance {}", gate.name);
                continue;
            };
            let net = &netlist.nets[net_id];
            let degree = net.degree();
            if degree <= 1 {
                log::warn!("net {} has 1 or fewer connections", net.name);
                continue;
            }
            let weight = 1.0f32 / (degree as f32 - 1.0);

            for &dst in &net.connections {
                if dst == src {
                    continue; // skip self references
                }
                a.add(row, row, weight);

                let dst_pos = positions[dst];
                let movable_col = if netlist.gates[dst].fixed {
                    None
                } else if region.contains(dst_pos) {
                    gate2row.get(&dst).copied()
                } else {
                    None
                };
                match movable_col {
                    Some(col) => a.add(row, col, -weight),
                    None => {
                        let anchor = region.clamp(dst_pos);
                        bx[row] += weight * anchor.x;
                        by[row] += weight * anchor.y;
                    }
                }
            }
        }
    }
    (a, bx, by)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn of(self, p: PointF) -> f32 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }
}

/// Bound-to-bound model: per net and axis, the extremal pins connect to
/// each other and every interior pin connects to both extremes.
fn build_b2b_system(
    netlist: &PlacerNetlist,
    region: &PlacementRegion,
    positions: &[PointF],
    gate2row: &HashMap<GateId, usize>,
    axis: Axis,
) -> (SparseMatrix, Vec<f32>) {
    let n = region.members.len();
    let mut a = SparseMatrix::new(n);
    let mut b = vec![0.0f32; n];

    // nets touching the region, in snapshot order
    let mut region_nets: BTreeSet<usize> = BTreeSet::new();
    for &member in &region.members {
        for pin in &netlist.gates[member].pins {
            if pin.is_pg {
                continue;
            }
            if let Some(net_id) = pin.net {
                if netlist.nets[net_id].degree() > 1 {
                    region_nets.insert(net_id);
                }
            }
        }
    }

    let mut apply_edge = |a: &mut SparseMatrix, b: &mut Vec<f32>, g1: GateId, g2: GateId, w: f32| {
        for (p, q) in [(g1, g2), (g2, g1)] {
            let Some(&rp) = gate2row.get(&p) else {
                continue;
            };
            a.add(rp, rp, w);
            match gate2row.get(&q) {
                Some(&rq) => a.add(rp, rq, -w),
                None => {
                    let anchor = region.clamp(positions[q]);
                    b[rp] += w * axis.of(anchor);
                }
            }
        }
    };

    for net_id in region_nets {
        let net = &netlist.nets[net_id];
        let degree = net.degree();
        let weight = 1.0f32 / (degree as f32 - 1.0);

        let mut conns = net.connections.clone();
        conns.sort_by(|&g1, &g2| {
            axis.of(positions[g1])
                .partial_cmp(&axis.of(positions[g2]))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let lo = conns[0];
        let hi = conns[conns.len() - 1];

        if lo != hi {
            apply_edge(&mut a, &mut b, lo, hi, weight);
        }
        for &inner in &conns[1..conns.len() - 1] {
            if inner != lo {
                apply_edge(&mut a, &mut b, lo, inner, weight);
            }
            if inner != hi {
                apply_edge(&mut a, &mut b, hi, inner, weight);
            }
        }
    }
    (a, b)
}

/// Gates without any usable net end up with an all-zero matrix row; anchor
/// them at their current (clamped) position so the system stays positive
/// definite.
///
/// `b` belongs to `axis`; the clique model shares one matrix between both
/// axes and passes the second right-hand side as `b_other`.
fn anchor_floating_rows(
    netlist: &PlacerNetlist,
    region: &PlacementRegion,
    positions: &[PointF],
    a: &mut SparseMatrix,
    b: &mut [f32],
    axis: Axis,
    mut b_other: Option<&mut [f32]>,
) {
    for (row, &gate) in region.members.iter().enumerate() {
        if a.diagonal(row) == 0.0 {
            let anchor = region.clamp(positions[gate]);
            a.add(row, row, 1.0);
            b[row] = axis.of(anchor);
            if let Some(other) = b_other.as_mut() {
                other[row] = anchor.y;
            }
            if axis == Axis::X {
                log::warn!(
                    "instance {} has no connected nets; anchoring in place",
                    netlist.gates[gate].name
                );
            }
        }
    }
}

/// Cuts the region in two and distributes the sorted members at the
/// midpoint. Returns `(upper, lower)` so the caller can push them in the
/// upper-first queue order.
fn split_region(
    region: PlacementRegion,
    positions: &mut [PointF],
) -> (PlacementRegion, PlacementRegion) {
    let vertical = region.level % 2 == 0; // even level: vertical cut line
    let mut members = region.members;

    // stable sort: equal coordinates keep insertion order
    if vertical {
        members.sort_by(|&g1, &g2| {
            positions[g1]
                .x
                .partial_cmp(&positions[g2].x)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    } else {
        members.sort_by(|&g1, &g2| {
            positions[g1]
                .y
                .partial_cmp(&positions[g2].y)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    let center = region.rect.center();
    let (lower_rect, upper_rect) = if vertical {
        (
            Rect64::new(region.rect.ll, Coord64::new(center.x, region.rect.ur.y)),
            Rect64::new(Coord64::new(center.x, region.rect.ll.y), region.rect.ur),
        )
    } else {
        (
            Rect64::new(region.rect.ll, Coord64::new(region.rect.ur.x, center.y)),
            Rect64::new(Coord64::new(region.rect.ll.x, center.y), region.rect.ur),
        )
    };

    let mid = members.len() / 2;
    let upper_members = members.split_off(mid);
    let lower_members = members;

    let lower_center = PointF::from(lower_rect.center());
    for &gate in &lower_members {
        positions[gate] = lower_center;
    }
    let upper_center = PointF::from(upper_rect.center());
    for &gate in &upper_members {
        positions[gate] = upper_center;
    }

    let level = region.level + 1;
    (
        PlacementRegion {
            rect: upper_rect,
            level,
            members: upper_members,
        },
        PlacementRegion {
            rect: lower_rect,
            level,
            members: lower_members,
        },
    )
}
