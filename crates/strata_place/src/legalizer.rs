//! Abacus-style row legalizer.
//!
//! Takes the placed, movable instances and produces non-overlapping,
//! site-aligned positions. Cells are processed in ascending global-x order;
//! within a row, adjacent cells coalesce into clusters whose optimal
//! position minimizes the weighted quadratic displacement, collapsing and
//! merging until no clusters overlap. The outer loop tries every row for
//! each cell and commits to the cheapest.

use strata_common::{Coord64, Orientation, Rect64, Size64, StrataError, StrataResult};
use strata_db::{Design, InstanceKey, PlacementStatus, RowType};

/// A movable cell as the legalizer sees it.
#[derive(Debug, Clone)]
pub struct LegalCell {
    /// The database instance behind this cell.
    pub instance: InstanceKey,
    /// Instance name for diagnostics.
    pub name: String,
    /// Pre-legalization lower-left position, nm.
    pub global_pos: Coord64,
    /// Cell size, nm.
    pub size: Size64,
    /// Displacement weight.
    pub weight: f64,
    /// Legalized lower-left position (output).
    pub legal_pos: Coord64,
    /// Legalized orientation (output).
    pub orientation: Orientation,
}

/// A maximal run of abutting cells within one row.
///
/// `q / weight` is the optimal left edge of the cluster for weighted
/// quadratic displacement; the update rules keep it incremental.
#[derive(Debug, Clone, Default)]
struct Cluster {
    first_cell: usize,
    last_cell: usize,
    weight: f64,
    width: i64,
    q: f64,
    x_left: i64,
}

impl Cluster {
    fn start(x_left: i64, first_cell: usize) -> Self {
        Self {
            first_cell,
            last_cell: first_cell,
            x_left,
            ..Default::default()
        }
    }

    fn add_cell(&mut self, cell_x: i64, cell: &LegalCell, cell_idx: usize) {
        self.last_cell = cell_idx;
        self.weight += cell.weight;
        self.q += cell.weight * (cell_x as f64 - self.width as f64);
        self.width += cell.size.x;
    }

    fn add_cluster(&mut self, other: &Cluster) {
        self.last_cell = other.last_cell;
        self.q += other.q - other.weight * self.width as f64;
        self.weight += other.weight;
        self.width += other.width;
    }

    fn optimal_position(&self) -> f64 {
        debug_assert!(self.weight > 0.0);
        self.q / self.weight
    }

    fn right_edge(&self) -> i64 {
        self.x_left + self.width
    }
}

/// One legalizer row: the floorplan row rectangle plus the cells assigned
/// to it, in ascending global-x order.
#[derive(Debug, Clone)]
pub struct LegalRow {
    /// Row rectangle in core coordinates, nm.
    pub rect: Rect64,
    /// Row flavor, deciding the cell orientation.
    pub row_type: RowType,
    /// Indices into the legalizer's cell array, ascending global x.
    pub cells: Vec<usize>,
}

impl LegalRow {
    /// Creates an empty row over the given rectangle.
    pub fn new(rect: Rect64, row_type: RowType) -> Self {
        Self {
            rect,
            row_type,
            cells: Vec::new(),
        }
    }

    fn insert_cell(&mut self, cell_idx: usize) {
        self.cells.push(cell_idx);
    }

    fn remove_last_cell(&mut self) {
        self.cells.pop();
    }
}

fn round_to_nearest_site(pos: i64, site_width: i64) -> i64 {
    // truncating division, matching the row grid the floorplan builds
    (pos + site_width / 2) / site_width * site_width
}

fn round_down_to_site(pos: i64, site_width: i64) -> i64 {
    pos / site_width * site_width
}

/// The row legalizer.
#[derive(Debug, Default)]
pub struct Legalizer;

impl Legalizer {
    /// Legalizes all movable placed instances of the design's top netlist.
    ///
    /// On success every such instance sits on a row, site-aligned, without
    /// overlaps. When a cell cannot be fitted into any row the database is
    /// left untouched and [`StrataError::LegalizationFailed`] names it.
    pub fn legalize(&self, design: &mut Design) -> StrataResult<()> {
        let min_cell_width = design.floorplan.min_cell_size.x;
        if min_cell_width <= 0 {
            return Err(StrataError::invalid_state(
                "minimum cell width has not been defined for the core area",
            ));
        }
        if design.floorplan.rows.is_empty() {
            return Err(StrataError::invalid_state(
                "no rows have been defined in the floorplan",
            ));
        }

        let netlist = design.top_netlist().ok_or_else(|| {
            StrataError::invalid_state("no top module with a netlist has been selected")
        })?;

        // gather the movable placed instances
        let mut cells: Vec<LegalCell> = Vec::new();
        for (key, instance) in netlist.instances.iter() {
            if instance.status == PlacementStatus::Placed {
                cells.push(LegalCell {
                    instance: key,
                    name: instance.name.clone(),
                    global_pos: instance.pos,
                    size: design.archetype_size(instance),
                    weight: 1.0,
                    legal_pos: Coord64::default(),
                    orientation: Orientation::R0,
                });
            }
        }

        // ascending global x; the stable sort keeps insertion order on ties
        cells.sort_by_key(|c| c.global_pos.x);

        let mut rows: Vec<LegalRow> = design
            .floorplan
            .rows
            .iter()
            .map(|row| LegalRow::new(row.rect, row.row_type))
            .collect();

        // best-row scan: trial-place the cell in every row, keep the cheapest
        for cell_idx in 0..cells.len() {
            let mut best_cost: Option<f64> = None;
            let mut best_row = 0usize;
            for row_idx in 0..rows.len() {
                rows[row_idx].insert_cell(cell_idx);
                place_row(&mut cells, &rows[row_idx], min_cell_width);
                let cost = calc_row_cost(&cells, &rows[row_idx]);
                if let Some(cost) = cost {
                    if best_cost.map_or(true, |best| cost < best) {
                        best_cost = Some(cost);
                        best_row = row_idx;
                    }
                }
                rows[row_idx].remove_last_cell();
            }
            rows[best_row].insert_cell(cell_idx);
            place_row(&mut cells, &rows[best_row], min_cell_width);
        }

        // drop the last trial's leftovers before writing anything back
        for row in &rows {
            place_row(&mut cells, row, min_cell_width);
        }

        for row in &rows {
            for &cell_idx in &row.cells {
                let cell = &cells[cell_idx];
                if cell.legal_pos.x < row.rect.left()
                    || cell.legal_pos.x + cell.size.x > row.rect.right()
                {
                    return Err(StrataError::LegalizationFailed {
                        instance: cell.name.clone(),
                    });
                }
            }
        }

        let netlist = design
            .top_netlist_mut()
            .expect("top netlist checked above");
        for cell in &cells {
            if let Some(instance) = netlist.instances.get_mut(cell.instance) {
                instance.pos = cell.legal_pos;
                instance.orientation = cell.orientation;
            }
        }
        Ok(())
    }
}

/// Places one row's cells with cluster collapse.
pub fn place_row(cells: &mut [LegalCell], row: &LegalRow, min_cell_width: i64) {
    let mut clusters: Vec<Cluster> = Vec::new();

    for (list_idx, &cell_idx) in row.cells.iter().enumerate() {
        let cell = &cells[cell_idx];

        // round the global position onto the site grid; rounding may land
        // at or past the right row edge, then round down instead
        let mut cell_x = row.rect.left()
            + round_to_nearest_site(cell.global_pos.x - row.rect.left(), min_cell_width);
        if cell_x >= row.rect.right() {
            cell_x = row.rect.left()
                + round_down_to_site(cell.global_pos.x - row.rect.left(), min_cell_width);
        }

        let overlaps = clusters
            .last()
            .map(|last| last.right_edge() > cell_x)
            .unwrap_or(false);
        if overlaps {
            let last = clusters.last_mut().expect("overlap implies non-empty");
            last.add_cell(cell_x, cell, list_idx);
            collapse(&mut clusters, row, min_cell_width);
        } else {
            let mut cluster = Cluster::start(cell_x, list_idx);
            cluster.add_cell(cell_x, cell, list_idx);
            clusters.push(cluster);
        }
    }

    // walk the clusters and assign final positions, zero gap within a cluster
    for cluster in &clusters {
        let mut x = cluster.x_left.max(row.rect.left());
        for idx in cluster.first_cell..=cluster.last_cell {
            let cell = &mut cells[row.cells[idx]];
            cell.legal_pos = Coord64::new(x, row.rect.bottom());
            cell.orientation = match row.row_type {
                RowType::FlipY => Orientation::MX,
                RowType::Normal => Orientation::R0,
            };
            x += cell.size.x;
        }
    }
}

/// Collapses the last cluster: move it to its clamped optimal position and
/// merge backwards while it overlaps its predecessor.
fn collapse(clusters: &mut Vec<Cluster>, row: &LegalRow, min_cell_width: i64) {
    loop {
        let count = clusters.len();
        let cluster = &mut clusters[count - 1];

        let optimal = cluster.optimal_position();
        let mut x = row.rect.left()
            + round_to_nearest_site(optimal as i64 - row.rect.left(), min_cell_width);
        x = x.max(row.rect.left());
        x = x.min(row.rect.right() - cluster.width);
        cluster.x_left = x;

        if count >= 2 && clusters[count - 2].right_edge() > x {
            let merged = clusters.pop().expect("count >= 2");
            clusters
                .last_mut()
                .expect("count >= 2")
                .add_cluster(&merged);
            continue;
        }
        break;
    }
}

/// Weighted L1 displacement of the row's cells, or `None` when any cell
/// sticks out of the row horizontally (the row is infeasible for this
/// assignment).
pub fn calc_row_cost(cells: &[LegalCell], row: &LegalRow) -> Option<f64> {
    let mut cost = 0.0;
    for &cell_idx in &row.cells {
        let cell = &cells[cell_idx];
        cost += cell.weight * (cell.legal_pos.x - cell.global_pos.x).abs() as f64;
        cost += cell.weight * (cell.legal_pos.y - cell.global_pos.y).abs() as f64;

        let left_edge = cell.legal_pos.x;
        let right_edge = cell.legal_pos.x + cell.size.x;
        if right_edge > row.rect.right() || left_edge < row.rect.left() {
            return None;
        }
    }
    Some(cost)
}
