//! Floorplan: die and core geometry, placement rows and regions.

use serde::{Deserialize, Serialize};
use strata_common::{Coord64, Margins64, Named, Rect64, Size64, StrataError, StrataResult};

/// Whether a row's cells stand upright or are flipped about the x axis.
///
/// Adjacent rows usually alternate so that power rails can be shared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowType {
    /// Upright row; cells placed with orientation `R0`.
    #[default]
    Normal,
    /// Flipped row; cells placed with orientation `MX`.
    FlipY,
}

/// One placement row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Row flavor.
    pub row_type: RowType,
    /// Row rectangle in absolute core coordinates, nm.
    pub rect: Rect64,
}

/// A named sub-area of the core with its own rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Region {
    /// Region name.
    pub name: String,
    /// Region rectangle including the halo, nm.
    pub rect: Rect64,
    /// Keep-out halo inside the rectangle.
    pub halo: Margins64,
    /// Site minimum cell size for this region, nm.
    pub min_cell_size: Size64,
    /// Rows inside the placement rectangle, bottom-up.
    pub rows: Vec<Row>,
}

impl Region {
    /// The area cells may occupy: the rectangle contracted by the halo.
    pub fn placement_rect(&self) -> Rect64 {
        self.rect.contracted(self.halo)
    }

    /// Size of the placement rectangle.
    pub fn placement_size(&self) -> Size64 {
        self.placement_rect().size()
    }
}

impl Named for Region {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Creates a region and fills it with rows.
///
/// Rows are stacked bottom-up inside the placement rectangle; each row is
/// one minimum-cell-height tall and its width is rounded down to a whole
/// number of minimum cell widths. Row types alternate starting with
/// [`RowType::Normal`].
pub fn create_region(
    name: &str,
    rect_including_halo: Rect64,
    min_cell_size: Size64,
    halo: Option<Margins64>,
) -> StrataResult<Region> {
    if min_cell_size.x <= 0 || min_cell_size.y <= 0 {
        return Err(StrataError::invalid_state(
            "region minimum cell size has not been defined",
        ));
    }
    let mut region = Region {
        name: name.to_owned(),
        rect: rect_including_halo,
        halo: halo.unwrap_or_default(),
        min_cell_size,
        rows: Vec::new(),
    };
    let placement = region.placement_rect();
    region.rows = build_rows(placement, min_cell_size);
    log::trace!(
        "create_region: {} x {} - {} rows",
        region.rect.width(),
        region.rect.height(),
        region.rows.len()
    );
    Ok(region)
}

fn build_rows(area: Rect64, min_cell_size: Size64) -> Vec<Row> {
    let row_height = min_cell_size.y;
    let row_count = area.height() / row_height;
    let row_width = min_cell_size.x * (area.width() / min_cell_size.x);
    let mut rows = Vec::with_capacity(row_count as usize);
    let mut bottom = area.bottom();
    for i in 0..row_count {
        let row_type = if i % 2 == 0 {
            RowType::Normal
        } else {
            RowType::FlipY
        };
        rows.push(Row {
            row_type,
            rect: Rect64::new(
                Coord64::new(area.left(), bottom),
                Coord64::new(area.left() + row_width, bottom + row_height),
            ),
        });
        bottom += row_height;
    }
    rows
}

/// Die-level floorplan: core size, IO margins and the core placement rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Floorplan {
    /// Core area size, nm.
    pub core_size: Size64,
    /// Margins between the IO ring and the core.
    pub io2core_margins: Margins64,
    /// Size of the IO area on each die edge.
    pub io_margins: Margins64,
    /// Minimum cell (site) size; must be set before rows can be created.
    pub min_cell_size: Size64,
    /// Size of an IO corner cell.
    pub corner_cell_size: Size64,
    /// Core placement rows, bottom-up.
    pub rows: Vec<Row>,
}

impl Floorplan {
    /// Creates an empty floorplan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the floorplan to its empty state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The core rectangle in die coordinates.
    pub fn core_rect(&self) -> Rect64 {
        let ll = Coord64::new(
            self.io_margins.left + self.io2core_margins.left,
            self.io_margins.bottom + self.io2core_margins.bottom,
        );
        Rect64::new(ll, ll + self.core_size)
    }

    /// The full die size: core plus both margin rings.
    pub fn die_size(&self) -> Size64 {
        Size64::new(
            self.core_size.x
                + self.io2core_margins.left
                + self.io2core_margins.right
                + self.io_margins.left
                + self.io_margins.right,
            self.core_size.y
                + self.io2core_margins.top
                + self.io2core_margins.bottom
                + self.io_margins.top
                + self.io_margins.bottom,
        )
    }

    /// Fills the row list from the core rectangle and the minimum cell size.
    ///
    /// Fails when the minimum cell size is unset.
    pub fn create_rows(&mut self) -> StrataResult<()> {
        if self.min_cell_size.x <= 0 || self.min_cell_size.y <= 0 {
            return Err(StrataError::invalid_state(
                "minimum cell size has not been defined for the core area",
            ));
        }
        self.rows = build_rows(self.core_rect(), self.min_cell_size);
        Ok(())
    }
}
