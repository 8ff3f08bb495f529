//! Technology data: routing layers, sites and the manufacturing grid.

use crate::cell::Symmetry;
use crate::{LayerKey, SiteKey};
use serde::{Deserialize, Serialize};
use strata_common::{Coord64, Named, NamedStore, Size64, StrataResult};

/// LEF layer type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerType {
    /// Unknown layer types map here.
    #[default]
    Undefined,
    /// Routing (metal) layer.
    Routing,
    /// Cut (via) layer.
    Cut,
    /// Masterslice (poly/diffusion) layer.
    Masterslice,
    /// Overlap layer.
    Overlap,
}

/// Preferred routing direction of a layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerDirection {
    /// No preferred direction declared.
    #[default]
    Undefined,
    /// Horizontal tracks.
    Horizontal,
    /// Vertical tracks.
    Vertical,
}

/// One technology layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerInfo {
    /// Layer name.
    pub name: String,
    /// Layer type.
    pub layer_type: LayerType,
    /// Preferred routing direction.
    pub direction: LayerDirection,
    /// Track pitch per axis, nm.
    pub pitch: Coord64,
    /// Track offset per axis, nm; defaults to half the pitch.
    pub offset: Coord64,
    /// Default wire width, nm.
    pub width: i64,
    /// Minimum spacing, nm.
    pub spacing: i64,
    /// Sheet resistance, ohm per square.
    pub resistance: f64,
    /// Area capacitance, library units per square nm.
    pub capacitance: f64,
    /// Edge capacitance.
    pub edge_capacitance: f64,
    /// Layer thickness, nm.
    pub thickness: i64,
    /// Minimum shape area.
    pub min_area: f64,
}

impl LayerInfo {
    /// Creates a named layer with defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Named for LayerInfo {
    fn name(&self) -> &str {
        &self.name
    }
}

/// LEF site class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteClass {
    /// Unknown site classes map here.
    #[default]
    Undefined,
    /// Standard-cell site.
    Core,
    /// IO pad site.
    Pad,
}

/// One placement site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteInfo {
    /// Site name.
    pub name: String,
    /// Site dimensions, nm.
    pub size: Size64,
    /// Site class.
    pub class: SiteClass,
    /// Legal symmetries.
    pub symmetry: Symmetry,
}

impl SiteInfo {
    /// Creates a named site with defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Named for SiteInfo {
    fn name(&self) -> &str {
        &self.name
    }
}

/// The technology library.
#[derive(Debug)]
pub struct TechLib {
    /// Layer store, in LEF declaration order.
    pub layers: NamedStore<LayerKey, LayerInfo>,
    /// Site store.
    pub sites: NamedStore<SiteKey, SiteInfo>,
    /// Manufacturing grid in nm.
    pub manufacturing_grid: i64,
    /// LEF/DEF database units per micron; 0 until a LEF declares it.
    pub database_microns: i64,
}

impl Default for TechLib {
    fn default() -> Self {
        Self {
            layers: NamedStore::new("layer"),
            sites: NamedStore::new("site"),
            manufacturing_grid: 0,
            database_microns: 0,
        }
    }
}

impl TechLib {
    /// Creates an empty technology library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all layers and sites and resets the grid.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.sites.clear();
        self.manufacturing_grid = 0;
        self.database_microns = 0;
    }

    /// Creates a layer, or returns the existing key when the name is taken.
    pub fn create_layer(&mut self, name: &str) -> StrataResult<LayerKey> {
        if let Some(key) = self.layers.key_of(name) {
            return Ok(key);
        }
        self.layers.add(LayerInfo::new(name))
    }

    /// Creates a site, or returns the existing key when the name is taken.
    pub fn create_site(&mut self, name: &str) -> StrataResult<SiteKey> {
        if let Some(key) = self.sites.key_of(name) {
            return Ok(key);
        }
        self.sites.add(SiteInfo::new(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_layer_idempotent() {
        let mut tech = TechLib::new();
        let a = tech.create_layer("metal1").unwrap();
        let b = tech.create_layer("metal1").unwrap();
        assert_eq!(a, b);
        assert_eq!(tech.layers.len(), 1);
    }

    #[test]
    fn layers_iterate_in_declaration_order() {
        let mut tech = TechLib::new();
        tech.create_layer("metal2").unwrap();
        tech.create_layer("metal1").unwrap();
        let names: Vec<&str> = tech.layers.values().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["metal2", "metal1"]);
    }

    #[test]
    fn clear_resets_grid() {
        let mut tech = TechLib::new();
        tech.manufacturing_grid = 5;
        tech.create_site("core").unwrap();
        tech.clear();
        assert_eq!(tech.manufacturing_grid, 0);
        assert!(tech.sites.is_empty());
    }
}
