//! Scene input: building records and candidate extraction.
//!
//! The scene is a read-only collection of building records. The extractor
//! filters it down to eligible rooftop mounting points: buildings above the
//! height threshold whose zoning flags permit equipment, each reduced to a
//! deterministic reference point (footprint centroid at roof height).

use crate::error::{Error, Result};
use crate::site::{Point3, Site};
use bitflags::bitflags;
use log::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;

bitflags! {
    /// Zoning restrictions attached to a building record.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct BuildingFlags: u8 {
        const NONE = 0;
        /// Equipment may not be mounted on this rooftop.
        const NO_MOUNT = 1;
    }
}

impl Serialize for BuildingFlags {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BuildingFlags {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        u8::deserialize(deserializer).map(BuildingFlags::from_bits_truncate)
    }
}

/// A building record from the scene source.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Building {
    pub id: String,
    /// Footprint vertices as (x, y) pairs in scene coordinates.
    pub footprint: Vec<[f64; 2]>,
    /// Height in meters.
    pub height: f64,
    #[serde(default)]
    pub flags: BuildingFlags,
}

impl Building {
    /// Deterministic reference point: footprint centroid at roof height.
    /// Returns `None` for a building without footprint geometry.
    pub fn roof_centroid(&self) -> Option<Point3> {
        if self.footprint.is_empty() {
            return None;
        }
        let n = self.footprint.len() as f64;
        let sum_x: f64 = self.footprint.iter().map(|v| v[0]).sum();
        let sum_y: f64 = self.footprint.iter().map(|v| v[1]).sum();
        Some(Point3::new(sum_x / n, sum_y / n, self.height))
    }
}

/// Trait for providing building data to the extractor.
/// Implementations exist for scene files and in-memory fixtures.
pub trait SceneSource {
    fn buildings(&self) -> &[Building];
}

impl SceneSource for Vec<Building> {
    fn buildings(&self) -> &[Building] {
        self
    }
}

/// A scene loaded from a JSON building dump.
pub struct SceneFile {
    buildings: Vec<Building>,
}

impl SceneFile {
    /// Load a scene from a JSON array of building records.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let buildings: Vec<Building> = serde_json::from_str(&content)
            .map_err(|e| Error::Scene(format!("failed to parse scene: {e}")))?;
        debug!(
            "loaded {} buildings from {}",
            buildings.len(),
            path.as_ref().display()
        );
        Ok(SceneFile { buildings })
    }
}

impl SceneSource for SceneFile {
    fn buildings(&self) -> &[Building] {
        &self.buildings
    }
}

/// Filter the scene down to eligible mounting points.
///
/// Keeps buildings strictly taller than `height_threshold` whose flags
/// permit mounting. Output order preserves source order; that order is also
/// the tie-break order for the search, so it must stay stable.
pub fn extract_candidates(source: &dyn SceneSource, height_threshold: f64) -> Result<Vec<Site>> {
    let buildings = source.buildings();
    let mut sites = Vec::new();

    for building in buildings {
        if building.height <= height_threshold {
            continue;
        }
        if building.flags.contains(BuildingFlags::NO_MOUNT) {
            trace!("building '{}' excluded by zoning flags", building.id);
            continue;
        }
        match building.roof_centroid() {
            Some(position) => {
                sites.push(Site::new(building.id.clone(), position, building.height))
            }
            None => warn!("building '{}' has no footprint, skipping", building.id),
        }
    }

    if sites.is_empty() {
        return Err(Error::NoCandidates);
    }

    debug!(
        "extracted {} candidate sites from {} buildings (threshold {} m)",
        sites.len(),
        buildings.len(),
        height_threshold
    );
    Ok(sites)
}
