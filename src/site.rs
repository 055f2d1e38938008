use serde::{Deserialize, Serialize};

/// A 3-D point in scene coordinates (meters).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Point3 { x, y, z }
    }

    pub fn distance_to(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// A candidate mounting location for a base station, extracted from the
/// scene. Immutable once extracted; the search only ever reads sites.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Id of the source building.
    pub id: String,
    /// Reference point on the building (footprint centroid at roof height).
    pub position: Point3,
    /// Building height in meters.
    pub height: f64,
}

impl Site {
    pub fn new(id: impl Into<String>, position: Point3, height: f64) -> Self {
        Site {
            id: id.into(),
            position,
            height,
        }
    }
}
