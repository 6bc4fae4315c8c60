//! Pure geometric containment checks for the boundary validator.
//!
//! An area's authorized region is either an axis-aligned box or a vertical
//! prism over a polygon footprint (x/z plan coordinates, y up). Checks are
//! deterministic and side-effect free; the server re-runs them at merge
//! time, so any client-side validation is advisory only.

use serde::{Deserialize, Serialize};

/// A point in mall space. y is the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl std::fmt::Display for Point3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A point in the floor plan (ground plane).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanPoint {
    pub x: f64,
    pub z: f64,
}

/// An axis-aligned bounding box. `min` must be component-wise <= `max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3,
    pub max: Point3,
}

impl BoundingBox {
    /// Whether a point lies inside (boundary inclusive).
    pub fn contains(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// The eight corner points.
    pub fn corners(&self) -> [Point3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Point3 { x: lo.x, y: lo.y, z: lo.z },
            Point3 { x: hi.x, y: lo.y, z: lo.z },
            Point3 { x: lo.x, y: hi.y, z: lo.z },
            Point3 { x: hi.x, y: hi.y, z: lo.z },
            Point3 { x: lo.x, y: lo.y, z: hi.z },
            Point3 { x: hi.x, y: lo.y, z: hi.z },
            Point3 { x: lo.x, y: hi.y, z: hi.z },
            Point3 { x: hi.x, y: hi.y, z: hi.z },
        ]
    }
}

/// The authorized region attached to an area.
///
/// Serialized into the area's `geometry` JSONB column, e.g.
/// `{"kind": "box", "min": {...}, "max": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionGeometry {
    Box {
        min: Point3,
        max: Point3,
    },
    /// A vertical prism: the polygon footprint extruded from `min_y` to
    /// `max_y`.
    Polygon {
        vertices: Vec<PlanPoint>,
        min_y: f64,
        max_y: f64,
    },
}

impl RegionGeometry {
    /// Whether a point lies inside the region (boundary inclusive for
    /// boxes; polygon edges follow the even-odd rule).
    pub fn contains_point(&self, p: &Point3) -> bool {
        match self {
            RegionGeometry::Box { min, max } => {
                BoundingBox { min: *min, max: *max }.contains(p)
            }
            RegionGeometry::Polygon {
                vertices,
                min_y,
                max_y,
            } => p.y >= *min_y && p.y <= *max_y && point_in_polygon(vertices, p.x, p.z),
        }
    }

    /// Whether an entire bounding box lies inside the region, decided by
    /// checking every corner.
    pub fn contains_box(&self, b: &BoundingBox) -> bool {
        b.corners().iter().all(|c| self.contains_point(c))
    }
}

/// Even-odd ray casting over the plan footprint.
fn point_in_polygon(vertices: &[PlanPoint], x: f64, z: f64) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (vi, vj) = (vertices[i], vertices[j]);
        if (vi.z > z) != (vj.z > z)
            && x < (vj.x - vi.x) * (z - vi.z) / (vj.z - vi.z) + vi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// A rejected edit: the object escapes its authorized region.
///
/// Carries the first offending corner and the full authorized region so
/// callers can surface precise feedback instead of a bare boolean.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("object corner {offending} lies outside the authorized region")]
pub struct BoundaryViolation {
    pub offending: Point3,
    pub authorized: RegionGeometry,
}

/// Validate that a proposed object placement stays inside the authorized
/// region. Returns the first offending corner on failure.
pub fn validate_edit(
    authorized: &RegionGeometry,
    object: &BoundingBox,
) -> Result<(), BoundaryViolation> {
    for corner in object.corners() {
        if !authorized.contains_point(&corner) {
            return Err(BoundaryViolation {
                offending: corner,
                authorized: authorized.clone(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3 { x, y, z }
    }

    fn unit_region() -> RegionGeometry {
        RegionGeometry::Box {
            min: p(0.0, 0.0, 0.0),
            max: p(20.0, 5.0, 20.0),
        }
    }

    #[test]
    fn box_contains_interior_point() {
        assert!(unit_region().contains_point(&p(10.0, 2.0, 10.0)));
    }

    #[test]
    fn box_boundary_is_inclusive() {
        assert!(unit_region().contains_point(&p(0.0, 0.0, 0.0)));
        assert!(unit_region().contains_point(&p(20.0, 5.0, 20.0)));
    }

    #[test]
    fn box_rejects_escaping_point() {
        assert!(!unit_region().contains_point(&p(25.0, 5.0, 25.0)));
    }

    #[test]
    fn contained_object_passes_validation() {
        let object = BoundingBox {
            min: p(1.0, 0.0, 1.0),
            max: p(3.0, 2.0, 3.0),
        };
        assert!(validate_edit(&unit_region(), &object).is_ok());
    }

    #[test]
    fn escaping_object_reports_offending_corner() {
        let object = BoundingBox {
            min: p(18.0, 0.0, 18.0),
            max: p(25.0, 5.0, 25.0),
        };
        let violation = validate_edit(&unit_region(), &object).unwrap_err();
        // The offending corner must actually be outside the region.
        assert!(!unit_region().contains_point(&violation.offending));
        assert_eq!(violation.authorized, unit_region());
    }

    #[test]
    fn validation_is_deterministic() {
        let object = BoundingBox {
            min: p(18.0, 0.0, 18.0),
            max: p(25.0, 5.0, 25.0),
        };
        let a = validate_edit(&unit_region(), &object);
        let b = validate_edit(&unit_region(), &object);
        assert_eq!(a.unwrap_err(), b.unwrap_err());
    }

    fn l_shape() -> RegionGeometry {
        // L-shaped footprint: a 10x10 square with the top-right 5x5 bite
        // removed.
        RegionGeometry::Polygon {
            vertices: vec![
                PlanPoint { x: 0.0, z: 0.0 },
                PlanPoint { x: 10.0, z: 0.0 },
                PlanPoint { x: 10.0, z: 5.0 },
                PlanPoint { x: 5.0, z: 5.0 },
                PlanPoint { x: 5.0, z: 10.0 },
                PlanPoint { x: 0.0, z: 10.0 },
            ],
            min_y: 0.0,
            max_y: 4.0,
        }
    }

    #[test]
    fn polygon_contains_point_in_each_arm() {
        assert!(l_shape().contains_point(&p(8.0, 1.0, 2.0)));
        assert!(l_shape().contains_point(&p(2.0, 1.0, 8.0)));
    }

    #[test]
    fn polygon_rejects_point_in_the_bite() {
        assert!(!l_shape().contains_point(&p(8.0, 1.0, 8.0)));
    }

    #[test]
    fn polygon_respects_vertical_extent() {
        assert!(!l_shape().contains_point(&p(2.0, 9.0, 2.0)));
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        let degenerate = RegionGeometry::Polygon {
            vertices: vec![PlanPoint { x: 0.0, z: 0.0 }, PlanPoint { x: 1.0, z: 0.0 }],
            min_y: 0.0,
            max_y: 1.0,
        };
        assert!(!degenerate.contains_point(&p(0.5, 0.5, 0.0)));
    }

    #[test]
    fn region_geometry_round_trips_through_json() {
        let region = l_shape();
        let json = serde_json::to_value(&region).unwrap();
        assert_eq!(json["kind"], "polygon");
        let back: RegionGeometry = serde_json::from_value(json).unwrap();
        assert_eq!(back, region);
    }
}
