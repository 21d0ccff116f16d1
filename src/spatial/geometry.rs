//! Pure geometry helpers: distances, the signed steering angle and
//! containment tests used for hit-testing.

use crate::core::error::{Result, TacticsError};
use crate::core::types::{Point, Position};

/// Rays shorter than this are treated as zero-length
const DEGENERATE_LENGTH: f64 = 1e-9;

/// Euclidean distance
pub fn distance(a: Point, b: Point) -> f64 {
    a.distance(&b)
}

/// Angle at vertex `b` between rays `b→a` and `b→c`, in degrees.
///
/// The magnitude comes from the law of cosines on triangle `a, b, c`. The
/// sign is positive when `c` lies below `b` on screen (`c.y > b.y`) and
/// negative otherwise, which decides whether a drag turns a unit clockwise
/// or counter-clockwise.
pub fn signed_angle(a: Point, b: Point, c: Point) -> Result<f64> {
    let ba = distance(b, a);
    let bc = distance(b, c);
    if ba < DEGENERATE_LENGTH || bc < DEGENERATE_LENGTH {
        return Err(TacticsError::DegenerateGeometry);
    }
    let ac = distance(a, c);

    // Rounding can push collinear inputs just outside acos's domain
    let cosine = ((ba * ba + bc * bc - ac * ac) / (2.0 * ba * bc)).clamp(-1.0, 1.0);
    let magnitude = cosine.acos().to_degrees();

    Ok(if c.y > b.y { magnitude } else { -magnitude })
}

/// Is `point` inside a rectangle centred on `center` and rotated by its heading?
///
/// `along` is the extent parallel to the heading, `across` the extent
/// perpendicular to it. Edges count as inside.
pub fn point_in_oriented_rect(point: Point, center: Position, along: f64, across: f64) -> bool {
    let offset = point - center.point();
    let radians = center.heading.to_radians();
    let (sin, cos) = radians.sin_cos();

    // Rotate into the rectangle's frame
    let local_along = offset.x * cos + offset.y * sin;
    let local_across = -offset.x * sin + offset.y * cos;

    local_along.abs() <= along / 2.0 && local_across.abs() <= across / 2.0
}

/// Is `point` strictly inside the circle?
pub fn point_in_circle(point: Point, center: Point, radius: f64) -> bool {
    distance(point, center) < radius
}
