//! Envelope relation classification and extent helpers
//!
//! B is the reference frame, split into a 3x3 grid. The relation code says
//! in which cells of that grid A's area lies:
//!
//! ```text
//!               -1
//!         +---+---+---+
//!         |128| 1 | 2 |
//!         +---+---+---+
//!   -1    |64 | 0 | 4 |    -1
//!         +---+---+---+
//!         |32 |16 | 8 |
//!         +---+---+---+
//!               -1
//! ```
//!
//! Codes spanning a whole side are sums of their cells (224 = 128 + 64 + 32).
//! 256 is returned both for coincident envelopes and for B strictly inside A.

use crate::types::{Envelope, MaError, MaResult};

/// Tolerance used by point containment tests
pub const POINT_TOLERANCE: f64 = 0.0000001;

/// Meters per degree of latitude used by the z-factor
const METERS_PER_DEGREE: f64 = 111320.0;

/// Relation of a subject envelope A to a reference envelope B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Disjoint,
    Contains,
    Top,
    TopRight,
    Right,
    BottomRight,
    EntireRight,
    Bottom,
    VerticalThroughMiddle,
    BottomLeft,
    EntireBottom,
    Left,
    HorizontalThroughMiddle,
    TopLeft,
    EntireTop,
    EntireLeft,
    /// Coincident, or B strictly inside A
    Coincident,
}

impl Relation {
    /// Every relation, ordered by code
    pub const ALL: [Relation; 17] = [
        Relation::Disjoint,
        Relation::Contains,
        Relation::Top,
        Relation::TopRight,
        Relation::Right,
        Relation::BottomRight,
        Relation::EntireRight,
        Relation::Bottom,
        Relation::VerticalThroughMiddle,
        Relation::BottomLeft,
        Relation::EntireBottom,
        Relation::Left,
        Relation::HorizontalThroughMiddle,
        Relation::TopLeft,
        Relation::EntireTop,
        Relation::EntireLeft,
        Relation::Coincident,
    ];

    pub fn code(&self) -> i32 {
        match self {
            Relation::Disjoint => -1,
            Relation::Contains => 0,
            Relation::Top => 1,
            Relation::TopRight => 2,
            Relation::Right => 4,
            Relation::BottomRight => 8,
            Relation::EntireRight => 14,
            Relation::Bottom => 16,
            Relation::VerticalThroughMiddle => 17,
            Relation::BottomLeft => 32,
            Relation::EntireBottom => 56,
            Relation::Left => 64,
            Relation::HorizontalThroughMiddle => 68,
            Relation::TopLeft => 128,
            Relation::EntireTop => 131,
            Relation::EntireLeft => 224,
            Relation::Coincident => 256,
        }
    }

    pub fn from_code(code: i32) -> Option<Relation> {
        Relation::ALL.iter().copied().find(|r| r.code() == code)
    }

    /// A lies inside B, or the two share an envelope
    pub fn is_contained(&self) -> bool {
        matches!(self, Relation::Contains | Relation::Coincident)
    }

    pub fn is_disjoint(&self) -> bool {
        matches!(self, Relation::Disjoint)
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

/// Classify subject envelope `a` against reference envelope `b`.
///
/// The predicates are evaluated in a fixed order and the first match wins.
/// Several partial-overlap branches only fire for degenerate envelopes;
/// the order must not be rearranged since callers key tolerance policies
/// to the exact codes.
pub fn envelope_relation(a: &Envelope, b: &Envelope) -> Relation {
    let (l1, b1, r1, t1) = (a.left, a.bottom, a.right, a.top);
    let (l2, b2, r2, t2) = (b.left, b.bottom, b.right, b.top);

    if l1 == l2 && b1 == b2 && r1 == r2 && t1 == t2 {
        return Relation::Coincident;
    }
    if t1 < t2 && b1 > b2 && l1 > l2 && r1 < r2 {
        return Relation::Contains;
    }
    if l1 < l2 && b1 < b2 && r1 > r2 && t1 > t2 {
        return Relation::Coincident;
    }

    // Partial: one cell of the outer ring
    if t1 >= t2 && b1 < t2 && b1 > b2 && l1 > l2 && r1 < r2 {
        return Relation::Top;
    }
    if t1 >= t2 && b1 < t2 && b1 > b2 && l1 > l2 && l1 < r2 && r2 <= r1 {
        return Relation::TopRight;
    }
    if t1 < t2 && b1 > b2 && l1 > l2 && l1 < r2 && r1 >= r2 {
        return Relation::Right;
    }
    if t1 > b2 && t1 < t2 && b1 <= b2 && l1 > l2 && l1 < r2 && r2 <= r1 {
        return Relation::BottomRight;
    }
    if t1 > b2 && t1 < t2 && b1 <= b2 && l1 > l2 && r1 < r2 {
        return Relation::Bottom;
    }
    if t1 > b2 && t1 < t2 && b1 <= b2 && l1 <= l2 && r1 > l2 && r1 < r2 {
        return Relation::BottomLeft;
    }
    // r1 > l1 (not l2) is how the left-side test has always been written
    if t1 < t2 && b1 > b2 && l1 <= l2 && r1 > l1 && r1 < r2 {
        return Relation::Left;
    }
    if t1 >= t2 && b1 < t2 && b1 > b2 && l1 <= l2 && r1 > l2 && r1 < r2 {
        return Relation::TopLeft;
    }

    // Partial: a whole side or a band through the middle
    if t1 >= t2 && b1 <= b2 && l1 <= l2 && r1 > l2 && r1 < r2 {
        return Relation::EntireLeft;
    }
    if l1 > l2 && r1 < r2 && t1 >= t2 && b1 <= b2 {
        return Relation::VerticalThroughMiddle;
    }
    if t1 >= t2 && b1 <= b2 && l1 > l2 && l1 < r2 && r1 >= r2 {
        return Relation::EntireRight;
    }
    if t1 >= t2 && b1 > b2 && b1 < t2 && l1 <= l2 && r1 >= r2 {
        return Relation::EntireTop;
    }
    if l1 <= l2 && r1 >= r2 && t1 < t2 && b1 > b2 {
        return Relation::HorizontalThroughMiddle;
    }
    if t1 < t2 && t1 > b2 && b1 <= b2 && l1 <= l2 && r1 >= r2 {
        return Relation::EntireBottom;
    }

    Relation::Disjoint
}

/// How strictly a tool treats a subject extent against its reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtentPolicy {
    /// Accept only contained or coincident extents
    ContainedOnly,
    /// Accept anything that is not disjoint; partial overlaps are warned about
    AnyOverlap,
}

/// Apply an extent policy to `subject` against `reference`
pub fn check_extent(
    subject: &Envelope,
    reference: &Envelope,
    policy: ExtentPolicy,
) -> MaResult<Relation> {
    let relation = envelope_relation(subject, reference);
    log::debug!("Extent {} vs {}: {}", subject, reference, relation);

    match (policy, relation) {
        (_, r) if r.is_contained() => Ok(r),
        (_, Relation::Disjoint) => Err(MaError::ExtentMismatch(format!(
            "extent {} does not overlap {}",
            subject, reference
        ))),
        (ExtentPolicy::AnyOverlap, r) => {
            log::warn!(
                "Extent {} only partially overlaps {} (relation {})",
                subject,
                reference,
                r.code()
            );
            Ok(r)
        }
        (ExtentPolicy::ContainedOnly, r) => Err(MaError::ExtentMismatch(format!(
            "extent {} is not contained in {} (relation {})",
            subject,
            reference,
            r.code()
        ))),
    }
}

impl Envelope {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Point test with a small tolerance; corners may be given in any order
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let min_x = self.left.min(self.right);
        let max_x = self.left.max(self.right);
        let min_y = self.bottom.min(self.top);
        let max_y = self.bottom.max(self.top);

        y >= min_y - POINT_TOLERANCE
            && y <= max_y + POINT_TOLERANCE
            && x >= min_x - POINT_TOLERANCE
            && x <= max_x + POINT_TOLERANCE
    }

    /// True when both the lower-left and upper-right corners of `inner` fall inside
    pub fn contains_envelope(&self, inner: &Envelope) -> bool {
        self.contains_point(inner.left, inner.bottom) && self.contains_point(inner.right, inner.top)
    }

    pub fn centroid(&self) -> (f64, f64) {
        (
            self.left + self.width() / 2.0,
            self.bottom + self.height() / 2.0,
        )
    }

    /// Grow every edge outward by `distance`
    pub fn expand(&self, distance: f64) -> Envelope {
        Envelope::new(
            self.left - distance,
            self.bottom - distance,
            self.right + distance,
            self.top + distance,
        )
    }

    /// Latitude halfway between bottom and top, regardless of edge order
    pub fn mid_latitude(&self) -> f64 {
        if self.top == self.bottom {
            self.top
        } else {
            self.bottom.min(self.top) + (self.top - self.bottom).abs() / 2.0
        }
    }
}

/// Degrees per meter at the given latitude (in degrees), rounded to 6 decimals.
///
/// Used to express linear distances in geographic datasets.
pub fn z_factor(mid_latitude_deg: f64) -> MaResult<f64> {
    let cos = mid_latitude_deg.to_radians().cos();
    if cos.abs() < f64::EPSILON {
        return Err(MaError::InvalidParameter(format!(
            "z-factor is undefined at latitude {}",
            mid_latitude_deg
        )));
    }
    let factor = (1.0 / (METERS_PER_DEGREE * cos)).abs();
    Ok((factor * 1.0e6).round() / 1.0e6)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(l: f64, b: f64, r: f64, t: f64) -> Envelope {
        Envelope::new(l, b, r, t)
    }

    #[test]
    fn test_coincident_and_containment() {
        let b = env(0.0, 0.0, 10.0, 10.0);
        assert_eq!(envelope_relation(&b, &b), Relation::Coincident);
        assert_eq!(envelope_relation(&env(2.0, 2.0, 4.0, 4.0), &b).code(), 0);
        assert_eq!(envelope_relation(&b, &env(2.0, 2.0, 4.0, 4.0)).code(), 256);
    }

    #[test]
    fn test_single_cells() {
        let b = env(0.0, 0.0, 10.0, 10.0);
        assert_eq!(envelope_relation(&env(2.0, 8.0, 4.0, 12.0), &b), Relation::Top);
        assert_eq!(envelope_relation(&env(8.0, 8.0, 12.0, 12.0), &b), Relation::TopRight);
        assert_eq!(envelope_relation(&env(8.0, 2.0, 12.0, 4.0), &b), Relation::Right);
        assert_eq!(envelope_relation(&env(8.0, -2.0, 12.0, 2.0), &b), Relation::BottomRight);
        assert_eq!(envelope_relation(&env(2.0, -2.0, 4.0, 2.0), &b), Relation::Bottom);
        assert_eq!(envelope_relation(&env(-2.0, -2.0, 2.0, 2.0), &b), Relation::BottomLeft);
        assert_eq!(envelope_relation(&env(-2.0, 2.0, 2.0, 4.0), &b), Relation::Left);
        assert_eq!(envelope_relation(&env(-2.0, 8.0, 2.0, 12.0), &b), Relation::TopLeft);
    }

    #[test]
    fn test_side_spans() {
        let b = env(0.0, 0.0, 10.0, 10.0);
        assert_eq!(envelope_relation(&env(-2.0, -2.0, 2.0, 12.0), &b).code(), 224);
        assert_eq!(envelope_relation(&env(2.0, -2.0, 4.0, 12.0), &b).code(), 17);
        assert_eq!(envelope_relation(&env(8.0, -2.0, 12.0, 12.0), &b).code(), 14);
        assert_eq!(envelope_relation(&env(-2.0, 8.0, 12.0, 12.0), &b).code(), 131);
        assert_eq!(envelope_relation(&env(-5.0, 2.0, 15.0, 4.0), &b).code(), 68);
        assert_eq!(envelope_relation(&env(-2.0, -2.0, 12.0, 2.0), &b).code(), 56);
    }

    #[test]
    fn test_disjoint() {
        let b = env(0.0, 0.0, 10.0, 10.0);
        assert_eq!(envelope_relation(&env(20.0, 20.0, 30.0, 30.0), &b), Relation::Disjoint);
        assert_eq!(envelope_relation(&env(-30.0, -30.0, -20.0, -20.0), &b), Relation::Disjoint);
    }

    #[test]
    fn test_left_side_quirk() {
        // The left-side test compares r1 against l1, so a box fully to the
        // left of B within its vertical band still reports Left.
        let b = env(0.0, 0.0, 10.0, 10.0);
        assert_eq!(envelope_relation(&env(-30.0, 2.0, -20.0, 4.0), &b), Relation::Left);
    }

    #[test]
    fn test_codes_round_trip() {
        for relation in Relation::ALL {
            assert_eq!(Relation::from_code(relation.code()), Some(relation));
        }
        assert_eq!(Relation::from_code(3), None);
    }

    #[test]
    fn test_extent_policies() {
        let reference = env(0.0, 0.0, 10.0, 10.0);
        let partial = env(8.0, 8.0, 12.0, 12.0);

        assert!(check_extent(&env(1.0, 1.0, 2.0, 2.0), &reference, ExtentPolicy::ContainedOnly).is_ok());
        assert!(check_extent(&partial, &reference, ExtentPolicy::ContainedOnly).is_err());
        assert_eq!(
            check_extent(&partial, &reference, ExtentPolicy::AnyOverlap).unwrap(),
            Relation::TopRight
        );
        assert!(matches!(
            check_extent(&env(20.0, 20.0, 30.0, 30.0), &reference, ExtentPolicy::AnyOverlap),
            Err(MaError::ExtentMismatch(_))
        ));
    }

    #[test]
    fn test_point_and_envelope_containment() {
        let outer = env(10.0, 10.0, 0.0, 0.0);
        assert!(outer.contains_point(0.0, 0.0));
        assert!(outer.contains_point(10.00000005, 5.0));
        assert!(!outer.contains_point(10.001, 5.0));
        assert!(outer.contains_envelope(&env(1.0, 1.0, 9.0, 9.0)));
        assert!(!outer.contains_envelope(&env(1.0, 1.0, 11.0, 9.0)));
    }

    #[test]
    fn test_centroid_and_expand() {
        let e = env(-10.0, 20.0, 10.0, 40.0);
        assert_eq!(e.centroid(), (0.0, 30.0));
        assert_eq!(e.expand(1.5), env(-11.5, 18.5, 11.5, 41.5));
        assert_eq!(e.mid_latitude(), 30.0);
    }

    #[test]
    fn test_z_factor() {
        let equator = z_factor(0.0).unwrap();
        assert!((equator - 0.000009).abs() < 1e-12);
        let sixty = z_factor(60.0).unwrap();
        assert!((sixty - 0.000018).abs() < 1e-12);
        assert!(z_factor(90.0).is_err());
    }
}
