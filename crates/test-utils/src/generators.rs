//! Analytic scalar fields for exercising the contour pipeline.
//!
//! Every generator is a pure function of `(x, y)`, so tests get exactly
//! reproducible geometry with known closed-form contours to assert
//! against.

/// A circle test field: `x^2 + y^2 - radius^2`.
///
/// Its zero level is a circle of the given radius centered on the
/// origin, which makes closure and position assertions straightforward.
///
/// # Arguments
///
/// * `radius` - Radius of the zero-level circle
///
/// # Example
///
/// ```
/// use test_utils::circle_field;
///
/// let f = circle_field(1.0);
/// assert!(f(0.0, 0.0) < 0.0);
/// assert_eq!(f(1.0, 0.0), 0.0);
/// ```
pub fn circle_field(radius: f64) -> impl Fn(f64, f64) -> f64 {
    move |x, y| x * x + y * y - radius * radius
}

/// A planar field: `a * x + b * y + c`.
///
/// Every level is a straight line, so contours are open strips that run
/// border to border.
///
/// # Arguments
///
/// * `a` - Coefficient of x
/// * `b` - Coefficient of y
/// * `c` - Constant offset
pub fn linear_field(a: f64, b: f64, c: f64) -> impl Fn(f64, f64) -> f64 {
    move |x, y| a * x + b * y + c
}

/// The radial bowl `x^2 + y^2`.
pub fn radial_field(x: f64, y: f64) -> f64 {
    x * x + y * y
}

/// The classic saddle `x * y`, whose zero level crosses itself at the
/// origin. Useful for the ambiguous marching cases.
pub fn saddle_field(x: f64, y: f64) -> f64 {
    x * y
}

/// A field that is NaN inside a disk and `x^2 + y^2` outside it.
///
/// Models a data hole: the contour pipeline must detect the
/// discontinuities and heal around the disk.
///
/// # Arguments
///
/// * `radius` - Radius of the NaN disk centered on the origin
pub fn nan_disk_field(radius: f64) -> impl Fn(f64, f64) -> f64 {
    let r2 = radius * radius;
    move |x, y| {
        let d2 = x * x + y * y;
        if d2 < r2 {
            f64::NAN
        } else {
            d2
        }
    }
}

/// A smooth oscillating field with many disjoint contours per level.
///
/// Handy for determinism checks and benchmarks where a single circle is
/// too easy.
pub fn ripple_field(x: f64, y: f64) -> f64 {
    (x * 2.0).sin() + (y * 3.0).cos() * 0.5
}
