//! Arc operations using bezier curve approximation.
//!
//! tiny-skia does not support arc primitives directly, so we approximate
//! arcs using cubic bezier curves, one per quarter turn at most.

use crate::geometry::ArcParams;
use std::f32::consts::{PI, TAU};
use tiny_skia::PathBuilder;

/// Signed sweep of an arc following Canvas 2D rules.
///
/// Clockwise sweeps are in `[0, 2π]`, anticlockwise sweeps in `[-2π, 0]`.
/// A requested span of a full turn or more draws a full circle.
pub(crate) fn arc_sweep(start_angle: f32, end_angle: f32, anticlockwise: bool) -> f32 {
    let span = end_angle - start_angle;
    if anticlockwise {
        if -span >= TAU {
            -TAU
        } else {
            -((start_angle - end_angle).rem_euclid(TAU))
        }
    } else if span >= TAU {
        TAU
    } else {
        span.rem_euclid(TAU)
    }
}

/// Append an arc to `path`, starting with a move to the arc's first point.
pub fn arc(path: &mut PathBuilder, params: &ArcParams) {
    let ArcParams {
        x,
        y,
        radius,
        start_angle,
        end_angle,
        anticlockwise,
    } = *params;

    if radius <= 0.0 || !radius.is_finite() {
        return;
    }

    let sweep = arc_sweep(start_angle, end_angle, anticlockwise);

    path.move_to(x + radius * start_angle.cos(), y + radius * start_angle.sin());
    if sweep == 0.0 {
        return;
    }

    let num_segments = ((sweep.abs() / (PI / 2.0)).ceil() as usize).max(1);
    let segment_angle = sweep / num_segments as f32;

    for i in 0..num_segments {
        let angle1 = start_angle + i as f32 * segment_angle;
        let angle2 = angle1 + segment_angle;
        arc_segment(path, x, y, radius, angle1, angle2);
    }
}

/// Add a single arc segment as a cubic bezier curve.
fn arc_segment(path: &mut PathBuilder, cx: f32, cy: f32, r: f32, angle1: f32, angle2: f32) {
    let k = 4.0 / 3.0 * ((angle2 - angle1) / 4.0).tan();

    let (x1, y1) = (angle1.cos(), angle1.sin());
    let (x2, y2) = (angle2.cos(), angle2.sin());

    path.cubic_to(
        cx + r * (x1 - k * y1),
        cy + r * (y1 + k * x1),
        cx + r * (x2 + k * y2),
        cy + r * (y2 - k * x2),
        cx + r * x2,
        cy + r * y2,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(x: f32, y: f32, radius: f32) -> ArcParams {
        ArcParams {
            x,
            y,
            radius,
            start_angle: 0.0,
            end_angle: TAU,
            anticlockwise: false,
        }
    }

    #[test]
    fn test_arc_full_circle_bounds() {
        let mut builder = PathBuilder::new();
        arc(&mut builder, &circle(50.0, 50.0, 40.0));
        let path = builder.finish().unwrap();
        let bounds = path.bounds();
        assert!((bounds.left() - 10.0).abs() < 0.5);
        assert!((bounds.right() - 90.0).abs() < 0.5);
        assert!((bounds.top() - 10.0).abs() < 0.5);
        assert!((bounds.bottom() - 90.0).abs() < 0.5);
    }

    #[test]
    fn test_arc_zero_radius_is_empty() {
        let mut builder = PathBuilder::new();
        arc(&mut builder, &circle(50.0, 50.0, 0.0));
        assert!(builder.finish().is_none());
    }

    #[test]
    fn test_arc_sweep_directions() {
        assert!((arc_sweep(PI, 0.0, false) - PI).abs() < 1e-5);
        assert!((arc_sweep(0.0, PI, true) + PI).abs() < 1e-5);
        assert_eq!(arc_sweep(0.0, 3.0 * TAU, false), TAU);
        assert_eq!(arc_sweep(0.0, -3.0 * TAU, true), -TAU);
    }
}
