//! Geometry of gradient variants.
//!
//! Everything here is pure: the only source of variety is the `fastrand::Rng`
//! passed in, so a seeded generator reproduces a layout exactly.

use crate::spec::LinearVariant;
use gradient_canvas2d::ArcParams;
use std::f64::consts::PI;

/// Start and end points of a linear gradient brush.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearEndpoints {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// Endpoints of a linear gradient at `angle_degrees` across a `width`×`height` box.
///
/// Angles follow CSS: 0° points up and 90° points right. The endpoints lie on
/// the ellipse inscribed in the box, on opposite sides of its center.
pub fn linear_endpoints(angle_degrees: f64, width: f64, height: f64) -> LinearEndpoints {
    let theta = angle_degrees.to_radians();
    let (dx, dy) = (theta.sin(), -theta.cos());
    let (cx, cy) = (width / 2.0, height / 2.0);
    let (ox, oy) = (dx * width / 2.0, dy * height / 2.0);
    LinearEndpoints {
        x0: cx - ox,
        y0: cy - oy,
        x1: cx + ox,
        y1: cy + oy,
    }
}

/// One color stop of a linear gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorStop {
    pub offset: f64,
    pub color: String,
}

/// Maximum number of colors a default linear gradient uses.
const MAX_LINEAR_STOPS: usize = 4;

/// Color stops for a linear gradient.
///
/// The default variant spaces up to four colors evenly. The smooth variant
/// uses the first three colors at 0, 0.5 and 1; with fewer than three colors
/// it falls back to the default placement.
pub fn linear_stops(colors: &[String], variant: LinearVariant) -> Vec<ColorStop> {
    if variant == LinearVariant::Smooth {
        if colors.len() >= 3 {
            return [0.0, 0.5, 1.0]
                .iter()
                .zip(colors)
                .map(|(&offset, color)| ColorStop {
                    offset,
                    color: color.clone(),
                })
                .collect();
        }
        log::debug!(
            target: "export",
            "smooth gradient needs 3 colors, got {}; using even spacing",
            colors.len()
        );
    }

    let used = &colors[..colors.len().min(MAX_LINEAR_STOPS)];
    let last = used.len().saturating_sub(1).max(1) as f64;
    used.iter()
        .enumerate()
        .map(|(i, color)| ColorStop {
            offset: i as f64 / last,
            color: color.clone(),
        })
        .collect()
}

/// Where in the container a blob is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobRegion {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl BlobRegion {
    pub const QUADRANTS: [BlobRegion; 4] = [
        BlobRegion::TopLeft,
        BlobRegion::TopRight,
        BlobRegion::BottomLeft,
        BlobRegion::BottomRight,
    ];

    /// Anchor as a fraction of the container size.
    pub fn base_offset(self) -> (f64, f64) {
        match self {
            BlobRegion::Center => (0.5, 0.5),
            BlobRegion::TopLeft => (0.25, 0.25),
            BlobRegion::TopRight => (0.75, 0.25),
            BlobRegion::BottomLeft => (0.25, 0.75),
            BlobRegion::BottomRight => (0.75, 0.75),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BlobRegion::Center => "center",
            BlobRegion::TopLeft => "top-left",
            BlobRegion::TopRight => "top-right",
            BlobRegion::BottomLeft => "bottom-left",
            BlobRegion::BottomRight => "bottom-right",
        }
    }
}

/// Circle a blob is filled as.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlobPath {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
}

impl BlobPath {
    /// SVG path data for the circle as two semicircular arcs.
    pub fn to_svg_path(&self) -> String {
        let r = self.radius;
        format!(
            "M {} {} A {r} {r} 0 1 0 {} {} A {r} {r} 0 1 0 {} {} Z",
            self.cx - r,
            self.cy,
            self.cx + r,
            self.cy,
            self.cx - r,
            self.cy,
            r = r
        )
    }

    /// The two semicircular canvas arcs tracing the circle.
    pub fn arcs(&self) -> [ArcParams; 2] {
        let arc = |start: f64, end: f64| ArcParams {
            x: self.cx as f32,
            y: self.cy as f32,
            radius: self.radius as f32,
            start_angle: start as f32,
            end_angle: end as f32,
            anticlockwise: false,
        };
        [arc(PI, 0.0), arc(0.0, PI)]
    }
}

/// One blurred color disc of a blob gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub path: BlobPath,
    pub color: String,
    pub region: BlobRegion,
}

/// How blobs are sized and scattered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlobOptions {
    /// Diameter as a fraction of the larger container side.
    pub size_factor: f64,
    /// Maximum center displacement as a fraction of the container size.
    pub jitter: f64,
    /// Random per-blob size multiplier range, if any.
    pub size_variance: Option<(f64, f64)>,
    /// Assign colors to regions in random order.
    pub shuffle_colors: bool,
}

impl Default for BlobOptions {
    fn default() -> Self {
        Self {
            size_factor: 0.8,
            jitter: 0.1,
            size_variance: None,
            shuffle_colors: true,
        }
    }
}

/// Maximum number of blobs in one layout.
pub const MAX_BLOBS: usize = 4;

/// Pick regions for `count` blobs: the center plus distinct quadrants, in random order.
pub fn pick_regions(count: usize, rng: &mut fastrand::Rng) -> Vec<BlobRegion> {
    if count == 0 {
        return Vec::new();
    }
    let mut quadrants = BlobRegion::QUADRANTS.to_vec();
    rng.shuffle(&mut quadrants);
    let mut regions = vec![BlobRegion::Center];
    regions.extend(quadrants.into_iter().take(count.min(MAX_BLOBS) - 1));
    rng.shuffle(&mut regions);
    regions
}

fn uniform(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    low + rng.f64() * (high - low)
}

/// Lay out up to four blobs for a `width`×`height` container.
pub fn generate_blobs(
    colors: &[String],
    width: f64,
    height: f64,
    options: &BlobOptions,
    rng: &mut fastrand::Rng,
) -> Vec<Blob> {
    let count = colors.len().min(MAX_BLOBS);
    let regions = pick_regions(count, rng);

    let mut palette = colors.to_vec();
    if options.shuffle_colors {
        rng.shuffle(&mut palette);
    }

    let base_size = options.size_factor * width.max(height);
    regions
        .into_iter()
        .zip(palette)
        .map(|(region, color)| {
            let (bx, by) = region.base_offset();
            let cx = width * (bx + uniform(rng, -options.jitter, options.jitter));
            let cy = height * (by + uniform(rng, -options.jitter, options.jitter));
            let size = match options.size_variance {
                Some((low, high)) => base_size * uniform(rng, low, high),
                None => base_size,
            };
            Blob {
                path: BlobPath {
                    cx,
                    cy,
                    radius: size / 2.0,
                },
                color,
                region,
            }
        })
        .collect()
}

/// The derived blobs of one container.
///
/// The layout is recomputed only when the container size changes or a
/// shuffle is requested; reading it never regenerates anything.
#[derive(Debug)]
pub struct BlobLayout {
    colors: Vec<String>,
    width: f64,
    height: f64,
    options: BlobOptions,
    rng: fastrand::Rng,
    blobs: Vec<Blob>,
    generation: u64,
}

impl BlobLayout {
    pub fn new(
        colors: Vec<String>,
        width: f64,
        height: f64,
        options: BlobOptions,
        mut rng: fastrand::Rng,
    ) -> Self {
        let blobs = generate_blobs(&colors, width, height, &options, &mut rng);
        Self {
            colors,
            width,
            height,
            options,
            rng,
            blobs,
            generation: 1,
        }
    }

    pub fn blobs(&self) -> &[Blob] {
        &self.blobs
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Number of layouts computed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report a container size. Returns true if the layout was recomputed.
    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        if width == self.width && height == self.height {
            return false;
        }
        self.width = width;
        self.height = height;
        self.regenerate();
        true
    }

    /// Produce a fresh layout for the same colors and size.
    pub fn shuffle(&mut self) {
        self.regenerate();
    }

    fn regenerate(&mut self) {
        self.blobs = generate_blobs(
            &self.colors,
            self.width,
            self.height,
            &self.options,
            &mut self.rng,
        );
        self.generation += 1;
        log::debug!(
            target: "export",
            "blob layout #{} for {}x{}: {}",
            self.generation,
            self.width,
            self.height,
            self.blobs
                .iter()
                .map(|b| b.region.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    fn colors(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("#0000{:02x}", i * 40)).collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[rstest]
    #[case(0.0, (400.0, 450.0), (400.0, 0.0))]
    #[case(90.0, (0.0, 225.0), (800.0, 225.0))]
    #[case(180.0, (400.0, 0.0), (400.0, 450.0))]
    fn test_linear_endpoints_axis_angles(
        #[case] angle: f64,
        #[case] start: (f64, f64),
        #[case] end: (f64, f64),
    ) {
        let e = linear_endpoints(angle, 800.0, 450.0);
        assert!(close(e.x0, start.0) && close(e.y0, start.1), "{:?}", e);
        assert!(close(e.x1, end.0) && close(e.y1, end.1), "{:?}", e);
    }

    #[test]
    fn test_linear_endpoints_45_degrees_on_ellipse() {
        let e = linear_endpoints(45.0, 800.0, 450.0);
        let half = std::f64::consts::FRAC_1_SQRT_2;
        assert!(close(e.x1, 400.0 + 400.0 * half));
        assert!(close(e.y1, 225.0 - 225.0 * half));
        // Symmetric about the center
        assert!(close(e.x0 + e.x1, 800.0));
        assert!(close(e.y0 + e.y1, 450.0));
    }

    #[rstest]
    #[case(1, 1)]
    #[case(2, 2)]
    #[case(4, 4)]
    #[case(6, 4)]
    fn test_default_stop_count(#[case] n: usize, #[case] expected: usize) {
        let stops = linear_stops(&colors(n), LinearVariant::Default);
        assert_eq!(stops.len(), expected);
        assert_eq!(stops[0].offset, 0.0);
        if expected > 1 {
            assert_eq!(stops[expected - 1].offset, 1.0);
        }
    }

    #[test]
    fn test_smooth_uses_first_three() {
        let input = colors(5);
        let stops = linear_stops(&input, LinearVariant::Smooth);
        let offsets: Vec<f64> = stops.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.5, 1.0]);
        assert_eq!(stops[2].color, input[2]);
    }

    #[test]
    fn test_smooth_with_two_colors_falls_back() {
        let input = colors(2);
        assert_eq!(
            linear_stops(&input, LinearVariant::Smooth),
            linear_stops(&input, LinearVariant::Default)
        );
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(3)]
    #[case(4)]
    #[case(7)]
    fn test_blob_count_and_unique_regions(#[case] n: usize) {
        for seed in 0..50 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let blobs = generate_blobs(&colors(n), 800.0, 450.0, &BlobOptions::default(), &mut rng);
            assert_eq!(blobs.len(), n.min(4));
            let regions: HashSet<_> = blobs.iter().map(|b| b.region).collect();
            assert_eq!(regions.len(), blobs.len());
            if n > 0 {
                assert!(regions.contains(&BlobRegion::Center));
            }
        }
    }

    #[test]
    fn test_blob_placement_within_jitter_band() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..100 {
            let blobs = generate_blobs(&colors(4), 800.0, 450.0, &BlobOptions::default(), &mut rng);
            for blob in blobs {
                let (bx, by) = blob.region.base_offset();
                assert!((blob.path.cx - 800.0 * bx).abs() <= 80.0 + 1e-9);
                assert!((blob.path.cy - 450.0 * by).abs() <= 45.0 + 1e-9);
                assert!(close(blob.path.radius, 320.0));
            }
        }
    }

    #[test]
    fn test_rich_variance_range() {
        let options = BlobOptions {
            size_variance: Some((0.7, 1.3)),
            ..Default::default()
        };
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..100 {
            for blob in generate_blobs(&colors(4), 500.0, 500.0, &options, &mut rng) {
                let diameter = blob.path.radius * 2.0;
                assert!((280.0..=520.0).contains(&diameter), "{}", diameter);
            }
        }
    }

    #[test]
    fn test_seeded_layout_is_reproducible() {
        let a = generate_blobs(
            &colors(4),
            640.0,
            480.0,
            &BlobOptions::default(),
            &mut fastrand::Rng::with_seed(42),
        );
        let b = generate_blobs(
            &colors(4),
            640.0,
            480.0,
            &BlobOptions::default(),
            &mut fastrand::Rng::with_seed(42),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_unshuffled_colors_keep_order() {
        let options = BlobOptions {
            shuffle_colors: false,
            ..Default::default()
        };
        let input = colors(3);
        let blobs = generate_blobs(&input, 100.0, 100.0, &options, &mut fastrand::Rng::with_seed(3));
        let used: Vec<&String> = blobs.iter().map(|b| &b.color).collect();
        assert_eq!(used, input.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_svg_path_is_two_arcs() {
        let path = BlobPath {
            cx: 50.0,
            cy: 40.0,
            radius: 10.0,
        };
        assert_eq!(
            path.to_svg_path(),
            "M 40 40 A 10 10 0 1 0 60 40 A 10 10 0 1 0 40 40 Z"
        );
        let [first, second] = path.arcs();
        assert_eq!(first.end_angle, second.start_angle);
    }

    #[test]
    fn test_layout_recomputes_only_on_triggers() {
        let mut layout = BlobLayout::new(
            colors(4),
            800.0,
            450.0,
            BlobOptions::default(),
            fastrand::Rng::with_seed(1),
        );
        let first = layout.blobs().to_vec();
        assert_eq!(layout.blobs(), first.as_slice());
        assert!(!layout.resize(800.0, 450.0));
        assert_eq!(layout.generation(), 1);

        assert!(layout.resize(400.0, 400.0));
        assert_eq!(layout.generation(), 2);
        assert_eq!(layout.size(), (400.0, 400.0));
        assert!(layout.blobs().iter().all(|b| close(b.path.radius, 160.0)));

        layout.shuffle();
        assert_eq!(layout.generation(), 3);
    }
}
