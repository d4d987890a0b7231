//! Color token normalization.
//!
//! Every color that reaches a drawing call must be in a notation the canvas
//! understands: hex or `rgb()`/`rgba()`. `lab(...)` tokens are converted here
//! (CIE LAB, D65 white, to gamma-encoded sRGB); anything else goes through a
//! general CSS color parser. Failures never propagate: they degrade to a
//! magenta sentinel so a broken color is obvious in the output.

use regex::Regex;
use thiserror::Error;

/// Color drawn in place of any token that cannot be understood.
pub const SENTINEL_COLOR: &str = "rgb(255,0,255)";

/// D65 reference white.
const REF_X: f64 = 95.047;
const REF_Y: f64 = 100.0;
const REF_Z: f64 = 108.883;

/// Breakpoint of the inverse LAB companding function (6/29).
const LAB_BREAKPOINT: f64 = 0.206893034422;

lazy_static! {
    static ref LAB_TOKEN: Regex = Regex::new(
        r"(?i)^lab\(\s*(-?\d*\.?\d+)%?\s+(-?\d*\.?\d+)\s+(-?\d*\.?\d+)\s*(?:/\s*(\d*\.?\d+)(%?)\s*)?\)$"
    )
    .expect("valid lab token regex");
    static ref LAB_OCCURRENCE: Regex =
        Regex::new(r"(?i)\blab\([^)]*\)").expect("valid lab occurrence regex");
}

/// A color token that could not be turned into a drawable color.
#[derive(Debug, Error, PartialEq)]
pub enum ColorParseFailure {
    #[error("malformed lab() color: {0}")]
    MalformedLab(String),

    #[error("unrecognized color: {0}")]
    Unrecognized(String),

    #[error("color resolves to `inherit`: {0}")]
    Inherit(String),
}

/// A set of colors in one of the two shapes the view layer hands over.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSet {
    /// An ordered list of individual tokens.
    Tokens(Vec<String>),
    /// A composite definition such as `linear-gradient(90deg, lab(...) 0%, ...)`.
    Definition(String),
}

/// An sRGB color with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    /// Format as `rgb(r,g,b)` when opaque, `rgba(r,g,b,a)` otherwise.
    pub fn to_css(&self) -> String {
        if self.a < 1.0 {
            format!("rgba({},{},{},{})", self.r, self.g, self.b, format_alpha(self.a))
        } else {
            format!("rgb({},{},{})", self.r, self.g, self.b)
        }
    }
}

fn format_alpha(a: f64) -> String {
    let rounded = (a.clamp(0.0, 1.0) * 1000.0).round() / 1000.0;
    format!("{}", rounded)
}

/// Normalize one token into a canvas-drawable color string.
///
/// Hex and `rgb()`/`rgba()` tokens are returned unchanged.
pub fn normalize(token: &str) -> String {
    match try_normalize(token) {
        Ok(color) => color,
        Err(err) => {
            log::warn!("{}; using sentinel {}", err, SENTINEL_COLOR);
            SENTINEL_COLOR.to_string()
        }
    }
}

/// Like [`normalize`], but reports why a token was rejected.
pub fn try_normalize(token: &str) -> Result<String, ColorParseFailure> {
    let trimmed = token.trim();
    if is_canvas_drawable(trimmed) {
        return Ok(token.to_string());
    }
    if trimmed
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("lab("))
    {
        return parse_lab(trimmed).map(|rgba| rgba.to_css());
    }
    parse_fallback(trimmed).map(|rgba| rgba.to_css())
}

/// Normalize every color in a set, preserving its shape.
///
/// For definitions only `lab(...)` occurrences are rewritten; all other
/// syntax is kept verbatim.
pub fn normalize_all(colors: ColorSet) -> ColorSet {
    match colors {
        ColorSet::Tokens(tokens) => ColorSet::Tokens(tokens.iter().map(|t| normalize(t)).collect()),
        ColorSet::Definition(definition) => {
            ColorSet::Definition(normalize_definition(&definition))
        }
    }
}

/// Rewrite every `lab(...)` occurrence inside a composite CSS value.
pub fn normalize_definition(definition: &str) -> String {
    LAB_OCCURRENCE
        .replace_all(definition, |caps: &regex::Captures| normalize(&caps[0]))
        .into_owned()
}

/// Whether a token is already hex or `rgb()`/`rgba()` notation.
pub fn is_canvas_drawable(token: &str) -> bool {
    let lower = token.trim_start().to_ascii_lowercase();
    lower.starts_with('#') || lower.starts_with("rgb(") || lower.starts_with("rgba(")
}

/// Parse `lab(L% a b [/ alpha])` and convert it to sRGB.
pub fn parse_lab(token: &str) -> Result<Rgba, ColorParseFailure> {
    let caps = LAB_TOKEN
        .captures(token.trim())
        .ok_or_else(|| ColorParseFailure::MalformedLab(token.to_string()))?;

    let number = |i: usize| -> Result<f64, ColorParseFailure> {
        caps[i]
            .parse::<f64>()
            .map_err(|_| ColorParseFailure::MalformedLab(token.to_string()))
    };
    let l = number(1)?;
    let a = number(2)?;
    let b = number(3)?;
    if !(0.0..=100.0).contains(&l) {
        return Err(ColorParseFailure::MalformedLab(token.to_string()));
    }

    let alpha = match caps.get(4) {
        Some(m) => {
            let value: f64 = m
                .as_str()
                .parse()
                .map_err(|_| ColorParseFailure::MalformedLab(token.to_string()))?;
            let is_percent = caps.get(5).is_some_and(|p| !p.as_str().is_empty());
            let value = if is_percent { value / 100.0 } else { value };
            if !(0.0..=1.0).contains(&value) {
                return Err(ColorParseFailure::MalformedLab(token.to_string()));
            }
            value
        }
        None => 1.0,
    };

    let [r, g, b] = lab_to_srgb(l, a, b);
    Ok(Rgba { r, g, b, a: alpha })
}

/// Convert CIE LAB (D65) to 8-bit gamma-encoded sRGB, clamping out-of-gamut values.
pub fn lab_to_srgb(l: f64, a: f64, b: f64) -> [u8; 3] {
    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let x = REF_X * lab_inverse_f(fx) / 100.0;
    let y = REF_Y * lab_inverse_f(fy) / 100.0;
    let z = REF_Z * lab_inverse_f(fz) / 100.0;

    let r = x * 3.2404542 + y * -1.5371385 + z * -0.4985314;
    let g = x * -0.9692660 + y * 1.8760108 + z * 0.0415560;
    let bl = x * 0.0556434 + y * -0.2040259 + z * 1.0572252;

    [to_srgb_channel(r), to_srgb_channel(g), to_srgb_channel(bl)]
}

fn lab_inverse_f(t: f64) -> f64 {
    if t > LAB_BREAKPOINT {
        t * t * t
    } else {
        (t - 16.0 / 116.0) / 7.787
    }
}

fn to_srgb_channel(linear: f64) -> u8 {
    let encoded = if linear <= 0.0031308 {
        12.92 * linear
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0).clamp(0.0, 255.0).round() as u8
}

/// Resolve named colors, `hsl()` and the like through a general CSS parser.
fn parse_fallback(token: &str) -> Result<Rgba, ColorParseFailure> {
    if token.eq_ignore_ascii_case("inherit") {
        return Err(ColorParseFailure::Inherit(token.to_string()));
    }
    let parsed = csscolorparser::parse(token)
        .map_err(|_| ColorParseFailure::Unrecognized(token.to_string()))?;
    let [r, g, b, a] = parsed.to_rgba8();
    Ok(Rgba {
        r,
        g,
        b,
        a: a as f64 / 255.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rgb_of(css: &str) -> [i32; 3] {
        let inner = css
            .trim_start_matches("rgba(")
            .trim_start_matches("rgb(")
            .trim_end_matches(')');
        let parts: Vec<i32> = inner
            .split(',')
            .take(3)
            .map(|p| p.trim().parse().unwrap())
            .collect();
        [parts[0], parts[1], parts[2]]
    }

    #[test]
    fn test_lab_red_round_trip() {
        let css = normalize("lab(53.23% 80.11 67.22)");
        let [r, g, b] = rgb_of(&css);
        assert!((r - 255).abs() <= 2, "{}", css);
        assert!(g.abs() <= 2, "{}", css);
        assert!(b.abs() <= 2, "{}", css);
        assert!(css.starts_with("rgb("));
    }

    #[rstest]
    #[case("lab(100% 0 0)", [255, 255, 255])]
    #[case("lab(0% 0 0)", [0, 0, 0])]
    #[case("lab(32.3% 79.19 -107.86)", [0, 0, 255])]
    fn test_lab_reference_colors(#[case] token: &str, #[case] expected: [i32; 3]) {
        let [r, g, b] = rgb_of(&normalize(token));
        for (got, want) in [r, g, b].iter().zip(expected.iter()) {
            assert!((got - want).abs() <= 2, "{} -> {:?}", token, [r, g, b]);
        }
    }

    #[test]
    fn test_lab_channels_stay_in_range() {
        for l in [0.0, 12.5, 50.0, 87.5, 100.0] {
            for a in [-128.0, -64.0, 0.0, 64.0, 127.0] {
                for b in [-128.0, 0.0, 127.0] {
                    let token = format!("lab({}% {} {})", l, a, b);
                    let rgba = parse_lab(&token).unwrap();
                    // u8 channels are in range by construction; alpha defaults to opaque
                    assert_eq!(rgba.a, 1.0);
                    assert!(normalize(&token).starts_with("rgb("));
                }
            }
        }
    }

    #[rstest]
    #[case("lab(50% 10 10 / 0.5)", 0.5)]
    #[case("lab(50% 10 10 / 25%)", 0.25)]
    fn test_lab_alpha(#[case] token: &str, #[case] alpha: f64) {
        let rgba = parse_lab(token).unwrap();
        assert_eq!(rgba.a, alpha);
        assert!(normalize(token).starts_with("rgba("));
    }

    #[rstest]
    #[case("#ff0000")]
    #[case("#FFF")]
    #[case("rgb(1, 2, 3)")]
    #[case("rgba(1,2,3,0.4)")]
    #[case("#not-even-hex")]
    fn test_drawable_tokens_are_identity(#[case] token: &str) {
        assert_eq!(normalize(token), token);
    }

    #[rstest]
    #[case("red", "rgb(255,0,0)")]
    #[case("transparent", "rgba(0,0,0,0)")]
    #[case("hsl(120, 100%, 50%)", "rgb(0,255,0)")]
    fn test_fallback_parser(#[case] token: &str, #[case] expected: &str) {
        assert_eq!(normalize(token), expected);
    }

    #[rstest]
    #[case("inherit")]
    #[case("definitely-not-a-color")]
    #[case("lab(150% 0 0)")]
    #[case("lab(50% 0)")]
    #[case("lab(50% 0 0 / 2)")]
    #[case("日本")]
    #[case("lab日本")]
    #[case("éab(50% 0 0)")]
    fn test_failures_degrade_to_sentinel(#[case] token: &str) {
        assert_eq!(normalize(token), SENTINEL_COLOR);
        assert!(try_normalize(token).is_err());
    }

    #[test]
    fn test_normalize_all_tokens_preserves_order() {
        let set = ColorSet::Tokens(vec![
            "#00ff00".to_string(),
            "lab(100% 0 0)".to_string(),
            "blue".to_string(),
        ]);
        let ColorSet::Tokens(out) = normalize_all(set) else {
            panic!("shape changed");
        };
        assert_eq!(out, vec!["#00ff00", "rgb(255,255,255)", "rgb(0,0,255)"]);
    }

    #[test]
    fn test_normalize_definition_rewrites_only_lab() {
        let definition =
            "linear-gradient(90deg, lab(100% 0 0) 0%, #123456 50%, lab(0% 0 0 / 0.5) 100%)";
        let out = normalize_definition(definition);
        assert_eq!(
            out,
            "linear-gradient(90deg, rgb(255,255,255) 0%, #123456 50%, rgba(0,0,0,0.5) 100%)"
        );
        assert_eq!(
            normalize_all(ColorSet::Definition(definition.to_string())),
            ColorSet::Definition(out)
        );
    }

    #[test]
    fn test_normalize_definition_leaves_oklab_alone() {
        let definition = "linear-gradient(90deg, oklab(0.5 0.1 0.1) 0%, #fff 100%)";
        assert_eq!(normalize_definition(definition), definition);

        let mixed = "radial-gradient(OKLAB(0.2 0 0), LAB(100% 0 0))";
        assert_eq!(
            normalize_definition(mixed),
            "radial-gradient(OKLAB(0.2 0 0), rgb(255,255,255))"
        );
    }
}
