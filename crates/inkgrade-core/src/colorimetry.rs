//! Color science: sRGB → CIE XYZ → CIE Lab (D65) and CIEDE2000.
//!
//! The Delta-E implementation follows Sharma, Wu & Dalal (2005) with unit
//! parametric weights (`kL = kC = kH = 1`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// D65 reference white, scaled to `Y = 100`.
pub const D65_WHITE: (f64, f64, f64) = (95.047, 100.0, 108.883);

const LAB_EPSILON: f64 = 0.008856;
const LAB_KAPPA_SLOPE: f64 = 7.787;
const POW25_7: f64 = 6_103_515_625.0; // 25^7

/// An 8-bit sRGB color. Serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_lab(self) -> Lab {
        xyz_to_lab(rgb_to_xyz(self))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(format!("invalid color '{s}': bad hex digits"));
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(format!("invalid color '{s}': expected #rgb or #rrggbb")),
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|_| format!("invalid color '{s}': bad hex digits"))
        };
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// CIE XYZ tristimulus values, `Y` in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// CIE L*a*b* under D65.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }
}

/// Undo the sRGB transfer curve for one 8-bit channel.
fn srgb_to_linear(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub fn rgb_to_xyz(rgb: Rgb) -> Xyz {
    let r = srgb_to_linear(rgb.r);
    let g = srgb_to_linear(rgb.g);
    let b = srgb_to_linear(rgb.b);
    Xyz {
        x: (r * 0.4124 + g * 0.3576 + b * 0.1805) * 100.0,
        y: (r * 0.2126 + g * 0.7152 + b * 0.0722) * 100.0,
        z: (r * 0.0193 + g * 0.1192 + b * 0.9505) * 100.0,
    }
}

pub fn xyz_to_lab(xyz: Xyz) -> Lab {
    let f = |t: f64| {
        if t > LAB_EPSILON {
            t.cbrt()
        } else {
            LAB_KAPPA_SLOPE * t + 16.0 / 116.0
        }
    };
    let fx = f(xyz.x / D65_WHITE.0);
    let fy = f(xyz.y / D65_WHITE.1);
    let fz = f(xyz.z / D65_WHITE.2);
    Lab {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

pub fn rgb_to_lab(rgb: Rgb) -> Lab {
    rgb.to_lab()
}

/// Hue angle in degrees, normalized to `[0, 360)`.
fn hue_degrees(b: f64, a_prime: f64) -> f64 {
    if b == 0.0 && a_prime == 0.0 {
        return 0.0;
    }
    let h = b.atan2(a_prime).to_degrees();
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

/// CIEDE2000 color difference between two Lab colors.
pub fn ciede2000(lab1: Lab, lab2: Lab) -> f64 {
    let c1 = lab1.a.hypot(lab1.b);
    let c2 = lab2.a.hypot(lab2.b);
    let c_bar = (c1 + c2) / 2.0;
    let c_bar7 = c_bar.powi(7);
    let g = 0.5 * (1.0 - (c_bar7 / (c_bar7 + POW25_7)).sqrt());

    let a1p = (1.0 + g) * lab1.a;
    let a2p = (1.0 + g) * lab2.a;
    let c1p = a1p.hypot(lab1.b);
    let c2p = a2p.hypot(lab2.b);
    let h1p = hue_degrees(lab1.b, a1p);
    let h2p = hue_degrees(lab2.b, a2p);

    let delta_lp = lab2.l - lab1.l;
    let delta_cp = c2p - c1p;

    let chroma_product = c1p * c2p;
    let delta_hp = if chroma_product == 0.0 {
        0.0
    } else {
        let diff = h2p - h1p;
        if diff.abs() <= 180.0 {
            diff
        } else if diff > 180.0 {
            diff - 360.0
        } else {
            diff + 360.0
        }
    };
    let delta_big_hp = 2.0 * chroma_product.sqrt() * (delta_hp.to_radians() / 2.0).sin();

    let l_bar_p = (lab1.l + lab2.l) / 2.0;
    let c_bar_p = (c1p + c2p) / 2.0;
    let h_bar_p = if chroma_product == 0.0 {
        h1p + h2p
    } else if (h1p - h2p).abs() <= 180.0 {
        (h1p + h2p) / 2.0
    } else if h1p + h2p < 360.0 {
        (h1p + h2p + 360.0) / 2.0
    } else {
        (h1p + h2p - 360.0) / 2.0
    };

    let t = 1.0 - 0.17 * (h_bar_p - 30.0).to_radians().cos()
        + 0.24 * (2.0 * h_bar_p).to_radians().cos()
        + 0.32 * (3.0 * h_bar_p + 6.0).to_radians().cos()
        - 0.20 * (4.0 * h_bar_p - 63.0).to_radians().cos();

    let delta_theta = 30.0 * (-((h_bar_p - 275.0) / 25.0).powi(2)).exp();
    let c_bar_p7 = c_bar_p.powi(7);
    let r_c = 2.0 * (c_bar_p7 / (c_bar_p7 + POW25_7)).sqrt();

    let l_dev = (l_bar_p - 50.0).powi(2);
    let s_l = 1.0 + 0.015 * l_dev / (20.0 + l_dev).sqrt();
    let s_c = 1.0 + 0.045 * c_bar_p;
    let s_h = 1.0 + 0.015 * c_bar_p * t;
    let r_t = -(2.0 * delta_theta).to_radians().sin() * r_c;

    let dl = delta_lp / s_l;
    let dc = delta_cp / s_c;
    let dh = delta_big_hp / s_h;

    (dl * dl + dc * dc + dh * dh + r_t * dc * dh).sqrt()
}

/// Perceptual difference between two sRGB colors.
pub fn color_difference(a: Rgb, b: Rgb) -> f64 {
    ciede2000(a.to_lab(), b.to_lab())
}

/// Map a Delta-E to a 0-100 score: 100 at zero, 0 at or beyond `tolerance`.
pub fn delta_e_to_score(delta_e: f64, tolerance: f64) -> f64 {
    if delta_e <= 0.0 {
        100.0
    } else if delta_e >= tolerance {
        0.0
    } else {
        100.0 * (1.0 - delta_e / tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::color_difference::Ciede2000;
    use palette::white_point::D65;
    use proptest::prelude::*;

    // Reference pairs from Sharma, Wu & Dalal's CIEDE2000 test data.
    const SHARMA_PAIRS: &[((f64, f64, f64), (f64, f64, f64), f64)] = &[
        ((50.0, 2.6772, -79.7751), (50.0, 0.0, -82.7485), 2.0425),
        ((50.0, 3.1571, -77.2803), (50.0, 0.0, -82.7485), 2.8615),
        ((50.0, 2.8361, -74.0200), (50.0, 0.0, -82.7485), 3.4412),
        ((50.0, -1.3802, -84.2814), (50.0, 0.0, -82.7485), 1.0000),
        ((50.0, 0.0, 0.0), (50.0, -1.0, 2.0), 2.3669),
        ((50.0, 2.4900, -0.0010), (50.0, -2.4900, 0.0009), 7.1792),
        ((50.0, 2.5000, 0.0), (73.0, 25.0, -18.0), 27.1492),
        ((60.2574, -34.0099, 36.2677), (60.4626, -34.1751, 39.4387), 1.2644),
        ((22.7233, 20.0904, -46.6940), (23.0331, 14.9730, -42.5619), 2.0373),
        ((90.8027, -2.0831, 1.4410), (91.1528, -1.6435, 0.0447), 1.4441),
        ((2.0776, 0.0795, -1.1350), (0.9033, -0.0636, -0.5514), 0.9082),
    ];

    fn lab(t: (f64, f64, f64)) -> Lab {
        Lab::new(t.0, t.1, t.2)
    }

    #[test]
    fn matches_sharma_reference_data() {
        for &(a, b, expected) in SHARMA_PAIRS {
            let got = ciede2000(lab(a), lab(b));
            assert!(
                (got - expected).abs() < 5e-4,
                "{a:?} vs {b:?}: expected {expected}, got {got}"
            );
        }
    }

    #[test]
    fn agrees_with_palette() {
        for &(a, b, _) in SHARMA_PAIRS {
            let pa: palette::Lab<D65, f64> = palette::Lab::new(a.0, a.1, a.2);
            let pb: palette::Lab<D65, f64> = palette::Lab::new(b.0, b.1, b.2);
            let oracle = pa.difference(pb);
            let got = ciede2000(lab(a), lab(b));
            assert!((got - oracle).abs() < 1e-3, "ours {got}, palette {oracle}");
        }
    }

    #[test]
    fn white_and_black_lab() {
        let white = Rgb::new(255, 255, 255).to_lab();
        assert!((white.l - 100.0).abs() < 0.01);
        assert!(white.a.abs() < 0.05 && white.b.abs() < 0.05);

        let black = Rgb::new(0, 0, 0).to_lab();
        assert!(black.l.abs() < 1e-9);
    }

    #[test]
    fn pure_red_lab() {
        let red = rgb_to_lab(Rgb::new(255, 0, 0));
        assert!((red.l - 53.24).abs() < 0.05, "L = {}", red.l);
        assert!((red.a - 80.09).abs() < 0.1, "a = {}", red.a);
        assert!((red.b - 67.20).abs() < 0.1, "b = {}", red.b);
    }

    #[test]
    fn distinct_colors_are_far_apart() {
        assert!(color_difference(Rgb::new(255, 0, 0), Rgb::new(0, 0, 255)) > 40.0);
        assert!(color_difference(Rgb::new(200, 30, 30), Rgb::new(205, 30, 30)) < 3.0);
    }

    #[test]
    fn score_endpoints() {
        assert_eq!(delta_e_to_score(0.0, 20.0), 100.0);
        assert_eq!(delta_e_to_score(20.0, 20.0), 0.0);
        assert_eq!(delta_e_to_score(35.0, 20.0), 0.0);
        assert!((delta_e_to_score(5.0, 20.0) - 75.0).abs() < 1e-12);
    }

    #[test]
    fn hex_parsing() {
        assert_eq!("#ff8000".parse::<Rgb>().unwrap(), Rgb::new(255, 128, 0));
        assert_eq!("0f0".parse::<Rgb>().unwrap(), Rgb::new(0, 255, 0));
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#gg0000".parse::<Rgb>().is_err());
        assert_eq!(Rgb::new(1, 2, 255).to_string(), "#0102ff");
    }

    #[test]
    fn rgb_serde_as_hex() {
        let json = serde_json::to_string(&Rgb::new(255, 0, 16)).unwrap();
        assert_eq!(json, "\"#ff0010\"");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgb::new(255, 0, 16));
    }

    fn any_rgb() -> impl Strategy<Value = Rgb> {
        (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(r, g, b)| Rgb::new(r, g, b))
    }

    proptest! {
        #[test]
        fn delta_e_identity(c in any_rgb()) {
            prop_assert_eq!(color_difference(c, c), 0.0);
        }

        #[test]
        fn delta_e_symmetry(a in any_rgb(), b in any_rgb()) {
            let ab = color_difference(a, b);
            let ba = color_difference(b, a);
            prop_assert!((ab - ba).abs() < 1e-9, "{} vs {}", ab, ba);
        }

        #[test]
        fn score_is_non_increasing(d1 in 0.0f64..100.0, d2 in 0.0f64..100.0, tol in 0.1f64..60.0) {
            let (lo, hi) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            prop_assert!(delta_e_to_score(lo, tol) >= delta_e_to_score(hi, tol));
        }

        #[test]
        fn score_at_tolerance_is_zero(tol in 0.01f64..100.0) {
            prop_assert_eq!(delta_e_to_score(tol, tol), 0.0);
            prop_assert_eq!(delta_e_to_score(0.0, tol), 100.0);
        }
    }
}
