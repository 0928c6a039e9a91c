//! 256-entry RGB ramps for the activity heat map.
//!
//! Two variants: `heat` (red through orange to yellow, matching the legend)
//! and `viridis`. Ramps are built once at startup by linear interpolation
//! over anchor colors.

use clap::ValueEnum;

/// One opaque RGB pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale each channel by `num / 255`.
    pub fn dimmed(self, num: u16) -> Rgb {
        Rgb {
            r: (self.r as u16 * num / 255) as u8,
            g: (self.g as u16 * num / 255) as u8,
            b: (self.b as u16 * num / 255) as u8,
        }
    }
}

/// Selectable ramp variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Colormap {
    /// Red (no harvest) to yellow (nominal).
    #[default]
    Heat,
    /// Perceptually uniform viridis.
    Viridis,
}

impl Colormap {
    /// Variant selected by environment when no flag was given: the bare
    /// presence of `CMAP_VIRIDIS` switches to viridis.
    pub fn from_env() -> Self {
        if std::env::var_os("CMAP_VIRIDIS").is_some() {
            Colormap::Viridis
        } else {
            Colormap::Heat
        }
    }
}

/// Endpoints of the heat ramp line up with the legend colors.
const HEAT_ANCHORS: &[Rgb] = &[
    Rgb::new(0xf0, 0x00, 0x00),
    Rgb::new(0xf0, 0xa0, 0x00),
    Rgb::new(0xf0, 0xf0, 0x00),
];

const VIRIDIS_ANCHORS: &[Rgb] = &[
    Rgb::new(68, 1, 84),
    Rgb::new(72, 40, 120),
    Rgb::new(62, 74, 137),
    Rgb::new(49, 104, 142),
    Rgb::new(38, 130, 142),
    Rgb::new(31, 158, 137),
    Rgb::new(53, 183, 121),
    Rgb::new(109, 205, 89),
    Rgb::new(180, 222, 44),
    Rgb::new(253, 231, 37),
];

/// A 256-entry color ramp indexed by achieved ratio.
pub struct ColorRamp {
    entries: [Rgb; 256],
}

impl ColorRamp {
    pub fn build(map: Colormap) -> Self {
        let anchors = match map {
            Colormap::Heat => HEAT_ANCHORS,
            Colormap::Viridis => VIRIDIS_ANCHORS,
        };
        let mut entries = [Rgb::BLACK; 256];
        let segments = anchors.len() - 1;
        for (i, entry) in entries.iter_mut().enumerate() {
            // Position of this entry along the anchor chain.
            let pos = i as f64 / 255.0 * segments as f64;
            let seg = (pos as usize).min(segments - 1);
            let t = pos - seg as f64;
            *entry = lerp(anchors[seg], anchors[seg + 1], t);
        }
        Self { entries }
    }

    /// Entry for a ratio in [0, 1]; out-of-range input is clamped.
    pub fn color(&self, achieved: f64) -> Rgb {
        let idx = (achieved.clamp(0.0, 1.0) * 255.0) as usize;
        self.entries[idx]
    }
}

fn lerp(a: Rgb, b: Rgb, t: f64) -> Rgb {
    let ch = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    Rgb {
        r: ch(a.r, b.r),
        g: ch(a.g, b.g),
        b: ch(a.b, b.b),
    }
}
