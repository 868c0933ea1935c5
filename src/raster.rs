//! Procedural supersampled rasterizer.
//!
//! A [`Scene`] is a three-stop vertical gradient plus an ordered list of
//! overlays. Each overlay is a predicate over virtual pixel coordinates and a
//! color transform; they run in list order, so later overlays see the output
//! of earlier ones.

use crate::{color::Color, config::Palette};
use image::{ImageBuffer, Rgba, RgbaImage};

pub const DEFAULT_SUPERSAMPLE: u32 = 4;
/// Supersample factors above this are clamped; 512x512 at 16x is already a
/// 8192x8192 virtual canvas.
pub const MAX_SUPERSAMPLE: u32 = 16;

/// Additive brightening inside the coin highlight.
const HIGHLIGHT_AMOUNT: u8 = 48;
/// Highlight reach as a fraction of the coin radius.
const HIGHLIGHT_REACH: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    pub top: Color,
    pub mid: Color,
    pub bottom: Color,
}

impl Gradient {
    /// Color at normalized position `t` in `[0, 1]`.
    pub fn at(&self, t: f64) -> Color {
        if t < 0.5 {
            self.top.lerp(self.mid, t / 0.5)
        } else {
            self.mid.lerp(self.bottom, (t - 0.5) / 0.5)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

impl Circle {
    fn scaled(&self, s: f64) -> Circle {
        Circle {
            cx: (self.cx * s).trunc(),
            cy: (self.cy * s).trunc(),
            r: (self.r * s).trunc(),
        }
    }

    fn offset(&self, x: u32, y: u32) -> (f64, f64) {
        (x as f64 - self.cx, y as f64 - self.cy)
    }

    fn contains(&self, x: u32, y: u32) -> bool {
        let (dx, dy) = self.offset(x, y);
        dx * dx + dy * dy <= self.r * self.r
    }
}

/// Inclusive rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    fn scaled(&self, s: f64) -> Rect {
        Rect {
            x0: (self.x0 * s).trunc(),
            y0: (self.y0 * s).trunc(),
            x1: (self.x1 * s).trunc(),
            y1: (self.y1 * s).trunc(),
        }
    }

    fn contains(&self, x: u32, y: u32) -> bool {
        let (x, y) = (x as f64, y as f64);
        self.x0 <= x && x <= self.x1 && self.y0 <= y && y <= self.y1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    /// Radial gradient from `inner` at the center to `outer` at the rim.
    Coin {
        circle: Circle,
        inner: Color,
        outer: Color,
    },
    /// Brightens the part of the circle up and left of
    /// `center + reach * r` on both axes.
    Highlight {
        circle: Circle,
        reach: f64,
        amount: u8,
    },
    /// Multiplicative darkening of a rectangular band.
    Tint { rect: Rect, factors: [f64; 3] },
}

impl Overlay {
    /// Geometry in virtual pixels for supersample factor `s`.
    fn scaled(&self, s: u32) -> Overlay {
        let s = s as f64;
        match self {
            Overlay::Coin {
                circle,
                inner,
                outer,
            } => Overlay::Coin {
                circle: circle.scaled(s),
                inner: *inner,
                outer: *outer,
            },
            Overlay::Highlight {
                circle,
                reach,
                amount,
            } => Overlay::Highlight {
                circle: circle.scaled(s),
                reach: *reach,
                amount: *amount,
            },
            Overlay::Tint { rect, factors } => Overlay::Tint {
                rect: rect.scaled(s),
                factors: *factors,
            },
        }
    }

    pub fn applies(&self, x: u32, y: u32) -> bool {
        match self {
            Overlay::Coin { circle, .. } => circle.contains(x, y),
            Overlay::Highlight { circle, reach, .. } => {
                let (dx, dy) = circle.offset(x, y);
                let limit = circle.r * reach;
                circle.contains(x, y) && dx < limit && dy < limit
            }
            Overlay::Tint { rect, .. } => rect.contains(x, y),
        }
    }

    pub fn transform(&self, x: u32, y: u32, color: Color) -> Color {
        match self {
            Overlay::Coin {
                circle,
                inner,
                outer,
            } => {
                let (dx, dy) = circle.offset(x, y);
                let t = if circle.r > 0.0 {
                    (dx * dx + dy * dy).sqrt() / circle.r
                } else {
                    0.0
                };
                inner.lerp(*outer, t)
            }
            Overlay::Highlight { amount, .. } => color.brighten(*amount),
            Overlay::Tint { factors, .. } => color.scale(factors[0], factors[1], factors[2]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub background: Gradient,
    pub overlays: Vec<Overlay>,
}

impl Scene {
    pub fn new(palette: &Palette) -> Self {
        Self {
            background: Gradient {
                top: palette.top,
                mid: palette.mid,
                bottom: palette.bottom,
            },
            overlays: Vec::new(),
        }
    }

    pub fn with(mut self, overlay: Overlay) -> Self {
        self.overlays.push(overlay);
        self
    }

    fn coin(palette: &Palette, circle: Circle) -> Overlay {
        Overlay::Coin {
            circle,
            inner: palette.coin_inner,
            outer: palette.coin_outer,
        }
    }

    /// 320x180 TV banner: coin with a top-left highlight and a darkened
    /// title band.
    pub fn tv_banner(palette: &Palette) -> Self {
        let circle = Circle {
            cx: 16.0 + 48.0,
            cy: 22.0 + 48.0,
            r: 48.0,
        };
        Self::new(palette)
            .with(Self::coin(palette, circle))
            .with(Overlay::Highlight {
                circle,
                reach: HIGHLIGHT_REACH,
                amount: HIGHLIGHT_AMOUNT,
            })
            .with(Overlay::Tint {
                rect: Rect {
                    x0: 124.0,
                    y0: 112.0,
                    x1: 300.0,
                    y1: 140.0,
                },
                factors: [0.88, 0.90, 0.88],
            })
    }

    /// 320x180 Play Store banner: the plain coin.
    ///
    /// Gradient and coin interpolation round half up here as in every scene,
    /// so a channel may land one step above what a truncating renderer
    /// produces for the same palette.
    pub fn play_banner(palette: &Palette) -> Self {
        Self::new(palette).with(Self::coin(
            palette,
            Circle {
                cx: 64.0,
                cy: 70.0,
                r: 48.0,
            },
        ))
    }

    /// Square store icon: a centered coin filling 72% of the short side.
    pub fn play_icon(palette: &Palette, width: u32, height: u32) -> Self {
        let circle = Circle {
            cx: (width / 2) as f64,
            cy: (height / 2) as f64,
            r: width.min(height) as f64 * 0.36,
        };
        Self::new(palette).with(Self::coin(palette, circle))
    }

    fn shade(&self, overlays: &[Overlay], background: Color, x: u32, y: u32) -> Color {
        overlays
            .iter()
            .filter(|overlay| overlay.applies(x, y))
            .fold(background, |color, overlay| overlay.transform(x, y, color))
    }

    /// Render at `scale`x the target size without downsampling.
    pub fn render_hires(&self, width: u32, height: u32, scale: u32) -> RgbaImage {
        let scale = scale.clamp(1, MAX_SUPERSAMPLE);
        let (sw, sh) = (width * scale, height * scale);
        let overlays: Vec<Overlay> = self.overlays.iter().map(|o| o.scaled(scale)).collect();

        let rows: Vec<Color> = (0..sh)
            .map(|y| {
                let t = if sh > 1 {
                    y as f64 / (sh - 1) as f64
                } else {
                    0.0
                };
                self.background.at(t)
            })
            .collect();

        ImageBuffer::from_fn(sw, sh, |x, y| {
            self.shade(&overlays, rows[y as usize], x, y).to_rgba()
        })
    }

    /// Render the scene at `width`x`height`, supersampled by `scale`.
    pub fn rasterize(&self, width: u32, height: u32, scale: u32) -> RgbaImage {
        let scale = scale.clamp(1, MAX_SUPERSAMPLE);
        let hires = self.render_hires(width, height, scale);
        downsample(&hires, scale)
    }
}

/// Box-filter `hires` by `scale`, averaging each channel with round-half-up
/// integer division. Alpha is always opaque.
pub fn downsample(hires: &RgbaImage, scale: u32) -> RgbaImage {
    let scale = scale.clamp(1, MAX_SUPERSAMPLE);
    let (width, height) = (hires.width() / scale, hires.height() / scale);
    let area = scale * scale;

    ImageBuffer::from_fn(width, height, |x, y| {
        let mut sums = [0u32; 3];
        for yy in y * scale..(y + 1) * scale {
            for xx in x * scale..(x + 1) * scale {
                let px = hires.get_pixel(xx, yy);
                for (sum, channel) in sums.iter_mut().zip(px.0.iter()) {
                    *sum += *channel as u32;
                }
            }
        }
        let avg = |sum: u32| ((sum + area / 2) / area).min(255) as u8;
        Rgba([avg(sums[0]), avg(sums[1]), avg(sums[2]), 255])
    })
}
