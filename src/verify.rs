//! Size, fill and alpha heuristics for generated assets.
//!
//! The IHDR header is read straight from the bytes so that a file with a
//! broken body still reports its declared size. Pixel checks decode the full
//! image with the `image` crate.

use crate::{
    error::{AssetError, Result},
    layout::{
        ProjectLayout, BANNER_SIZE, LAUNCHER_ICON, LAUNCHER_ROUND_ICON, MIPMAP_DENSITIES,
        PLAY_ICON_SIZE,
    },
    png_writer::SIGNATURE,
};
use image::RgbaImage;
use std::{fmt, path::Path};

/// Minimum alpha fill fraction for banners.
pub const BANNER_MIN_FILL: f64 = 0.90;
/// Minimum alpha fill fraction for the store icon.
pub const PLAY_ICON_MIN_FILL: f64 = 0.95;
/// Minimum alpha fill fraction for round launcher icons.
pub const ROUND_MIN_FILL: f64 = 0.7;
/// Center alpha of a round icon must exceed this.
pub const ROUND_MIN_CENTER_ALPHA: u8 = 200;

/// Process exit status when any check fails.
pub const EXIT_FAILED: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngHeader {
    pub width: u32,
    pub height: u32,
    pub color_type: u8,
    pub bytes: usize,
}

impl PngHeader {
    /// Grayscale+alpha or RGBA.
    pub fn has_alpha(&self) -> bool {
        matches!(self.color_type, 4 | 6)
    }
}

/// Read width, height and color type from the IHDR chunk.
pub fn parse_ihdr(data: &[u8]) -> Option<PngHeader> {
    if data.len() < 8 + 8 + 13 || data[..8] != SIGNATURE || &data[12..16] != b"IHDR" {
        return None;
    }
    let be = |at: usize| u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);
    Some(PngHeader {
        width: be(16),
        height: be(20),
        color_type: data[25],
        bytes: data.len(),
    })
}

pub fn read_header(path: &Path) -> Result<PngHeader> {
    let data = std::fs::read(path)?;
    parse_ihdr(&data).ok_or_else(|| AssetError::MalformedOutput {
        path: path.to_path_buf(),
        reason: "not a PNG header".to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillMetrics {
    pub width: u32,
    pub height: u32,
    /// Width and height of the bounding box of non-zero pixels.
    pub trimmed: (u32, u32),
    /// Fraction of pixels with alpha > 0, rounded to three decimals.
    pub fraction: f64,
}

impl FillMetrics {
    pub fn measure(img: &RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut bbox: Option<(u32, u32, u32, u32)> = None;
        let mut non_transparent = 0u64;

        for (x, y, px) in img.enumerate_pixels() {
            if px[3] > 0 {
                non_transparent += 1;
            }
            if px.0.iter().any(|&c| c != 0) {
                bbox = Some(match bbox {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }

        let trimmed = bbox.map_or((0, 0), |(x0, y0, x1, y1)| (x1 - x0 + 1, y1 - y0 + 1));
        let total = width as u64 * height as u64;
        let fraction = if total == 0 {
            0.0
        } else {
            round3(non_transparent as f64 / total as f64)
        };

        Self {
            width,
            height,
            trimmed,
            fraction,
        }
    }

    /// Content reaches every edge, or covers at least `min_fraction`.
    pub fn fills(&self, min_fraction: f64) -> bool {
        self.trimmed == (self.width, self.height) || self.fraction >= min_fraction
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundMetrics {
    pub corner: u8,
    pub center: u8,
    pub fraction: f64,
}

impl RoundMetrics {
    pub fn measure(img: &RgbaImage) -> Self {
        let (w, h) = img.dimensions();
        if w == 0 || h == 0 {
            return Self {
                corner: 0,
                center: 0,
                fraction: 0.0,
            };
        }
        Self {
            corner: img.get_pixel(0, 0)[3],
            center: img.get_pixel(w / 2, h / 2)[3],
            fraction: FillMetrics::measure(img).fraction,
        }
    }

    /// Transparent corners, opaque center, mostly filled.
    pub fn is_round(&self) -> bool {
        self.corner == 0 && self.center > ROUND_MIN_CENTER_ALPHA && self.fraction > ROUND_MIN_FILL
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Report float: whole values keep a trailing `.0`.
pub fn csv_float(v: f64) -> String {
    format!("{v:?}")
}

/// Report boolean, capitalized.
pub fn csv_bool(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warn,
    Missing,
    InvalidPng,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Ok => "OK",
            Status::Warn => "WARN",
            Status::Missing => "MISSING",
            Status::InvalidPng => "INVALID_PNG",
        })
    }
}

/// One line of the CSV report.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub kind: &'static str,
    pub subject: String,
    pub status: Status,
    pub fields: Vec<String>,
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.kind, self.subject, self.status)?;
        for field in &self.fields {
            write!(f, ",{field}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Report {
    pub rows: Vec<Row>,
    pub issues: Vec<String>,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            EXIT_FAILED
        }
    }

    fn push(&mut self, kind: &'static str, subject: String, status: Status, fields: Vec<String>) {
        self.rows.push(Row {
            kind,
            subject,
            status,
            fields,
        });
    }

    pub fn print(&self) {
        println!("\nCSV report (type, path/info...):");
        for row in &self.rows {
            println!("{row}");
        }

        println!("\nSummary:");
        if self.passed() {
            println!("PASS: All checked assets meet the basic size and fill heuristics.");
        } else {
            println!("FAIL: The following issues were detected:");
            for issue in &self.issues {
                println!(" - {issue}");
            }
        }
    }

    /// Check a banner or store icon: expected size and canvas fill.
    fn check_canvas(&mut self, kind: &'static str, path: &Path, expected: (u32, u32), min_fill: f64) {
        let subject = path.display().to_string();
        let Some(img) = self.load(kind, path) else {
            return;
        };

        let metrics = FillMetrics::measure(&img);
        let ok_size = (metrics.width, metrics.height) == expected;
        let fills = metrics.fills(min_fill);
        let status = if ok_size && fills { Status::Ok } else { Status::Warn };
        self.push(
            kind,
            subject.clone(),
            status,
            vec![
                metrics.width.to_string(),
                metrics.height.to_string(),
                metrics.trimmed.0.to_string(),
                metrics.trimmed.1.to_string(),
                csv_float(metrics.fraction),
            ],
        );

        if !ok_size {
            self.issues.push(format!(
                "{kind} wrong size {}x{} (expected {}x{}): {subject}",
                metrics.width, metrics.height, expected.0, expected.1
            ));
        }
        if !fills {
            self.issues.push(format!(
                "{kind} does not fill canvas (trim={:?}, non-transparent fraction={:?}): {subject}",
                metrics.trimmed, metrics.fraction
            ));
        }
    }

    fn check_square(&mut self, folder: &str, path: &Path, expected: u32) {
        if !path.exists() {
            self.push("mipmap_square", folder.to_string(), Status::Missing, vec![]);
            self.issues
                .push(format!("mipmap square missing: {}", path.display()));
            return;
        }

        let header = read_header(path).ok();
        let ok = header.is_some_and(|h| h.width == expected && h.height == expected);
        let (w, h) = header.map_or((0, 0), |h| (h.width, h.height));
        self.push(
            "mipmap_square",
            folder.to_string(),
            if ok { Status::Ok } else { Status::Warn },
            vec![w.to_string(), h.to_string(), expected.to_string()],
        );
        if !ok {
            let got = match header {
                Some(h) => format!("{}x{}", h.width, h.height),
                None => "INVALID PNG".to_string(),
            };
            self.issues.push(format!(
                "mipmap square wrong size for {folder}: got {got}, expected {expected}x{expected}"
            ));
        }
    }

    fn check_round(&mut self, folder: &str, path: &Path, expected: u32) {
        if !path.exists() {
            self.push("mipmap_round", folder.to_string(), Status::Missing, vec![]);
            self.issues
                .push(format!("mipmap round missing: {}", path.display()));
            return;
        }

        let header = match read_header(path) {
            Ok(h) => h,
            Err(e) => {
                self.push("mipmap_round", folder.to_string(), Status::InvalidPng, vec![]);
                self.issues.push(format!("mipmap round {folder}: {e}"));
                return;
            }
        };
        let img = match image::open(path) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                self.push("mipmap_round", folder.to_string(), Status::InvalidPng, vec![]);
                self.issues
                    .push(format!("mipmap round {folder} could not be decoded: {e}"));
                return;
            }
        };

        let metrics = RoundMetrics::measure(&img);
        let ok_size = header.width == expected && header.height == expected;
        let ok_alpha = metrics.is_round();
        self.push(
            "mipmap_round",
            folder.to_string(),
            if ok_size && ok_alpha { Status::Ok } else { Status::Warn },
            vec![
                header.width.to_string(),
                header.height.to_string(),
                metrics.corner.to_string(),
                metrics.center.to_string(),
                csv_float(metrics.fraction),
            ],
        );
        if !ok_size {
            self.issues.push(format!(
                "mipmap round wrong size for {folder}: got {}x{}, expected {expected}x{expected}",
                header.width, header.height
            ));
        }
        if !ok_alpha {
            self.issues.push(format!(
                "mipmap round alpha/padding issue for {folder}: corner={}, center={}, alpha_frac={:?}",
                metrics.corner, metrics.center, metrics.fraction
            ));
        }
    }

    /// Decode `path`, recording MISSING or INVALID_PNG rows on failure.
    fn load(&mut self, kind: &'static str, path: &Path) -> Option<RgbaImage> {
        let subject = path.display().to_string();
        if !path.exists() {
            self.push(kind, subject.clone(), Status::Missing, vec![]);
            self.issues.push(format!("{kind} missing: {subject}"));
            return None;
        }
        if let Err(e) = read_header(path) {
            log::debug!("{e}");
            self.push(kind, subject.clone(), Status::InvalidPng, vec![]);
            self.issues.push(format!("{kind} invalid PNG: {subject}"));
            return None;
        }
        match image::open(path) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                self.push(kind, subject.clone(), Status::InvalidPng, vec![]);
                self.issues
                    .push(format!("{kind} could not be decoded ({e}): {subject}"));
                None
            }
        }
    }
}

/// Check every banner, store icon and launcher icon in the project.
pub fn verify_assets(layout: &ProjectLayout) -> Report {
    let mut report = Report::default();

    for path in [layout.xhdpi_banner(), layout.tv_banner()] {
        report.check_canvas("banner", &path, BANNER_SIZE, BANNER_MIN_FILL);
    }

    report.check_canvas(
        "play",
        &layout.play_icon(),
        (PLAY_ICON_SIZE, PLAY_ICON_SIZE),
        PLAY_ICON_MIN_FILL,
    );

    for (folder, size) in MIPMAP_DENSITIES {
        let dir = layout.mipmap(folder);
        report.check_square(folder, &dir.join(LAUNCHER_ICON), size);
        report.check_round(folder, &dir.join(LAUNCHER_ROUND_ICON), size);
    }

    report
}
