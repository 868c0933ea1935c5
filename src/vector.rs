//! External SVG rasterizers.
//!
//! None of these tools are required. Each one checks that its executable is
//! on `PATH` before running, and any failure is reported as
//! [`AssetError::UnsupportedEnvironment`] so callers can fall back to the
//! procedural generator.

use crate::error::{AssetError, Result};
use image::{imageops::FilterType, RgbaImage};
use std::{
    ffi::OsString,
    path::Path,
    process::{Command, Stdio},
};

pub trait VectorRasterizer {
    fn name(&self) -> &'static str;

    /// Rasterize `svg` to exactly `width`x`height`.
    fn rasterize(&self, svg: &Path, width: u32, height: u32) -> Result<RgbaImage>;
}

/// A command-line rasterizer invoked as `exe <args...>`, writing a PNG.
#[derive(Debug, Clone, Copy)]
pub enum ExternalTool {
    /// librsvg's `rsvg-convert`
    RsvgConvert,
    /// the `cairosvg` CLI
    CairoSvg,
    /// ImageMagick `convert`
    ImageMagick,
}

impl ExternalTool {
    pub fn exe(&self) -> &'static str {
        match self {
            ExternalTool::RsvgConvert => "rsvg-convert",
            ExternalTool::CairoSvg => "cairosvg",
            ExternalTool::ImageMagick => "convert",
        }
    }

    fn args(&self, svg: &Path, out: &Path, width: u32, height: u32) -> Vec<OsString> {
        let (w, h) = (width.to_string(), height.to_string());
        match self {
            ExternalTool::RsvgConvert => vec![
                "-w".into(),
                w.into(),
                "-h".into(),
                h.into(),
                "-o".into(),
                out.into(),
                svg.into(),
            ],
            ExternalTool::CairoSvg => vec![
                svg.into(),
                "--output-width".into(),
                w.into(),
                "--output-height".into(),
                h.into(),
                "-o".into(),
                out.into(),
            ],
            ExternalTool::ImageMagick => vec![
                svg.into(),
                "-background".into(),
                "none".into(),
                "-resize".into(),
                format!("{width}x{height}!").into(),
                out.into(),
            ],
        }
    }

    fn unavailable(&self, reason: impl Into<String>) -> AssetError {
        AssetError::UnsupportedEnvironment {
            tool: self.exe(),
            reason: reason.into(),
        }
    }
}

impl VectorRasterizer for ExternalTool {
    fn name(&self) -> &'static str {
        self.exe()
    }

    fn rasterize(&self, svg: &Path, width: u32, height: u32) -> Result<RgbaImage> {
        if which::which(self.exe()).is_err() {
            return Err(self.unavailable("not found on PATH"));
        }

        let out = tempfile::Builder::new().suffix(".png").tempfile()?;
        let status = Command::new(self.exe())
            .args(self.args(svg, out.path(), width, height))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| self.unavailable(format!("failed to run: {e}")))?;
        if !status.success() {
            return Err(self.unavailable(format!("exited with {status}")));
        }

        let img = image::open(out.path())
            .map_err(|e| self.unavailable(format!("unreadable output: {e}")))?
            .to_rgba8();
        if img.dimensions() == (width, height) {
            Ok(img)
        } else {
            log::debug!(
                "{} produced {}x{}, resizing to {width}x{height}",
                self.exe(),
                img.width(),
                img.height()
            );
            Ok(image::imageops::resize(&img, width, height, FilterType::Lanczos3))
        }
    }
}

/// Tools tried by [`rasterize_first_available`], in order.
pub fn default_chain() -> Vec<Box<dyn VectorRasterizer>> {
    vec![
        Box::new(ExternalTool::RsvgConvert),
        Box::new(ExternalTool::CairoSvg),
        Box::new(ExternalTool::ImageMagick),
    ]
}

/// Return the first successful rasterization and the tool that produced it.
pub fn rasterize_first_available(
    chain: &[Box<dyn VectorRasterizer>],
    svg: &Path,
    width: u32,
    height: u32,
) -> Option<(&'static str, RgbaImage)> {
    for tool in chain {
        match tool.rasterize(svg, width, height) {
            Ok(img) => return Some((tool.name(), img)),
            Err(e) => log::debug!("{e}"),
        }
    }
    None
}
