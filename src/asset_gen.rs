use crate::{
    config::{AssetConfig, MAX_ROUND_OVERSCALE},
    error::AssetError,
    layout::{
        ProjectLayout, BANNER_SIZE, LAUNCHER_ICON, LAUNCHER_ROUND_ICON, MIPMAP_DENSITIES,
        PLAY_ICON_SIZE,
    },
    png_writer::PngWriter,
    raster::Scene,
    vector::{default_chain, rasterize_first_available},
    verify::{csv_bool, read_header},
};
use anyhow::{Context, Result};
use image::{
    imageops::{self, FilterType},
    Rgba, RgbaImage,
};
use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};

/// Render the TV banner, preferring an SVG source when a rasterizer is
/// installed, and write it to both drawable locations.
pub fn generate_banner(layout: &ProjectLayout, config: &AssetConfig) -> Result<()> {
    println!("Generating TV banner...");
    let (width, height) = BANNER_SIZE;

    let raster = match rasterize_banner_svg(layout, config, width, height) {
        Some(raster) => raster,
        None => Scene::tv_banner(&config.palette).rasterize(width, height, config.supersample),
    };

    let bytes = PngWriter::new(config.srgb_chunk)
        .encode(&raster)
        .context("Failed to encode banner")?;
    for path in [layout.tv_banner(), layout.tv_banner_drawable()] {
        ensure_parent(&path)?;
        std::fs::write(&path, &bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("  ✓ Generated {}", path.display());
    }

    Ok(())
}

fn rasterize_banner_svg(
    layout: &ProjectLayout,
    config: &AssetConfig,
    width: u32,
    height: u32,
) -> Option<RgbaImage> {
    let Some(svg) = layout
        .banner_svg_candidates()
        .into_iter()
        .find(|p| p.exists())
    else {
        log::debug!("no banner SVG found, using procedural banner");
        return None;
    };

    match rasterize_first_available(&default_chain(), &svg, width, height) {
        Some((tool, raster)) => {
            log::info!("rasterized {} with {tool}", svg.display());
            Some(raster)
        }
        None => {
            let msg = format!(
                "no SVG rasterizer could render {}, using procedural banner",
                svg.display()
            );
            if config.warn_on_vector_fallback {
                log::warn!("{msg}");
            } else {
                log::info!("{msg}");
            }
            None
        }
    }
}

/// Write the Play Store banner and 512px store icon, and copy the icon into
/// `mipmap-xxxhdpi` for in-app use.
pub fn generate_play_assets(layout: &ProjectLayout, config: &AssetConfig) -> Result<()> {
    println!("Generating banner and icons...");
    let writer = PngWriter::new(config.srgb_chunk);

    let (width, height) = BANNER_SIZE;
    let banner = Scene::play_banner(&config.palette).rasterize(width, height, config.supersample);
    let banner_path = layout.xhdpi_banner();
    save_png(&writer, &banner, &banner_path)?;
    println!("  ✓ Generated {}", banner_path.display());

    let icon = Scene::play_icon(&config.palette, PLAY_ICON_SIZE, PLAY_ICON_SIZE).rasterize(
        PLAY_ICON_SIZE,
        PLAY_ICON_SIZE,
        config.supersample,
    );
    let store_path = layout.playstore_icon();
    save_png(&writer, &icon, &store_path)?;
    println!("  ✓ Generated {}", store_path.display());

    let mipmap_path = layout.play_icon();
    ensure_parent(&mipmap_path)?;
    std::fs::copy(&store_path, &mipmap_path)
        .with_context(|| format!("Failed to copy store icon to {}", mipmap_path.display()))?;
    println!("  ✓ Copied to {}", mipmap_path.display());

    Ok(())
}

/// Square and round launcher icons for every density, resized from the
/// store icon.
pub fn generate_launcher_icons(layout: &ProjectLayout, config: &AssetConfig) -> Result<()> {
    let source = load_source(&layout.play_icon())?;
    let ts = chrono::Utc::now().timestamp();
    let writer = PngWriter::new(config.srgb_chunk);
    let mut rows = Vec::new();

    println!("Generating Android launcher icons...");
    for (folder, size) in MIPMAP_DENSITIES {
        let mipmap_dir = layout.mipmap(folder);
        create_dir_all(&mipmap_dir)?;
        let square_path = mipmap_dir.join(LAUNCHER_ICON);
        let round_path = mipmap_dir.join(LAUNCHER_ROUND_ICON);
        for path in [&square_path, &round_path] {
            backup_existing(path, ts)?;
        }

        let square = imageops::resize(&source, size, size, FilterType::Lanczos3);
        save_png(&writer, &square, &square_path)?;
        let round = apply_circular_mask(&square);
        save_png(&writer, &round, &round_path)?;
        println!("  ✓ Generated {folder}/{LAUNCHER_ICON} and {folder}/{LAUNCHER_ROUND_ICON}");

        let (dims, has_alpha) = match read_header(&round_path) {
            Ok(h) => (format!("{}x{}", h.width, h.height), h.has_alpha()),
            Err(_) => ("ERR".to_string(), false),
        };
        rows.push(format!(
            "{folder},{size},{},{},{dims},{}",
            csv_bool(square_path.exists()),
            csv_bool(round_path.exists()),
            csv_bool(has_alpha)
        ));
    }

    println!("folder,size,ic_launcher_exists,ic_launcher_round_exists,round_dims,round_has_alpha");
    for row in rows {
        println!("{row}");
    }
    println!("\nBackups (if any) saved as *.bak.<timestamp> in the same folders (timestamp={ts}).");

    Ok(())
}

/// Regenerate round launcher icons with the artwork overscaled so it reaches
/// the circle edge.
pub fn generate_round_fill(layout: &ProjectLayout, config: &AssetConfig) -> Result<()> {
    let source = load_source(&layout.play_icon())?;
    let ts = chrono::Utc::now().timestamp();
    let writer = PngWriter::new(config.srgb_chunk);
    let mut rows = Vec::new();

    println!("Generating Android round icons...");
    for (folder, size) in MIPMAP_DENSITIES {
        let mipmap_dir = layout.mipmap(folder);
        create_dir_all(&mipmap_dir)?;
        let round_path = mipmap_dir.join(LAUNCHER_ROUND_ICON);
        backup_existing(&round_path, ts)?;

        let filled = overscaled_crop(&source, size, config.round_overscale);
        save_png(&writer, &apply_circular_mask(&filled), &round_path)?;
        println!("  ✓ Generated {folder}/{LAUNCHER_ROUND_ICON}");

        let header = read_header(&round_path)?;
        rows.push(format!(
            "{folder},{},{},{},{},{},{}",
            round_path.display(),
            header.bytes,
            header.width,
            header.height,
            header.color_type,
            csv_bool(header.has_alpha())
        ));
    }

    println!("folder,file,bytes,width,height,color_type,has_alpha");
    for row in rows {
        println!("{row}");
    }

    Ok(())
}

fn load_source(path: &Path) -> Result<RgbaImage> {
    if !path.exists() {
        return Err(AssetError::MissingInput(path.to_path_buf()).into());
    }
    let source = image::open(path)
        .with_context(|| format!("Failed to load image {}", path.display()))?
        .to_rgba8();

    if source.width() != source.height() {
        log::warn!(
            "source {} is not square ({}x{}), icons will be stretched",
            path.display(),
            source.width(),
            source.height()
        );
    }

    Ok(source)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)
            .with_context(|| format!("Can't create directory {}", parent.display()))?;
    }
    Ok(())
}

fn save_png(writer: &PngWriter, raster: &RgbaImage, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    writer
        .write_file(raster, path)
        .with_context(|| format!("Failed to write PNG {}", path.display()))
}

/// Move `path` to `<path>.bak.<ts>` unless that backup already exists.
fn backup_existing(path: &Path, ts: i64) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".bak.{ts}"));
    let backup = path.with_file_name(name);
    if backup.exists() {
        return Ok(None);
    }
    std::fs::rename(path, &backup)
        .with_context(|| format!("Failed to back up {}", path.display()))?;
    log::info!("backed up {} to {}", path.display(), backup.display());
    Ok(Some(backup))
}

/// Center-crop to a square, scale up by `overscale`, then center-crop back to
/// `size`x`size`.
fn overscaled_crop(source: &RgbaImage, size: u32, overscale: f32) -> RgbaImage {
    let side = source.width().min(source.height());
    let square = imageops::crop_imm(
        source,
        (source.width() - side) / 2,
        (source.height() - side) / 2,
        side,
        side,
    )
    .to_image();

    let overscale = overscale.clamp(1.0, MAX_ROUND_OVERSCALE);
    let bigger = ((size as f32 * overscale) as u32).max(size);
    let fitted = imageops::resize(&square, bigger, bigger, FilterType::Lanczos3);
    let left = (bigger - size) / 2;
    imageops::crop_imm(&fitted, left, left, size, size).to_image()
}

/// Apply a circular mask to an image to create a round icon
fn apply_circular_mask(img: &RgbaImage) -> RgbaImage {
    let (width, height) = img.dimensions();
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let radius = width.min(height) as f32 / 2.0;

    let mut masked = img.clone();
    for (x, y, pixel) in masked.enumerate_pixels_mut() {
        let dx = x as f32 - center_x;
        let dy = y as f32 - center_y;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance > radius {
            *pixel = Rgba([0, 0, 0, 0]);
        } else if distance > radius - 1.0 {
            // Anti-aliasing edge
            let alpha_factor = radius - distance;
            pixel[3] = (pixel[3] as f32 * alpha_factor) as u8;
        }
    }

    masked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::RoundMetrics;

    fn opaque(size: u32) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba([240, 180, 40, 255]))
    }

    #[test]
    fn circular_mask_clears_corners_and_keeps_center() {
        for (_, size) in MIPMAP_DENSITIES {
            let metrics = RoundMetrics::measure(&apply_circular_mask(&opaque(size)));
            assert_eq!(metrics.corner, 0, "corner for {size}");
            assert_eq!(metrics.center, 255, "center for {size}");
            assert!(metrics.is_round(), "{size}: {metrics:?}");
        }
    }

    #[test]
    fn overscaled_crop_keeps_target_size() {
        let src = RgbaImage::from_pixel(300, 200, Rgba([1, 2, 3, 255]));
        let out = overscaled_crop(&src, 48, 1.08);
        assert_eq!(out.dimensions(), (48, 48));
        assert_eq!(overscaled_crop(&opaque(64), 36, 1.0).dimensions(), (36, 36));
    }

    #[test]
    fn overscaled_crop_bounds_extreme_factors() {
        for overscale in [f32::MAX, f32::NAN, 0.0] {
            let out = overscaled_crop(&opaque(64), 36, overscale);
            assert_eq!(out.dimensions(), (36, 36), "overscale {overscale}");
        }
    }

    #[test]
    fn backup_moves_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ic_launcher.png");

        assert!(backup_existing(&path, 7).unwrap().is_none());

        std::fs::write(&path, b"first").unwrap();
        let backup = backup_existing(&path, 7).unwrap().unwrap();
        assert_eq!(backup, dir.path().join("ic_launcher.png.bak.7"));
        assert!(!path.exists());

        // An existing backup for the same timestamp is never overwritten.
        std::fs::write(&path, b"second").unwrap();
        assert!(backup_existing(&path, 7).unwrap().is_none());
        assert!(path.exists());
        assert_eq!(std::fs::read(&backup).unwrap(), b"first");
    }

    #[test]
    fn launcher_without_source_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        let err = generate_launcher_icons(&layout, &AssetConfig::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AssetError>(),
            Some(AssetError::MissingInput(_))
        ));
    }

    #[test]
    fn procedural_banner_written_twice_identically() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        generate_banner(&layout, &AssetConfig::default()).unwrap();

        let a = std::fs::read(layout.tv_banner()).unwrap();
        let b = std::fs::read(layout.tv_banner_drawable()).unwrap();
        assert_eq!(a, b);
        let decoded = image::load_from_memory(&a).unwrap();
        assert_eq!((decoded.width(), decoded.height()), BANNER_SIZE);
    }
}
