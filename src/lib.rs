//! Generate and verify Android launcher icons, TV banners and Play Store
//! assets.
//!
//! Procedural assets go through [`raster::Scene`] and are written with
//! [`png_writer::PngWriter`]; launcher icons are resized from the store icon
//! with the `image` crate. [`verify::verify_assets`] checks the results.

pub mod asset_gen;
pub mod color;
pub mod config;
pub mod error;
pub mod layout;
pub mod png_writer;
pub mod raster;
pub mod vector;
pub mod verify;

pub use error::{AssetError, Result};
