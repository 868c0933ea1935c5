//! File locations of generated assets inside an Android project.

use std::path::{Path, PathBuf};

/// Launcher icon densities and their square size in pixels.
pub const MIPMAP_DENSITIES: [(&str, u32); 6] = [
    ("mipmap-ldpi", 36),
    ("mipmap-mdpi", 48),
    ("mipmap-hdpi", 72),
    ("mipmap-xhdpi", 96),
    ("mipmap-xxhdpi", 144),
    ("mipmap-xxxhdpi", 192),
];

pub const BANNER_SIZE: (u32, u32) = (320, 180);
pub const PLAY_ICON_SIZE: u32 = 512;

pub const LAUNCHER_ICON: &str = "ic_launcher.png";
pub const LAUNCHER_ROUND_ICON: &str = "ic_launcher_round.png";

#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn main_dir(&self) -> PathBuf {
        self.root.join("app").join("src").join("main")
    }

    pub fn res(&self) -> PathBuf {
        self.main_dir().join("res")
    }

    pub fn mipmap(&self, folder: &str) -> PathBuf {
        self.res().join(folder)
    }

    /// Banner written by `banner`.
    pub fn tv_banner(&self) -> PathBuf {
        self.res().join("drawable").join("banner_tv_320x180.png")
    }

    /// Copy of the TV banner referenced as a drawable.
    pub fn tv_banner_drawable(&self) -> PathBuf {
        self.res().join("drawable").join("banner_tv_320x180_drawable.png")
    }

    /// Banner written by `play`.
    pub fn xhdpi_banner(&self) -> PathBuf {
        self.res()
            .join("drawable-xhdpi")
            .join("banner_tv_320x180_drawable.png")
    }

    pub fn playstore_icon(&self) -> PathBuf {
        self.main_dir().join("playstore").join("icon_512.png")
    }

    /// In-app copy of the store icon; also the source for launcher icons.
    pub fn play_icon(&self) -> PathBuf {
        self.mipmap("mipmap-xxxhdpi").join("ic_launcher_play_512.png")
    }

    /// Candidate SVG sources for the TV banner, in order of preference.
    pub fn banner_svg_candidates(&self) -> [PathBuf; 2] {
        [
            self.res().join("drawable").join("banner_tv_320x180.svg"),
            self.main_dir().join("assets").join("banner_tv_320x180.svg"),
        ]
    }
}
