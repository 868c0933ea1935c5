use android_asset_gen::{asset_gen, config::AssetConfig, layout::ProjectLayout, verify};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{io::Write, path::PathBuf};

#[derive(Debug, Parser)]
#[clap(
    name = "asset-gen",
    about = "Generate and verify Android launcher icons, TV banners and Play Store assets"
)]
struct Args {
    /// Android project root (the directory containing `app/`).
    #[clap(short, long, value_name = "DIR", default_value = ".", global = true)]
    project: PathBuf,

    /// JSON file overriding palette, supersampling and fallback behavior.
    #[clap(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render the 320x180 TV banner (from SVG when a rasterizer is installed)
    Banner,
    /// Render the Play Store banner and 512x512 store icon
    Play,
    /// Resize the store icon into square and round launcher icons
    Launcher,
    /// Regenerate round launcher icons so the artwork fills the circle
    RoundFill,
    /// Check sizes, fill and alpha of all assets and print a report
    Verify,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "[{} {style}{}{style:#} {}:{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record
                    .file()
                    .unwrap_or("None")
                    .split('/')
                    .next_back()
                    .unwrap_or("None"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AssetConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AssetConfig::default(),
    };
    let layout = ProjectLayout::new(&args.project);

    match args.command {
        Command::Banner => asset_gen::generate_banner(&layout, &config),
        Command::Play => asset_gen::generate_play_assets(&layout, &config),
        Command::Launcher => asset_gen::generate_launcher_icons(&layout, &config),
        Command::RoundFill => asset_gen::generate_round_fill(&layout, &config),
        Command::Verify => {
            let report = verify::verify_assets(&layout);
            report.print();
            if !report.passed() {
                std::process::exit(report.exit_code());
            }
            Ok(())
        }
    }
}
