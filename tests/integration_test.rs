use image::{Rgba, RgbaImage};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn asset_gen(project: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_asset-gen"))
        .arg("--project")
        .arg(project)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to run asset-gen")
}

fn assert_success(output: &Output, what: &str) {
    if !output.status.success() {
        eprintln!("stdout: {}", String::from_utf8_lossy(&output.stdout));
        eprintln!("stderr: {}", String::from_utf8_lossy(&output.stderr));
        panic!("asset-gen {what} failed with status: {}", output.status);
    }
}

fn res(project: &Path) -> std::path::PathBuf {
    project.join("app").join("src").join("main").join("res")
}

/// Generates every asset into an empty project and asserts that `verify`
/// passes over the result.
#[test]
fn test_generate_all_then_verify_passes() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let project = temp_dir.path();

    for command in ["play", "launcher", "banner"] {
        assert_success(&asset_gen(project, &[command]), command);
    }

    let banner = image::open(res(project).join("drawable").join("banner_tv_320x180.png"))
        .expect("banner should decode");
    assert_eq!((banner.width(), banner.height()), (320, 180));

    let store_icon = project
        .join("app")
        .join("src")
        .join("main")
        .join("playstore")
        .join("icon_512.png");
    let copied = res(project)
        .join("mipmap-xxxhdpi")
        .join("ic_launcher_play_512.png");
    assert_eq!(
        std::fs::read(&store_icon).unwrap(),
        std::fs::read(&copied).unwrap(),
        "mipmap copy should be byte-identical to the store icon"
    );

    let round = image::open(res(project).join("mipmap-ldpi").join("ic_launcher_round.png"))
        .expect("round icon should decode")
        .to_rgba8();
    assert_eq!(round.dimensions(), (36, 36));
    assert_eq!(round.get_pixel(0, 0)[3], 0);
    assert_eq!(round.get_pixel(18, 18)[3], 255);

    let output = asset_gen(project, &["verify"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_success(&output, "verify");
    assert!(stdout.contains("PASS"), "stdout: {stdout}");
    assert!(!stdout.contains("WARN"), "stdout: {stdout}");
}

#[test]
fn test_verify_empty_project_fails_with_missing_rows() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    let output = asset_gen(temp_dir.path(), &["verify"]);
    assert_eq!(output.status.code(), Some(3));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("banner,"));
    assert!(stdout.contains("mipmap_round,mipmap-xxxhdpi,MISSING"));
    assert!(stdout.contains("FAIL"));
}

#[test]
fn test_launcher_without_source_exits_non_zero() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    let output = asset_gen(temp_dir.path(), &["launcher"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("source not found"));
}

/// Existing launcher icons are moved aside before being regenerated, and the
/// round refill keeps the circular alpha the verifier expects.
#[test]
fn test_round_fill_backs_up_and_keeps_alpha() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let project = temp_dir.path();

    let source = res(project)
        .join("mipmap-xxxhdpi")
        .join("ic_launcher_play_512.png");
    std::fs::create_dir_all(source.parent().unwrap()).unwrap();
    create_gradient_image(&source, 512);

    let output = asset_gen(project, &["launcher"]);
    assert_success(&output, "launcher");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("mipmap-xhdpi,96,True,True,96x96,True"),
        "stdout: {stdout}"
    );

    let output = asset_gen(project, &["round-fill"]);
    assert_success(&output, "round-fill");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("folder,file,bytes,width,height,color_type,has_alpha"));
    assert!(stdout.contains(",96,96,6,True"), "stdout: {stdout}");

    let mdpi = res(project).join("mipmap-mdpi");
    let backups: Vec<_> = std::fs::read_dir(&mdpi)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_string_lossy()
                .starts_with("ic_launcher_round.png.bak.")
        })
        .collect();
    assert_eq!(backups.len(), 1);

    let round = image::open(mdpi.join("ic_launcher_round.png"))
        .unwrap()
        .to_rgba8();
    assert_eq!(round.get_pixel(0, 0)[3], 0);
    assert!(round.get_pixel(24, 24)[3] > 200);
}

#[test]
fn test_config_file_changes_palette() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let project = temp_dir.path();
    let config = project.join("assets.json");
    std::fs::write(
        &config,
        r##"{ "palette": { "top": "#FF0000", "mid": "#FF0000", "bottom": "#FF0000" }, "supersample": 1 }"##,
    )
    .unwrap();

    let output = asset_gen(project, &["--config", config.to_str().unwrap(), "banner"]);
    assert_success(&output, "banner with config");

    let banner = image::open(res(project).join("drawable").join("banner_tv_320x180.png"))
        .unwrap()
        .to_rgba8();
    assert_eq!(banner.get_pixel(319, 0).0, [255, 0, 0, 255]);
}

/// Creates a square RGBA gradient and saves it as PNG
fn create_gradient_image(path: &Path, size: u32) {
    let mut image = RgbaImage::new(size, size);

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let red = (255.0 * x as f32 / size as f32) as u8;
        let green = (255.0 * y as f32 / size as f32) as u8;
        *pixel = Rgba([red, green, 128, 255]);
    }

    image.save(path).expect("Failed to save gradient image");
}
