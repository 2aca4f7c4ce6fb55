use image::{Rgb, RgbImage};
use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_command(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_present-tex"))
        .args(args)
        .env_remove("PRESENT_TEX_DPI")
        .env_remove("PRESENT_TEX_BASE_DIR")
        .env_remove("PRESENT_TEX_LINK_POLICY")
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_render_command_writes_output_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path();

    // Image sits next to the markdown and is referenced relatively
    RgbImage::from_pixel(720, 480, Rgb([0, 0, 0]))
        .save(temp_path.join("chart.png"))
        .expect("Failed to write image");

    let markdown_path = temp_path.join("slides.md");
    fs::write(&markdown_path, "# Results\n\n![chart](chart.png)\n")
        .expect("Failed to write markdown file");

    let output_path = temp_path.join("out").join("slides.tex");

    let output = run_command(&[
        "render",
        "-i",
        markdown_path.to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(output_path.exists(), "Output file was not created");

    let latex = fs::read_to_string(&output_path).expect("Failed to read output file");
    assert!(latex.contains("\\section{Results}"), "Missing heading");
    assert!(
        latex.contains("\\includegraphics[width=10in,height=6.66in]{chart.png}"),
        "Unexpected geometry: {}",
        latex
    );
}

#[test]
fn test_render_command_dpi_flag() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path();

    RgbImage::from_pixel(300, 150, Rgb([0, 0, 0]))
        .save(temp_path.join("logo.png"))
        .expect("Failed to write image");
    let markdown_path = temp_path.join("slides.md");
    fs::write(&markdown_path, "![logo](logo.png)\n").expect("Failed to write markdown file");

    let output = run_command(&["render", "-i", markdown_path.to_str().unwrap(), "--dpi", "150"]);

    assert!(output.status.success(), "Command failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("\\includegraphics[width=2in,height=1in]{logo.png}"),
        "Unexpected output: {}",
        stdout
    );
}

#[test]
fn test_render_command_fails_on_missing_image() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path();

    let markdown_path = temp_path.join("slides.md");
    fs::write(&markdown_path, "![gone](gone.png)\n").expect("Failed to write markdown file");
    let output_path = temp_path.join("slides.tex");

    let output = run_command(&[
        "render",
        "-i",
        markdown_path.to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
    ]);

    assert!(!output.status.success(), "Command should have failed");
    assert!(!output_path.exists(), "No output should be written");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("gone.png"), "Unexpected stderr: {}", stderr);
}

#[test]
fn test_render_command_missing_input() {
    let output = run_command(&["render", "-i", "/nonexistent/slides.md"]);
    assert!(!output.status.success(), "Command should have failed");
}

#[test]
fn test_check_links_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path();

    let safe_path = temp_path.join("safe.md");
    fs::write(&safe_path, "[docs](https://docs.rs)\n").expect("Failed to write markdown file");
    let output = run_command(&["check-links", "-i", safe_path.to_str().unwrap()]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(output.stdout.is_empty());

    let unsafe_path = temp_path.join("unsafe.md");
    fs::write(
        &unsafe_path,
        "[ok](https://docs.rs) and [bad](javascript:alert(1))\n",
    )
    .expect("Failed to write markdown file");
    let output = run_command(&["check-links", "-i", unsafe_path.to_str().unwrap()]);
    assert!(!output.status.success(), "Dangerous link should fail the check");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "javascript:alert(1)");
}

#[test]
fn test_render_command_reads_env_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path();

    RgbImage::from_pixel(288, 144, Rgb([0, 0, 0]))
        .save(temp_path.join("logo.png"))
        .expect("Failed to write image");
    let markdown_path = temp_path.join("slides.md");
    fs::write(&markdown_path, "![logo](logo.png)\n").expect("Failed to write markdown file");

    let output = Command::new(env!("CARGO_BIN_EXE_present-tex"))
        .args(["render", "-i", markdown_path.to_str().unwrap()])
        .env("PRESENT_TEX_DPI", "144")
        .env_remove("PRESENT_TEX_BASE_DIR")
        .env_remove("PRESENT_TEX_LINK_POLICY")
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "Command failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\\includegraphics[width=2in,height=1in]{logo.png}"));

    let output = Command::new(env!("CARGO_BIN_EXE_present-tex"))
        .args(["render", "-i", markdown_path.to_str().unwrap()])
        .env("PRESENT_TEX_DPI", "0")
        .output()
        .expect("Failed to execute command");
    assert!(!output.status.success(), "Zero dpi should be rejected");
}

#[test]
fn test_render_command_env_base_dir_beats_input_dir() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let images = temp_dir.path().join("images");
    let docs = temp_dir.path().join("docs");
    fs::create_dir(&images).expect("Failed to create images dir");
    fs::create_dir(&docs).expect("Failed to create docs dir");

    // Only the configured base dir holds the image
    RgbImage::from_pixel(144, 72, Rgb([0, 0, 0]))
        .save(images.join("logo.png"))
        .expect("Failed to write image");
    let markdown_path = docs.join("slides.md");
    fs::write(&markdown_path, "![logo](logo.png)\n").expect("Failed to write markdown file");

    let output = Command::new(env!("CARGO_BIN_EXE_present-tex"))
        .args(["render", "-i", markdown_path.to_str().unwrap()])
        .env("PRESENT_TEX_BASE_DIR", &images)
        .env_remove("PRESENT_TEX_DPI")
        .env_remove("PRESENT_TEX_LINK_POLICY")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\\includegraphics[width=2in,height=1in]{logo.png}"));
}
