use image::{Rgb, RgbImage};
use present_tex::{markdown_to_latex, LinkPolicy, RenderConfig, TexError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
    img.save(dir.join(name)).expect("Failed to write test image");
}

fn config_for(dir: &Path) -> RenderConfig {
    RenderConfig {
        base_dir: Some(dir.to_path_buf()),
        ..RenderConfig::default()
    }
}

#[test]
fn test_image_sized_from_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_png(temp_dir.path(), "plot.png", 720, 480);

    let output = markdown_to_latex("![plot](plot.png)\n", &config_for(temp_dir.path()))
        .expect("Render failed");

    assert!(
        output
            .latex
            .contains("\\includegraphics[width=10in,height=6.66in]{plot.png}"),
        "Unexpected output: {}",
        output.latex
    );
    assert!(output.latex.contains("\\begin{figure}[h]\n\\begin{center}\n"));
    assert!(output.latex.contains("\\end{center}\n\\end{figure}\n"));
    assert!(!output.has_code);
}

#[test]
fn test_image_width_keeps_aspect_ratio() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_png(temp_dir.path(), "plot.png", 720, 480);

    let output = markdown_to_latex(
        "![plot](plot.png){width=360}\n",
        &config_for(temp_dir.path()),
    )
    .expect("Render failed");

    assert!(
        output
            .latex
            .contains("\\includegraphics[width=5in,height=3.33in]{plot.png}"),
        "Unexpected output: {}",
        output.latex
    );
    assert!(!output.latex.contains("{width=360}"));
}

#[test]
fn test_image_with_both_sizes_skips_file() {
    // No file on disk: both dimensions are authored
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let output = markdown_to_latex(
        "![plot](absent.png){width=144 height=72}\n",
        &config_for(temp_dir.path()),
    )
    .expect("Render failed");

    assert!(output
        .latex
        .contains("\\includegraphics[width=2in,height=1in]{absent.png}"));
}

#[test]
fn test_image_dpi_from_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_png(temp_dir.path(), "wide.png", 960, 480);

    let config = RenderConfig {
        dpi: 96,
        ..config_for(temp_dir.path())
    };
    let output = markdown_to_latex("![wide](wide.png)\n", &config).expect("Render failed");

    assert!(output
        .latex
        .contains("\\includegraphics[width=10in,height=5in]{wide.png}"));
}

#[test]
fn test_image_title_becomes_caption() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_png(temp_dir.path(), "plot.png", 72, 72);

    let output = markdown_to_latex(
        "![plot](plot.png \"Sales & costs\")\n",
        &config_for(temp_dir.path()),
    )
    .expect("Render failed");

    assert!(
        output.latex.contains("\\caption{Sales \\& costs}\n"),
        "Unexpected output: {}",
        output.latex
    );
}

#[test]
fn test_missing_image_aborts_render() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let err = markdown_to_latex("# Title\n\n![x](missing.png)\n", &config_for(temp_dir.path()))
        .expect_err("Render should fail");

    assert!(matches!(err, TexError::MarkdownWalkFailed(_)));
    assert_eq!(
        err.image_path(),
        Some(temp_dir.path().join("missing.png").as_path())
    );
    match err {
        TexError::MarkdownWalkFailed(inner) => {
            assert!(matches!(*inner, TexError::ImageOpenFailed { .. }));
        }
        other => panic!("Unexpected error: {:?}", other),
    }
}

#[test]
fn test_undecodable_image_aborts_render() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("broken.png"), b"definitely not a png")
        .expect("Failed to write file");

    let err = markdown_to_latex("![x](broken.png)\n", &config_for(temp_dir.path()))
        .expect_err("Render should fail");

    match err {
        TexError::MarkdownWalkFailed(inner) => {
            assert!(
                matches!(*inner, TexError::ImageDecodeFailed { .. }),
                "Unexpected inner error: {:?}",
                inner
            );
        }
        other => panic!("Unexpected error: {:?}", other),
    }
}

#[test]
fn test_slide_with_code_and_links() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let markdown = "\
## Setup

Install with `cargo`:

```rust
fn main() {}
```

- see <https://example.com>
- or [the docs](https://docs.rs)
";
    let output = markdown_to_latex(markdown, &config_for(temp_dir.path())).expect("Render failed");

    assert!(output.has_code);
    assert!(output.latex.contains("\n\\subsection{Setup}\n"));
    assert!(output.latex.contains("\\begin{minted}{rust}\nfn main() {}\n\\end{minted}\n"));
    assert!(output.latex.contains("\\begin{itemize}\n"));
    assert!(output
        .latex
        .contains("\\colhref{https://example.com}{https://example.com}"));
    assert!(output
        .latex
        .contains("\\colhref{https://docs.rs}{\\texttt{the docs}}"));
}

#[test]
fn test_strip_policy_removes_dangerous_links() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = RenderConfig {
        link_policy: LinkPolicy::Strip,
        ..config_for(temp_dir.path())
    };

    let output =
        markdown_to_latex("[click](javascript:alert(1))\n", &config).expect("Render failed");

    assert!(!output.latex.contains("\\colhref"));
    assert!(output.latex.contains("click"));
}

#[test]
fn test_image_pixels_with_data_attribute() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_png(temp_dir.path(), "plot.png", 720, 480);

    let output = markdown_to_latex(
        "![plot](plot.png){width=360 data-id=7}\n",
        &config_for(temp_dir.path()),
    )
    .expect("Render failed");

    assert!(
        output
            .latex
            .contains("\\includegraphics[width=5in,height=3.33in,data-id=7]{plot.png}"),
        "Unexpected output: {}",
        output.latex
    );
}

#[test]
fn test_image_path_special_characters_escaped() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_png(temp_dir.path(), "q%1.png", 115, 100);

    let config = RenderConfig {
        dpi: 100,
        ..config_for(temp_dir.path())
    };
    let output = markdown_to_latex("![q](q%1.png)\n", &config).expect("Render failed");

    assert!(
        output
            .latex
            .contains("\\includegraphics[width=1.15in,height=1in]{q\\%1.png}\n"),
        "Unexpected output: {}",
        output.latex
    );
}
