// ABOUTME: Image geometry resolution for includegraphics directives
// ABOUTME: Reads intrinsic pixel sizes from raster files and converts them to inches

use crate::ast::ImageNode;
use crate::errors::{Result, TexError};
use crate::escape::{escape_path, format_length, pixels_to_physical};
use ::image::io::Reader as ImageReader;
use log::debug;
use std::path::Path;

/// Unit of every inferred length.
pub const PHYSICAL_UNIT: &str = "in";

/// Read the intrinsic (width, height) in pixels of a raster image.
///
/// The format is guessed from the file content; PNG, JPEG, GIF, BMP, TIFF and
/// WebP are supported. The file is closed before returning.
pub fn resolve_dimensions(path: &Path) -> Result<(u32, u32)> {
    debug!("Reading image dimensions from {:?}", path);

    let reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|source| TexError::ImageOpenFailed {
            path: path.to_path_buf(),
            source,
        })?;

    reader
        .into_dimensions()
        .map_err(|source| TexError::ImageDecodeFailed {
            path: path.to_path_buf(),
            source,
        })
}

/// Authored sizing of an image, split by how each part is emitted.
///
/// Width and height written as bare integers are pixel counts and get
/// converted to inches. Every other forwarded attribute (sizes with units,
/// `data-*`) is copied through as `name=value` after them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRecord {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub pass_through: Vec<(String, String)>,
}

/// Physical size of an image, kept as pixels at a resolution so lengths
/// are truncated exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
}

impl Geometry {
    /// Render as includegraphics options, e.g. `width=10in,height=6.66in`.
    pub fn to_options(&self) -> String {
        format!(
            "{},{}",
            length_option("width", self.width, self.dpi),
            length_option("height", self.height, self.dpi),
        )
    }
}

fn length_option(name: &str, pixels: u32, dpi: u32) -> String {
    format!("{}={}{}", name, format_length(pixels, dpi), PHYSICAL_UNIT)
}

fn is_forwarded_attribute(name: &str) -> bool {
    name == "width" || name == "height" || name.starts_with("data-")
}

impl ImageRecord {
    /// Classify an image's authored attributes.
    pub fn from_attributes(image: &ImageNode) -> Self {
        let mut record = ImageRecord::default();
        for (name, value) in &image.attributes {
            if !is_forwarded_attribute(name) {
                continue;
            }
            let pixels = value.trim().parse::<u32>().ok();
            match (name.as_str(), pixels) {
                ("width", Some(px)) => record.width = Some(px),
                ("height", Some(px)) => record.height = Some(px),
                _ => record.pass_through.push((name.clone(), value.clone())),
            }
        }
        record
    }

    fn authored_with_unit(&self, name: &str) -> bool {
        self.pass_through.iter().any(|(n, _)| n == name)
    }

    /// Whether the intrinsic size has to be read from the image file.
    ///
    /// A dimension given with a unit is never inferred, so an image sized
    /// only in units leaves the scaling to LaTeX.
    pub fn needs_intrinsic(&self) -> bool {
        let width_open = self.width.is_none() && !self.authored_with_unit("width");
        let height_open = self.height.is_none() && !self.authored_with_unit("height");
        match (self.width, self.height) {
            (Some(_), Some(_)) => false,
            (Some(_), None) => height_open,
            (None, Some(_)) => width_open,
            (None, None) => width_open && height_open,
        }
    }

    /// Build the includegraphics options, reading `path` only when needed.
    pub fn to_options(&self, path: &Path, dpi: u32) -> Result<String> {
        let mut options = Vec::new();
        if self.needs_intrinsic() {
            options.push(resolve_geometry(self.width, self.height, path, dpi)?.to_options());
        } else {
            if let Some(px) = self.width {
                options.push(length_option("width", px, dpi));
            }
            if let Some(px) = self.height {
                options.push(length_option("height", px, dpi));
            }
        }
        options.extend(
            self.pass_through
                .iter()
                .map(|(name, value)| format!("{}={}", escape_path(name), escape_path(value))),
        );
        Ok(options.join(","))
    }
}

/// Complete a partial pixel size from the intrinsic size, keeping the ratio.
pub fn scale_to_aspect(
    width: Option<u32>,
    height: Option<u32>,
    intrinsic: (u32, u32),
) -> (u32, u32) {
    let (iw, ih) = intrinsic;
    match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) if iw > 0 => {
            let ratio = f64::from(w) / f64::from(iw);
            (w, (f64::from(ih) * ratio) as u32)
        }
        (None, Some(h)) if ih > 0 => {
            let ratio = f64::from(h) / f64::from(ih);
            ((f64::from(iw) * ratio) as u32, h)
        }
        (Some(w), None) => (w, ih),
        (None, Some(h)) => (iw, h),
        (None, None) => intrinsic,
    }
}

/// Compute the physical geometry of an image with pixel sizing.
///
/// The file at `path` is only read when a dimension is missing.
pub fn resolve_geometry(
    width: Option<u32>,
    height: Option<u32>,
    path: &Path,
    dpi: u32,
) -> Result<Geometry> {
    let (w, h) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        _ => {
            let intrinsic = resolve_dimensions(path)?;
            scale_to_aspect(width, height, intrinsic)
        }
    };
    debug!(
        "Image {:?} sized {}x{} px, {:.2}x{:.2} in at {} dpi",
        path,
        w,
        h,
        pixels_to_physical(w, dpi),
        pixels_to_physical(h, dpi),
        dpi
    );

    Ok(Geometry {
        width: w,
        height: h,
        dpi,
    })
}
