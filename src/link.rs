// ABOUTME: Link safety classification for hyperlink and image targets
// ABOUTME: Flags script, local-file and non-image data URLs, and defines the link policy

use clap::ValueEnum;

use crate::ast::{Node, NodeData};

const DATA_IMAGE: &str = "data:image/";
const SAFE_IMAGE_SUBTYPES: [&str; 4] = ["png;", "gif;", "jpeg;", "webp;"];
const DANGEROUS_SCHEMES: [&str; 4] = ["javascript:", "vbscript:", "file:", "data:"];

/// Returns true if the URL seems potentially dangerous.
///
/// Inline `data:` images are allowed only for PNG, GIF, JPEG and WebP.
///
/// ```
/// use present_tex::link::is_dangerous_url;
/// assert!(is_dangerous_url("javascript:alert(1)"));
/// assert!(!is_dangerous_url("data:image/png;base64,AAAA"));
/// assert!(!is_dangerous_url("https://example.com"));
/// ```
pub fn is_dangerous_url(url: &str) -> bool {
    if let Some(subtype) = url.strip_prefix(DATA_IMAGE) {
        return !SAFE_IMAGE_SUBTYPES
            .iter()
            .any(|safe| subtype.starts_with(safe));
    }
    DANGEROUS_SCHEMES
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

/// What the renderer does with links whose target is dangerous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LinkPolicy {
    /// Emit every link; classification is left to the caller.
    #[default]
    Allow,
    /// Emit every link, logging a warning for dangerous targets.
    Warn,
    /// Drop the hyperlink command of dangerous links and keep their text.
    Strip,
}

/// Destinations of links, autolinks and images that are dangerous.
pub fn dangerous_links(root: &Node) -> Vec<String> {
    root.descendants()
        .filter_map(|node| match &node.data {
            NodeData::Link { destination, .. } => Some(destination.as_str()),
            NodeData::AutoLink { url, .. } => Some(url.as_str()),
            NodeData::Image(image) => Some(image.destination.as_str()),
            _ => None,
        })
        .filter(|url| is_dangerous_url(url))
        .map(str::to_string)
        .collect()
}
