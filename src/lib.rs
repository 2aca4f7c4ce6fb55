// ABOUTME: Library module for the present-tex program.
// ABOUTME: Renders Markdown from slide documents into LaTeX/Beamer fragments.

// Reexport modules
pub mod ast;
pub mod config;
pub mod errors;
pub mod escape;
pub mod geometry;
pub mod link;
pub mod markdown;
pub mod render;
pub mod scanner;
pub mod utils;

// Reexport common types and functions
pub use ast::{ImageNode, Node, NodeData, NodeKind};
pub use config::RenderConfig;
pub use errors::{Result, TexError};
pub use escape::{escape_latex, pixels_to_physical};
pub use link::{dangerous_links, is_dangerous_url, LinkPolicy};
pub use markdown::{fixup, parse_markdown};
pub use render::{markdown_to_latex, RenderOutput, Renderer, Sink, WalkStatus};
