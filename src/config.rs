// ABOUTME: Configuration module for the present-tex renderer
// ABOUTME: Provides render settings, environment variable handling and validation

use crate::errors::{Result, TexError};
use crate::link::LinkPolicy;
use clap::ValueEnum;
use std::env;
use std::path::PathBuf;

/// Resolution used to turn image pixels into inches.
pub const DEFAULT_DPI: u32 = 72;

/// Settings for a render pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Dots per inch for pixel to physical conversion; must be positive.
    pub dpi: u32,
    /// Directory that relative image paths are resolved against.
    pub base_dir: Option<PathBuf>,
    pub link_policy: LinkPolicy,
    /// Language tag of fenced code blocks that declare none.
    pub default_code_language: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            base_dir: None,
            link_policy: LinkPolicy::default(),
            default_code_language: "text".to_string(),
        }
    }
}

impl RenderConfig {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(dpi) = env::var("PRESENT_TEX_DPI") {
            config.dpi = dpi.trim().parse::<u32>().map_err(|e| {
                TexError::ConfigError(format!("invalid PRESENT_TEX_DPI {:?}: {}", dpi, e))
            })?;
        }
        if let Ok(dir) = env::var("PRESENT_TEX_BASE_DIR") {
            if !dir.is_empty() {
                config.base_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(policy) = env::var("PRESENT_TEX_LINK_POLICY") {
            config.link_policy = LinkPolicy::from_str(policy.trim(), true).map_err(|e| {
                TexError::ConfigError(format!("invalid PRESENT_TEX_LINK_POLICY: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of this configuration
    pub fn with_overrides(
        mut self,
        dpi: Option<u32>,
        base_dir: Option<PathBuf>,
        link_policy: Option<LinkPolicy>,
    ) -> Self {
        if let Some(dpi) = dpi {
            self.dpi = dpi;
        }
        if base_dir.is_some() {
            self.base_dir = base_dir;
        }
        if let Some(policy) = link_policy {
            self.link_policy = policy;
        }
        self
    }

    /// Reject settings that would make the renderer produce degenerate output
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(TexError::ConfigError(
                "dpi must be a positive integer".to_string(),
            ));
        }
        if self.default_code_language.trim().is_empty() {
            return Err(TexError::ConfigError(
                "default code language must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
