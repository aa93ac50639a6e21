//! Configuration types for math embedding.
//!
//! Everything the renderer and the converter driver need to know about the
//! outside world lives in [`EmbedConfig`], built via its
//! [`EmbedConfigBuilder`]. Tool names are configurable so that a TeX
//! distribution installed outside `PATH` can still be used.

use crate::error::EmbedMathError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for encoding and decoding math.
///
/// Built via [`EmbedConfig::builder()`] or using [`EmbedConfig::default()`].
///
/// # Example
/// ```rust
/// use embedmath::EmbedConfig;
///
/// let config = EmbedConfig::builder()
///     .latex("/opt/texlive/bin/latex")
///     .display_scale(1.5)
///     .render_timeout_secs(20)
///     .build()
///     .unwrap();
/// assert_eq!(config.display_scale, 1.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Document converter executable. Default: `pandoc`.
    pub pandoc: String,

    /// Typesetting compiler producing a DVI file. Default: `latex`.
    pub latex: String,

    /// DVI to SVG converter. Default: `dvisvgm`.
    pub dvisvgm: String,

    /// dvisvgm `--scale` for inline math. Default: 1.0.
    pub inline_scale: f32,

    /// dvisvgm `--scale` for display math. Default: 1.2.
    ///
    /// Display math is rendered slightly larger so it stays legible as a
    /// centred block.
    pub display_scale: f32,

    /// dvisvgm `--font-format` value. Default: `woff,autohint`.
    pub font_format: String,

    /// LaTeX packages loaded by the render template. Default: amsmath, amssymb.
    pub packages: Vec<String>,

    /// Timeout for each `--version` probe, in seconds. Default: 1.
    pub probe_timeout_secs: u64,

    /// Timeout for each latex / dvisvgm invocation, in seconds. Default: 10.
    pub render_timeout_secs: u64,

    /// Timeout for each pandoc invocation, in seconds. Default: 30.
    pub convert_timeout_secs: u64,

    /// pandoc reader format for the input file. Default: `markdown`.
    pub input_format: String,

    /// pandoc writer format for the result. Default: `markdown`.
    pub output_format: String,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            pandoc: "pandoc".to_string(),
            latex: "latex".to_string(),
            dvisvgm: "dvisvgm".to_string(),
            inline_scale: 1.0,
            display_scale: 1.2,
            font_format: "woff,autohint".to_string(),
            packages: vec!["amsmath".to_string(), "amssymb".to_string()],
            probe_timeout_secs: 1,
            render_timeout_secs: 10,
            convert_timeout_secs: 30,
            input_format: "markdown".to_string(),
            output_format: "markdown".to_string(),
        }
    }
}

impl EmbedConfig {
    /// Create a new builder for `EmbedConfig`.
    pub fn builder() -> EmbedConfigBuilder {
        EmbedConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn convert_timeout(&self) -> Duration {
        Duration::from_secs(self.convert_timeout_secs)
    }

    /// The dvisvgm scale factor for inline or display math.
    pub fn scale(&self, inline: bool) -> f32 {
        if inline {
            self.inline_scale
        } else {
            self.display_scale
        }
    }
}

/// Builder for [`EmbedConfig`].
#[derive(Debug)]
pub struct EmbedConfigBuilder {
    config: EmbedConfig,
}

impl EmbedConfigBuilder {
    pub fn pandoc(mut self, program: impl Into<String>) -> Self {
        self.config.pandoc = program.into();
        self
    }

    pub fn latex(mut self, program: impl Into<String>) -> Self {
        self.config.latex = program.into();
        self
    }

    pub fn dvisvgm(mut self, program: impl Into<String>) -> Self {
        self.config.dvisvgm = program.into();
        self
    }

    pub fn inline_scale(mut self, scale: f32) -> Self {
        self.config.inline_scale = scale;
        self
    }

    pub fn display_scale(mut self, scale: f32) -> Self {
        self.config.display_scale = scale;
        self
    }

    pub fn font_format(mut self, format: impl Into<String>) -> Self {
        self.config.font_format = format.into();
        self
    }

    /// Replace the package list loaded by the render template.
    pub fn packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.packages = packages.into_iter().map(Into::into).collect();
        self
    }

    pub fn probe_timeout_secs(mut self, secs: u64) -> Self {
        self.config.probe_timeout_secs = secs;
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs;
        self
    }

    pub fn convert_timeout_secs(mut self, secs: u64) -> Self {
        self.config.convert_timeout_secs = secs;
        self
    }

    pub fn input_format(mut self, format: impl Into<String>) -> Self {
        self.config.input_format = format.into();
        self
    }

    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.config.output_format = format.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EmbedConfig, EmbedMathError> {
        let c = &self.config;
        for (name, scale) in [("inline", c.inline_scale), ("display", c.display_scale)] {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(EmbedMathError::InvalidConfig(format!(
                    "{name} scale must be a positive number, got {scale}"
                )));
            }
        }
        for (name, secs) in [
            ("probe", c.probe_timeout_secs),
            ("render", c.render_timeout_secs),
            ("convert", c.convert_timeout_secs),
        ] {
            if secs == 0 {
                return Err(EmbedMathError::InvalidConfig(format!(
                    "{name} timeout must be at least 1 second"
                )));
            }
        }
        for (name, program) in [("pandoc", &c.pandoc), ("latex", &c.latex), ("dvisvgm", &c.dvisvgm)] {
            if program.trim().is_empty() {
                return Err(EmbedMathError::InvalidConfig(format!(
                    "{name} program name is empty"
                )));
            }
        }
        Ok(self.config)
    }
}
