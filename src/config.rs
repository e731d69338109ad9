/// Rendering knobs. Every field has a default, so a partial JSON file is enough.
use crate::columns::{DEFAULT_COLUMN_WIDTH, PX_PER_EXCEL_WIDTH};
use crate::types::Result;
use mtzip::level::CompressionLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Fast,
    Best,
}

impl Compression {
    pub fn level(self) -> CompressionLevel {
        match self {
            Compression::Fast => CompressionLevel::fast(),
            Compression::Best => CompressionLevel::best(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Width used when neither the template nor the column config has one.
    pub default_column_width: f64,
    pub header_fill: String,
    pub header_font_color: String,
    pub header_font_size: f64,
    pub font_name: String,
    pub compression: Compression,
    /// Editor pixels per Excel character-width unit.
    pub px_per_width_unit: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            default_column_width: DEFAULT_COLUMN_WIDTH,
            header_fill: "FFD9E1F2".to_string(),
            header_font_color: "FF000000".to_string(),
            header_font_size: 11.0,
            font_name: "Calibri".to_string(),
            compression: Compression::Fast,
            px_per_width_unit: PX_PER_EXCEL_WIDTH,
        }
    }
}

impl RenderOptions {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let options: RenderOptions = serde_json::from_str(&text)?;
        log::debug!("loaded render options from {}", path.display());
        Ok(options)
    }

    /// Template widths arrive in editor pixels.
    pub fn pixels_to_width(&self, px: f64) -> f64 {
        let per_unit = if self.px_per_width_unit > 0.0 { self.px_per_width_unit } else { PX_PER_EXCEL_WIDTH };
        (px / per_unit * 100.0).round() / 100.0
    }
}
