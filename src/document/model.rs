//! Boundary model of the exporter's `motion_metadata.json`.
//!
//! Everything below the document header is optional here: the exporter has changed over time and
//! older files lack pressure, tool or color fields. [`crate::document::normalize`] turns these
//! records into the trusted model exactly once.

use std::path::Path;

use serde::Deserialize;

use crate::foundation::error::{PenReplayError, PenReplayResult};

/// Top-level recording document as written by the exporter.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDef {
    /// Recording frame rate (frames per second).
    pub frame_rate: f64,
    /// Authoritative replay duration, when the exporter wrote one.
    #[serde(default)]
    pub total_duration_ms: Option<f64>,
    /// Frame estimate from the exporter. Informational.
    #[serde(default)]
    pub total_frames: Option<u64>,
    /// Point count from the exporter. Informational.
    #[serde(default)]
    pub total_motion_points: Option<u64>,
    /// Legacy absolute timestamp range. Informational.
    #[serde(default)]
    pub min_timestamp: Option<f64>,
    /// Legacy absolute timestamp range. Informational.
    #[serde(default)]
    pub max_timestamp: Option<f64>,
    /// Pages in document order.
    pub pages: Vec<PageDef>,
}

impl DocumentDef {
    /// Parse a document from JSON text.
    pub fn from_json_str(s: &str) -> PenReplayResult<Self> {
        serde_json::from_str(s).map_err(|e| PenReplayError::serde(format!("{e}")))
    }

    /// Read and parse a document file.
    pub fn from_path(path: &Path) -> PenReplayResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PenReplayError::document(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text).map_err(|e| match e {
            PenReplayError::Serde(msg) => PenReplayError::document(format!(
                "failed to parse '{}': {msg}",
                path.display()
            )),
            other => other,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDef {
    #[serde(default)]
    pub page_index: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub height: Option<f64>,
    #[serde(default)]
    pub background: Option<BackgroundDef>,
    #[serde(default)]
    pub strokes: Vec<StrokeDef>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BackgroundDef {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub color: Option<ColorDef>,
}

/// Exporter color record. Alpha is written but not used for replay.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct ColorDef {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub r: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub g: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub b: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub a: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeDef {
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub width: Option<f64>,
    #[serde(default)]
    pub color: Option<ColorDef>,
    #[serde(default)]
    pub motion_points: Vec<MotionPointDef>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionPointDef {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub t: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub y: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub p: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_eraser: Option<bool>,
}

// Point and stroke fields of the wrong JSON type must not fail the whole document; they surface
// as `None` and the normalizer decides what to skip.
fn lenient_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(d)?;
    Ok(v.and_then(|v| v.as_f64()))
}

fn lenient_bool<'de, D>(d: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match v {
        Some(serde_json::Value::Bool(b)) => Some(b),
        Some(serde_json::Value::Number(n)) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    })
}
