//! Serial frame decoding.
//!
//! Microcontrollers emit one flat JSON object per frame. Scalar fields map
//! directly to session keys. A small set of measurement objects
//! (`{"x":..,"y":..,"z":..}`) is decomposed into three scalar keys. Anything
//! else is reported per field without discarding the rest of the frame.

use serde_json::Map;

use crate::error::ValidationError;
use crate::value::Value;

/// Nested objects that are understood as three-axis measurements.
pub const MEASUREMENTS: [&str; 3] = ["acceleration", "gyroscope", "magnetic"];

/// Upper bound on a buffered frame; longer input is discarded.
pub const MAX_FRAME_LEN: usize = 4096;

/// One decoded field of a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameField {
    Scalar {
        key: String,
        value: Value,
    },
    Measurement {
        name: String,
        x: f64,
        y: f64,
        z: f64,
    },
    Unsupported {
        key: String,
        reason: &'static str,
    },
}

impl FrameField {
    /// Flatten into `(key, value)` assignments. Unsupported fields yield none.
    #[must_use]
    pub fn into_assignments(self) -> Vec<(String, Value)> {
        match self {
            Self::Scalar { key, value } => vec![(key, value)],
            Self::Measurement { name, x, y, z } => vec![
                (format!("{name}_x"), Value::Float(x)),
                (format!("{name}_y"), Value::Float(y)),
                (format!("{name}_z"), Value::Float(z)),
            ],
            Self::Unsupported { .. } => Vec::new(),
        }
    }
}

/// Decode a frame into its fields, in document order.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidFrame`] when the text is not a JSON
/// object.
pub fn decode_frame(text: &str) -> Result<Vec<FrameField>, ValidationError> {
    let object: Map<String, serde_json::Value> =
        serde_json::from_str(text.trim()).map_err(|_| ValidationError::InvalidFrame)?;
    Ok(object
        .into_iter()
        .map(|(key, value)| decode_field(key, value))
        .collect())
}

fn decode_field(key: String, value: serde_json::Value) -> FrameField {
    match value {
        serde_json::Value::Object(inner) => {
            let Some(name) = MEASUREMENTS
                .iter()
                .find(|m| m.eq_ignore_ascii_case(&key))
            else {
                return FrameField::Unsupported {
                    key,
                    reason: "nested object",
                };
            };
            let axis = |a: &str| inner.get(a).and_then(serde_json::Value::as_f64);
            match (axis("x"), axis("y"), axis("z")) {
                (Some(x), Some(y), Some(z)) => FrameField::Measurement {
                    name: (*name).to_string(),
                    x,
                    y,
                    z,
                },
                _ => FrameField::Unsupported {
                    key,
                    reason: "measurement without numeric x/y/z",
                },
            }
        }
        serde_json::Value::Array(_) => FrameField::Unsupported {
            key,
            reason: "array",
        },
        other => match Value::from_json(&key, other) {
            Ok(value) => FrameField::Scalar { key, value },
            Err(_) => FrameField::Unsupported {
                key,
                reason: "null or out-of-range number",
            },
        },
    }
}

/// Splits a byte stream into frames.
///
/// A frame ends at a newline, or at the `}` closing the outermost object.
/// Braces inside JSON strings are ignored. Blank frames are skipped.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    buf: Vec<u8>,
    depth: usize,
    in_string: bool,
    escaped: bool,
    overflowed: bool,
}

impl FrameSplitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte; returns a complete frame when one ends here.
    pub fn push(&mut self, byte: u8) -> Option<String> {
        if byte == b'\n' || byte == b'\r' {
            return self.finish();
        }

        if self.buf.len() >= MAX_FRAME_LEN {
            self.overflowed = true;
        } else {
            self.buf.push(byte);
        }

        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == b'"' {
                self.in_string = false;
            }
            return None;
        }

        match byte {
            b'"' => self.in_string = true,
            b'{' => self.depth += 1,
            b'}' => {
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    return self.finish();
                }
            }
            _ => {}
        }
        None
    }

    /// Feed a chunk, collecting every completed frame.
    pub fn extend(&mut self, bytes: &[u8]) -> Vec<String> {
        bytes.iter().filter_map(|b| self.push(*b)).collect()
    }

    fn finish(&mut self) -> Option<String> {
        let bytes = std::mem::take(&mut self.buf);
        let overflowed = std::mem::take(&mut self.overflowed);
        self.depth = 0;
        self.in_string = false;
        self.escaped = false;
        if overflowed {
            return None;
        }
        let text = String::from_utf8_lossy(&bytes).trim().to_string();
        if text.is_empty() { None } else { Some(text) }
    }
}
