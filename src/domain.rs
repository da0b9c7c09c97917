use std::fmt;

use serde::{Deserialize, Serialize};

/// Cutout diameter in degrees used when a record does not carry one.
pub const DEFAULT_SIZE: f64 = 0.03;

/// One row of the input list: a cutout center plus optional size and file label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateRecord {
    pub ra: f64,
    pub dec: f64,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl CoordinateRecord {
    pub fn new(ra: f64, dec: f64) -> Self {
        Self {
            ra,
            dec,
            size: None,
            name: None,
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn resolved_size(&self) -> f64 {
        self.size.unwrap_or(DEFAULT_SIZE)
    }

    /// Output label, empty when the record has none.
    pub fn label(&self) -> &str {
        self.name.as_deref().map(str::trim).unwrap_or("")
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::around(self.ra, self.dec, self.resolved_size())
    }
}

/// Angular rectangle covered by a cutout, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub ra_min: f64,
    pub ra_max: f64,
    pub dec_min: f64,
    pub dec_max: f64,
}

impl BoundingBox {
    /// Box of diameter `size` centered on `(ra, dec)`. Axes are independent;
    /// no wrapping at ra = 0/360 or clamping at the poles.
    pub fn around(ra: f64, dec: f64, size: f64) -> Self {
        let half = size / 2.0;
        Self {
            ra_min: ra - half,
            ra_max: ra + half,
            dec_min: dec - half,
            dec_max: dec + half,
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ra [{}, {}] dec [{}, {}]",
            format_coord(self.ra_min),
            format_coord(self.ra_max),
            format_coord(self.dec_min),
            format_coord(self.dec_max)
        )
    }
}

/// Shortest round-trip text for a coordinate, in the same shape existing
/// catalog folders use: `150` renders as `150.0`, and magnitudes below 1e-4
/// or from 1e16 up switch to a two-digit exponent (`1e-05`, `1e+16`).
pub fn format_coord(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if (-4..16).contains(&exponent) {
        let plain = value.to_string();
        if plain.contains('.') { plain } else { format!("{plain}.0") }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    }
}
