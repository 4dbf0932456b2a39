//! Query settings

use std::f32::consts::{FRAC_PI_2, PI};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::raster::{RasterOptions, DEFAULT_EXACT_SOLID_ANGLE};
use crate::util::{Error, Result};

/// Parameters shared by every query in a shading call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Half-angle of the cone of interest, radians (0..=π).
    pub cone_angle: f32,
    /// Nodes subtending less than this (steradians) render as one disk.
    pub max_solid_angle: f32,
    /// Pixels per cube-face side.
    pub micro_buf_res: usize,
    /// Offset of the query point along its normal.
    pub bias: f32,
    /// Disks subtending more than this render exactly.
    pub exact_solid_angle: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cone_angle: FRAC_PI_2,
            max_solid_angle: 0.03,
            micro_buf_res: 10,
            bias: 0.0,
            exact_solid_angle: DEFAULT_EXACT_SOLID_ANGLE,
        }
    }
}

impl Settings {
    /// Load and validate settings from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), ?settings, "loaded settings");
        Ok(settings)
    }

    /// Parse and validate settings from a JSON string.
    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every field is in range.
    pub fn validate(&self) -> Result<()> {
        if self.cone_angle.is_nan() || self.cone_angle <= 0.0 || self.cone_angle > PI {
            return Err(Error::invalid_settings(format!("cone_angle {} not in (0, pi]", self.cone_angle)));
        }
        if self.max_solid_angle.is_nan() || self.max_solid_angle < 0.0 {
            return Err(Error::invalid_settings(format!("max_solid_angle {} is negative", self.max_solid_angle)));
        }
        if self.micro_buf_res == 0 {
            return Err(Error::invalid_settings("micro_buf_res must be positive"));
        }
        if !self.bias.is_finite() {
            return Err(Error::invalid_settings("bias must be finite"));
        }
        if self.exact_solid_angle.is_nan() || self.exact_solid_angle < 0.0 {
            return Err(Error::invalid_settings(format!(
                "exact_solid_angle {} is negative",
                self.exact_solid_angle
            )));
        }
        Ok(())
    }

    /// Set a parameter by its shading-language name (case-insensitive):
    /// `coneangle`, `maxsolidangle`, `microbufres` or `bias`.
    pub fn set_param(&mut self, name: &str, value: f32) -> Result<()> {
        match name.to_ascii_lowercase().as_str() {
            "coneangle" => self.cone_angle = value,
            "maxsolidangle" => self.max_solid_angle = value,
            "microbufres" => {
                if value.is_nan() || value < 1.0 {
                    return Err(Error::invalid_settings(format!("microbufres {value} must be at least 1")));
                }
                if value.fract() != 0.0 {
                    return Err(Error::invalid_settings(format!("microbufres {value} is not a whole number")));
                }
                self.micro_buf_res = value as usize;
            }
            "bias" => self.bias = value,
            _ => return Err(Error::UnknownParameter(name.to_string())),
        }
        Ok(())
    }

    /// Rasterizer options derived from these settings.
    pub fn raster_options(&self) -> RasterOptions {
        RasterOptions {
            exact_solid_angle: self.exact_solid_angle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.micro_buf_res, 10);
        assert_eq!(s.cone_angle, FRAC_PI_2);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s = Settings::from_json(r#"{ "micro_buf_res": 16, "bias": 0.01 }"#).unwrap();
        assert_eq!(s.micro_buf_res, 16);
        assert_eq!(s.bias, 0.01);
        assert_eq!(s.max_solid_angle, 0.03);
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(Settings::from_json("{ not json"), Err(Error::Json(_))));
        assert!(matches!(
            Settings::from_json(r#"{ "cone_angle": 4.0 }"#),
            Err(Error::InvalidSettings(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "micro_buf_res": 0 }"#),
            Err(Error::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_set_param() {
        let mut s = Settings::default();
        s.set_param("coneangle", 1.0).unwrap();
        s.set_param("MaxSolidAngle", 0.1).unwrap();
        s.set_param("microbufres", 12.0).unwrap();
        s.set_param("bias", 0.002).unwrap();
        assert_eq!(s.cone_angle, 1.0);
        assert_eq!(s.max_solid_angle, 0.1);
        assert_eq!(s.micro_buf_res, 12);
        assert_eq!(s.bias, 0.002);

        assert!(matches!(s.set_param("samples", 4.0), Err(Error::UnknownParameter(n)) if n == "samples"));
        assert!(s.set_param("microbufres", 0.0).is_err());
    }

    #[test]
    fn test_fractional_resolution_rejected() {
        let mut s = Settings::default();
        assert!(matches!(s.set_param("microbufres", 12.7), Err(Error::InvalidSettings(_))));
        assert!(matches!(s.set_param("microbufres", f32::INFINITY), Err(Error::InvalidSettings(_))));
        assert_eq!(s.micro_buf_res, 10);
        s.set_param("MicroBufRes", 16.0).unwrap();
        assert_eq!(s.micro_buf_res, 16);
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "cone_angle": 1.2, "exact_solid_angle": 0.1 }}"#).unwrap();
        let s = Settings::load(file.path()).unwrap();
        assert_eq!(s.cone_angle, 1.2);
        assert_eq!(s.raster_options().exact_solid_angle, 0.1);

        let round = Settings::from_json(&s.to_json().unwrap()).unwrap();
        assert_eq!(round, s);

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Settings::load(dir.path().join("missing.json")),
            Err(Error::FileNotFound(_))
        ));
    }
}
