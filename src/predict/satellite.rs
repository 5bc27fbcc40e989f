use std::sync::Arc;

use sgp4::{Constants, Elements};

use crate::predict::error::PredictError;

/// A satellite descriptor built from a name and two validated TLE lines.
///
/// The orbital elements and the SGP4 constants derived from them are computed
/// once at construction; the descriptor cannot be modified afterwards.
#[derive(Clone)]
pub struct Satellite {
    name: String,
    line1: String,
    line2: String,
    elements: Elements,
    constants: Arc<Constants>,
}

impl std::fmt::Debug for Satellite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Satellite")
            .field("name", &self.name)
            .field("norad_id", &self.elements.norad_id)
            .finish()
    }
}

impl Satellite {
    pub fn from_tle(name: &str, line1: &str, line2: &str) -> Result<Self, PredictError> {
        let name = name.trim();
        let line1 = line1.trim();
        let line2 = line2.trim();

        if !line1.starts_with('1') || !line2.starts_with('2') {
            return Err(PredictError::InvalidTle(
                "line 1 must start with '1' and line 2 with '2'".into(),
            ));
        }

        let object_name = (!name.is_empty()).then(|| name.to_string());
        let elements = Elements::from_tle(object_name, line1.as_bytes(), line2.as_bytes())?;
        let constants = Constants::from_elements(&elements)?;

        let name = if name.is_empty() {
            format!("NORAD {}", elements.norad_id)
        } else {
            name.to_string()
        };

        Ok(Self {
            name,
            line1: line1.to_string(),
            line2: line2.to_string(),
            elements,
            constants: Arc::new(constants),
        })
    }

    /// Parse a two- or three-line TLE block.
    pub fn parse(tle: &str) -> Result<Self, PredictError> {
        let lines: Vec<&str> = tle
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();

        match lines.as_slice() {
            [line1, line2] => Self::from_tle("", line1, line2),
            [name, line1, line2] => Self::from_tle(name, line1, line2),
            _ => Err(PredictError::InvalidTle(format!(
                "expected 2 or 3 lines, got {}",
                lines.len()
            ))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn norad_id(&self) -> u64 {
        self.elements.norad_id
    }

    pub fn elements(&self) -> &Elements {
        &self.elements
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    /// Identity used to key per-satellite caches. Two descriptors built from
    /// the same element lines share a key.
    pub fn key(&self) -> String {
        format!("{}\n{}", self.line1, self.line2)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub use crate::config::{
        DEFAULT_TLE_LINE1 as ISS_LINE1, DEFAULT_TLE_LINE2 as ISS_LINE2, DEFAULT_TLE_NAME as ISS_NAME,
    };

    pub fn iss() -> super::Satellite {
        super::Satellite::from_tle(ISS_NAME, ISS_LINE1, ISS_LINE2).unwrap()
    }
}
