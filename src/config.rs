use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::circle::CircleOptions;
use crate::error::{Error, Result};
use crate::intersect::IntersectOptions;

/// Settings read from a JSON file. Missing keys fall back to the defaults,
/// so `{}` is a valid configuration.
///
/// ```json
/// {
///   "intersect": { "tolerance": 1e-10, "dedup": false, "parallel": "auto", "workers": 4 },
///   "circle": { "steps": 64, "units": "kilometers" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub intersect: IntersectOptions,
  pub circle: CircleOptions,
}

impl Config {
  pub fn load(path: &Path) -> Result<Config> {
    debug!("Reading config from {}", path.display());
    let config: Config = serde_json::from_reader(std::fs::File::open(path)?)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if !self.intersect.tolerance.is_finite() || self.intersect.tolerance < 0.0 {
      return Err(Error::InvalidOption(format!(
        "intersect.tolerance must be a non-negative number, got {}",
        self.intersect.tolerance
      )));
    }
    if self.intersect.workers == Some(0) {
      return Err(Error::InvalidOption(
        "intersect.workers must be at least 1".to_string(),
      ));
    }
    if self.circle.steps < 3 {
      return Err(Error::InvalidOption(format!(
        "circle.steps must be at least 3, got {}",
        self.circle.steps
      )));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::circle::Units;
  use crate::intersect::{Parallelism, DEFAULT_TOLERANCE};

  #[test]
  fn test_empty_config_uses_defaults() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.intersect.tolerance, DEFAULT_TOLERANCE);
    assert_eq!(config.circle.steps, 64);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_partial_config() {
    let config: Config = serde_json::from_str(
      r#"{"intersect": {"dedup": true, "parallel": "never"}, "circle": {"units": "miles"}}"#,
    )
    .unwrap();
    assert!(config.intersect.dedup);
    assert_eq!(config.intersect.parallel, Parallelism::Never);
    assert_eq!(config.intersect.tolerance, DEFAULT_TOLERANCE);
    assert_eq!(config.circle.units, Units::Miles);
    assert_eq!(config.circle.steps, 64);
  }

  #[test]
  fn test_validate_rejects_bad_values() {
    let mut config = Config::default();
    config.intersect.workers = Some(0);
    assert!(matches!(config.validate(), Err(Error::InvalidOption(_))));

    let mut config = Config::default();
    config.circle.steps = 1;
    assert!(matches!(config.validate(), Err(Error::InvalidOption(_))));

    let mut config = Config::default();
    config.intersect.tolerance = -1.0;
    assert!(matches!(config.validate(), Err(Error::InvalidOption(_))));
  }

  #[test]
  fn test_load_missing_file() {
    let err = Config::load(Path::new("/nonexistent/line_tool.json")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
  }
}
