use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unsupported geometry kind: {0}")]
  UnsupportedGeometryKind(String),

  #[error("malformed geometry: {0}")]
  MalformedGeometry(String),

  #[error("invalid option: {0}")]
  InvalidOption(String),

  #[error("invalid GeoJSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
