use serde::{Serialize, Serializer};
use serde_json::Value;
use std::io::Read;

use crate::error::{Error, Result};
use crate::geom::{Feature, FeatureCollection, Geometry, Properties};

/// A decoded GeoJSON document.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoJson {
  Geometry(Geometry),
  Feature(Feature),
  FeatureCollection(FeatureCollection),
}

impl GeoJson {
  pub fn kind(&self) -> &'static str {
    match self {
      GeoJson::Geometry(geometry) => geometry.kind(),
      GeoJson::Feature(_) => "Feature",
      GeoJson::FeatureCollection(_) => "FeatureCollection",
    }
  }
}

impl From<Geometry> for GeoJson {
  fn from(geometry: Geometry) -> Self {
    GeoJson::Geometry(geometry)
  }
}

impl From<Feature> for GeoJson {
  fn from(feature: Feature) -> Self {
    GeoJson::Feature(feature)
  }
}

impl From<FeatureCollection> for GeoJson {
  fn from(collection: FeatureCollection) -> Self {
    GeoJson::FeatureCollection(collection)
  }
}

impl Serialize for GeoJson {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match self {
      GeoJson::Geometry(geometry) => geometry.serialize(serializer),
      GeoJson::Feature(feature) => feature.serialize(serializer),
      GeoJson::FeatureCollection(collection) => collection.serialize(serializer),
    }
  }
}

pub fn parse_str(s: &str) -> Result<GeoJson> {
  let value: Value = serde_json::from_str(s)?;
  from_value(value)
}

pub fn from_reader<R: Read>(reader: R) -> Result<GeoJson> {
  let value: Value = serde_json::from_reader(reader)?;
  from_value(value)
}

pub fn from_value(value: Value) -> Result<GeoJson> {
  let kind = type_of(&value)?.to_string();
  match kind.as_str() {
    "Feature" => Ok(GeoJson::Feature(feature_from_value(value)?)),
    "FeatureCollection" => Ok(GeoJson::FeatureCollection(collection_from_value(value)?)),
    _ => Ok(GeoJson::Geometry(geometry_from_value(value)?)),
  }
}

pub fn to_string<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
  let out = if pretty {
    serde_json::to_string_pretty(value)?
  } else {
    serde_json::to_string(value)?
  };
  Ok(out)
}

fn type_of(value: &Value) -> Result<&str> {
  value
    .get("type")
    .and_then(Value::as_str)
    .ok_or_else(|| Error::MalformedGeometry("object has no \"type\" member".to_string()))
}

// checking the tag first lets unknown kinds surface as usage errors rather
// than serde's "unknown variant"
fn geometry_from_value(value: Value) -> Result<Geometry> {
  let kind = type_of(&value)?;
  if !matches!(
    kind,
    "Point" | "LineString" | "Polygon" | "MultiLineString" | "MultiPolygon"
  ) {
    return Err(Error::UnsupportedGeometryKind(kind.to_string()));
  }
  Ok(serde_json::from_value(value)?)
}

fn feature_from_value(value: Value) -> Result<Feature> {
  let mut object = match value {
    Value::Object(object) => object,
    _ => return Err(Error::MalformedGeometry("feature is not an object".to_string())),
  };

  let geometry = match object.remove("geometry") {
    None | Some(Value::Null) => {
      return Err(Error::MalformedGeometry(
        "feature has no geometry".to_string(),
      ))
    }
    Some(geometry) => geometry_from_value(geometry)?,
  };

  let properties = match object.remove("properties") {
    None | Some(Value::Null) => Properties::new(),
    Some(Value::Object(properties)) => properties,
    Some(_) => {
      return Err(Error::MalformedGeometry(
        "feature properties must be an object".to_string(),
      ))
    }
  };

  Ok(Feature {
    id: object.remove("id"),
    properties,
    geometry,
  })
}

fn collection_from_value(value: Value) -> Result<FeatureCollection> {
  let features = match value {
    Value::Object(mut object) => match object.remove("features") {
      Some(Value::Array(features)) => features,
      _ => {
        return Err(Error::MalformedGeometry(
          "feature collection has no \"features\" array".to_string(),
        ))
      }
    },
    _ => {
      return Err(Error::MalformedGeometry(
        "feature collection is not an object".to_string(),
      ))
    }
  };

  let features = features
    .into_iter()
    .map(|feature| {
      let kind = type_of(&feature)?.to_string();
      match kind.as_str() {
        "Feature" => feature_from_value(feature),
        other => Err(Error::UnsupportedGeometryKind(format!(
          "{} inside a FeatureCollection",
          other
        ))),
      }
    })
    .collect::<Result<Vec<Feature>>>()?;

  Ok(FeatureCollection { features })
}
