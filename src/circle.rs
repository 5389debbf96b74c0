use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::geojson::GeoJson;
use crate::geom::{Feature, Geometry, Point, Polygon, Properties, Ring};

// mean earth radius in meters
pub const EARTH_RADIUS: f64 = 6_371_008.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
  Meters,
  Kilometers,
  Miles,
  NauticalMiles,
  Degrees,
  Radians,
}

impl Units {
  /// Length of one radian of arc in this unit.
  fn factor(self) -> f64 {
    match self {
      Units::Meters => EARTH_RADIUS,
      Units::Kilometers => EARTH_RADIUS / 1000.0,
      Units::Miles => EARTH_RADIUS / 1609.344,
      Units::NauticalMiles => EARTH_RADIUS / 1852.0,
      Units::Degrees => 180.0 / PI,
      Units::Radians => 1.0,
    }
  }
}

impl FromStr for Units {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s {
      "m" | "meters" | "metres" => Ok(Units::Meters),
      "km" | "kilometers" | "kilometres" => Ok(Units::Kilometers),
      "mi" | "miles" => Ok(Units::Miles),
      "nauticalmiles" => Ok(Units::NauticalMiles),
      "deg" | "degrees" => Ok(Units::Degrees),
      "rad" | "radians" => Ok(Units::Radians),
      _ => Err(format!("unknown distance unit: {}", s)),
    }
  }
}

pub fn length_to_radians(distance: f64, units: Units) -> f64 {
  distance / units.factor()
}

pub fn radians_to_length(radians: f64, units: Units) -> f64 {
  radians * units.factor()
}

/// Point reached by travelling `distance` from `origin` along the great
/// circle starting at `bearing` degrees clockwise from north.
pub fn destination(origin: Point, distance: f64, bearing: f64, units: Units) -> Point {
  let lon1 = origin.x.to_radians();
  let lat1 = origin.y.to_radians();
  let bearing = bearing.to_radians();
  let radians = length_to_radians(distance, units);

  let lat2 = (lat1.sin() * radians.cos() + lat1.cos() * radians.sin() * bearing.cos()).asin();
  let lon2 = lon1
    + (bearing.sin() * radians.sin() * lat1.cos()).atan2(radians.cos() - lat1.sin() * lat2.sin());

  Point::new(lon2.to_degrees(), lat2.to_degrees())
}

/// Great-circle (haversine) distance between two points.
pub fn distance(from: Point, to: Point, units: Units) -> f64 {
  let d_lat = (to.y - from.y).to_radians();
  let d_lon = (to.x - from.x).to_radians();
  let lat1 = from.y.to_radians();
  let lat2 = to.y.to_radians();

  let a = (d_lat / 2.0).sin().powi(2) + (d_lon / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
  radians_to_length(2.0 * a.sqrt().atan2((1.0 - a).sqrt()), units)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleOptions {
  pub steps: usize,
  pub units: Units,
  pub properties: Properties,
}

impl Default for CircleOptions {
  fn default() -> Self {
    CircleOptions {
      steps: 64,
      units: Units::Kilometers,
      properties: Properties::new(),
    }
  }
}

/// Polygon approximating the circle of `radius` around `center`.
pub fn circle(center: &GeoJson, radius: f64, options: &CircleOptions) -> Result<Feature> {
  let geometry = match center {
    GeoJson::Geometry(geometry) => geometry,
    GeoJson::Feature(feature) => &feature.geometry,
    GeoJson::FeatureCollection(_) => {
      return Err(Error::UnsupportedGeometryKind(
        "FeatureCollection".to_string(),
      ))
    }
  };
  let origin = match geometry {
    Geometry::Point(p) => *p,
    other => return Err(Error::UnsupportedGeometryKind(other.kind().to_string())),
  };
  if options.steps < 3 {
    return Err(Error::InvalidOption(format!(
      "circle needs at least 3 steps, got {}",
      options.steps
    )));
  }
  if !radius.is_finite() || radius <= 0.0 {
    return Err(Error::InvalidOption(format!(
      "circle radius must be positive, got {}",
      radius
    )));
  }

  let mut points: Vec<Point> = (0..options.steps)
    .map(|i| {
      let bearing = i as f64 * -360.0 / options.steps as f64;
      destination(origin, radius, bearing, options.units)
    })
    .collect();
  points.push(points[0]);

  Ok(Feature {
    id: None,
    properties: options.properties.clone(),
    geometry: Geometry::Polygon(Polygon {
      rings: vec![Ring { points }],
    }),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn close(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
  }

  #[test]
  fn test_destination_on_equator() {
    let north = destination(Point::new(0.0, 0.0), 1.0, 0.0, Units::Degrees);
    assert!(close(north.x, 0.0, 1e-12) && close(north.y, 1.0, 1e-12));

    let east = destination(Point::new(0.0, 0.0), 1.0, 90.0, Units::Degrees);
    assert!(close(east.x, 1.0, 1e-12) && close(east.y, 0.0, 1e-12));
  }

  #[test]
  fn test_distance_roundtrip() {
    let origin = Point::new(-75.343, 39.984);
    let target = destination(origin, 50.0, 37.5, Units::Kilometers);
    assert!(close(distance(origin, target, Units::Kilometers), 50.0, 1e-6));
    assert!(close(
      distance(origin, target, Units::Meters),
      50_000.0,
      1e-3
    ));
  }

  #[test]
  fn test_circle_ring() {
    let center = GeoJson::Geometry(Geometry::Point(Point::new(-75.343, 39.984)));
    let options = CircleOptions {
      steps: 10,
      ..CircleOptions::default()
    };
    let feature = circle(&center, 5.0, &options).unwrap();
    let ring = match &feature.geometry {
      Geometry::Polygon(polygon) => polygon.rings[0].clone(),
      other => panic!("expected a polygon, got {}", other.kind()),
    };
    assert_eq!(ring.points.len(), 11);
    assert!(ring.validate("circle").is_ok());
    for p in &ring.points {
      assert!(close(
        distance(Point::new(-75.343, 39.984), *p, Units::Kilometers),
        5.0,
        1e-6
      ));
    }
  }

  #[test]
  fn test_circle_properties_and_errors() {
    let mut properties = Properties::new();
    properties.insert("name".to_string(), serde_json::json!("zone"));
    let options = CircleOptions {
      properties: properties.clone(),
      ..CircleOptions::default()
    };
    let center = GeoJson::Feature(Feature::new(Geometry::Point(Point::new(0.0, 0.0))));
    let feature = circle(&center, 1.0, &options).unwrap();
    assert_eq!(feature.properties, properties);

    let too_few = CircleOptions {
      steps: 2,
      ..CircleOptions::default()
    };
    assert!(matches!(
      circle(&center, 1.0, &too_few),
      Err(Error::InvalidOption(_))
    ));
    assert!(matches!(
      circle(&center, -1.0, &options),
      Err(Error::InvalidOption(_))
    ));

    let line = GeoJson::Geometry(Geometry::LineString(crate::geom::LineString {
      points: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
    }));
    assert!(matches!(
      circle(&line, 1.0, &options),
      Err(Error::UnsupportedGeometryKind(_))
    ));
  }

  #[test]
  fn test_units_from_str() {
    assert_eq!("km".parse::<Units>(), Ok(Units::Kilometers));
    assert_eq!("radians".parse::<Units>(), Ok(Units::Radians));
    assert!("furlongs".parse::<Units>().is_err());
  }
}
