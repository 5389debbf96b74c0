use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

pub type Properties = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

impl Point {
  pub fn new(x: f64, y: f64) -> Point {
    Point { x, y }
  }
}

// GeoJSON positions may carry an altitude; only x and y are kept.
impl TryFrom<Vec<f64>> for Point {
  type Error = String;

  fn try_from(position: Vec<f64>) -> std::result::Result<Self, Self::Error> {
    if position.len() < 2 {
      return Err(format!(
        "position needs at least 2 ordinates, found {}",
        position.len()
      ));
    }
    let (x, y) = (position[0], position[1]);
    if !x.is_finite() || !y.is_finite() {
      return Err("position ordinates must be finite".to_string());
    }
    Ok(Point { x, y })
  }
}

impl From<Point> for [f64; 2] {
  fn from(p: Point) -> Self {
    [p.x, p.y]
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
  pub min_x: f64,
  pub min_y: f64,
  pub max_x: f64,
  pub max_y: f64,
}

impl BoundingBox {
  pub fn from_points<'a, I: IntoIterator<Item = &'a Point>>(points: I) -> Option<BoundingBox> {
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let mut bbox = BoundingBox {
      min_x: first.x,
      min_y: first.y,
      max_x: first.x,
      max_y: first.y,
    };
    for p in iter {
      bbox.min_x = bbox.min_x.min(p.x);
      bbox.min_y = bbox.min_y.min(p.y);
      bbox.max_x = bbox.max_x.max(p.x);
      bbox.max_y = bbox.max_y.max(p.y);
    }
    Some(bbox)
  }

  pub fn union(&self, other: &BoundingBox) -> BoundingBox {
    BoundingBox {
      min_x: self.min_x.min(other.min_x),
      min_y: self.min_y.min(other.min_y),
      max_x: self.max_x.max(other.max_x),
      max_y: self.max_y.max(other.max_y),
    }
  }

  // touching boxes count as intersecting, so shared endpoints survive the filter
  pub fn intersects(&self, other: &BoundingBox, tolerance: f64) -> bool {
    self.min_x <= other.max_x + tolerance
      && other.min_x <= self.max_x + tolerance
      && self.min_y <= other.max_y + tolerance
      && other.min_y <= self.max_y + tolerance
  }
}

/// One straight segment between two distinct points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
  pub a: Point,
  pub b: Point,
}

impl Edge {
  /// Returns `None` for a zero-length segment.
  pub fn new(a: Point, b: Point) -> Option<Edge> {
    if a == b {
      None
    } else {
      Some(Edge { a, b })
    }
  }

  pub fn bbox(&self) -> BoundingBox {
    BoundingBox {
      min_x: self.a.x.min(self.b.x),
      min_y: self.a.y.min(self.b.y),
      max_x: self.a.x.max(self.b.x),
      max_y: self.a.y.max(self.b.y),
    }
  }

  pub fn to_line_string(self) -> LineString {
    LineString {
      points: vec![self.a, self.b],
    }
  }
}

// consecutive pairs, skipping repeated vertices
fn edges_of(points: &[Point]) -> impl Iterator<Item = Edge> + '_ {
  points.windows(2).filter_map(|w| Edge::new(w[0], w[1]))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineString {
  pub points: Vec<Point>,
}

impl LineString {
  pub fn validate(&self, location: &str) -> Result<()> {
    if self.points.len() < 2 {
      return Err(Error::MalformedGeometry(format!(
        "{} has {} point(s), a line needs at least 2",
        location,
        self.points.len()
      )));
    }
    Ok(())
  }

  pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
    edges_of(&self.points)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ring {
  pub points: Vec<Point>,
}

impl Ring {
  pub fn validate(&self, location: &str) -> Result<()> {
    if self.points.len() < 4 {
      return Err(Error::MalformedGeometry(format!(
        "{} has {} point(s), a ring needs at least 4",
        location,
        self.points.len()
      )));
    }
    if self.points.first() != self.points.last() {
      return Err(Error::MalformedGeometry(format!(
        "{} is not closed",
        location
      )));
    }
    Ok(())
  }

  pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
    edges_of(&self.points)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
  pub rings: Vec<Ring>,
}

impl Polygon {
  pub fn validate(&self, location: &str) -> Result<()> {
    if self.rings.is_empty() {
      return Err(Error::MalformedGeometry(format!(
        "{} has no rings",
        location
      )));
    }
    for (i, ring) in self.rings.iter().enumerate() {
      ring.validate(&format!("{} ring {}", location, i))?;
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
  Point(Point),
  LineString(LineString),
  Polygon(Polygon),
  MultiLineString(Vec<LineString>),
  MultiPolygon(Vec<Polygon>),
}

impl Geometry {
  pub fn kind(&self) -> &'static str {
    match self {
      Geometry::Point(_) => "Point",
      Geometry::LineString(_) => "LineString",
      Geometry::Polygon(_) => "Polygon",
      Geometry::MultiLineString(_) => "MultiLineString",
      Geometry::MultiPolygon(_) => "MultiPolygon",
    }
  }

  pub fn bbox(&self) -> Option<BoundingBox> {
    match self {
      Geometry::Point(p) => BoundingBox::from_points([p]),
      Geometry::LineString(line) => BoundingBox::from_points(&line.points),
      Geometry::Polygon(polygon) => {
        BoundingBox::from_points(polygon.rings.iter().flat_map(|r| r.points.iter()))
      }
      Geometry::MultiLineString(lines) => {
        BoundingBox::from_points(lines.iter().flat_map(|l| l.points.iter()))
      }
      Geometry::MultiPolygon(polygons) => BoundingBox::from_points(
        polygons
          .iter()
          .flat_map(|p| p.rings.iter())
          .flat_map(|r| r.points.iter()),
      ),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
  pub id: Option<serde_json::Value>,
  pub properties: Properties,
  pub geometry: Geometry,
}

impl Feature {
  pub fn new(geometry: Geometry) -> Feature {
    Feature {
      id: None,
      properties: Properties::new(),
      geometry,
    }
  }
}

impl Serialize for Feature {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let len = if self.id.is_some() { 4 } else { 3 };
    let mut map = serializer.serialize_map(Some(len))?;
    map.serialize_entry("type", "Feature")?;
    if let Some(id) = &self.id {
      map.serialize_entry("id", id)?;
    }
    map.serialize_entry("properties", &self.properties)?;
    map.serialize_entry("geometry", &self.geometry)?;
    map.end()
  }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
  pub features: Vec<Feature>,
}

impl FeatureCollection {
  pub fn len(&self) -> usize {
    self.features.len()
  }

  pub fn is_empty(&self) -> bool {
    self.features.is_empty()
  }
}

impl Serialize for FeatureCollection {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(2))?;
    map.serialize_entry("type", "FeatureCollection")?;
    map.serialize_entry("features", &self.features)?;
    map.end()
  }
}
