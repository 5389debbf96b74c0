use log::debug;

use crate::error::{Error, Result};
use crate::geojson::GeoJson;
use crate::geom::{Edge, Feature, FeatureCollection, Geometry, LineString, Properties};

/// Splits every line and ring of `input` into 2-point LineString features.
///
/// Accepts LineString, MultiLineString, Polygon and MultiPolygon geometries,
/// bare, in a Feature, or as the features of a FeatureCollection. Each output
/// feature copies its source feature's properties and gets an id of the form
/// `"{feature}-{part}-{ring}-{edge}"`.
pub fn line_segment(input: &GeoJson) -> Result<FeatureCollection> {
  let mut features = Vec::new();
  match input {
    GeoJson::Geometry(geometry) => {
      segment_geometry(0, geometry, &Properties::new(), &mut features)?;
    }
    GeoJson::Feature(feature) => {
      segment_geometry(0, &feature.geometry, &feature.properties, &mut features)?;
    }
    GeoJson::FeatureCollection(collection) => {
      for (i, feature) in collection.features.iter().enumerate() {
        segment_geometry(i, &feature.geometry, &feature.properties, &mut features)?;
      }
    }
  }
  debug!(
    "Split {} into {} segments",
    input.kind(),
    features.len()
  );
  Ok(FeatureCollection { features })
}

struct SegmentSink<'a> {
  feature: usize,
  properties: &'a Properties,
  out: &'a mut Vec<Feature>,
}

impl SegmentSink<'_> {
  fn emit<I: Iterator<Item = Edge>>(&mut self, part: usize, ring: usize, edges: I) {
    for (i, edge) in edges.enumerate() {
      self.out.push(Feature {
        id: Some(serde_json::Value::String(format!(
          "{}-{}-{}-{}",
          self.feature, part, ring, i
        ))),
        properties: self.properties.clone(),
        geometry: Geometry::LineString(edge.to_line_string()),
      });
    }
  }
}

fn segment_geometry(
  feature: usize,
  geometry: &Geometry,
  properties: &Properties,
  out: &mut Vec<Feature>,
) -> Result<()> {
  let mut sink = SegmentSink {
    feature,
    properties,
    out,
  };
  match geometry {
    Geometry::LineString(line) => {
      line.validate(&format!("feature {} line", feature))?;
      sink.emit(0, 0, line.edges());
    }
    Geometry::MultiLineString(lines) => {
      for (part, line) in lines.iter().enumerate() {
        line.validate(&format!("feature {} part {}", feature, part))?;
        sink.emit(part, 0, line.edges());
      }
    }
    Geometry::Polygon(polygon) => {
      polygon.validate(&format!("feature {} polygon", feature))?;
      for (ring_idx, ring) in polygon.rings.iter().enumerate() {
        sink.emit(0, ring_idx, ring.edges());
      }
    }
    Geometry::MultiPolygon(polygons) => {
      for (part, polygon) in polygons.iter().enumerate() {
        polygon.validate(&format!("feature {} part {}", feature, part))?;
        for (ring_idx, ring) in polygon.rings.iter().enumerate() {
          sink.emit(part, ring_idx, ring.edges());
        }
      }
    }
    Geometry::Point(_) => {
      return Err(Error::UnsupportedGeometryKind(geometry.kind().to_string()));
    }
  }
  Ok(())
}

/// Gathers the output of [`line_segment`] back into one MultiLineString.
pub fn segments_to_multi_line_string(segments: &FeatureCollection) -> Result<Geometry> {
  let lines = segments
    .features
    .iter()
    .map(|feature| match &feature.geometry {
      Geometry::LineString(line) if line.points.len() == 2 => Ok(line.clone()),
      Geometry::LineString(line) => Err(Error::MalformedGeometry(format!(
        "segment has {} points, expected 2",
        line.points.len()
      ))),
      other => Err(Error::UnsupportedGeometryKind(other.kind().to_string())),
    })
    .collect::<Result<Vec<LineString>>>()?;
  Ok(Geometry::MultiLineString(lines))
}
