use geo::{BooleanOps, ChamberlainDuquetteArea, Coord};
use log::debug;

use crate::error::{Error, Result};
use crate::geojson::GeoJson;
use crate::geom::{Feature, Geometry, Point, Polygon, Ring};

/// Parts with a geodesic area at or below this many square meters are
/// treated as empty.
pub const MIN_POLYGON_AREA: f64 = 1.0;

/// Polygon parts of one operand, plus whether it was a MultiPolygon.
struct Operand {
  polygons: Vec<Polygon>,
  multi: bool,
}

impl Operand {
  fn from_geojson(input: &GeoJson, location: &str) -> Result<Operand> {
    let geometry = match input {
      GeoJson::Geometry(geometry) => geometry,
      GeoJson::Feature(feature) => &feature.geometry,
      GeoJson::FeatureCollection(_) => {
        return Err(Error::UnsupportedGeometryKind(
          "FeatureCollection".to_string(),
        ))
      }
    };
    let (polygons, multi) = match geometry {
      Geometry::Polygon(polygon) => (vec![polygon.clone()], false),
      Geometry::MultiPolygon(polygons) => (polygons.clone(), true),
      other => return Err(Error::UnsupportedGeometryKind(other.kind().to_string())),
    };
    for (i, polygon) in polygons.iter().enumerate() {
      polygon.validate(&format!("{} polygon {}", location, i))?;
    }
    Ok(Operand { polygons, multi })
  }

  /// Drops parts whose area is not above `MIN_POLYGON_AREA`.
  fn remove_empty(self) -> Option<Operand> {
    let multi = self.multi;
    let polygons: Vec<Polygon> = self
      .polygons
      .into_iter()
      .filter(|polygon| {
        to_geo(polygon).chamberlain_duquette_unsigned_area() > MIN_POLYGON_AREA
      })
      .collect();
    if polygons.is_empty() {
      None
    } else {
      Some(Operand { polygons, multi })
    }
  }

  fn to_geometry(&self) -> Geometry {
    if self.multi {
      Geometry::MultiPolygon(self.polygons.clone())
    } else {
      Geometry::Polygon(self.polygons[0].clone())
    }
  }

  fn to_geo(&self) -> geo::MultiPolygon<f64> {
    geo::MultiPolygon::new(self.polygons.iter().map(to_geo).collect())
  }
}

fn ring_to_geo(ring: &Ring) -> geo::LineString<f64> {
  ring.points.iter().map(|p| Coord { x: p.x, y: p.y }).collect()
}

fn to_geo(polygon: &Polygon) -> geo::Polygon<f64> {
  let mut rings = polygon.rings.iter().map(ring_to_geo);
  let exterior = rings.next().unwrap_or_else(|| geo::LineString::new(vec![]));
  geo::Polygon::new(exterior, rings.collect())
}

fn ring_from_geo(line: &geo::LineString<f64>) -> Ring {
  Ring {
    points: line.coords().map(|c| Point::new(c.x, c.y)).collect(),
  }
}

fn from_geo(polygon: &geo::Polygon<f64>) -> Polygon {
  let mut rings = vec![ring_from_geo(polygon.exterior())];
  rings.extend(polygon.interiors().iter().map(ring_from_geo));
  Polygon { rings }
}

/// Clips `b` out of `a`.
///
/// Both operands must be a Polygon or MultiPolygon, bare or wrapped in a
/// Feature. Parts of either operand with an area of at most
/// `MIN_POLYGON_AREA` square meters are ignored. Returns `None` when nothing
/// of `a` remains, a Polygon feature when one part remains and a
/// MultiPolygon feature otherwise. The result has empty properties.
pub fn polygon_difference(a: &GeoJson, b: &GeoJson) -> Result<Option<Feature>> {
  let a = Operand::from_geojson(a, "first geometry")?;
  let b = Operand::from_geojson(b, "second geometry")?;

  let a = match a.remove_empty() {
    Some(a) => a,
    None => {
      debug!("First polygon is empty, no difference");
      return Ok(None);
    }
  };
  let b = match b.remove_empty() {
    Some(b) => b,
    None => {
      debug!("Second polygon is empty, returning the first unchanged");
      return Ok(Some(Feature::new(a.to_geometry())));
    }
  };

  let differenced = a.to_geo().difference(&b.to_geo());
  debug!(
    "Difference of {} and {} part(s) has {} part(s)",
    a.polygons.len(),
    b.polygons.len(),
    differenced.0.len()
  );
  let mut polygons: Vec<Polygon> = differenced.0.iter().map(from_geo).collect();
  let geometry = match polygons.len() {
    0 => return Ok(None),
    1 => Geometry::Polygon(polygons.remove(0)),
    _ => Geometry::MultiPolygon(polygons),
  };
  Ok(Some(Feature::new(geometry)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geom::BoundingBox;

  fn polygon(coords: &[(f64, f64)]) -> Polygon {
    Polygon {
      rings: vec![Ring {
        points: coords.iter().map(|&(x, y)| Point::new(x, y)).collect(),
      }],
    }
  }

  fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon {
    polygon(&[
      (min_x, min_y),
      (max_x, min_y),
      (max_x, max_y),
      (min_x, max_y),
      (min_x, min_y),
    ])
  }

  fn geometry(polygon: Polygon) -> GeoJson {
    GeoJson::Geometry(Geometry::Polygon(polygon))
  }

  fn assert_bbox_close(actual: BoundingBox, expected: BoundingBox) {
    let pairs = [
      (actual.min_x, expected.min_x),
      (actual.min_y, expected.min_y),
      (actual.max_x, expected.max_x),
      (actual.max_y, expected.max_y),
    ];
    for (a, e) in pairs {
      assert!((a - e).abs() < 1e-9, "{:?} != {:?}", actual, expected);
    }
  }

  #[test]
  fn test_overlapping_rectangles() {
    let a = geometry(polygon(&[
      (128.0, -26.0),
      (141.0, -26.0),
      (141.0, -21.0),
      (128.0, -21.0),
      (128.0, -26.0),
    ]));
    let b = geometry(polygon(&[
      (126.0, -28.0),
      (140.0, -28.0),
      (140.0, -20.0),
      (126.0, -20.0),
      (126.0, -28.0),
    ]));
    let result = polygon_difference(&a, &b).unwrap().unwrap();
    assert!(result.properties.is_empty());
    match &result.geometry {
      Geometry::Polygon(polygon) => {
        assert_eq!(polygon.rings.len(), 1);
        assert!(polygon.rings[0].validate("result").is_ok());
      }
      other => panic!("expected a polygon, got {}", other.kind()),
    }
    assert_bbox_close(
      result.geometry.bbox().unwrap(),
      BoundingBox {
        min_x: 140.0,
        min_y: -26.0,
        max_x: 141.0,
        max_y: -21.0,
      },
    );
  }

  #[test]
  fn test_covered_polygon_is_none() {
    let a = geometry(rect(1.0, 1.0, 2.0, 2.0));
    let b = geometry(rect(0.0, 0.0, 3.0, 3.0));
    assert_eq!(polygon_difference(&a, &b).unwrap(), None);
  }

  #[test]
  fn test_empty_first_polygon_is_none() {
    let a = geometry(rect(10.0, 10.0, 10.000001, 10.000001));
    let b = geometry(rect(20.0, 20.0, 21.0, 21.0));
    assert_eq!(polygon_difference(&a, &b).unwrap(), None);
  }

  #[test]
  fn test_empty_second_polygon_keeps_first() {
    let a = rect(0.0, 0.0, 1.0, 1.0);
    let b = geometry(rect(0.5, 0.5, 0.500001, 0.500001));
    let result = polygon_difference(&geometry(a.clone()), &b).unwrap().unwrap();
    assert_eq!(result.geometry, Geometry::Polygon(a));
    assert!(result.properties.is_empty());
  }

  #[test]
  fn test_empty_parts_dropped_from_multi_polygon() {
    let big = rect(0.0, 0.0, 1.0, 1.0);
    let tiny = rect(5.0, 5.0, 5.000001, 5.000001);
    let a = GeoJson::Geometry(Geometry::MultiPolygon(vec![big.clone(), tiny]));
    let b = geometry(rect(30.0, 30.0, 30.000001, 30.000001));
    let result = polygon_difference(&a, &b).unwrap().unwrap();
    assert_eq!(result.geometry, Geometry::MultiPolygon(vec![big]));
  }

  #[test]
  fn test_split_gives_multi_polygon() {
    let a = geometry(rect(0.0, 0.0, 3.0, 1.0));
    let b = geometry(rect(1.0, -1.0, 2.0, 2.0));
    let result = polygon_difference(&a, &b).unwrap().unwrap();
    match &result.geometry {
      Geometry::MultiPolygon(parts) => {
        assert_eq!(parts.len(), 2);
        let mut boxes: Vec<BoundingBox> = parts
          .iter()
          .map(|p| BoundingBox::from_points(&p.rings[0].points).unwrap())
          .collect();
        boxes.sort_by(|l, r| l.min_x.total_cmp(&r.min_x));
        assert_bbox_close(
          boxes[0],
          BoundingBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 1.0,
            max_y: 1.0,
          },
        );
        assert_bbox_close(
          boxes[1],
          BoundingBox {
            min_x: 2.0,
            min_y: 0.0,
            max_x: 3.0,
            max_y: 1.0,
          },
        );
      }
      other => panic!("expected a multipolygon, got {}", other.kind()),
    }
  }

  #[test]
  fn test_feature_operands() {
    let a = GeoJson::Feature(Feature::new(Geometry::Polygon(rect(0.0, 0.0, 2.0, 2.0))));
    let b = GeoJson::Feature(Feature::new(Geometry::Polygon(rect(1.0, 0.0, 3.0, 2.0))));
    let result = polygon_difference(&a, &b).unwrap().unwrap();
    assert_bbox_close(
      result.geometry.bbox().unwrap(),
      BoundingBox {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 1.0,
        max_y: 2.0,
      },
    );
  }

  #[test]
  fn test_non_polygon_is_unsupported() {
    let line = GeoJson::Geometry(Geometry::LineString(crate::geom::LineString {
      points: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
    }));
    let a = geometry(rect(0.0, 0.0, 1.0, 1.0));
    assert!(matches!(
      polygon_difference(&a, &line),
      Err(Error::UnsupportedGeometryKind(kind)) if kind == "LineString"
    ));
    assert!(matches!(
      polygon_difference(&line, &a),
      Err(Error::UnsupportedGeometryKind(_))
    ));
  }

  #[test]
  fn test_open_ring_is_malformed() {
    let a = geometry(polygon(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]));
    let b = geometry(rect(0.0, 0.0, 1.0, 1.0));
    assert!(matches!(
      polygon_difference(&a, &b),
      Err(Error::MalformedGeometry(_))
    ));
  }
}
