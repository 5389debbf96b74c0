use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::geojson::GeoJson;
use crate::geom::{BoundingBox, Edge, Feature, FeatureCollection, Geometry, Point};
use crate::parallel;

pub const DEFAULT_TOLERANCE: f64 = 1e-10;

// below this many edge pairs the thread setup costs more than it saves
pub const DEFAULT_PARALLEL_MIN_PAIRS: usize = 250_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parallelism {
  Never,
  Auto,
  Always,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectOptions {
  /// Sine of the angle under which two segments count as parallel, also used
  /// as the slack on the [0, 1] segment parameters. Both are independent of
  /// segment length.
  pub tolerance: f64,
  /// Keep only the first occurrence of each exactly-equal point.
  pub dedup: bool,
  pub parallel: Parallelism,
  pub parallel_min_pairs: usize,
  /// Worker count for the parallel path, `None` sizes the pool from the CPU count.
  pub workers: Option<usize>,
}

impl Default for IntersectOptions {
  fn default() -> Self {
    IntersectOptions {
      tolerance: DEFAULT_TOLERANCE,
      dedup: false,
      parallel: Parallelism::Auto,
      parallel_min_pairs: DEFAULT_PARALLEL_MIN_PAIRS,
      workers: None,
    }
  }
}

impl IntersectOptions {
  fn use_parallel(&self, pairs: usize) -> bool {
    match self.parallel {
      Parallelism::Never => false,
      Parallelism::Always => true,
      Parallelism::Auto => pairs >= self.parallel_min_pairs,
    }
  }
}

/// Finds every point where an edge of `a` meets an edge of `b`.
///
/// Both inputs must be a LineString or a Polygon, bare or wrapped in a
/// Feature; polygons contribute the edges of all their rings. Points are
/// ordered by `a`'s edges, then `b`'s edges, and are not deduplicated unless
/// `options.dedup` is set.
pub fn line_intersect(
  a: &GeoJson,
  b: &GeoJson,
  options: &IntersectOptions,
) -> Result<FeatureCollection> {
  let (edges_a, bbox_a) = linear_edges(a, "first geometry")?;
  let (edges_b, bbox_b) = linear_edges(b, "second geometry")?;
  debug!(
    "Intersecting {} edges against {} edges",
    edges_a.len(),
    edges_b.len()
  );

  let disjoint = match (bbox_a, bbox_b) {
    (Some(bbox_a), Some(bbox_b)) => !bbox_a.intersects(&bbox_b, options.tolerance),
    _ => true,
  };
  if disjoint {
    debug!("Bounding boxes do not overlap, no intersections");
    return Ok(FeatureCollection::default());
  }

  let pairs = edges_a.len().saturating_mul(edges_b.len());
  let mut points = if options.use_parallel(pairs) {
    let workers = options
      .workers
      .unwrap_or_else(parallel::default_workers)
      .max(1);
    let chunk_size = (edges_a.len() + workers * 4 - 1) / (workers * 4);
    parallel::map_chunks(&edges_a, chunk_size, workers, |chunk| {
      intersect_edges(chunk, &edges_b, options.tolerance)
    })
    .into_iter()
    .flatten()
    .collect()
  } else {
    intersect_edges(&edges_a, &edges_b, options.tolerance)
  };

  if options.dedup {
    points = dedup_points(points);
  }
  debug!("Found {} intersection points", points.len());

  Ok(FeatureCollection {
    features: points
      .into_iter()
      .map(|p| Feature::new(Geometry::Point(p)))
      .collect(),
  })
}

fn linear_edges(
  input: &GeoJson,
  argument: &str,
) -> Result<(Vec<Edge>, Option<BoundingBox>)> {
  let geometry = match input {
    GeoJson::Geometry(geometry) => geometry,
    GeoJson::Feature(feature) => &feature.geometry,
    GeoJson::FeatureCollection(_) => {
      debug!("Rejecting FeatureCollection as {}", argument);
      return Err(Error::UnsupportedGeometryKind(
        "FeatureCollection".to_string(),
      ));
    }
  };

  match geometry {
    Geometry::LineString(line) => {
      line.validate(argument)?;
      Ok((line.edges().collect(), geometry.bbox()))
    }
    Geometry::Polygon(polygon) => {
      polygon.validate(argument)?;
      let edges = polygon.rings.iter().flat_map(|ring| ring.edges()).collect();
      Ok((edges, geometry.bbox()))
    }
    Geometry::Point(_) | Geometry::MultiLineString(_) | Geometry::MultiPolygon(_) => {
      debug!("Rejecting {} as {}", geometry.kind(), argument);
      Err(Error::UnsupportedGeometryKind(geometry.kind().to_string()))
    }
  }
}

fn intersect_edges(edges_a: &[Edge], edges_b: &[Edge], tolerance: f64) -> Vec<Point> {
  let boxes_b: Vec<BoundingBox> = edges_b.iter().map(Edge::bbox).collect();
  let mut points = Vec::new();
  for e1 in edges_a {
    let bbox_1 = e1.bbox();
    for (e2, bbox_2) in edges_b.iter().zip(&boxes_b) {
      if !bbox_1.intersects(bbox_2, tolerance) {
        continue;
      }
      if let Some(p) = segment_intersection(e1, e2, tolerance) {
        points.push(p);
      }
    }
  }
  points
}

fn cross(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
  ax * by - ay * bx
}

/// Intersection point of two finite segments.
///
/// Solves `e1.a + t * (e1.b - e1.a) == e2.a + u * (e2.b - e2.a)` and accepts
/// the point when both `t` and `u` lie in [0, 1]. Parameters within
/// `tolerance` of 0 or 1 snap to the exact endpoint. Collinear segments yield
/// a point only when they touch at a single endpoint; an overlap of positive
/// length has no unique point and yields `None`.
///
/// The parallel and collinear tests compare cross products against the
/// product of the vector lengths, so the result does not depend on the scale
/// of the coordinates.
pub fn segment_intersection(e1: &Edge, e2: &Edge, tolerance: f64) -> Option<Point> {
  let (rx, ry) = (e1.b.x - e1.a.x, e1.b.y - e1.a.y);
  let (sx, sy) = (e2.b.x - e2.a.x, e2.b.y - e2.a.y);
  let (qx, qy) = (e2.a.x - e1.a.x, e2.a.y - e1.a.y);
  let len_r = rx.hypot(ry);

  let denom = cross(rx, ry, sx, sy);
  if denom.abs() <= tolerance * len_r * sx.hypot(sy) {
    if cross(qx, qy, rx, ry).abs() > tolerance * len_r * qx.hypot(qy) {
      // parallel, not on the same line
      return None;
    }
    return collinear_touch(e1, e2, tolerance);
  }

  let t = cross(qx, qy, sx, sy) / denom;
  let u = cross(qx, qy, rx, ry) / denom;
  if t < -tolerance || t > 1.0 + tolerance || u < -tolerance || u > 1.0 + tolerance {
    return None;
  }

  if t.abs() <= tolerance {
    Some(e1.a)
  } else if (t - 1.0).abs() <= tolerance {
    Some(e1.b)
  } else if u.abs() <= tolerance {
    Some(e2.a)
  } else if (u - 1.0).abs() <= tolerance {
    Some(e2.b)
  } else {
    Some(Point::new(e1.a.x + t * rx, e1.a.y + t * ry))
  }
}

fn collinear_touch(e1: &Edge, e2: &Edge, tolerance: f64) -> Option<Point> {
  let (rx, ry) = (e1.b.x - e1.a.x, e1.b.y - e1.a.y);
  let len_sq = rx * rx + ry * ry;

  // project e2 onto e1's parameter line
  let t0 = ((e2.a.x - e1.a.x) * rx + (e2.a.y - e1.a.y) * ry) / len_sq;
  let t1 = ((e2.b.x - e1.a.x) * rx + (e2.b.y - e1.a.y) * ry) / len_sq;
  let lo = t0.min(t1).max(0.0);
  let hi = t0.max(t1).min(1.0);

  if hi < lo - tolerance || hi - lo > tolerance {
    return None;
  }

  if e1.a == e2.a || e1.a == e2.b {
    Some(e1.a)
  } else if e1.b == e2.a || e1.b == e2.b {
    Some(e1.b)
  } else {
    Some(Point::new(e1.a.x + lo * rx, e1.a.y + lo * ry))
  }
}

fn dedup_points(points: Vec<Point>) -> Vec<Point> {
  let mut seen = HashSet::new();
  points
    .into_iter()
    // adding 0.0 folds -0.0 into 0.0
    .filter(|p| seen.insert(((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits())))
    .collect()
}
