use clap::{Parser, Subcommand};
use log::{error, info};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;

use line_tool::config::Config;
use line_tool::geojson::{self, GeoJson};
use line_tool::geom::{Geometry, Point};
use line_tool::{circle, line_intersect, line_segment, polygon_difference, Result, Units};

#[derive(Debug, Parser)]
#[clap(
  name = "line_tool",
  about = "A tool for intersecting and segmenting GeoJSON lines",
  version
)]
struct Cli {
  /// JSON configuration file
  #[clap(long, value_parser, global = true)]
  config: Option<PathBuf>,

  /// Pretty-print the output GeoJSON
  #[clap(long, action, global = true)]
  pretty: bool,

  #[clap(subcommand)]
  command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
  #[clap(
    name = "intersect",
    about = "Find the points where two lines or polygon boundaries cross"
  )]
  Intersect {
    /// First LineString or Polygon
    #[clap(value_parser)]
    first: PathBuf,

    /// Second LineString or Polygon
    #[clap(value_parser)]
    second: PathBuf,

    /// Drop repeated intersection points
    #[clap(long, action)]
    dedup: bool,

    /// Parallel-determinant tolerance
    #[clap(long, value_parser)]
    tolerance: Option<f64>,
  },
  #[clap(
    name = "segment",
    about = "Split lines and polygon rings into 2-point segments"
  )]
  Segment {
    /// Input geometry, Feature or FeatureCollection
    #[clap(value_parser)]
    input: PathBuf,
  },
  #[clap(
    name = "difference",
    about = "Clip the second polygon out of the first, printing null when nothing remains"
  )]
  Difference {
    /// Polygon or MultiPolygon to clip from
    #[clap(value_parser)]
    first: PathBuf,

    /// Polygon or MultiPolygon to remove
    #[clap(value_parser)]
    second: PathBuf,
  },
  #[clap(name = "circle", about = "Build a polygon approximating a circle")]
  Circle {
    #[clap(value_parser, allow_hyphen_values = true)]
    lng: f64,

    #[clap(value_parser, allow_hyphen_values = true)]
    lat: f64,

    #[clap(value_parser)]
    radius: f64,

    /// Number of ring vertices
    #[clap(long, value_parser)]
    steps: Option<usize>,

    /// meters, kilometers, miles, nauticalmiles, degrees or radians
    #[clap(long, value_parser)]
    units: Option<Units>,
  },
}

fn read_geojson(path: &Path) -> Result<GeoJson> {
  info!("Reading {}", path.display());
  geojson::from_reader(BufReader::new(File::open(path)?))
}

fn run(args: Cli) -> Result<String> {
  let mut config = match &args.config {
    Some(path) => Config::load(path)?,
    None => Config::default(),
  };

  match args.command {
    Commands::Intersect {
      first,
      second,
      dedup,
      tolerance,
    } => {
      if dedup {
        config.intersect.dedup = true;
      }
      if let Some(tolerance) = tolerance {
        config.intersect.tolerance = tolerance;
      }
      config.validate()?;
      let a = read_geojson(&first)?;
      let b = read_geojson(&second)?;
      let result = line_intersect(&a, &b, &config.intersect)?;
      info!("Found {} intersection points", result.len());
      geojson::to_string(&result, args.pretty)
    }
    Commands::Segment { input } => {
      let input = read_geojson(&input)?;
      let result = line_segment(&input)?;
      info!("Split input into {} segments", result.len());
      geojson::to_string(&result, args.pretty)
    }
    Commands::Difference { first, second } => {
      let a = read_geojson(&first)?;
      let b = read_geojson(&second)?;
      let result = polygon_difference(&a, &b)?;
      if result.is_none() {
        info!("Nothing of the first polygon remains");
      }
      geojson::to_string(&result, args.pretty)
    }
    Commands::Circle {
      lng,
      lat,
      radius,
      steps,
      units,
    } => {
      if let Some(steps) = steps {
        config.circle.steps = steps;
      }
      if let Some(units) = units {
        config.circle.units = units;
      }
      let center = GeoJson::Geometry(Geometry::Point(Point::new(lng, lat)));
      let feature = circle(&center, radius, &config.circle)?;
      geojson::to_string(&feature, args.pretty)
    }
  }
}

fn main() {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

  let args = Cli::parse();
  match run(args) {
    Ok(output) => {
      let mut stdout = io::stdout().lock();
      if let Err(e) = writeln!(stdout, "{}", output) {
        error!("Failed to write output: {}", e);
        process::exit(1);
      }
    }
    Err(e) => {
      error!("{}", e);
      process::exit(1);
    }
  }
}
