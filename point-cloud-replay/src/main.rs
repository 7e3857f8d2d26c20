/// Offline replay of a recorded survey capture through the capture pipeline
mod bounds;
mod laz;
mod replay;
mod summary;

use bevy::math::Vec3;
use clap::Parser;
use constants::coordinate_system::survey_to_world;
use point_cloud_capture::CaptureSettings;
use replay::{Replay, ReplayConfig};
use std::error::Error;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about = "Replay a LAS/LAZ capture as plane-calibrated feature batches")]
struct Args {
    /// Recorded capture (.las or .laz, survey Z-up coordinates).
    input: PathBuf,

    /// First calibration tap in survey coordinates, `x,y,z`.
    #[arg(long, value_parser = parse_survey_point, allow_hyphen_values = true)]
    origin: Vec3,

    /// Second tap, fixing the width edge.
    #[arg(long, value_parser = parse_survey_point, allow_hyphen_values = true)]
    width: Vec3,

    /// Third tap, fixing the height edge.
    #[arg(long, value_parser = parse_survey_point, allow_hyphen_values = true)]
    height: Vec3,

    /// Directory receiving `batches/` and `summary.json`.
    #[arg(long)]
    output: PathBuf,

    /// Optional JSON file overriding capture settings.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Aggregation grid resolution in metres, overriding the settings file.
    #[arg(long)]
    resolution: Option<f32>,

    /// Points delivered per simulated frame.
    #[arg(long, default_value_t = 1000)]
    frame_size: usize,

    /// Confidence assigned to every replayed point.
    #[arg(long, default_value_t = 1.0)]
    confidence: f32,
}

fn parse_survey_point(value: &str) -> Result<Vec3, String> {
    let coords = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid coordinate in '{}': {}", value, err))?;

    match coords.as_slice() {
        [x, y, z] => Ok(survey_to_world(*x, *y, *z)),
        _ => Err(format!("expected x,y,z but got '{}'", value)),
    }
}

fn load_settings(args: &Args) -> Result<CaptureSettings, Box<dyn Error>> {
    let mut settings = match &args.settings {
        Some(path) => CaptureSettings::load(path)?,
        None => CaptureSettings::default(),
    };
    if let Some(resolution) = args.resolution {
        settings.aggregate_resolution = resolution;
    }
    settings.validate()?;
    Ok(settings)
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("point_cloud_capture=info".parse()?)
                .add_directive("point_cloud_replay=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let settings = load_settings(&args)?;

    info!("Loading capture {}", args.input.display());
    let points = laz::load_world_points(&args.input)?;

    let replay = Replay::new(ReplayConfig {
        calibration: [args.origin, args.width, args.height],
        frame_size: args.frame_size,
        confidence: args.confidence,
        settings,
        output_dir: args.output.clone(),
    });
    let summary = replay.run(&points)?;

    println!(
        "Sent {} of {} points in {} batches ({} left buffered, {} after aggregation)",
        summary.points_sent,
        summary.points_read,
        summary.batches.len(),
        summary.points_unsent,
        summary.aggregated_points
    );
    let [width, height, depth] = summary.bounds.dimensions();
    println!("Plane-space extent: {width:.3} x {height:.3} m, depth range {depth:.3} m");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_survey_point_is_converted_to_world() {
        let point = parse_survey_point("1.0, 2.0, 3.0").unwrap();
        assert_relative_eq!(point.x, 1.0);
        assert_relative_eq!(point.y, 3.0);
        assert_relative_eq!(point.z, -2.0);
    }

    #[test]
    fn test_survey_point_rejects_bad_input() {
        assert!(parse_survey_point("1,2").is_err());
        assert!(parse_survey_point("1,b,3").is_err());
    }

    #[test]
    fn test_args_parse_negative_coordinates() {
        let args = Args::try_parse_from([
            "point-cloud-replay",
            "scan.laz",
            "--origin",
            "-1,0,0",
            "--width",
            "1,0,0",
            "--height",
            "-1,2,0",
            "--output",
            "out",
            "--resolution",
            "0.1",
        ])
        .unwrap();

        assert_eq!(args.origin, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(args.height, Vec3::new(-1.0, 0.0, -2.0));
        assert_eq!(args.frame_size, 1000);

        let settings = load_settings(&args).unwrap();
        assert_eq!(settings.aggregate_resolution, 0.1);
    }
}
