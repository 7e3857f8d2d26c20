use bevy::math::Vec3;
use constants::coordinate_system::survey_to_world;
use indicatif::{ProgressBar, ProgressStyle};
use las::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Create LAS file reader for point cloud access.
/// Handles both .las and .laz compressed formats.
pub fn create_reader(file_path: &Path) -> Result<Reader, Box<dyn std::error::Error>> {
    let file = File::open(file_path)?;
    let buf_reader = BufReader::new(file);
    Ok(Reader::new(buf_reader)?)
}

/// Read every point of a survey capture, converted into the tracked world frame.
pub fn load_world_points(file_path: &Path) -> Result<Vec<Vec3>, Box<dyn std::error::Error>> {
    let mut reader = create_reader(file_path)?;
    let total_points = reader.header().number_of_points() as usize;

    let pb = ProgressBar::new(total_points as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} points ({percent}%) {msg}")?
            .progress_chars("▉▊▋▌▍▎▏ "),
    );
    pb.set_message("Loading capture");

    let mut points = Vec::with_capacity(total_points);
    for (idx, point_result) in reader.points().enumerate() {
        let point = point_result?;
        points.push(survey_to_world(point.x, point.y, point.z));

        if idx % 50_000 == 0 {
            pb.set_position(idx as u64);
        }
    }
    pb.finish_with_message("Capture loaded");

    Ok(points)
}
