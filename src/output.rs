use std::fs;
use std::path::Path;
use csv::Writer;
use serde::Serialize;

use crate::crop_planner::CropRegion;
use crate::errors::Result;
use crate::geometry::Candidate;
use crate::outlier_filter::{FilterPolicy, RadiusStats};

#[derive(Serialize)]
struct CircleRow {
    x: i32,
    y: i32,
    r: i32,
}

#[derive(Serialize)]
struct BoxRow {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    w: u32,
    h: u32,
}

/// Per-image numeric summary written next to the CSV arrays
#[derive(Debug, Serialize)]
pub struct EntrySummary<'a> {
    pub name: &'a str,
    pub class: &'a str,
    pub image_size: (u32, u32),
    pub threshold_level: u8,
    pub policy: FilterPolicy,
    pub stats: RadiusStats,
    pub boundary_count: usize,
    pub accepted: Vec<usize>,
    pub rejected: Vec<usize>,
    pub crops: &'a [CropRegion],
    pub crops_outside_frame: usize,
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write `x,y,r` rows, one per fitted candidate
pub fn write_circles_csv<P: AsRef<Path>>(candidates: &[Candidate], path: P) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let mut writer = Writer::from_path(path)?;
    for c in candidates {
        writer.serialize(CircleRow { x: c.circle.x, y: c.circle.y, r: c.circle.r })?;
    }
    writer.flush()?;

    Ok(())
}

/// Write `x1,y1,x2,y2,w,h` rows, one per fitted candidate
pub fn write_boxes_csv<P: AsRef<Path>>(candidates: &[Candidate], path: P) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let mut writer = Writer::from_path(path)?;
    for c in candidates {
        writer.serialize(BoxRow {
            x1: c.bbox.top_left.x,
            y1: c.bbox.top_left.y,
            x2: c.bbox.bottom_right.x,
            y2: c.bbox.bottom_right.y,
            w: c.bbox.size.0,
            h: c.bbox.size.1,
        })?;
    }
    writer.flush()?;

    Ok(())
}

pub fn write_summary_json<P: AsRef<Path>>(summary: &EntrySummary, path: P) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(file, summary)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoundingBox, Circle, Point};

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate {
                boundary_id: 0,
                circle: Circle { x: 10, y: 20, r: 5 },
                bbox: BoundingBox { top_left: Point::new(6, 15), bottom_right: Point::new(14, 25), size: (8, 10) },
            },
            Candidate {
                boundary_id: 3,
                circle: Circle { x: 40, y: 41, r: 7 },
                bbox: BoundingBox { top_left: Point::new(33, 35), bottom_right: Point::new(47, 48), size: (14, 13) },
            },
        ]
    }

    #[test]
    fn circles_csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("a.circles.csv");
        write_circles_csv(&candidates(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["x,y,r", "10,20,5", "40,41,7"]);
    }

    #[test]
    fn boxes_csv_has_corners_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.boxes.csv");
        write_boxes_csv(&candidates(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["x1,y1,x2,y2,w,h", "6,15,14,25,8,10", "33,35,47,48,14,13"]);
    }

    #[test]
    fn summary_is_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.summary.json");
        let stats = RadiusStats { count: 2, min: 5.0, max: 7.0, mean: 6.0, median: 6.0, std: 1.0 };
        let crops = [CropRegion { boundary_id: 3, top_left: Point::new(-160, -159), bottom_right: Point::new(240, 241) }];
        let summary = EntrySummary {
            name: "a",
            class: "black",
            image_size: (100, 100),
            threshold_level: 90,
            policy: FilterPolicy::TightBand { band: 25.0 },
            stats,
            boundary_count: 2,
            accepted: vec![3],
            rejected: vec![0],
            crops: &crops,
            crops_outside_frame: 1,
        };
        write_summary_json(&summary, &path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["policy"]["kind"], "tight_band");
        assert_eq!(value["stats"]["median"], 6.0);
        assert_eq!(value["crops"][0]["top_left"]["x"], -160);
        assert_eq!(value["accepted"][0], 3);
    }
}
