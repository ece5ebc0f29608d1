//! Grid aggregation for the public heat-safety map.
//!
//! Reports are snapped to square cells of `10^-precision` degrees and only
//! per-cell counts leave this module.

use std::collections::BTreeMap;

use crate::features::reports::dtos::{HeatCellDto, HeatmapDto, MapBoundsDto};
use crate::features::reports::models::{Report, ReportSeverity, ReportStatus};
use crate::shared::constants::MAX_HEATMAP_PRECISION;

#[derive(Default)]
struct CellAccumulator {
    pending: i64,
    resolved: i64,
    max_severity: ReportSeverity,
}

/// Index of the cell containing `coord` along one axis
fn cell_index(coord: f64, scale: f64) -> i64 {
    (coord * scale).floor() as i64
}

/// Centre of cell `index`, rounded to drop float noise and kept inside `limit`
fn cell_centre(index: i64, scale: f64, limit: f64) -> f64 {
    let centre = (index as f64 + 0.5) / scale;
    let fine = scale * 10.0;
    ((centre * fine).round() / fine).clamp(-limit, limit)
}

/// Aggregate reports into heatmap cells, densest first.
///
/// `precision` above `MAX_HEATMAP_PRECISION` is clamped.
pub fn aggregate(reports: &[Report], precision: u32) -> HeatmapDto {
    let precision = precision.min(MAX_HEATMAP_PRECISION);
    let scale = 10f64.powi(precision as i32);

    let mut grid: BTreeMap<(i64, i64), CellAccumulator> = BTreeMap::new();
    for report in reports {
        let key = (
            cell_index(report.latitude, scale),
            cell_index(report.longitude, scale),
        );
        let cell = grid.entry(key).or_insert_with(|| CellAccumulator {
            max_severity: report.severity,
            ..Default::default()
        });
        match report.status {
            ReportStatus::Pending => cell.pending += 1,
            ReportStatus::Resolved => cell.resolved += 1,
        }
        cell.max_severity = cell.max_severity.max(report.severity);
    }

    let mut cells: Vec<HeatCellDto> = grid
        .into_iter()
        .map(|((lat_idx, lon_idx), acc)| HeatCellDto {
            latitude: cell_centre(lat_idx, scale, 90.0),
            longitude: cell_centre(lon_idx, scale, 180.0),
            count: acc.pending + acc.resolved,
            pending: acc.pending,
            resolved: acc.resolved,
            max_severity: acc.max_severity,
        })
        .collect();
    // Stable sort keeps grid order between equally dense cells
    cells.sort_by(|a, b| b.count.cmp(&a.count));

    let bounds = (!cells.is_empty()).then(|| MapBoundsDto {
        min_lat: cells.iter().map(|c| c.latitude).fold(f64::INFINITY, f64::min),
        min_lon: cells.iter().map(|c| c.longitude).fold(f64::INFINITY, f64::min),
        max_lat: cells
            .iter()
            .map(|c| c.latitude)
            .fold(f64::NEG_INFINITY, f64::max),
        max_lon: cells
            .iter()
            .map(|c| c.longitude)
            .fold(f64::NEG_INFINITY, f64::max),
    });

    HeatmapDto {
        precision,
        cells,
        bounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn report(id: i64, lat: f64, lon: f64, severity: ReportSeverity, status: ReportStatus) -> Report {
        Report {
            id,
            user_id: Some(id * 10),
            title: format!("report {}", id),
            description: "private details".to_string(),
            image_path: None,
            latitude: lat,
            longitude: lon,
            severity,
            status,
            created_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
        }
    }

    #[test]
    fn test_same_cell_is_counted_together() {
        let reports = vec![
            report(1, 12.9716, 77.5946, ReportSeverity::Low, ReportStatus::Pending),
            report(2, 12.9749, 77.5912, ReportSeverity::High, ReportStatus::Resolved),
            report(3, -6.2088, 106.8456, ReportSeverity::Med, ReportStatus::Pending),
        ];

        let heatmap = aggregate(&reports, 2);

        assert_eq!(heatmap.precision, 2);
        assert_eq!(heatmap.cells.len(), 2);

        let dense = &heatmap.cells[0];
        assert_eq!(dense.count, 2);
        assert_eq!(dense.pending, 1);
        assert_eq!(dense.resolved, 1);
        assert_eq!(dense.max_severity, ReportSeverity::High);
        assert_eq!(dense.latitude, 12.975);
        assert_eq!(dense.longitude, 77.595);
    }

    #[test]
    fn test_negative_coordinates_snap_down() {
        let heatmap = aggregate(
            &[report(1, -6.2088, 106.8456, ReportSeverity::Med, ReportStatus::Pending)],
            1,
        );
        let cell = &heatmap.cells[0];
        assert_eq!(cell.latitude, -6.25);
        assert_eq!(cell.longitude, 106.85);
    }

    #[test]
    fn test_precision_is_clamped() {
        let heatmap = aggregate(
            &[report(1, 1.0, 1.0, ReportSeverity::Med, ReportStatus::Pending)],
            9,
        );
        assert_eq!(heatmap.precision, MAX_HEATMAP_PRECISION);
    }

    #[test]
    fn test_poles_stay_in_range() {
        let heatmap = aggregate(
            &[report(1, 90.0, 180.0, ReportSeverity::Med, ReportStatus::Pending)],
            0,
        );
        let cell = &heatmap.cells[0];
        assert!(cell.latitude <= 90.0);
        assert!(cell.longitude <= 180.0);
    }

    #[test]
    fn test_bounds() {
        let heatmap = aggregate(
            &[
                report(1, 10.0, 20.0, ReportSeverity::Med, ReportStatus::Pending),
                report(2, -10.0, -20.0, ReportSeverity::Med, ReportStatus::Pending),
            ],
            0,
        );
        let bounds = heatmap.bounds.unwrap();
        assert_eq!(bounds.min_lat, -9.5);
        assert_eq!(bounds.max_lat, 10.5);
        assert_eq!(bounds.min_lon, -19.5);
        assert_eq!(bounds.max_lon, 20.5);

        assert!(aggregate(&[], 2).bounds.is_none());
    }

    #[test]
    fn test_output_is_anonymized() {
        let heatmap = aggregate(
            &[report(42, 1.0, 1.0, ReportSeverity::Med, ReportStatus::Pending)],
            2,
        );
        let json = serde_json::to_string(&heatmap).unwrap();
        assert!(!json.contains("report 42"));
        assert!(!json.contains("private details"));
        assert!(!json.contains("\"id\""));
        assert!(!json.contains("user_id"));
    }
}
