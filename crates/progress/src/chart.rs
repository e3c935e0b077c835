//! Text burndown chart.

use std::fmt::Write;

use goalpace_core::date::format_date;

use crate::burndown::BurndownPoint;

/// Glyph for the actual-remaining bar.
pub const ACTUAL_GLYPH: char = '#';
/// Glyph for the ideal-line marker.
pub const IDEAL_GLYPH: char = '*';
/// Rendered instead of a chart when nothing remains.
pub const ALL_DONE_MESSAGE: &str = "All tasks completed!";

/// Render a burndown as rows of text.
///
/// Columns are decimated to at most `width`; rows split `[0, max]` into
/// `height` equal bands, where `max` is the largest ideal or actual value.
pub fn render_burndown(points: &[BurndownPoint], width: usize, height: usize) -> String {
    let max = points
        .iter()
        .map(|p| p.ideal_remaining.max(p.actual_remaining as f64))
        .fold(0.0f64, f64::max);

    if points.is_empty() || max <= 0.0 {
        return ALL_DONE_MESSAGE.to_string();
    }

    let width = width.max(2);
    let height = height.max(1);
    let columns = sample_columns(points, width);

    let mut out = String::new();
    for row in (1..=height).rev() {
        let upper = max * row as f64 / height as f64;
        let lower = max * (row - 1) as f64 / height as f64;

        let _ = write!(out, "{:>6.1} |", upper);
        for point in &columns {
            let actual = point.actual_remaining as f64;
            let ideal = point.ideal_remaining;
            let glyph = if ideal > lower && ideal <= upper {
                IDEAL_GLYPH
            } else if actual > lower {
                ACTUAL_GLYPH
            } else {
                ' '
            };
            out.push(glyph);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{:>6} +{}", "0", "-".repeat(columns.len()));

    let (first, last) = (columns[0].date, columns[columns.len() - 1].date);
    let start = format_date(first);
    let end = format_date(last);
    let gap = columns.len().saturating_sub(start.len() + end.len()).max(1);
    let _ = writeln!(out, "{:>8}{}{}{}", "", start, " ".repeat(gap), end);
    let _ = write!(
        out,
        "{:>8}{} actual remaining   {} ideal",
        "", ACTUAL_GLYPH, IDEAL_GLYPH
    );

    out
}

/// Evenly pick at most `width` points, always keeping the first and last.
fn sample_columns(points: &[BurndownPoint], width: usize) -> Vec<&BurndownPoint> {
    let n = points.len();
    if n <= width {
        return points.iter().collect();
    }

    (0..width)
        .map(|c| &points[c * (n - 1) / (width - 1)])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(d: i64, ideal: f64, actual: u32) -> BurndownPoint {
        BurndownPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(d),
            ideal_remaining: ideal,
            actual_remaining: actual,
        }
    }

    #[test]
    fn test_all_done_message_when_max_is_zero() {
        let points = vec![point(0, 0.0, 0), point(1, 0.0, 0)];
        assert_eq!(render_burndown(&points, 40, 8), ALL_DONE_MESSAGE);
    }

    #[test]
    fn test_chart_has_one_line_per_band_plus_axis() {
        let points = vec![point(0, 10.0, 10), point(1, 5.0, 8), point(2, 0.0, 6)];
        let chart = render_burndown(&points, 40, 5);
        let lines: Vec<_> = chart.lines().collect();

        // 5 bands + axis + dates + legend
        assert_eq!(lines.len(), 8);
        assert!(lines[0].starts_with("  10.0 |"));
        assert!(chart.contains(ACTUAL_GLYPH));
        assert!(chart.contains(IDEAL_GLYPH));
        assert!(lines[6].contains("2024-01-01"));
        assert!(lines[6].contains("2024-01-03"));
    }

    #[test]
    fn test_columns_are_decimated_to_width() {
        let points: Vec<_> = (0..100)
            .map(|d| point(d, 100.0 - d as f64, (100 - d) as u32))
            .collect();
        let chart = render_burndown(&points, 20, 4);
        let axis = chart.lines().nth(4).unwrap();
        assert_eq!(axis.matches('-').count(), 20);
    }

    #[test]
    fn test_sample_columns_keeps_endpoints() {
        let points: Vec<_> = (0..10).map(|d| point(d, 1.0, 1)).collect();
        let sampled = sample_columns(&points, 4);
        assert_eq!(sampled.len(), 4);
        assert_eq!(sampled[0].date, points[0].date);
        assert_eq!(sampled[3].date, points[9].date);
    }
}
