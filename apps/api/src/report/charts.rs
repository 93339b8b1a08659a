//! Chart rendering for PDF reports. Plotters draws into an in-memory RGB
//! buffer which becomes an `image::DynamicImage` for embedding.
//!
//! The chart itself is text-free (no captions or axis labels): labels live
//! in the surrounding PDF text, so the bitmap backend needs no font support.

use image::{DynamicImage, RgbImage};
use plotters::prelude::*;

use crate::errors::AppError;
use crate::progress::ScorePoint;

const WIDTH: u32 = 720;
const HEIGHT: u32 = 400;

fn chart_err<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Report(format!("chart rendering failed: {e}"))
}

/// Renders the score-over-time line chart. Returns `None` with fewer than
/// two points — a one-point "trend" would be noise.
pub fn score_chart(series: &[ScorePoint]) -> Result<Option<DynamicImage>, AppError> {
    if series.len() < 2 {
        return Ok(None);
    }

    let mut buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let max_x = (series.len() - 1) as f64;
        let mut chart = ChartBuilder::on(&root)
            .margin(16)
            .build_cartesian_2d(-0.5f64..(max_x + 0.5), 0f64..100f64)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .draw()
            .map_err(chart_err)?;

        let points: Vec<(f64, f64)> = series
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, p.score.clamp(0.0, 100.0)))
            .collect();

        chart
            .draw_series(LineSeries::new(points.clone(), BLUE.stroke_width(2)))
            .map_err(chart_err)?;
        chart
            .draw_series(points.iter().map(|p| Circle::new(*p, 4, BLUE.filled())))
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }

    let rgb = RgbImage::from_raw(WIDTH, HEIGHT, buffer)
        .ok_or_else(|| AppError::Report("chart buffer size mismatch".to_string()))?;
    Ok(Some(DynamicImage::ImageRgb8(rgb)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn point(score: f64) -> ScorePoint {
        ScorePoint {
            timestamp: Utc::now(),
            score,
            subject: "Biology".to_string(),
        }
    }

    #[test]
    fn test_single_point_yields_no_chart() {
        assert!(score_chart(&[point(80.0)]).unwrap().is_none());
        assert!(score_chart(&[]).unwrap().is_none());
    }

    #[test]
    fn test_chart_renders_expected_dimensions() {
        let series = vec![point(40.0), point(70.0), point(90.0)];
        let image = score_chart(&series).unwrap().expect("chart expected");
        let rgb = image.to_rgb8();
        assert_eq!(rgb.width(), WIDTH);
        assert_eq!(rgb.height(), HEIGHT);
    }

    #[test]
    fn test_chart_is_not_blank() {
        let series = vec![point(10.0), point(95.0)];
        let image = score_chart(&series).unwrap().expect("chart expected");
        let rgb = image.to_rgb8();
        let non_white = rgb.pixels().filter(|p| p.0 != [255, 255, 255]).count();
        assert!(non_white > 0, "chart should contain drawn pixels");
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let series = vec![point(-20.0), point(150.0)];
        // Must not panic or error; values are clamped into the axis range.
        assert!(score_chart(&series).unwrap().is_some());
    }
}
