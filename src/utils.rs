use std::path::Path;

use plotters::prelude::*;

use crate::error::{Error, Result};

/// Ties keep the earliest index; an empty slice yields 0.
pub fn argmax<T: PartialOrd>(values: &[T]) -> usize {
    let mut result: usize = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if v > &values[result] {
            result = i;
        }
    }
    return result;
}

pub fn categorical_sample(probs: &[f64], random: f64) -> usize {
    let mut b: f64 = 0.0;
    return probs
        .iter()
        .position(|p| {
            b += p;
            b > random
        })
        .unwrap_or(probs.len().saturating_sub(1));
}

pub fn moving_average(window: usize, vector: &[f64]) -> Vec<f64> {
    let window: usize = window.max(1);
    return vector
        .chunks(window)
        .map(|slice| slice.iter().sum::<f64>() / slice.len() as f64)
        .collect();
}

fn plot_error<E: std::fmt::Display>(e: E) -> Error {
    return Error::Plot {
        message: e.to_string(),
    };
}

/// Draws one line per series into a PNG at `path`.
pub fn plot_moving_average(
    values: &[Vec<f64>],
    colors: &[&RGBColor],
    legends: &[&str],
    title: &str,
    path: &Path,
) -> Result<()> {
    let longest: usize = values.iter().map(Vec::len).max().unwrap_or(0);
    let (mut low, mut high) = values
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if !low.is_finite() || !high.is_finite() {
        low = 0.0;
        high = 1.0;
    }
    if high - low < f64::EPSILON {
        low -= 0.5;
        high += 0.5;
    }

    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..longest.max(1) as f64, low..high)
        .map_err(plot_error)?;
    chart.configure_mesh().draw().map_err(plot_error)?;

    for ((series, color), legend) in values.iter().zip(colors.iter()).zip(legends.iter()) {
        let color: RGBColor = **color;
        chart
            .draw_series(LineSeries::new(
                series.iter().enumerate().map(|(x, y)| (x as f64, *y)),
                &color,
            ))
            .map_err(plot_error)?
            .label(*legend)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_error)?;
    root.present().map_err(plot_error)?;
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use rstest::rstest;

    #[rstest]
    #[case(&[1.0, 3.0, 2.0], 1)]
    #[case(&[2.0, 2.0, 1.0], 0)]
    #[case(&[0.0, 1.0, 1.0], 1)]
    #[case(&[-1.0], 0)]
    fn argmax_keeps_first_maximum(#[case] values: &[f64], #[case] expected: usize) {
        assert_eq!(argmax(values), expected);
    }

    #[rstest]
    #[case(0.0, 0)]
    #[case(0.49, 0)]
    #[case(0.5, 1)]
    #[case(0.99, 1)]
    fn categorical_sample_splits_halves(#[case] random: f64, #[case] expected: usize) {
        assert_eq!(categorical_sample(&[0.5, 0.5], random), expected);
    }

    #[test]
    fn categorical_sample_absorbs_rounding_slack() {
        assert_eq!(categorical_sample(&[0.3, 0.3, 0.3], 0.95), 2);
    }

    #[test]
    fn moving_average_handles_partial_window() {
        let averaged = moving_average(2, &[1.0, 3.0, 5.0]);
        assert_float_eq!(averaged, vec![2.0, 5.0], abs_all <= 1e-12);
    }
}
