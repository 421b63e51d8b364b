//! Chart specifications sent to the tracking backend.
//!
//! The backend renders them; this crate only computes the data.

use serde::{Deserialize, Serialize};

/// Bucket count used for column histograms.
pub const HISTOGRAM_BINS: usize = 30;

/// Relative half-width given to a constant column's range.
const CONSTANT_PAD: f64 = 1e-9;

/// One histogram bucket, `[lower, upper)` except the last which is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Figure {
    Histogram {
        title: String,
        x_label: String,
        y_label: String,
        bins: Vec<Bin>,
    },
    Line {
        title: String,
        x_label: String,
        y_label: String,
        label: String,
        points: Vec<(f64, f64)>,
    },
}

impl Figure {
    /// Equal-width frequency histogram of `values`.
    ///
    /// Non-finite values are ignored. A constant column is spread over a
    /// range centred on the value, at least one unit wide.
    pub fn histogram(column: &str, values: &[f64], bins: usize) -> Figure {
        let bins = bins.max(1);
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();

        let (mut lo, mut hi) = finite
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        if finite.is_empty() {
            lo = 0.0;
            hi = 1.0;
        } else if lo == hi {
            let pad = (lo.abs() * CONSTANT_PAD).max(0.5);
            lo = (lo - pad).max(f64::MIN);
            hi = (hi + pad).min(f64::MAX);
        }

        // Halved so that spans wider than f64::MAX stay finite.
        let half_span = hi / 2.0 - lo / 2.0;
        let mut counts = vec![0u64; bins];
        for v in &finite {
            let t = (v / 2.0 - lo / 2.0) / half_span;
            let idx = ((t * bins as f64) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let edge = |i: usize| {
            let t = i as f64 / bins as f64;
            lo * (1.0 - t) + hi * t
        };
        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| Bin {
                lower: edge(i),
                upper: edge(i + 1),
                count,
            })
            .collect();

        Figure::Histogram {
            title: format!("Histogram of {}", column),
            x_label: column.to_string(),
            y_label: "Frequency".to_string(),
            bins,
        }
    }

    /// Values plotted against their row index. Non-finite values leave a gap.
    pub fn line(label: &str, values: &[f64]) -> Figure {
        Figure::Line {
            title: format!("{} Values Over Index", capitalize(label)),
            x_label: "Index".to_string(),
            y_label: capitalize(label),
            label: capitalize(label),
            points: values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_finite())
                .map(|(i, v)| (i as f64, *v))
                .collect(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bins_of(figure: &Figure) -> &[Bin] {
        match figure {
            Figure::Histogram { bins, .. } => bins,
            _ => panic!("not a histogram"),
        }
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let values: Vec<f64> = (0..100).map(|i| i as f64 / 10.0).collect();
        let figure = Figure::histogram("score", &values, HISTOGRAM_BINS);
        let bins = bins_of(&figure);
        assert_eq!(bins.len(), 30);
        assert_eq!(bins.iter().map(|b| b.count).sum::<u64>(), 100);
        // Maximum lands in the closed last bucket.
        assert!(bins.last().unwrap().count >= 1);
        assert_eq!(bins[0].lower, 0.0);
        assert!((bins[29].upper - 9.9).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_constant_column() {
        let figure = Figure::histogram("x", &[2.0, 2.0, 2.0], 30);
        let bins = bins_of(&figure);
        assert_eq!(bins.iter().map(|b| b.count).sum::<u64>(), 3);
        assert_eq!(bins.iter().filter(|b| b.count > 0).count(), 1);
        assert!((bins[0].lower - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_skips_nan() {
        let figure = Figure::histogram("x", &[f64::NAN, 1.0, 3.0], 2);
        let bins = bins_of(&figure);
        assert_eq!(bins.iter().map(|b| b.count).collect::<Vec<_>>(), vec![1, 1]);
    }

    #[test]
    fn test_histogram_large_constant_column() {
        let v = 2f64.powi(60);
        let figure = Figure::histogram("x", &[v, v], 30);
        let bins = bins_of(&figure);
        assert!(bins.iter().all(|b| b.lower < b.upper));
        assert_eq!(bins.iter().filter(|b| b.count > 0).count(), 1);
        assert_eq!(bins.iter().map(|b| b.count).sum::<u64>(), 2);
    }

    #[test]
    fn test_histogram_extreme_span_has_finite_edges() {
        let figure = Figure::histogram("x", &[-f64::MAX, 0.0, f64::MAX], 30);
        let bins = bins_of(&figure);
        assert!(bins.iter().all(|b| b.lower.is_finite() && b.upper.is_finite()));
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[29].count, 1);
        assert_eq!(bins.iter().map(|b| b.count).sum::<u64>(), 3);
    }

    #[test]
    fn test_line_skips_nan() {
        let Figure::Line { points, .. } = Figure::line("score", &[0.5, f64::NAN, 0.9]) else {
            panic!("not a line");
        };
        assert_eq!(points, vec![(0.0, 0.5), (2.0, 0.9)]);
    }

    #[test]
    fn test_line_titles() {
        let Figure::Line { title, points, .. } = Figure::line("score", &[0.5, 0.7]) else {
            panic!("not a line");
        };
        assert_eq!(title, "Score Values Over Index");
        assert_eq!(points, vec![(0.0, 0.5), (1.0, 0.7)]);
    }
}
