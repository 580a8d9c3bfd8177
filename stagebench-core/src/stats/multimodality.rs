//! Multimodality score (mValue) over histograms of a sample.
//!
//! A unimodal histogram, padded with empty bins, rises once and falls once,
//! so the sum of absolute bin-to-bin changes is twice the tallest bin and
//! the score is 2. Every extra mode adds roughly 2 more.

use serde::Serialize;

/// Modality class derived from an mValue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Modality {
    Unimodal,
    /// mValue above 2.8.
    SeveralModes,
    /// mValue above 3.2.
    Bimodal,
    /// mValue above 4.2.
    Multimodal,
}

impl Modality {
    pub fn from_m_value(m_value: f64) -> Self {
        if m_value > 4.2 {
            Modality::Multimodal
        } else if m_value > 3.2 {
            Modality::Bimodal
        } else if m_value > 2.8 {
            Modality::SeveralModes
        } else {
            Modality::Unimodal
        }
    }
}

/// Scott's rule bin width.
fn scott_bin_width(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = if values.len() > 1 {
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
    } else {
        0.0
    };
    3.5 * variance.sqrt() / n.cbrt()
}

fn histogram_m_value(values: &[f64], min: f64, width: f64) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let bins = ((max - min) / width).floor() as usize + 1;
    // Leading and trailing zero bins frame the histogram.
    let mut counts = vec![0usize; bins + 2];
    for &v in values {
        let index = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[index + 1] += 1;
    }

    let tallest = counts.iter().copied().max().unwrap_or(0);
    if tallest == 0 {
        return 0.0;
    }
    let changes: usize = counts.windows(2).map(|w| w[0].abs_diff(w[1])).sum();
    changes as f64 / tallest as f64
}

/// Highest mValue over a range of bin widths, starting at half of Scott's width
/// and doubling until a single bin covers the sample.
///
/// Returns 0 for an empty sample.
pub fn m_value(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range <= 0.0 {
        return 2.0;
    }

    let mut width = scott_bin_width(values) / 2.0;
    if width <= 1e-9 {
        width = range / values.len() as f64;
    }

    let mut best: f64 = 0.0;
    loop {
        best = best.max(histogram_m_value(values, min, width));
        if width > range {
            break;
        }
        width *= 2.0;
    }
    best
}
