//! BD-Rate: average bitrate difference between two codecs at equal quality.
//!
//! The computation interpolates each codec's log-bitrate as a function of
//! quality over the overlapping quality range and integrates the pointwise
//! difference. Interpolation is shape-preserving piecewise cubic
//! (Fritsch-Carlson PCHIP): rate-quality curves are monotone, and a naive
//! cubic spline can oscillate between knots and corrupt the integral.
//!
//! Insufficient data (fewer than two usable points per codec, or disjoint
//! quality ranges) is a warning and a `None` result, never an error.

use crate::dataset::ResultRecord;

/// Number of evenly spaced quality samples used for integration.
const INTEGRATION_POINTS: usize = 100;

/// Computes the BD-Rate of `test_codec` against `anchor_codec` over the
/// default quality metric (the dataset's quality-score column).
///
/// Returns a percentage: negative means the test codec needs less bitrate
/// than the anchor at equal quality.
pub fn bd_rate(records: &[ResultRecord], anchor_codec: &str, test_codec: &str) -> Option<f64> {
    bd_rate_by(records, anchor_codec, test_codec, |r| r.quality_score)
}

/// Like [`bd_rate`], with an explicit metric selector so other per-row
/// metrics can be compared without changing the dataset schema.
pub fn bd_rate_by<F>(
    records: &[ResultRecord],
    anchor_codec: &str,
    test_codec: &str,
    metric: F,
) -> Option<f64>
where
    F: Fn(&ResultRecord) -> Option<f64>,
{
    let anchor = curve_points(records, anchor_codec, &metric);
    let test = curve_points(records, test_codec, &metric);

    if anchor.len() < 2 || test.len() < 2 {
        log::warn!(
            "Not enough data points to calculate BD-Rate for {anchor_codec} vs {test_codec}."
        );
        return None;
    }

    // Overlapping quality range. Points are sorted by quality, so the ends
    // of each curve bound its range.
    let lo = anchor[0].0.max(test[0].0);
    let hi = anchor[anchor.len() - 1].0.min(test[test.len() - 1].0);
    if lo >= hi {
        log::warn!("No overlapping quality range between {anchor_codec} and {test_codec}.");
        return None;
    }

    let anchor_interp = Pchip::new(&anchor);
    let test_interp = Pchip::new(&test);

    // Trapezoidal integration of the log-bitrate difference over uniformly
    // spaced quality samples.
    let step = (hi - lo) / (INTEGRATION_POINTS - 1) as f64;
    let diff_at = |i: usize| {
        let q = lo + step * i as f64;
        test_interp.eval(q) - anchor_interp.eval(q)
    };
    let mut integral = 0.0;
    let mut prev = diff_at(0);
    for i in 1..INTEGRATION_POINTS {
        let next = diff_at(i);
        integral += (prev + next) / 2.0 * step;
        prev = next;
    }

    let avg_diff = integral / (hi - lo);
    Some((avg_diff.exp() - 1.0) * 100.0)
}

/// Extracts one codec's rate-quality curve: rows with both metrics present,
/// sorted ascending by bitrate, as (quality, ln bitrate) pairs. Points whose
/// quality does not strictly increase along the curve are dropped (keeping
/// the first occurrence) so the interpolation knots are strictly increasing.
fn curve_points<F>(records: &[ResultRecord], codec: &str, metric: &F) -> Vec<(f64, f64)>
where
    F: Fn(&ResultRecord) -> Option<f64>,
{
    let mut rows: Vec<(f64, f64)> = records
        .iter()
        .filter(|r| r.codec == codec)
        .filter_map(|r| Some((metric(r)?, r.bitrate_kbps?)))
        .collect();
    rows.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut points: Vec<(f64, f64)> = Vec::with_capacity(rows.len());
    for (quality, bitrate) in rows {
        if points.last().map_or(true, |(q, _)| quality > *q) {
            points.push((quality, bitrate.ln()));
        } else {
            log::debug!(
                "Dropping non-monotone point for {codec}: quality {quality} at {bitrate} kbps"
            );
        }
    }
    points
}

/// Monotone piecewise cubic Hermite interpolant (Fritsch-Carlson).
///
/// Knot derivatives are chosen so the interpolant preserves the data's
/// monotonicity and never overshoots between knots.
struct Pchip {
    x: Vec<f64>,
    y: Vec<f64>,
    d: Vec<f64>,
}

impl Pchip {
    /// Builds the interpolant. `points` must hold at least two pairs with
    /// strictly increasing x, which `curve_points` guarantees.
    fn new(points: &[(f64, f64)]) -> Self {
        let x: Vec<f64> = points.iter().map(|p| p.0).collect();
        let y: Vec<f64> = points.iter().map(|p| p.1).collect();
        let d = derivatives(&x, &y);
        Pchip { x, y, d }
    }

    fn eval(&self, q: f64) -> f64 {
        let n = self.x.len();
        let seg = match self.x.binary_search_by(|v| v.total_cmp(&q)) {
            Ok(i) => i.min(n - 2),
            Err(0) => 0,
            Err(i) => (i - 1).min(n - 2),
        };

        let h = self.x[seg + 1] - self.x[seg];
        let t = (q - self.x[seg]) / h;
        let t2 = t * t;
        let t3 = t2 * t;
        // Cubic Hermite basis.
        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;
        h00 * self.y[seg]
            + h10 * h * self.d[seg]
            + h01 * self.y[seg + 1]
            + h11 * h * self.d[seg + 1]
    }
}

/// Fritsch-Carlson knot derivatives: a weighted harmonic mean of adjacent
/// secant slopes at interior knots (zero at local extrema), and a clamped
/// three-point estimate at the ends.
fn derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = (0..n - 1).map(|i| x[i + 1] - x[i]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

    if n == 2 {
        return vec![delta[0], delta[0]];
    }

    let mut d = vec![0.0; n];
    for i in 1..n - 1 {
        if delta[i - 1] * delta[i] <= 0.0 {
            d[i] = 0.0;
        } else {
            let w1 = 2.0 * h[i] + h[i - 1];
            let w2 = h[i] + 2.0 * h[i - 1];
            d[i] = (w1 + w2) / (w1 / delta[i - 1] + w2 / delta[i]);
        }
    }
    d[0] = edge_derivative(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = edge_derivative(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

fn edge_derivative(h0: f64, h1: f64, delta0: f64, delta1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * delta0 - h0 * delta1) / (h0 + h1);
    if d * delta0 <= 0.0 {
        0.0
    } else if delta0 * delta1 <= 0.0 && d.abs() > 3.0 * delta0.abs() {
        3.0 * delta0
    } else {
        d
    }
}
