//! Log-frequency resampling and scrolling spectrogram history.
//!
//! Bridges the linear FFT bin axis to the logarithmic frequency axis used by
//! the display, converts amplitudes to a bounded dBFS scale, and keeps a
//! scrolling history of quantized intensity rows ready for texture upload.

use std::collections::VecDeque;

/// Generate `count` log-spaced frequencies between `low_freq` and
/// `high_freq` inclusive.
///
/// The spacing is uniform in `log10(freq)`, so the points line up with
/// logarithmic frequency labels. Values are strictly increasing and the
/// endpoints match the bounds up to floating-point rounding.
pub fn generate_log_axis(low_freq: f32, high_freq: f32, count: usize) -> Vec<f32> {
    debug_assert!(low_freq > 0.0 && high_freq > low_freq);
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![low_freq];
    }

    let low_exponent = low_freq.log10();
    let span = high_freq.log10() - low_exponent;
    (0..count)
        .map(|i| {
            let exponent = low_exponent + span * i as f32 / (count - 1) as f32;
            10f32.powf(exponent)
        })
        .collect()
}

/// Horizontal position of `frequency` on a log axis bounded by
/// `low_freq`/`high_freq`, as a proportion in `[0, 1]`.
pub fn frequency_to_x_proportion(frequency: f32, low_freq: f32, high_freq: f32) -> f32 {
    let min_offset = low_freq.log10();
    let offset_range = high_freq.log10() - min_offset;
    (frequency.log10() - min_offset) / offset_range
}

/// Vertical position of a dBFS value on the RTA amplitude axis, as a
/// proportion in `[0, 1]` measured from the top (0 dBFS) down to the floor.
pub fn dbfs_to_y_proportion(dbfs: f32, floor_db: f32) -> f32 {
    dbfs.abs() / -floor_db
}

/// Convert a linear amplitude to dBFS, bounded to `[floor_db, 0]`.
///
/// Zero, negative, and non-finite amplitudes map to the floor rather than
/// to negative infinity or NaN.
pub fn amplitude_to_dbfs(amplitude: f32, floor_db: f32) -> f32 {
    if !amplitude.is_finite() || amplitude <= 0.0 {
        return floor_db;
    }
    (20.0 * amplitude.log10()).clamp(floor_db, 0.0)
}

/// Quantize a dBFS value into a display intensity byte.
///
/// Maps `[floor_db, 0]` linearly onto `[0, 255]`; inputs outside that range
/// clamp to the ends.
pub fn quantize_dbfs(db: f32, floor_db: f32) -> u8 {
    let pixel = ((db - floor_db) * 255.0 / -floor_db).round();
    pixel.clamp(0.0, 255.0) as u8
}

/// Catmull-Rom cubic interpolator over a monotonically increasing axis.
///
/// Fitted once per tick over the linear (frequency, amplitude) pairs and
/// then evaluated at every log-axis query point. Queries outside the fitted
/// range clamp to the endpoint values instead of extrapolating.
pub struct CubicInterpolator {
    xs: Vec<f32>,
    ys: Vec<f32>,
    tangents: Vec<f32>,
}

impl CubicInterpolator {
    /// Fit the interpolant to `(xs, ys)` pairs. `xs` must be strictly
    /// increasing; both slices must have the same length.
    pub fn fit(xs: &[f32], ys: &[f32]) -> Self {
        assert_eq!(xs.len(), ys.len(), "axis and value lengths differ");

        let n = xs.len();
        let mut tangents = vec![0.0; n];
        if n >= 2 {
            tangents[0] = (ys[1] - ys[0]) / (xs[1] - xs[0]);
            tangents[n - 1] = (ys[n - 1] - ys[n - 2]) / (xs[n - 1] - xs[n - 2]);
            for i in 1..n - 1 {
                tangents[i] = (ys[i + 1] - ys[i - 1]) / (xs[i + 1] - xs[i - 1]);
            }
        }

        Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            tangents,
        }
    }

    /// Evaluate the interpolant at `x`.
    pub fn evaluate(&self, x: f32) -> f32 {
        match self.xs.len() {
            0 => return 0.0,
            1 => return self.ys[0],
            _ => {}
        }

        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[self.xs.len() - 1] {
            return self.ys[self.ys.len() - 1];
        }

        let segment = self.xs.partition_point(|&knot| knot <= x) - 1;
        let segment = segment.min(self.xs.len() - 2);

        let h = self.xs[segment + 1] - self.xs[segment];
        let t = (x - self.xs[segment]) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        // Cubic Hermite basis with Catmull-Rom tangents.
        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * self.ys[segment]
            + h10 * h * self.tangents[segment]
            + h01 * self.ys[segment + 1]
            + h11 * h * self.tangents[segment + 1]
    }

    /// Evaluate the interpolant at every query point.
    pub fn resample(&self, queries: &[f32]) -> Vec<f32> {
        queries.iter().map(|&q| self.evaluate(q)).collect()
    }
}

/// Scrolling 2D history of quantized spectrogram rows.
///
/// Rows are time (newest first), columns are log-frequency bins. The history
/// is always fully allocated at `rows x columns` cells; rows start zeroed
/// and scroll out FIFO as new rows are pushed.
pub struct SpectrogramHistory {
    rows: VecDeque<Vec<u8>>,
    columns: usize,
    max_rows: usize,
}

impl SpectrogramHistory {
    /// Allocate a zero-filled history of `max_rows` rows by `columns` cells.
    pub fn new(columns: usize, max_rows: usize) -> Self {
        Self {
            rows: (0..max_rows).map(|_| vec![0; columns]).collect(),
            columns,
            max_rows,
        }
    }

    /// Prepend one row, evicting the oldest row to keep the total cell
    /// count at `rows x columns`.
    pub fn push_row(&mut self, row: Vec<u8>) {
        assert_eq!(row.len(), self.columns, "row width does not match history");
        self.rows.push_front(row);
        self.rows.truncate(self.max_rows);
    }

    /// Reallocate for new dimensions. Any change of either dimension clears
    /// the history; that data loss is expected, not an error.
    pub fn reconfigure(&mut self, columns: usize, max_rows: usize) {
        if columns == self.columns && max_rows == self.max_rows {
            return;
        }
        *self = Self::new(columns, max_rows);
    }

    /// Row width in cells.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// History depth in rows.
    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Row-major copy of the whole history (newest row first) for texture
    /// upload. Always `rows x columns` bytes.
    pub fn texture_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.columns * self.max_rows);
        for row in &self.rows {
            data.extend_from_slice(row);
        }
        data
    }

    /// Borrow the most recent row.
    pub fn latest_row(&self) -> Option<&[u8]> {
        self.rows.front().map(|row| row.as_slice())
    }
}
