use thiserror::Error;

/// A single (x, y) point of a series. `x` is usually Unix time in milliseconds.
pub type Sample = (f64, f64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DownsampleError {
    #[error("threshold {threshold} cannot hold both endpoints of a {len}-point series")]
    ThresholdTooSmall { threshold: usize, len: usize },
}

/// Largest Triangle Three Buckets (LTTB) downsampling algorithm.
///
/// Reduces a slice of (x, y) points, sorted ascending by x, to `threshold`
/// points while preserving the visual shape of the data. The first and last
/// points are always kept; every interior bucket contributes the point that
/// forms the largest triangle with the previously selected point and the
/// centroid of the following bucket.
///
/// Returns the original data unchanged if `threshold >= data.len()` or
/// `threshold == 0`. A threshold of 1 cannot hold both endpoints of a longer
/// series and is rejected.
///
/// Unsorted input is not an error, but the buckets it produces are meaningless.
pub fn downsample(data: &[Sample], threshold: usize) -> Result<Vec<Sample>, DownsampleError> {
    let n = data.len();
    if threshold >= n || threshold == 0 {
        return Ok(data.to_vec());
    }
    if threshold == 1 {
        return Err(DownsampleError::ThresholdTooSmall { threshold, len: n });
    }

    let mut sampled = Vec::with_capacity(threshold);
    sampled.push(data[0]);

    let interior = threshold - 2;
    let bucket_size = (n - 2) as f64 / interior as f64;
    let mut a = data[0];

    for i in 0..interior {
        let (start, end) = bucket_bounds(i, bucket_size, n);
        // Last interior bucket looks ahead at the final point.
        let next_end = bucket_edge(i + 2, bucket_size).min(n);
        let c = centroid(&data[end.min(next_end)..next_end], a);

        let mut max_area = -1.0f64;
        let mut max_idx = start;

        for (j, &b) in data.iter().enumerate().take(end).skip(start) {
            let area = triangle_area(a, b, c);
            if area > max_area {
                max_area = area;
                max_idx = j;
            }
        }

        a = data[max_idx];
        sampled.push(a);
    }

    sampled.push(data[n - 1]);
    Ok(sampled)
}

/// Start of interior bucket `i`: `floor(i * bucket_size) + 1`, offset by one to
/// skip the fixed first point. Float rounding can leave the last edge one short
/// of `n - 1`, in which case the point before the last falls in no bucket.
fn bucket_edge(i: usize, bucket_size: f64) -> usize {
    (i as f64 * bucket_size).floor() as usize + 1
}

/// Half-open index range of interior bucket `i`, never empty and never
/// reaching into the fixed last point.
fn bucket_bounds(i: usize, bucket_size: f64, n: usize) -> (usize, usize) {
    let start = bucket_edge(i, bucket_size).min(n - 2);
    let end = bucket_edge(i + 1, bucket_size).clamp(start + 1, n - 1);
    (start, end)
}

/// Mean x and mean y of `bucket`, or `fallback` when the bucket is empty.
fn centroid(bucket: &[Sample], fallback: Sample) -> Sample {
    if bucket.is_empty() {
        return fallback;
    }
    let len = bucket.len() as f64;
    let (sx, sy) = bucket
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
    (sx / len, sy / len)
}

fn triangle_area(a: Sample, b: Sample, c: Sample) -> f64 {
    0.5 * ((a.0 - c.0) * (b.1 - a.1) - (a.0 - b.0) * (c.1 - a.1)).abs()
}
