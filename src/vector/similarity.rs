//! Vector Similarity Functions
//!
//! Dot products, norms and the composite query vector used for ranking.

/// Compute dot product of two vectors
///
/// Unrolled by four; the store calls this once per vocabulary word per query.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let len = a.len().min(b.len());
    let chunks = len / 4;
    let mut sum = 0.0f32;

    for i in 0..chunks {
        let idx = i * 4;
        sum += a[idx] * b[idx]
            + a[idx + 1] * b[idx + 1]
            + a[idx + 2] * b[idx + 2]
            + a[idx + 3] * b[idx + 3];
    }

    for i in (chunks * 4)..len {
        sum += a[i] * b[i];
    }

    sum
}

/// Euclidean norm of a vector
#[inline]
fn magnitude(v: &[f32]) -> f32 {
    dot_product(v, v).sqrt()
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn normalize_vector(v: &mut [f32]) {
    let mag = magnitude(v);
    if mag > 0.0 {
        for x in v.iter_mut() {
            *x /= mag;
        }
    }
}

/// Unit-length mean of a set of vectors of equal dimension.
///
/// Returns `None` when `vectors` is empty.
pub fn unit_mean<'a, I>(vectors: I, dimension: usize) -> Option<Vec<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut mean = vec![0.0f32; dimension];
    let mut count = 0usize;

    for v in vectors {
        debug_assert_eq!(v.len(), dimension, "Vector dimensions must match");
        for (acc, x) in mean.iter_mut().zip(v) {
            *acc += x;
        }
        count += 1;
    }

    if count == 0 {
        return None;
    }

    let n = count as f32;
    for x in mean.iter_mut() {
        *x /= n;
    }
    normalize_vector(&mut mean);
    Some(mean)
}
