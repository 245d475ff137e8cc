//! SIMD kernels for dense f32 vectors using the `wide` crate.

use wide::f32x8;

/// SIMD-accelerated dot product of two equal-length slices.
pub fn dot_product_simd(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    if a.len() < 8 {
        return dot_product_scalar(a, b);
    }

    let mut acc = f32x8::splat(0.0);

    let chunks_a = a.chunks_exact(8);
    let chunks_b = b.chunks_exact(8);
    let remainder_a = chunks_a.remainder();
    let remainder_b = chunks_b.remainder();

    for (chunk_a, chunk_b) in chunks_a.zip(chunks_b) {
        let vec_a = f32x8::new(*<&[f32; 8]>::try_from(chunk_a).unwrap());
        let vec_b = f32x8::new(*<&[f32; 8]>::try_from(chunk_b).unwrap());
        acc = vec_a.mul_add(vec_b, acc);
    }

    let mut total = acc.to_array().iter().sum::<f32>();
    total += remainder_a
        .iter()
        .zip(remainder_b.iter())
        .map(|(x, y)| x * y)
        .sum::<f32>();

    total
}

/// SIMD-accelerated sum of squares of a slice.
pub fn squared_norm_simd(values: &[f32]) -> f32 {
    if values.len() < 8 {
        return squared_norm_scalar(values);
    }

    let mut acc = f32x8::splat(0.0);

    let chunks = values.chunks_exact(8);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let vec = f32x8::new(*<&[f32; 8]>::try_from(chunk).unwrap());
        acc = vec.mul_add(vec, acc);
    }

    let mut total = acc.to_array().iter().sum::<f32>();
    total += remainder.iter().map(|x| x * x).sum::<f32>();

    total
}

fn dot_product_scalar(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn squared_norm_scalar(values: &[f32]) -> f32 {
    values.iter().map(|x| x * x).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_product_matches_scalar() {
        let a: Vec<f32> = (0..37).map(|i| (i as f32) * 0.25 - 4.0).collect();
        let b: Vec<f32> = (0..37).map(|i| 1.5 - (i as f32) * 0.1).collect();

        let result = dot_product_simd(&a, &b);
        let expected = dot_product_scalar(&a, &b);

        assert!((result - expected).abs() < 1e-4);
    }

    #[test]
    fn test_dot_product_short_input() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![4.0, 5.0, 6.0];

        let result = dot_product_simd(&a, &b);
        assert!((result - 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_squared_norm_matches_scalar() {
        let values: Vec<f32> = (0..23).map(|i| (i as f32).sin()).collect();

        let result = squared_norm_simd(&values);
        let expected = squared_norm_scalar(&values);

        assert!((result - expected).abs() < 1e-5);
    }

    #[test]
    fn test_squared_norm_empty() {
        assert_eq!(squared_norm_simd(&[]), 0.0);
    }
}
