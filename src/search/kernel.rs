//! Cosine distance kernel built on the extended-matrix reformulation.
//!
//! Rather than computing each query/candidate distance independently, both
//! sides are lifted into an "extended" form whose plain dot product equals
//! the squared Euclidean distance between the original rows:
//!
//! ```text
//! [ 1 .. 1 | a | a∘a ] · [ b∘b | -2b | 1 .. 1 ] = Σ b² - 2 Σ ab + Σ a²
//!                                               = ‖a - b‖²
//! ```
//!
//! With every row normalized to unit length beforehand, halving that value
//! gives the cosine distance `1 - cos θ`, so the whole query × candidate
//! grid collapses into one dense matrix product over the extended rows.
//! Candidates are extended once per search and reused for every query row.

use rayon::prelude::*;

use crate::util::simd;

/// Below this many candidate rows a distance row is computed serially.
const PARALLEL_THRESHOLD: usize = 100;

/// A row-major matrix of extended rows, each `3 * dim` wide.
#[derive(Debug, Clone)]
pub struct ExtendedMatrix {
    data: Vec<f32>,
    rows: usize,
    dim: usize,
}

impl ExtendedMatrix {
    /// Number of original rows in this matrix.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Dimensionality of the original (unextended) rows.
    pub fn dim(&self) -> usize {
        self.dim
    }

    fn row(&self, index: usize) -> &[f32] {
        let width = self.dim * 3;
        &self.data[index * width..(index + 1) * width]
    }
}

/// Normalize each row of a flattened row-major matrix and lift it into the
/// query-side extended form `[1 | a | a∘a]`.
pub fn extend_queries(matrix: &[f32], dim: usize) -> ExtendedMatrix {
    debug_assert!(dim > 0);
    debug_assert_eq!(matrix.len() % dim, 0);

    let rows = matrix.len() / dim;
    let mut data = Vec::with_capacity(rows * dim * 3);

    for row in matrix.chunks_exact(dim) {
        let inv = inverse_norm(row);
        data.resize(data.len() + dim, 1.0);
        data.extend(row.iter().map(|x| x * inv));
        data.extend(row.iter().map(|x| {
            let v = x * inv;
            v * v
        }));
    }

    ExtendedMatrix { data, rows, dim }
}

/// Normalize each row of a flattened row-major matrix and lift it into the
/// candidate-side extended form `[b∘b | -2b | 1]`.
pub fn extend_candidates(matrix: &[f32], dim: usize) -> ExtendedMatrix {
    debug_assert!(dim > 0);
    debug_assert_eq!(matrix.len() % dim, 0);

    let rows = matrix.len() / dim;
    let mut data = Vec::with_capacity(rows * dim * 3);

    for row in matrix.chunks_exact(dim) {
        let inv = inverse_norm(row);
        data.extend(row.iter().map(|x| {
            let v = x * inv;
            v * v
        }));
        data.extend(row.iter().map(|x| -2.0 * x * inv));
        data.resize(data.len() + dim, 1.0);
    }

    ExtendedMatrix { data, rows, dim }
}

/// Compute the full query × candidate cosine-distance grid.
///
/// Row `i` of the result holds the distance from query `i` to every
/// candidate, in candidate order. Values are clipped at zero before
/// halving, so they fall in `[0, 2]` with 0 meaning identical direction.
pub fn distance_grid(queries: &ExtendedMatrix, candidates: &ExtendedMatrix) -> Vec<Vec<f32>> {
    debug_assert_eq!(queries.dim, candidates.dim);

    (0..queries.rows)
        .map(|i| distance_row(queries.row(i), candidates))
        .collect()
}

fn distance_row(query_ext: &[f32], candidates: &ExtendedMatrix) -> Vec<f32> {
    if candidates.rows < PARALLEL_THRESHOLD {
        (0..candidates.rows)
            .map(|j| pair_distance(query_ext, candidates.row(j)))
            .collect()
    } else {
        (0..candidates.rows)
            .into_par_iter()
            .map(|j| pair_distance(query_ext, candidates.row(j)))
            .collect()
    }
}

fn pair_distance(query_ext: &[f32], candidate_ext: &[f32]) -> f32 {
    let squared = simd::dot_product_simd(query_ext, candidate_ext);
    squared.max(0.0) / 2.0
}

/// Reciprocal of a row's L2 norm, 0 for an all-zero row.
fn inverse_norm(row: &[f32]) -> f32 {
    let squared = simd::squared_norm_simd(row);
    if squared > 0.0 { 1.0 / squared.sqrt() } else { 0.0 }
}
