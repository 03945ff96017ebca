//! Projection stage: reduce embeddings to 3D and rescale to `[-1, 1]`.
//!
//! The reduction itself sits behind the [`Projector`] trait. The built-in
//! [`PcaProjector`] is deterministic and dependency-free; any other
//! reducer only has to keep row `i` of its output aligned with row `i` of
//! its input.

use crate::error::{PipelineError, PipelineResult};
use crate::export::EmbeddingMatrix;

/// A 3D point per track, in track-list order.
pub type Coords = Vec<[f64; 3]>;

/// Reduces an N×D matrix to N×3, preserving row order.
pub trait Projector: std::fmt::Debug {
    fn name(&self) -> &str;

    fn project(&self, embeddings: &EmbeddingMatrix) -> PipelineResult<Coords>;
}

/// Principal component analysis by power iteration with deflation.
#[derive(Debug, Clone, Copy)]
pub struct PcaProjector {
    iterations: usize,
    seed: u64,
}

impl Default for PcaProjector {
    fn default() -> Self {
        Self {
            iterations: 100,
            seed: 42,
        }
    }
}

impl PcaProjector {
    #[must_use]
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Top principal directions, at most three. A direction along which
    /// the data has no variance is returned as a zero vector.
    fn components(&self, embeddings: &EmbeddingMatrix, mean: &[f64]) -> Vec<Vec<f64>> {
        let dims = embeddings.dimensions();
        // Directions explaining less than this share of the total variance
        // are rounding noise.
        let tolerance = sum_of_squares(embeddings, mean) * 1e-9;
        let mut components: Vec<Vec<f64>> = Vec::with_capacity(3);

        for k in 0..3.min(dims) {
            let mut v = seed_vector(dims, self.seed.wrapping_add(k as u64));
            orthogonalize(&mut v, &components);
            let mut usable = normalize(&mut v) > 0.0;

            for _ in 0..self.iterations {
                if !usable {
                    break;
                }
                let mut next = covariance_apply(embeddings, mean, &v);
                orthogonalize(&mut next, &components);
                usable = normalize(&mut next) > tolerance;
                v = next;
            }

            if !usable {
                v = vec![0.0; dims];
            }
            components.push(v);
        }

        components
    }
}

impl Projector for PcaProjector {
    fn name(&self) -> &str {
        "pca"
    }

    fn project(&self, embeddings: &EmbeddingMatrix) -> PipelineResult<Coords> {
        if embeddings.rows() == 0 {
            return Ok(Vec::new());
        }

        let mean = column_means(embeddings);
        let components = self.components(embeddings, &mean);

        let coords = embeddings
            .iter_rows()
            .map(|row| {
                let mut point = [0.0; 3];
                for (axis, component) in components.iter().enumerate() {
                    point[axis] = centered_dot(row, &mean, component);
                }
                point
            })
            .collect();
        Ok(coords)
    }
}

/// Run `projector` and rescale its output.
///
/// # Errors
/// Fails if the projector fails or returns a different number of rows than
/// the matrix has.
pub fn project_normalized(
    projector: &dyn Projector,
    embeddings: &EmbeddingMatrix,
) -> PipelineResult<Coords> {
    log::info!(
        "Projecting {} embeddings to 3D with {}",
        embeddings.rows(),
        projector.name()
    );
    let mut coords = projector.project(embeddings)?;
    if coords.len() != embeddings.rows() {
        return Err(PipelineError::Projection {
            expected: embeddings.rows(),
            found: coords.len(),
        });
    }
    normalize_coords(&mut coords);
    Ok(coords)
}

/// Rescale each axis independently to `[-1, 1]`.
///
/// An axis whose values are all equal (or that has no finite values) maps
/// to 0, as does any non-finite coordinate.
pub fn normalize_coords(coords: &mut [[f64; 3]]) {
    for axis in 0..3 {
        let (min, max) = coords
            .iter()
            .map(|p| p[axis])
            .filter(|x| x.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                (lo.min(x), hi.max(x))
            });
        let range = max - min;
        let degenerate = !(range.is_finite() && range > 0.0);

        for point in coords.iter_mut() {
            let x = point[axis];
            point[axis] = if degenerate || !x.is_finite() {
                0.0
            } else {
                2.0 * (x - min) / range - 1.0
            };
        }
    }
}

fn column_means(embeddings: &EmbeddingMatrix) -> Vec<f64> {
    let mut mean = vec![0.0; embeddings.dimensions()];
    for row in embeddings.iter_rows() {
        for (m, &x) in mean.iter_mut().zip(row) {
            *m += f64::from(x);
        }
    }
    let n = embeddings.rows() as f64;
    for m in &mut mean {
        *m /= n;
    }
    mean
}

/// Total squared distance of the rows from their mean.
fn sum_of_squares(embeddings: &EmbeddingMatrix, mean: &[f64]) -> f64 {
    embeddings
        .iter_rows()
        .map(|row| {
            row.iter()
                .zip(mean)
                .map(|(&x, m)| (f64::from(x) - m).powi(2))
                .sum::<f64>()
        })
        .sum()
}

fn centered_dot(row: &[f32], mean: &[f64], v: &[f64]) -> f64 {
    row.iter()
        .zip(mean)
        .zip(v)
        .map(|((&x, m), w)| (f64::from(x) - m) * w)
        .sum()
}

/// `Cᵀ C v` for the centered matrix `C`, without materializing `C`.
fn covariance_apply(embeddings: &EmbeddingMatrix, mean: &[f64], v: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; v.len()];
    for row in embeddings.iter_rows() {
        let s = centered_dot(row, mean, v);
        for ((o, &x), m) in out.iter_mut().zip(row).zip(mean) {
            *o += s * (f64::from(x) - m);
        }
    }
    out
}

fn orthogonalize(v: &mut [f64], basis: &[Vec<f64>]) {
    for b in basis {
        let d: f64 = v.iter().zip(b).map(|(x, y)| x * y).sum();
        for (x, y) in v.iter_mut().zip(b) {
            *x -= d * y;
        }
    }
}

/// Scale `v` to unit length and return its previous norm, or 0 if it
/// cannot be scaled.
fn normalize(v: &mut [f64]) -> f64 {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if !(norm.is_finite() && norm > 0.0) {
        return 0.0;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    norm
}

/// Deterministic start vector with components in `[-1, 1)` (splitmix64).
#[allow(clippy::cast_precision_loss)]
fn seed_vector(dims: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..dims)
        .map(|_| {
            state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut z = state;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            z ^= z >> 31;
            (z >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
        })
        .collect()
}
