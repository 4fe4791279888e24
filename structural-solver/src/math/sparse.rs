//! Sparse matrix utilities for assembly and direct solves
//!
//! Global matrices are assembled as COO triplets and compressed to CSR.
//! The skyline Cholesky below works on the lower profile of a symmetric
//! matrix and benefits from a Reverse Cuthill-McKee renumbering.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Entries at or below this magnitude are not stored
const DROP_TOLERANCE: f64 = 1e-15;

/// Sparse matrix builder using COO format
pub struct SparseMatrixBuilder {
    size: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl SparseMatrixBuilder {
    pub fn new(size: usize) -> Self {
        // 6 DOFs per node with roughly ten neighbouring nodes
        Self {
            size,
            entries: Vec::with_capacity(size * 60),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Add a value to the matrix (accumulates if already exists)
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if value.abs() > DROP_TOLERANCE {
            self.entries.push((row, col, value));
        }
    }

    /// Scatter an element matrix into the rows/columns given by `dofs`
    pub fn add_element(&mut self, dofs: &[usize], k_elem: &DMatrix<f64>) {
        for (i, &di) in dofs.iter().enumerate() {
            for (j, &dj) in dofs.iter().enumerate() {
                self.add(di, dj, k_elem[(i, j)]);
            }
        }
    }

    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.size, self.size);
        for &(row, col, val) in &self.entries {
            coo.push(row, col, val);
        }
        CsrMatrix::from(&coo)
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut mat = DMatrix::zeros(self.size, self.size);
        for &(row, col, val) in &self.entries {
            mat[(row, col)] += val;
        }
        mat
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }
}

/// Sparse matrix-vector multiplication y = A x
pub fn csr_matvec(csr: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    let n = csr.nrows();
    let mut y = DVector::zeros(n);

    let row_offsets = csr.row_offsets();
    let col_indices = csr.col_indices();
    let values = csr.values();

    for row in 0..n {
        let mut sum = 0.0;
        for idx in row_offsets[row]..row_offsets[row + 1] {
            sum += values[idx] * x[col_indices[idx]];
        }
        y[row] = sum;
    }
    y
}

/// Main diagonal of a square CSR matrix
pub fn csr_diagonal(csr: &CsrMatrix<f64>) -> DVector<f64> {
    let mut diag = DVector::zeros(csr.nrows());
    for (row, col, &val) in csr.triplet_iter() {
        if row == col {
            diag[row] += val;
        }
    }
    diag
}

/// Dense copy of a CSR matrix
pub fn csr_to_dense(csr: &CsrMatrix<f64>) -> DMatrix<f64> {
    let mut mat = DMatrix::zeros(csr.nrows(), csr.ncols());
    for (row, col, &val) in csr.triplet_iter() {
        mat[(row, col)] += val;
    }
    mat
}

/// Extract the rows and columns selected by `map` into a new matrix.
///
/// `map[i]` is the new index of old row/column `i`, or `None` to drop it.
pub fn csr_submatrix(csr: &CsrMatrix<f64>, map: &[Option<usize>], new_size: usize) -> CsrMatrix<f64> {
    let mut coo = CooMatrix::new(new_size, new_size);
    for (row, col, &val) in csr.triplet_iter() {
        if let (Some(r), Some(c)) = (map[row], map[col]) {
            coo.push(r, c, val);
        }
    }
    CsrMatrix::from(&coo)
}

/// Symmetric renumbering: entry (i, j) of the result is entry (perm[i], perm[j])
pub fn permute_symmetric(csr: &CsrMatrix<f64>, perm: &[usize]) -> CsrMatrix<f64> {
    let inv = inverse_permutation(perm);
    let n = csr.nrows();
    let mut coo = CooMatrix::new(n, n);
    for (row, col, &val) in csr.triplet_iter() {
        coo.push(inv[row], inv[col], val);
    }
    CsrMatrix::from(&coo)
}

/// Why a Cholesky factorization stopped
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PivotFailure {
    /// Pivot vanished relative to the original diagonal at this index
    Zero(usize),
    /// Pivot became clearly negative at this index (indefinite matrix)
    Negative(usize),
}

impl PivotFailure {
    pub fn index(&self) -> usize {
        match self {
            Self::Zero(i) | Self::Negative(i) => *i,
        }
    }
}

/// Classify a Cholesky pivot against the original diagonal entry
pub fn check_pivot(pivot: f64, original: f64, threshold: f64, index: usize) -> Result<f64, PivotFailure> {
    let scale = original.abs().max(f64::MIN_POSITIVE);
    if pivot.abs() <= threshold * scale {
        Err(PivotFailure::Zero(index))
    } else if pivot < 0.0 {
        Err(PivotFailure::Negative(index))
    } else {
        Ok(pivot)
    }
}

/// Skyline Cholesky factorization L Lᵀ of a symmetric positive definite matrix
///
/// Row `i` stores the lower profile from its first non-zero up to the diagonal.
#[derive(Debug, Clone)]
pub struct SkylineCholesky {
    size: usize,
    rows: Vec<Vec<f64>>,
    heights: Vec<usize>,
}

impl SkylineCholesky {
    /// Factorize `csr`, flagging pivots that fall below `threshold` times the
    /// original diagonal entry
    pub fn factorize(csr: &CsrMatrix<f64>, threshold: f64) -> Result<Self, PivotFailure> {
        let size = csr.nrows();

        let mut heights = vec![0usize; size];
        for (row, col, _) in csr.triplet_iter() {
            if col < row {
                heights[row] = heights[row].max(row - col);
            }
        }

        let mut rows: Vec<Vec<f64>> = heights.iter().map(|&h| vec![0.0; h + 1]).collect();
        for (row, col, &val) in csr.triplet_iter() {
            if col <= row {
                rows[row][col + heights[row] - row] += val;
            }
        }

        let mut sky = Self { size, rows, heights };

        for i in 0..size {
            let hi = sky.heights[i];
            let start_i = i - hi;
            let original = sky.rows[i][hi];

            for j in start_i..i {
                let start_j = j - sky.heights[j];
                let mut sum = 0.0;
                for k in start_i.max(start_j)..j {
                    sum += sky.get(i, k) * sky.get(j, k);
                }
                let idx = j - start_i;
                sky.rows[i][idx] = (sky.rows[i][idx] - sum) / sky.get(j, j);
            }

            let sum: f64 = sky.rows[i][..hi].iter().map(|v| v * v).sum();
            let pivot = check_pivot(sky.rows[i][hi] - sum, original, threshold, i)?;
            sky.rows[i][hi] = pivot.sqrt();
        }

        Ok(sky)
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> f64 {
        let start = row - self.heights[row];
        if col < start {
            0.0
        } else {
            self.rows[row][col - start]
        }
    }

    /// Total number of stored profile entries
    pub fn profile(&self) -> usize {
        self.heights.iter().map(|h| h + 1).sum()
    }

    /// Solve L Lᵀ x = b
    pub fn solve(&self, b: &DVector<f64>) -> DVector<f64> {
        let mut x = b.clone();

        for i in 0..self.size {
            let start = i - self.heights[i];
            let mut sum = 0.0;
            for j in start..i {
                sum += self.get(i, j) * x[j];
            }
            x[i] = (x[i] - sum) / self.get(i, i);
        }

        for i in (0..self.size).rev() {
            x[i] /= self.get(i, i);
            let start = i - self.heights[i];
            for j in start..i {
                x[j] -= self.get(i, j) * x[i];
            }
        }

        x
    }
}

/// Bandwidth reduction using Reverse Cuthill-McKee
///
/// Returns `perm` with `perm[new] = old`.
pub fn reverse_cuthill_mckee(csr: &CsrMatrix<f64>) -> Vec<usize> {
    let n = csr.nrows();
    if n == 0 {
        return vec![];
    }

    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (row, col, &val) in csr.triplet_iter() {
        if val.abs() > DROP_TOLERANCE && row != col {
            adj[row].push(col);
        }
    }
    for neighbors in &mut adj {
        neighbors.sort_unstable();
        neighbors.dedup();
    }
    let degrees: Vec<usize> = adj.iter().map(|v| v.len()).collect();
    for neighbors in &mut adj {
        neighbors.sort_by_key(|&i| (degrees[i], i));
    }

    let mut visited = vec![false; n];
    let mut result = Vec::with_capacity(n);
    let mut queue = std::collections::VecDeque::new();

    while result.len() < n {
        // Each component starts from its lowest-degree unvisited vertex
        let start = (0..n)
            .filter(|&i| !visited[i])
            .min_by_key(|&i| (degrees[i], i))
            .unwrap_or(0);
        queue.push_back(start);
        visited[start] = true;

        while let Some(node) = queue.pop_front() {
            result.push(node);
            for &neighbor in &adj[node] {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }
        }
    }

    result.reverse();
    result
}

/// Reorder a vector so that `out[new] = v[perm[new]]`
pub fn apply_permutation(v: &DVector<f64>, perm: &[usize]) -> DVector<f64> {
    DVector::from_iterator(perm.len(), perm.iter().map(|&i| v[i]))
}

/// Undo `apply_permutation`
pub fn unapply_permutation(v: &DVector<f64>, perm: &[usize]) -> DVector<f64> {
    let mut out = DVector::zeros(perm.len());
    for (new_idx, &old_idx) in perm.iter().enumerate() {
        out[old_idx] = v[new_idx];
    }
    out
}

pub fn inverse_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; perm.len()];
    for (new_idx, &old_idx) in perm.iter().enumerate() {
        inv[old_idx] = new_idx;
    }
    inv
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tridiagonal(n: usize) -> CsrMatrix<f64> {
        let mut builder = SparseMatrixBuilder::new(n);
        for i in 0..n {
            builder.add(i, i, 4.0);
            if i + 1 < n {
                builder.add(i, i + 1, -1.0);
                builder.add(i + 1, i, -1.0);
            }
        }
        builder.to_csr()
    }

    #[test]
    fn test_builder_accumulates_duplicates() {
        let mut builder = SparseMatrixBuilder::new(2);
        builder.add(0, 0, 4.0);
        builder.add(0, 0, 1.5);
        builder.add(1, 1, 0.0);
        assert_eq!(builder.nnz(), 2);

        let dense = csr_to_dense(&builder.to_csr());
        assert_relative_eq!(dense[(0, 0)], 5.5);
        assert_relative_eq!(dense[(1, 1)], 0.0);
    }

    #[test]
    fn test_skyline_solve() {
        let csr = tridiagonal(6);
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let chol = SkylineCholesky::factorize(&csr, 1e-9).unwrap();
        let x = chol.solve(&b);
        let residual = (csr_matvec(&csr, &x) - &b).norm();
        assert!(residual < 1e-10, "residual {}", residual);
    }

    #[test]
    fn test_skyline_reports_singular_index() {
        let mut builder = SparseMatrixBuilder::new(3);
        builder.add(0, 0, 1.0);
        builder.add(0, 1, 1.0);
        builder.add(1, 0, 1.0);
        builder.add(1, 1, 1.0);
        builder.add(2, 2, 2.0);
        let err = SkylineCholesky::factorize(&builder.to_csr(), 1e-9).unwrap_err();
        assert_eq!(err, PivotFailure::Zero(1));
    }

    #[test]
    fn test_skyline_detects_indefinite() {
        let mut builder = SparseMatrixBuilder::new(2);
        builder.add(0, 0, 1.0);
        builder.add(0, 1, 2.0);
        builder.add(1, 0, 2.0);
        builder.add(1, 1, 1.0);
        let err = SkylineCholesky::factorize(&builder.to_csr(), 1e-9).unwrap_err();
        assert_eq!(err, PivotFailure::Negative(1));
    }

    #[test]
    fn test_rcm_is_a_permutation_and_preserves_solution() {
        // Arrow matrix: first row/column dense
        let n = 8;
        let mut builder = SparseMatrixBuilder::new(n);
        for i in 0..n {
            builder.add(i, i, 10.0);
            if i > 0 {
                builder.add(0, i, 1.0);
                builder.add(i, 0, 1.0);
            }
        }
        let csr = builder.to_csr();
        let perm = reverse_cuthill_mckee(&csr);
        let mut sorted = perm.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..n).collect::<Vec<_>>());

        let b = DVector::from_fn(n, |i, _| i as f64 + 1.0);
        let permuted = permute_symmetric(&csr, &perm);
        let chol = SkylineCholesky::factorize(&permuted, 1e-9).unwrap();
        let x = unapply_permutation(&chol.solve(&apply_permutation(&b, &perm)), &perm);
        let residual = (csr_matvec(&csr, &x) - &b).norm();
        assert!(residual < 1e-10);
    }

    #[test]
    fn test_submatrix_drops_rows() {
        let csr = tridiagonal(4);
        let map = [None, Some(0), Some(1), None];
        let sub = csr_to_dense(&csr_submatrix(&csr, &map, 2));
        assert_relative_eq!(sub[(0, 0)], 4.0);
        assert_relative_eq!(sub[(0, 1)], -1.0);
        assert_relative_eq!(sub[(1, 1)], 4.0);
    }
}
