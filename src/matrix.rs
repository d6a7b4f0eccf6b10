//! Dense matrices, singular value decomposition and 3D transform builders
use crate::{EPSILON, Point3, ProjectionError, Scalar, scalar_fmt};
use std::{
    fmt,
    ops::{Index, IndexMut},
};

/// Maximum number of Jacobi rotations performed by [`Matrix::svd`]
pub const SVD_MAX_ITERATIONS: usize = 100;
/// Off-diagonal magnitude below which Jacobi iteration is considered converged
pub const SVD_EPSILON: Scalar = 1e-10;
/// Singular values at or below this are treated as zero by the pseudo-inverse
pub const PINV_EPSILON: Scalar = 1e-10;

/// Dense `rows x cols` matrix stored in row-major order
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Vec<Scalar>>", into = "Vec<Vec<Scalar>>")
)]
#[derive(Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Scalar>,
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix {}x{} [", self.rows, self.cols)?;
        for row in 0..self.rows {
            if row != 0 {
                write!(f, "; ")?;
            }
            for (col, value) in self.row(row).iter().enumerate() {
                if col != 0 {
                    write!(f, " ")?;
                }
                scalar_fmt(f, *value)?;
            }
        }
        write!(f, "]")
    }
}

impl Matrix {
    /// Create matrix from row-major data
    pub fn new(rows: usize, cols: usize, data: Vec<Scalar>) -> Result<Self, ProjectionError> {
        if rows == 0 || cols == 0 || data.len() != rows * cols {
            return Err(ProjectionError::DimensionMismatch {
                left: (rows, cols),
                right: (data.len(), 1),
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn identity(size: usize) -> Self {
        let mut result = Self::zeros(size, size);
        for index in 0..size {
            result[(index, index)] = 1.0;
        }
        result
    }

    /// Create matrix from a list of rows, all rows must have the same length
    pub fn from_rows<R: AsRef<[Scalar]>>(rows: &[R]) -> Result<Self, ProjectionError> {
        let cols = rows.first().map_or(0, |row| row.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(ProjectionError::DimensionMismatch {
                    left: (rows.len(), cols),
                    right: (1, row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Self::new(rows.len(), cols, data)
    }

    /// Create `4 x n` matrix whose columns are homogeneous points
    pub fn from_homogeneous(columns: &[[Scalar; 4]]) -> Result<Self, ProjectionError> {
        let flat: &[Scalar] = bytemuck::cast_slice(columns);
        Ok(Self::new(columns.len(), 4, flat.to_vec())?.transpose())
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)` pair
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Scalar> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[Scalar] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn column(&self, col: usize) -> Vec<Scalar> {
        (0..self.rows).map(|row| self[(row, col)]).collect()
    }

    pub fn transpose(&self) -> Self {
        let mut result = Self::zeros(self.cols, self.rows);
        for row in 0..self.rows {
            for col in 0..self.cols {
                result[(col, row)] = self[(row, col)];
            }
        }
        result
    }

    /// Matrix product `self * other`
    pub fn mul(&self, other: &Matrix) -> Result<Self, ProjectionError> {
        if self.cols != other.rows {
            return Err(ProjectionError::DimensionMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        let mut result = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self[(i, k)];
                for j in 0..other.cols {
                    result[(i, j)] += a * other[(k, j)];
                }
            }
        }
        Ok(result)
    }

    /// Matrix-vector product `self * vector`
    pub fn mul_vec(&self, vector: &[Scalar]) -> Result<Vec<Scalar>, ProjectionError> {
        if self.cols != vector.len() {
            return Err(ProjectionError::DimensionMismatch {
                left: self.shape(),
                right: (vector.len(), 1),
            });
        }
        Ok((0..self.rows)
            .map(|row| {
                self.row(row)
                    .iter()
                    .zip(vector)
                    .map(|(a, b)| a * b)
                    .sum()
            })
            .collect())
    }

    fn require_transform(&self) -> Result<(), ProjectionError> {
        if self.shape() != (4, 4) {
            return Err(ProjectionError::InvalidDimension {
                expected: 4,
                found: if self.rows != 4 { self.rows } else { self.cols },
            });
        }
        Ok(())
    }

    /// Apply 4x4 transform to a point, treated as `[x, y, z, 1]`
    pub fn apply_point(&self, point: Point3) -> Result<Point3, ProjectionError> {
        self.require_transform()?;
        let [x, y, z, _] = self.apply_homogeneous(point.to_homogeneous());
        Ok(Point3([x, y, z]))
    }

    /// Apply 4x4 transform to a direction, treated as `[x, y, z, 0]`
    pub fn apply_vector(&self, vector: Point3) -> Result<Point3, ProjectionError> {
        self.require_transform()?;
        let Point3([x, y, z]) = vector;
        let [x, y, z, _] = self.apply_homogeneous([x, y, z, 0.0]);
        Ok(Point3([x, y, z]))
    }

    fn apply_homogeneous(&self, value: [Scalar; 4]) -> [Scalar; 4] {
        let mut result = [0.0; 4];
        for (row, out) in result.iter_mut().enumerate() {
            *out = self
                .row(row)
                .iter()
                .zip(value.iter())
                .map(|(a, b)| a * b)
                .sum();
        }
        result
    }

    /// Apply rotation by `angle` radians (around `center` if provided) before self
    pub fn rotate(
        &self,
        rotation: Rotation,
        angle: Scalar,
        center: Option<Point3>,
    ) -> Result<Self, ProjectionError> {
        let (i, j) = rotation.plane()?;
        let (sin, cos) = angle.sin_cos();
        let mut step = Self::identity(4);
        step[(i, i)] = cos;
        step[(i, j)] = -sin;
        step[(j, i)] = sin;
        step[(j, j)] = cos;
        match center {
            None => self.mul(&step),
            Some(center) => self
                .translate(center)?
                .mul(&step)?
                .translate(-center),
        }
    }

    /// Apply translation by `offset` before self
    pub fn translate(&self, offset: impl Into<Point3>) -> Result<Self, ProjectionError> {
        let Point3([tx, ty, tz]) = offset.into();
        let mut step = Self::identity(4);
        step[(0, 3)] = tx;
        step[(1, 3)] = ty;
        step[(2, 3)] = tz;
        self.mul(&step)
    }

    /// Compose transform steps into a single 4x4 matrix
    ///
    /// Steps are right-multiplied in list order, `M = S0 * S1 * ... * Sk`,
    /// so the last step is the first one applied to a point.
    pub fn from_steps(steps: &[TransformStep]) -> Result<Self, ProjectionError> {
        steps
            .iter()
            .try_fold(Self::identity(4), |matrix, step| step.apply(&matrix))
    }

    /// Singular value decomposition `self = U * diag(S) * V^T`
    ///
    /// Eigen-decomposes `A^T A` with classical Jacobi rotations, each one
    /// zeroing the largest off-diagonal entry. Stops after
    /// [`SVD_MAX_ITERATIONS`] rotations, returning the best approximation
    /// found so far. Singular values are sorted in descending order.
    pub fn svd(&self) -> Svd {
        let n = self.cols;
        let mut gram = Self::zeros(n, n);
        for i in 0..n {
            for j in i..n {
                let value: Scalar = (0..self.rows)
                    .map(|k| self[(k, i)] * self[(k, j)])
                    .sum();
                gram[(i, j)] = value;
                gram[(j, i)] = value;
            }
        }

        let mut v = Self::identity(n);
        let mut iterations = 0;
        let converged = loop {
            let (p, q) = match gram.largest_off_diagonal() {
                None => break true,
                Some(pq) => pq,
            };
            let off = gram[(p, q)].abs();
            if off < SVD_EPSILON || off <= EPSILON * (gram[(p, p)] * gram[(q, q)]).abs().sqrt() {
                break true;
            }
            if iterations == SVD_MAX_ITERATIONS {
                break false;
            }
            jacobi_rotate(&mut gram, &mut v, p, q);
            iterations += 1;
        };
        if !converged {
            tracing::debug!(
                iterations,
                shape = ?self.shape(),
                "[svd] rotation budget exhausted, using best approximation"
            );
        }

        // singular values as norms of `A * v` stay accurate near zero,
        // unlike square roots of the eigenvalues
        let columns: Vec<(Scalar, Vec<Scalar>)> = (0..n)
            .map(|src| {
                let w: Vec<Scalar> = (0..self.rows)
                    .map(|row| (0..n).map(|k| self[(row, k)] * v[(k, src)]).sum())
                    .collect();
                let sigma = w.iter().map(|value| value * value).sum::<Scalar>().sqrt();
                (sigma, w)
            })
            .collect();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|a, b| columns[*b].0.total_cmp(&columns[*a].0));

        let mut s = Vec::with_capacity(n);
        let mut v_sorted = Self::zeros(n, n);
        let mut u = Self::zeros(self.rows, n);
        for (dst, src) in order.into_iter().enumerate() {
            let (sigma, w) = &columns[src];
            s.push(*sigma);
            for row in 0..n {
                v_sorted[(row, dst)] = v[(row, src)];
            }
            if *sigma > PINV_EPSILON {
                for (row, value) in w.iter().enumerate() {
                    u[(row, dst)] = value / sigma;
                }
            }
        }

        Svd {
            u,
            s,
            v: v_sorted,
            iterations,
            converged,
        }
    }

    /// Position `(p, q)` with `p < q` of the largest off-diagonal entry
    fn largest_off_diagonal(&self) -> Option<(usize, usize)> {
        let mut result = None;
        let mut largest = -1.0;
        for p in 0..self.rows {
            for q in p + 1..self.cols {
                let value = self[(p, q)].abs();
                if value > largest {
                    largest = value;
                    result = Some((p, q));
                }
            }
        }
        result
    }
}

/// Apply Jacobi rotation that zeroes `a[p, q]` of the symmetric matrix `a`,
/// accumulating the rotation into `v`.
fn jacobi_rotate(a: &mut Matrix, v: &mut Matrix, p: usize, q: usize) {
    let n = a.rows;
    let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * a[(p, q)]);
    let t = theta.signum() / (theta.abs() + theta.hypot(1.0));
    let c = 1.0 / t.hypot(1.0);
    let s = t * c;
    for k in 0..n {
        let akp = a[(k, p)];
        let akq = a[(k, q)];
        a[(k, p)] = c * akp - s * akq;
        a[(k, q)] = s * akp + c * akq;
    }
    for k in 0..n {
        let apk = a[(p, k)];
        let aqk = a[(q, k)];
        a[(p, k)] = c * apk - s * aqk;
        a[(q, k)] = s * apk + c * aqk;
    }
    // exact zero instead of round-off residue
    a[(p, q)] = 0.0;
    a[(q, p)] = 0.0;
    for k in 0..n {
        let vkp = v[(k, p)];
        let vkq = v[(k, q)];
        v[(k, p)] = c * vkp - s * vkq;
        v[(k, q)] = s * vkp + c * vkq;
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = Scalar;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &mut self.data[row * self.cols + col]
    }
}

impl TryFrom<Vec<Vec<Scalar>>> for Matrix {
    type Error = ProjectionError;

    fn try_from(rows: Vec<Vec<Scalar>>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows)
    }
}

impl From<Matrix> for Vec<Vec<Scalar>> {
    fn from(matrix: Matrix) -> Self {
        (0..matrix.rows).map(|row| matrix.row(row).to_vec()).collect()
    }
}

/// Result of [`Matrix::svd`]
#[derive(Debug, Clone)]
pub struct Svd {
    /// `rows x cols` matrix of left singular vectors
    pub u: Matrix,
    /// Singular values in descending order
    pub s: Vec<Scalar>,
    /// `cols x cols` matrix of right singular vectors
    pub v: Matrix,
    /// Number of Jacobi rotations performed
    pub iterations: usize,
    /// Whether iteration converged before the rotation budget ran out
    pub converged: bool,
}

impl Svd {
    /// Least squares solution of `A * x = b` using Moore-Penrose pseudo-inverse
    ///
    /// Computes `V * S+ * U^T * b` where `S+` holds reciprocals of singular
    /// values above [`PINV_EPSILON`] and zeros otherwise.
    pub fn solve(&self, b: &[Scalar]) -> Result<Vec<Scalar>, ProjectionError> {
        let y = self.u.transpose().mul_vec(b)?;
        let y: Vec<Scalar> = y
            .into_iter()
            .zip(&self.s)
            .map(|(y, s)| if *s > PINV_EPSILON { y / s } else { 0.0 })
            .collect();
        self.v.mul_vec(&y)
    }

    /// Rebuild `U * diag(S) * V^T`
    pub fn reconstruct(&self) -> Result<Matrix, ProjectionError> {
        let mut us = self.u.clone();
        for row in 0..us.rows() {
            for (col, sigma) in self.s.iter().enumerate() {
                us[(row, col)] *= sigma;
            }
        }
        us.mul(&self.v.transpose())
    }
}

/// Coordinate axis
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Rotation specification
///
/// `Axis(a)` rotates counter-clockwise around `a` (right-handed).
/// `Plane(from, to)` rotates inside the plane spanned by two axes, turning
/// `from` toward `to`, so `Plane(X, Y)` is the same as `Axis(Z)`.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Axis(Axis),
    Plane(Axis, Axis),
}

impl Rotation {
    /// Indices `(from, to)` of the rotation plane
    fn plane(self) -> Result<(usize, usize), ProjectionError> {
        match self {
            Rotation::Axis(Axis::X) => Ok((1, 2)),
            Rotation::Axis(Axis::Y) => Ok((2, 0)),
            Rotation::Axis(Axis::Z) => Ok((0, 1)),
            Rotation::Plane(from, to) if from == to => Err(ProjectionError::InvalidRotation(from)),
            Rotation::Plane(from, to) => Ok((from.index(), to.index())),
        }
    }
}

impl From<Axis> for Rotation {
    fn from(axis: Axis) -> Self {
        Rotation::Axis(axis)
    }
}

/// Single step of a transform list
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformStep {
    Rotate {
        axis: Rotation,
        /// Angle in radians
        angle: Scalar,
        center: Option<Point3>,
    },
    Translate(Point3),
}

impl TransformStep {
    pub fn rotate(axis: impl Into<Rotation>, angle: Scalar) -> Self {
        TransformStep::Rotate {
            axis: axis.into(),
            angle,
            center: None,
        }
    }

    pub fn translate(offset: impl Into<Point3>) -> Self {
        TransformStep::Translate(offset.into())
    }

    /// Right-multiply this step onto `matrix`
    pub fn apply(&self, matrix: &Matrix) -> Result<Matrix, ProjectionError> {
        match *self {
            TransformStep::Rotate {
                axis,
                angle,
                center,
            } => matrix.rotate(axis, angle, center),
            TransformStep::Translate(offset) => matrix.translate(offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PI, assert_approx_eq};

    fn assert_matrix_eq(m0: &Matrix, m1: &Matrix, tolerance: Scalar) {
        assert_eq!(m0.shape(), m1.shape());
        for row in 0..m0.rows() {
            for col in 0..m0.cols() {
                assert!(
                    (m0[(row, col)] - m1[(row, col)]).abs() < tolerance,
                    "{:?} != {:?}",
                    m0,
                    m1
                );
            }
        }
    }

    #[test]
    fn test_matmul() -> Result<(), ProjectionError> {
        let m0 = Matrix::new(3, 3, vec![31.0, 11.0, 21.0, 12.0, 19.0, 3.0, 18.0, 25.0, 16.0])?;
        let m1 = Matrix::new(3, 3, vec![19.0, 7.0, 14.0, 1.0, 0.0, 12.0, 10.0, 29.0, 29.0])?;
        let r = Matrix::new(
            3,
            3,
            vec![
                810.0, 826.0, 1175.0, 277.0, 171.0, 483.0, 527.0, 590.0, 1016.0,
            ],
        )?;
        assert_eq!(m0.mul(&m1)?, r);

        let v = m0.mul_vec(&[1.0, 0.0, -1.0])?;
        assert_eq!(v, vec![10.0, 9.0, 2.0]);
        Ok(())
    }

    #[test]
    fn test_dimension_mismatch() -> Result<(), ProjectionError> {
        let m0 = Matrix::zeros(2, 3);
        let m1 = Matrix::zeros(2, 3);
        assert!(matches!(
            m0.mul(&m1),
            Err(ProjectionError::DimensionMismatch {
                left: (2, 3),
                right: (2, 3)
            })
        ));
        assert!(m0.mul(&m1.transpose()).is_ok());
        assert!(m0.mul_vec(&[1.0, 2.0]).is_err());
        assert!(Matrix::new(2, 2, vec![1.0, 2.0, 3.0]).is_err());
        assert!(Matrix::new(0, 2, Vec::new()).is_err());
        assert!(Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
        assert!(matches!(
            Matrix::identity(3).apply_point(Point3::default()),
            Err(ProjectionError::InvalidDimension {
                expected: 4,
                found: 3
            })
        ));
        Ok(())
    }

    #[test]
    fn test_transpose() -> Result<(), ProjectionError> {
        let m = Matrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]])?;
        let t = m.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.row(2), &[3.0, 6.0]);
        assert_eq!(t.transpose(), m);
        assert_eq!(m.column(1), vec![2.0, 5.0]);
        assert_eq!(m.get(1, 2), Some(6.0));
        assert_eq!(m.get(2, 0), None);
        Ok(())
    }

    #[test]
    fn test_from_homogeneous() -> Result<(), ProjectionError> {
        let m = Matrix::from_homogeneous(&[[1.0, 2.0, 3.0, 1.0], [4.0, 5.0, 6.0, 1.0]])?;
        assert_eq!(m.shape(), (4, 2));
        assert_eq!(m.column(1), vec![4.0, 5.0, 6.0, 1.0]);
        assert_eq!(m.row(3), &[1.0, 1.0]);
        Ok(())
    }

    #[test]
    fn test_svd_reconstruct() -> Result<(), ProjectionError> {
        let m = Matrix::from_rows(&[
            [2.0, 0.0, 1.0],
            [1.0, 3.0, 2.0],
            [1.0, 1.0, 2.0],
            [0.5, -1.0, 4.0],
        ])?;
        let svd = m.svd();
        assert!(svd.converged);
        assert_eq!(svd.s.len(), 3);
        assert!(svd.s.windows(2).all(|w| w[0] >= w[1]));
        assert_matrix_eq(&svd.reconstruct()?, &m, 1e-9);

        // V is orthogonal
        let vtv = svd.v.transpose().mul(&svd.v)?;
        assert_matrix_eq(&vtv, &Matrix::identity(3), 1e-9);
        Ok(())
    }

    #[test]
    fn test_svd_diagonal() -> Result<(), ProjectionError> {
        let m = Matrix::from_rows(&[[3.0, 0.0], [0.0, -5.0]])?;
        let svd = m.svd();
        assert_eq!(svd.iterations, 0);
        assert_approx_eq!(svd.s[0], 5.0);
        assert_approx_eq!(svd.s[1], 3.0);
        assert_matrix_eq(&svd.reconstruct()?, &m, 1e-12);
        Ok(())
    }

    #[test]
    fn test_svd_budget_exhausted() -> Result<(), ProjectionError> {
        // dense 12x12 needs more rotations than the budget allows
        let size = 12;
        let data = (0..size * size)
            .map(|index| ((index * index) as Scalar * 0.37).sin())
            .collect();
        let m = Matrix::new(size, size, data)?;
        let svd = m.svd();
        assert!(!svd.converged);
        assert_eq!(svd.iterations, SVD_MAX_ITERATIONS);
        assert_eq!(svd.s.len(), size);
        assert!(svd.s.windows(2).all(|w| w[0] >= w[1]));
        // best approximation still reproduces the matrix
        assert_matrix_eq(&svd.reconstruct()?, &m, 1e-9);
        Ok(())
    }

    #[test]
    fn test_svd_rank_deficient() -> Result<(), ProjectionError> {
        // second column is twice the first one
        let m = Matrix::from_rows(&[[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]])?;
        let svd = m.svd();
        assert_approx_eq!(svd.s[0], (70.0 as Scalar).sqrt(), 1e-9);
        assert_approx_eq!(svd.s[1], 0.0, 1e-12);
        assert_matrix_eq(&svd.reconstruct()?, &m, 1e-9);

        // minimal norm solution of x + 2y = 1
        let x = svd.solve(&[1.0, 2.0, 3.0])?;
        assert_approx_eq!(x[0], 0.2, 1e-9);
        assert_approx_eq!(x[1], 0.4, 1e-9);
        Ok(())
    }

    #[test]
    fn test_least_squares() -> Result<(), ProjectionError> {
        // fit y = a * x + b through noisy points of y = 2x + 1
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [1.1, 2.9, 5.1, 6.9, 9.0];
        let rows: Vec<_> = xs.iter().map(|x| [*x, 1.0]).collect();
        let m = Matrix::from_rows(&rows)?;
        let ab = m.svd().solve(&ys)?;
        assert_approx_eq!(ab[0], 1.98, 1e-9);
        assert_approx_eq!(ab[1], 1.04, 1e-9);

        assert!(m.svd().solve(&[1.0, 2.0]).is_err());
        Ok(())
    }

    #[test]
    fn test_rotation() -> Result<(), ProjectionError> {
        let p = Point3::new(1.0, 2.0, 0.0);

        let rx = Matrix::identity(4).rotate(Axis::X.into(), PI / 2.0, None)?;
        let q = rx.apply_point(p)?;
        assert_approx_eq!(q.x(), 1.0, 1e-12);
        assert_approx_eq!(q.y(), 0.0, 1e-12);
        assert_approx_eq!(q.z(), 2.0, 1e-12);

        let rz = Matrix::identity(4).rotate(Axis::Z.into(), PI / 2.0, None)?;
        let rxy = Matrix::identity(4).rotate(Rotation::Plane(Axis::X, Axis::Y), PI / 2.0, None)?;
        assert_matrix_eq(&rz, &rxy, 1e-12);
        let q = rz.apply_point(p)?;
        assert_approx_eq!(q.x(), -2.0, 1e-12);
        assert_approx_eq!(q.y(), 1.0, 1e-12);

        let ry = Matrix::identity(4).rotate(Axis::Y.into(), PI / 2.0, None)?;
        let q = ry.apply_point(Point3::new(0.0, 0.0, 1.0))?;
        assert_approx_eq!(q.x(), 1.0, 1e-12);
        assert_approx_eq!(q.z(), 0.0, 1e-12);

        // rotation around a center keeps the center in place
        let center = Point3::new(3.0, 4.0, 0.0);
        let rc = Matrix::identity(4).rotate(Axis::Z.into(), 1.0, Some(center))?;
        let q = rc.apply_point(center)?;
        assert_approx_eq!(q.x(), 3.0, 1e-12);
        assert_approx_eq!(q.y(), 4.0, 1e-12);

        // vectors ignore translation
        let t = Matrix::identity(4).translate([1.0, 2.0, 3.0])?;
        assert_eq!(t.apply_vector(p)?, p);
        assert_eq!(t.apply_point(p)?, Point3::new(2.0, 4.0, 3.0));

        assert!(matches!(
            Matrix::identity(4).rotate(Rotation::Plane(Axis::Y, Axis::Y), 1.0, None),
            Err(ProjectionError::InvalidRotation(Axis::Y))
        ));
        Ok(())
    }

    #[test]
    fn test_steps_order() -> Result<(), ProjectionError> {
        // steps are right-multiplied, the last one acts on points first
        let steps = [
            TransformStep::translate([10.0, 0.0, 0.0]),
            TransformStep::rotate(Axis::Z, PI / 2.0),
        ];
        let m = Matrix::from_steps(&steps)?;
        let q = m.apply_point(Point3::new(1.0, 0.0, 0.0))?;
        assert_approx_eq!(q.x(), 10.0, 1e-12);
        assert_approx_eq!(q.y(), 1.0, 1e-12);

        let expected = Matrix::identity(4)
            .translate([10.0, 0.0, 0.0])?
            .rotate(Axis::Z.into(), PI / 2.0, None)?;
        assert_matrix_eq(&m, &expected, 1e-12);

        let reversed = Matrix::from_steps(&[steps[1], steps[0]])?;
        let q = reversed.apply_point(Point3::new(1.0, 0.0, 0.0))?;
        assert_approx_eq!(q.x(), 0.0, 1e-12);
        assert_approx_eq!(q.y(), 11.0, 1e-12);

        assert_eq!(Matrix::from_steps(&[])?, Matrix::identity(4));
        Ok(())
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde() -> Result<(), ProjectionError> {
        let steps: Vec<TransformStep> = serde_json::from_str(
            r#"[
                {"translate": {"z": 5}},
                {"rotate": {"axis": "x", "angle": 1.5}},
                {"rotate": {"axis": ["z", "x"], "angle": 0.5, "center": [1, 2, 3]}}
            ]"#,
        )?;
        assert_eq!(steps[0], TransformStep::translate([0.0, 0.0, 5.0]));
        assert_eq!(steps[1], TransformStep::rotate(Axis::X, 1.5));
        assert_eq!(
            steps[2],
            TransformStep::Rotate {
                axis: Rotation::Plane(Axis::Z, Axis::X),
                angle: 0.5,
                center: Some(Point3::new(1.0, 2.0, 3.0)),
            }
        );

        let m: Matrix = serde_json::from_str("[[1, 2], [3, 4]]")?;
        assert_eq!(m, Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]])?);
        assert_eq!(serde_json::to_string(&m)?, "[[1.0,2.0],[3.0,4.0]]");
        assert!(serde_json::from_str::<Matrix>("[[1, 2], [3]]").is_err());
        Ok(())
    }
}
