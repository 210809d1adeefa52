//! Lightweight wrapper for array shapes and dimension bookkeeping.

/// Stores the logical dimensions of an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Constructs a new shape from the provided dimensions.
    ///
    /// Panics if `dims` is empty, ensuring every array has at least one axis.
    pub fn new<D: Into<Vec<usize>>>(dims: D) -> Self {
        let dims = dims.into();
        assert!(!dims.is_empty(), "shape must have at least one dimension");
        Shape { dims }
    }

    /// Borrow the raw dimension slice for downstream calculations.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the rank (number of axes) of the shape.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Computes the total number of elements implied by the shape.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Row-major strides: the last axis varies fastest.
    pub fn row_major_strides(&self) -> Vec<usize> {
        let mut strides = vec![0; self.dims.len()];
        let mut acc = 1usize;
        for (i, dim) in self.dims.iter().enumerate().rev() {
            strides[i] = acc;
            acc *= *dim;
        }
        strides
    }

    /// Asserts that another shape matches exactly, panicking on mismatch.
    pub fn assert_same(&self, other: &Shape) {
        assert_eq!(
            self.dims, other.dims,
            "shape mismatch: {:?} vs {:?}",
            self, other
        );
    }
}
