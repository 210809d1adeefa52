//! Coordinate-space enumeration for arrays up to the fixed rank ceiling.

use smallvec::SmallVec;

use crate::backend::spec::{SpecError, SpecErrorCode};

/// Hard ceiling on array rank throughout the lowering layer.
pub const MAX_RANK: usize = 8;

/// Full per-axis coordinate of one array element. Axes beyond an array's
/// actual rank are pinned to zero by convention and never iterated.
pub type Coordinate = SmallVec<[usize; MAX_RANK]>;

/// The row-major coordinate space of a shape.
///
/// `iter` can be called any number of times; each call restarts the
/// enumeration from the all-zeros coordinate.
#[derive(Debug, Clone)]
pub struct IndexSpace {
    dims: Coordinate,
}

impl IndexSpace {
    /// Builds the coordinate space of `dims`, rejecting shapes above the
    /// rank ceiling.
    pub fn new(dims: &[usize]) -> Result<Self, SpecError> {
        if dims.len() > MAX_RANK {
            return Err(SpecError::new(
                SpecErrorCode::RankCeilingExceeded,
                format!(
                    "rank {} exceeds the supported ceiling of {}",
                    dims.len(),
                    MAX_RANK
                ),
            ));
        }
        Ok(Self {
            dims: Coordinate::from_slice(dims),
        })
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Number of coordinates the enumeration will yield.
    pub fn num_coordinates(&self) -> usize {
        self.dims.iter().product()
    }

    /// Restartable row-major enumeration, last axis fastest.
    pub fn iter(&self) -> Coordinates {
        Coordinates {
            dims: self.dims.clone(),
            current: SmallVec::from_elem(0, self.dims.len()),
            started: false,
            done: false,
        }
    }
}

impl<'a> IntoIterator for &'a IndexSpace {
    type Item = Coordinate;
    type IntoIter = Coordinates;

    fn into_iter(self) -> Coordinates {
        self.iter()
    }
}

/// Odometer-style iterator over a coordinate space: increments the last
/// axis and carries into earlier axes on overflow.
#[derive(Debug, Clone)]
pub struct Coordinates {
    dims: Coordinate,
    current: Coordinate,
    started: bool,
    done: bool,
}

impl Iterator for Coordinates {
    type Item = Coordinate;

    fn next(&mut self) -> Option<Coordinate> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            if self.dims.iter().any(|&d| d == 0) {
                self.done = true;
                return None;
            }
            return Some(self.current.clone());
        }
        for i in (0..self.current.len()).rev() {
            self.current[i] += 1;
            if self.current[i] < self.dims[i] {
                return Some(self.current.clone());
            }
            self.current[i] = 0;
        }
        self.done = true;
        None
    }
}
