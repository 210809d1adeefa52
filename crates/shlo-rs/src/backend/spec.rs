//! Portable array-backend contract.
//!
//! Everything the lowering layer asks of an execution backend lives here:
//! the value types describing dense arrays, the primitive operation
//! vocabulary (bounded slice, batched gather, scatter-with-accumulation,
//! comparison, elementwise arithmetic, reduction, argsort), and the error
//! taxonomy shared by every backend implementation.

use std::fmt;
use std::sync::Arc;

use serde::{ser::SerializeStruct, Deserialize, Serialize};
use thiserror::Error;

/// Enumerates scalar element types supported by the backend contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    I1,
    Si32,
    F32,
}

impl DType {
    /// Returns `true` when the dtype is an integer.
    pub fn is_integer(self) -> bool {
        matches!(self, DType::Si32)
    }

    /// Returns `true` when the dtype is a floating-point representation.
    pub fn is_float(self) -> bool {
        matches!(self, DType::F32)
    }

    /// Returns the storage size of one element in bytes.
    pub fn size_in_bytes(self) -> usize {
        match self {
            DType::I1 => 1,
            DType::Si32 | DType::F32 => 4,
        }
    }
}

/// Logical array shape as an ordered list of static extents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        Self { dims: dims.into() }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn into_dims(self) -> Vec<usize> {
        self.dims
    }

    /// Returns the total element count implied by the extents.
    pub fn element_count(&self) -> usize {
        self.dims.iter().product()
    }
}

/// Array metadata coupling dtype and shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorSpec {
    pub dtype: DType,
    pub shape: Shape,
}

impl TensorSpec {
    pub fn new(dtype: DType, shape: Shape) -> Self {
        Self { dtype, shape }
    }

    pub fn element_count(&self) -> usize {
        self.shape.element_count()
    }

    pub fn byte_len(&self) -> usize {
        self.element_count() * self.dtype.size_in_bytes()
    }
}

/// Dense literal array payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorLiteral {
    pub spec: TensorSpec,
    pub bytes: Arc<[u8]>,
}

impl TensorLiteral {
    pub fn new(spec: TensorSpec, bytes: Arc<[u8]>) -> Self {
        Self { spec, bytes }
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

impl Serialize for TensorLiteral {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("TensorLiteral", 2)?;
        state.serialize_field("spec", &self.spec)?;
        state.serialize_field("bytes", &self.bytes.as_ref())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for TensorLiteral {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct TensorLiteralHelper {
            spec: TensorSpec,
            bytes: Vec<u8>,
        }

        let helper = TensorLiteralHelper::deserialize(deserializer)?;
        Ok(TensorLiteral {
            spec: helper.spec,
            bytes: Arc::<[u8]>::from(helper.bytes),
        })
    }
}

/// Initialization payload when materialising arrays on a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TensorInit {
    Literal(TensorLiteral),
    Zeroed(TensorSpec),
}

/// Comparator used by the `compare` primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    Less,
    LessEqual,
    Equal,
    GreaterEqual,
    Greater,
    NotEqual,
}

/// Elementwise binary ops defined by the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementwiseBinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Maximum,
    Minimum,
}

/// Ordering strategy injected into `argsort`.
///
/// `GreaterThan` sorts descending and is the default instantiation used by
/// the sort lowering and its tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortComparator {
    LessThan,
    GreaterThan,
}

/// Stable set of specification error identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpecErrorCode {
    RankCeilingExceeded,
    DuplicateDimensionRole,
    OverlappingDimensionRoles,
    DimensionNumbersLengthMismatch,
    IndexVectorDimOutOfRange,
    DimensionOutOfRange,
    SliceSizeOutOfRange,
    ShapeMismatch,
    DTypeNotSupported,
    Unspecified(&'static str),
}

impl SpecErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecErrorCode::RankCeilingExceeded => "SpecError: rank ceiling exceeded",
            SpecErrorCode::DuplicateDimensionRole => {
                "SpecError: dimension listed twice in one role"
            }
            SpecErrorCode::OverlappingDimensionRoles => {
                "SpecError: dimension assigned to overlapping roles"
            }
            SpecErrorCode::DimensionNumbersLengthMismatch => {
                "SpecError: dimension-numbers length mismatch"
            }
            SpecErrorCode::IndexVectorDimOutOfRange => {
                "SpecError: index vector dimension out of range"
            }
            SpecErrorCode::DimensionOutOfRange => "SpecError: dimension out of range",
            SpecErrorCode::SliceSizeOutOfRange => "SpecError: slice size out of range",
            SpecErrorCode::ShapeMismatch => {
                "SpecError: shape does not agree with dimension numbers"
            }
            SpecErrorCode::DTypeNotSupported => "SpecError: dtype not supported for op",
            SpecErrorCode::Unspecified(code) => code,
        }
    }
}

/// Validation failure captured before any element is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecError {
    pub code: SpecErrorCode,
    pub detail: Option<String>,
}

impl SpecError {
    pub fn new(code: SpecErrorCode, detail: impl Into<Option<String>>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({detail})", self.code.as_str()),
            None => write!(f, "{}", self.code.as_str()),
        }
    }
}

impl std::error::Error for SpecError {}

/// Backend error surfaced to higher layers.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    SpecViolation(#[from] SpecError),
    #[error("{op} is not implemented: {reason}")]
    Unimplemented { op: &'static str, reason: String },
    #[error("backend execution failure: {message}")]
    Execution { message: String },
}

impl BackendError {
    pub fn spec(code: SpecErrorCode, detail: impl Into<Option<String>>) -> Self {
        BackendError::SpecViolation(SpecError::new(code, detail))
    }

    pub fn unimplemented(op: &'static str, reason: impl Into<String>) -> Self {
        BackendError::Unimplemented {
            op,
            reason: reason.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        BackendError::Execution {
            message: message.into(),
        }
    }
}

/// Convenience alias for results returned by backend routines.
pub type BackendResult<T> = Result<T, BackendError>;

/// Portable backend trait evaluating the primitive operation vocabulary.
///
/// All calls are synchronous. Backends that build computation graphs
/// lazily force them in [`ArrayBackend::eval`]; eager backends keep the
/// default no-op. Index operands handed to `gather`/`scatter_add`/
/// `take_along_axis` are guaranteed in-bounds by the resolvers upstream,
/// so backends reject out-of-range indices as hard execution errors
/// rather than applying any clamp or discard policy of their own.
pub trait ArrayBackend: Send + Sync {
    type ArrayHandle: Clone + Send + Sync + 'static;

    /// Returns a human-readable backend identifier (e.g., `"cpu-reference"`).
    fn backend_name(&self) -> &str;

    /// Materialises an array handle from host initialisation data.
    fn materialize(&self, init: TensorInit) -> BackendResult<Self::ArrayHandle>;

    /// Reads back an array handle into a dense literal.
    fn to_literal(&self, array: &Self::ArrayHandle) -> BackendResult<TensorLiteral>;

    /// Copies the rectangular region `[starts, stops)` into a new array.
    fn slice(
        &self,
        array: &Self::ArrayHandle,
        starts: &[usize],
        stops: &[usize],
    ) -> BackendResult<Self::ArrayHandle>;

    /// Derives a new array with `patch` written over `[starts, stops)`.
    fn slice_update(
        &self,
        array: &Self::ArrayHandle,
        patch: &Self::ArrayHandle,
        starts: &[usize],
        stops: &[usize],
    ) -> BackendResult<Self::ArrayHandle>;

    /// Reinterprets the array under a new shape with the same element count.
    fn reshape(&self, array: &Self::ArrayHandle, new_dims: &[usize])
        -> BackendResult<Self::ArrayHandle>;

    /// Batched gather: for every coordinate of the (shared) index-array
    /// shape, reads the window starting at the per-axis index values and
    /// spanning `slice_sizes`. Output shape is the index shape followed by
    /// `slice_sizes`. Axes absent from `axes` start their window at zero.
    fn gather(
        &self,
        array: &Self::ArrayHandle,
        indices: &[Self::ArrayHandle],
        axes: &[usize],
        slice_sizes: &[usize],
    ) -> BackendResult<Self::ArrayHandle>;

    /// Batched scatter-with-accumulation: for every coordinate of the
    /// index-array shape, adds the corresponding update window into the
    /// array at the per-axis index values. Duplicate targets accumulate.
    fn scatter_add(
        &self,
        array: &Self::ArrayHandle,
        indices: &[Self::ArrayHandle],
        updates: &Self::ArrayHandle,
        axes: &[usize],
    ) -> BackendResult<Self::ArrayHandle>;

    /// Elementwise comparison producing an `I1` array.
    fn compare(
        &self,
        lhs: &Self::ArrayHandle,
        rhs: &Self::ArrayHandle,
        op: ComparisonOp,
    ) -> BackendResult<Self::ArrayHandle>;

    /// Elementwise binary arithmetic over same-shaped operands.
    fn binary(
        &self,
        lhs: &Self::ArrayHandle,
        rhs: &Self::ArrayHandle,
        op: ElementwiseBinaryOp,
    ) -> BackendResult<Self::ArrayHandle>;

    /// Sums over the listed axes, optionally keeping them as extent 1.
    fn reduce_sum(
        &self,
        array: &Self::ArrayHandle,
        axes: &[usize],
        keepdims: bool,
    ) -> BackendResult<Self::ArrayHandle>;

    /// Rank-preserving argsort along `axis` under the injected comparator.
    /// When `stable` is set, equal keys keep their original order.
    fn argsort(
        &self,
        array: &Self::ArrayHandle,
        axis: usize,
        comparator: SortComparator,
        stable: bool,
    ) -> BackendResult<Self::ArrayHandle>;

    /// Re-indexes `array` along `axis` by same-rank integer `indices`.
    fn take_along_axis(
        &self,
        array: &Self::ArrayHandle,
        indices: &Self::ArrayHandle,
        axis: usize,
    ) -> BackendResult<Self::ArrayHandle>;

    /// Forces evaluation of lazily-built results. Eager backends keep the
    /// default no-op.
    fn eval(&self, _arrays: &[Self::ArrayHandle]) -> BackendResult<()> {
        Ok(())
    }
}
