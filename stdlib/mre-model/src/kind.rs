//! Value kinds and the numeric promotion lattice.
//!
//! Scalars are ordered `Boolean < Integer < Real < Complex`. [`best_upcast`]
//! returns the join of two kinds. Matrix kinds take part through their
//! coefficient kind; containers (set, tuple, range) have no numeric join.

use std::fmt;

/// Discriminator of a [`Variant`](crate::Variant) inhabitant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    /// No value; the default-constructed state.
    None,
    /// Two-state value.
    Boolean,
    /// 64-bit two's-complement integer.
    Integer,
    /// IEEE-754 binary64.
    Real,
    /// Pair of reals.
    Complex,
    /// Unordered collection.
    Set,
    /// Ordered sequence.
    Tuple,
    /// Arithmetic progression.
    Range,
    /// Matrix of booleans.
    MatrixBoolean,
    /// Matrix of integers.
    MatrixInteger,
    /// Matrix of reals.
    MatrixReal,
    /// Matrix of complex values.
    MatrixComplex,
    /// Any kind; the static type of a runtime-typed value.
    Variant,
}

impl ValueKind {
    /// True for the four scalar kinds.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        matches!(self, Self::Boolean | Self::Integer | Self::Real | Self::Complex)
    }

    /// True for the four matrix kinds.
    #[must_use]
    pub const fn is_matrix(self) -> bool {
        matches!(
            self,
            Self::MatrixBoolean | Self::MatrixInteger | Self::MatrixReal | Self::MatrixComplex
        )
    }

    /// Scalar kind of a scalar or the coefficient kind of a matrix.
    #[must_use]
    pub const fn scalar_kind(self) -> Option<Self> {
        match self {
            Self::Boolean | Self::MatrixBoolean => Some(Self::Boolean),
            Self::Integer | Self::MatrixInteger => Some(Self::Integer),
            Self::Real | Self::MatrixReal => Some(Self::Real),
            Self::Complex | Self::MatrixComplex => Some(Self::Complex),
            _ => None,
        }
    }

    /// Matrix kind with this scalar kind as coefficient.
    #[must_use]
    pub const fn matrix_kind(self) -> Option<Self> {
        match self.scalar_kind() {
            Some(Self::Boolean) => Some(Self::MatrixBoolean),
            Some(Self::Integer) => Some(Self::MatrixInteger),
            Some(Self::Real) => Some(Self::MatrixReal),
            Some(Self::Complex) => Some(Self::MatrixComplex),
            _ => None,
        }
    }

    /// Position in the numeric lattice.
    const fn rank(self) -> u8 {
        match self {
            Self::Boolean => 0,
            Self::Integer => 1,
            Self::Real => 2,
            _ => 3,
        }
    }

    /// Name used in messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Real => "Real",
            Self::Complex => "Complex",
            Self::Set => "Set",
            Self::Tuple => "Tuple",
            Self::Range => "Range",
            Self::MatrixBoolean => "MatrixBoolean",
            Self::MatrixInteger => "MatrixInteger",
            Self::MatrixReal => "MatrixReal",
            Self::MatrixComplex => "MatrixComplex",
            Self::Variant => "Variant",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Join of two kinds in the promotion lattice.
///
/// Scalars join to the larger scalar. If either side is a matrix the result
/// is the matrix kind of the joined coefficient. Any non-numeric operand
/// yields [`ValueKind::None`].
#[must_use]
pub const fn best_upcast(a: ValueKind, b: ValueKind) -> ValueKind {
    let (Some(sa), Some(sb)) = (a.scalar_kind(), b.scalar_kind()) else {
        return ValueKind::None;
    };
    let joined = if sa.rank() >= sb.rank() { sa } else { sb };
    if a.is_matrix() || b.is_matrix() {
        match joined.matrix_kind() {
            Some(k) => k,
            None => ValueKind::None,
        }
    } else {
        joined
    }
}

/// Variadic [`best_upcast`], folded left to right.
///
/// An empty list yields [`ValueKind::None`].
#[must_use]
pub fn best_upcast_all(kinds: &[ValueKind]) -> ValueKind {
    let mut iter = kinds.iter().copied();
    let Some(first) = iter.next() else {
        return ValueKind::None;
    };
    iter.fold(first, best_upcast)
}

/// Kind in which an arithmetic operator is carried out.
///
/// Same as [`best_upcast`] except that Boolean arithmetic is done on
/// integers.
#[must_use]
pub const fn arithmetic_kind(a: ValueKind, b: ValueKind) -> ValueKind {
    match best_upcast(a, b) {
        ValueKind::Boolean => ValueKind::Integer,
        ValueKind::MatrixBoolean => ValueKind::MatrixInteger,
        k => k,
    }
}
