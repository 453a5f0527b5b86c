//! The runtime-typed value
//!
//! [`Variant`] carries every kind of the runtime uniformly. Operations
//! promote mixed operands through the numeric lattice
//! ([`crate::kind::arithmetic_kind`]) and then run the monomorphic code of
//! the joined kind.
//!
//! # Equality and hashing
//!
//! Numeric values compare by value across kinds: `true == 1 == 1.0 ==
//! 1+0i`. [`Variant::fuzzy_hash`] is consistent with that equality, which
//! is what lets sets mix kinds. Values of non-comparable kinds (a set and a
//! matrix, say) are never equal.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use num_complex::Complex64;
use rustc_hash::FxHasher;

use crate::error::{invalid, ModelError, Result};
use crate::index::scalar_index;
use crate::kind::{arithmetic_kind, best_upcast, ValueKind};
use crate::matrix::{
    Coefficient, Matrix, MatrixBoolean, MatrixComplex, MatrixInteger, MatrixReal, Numeric,
};
use crate::range::Range;
use crate::scalar::{compare_integer_real, NumericKey};
use crate::set::Set;
use crate::tuple::Tuple;

/// A value of any kind.
#[derive(Clone, Debug, Default)]
pub enum Variant {
    /// No value.
    #[default]
    None,
    /// Boolean scalar.
    Boolean(bool),
    /// Integer scalar.
    Integer(i64),
    /// Real scalar.
    Real(f64),
    /// Complex scalar.
    Complex(Complex64),
    /// Finite set or universe set.
    Set(Set),
    /// Tuple.
    Tuple(Tuple),
    /// Arithmetic progression.
    Range(Range),
    /// Boolean matrix.
    MatrixBoolean(MatrixBoolean),
    /// Integer matrix.
    MatrixInteger(MatrixInteger),
    /// Real matrix.
    MatrixReal(MatrixReal),
    /// Complex matrix.
    MatrixComplex(MatrixComplex),
}

/// Dispatch `$body` over the four matrix inhabitants of a variant.
macro_rules! with_matrix {
    ($value:expr, $m:ident => $body:expr, _ => $otherwise:expr) => {
        match $value {
            Variant::MatrixBoolean($m) => $body,
            Variant::MatrixInteger($m) => $body,
            Variant::MatrixReal($m) => $body,
            Variant::MatrixComplex($m) => $body,
            _ => $otherwise,
        }
    };
}

/// Real part of a numeric scalar, kept exact for integers.
#[derive(Clone, Copy)]
enum RealPart {
    Integer(i64),
    Real(f64),
}

#[derive(Clone, Copy)]
enum RingOp {
    Add,
    Sub,
    Mul,
}

impl RingOp {
    fn apply<T: Numeric>(self, x: T, y: T) -> T {
        match self {
            Self::Add => x.plus(y),
            Self::Sub => x.minus(y),
            Self::Mul => x.times(y),
        }
    }
}

impl Variant {
    /// Kind of the inhabitant.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::None => ValueKind::None,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Integer(_) => ValueKind::Integer,
            Self::Real(_) => ValueKind::Real,
            Self::Complex(_) => ValueKind::Complex,
            Self::Set(_) => ValueKind::Set,
            Self::Tuple(_) => ValueKind::Tuple,
            Self::Range(_) => ValueKind::Range,
            Self::MatrixBoolean(_) => ValueKind::MatrixBoolean,
            Self::MatrixInteger(_) => ValueKind::MatrixInteger,
            Self::MatrixReal(_) => ValueKind::MatrixReal,
            Self::MatrixComplex(_) => ValueKind::MatrixComplex,
        }
    }

    /// True for the default, empty variant.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// True for Boolean, Integer, Real and Complex values.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.kind().is_scalar()
    }

    /// True for the four matrix kinds.
    #[must_use]
    pub fn is_matrix(&self) -> bool {
        self.kind().is_matrix()
    }

    fn numeric_parts(&self) -> Option<(RealPart, f64)> {
        match *self {
            Self::Boolean(b) => Some((RealPart::Integer(i64::from(b)), 0.0)),
            Self::Integer(i) => Some((RealPart::Integer(i), 0.0)),
            Self::Real(x) => Some((RealPart::Real(x), 0.0)),
            Self::Complex(z) => Some((RealPart::Real(z.re), z.im)),
            _ => None,
        }
    }

    pub(crate) fn is_nan(&self) -> bool {
        match *self {
            Self::Real(x) => x.is_nan(),
            Self::Complex(z) => z.is_nan(),
            _ => false,
        }
    }

    /// Hash consistent with the fuzzy equality.
    #[must_use]
    pub fn fuzzy_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash_into(&mut hasher);
        hasher.finish()
    }

    fn hash_into<H: Hasher>(&self, h: &mut H) {
        match self {
            Self::None => 0xffu8.hash(h),
            Self::Boolean(b) => NumericKey::of_integer(i64::from(*b)).hash(h),
            Self::Integer(i) => NumericKey::of_integer(*i).hash(h),
            Self::Real(x) => NumericKey::of_real(*x).hash(h),
            Self::Complex(z) => NumericKey::of_complex(*z).hash(h),
            Self::Tuple(t) => {
                3u8.hash(h);
                t.len().hash(h);
                for v in t {
                    v.hash_into(h);
                }
            }
            Self::Set(s) => {
                4u8.hash(h);
                s.content_hash().hash(h);
            }
            Self::Range(r) => {
                5u8.hash(h);
                r.size().hash(h);
                if !r.is_empty() {
                    r.first().hash_into(h);
                    r.last().hash_into(h);
                }
            }
            other => with_matrix!(other, m => {
                6u8.hash(h);
                m.shape().hash(h);
                for v in m.iter() {
                    v.to_variant().hash_into(h);
                }
            }, _ => {}),
        }
    }

    /// Elements one level down.
    ///
    /// Containers yield their elements (matrices in column-major order),
    /// scalars yield themselves and `None` yields nothing.
    ///
    /// # Errors
    ///
    /// Fails for an infinite universe set.
    pub fn elements(&self) -> Result<Vec<Variant>> {
        match self {
            Self::None => Ok(Vec::new()),
            Self::Set(s) => s.to_vec(),
            Self::Tuple(t) => Ok(t.as_slice().to_vec()),
            Self::Range(r) => Ok(r.iter().collect()),
            other => Ok(with_matrix!(other,
                m => m.iter().map(Coefficient::to_variant).collect(),
                _ => vec![other.clone()])),
        }
    }

    /// Order against another value of a comparable kind.
    ///
    /// Numbers order by value (complex values by real part, then imaginary
    /// part), tuples and ranges lexicographically, sets by size and then by
    /// sorted elements, matrices of equal shape coefficient by coefficient.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeConversionError`] for kinds that do not
    /// compare, [`ModelError::IncompatibleMatrixDimensions`] for matrices of
    /// different shapes and [`ModelError::InvalidParameterValue`] when a NaN
    /// is involved.
    pub fn relative_order(&self, other: &Self) -> Result<Ordering> {
        if let (Some(a), Some(b)) = (self.numeric_parts(), other.numeric_parts()) {
            return compare_numeric(a, b)
                .ok_or_else(|| invalid(format!("{self} and {other} are not ordered")));
        }
        match (self, other) {
            (Self::None, Self::None) => Ok(Ordering::Equal),
            (Self::Tuple(a), Self::Tuple(b)) => a.relative_order(b),
            (Self::Set(a), Self::Set(b)) => a.relative_order(b),
            (Self::Range(a), Self::Range(b)) => {
                Tuple::from_iter(a.iter()).relative_order(&Tuple::from_iter(b.iter()))
            }
            (a, b) if a.is_matrix() && b.is_matrix() => {
                let (sa, ea) = a.matrix_parts();
                let (sb, eb) = b.matrix_parts();
                if sa != sb {
                    return Err(ModelError::IncompatibleMatrixDimensions {
                        left: sa,
                        right: sb,
                    });
                }
                Tuple::from_vec(ea).relative_order(&Tuple::from_vec(eb))
            }
            _ => Err(self.type_error(other)),
        }
    }

    fn matrix_parts(&self) -> ((usize, usize), Vec<Variant>) {
        with_matrix!(self,
            m => (m.shape(), m.iter().map(Coefficient::to_variant).collect()),
            _ => ((0, 0), Vec::new()))
    }

    fn type_error(&self, other: &Self) -> ModelError {
        ModelError::TypeConversionError {
            left: self.kind(),
            right: other.kind(),
        }
    }

    fn block(&self) -> u8 {
        match self {
            v if v.is_scalar() && !v.is_nan() => 0,
            v if v.is_scalar() => 1,
            Self::Tuple(_) => 2,
            Self::Set(_) => 3,
            Self::Range(_) => 4,
            v if v.is_matrix() => 5,
            _ => 6,
        }
    }

    // ------------------------------------------------------------
    // Conversions
    // ------------------------------------------------------------

    fn conversion_error(&self, to: ValueKind) -> ModelError {
        ModelError::InvalidRuntimeConversion {
            from: self.kind(),
            to,
        }
    }

    fn scalar_as<T: Coefficient>(&self) -> Result<T> {
        T::from_variant(self).ok_or_else(|| self.conversion_error(T::KIND))
    }

    /// Exact conversion to Boolean; only 0 and 1 convert.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRuntimeConversion`] otherwise.
    pub fn to_boolean(&self) -> Result<bool> {
        self.scalar_as()
    }

    /// Exact conversion to Integer.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRuntimeConversion`] for non-integral or
    /// non-numeric values.
    pub fn to_integer(&self) -> Result<i64> {
        self.scalar_as()
    }

    /// Exact conversion to Real.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRuntimeConversion`] for a non-zero
    /// imaginary part or a non-numeric value.
    pub fn to_real(&self) -> Result<f64> {
        self.scalar_as()
    }

    /// Conversion to Complex.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRuntimeConversion`] for non-numeric
    /// values.
    pub fn to_complex(&self) -> Result<Complex64> {
        self.scalar_as()
    }

    /// Set of the elements; a scalar becomes a singleton.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRuntimeConversion`] for `None`.
    pub fn to_set(&self) -> Result<Set> {
        match self {
            Self::Set(s) => Ok(s.clone()),
            Self::None => Err(self.conversion_error(ValueKind::Set)),
            other => Ok(other.elements()?.into_iter().collect()),
        }
    }

    /// Tuple of the elements; a scalar becomes a one-element tuple.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRuntimeConversion`] for `None` or an
    /// infinite set.
    pub fn to_tuple(&self) -> Result<Tuple> {
        match self {
            Self::Tuple(t) => Ok(t.clone()),
            Self::None => Err(self.conversion_error(ValueKind::Tuple)),
            other => other
                .elements()
                .map(Tuple::from_vec)
                .map_err(|_| other.conversion_error(ValueKind::Tuple)),
        }
    }

    /// Matrix with coefficient kind `U`.
    ///
    /// Scalars become `1 x 1` matrices; tuples, ranges and sets become column
    /// vectors.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRuntimeConversion`] if an element is not
    /// exactly representable in `U`.
    pub fn to_matrix<U: Coefficient>(&self) -> Result<Matrix<U>> {
        let fail = || self.conversion_error(U::MATRIX_KIND);
        match self {
            Self::MatrixBoolean(m) => m.convert(),
            Self::MatrixInteger(m) => m.convert(),
            Self::MatrixReal(m) => m.convert(),
            Self::MatrixComplex(m) => m.convert(),
            Self::None => Err(fail()),
            other => {
                let values = other
                    .elements()
                    .map_err(|_| fail())?
                    .iter()
                    .map(|v| U::from_variant(v).ok_or_else(fail))
                    .collect::<Result<Vec<U>>>()?;
                let rows = values.len();
                Matrix::build(rows, 1, &values)
            }
        }
    }

    /// Conversion to a Boolean matrix. See [`Variant::to_matrix`].
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRuntimeConversion`] on failure.
    pub fn to_matrix_boolean(&self) -> Result<MatrixBoolean> {
        self.to_matrix()
    }

    /// Conversion to an Integer matrix. See [`Variant::to_matrix`].
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRuntimeConversion`] on failure.
    pub fn to_matrix_integer(&self) -> Result<MatrixInteger> {
        self.to_matrix()
    }

    /// Conversion to a Real matrix. See [`Variant::to_matrix`].
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRuntimeConversion`] on failure.
    pub fn to_matrix_real(&self) -> Result<MatrixReal> {
        self.to_matrix()
    }

    /// Conversion to a Complex matrix. See [`Variant::to_matrix`].
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRuntimeConversion`] on failure.
    pub fn to_matrix_complex(&self) -> Result<MatrixComplex> {
        self.to_matrix()
    }

    /// Convert to the matrix kind `kind`.
    fn to_matrix_kind(&self, kind: ValueKind) -> Result<Variant> {
        match kind {
            ValueKind::MatrixBoolean => self.to_matrix::<bool>().map(Variant::from),
            ValueKind::MatrixInteger => self.to_matrix::<i64>().map(Variant::from),
            ValueKind::MatrixReal => self.to_matrix::<f64>().map(Variant::from),
            ValueKind::MatrixComplex => self.to_matrix::<Complex64>().map(Variant::from),
            other => Err(self.conversion_error(other)),
        }
    }

    // ------------------------------------------------------------
    // Arithmetic
    // ------------------------------------------------------------

    fn ring(&self, rhs: &Self, op: RingOp) -> Result<Variant> {
        let kind = arithmetic_kind(self.kind(), rhs.kind());
        match kind {
            ValueKind::Integer => Ok(Self::Integer(op.apply(self.to_integer()?, rhs.to_integer()?))),
            ValueKind::Real => Ok(Self::Real(op.apply(self.to_real()?, rhs.to_real()?))),
            ValueKind::Complex => Ok(Self::Complex(op.apply(self.to_complex()?, rhs.to_complex()?))),
            ValueKind::MatrixInteger => self.ring_matrix::<i64>(rhs, op),
            ValueKind::MatrixReal => self.ring_matrix::<f64>(rhs, op),
            ValueKind::MatrixComplex => self.ring_matrix::<Complex64>(rhs, op),
            _ => Err(self.type_error(rhs)),
        }
    }

    fn ring_matrix<T: Numeric>(&self, rhs: &Self, op: RingOp) -> Result<Variant> {
        let result = match (self.is_matrix(), rhs.is_matrix(), op) {
            (true, true, RingOp::Add) => self.to_matrix::<T>()?.try_add(&rhs.to_matrix()?)?,
            (true, true, RingOp::Sub) => self.to_matrix::<T>()?.try_sub(&rhs.to_matrix()?)?,
            (true, true, RingOp::Mul) => self.to_matrix::<T>()?.matmul(&rhs.to_matrix()?)?,
            (true, false, RingOp::Mul) => self.to_matrix::<T>()?.scale(rhs.scalar_as()?),
            (false, true, RingOp::Mul) => rhs.to_matrix::<T>()?.scale(self.scalar_as()?),
            _ => return Err(self.type_error(rhs)),
        };
        Ok(T::wrap(result))
    }

    /// `self + rhs`
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeConversionError`] when the kinds have no
    /// common arithmetic kind.
    pub fn try_add(&self, rhs: &Self) -> Result<Variant> {
        self.ring(rhs, RingOp::Add)
    }

    /// `self - rhs`
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeConversionError`] when the kinds have no
    /// common arithmetic kind.
    pub fn try_sub(&self, rhs: &Self) -> Result<Variant> {
        self.ring(rhs, RingOp::Sub)
    }

    /// `self * rhs`; tuples concatenate
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeConversionError`] when the kinds have no
    /// common arithmetic kind.
    pub fn try_mul(&self, rhs: &Self) -> Result<Variant> {
        match (self, rhs) {
            (Self::Tuple(a), Self::Tuple(b)) => Ok(Self::Tuple(a.concatenate(b))),
            _ => self.ring(rhs, RingOp::Mul),
        }
    }

    /// `self / rhs`; Integer division yields Real and tuples cancel on the
    /// right
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeConversionError`] when the kinds have no
    /// common arithmetic kind.
    pub fn try_div(&self, rhs: &Self) -> Result<Variant> {
        if let (Self::Tuple(a), Self::Tuple(b)) = (self, rhs) {
            return Ok(Self::Tuple(a.cancel_right(b)));
        }
        if rhs.is_matrix() {
            return Err(self.type_error(rhs));
        }
        match arithmetic_kind(self.kind(), rhs.kind()) {
            ValueKind::Integer | ValueKind::Real => Ok(Self::Real(self.to_real()? / rhs.to_real()?)),
            ValueKind::Complex => Ok(Self::Complex(self.to_complex()? / rhs.to_complex()?)),
            ValueKind::MatrixInteger | ValueKind::MatrixReal => {
                Ok(self.to_matrix::<f64>()?.divide(rhs.to_real()?).into())
            }
            ValueKind::MatrixComplex => {
                Ok(self.to_matrix::<Complex64>()?.divide(rhs.to_complex()?).into())
            }
            _ => Err(self.type_error(rhs)),
        }
    }

    /// `-self`; Booleans negate as Integers
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeConversionError`] for non-numeric values.
    pub fn try_neg(&self) -> Result<Variant> {
        match self {
            Self::Boolean(b) => Ok(Self::Integer(-i64::from(*b))),
            Self::Integer(i) => Ok(Self::Integer(i.wrapping_neg())),
            Self::Real(x) => Ok(Self::Real(-x)),
            Self::Complex(z) => Ok(Self::Complex(-z)),
            Self::MatrixBoolean(m) => Ok(m.map(i64::from).negate().into()),
            Self::MatrixInteger(m) => Ok(m.negate().into()),
            Self::MatrixReal(m) => Ok(m.negate().into()),
            Self::MatrixComplex(m) => Ok(m.negate().into()),
            other => Err(other.type_error(other)),
        }
    }

    // ------------------------------------------------------------
    // Indexing
    // ------------------------------------------------------------

    /// Element or sub-container at a 1-based index.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidParameterValue`] unless the inhabitant is
    /// a tuple or a matrix, and [`ModelError::InvalidIndex`] when out of
    /// bounds.
    pub fn at(&self, index: &Variant) -> Result<Variant> {
        match self {
            Self::Tuple(t) => t.at_index(index),
            other => with_matrix!(other,
                m => m.at_index(index),
                _ => Err(invalid(format!("{} cannot be indexed", other.kind())))),
        }
    }

    /// Coefficient or submatrix at 1-based `(row, col)`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidParameterValue`] unless the inhabitant is
    /// a matrix, and [`ModelError::InvalidIndex`] when out of bounds.
    pub fn at2(&self, row: &Variant, col: &Variant) -> Result<Variant> {
        with_matrix!(self,
            m => m.at_index2(row, col),
            _ => Err(invalid(format!("{} has no rows and columns", self.kind()))))
    }

    /// Store `value` at a 1-based index, growing the container as needed.
    ///
    /// A matrix is promoted to the kind that can hold `value`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidParameterValue`] unless the inhabitant is
    /// a tuple or a matrix (or `value` is not a scalar for a matrix), and
    /// [`ModelError::InvalidIndex`] for a position below 1.
    pub fn update(&mut self, index: &Variant, value: Variant) -> Result<()> {
        let i = scalar_index(index)?;
        if let Self::Tuple(t) = self {
            return t.update(i, value);
        }
        self.promote_for(&value)?;
        match self {
            Self::MatrixBoolean(m) => m.update_linear(i, value.scalar_as()?),
            Self::MatrixInteger(m) => m.update_linear(i, value.scalar_as()?),
            Self::MatrixReal(m) => m.update_linear(i, value.scalar_as()?),
            Self::MatrixComplex(m) => m.update_linear(i, value.scalar_as()?),
            other => Err(invalid(format!("{} cannot be updated", other.kind()))),
        }
    }

    /// Store `value` at 1-based `(row, col)`, growing the matrix as needed.
    ///
    /// # Errors
    ///
    /// Same as [`Variant::update`]; only matrices have two indices.
    pub fn update2(&mut self, row: &Variant, col: &Variant, value: Variant) -> Result<()> {
        let (r, c) = (scalar_index(row)?, scalar_index(col)?);
        self.promote_for(&value)?;
        match self {
            Self::MatrixBoolean(m) => m.update(r, c, value.scalar_as()?),
            Self::MatrixInteger(m) => m.update(r, c, value.scalar_as()?),
            Self::MatrixReal(m) => m.update(r, c, value.scalar_as()?),
            Self::MatrixComplex(m) => m.update(r, c, value.scalar_as()?),
            other => Err(invalid(format!("{} has no rows and columns", other.kind()))),
        }
    }

    fn promote_for(&mut self, value: &Variant) -> Result<()> {
        if !self.is_matrix() {
            return Err(invalid(format!("{} cannot be updated", self.kind())));
        }
        if !value.is_scalar() {
            return Err(invalid(format!(
                "a {} cannot be stored in a matrix",
                value.kind()
            )));
        }
        let target = best_upcast(self.kind(), value.kind());
        if target != self.kind() {
            *self = self.to_matrix_kind(target)?;
        }
        Ok(())
    }
}

fn compare_numeric((ra, ia): (RealPart, f64), (rb, ib): (RealPart, f64)) -> Option<Ordering> {
    let real = match (ra, rb) {
        (RealPart::Integer(a), RealPart::Integer(b)) => Some(a.cmp(&b)),
        (RealPart::Integer(a), RealPart::Real(b)) => compare_integer_real(a, b),
        (RealPart::Real(a), RealPart::Integer(b)) => compare_integer_real(b, a).map(Ordering::reverse),
        (RealPart::Real(a), RealPart::Real(b)) => a.partial_cmp(&b),
    }?;
    match real {
        Ordering::Equal => ia.partial_cmp(&ib),
        other => Some(other),
    }
}

/// Total order used for sorting mixed values.
///
/// Numbers come first (NaN after every other number), then tuples, sets,
/// ranges, matrices and finally `None`. Each block is ordered within
/// itself.
pub(crate) fn total_order(a: &Variant, b: &Variant) -> Ordering {
    let (ba, bb) = (a.block(), b.block());
    if ba != bb {
        return ba.cmp(&bb);
    }
    match (a, b) {
        (Variant::Tuple(x), Variant::Tuple(y)) => sequence_order(x.as_slice(), y.as_slice()),
        (Variant::Set(x), Variant::Set(y)) => x
            .size()
            .cmp(&y.size())
            .then_with(|| sequence_order(&x.sorted(), &y.sorted())),
        (Variant::Range(x), Variant::Range(y)) => {
            sequence_order(&x.iter().collect::<Vec<_>>(), &y.iter().collect::<Vec<_>>())
        }
        (x, y) if x.is_matrix() => {
            let (sx, ex) = x.matrix_parts();
            let (sy, ey) = y.matrix_parts();
            sx.cmp(&sy).then_with(|| sequence_order(&ex, &ey))
        }
        (x, y) => match (x.numeric_parts(), y.numeric_parts()) {
            (Some(p), Some(q)) => compare_numeric(p, q).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

fn sequence_order(a: &[Variant], b: &[Variant]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| total_order(x, y))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.numeric_parts(), other.numeric_parts()) {
            return compare_numeric(a, b) == Some(Ordering::Equal);
        }
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Range(a), Self::Range(b)) => {
                a.size() == b.size() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (a, b) if a.is_matrix() && b.is_matrix() => a.matrix_parts() == b.matrix_parts(),
            _ => false,
        }
    }
}

impl PartialOrd for Variant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.relative_order(other).ok()
    }
}

// ============================================================
// Conversions into Variant
// ============================================================

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for Variant {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<Complex64> for Variant {
    fn from(v: Complex64) -> Self {
        Self::Complex(v)
    }
}

impl From<Set> for Variant {
    fn from(v: Set) -> Self {
        Self::Set(v)
    }
}

impl From<Tuple> for Variant {
    fn from(v: Tuple) -> Self {
        Self::Tuple(v)
    }
}

impl From<Range> for Variant {
    fn from(v: Range) -> Self {
        Self::Range(v)
    }
}

impl<T: Coefficient> From<Matrix<T>> for Variant {
    fn from(m: Matrix<T>) -> Self {
        T::wrap(m)
    }
}

impl From<&str> for Variant {
    fn from(s: &str) -> Self {
        Self::Tuple(Tuple::from(s))
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(x) => write!(f, "{x}"),
            Self::Complex(z) if z.im.is_sign_negative() => write!(f, "{}-{}i", z.re, -z.im),
            Self::Complex(z) => write!(f, "{}+{}i", z.re, z.im),
            Self::Set(s) => write!(f, "{s}"),
            Self::Tuple(t) => write!(f, "{t}"),
            Self::Range(r) => write!(f, "{r}"),
            Self::MatrixBoolean(m) => write!(f, "{m}"),
            Self::MatrixInteger(m) => write!(f, "{m}"),
            Self::MatrixReal(m) => write!(f, "{m}"),
            Self::MatrixComplex(m) => write!(f, "{m}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Variant {
        Variant::Complex(Complex64::new(re, im))
    }

    #[test]
    fn test_fuzzy_equality() {
        assert_eq!(Variant::Integer(5), Variant::Real(5.0));
        assert_eq!(Variant::Real(5.0), c(5.0, 0.0));
        assert_eq!(Variant::Boolean(true), Variant::Integer(1));
        assert_ne!(Variant::Integer(5), c(5.0, 1.0));
        assert_ne!(Variant::Real(f64::NAN), Variant::Real(f64::NAN));
        assert_ne!(Variant::Set(Set::new()), Variant::MatrixReal(MatrixReal::zero(0, 0)));
        assert_eq!(Variant::None, Variant::None);
        assert_eq!(Variant::Integer(i64::MAX), Variant::Integer(i64::MAX));
        assert_ne!(Variant::Integer(i64::MAX), Variant::Real(i64::MAX as f64));
    }

    #[test]
    fn test_hash_matches_equality() {
        let same = [
            Variant::Integer(1),
            Variant::Real(1.0),
            c(1.0, 0.0),
            Variant::Boolean(true),
        ];
        for v in &same {
            assert_eq!(v.fuzzy_hash(), same[0].fuzzy_hash());
        }
        assert_eq!(Variant::Real(0.0).fuzzy_hash(), Variant::Real(-0.0).fuzzy_hash());

        let m = Variant::from(MatrixInteger::identity(2));
        let r = Variant::from(MatrixReal::identity(2));
        assert_eq!(m, r);
        assert_eq!(m.fuzzy_hash(), r.fuzzy_hash());

        let a = Variant::Range(Range::integer(1, Some(3), 6));
        let b = Variant::Range(Range::integer(1, Some(3), 5));
        assert_eq!(a, b);
        assert_eq!(a.fuzzy_hash(), b.fuzzy_hash());
    }

    #[test]
    fn test_relative_order() {
        assert_eq!(Variant::Integer(2).relative_order(&Variant::Real(2.5)).unwrap(), Ordering::Less);
        assert_eq!(c(1.0, 2.0).relative_order(&c(1.0, -1.0)).unwrap(), Ordering::Greater);
        assert!(Variant::Integer(1).relative_order(&Variant::Real(f64::NAN)).is_err());
        assert!(matches!(
            Variant::Integer(1).relative_order(&Variant::Tuple(Tuple::new())),
            Err(ModelError::TypeConversionError {
                left: ValueKind::Integer,
                right: ValueKind::Tuple
            })
        ));
        let small = Variant::from(MatrixInteger::zero(1, 2));
        let big = Variant::from(MatrixReal::ones(1, 2));
        assert_eq!(small.relative_order(&big).unwrap(), Ordering::Less);
        assert!(small.relative_order(&Variant::from(MatrixReal::ones(2, 1))).is_err());
        assert!(Variant::Integer(1) < Variant::Real(1.5));
    }

    #[test]
    fn test_total_order_blocks() {
        let mut v = vec![
            Variant::Tuple(Tuple::from_vec(vec![Variant::Integer(1)])),
            Variant::Real(f64::NAN),
            Variant::Real(2.5),
            Variant::Set(Set::new()),
            Variant::Boolean(true),
            Variant::Integer(-3),
        ];
        v.sort_by(total_order);
        assert_eq!(v[0], Variant::Integer(-3));
        assert_eq!(v[1], Variant::Boolean(true));
        assert_eq!(v[2], Variant::Real(2.5));
        assert!(v[3].is_nan());
        assert_eq!(v[4].kind(), ValueKind::Tuple);
        assert_eq!(v[5].kind(), ValueKind::Set);
    }

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(Variant::Real(3.0).to_integer().unwrap(), 3);
        assert!(matches!(
            Variant::Real(3.5).to_integer(),
            Err(ModelError::InvalidRuntimeConversion {
                from: ValueKind::Real,
                to: ValueKind::Integer
            })
        ));
        assert_eq!(c(2.0, 0.0).to_real().unwrap(), 2.0);
        assert!(c(2.0, 1.0).to_real().is_err());
        assert!(Variant::Integer(1).to_boolean().unwrap());
        assert!(Variant::Integer(2).to_boolean().is_err());
        assert!(Variant::Tuple(Tuple::new()).to_real().is_err());
        assert_eq!(Variant::Boolean(true).to_complex().unwrap(), Complex64::new(1.0, 0.0));
        assert!(Variant::Real(3.5).to_integer().ok().is_none());
    }

    #[test]
    fn test_container_conversions() {
        let r = Variant::Range(Range::integer(1, None, 3));
        assert_eq!(r.to_tuple().unwrap().len(), 3);
        assert_eq!(r.to_set().unwrap().size(), Some(3));
        let m = r.to_matrix_real().unwrap();
        assert_eq!(m.shape(), (3, 1));
        assert_eq!(m.to_vec(), vec![1.0, 2.0, 3.0]);
        assert!(Variant::Real(0.5).to_matrix_integer().is_err());
        assert_eq!(Variant::Integer(7).to_matrix_complex().unwrap().shape(), (1, 1));
        assert!(Variant::None.to_tuple().is_err());
        let universe = Variant::Set(crate::set::universe(crate::set::Universe::Real).clone());
        assert!(universe.to_tuple().is_err());
    }

    #[test]
    fn test_scalar_arithmetic() {
        assert_eq!(
            Variant::Boolean(true).try_add(&Variant::Boolean(true)).unwrap().kind(),
            ValueKind::Integer
        );
        let q = Variant::Integer(7).try_div(&Variant::Integer(2)).unwrap();
        assert!(matches!(q, Variant::Real(x) if x == 3.5));
        assert!(matches!(
            Variant::Integer(i64::MAX).try_add(&Variant::Integer(1)).unwrap(),
            Variant::Integer(i64::MIN)
        ));
        assert_eq!(
            Variant::Integer(2).try_mul(&c(0.0, 1.0)).unwrap(),
            c(0.0, 2.0)
        );
        assert_eq!(Variant::Real(1.5).try_sub(&Variant::Integer(1)).unwrap(), Variant::Real(0.5));
        assert_eq!(Variant::Boolean(true).try_neg().unwrap(), Variant::Integer(-1));
        assert!(matches!(
            Variant::Set(Set::new()).try_add(&Variant::Integer(1)),
            Err(ModelError::TypeConversionError { .. })
        ));
    }

    #[test]
    fn test_tuple_arithmetic() {
        let a = Variant::from("ab");
        let b = Variant::from("cd");
        let ab = a.try_mul(&b).unwrap();
        assert_eq!(ab, Variant::from("abcd"));
        assert_eq!(ab.try_div(&b).unwrap(), a);
        assert!(a.try_add(&b).is_err());
    }

    #[test]
    fn test_matrix_arithmetic_promotes() {
        let i = Variant::from(MatrixInteger::identity(2));
        let r = Variant::from(MatrixReal::ones(2, 2));
        let sum = i.try_add(&r).unwrap();
        assert_eq!(sum.kind(), ValueKind::MatrixReal);
        assert_eq!(sum, Variant::from(MatrixReal::build(2, 2, &[2.0, 1.0, 1.0, 2.0]).unwrap()));

        let scaled = Variant::Real(0.5).try_mul(&i).unwrap();
        assert_eq!(scaled.kind(), ValueKind::MatrixReal);
        let halved = i.try_div(&Variant::Integer(2)).unwrap();
        assert_eq!(halved, scaled);

        let b = Variant::from(crate::matrix::MatrixBoolean::identity(2));
        assert_eq!(b.try_add(&b).unwrap().kind(), ValueKind::MatrixInteger);
        assert!(i.try_add(&Variant::Integer(1)).is_err());
        assert!(matches!(
            i.try_mul(&Variant::from(MatrixInteger::zero(3, 3))),
            Err(ModelError::IncompatibleMatrixDimensions { .. })
        ));
    }

    #[test]
    fn test_indexing() {
        let t = Variant::from("abc");
        assert_eq!(t.at(&Variant::Integer(2)).unwrap(), Variant::Integer('b' as i64));
        assert!(matches!(
            Variant::Integer(1).at(&Variant::Integer(1)),
            Err(ModelError::InvalidParameterValue(_))
        ));
        let m = Variant::from(MatrixInteger::build(2, 2, &[1, 2, 3, 4]).unwrap());
        assert_eq!(m.at2(&Variant::Integer(1), &Variant::Integer(2)).unwrap(), Variant::Integer(3));
        assert!(t.at2(&Variant::Integer(1), &Variant::Integer(1)).is_err());
    }

    #[test]
    fn test_update_promotes_and_grows() {
        let mut m = Variant::from(MatrixInteger::identity(2));
        m.update2(&Variant::Integer(3), &Variant::Integer(3), Variant::Real(2.5))
            .unwrap();
        assert_eq!(m.kind(), ValueKind::MatrixReal);
        assert_eq!(m.at2(&Variant::Integer(3), &Variant::Integer(3)).unwrap(), Variant::Real(2.5));
        assert_eq!(m.at2(&Variant::Integer(1), &Variant::Integer(1)).unwrap(), Variant::Real(1.0));

        let mut t = Variant::Tuple(Tuple::new());
        t.update(&Variant::Integer(2), Variant::Real(1.0)).unwrap();
        assert_eq!(t.to_tuple().unwrap().len(), 2);

        let mut s = Variant::Set(Set::new());
        assert!(matches!(
            s.update(&Variant::Integer(1), Variant::Integer(1)),
            Err(ModelError::InvalidParameterValue(_))
        ));
        assert!(m
            .update(&Variant::Integer(1), Variant::Tuple(Tuple::new()))
            .is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Variant::Boolean(true).to_string(), "true");
        assert_eq!(c(1.0, -2.0).to_string(), "1-2i");
        assert_eq!(c(1.5, 2.0).to_string(), "1.5+2i");
        assert_eq!(Variant::from("A").to_string(), "[65]");
        assert_eq!(Variant::None.to_string(), "None");
    }
}
