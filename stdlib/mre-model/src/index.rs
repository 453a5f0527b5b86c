//! Decoding of variant-valued indices.
//!
//! Indices are 1-based. A scalar index names one position; a range, set,
//! tuple or matrix names a list of positions visited in the container's
//! natural order. Real and Complex indices are coerced to the nearest
//! integer when they are within a few ulps of it.

use crate::error::{invalid, Result};
use crate::variant::Variant;

/// A decoded index.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Index {
    /// A single position.
    Scalar(i64),
    /// Several positions. `shape` is set when the index was a matrix.
    List {
        positions: Vec<i64>,
        shape: Option<(usize, usize)>,
    },
}

impl Index {
    pub(crate) fn from_variant(v: &Variant) -> Result<Self> {
        if let Ok(i) = scalar_index(v) {
            return Ok(Self::Scalar(i));
        }
        let shape = match v {
            Variant::MatrixBoolean(m) => Some(m.shape()),
            Variant::MatrixInteger(m) => Some(m.shape()),
            Variant::MatrixReal(m) => Some(m.shape()),
            Variant::MatrixComplex(m) => Some(m.shape()),
            Variant::Range(_) | Variant::Set(_) | Variant::Tuple(_) => None,
            other => return Err(invalid(format!("{} cannot be used as an index", other.kind()))),
        };
        if matches!(v, Variant::MatrixBoolean(_)) {
            return Err(invalid("boolean matrices cannot be used as an index"));
        }
        let positions = v
            .elements()?
            .iter()
            .map(scalar_index)
            .collect::<Result<Vec<i64>>>()?;
        Ok(Self::List { positions, shape })
    }
}

/// Coerce a scalar variant to a 1-based position.
pub(crate) fn scalar_index(v: &Variant) -> Result<i64> {
    match v {
        Variant::Integer(i) => Ok(*i),
        Variant::Real(x) => fuzzy_integer(*x),
        Variant::Complex(z) if z.im == 0.0 => fuzzy_integer(z.re),
        other => Err(invalid(format!("{} is not an integer index", other.kind()))),
    }
}

fn fuzzy_integer(x: f64) -> Result<i64> {
    let r = x.round();
    let tol = 8.0 * f64::EPSILON * x.abs().max(1.0);
    if x.is_finite() && (x - r).abs() <= tol && r.abs() < 9.2e18 {
        Ok(r as i64)
    } else {
        Err(invalid(format!("{x} is not an integer index")))
    }
}

/// Convert a 1-based position to a 0-based offset inside `[0, size)`.
pub(crate) fn offset(index: i64, size: usize) -> Result<usize> {
    match usize::try_from(index) {
        Ok(i) if i >= 1 && i <= size => Ok(i - 1),
        _ => Err(crate::ModelError::InvalidIndex {
            index,
            size: size as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Range, Tuple};

    #[test]
    fn test_scalar_coercion() {
        assert_eq!(scalar_index(&Variant::Integer(3)).unwrap(), 3);
        assert_eq!(scalar_index(&Variant::Real(3.0000000000000004)).unwrap(), 3);
        assert!(scalar_index(&Variant::Real(2.5)).is_err());
        assert!(scalar_index(&Variant::Boolean(true)).is_err());
    }

    #[test]
    fn test_list() {
        let r = Variant::Range(Range::integer(1, Some(3), 7));
        assert_eq!(
            Index::from_variant(&r).unwrap(),
            Index::List {
                positions: vec![1, 3, 5, 7],
                shape: None
            }
        );
        let t = Variant::Tuple(Tuple::from_vec(vec![Variant::Integer(2), Variant::Real(1.0)]));
        assert_eq!(
            Index::from_variant(&t).unwrap(),
            Index::List {
                positions: vec![2, 1],
                shape: None
            }
        );
    }

    #[test]
    fn test_offset() {
        assert_eq!(offset(1, 3).unwrap(), 0);
        assert_eq!(offset(3, 3).unwrap(), 2);
        assert!(offset(0, 3).is_err());
        assert!(offset(4, 3).is_err());
        assert!(offset(-1, 3).is_err());
    }
}
