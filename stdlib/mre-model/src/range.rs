//! Arithmetic progressions
//!
//! A [`Range`] is `first, first + increment, ..., ` up to `last`, over either
//! Integer or Real values. It is a value type: copies are independent and no
//! payload is shared.
//!
//! The step count is `1 + floor((last - first) / increment)` for a non-zero
//! increment whose sign agrees with `last - first`, zero when the signs
//! disagree, and one for a zero increment. Real ranges widen the quotient by
//! a relative `8 eps` so that `Range::real(0.0, Some(0.1), 1.0)` reaches
//! `1.0`.

use std::fmt;

use crate::error::{ModelError, RangePosition, Result};
use crate::kind::ValueKind;
use crate::scalar::real_to_integer;
use crate::variant::Variant;

const FUZZ: f64 = 8.0 * f64::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Bounds {
    Integer { first: i64, increment: i64, last: i64 },
    Real { first: f64, increment: f64, last: f64 },
}

/// An Integer or Real arithmetic progression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    bounds: Bounds,
    steps: u64,
}

impl Range {
    /// Build a range from variant endpoints.
    ///
    /// `second` fixes the increment; when absent it is `first + 1` if
    /// `first < last` and `first - 1` otherwise. The range is Real if any
    /// endpoint is Real.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRangeParameter`] naming the first
    /// endpoint that is neither Integer nor Real.
    pub fn new(first: &Variant, second: Option<&Variant>, last: &Variant) -> Result<Self> {
        let check = |position, v: &Variant| match v.kind() {
            ValueKind::Integer | ValueKind::Real => Ok(()),
            kind => Err(ModelError::InvalidRangeParameter { position, kind }),
        };
        check(RangePosition::First, first)?;
        if let Some(s) = second {
            check(RangePosition::Second, s)?;
        }
        check(RangePosition::Last, last)?;

        match (first, second, last) {
            (Variant::Integer(f), None, Variant::Integer(l)) => Ok(Self::integer(*f, None, *l)),
            (Variant::Integer(f), Some(Variant::Integer(s)), Variant::Integer(l)) => {
                Ok(Self::integer(*f, Some(*s), *l))
            }
            _ => {
                let real = |v: &Variant| match v {
                    Variant::Integer(i) => *i as f64,
                    Variant::Real(x) => *x,
                    _ => f64::NAN,
                };
                Ok(Self::real(real(first), second.map(real), real(last)))
            }
        }
    }

    /// Integer range.
    #[must_use]
    pub fn integer(first: i64, second: Option<i64>, last: i64) -> Self {
        let second = second.unwrap_or(if first < last {
            first.wrapping_add(1)
        } else {
            first.wrapping_sub(1)
        });
        let increment = second.wrapping_sub(first);
        let span = i128::from(last) - i128::from(first);
        let steps = if increment == 0 {
            1
        } else if span != 0 && span.signum() != i128::from(increment.signum()) {
            0
        } else {
            let q = span / i128::from(increment);
            u64::try_from(q + 1).unwrap_or(u64::MAX)
        };
        Self {
            bounds: Bounds::Integer {
                first,
                increment,
                last,
            },
            steps,
        }
    }

    /// Real range. Non-finite endpoints give an empty range.
    #[must_use]
    pub fn real(first: f64, second: Option<f64>, last: f64) -> Self {
        let second = second.unwrap_or(if first < last { first + 1.0 } else { first - 1.0 });
        let increment = second - first;
        let span = last - first;
        let steps = if !(first.is_finite() && second.is_finite() && last.is_finite()) {
            0
        } else if increment == 0.0 {
            1
        } else if span != 0.0 && span.signum() != increment.signum() {
            0
        } else {
            let q = span / increment;
            let q = (q + q.abs() * FUZZ).floor();
            if q >= u64::MAX as f64 {
                u64::MAX
            } else {
                q as u64 + 1
            }
        };
        Self {
            bounds: Bounds::Real {
                first,
                increment,
                last,
            },
            steps,
        }
    }

    /// True for an Integer range.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(self.bounds, Bounds::Integer { .. })
    }

    /// Number of values.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.steps
    }

    /// True when the range has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps == 0
    }

    /// First value.
    #[must_use]
    pub fn first(&self) -> Variant {
        match self.bounds {
            Bounds::Integer { first, .. } => Variant::Integer(first),
            Bounds::Real { first, .. } => Variant::Real(first),
        }
    }

    /// Second value, `first + increment`.
    #[must_use]
    pub fn second(&self) -> Variant {
        match self.bounds {
            Bounds::Integer {
                first, increment, ..
            } => Variant::Integer(first.wrapping_add(increment)),
            Bounds::Real {
                first, increment, ..
            } => Variant::Real(first + increment),
        }
    }

    /// Last value actually reached, or the requested bound when the range is
    /// empty.
    #[must_use]
    pub fn last(&self) -> Variant {
        match self.steps.checked_sub(1) {
            Some(i) => self.value_at(i),
            None => match self.bounds {
                Bounds::Integer { last, .. } => Variant::Integer(last),
                Bounds::Real { last, .. } => Variant::Real(last),
            },
        }
    }

    /// Difference between consecutive values.
    #[must_use]
    pub fn increment(&self) -> Variant {
        match self.bounds {
            Bounds::Integer { increment, .. } => Variant::Integer(increment),
            Bounds::Real { increment, .. } => Variant::Real(increment),
        }
    }

    /// Zero-based `i`-th value. `i` must be below [`size`](Self::size).
    pub(crate) fn value_at(&self, i: u64) -> Variant {
        match self.bounds {
            Bounds::Integer {
                first, increment, ..
            } => {
                let v = i128::from(first) + i128::from(i) * i128::from(increment);
                Variant::Integer(v as i64)
            }
            Bounds::Real {
                first,
                increment,
                last,
            } => {
                let v = first + i as f64 * increment;
                let scale = v.abs().max(last.abs()).max(increment.abs());
                if i + 1 == self.steps && (v - last).abs() <= FUZZ * scale {
                    Variant::Real(last)
                } else {
                    Variant::Real(v)
                }
            }
        }
    }

    /// `i`-th value as a Real, for numeric kernels.
    pub(crate) fn real_at(&self, i: u64) -> f64 {
        match self.value_at(i) {
            Variant::Integer(v) => v as f64,
            Variant::Real(v) => v,
            _ => f64::NAN,
        }
    }

    /// Membership: `v == first + k * increment` for some `k` in
    /// `[0, size)`.
    ///
    /// Booleans count as 0/1 and Complex values must have a zero imaginary
    /// part. Non-numeric values are never members.
    #[must_use]
    pub fn contains(&self, v: &Variant) -> bool {
        if self.steps == 0 {
            return false;
        }
        let x = match v {
            Variant::Boolean(b) => Numeric::Integer(i64::from(*b)),
            Variant::Integer(i) => Numeric::Integer(*i),
            Variant::Real(x) => Numeric::Real(*x),
            Variant::Complex(z) if z.im == 0.0 => Numeric::Real(z.re),
            _ => return false,
        };
        match (self.bounds, x) {
            (Bounds::Integer { .. }, Numeric::Real(x)) => match real_to_integer(x) {
                Some(i) => self.contains_integer(i),
                None => false,
            },
            (Bounds::Integer { .. }, Numeric::Integer(i)) => self.contains_integer(i),
            (Bounds::Real { .. }, Numeric::Integer(i)) => self.contains_real(i as f64),
            (Bounds::Real { .. }, Numeric::Real(x)) => self.contains_real(x),
        }
    }

    fn contains_integer(&self, x: i64) -> bool {
        let Bounds::Integer {
            first, increment, ..
        } = self.bounds
        else {
            return false;
        };
        let d = i128::from(x) - i128::from(first);
        if increment == 0 {
            return d == 0;
        }
        let inc = i128::from(increment);
        d % inc == 0 && (0..i128::from(self.steps)).contains(&(d / inc))
    }

    fn contains_real(&self, x: f64) -> bool {
        let Bounds::Real {
            first, increment, ..
        } = self.bounds
        else {
            return false;
        };
        if !x.is_finite() {
            return false;
        }
        if increment == 0.0 {
            return x == first;
        }
        let k = ((x - first) / increment).round();
        if k < 0.0 || k >= self.steps as f64 {
            return false;
        }
        let v = self.real_at(k as u64);
        let scale = x.abs().max(first.abs()).max((k * increment).abs());
        (v - x).abs() <= FUZZ * scale
    }

    /// Iterate the values in order.
    #[must_use]
    pub fn iter(&self) -> RangeIter {
        RangeIter {
            range: *self,
            front: 0,
            back: self.steps,
        }
    }

    /// Cursor positioned on the first value.
    #[must_use]
    pub fn cursor(&self) -> RangeCursor {
        RangeCursor {
            range: *self,
            index: 0,
        }
    }

    /// Cursor positioned one past the last value.
    #[must_use]
    pub fn end_cursor(&self) -> RangeCursor {
        RangeCursor {
            range: *self,
            index: self.steps,
        }
    }
}

enum Numeric {
    Integer(i64),
    Real(f64),
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds {
            Bounds::Integer {
                first,
                increment,
                last,
            } => write!(f, "[{first}, {} .. {last}]", first.wrapping_add(increment)),
            Bounds::Real {
                first,
                increment,
                last,
            } => write!(f, "[{first}, {} .. {last}]", first + increment),
        }
    }
}

/// Iterator over the values of a [`Range`].
#[derive(Debug, Clone)]
pub struct RangeIter {
    range: Range,
    front: u64,
    back: u64,
}

impl Iterator for RangeIter {
    type Item = Variant;

    fn next(&mut self) -> Option<Variant> {
        if self.front >= self.back {
            return None;
        }
        let v = self.range.value_at(self.front);
        self.front += 1;
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.back - self.front).unwrap_or(usize::MAX);
        (n, Some(n))
    }
}

impl DoubleEndedIterator for RangeIter {
    fn next_back(&mut self) -> Option<Variant> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.range.value_at(self.back))
    }
}

impl ExactSizeIterator for RangeIter {}

impl IntoIterator for Range {
    type Item = Variant;
    type IntoIter = RangeIter;

    fn into_iter(self) -> RangeIter {
        self.iter()
    }
}

impl IntoIterator for &Range {
    type Item = Variant;
    type IntoIter = RangeIter;

    fn into_iter(self) -> RangeIter {
        self.iter()
    }
}

/// Random-access position inside a [`Range`].
///
/// The end position is `index == size` and carries no value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeCursor {
    range: Range,
    index: u64,
}

impl RangeCursor {
    /// Move forward by `d` positions, stopping at the end.
    pub fn advance(&mut self, d: u64) {
        self.index = self.index.saturating_add(d).min(self.range.steps);
    }

    /// Move backward by `d` positions, stopping at the first value.
    pub fn backup(&mut self, d: u64) {
        self.index = self.index.saturating_sub(d);
    }

    /// Current value, or `None` at the end.
    #[must_use]
    pub fn value(&self) -> Option<Variant> {
        self.is_valid().then(|| self.range.value_at(self.index))
    }

    /// Zero-based position.
    #[must_use]
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Index difference `self - other`.
    #[must_use]
    pub fn distance(&self, other: &Self) -> i64 {
        (i128::from(self.index) - i128::from(other.index)) as i64
    }

    /// True while the cursor is on a value.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.index < self.range.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(r: &Range) -> Vec<i64> {
        r.iter()
            .map(|v| match v {
                Variant::Integer(i) => i,
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_odd_numbers() {
        let r = Range::integer(1, Some(3), 7);
        assert_eq!(r.size(), 4);
        assert_eq!(ints(&r), vec![1, 3, 5, 7]);
        assert!(r.contains(&Variant::Integer(5)));
        assert!(!r.contains(&Variant::Integer(4)));
        assert!(!r.contains(&Variant::Integer(9)));
        assert!(r.contains(&Variant::Real(3.0)));
        assert!(!r.contains(&Variant::Real(3.5)));
    }

    #[test]
    fn test_default_second() {
        assert_eq!(ints(&Range::integer(1, None, 4)), vec![1, 2, 3, 4]);
        assert_eq!(ints(&Range::integer(4, None, 1)), vec![4, 3, 2, 1]);
        assert_eq!(ints(&Range::integer(2, None, 2)), vec![2]);
    }

    #[test]
    fn test_last_not_on_lattice() {
        let r = Range::integer(1, Some(3), 8);
        assert_eq!(ints(&r), vec![1, 3, 5, 7]);
        assert_eq!(r.last(), Variant::Integer(7));
    }

    #[test]
    fn test_empty_and_degenerate() {
        let r = Range::integer(1, Some(0), 5);
        assert!(r.is_empty());
        assert!(!r.contains(&Variant::Integer(1)));
        let r = Range::integer(3, Some(3), 9);
        assert_eq!(ints(&r), vec![3]);
        assert!(Range::real(f64::NAN, None, 1.0).is_empty());
    }

    #[test]
    fn test_real_fuzz_reaches_last() {
        let r = Range::real(0.0, Some(0.1), 1.0);
        assert_eq!(r.size(), 11);
        assert_eq!(r.last(), Variant::Real(1.0));
        assert!(r.contains(&Variant::Real(0.3)));
        assert!(r.contains(&Variant::Integer(1)));
        assert!(!r.contains(&Variant::Real(0.35)));
    }

    #[test]
    fn test_new_rejects_kinds() {
        let err = Range::new(&Variant::Integer(1), Some(&Variant::Boolean(true)), &Variant::Integer(3))
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::InvalidRangeParameter {
                position: RangePosition::Second,
                kind: ValueKind::Boolean
            }
        ));
        let err = Range::new(&Variant::Integer(1), None, &Variant::None).unwrap_err();
        assert!(matches!(
            err,
            ModelError::InvalidRangeParameter {
                position: RangePosition::Last,
                ..
            }
        ));
    }

    #[test]
    fn test_new_mixed_is_real() {
        let r = Range::new(&Variant::Integer(1), None, &Variant::Real(2.5)).unwrap();
        assert!(!r.is_integer());
        assert_eq!(r.size(), 2);
    }

    #[test]
    fn test_cursor() {
        let r = Range::integer(10, Some(20), 50);
        let mut c = r.cursor();
        assert_eq!(c.value(), Some(Variant::Integer(10)));
        c.advance(3);
        assert_eq!(c.value(), Some(Variant::Integer(40)));
        let end = r.end_cursor();
        assert_eq!(end.distance(&c), 2);
        assert!(!end.is_valid());
        assert_eq!(end.value(), None);
        c.advance(10);
        assert_eq!(c, end);
        c.backup(5);
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn test_reverse_iteration() {
        let r = Range::integer(1, Some(3), 7);
        let back: Vec<Variant> = r.iter().rev().collect();
        assert_eq!(back[0], Variant::Integer(7));
        assert_eq!(back.len(), 4);
    }
}
