//! Unordered collections of variants
//!
//! A finite [`Set`] keeps its elements in insertion order next to a hash
//! index keyed by [`Variant::fuzzy_hash`], so membership follows the fuzzy
//! variant equality (`1`, `1.0` and `true` are the same element). The
//! payload is copy-on-write.
//!
//! The universe sets ([`Universe`]) are predicates over a whole kind rather
//! than enumerations. They are process-wide singletons created on first use.
//!
//! # Set algebra
//!
//! - [`union_of`], [`intersection_of`], [`relative_complement_of`],
//!   [`symmetric_difference_of`]
//! - [`disjoint_union_of`] - tags every element with its source index
//! - [`cartesian_product_of`], [`cartesian_product_of_all`]

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use mre_rts_cow::Shared;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{invalid, Result};
use crate::scalar::real_to_integer;
use crate::tuple::Tuple;
use crate::variant::{total_order, Variant};

/// The universe sets, in lattice order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Universe {
    /// `{false, true}`, together with the numbers equal to them.
    Boolean,
    /// Every integral numeric value, Booleans included.
    Integer,
    /// Every numeric value with a zero imaginary part.
    Real,
    /// Every numeric value.
    Complex,
}

impl Universe {
    /// True if `v` belongs to this universe.
    #[must_use]
    pub fn admits(self, v: &Variant) -> bool {
        match (self, v) {
            (Self::Boolean, v) => BOOLEAN_MEMBERS.iter().any(|b| b == v),
            (_, Variant::Boolean(_) | Variant::Integer(_)) => true,
            (Self::Integer, Variant::Real(x)) => real_to_integer(*x).is_some(),
            (Self::Integer, Variant::Complex(z)) => z.im == 0.0 && real_to_integer(z.re).is_some(),
            (Self::Real, Variant::Real(_)) => true,
            (Self::Real, Variant::Complex(z)) => z.im == 0.0,
            (Self::Complex, Variant::Real(_) | Variant::Complex(_)) => true,
            _ => false,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "BooleanSet",
            Self::Integer => "IntegerSet",
            Self::Real => "RealSet",
            Self::Complex => "ComplexSet",
        }
    }
}

static UNIVERSES: OnceLock<[Set; 4]> = OnceLock::new();

static BOOLEAN_MEMBERS: [Variant; 2] = [Variant::Boolean(false), Variant::Boolean(true)];

/// The shared universe-set singleton for `u`.
#[must_use]
pub fn universe(u: Universe) -> &'static Set {
    let all = UNIVERSES.get_or_init(|| {
        [Universe::Boolean, Universe::Integer, Universe::Real, Universe::Complex].map(|u| Set {
            inner: Inner::Universe(u),
        })
    });
    &all[u as usize]
}

#[derive(Clone, Default)]
struct Store {
    elements: Vec<Variant>,
    buckets: FxHashMap<u64, SmallVec<[usize; 2]>>,
}

/// Element identity inside a set: fuzzy equality, with all NaNs one element.
fn same_element(a: &Variant, b: &Variant) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl Store {
    fn position(&self, v: &Variant) -> Option<usize> {
        self.buckets
            .get(&v.fuzzy_hash())?
            .iter()
            .copied()
            .find(|&i| same_element(&self.elements[i], v))
    }

    fn insert(&mut self, v: Variant) -> bool {
        let hash = v.fuzzy_hash();
        let bucket = self.buckets.entry(hash).or_default();
        if bucket.iter().any(|&i| same_element(&self.elements[i], &v)) {
            return false;
        }
        bucket.push(self.elements.len());
        self.elements.push(v);
        true
    }

    fn remove(&mut self, v: &Variant) -> bool {
        let Some(at) = self.position(v) else {
            return false;
        };
        let hash = v.fuzzy_hash();
        if let Some(bucket) = self.buckets.get_mut(&hash) {
            bucket.retain(|i| *i != at);
            if bucket.is_empty() {
                self.buckets.remove(&hash);
            }
        }
        let last = self.elements.len() - 1;
        self.elements.swap_remove(at);
        if at != last {
            let moved = self.elements[at].fuzzy_hash();
            if let Some(bucket) = self.buckets.get_mut(&moved) {
                for i in bucket.iter_mut().filter(|i| **i == last) {
                    *i = at;
                }
            }
        }
        true
    }
}

#[derive(Clone)]
enum Inner {
    Finite(Shared<Store>),
    Universe(Universe),
}

/// Unordered, copy-on-write collection of distinct variants.
#[derive(Clone)]
pub struct Set {
    inner: Inner,
}

impl Default for Set {
    fn default() -> Self {
        Self::new()
    }
}

impl Set {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Inner::Finite(Shared::default()),
        }
    }

    /// The universe this set stands for, if any.
    #[must_use]
    pub fn universe_kind(&self) -> Option<Universe> {
        match self.inner {
            Inner::Universe(u) => Some(u),
            Inner::Finite(_) => None,
        }
    }

    /// True for an enumerable set, including `BooleanSet`.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.finite_view().is_some()
    }

    /// Elements of an enumerable set.
    fn finite_view(&self) -> Option<&[Variant]> {
        match &self.inner {
            Inner::Finite(store) => Some(&store.elements),
            Inner::Universe(Universe::Boolean) => Some(&BOOLEAN_MEMBERS),
            Inner::Universe(_) => None,
        }
    }

    /// Number of elements, or `None` for an infinite universe.
    #[must_use]
    pub fn size(&self) -> Option<usize> {
        self.finite_view().map(<[Variant]>::len)
    }

    /// True for the empty set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == Some(0)
    }

    /// Iterate the elements in a stable order. Infinite universes yield
    /// nothing; check [`is_finite`](Self::is_finite) first.
    pub fn iter(&self) -> std::slice::Iter<'_, Variant> {
        self.finite_view().unwrap_or(&[]).iter()
    }

    /// Elements as a vector.
    ///
    /// # Errors
    ///
    /// Fails for an infinite universe.
    pub fn to_vec(&self) -> Result<Vec<Variant>> {
        self.finite_view()
            .map(<[Variant]>::to_vec)
            .ok_or_else(|| invalid(format!("{self} cannot be enumerated")))
    }

    /// True if `v` is an element.
    #[must_use]
    pub fn contains(&self, v: &Variant) -> bool {
        match &self.inner {
            Inner::Finite(store) => store.position(v).is_some(),
            Inner::Universe(u) => u.admits(v),
        }
    }

    fn store_mut(&mut self) -> Result<&mut Store> {
        if let Inner::Universe(u) = self.inner {
            if u != Universe::Boolean {
                return Err(invalid(format!("{} cannot be modified", u.name())));
            }
            *self = BOOLEAN_MEMBERS.iter().cloned().collect();
        }
        match &mut self.inner {
            Inner::Finite(store) => Ok(Shared::make_mut(store)),
            Inner::Universe(_) => Err(invalid("universe sets cannot be modified")),
        }
    }

    /// Insert `v`; false if an equal element is already present.
    ///
    /// # Errors
    ///
    /// Fails when inserting a non-member into an infinite universe.
    pub fn insert(&mut self, v: impl Into<Variant>) -> Result<bool> {
        let v = v.into();
        if self.contains(&v) {
            return Ok(false);
        }
        Ok(self.store_mut()?.insert(v))
    }

    /// Remove the element equal to `v`; false if absent.
    ///
    /// # Errors
    ///
    /// Fails when removing a member of an infinite universe.
    pub fn remove(&mut self, v: &Variant) -> Result<bool> {
        if !self.contains(v) {
            return Ok(false);
        }
        Ok(self.store_mut()?.remove(v))
    }

    // ------------------------------------------------------------
    // Subset tests
    // ------------------------------------------------------------

    /// `self ⊆ other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        match self.finite_view() {
            Some(elements) => elements.iter().all(|v| other.contains(v)),
            None => match (self.universe_kind(), other.universe_kind()) {
                (Some(a), Some(b)) => a <= b,
                _ => false,
            },
        }
    }

    /// `self ⊂ other`.
    #[must_use]
    pub fn is_proper_subset_of(&self, other: &Self) -> bool {
        self.is_subset_of(other) && !other.is_subset_of(self)
    }

    /// `self ⊇ other`.
    #[must_use]
    pub fn is_superset_of(&self, other: &Self) -> bool {
        other.is_subset_of(self)
    }

    /// `self ⊃ other`.
    #[must_use]
    pub fn is_proper_superset_of(&self, other: &Self) -> bool {
        other.is_proper_subset_of(self)
    }

    /// `self ⊄ other`.
    #[must_use]
    pub fn is_not_subset_of(&self, other: &Self) -> bool {
        !self.is_subset_of(other)
    }

    /// Negation of [`is_proper_subset_of`](Self::is_proper_subset_of).
    #[must_use]
    pub fn is_not_proper_subset_of(&self, other: &Self) -> bool {
        !self.is_proper_subset_of(other)
    }

    /// `self ⊉ other`.
    #[must_use]
    pub fn is_not_superset_of(&self, other: &Self) -> bool {
        !self.is_superset_of(other)
    }

    /// Negation of [`is_proper_superset_of`](Self::is_proper_superset_of).
    #[must_use]
    pub fn is_not_proper_superset_of(&self, other: &Self) -> bool {
        !self.is_proper_superset_of(other)
    }

    /// Elements sorted by the cross-kind order.
    pub(crate) fn sorted(&self) -> Vec<Variant> {
        let mut out = self.iter().cloned().collect::<Vec<_>>();
        out.sort_by(total_order);
        out
    }

    /// Size first, then sorted elements.
    ///
    /// # Errors
    ///
    /// Fails when a pair of elements is not comparable.
    pub fn relative_order(&self, other: &Self) -> Result<Ordering> {
        match (self.size(), other.size()) {
            (None, None) => Ok(self.universe_kind().cmp(&other.universe_kind())),
            (None, Some(_)) => Ok(Ordering::Greater),
            (Some(_), None) => Ok(Ordering::Less),
            (Some(a), Some(b)) if a != b => Ok(a.cmp(&b)),
            _ => Tuple::from_vec(self.sorted()).relative_order(&Tuple::from_vec(other.sorted())),
        }
    }

    /// Order-independent fuzzy hash of the contents.
    pub(crate) fn content_hash(&self) -> u64 {
        match self.inner {
            Inner::Universe(Universe::Boolean) | Inner::Finite(_) => self
                .iter()
                .fold(self.iter().len() as u64, |acc, v| acc.wrapping_add(v.fuzzy_hash())),
            Inner::Universe(u) => u64::MAX - u as u64,
        }
    }
}

impl FromIterator<Variant> for Set {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        let mut store = Store::default();
        for v in iter {
            store.insert(v);
        }
        Self {
            inner: Inner::Finite(Shared::new(store)),
        }
    }
}

impl<'a> IntoIterator for &'a Set {
    type Item = &'a Variant;
    type IntoIter = std::slice::Iter<'a, Variant>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for Set {
    fn eq(&self, other: &Self) -> bool {
        match (self.size(), other.size()) {
            (Some(a), Some(b)) => a == b && self.is_subset_of(other),
            (None, None) => self.universe_kind() == other.universe_kind(),
            _ => false,
        }
    }
}

impl fmt::Debug for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner {
            Inner::Universe(u) => f.write_str(u.name()),
            Inner::Finite(_) => f.debug_set().entries(self.iter()).finish(),
        }
    }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Inner::Universe(u) = self.inner {
            return f.write_str(u.name());
        }
        f.write_str("{")?;
        for (i, v) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str("}")
    }
}

// ============================================================
// Set algebra
// ============================================================

fn unrepresentable(op: &str, a: &Set, b: &Set) -> crate::ModelError {
    invalid(format!("{op} of {a} and {b} is not representable"))
}

fn finite_elements<'a>(s: &'a Set, op: &str) -> Result<&'a [Variant]> {
    s.finite_view()
        .ok_or_else(|| invalid(format!("{op} requires enumerable sets, got {s}")))
}

/// `a ∪ b`.
///
/// # Errors
///
/// Fails when the union of an infinite universe with a non-member is
/// requested.
pub fn union_of(a: &Set, b: &Set) -> Result<Set> {
    match (a.finite_view(), b.finite_view()) {
        (Some(x), Some(y)) => Ok(x.iter().chain(y).cloned().collect()),
        _ if b.is_subset_of(a) => Ok(a.clone()),
        _ if a.is_subset_of(b) => Ok(b.clone()),
        _ => Err(unrepresentable("union", a, b)),
    }
}

/// `a ∩ b`.
///
/// # Errors
///
/// Never fails for the universe sets; kept fallible for symmetry with the
/// rest of the algebra.
pub fn intersection_of(a: &Set, b: &Set) -> Result<Set> {
    match (a.finite_view(), b.finite_view()) {
        (Some(x), _) => Ok(x.iter().filter(|v| b.contains(v)).cloned().collect()),
        (None, Some(y)) => Ok(y.iter().filter(|v| a.contains(v)).cloned().collect()),
        (None, None) => Ok(if a.is_subset_of(b) { a.clone() } else { b.clone() }),
    }
}

/// `a \ b`.
///
/// # Errors
///
/// Fails when `a` is an infinite universe not contained in `b`.
pub fn relative_complement_of(a: &Set, b: &Set) -> Result<Set> {
    match a.finite_view() {
        Some(x) => Ok(x.iter().filter(|v| !b.contains(v)).cloned().collect()),
        None if a.is_subset_of(b) => Ok(Set::new()),
        None => Err(unrepresentable("relative complement", a, b)),
    }
}

/// `(a \ b) ∪ (b \ a)`.
///
/// # Errors
///
/// Fails when either complement is not representable.
pub fn symmetric_difference_of(a: &Set, b: &Set) -> Result<Set> {
    union_of(&relative_complement_of(a, b)?, &relative_complement_of(b, a)?)
}

/// Disjoint union: every element `x` of the `k`-th set (1-based) becomes
/// the pair `[x, k]`.
///
/// # Errors
///
/// Fails for infinite universes.
pub fn disjoint_union_of(sets: &[Set]) -> Result<Set> {
    let mut out = Vec::new();
    for (k, s) in sets.iter().enumerate() {
        for v in finite_elements(s, "disjoint union")? {
            out.push(Variant::Tuple(Tuple::from_vec(vec![
                v.clone(),
                Variant::Integer(k as i64 + 1),
            ])));
        }
    }
    Ok(out.into_iter().collect())
}

/// Binary Cartesian product as a set of pairs.
///
/// # Errors
///
/// Fails for infinite universes.
pub fn cartesian_product_of(a: &Set, b: &Set) -> Result<Set> {
    cartesian_product_of_all(&[a.clone(), b.clone()])
}

/// n-ary Cartesian product as a set of n-tuples. The product of no sets is
/// the set holding the empty tuple.
///
/// # Errors
///
/// Fails for infinite universes.
pub fn cartesian_product_of_all(sets: &[Set]) -> Result<Set> {
    let mut acc: Vec<Vec<Variant>> = vec![Vec::new()];
    for s in sets {
        let elements = finite_elements(s, "cartesian product")?;
        acc = acc
            .iter()
            .flat_map(|prefix| {
                elements.iter().map(move |v| {
                    let mut next = prefix.clone();
                    next.push(v.clone());
                    next
                })
            })
            .collect();
    }
    Ok(acc
        .into_iter()
        .map(|t| Variant::Tuple(Tuple::from_vec(t)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn set(values: &[i64]) -> Set {
        values.iter().map(|&i| Variant::Integer(i)).collect()
    }

    #[test]
    fn test_fuzzy_membership() {
        let mut s = set(&[1, 2]);
        assert!(s.contains(&Variant::Real(1.0)));
        assert!(s.contains(&Variant::Boolean(true)));
        assert!(!s.insert(Variant::Real(2.0)).unwrap());
        assert!(s.insert(Variant::Real(2.5)).unwrap());
        assert_eq!(s.size(), Some(3));
    }

    #[test]
    fn test_remove_keeps_index_consistent() {
        let mut s = set(&[1, 2, 3, 4]);
        assert!(s.remove(&Variant::Integer(1)).unwrap());
        assert!(!s.remove(&Variant::Integer(1)).unwrap());
        for i in 2..=4 {
            assert!(s.contains(&Variant::Integer(i)), "{i}");
        }
        assert!(s.remove(&Variant::Integer(4)).unwrap());
        assert_eq!(s, set(&[2, 3]));
    }

    #[test]
    fn test_copy_on_write() {
        let a = set(&[1]);
        let mut b = a.clone();
        b.insert(Variant::Integer(2)).unwrap();
        assert_eq!(a.size(), Some(1));
        assert_eq!(b.size(), Some(2));
    }

    #[test]
    fn test_universes() {
        let ints = universe(Universe::Integer);
        assert!(ints.contains(&Variant::Real(3.0)));
        assert!(!ints.contains(&Variant::Real(3.5)));
        assert!(ints.contains(&Variant::Boolean(false)));
        let reals = universe(Universe::Real);
        assert!(reals.contains(&Variant::Complex(Complex64::new(2.0, 0.0))));
        assert!(!reals.contains(&Variant::Complex(Complex64::new(2.0, 1.0))));
        assert!(!reals.contains(&Variant::Tuple(Tuple::new())));
        assert!(std::ptr::eq(ints, universe(Universe::Integer)));

        assert!(set(&[1, 2]).is_subset_of(ints));
        assert!(ints.is_proper_subset_of(reals));
        assert!(!reals.is_subset_of(ints));
        assert!(universe(Universe::Boolean).is_subset_of(&set(&[0, 1, 5])));
        assert!(!ints.is_subset_of(&set(&[1])));
    }

    #[test]
    fn test_boolean_universe_is_enumerable() {
        let mut b = universe(Universe::Boolean).clone();
        assert_eq!(b.size(), Some(2));
        assert!(b.remove(&Variant::Boolean(true)).unwrap());
        assert_eq!(b.size(), Some(1));
        assert_eq!(universe(Universe::Boolean).size(), Some(2));

        let mut r = universe(Universe::Real).clone();
        assert!(!r.insert(Variant::Integer(1)).unwrap());
        assert!(r.insert(Variant::Tuple(Tuple::new())).is_err());
    }

    #[test]
    fn test_boolean_universe_equality_is_symmetric() {
        let b = universe(Universe::Boolean);
        let ints = set(&[0, 1]);
        let bools: Set = [Variant::Boolean(false), Variant::Boolean(true)]
            .into_iter()
            .collect();
        let reals: Set = [Variant::Real(0.0), Variant::Real(1.0)].into_iter().collect();
        for other in [&ints, &bools, &reals] {
            assert_eq!(b == other, other == b, "{other}");
            assert!(b == other);
        }
        assert!(b.contains(&Variant::Integer(1)));
        assert!(b.contains(&Variant::Complex(Complex64::new(0.0, 0.0))));
        assert!(!b.contains(&Variant::Integer(2)));
        assert!(set(&[0, 1]).is_subset_of(b));
        assert!(*b != set(&[0, 2]) && set(&[0, 2]) != *b);
    }

    #[test]
    fn test_nan_is_one_element() {
        let mut s = Set::new();
        assert!(s.insert(Variant::Real(f64::NAN)).unwrap());
        assert!(!s.insert(Variant::Real(-f64::NAN)).unwrap());
        assert!(!s.insert(Variant::Complex(Complex64::new(f64::NAN, 1.0))).unwrap());
        assert_eq!(s.size(), Some(1));
        assert!(s.contains(&Variant::Real(f64::NAN)));
        assert!(s.remove(&Variant::Real(f64::NAN)).unwrap());
        assert!(s.is_empty());
    }

    #[test]
    fn test_algebra() {
        let a = set(&[1, 2, 3]);
        let b = set(&[3, 4]);
        assert_eq!(union_of(&a, &b).unwrap(), set(&[1, 2, 3, 4]));
        assert_eq!(intersection_of(&a, &b).unwrap(), set(&[3]));
        assert_eq!(relative_complement_of(&a, &b).unwrap(), set(&[1, 2]));
        assert_eq!(symmetric_difference_of(&a, &b).unwrap(), set(&[1, 2, 4]));

        let ints = universe(Universe::Integer);
        assert_eq!(union_of(&a, ints).unwrap(), *ints);
        assert_eq!(intersection_of(ints, &set(&[1])).unwrap(), set(&[1]));
        assert!(relative_complement_of(ints, &a).is_err());
        assert!(relative_complement_of(ints, universe(Universe::Real)).unwrap().is_empty());
        let mixed: Set = [Variant::Real(0.5)].into_iter().collect();
        assert!(union_of(ints, &mixed).is_err());
    }

    #[test]
    fn test_products() {
        let a = set(&[1, 2]);
        let b = set(&[3]);
        let p = cartesian_product_of(&a, &b).unwrap();
        assert_eq!(p.size(), Some(2));
        let pair = Variant::Tuple(Tuple::from_vec(vec![Variant::Integer(2), Variant::Integer(3)]));
        assert!(p.contains(&pair));

        let d = disjoint_union_of(&[a.clone(), a.clone()]).unwrap();
        assert_eq!(d.size(), Some(4));
        let tagged = Variant::Tuple(Tuple::from_vec(vec![Variant::Integer(1), Variant::Integer(2)]));
        assert!(d.contains(&tagged));

        let triple = cartesian_product_of_all(&[a.clone(), a.clone(), b]).unwrap();
        assert_eq!(triple.size(), Some(4));
        assert!(cartesian_product_of(&a, universe(Universe::Real)).is_err());
    }

    #[test]
    fn test_order() {
        assert_eq!(set(&[5]).relative_order(&set(&[1, 2])).unwrap(), Ordering::Less);
        assert_eq!(set(&[2, 1]).relative_order(&set(&[1, 3])).unwrap(), Ordering::Less);
        assert_eq!(set(&[2, 1]).relative_order(&set(&[1, 2])).unwrap(), Ordering::Equal);
    }
}
