//! Ordered sequences of variants
//!
//! A [`Tuple`] shares its element vector through a copy-on-write
//! [`Shared`] payload. Cloning is O(1); the first mutation through an
//! aliased handle deep-copies the payload, so other aliases never observe
//! the change.
//!
//! Indices are 1-based. Tuples double as strings: [`Tuple::from_utf8`]
//! decodes one Integer code point per element and [`Tuple::to_utf8`]
//! encodes them back.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Div, Mul};

use mre_rts_cow::{Generation, Shared};

use crate::error::{invalid, ModelError, Result};
use crate::index::{offset, Index};
use crate::range::Range;
use crate::variant::Variant;

/// Ordered, copy-on-write sequence of variants.
#[derive(Clone, Default)]
pub struct Tuple {
    payload: Shared<Vec<Variant>>,
}

impl Tuple {
    /// Create an empty tuple.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tuple owning `elements`.
    #[must_use]
    pub fn from_vec(elements: Vec<Variant>) -> Self {
        Self {
            payload: Shared::new(elements),
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True when the tuple has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Borrow the elements.
    #[must_use]
    pub fn as_slice(&self) -> &[Variant] {
        self.payload.get()
    }

    /// Iterate the elements.
    pub fn iter(&self) -> std::slice::Iter<'_, Variant> {
        self.payload.iter()
    }

    /// True if both tuples share one payload.
    #[must_use]
    pub fn shares_payload_with(&self, other: &Self) -> bool {
        Shared::ptr_eq(&self.payload, &other.payload)
    }

    /// Mutation generation of this handle.
    #[must_use]
    pub fn generation(&self) -> Generation {
        Shared::generation(&self.payload)
    }

    fn elements_mut(&mut self) -> &mut Vec<Variant> {
        Shared::make_mut(&mut self.payload)
    }

    // ------------------------------------------------------------
    // Insertion and removal
    // ------------------------------------------------------------

    /// Append one element.
    pub fn append(&mut self, v: impl Into<Variant>) {
        self.elements_mut().push(v.into());
    }

    /// Insert one element at the front.
    pub fn prepend(&mut self, v: impl Into<Variant>) {
        self.elements_mut().insert(0, v.into());
    }

    /// Append every value of a range, in order.
    pub fn append_range(&mut self, range: &Range) {
        self.elements_mut().extend(range.iter());
    }

    /// Insert every value of a range at the front, in reverse order.
    ///
    /// Prepending `[1, 3 .. 7]` to `[x]` gives `[7, 5, 3, 1, x]`: the values
    /// are pushed to the front one by one.
    pub fn prepend_range(&mut self, range: &Range) {
        let elements = self.elements_mut();
        let mut front: Vec<Variant> = range.iter().rev().collect();
        front.append(elements);
        *elements = front;
    }

    /// Append `v`, expanding a range into its values.
    pub fn push_back(&mut self, v: impl Into<Variant>) {
        match v.into() {
            Variant::Range(r) => self.append_range(&r),
            other => self.append(other),
        }
    }

    /// Prepend `v`, expanding a range into its values in reverse order.
    pub fn push_front(&mut self, v: impl Into<Variant>) {
        match v.into() {
            Variant::Range(r) => self.prepend_range(&r),
            other => self.prepend(other),
        }
    }

    /// Remove and return the first element.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidIndex`] when the tuple is empty.
    pub fn take_first(&mut self) -> Result<Variant> {
        if self.is_empty() {
            return Err(ModelError::InvalidIndex { index: 1, size: 0 });
        }
        Ok(self.elements_mut().remove(0))
    }

    /// Remove and return the last element.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidIndex`] when the tuple is empty.
    pub fn take_last(&mut self) -> Result<Variant> {
        self.elements_mut()
            .pop()
            .ok_or(ModelError::InvalidIndex { index: 0, size: 0 })
    }

    /// Remove the first element; false when empty.
    pub fn pop_first(&mut self) -> bool {
        self.take_first().is_ok()
    }

    /// Remove the last element; false when empty.
    pub fn pop_last(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.elements_mut().pop().is_some()
    }

    // ------------------------------------------------------------
    // Indexing
    // ------------------------------------------------------------

    /// Element at 1-based position `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidIndex`] outside `[1, len]`.
    pub fn at(&self, index: i64) -> Result<&Variant> {
        Ok(&self.payload[offset(index, self.len())?])
    }

    /// Element or elements named by a variant index.
    ///
    /// A scalar index returns the element; a range, set, tuple or matrix
    /// index returns a tuple of the named elements.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidIndex`] for a position out of bounds and
    /// [`ModelError::InvalidParameterValue`] for an unusable index.
    pub fn at_index(&self, index: &Variant) -> Result<Variant> {
        match Index::from_variant(index)? {
            Index::Scalar(i) => self.at(i).cloned(),
            Index::List { positions, .. } => positions
                .into_iter()
                .map(|i| self.at(i).cloned())
                .collect::<Result<Vec<_>>>()
                .map(|v| Variant::Tuple(Self::from_vec(v))),
        }
    }

    /// Store `v` at 1-based position `index`.
    ///
    /// Writing past the end grows the tuple with Integer zeros up to
    /// `index - 1` and then appends `v`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidIndex`] for `index < 1` or for a
    /// position too large to allocate.
    pub fn update(&mut self, index: i64, v: impl Into<Variant>) -> Result<()> {
        let size = self.len();
        let out_of_range = || ModelError::InvalidIndex {
            index,
            size: size as u64,
        };
        let slot = usize::try_from(index)
            .ok()
            .filter(|&i| i >= 1)
            .ok_or_else(out_of_range)?;
        let elements = self.elements_mut();
        if slot > size {
            elements
                .try_reserve(slot - size)
                .map_err(|_| out_of_range())?;
            elements.resize(slot - 1, Variant::Integer(0));
            elements.push(v.into());
        } else {
            elements[slot - 1] = v.into();
        }
        Ok(())
    }

    // ------------------------------------------------------------
    // Concatenation
    // ------------------------------------------------------------

    /// `self` followed by `other`.
    #[must_use]
    pub fn concatenate(&self, other: &Self) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut out = Vec::with_capacity(self.len() + other.len());
        out.extend_from_slice(self.as_slice());
        out.extend_from_slice(other.as_slice());
        Self::from_vec(out)
    }

    /// Remove the first contiguous occurrence of `other`.
    ///
    /// Returns `self` unchanged when either side is empty, `other` is longer,
    /// or there is no occurrence.
    #[must_use]
    pub fn cancel_right(&self, other: &Self) -> Self {
        let (hay, needle) = (self.as_slice(), other.as_slice());
        if needle.is_empty() || needle.len() > hay.len() {
            return self.clone();
        }
        match find_subsequence(hay, needle, 0) {
            Some(at) => {
                let mut out = Vec::with_capacity(hay.len() - needle.len());
                out.extend_from_slice(&hay[..at]);
                out.extend_from_slice(&hay[at + needle.len()..]);
                Self::from_vec(out)
            }
            None => self.clone(),
        }
    }

    // ------------------------------------------------------------
    // UTF-8 codec
    // ------------------------------------------------------------

    /// Decode UTF-8, one Integer code point per element.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MalformedString`] at the offset of the first
    /// offending byte.
    pub fn from_utf8(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| ModelError::MalformedString {
            offset: e.valid_up_to(),
        })?;
        Ok(Self::from(text))
    }

    /// Encode to UTF-8, or `None` if an element is not an Integer code point.
    #[must_use]
    pub fn to_utf8(&self) -> Option<Vec<u8>> {
        self.to_text().map(String::into_bytes)
    }

    /// Encode to a `String`, or `None` if an element is not an Integer code
    /// point.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        self.iter()
            .map(|v| match v {
                Variant::Integer(c) => u32::try_from(*c).ok().and_then(char::from_u32),
                _ => None,
            })
            .collect()
    }

    // ------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------

    /// Lexicographic comparison; the first unequal pair decides, then the
    /// length.
    ///
    /// # Errors
    ///
    /// Fails when a pair of elements is not comparable.
    pub fn relative_order(&self, other: &Self) -> Result<Ordering> {
        for (a, b) in self.iter().zip(other.iter()) {
            match a.relative_order(b)? {
                Ordering::Equal => continue,
                ord => return Ok(ord),
            }
        }
        Ok(self.len().cmp(&other.len()))
    }

    /// Cursor on the first element.
    #[must_use]
    pub fn cursor(&self) -> TupleCursor {
        TupleCursor {
            index: 0,
            generation: self.generation(),
        }
    }
}

/// First position at or after `start` where `needle` occurs in `hay`.
pub(crate) fn find_subsequence(hay: &[Variant], needle: &[Variant], start: usize) -> Option<usize> {
    if needle.is_empty() || needle.len() > hay.len() {
        return None;
    }
    (start..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()] == *needle)
}

impl From<Vec<Variant>> for Tuple {
    fn from(elements: Vec<Variant>) -> Self {
        Self::from_vec(elements)
    }
}

impl From<&str> for Tuple {
    fn from(text: &str) -> Self {
        text.chars().map(|c| Variant::Integer(i64::from(u32::from(c)))).collect()
    }
}

impl FromIterator<Variant> for Tuple {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Tuple {
    type Item = &'a Variant;
    type IntoIter = std::slice::Iter<'a, Variant>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.shares_payload_with(other) || self.as_slice() == other.as_slice()
    }
}

impl Mul for &Tuple {
    type Output = Tuple;

    fn mul(self, rhs: &Tuple) -> Tuple {
        self.concatenate(rhs)
    }
}

impl Div for &Tuple {
    type Output = Tuple;

    fn div(self, rhs: &Tuple) -> Tuple {
        self.cancel_right(rhs)
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, v) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str("]")
    }
}

/// Position inside a [`Tuple`] that detects mutation of the tuple.
///
/// The cursor records the tuple's generation when created. Reading through
/// a cursor after the tuple was mutated by another path, or reassigned to a
/// different value, fails; writing through the cursor keeps it current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TupleCursor {
    index: usize,
    generation: Generation,
}

impl TupleCursor {
    fn check(&self, tuple: &Tuple) -> Result<()> {
        if tuple.generation() == self.generation {
            Ok(())
        } else {
            Err(invalid("tuple was modified after the cursor was created"))
        }
    }

    /// Element under the cursor, `None` at the end.
    ///
    /// # Errors
    ///
    /// Fails if the tuple was mutated since the cursor was created.
    pub fn get<'a>(&self, tuple: &'a Tuple) -> Result<Option<&'a Variant>> {
        self.check(tuple)?;
        Ok(tuple.as_slice().get(self.index))
    }

    /// Overwrite the element under the cursor.
    ///
    /// # Errors
    ///
    /// Fails if the cursor is stale or at the end.
    pub fn set(&mut self, tuple: &mut Tuple, v: impl Into<Variant>) -> Result<()> {
        self.check(tuple)?;
        if self.index >= tuple.len() {
            return Err(ModelError::InvalidIndex {
                index: self.index as i64 + 1,
                size: tuple.len() as u64,
            });
        }
        tuple.elements_mut()[self.index] = v.into();
        self.generation = tuple.generation();
        Ok(())
    }

    /// Move forward by `d` elements.
    pub fn advance(&mut self, d: usize) {
        self.index = self.index.saturating_add(d);
    }

    /// Move backward by `d` elements, stopping at the first.
    pub fn backup(&mut self, d: usize) {
        self.index = self.index.saturating_sub(d);
    }

    /// Index difference `self - other`.
    #[must_use]
    pub fn distance(&self, other: &Self) -> isize {
        self.index as isize - other.index as isize
    }

    /// True while the cursor is current and on an element.
    #[must_use]
    pub fn is_valid(&self, tuple: &Tuple) -> bool {
        self.generation == tuple.generation() && self.index < tuple.len()
    }
}
