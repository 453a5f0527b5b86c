//! Column strides for dense coefficient stores.
//!
//! Matrices keep each column padded to a multiple of the SIMD register width
//! so that columns start on aligned boundaries. The pad holds the coefficient
//! kind's zero and never contributes to observed dimensions.

/// Alignment requirements for coefficient columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// No padding; columns are packed.
    Packed,
    /// SIMD 128-bit alignment (16 bytes, SSE/NEON).
    Simd128,
    /// SIMD 256-bit alignment (32 bytes, AVX).
    Simd256,
    /// SIMD 512-bit alignment (64 bytes, AVX-512).
    Simd512,
}

impl Alignment {
    /// The alignment used by the matrix kernel.
    pub const COLUMN: Self = Self::Simd256;

    /// Get the alignment value in bytes.
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        match self {
            Self::Packed => 1,
            Self::Simd128 => 16,
            Self::Simd256 => 32,
            Self::Simd512 => 64,
        }
    }

    /// Number of `T` values that fit in one aligned block (at least one).
    #[inline]
    #[must_use]
    pub const fn lanes_of<T>(self) -> usize {
        let size = std::mem::size_of::<T>();
        if size == 0 || size >= self.as_usize() {
            1
        } else {
            self.as_usize() / size
        }
    }
}

/// Round `len` up to the next multiple of the lane count of `T` under
/// `alignment`.
#[inline]
#[must_use]
pub const fn padded_len<T>(len: usize, alignment: Alignment) -> usize {
    let lanes = alignment.lanes_of::<T>();
    len.div_ceil(lanes) * lanes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lanes() {
        assert_eq!(Alignment::Simd256.lanes_of::<f64>(), 4);
        assert_eq!(Alignment::Simd256.lanes_of::<u8>(), 32);
        assert_eq!(Alignment::Simd256.lanes_of::<[f64; 2]>(), 2);
        assert_eq!(Alignment::Packed.lanes_of::<f64>(), 1);
        assert_eq!(Alignment::Simd128.lanes_of::<[u8; 64]>(), 1);
    }

    #[test]
    fn test_padded_len() {
        assert_eq!(padded_len::<f64>(0, Alignment::Simd256), 0);
        assert_eq!(padded_len::<f64>(1, Alignment::Simd256), 4);
        assert_eq!(padded_len::<f64>(4, Alignment::Simd256), 4);
        assert_eq!(padded_len::<f64>(5, Alignment::Simd256), 8);
        assert_eq!(padded_len::<f64>(5, Alignment::Packed), 5);
    }
}
