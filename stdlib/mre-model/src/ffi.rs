//! C ABI entry points
//!
//! Ahead-of-time compiled code builds values from raw column-major buffers
//! and exchanges strings as UTF-8. Values cross the boundary as opaque
//! `*mut Variant` handles owned by the caller and released with
//! [`mre_variant_free`].
//!
//! # Calling Convention
//!
//! All functions use the C calling convention and are `no_mangle` so the
//! symbol names are stable for linking. Failures are reported as null
//! pointers; nothing unwinds across the boundary.

use std::ptr;

use num_complex::Complex64;
use tracing::debug;

use crate::matrix::{Coefficient, Matrix};
use crate::tuple::Tuple;
use crate::variant::Variant;

fn into_handle(v: Variant) -> *mut Variant {
    Box::into_raw(Box::new(v))
}

/// Build a matrix handle from `rows * cols` column-major coefficients.
///
/// # Safety
///
/// `data` must point to `rows * cols` readable values (it may be null when
/// that product is 0).
unsafe fn matrix_from_raw<T: Coefficient>(data: *const T, rows: usize, cols: usize) -> *mut Variant {
    let Some(len) = rows.checked_mul(cols) else {
        return ptr::null_mut();
    };
    if len > 0 && data.is_null() {
        return ptr::null_mut();
    }
    let values = if len == 0 {
        &[][..]
    } else {
        // SAFETY: the caller guarantees `len` readable values at `data`.
        unsafe { std::slice::from_raw_parts(data, len) }
    };
    match Matrix::build(rows, cols, values) {
        Ok(m) => into_handle(T::wrap(m)),
        Err(e) => {
            debug!(%e, rows, cols, "matrix construction over ffi failed");
            ptr::null_mut()
        }
    }
}

/// Create a Real matrix from a column-major `f64` buffer.
///
/// Returns null on failure.
///
/// # Safety
///
/// `data` must point to `rows * cols` readable `f64` values.
#[no_mangle]
pub unsafe extern "C" fn mre_matrix_real_from_raw(
    data: *const f64,
    rows: usize,
    cols: usize,
) -> *mut Variant {
    // SAFETY: forwarded caller contract.
    unsafe { matrix_from_raw(data, rows, cols) }
}

/// Create an Integer matrix from a column-major `i64` buffer.
///
/// Returns null on failure.
///
/// # Safety
///
/// `data` must point to `rows * cols` readable `i64` values.
#[no_mangle]
pub unsafe extern "C" fn mre_matrix_integer_from_raw(
    data: *const i64,
    rows: usize,
    cols: usize,
) -> *mut Variant {
    // SAFETY: forwarded caller contract.
    unsafe { matrix_from_raw(data, rows, cols) }
}

/// Create a Complex matrix from a column-major buffer of interleaved
/// `(re, im)` pairs.
///
/// Returns null on failure.
///
/// # Safety
///
/// `data` must point to `2 * rows * cols` readable `f64` values.
#[no_mangle]
pub unsafe extern "C" fn mre_matrix_complex_from_raw(
    data: *const f64,
    rows: usize,
    cols: usize,
) -> *mut Variant {
    // `Complex<f64>` is `#[repr(C)]` with fields `re`, `im`.
    // SAFETY: forwarded caller contract; the layouts agree.
    unsafe { matrix_from_raw(data.cast::<Complex64>(), rows, cols) }
}

/// # Safety
///
/// `v` must be null or a live handle.
unsafe fn shape(v: *const Variant) -> (usize, usize) {
    // SAFETY: the caller passes null or a handle from `into_handle`.
    match unsafe { v.as_ref() } {
        Some(Variant::MatrixBoolean(m)) => m.shape(),
        Some(Variant::MatrixInteger(m)) => m.shape(),
        Some(Variant::MatrixReal(m)) => m.shape(),
        Some(Variant::MatrixComplex(m)) => m.shape(),
        _ => (0, 0),
    }
}

/// Row count of a matrix handle; 0 for null or a non-matrix value.
///
/// # Safety
///
/// `v` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn mre_matrix_rows(v: *const Variant) -> usize {
    // SAFETY: forwarded caller contract.
    unsafe { shape(v).0 }
}

/// Column count of a matrix handle; 0 for null or a non-matrix value.
///
/// # Safety
///
/// `v` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn mre_matrix_cols(v: *const Variant) -> usize {
    // SAFETY: forwarded caller contract.
    unsafe { shape(v).1 }
}

/// Decode UTF-8 into a tuple handle of code points.
///
/// Returns null when the bytes are malformed.
///
/// # Safety
///
/// `bytes` must point to `len` readable bytes (it may be null when `len`
/// is 0).
#[no_mangle]
pub unsafe extern "C" fn mre_tuple_from_utf8(bytes: *const u8, len: usize) -> *mut Variant {
    let slice = if len == 0 {
        &[][..]
    } else if bytes.is_null() {
        return ptr::null_mut();
    } else {
        // SAFETY: the caller guarantees `len` readable bytes.
        unsafe { std::slice::from_raw_parts(bytes, len) }
    };
    match Tuple::from_utf8(slice) {
        Ok(t) => into_handle(Variant::Tuple(t)),
        Err(e) => {
            debug!(%e, "utf-8 decode over ffi failed");
            ptr::null_mut()
        }
    }
}

/// Encode a tuple handle as UTF-8 into a new buffer.
///
/// The length is written to `out_len`. Returns null when the handle is not
/// a tuple of code points. Release the buffer with [`mre_buffer_free`].
///
/// # Safety
///
/// `v` must be null or a live handle; `out_len` must be valid for writes.
#[no_mangle]
pub unsafe extern "C" fn mre_tuple_to_utf8(v: *const Variant, out_len: *mut usize) -> *mut u8 {
    // SAFETY: handles are either null or produced by `into_handle`.
    let bytes = match unsafe { v.as_ref() } {
        Some(Variant::Tuple(t)) => t.to_utf8(),
        _ => None,
    };
    let Some(bytes) = bytes else {
        return ptr::null_mut();
    };
    if !out_len.is_null() {
        // SAFETY: checked non-null; the caller guarantees validity.
        unsafe { *out_len = bytes.len() };
    }
    Box::into_raw(bytes.into_boxed_slice()).cast::<u8>()
}

/// Release a buffer returned by [`mre_tuple_to_utf8`].
///
/// # Safety
///
/// `buf` and `len` must come from one call to [`mre_tuple_to_utf8`], and the
/// buffer must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn mre_buffer_free(buf: *mut u8, len: usize) {
    if buf.is_null() {
        return;
    }
    // SAFETY: reconstructs the boxed slice leaked by `mre_tuple_to_utf8`.
    drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(buf, len)) });
}

/// Release a value handle.
///
/// # Safety
///
/// `v` must be null or a handle returned by this module that has not been
/// freed yet.
#[no_mangle]
pub unsafe extern "C" fn mre_variant_free(v: *mut Variant) {
    if !v.is_null() {
        // SAFETY: the handle came from `into_handle`.
        drop(unsafe { Box::from_raw(v) });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{MatrixComplex, MatrixReal};

    #[test]
    fn test_real_matrix_round_trip() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        unsafe {
            let h = mre_matrix_real_from_raw(data.as_ptr(), 2, 3);
            assert!(!h.is_null());
            assert_eq!(mre_matrix_rows(h), 2);
            assert_eq!(mre_matrix_cols(h), 3);
            let expected = MatrixReal::build(2, 3, &data).unwrap();
            assert_eq!(*h, Variant::from(expected));
            mre_variant_free(h);
        }
    }

    #[test]
    fn test_complex_and_integer_matrices() {
        let data = [1.0, -1.0, 2.0, 0.5];
        let ints = [7i64, 8, 9];
        unsafe {
            let h = mre_matrix_complex_from_raw(data.as_ptr(), 2, 1);
            let expected =
                MatrixComplex::build(2, 1, &[Complex64::new(1.0, -1.0), Complex64::new(2.0, 0.5)])
                    .unwrap();
            assert_eq!(*h, Variant::from(expected));
            mre_variant_free(h);

            let h = mre_matrix_integer_from_raw(ints.as_ptr(), 1, 3);
            assert_eq!((mre_matrix_rows(h), mre_matrix_cols(h)), (1, 3));
            mre_variant_free(h);

            let empty = mre_matrix_real_from_raw(ptr::null(), 0, 4);
            assert_eq!(mre_matrix_cols(empty), 4);
            mre_variant_free(empty);

            assert!(mre_matrix_real_from_raw(ptr::null(), 2, 2).is_null());
        }
    }

    #[test]
    fn test_utf8_round_trip() {
        let text = "héllo";
        unsafe {
            let h = mre_tuple_from_utf8(text.as_ptr(), text.len());
            assert!(!h.is_null());
            assert_eq!(mre_matrix_rows(h), 0);
            let mut len = 0;
            let buf = mre_tuple_to_utf8(h, &mut len);
            assert_eq!(std::slice::from_raw_parts(buf, len), text.as_bytes());
            mre_buffer_free(buf, len);
            mre_variant_free(h);
        }
    }

    #[test]
    fn test_malformed_utf8_is_null() {
        let bad = [0x41u8, 0xff];
        unsafe {
            assert!(mre_tuple_from_utf8(bad.as_ptr(), bad.len()).is_null());
            let mut len = 0;
            assert!(mre_tuple_to_utf8(ptr::null(), &mut len).is_null());
        }
    }
}
