//! MRE modelling runtime value system
//!
//! The value layer a modelling-language compiler links against: scalar
//! kinds and their promotion lattice, copy-on-write tuples and sets,
//! arithmetic ranges, dense matrices with their decompositions, the
//! [`Variant`] sum type and the statistical and string functions built on
//! them.
//!
//! # Kinds
//!
//! | Kind | Rust type |
//! |------|-----------|
//! | Boolean, Integer, Real, Complex | `bool`, `i64`, `f64`, [`Complex64`] |
//! | Range | [`Range`] |
//! | Tuple | [`Tuple`] |
//! | Set | [`Set`] |
//! | Matrix{Boolean,Integer,Real,Complex} | [`Matrix<T>`] |
//!
//! Mixed-kind operations join their operands in the lattice
//! `Boolean < Integer < Real < Complex` (see [`best_upcast`]) and then run
//! the monomorphic code of the joined kind.
//!
//! # Example
//!
//! ```
//! use mre_model::{MatrixReal, Variant};
//!
//! let a = MatrixReal::build(2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
//! assert_eq!(a.determinant().unwrap(), -2.0);
//!
//! let sum = Variant::Integer(1).try_add(&Variant::Real(0.5)).unwrap();
//! assert_eq!(sum, Variant::Real(1.5));
//! ```
//!
//! # Sharing
//!
//! Tuples, sets and matrices share their payload on clone. The first
//! mutation through an alias detaches it, so no alias ever observes another
//! alias's writes.
//!
//! # FFI Exports
//!
//! [`ffi`] exports C-ABI functions for ahead-of-time compiled code:
//! - `mre_matrix_real_from_raw`, `mre_matrix_integer_from_raw`,
//!   `mre_matrix_complex_from_raw` - matrices from column-major buffers
//! - `mre_matrix_rows`, `mre_matrix_cols` - dimensions
//! - `mre_tuple_from_utf8`, `mre_tuple_to_utf8`, `mre_buffer_free` - the
//!   UTF-8 codec
//! - `mre_variant_free` - handle release

#![warn(missing_docs)]

pub mod config;
mod error;
pub mod ffi;
pub mod functions;
mod index;
pub mod kind;
pub mod matrix;
pub mod range;
pub mod scalar;
pub mod set;
pub mod statistics;
pub mod tuple;
pub mod variant;

pub use config::{config, set_config, EngineConfig};
pub use error::{ConfigError, ModelError, RangePosition, Result};
pub use kind::{arithmetic_kind, best_upcast, best_upcast_all, ValueKind};
pub use matrix::{
    Coefficient, Matrix, MatrixBoolean, MatrixComplex, MatrixInteger, MatrixReal,
};
pub use num_complex::Complex64;
pub use range::Range;
pub use set::{universe, Set, Universe};
pub use tuple::Tuple;
pub use variant::Variant;
