//! Algebraic laws of the value system

use mre_model::set::{intersection_of, relative_complement_of, symmetric_difference_of, union_of};
use mre_model::{MatrixComplex, MatrixReal, Range, Set, Tuple, Variant};
use num_complex::Complex64;
use proptest::prelude::*;

fn tuple_of(values: &[i64]) -> Tuple {
    values.iter().map(|&i| Variant::Integer(i)).collect()
}

fn set_of(values: &[i64]) -> Set {
    values.iter().map(|&i| Variant::Integer(i)).collect()
}

fn real_matrix(rows: usize, cols: usize) -> impl Strategy<Value = MatrixReal> {
    prop::collection::vec(-10.0f64..10.0, rows * cols)
        .prop_map(move |v| MatrixReal::build(rows, cols, &v).unwrap())
}

fn complex_matrix(rows: usize, cols: usize) -> impl Strategy<Value = MatrixComplex> {
    prop::collection::vec((-5.0f64..5.0, -5.0f64..5.0), rows * cols).prop_map(move |v| {
        let z: Vec<Complex64> = v.into_iter().map(|(re, im)| Complex64::new(re, im)).collect();
        MatrixComplex::build(rows, cols, &z).unwrap()
    })
}

fn relative_error(a: &MatrixReal, b: &MatrixReal) -> f64 {
    a.try_sub(b).unwrap().euclidean_norm() / b.euclidean_norm().max(f64::MIN_POSITIVE)
}

fn relative_error_complex(a: &MatrixComplex, b: &MatrixComplex) -> f64 {
    a.try_sub(b).unwrap().euclidean_norm() / b.euclidean_norm().max(f64::MIN_POSITIVE)
}

// ============================================================
// Tuples
// ============================================================

mod tuple_tests {
    use super::*;

    proptest! {
        #[test]
        fn append_grows_by_one(values in prop::collection::vec(any::<i64>(), 0..20), x in any::<i64>()) {
            let t = tuple_of(&values);
            let mut u = t.clone();
            u.append(x);
            prop_assert_eq!(u.len(), t.len() + 1);
            prop_assert_eq!(u.at(t.len() as i64 + 1).unwrap(), &Variant::Integer(x));
        }

        #[test]
        fn concatenation_is_associative(
            a in prop::collection::vec(-5i64..5, 0..8),
            b in prop::collection::vec(-5i64..5, 0..8),
            c in prop::collection::vec(-5i64..5, 0..8),
        ) {
            let (a, b, c) = (tuple_of(&a), tuple_of(&b), tuple_of(&c));
            prop_assert_eq!(a.concatenate(&b).concatenate(&c), a.concatenate(&b.concatenate(&c)));
        }

        #[test]
        fn right_cancellation_undoes_concatenation(
            t in prop::collection::vec(0i64..2, 0..10),
            tail in prop::collection::vec(0i64..3, 0..5),
        ) {
            // `u` starts with an element `t` never contains, so its first
            // occurrence in `t * u` is the appended copy.
            let mut u = vec![7];
            u.extend(tail);
            let (t, u) = (tuple_of(&t), tuple_of(&u));
            prop_assert_eq!(t.concatenate(&u).cancel_right(&u), t);
        }

        #[test]
        fn utf8_round_trip(s in any::<String>()) {
            let t = Tuple::from_utf8(s.as_bytes()).unwrap();
            prop_assert_eq!(t.len(), s.chars().count());
            prop_assert_eq!(t.to_utf8().unwrap(), s.as_bytes().to_vec());
        }

        #[test]
        fn mutation_never_leaks_to_aliases(values in prop::collection::vec(any::<i64>(), 1..20), x in any::<i64>()) {
            let original = tuple_of(&values);
            let mut alias = original.clone();
            prop_assert!(alias.shares_payload_with(&original));
            alias.update(1, x).unwrap();
            alias.append(x);
            for (i, v) in values.iter().enumerate() {
                prop_assert_eq!(original.at(i as i64 + 1).unwrap(), &Variant::Integer(*v));
            }
            prop_assert!(!alias.shares_payload_with(&original));
        }
    }
}

// ============================================================
// Ranges
// ============================================================

mod range_tests {
    use super::*;

    proptest! {
        #[test]
        fn membership_matches_enumeration(
            first in -50i64..50,
            step in -7i64..8,
            last in -50i64..50,
            probe in -60i64..60,
        ) {
            let r = Range::integer(first, Some(first + step), last);
            let listed: Vec<Variant> = r.iter().collect();
            prop_assert_eq!(listed.len() as u64, r.size());
            let v = Variant::Integer(probe);
            prop_assert_eq!(r.contains(&v), listed.contains(&v));
        }
    }
}

// ============================================================
// Sets
// ============================================================

mod set_tests {
    use super::*;

    fn small_set() -> impl Strategy<Value = Set> {
        prop::collection::vec(-6i64..6, 0..10).prop_map(|v| set_of(&v))
    }

    proptest! {
        #[test]
        fn union_contains_both(a in small_set(), b in small_set()) {
            let u = union_of(&a, &b).unwrap();
            prop_assert!(u.is_superset_of(&a));
            prop_assert!(u.is_superset_of(&b));
        }

        #[test]
        fn intersection_is_contained(a in small_set(), b in small_set()) {
            let i = intersection_of(&a, &b).unwrap();
            prop_assert!(i.is_subset_of(&a));
            prop_assert!(i.is_subset_of(&b));
        }

        #[test]
        fn complement_and_intersection_partition(a in small_set(), b in small_set()) {
            let rebuilt = union_of(
                &relative_complement_of(&a, &b).unwrap(),
                &intersection_of(&a, &b).unwrap(),
            )
            .unwrap();
            prop_assert_eq!(rebuilt, a);
        }

        #[test]
        fn symmetric_difference_law(a in small_set(), b in small_set()) {
            let expected = relative_complement_of(
                &union_of(&a, &b).unwrap(),
                &intersection_of(&a, &b).unwrap(),
            )
            .unwrap();
            prop_assert_eq!(symmetric_difference_of(&a, &b).unwrap(), expected);
        }
    }
}

// ============================================================
// Matrices
// ============================================================

mod matrix_tests {
    use super::*;

    proptest! {
        #[test]
        fn transpose_is_an_involution(m in real_matrix(3, 4)) {
            prop_assert_eq!(m.transpose().transpose(), m);
        }

        #[test]
        fn adjoint_is_conjugate_transpose(m in complex_matrix(2, 3)) {
            prop_assert_eq!(m.adjoint(), m.conj().transpose());
        }

        #[test]
        fn identity_and_zero_are_neutral(m in real_matrix(3, 2)) {
            prop_assert_eq!(m.matmul(&MatrixReal::identity(2)).unwrap(), m.clone());
            prop_assert_eq!(m.try_add(&MatrixReal::zero(3, 2)).unwrap(), m);
        }

        #[test]
        fn plu_reconstructs(a in real_matrix(4, 4)) {
            let f = a.plu().unwrap();
            let back = f.p.matmul(&f.l).unwrap().matmul(&f.u).unwrap();
            prop_assert!(relative_error(&back, &a) <= 5e-7);
        }

        #[test]
        fn svd_reconstructs(a in real_matrix(4, 3)) {
            let f = a.svd().unwrap();
            prop_assert!(f.success);
            let back = f.u.matmul(&f.s).unwrap().matmul(&f.vh).unwrap();
            prop_assert!(relative_error(&back, &a) <= 1e-6);
        }

        #[test]
        fn complex_svd_reconstructs(a in complex_matrix(3, 3)) {
            let f = a.svd().unwrap();
            let back = f.u.matmul(&f.s).unwrap().matmul(&f.vh).unwrap();
            prop_assert!(relative_error_complex(&back, &a) <= 1e-6);
        }

        #[test]
        fn qr_reconstructs(a in real_matrix(5, 3)) {
            let f = a.qr().unwrap();
            prop_assert!(relative_error(&f.q.matmul(&f.r).unwrap(), &a) <= 1e-2);
        }

        #[test]
        fn cholesky_reconstructs(b in complex_matrix(4, 4)) {
            // (M + M^H) / 2 + I with M = B^H B is exactly Hermitian and
            // positive definite.
            let m = b.adjoint().matmul(&b).unwrap();
            let a = m
                .try_add(&m.adjoint())
                .unwrap()
                .scale(Complex64::new(0.5, 0.0))
                .try_add(&MatrixComplex::identity(4))
                .unwrap();
            let l = a.cholesky().unwrap();
            let back = l.matmul(&l.adjoint()).unwrap();
            prop_assert!(relative_error_complex(&back, &a) <= 1e-14);
        }

        #[test]
        fn hessenberg_reconstructs(a in real_matrix(5, 5)) {
            let f = a.hessenberg().unwrap();
            let back = f.q.matmul(&f.h).unwrap().matmul(&f.q.adjoint()).unwrap();
            prop_assert!(relative_error(&back, &a) <= 1e-7);
        }

        #[test]
        fn determinant_is_multiplicative(a in real_matrix(3, 3), b in real_matrix(3, 3)) {
            let ab = a.matmul(&b).unwrap().determinant().unwrap();
            let product = a.determinant().unwrap() * b.determinant().unwrap();
            let scale = a.euclidean_norm().powi(3) * b.euclidean_norm().powi(3);
            prop_assert!((ab - product).abs() <= 1e-11 * scale.max(1.0));
        }

        #[test]
        fn dct_round_trip(x in prop::collection::vec(-100.0f64..100.0, 1..16)) {
            let n = x.len();
            let m = MatrixReal::build(n, 1, &x).unwrap();
            let back = m.dct().idct();
            prop_assert!(relative_error(&back, &m) <= 1e-14 || m.euclidean_norm() == 0.0);
        }
    }
}
