//! Tuple and set functions of string flavour
//!
//! Strings are tuples of Integer code points, so searching, splitting and
//! formatting all work on tuples.

use std::fmt::Write as _;

use crate::error::{invalid, ModelError, Result};
use crate::scalar::clamp_to_integer;
use crate::set::Set;
use crate::tuple::{find_subsequence, Tuple};
use crate::variant::Variant;

/// 1-based position of the first occurrence of `needle` in `haystack` at or
/// after `start`, or 0 when absent.
///
/// A tuple needle matches as a contiguous run; any other value matches a
/// single element. An empty needle never matches.
///
/// # Errors
///
/// Returns [`ModelError::InvalidIndex`] for a `start` below 1.
pub fn find(haystack: &Tuple, needle: &Variant, start: i64) -> Result<i64> {
    let from = usize::try_from(start)
        .ok()
        .filter(|&s| s >= 1)
        .ok_or(ModelError::InvalidIndex {
            index: start,
            size: haystack.len() as u64,
        })?
        - 1;
    if from > haystack.len() {
        return Ok(0);
    }
    let single = [needle.clone()];
    let pattern = match needle {
        Variant::Tuple(t) => t.as_slice(),
        _ => &single[..],
    };
    Ok(find_subsequence(haystack.as_slice(), pattern, from).map_or(0, |i| i as i64 + 1))
}

enum Separator<'a> {
    Run(&'a [Variant]),
    AnyOf(&'a Set),
}

impl Separator<'_> {
    /// Length of the separator matched at `i`, if any.
    fn match_at(&self, hay: &[Variant], i: usize) -> Option<usize> {
        match self {
            Self::Run(run) => (!run.is_empty() && hay[i..].starts_with(run)).then_some(run.len()),
            Self::AnyOf(set) => set.contains(&hay[i]).then_some(1),
        }
    }
}

/// Split `tuple` at every separator.
///
/// A tuple separator matches as a contiguous run and a set separator
/// matches any single element it contains. With `keep_separator` each
/// separator stays at the end of the fragment before it; with `skip_empty`
/// empty fragments are dropped. The result is a tuple of tuples.
///
/// # Errors
///
/// Returns [`ModelError::InvalidParameterValue`] if `separator` is neither a
/// tuple nor a set.
pub fn split(
    tuple: &Tuple,
    separator: &Variant,
    keep_separator: bool,
    skip_empty: bool,
) -> Result<Tuple> {
    let sep = match separator {
        Variant::Tuple(t) => Separator::Run(t.as_slice()),
        Variant::Set(s) => Separator::AnyOf(s),
        other => {
            return Err(invalid(format!(
                "a {} cannot separate a tuple",
                other.kind()
            )))
        }
    };
    let hay = tuple.as_slice();
    let mut fragments = Vec::new();
    let mut push = |fragment: &[Variant]| {
        if !(skip_empty && fragment.is_empty()) {
            fragments.push(Variant::Tuple(Tuple::from_vec(fragment.to_vec())));
        }
    };
    let (mut start, mut i) = (0, 0);
    while i < hay.len() {
        match sep.match_at(hay, i) {
            Some(len) => {
                let end = if keep_separator { i + len } else { i };
                push(&hay[start..end]);
                i += len;
                start = i;
            }
            None => i += 1,
        }
    }
    push(&hay[start..]);
    Ok(Tuple::from_vec(fragments))
}

/// Distinct elements of a tuple.
#[must_use]
pub fn alphabet(tuple: &Tuple) -> Set {
    tuple.iter().cloned().collect()
}

// ============================================================
// Formatting
// ============================================================

#[derive(Debug, Default, Clone, Copy)]
struct Directive {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alternate: bool,
    width: usize,
    precision: Option<usize>,
}

/// Format a scalar into a tuple of code points.
///
/// Without a format, Booleans print as `true`/`false` and numbers in their
/// shortest round-trip form. A format follows C `printf` directives
/// (`%d %i %u %x %X %o %e %E %f %F %g %G %c %s %%` with the usual flags,
/// width and precision); every directive formats `v`.
///
/// # Errors
///
/// Returns [`ModelError::InvalidParameterValue`] for a non-scalar `v` or a
/// malformed directive.
pub fn to_tuple_string(v: &Variant, format: Option<&str>) -> Result<Tuple> {
    if !v.is_scalar() {
        return Err(invalid(format!("cannot format a {}", v.kind())));
    }
    let text = match format {
        None => v.to_string(),
        Some(f) => printf(f, v)?,
    };
    Ok(Tuple::from(text.as_str()))
}

fn printf(format: &str, v: &Variant) -> Result<String> {
    let mut out = String::new();
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let mut directive = Directive::default();
        while let Some(&f) = chars.peek() {
            match f {
                '-' => directive.left = true,
                '+' => directive.plus = true,
                ' ' => directive.space = true,
                '0' => directive.zero = true,
                '#' => directive.alternate = true,
                _ => break,
            }
            chars.next();
        }
        directive.width = digits(&mut chars).unwrap_or(0);
        if chars.peek() == Some(&'.') {
            chars.next();
            directive.precision = Some(digits(&mut chars).unwrap_or(0));
        }
        // Length modifiers carry no meaning here.
        while matches!(chars.peek(), Some('l' | 'h' | 'L' | 'q' | 'j' | 'z' | 't')) {
            chars.next();
        }
        let conv = chars
            .next()
            .ok_or_else(|| invalid(format!("format `{format}` ends inside a directive")))?;
        let body = convert(conv, directive, v)?;
        out.push_str(&body);
    }
    Ok(out)
}

fn digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut n: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        n = Some(n.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
        chars.next();
    }
    n
}

fn real_value(v: &Variant) -> f64 {
    match *v {
        Variant::Boolean(b) => f64::from(u8::from(b)),
        Variant::Integer(i) => i as f64,
        Variant::Real(x) => x,
        Variant::Complex(z) => z.re,
        _ => f64::NAN,
    }
}

fn integer_value(v: &Variant) -> i64 {
    match *v {
        Variant::Boolean(b) => i64::from(b),
        Variant::Integer(i) => i,
        _ => clamp_to_integer(real_value(v).trunc()),
    }
}

fn convert(conv: char, directive: Directive, v: &Variant) -> Result<String> {
    let (sign, body, numeric) = match conv {
        '%' => return Ok("%".to_owned()),
        'd' | 'i' => {
            let i = integer_value(v);
            let digits = i.unsigned_abs().to_string();
            (sign_of(i < 0, directive), precise_digits(digits, directive), true)
        }
        'u' => (String::new(), precise_digits((integer_value(v) as u64).to_string(), directive), true),
        'x' | 'X' | 'o' => {
            let u = integer_value(v) as u64;
            let mut body = match conv {
                'x' => format!("{u:x}"),
                'X' => format!("{u:X}"),
                _ => format!("{u:o}"),
            };
            body = precise_digits(body, directive);
            if directive.alternate && u != 0 {
                body.insert_str(
                    0,
                    match conv {
                        'x' => "0x",
                        'X' => "0X",
                        _ => "0",
                    },
                );
            }
            (String::new(), body, true)
        }
        'f' | 'F' | 'e' | 'E' | 'g' | 'G' => {
            let x = real_value(v);
            let body = float_body(x.abs(), conv, directive);
            (sign_of(x.is_sign_negative() && !x.is_nan(), directive), body, x.is_finite())
        }
        'c' => {
            let c = u32::try_from(integer_value(v))
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| invalid(format!("{v} is not a code point")))?;
            (String::new(), c.to_string(), false)
        }
        's' => {
            let mut s = v.to_string();
            if let Some(p) = directive.precision {
                s = s.chars().take(p).collect();
            }
            (String::new(), s, false)
        }
        other => return Err(invalid(format!("unsupported conversion `%{other}`"))),
    };
    Ok(pad(&sign, &body, directive, numeric))
}

fn sign_of(negative: bool, directive: Directive) -> String {
    if negative {
        "-"
    } else if directive.plus {
        "+"
    } else if directive.space {
        " "
    } else {
        ""
    }
    .to_owned()
}

/// Integer precision is a minimum digit count.
fn precise_digits(digits: String, directive: Directive) -> String {
    match directive.precision {
        Some(0) if digits == "0" => String::new(),
        Some(p) if digits.len() < p => format!("{}{digits}", "0".repeat(p - digits.len())),
        _ => digits,
    }
}

fn pad(sign: &str, body: &str, directive: Directive, numeric: bool) -> String {
    let len = sign.chars().count() + body.chars().count();
    let fill = directive.width.saturating_sub(len);
    if directive.left {
        format!("{sign}{body}{}", " ".repeat(fill))
    } else if directive.zero && numeric {
        format!("{sign}{}{body}", "0".repeat(fill))
    } else {
        format!("{}{sign}{body}", " ".repeat(fill))
    }
}

fn float_body(x: f64, conv: char, directive: Directive) -> String {
    let upper = conv.is_ascii_uppercase();
    if !x.is_finite() {
        let s = if x.is_nan() { "nan" } else { "inf" };
        return if upper { s.to_uppercase() } else { s.to_owned() };
    }
    let body = match conv.to_ascii_lowercase() {
        'f' => {
            let precision = directive.precision.unwrap_or(6);
            let mut s = format!("{x:.precision$}");
            if directive.alternate && !s.contains('.') {
                s.push('.');
            }
            s
        }
        'e' => exponential(x, directive.precision.unwrap_or(6), directive.alternate),
        _ => general(x, directive),
    };
    if upper {
        body.to_uppercase()
    } else {
        body
    }
}

/// `d.ddde+XX` with at least two exponent digits.
fn exponential(x: f64, precision: usize, alternate: bool) -> String {
    let s = format!("{x:.precision$e}");
    let (mantissa, exp) = s.split_once('e').unwrap_or((s.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let mut out = mantissa.to_owned();
    if alternate && !out.contains('.') {
        out.push('.');
    }
    let _ = write!(out, "e{}{:02}", if exp < 0 { '-' } else { '+' }, exp.unsigned_abs());
    out
}

fn general(x: f64, directive: Directive) -> String {
    let p = match directive.precision {
        Some(0) => 1,
        Some(p) => p,
        None => 6,
    };
    let digits = p - 1;
    let probe = format!("{x:.digits$e}");
    let exp: i64 = probe
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);
    let mut s = if exp < -4 || exp >= p as i64 {
        exponential(x, p - 1, directive.alternate)
    } else {
        let decimals = usize::try_from(p as i64 - 1 - exp).unwrap_or(0);
        format!("{x:.decimals$}")
    };
    if !directive.alternate {
        s = strip_zeros(&s);
    }
    s
}

fn strip_zeros(s: &str) -> String {
    let (mantissa, exp) = match s.find('e') {
        Some(i) => s.split_at(i),
        None => (s, ""),
    };
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    format!("{mantissa}{exp}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn t(s: &str) -> Tuple {
        Tuple::from(s)
    }

    fn fmt(format: &str, v: Variant) -> String {
        to_tuple_string(&v, Some(format)).unwrap().to_text().unwrap()
    }

    #[test]
    fn test_find() {
        let hay = t("abcabc");
        assert_eq!(find(&hay, &Variant::from("bc"), 1).unwrap(), 2);
        assert_eq!(find(&hay, &Variant::from("bc"), 3).unwrap(), 5);
        assert_eq!(find(&hay, &Variant::from("bd"), 1).unwrap(), 0);
        assert_eq!(find(&hay, &Variant::Integer('c' as i64), 4).unwrap(), 6);
        assert_eq!(find(&hay, &Variant::from("a"), 9).unwrap(), 0);
        assert_eq!(find(&hay, &Variant::Tuple(Tuple::new()), 1).unwrap(), 0);
        assert!(matches!(
            find(&hay, &Variant::from("a"), 0),
            Err(ModelError::InvalidIndex { index: 0, size: 6 })
        ));
    }

    fn texts(parts: &Tuple) -> Vec<String> {
        parts
            .iter()
            .map(|p| p.to_tuple().unwrap().to_text().unwrap())
            .collect()
    }

    #[test]
    fn test_split_by_run() {
        let parts = split(&t("a, b,, c"), &Variant::from(", "), false, false).unwrap();
        assert_eq!(texts(&parts), ["a", "b,", "c"]);
        let kept = split(&t("a--b--"), &Variant::from("--"), true, false).unwrap();
        assert_eq!(texts(&kept), ["a--", "b--", ""]);
        let skipped = split(&t("a--b--"), &Variant::from("--"), false, true).unwrap();
        assert_eq!(texts(&skipped), ["a", "b"]);
    }

    #[test]
    fn test_split_by_set() {
        let seps = alphabet(&t(" ,"));
        let parts = split(&t("x, y z"), &Variant::Set(seps.clone()), false, false).unwrap();
        assert_eq!(texts(&parts), ["x", "", "y", "z"]);
        let parts = split(&t("x, y z"), &Variant::Set(seps), false, true).unwrap();
        assert_eq!(texts(&parts), ["x", "y", "z"]);
        assert!(split(&t("x"), &Variant::Integer(1), false, false).is_err());
        assert_eq!(split(&Tuple::new(), &Variant::from(","), false, false).unwrap().len(), 1);
    }

    #[test]
    fn test_alphabet() {
        assert_eq!(alphabet(&t("abracadabra")).size(), Some(5));
    }

    #[test]
    fn test_default_format() {
        let s = |v: Variant| to_tuple_string(&v, None).unwrap().to_text().unwrap();
        assert_eq!(s(Variant::Boolean(true)), "true");
        assert_eq!(s(Variant::Boolean(false)), "false");
        assert_eq!(s(Variant::Integer(-42)), "-42");
        assert_eq!(s(Variant::Real(0.25)), "0.25");
        assert_eq!(s(Variant::Complex(Complex64::new(1.0, -1.0))), "1-1i");
        assert!(to_tuple_string(&Variant::from("x"), None).is_err());
    }

    #[test]
    fn test_integer_directives() {
        assert_eq!(fmt("%d", Variant::Integer(42)), "42");
        assert_eq!(fmt("[%5d]", Variant::Integer(42)), "[   42]");
        assert_eq!(fmt("[%-5d]", Variant::Integer(42)), "[42   ]");
        assert_eq!(fmt("%05d", Variant::Integer(-42)), "-0042");
        assert_eq!(fmt("%+d", Variant::Integer(7)), "+7");
        assert_eq!(fmt("%.3d", Variant::Integer(7)), "007");
        assert_eq!(fmt("%x", Variant::Integer(255)), "ff");
        assert_eq!(fmt("%#X", Variant::Integer(255)), "0XFF");
        assert_eq!(fmt("%o", Variant::Integer(8)), "10");
        assert_eq!(fmt("%ld", Variant::Real(3.9)), "3");
        assert_eq!(fmt("%d", Variant::Boolean(true)), "1");
        assert_eq!(fmt("%c", Variant::Integer(65)), "A");
        assert_eq!(fmt("100%%", Variant::Integer(0)), "100%");
    }

    #[test]
    fn test_float_directives() {
        assert_eq!(fmt("%f", Variant::Real(1.5)), "1.500000");
        assert_eq!(fmt("%.2f", Variant::Real(3.14159)), "3.14");
        assert_eq!(fmt("%8.3f", Variant::Real(-2.5)), "  -2.500");
        assert_eq!(fmt("%e", Variant::Real(1234.5)), "1.234500e+03");
        assert_eq!(fmt("%.2E", Variant::Real(0.000123)), "1.23E-04");
        assert_eq!(fmt("%g", Variant::Real(0.0001)), "0.0001");
        assert_eq!(fmt("%g", Variant::Real(1e-5)), "1e-05");
        assert_eq!(fmt("%g", Variant::Real(123456.0)), "123456");
        assert_eq!(fmt("%g", Variant::Real(1234567.0)), "1.23457e+06");
        assert_eq!(fmt("%.3g", Variant::Real(2.5)), "2.5");
        assert_eq!(fmt("%f", Variant::Real(f64::INFINITY)), "inf");
        assert_eq!(fmt("%F", Variant::Real(f64::NAN)), "NAN");
        assert_eq!(fmt("%f", Variant::Integer(2)), "2.000000");
    }

    #[test]
    fn test_string_directive() {
        assert_eq!(fmt("%s", Variant::Boolean(false)), "false");
        assert_eq!(fmt("%.2s", Variant::Boolean(true)), "tr");
        assert_eq!(fmt("<%6s>", Variant::Integer(12)), "<    12>");
    }

    #[test]
    fn test_bad_directives() {
        assert!(to_tuple_string(&Variant::Integer(1), Some("%")).is_err());
        assert!(to_tuple_string(&Variant::Integer(1), Some("%k")).is_err());
        assert!(to_tuple_string(&Variant::Integer(-1), Some("%c")).is_err());
    }
}
