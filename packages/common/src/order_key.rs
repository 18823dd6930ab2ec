//! # Ordering Key Allocator
//!
//! Fractional indexing keys for sibling ordering. A key is a base-62
//! string with an integer part and an optional fraction; keys compare
//! lexicographically (the digit alphabet is ASCII-ordered), and
//! `key_between` always finds a fresh key strictly between any two
//! existing ones, so an item can be inserted between any two siblings
//! without renumbering the rest.
//!
//! ## Encoding
//!
//! The first character of the integer part encodes its sign and length:
//! `a..=z` for non-negative integers of 1..=26 digits, `A..=Z` for
//! negative ones. `a0` is integer zero, `a1` follows it, `Zz` precedes it.
//! Fractions never end in `0` so that every value has a single canonical
//! spelling.
//!
//! Repeated midpoint insertion between the same two neighbors grows keys
//! by roughly one digit per `log2(62)` insertions. The key space only
//! reports [`OrderKeyError::Exhausted`] at the extreme integer bounds;
//! callers recover by renumbering the affected sibling run.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const BASE: usize = 62;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderKeyError {
    /// No further key can be derived at this edge of the key space.
    #[error("ordering key space exhausted")]
    Exhausted,

    #[error("invalid ordering key: {0}")]
    InvalidKey(String),
}

/// Opaque, totally-ordered sibling ordering token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderKey(String);

impl OrderKey {
    /// Wrap an already-valid key (e.g. one read from the wire).
    pub fn new(s: impl Into<String>) -> Self {
        OrderKey(s.into())
    }

    /// The key given to the first binding of a container.
    pub fn default_key() -> Self {
        OrderKey("a1".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Produce a key strictly between `lower` and `upper`.
///
/// Either bound may be absent: `key_between(None, Some(k))` yields a key
/// below `k`, `key_between(Some(k), None)` a key above it, and
/// `key_between(None, None)` the canonical first key `a0`.
pub fn key_between(
    lower: Option<&OrderKey>,
    upper: Option<&OrderKey>,
) -> Result<OrderKey, OrderKeyError> {
    if let Some(a) = lower {
        validate_key(a.as_str())?;
    }
    if let Some(b) = upper {
        validate_key(b.as_str())?;
    }
    if let (Some(a), Some(b)) = (lower, upper) {
        if a >= b {
            return Err(OrderKeyError::InvalidKey(format!(
                "{} is not below {}",
                a, b
            )));
        }
    }

    match (lower, upper) {
        (None, None) => Ok(OrderKey("a0".to_string())),

        (None, Some(b)) => {
            let b = b.as_str();
            let ib = integer_part(b)?;
            let fb = &b[ib.len()..];
            if ib == smallest_integer() {
                return Ok(OrderKey(format!("{}{}", ib, midpoint("", Some(fb)))));
            }
            if ib < b {
                return Ok(OrderKey(ib.to_string()));
            }
            decrement_integer(ib)?
                .map(OrderKey)
                .ok_or(OrderKeyError::Exhausted)
        }

        (Some(a), None) => {
            let a = a.as_str();
            let ia = integer_part(a)?;
            let fa = &a[ia.len()..];
            match increment_integer(ia)? {
                Some(next) => Ok(OrderKey(next)),
                None => Ok(OrderKey(format!("{}{}", ia, midpoint(fa, None)))),
            }
        }

        (Some(a), Some(b)) => {
            let (a, b) = (a.as_str(), b.as_str());
            let ia = integer_part(a)?;
            let fa = &a[ia.len()..];
            let ib = integer_part(b)?;
            let fb = &b[ib.len()..];
            if ia == ib {
                return Ok(OrderKey(format!("{}{}", ia, midpoint(fa, Some(fb)))));
            }
            let next = increment_integer(ia)?.ok_or(OrderKeyError::Exhausted)?;
            if next.as_str() < b {
                Ok(OrderKey(next))
            } else {
                Ok(OrderKey(format!("{}{}", ia, midpoint(fa, None))))
            }
        }
    }
}

fn digit_index(c: u8) -> Result<usize, OrderKeyError> {
    DIGITS
        .iter()
        .position(|&d| d == c)
        .ok_or_else(|| OrderKeyError::InvalidKey(format!("bad digit {:?}", c as char)))
}

/// Length of the integer part, derived from its head character.
fn integer_length(head: u8) -> Result<usize, OrderKeyError> {
    match head {
        b'a'..=b'z' => Ok((head - b'a') as usize + 2),
        b'A'..=b'Z' => Ok((b'Z' - head) as usize + 2),
        _ => Err(OrderKeyError::InvalidKey(format!(
            "bad head {:?}",
            head as char
        ))),
    }
}

fn integer_part(key: &str) -> Result<&str, OrderKeyError> {
    let head = key
        .as_bytes()
        .first()
        .copied()
        .ok_or_else(|| OrderKeyError::InvalidKey("empty key".to_string()))?;
    let len = integer_length(head)?;
    if key.len() < len {
        return Err(OrderKeyError::InvalidKey(key.to_string()));
    }
    Ok(&key[..len])
}

fn validate_key(key: &str) -> Result<(), OrderKeyError> {
    let int = integer_part(key)?;
    for &c in int.as_bytes()[1..].iter() {
        digit_index(c)?;
    }
    let fraction = &key[int.len()..];
    for &c in fraction.as_bytes() {
        digit_index(c)?;
    }
    if fraction.as_bytes().last() == Some(&DIGITS[0]) {
        return Err(OrderKeyError::InvalidKey(format!(
            "{} has a trailing zero fraction",
            key
        )));
    }
    Ok(())
}

fn smallest_integer() -> String {
    let mut s = String::from("A");
    for _ in 0..26 {
        s.push('0');
    }
    s
}

/// Midpoint of two fraction strings, `a < m < b`.
///
/// `a` may be empty (meaning zero); `b == None` means "just above `a`".
/// Preconditions (maintained by `key_between`): `a < b` when `b` is
/// present, and neither ends in the zero digit.
fn midpoint(a: &str, b: Option<&str>) -> String {
    let ab = a.as_bytes();
    if let Some(b) = b {
        let bb = b.as_bytes();
        // strip the longest common prefix, treating `a` as zero-padded
        let mut n = 0;
        while n < bb.len() && ab.get(n).copied().unwrap_or(DIGITS[0]) == bb[n] {
            n += 1;
        }
        if n > 0 {
            let rest_a = if n < a.len() { &a[n..] } else { "" };
            return format!("{}{}", &b[..n], midpoint(rest_a, Some(&b[n..])));
        }
    }

    let digit_a = if ab.is_empty() {
        0
    } else {
        digit_index(ab[0]).unwrap_or(0)
    };
    let digit_b = match b {
        Some(b) => digit_index(b.as_bytes()[0]).unwrap_or(BASE),
        None => BASE,
    };

    if digit_b > digit_a + 1 {
        let mid = (digit_a + digit_b + 1) / 2;
        return (DIGITS[mid] as char).to_string();
    }

    // consecutive first digits
    if let Some(b) = b {
        if b.len() > 1 {
            return b[..1].to_string();
        }
    }
    let rest_a = if ab.is_empty() { "" } else { &a[1..] };
    format!("{}{}", DIGITS[digit_a] as char, midpoint(rest_a, None))
}

fn increment_integer(x: &str) -> Result<Option<String>, OrderKeyError> {
    let head = x.as_bytes()[0];
    let mut digs: Vec<u8> = x.as_bytes()[1..].to_vec();
    for i in (0..digs.len()).rev() {
        let d = digit_index(digs[i])? + 1;
        if d == BASE {
            digs[i] = DIGITS[0];
        } else {
            digs[i] = DIGITS[d];
            return Ok(Some(compose(head, &digs)));
        }
    }
    // carried past every digit
    match head {
        b'Z' => Ok(Some("a0".to_string())),
        b'z' => Ok(None),
        _ => {
            let next = head + 1;
            if next > b'a' {
                digs.push(DIGITS[0]);
            } else {
                digs.pop();
            }
            Ok(Some(compose(next, &digs)))
        }
    }
}

fn decrement_integer(x: &str) -> Result<Option<String>, OrderKeyError> {
    let head = x.as_bytes()[0];
    let mut digs: Vec<u8> = x.as_bytes()[1..].to_vec();
    for i in (0..digs.len()).rev() {
        match digit_index(digs[i])?.checked_sub(1) {
            Some(d) => {
                digs[i] = DIGITS[d];
                return Ok(Some(compose(head, &digs)));
            }
            None => digs[i] = DIGITS[BASE - 1],
        }
    }
    // borrowed past every digit
    match head {
        b'a' => Ok(Some(format!("Z{}", DIGITS[BASE - 1] as char))),
        b'A' => Ok(None),
        _ => {
            let prev = head - 1;
            if prev < b'Z' {
                digs.push(DIGITS[BASE - 1]);
            } else {
                digs.pop();
            }
            Ok(Some(compose(prev, &digs)))
        }
    }
}

fn compose(head: u8, digs: &[u8]) -> String {
    let mut s = String::with_capacity(1 + digs.len());
    s.push(head as char);
    for &d in digs {
        s.push(d as char);
    }
    s
}
