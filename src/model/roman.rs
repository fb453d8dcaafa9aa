//! Conversion between arabic and roman numerals.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;

const NUMERALS: [(&str, u32); 13] = [
    ("M", 1000),
    ("CM", 900),
    ("D", 500),
    ("CD", 400),
    ("C", 100),
    ("XC", 90),
    ("L", 50),
    ("XL", 40),
    ("X", 10),
    ("IX", 9),
    ("V", 5),
    ("IV", 4),
    ("I", 1),
];

fn valid_numeral() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^M{0,4}(CM|CD|D?C{0,3})(XC|XL|L?X{0,3})(IX|IV|V?I{0,3})$").unwrap()
    })
}

/// Convert an integer in `1..=4999` to a roman numeral.
pub fn to_roman(mut n: u32) -> Result<String> {
    if n == 0 || n > 4999 {
        return Err(Error::Other(format!(
            "number out of range (must be 1..4999): {}",
            n
        )));
    }
    let mut result = String::new();
    for (numeral, value) in NUMERALS {
        while n >= value {
            result.push_str(numeral);
            n -= value;
        }
    }
    Ok(result)
}

/// Convert a roman numeral to an integer. Lower case input is accepted.
pub fn from_roman(s: &str) -> Result<u32> {
    let s = s.trim().to_uppercase();
    if s.is_empty() {
        return Err(Error::Other("input can not be blank".into()));
    }
    if !valid_numeral().is_match(&s) {
        return Err(Error::Other(format!("invalid roman numeral: {}", s)));
    }
    let mut result = 0;
    let mut rest = s.as_str();
    for (numeral, value) in NUMERALS {
        while let Some(stripped) = rest.strip_prefix(numeral) {
            result += value;
            rest = stripped;
        }
    }
    Ok(result)
}
