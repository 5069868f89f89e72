//! Text folds that make answers comparable despite superficial differences.
//!
//! All functions are total and pure: empty input gives an empty string.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const ASCII_DIGITS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];
const SUBSCRIPT_DIGITS: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];

/// Lower-case, trim, then drop diacritical marks ("Óxido" → "oxido").
pub fn fold_for_name_comparison(text: &str) -> String {
    text.to_lowercase()
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Swap the two digit alphabets: ASCII digits become subscript glyphs and
/// subscript glyphs become ASCII digits. Applying it twice restores the input.
pub fn fold_subscript_digits(text: &str) -> String {
    text.chars()
        .map(|c| {
            if let Some(i) = ASCII_DIGITS.iter().position(|d| *d == c) {
                SUBSCRIPT_DIGITS[i]
            } else if let Some(i) = SUBSCRIPT_DIGITS.iter().position(|d| *d == c) {
                ASCII_DIGITS[i]
            } else {
                c
            }
        })
        .collect()
}

/// Subscript glyphs → ASCII digits. Canonical form used when judging formulas.
pub fn strip_subscripts(text: &str) -> String {
    text.chars()
        .map(|c| match SUBSCRIPT_DIGITS.iter().position(|d| *d == c) {
            Some(i) => ASCII_DIGITS[i],
            None => c,
        })
        .collect()
}

/// ASCII digits → subscript glyphs, for displaying a formula ("H2SO4" → "H₂SO₄").
pub fn beautify_formula(text: &str) -> String {
    text.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) if c.is_ascii_digit() => SUBSCRIPT_DIGITS[d as usize],
            _ => c,
        })
        .collect()
}
