//! False-positive probability table indexed by (bits per element, k).
//!
//! Entry `[c][k]` is `(1 - e^{-k/c})^k`, the asymptotic false-positive rate of
//! a filter with `c` bits per inserted element and `k` hash positions. Rows
//! cover `c = 1..=32`, columns `k = 1..=12`.
use crate::consts::{MAX_BITS_PER_ELEMENT, MAX_TABLE_K};
use crate::errors::{BloomError, Result};
use std::sync::OnceLock;

type Table = [[f64; MAX_TABLE_K as usize]; MAX_BITS_PER_ELEMENT as usize];

static TABLE: OnceLock<Table> = OnceLock::new();

/// Closed-form false-positive rate for `bits_per_element` and `k`.
pub fn false_positive_rate(bits_per_element: f64, k: u32) -> f64 {
    if bits_per_element <= 0.0 || k == 0 {
        return 1.0;
    }
    let k = k as f64;
    (1.0 - (-k / bits_per_element).exp()).powf(k)
}

fn table() -> &'static Table {
    TABLE.get_or_init(|| {
        let mut t = [[0.0; MAX_TABLE_K as usize]; MAX_BITS_PER_ELEMENT as usize];
        for (row, c) in t.iter_mut().zip(1..=MAX_BITS_PER_ELEMENT) {
            for (cell, k) in row.iter_mut().zip(1..=MAX_TABLE_K) {
                *cell = false_positive_rate(c as f64, k);
            }
        }
        t
    })
}

/// Tabulated rate at `(bits_per_element, k)`, if inside the table.
pub fn rate_at(bits_per_element: u32, k: u32) -> Option<f64> {
    if !(1..=MAX_BITS_PER_ELEMENT).contains(&bits_per_element) || !(1..=MAX_TABLE_K).contains(&k) {
        return None;
    }
    Some(table()[bits_per_element as usize - 1][k as usize - 1])
}

/// Smallest bits-per-element whose tabulated rate at `k` is `<= error_rate`.
///
/// Returns `(bits_per_element, achieved_rate)`; the achieved rate may be
/// strictly better than requested and is the one callers should keep.
pub fn lookup(error_rate: f64, k: u32) -> Result<(u32, f64)> {
    let unsupported = || BloomError::UnsupportedParameters { error_rate, k };
    if k == 0 || k > MAX_TABLE_K || !error_rate.is_finite() || error_rate <= 0.0 {
        return Err(unsupported());
    }
    let col = k as usize - 1;
    table()
        .iter()
        .zip(1..=MAX_BITS_PER_ELEMENT)
        .find(|(row, _)| row[col] <= error_rate)
        .map(|(row, c)| (c, row[col]))
        .ok_or_else(unsupported)
}
