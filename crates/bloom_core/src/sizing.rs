//! Parameter derivation: capacity plus one of three sizing policies resolves
//! to a bit count and hash count.
use crate::errors::{BloomError, Result};
use crate::table;
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;
use tracing::debug;

/// How a filter's bits-per-element and k are chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sizing {
    /// Caller-chosen layout; error rate is left undefined (NaN).
    Explicit { bits_per_element: u32, k: u32 },
    /// Smallest tabulated bits-per-element reaching `error_rate` at this k.
    ErrorRateWithK { error_rate: f64, k: u32 },
    /// `bpe = ceil(-ln p / ln²2)`, `k = round(ln 2 · bpe)`.
    OptimalK { error_rate: f64 },
}

/// Resolved, immutable filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    pub capacity: u64,
    pub bits_per_element: u32,
    pub k: u32,
    /// NaN when sized explicitly. Serialized as `null` in that case.
    #[serde(with = "nan_as_null")]
    pub error_rate: f64,
    pub n_bits: u64,
}

impl Sizing {
    pub fn resolve(self, capacity: u64) -> Result<FilterParams> {
        if capacity == 0 {
            return Err(BloomError::InvalidParameters("capacity must be positive".into()));
        }
        let (bits_per_element, k, error_rate) = match self {
            Sizing::Explicit { bits_per_element, k } => (bits_per_element, k, f64::NAN),
            Sizing::ErrorRateWithK { error_rate, k } => {
                let (bpe, achieved) = table::lookup(error_rate, k)?;
                (bpe, k, achieved)
            }
            Sizing::OptimalK { error_rate } => {
                let (bpe, k) = optimal(error_rate)?;
                (bpe, k, error_rate)
            }
        };
        let n_bits = capacity.checked_mul(bits_per_element as u64).unwrap_or(0);
        let params = FilterParams { capacity, bits_per_element, k, error_rate, n_bits };
        params.validate()?;
        debug!(sizing = ?self, capacity, bits_per_element, k, error_rate, n_bits, "resolved sizing");
        Ok(params)
    }
}

fn optimal(error_rate: f64) -> Result<(u32, u32)> {
    if !(error_rate > 0.0 && error_rate < 1.0) {
        return Err(BloomError::InvalidParameters(format!(
            "error_rate {error_rate} must be in (0, 1)"
        )));
    }
    let bpe = (-error_rate.ln() / (LN_2 * LN_2)).ceil();
    if bpe > u32::MAX as f64 {
        return Err(BloomError::InvalidParameters(format!("error_rate {error_rate} too small")));
    }
    let k = (LN_2 * bpe).round().max(1.0);
    Ok((bpe as u32, k as u32))
}

impl FilterParams {
    /// Check the layout invariants: every count positive and
    /// `n_bits == capacity * bits_per_element`.
    pub fn validate(&self) -> Result<()> {
        let FilterParams { capacity, bits_per_element, k, n_bits, .. } = *self;
        if capacity == 0 || bits_per_element == 0 || k == 0 {
            return Err(BloomError::InvalidParameters(format!(
                "capacity={capacity}, bits_per_element={bits_per_element} and k={k} must all be positive"
            )));
        }
        match capacity.checked_mul(bits_per_element as u64) {
            None => Err(BloomError::InvalidParameters(format!(
                "capacity {capacity} x {bits_per_element} bits overflows"
            ))),
            Some(want) if want != n_bits => Err(BloomError::InvalidParameters(format!(
                "n_bits={n_bits} but capacity x bits_per_element = {want}"
            ))),
            Some(_) => Ok(()),
        }
    }

    /// Closed-form false-positive rate at the actual `(bits_per_element, k)`.
    pub fn estimated_error_rate(&self) -> f64 {
        table::false_positive_rate(self.bits_per_element as f64, self.k)
    }
}

mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        if v.is_nan() { s.serialize_none() } else { s.serialize_some(v) }
    }
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NAN))
    }
}
