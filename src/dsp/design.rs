//! Butterworth filter design
//!
//! Turns a band specification into cascaded second-order sections (SOS).
//! The design path is the classic one: analog Butterworth prototype,
//! frequency pre-warping, low/high/band-pass transform, bilinear transform,
//! then pairing poles and zeros into biquads.
//!
//! Cutoffs at or above Nyquist are clamped to 0.99 x Nyquist so that bands
//! like "5 kHz and up" still design cleanly at low sample rates.

use std::f64::consts::PI;
use std::fmt;

use log::debug;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{Result, UnmixError};

/// Default Butterworth order per band edge
pub const DEFAULT_ORDER: usize = 4;

/// Fraction of Nyquist that over-range cutoffs are clamped to
pub const NYQUIST_CLAMP: f64 = 0.99;

/// Sample rate of the bilinear transform's analog domain (normalized units)
const BILINEAR_FS: f64 = 2.0;

/// Imaginary parts below this are treated as real poles
const REAL_POLE_TOLERANCE: f64 = 1e-10;

/// Shape of a designed filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandKind {
    /// Pass below the high cutoff
    LowPass,
    /// Pass above the low cutoff
    HighPass,
    /// Pass between the low and high cutoffs
    BandPass,
}

impl fmt::Display for BandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowPass => write!(f, "low-pass"),
            Self::HighPass => write!(f, "high-pass"),
            Self::BandPass => write!(f, "band-pass"),
        }
    }
}

/// Frequency band to isolate
///
/// A missing `low_hz` means "no lower bound", a missing `high_hz` means
/// "no upper bound".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandSpec {
    /// Band label used in logs and errors (e.g. "kick")
    pub name: &'static str,
    /// Lower cutoff in Hz
    pub low_hz: Option<f64>,
    /// Upper cutoff in Hz
    pub high_hz: Option<f64>,
    /// Butterworth order per edge
    pub order: usize,
}

impl BandSpec {
    /// Low-pass band: everything up to `high_hz`
    pub const fn low_pass(name: &'static str, high_hz: f64) -> Self {
        Self {
            name,
            low_hz: None,
            high_hz: Some(high_hz),
            order: DEFAULT_ORDER,
        }
    }

    /// High-pass band: everything from `low_hz` up
    pub const fn high_pass(name: &'static str, low_hz: f64) -> Self {
        Self {
            name,
            low_hz: Some(low_hz),
            high_hz: None,
            order: DEFAULT_ORDER,
        }
    }

    /// Band-pass band between `low_hz` and `high_hz`
    pub const fn band_pass(name: &'static str, low_hz: f64, high_hz: f64) -> Self {
        Self {
            name,
            low_hz: Some(low_hz),
            high_hz: Some(high_hz),
            order: DEFAULT_ORDER,
        }
    }

    /// Override the filter order
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Filter shape implied by which cutoffs are present
    pub fn kind(&self) -> Result<BandKind> {
        match (self.low_hz, self.high_hz) {
            (None, Some(_)) => Ok(BandKind::LowPass),
            (Some(_), None) => Ok(BandKind::HighPass),
            (Some(_), Some(_)) => Ok(BandKind::BandPass),
            (None, None) => Err(self.invalid("at least one cutoff is required")),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> UnmixError {
        UnmixError::InvalidBandSpec {
            element: self.name.to_string(),
            reason: reason.into(),
        }
    }

    /// Clamp a cutoff into (0, Nyquist)
    fn clamp_cutoff(&self, hz: f64, nyquist: f64) -> Result<f64> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(self.invalid(format!("cutoff {} Hz must be positive", hz)));
        }
        if hz >= nyquist {
            let clamped = nyquist * NYQUIST_CLAMP;
            debug!(
                "{}: cutoff {:.1} Hz >= Nyquist {:.1} Hz, clamped to {:.1} Hz",
                self.name, hz, nyquist, clamped
            );
            return Ok(clamped);
        }
        Ok(hz)
    }
}

/// One second-order section
///
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    /// Numerator coefficients
    pub b: [f64; 3],
    /// Denominator coefficients, `a[0]` is always 1
    pub a: [f64; 3],
}

impl Section {
    /// DC gain of this section
    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// Roots of the denominator
    pub fn poles(&self) -> [Complex64; 2] {
        let [_, a1, a2] = self.a;
        let disc = Complex64::new(a1 * a1 - 4.0 * a2, 0.0).sqrt();
        [(disc - a1) / 2.0, (-disc - a1) / 2.0]
    }

    /// Complex response at `z^-1 = zinv`
    fn response(&self, zinv: Complex64) -> Complex64 {
        let zinv2 = zinv * zinv;
        let num = zinv * self.b[1] + zinv2 * self.b[2] + self.b[0];
        let den = zinv * self.a[1] + zinv2 * self.a[2] + 1.0;
        num / den
    }
}

/// Designed filter as cascaded second-order sections
///
/// The overall gain is folded into the first section. Sections are ordered
/// so the poles closest to the unit circle come last.
#[derive(Debug, Clone, PartialEq)]
pub struct SosFilter {
    sections: Vec<Section>,
    kind: BandKind,
    low_hz: Option<f64>,
    high_hz: Option<f64>,
    sample_rate: u32,
}

impl SosFilter {
    /// The cascaded sections
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Filter shape
    pub fn kind(&self) -> BandKind {
        self.kind
    }

    /// Effective (post-clamp) lower cutoff
    pub fn low_hz(&self) -> Option<f64> {
        self.low_hz
    }

    /// Effective (post-clamp) upper cutoff
    pub fn high_hz(&self) -> Option<f64> {
        self.high_hz
    }

    /// Sample rate the filter was designed for
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// All poles of the cascade
    pub fn poles(&self) -> Vec<Complex64> {
        self.sections.iter().flat_map(|s| s.poles()).collect()
    }

    /// True when every pole lies strictly inside the unit circle
    pub fn is_stable(&self) -> bool {
        self.poles().iter().all(|p| p.norm() < 1.0)
    }

    /// Magnitude response at `freq_hz`
    pub fn magnitude_at(&self, freq_hz: f64) -> f64 {
        let w = 2.0 * PI * freq_hz / self.sample_rate as f64;
        let zinv = Complex64::from_polar(1.0, -w);
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(zinv))
            .norm()
    }
}

/// Design a Butterworth filter realizing `spec` at `sample_rate`
///
/// # Errors
/// `InvalidBandSpec` if the sample rate is zero, the order is zero, no cutoff
/// is given, a cutoff is not positive, the band collapses after clamping
/// (low >= high), or the resulting filter is not stable.
pub fn design(spec: &BandSpec, sample_rate: u32) -> Result<SosFilter> {
    if sample_rate == 0 {
        return Err(spec.invalid("sample rate must be positive"));
    }
    if spec.order == 0 {
        return Err(spec.invalid("filter order must be positive"));
    }

    let kind = spec.kind()?;
    let nyquist = sample_rate as f64 / 2.0;
    let low_hz = spec
        .low_hz
        .map(|hz| spec.clamp_cutoff(hz, nyquist))
        .transpose()?;
    let high_hz = spec
        .high_hz
        .map(|hz| spec.clamp_cutoff(hz, nyquist))
        .transpose()?;

    let prototype = Zpk::butterworth(spec.order);
    let analog = match (kind, low_hz, high_hz) {
        (BandKind::LowPass, _, Some(high)) => prototype.lp2lp(prewarp(high / nyquist)),
        (BandKind::HighPass, Some(low), _) => prototype.lp2hp(prewarp(low / nyquist)),
        (BandKind::BandPass, Some(low), Some(high)) => {
            if low >= high {
                return Err(spec.invalid(format!(
                    "low cutoff {:.1} Hz must be below high cutoff {:.1} Hz at {} Hz",
                    low, high, sample_rate
                )));
            }
            let w_low = prewarp(low / nyquist);
            let w_high = prewarp(high / nyquist);
            prototype.lp2bp((w_low * w_high).sqrt(), w_high - w_low)
        }
        _ => return Err(spec.invalid("cutoffs do not match the filter kind")),
    };

    let filter = SosFilter {
        sections: analog.bilinear().into_sections(),
        kind,
        low_hz,
        high_hz,
        sample_rate,
    };

    if !filter.is_stable() {
        return Err(spec.invalid(format!("{} design at {} Hz is unstable", kind, sample_rate)));
    }

    debug!(
        "Designed {} {} (order {}, {:?}..{:?} Hz) at {} Hz: {} sections",
        spec.name,
        kind,
        spec.order,
        low_hz,
        high_hz,
        sample_rate,
        filter.sections.len()
    );

    Ok(filter)
}

/// Pre-warp a normalized cutoff (fraction of Nyquist) for the bilinear transform
fn prewarp(normalized: f64) -> f64 {
    2.0 * BILINEAR_FS * (PI * normalized / BILINEAR_FS).tan()
}

fn product(values: &[Complex64]) -> Complex64 {
    values.iter().fold(Complex64::new(1.0, 0.0), |acc, &v| acc * v)
}

/// Zeros, poles and gain of a filter
#[derive(Debug, Clone)]
struct Zpk {
    zeros: Vec<Complex64>,
    poles: Vec<Complex64>,
    gain: f64,
}

impl Zpk {
    /// Analog Butterworth prototype with cutoff 1 rad/s
    fn butterworth(order: usize) -> Self {
        let n = order as f64;
        let poles = (0..order)
            .map(|k| {
                let m = 1.0 - n + 2.0 * k as f64;
                -Complex64::from_polar(1.0, PI * m / (2.0 * n))
            })
            .collect();
        Self {
            zeros: Vec::new(),
            poles,
            gain: 1.0,
        }
    }

    fn relative_degree(&self) -> usize {
        self.poles.len() - self.zeros.len()
    }

    fn lp2lp(self, wo: f64) -> Self {
        let degree = self.relative_degree() as i32;
        Self {
            zeros: self.zeros.iter().map(|&z| z * wo).collect(),
            poles: self.poles.iter().map(|&p| p * wo).collect(),
            gain: self.gain * wo.powi(degree),
        }
    }

    fn lp2hp(self, wo: f64) -> Self {
        let degree = self.relative_degree();
        let wo = Complex64::new(wo, 0.0);
        let neg_zeros: Vec<_> = self.zeros.iter().map(|&z| -z).collect();
        let neg_poles: Vec<_> = self.poles.iter().map(|&p| -p).collect();
        let gain = self.gain * (product(&neg_zeros) / product(&neg_poles)).re;

        let mut zeros: Vec<_> = self.zeros.iter().map(|&z| wo / z).collect();
        zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));
        Self {
            zeros,
            poles: self.poles.iter().map(|&p| wo / p).collect(),
            gain,
        }
    }

    fn lp2bp(self, wo: f64, bw: f64) -> Self {
        let degree = self.relative_degree();
        let wo2 = Complex64::new(wo * wo, 0.0);
        let split = |roots: &[Complex64]| -> Vec<Complex64> {
            let scaled: Vec<_> = roots.iter().map(|&r| r * (bw / 2.0)).collect();
            let upper = scaled.iter().map(|&r| r + (r * r - wo2).sqrt());
            let lower = scaled.iter().map(|&r| r - (r * r - wo2).sqrt());
            upper.chain(lower).collect()
        };

        let mut zeros = split(&self.zeros);
        zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));
        Self {
            zeros,
            poles: split(&self.poles),
            gain: self.gain * bw.powi(degree as i32),
        }
    }

    fn bilinear(self) -> Self {
        let degree = self.relative_degree();
        let fs2 = Complex64::new(2.0 * BILINEAR_FS, 0.0);
        let map = |&r: &Complex64| (fs2 + r) / (fs2 - r);

        let num: Vec<_> = self.zeros.iter().map(|&z| fs2 - z).collect();
        let den: Vec<_> = self.poles.iter().map(|&p| fs2 - p).collect();
        let gain = self.gain * (product(&num) / product(&den)).re;

        let mut zeros: Vec<_> = self.zeros.iter().map(map).collect();
        zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(degree));
        Self {
            zeros,
            poles: self.poles.iter().map(map).collect(),
            gain,
        }
    }

    /// Pair poles and zeros into second-order sections
    ///
    /// Butterworth designs only place zeros on the real axis (at +1 or -1
    /// after the bilinear transform), so zeros are paired by value: smallest
    /// with largest. For a band-pass this yields one +1/-1 pair per section.
    fn into_sections(self) -> Vec<Section> {
        let mut pole_groups: Vec<Vec<Complex64>> = Vec::new();
        let mut real_poles: Vec<f64> = Vec::new();
        for p in &self.poles {
            if p.im > REAL_POLE_TOLERANCE {
                pole_groups.push(vec![*p, p.conj()]);
            } else if p.im.abs() <= REAL_POLE_TOLERANCE {
                real_poles.push(p.re);
            }
        }
        real_poles.sort_by(|a, b| a.total_cmp(b));
        for pair in real_poles.chunks(2) {
            pole_groups.push(pair.iter().map(|&r| Complex64::new(r, 0.0)).collect());
        }

        // Poles closest to the unit circle go last
        let radius = |g: &Vec<Complex64>| g.iter().map(|p| p.norm()).fold(0.0, f64::max);
        pole_groups.sort_by(|a, b| radius(a).total_cmp(&radius(b)));

        let mut zeros: Vec<f64> = self.zeros.iter().map(|z| z.re).collect();
        zeros.sort_by(|a, b| a.total_cmp(b));
        let mut zero_groups: Vec<Vec<f64>> = Vec::new();
        let (mut lo, mut hi) = (0usize, zeros.len());
        while lo < hi {
            hi -= 1;
            if lo == hi {
                zero_groups.push(vec![zeros[lo]]);
            } else {
                zero_groups.push(vec![zeros[lo], zeros[hi]]);
            }
            lo += 1;
        }
        // A lone zero belongs with the lone real pole of an odd order
        let (mut single_zeros, mut paired_zeros): (Vec<_>, Vec<_>) =
            zero_groups.into_iter().partition(|g| g.len() == 1);

        let mut sections = Vec::with_capacity(pole_groups.len());
        for poles in &pole_groups {
            let zeros = if poles.len() == 1 {
                single_zeros.pop().or_else(|| paired_zeros.pop())
            } else {
                paired_zeros.pop().or_else(|| single_zeros.pop())
            };
            sections.push(Section {
                b: zeros.map(|g| polynomial(&g)).unwrap_or([1.0, 0.0, 0.0]),
                a: complex_polynomial(poles),
            });
        }

        if let Some(first) = sections.first_mut() {
            for coeff in first.b.iter_mut() {
                *coeff *= self.gain;
            }
        }

        sections
    }
}

/// Monic polynomial coefficients (in z^-1) with the given real roots
fn polynomial(roots: &[f64]) -> [f64; 3] {
    match roots {
        &[r] => [1.0, -r, 0.0],
        &[r1, r2] => [1.0, -(r1 + r2), r1 * r2],
        _ => [1.0, 0.0, 0.0],
    }
}

/// Monic real polynomial coefficients from one or two roots
fn complex_polynomial(roots: &[Complex64]) -> [f64; 3] {
    match roots {
        &[r] => [1.0, -r.re, 0.0],
        &[r1, r2] => [1.0, -(r1 + r2).re, (r1 * r2).re],
        _ => [1.0, 0.0, 0.0],
    }
}
