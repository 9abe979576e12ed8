use crate::error::{Error, Result};

/// An implementation of a time-decaying value
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f64) -> f64;

    /// Lowest value the schedule ever reaches
    fn floor(&self) -> f64;

    /// Whether `evaluate` never increases as `t` grows
    fn is_non_increasing(&self) -> bool;

    /// Short human readable name of the schedule
    fn describe(&self) -> &'static str {
        "Decaying"
    }
}

fn validate(rate: f64, vi: f64, vf: f64) -> Result<()> {
    ((rate >= 0.0 && vi > vf) || (rate < 0.0 && vi < vf))
        .then_some(())
        .ok_or_else(|| {
            Error::InvalidArgument(String::from("`vi - vf` must have same sign as `rate`"))
        })
}

/// A constant value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constant {
    value: f64,
}

impl Constant {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Decay for Constant {
    fn evaluate(&self, _t: f64) -> f64 {
        self.value
    }

    fn floor(&self) -> f64 {
        self.value
    }

    fn is_non_increasing(&self) -> bool {
        true
    }

    fn describe(&self) -> &'static str {
        "Constant"
    }
}

/// v(t) = max(v<sub>i</sub> * r<sup>t</sup>, v<sub>f</sub>)
///
/// Evaluating at `t = k` gives the value reached after multiplying `vi` by `rate`
/// `k` times and flooring at `vf`.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometric {
    rate: f64,
    vi: f64,
    vf: f64,
}

impl Geometric {
    /// `rate` must lie in `(0, 1]` and `vi` must not be below `vf`
    pub fn new(rate: f64, vi: f64, vf: f64) -> Result<Self> {
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(Error::InvalidArgument(format!(
                "geometric decay rate must be in (0, 1], got {}",
                rate
            )));
        }
        if !(vi >= vf) {
            return Err(Error::InvalidArgument(String::from(
                "`vi` must not be less than `vf`",
            )));
        }
        Ok(Self { rate, vi, vf })
    }
}

impl Default for Geometric {
    fn default() -> Self {
        Self {
            rate: 0.995,
            vi: 1.0,
            vf: 0.01,
        }
    }
}

impl Decay for Geometric {
    fn evaluate(&self, t: f64) -> f64 {
        let &Self { rate, vi, vf } = self;
        (vi * rate.powf(t)).max(vf)
    }

    fn floor(&self) -> f64 {
        self.vf
    }

    fn is_non_increasing(&self) -> bool {
        self.rate <= 1.0 && self.vi >= self.vf
    }

    fn describe(&self) -> &'static str {
        "Geometrically decreasing"
    }
}

/// v(t) = v<sub>f</sub> + (v<sub>i</sub> - v<sub>f</sub>) * e<sup>-rt</sup>
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exponential {
    rate: f64,
    vi: f64,
    vf: f64,
}

impl Exponential {
    pub fn new(rate: f64, vi: f64, vf: f64) -> Result<Self> {
        validate(rate, vi, vf)?;
        Ok(Self { rate, vi, vf })
    }
}

impl Decay for Exponential {
    fn evaluate(&self, t: f64) -> f64 {
        let &Self { rate, vi, vf } = self;
        vf + (vi - vf) * (-rate * t).exp()
    }

    fn floor(&self) -> f64 {
        self.vf.min(self.vi)
    }

    fn is_non_increasing(&self) -> bool {
        self.rate >= 0.0 && self.vi >= self.vf
    }

    fn describe(&self) -> &'static str {
        "Exponentially decreasing"
    }
}

/// v(t) = v<sub>f</sub> + (v<sub>i</sub> - v<sub>f</sub>) / (1 + rt)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InverseTime {
    rate: f64,
    vi: f64,
    vf: f64,
}

impl InverseTime {
    /// `rate` must not be negative, otherwise `1 + rt` reaches zero
    pub fn new(rate: f64, vi: f64, vf: f64) -> Result<Self> {
        if rate < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "inverse-time decay rate must not be negative, got {}",
                rate
            )));
        }
        validate(rate, vi, vf)?;
        Ok(Self { rate, vi, vf })
    }
}

impl Decay for InverseTime {
    fn evaluate(&self, t: f64) -> f64 {
        let &Self { rate, vi, vf } = self;
        vf + (vi - vf) / (1.0 + rate * t)
    }

    fn floor(&self) -> f64 {
        self.vf.min(self.vi)
    }

    fn is_non_increasing(&self) -> bool {
        self.rate >= 0.0 && self.vi >= self.vf
    }

    fn describe(&self) -> &'static str {
        "Inverse-time decreasing"
    }
}

/// v(t) = max(v<sub>i</sub> - rt, v<sub>f</sub>)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linear {
    rate: f64,
    vi: f64,
    vf: f64,
}

impl Linear {
    pub fn new(rate: f64, vi: f64, vf: f64) -> Result<Self> {
        validate(rate, vi, vf)?;
        Ok(Self { rate, vi, vf })
    }
}

impl Decay for Linear {
    fn evaluate(&self, t: f64) -> f64 {
        let &Self { rate, vi, vf } = self;
        (vi - rate * t).max(vf)
    }

    fn floor(&self) -> f64 {
        self.vf
    }

    fn is_non_increasing(&self) -> bool {
        self.rate >= 0.0
    }

    fn describe(&self) -> &'static str {
        "Linearly decreasing"
    }
}

/// v(t) = max(v<sub>i</sub> * r<sup>floor(t/s)</sup>, v<sub>f</sub>)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Step {
    rate: f64,
    vi: f64,
    vf: f64,
    step: f64,
}

impl Step {
    pub fn new(rate: f64, vi: f64, vf: f64, step: f64) -> Result<Self> {
        validate(rate, vi, vf)?;
        if !(step > 0.0) {
            return Err(Error::InvalidArgument(String::from(
                "`step` must be positive",
            )));
        }
        Ok(Self { rate, vi, vf, step })
    }
}

impl Decay for Step {
    fn evaluate(&self, t: f64) -> f64 {
        let &Self { rate, vi, vf, step } = self;
        (vi * rate.powf((t / step).floor())).max(vf)
    }

    fn floor(&self) -> f64 {
        self.vf
    }

    fn is_non_increasing(&self) -> bool {
        (0.0..=1.0).contains(&self.rate) && self.vi >= self.vf
    }

    fn describe(&self) -> &'static str {
        "Step decreasing"
    }
}
