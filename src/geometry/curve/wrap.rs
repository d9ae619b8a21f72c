use serde::{Deserialize, Serialize};

use super::CurveDomain;

/// Policy for evaluating a path at times outside its domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapMode {
    /// Clamp to the nearest end.
    #[default]
    Once,
    /// Restart from the beginning after the end.
    Loop,
    /// Play forward, then backward, and repeat.
    PingPong,
}

impl WrapMode {
    /// Maps `t` into `domain` according to this mode.
    ///
    /// Times already inside the domain are returned unchanged.
    #[must_use]
    pub fn apply(self, t: f64, domain: CurveDomain) -> f64 {
        let CurveDomain { t_min, t_max } = domain;
        if (t_min..=t_max).contains(&t) {
            return t;
        }
        let span = t_max - t_min;
        if span <= 0.0 || !t.is_finite() {
            return t.clamp(t_min, t_max);
        }
        match self {
            Self::Once => t.clamp(t_min, t_max),
            Self::Loop => t_min + (t - t_min).rem_euclid(span),
            Self::PingPong => {
                let phase = (t - t_min).rem_euclid(2.0 * span);
                if phase <= span {
                    t_min + phase
                } else {
                    t_min + 2.0 * span - phase
                }
            }
        }
    }
}
