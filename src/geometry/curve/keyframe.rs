use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, PathError, Result};
use crate::math::hermite::{hermite, hermite_derivative};

/// A single sample of a scalar curve.
///
/// Tangents are slopes in value units per time unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub value: f64,
    #[serde(default)]
    pub in_tangent: f64,
    #[serde(default)]
    pub out_tangent: f64,
}

impl Keyframe {
    /// Creates a keyframe with flat tangents.
    #[must_use]
    pub fn new(time: f64, value: f64) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }

    /// Creates a keyframe with explicit tangents.
    #[must_use]
    pub fn with_tangents(time: f64, value: f64, in_tangent: f64, out_tangent: f64) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }

    fn check_finite(&self) -> Result<()> {
        if !self.time.is_finite() {
            return Err(GeometryError::NonFinite("key time").into());
        }
        if !self.value.is_finite() {
            return Err(GeometryError::NonFinite("key value").into());
        }
        if !self.in_tangent.is_finite() || !self.out_tangent.is_finite() {
            return Err(GeometryError::NonFinite("key tangent").into());
        }
        Ok(())
    }
}

/// A scalar function of time defined by Hermite-interpolated keyframes.
///
/// Keys are kept sorted by strictly ascending time. Outside the key range
/// the curve holds the value of the nearest end key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct KeyframeCurve {
    keys: Vec<Keyframe>,
}

impl TryFrom<Vec<Keyframe>> for KeyframeCurve {
    type Error = crate::error::MotionPathError;

    fn try_from(keys: Vec<Keyframe>) -> Result<Self> {
        Self::from_keys(keys)
    }
}

impl From<KeyframeCurve> for Vec<Keyframe> {
    fn from(curve: KeyframeCurve) -> Self {
        curve.keys
    }
}

impl KeyframeCurve {
    /// Creates an empty curve.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a curve from unordered keys.
    ///
    /// Keys are sorted by time. When several keys share a time the last one
    /// in `keys` wins, matching the overwrite policy of [`Self::insert`].
    ///
    /// # Errors
    ///
    /// Returns an error if any key holds a non-finite number.
    pub fn from_keys(keys: Vec<Keyframe>) -> Result<Self> {
        for key in &keys {
            key.check_finite()?;
        }
        let mut curve = Self::new();
        for key in keys {
            curve.insert(key)?;
        }
        Ok(curve)
    }

    /// Wraps keys that are already sorted with distinct finite times.
    pub(crate) fn from_sorted(keys: Vec<Keyframe>) -> Self {
        debug_assert!(keys.windows(2).all(|pair| pair[0].time < pair[1].time));
        Self { keys }
    }

    /// Returns the keys in time order.
    #[must_use]
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns whether the curve has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the key at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Index`] if `index` is out of range.
    pub fn key(&self, index: usize) -> Result<&Keyframe> {
        self.keys
            .get(index)
            .ok_or_else(|| PathError::key_index(index, self.keys.len()).into())
    }

    /// Returns `(first_time, last_time)`, or `None` for an empty curve.
    #[must_use]
    pub fn time_range(&self) -> Option<(f64, f64)> {
        Some((self.keys.first()?.time, self.keys.last()?.time))
    }

    /// Evaluates the curve at `t`, clamping `t` to the key range.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Domain`] if the curve has no keys.
    pub fn evaluate(&self, t: f64) -> Result<f64> {
        let (start, end) = self.time_range().ok_or(PathError::Domain)?;
        let t = t.clamp(start, end);
        match self.segment_at(t) {
            None => Ok(self.keys[0].value),
            Some(i) => {
                let (k0, k1) = (&self.keys[i], &self.keys[i + 1]);
                let dt = k1.time - k0.time;
                let s = (t - k0.time) / dt;
                Ok(hermite(
                    k0.value,
                    k0.out_tangent * dt,
                    k1.value,
                    k1.in_tangent * dt,
                    s,
                ))
            }
        }
    }

    /// Returns the slope of the curve at `t`.
    ///
    /// The slope is zero outside the key range, where the curve is held
    /// constant.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Domain`] if the curve has no keys.
    pub fn derivative(&self, t: f64) -> Result<f64> {
        let (start, end) = self.time_range().ok_or(PathError::Domain)?;
        if t < start || t > end {
            return Ok(0.0);
        }
        match self.segment_at(t) {
            None => Ok(0.0),
            Some(i) => {
                let (k0, k1) = (&self.keys[i], &self.keys[i + 1]);
                let dt = k1.time - k0.time;
                let s = (t - k0.time) / dt;
                let d = hermite_derivative(
                    k0.value,
                    k0.out_tangent * dt,
                    k1.value,
                    k1.in_tangent * dt,
                    s,
                );
                Ok(d / dt)
            }
        }
    }

    /// Inserts `key` in time order and returns its index.
    ///
    /// A key already present at the same time is overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the key holds a non-finite number.
    pub fn insert(&mut self, key: Keyframe) -> Result<usize> {
        key.check_finite()?;
        let index = self.keys.partition_point(|k| k.time < key.time);
        match self.keys.get_mut(index) {
            #[allow(clippy::float_cmp)]
            Some(existing) if existing.time == key.time => *existing = key,
            _ => self.keys.insert(index, key),
        }
        Ok(index)
    }

    /// Inserts a key with flat tangents and returns its index.
    ///
    /// # Errors
    ///
    /// Returns an error if `time` or `value` is non-finite.
    pub fn insert_key(&mut self, time: f64, value: f64) -> Result<usize> {
        self.insert(Keyframe::new(time, value))
    }

    /// Inserts a key at `time` whose value and tangents are taken from the
    /// curve itself, so the curve passes through the new key unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Domain`] if the curve has no keys.
    pub fn insert_key_preserving_shape(&mut self, time: f64) -> Result<usize> {
        let value = self.evaluate(time)?;
        let slope = self.derivative(time)?;
        self.insert(Keyframe::with_tangents(time, value, slope, slope))
    }

    /// Moves the key at `index` to a new time and value, keeping its tangents.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Index`] for a bad index and [`PathError::Ordering`]
    /// if `new_time` is not strictly between the neighboring keys' times.
    pub fn move_key(&mut self, index: usize, new_time: f64, new_value: f64) -> Result<()> {
        self.check_retime(index, new_time)?;
        if !new_value.is_finite() {
            return Err(GeometryError::NonFinite("key value").into());
        }
        let key = &mut self.keys[index];
        key.time = new_time;
        key.value = new_value;
        Ok(())
    }

    /// Changes only the time of the key at `index`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::move_key`].
    pub fn set_key_time(&mut self, index: usize, new_time: f64) -> Result<()> {
        self.check_retime(index, new_time)?;
        self.keys[index].time = new_time;
        Ok(())
    }

    /// Retimes several keys at once.
    ///
    /// The new times are applied together and only the final ordering is
    /// checked, so keys may pass over each other's old times. On failure the
    /// curve is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Index`] for a bad index and [`PathError::Ordering`]
    /// if the resulting times are not strictly ascending.
    pub fn set_key_times(&mut self, times: &[(usize, f64)]) -> Result<()> {
        let n = self.keys.len();
        let mut staged = self.keys.clone();
        for &(index, time) in times {
            let key = staged
                .get_mut(index)
                .ok_or_else(|| PathError::key_index(index, n))?;
            key.time = time;
        }
        for (index, key) in staged.iter().enumerate() {
            let after_prev = index == 0 || staged[index - 1].time < key.time;
            if !key.time.is_finite() || !after_prev {
                return Err(PathError::Ordering {
                    index,
                    time: key.time,
                }
                .into());
            }
        }
        self.keys = staged;
        Ok(())
    }

    /// Changes only the value of the key at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Index`] for a bad index.
    pub fn set_key_value(&mut self, index: usize, new_value: f64) -> Result<()> {
        let count = self.keys.len();
        if !new_value.is_finite() {
            return Err(GeometryError::NonFinite("key value").into());
        }
        let key = self
            .keys
            .get_mut(index)
            .ok_or_else(|| PathError::key_index(index, count))?;
        key.value = new_value;
        Ok(())
    }

    /// Removes and returns the key at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Index`] for a bad index.
    pub fn remove_key(&mut self, index: usize) -> Result<Keyframe> {
        if index >= self.keys.len() {
            return Err(PathError::key_index(index, self.keys.len()).into());
        }
        Ok(self.keys.remove(index))
    }

    /// Sets every tangent to the chord slope of its segment, making the curve
    /// piecewise linear.
    ///
    /// The first key's in-tangent and the last key's out-tangent face away
    /// from the curve and are set to zero.
    pub fn set_linear_tangents(&mut self) {
        let n = self.keys.len();
        if let Some(first) = self.keys.first_mut() {
            first.in_tangent = 0.0;
        }
        if let Some(last) = self.keys.last_mut() {
            last.out_tangent = 0.0;
        }
        for i in 0..n.saturating_sub(1) {
            let slope = self.chord_slope(i);
            self.keys[i].out_tangent = slope;
            self.keys[i + 1].in_tangent = slope;
        }
    }

    /// Recomputes both tangents of the key at `index` from its neighbors.
    ///
    /// Interior keys take the Catmull-Rom slope between the previous and next
    /// key; end keys take the slope of their single segment. The result is
    /// scaled by `1 - weight`, with `weight` clamped to `[0, 1]`: `0` gives
    /// the plain smooth tangent, `1` a flat one.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Index`] for a bad index, or an error if `weight`
    /// is NaN.
    pub fn smooth_tangent(&mut self, index: usize, weight: f64) -> Result<()> {
        let n = self.keys.len();
        if index >= n {
            return Err(PathError::key_index(index, n).into());
        }
        if weight.is_nan() {
            return Err(GeometryError::NonFinite("smoothing weight").into());
        }
        let slope = if n == 1 {
            0.0
        } else if index == 0 {
            self.chord_slope(0)
        } else if index == n - 1 {
            self.chord_slope(n - 2)
        } else {
            let (prev, next) = (&self.keys[index - 1], &self.keys[index + 1]);
            (next.value - prev.value) / (next.time - prev.time)
        };
        let tangent = slope * (1.0 - weight.clamp(0.0, 1.0));
        let key = &mut self.keys[index];
        key.in_tangent = tangent;
        key.out_tangent = tangent;
        Ok(())
    }

    /// Overwrites both tangents of the key at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Index`] for a bad index, or an error on
    /// non-finite tangents.
    pub fn set_tangents(&mut self, index: usize, in_tangent: f64, out_tangent: f64) -> Result<()> {
        let count = self.keys.len();
        if !in_tangent.is_finite() || !out_tangent.is_finite() {
            return Err(GeometryError::NonFinite("key tangent").into());
        }
        let key = self
            .keys
            .get_mut(index)
            .ok_or_else(|| PathError::key_index(index, count))?;
        key.in_tangent = in_tangent;
        key.out_tangent = out_tangent;
        Ok(())
    }

    /// Index of the segment `(i, i + 1)` containing `t`, or `None` when the
    /// curve has a single key. `t` must already lie within the key range.
    fn segment_at(&self, t: f64) -> Option<usize> {
        let n = self.keys.len();
        if n < 2 {
            return None;
        }
        let upper = self.keys.partition_point(|k| k.time <= t);
        Some(upper.saturating_sub(1).min(n - 2))
    }

    fn chord_slope(&self, i: usize) -> f64 {
        let (k0, k1) = (&self.keys[i], &self.keys[i + 1]);
        (k1.value - k0.value) / (k1.time - k0.time)
    }

    fn check_retime(&self, index: usize, new_time: f64) -> Result<()> {
        let n = self.keys.len();
        if index >= n {
            return Err(PathError::key_index(index, n).into());
        }
        let after_prev = index == 0 || self.keys[index - 1].time < new_time;
        let before_next = index + 1 == n || new_time < self.keys[index + 1].time;
        if !new_time.is_finite() || !after_prev || !before_next {
            return Err(PathError::Ordering {
                index,
                time: new_time,
            }
            .into());
        }
        Ok(())
    }
}
