use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{MotionPathError, PathError, Result};
use crate::geometry::{Curve, CurveDomain, WrapMode};
use crate::math::Point3;

use super::AnimationPath;

/// Playback settings for a [`PathAnimator`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAnimatorSettings")]
pub struct AnimatorSettings {
    /// Seconds needed to travel the path's whole time domain once.
    pub duration: f64,
    /// Whether node callbacks fire during playback.
    pub fire_node_events: bool,
}

#[derive(Deserialize)]
#[serde(default)]
struct RawAnimatorSettings {
    duration: f64,
    fire_node_events: bool,
}

impl Default for RawAnimatorSettings {
    fn default() -> Self {
        let settings = AnimatorSettings::default();
        Self {
            duration: settings.duration,
            fire_node_events: settings.fire_node_events,
        }
    }
}

impl TryFrom<RawAnimatorSettings> for AnimatorSettings {
    type Error = MotionPathError;

    fn try_from(raw: RawAnimatorSettings) -> Result<Self> {
        Ok(Self::new(raw.duration)?.with_node_events(raw.fire_node_events))
    }
}

impl Default for AnimatorSettings {
    fn default() -> Self {
        Self {
            duration: 1.0,
            fire_node_events: true,
        }
    }
}

impl AnimatorSettings {
    /// Creates settings with the given duration.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::DegenerateInput`] if `duration` is not a positive
    /// finite number.
    pub fn new(duration: f64) -> Result<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(PathError::DegenerateInput(format!(
                "animation duration must be positive, got {duration}"
            ))
            .into());
        }
        Ok(Self {
            duration,
            ..Self::default()
        })
    }

    /// Enables or disables node callbacks.
    #[must_use]
    pub fn with_node_events(mut self, enabled: bool) -> Self {
        self.fire_node_events = enabled;
        self
    }
}

/// Plays an object along an [`AnimationPath`] for preview.
///
/// Playback time is unbounded; the path's [`WrapMode`] maps it back into
/// the node time range. Node callbacks fire for every node passed during a
/// step, including nodes passed while looping or bouncing.
#[derive(Debug, Clone)]
pub struct PathAnimator {
    settings: AnimatorSettings,
    elapsed: f64,
    started: bool,
}

/// Upper bound on wrap cycles replayed for node callbacks in one step.
const MAX_REPLAYED_CYCLES: f64 = 2.0;

impl PathAnimator {
    /// Creates an animator at the start of the path.
    #[must_use]
    pub fn new(settings: AnimatorSettings) -> Self {
        Self {
            settings,
            elapsed: 0.0,
            started: false,
        }
    }

    /// Playback settings.
    #[must_use]
    pub fn settings(&self) -> AnimatorSettings {
        self.settings
    }

    /// Seconds played since the last rewind.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Returns to the start; the first node fires again on the next step.
    pub fn rewind(&mut self) {
        self.elapsed = 0.0;
        self.started = false;
    }

    /// Current path time, after the wrap mode is applied.
    #[must_use]
    pub fn path_time(&self, path: &AnimationPath) -> f64 {
        let domain = path.path().domain();
        path.path()
            .wrap_mode()
            .apply(self.unwrapped_time(domain), domain)
    }

    /// Advances playback by `dt` seconds and returns the new position.
    ///
    /// Negative `dt` is treated as zero.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Domain`] if the path has no nodes.
    pub fn advance(&mut self, dt: f64, path: &mut AnimationPath) -> Result<Point3> {
        let domain = path.path().domain();
        let from = self.unwrapped_time(domain);
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
        let to = self.unwrapped_time(domain);

        if self.settings.fire_node_events {
            let mode = path.path().wrap_mode();
            let mut first_step = !self.started;
            for (a, b, restart) in travel_pieces(mode, domain, from, to) {
                path.fire_node_events(a, b, first_step || restart)?;
                first_step = false;
            }
        }
        self.started = true;

        let position = path.vector_at_time(to)?;
        trace!(elapsed = self.elapsed, t = to, "advanced animator");
        Ok(position)
    }

    fn unwrapped_time(&self, domain: CurveDomain) -> f64 {
        domain.t_min + self.elapsed / self.settings.duration * domain.span()
    }
}

/// Splits forward travel from `from` to `to` (unwrapped times) into pieces
/// that each lie within one traversal of the domain, mapped into domain time.
///
/// The flag on each piece marks a loop restart, where the node at the start
/// of the domain is reached again.
fn travel_pieces(
    mode: WrapMode,
    domain: CurveDomain,
    from: f64,
    to: f64,
) -> Vec<(f64, f64, bool)> {
    let span = domain.span();
    if mode == WrapMode::Once || span <= 0.0 {
        let clamp = |t: f64| t.clamp(domain.t_min, domain.t_max);
        return vec![(clamp(from), clamp(to), false)];
    }

    let cycle_of = |t: f64| ((t - domain.t_min) / span).floor();
    let last_cycle = cycle_of(to);
    let mut cursor = from;
    let mut cycle = cycle_of(from);
    if last_cycle - cycle > MAX_REPLAYED_CYCLES {
        cycle = last_cycle - MAX_REPLAYED_CYCLES;
        cursor = domain.t_min + cycle * span;
    }

    let mut pieces = Vec::new();
    let mut first = true;
    while cursor < to {
        let cycle_start = domain.t_min + cycle * span;
        let piece_end = to.min(cycle_start + span);
        // Every piece after the first starts exactly on a cycle boundary.
        let a = if first {
            (cursor - cycle_start).clamp(0.0, span)
        } else {
            0.0
        };
        let b = (piece_end - cycle_start).clamp(0.0, span);
        let restart = mode == WrapMode::Loop && cycle >= 1.0 && (!first || a <= 0.0);
        let backward = mode == WrapMode::PingPong && cycle.rem_euclid(2.0) >= 1.0;
        if backward {
            pieces.push((domain.t_max - a, domain.t_max - b, false));
        } else {
            let start = if a <= 0.0 { domain.t_min } else { domain.t_min + a };
            pieces.push((start, domain.t_min + b, restart));
        }
        cursor = piece_end;
        cycle += 1.0;
        first = false;
    }
    pieces
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::VectorPath;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    const UNIT: CurveDomain = CurveDomain {
        t_min: 0.0,
        t_max: 1.0,
    };

    fn recording_path(mode: WrapMode) -> (AnimationPath, Rc<RefCell<Vec<usize>>>) {
        let path = VectorPath::from_waypoints(&[
            (0.0, Point3::new(0.0, 0.0, 0.0)),
            (0.5, Point3::new(1.0, 0.0, 0.0)),
            (1.0, Point3::new(2.0, 0.0, 0.0)),
        ])
        .unwrap();
        let mut path = AnimationPath::new(path);
        path.initialize();
        path.set_nodes_linear().unwrap();
        path.set_wrap_mode(mode);
        let log = Rc::new(RefCell::new(Vec::new()));
        for node in 0..3 {
            let log = Rc::clone(&log);
            path.register_node_event(node, move |ctx| log.borrow_mut().push(ctx.node))
                .unwrap();
        }
        (path, log)
    }

    #[test]
    fn once_clamps_pieces() {
        assert_eq!(travel_pieces(WrapMode::Once, UNIT, 0.8, 1.4), vec![(0.8, 1.0, false)]);
    }

    #[test]
    fn loop_splits_at_cycle_boundary() {
        let pieces = travel_pieces(WrapMode::Loop, UNIT, 0.75, 1.25);
        assert_eq!(pieces.len(), 2);
        assert_relative_eq!(pieces[0].0, 0.75);
        assert_relative_eq!(pieces[0].1, 1.0);
        assert_relative_eq!(pieces[1].0, 0.0);
        assert_relative_eq!(pieces[1].1, 0.25);
        assert!(pieces[1].2);
    }

    #[test]
    fn ping_pong_reverses_on_odd_cycles() {
        let pieces = travel_pieces(WrapMode::PingPong, UNIT, 0.75, 1.25);
        assert_relative_eq!(pieces[1].0, 1.0);
        assert_relative_eq!(pieces[1].1, 0.75);
        assert!(!pieces[1].2);
    }

    #[test]
    fn every_loop_wrap_restarts_at_domain_start() {
        for (t_min, span) in [(0.013, 0.5194), (0.1, 0.3), (-0.7, 0.7777), (3.3, 1.1)] {
            let domain = CurveDomain::new(t_min, t_min + span);
            let pieces =
                travel_pieces(WrapMode::Loop, domain, t_min + 0.5 * span, t_min + 2.5 * span);
            assert_eq!(pieces.len(), 3);
            assert!(!pieces[0].2);
            for piece in &pieces[1..] {
                assert!(piece.2);
                assert_eq!(piece.0, t_min);
            }
            assert_relative_eq!(pieces[2].1, t_min + 0.5 * span, epsilon = 1e-9);
        }
    }

    #[test]
    fn ping_pong_wraps_start_on_domain_ends() {
        let domain = CurveDomain::new(0.013, 0.5324);
        let pieces = travel_pieces(WrapMode::PingPong, domain, 0.2727, 1.3);
        assert_eq!(pieces[1].0, domain.t_max);
        assert_eq!(pieces[2].0, domain.t_min);
    }

    #[test]
    fn long_steps_replay_at_most_two_cycles() {
        let pieces = travel_pieces(WrapMode::Loop, UNIT, 0.0, 10.5);
        assert_eq!(pieces.len(), 3);
    }

    #[test]
    fn advance_moves_along_path_and_fires_nodes() {
        let (mut path, log) = recording_path(WrapMode::Once);
        let mut animator = PathAnimator::new(AnimatorSettings::new(2.0).unwrap());
        let position = animator.advance(0.5, &mut path).unwrap();
        assert_relative_eq!(position, Point3::new(0.5, 0.0, 0.0), epsilon = 1e-12);
        assert_eq!(*log.borrow(), vec![0]);

        animator.advance(1.5, &mut path).unwrap();
        assert_eq!(*log.borrow(), vec![0, 1, 2]);

        animator.advance(1.0, &mut path).unwrap();
        assert_eq!(log.borrow().len(), 3);
        assert_relative_eq!(animator.path_time(&path), 1.0);
    }

    #[test]
    fn looping_fires_end_then_start() {
        let (mut path, log) = recording_path(WrapMode::Loop);
        let mut animator = PathAnimator::new(AnimatorSettings::default());
        animator.advance(0.75, &mut path).unwrap();
        log.borrow_mut().clear();
        let position = animator.advance(0.5, &mut path).unwrap();
        assert_eq!(*log.borrow(), vec![2, 0]);
        assert_relative_eq!(position, Point3::new(0.5, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn disabled_node_events_stay_silent() {
        let (mut path, log) = recording_path(WrapMode::Once);
        let settings = AnimatorSettings::default().with_node_events(false);
        let mut animator = PathAnimator::new(settings);
        animator.advance(1.0, &mut path).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn rewind_restarts_playback() {
        let (mut path, log) = recording_path(WrapMode::Once);
        let mut animator = PathAnimator::new(AnimatorSettings::default());
        animator.advance(0.2, &mut path).unwrap();
        animator.rewind();
        assert_relative_eq!(animator.elapsed(), 0.0);
        animator.advance(0.1, &mut path).unwrap();
        assert_eq!(*log.borrow(), vec![0, 0]);
    }

    #[test]
    fn invalid_duration_is_rejected() {
        assert!(AnimatorSettings::new(0.0).is_err());
        assert!(AnimatorSettings::new(f64::NAN).is_err());
    }

    #[test]
    fn deserialized_settings_are_validated() {
        assert!(serde_json::from_str::<AnimatorSettings>(r#"{"duration": 0}"#).is_err());
        let settings: AnimatorSettings =
            serde_json::from_str(r#"{"fire_node_events": false}"#).unwrap();
        assert_relative_eq!(settings.duration, 1.0);
        assert!(!settings.fire_node_events);
    }
}
