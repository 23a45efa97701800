//! Perception snapshots and the raw observation layout.
//!
//! A sensor feed (the engine's raycast loop, an external collaborator) produces one
//! [`PerceptionSnapshot`] per control tick: a fixed-count ordered sequence of range
//! readings, the agent position, and a timestamp. This module owns the layout of the
//! raw observation vector built from a snapshot:
//!
//! ```text
//! [d0, d1, .., d_{R-1}, pos.x, pos.y, pos.z, timestamp]
//! ```
//!
//! where an undetected ray contributes the sentinel [`UNDETECTED_DISTANCE`]. The
//! dataset recorder writes this layout to CSV and the feature encoder normalizes it
//! for inference, so the slot arithmetic ([`raw_observation_len`],
//! [`position_y_index`], [`encoded_len`]) lives here, in one place.

use serde::{Deserialize, Serialize};

/// Sentinel range reading for a ray that hit nothing within its reach.
pub const UNDETECTED_DISTANCE: f32 = -1.0;

/// One ray's worth of sensing.
///
/// `distance` is meaningless when `detected` is false; use [`Self::range_reading`] to
/// get the sentinel-mapped value instead of reading the field directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerceptionSample {
    pub detected: bool,
    pub distance: f32,
}

impl PerceptionSample {
    /// A ray that hit an obstacle at `distance`.
    #[must_use]
    pub fn hit(distance: f32) -> Self {
        Self {
            detected: true,
            distance,
        }
    }

    /// A ray that hit nothing.
    #[must_use]
    pub fn miss() -> Self {
        Self::default()
    }

    /// The distance if detected, otherwise [`UNDETECTED_DISTANCE`].
    #[must_use]
    pub fn range_reading(self) -> f32 {
        if self.detected {
            self.distance
        } else {
            UNDETECTED_DISTANCE
        }
    }
}

/// Agent position in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Everything the agent senses in one control tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PerceptionSnapshot {
    pub rays: Vec<PerceptionSample>,
    pub position: Position,
    pub timestamp: f32,
}

impl PerceptionSnapshot {
    #[must_use]
    pub fn new(rays: Vec<PerceptionSample>, position: Position, timestamp: f32) -> Self {
        Self {
            rays,
            position,
            timestamp,
        }
    }

    #[must_use]
    pub fn ray_count(&self) -> usize {
        self.rays.len()
    }

    /// Builds the raw observation vector: ranges, position, timestamp, in that order.
    ///
    /// Length is [`raw_observation_len`] of the ray count. Order is significant; a
    /// consumer trained against this layout silently mispredicts if it changes.
    #[must_use]
    pub fn raw_observation(&self) -> Vec<f32> {
        let mut raw = Vec::with_capacity(raw_observation_len(self.rays.len()));
        raw.extend(self.rays.iter().map(|sample| sample.range_reading()));
        raw.push(self.position.x);
        raw.push(self.position.y);
        raw.push(self.position.z);
        raw.push(self.timestamp);
        raw
    }
}

/// Length of the raw observation vector for `ray_count` rays: ranges + (x, y, z) + time.
#[must_use]
pub const fn raw_observation_len(ray_count: usize) -> usize {
    ray_count + 4
}

/// Index of the structurally redundant `pos.y` slot, dropped before model consumption.
///
/// The kart never leaves the track plane, so the trained models were fitted without it.
#[must_use]
pub const fn position_y_index(ray_count: usize) -> usize {
    ray_count + 1
}

/// Length of the model-facing feature vector after the `pos.y` drop.
#[must_use]
pub const fn encoded_len(ray_count: usize) -> usize {
    ray_count + 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_observation_layout() {
        let snapshot = PerceptionSnapshot::new(
            vec![
                PerceptionSample::hit(2.0),
                PerceptionSample::miss(),
                PerceptionSample::hit(0.5),
            ],
            Position::new(10.0, 1.5, -3.0),
            7.25,
        );

        let raw = snapshot.raw_observation();
        assert_eq!(raw.len(), raw_observation_len(3));
        assert_eq!(raw, vec![2.0, UNDETECTED_DISTANCE, 0.5, 10.0, 1.5, -3.0, 7.25]);
    }

    #[test]
    fn test_position_y_slot() {
        let ray_count = 8;
        let idx = position_y_index(ray_count);
        assert_eq!(idx, 9);
        assert_eq!(encoded_len(ray_count), raw_observation_len(ray_count) - 1);

        let snapshot = PerceptionSnapshot::new(
            vec![PerceptionSample::miss(); ray_count],
            Position::new(1.0, 99.0, 3.0),
            0.0,
        );
        assert_eq!(
            snapshot.raw_observation()[idx],
            99.0,
            "slot {idx} should hold pos.y",
        );
    }

    #[test]
    fn test_undetected_maps_to_sentinel() {
        assert_eq!(PerceptionSample::miss().range_reading(), UNDETECTED_DISTANCE);
        // A stale distance on an undetected ray must not leak through.
        let stale = PerceptionSample {
            detected: false,
            distance: 42.0,
        };
        assert_eq!(stale.range_reading(), UNDETECTED_DISTANCE);
        assert_eq!(PerceptionSample::hit(3.5).range_reading(), 3.5);
    }
}
