//! Hand landmark topology

use super::PipelineError;
use serde::{Deserialize, Serialize};

/// Landmarks per detected hand
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Skeleton edges between landmark indices (wrist = 0, fingertips = 4, 8, 12, 16, 20)
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    // thumb
    (0, 1), (1, 2), (2, 3), (3, 4),
    // index
    (0, 5), (5, 6), (6, 7), (7, 8),
    // middle
    (5, 9), (9, 10), (10, 11), (11, 12),
    // ring
    (9, 13), (13, 14), (14, 15), (15, 16),
    // pinky and palm base
    (13, 17), (0, 17), (17, 18), (18, 19), (19, 20),
];

/// A landmark in normalized image coordinates (`x`, `y` in [0, 1])
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth, wrist-centred
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Pixel position in an image of the given size. Trackers may report
    /// points outside [0, 1], so the result can lie off the image.
    pub fn to_pixel(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

/// The ordered landmarks of one hand
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    points: Vec<Landmark>,
}

impl HandLandmarks {
    /// Requires exactly [`HAND_LANDMARK_COUNT`] points
    pub fn new(points: Vec<Landmark>) -> Result<Self, PipelineError> {
        if points.len() != HAND_LANDMARK_COUNT {
            return Err(PipelineError::InvalidLandmarks {
                expected: HAND_LANDMARK_COUNT,
                found: points.len(),
            });
        }
        Ok(Self { points })
    }

    /// Build from `[x, y, z]` triples
    pub fn from_triples(triples: &[[f32; 3]]) -> Result<Self, PipelineError> {
        Self::new(triples.iter().map(|[x, y, z]| Landmark::new(*x, *y, *z)).collect())
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    /// Line segments of the skeleton
    pub fn segments(&self) -> impl Iterator<Item = (Landmark, Landmark)> + '_ {
        HAND_CONNECTIONS
            .iter()
            .map(move |&(a, b)| (self.points[a], self.points[b]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_hand() -> Vec<[f32; 3]> {
        (0..HAND_LANDMARK_COUNT)
            .map(|i| [0.1 + i as f32 * 0.02, 0.5, 0.0])
            .collect()
    }

    #[test]
    fn test_connections_stay_in_range() {
        for (a, b) in HAND_CONNECTIONS {
            assert!(a < HAND_LANDMARK_COUNT && b < HAND_LANDMARK_COUNT);
        }
    }

    #[test]
    fn test_every_landmark_is_connected() {
        for i in 0..HAND_LANDMARK_COUNT {
            assert!(HAND_CONNECTIONS.iter().any(|&(a, b)| a == i || b == i), "landmark {} is isolated", i);
        }
    }

    #[test]
    fn test_wrong_point_count_rejected() {
        let err = HandLandmarks::from_triples(&[[0.0, 0.0, 0.0]; 5]).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidLandmarks { expected: 21, found: 5 }));
    }

    #[test]
    fn test_segments_follow_topology() {
        let hand = HandLandmarks::from_triples(&open_hand()).unwrap();
        let segments: Vec<_> = hand.segments().collect();
        assert_eq!(segments.len(), HAND_CONNECTIONS.len());
        assert_eq!(segments[0].0, hand.points()[0]);
        assert_eq!(segments[0].1, hand.points()[1]);
    }

    #[test]
    fn test_to_pixel_scales_normalized_coordinates() {
        let point = Landmark::new(0.5, 0.25, 0.0);
        assert_eq!(point.to_pixel(640, 480), (320.0, 120.0));
    }
}
