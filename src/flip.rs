use std::f32::consts::{PI, TAU};

/// Rotation speed of a flip in radians per second.
pub const FLIP_RATE: f32 = 3.0;

/// One of the two sides of the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Front,
    Back,
}

impl Face {
    /// Face that points at the viewer for a card rotated by `angle`.
    pub fn for_angle(angle: f32) -> Self {
        if angle < PI {
            Face::Front
        } else {
            Face::Back
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Face::Front => Face::Back,
            Face::Back => Face::Front,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Face::Front => "front",
            Face::Back => "back",
        }
    }
}

/// Rotation state of the card about its vertical axis.
///
/// While idle the angle is exactly `0` or exactly `PI`. A flip runs the
/// angle up to the next boundary and snaps onto it, so repeated flips never
/// accumulate drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlipPhase {
    Idle { angle: f32 },
    Flipping { angle: f32, target: f32 },
}

impl Default for FlipPhase {
    fn default() -> Self {
        Self::new()
    }
}

impl FlipPhase {
    pub const fn new() -> Self {
        FlipPhase::Idle { angle: 0.0 }
    }

    pub fn angle(&self) -> f32 {
        match *self {
            FlipPhase::Idle { angle } | FlipPhase::Flipping { angle, .. } => angle,
        }
    }

    pub fn is_flipping(&self) -> bool {
        matches!(self, FlipPhase::Flipping { .. })
    }

    pub fn visible_face(&self) -> Face {
        Face::for_angle(self.angle())
    }

    pub fn hidden_face(&self) -> Face {
        self.visible_face().opposite()
    }

    /// Starts a half turn. Returns `false` without touching the state when a
    /// flip is already running.
    pub fn begin(&mut self) -> bool {
        let FlipPhase::Idle { angle } = *self else {
            return false;
        };
        let target = if angle < PI { PI } else { TAU };
        *self = FlipPhase::Flipping { angle, target };
        true
    }

    /// Advances a running flip by `dt` seconds. Returns `true` on the call
    /// that lands the card on its boundary.
    pub fn advance(&mut self, dt: f32) -> bool {
        let FlipPhase::Flipping { angle, target } = *self else {
            return false;
        };
        let step = if dt.is_finite() && dt > 0.0 {
            FLIP_RATE * dt
        } else {
            0.0
        };
        let next = angle + step;
        if next >= target {
            let landed = if target >= TAU { 0.0 } else { target };
            *self = FlipPhase::Idle { angle: landed };
            true
        } else {
            *self = FlipPhase::Flipping {
                angle: next,
                target,
            };
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn run_flip(phase: &mut FlipPhase) -> Vec<f32> {
        assert!(phase.begin());
        let mut angles = vec![phase.angle()];
        while !phase.advance(DT) {
            angles.push(phase.angle());
        }
        angles
    }

    #[test]
    fn starts_idle_on_the_front() {
        let phase = FlipPhase::new();
        assert_eq!(phase.angle(), 0.0);
        assert!(!phase.is_flipping());
        assert_eq!(phase.visible_face(), Face::Front);
        assert_eq!(phase.hidden_face(), Face::Back);
    }

    #[test]
    fn begin_is_ignored_while_flipping() {
        let mut phase = FlipPhase::new();
        assert!(phase.begin());
        phase.advance(0.1);
        let snapshot = phase;
        assert!(!phase.begin());
        assert_eq!(phase, snapshot);
    }

    #[test]
    fn first_flip_lands_exactly_on_pi() {
        let mut phase = FlipPhase::new();
        run_flip(&mut phase);
        assert_eq!(phase, FlipPhase::Idle { angle: PI });
        assert_eq!(phase.visible_face(), Face::Back);
    }

    #[test]
    fn second_flip_wraps_to_zero() {
        let mut phase = FlipPhase::new();
        run_flip(&mut phase);
        run_flip(&mut phase);
        assert_eq!(phase, FlipPhase::Idle { angle: 0.0 });
        assert_eq!(phase.visible_face(), Face::Front);
    }

    #[test]
    fn angle_never_decreases_during_a_flip() {
        let mut phase = FlipPhase::new();
        for _ in 0..2 {
            let angles = run_flip(&mut phase);
            assert!(angles.windows(2).all(|pair| pair[1] >= pair[0]));
        }
    }

    #[test]
    fn thousand_flips_do_not_drift() {
        let mut phase = FlipPhase::new();
        for flip in 0..1000 {
            // Uneven frame times exercise the snapping.
            let dt = DT * (1.0 + (flip % 7) as f32 * 0.13);
            assert!(phase.begin());
            while !phase.advance(dt) {}
            let angle = phase.angle();
            assert!(angle == 0.0 || angle == PI, "flip {flip} landed at {angle}");
        }
        assert_eq!(phase.angle(), 0.0);
    }

    #[test]
    fn huge_frame_completes_in_one_step() {
        let mut phase = FlipPhase::new();
        phase.begin();
        assert!(phase.advance(10.0));
        assert_eq!(phase.angle(), PI);
    }

    #[test]
    fn bad_deltas_do_not_move_the_card() {
        let mut phase = FlipPhase::new();
        phase.begin();
        assert!(!phase.advance(-1.0));
        assert!(!phase.advance(f32::NAN));
        assert_eq!(phase.angle(), 0.0);
        assert!(phase.is_flipping());
    }

    #[test]
    fn idle_ignores_advance() {
        let mut phase = FlipPhase::new();
        assert!(!phase.advance(1.0));
        assert_eq!(phase, FlipPhase::new());
    }
}
