use common::resources::PlayerInput;

// ============================================================================
// Scripted Input
// ============================================================================

// Drives the player in slow weaving circles and fires at a fixed cadence.
#[derive(Debug, Clone, Copy)]
pub struct Autopilot {
    // Ticks between shots; 0 never fires.
    pub fire_every: u64,
}

impl Autopilot {
    #[must_use]
    pub fn input(&self, tick: u64, delta: f32) -> PlayerInput {
        let phase = tick as f32 * 0.02;
        PlayerInput {
            throttle: 1.0,
            strafe: (phase * 0.7).sin() * 0.3,
            climb: 0.0,
            yaw_delta: phase.sin() * 0.8 * delta,
            pitch_delta: (phase * 0.5).cos() * 0.2 * delta,
            fire: self.fire_every > 0 && tick > 0 && tick % self.fire_every == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_on_cadence() {
        let autopilot = Autopilot { fire_every: 10 };
        let shots: Vec<u64> = (0..35).filter(|&tick| autopilot.input(tick, 0.02).fire).collect();
        assert_eq!(shots, vec![10, 20, 30]);
        assert!(!(Autopilot { fire_every: 0 }).input(10, 0.02).fire);
    }
}
