//! Mecanum wheel kinematics.
//!
//! Converts operator intent into per wheel power. Wheels are paired
//! front left with back right and front right with back left.

/// Normalized power for each of the four wheels, every component in `[-1.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HolonomicWheelCommand {
    front_left: f32,
    front_right: f32,
    back_left: f32,
    back_right: f32,
}

impl HolonomicWheelCommand {
    pub fn new(
        front_left: f32,
        front_right: f32,
        back_left: f32,
        back_right: f32,
    ) -> HolonomicWheelCommand {
        HolonomicWheelCommand {
            front_left,
            front_right,
            back_left,
            back_right,
        }
    }

    pub fn stopped() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Raw mecanum mix without any normalization.
    fn mix(forward: f32, strafe: f32, rotate: f32) -> HolonomicWheelCommand {
        HolonomicWheelCommand::new(
            forward + strafe + rotate,
            forward - strafe - rotate,
            forward - strafe + rotate,
            forward + strafe - rotate,
        )
    }

    /// Solve wheel powers for the requested motion.
    ///
    /// * `forward` - forward positive
    /// * `strafe` - strafe right positive
    /// * `rotate` - clockwise positive
    /// * `scale` - speed limit, clamped to `[0.0, 1.0]`
    ///
    /// Intents don't have to be pre-clamped. If any raw wheel power exceeds 1.0
    /// all four are divided by the largest magnitude so the heading is kept.
    /// Unsaturated commands are never scaled up.
    ///
    /// Non finite intents are outside the contract. A NaN scale stops the robot.
    pub fn solve(forward: f32, strafe: f32, rotate: f32, scale: f32) -> HolonomicWheelCommand {
        let scale = if scale.is_nan() {
            0.0
        } else {
            scale.clamp(0.0, 1.0)
        };
        Self::mix(forward, strafe, rotate).normalized().scaled(scale)
    }

    /// Divide every wheel by the largest magnitude when it exceeds 1.0.
    pub fn normalized(self) -> HolonomicWheelCommand {
        let max = self.max_magnitude();
        if max > 1.0 {
            self.scaled(1.0 / max)
        } else {
            self
        }
    }

    fn scaled(self, factor: f32) -> HolonomicWheelCommand {
        HolonomicWheelCommand::new(
            self.front_left * factor,
            self.front_right * factor,
            self.back_left * factor,
            self.back_right * factor,
        )
    }

    pub fn max_magnitude(&self) -> f32 {
        self.as_array()
            .iter()
            .fold(0.0_f32, |max, value| max.max(value.abs()))
    }

    /// Wheels ordered front left, front right, back left, back right.
    pub fn as_array(&self) -> [f32; 4] {
        [
            self.front_left,
            self.front_right,
            self.back_left,
            self.back_right,
        ]
    }

    pub fn front_left(&self) -> f32 {
        self.front_left
    }
    pub fn front_right(&self) -> f32 {
        self.front_right
    }
    pub fn back_left(&self) -> f32 {
        self.back_left
    }
    pub fn back_right(&self) -> f32 {
        self.back_right
    }
}

impl Default for HolonomicWheelCommand {
    fn default() -> Self {
        Self::stopped()
    }
}

/// Operator intent for one control cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveCommand {
    forward: f32,
    strafe: f32,
    rotate: f32,
}

impl MoveCommand {
    pub fn new(forward: f32, strafe: f32, rotate: f32) -> Self {
        Self {
            forward,
            strafe,
            rotate,
        }
    }

    pub fn forward(&self) -> f32 {
        self.forward
    }
    pub fn strafe(&self) -> f32 {
        self.strafe
    }
    pub fn rotate(&self) -> f32 {
        self.rotate
    }

    pub fn to_wheel_command(&self, scale: f32) -> HolonomicWheelCommand {
        HolonomicWheelCommand::solve(self.forward, self.strafe, self.rotate, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_wheels(command: HolonomicWheelCommand, expected: [f32; 4]) {
        for (actual, expected) in command.as_array().iter().zip(expected.iter()) {
            assert_relative_eq!(*actual, *expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn zero_input_is_stopped() {
        let command = HolonomicWheelCommand::solve(0.0, 0.0, 0.0, 1.0);
        assert_eq!(command, HolonomicWheelCommand::stopped());
    }

    #[test]
    fn pure_forward() {
        let command = HolonomicWheelCommand::solve(1.0, 0.0, 0.0, 1.0);
        assert_wheels(command, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn pure_strafe_right() {
        let command = HolonomicWheelCommand::solve(0.0, 1.0, 0.0, 1.0);
        assert_wheels(command, [1.0, -1.0, -1.0, 1.0]);
    }

    #[test]
    fn pure_rotate_clockwise() {
        let command = HolonomicWheelCommand::solve(0.0, 0.0, 1.0, 1.0);
        assert_wheels(command, [1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn saturating_forward_strafe() {
        let command = HolonomicWheelCommand::solve(1.0, 1.0, 0.0, 1.0);
        assert_wheels(command, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn scale_attenuates() {
        let command = HolonomicWheelCommand::solve(1.0, 0.0, 0.0, 0.5);
        assert_wheels(command, [0.5, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn small_input_is_not_scaled_up() {
        let command = HolonomicWheelCommand::solve(0.2, 0.1, 0.0, 1.0);
        assert_wheels(command, [0.3, 0.1, 0.1, 0.3]);
    }

    #[test]
    fn normalization_keeps_ratios() {
        let (forward, strafe, rotate) = (0.9, -0.7, 0.6);
        let raw = HolonomicWheelCommand::mix(forward, strafe, rotate);
        assert!(raw.max_magnitude() > 1.0);
        let solved = HolonomicWheelCommand::solve(forward, strafe, rotate, 1.0);
        let raw = raw.as_array();
        let solved = solved.as_array();
        for i in 0..4 {
            for j in 0..4 {
                if raw[j].abs() > 1e-6 {
                    assert_relative_eq!(
                        solved[i] / solved[j],
                        raw[i] / raw[j],
                        epsilon = 1e-4
                    );
                }
            }
        }
    }

    #[test]
    fn never_exceeds_scale() {
        let samples = [-3.0, -1.0, -0.5, 0.0, 0.25, 1.0, 2.5];
        for scale in [1.0, 0.8, 0.3] {
            for forward in samples {
                for strafe in samples {
                    for rotate in samples {
                        let command =
                            HolonomicWheelCommand::solve(forward, strafe, rotate, scale);
                        assert!(command.max_magnitude() <= scale + 1e-6);
                    }
                }
            }
        }
    }

    #[test]
    fn saturated_output_reaches_scale() {
        let command = HolonomicWheelCommand::solve(1.0, 0.5, 0.5, 0.8);
        assert_relative_eq!(command.max_magnitude(), 0.8, epsilon = 1e-6);
    }

    #[test]
    fn out_of_range_scale_is_clamped() {
        let command = HolonomicWheelCommand::solve(1.0, 0.0, 0.0, 3.0);
        assert_wheels(command, [1.0, 1.0, 1.0, 1.0]);
        let command = HolonomicWheelCommand::solve(1.0, 0.0, 0.0, -1.0);
        assert_wheels(command, [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn nan_scale_stops() {
        let command = HolonomicWheelCommand::solve(1.0, 1.0, 1.0, f32::NAN);
        assert_wheels(command, [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let first = HolonomicWheelCommand::solve(0.37, -0.91, 0.44, 0.8);
        for _ in 0..10 {
            let next = HolonomicWheelCommand::solve(0.37, -0.91, 0.44, 0.8);
            for (a, b) in first.as_array().iter().zip(next.as_array().iter()) {
                assert_eq!(a.to_bits(), b.to_bits());
            }
        }
    }

    #[test]
    fn move_command_matches_solve() {
        let command = MoveCommand::new(0.5, 0.25, -0.25).to_wheel_command(0.8);
        assert_eq!(
            command,
            HolonomicWheelCommand::solve(0.5, 0.25, -0.25, 0.8)
        );
    }
}
