/// Red channel animation: ramps up and down in fixed steps.
///
/// The direction flips only once the value has already left `[0, 1]`, so it
/// overshoots by at most one step on either side.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorPulse {
    value: f32,
    step: f32,
}

pub const PULSE_STEP: f32 = 0.05;

impl ColorPulse {
    pub fn new() -> Self {
        Self { value: 0.0, step: PULSE_STEP }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Moves to the next frame's value.
    pub fn advance(&mut self) {
        if self.value > 1.0 {
            self.step = -PULSE_STEP;
        } else if self.value < 0.0 {
            self.step = PULSE_STEP;
        }
        self.value += self.step;
    }
}

impl Default for ColorPulse {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn starts_at_zero_and_rises() {
        let mut pulse = ColorPulse::new();
        assert_eq!(pulse.value(), 0.0);
        pulse.advance();
        assert!((pulse.value() - 0.05).abs() < EPS);
    }

    #[test]
    fn stays_within_one_step_of_unit_range() {
        let mut pulse = ColorPulse::new();
        for _ in 0..10_000 {
            pulse.advance();
            let v = pulse.value();
            assert!(v >= -PULSE_STEP - EPS && v <= 1.0 + PULSE_STEP + EPS, "{v}");
        }
    }

    #[test]
    fn oscillates() {
        let mut pulse = ColorPulse::new();
        let mut rises = 0;
        let mut falls = 0;
        let mut prev = pulse.value();
        for _ in 0..200 {
            pulse.advance();
            if pulse.value() > prev {
                rises += 1;
            } else {
                falls += 1;
            }
            prev = pulse.value();
        }
        assert!(rises > 50 && falls > 50, "rises={rises} falls={falls}");
    }

    #[test]
    fn turns_around_after_passing_one() {
        let mut pulse = ColorPulse::new();
        let mut peak = 0.0f32;
        for _ in 0..40 {
            pulse.advance();
            peak = peak.max(pulse.value());
        }
        assert!(peak > 1.0 && peak <= 1.0 + PULSE_STEP + EPS, "{peak}");
        assert!(pulse.value() < peak);
    }
}
