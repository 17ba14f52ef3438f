use rand::Rng;

use crate::assert_interval;

use super::Choice;

/// Epsilon greedy exploration policy with a multiplicatively decaying epsilon threshold
///
/// Each call to [`decay`](Self::decay) sets ε ← max(ε<sub>end</sub>, ε · r).
#[derive(Debug, Clone, PartialEq)]
pub struct EpsilonGreedy {
    epsilon: f32,
    start: f32,
    end: f32,
    rate: f32,
}

impl EpsilonGreedy {
    /// Initialize epsilon greedy policy from start, end, and decay rate
    ///
    /// **Panics** if `start`, `end`, or `rate` is not in the interval `[0,1]`, or if `start` is less than `end`
    pub fn new(start: f32, end: f32, rate: f32) -> Self {
        assert_interval!(start, 0.0, 1.0);
        assert_interval!(end, 0.0, 1.0);
        assert_interval!(rate, 0.0, 1.0);
        assert!(
            start >= end,
            "Epsilon start value must not be less than end value."
        );
        Self {
            epsilon: start,
            start,
            end,
            rate,
        }
    }

    /// Current exploration threshold
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Invoke epsilon greedy policy with the current threshold
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Choice {
        if rng.gen::<f32>() < self.epsilon {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }

    /// Shrink epsilon by one step of the schedule, never going below the end value
    pub fn decay(&mut self) {
        self.epsilon = (self.epsilon * self.rate).max(self.end);
    }

    /// Restore epsilon to its start value
    pub fn reset(&mut self) {
        self.epsilon = self.start;
    }

    /// Overwrite the current threshold, clamped to `[end, start]`
    pub(crate) fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon.clamp(self.end, self.start);
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn decay_is_monotone_and_floored() {
        let mut policy = EpsilonGreedy::new(1.0, 0.01, 0.9);
        assert_eq!(policy.epsilon(), 1.0);

        policy.decay();
        assert!((policy.epsilon() - 0.9).abs() < 1e-6);
        policy.decay();
        assert!((policy.epsilon() - 0.81).abs() < 1e-6);

        let mut prev = policy.epsilon();
        for _ in 0..1000 {
            policy.decay();
            assert!(policy.epsilon() <= prev, "Epsilon never increases");
            assert!(policy.epsilon() >= 0.01, "Epsilon never drops below the floor");
            prev = policy.epsilon();
        }
        assert_eq!(policy.epsilon(), 0.01);

        policy.reset();
        assert_eq!(policy.epsilon(), 1.0);
    }

    #[test]
    fn extremes_always_choose_the_same() {
        let mut rng = StdRng::seed_from_u64(0);
        let explore = EpsilonGreedy::new(1.0, 1.0, 1.0);
        let exploit = EpsilonGreedy::new(0.0, 0.0, 1.0);
        for _ in 0..100 {
            assert_eq!(explore.choose(&mut rng), Choice::Explore);
            assert_eq!(exploit.choose(&mut rng), Choice::Exploit);
        }
    }

    #[test]
    fn set_epsilon_clamps() {
        let mut policy = EpsilonGreedy::new(0.8, 0.1, 0.99);
        policy.set_epsilon(0.5);
        assert_eq!(policy.epsilon(), 0.5);
        policy.set_epsilon(2.0);
        assert_eq!(policy.epsilon(), 0.8);
        policy.set_epsilon(0.0);
        assert_eq!(policy.epsilon(), 0.1);
    }

    #[test]
    #[should_panic]
    fn start_below_end_panics() {
        EpsilonGreedy::new(0.1, 0.5, 0.9);
    }
}
