//! Piecewise-linear ADHSR envelope in tempo-relative steps.

/// Attack, hold, decay and release lengths in steps; sustain as a level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Adhsr {
    pub attack: f32,
    pub hold: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for Adhsr {
    fn default() -> Self {
        Self { attack: 0.1, hold: 0.0, decay: 1.0, sustain: 0.7, release: 1.0 }
    }
}

impl Adhsr {
    /// Level while the note is held, `t` steps after onset.
    pub fn level(&self, t: f64) -> f32 {
        envelope(t, self.attack, self.hold, self.decay, self.sustain)
    }

    /// Level `since_release` steps after the note was released at step
    /// `released_at`.
    pub fn released_level(&self, released_at: f64, since_release: f64) -> f32 {
        release(self.level(released_at), since_release, self.release)
    }

    /// Whether a release that started `since_release` steps ago has finished.
    pub fn is_done(&self, since_release: f64) -> bool {
        since_release >= self.release as f64
    }
}

/// Held envelope level at step-time `t`.
///
/// Rises 0 → 1 over `attack`, stays at 1 for `hold`, falls to `sustain`
/// over `decay` and stays there.
pub fn envelope(t: f64, attack: f32, hold: f32, decay: f32, sustain: f32) -> f32 {
    let (a, h, d) = (attack as f64, hold as f64, decay as f64);
    if t < 0.0 {
        0.0
    } else if t < a {
        (t / a) as f32
    } else if t < a + h {
        1.0
    } else if t < a + h + d {
        let x = (t - a - h) / d;
        (1.0 - (1.0 - sustain as f64) * x) as f32
    } else {
        sustain
    }
}

/// Linear fade from `from` to 0 over `length` steps.
pub fn release(from: f32, since_release: f64, length: f32) -> f32 {
    if since_release >= length as f64 {
        return 0.0;
    }
    (from as f64 * (1.0 - since_release / length as f64)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        let (a, h, d, s) = (2.0, 1.0, 4.0, 0.25);
        assert_eq!(envelope(0.0, a, h, d, s), 0.0);
        assert_eq!(envelope(2.0, a, h, d, s), 1.0);
        assert_eq!(envelope(7.0, a, h, d, s), s);
        assert_eq!(envelope(100.0, a, h, d, s), s);
    }

    #[test]
    fn attack_and_decay_are_linear() {
        assert!((envelope(1.0, 2.0, 0.0, 2.0, 0.5) - 0.5).abs() < 1e-6);
        // halfway through decay from 1 to 0.5
        assert!((envelope(3.0, 2.0, 0.0, 2.0, 0.5) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn zero_attack_starts_at_full() {
        assert_eq!(envelope(0.0, 0.0, 0.0, 1.0, 1.0), 1.0);
        assert_eq!(envelope(0.0, 0.0, 0.0, 0.0, 0.6), 0.6);
    }

    #[test]
    fn release_fades_from_current_level() {
        let env = Adhsr { attack: 0.0, hold: 0.0, decay: 0.0, sustain: 0.8, release: 2.0 };
        assert!((env.released_level(5.0, 0.0) - 0.8).abs() < 1e-6);
        assert!((env.released_level(5.0, 1.0) - 0.4).abs() < 1e-6);
        assert_eq!(env.released_level(5.0, 2.0), 0.0);
    }

    #[test]
    fn done_exactly_at_release_length() {
        let env = Adhsr { release: 2.0, ..Adhsr::default() };
        assert!(!env.is_done(1.999));
        assert!(env.is_done(2.0));
        let instant = Adhsr { release: 0.0, ..Adhsr::default() };
        assert!(instant.is_done(0.0));
    }
}
