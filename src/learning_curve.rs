//! Exponential learning curve.
//!
//! Studying topic `i` for time `t` raises mastery by
//! `Δm = (1 - m)(1 - exp(-a·t))` with rate `a = k·A / d`.

/// Per-topic learning rate `a = k·A / max(d, eps)`, floored at `eps`.
pub fn learning_rate(k: f64, ability: f64, difficulty: f64, eps: f64) -> f64 {
    (k * ability / difficulty.max(eps)).max(eps)
}

/// Mastery gained after studying for `t` at the given rate.
pub fn delta_mastery(mastery: f64, rate: f64, t: f64) -> f64 {
    let m = mastery.clamp(0.0, 1.0);
    (1.0 - m) * (1.0 - (-rate * t).exp())
}

/// Mastery after a gain of `delta`, capped at 1.
pub fn mastery_after(mastery: f64, delta: f64) -> f64 {
    (mastery + delta).min(1.0)
}
