//! Pheromone trail field over topic transitions.

use crate::config::PlanConfig;

/// What one sampled candidate leaves behind for the pheromone update.
#[derive(Debug, Clone)]
pub struct AntTrail {
    /// Visiting order as positions in the topic set.
    pub path: Vec<usize>,
    /// Deposit quality `Q` of the candidate.
    pub quality: f64,
    /// Per-step gain contribution `g_i`, aligned with `path`.
    pub gains: Vec<f64>,
}

impl AntTrail {
    /// Deposits `(from, to, amount)` along the path, where `from` is
    /// `None` for the virtual START row.
    ///
    /// Each edge into topic `i` receives `Q · g_i / (Σ g + eps)`.
    pub fn deposits(&self, eps: f64) -> impl Iterator<Item = (Option<usize>, usize, f64)> + '_ {
        let total: f64 = self.gains.iter().sum::<f64>() + eps;
        self.path.iter().enumerate().map(move |(step, &to)| {
            let from = step.checked_sub(1).map(|s| self.path[s]);
            let g = self.gains.get(step).copied().unwrap_or(0.0);
            (from, to, self.quality * g / total)
        })
    }
}

/// Dense trail strengths `τ[row, col]`.
///
/// Rows are every topic plus one START row (the last); columns are topics.
/// Values stay within `[tau_min, tau_max]` after every update.
#[derive(Debug, Clone, PartialEq)]
pub struct PheromoneField {
    n: usize,
    tau: Vec<f64>,
}

impl PheromoneField {
    /// Creates a uniform field for `n` topics.
    pub fn new(n: usize, tau0: f64) -> Self {
        Self {
            n,
            tau: vec![tau0; (n + 1) * n],
        }
    }

    /// Number of topic columns.
    pub fn topics(&self) -> usize {
        self.n
    }

    fn row(&self, from: Option<usize>) -> usize {
        from.unwrap_or(self.n)
    }

    /// Trail strength of the transition `from → to` (`None` = START).
    pub fn get(&self, from: Option<usize>, to: usize) -> f64 {
        self.tau[self.row(from) * self.n + to]
    }

    /// All trail strengths leaving `from`.
    pub fn row_values(&self, from: Option<usize>) -> &[f64] {
        let start = self.row(from) * self.n;
        &self.tau[start..start + self.n]
    }

    /// Multiplies every trail by `1 - rho`.
    pub fn evaporate(&mut self, rho: f64) {
        let keep = 1.0 - rho;
        for v in &mut self.tau {
            *v *= keep;
        }
    }

    /// Clips every trail into `[lo, hi]`.
    pub fn clip(&mut self, lo: f64, hi: f64) {
        for v in &mut self.tau {
            *v = v.clamp(lo, hi);
        }
    }

    /// One iteration's update: evaporate, add the batch's accumulated
    /// deposits, then clip.
    pub fn update(&mut self, trails: &[AntTrail], config: &PlanConfig) {
        self.evaporate(config.rho);

        let mut delta = vec![0.0; self.tau.len()];
        for trail in trails {
            for (from, to, amount) in trail.deposits(config.eps) {
                delta[self.row(from) * self.n + to] += amount;
            }
        }
        for (v, d) in self.tau.iter_mut().zip(&delta) {
            *v += d;
        }

        self.clip(config.tau_min, config.tau_max);
    }

    pub fn min(&self) -> f64 {
        self.tau.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.tau.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}
