//! Planner configuration.

/// Algorithm parameters for one planning run.
///
/// # Examples
///
/// ```
/// use u_studyplan::PlanConfig;
///
/// let config = PlanConfig::default()
///     .with_total_time(120.0)
///     .with_min_time(3.0)
///     .with_ants(50)
///     .with_iterations(120)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlanConfig {
    /// Learning-curve rate constant `k`.
    pub k: f64,

    /// Total time budget `T`.
    pub total_time: f64,

    /// Minimum time per visited topic.
    pub min_time: f64,

    /// Pheromone exponent in the transition weight.
    pub alpha: f64,

    /// Desirability exponent in the transition weight.
    pub beta: f64,

    /// Difficulty-jump penalty coefficient.
    pub beta_jump: f64,

    /// Evaporation fraction per iteration, in (0, 1).
    pub rho: f64,

    /// Candidates sampled per iteration.
    pub n_ants: usize,

    /// Number of iterations.
    pub n_iters: usize,

    /// Numerical floor.
    pub eps: f64,

    /// Seed of the run's random stream.
    pub seed: u64,

    /// Initial pheromone value.
    pub tau0: f64,

    /// Lower pheromone clip.
    pub tau_min: f64,

    /// Upper pheromone clip.
    pub tau_max: f64,

    /// Evaluate candidates of one iteration in parallel (feature `parallel`).
    ///
    /// Sampling order and results are identical either way.
    pub parallel: bool,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            k: 0.25,
            total_time: 90.0,
            min_time: 2.0,
            alpha: 1.0,
            beta: 2.0,
            beta_jump: 1.0,
            rho: 0.1,
            n_ants: 30,
            n_iters: 80,
            eps: 1e-9,
            seed: 42,
            tau0: 1.0,
            tau_min: 1e-6,
            tau_max: 1e6,
            parallel: false,
        }
    }
}

impl PlanConfig {
    pub fn with_k(mut self, k: f64) -> Self {
        self.k = k;
        self
    }

    pub fn with_total_time(mut self, t: f64) -> Self {
        self.total_time = t;
        self
    }

    pub fn with_min_time(mut self, t: f64) -> Self {
        self.min_time = t;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    pub fn with_beta_jump(mut self, beta_jump: f64) -> Self {
        self.beta_jump = beta_jump;
        self
    }

    pub fn with_rho(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    pub fn with_ants(mut self, n: usize) -> Self {
        self.n_ants = n;
        self
    }

    pub fn with_iterations(mut self, n: usize) -> Self {
        self.n_iters = n;
        self
    }

    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_tau0(mut self, tau0: f64) -> Self {
        self.tau0 = tau0;
        self
    }

    /// Sets the pheromone clipping bounds.
    pub fn with_tau_bounds(mut self, tau_min: f64, tau_max: f64) -> Self {
        self.tau_min = tau_min;
        self.tau_max = tau_max;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Iteration cadence of progress reports.
    pub fn report_every(&self) -> usize {
        (self.n_iters / 10).max(1)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        let finite = [
            ("k", self.k),
            ("total_time", self.total_time),
            ("min_time", self.min_time),
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("beta_jump", self.beta_jump),
            ("rho", self.rho),
            ("eps", self.eps),
            ("tau0", self.tau0),
            ("tau_min", self.tau_min),
            ("tau_max", self.tau_max),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(format!("{name} must be finite, got {value}"));
            }
        }
        if self.k <= 0.0 {
            return Err(format!("k must be positive, got {}", self.k));
        }
        if self.total_time < 0.0 {
            return Err("total_time must be non-negative".into());
        }
        if self.min_time < 0.0 {
            return Err("min_time must be non-negative".into());
        }
        if self.alpha < 0.0 || self.beta < 0.0 {
            return Err("alpha and beta must be non-negative".into());
        }
        if self.beta_jump < 0.0 {
            return Err("beta_jump must be non-negative".into());
        }
        if self.rho <= 0.0 || self.rho >= 1.0 {
            return Err(format!("rho must be in (0, 1), got {}", self.rho));
        }
        if self.n_ants == 0 {
            return Err("n_ants must be at least 1".into());
        }
        if self.n_iters == 0 {
            return Err("n_iters must be at least 1".into());
        }
        if self.eps <= 0.0 {
            return Err("eps must be positive".into());
        }
        if self.tau0 <= 0.0 {
            return Err("tau0 must be positive".into());
        }
        if self.tau_min <= 0.0 || self.tau_min > self.tau_max {
            return Err(format!(
                "tau bounds must satisfy 0 < tau_min <= tau_max, got [{}, {}]",
                self.tau_min, self.tau_max
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlanConfig::default();
        assert!((config.k - 0.25).abs() < 1e-12);
        assert!((config.total_time - 90.0).abs() < 1e-12);
        assert_eq!(config.n_ants, 30);
        assert_eq!(config.n_iters, 80);
        assert_eq!(config.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_report_every() {
        assert_eq!(PlanConfig::default().report_every(), 8);
        assert_eq!(PlanConfig::default().with_iterations(5).report_every(), 1);
    }

    #[test]
    fn test_validate_bad_rho() {
        assert!(PlanConfig::default().with_rho(0.0).validate().is_err());
        assert!(PlanConfig::default().with_rho(1.0).validate().is_err());
    }

    #[test]
    fn test_validate_zero_ants() {
        assert!(PlanConfig::default().with_ants(0).validate().is_err());
        assert!(PlanConfig::default().with_iterations(0).validate().is_err());
    }

    #[test]
    fn test_validate_tau_bounds() {
        let config = PlanConfig::default().with_tau_bounds(10.0, 1.0);
        assert!(config.validate().is_err());
        let config = PlanConfig::default().with_tau_bounds(0.0, 1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_non_finite() {
        let config = PlanConfig::default().with_total_time(f64::INFINITY);
        let err = config.validate().unwrap_err();
        assert!(err.contains("total_time"), "unexpected error: {err}");
    }
}
