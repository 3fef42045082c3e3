//! Learner profiles from exam score records.
//!
//! Scores are standardised within each exam so papers of different
//! difficulty are comparable, then aggregated per learner with a time
//! decay that favours recent exams:
//!
//! - topic mastery: `m = Σ w·sigmoid(γ·z) / Σ w` over the learner's
//!   (exam, topic) observations
//! - ability: `A = exp(κ · z_s)` where `z_s` is the decayed mean of the
//!   learner's per-exam z-scores

use crate::error::{PlanError, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

const MIN_STD: f64 = 1e-6;
const SIGMOID_CLAMP: f64 = 40.0;

/// One learner's score on one topic in one exam.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExamRecord {
    pub student_id: String,
    pub exam_id: String,
    pub exam_date: NaiveDate,
    /// Relative importance of the exam.
    pub exam_weight: f64,
    pub topic: String,
    /// Score as a fraction of full marks.
    pub score_rate: f64,
}

impl ExamRecord {
    /// Builds a record from a raw score and the full mark.
    pub fn from_score(
        student_id: impl Into<String>,
        exam_id: impl Into<String>,
        exam_date: NaiveDate,
        exam_weight: f64,
        topic: impl Into<String>,
        score: f64,
        full_score: f64,
    ) -> Result<Self> {
        if !full_score.is_finite() || full_score <= 0.0 {
            return Err(PlanError::InvalidRecord(format!(
                "full_score must be positive, got {full_score}"
            )));
        }
        Ok(Self {
            student_id: student_id.into(),
            exam_id: exam_id.into(),
            exam_date,
            exam_weight,
            topic: topic.into(),
            score_rate: score / full_score,
        })
    }

    fn validate(&self) -> Result<()> {
        if !self.score_rate.is_finite() {
            return Err(PlanError::InvalidRecord(format!(
                "score_rate of {}/{}/{} is not finite",
                self.student_id, self.exam_id, self.topic
            )));
        }
        if !self.exam_weight.is_finite() || self.exam_weight < 0.0 {
            return Err(PlanError::InvalidRecord(format!(
                "exam_weight of {} must be non-negative, got {}",
                self.exam_id, self.exam_weight
            )));
        }
        Ok(())
    }
}

/// Profile building parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProfileConfig {
    /// Sigmoid stretch `γ` applied to z-scores.
    pub gamma: f64,
    /// Per-day time decay `λ` of exam weights.
    pub decay_lambda: f64,
    /// Ability scale `κ` in `A = exp(κ·z)`.
    pub kappa: f64,
    pub eps: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            gamma: 1.2,
            decay_lambda: 0.003,
            kappa: 0.3,
            eps: 1e-9,
        }
    }
}

impl ProfileConfig {
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_decay_lambda(mut self, decay: f64) -> Self {
        self.decay_lambda = decay;
        self
    }

    pub fn with_kappa(mut self, kappa: f64) -> Self {
        self.kappa = kappa;
        self
    }
}

/// Mastery of one learner on one topic.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MasteryRecord {
    pub student_id: String,
    pub topic: String,
    pub mastery: f64,
    pub observations: usize,
}

/// Ability of one learner.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityRecord {
    pub student_id: String,
    /// Decayed mean within-exam z-score.
    pub z: f64,
    pub ability: f64,
}

/// Everything the planner needs about one learner.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LearnerProfile {
    pub student_id: String,
    pub ability: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub masteries: BTreeMap<String, f64>,
}

impl LearnerProfile {
    /// Mastery snapshot keyed by topic name.
    pub fn mastery_map(&self) -> HashMap<String, f64> {
        self.masteries
            .iter()
            .map(|(k, &v)| (k.clone(), v))
            .collect()
    }
}

fn sigmoid(x: f64) -> f64 {
    let x = x.clamp(-SIGMOID_CLAMP, SIGMOID_CLAMP);
    1.0 / (1.0 + (-x).exp())
}

/// Mean and sample standard deviation, with the std floored at `MIN_STD`.
fn moments(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, MIN_STD);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    } else {
        0.0
    };
    (mean, std.max(MIN_STD))
}

/// `exam_weight · exp(-decay · Δdays)` with Δdays counted back from
/// the newest date in `dates`.
fn decayed_weights(dates: &[NaiveDate], weights: &[f64], decay: f64) -> Vec<f64> {
    let Some(newest) = dates.iter().max().copied() else {
        return Vec::new();
    };
    dates
        .iter()
        .zip(weights)
        .map(|(date, &w)| {
            let days = (newest - *date).num_days() as f64;
            w * (-decay * days).exp()
        })
        .collect()
}

fn validate_all(records: &[ExamRecord]) -> Result<()> {
    records.iter().try_for_each(ExamRecord::validate)
}

/// Per-(student, topic) mastery, sorted by student then topic.
pub fn build_mastery(records: &[ExamRecord], config: &ProfileConfig) -> Result<Vec<MasteryRecord>> {
    validate_all(records)?;

    let mut by_exam_topic: HashMap<(&str, &str), Vec<f64>> = HashMap::new();
    for r in records {
        by_exam_topic
            .entry((r.exam_id.as_str(), r.topic.as_str()))
            .or_default()
            .push(r.score_rate);
    }
    let stats: HashMap<(&str, &str), (f64, f64)> = by_exam_topic
        .into_iter()
        .map(|(key, rates)| (key, moments(&rates)))
        .collect();

    let dates: Vec<NaiveDate> = records.iter().map(|r| r.exam_date).collect();
    let exam_weights: Vec<f64> = records.iter().map(|r| r.exam_weight).collect();
    let time_w = decayed_weights(&dates, &exam_weights, config.decay_lambda);

    // (Σ w·m̂, Σ w, n)
    let mut acc: BTreeMap<(&str, &str), (f64, f64, usize)> = BTreeMap::new();
    for (r, &w) in records.iter().zip(&time_w) {
        let (mean, std) = stats[&(r.exam_id.as_str(), r.topic.as_str())];
        let z = (r.score_rate - mean) / (std + config.eps);
        let m_hat = sigmoid(config.gamma * z);
        let entry = acc
            .entry((r.student_id.as_str(), r.topic.as_str()))
            .or_insert((0.0, 0.0, 0));
        entry.0 += w * m_hat;
        entry.1 += w;
        entry.2 += 1;
    }

    Ok(acc
        .into_iter()
        .map(|((student, topic), (wm, w, n))| MasteryRecord {
            student_id: student.to_string(),
            topic: topic.to_string(),
            mastery: wm / (w + config.eps),
            observations: n,
        })
        .collect())
}

/// Per-student ability, sorted by student.
pub fn build_ability(records: &[ExamRecord], config: &ProfileConfig) -> Result<Vec<AbilityRecord>> {
    validate_all(records)?;

    // Overall rate of each (student, exam) sitting.
    struct Sitting<'a> {
        exam_id: &'a str,
        date: NaiveDate,
        weight: f64,
        rates: Vec<f64>,
    }
    let mut sittings: BTreeMap<(&str, &str), Sitting<'_>> = BTreeMap::new();
    for r in records {
        sittings
            .entry((r.student_id.as_str(), r.exam_id.as_str()))
            .or_insert_with(|| Sitting {
                exam_id: r.exam_id.as_str(),
                date: r.exam_date,
                weight: r.exam_weight,
                rates: Vec::new(),
            })
            .rates
            .push(r.score_rate);
    }
    let overall: Vec<((&str, &str), f64)> = sittings
        .iter()
        .map(|(&key, s)| (key, s.rates.iter().sum::<f64>() / s.rates.len() as f64))
        .collect();

    let mut by_exam: HashMap<&str, Vec<f64>> = HashMap::new();
    for &((_, exam), rate) in &overall {
        by_exam.entry(exam).or_default().push(rate);
    }
    let stats: HashMap<&str, (f64, f64)> = by_exam
        .into_iter()
        .map(|(exam, rates)| (exam, moments(&rates)))
        .collect();

    let dates: Vec<NaiveDate> = sittings.values().map(|s| s.date).collect();
    let exam_weights: Vec<f64> = sittings.values().map(|s| s.weight).collect();
    let time_w = decayed_weights(&dates, &exam_weights, config.decay_lambda);

    let mut acc: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for ((((student, _), rate), sitting), &w) in overall.iter().zip(sittings.values()).zip(&time_w) {
        let (mean, std) = stats[sitting.exam_id];
        let z = (rate - mean) / (std + config.eps);
        let entry = acc.entry(*student).or_insert((0.0, 0.0));
        entry.0 += w * z;
        entry.1 += w;
    }

    Ok(acc
        .into_iter()
        .map(|(student, (wz, w))| {
            let z = wz / (w + config.eps);
            AbilityRecord {
                student_id: student.to_string(),
                z,
                ability: (config.kappa * z).exp(),
            }
        })
        .collect())
}

/// Joins mastery and ability into one profile per learner, sorted by id.
pub fn build_profiles(records: &[ExamRecord], config: &ProfileConfig) -> Result<Vec<LearnerProfile>> {
    let mastery = build_mastery(records, config)?;
    let ability = build_ability(records, config)?;

    let mut profiles: BTreeMap<String, LearnerProfile> = ability
        .into_iter()
        .map(|a| {
            (
                a.student_id.clone(),
                LearnerProfile {
                    student_id: a.student_id,
                    ability: a.ability,
                    masteries: BTreeMap::new(),
                },
            )
        })
        .collect();

    for m in mastery {
        if let Some(p) = profiles.get_mut(&m.student_id) {
            p.masteries.insert(m.topic, m.mastery);
        }
    }

    Ok(profiles.into_values().collect())
}
