//! Stochastic sustainability test for a withdrawal plan
//!
//! Annual returns and inflation are drawn from normal distributions. Each
//! simulation gets its own `StdRng` seeded from the base seed plus its index,
//! so results are reproducible regardless of how rayon schedules the work.

use crate::error::{ProjectionError, Result};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

fn default_num_simulations() -> u32 {
    1_000
}

fn default_years() -> u32 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloInput {
    #[serde(default = "default_num_simulations")]
    pub num_simulations: u32,
    #[serde(default = "default_years")]
    pub years: u32,
    pub initial_balance: f64,
    /// First-year withdrawal, grown by simulated inflation
    pub annual_withdrawal: f64,
    pub expected_return: f64,
    pub return_std_dev: f64,
    #[serde(default)]
    pub inflation_mean: f64,
    #[serde(default)]
    pub inflation_std_dev: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Keep every simulated path in the result
    #[serde(default)]
    pub include_paths: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancePercentiles {
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloResult {
    pub num_simulations: u32,
    pub years: u32,
    /// Share of simulations with money left at the end
    pub success_rate: f64,
    pub ending_balance_percentiles: BalancePercentiles,
    /// Probability of first depletion in each year
    pub depletion_probabilities: Vec<f64>,
    /// Probability of having depleted by the end of each year
    pub cumulative_depletion: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yearly_balances: Option<Vec<Vec<f64>>>,
}

struct Path {
    balances: Vec<f64>,
    depleted_in: Option<usize>,
}

/// Annual draw; a zero standard deviation collapses to the mean
#[derive(Debug, Clone, Copy)]
enum Draw {
    Fixed(f64),
    Normal(Normal),
}

impl Draw {
    fn new(mean: f64, std_dev: f64, field: &str) -> Result<Self> {
        if !mean.is_finite() {
            return Err(ProjectionError::invalid(field, "mean must be a finite number"));
        }
        if std_dev == 0.0 {
            return Ok(Draw::Fixed(mean));
        }
        Normal::new(mean, std_dev)
            .map(Draw::Normal)
            .map_err(|e| ProjectionError::invalid(field, format!("invalid distribution: {e}")))
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        match self {
            Draw::Fixed(value) => *value,
            Draw::Normal(n) => rng.sample(*n),
        }
    }
}

pub struct MonteCarloSimulator {
    returns: Draw,
    inflation: Draw,
}

impl MonteCarloSimulator {
    pub fn new(input: &MonteCarloInput) -> Result<Self> {
        validate(input)?;
        Ok(Self {
            returns: Draw::new(input.expected_return, input.return_std_dev, "returnStdDev")?,
            inflation: Draw::new(input.inflation_mean, input.inflation_std_dev, "inflationStdDev")?,
        })
    }

    pub fn run(&self, input: &MonteCarloInput) -> MonteCarloResult {
        let base_seed = input.seed.unwrap_or_else(rand::random);
        info!(
            "Running {} simulations over {} years (seed {})",
            input.num_simulations, input.years, base_seed
        );

        let paths: Vec<Path> = (0..input.num_simulations)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(i as u64));
                self.simulate(&mut rng, input)
            })
            .collect();

        summarize(input, paths)
    }

    fn simulate(&self, rng: &mut StdRng, input: &MonteCarloInput) -> Path {
        let years = input.years as usize;
        let mut balances = Vec::with_capacity(years);
        let mut balance = input.initial_balance;
        let mut withdrawal = input.annual_withdrawal;
        let mut depleted_in = None;

        for year in 0..years {
            let ret = self.returns.sample(rng);
            let inf = self.inflation.sample(rng);
            if year > 0 {
                withdrawal *= 1.0 + inf;
            }
            if depleted_in.is_none() {
                balance = balance * (1.0 + ret) - withdrawal;
                if balance <= 0.0 {
                    balance = 0.0;
                    depleted_in = Some(year);
                }
            }
            balances.push(balance);
        }

        Path {
            balances,
            depleted_in,
        }
    }
}

fn validate(input: &MonteCarloInput) -> Result<()> {
    if input.num_simulations == 0 {
        return Err(ProjectionError::invalid("numSimulations", "must be at least 1"));
    }
    if input.years == 0 {
        return Err(ProjectionError::invalid("years", "must be at least 1"));
    }
    if !input.initial_balance.is_finite() || input.initial_balance < 0.0 {
        return Err(ProjectionError::invalid("initialBalance", "must be a non-negative number"));
    }
    if !input.annual_withdrawal.is_finite() || input.annual_withdrawal < 0.0 {
        return Err(ProjectionError::invalid("annualWithdrawal", "must be a non-negative number"));
    }
    Ok(())
}

fn summarize(input: &MonteCarloInput, paths: Vec<Path>) -> MonteCarloResult {
    let sims = paths.len().max(1) as f64;
    let years = input.years as usize;

    let mut first_depletions = vec![0u32; years];
    for year in paths.iter().filter_map(|p| p.depleted_in) {
        first_depletions[year] += 1;
    }
    let depletion_probabilities: Vec<f64> =
        first_depletions.iter().map(|&n| n as f64 / sims).collect();
    let cumulative_depletion = depletion_probabilities
        .iter()
        .scan(0.0, |acc, p| {
            *acc += p;
            Some(*acc)
        })
        .collect();

    let mut endings: Vec<f64> = paths
        .iter()
        .map(|p| p.balances.last().copied().unwrap_or(input.initial_balance))
        .collect();
    let successes = endings.iter().filter(|&&b| b > 0.0).count();
    endings.sort_by(|a, b| a.total_cmp(b));

    let ending_balance_percentiles = BalancePercentiles {
        p10: percentile_sorted(&endings, 10.0),
        p25: percentile_sorted(&endings, 25.0),
        p50: percentile_sorted(&endings, 50.0),
        p75: percentile_sorted(&endings, 75.0),
        p90: percentile_sorted(&endings, 90.0),
    };

    let yearly_balances = input
        .include_paths
        .then(|| paths.into_iter().map(|p| p.balances).collect());

    MonteCarloResult {
        num_simulations: input.num_simulations,
        years: input.years,
        success_rate: successes as f64 / sims,
        ending_balance_percentiles,
        depletion_probabilities,
        cumulative_depletion,
        yearly_balances,
    }
}

/// Percentile of a sorted slice with linear interpolation
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = p / 100.0 * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let frac = rank - lower as f64;
            sorted[lower] * (1.0 - frac) + sorted[upper] * frac
        }
    }
}
