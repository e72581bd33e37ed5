//! Monte Carlo estimators over the recent-history pool.
//!
//! Every estimator draws uniformly, with replacement, from the most recent
//! observations (the pool) using an injected [`UniformSource`]. Trial counts
//! are fixed by [`SimulationConfig`], so the cost of a call does not grow
//! with the length of the history beyond the pool cap.
//!
//! ## Estimators
//!
//! - **Zone hit**: probability that one of the next turns lands in a range,
//!   with the mean turn of the first hit
//! - **Horizon probability**: the same hit probability without timing
//! - **Calm zone**: marginal and joint probabilities that the next two turns
//!   stay below the calm threshold

use crate::{
    config::SimulationConfig,
    math_utils::round1,
    results::{CalmAnalysis, TurnCalm},
    secure_rng::UniformSource,
};

/// Hit probability below which the narrative omits timing, in percent.
pub const TIMING_REPORT_FLOOR: f64 = 20.0;

/// Most recent `pool_size` observations.
pub fn sampling_pool(history: &[f64], pool_size: usize) -> &[f64] {
    &history[history.len().saturating_sub(pool_size)..]
}

#[inline]
fn draw<R: UniformSource + ?Sized>(pool: &[f64], rng: &mut R) -> f64 {
    pool[rng.next_index(pool.len())]
}

/// Outcome of the zone-hit simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneHitEstimate {
    /// Trials run
    pub simulations: usize,
    /// Trials with a hit inside the horizon
    pub hits: usize,
    /// `hits / simulations` in percent
    pub probability: f64,
    /// Mean turn (1-based) of the first hit among hitting trials, 0 without hits
    pub mean_hit_turn: f64,
}

/// Simulate `simulations` trials of up to `horizon` turns each; a trial stops
/// at the first draw inside `[min, max]`.
///
/// Returns `None` when the pool is empty.
pub fn simulate_zone_hits<R: UniformSource + ?Sized>(
    pool: &[f64],
    min: f64,
    max: f64,
    horizon: usize,
    simulations: usize,
    rng: &mut R,
) -> Option<ZoneHitEstimate> {
    if pool.is_empty() || simulations == 0 {
        return None;
    }

    let mut hits = 0usize;
    let mut turn_sum = 0usize;
    for _ in 0..simulations {
        for turn in 1..=horizon {
            let value = draw(pool, rng);
            if value >= min && value <= max {
                hits += 1;
                turn_sum += turn;
                break;
            }
        }
    }

    Some(ZoneHitEstimate {
        simulations,
        hits,
        probability: hits as f64 / simulations as f64 * 100.0,
        mean_hit_turn: if hits > 0 {
            turn_sum as f64 / hits as f64
        } else {
            0.0
        },
    })
}

/// Narrative summary of the zone-hit simulation for `[config.zone_min,
/// config.zone_max]` over `config.zone_horizon` turns.
pub fn zone_hit_summary<R: UniformSource + ?Sized>(
    history: &[f64],
    config: &SimulationConfig,
    rng: &mut R,
) -> String {
    let pool = sampling_pool(history, config.pool_size);
    let Some(estimate) = simulate_zone_hits(
        pool,
        config.zone_min,
        config.zone_max,
        config.zone_horizon,
        config.num_simulations,
        rng,
    ) else {
        return "Not enough data to simulate.".to_string();
    };

    if estimate.probability < TIMING_REPORT_FLOOR {
        return format!(
            "Low probability ({:.1}%) within {} turns.",
            estimate.probability, config.zone_horizon
        );
    }

    format!(
        "From {} simulations:\n- Probability of zone [{}-{}]: {:.1}%\n- Expected around turn +{:.1}",
        estimate.simulations,
        config.zone_min,
        config.zone_max,
        estimate.probability,
        estimate.mean_hit_turn
    )
}

/// Percentage of trials in which a draw lands in `[min, max]` within
/// `horizon` turns. An empty pool yields 0.
pub fn horizon_probability<R: UniformSource + ?Sized>(
    history: &[f64],
    min: f64,
    max: f64,
    horizon: usize,
    config: &SimulationConfig,
    rng: &mut R,
) -> f64 {
    let pool = sampling_pool(history, config.pool_size);
    simulate_zone_hits(pool, min, max, horizon, config.num_simulations, rng)
        .map(|estimate| estimate.probability)
        .unwrap_or(0.0)
}

/// Two independent draws per trial; reports how often each, and both, fall
/// below `config.calm_threshold`. An empty pool yields the neutral value.
pub fn calm_zone_analysis<R: UniformSource + ?Sized>(
    history: &[f64],
    config: &SimulationConfig,
    rng: &mut R,
) -> CalmAnalysis {
    let pool = sampling_pool(history, config.pool_size);
    if pool.is_empty() || config.num_simulations == 0 {
        return CalmAnalysis::neutral();
    }

    let (mut first, mut second, mut both) = (0usize, 0usize, 0usize);
    for _ in 0..config.num_simulations {
        let calm1 = draw(pool, rng) < config.calm_threshold;
        let calm2 = draw(pool, rng) < config.calm_threshold;
        first += calm1 as usize;
        second += calm2 as usize;
        both += (calm1 && calm2) as usize;
    }

    let percent = |count: usize| count as f64 / config.num_simulations as f64 * 100.0;
    let turn = |count: usize| {
        let p = percent(count);
        TurnCalm {
            is_calm: p > config.calm_flag_percent,
            probability: round1(p),
        }
    };

    CalmAnalysis {
        turn1: turn(first),
        turn2: turn(second),
        global_probability: round1(percent(both)),
    }
}
