//! GO/STOP recommendation.
//!
//! Combines the simulated probability of reaching the threshold within the
//! horizon with the gap signal for the same threshold.

use crate::{
    config::{RecommendationConfig, SimulationConfig},
    math_utils::round1,
    monte_carlo::horizon_probability,
    peaks::gap_statistics,
    results::{Action, Recommendation},
    secure_rng::UniformSource,
};

/// Decide from an already simulated probability (percent) and gap signal.
pub fn decide(
    probability: f64,
    gap_reason: Option<&str>,
    config: &RecommendationConfig,
) -> Recommendation {
    let gap_fires = gap_reason.is_some();
    if probability > config.go_percent || (probability > config.go_with_gap_percent && gap_fires)
    {
        let mut reason = format!(
            "Probability {:.1}% over {} turns.",
            probability, config.horizon
        );
        if let Some(gap) = gap_reason {
            reason.push(' ');
            reason.push_str(gap);
        }
        Recommendation {
            action: Action::Go,
            confidence: round1(probability),
            reason,
        }
    } else {
        Recommendation {
            action: Action::Stop,
            confidence: round1(100.0 - probability),
            reason: format!("Low probability ({:.1}%). Wait.", probability),
        }
    }
}

/// Simulate and decide for `history`.
pub fn recommend<R: UniformSource + ?Sized>(
    history: &[f64],
    config: &RecommendationConfig,
    simulation: &SimulationConfig,
    rng: &mut R,
) -> Recommendation {
    let probability = horizon_probability(
        history,
        config.threshold,
        f64::INFINITY,
        config.horizon,
        simulation,
        rng,
    );

    let gap_reason = gap_statistics(history, config.threshold)
        .filter(|g| g.is_overdue())
        .map(|g| {
            format!(
                "Statistically overdue (gap {} > mean {:.1}).",
                g.current_gap, g.mean_gap
            )
        });

    log::debug!(
        "Recommendation inputs: probability {:.1}%, gap signal {}",
        probability,
        gap_reason.is_some()
    );

    decide(probability, gap_reason.as_deref(), config)
}
