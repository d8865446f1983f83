//! Rent goal seek between two leases.
//!
//! Finds the rent at which a comparison lease costs the same, in present-value
//! terms, as a baseline lease. The search is a bisection on rent specialised
//! to this monotone cost function: `|NPV|` never falls as rent rises, because
//! every outflow (including a rent-linked broker fee) grows with rent.
//!
//! Two departures from textbook bisection:
//!
//! - The first comparison is made at the comparison lease's own rent, not at
//!   the bracket midpoint.
//! - When the bracket collapses onto its midpoint while the cost is still too
//!   high, the lower bound is pushed down by [`STALL_SHIFT`] so the search can
//!   keep descending below the original bracket.

use log::{debug, info, trace};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LeaseNpvError;
use crate::lease::model::lease_warnings;
use crate::lease::{LeaseTerms, RateBasis};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::LeaseNpvResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_LOWER_BOUND: Money = dec!(1000);
pub const DEFAULT_UPPER_BOUND: Money = dec!(10000);

/// Largest accepted gap between the two present-value costs.
pub const NPV_TOLERANCE: Money = dec!(10);

/// How far the lower bound moves when the bracket collapses.
pub const STALL_SHIFT: Money = dec!(10);

pub const MAX_GOAL_SEEK_ITERATIONS: u32 = 100_000;

fn default_lower_bound() -> Money {
    DEFAULT_LOWER_BOUND
}

fn default_upper_bound() -> Money {
    DEFAULT_UPPER_BOUND
}

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Two leases to compare and the rent bracket to search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseComparisonInput {
    /// Baseline lease, held fixed
    pub base: LeaseTerms,
    /// Comparison lease whose rent is solved for
    pub comp: LeaseTerms,
    #[serde(default = "default_lower_bound")]
    pub lower_bound: Money,
    #[serde(default = "default_upper_bound")]
    pub upper_bound: Money,
    #[serde(default)]
    pub rate_basis: RateBasis,
    /// Overrides [`MAX_GOAL_SEEK_ITERATIONS`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
}

impl LeaseComparisonInput {
    /// Compare two leases over the default bracket and shared rate basis.
    pub fn new(base: LeaseTerms, comp: LeaseTerms) -> Self {
        Self {
            base,
            comp,
            lower_bound: DEFAULT_LOWER_BOUND,
            upper_bound: DEFAULT_UPPER_BOUND,
            rate_basis: RateBasis::default(),
            max_iterations: None,
        }
    }

    pub fn with_bounds(mut self, lower_bound: Money, upper_bound: Money) -> Self {
        self.lower_bound = lower_bound;
        self.upper_bound = upper_bound;
        self
    }

    pub fn with_rate_basis(mut self, rate_basis: RateBasis) -> Self {
        self.rate_basis = rate_basis;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }
}

/// Whether the comparison lease's asking rent is above or below the rent that
/// would make it cost the same as the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingVerdict {
    Overpriced,
    Underpriced,
}

impl PricingVerdict {
    fn commentary(&self) -> &'static str {
        match self {
            PricingVerdict::Overpriced => {
                "Comparison lease is potentially overpriced compared to base"
            }
            PricingVerdict::Underpriced => {
                "Comparison lease is potentially underpriced compared to base"
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalSeekOutput {
    /// |NPV| of the comparison lease at the solved rent
    pub final_npv_magnitude: Money,
    /// Comparison rent that matches the baseline cost
    pub solved_rent: Money,
    /// |NPV| of the baseline lease
    pub target_npv_magnitude: Money,
    pub base_rent: Money,
    pub original_comp_rent: Money,
    /// NPV of the comparison lease at its asking rent
    pub original_comp_npv: Money,
    /// NPV(base) - NPV(comp at asking rent); positive when the comparison
    /// lease is cheaper
    pub npv_difference: Money,
    pub verdict: PricingVerdict,
    pub iterations: u32,
    /// Number of times the anti-stall rule lowered the bracket
    pub stall_shifts: u32,
    /// Human-readable summary lines
    pub commentary: Vec<String>,
}

impl GoalSeekOutput {
    /// `(final_npv_magnitude, solved_rent)`
    pub fn result_pair(&self) -> (Money, Money) {
        (self.final_npv_magnitude, self.solved_rent)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Solve for the comparison rent that makes both leases cost the same.
pub fn goal_seek(
    input: &LeaseComparisonInput,
) -> LeaseNpvResult<ComputationOutput<GoalSeekOutput>> {
    let start = Instant::now();

    let mut warnings = Vec::new();
    for (label, lease) in [("base", &input.base), ("comp", &input.comp)] {
        warnings.extend(
            lease_warnings(lease, input.rate_basis)
                .into_iter()
                .map(|w| format!("{label}: {w}")),
        );
    }

    let output = solve_rent(input)?;

    if output.solved_rent <= input.lower_bound || output.solved_rent >= input.upper_bound {
        warnings.push(format!(
            "Solved rent {} lies outside the search bracket [{}, {}]",
            output.solved_rent, input.lower_bound, input.upper_bound
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rent goal seek: bisection on comparison rent until |NPV| matches the baseline within 10",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// The search itself, without the output envelope.
///
/// Neither lease in `input` is modified; each step evaluates a copy of the
/// comparison lease at the trial rent.
pub fn solve_rent(input: &LeaseComparisonInput) -> LeaseNpvResult<GoalSeekOutput> {
    validate_input(input)?;

    let base = &input.base;
    let comp = &input.comp;
    let max_iterations = input.max_iterations.unwrap_or(MAX_GOAL_SEEK_ITERATIONS);

    let base_rate = input.rate_basis.monthly_rate(base)?;
    let comp_rate = input.rate_basis.monthly_rate(comp)?;

    let base_npv = base.evaluate_at(base_rate)?.npv;
    let original = comp.evaluate_at(comp_rate)?;

    let target = base_npv.abs();
    let mut current = original.npv_magnitude;
    let mut rent = comp.rent;

    let mut lower = input.lower_bound;
    let mut upper = input.upper_bound;
    let mut solve = midpoint(lower, upper);
    let mut iterations = 0u32;
    let mut stall_shifts = 0u32;

    debug!(
        "goal seek: target |NPV| {target}, comparison |NPV| {current} at rent {rent}, bracket [{lower}, {upper}]"
    );

    while (current - target).abs() >= NPV_TOLERANCE {
        if iterations >= max_iterations {
            return Err(LeaseNpvError::ConvergenceFailure {
                function: "goal_seek".into(),
                iterations,
                last_delta: (current - target).abs(),
            });
        }
        iterations += 1;

        let collapsed = solve == lower || solve == upper;
        if current > target {
            if collapsed {
                lower -= STALL_SHIFT;
                stall_shifts += 1;
                debug!("bracket collapsed at {solve}; lower bound moved to {lower}");
            }
            upper = solve;
        } else if current < target {
            // Only meaningful once `current` was measured at the midpoint
            if collapsed && rent == solve {
                return Err(LeaseNpvError::BracketExhausted {
                    lower_bound: input.lower_bound,
                    upper_bound: input.upper_bound,
                });
            }
            lower = solve;
        }

        solve = midpoint(lower, upper);
        rent = solve;
        current = comp.with_rent(rent).evaluate_at(comp_rate)?.npv_magnitude;
        trace!("iteration {iterations}: rent {rent}, |NPV| {current}, bracket [{lower}, {upper}]");
    }

    info!("goal seek converged after {iterations} iterations at rent {rent}");

    let verdict = if original.rent > rent {
        PricingVerdict::Overpriced
    } else {
        PricingVerdict::Underpriced
    };
    let npv_difference = base_npv - original.npv;

    let commentary = vec![
        format!(
            "Comparable rent for base lease (${:.0}): ${:.0}",
            base.rent.round_dp(0),
            rent.round_dp(0)
        ),
        verdict.commentary().to_string(),
        format!("Difference in NPV: ${:.2}", npv_difference.round_dp(2)),
    ];

    Ok(GoalSeekOutput {
        final_npv_magnitude: current,
        solved_rent: rent.normalize(),
        target_npv_magnitude: target,
        base_rent: base.rent,
        original_comp_rent: original.rent,
        original_comp_npv: original.npv,
        npv_difference,
        verdict,
        iterations,
        stall_shifts,
        commentary,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_input(input: &LeaseComparisonInput) -> LeaseNpvResult<()> {
    if input.lower_bound > input.upper_bound {
        return Err(LeaseNpvError::InvalidInput {
            field: "lower_bound / upper_bound".into(),
            reason: "Lower bound must not exceed upper bound".into(),
        });
    }
    Ok(())
}

fn midpoint(lower: Money, upper: Money) -> Money {
    (lower + upper) / dec!(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lease::BrokerStructure;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn base_lease() -> LeaseTerms {
        LeaseTerms::new(dec!(4250), dec!(200))
            .with_broker_perc(dec!(0))
            .with_second_year_fee(false)
    }

    fn comp_lease() -> LeaseTerms {
        LeaseTerms::new(dec!(4000), dec!(1100))
            .with_broker_structure(BrokerStructure::one_month())
            .with_second_year_fee(false)
    }

    #[test]
    fn test_converges_within_tolerance() {
        let input = LeaseComparisonInput::new(base_lease(), comp_lease());
        let out = solve_rent(&input).unwrap();

        assert!((out.final_npv_magnitude - out.target_npv_magnitude).abs() < NPV_TOLERANCE);
        assert!(out.solved_rent > dec!(1000) && out.solved_rent < dec!(10000));
        assert_eq!(out.solved_rent, dec!(4028.75));
        assert_eq!(out.result_pair(), (out.final_npv_magnitude, out.solved_rent));
    }

    #[test]
    fn test_underpriced_verdict_and_commentary() {
        let input = LeaseComparisonInput::new(base_lease(), comp_lease());
        let out = solve_rent(&input).unwrap();

        assert_eq!(out.verdict, PricingVerdict::Underpriced);
        assert_eq!(out.commentary.len(), 3);
        assert_eq!(out.commentary[0], "Comparable rent for base lease ($4250): $4029");
        assert_eq!(
            out.commentary[1],
            "Comparison lease is potentially underpriced compared to base"
        );
        assert_eq!(out.commentary[2], "Difference in NPV: $-678.89");
    }

    #[test]
    fn test_overpriced_verdict() {
        let input = LeaseComparisonInput::new(base_lease(), comp_lease().with_rent(dec!(4500)));
        let out = solve_rent(&input).unwrap();
        assert_eq!(out.verdict, PricingVerdict::Overpriced);
        assert!(out.npv_difference > Decimal::ZERO);
    }

    #[test]
    fn test_already_matched_needs_no_iterations() {
        let input = LeaseComparisonInput::new(base_lease(), base_lease());
        let out = solve_rent(&input).unwrap();
        assert_eq!(out.iterations, 0);
        assert_eq!(out.solved_rent, dec!(4250));
        assert_eq!(out.npv_difference, Decimal::ZERO);
    }

    #[test]
    fn test_collapsed_bracket_above_solution_still_progresses() {
        // lower == upper == midpoint: plain bisection would never move
        let input = LeaseComparisonInput::new(base_lease(), comp_lease().with_rent(dec!(6000)))
            .with_bounds(dec!(4100), dec!(4100));
        let out = solve_rent(&input).unwrap();

        assert!(out.stall_shifts > 0);
        assert!(out.solved_rent < dec!(4100));
        assert!((out.final_npv_magnitude - out.target_npv_magnitude).abs() < NPV_TOLERANCE);
    }

    #[test]
    fn test_solution_above_bracket_is_exhausted() {
        let input = LeaseComparisonInput::new(base_lease(), comp_lease())
            .with_bounds(dec!(1000), dec!(3000));
        let err = solve_rent(&input).unwrap_err();
        assert!(matches!(err, LeaseNpvError::BracketExhausted { .. }), "{err}");
    }

    #[test]
    fn test_iteration_ceiling() {
        let input = LeaseComparisonInput::new(base_lease(), comp_lease()).with_max_iterations(5);
        let err = solve_rent(&input).unwrap_err();
        match err {
            LeaseNpvError::ConvergenceFailure { iterations, .. } => assert_eq!(iterations, 5),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_inverted_bracket_rejected() {
        let input = LeaseComparisonInput::new(base_lease(), comp_lease())
            .with_bounds(dec!(5000), dec!(4000));
        assert!(matches!(
            solve_rent(&input).unwrap_err(),
            LeaseNpvError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_caller_leases_unchanged() {
        let input = LeaseComparisonInput::new(base_lease(), comp_lease());
        let before = input.comp.clone();
        solve_rent(&input).unwrap();
        assert_eq!(input.comp, before);
    }

    #[test]
    fn test_goal_seek_envelope() {
        let input = LeaseComparisonInput::new(base_lease(), comp_lease());
        let output = goal_seek(&input).unwrap();
        assert!(output.warnings.is_empty(), "{:?}", output.warnings);
        assert_eq!(output.assumptions["rate_basis"], "shared");
        assert_eq!(output.result.solved_rent, dec!(4028.75));
    }
}
