//! Lease configuration and its discounted cost.
//!
//! [`LeaseTerms`] is plain configuration. Every evaluation runs the full
//! pipeline (broker fee, 24-month cash flows, discounting) and returns a fresh
//! [`LeaseValuation`]; nothing is cached between calls.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::broker_fee::{calc_broker_fee, BrokerStructure};
use super::cash_flows::build_cash_flows;
use crate::time_value::{annual_to_monthly_rate, npv_cost};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LeaseNpvResult;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Broker fee as a share of annual rent when none is given.
pub const DEFAULT_BROKER_PERC: Rate = dec!(0.12);

/// Nominal annual discount rate when none is given. Under
/// [`RateBasis::Shared`] this is the only rate ever used.
pub const DEFAULT_ANNUAL_DISCOUNT: Rate = dec!(0.08);

fn default_broker_perc() -> Rate {
    DEFAULT_BROKER_PERC
}

fn default_annual_discount() -> Rate {
    DEFAULT_ANNUAL_DISCOUNT
}

fn default_second_year_fee() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which annual rate the monthly discount rate is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateBasis {
    /// One monthly rate derived from [`DEFAULT_ANNUAL_DISCOUNT`], shared by
    /// every lease regardless of its own `annual_discount`.
    #[default]
    Shared,
    /// Each lease discounts at the monthly equivalent of its own
    /// `annual_discount`.
    PerLease,
}

impl RateBasis {
    /// Monthly compounding rate applied to `lease` under this basis.
    pub fn monthly_rate(&self, lease: &LeaseTerms) -> LeaseNpvResult<Rate> {
        match self {
            RateBasis::Shared => shared_monthly_discount(),
            RateBasis::PerLease => annual_to_monthly_rate(lease.annual_discount),
        }
    }
}

/// The monthly rate shared by all leases under [`RateBasis::Shared`].
pub fn shared_monthly_discount() -> LeaseNpvResult<Rate> {
    annual_to_monthly_rate(DEFAULT_ANNUAL_DISCOUNT)
}

/// One residential lease offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseTerms {
    /// Monthly rent
    pub rent: Money,
    /// One-time moving cost paid in month 1
    pub moving_cost: Money,
    /// How the broker fee is charged
    #[serde(default)]
    pub broker_structure: BrokerStructure,
    /// Share of annual rent charged under `perc_annual`
    #[serde(default = "default_broker_perc")]
    pub broker_perc: Rate,
    /// Nominal annual discount rate
    #[serde(default = "default_annual_discount")]
    pub annual_discount: Rate,
    /// Whether broker fee and moving cost recur in year two
    #[serde(default = "default_second_year_fee")]
    pub second_year_fee: bool,
}

/// Everything derived from a lease in one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseValuation {
    /// Rent the valuation was run at
    pub rent: Money,
    pub broker_fee: Money,
    pub monthly_discount: Rate,
    /// 24 monthly outflows
    pub cash_flows: Vec<Money>,
    /// Undiscounted sum of the outflows
    pub total_outflows: Money,
    /// Negative present value of the outflows
    pub npv: Money,
    /// Present-value cost, |npv|
    pub npv_magnitude: Money,
}

/// Input for a single-lease valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseNpvInput {
    pub lease: LeaseTerms,
    #[serde(default)]
    pub rate_basis: RateBasis,
}

// ---------------------------------------------------------------------------
// LeaseTerms
// ---------------------------------------------------------------------------

impl LeaseTerms {
    /// Lease with the default broker structure, percentage, discount rate
    /// and a recurring second-year fee.
    pub fn new(rent: Money, moving_cost: Money) -> Self {
        Self {
            rent,
            moving_cost,
            broker_structure: BrokerStructure::default(),
            broker_perc: DEFAULT_BROKER_PERC,
            annual_discount: DEFAULT_ANNUAL_DISCOUNT,
            second_year_fee: default_second_year_fee(),
        }
    }

    pub fn with_rent(&self, rent: Money) -> Self {
        Self {
            rent,
            ..self.clone()
        }
    }

    pub fn with_broker_structure(mut self, structure: BrokerStructure) -> Self {
        self.broker_structure = structure;
        self
    }

    pub fn with_broker_perc(mut self, broker_perc: Rate) -> Self {
        self.broker_perc = broker_perc;
        self
    }

    pub fn with_annual_discount(mut self, annual_discount: Rate) -> Self {
        self.annual_discount = annual_discount;
        self
    }

    pub fn with_second_year_fee(mut self, second_year_fee: bool) -> Self {
        self.second_year_fee = second_year_fee;
        self
    }

    pub fn broker_fee(&self) -> LeaseNpvResult<Money> {
        calc_broker_fee(self.rent, self.broker_structure, self.broker_perc)
    }

    /// The 24 monthly outflows. Recomputes the broker fee first.
    pub fn cash_flows(&self) -> LeaseNpvResult<Vec<Money>> {
        let fee = self.broker_fee()?;
        Ok(build_cash_flows(
            self.rent,
            fee,
            self.moving_cost,
            self.second_year_fee,
        ))
    }

    /// Run the full pipeline at an explicit monthly rate.
    pub fn evaluate_at(&self, monthly_discount: Rate) -> LeaseNpvResult<LeaseValuation> {
        let broker_fee = self.broker_fee()?;
        let cash_flows = build_cash_flows(
            self.rent,
            broker_fee,
            self.moving_cost,
            self.second_year_fee,
        );
        let npv = npv_cost(monthly_discount, &cash_flows)?;
        let total_outflows: Money = cash_flows.iter().copied().sum();

        Ok(LeaseValuation {
            rent: self.rent,
            broker_fee,
            monthly_discount,
            cash_flows,
            total_outflows,
            npv,
            npv_magnitude: npv.abs(),
        })
    }

    pub fn evaluate(&self, basis: RateBasis) -> LeaseNpvResult<LeaseValuation> {
        self.evaluate_at(basis.monthly_rate(self)?)
    }

    /// Present value of the lease as a negative cost figure.
    pub fn gen_npv(&self, basis: RateBasis) -> LeaseNpvResult<Money> {
        Ok(self.evaluate(basis)?.npv)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value a single lease: broker fee, cash flows and NPV.
pub fn evaluate_lease(input: &LeaseNpvInput) -> LeaseNpvResult<ComputationOutput<LeaseValuation>> {
    let start = Instant::now();
    let warnings = lease_warnings(&input.lease, input.rate_basis);

    let valuation = input.lease.evaluate(input.rate_basis)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "24-month lease cash flows discounted at a monthly compounding rate",
        input,
        warnings,
        elapsed,
        valuation,
    ))
}

/// Reasonableness warnings for a lease under the given rate basis.
pub(crate) fn lease_warnings(lease: &LeaseTerms, basis: RateBasis) -> Vec<String> {
    let mut warnings = Vec::new();
    if basis == RateBasis::Shared && lease.annual_discount != DEFAULT_ANNUAL_DISCOUNT {
        warnings.push(format!(
            "annual_discount {} ignored under the shared rate basis; discounting at {}",
            lease.annual_discount, DEFAULT_ANNUAL_DISCOUNT
        ));
    }
    if lease.rent <= Decimal::ZERO {
        warnings.push(format!("Non-positive rent ({})", lease.rent));
    }
    if lease.broker_structure != BrokerStructure::PercAnnual && lease.broker_perc != DEFAULT_BROKER_PERC
    {
        warnings.push(format!(
            "broker_perc {} has no effect with a {} broker fee",
            lease.broker_perc, lease.broker_structure
        ));
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_lease() -> LeaseTerms {
        LeaseTerms::new(dec!(4250), dec!(200))
            .with_broker_perc(dec!(0))
            .with_second_year_fee(false)
    }

    #[test]
    fn test_defaults_from_new() {
        let lease = LeaseTerms::new(dec!(3000), dec!(500));
        assert_eq!(lease.broker_structure, BrokerStructure::PercAnnual);
        assert_eq!(lease.broker_perc, dec!(0.12));
        assert_eq!(lease.annual_discount, dec!(0.08));
        assert!(lease.second_year_fee);
    }

    #[test]
    fn test_serde_defaults_match_new() {
        let lease: LeaseTerms = serde_json::from_str(r#"{"rent": 3000, "moving_cost": 500}"#).unwrap();
        assert_eq!(lease, LeaseTerms::new(dec!(3000), dec!(500)));
    }

    #[test]
    fn test_serde_rejects_unknown_structure() {
        let err = serde_json::from_str::<LeaseTerms>(
            r#"{"rent": 3000, "moving_cost": 500, "broker_structure": "half_rent"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("half_rent"), "{err}");
    }

    #[test]
    fn test_base_lease_npv_near_reference() {
        let npv = base_lease().gen_npv(RateBasis::Shared).unwrap();
        // 4450 now, 23 x 4250 discounted at (1.08)^(1/12) - 1
        assert!((npv - dec!(-95041.18)).abs() < dec!(0.01), "got {npv}");
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let lease = base_lease();
        let first = lease.evaluate(RateBasis::Shared).unwrap();
        let second = lease.evaluate(RateBasis::Shared).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_with_rent_leaves_original_untouched() {
        let lease = base_lease();
        let bumped = lease.with_rent(dec!(5000));
        assert_eq!(lease.rent, dec!(4250));
        assert_eq!(bumped.rent, dec!(5000));
        assert_eq!(bumped.moving_cost, lease.moving_cost);
    }

    #[test]
    fn test_fee_recomputed_on_each_evaluation() {
        let lease = LeaseTerms::new(dec!(4000), dec!(0))
            .with_broker_structure(BrokerStructure::one_month())
            .with_second_year_fee(false);
        let low = lease.evaluate(RateBasis::Shared).unwrap();
        let high = lease.with_rent(dec!(5000)).evaluate(RateBasis::Shared).unwrap();
        assert_eq!(low.broker_fee, dec!(4000));
        assert_eq!(high.broker_fee, dec!(5000));
        assert_eq!(high.cash_flows[0], dec!(10000));
    }

    #[test]
    fn test_higher_rent_costs_more() {
        let lease = base_lease();
        let mut previous = Decimal::ZERO;
        for rent in [dec!(1000), dec!(2500), dec!(4250), dec!(6000), dec!(10000)] {
            let cost = lease.with_rent(rent).evaluate(RateBasis::Shared).unwrap().npv_magnitude;
            assert!(cost > previous, "rent {rent} gave {cost}, not above {previous}");
            previous = cost;
        }
    }

    #[test]
    fn test_shared_basis_ignores_lease_discount() {
        let lease = base_lease().with_annual_discount(dec!(0.20));
        let shared = lease.gen_npv(RateBasis::Shared).unwrap();
        assert_eq!(shared, base_lease().gen_npv(RateBasis::Shared).unwrap());

        let per_lease = lease.gen_npv(RateBasis::PerLease).unwrap();
        // Heavier discounting lowers the present-value cost
        assert!(per_lease.abs() < shared.abs());
    }

    #[test]
    fn test_per_lease_extreme_discount() {
        let lease = base_lease().with_annual_discount(dec!(500));
        let valuation = lease.evaluate(RateBasis::PerLease).unwrap();
        // 501^(1/12) - 1
        assert!(
            (valuation.monthly_discount - dec!(0.6788)).abs() < dec!(0.0001),
            "got {}",
            valuation.monthly_discount
        );
        // Bounded by the perpetuity 4450 + 4250 / m
        assert!(valuation.npv_magnitude > dec!(4450));
        assert!(valuation.npv_magnitude < dec!(10712));
    }

    #[test]
    fn test_total_outflows() {
        let valuation = base_lease().evaluate(RateBasis::Shared).unwrap();
        assert_eq!(valuation.total_outflows, dec!(4450) + dec!(4250) * dec!(23));
        assert!(valuation.npv_magnitude < valuation.total_outflows);
    }

    #[test]
    fn test_evaluate_lease_warns_on_ignored_discount() {
        let input = LeaseNpvInput {
            lease: base_lease().with_annual_discount(dec!(0.05)),
            rate_basis: RateBasis::Shared,
        };
        let output = evaluate_lease(&input).unwrap();
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].contains("shared rate basis"));
        assert_eq!(output.result.cash_flows.len(), 24);
    }
}
