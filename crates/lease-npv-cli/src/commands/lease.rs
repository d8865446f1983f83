use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use lease_npv_core::goal_seek::{self, LeaseComparisonInput};
use lease_npv_core::lease::{self, BrokerStructure, LeaseNpvInput, LeaseTerms, RateBasis};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RateBasisArg {
    /// Every lease discounts at the monthly equivalent of 8% a year
    Shared,
    /// Each lease discounts at its own annual rate
    PerLease,
}

impl From<RateBasisArg> for RateBasis {
    fn from(arg: RateBasisArg) -> Self {
        match arg {
            RateBasisArg::Shared => RateBasis::Shared,
            RateBasisArg::PerLease => RateBasis::PerLease,
        }
    }
}

/// Arguments for a single-lease NPV
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct NpvArgs {
    /// Monthly rent
    #[arg(long)]
    pub rent: Option<Decimal>,

    /// One-time moving cost paid in month 1
    #[arg(long, default_value = "0")]
    pub moving_cost: Decimal,

    /// Broker fee structure: perc_annual, 1mo_rent or 2mo_rent
    #[arg(long)]
    pub broker_structure: Option<BrokerStructure>,

    /// Broker fee as a share of annual rent (perc_annual only)
    #[arg(long)]
    pub broker_perc: Option<Decimal>,

    /// Nominal annual discount rate
    #[arg(long)]
    pub annual_discount: Option<Decimal>,

    /// Broker fee and moving cost are paid once, not again in year two
    #[arg(long)]
    pub no_second_year_fee: bool,

    /// Which annual rate the monthly discount rate comes from
    #[arg(long, value_enum, default_value = "shared")]
    pub rate_basis: RateBasisArg,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the rent goal seek
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct GoalSeekArgs {
    /// Baseline monthly rent
    #[arg(long)]
    pub base_rent: Option<Decimal>,

    /// Baseline moving cost
    #[arg(long, default_value = "0")]
    pub base_moving_cost: Decimal,

    /// Baseline broker fee structure
    #[arg(long)]
    pub base_broker_structure: Option<BrokerStructure>,

    /// Baseline broker fee share of annual rent
    #[arg(long)]
    pub base_broker_perc: Option<Decimal>,

    /// Baseline annual discount rate
    #[arg(long)]
    pub base_annual_discount: Option<Decimal>,

    /// Baseline pays broker fee and moving cost only once
    #[arg(long)]
    pub base_no_second_year_fee: bool,

    /// Comparison monthly rent
    #[arg(long)]
    pub comp_rent: Option<Decimal>,

    /// Comparison moving cost
    #[arg(long, default_value = "0")]
    pub comp_moving_cost: Decimal,

    /// Comparison broker fee structure
    #[arg(long)]
    pub comp_broker_structure: Option<BrokerStructure>,

    /// Comparison broker fee share of annual rent
    #[arg(long)]
    pub comp_broker_perc: Option<Decimal>,

    /// Comparison annual discount rate
    #[arg(long)]
    pub comp_annual_discount: Option<Decimal>,

    /// Comparison pays broker fee and moving cost only once
    #[arg(long)]
    pub comp_no_second_year_fee: bool,

    /// Lowest rent in the initial search bracket
    #[arg(long, default_value = "1000")]
    pub lower_bound: Decimal,

    /// Highest rent in the initial search bracket
    #[arg(long, default_value = "10000")]
    pub upper_bound: Decimal,

    /// Which annual rate the monthly discount rate comes from
    #[arg(long, value_enum, default_value = "shared")]
    pub rate_basis: RateBasisArg,

    /// Give up after this many search steps
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Flag values describing one lease.
struct LeaseFlags<'a> {
    prefix: &'a str,
    rent: Option<Decimal>,
    moving_cost: Decimal,
    broker_structure: Option<BrokerStructure>,
    broker_perc: Option<Decimal>,
    annual_discount: Option<Decimal>,
    no_second_year_fee: bool,
}

impl LeaseFlags<'_> {
    fn into_terms(self) -> Result<LeaseTerms, Box<dyn std::error::Error>> {
        let rent = self
            .rent
            .ok_or(format!("--{}rent is required (or provide --input)", self.prefix))?;
        let mut terms = LeaseTerms::new(rent, self.moving_cost)
            .with_second_year_fee(!self.no_second_year_fee);
        if let Some(structure) = self.broker_structure {
            terms = terms.with_broker_structure(structure);
        }
        if let Some(perc) = self.broker_perc {
            terms = terms.with_broker_perc(perc);
        }
        if let Some(discount) = self.annual_discount {
            terms = terms.with_annual_discount(discount);
        }
        Ok(terms)
    }
}

pub fn run_npv(args: NpvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let npv_input: LeaseNpvInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let flags = LeaseFlags {
            prefix: "",
            rent: args.rent,
            moving_cost: args.moving_cost,
            broker_structure: args.broker_structure,
            broker_perc: args.broker_perc,
            annual_discount: args.annual_discount,
            no_second_year_fee: args.no_second_year_fee,
        };
        LeaseNpvInput {
            lease: flags.into_terms()?,
            rate_basis: args.rate_basis.into(),
        }
    };
    let result = lease::evaluate_lease(&npv_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_goal_seek(args: GoalSeekArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let comparison: LeaseComparisonInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let base = LeaseFlags {
            prefix: "base-",
            rent: args.base_rent,
            moving_cost: args.base_moving_cost,
            broker_structure: args.base_broker_structure,
            broker_perc: args.base_broker_perc,
            annual_discount: args.base_annual_discount,
            no_second_year_fee: args.base_no_second_year_fee,
        }
        .into_terms()?;
        let comp = LeaseFlags {
            prefix: "comp-",
            rent: args.comp_rent,
            moving_cost: args.comp_moving_cost,
            broker_structure: args.comp_broker_structure,
            broker_perc: args.comp_broker_perc,
            annual_discount: args.comp_annual_discount,
            no_second_year_fee: args.comp_no_second_year_fee,
        }
        .into_terms()?;

        let mut comparison = LeaseComparisonInput::new(base, comp)
            .with_bounds(args.lower_bound, args.upper_bound)
            .with_rate_basis(args.rate_basis.into());
        if let Some(max) = args.max_iterations {
            comparison = comparison.with_max_iterations(max);
        }
        comparison
    };
    let result = goal_seek::goal_seek(&comparison)?;
    Ok(serde_json::to_value(result)?)
}

/// Two apartment offers: no broker fee at $4,250 versus one month's rent as
/// fee at $4,000 with a pricier move.
pub fn run_demo() -> Result<Value, Box<dyn std::error::Error>> {
    let base = LeaseTerms::new(dec!(4250), dec!(200))
        .with_broker_perc(Decimal::ZERO)
        .with_second_year_fee(false);
    let comp = LeaseTerms::new(dec!(4000), dec!(1100))
        .with_broker_structure(BrokerStructure::one_month())
        .with_second_year_fee(false);

    let result = goal_seek::goal_seek(&LeaseComparisonInput::new(base, comp))?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(rent: Option<Decimal>) -> LeaseFlags<'static> {
        LeaseFlags {
            prefix: "comp-",
            rent,
            moving_cost: dec!(1100),
            broker_structure: Some(BrokerStructure::one_month()),
            broker_perc: None,
            annual_discount: None,
            no_second_year_fee: true,
        }
    }

    #[test]
    fn test_flags_build_lease() {
        let terms = flags(Some(dec!(4000))).into_terms().unwrap();
        assert_eq!(terms.rent, dec!(4000));
        assert_eq!(terms.broker_structure, BrokerStructure::one_month());
        assert_eq!(terms.broker_perc, lease::DEFAULT_BROKER_PERC);
        assert!(!terms.second_year_fee);
    }

    #[test]
    fn test_missing_rent_names_flag() {
        let err = flags(None).into_terms().unwrap_err();
        assert!(err.to_string().contains("--comp-rent"), "{err}");
    }

    #[test]
    fn test_demo_output() {
        let value = run_demo().unwrap();
        let solved: Decimal = value["result"]["solved_rent"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(solved, dec!(4028.75));
        assert_eq!(value["result"]["verdict"], "underpriced");
        assert_eq!(value["result"]["commentary"].as_array().unwrap().len(), 3);
    }
}
