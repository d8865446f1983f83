//! Broker fee structures and the one-time fee they imply.
//!
//! A fee is either a percentage of annualized rent (`perc_annual`) or a
//! whole number of months' rent (`1mo_rent`, `2mo_rent`).

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cash_flows::MONTHS_PER_LEASE_YEAR;
use crate::error::LeaseNpvError;
use crate::types::{Money, Rate};
use crate::LeaseNpvResult;

/// Every tag accepted for a broker fee structure.
pub const BROKER_STRUCTURES: [&str; 3] = ["perc_annual", "1mo_rent", "2mo_rent"];

/// How the broker fee is charged at signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BrokerStructure {
    /// `broker_perc` of twelve months' rent
    #[default]
    PercAnnual,
    /// A fixed number of months' rent
    MonthsOfRent { months: u32 },
}

impl BrokerStructure {
    pub fn one_month() -> Self {
        BrokerStructure::MonthsOfRent { months: 1 }
    }

    pub fn two_months() -> Self {
        BrokerStructure::MonthsOfRent { months: 2 }
    }

    fn validate(&self) -> LeaseNpvResult<()> {
        match self {
            BrokerStructure::PercAnnual => Ok(()),
            BrokerStructure::MonthsOfRent { months } if (1..=2).contains(months) => Ok(()),
            other => Err(invalid_structure(&other.to_string())),
        }
    }
}

impl fmt::Display for BrokerStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerStructure::PercAnnual => write!(f, "perc_annual"),
            BrokerStructure::MonthsOfRent { months } => write!(f, "{months}mo_rent"),
        }
    }
}

impl FromStr for BrokerStructure {
    type Err = LeaseNpvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "perc_annual" => Ok(BrokerStructure::PercAnnual),
            "1mo_rent" => Ok(BrokerStructure::one_month()),
            "2mo_rent" => Ok(BrokerStructure::two_months()),
            other => Err(invalid_structure(other)),
        }
    }
}

impl TryFrom<String> for BrokerStructure {
    type Error = LeaseNpvError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BrokerStructure> for String {
    fn from(value: BrokerStructure) -> Self {
        value.to_string()
    }
}

fn invalid_structure(value: &str) -> LeaseNpvError {
    LeaseNpvError::InvalidBrokerStructure {
        value: value.to_string(),
        allowed: BROKER_STRUCTURES.iter().map(|s| s.to_string()).collect(),
    }
}

/// One-time broker fee for a lease.
///
/// `broker_perc` is only read for [`BrokerStructure::PercAnnual`]. Rent is not
/// validated; zero or negative rent passes straight through.
pub fn calc_broker_fee(
    rent: Money,
    structure: BrokerStructure,
    broker_perc: Rate,
) -> LeaseNpvResult<Money> {
    structure.validate()?;

    let fee = match structure {
        BrokerStructure::PercAnnual => {
            broker_perc * (rent * Decimal::from(MONTHS_PER_LEASE_YEAR))
        }
        BrokerStructure::MonthsOfRent { months } => rent * Decimal::from(months),
    };
    Ok(fee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_perc_annual_zero_percent_is_free() {
        let fee = calc_broker_fee(dec!(4250), BrokerStructure::PercAnnual, dec!(0)).unwrap();
        assert_eq!(fee, Decimal::ZERO);
    }

    #[test]
    fn test_perc_annual_twelve_percent() {
        let fee = calc_broker_fee(dec!(4000), BrokerStructure::PercAnnual, dec!(0.12)).unwrap();
        assert_eq!(fee, dec!(5760));
    }

    #[test]
    fn test_perc_annual_covers_one_lease_year() {
        let fee = calc_broker_fee(dec!(1), BrokerStructure::PercAnnual, dec!(1)).unwrap();
        assert_eq!(fee, Decimal::from(MONTHS_PER_LEASE_YEAR));
    }

    #[test]
    fn test_one_and_two_months_rent() {
        let one = calc_broker_fee(dec!(4000), BrokerStructure::one_month(), dec!(0.12)).unwrap();
        let two = calc_broker_fee(dec!(4000), BrokerStructure::two_months(), dec!(0.12)).unwrap();
        assert_eq!(one, dec!(4000));
        assert_eq!(two, dec!(8000));
    }

    #[test]
    fn test_negative_rent_not_rejected() {
        let fee = calc_broker_fee(dec!(-100), BrokerStructure::one_month(), dec!(0)).unwrap();
        assert_eq!(fee, dec!(-100));
    }

    #[test]
    fn test_parse_known_tags() {
        for tag in BROKER_STRUCTURES {
            let parsed: BrokerStructure = tag.parse().unwrap();
            assert_eq!(parsed.to_string(), tag);
        }
    }

    #[test]
    fn test_parse_unknown_tag_names_value_and_set() {
        let err = "3mo_rent".parse::<BrokerStructure>().unwrap_err();
        match &err {
            LeaseNpvError::InvalidBrokerStructure { value, allowed } => {
                assert_eq!(value, "3mo_rent");
                assert_eq!(allowed.len(), 3);
                assert!(allowed.iter().any(|a| a == "perc_annual"));
            }
            other => panic!("unexpected error: {other}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("3mo_rent") && msg.contains("1mo_rent"), "{msg}");
    }

    #[test]
    fn test_out_of_range_multiplier_rejected_before_fee() {
        let err = calc_broker_fee(
            dec!(4000),
            BrokerStructure::MonthsOfRent { months: 3 },
            dec!(0),
        )
        .unwrap_err();
        assert!(matches!(err, LeaseNpvError::InvalidBrokerStructure { .. }));
    }

    #[test]
    fn test_serde_uses_tag_strings() {
        let json = serde_json::to_string(&BrokerStructure::two_months()).unwrap();
        assert_eq!(json, "\"2mo_rent\"");
        let back: BrokerStructure = serde_json::from_str("\"1mo_rent\"").unwrap();
        assert_eq!(back, BrokerStructure::one_month());
        assert!(serde_json::from_str::<BrokerStructure>("\"weekly\"").is_err());
    }
}
