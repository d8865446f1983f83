//! Lease cost model: broker fee, cash-flow schedule and discounted cost.

pub mod broker_fee;
pub mod cash_flows;
pub mod model;

pub use broker_fee::{calc_broker_fee, BrokerStructure, BROKER_STRUCTURES};
pub use cash_flows::{build_cash_flows, LEASE_TERM_MONTHS};
pub use model::{
    evaluate_lease, shared_monthly_discount, LeaseNpvInput, LeaseTerms, LeaseValuation,
    RateBasis, DEFAULT_ANNUAL_DISCOUNT, DEFAULT_BROKER_PERC,
};
