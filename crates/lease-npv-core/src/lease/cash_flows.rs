use crate::types::Money;

/// Months in one lease year.
pub const MONTHS_PER_LEASE_YEAR: usize = 12;

/// Months covered by a two-year lease schedule.
pub const LEASE_TERM_MONTHS: usize = 2 * MONTHS_PER_LEASE_YEAR;

/// Build the 24-month outflow sequence for a lease.
///
/// Month 1 carries rent, broker fee and moving cost; months 2-12 are rent.
/// The second year repeats the first when `second_year_fee` is set, otherwise
/// it is flat rent.
pub fn build_cash_flows(
    rent: Money,
    broker_fee: Money,
    moving_cost: Money,
    second_year_fee: bool,
) -> Vec<Money> {
    let mut first_year = Vec::with_capacity(MONTHS_PER_LEASE_YEAR);
    first_year.push(rent + broker_fee + moving_cost);
    first_year.extend(std::iter::repeat(rent).take(MONTHS_PER_LEASE_YEAR - 1));

    let mut flows = Vec::with_capacity(LEASE_TERM_MONTHS);
    flows.extend_from_slice(&first_year);
    if second_year_fee {
        flows.extend_from_slice(&first_year);
    } else {
        flows.extend(std::iter::repeat(rent).take(MONTHS_PER_LEASE_YEAR));
    }
    flows
}
