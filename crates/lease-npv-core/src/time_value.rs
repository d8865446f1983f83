//! Discounting primitives shared by the lease model and the goal seek.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::error::LeaseNpvError;
use crate::types::{Money, Rate};
use crate::LeaseNpvResult;

const NEWTON_ITERATIONS: u32 = 30;
const ROOT_CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000000000001);

/// Net Present Value of a series of cash flows.
///
/// The flow at index 0 is undiscounted; each later flow is discounted one
/// additional period at `rate`.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> LeaseNpvResult<Money> {
    if rate <= dec!(-1) {
        return Err(LeaseNpvError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE
        .checked_add(rate)
        .ok_or_else(|| out_of_range("rate", "1 + rate".into()))?;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount
                .checked_mul(one_plus_r)
                .ok_or_else(|| out_of_range("rate", format!("discount factor at period {t}")))?;
        }
        if discount.is_zero() {
            return Err(LeaseNpvError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        let pv = cf
            .checked_div(discount)
            .ok_or_else(|| out_of_range("rate", format!("present value at period {t}")))?;
        result = result
            .checked_add(pv)
            .ok_or_else(|| out_of_range("cash_flows", format!("NPV sum at period {t}")))?;
    }

    Ok(result)
}

/// NPV of a stream of cost outflows, negated so that positive outflows give a
/// negative figure whose magnitude is the present-value cost.
pub fn npv_cost(rate: Rate, cash_flows: &[Money]) -> LeaseNpvResult<Money> {
    Ok(-npv(rate, cash_flows)?)
}

/// Convert an annual rate to the equivalent monthly compounding rate:
/// monthly_rate = (1 + annual_rate)^(1/12) - 1
pub fn annual_to_monthly_rate(annual_rate: Rate) -> LeaseNpvResult<Rate> {
    if annual_rate <= dec!(-1) {
        return Err(LeaseNpvError::InvalidInput {
            field: "annual_discount".into(),
            reason: "Annual discount rate must be greater than -100%".into(),
        });
    }
    let growth = Decimal::ONE
        .checked_add(annual_rate)
        .ok_or_else(|| out_of_range("annual_discount", "1 + annual rate".into()))?;
    Ok(nth_root(growth, 12)? - Decimal::ONE)
}

fn out_of_range(field: &str, what: String) -> LeaseNpvError {
    LeaseNpvError::InvalidInput {
        field: field.into(),
        reason: format!("{what} is outside the representable decimal range"),
    }
}

/// x^k by repeated checked multiplication.
fn checked_powi(x: Decimal, k: u32) -> Option<Decimal> {
    (0..k).try_fold(Decimal::ONE, |acc, _| acc.checked_mul(x))
}

/// Newton's method for the nth root of A, seeded from `powd`.
/// x_{k+1} = ((n-1)*x_k + A / x_k^(n-1)) / n
fn nth_root(a: Decimal, n: u32) -> LeaseNpvResult<Decimal> {
    if a <= Decimal::ZERO {
        return Err(LeaseNpvError::InvalidInput {
            field: "nth_root".into(),
            reason: "Root of a non-positive value".into(),
        });
    }
    if a == Decimal::ONE {
        return Ok(Decimal::ONE);
    }
    let n_dec = Decimal::from(n);
    let n_minus_1 = n_dec - Decimal::ONE;

    // Newton from (1 + (a-1)/n) stays above the root but crawls for large a
    let mut x = a
        .checked_powd(Decimal::ONE / n_dec)
        .filter(|seed| *seed > Decimal::ZERO)
        .unwrap_or(Decimal::ONE + (a - Decimal::ONE) / n_dec);

    let mut delta = Decimal::ZERO;
    for _ in 0..NEWTON_ITERATIONS {
        let x_pow = checked_powi(x, n - 1)
            .ok_or_else(|| out_of_range("nth_root", format!("{x}^{}", n - 1)))?;
        if x_pow.is_zero() {
            return Err(LeaseNpvError::DivisionByZero {
                context: "nth_root Newton step".into(),
            });
        }
        let x_new = (n_minus_1 * x + a / x_pow) / n_dec;
        delta = (x_new - x).abs();
        x = x_new;
        if delta < ROOT_CONVERGENCE_THRESHOLD {
            return Ok(x);
        }
    }

    Err(LeaseNpvError::ConvergenceFailure {
        function: "nth_root".into(),
        iterations: NEWTON_ITERATIONS,
        last_delta: delta,
    })
}
