//! Rule #1 valuation math. Pure and stateless: project EPS forward at an
//! assumed growth rate, apply a capped PE multiple, discount back at the
//! required return, and halve for the margin of safety.

use valuation_core::{CalculatedMetrics, Signal, StockData, ValuationError};

/// Projection horizon in years.
pub const PROJECTION_YEARS: i32 = 10;
/// Minimum acceptable rate of return used for discounting.
pub const REQUIRED_RETURN: f64 = 0.15;
/// Fixed 50% margin-of-safety discount.
pub const MARGIN_OF_SAFETY: f64 = 0.5;

const FUTURE_PE_MIN: f64 = 8.0;
const FUTURE_PE_MAX: f64 = 25.0;

/// Future PE multiple: twice the growth rate, bounded to [8, 25].
///
/// The multiplier takes the growth rate in percentage units (2 x 12, not
/// 2 x 0.12). That is the source methodology's retail heuristic, preserved
/// verbatim.
pub fn future_pe(growth_rate_pct: f64) -> f64 {
    (2.0 * growth_rate_pct).clamp(FUTURE_PE_MIN, FUTURE_PE_MAX)
}

/// Sticker price with explicit horizon and required return.
pub fn sticker_price_with(
    eps: f64,
    growth_rate_pct: f64,
    years: i32,
    required_return: f64,
) -> f64 {
    let growth_decimal = growth_rate_pct / 100.0;
    let future_eps = eps * (1.0 + growth_decimal).powi(years);
    let future_price = future_eps * future_pe(growth_rate_pct);
    let sticker = future_price / (1.0 + required_return).powi(years);
    sticker.max(0.0)
}

/// Sticker price at the standard 10-year horizon and 15% required return.
pub fn sticker_price(eps: f64, growth_rate_pct: f64) -> f64 {
    sticker_price_with(eps, growth_rate_pct, PROJECTION_YEARS, REQUIRED_RETURN)
}

/// Margin-of-safety price: half the sticker price, unconditionally.
pub fn mos_price(sticker_price: f64) -> f64 {
    sticker_price * MARGIN_OF_SAFETY
}

/// Trade signal from price vs valuation. Overvalued stocks stay at `Wait`;
/// no sell threshold exists yet (see `Signal::Sell`).
pub fn determine_signal(current_price: f64, sticker_price: f64, mos_price: f64) -> Signal {
    if current_price <= mos_price {
        Signal::Buy
    } else if current_price <= sticker_price {
        Signal::Wait
    } else {
        Signal::Wait
    }
}

/// Conservative default growth rate: the minimum of the positive growth
/// figures on record. Deliberately under-states growth relative to reported
/// numbers; fails when no figure is positive rather than inventing one.
pub fn default_growth_rate(stock: &StockData) -> Result<f64, ValuationError> {
    let mut rates = vec![stock.eps_growth, stock.sales_growth];
    if let Some(bv) = stock.book_value_growth {
        rates.push(bv);
    }

    rates
        .into_iter()
        .filter(|r| *r > 0.0)
        .reduce(f64::min)
        .ok_or(ValuationError::NoPositiveGrowth)
}

/// Compute the full metrics set for one stock. `custom_growth_rate` is the
/// user's override in percentage units; without it the conservative default
/// applies. The rate actually used is echoed back for display.
pub fn compute_metrics(
    stock: &StockData,
    custom_growth_rate: Option<f64>,
) -> Result<CalculatedMetrics, ValuationError> {
    let growth_rate = match custom_growth_rate {
        Some(rate) => rate,
        None => default_growth_rate(stock)?,
    };

    let sticker = sticker_price(stock.eps, growth_rate);
    let mos = mos_price(sticker);
    let signal = determine_signal(stock.current_price, sticker, mos);

    Ok(CalculatedMetrics {
        sticker_price: sticker,
        mos_price: mos,
        signal,
        custom_growth_rate: growth_rate,
    })
}
