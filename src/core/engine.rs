/// Multiple of desired annual retirement expenses used as the
/// rule-of-thumb corpus target.
pub const RULE_OF_THUMB_EXPENSE_MULTIPLE: f64 = 25.0;

/// Future value of saving `monthly_amount` at the end of each month into an
/// account compounding monthly at `annual_rate_percent`.
///
/// Each month the deposit lands first and then the month's growth applies.
/// The iterative recurrence is the contract here; callers rely on its exact
/// rounding behavior, so it must not be replaced with the closed-form
/// annuity expression.
pub fn recurring_contribution_future_value(
    monthly_amount: f64,
    annual_rate_percent: f64,
    years: u32,
) -> f64 {
    let monthly_rate = annual_rate_percent / 100.0 / 12.0;
    let months = years.saturating_mul(12);
    let mut balance = 0.0;
    for _ in 0..months {
        balance = (balance + monthly_amount) * (1.0 + monthly_rate);
    }
    balance
}

/// Future value of a one-time investment with annual compounding.
pub fn lump_sum_future_value(principal: f64, annual_rate_percent: f64, years: u32) -> f64 {
    principal * (1.0 + annual_rate_percent / 100.0).powi(years as i32)
}

/// Emergency fund sized as a number of months of essential expenses.
/// No bounds are applied; zero or negative inputs pass through
/// arithmetically.
pub fn emergency_fund_target(monthly_expenses: f64, months_of_cover: f64) -> f64 {
    monthly_expenses * months_of_cover
}

/// Corpus at retirement from growing today's savings plus a monthly
/// contribution stream, both at the same expected return.
pub fn retirement_corpus_estimate(
    current_savings: f64,
    monthly_contribution: f64,
    years_to_retirement: u32,
    annual_rate_percent: f64,
) -> f64 {
    lump_sum_future_value(current_savings, annual_rate_percent, years_to_retirement)
        + recurring_contribution_future_value(
            monthly_contribution,
            annual_rate_percent,
            years_to_retirement,
        )
}

/// Rule-of-thumb retirement target: 25x desired annual expenses.
pub fn rule_of_thumb_corpus(annual_expenses: f64) -> f64 {
    annual_expenses * RULE_OF_THUMB_EXPENSE_MULTIPLE
}

/// Share of income left after expenses, in percent, clamped at zero.
/// Returns 0 when there is no income to measure against.
pub fn savings_rate_percent(monthly_income: f64, monthly_expenses: f64) -> f64 {
    if monthly_income <= 0.0 {
        return 0.0;
    }
    ((monthly_income - monthly_expenses) / monthly_income * 100.0).max(0.0)
}
