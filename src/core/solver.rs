/// Monthly contribution needed to reach `goal_amount` after `years` of
/// monthly compounding at `annual_rate_percent`, via the closed-form
/// ordinary-annuity payment equation.
///
/// The forward projection in the engine deposits before compounding, so
/// this inversion is not its exact inverse: a payment solved here lands
/// slightly above the goal when replayed through the projection. That gap
/// is intentional and must stay.
///
/// Callers must reject `years == 0` before calling; with a zero period the
/// division has no meaning and the result is non-finite.
pub fn required_monthly_contribution(
    goal_amount: f64,
    annual_rate_percent: f64,
    years: u32,
) -> f64 {
    let monthly_rate = annual_rate_percent / 100.0 / 12.0;
    let months = f64::from(years) * 12.0;
    if monthly_rate == 0.0 {
        return goal_amount / months;
    }
    goal_amount * monthly_rate / ((1.0 + monthly_rate).powf(months) - 1.0)
}
