mod engine;
mod solver;
mod tax;
mod types;

pub use engine::{
    RULE_OF_THUMB_EXPENSE_MULTIPLE, emergency_fund_target, lump_sum_future_value,
    recurring_contribution_future_value, retirement_corpus_estimate, rule_of_thumb_corpus,
    savings_rate_percent,
};
pub use solver::required_monthly_contribution;
pub use tax::{compute_tax, validate_slabs};
pub use types::{SlabBound, TaxSlab};
