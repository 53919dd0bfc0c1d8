use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    TaxSlab, compute_tax, emergency_fund_target, lump_sum_future_value,
    recurring_contribution_future_value, required_monthly_contribution,
    retirement_corpus_estimate, rule_of_thumb_corpus, savings_rate_percent, validate_slabs,
};
use crate::profile::{self, FinancialProfile};

const DEFAULT_SAVINGS_RATE_PERCENT: f64 = 8.0;
const DEFAULT_SAVINGS_YEARS: u32 = 10;
const DEFAULT_LUMP_SUM_PRINCIPAL: f64 = 100_000.0;
const DEFAULT_LUMP_SUM_RATE_PERCENT: f64 = 8.0;
const DEFAULT_LUMP_SUM_YEARS: u32 = 5;
const DEFAULT_SIP_RATE_PERCENT: f64 = 12.0;
const DEFAULT_SIP_YEARS: u32 = 10;
const DEFAULT_MONTHS_OF_COVER: f64 = 6.0;
const DEFAULT_RETIREMENT_CONTRIBUTION: f64 = 5_000.0;
const DEFAULT_RETIREMENT_YEARS: u32 = 20;
const DEFAULT_RETIREMENT_RATE_PERCENT: f64 = 8.0;
const DEFAULT_RETIREMENT_ANNUAL_EXPENSES: f64 = 300_000.0;

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Personal finance estimator: savings projections, emergency fund sizing, SIP and lump-sum growth, retirement corpus, configurable tax slabs"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Path to the profile JSON store; defaults to NESTEGG_PROFILE or ./nestegg_profile.json"
    )]
    profile: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Project the future value of a recurring monthly saving
    Savings(SavingsArgs),
    /// Grow a one-time investment with annual compounding
    LumpSum(LumpSumArgs),
    /// Solve the monthly contribution needed to reach a goal
    Sip(SipArgs),
    /// Size an emergency fund from monthly essential expenses
    EmergencyFund(EmergencyFundArgs),
    /// Estimate a retirement corpus and compare it to the 25x expenses target
    Retirement(RetirementArgs),
    /// Estimate tax from user-defined slabs
    Tax(TaxArgs),
    /// Show or update the stored profile
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
}

#[derive(Args, Debug)]
struct SavingsArgs {
    #[arg(
        long,
        help = "Monthly saving amount; defaults to profile income minus expenses"
    )]
    monthly_amount: Option<f64>,
    #[arg(
        long,
        default_value_t = DEFAULT_SAVINGS_RATE_PERCENT,
        help = "Expected annual return in percent, e.g. 6 for a deposit, 12 for balanced funds"
    )]
    annual_rate: f64,
    #[arg(long, default_value_t = DEFAULT_SAVINGS_YEARS)]
    years: u32,
}

#[derive(Args, Debug)]
struct LumpSumArgs {
    #[arg(long, default_value_t = DEFAULT_LUMP_SUM_PRINCIPAL)]
    principal: f64,
    #[arg(long, default_value_t = DEFAULT_LUMP_SUM_RATE_PERCENT, help = "Expected annual return in percent")]
    annual_rate: f64,
    #[arg(long, default_value_t = DEFAULT_LUMP_SUM_YEARS)]
    years: u32,
}

#[derive(Args, Debug)]
struct SipArgs {
    #[arg(long, help = "Target amount to reach")]
    goal_amount: f64,
    #[arg(long, default_value_t = DEFAULT_SIP_RATE_PERCENT, help = "Expected annual return in percent")]
    annual_rate: f64,
    #[arg(long, default_value_t = DEFAULT_SIP_YEARS)]
    years: u32,
}

#[derive(Args, Debug)]
struct EmergencyFundArgs {
    #[arg(
        long,
        help = "Monthly essential expenses; defaults to the profile figure"
    )]
    monthly_expenses: Option<f64>,
    #[arg(
        long,
        default_value_t = DEFAULT_MONTHS_OF_COVER,
        help = "Months of cover to hold, typically 3 to 12"
    )]
    months_of_cover: f64,
}

#[derive(Args, Debug)]
struct RetirementArgs {
    #[arg(
        long,
        help = "Retirement savings today; defaults to the profile figure"
    )]
    current_savings: Option<f64>,
    #[arg(long, default_value_t = DEFAULT_RETIREMENT_CONTRIBUTION)]
    monthly_contribution: f64,
    #[arg(long, default_value_t = DEFAULT_RETIREMENT_YEARS)]
    years: u32,
    #[arg(long, default_value_t = DEFAULT_RETIREMENT_RATE_PERCENT, help = "Expected annual return in percent")]
    annual_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_RETIREMENT_ANNUAL_EXPENSES,
        help = "Desired annual retirement expenses, used for the 25x target"
    )]
    annual_expenses: f64,
}

#[derive(Args, Debug)]
struct TaxArgs {
    #[arg(
        long,
        help = "Taxable income; defaults to the profile annual income, or twelve months of income"
    )]
    taxable_income: Option<f64>,
    #[arg(
        long = "slab",
        value_parser = parse_slab_arg,
        help = "Slab as UPPER:RATE in ascending order; use rest:RATE for the final unbounded slab; repeatable"
    )]
    slabs: Vec<TaxSlab>,
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// Print the stored profile
    Show,
    /// Update stored fields; only the flags you pass change
    Set(ProfileSetArgs),
}

#[derive(Args, Debug)]
struct ProfileSetArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    monthly_income: Option<f64>,
    #[arg(long)]
    monthly_expenses: Option<f64>,
    #[arg(long)]
    current_savings: Option<f64>,
    #[arg(long)]
    annual_income: Option<f64>,
}

pub async fn run(cli: Cli) -> Result<(), String> {
    let Cli { profile, command } = cli;
    let profile_path = profile.unwrap_or_else(profile::default_path);

    match command {
        Command::Serve { port } => run_http_server(port, profile_path)
            .await
            .map_err(|e| format!("server error: {e}")),
        Command::Savings(args) => run_savings(&args, &profile_path),
        Command::LumpSum(args) => run_lump_sum(&args),
        Command::Sip(args) => run_sip(&args),
        Command::EmergencyFund(args) => run_emergency_fund(&args, &profile_path),
        Command::Retirement(args) => run_retirement(&args, &profile_path),
        Command::Tax(args) => run_tax(&args, &profile_path),
        Command::Profile { action } => run_profile(&action, &profile_path),
    }
}

fn run_savings(args: &SavingsArgs, profile_path: &Path) -> Result<(), String> {
    let stored = profile::load(profile_path)?;
    let request = resolve_savings(args.monthly_amount, args.annual_rate, args.years, &stored)?;
    let response = build_savings_response(request);
    println!(
        "Saving {} monthly at {}% pa for {} years grows to {}",
        format_currency(response.monthly_amount),
        response.annual_rate_percent,
        response.years,
        response.display_future_value
    );
    Ok(())
}

fn run_lump_sum(args: &LumpSumArgs) -> Result<(), String> {
    let request = resolve_lump_sum(args.principal, args.annual_rate, args.years)?;
    let response = build_lump_sum_response(request);
    println!(
        "{} invested for {} years at {}% pa grows to {}",
        format_currency(response.principal),
        response.years,
        response.annual_rate_percent,
        response.display_future_value
    );
    Ok(())
}

fn run_sip(args: &SipArgs) -> Result<(), String> {
    let request = resolve_sip(Some(args.goal_amount), args.annual_rate, args.years)?;
    let response = build_sip_response(request);
    println!(
        "Reaching {} in {} years at {}% pa needs {} monthly",
        format_currency(response.goal_amount),
        response.years,
        response.annual_rate_percent,
        response.display_monthly_contribution
    );
    Ok(())
}

fn run_emergency_fund(args: &EmergencyFundArgs, profile_path: &Path) -> Result<(), String> {
    let stored = profile::load(profile_path)?;
    let request = resolve_emergency_fund(args.monthly_expenses, args.months_of_cover, &stored)?;
    let response = build_emergency_fund_response(request);
    println!(
        "Recommended emergency fund: {} months of cover at {} = {}",
        response.months_of_cover,
        format_currency(response.monthly_expenses),
        response.display_target
    );
    Ok(())
}

fn run_retirement(args: &RetirementArgs, profile_path: &Path) -> Result<(), String> {
    let stored = profile::load(profile_path)?;
    let request = resolve_retirement(
        args.current_savings,
        args.monthly_contribution,
        args.years,
        args.annual_rate,
        args.annual_expenses,
        &stored,
    )?;
    let response = build_retirement_response(request);
    println!(
        "Estimated retirement corpus in {} years: {}",
        response.years_to_retirement, response.display_projected_corpus
    );
    println!(
        "Rule-of-thumb target (25x annual expenses): {}",
        response.display_rule_of_thumb_target
    );
    if response.meets_target {
        println!("Projected corpus meets the rule-of-thumb target.");
    } else {
        println!(
            "Shortfall: {}; consider increasing savings or the retirement horizon.",
            format_currency(response.shortfall)
        );
    }
    Ok(())
}

fn run_tax(args: &TaxArgs, profile_path: &Path) -> Result<(), String> {
    let stored = profile::load(profile_path)?;
    let request = resolve_tax(args.taxable_income, args.slabs.clone(), &stored)?;
    let response = build_tax_response(&request);
    println!(
        "Estimated tax on {} = {} (effective rate {:.2}%)",
        format_currency(response.taxable_income),
        response.display_tax,
        response.effective_rate_percent
    );
    Ok(())
}

fn run_profile(action: &ProfileCommand, profile_path: &Path) -> Result<(), String> {
    match action {
        ProfileCommand::Show => {
            let stored = profile::load(profile_path)?;
            print_profile(&stored);
            Ok(())
        }
        ProfileCommand::Set(args) => {
            let payload = ProfilePayload {
                name: args.name.clone(),
                monthly_income: args.monthly_income,
                monthly_expenses: args.monthly_expenses,
                current_savings: args.current_savings,
                annual_income: args.annual_income,
            };
            let stored = update_profile(profile_path, payload)?;
            print_profile(&stored);
            println!("Profile saved.");
            Ok(())
        }
    }
}

fn print_profile(stored: &FinancialProfile) {
    let name = if stored.name.is_empty() {
        "(unset)"
    } else {
        stored.name.as_str()
    };
    println!("Name:             {name}");
    println!("Monthly income:   {}", format_currency(stored.monthly_income));
    println!(
        "Monthly expenses: {}",
        format_currency(stored.monthly_expenses)
    );
    println!(
        "Current savings:  {}",
        format_currency(stored.current_savings)
    );
    println!("Annual income:    {}", format_currency(stored.annual_income));
    println!(
        "Savings rate:     {:.1}%",
        savings_rate_percent(stored.monthly_income, stored.monthly_expenses)
    );
    if let Some(updated) = stored.updated {
        println!("Updated:          {}", updated.to_rfc3339());
    }
}

fn parse_slab_arg(raw: &str) -> Result<TaxSlab, String> {
    let Some((upper_raw, rate_raw)) = raw.split_once(':') else {
        return Err("expected UPPER:RATE, e.g. 250000:5 or rest:30".to_string());
    };
    let rate_percent = rate_raw
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid slab rate {rate_raw:?}"))?;
    let upper_raw = upper_raw.trim();
    if matches!(
        upper_raw.to_ascii_lowercase().as_str(),
        "none" | "nil" | "rest"
    ) {
        return Ok(TaxSlab::unbounded(rate_percent));
    }
    let upper = upper_raw
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| format!("invalid slab upper bound {upper_raw:?}; use a number or rest"))?;
    Ok(TaxSlab::bounded(upper, rate_percent))
}

#[derive(Debug, Clone, Copy)]
struct SavingsRequest {
    monthly_amount: f64,
    annual_rate_percent: f64,
    years: u32,
}

#[derive(Debug, Clone, Copy)]
struct LumpSumRequest {
    principal: f64,
    annual_rate_percent: f64,
    years: u32,
}

#[derive(Debug, Clone, Copy)]
struct SipRequest {
    goal_amount: f64,
    annual_rate_percent: f64,
    years: u32,
}

#[derive(Debug, Clone, Copy)]
struct EmergencyFundRequest {
    monthly_expenses: f64,
    months_of_cover: f64,
}

#[derive(Debug, Clone, Copy)]
struct RetirementRequest {
    current_savings: f64,
    monthly_contribution: f64,
    years_to_retirement: u32,
    annual_rate_percent: f64,
    annual_expenses: f64,
}

#[derive(Debug, Clone)]
struct TaxRequest {
    taxable_income: f64,
    slabs: Vec<TaxSlab>,
}

fn ensure_finite(name: &str, value: f64) -> Result<f64, String> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("{name} must be a finite number"))
    }
}

fn resolve_savings(
    monthly_amount: Option<f64>,
    annual_rate_percent: f64,
    years: u32,
    stored: &FinancialProfile,
) -> Result<SavingsRequest, String> {
    Ok(SavingsRequest {
        monthly_amount: ensure_finite(
            "monthly amount",
            monthly_amount.unwrap_or_else(|| stored.monthly_surplus()),
        )?,
        annual_rate_percent: ensure_finite("annual rate", annual_rate_percent)?,
        years,
    })
}

fn resolve_lump_sum(
    principal: f64,
    annual_rate_percent: f64,
    years: u32,
) -> Result<LumpSumRequest, String> {
    Ok(LumpSumRequest {
        principal: ensure_finite("principal", principal)?,
        annual_rate_percent: ensure_finite("annual rate", annual_rate_percent)?,
        years,
    })
}

fn resolve_sip(
    goal_amount: Option<f64>,
    annual_rate_percent: f64,
    years: u32,
) -> Result<SipRequest, String> {
    let Some(goal_amount) = goal_amount else {
        return Err("goal amount is required".to_string());
    };
    if years == 0 {
        return Err("years must be greater than 0; a zero-length plan has no contribution schedule"
            .to_string());
    }
    Ok(SipRequest {
        goal_amount: ensure_finite("goal amount", goal_amount)?,
        annual_rate_percent: ensure_finite("annual rate", annual_rate_percent)?,
        years,
    })
}

fn resolve_emergency_fund(
    monthly_expenses: Option<f64>,
    months_of_cover: f64,
    stored: &FinancialProfile,
) -> Result<EmergencyFundRequest, String> {
    Ok(EmergencyFundRequest {
        monthly_expenses: ensure_finite(
            "monthly expenses",
            monthly_expenses.unwrap_or(stored.monthly_expenses),
        )?,
        months_of_cover: ensure_finite("months of cover", months_of_cover)?,
    })
}

fn resolve_retirement(
    current_savings: Option<f64>,
    monthly_contribution: f64,
    years_to_retirement: u32,
    annual_rate_percent: f64,
    annual_expenses: f64,
    stored: &FinancialProfile,
) -> Result<RetirementRequest, String> {
    Ok(RetirementRequest {
        current_savings: ensure_finite(
            "current savings",
            current_savings.unwrap_or(stored.current_savings),
        )?,
        monthly_contribution: ensure_finite("monthly contribution", monthly_contribution)?,
        years_to_retirement,
        annual_rate_percent: ensure_finite("annual rate", annual_rate_percent)?,
        annual_expenses: ensure_finite("annual expenses", annual_expenses)?,
    })
}

fn resolve_tax(
    taxable_income: Option<f64>,
    slabs: Vec<TaxSlab>,
    stored: &FinancialProfile,
) -> Result<TaxRequest, String> {
    validate_slabs(&slabs)?;
    Ok(TaxRequest {
        taxable_income: ensure_finite(
            "taxable income",
            taxable_income.unwrap_or_else(|| stored.annual_taxable_income()),
        )?,
        slabs,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SavingsResponse {
    monthly_amount: f64,
    annual_rate_percent: f64,
    years: u32,
    future_value: f64,
    display_future_value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LumpSumResponse {
    principal: f64,
    annual_rate_percent: f64,
    years: u32,
    future_value: f64,
    display_future_value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SipResponse {
    goal_amount: f64,
    annual_rate_percent: f64,
    years: u32,
    monthly_contribution: f64,
    display_monthly_contribution: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmergencyFundResponse {
    monthly_expenses: f64,
    months_of_cover: f64,
    target: f64,
    display_target: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetirementResponse {
    current_savings: f64,
    monthly_contribution: f64,
    years_to_retirement: u32,
    annual_rate_percent: f64,
    annual_expenses: f64,
    projected_corpus: f64,
    rule_of_thumb_target: f64,
    shortfall: f64,
    meets_target: bool,
    display_projected_corpus: String,
    display_rule_of_thumb_target: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaxResponse {
    taxable_income: f64,
    slab_count: usize,
    tax: f64,
    effective_rate_percent: f64,
    net_income: f64,
    display_tax: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    name: String,
    monthly_income: f64,
    monthly_expenses: f64,
    current_savings: f64,
    annual_income: f64,
    savings_rate_percent: f64,
    updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_savings_response(request: SavingsRequest) -> SavingsResponse {
    let future_value = recurring_contribution_future_value(
        request.monthly_amount,
        request.annual_rate_percent,
        request.years,
    );
    SavingsResponse {
        monthly_amount: request.monthly_amount,
        annual_rate_percent: request.annual_rate_percent,
        years: request.years,
        future_value,
        display_future_value: format_currency(future_value),
    }
}

fn build_lump_sum_response(request: LumpSumRequest) -> LumpSumResponse {
    let future_value =
        lump_sum_future_value(request.principal, request.annual_rate_percent, request.years);
    LumpSumResponse {
        principal: request.principal,
        annual_rate_percent: request.annual_rate_percent,
        years: request.years,
        future_value,
        display_future_value: format_currency(future_value),
    }
}

fn build_sip_response(request: SipRequest) -> SipResponse {
    let monthly_contribution = required_monthly_contribution(
        request.goal_amount,
        request.annual_rate_percent,
        request.years,
    );
    SipResponse {
        goal_amount: request.goal_amount,
        annual_rate_percent: request.annual_rate_percent,
        years: request.years,
        monthly_contribution,
        display_monthly_contribution: format_currency(monthly_contribution),
    }
}

fn build_emergency_fund_response(request: EmergencyFundRequest) -> EmergencyFundResponse {
    let target = emergency_fund_target(request.monthly_expenses, request.months_of_cover);
    EmergencyFundResponse {
        monthly_expenses: request.monthly_expenses,
        months_of_cover: request.months_of_cover,
        target,
        display_target: format_currency(target),
    }
}

fn build_retirement_response(request: RetirementRequest) -> RetirementResponse {
    let projected_corpus = retirement_corpus_estimate(
        request.current_savings,
        request.monthly_contribution,
        request.years_to_retirement,
        request.annual_rate_percent,
    );
    let rule_of_thumb_target = rule_of_thumb_corpus(request.annual_expenses);
    RetirementResponse {
        current_savings: request.current_savings,
        monthly_contribution: request.monthly_contribution,
        years_to_retirement: request.years_to_retirement,
        annual_rate_percent: request.annual_rate_percent,
        annual_expenses: request.annual_expenses,
        projected_corpus,
        rule_of_thumb_target,
        shortfall: (rule_of_thumb_target - projected_corpus).max(0.0),
        meets_target: projected_corpus >= rule_of_thumb_target,
        display_projected_corpus: format_currency(projected_corpus),
        display_rule_of_thumb_target: format_currency(rule_of_thumb_target),
    }
}

fn build_tax_response(request: &TaxRequest) -> TaxResponse {
    let tax = compute_tax(request.taxable_income, &request.slabs);
    let effective_rate_percent = if request.taxable_income > 0.0 {
        tax / request.taxable_income * 100.0
    } else {
        0.0
    };
    TaxResponse {
        taxable_income: request.taxable_income,
        slab_count: request.slabs.len(),
        tax,
        effective_rate_percent,
        net_income: request.taxable_income - tax,
        display_tax: format_currency(tax),
    }
}

fn build_profile_response(stored: &FinancialProfile) -> ProfileResponse {
    ProfileResponse {
        name: stored.name.clone(),
        monthly_income: stored.monthly_income,
        monthly_expenses: stored.monthly_expenses,
        current_savings: stored.current_savings,
        annual_income: stored.annual_income,
        savings_rate_percent: savings_rate_percent(stored.monthly_income, stored.monthly_expenses),
        updated: stored.updated,
    }
}

fn update_profile(path: &Path, payload: ProfilePayload) -> Result<FinancialProfile, String> {
    let mut stored = profile::load(path)?;
    if let Some(v) = payload.name {
        stored.name = v;
    }
    if let Some(v) = payload.monthly_income {
        stored.monthly_income = ensure_finite("monthly income", v)?;
    }
    if let Some(v) = payload.monthly_expenses {
        stored.monthly_expenses = ensure_finite("monthly expenses", v)?;
    }
    if let Some(v) = payload.current_savings {
        stored.current_savings = ensure_finite("current savings", v)?;
    }
    if let Some(v) = payload.annual_income {
        stored.annual_income = ensure_finite("annual income", v)?;
    }
    stored.touch();
    profile::save(path, &stored)?;
    Ok(stored)
}

/// Grouped-digit display string with two decimals, e.g. `1,234,567.89`.
fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let negative = value < 0.0;
    let fixed = format!("{:.2}", value.abs());
    let (int_digits, frac_digits) = match fixed.split_once('.') {
        Some(parts) => parts,
        None => (fixed.as_str(), "00"),
    };

    let mut grouped = String::with_capacity(fixed.len() + int_digits.len() / 3 + 1);
    if negative {
        grouped.push('-');
    }
    for (offset, digit) in int_digits.chars().enumerate() {
        if offset > 0 && (int_digits.len() - offset) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped.push('.');
    grouped.push_str(frac_digits);
    grouped
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SavingsPayload {
    monthly_amount: Option<f64>,
    annual_rate_percent: Option<f64>,
    years: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LumpSumPayload {
    principal: Option<f64>,
    annual_rate_percent: Option<f64>,
    years: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SipPayload {
    goal_amount: Option<f64>,
    annual_rate_percent: Option<f64>,
    years: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EmergencyFundPayload {
    monthly_expenses: Option<f64>,
    months_of_cover: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RetirementPayload {
    current_savings: Option<f64>,
    monthly_contribution: Option<f64>,
    years_to_retirement: Option<u32>,
    annual_rate_percent: Option<f64>,
    annual_expenses: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TaxPayload {
    taxable_income: Option<f64>,
    slabs: Vec<SlabPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlabPayload {
    upper: Option<f64>,
    #[serde(alias = "rate")]
    rate_percent: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProfilePayload {
    name: Option<String>,
    monthly_income: Option<f64>,
    monthly_expenses: Option<f64>,
    current_savings: Option<f64>,
    annual_income: Option<f64>,
}

fn slab_from_payload(slab: &SlabPayload) -> TaxSlab {
    match slab.upper {
        Some(upper) => TaxSlab::bounded(upper, slab.rate_percent),
        None => TaxSlab::unbounded(slab.rate_percent),
    }
}

#[derive(Clone)]
struct ApiState {
    profile_path: PathBuf,
}

pub async fn run_http_server(port: u16, profile_path: PathBuf) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(ApiState { profile_path });

    let listener = TcpListener::bind(addr).await?;
    println!("nestegg HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

fn router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/api/savings-projection",
            get(savings_get_handler).post(savings_post_handler),
        )
        .route(
            "/api/lump-sum",
            get(lump_sum_get_handler).post(lump_sum_post_handler),
        )
        .route(
            "/api/required-contribution",
            get(sip_get_handler).post(sip_post_handler),
        )
        .route(
            "/api/emergency-fund",
            get(emergency_fund_get_handler).post(emergency_fund_post_handler),
        )
        .route(
            "/api/retirement",
            get(retirement_get_handler).post(retirement_post_handler),
        )
        .route("/api/tax", post(tax_post_handler))
        .route(
            "/api/profile",
            get(profile_get_handler).post(profile_post_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

async fn savings_get_handler(
    State(state): State<ApiState>,
    Query(payload): Query<SavingsPayload>,
) -> Response {
    savings_handler_impl(&state, payload)
}

async fn savings_post_handler(
    State(state): State<ApiState>,
    Json(payload): Json<SavingsPayload>,
) -> Response {
    savings_handler_impl(&state, payload)
}

fn savings_handler_impl(state: &ApiState, payload: SavingsPayload) -> Response {
    let stored = match profile::load(&state.profile_path) {
        Ok(stored) => stored,
        Err(msg) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &msg),
    };
    match resolve_savings(
        payload.monthly_amount,
        payload
            .annual_rate_percent
            .unwrap_or(DEFAULT_SAVINGS_RATE_PERCENT),
        payload.years.unwrap_or(DEFAULT_SAVINGS_YEARS),
        &stored,
    ) {
        Ok(request) => json_response(StatusCode::OK, build_savings_response(request)),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn lump_sum_get_handler(Query(payload): Query<LumpSumPayload>) -> Response {
    lump_sum_handler_impl(payload)
}

async fn lump_sum_post_handler(Json(payload): Json<LumpSumPayload>) -> Response {
    lump_sum_handler_impl(payload)
}

fn lump_sum_handler_impl(payload: LumpSumPayload) -> Response {
    match resolve_lump_sum(
        payload.principal.unwrap_or(DEFAULT_LUMP_SUM_PRINCIPAL),
        payload
            .annual_rate_percent
            .unwrap_or(DEFAULT_LUMP_SUM_RATE_PERCENT),
        payload.years.unwrap_or(DEFAULT_LUMP_SUM_YEARS),
    ) {
        Ok(request) => json_response(StatusCode::OK, build_lump_sum_response(request)),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn sip_get_handler(Query(payload): Query<SipPayload>) -> Response {
    sip_handler_impl(payload)
}

async fn sip_post_handler(Json(payload): Json<SipPayload>) -> Response {
    sip_handler_impl(payload)
}

fn sip_handler_impl(payload: SipPayload) -> Response {
    match resolve_sip(
        payload.goal_amount,
        payload
            .annual_rate_percent
            .unwrap_or(DEFAULT_SIP_RATE_PERCENT),
        payload.years.unwrap_or(DEFAULT_SIP_YEARS),
    ) {
        Ok(request) => json_response(StatusCode::OK, build_sip_response(request)),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn emergency_fund_get_handler(
    State(state): State<ApiState>,
    Query(payload): Query<EmergencyFundPayload>,
) -> Response {
    emergency_fund_handler_impl(&state, payload)
}

async fn emergency_fund_post_handler(
    State(state): State<ApiState>,
    Json(payload): Json<EmergencyFundPayload>,
) -> Response {
    emergency_fund_handler_impl(&state, payload)
}

fn emergency_fund_handler_impl(state: &ApiState, payload: EmergencyFundPayload) -> Response {
    let stored = match profile::load(&state.profile_path) {
        Ok(stored) => stored,
        Err(msg) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &msg),
    };
    match resolve_emergency_fund(
        payload.monthly_expenses,
        payload.months_of_cover.unwrap_or(DEFAULT_MONTHS_OF_COVER),
        &stored,
    ) {
        Ok(request) => json_response(StatusCode::OK, build_emergency_fund_response(request)),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn retirement_get_handler(
    State(state): State<ApiState>,
    Query(payload): Query<RetirementPayload>,
) -> Response {
    retirement_handler_impl(&state, payload)
}

async fn retirement_post_handler(
    State(state): State<ApiState>,
    Json(payload): Json<RetirementPayload>,
) -> Response {
    retirement_handler_impl(&state, payload)
}

fn retirement_handler_impl(state: &ApiState, payload: RetirementPayload) -> Response {
    let stored = match profile::load(&state.profile_path) {
        Ok(stored) => stored,
        Err(msg) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &msg),
    };
    match resolve_retirement(
        payload.current_savings,
        payload
            .monthly_contribution
            .unwrap_or(DEFAULT_RETIREMENT_CONTRIBUTION),
        payload
            .years_to_retirement
            .unwrap_or(DEFAULT_RETIREMENT_YEARS),
        payload
            .annual_rate_percent
            .unwrap_or(DEFAULT_RETIREMENT_RATE_PERCENT),
        payload
            .annual_expenses
            .unwrap_or(DEFAULT_RETIREMENT_ANNUAL_EXPENSES),
        &stored,
    ) {
        Ok(request) => json_response(StatusCode::OK, build_retirement_response(request)),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn tax_post_handler(State(state): State<ApiState>, Json(payload): Json<TaxPayload>) -> Response {
    let stored = match profile::load(&state.profile_path) {
        Ok(stored) => stored,
        Err(msg) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &msg),
    };
    let slabs = payload.slabs.iter().map(slab_from_payload).collect();
    match resolve_tax(payload.taxable_income, slabs, &stored) {
        Ok(request) => json_response(StatusCode::OK, build_tax_response(&request)),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn profile_get_handler(State(state): State<ApiState>) -> Response {
    match profile::load(&state.profile_path) {
        Ok(stored) => json_response(StatusCode::OK, build_profile_response(&stored)),
        Err(msg) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &msg),
    }
}

async fn profile_post_handler(
    State(state): State<ApiState>,
    Json(payload): Json<ProfilePayload>,
) -> Response {
    match update_profile(&state.profile_path, payload) {
        Ok(stored) => json_response(StatusCode::OK, build_profile_response(&stored)),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SlabBound;
    use std::fs;
    use std::path::Path;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_slabs() -> Vec<TaxSlab> {
        vec![
            TaxSlab::bounded(250_000.0, 0.0),
            TaxSlab::bounded(500_000.0, 5.0),
            TaxSlab::bounded(1_000_000.0, 20.0),
            TaxSlab::unbounded(30.0),
        ]
    }

    fn assert_golden_snapshot(path: &str, actual: &str) {
        let update = matches!(
            std::env::var("UPDATE_GOLDEN").as_deref(),
            Ok("1") | Ok("true") | Ok("TRUE")
        );
        let snapshot_path = Path::new(path);

        if update {
            if let Some(parent) = snapshot_path.parent() {
                fs::create_dir_all(parent).expect("failed to create snapshot directory");
            }
            fs::write(snapshot_path, actual).expect("failed to write golden snapshot");
            return;
        }

        let expected = fs::read_to_string(snapshot_path).unwrap_or_else(|_| {
            panic!("missing golden snapshot at {path}; run with UPDATE_GOLDEN=1 to generate")
        });
        assert_eq!(
            actual, expected,
            "snapshot mismatch for {path}; run with UPDATE_GOLDEN=1 to refresh if expected"
        );
    }

    #[test]
    fn format_currency_groups_thousands() {
        assert_eq!(format_currency(0.0), "0.00");
        assert_eq!(format_currency(999.994), "999.99");
        assert_eq!(format_currency(999.999), "1,000.00");
        assert_eq!(format_currency(1_234_567.891), "1,234,567.89");
        assert_eq!(format_currency(-45_000.0), "-45,000.00");
    }

    #[test]
    fn parse_slab_arg_accepts_bounded_and_rest_forms() {
        assert_eq!(
            parse_slab_arg("250000:5").expect("bounded slab must parse"),
            TaxSlab::bounded(250_000.0, 5.0)
        );
        assert_eq!(
            parse_slab_arg("2,50,000 : 5").expect("separators must be tolerated"),
            TaxSlab::bounded(250_000.0, 5.0)
        );
        for rest in ["rest:30", "none:30", "NIL:30"] {
            assert_eq!(
                parse_slab_arg(rest).expect("unbounded slab must parse"),
                TaxSlab::unbounded(30.0)
            );
        }
    }

    #[test]
    fn parse_slab_arg_rejects_malformed_input() {
        assert!(parse_slab_arg("250000").is_err());
        assert!(parse_slab_arg("abc:5").is_err());
        assert!(parse_slab_arg("250000:pct").is_err());
    }

    #[test]
    fn resolve_savings_defaults_to_profile_surplus() {
        let stored = FinancialProfile {
            monthly_income: 80_000.0,
            monthly_expenses: 50_000.0,
            ..FinancialProfile::default()
        };
        let request =
            resolve_savings(None, 8.0, 10, &stored).expect("profile default must resolve");
        assert_approx(request.monthly_amount, 30_000.0);
    }

    #[test]
    fn resolve_sip_rejects_zero_years() {
        let err = resolve_sip(Some(1_000_000.0), 12.0, 0).expect_err("zero years must be rejected");
        assert!(err.contains("years"));
    }

    #[test]
    fn resolve_sip_requires_a_goal() {
        let err = resolve_sip(None, 12.0, 10).expect_err("missing goal must be rejected");
        assert!(err.contains("goal amount"));
    }

    #[test]
    fn resolve_tax_rejects_empty_and_malformed_tables() {
        let stored = FinancialProfile::default();
        assert!(resolve_tax(Some(800_000.0), Vec::new(), &stored).is_err());

        let descending = vec![
            TaxSlab::bounded(500_000.0, 5.0),
            TaxSlab::bounded(250_000.0, 10.0),
        ];
        assert!(resolve_tax(Some(800_000.0), descending, &stored).is_err());
    }

    #[test]
    fn resolve_tax_defaults_income_from_profile() {
        let stored = FinancialProfile {
            monthly_income: 50_000.0,
            ..FinancialProfile::default()
        };
        let request =
            resolve_tax(None, sample_slabs(), &stored).expect("profile default must resolve");
        assert_approx(request.taxable_income, 600_000.0);
    }

    #[test]
    fn resolve_rejects_non_finite_amounts() {
        let stored = FinancialProfile::default();
        assert!(resolve_savings(Some(f64::NAN), 8.0, 10, &stored).is_err());
        assert!(resolve_lump_sum(f64::INFINITY, 8.0, 5).is_err());
        assert!(resolve_retirement(Some(0.0), f64::NAN, 20, 8.0, 300_000.0, &stored).is_err());
    }

    #[test]
    fn tax_payload_parses_camel_case_and_rate_alias() {
        let json = r#"{
          "taxableIncome": 800000,
          "slabs": [
            {"upper": 250000, "ratePercent": 0},
            {"upper": 500000, "rate": 5},
            {"upper": 1000000, "ratePercent": 20},
            {"upper": null, "ratePercent": 30}
          ]
        }"#;
        let payload = serde_json::from_str::<TaxPayload>(json).expect("payload must parse");
        assert_approx(payload.taxable_income.expect("income expected"), 800_000.0);

        let slabs: Vec<TaxSlab> = payload.slabs.iter().map(slab_from_payload).collect();
        assert_eq!(slabs, sample_slabs());
        assert_eq!(slabs[3].upper, SlabBound::Unbounded);
    }

    #[test]
    fn retirement_payload_parses_camel_case_keys() {
        let json = r#"{
          "currentSavings": 200000,
          "monthlyContribution": 7500,
          "yearsToRetirement": 25,
          "annualRatePercent": 9,
          "annualExpenses": 360000
        }"#;
        let payload = serde_json::from_str::<RetirementPayload>(json).expect("payload must parse");
        assert_approx(payload.current_savings.expect("savings expected"), 200_000.0);
        assert_eq!(payload.years_to_retirement, Some(25));
        assert_approx(payload.annual_expenses.expect("expenses expected"), 360_000.0);
    }

    #[test]
    fn savings_response_serializes_camel_case_fields() {
        let stored = FinancialProfile::default();
        let request = resolve_savings(Some(5_000.0), 8.0, 10, &stored).expect("valid request");
        let json = serde_json::to_string(&build_savings_response(request))
            .expect("response must serialize");
        assert!(json.contains("\"monthlyAmount\""));
        assert!(json.contains("\"annualRatePercent\""));
        assert!(json.contains("\"futureValue\""));
        assert!(json.contains("\"displayFutureValue\""));
    }

    #[test]
    fn retirement_response_reports_shortfall_against_target() {
        let stored = FinancialProfile::default();
        let request = resolve_retirement(Some(0.0), 0.0, 10, 0.0, 40_000.0, &stored)
            .expect("valid request");
        let response = build_retirement_response(request);
        assert_approx(response.projected_corpus, 0.0);
        assert_approx(response.rule_of_thumb_target, 1_000_000.0);
        assert_approx(response.shortfall, 1_000_000.0);
        assert!(!response.meets_target);
    }

    #[test]
    fn cli_parses_calculator_subcommands() {
        let cli = Cli::try_parse_from([
            "nestegg",
            "savings",
            "--monthly-amount",
            "5000",
            "--annual-rate",
            "9",
            "--years",
            "15",
        ])
        .expect("savings command must parse");
        match cli.command {
            Command::Savings(args) => {
                assert_eq!(args.monthly_amount, Some(5_000.0));
                assert_approx(args.annual_rate, 9.0);
                assert_eq!(args.years, 15);
            }
            other => panic!("expected savings command, got {other:?}"),
        }

        let cli = Cli::try_parse_from([
            "nestegg",
            "tax",
            "--taxable-income",
            "800000",
            "--slab",
            "250000:0",
            "--slab",
            "500000:5",
            "--slab",
            "rest:30",
        ])
        .expect("tax command must parse");
        match cli.command {
            Command::Tax(args) => {
                assert_eq!(args.slabs.len(), 3);
                assert_eq!(args.slabs[2], TaxSlab::unbounded(30.0));
            }
            other => panic!("expected tax command, got {other:?}"),
        }

        let cli = Cli::try_parse_from(["nestegg", "serve"]).expect("serve command must parse");
        match cli.command {
            Command::Serve { port } => assert_eq!(port, 8080),
            other => panic!("expected serve command, got {other:?}"),
        }
    }

    #[test]
    fn golden_snapshot_tax_estimate_json() {
        let stored = FinancialProfile::default();
        let request =
            resolve_tax(Some(800_000.0), sample_slabs(), &stored).expect("valid request");
        let json = format!(
            "{}\n",
            serde_json::to_string(&build_tax_response(&request))
                .expect("response must serialize")
        );
        assert_golden_snapshot("tests/golden/tax_estimate.json", &json);
    }

    #[test]
    fn golden_snapshot_retirement_zero_growth_json() {
        let stored = FinancialProfile::default();
        let request = resolve_retirement(Some(100_000.0), 5_000.0, 10, 0.0, 24_000.0, &stored)
            .expect("valid request");
        let json = format!(
            "{}\n",
            serde_json::to_string(&build_retirement_response(request))
                .expect("response must serialize")
        );
        assert_golden_snapshot("tests/golden/retirement_zero_growth.json", &json);
    }
}
