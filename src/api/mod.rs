use axum::{
    Router,
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::ValueEnum;
use serde::Deserialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    AssetTerms, BuyVsRentInputs, CalculatorInputs, EconomicAssumptions, LoanTerms,
    PayoffVsInvestInputs, RateSchedule, RefinanceTerms, RentingTerms, SellVsKeepInputs,
    SellingTerms, calculate,
};

/// Parses currency/percent amounts: `k`/`m`/`b` suffixes multiply by
/// 1e3/1e6/1e9, a trailing `%` is stripped, empty input means zero.
pub fn parse_amount(input: &str) -> Result<f64, String> {
    let lowered = input.trim().to_lowercase();
    if lowered.is_empty() {
        return Ok(0.0);
    }

    let stripped = lowered.strip_suffix('%').unwrap_or(&lowered).trim_end();
    let (number, multiplier) = if let Some(number) = stripped.strip_suffix('k') {
        (number, 1_000.0)
    } else if let Some(number) = stripped.strip_suffix('m') {
        (number, 1_000_000.0)
    } else if let Some(number) = stripped.strip_suffix('b') {
        (number, 1_000_000_000.0)
    } else {
        (stripped, 1.0)
    };

    number
        .trim()
        .parse::<f64>()
        .map(|value| value * multiplier)
        .map_err(|_| format!("invalid amount '{}'", input.trim()))
}

/// Parses duration strings like `"5y6m"`, `"30y"`, `"6m"` into months.
pub fn parse_duration(input: &str) -> Result<u32, String> {
    let input = input.trim().to_lowercase();
    let mut years = 0u32;
    let mut months = 0u32;
    let mut rest = input.as_str();

    if let Some(position) = rest.find('y') {
        years = rest[..position]
            .parse()
            .map_err(|_| format!("invalid year count in '{input}'"))?;
        rest = &rest[position + 1..];
    }
    if let Some(position) = rest.find('m') {
        months = rest[..position]
            .parse()
            .map_err(|_| format!("invalid month count in '{input}'"))?;
    }

    let total = years * 12 + months;
    if total == 0 {
        return Err(format!("duration '{input}' must be greater than zero"));
    }
    Ok(total)
}

/// Parses a comma-separated per-year rate list; empty input means a flat
/// zero rate.
pub fn parse_rate_list(input: &str) -> Result<Vec<f64>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(vec![0.0]);
    }
    input
        .split(',')
        .map(|part| parse_amount(part).map_err(|_| format!("invalid rate '{}'", part.trim())))
        .collect()
}

/// A money or percent value, either as a JSON number or as a suffix string
/// like `"500k"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    Number(f64),
    Text(String),
}

impl AmountField {
    fn value(&self) -> Result<f64, String> {
        match self {
            AmountField::Number(value) => Ok(*value),
            AmountField::Text(text) => parse_amount(text),
        }
    }
}

/// A loan term, either as a month count or as a `"5y6m"` string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationField {
    Months(u32),
    Text(String),
}

impl DurationField {
    fn months(&self) -> Result<u32, String> {
        match self {
            DurationField::Months(months) => Ok(*months),
            DurationField::Text(text) => parse_duration(text),
        }
    }
}

/// A per-year sequence, either as a JSON array or as a comma-separated
/// string like `"-20,-10,-5"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RatesField {
    List(Vec<f64>),
    Text(String),
}

impl RatesField {
    fn schedule(&self) -> Result<RateSchedule, String> {
        match self {
            RatesField::List(rates) if rates.is_empty() => Ok(RateSchedule::flat(0.0)),
            RatesField::List(rates) => RateSchedule::new(rates.clone()),
            RatesField::Text(text) => RateSchedule::new(parse_rate_list(text)?),
        }
    }
}

fn amount_or(field: &Option<AmountField>, default: f64) -> Result<f64, String> {
    match field {
        Some(field) => field.value(),
        None => Ok(default),
    }
}

fn duration_or_zero(field: &Option<DurationField>) -> Result<u32, String> {
    match field {
        Some(field) => field.months(),
        None => Ok(0),
    }
}

fn schedule_or_flat_zero(field: &Option<RatesField>) -> Result<RateSchedule, String> {
    match field {
        Some(field) => field.schedule(),
        None => Ok(RateSchedule::flat(0.0)),
    }
}

const DEFAULT_PROJECTION_YEARS: u32 = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuyVsRentPayload {
    inflation_rate: Option<AmountField>,
    investment_return_rate: Option<AmountField>,
    projection_years: Option<u32>,

    purchase_price: Option<AmountField>,
    downpayment: Option<AmountField>,
    loan_amount: Option<AmountField>,
    loan_rate: Option<AmountField>,
    loan_duration: Option<DurationField>,
    interest_deduction_rate: Option<AmountField>,
    annual_insurance: Option<AmountField>,
    annual_taxes: Option<AmountField>,
    monthly_expenses: Option<AmountField>,
    annual_income: Option<AmountField>,
    appreciation_rate: Option<RatesField>,

    rent_deposit: Option<AmountField>,
    monthly_rent: Option<AmountField>,
    annual_rent_costs: Option<AmountField>,
    other_annual_costs: Option<AmountField>,

    include_selling: bool,
    agent_commission: Option<AmountField>,
    staging_costs: Option<AmountField>,
    tax_free_limit: Option<RatesField>,
    capital_gains_tax: Option<AmountField>,
}

impl BuyVsRentPayload {
    pub fn into_inputs(self) -> Result<CalculatorInputs, String> {
        let purchase_price = amount_or(&self.purchase_price, 0.0)?;
        let downpayment = amount_or(&self.downpayment, 0.0)?;
        let loan_amount = match &self.loan_amount {
            Some(field) => field.value()?,
            None => (purchase_price - downpayment).max(0.0),
        };

        let selling = if self.include_selling {
            Some(SellingTerms {
                agent_commission: amount_or(&self.agent_commission, 0.0)?,
                staging_costs: amount_or(&self.staging_costs, 0.0)?,
                tax_free_limits: schedule_or_flat_zero(&self.tax_free_limit)?,
                capital_gains_tax_rate: amount_or(&self.capital_gains_tax, 0.0)?,
            })
        } else {
            None
        };

        Ok(CalculatorInputs::BuyVsRent(BuyVsRentInputs {
            economy: EconomicAssumptions {
                inflation_rate: amount_or(&self.inflation_rate, 0.0)?,
                investment_return_rate: amount_or(&self.investment_return_rate, 0.0)?,
                projection_years: self.projection_years.unwrap_or(DEFAULT_PROJECTION_YEARS),
            },
            asset: AssetTerms {
                purchase_price,
                market_value: purchase_price,
                annual_insurance: amount_or(&self.annual_insurance, 0.0)?,
                annual_taxes: amount_or(&self.annual_taxes, 0.0)?,
                monthly_expenses: amount_or(&self.monthly_expenses, 0.0)?,
                annual_income: amount_or(&self.annual_income, 0.0)?,
                appreciation_rates: schedule_or_flat_zero(&self.appreciation_rate)?,
            },
            downpayment,
            loan: LoanTerms {
                amount: loan_amount,
                annual_rate: amount_or(&self.loan_rate, 0.0)?,
                term_months: duration_or_zero(&self.loan_duration)?,
                remaining_term_months: None,
                refinance: None,
                interest_deduction_rate: amount_or(&self.interest_deduction_rate, 0.0)?,
            },
            renting: RentingTerms {
                deposit: amount_or(&self.rent_deposit, 0.0)?,
                monthly_rent: amount_or(&self.monthly_rent, 0.0)?,
                annual_rent_costs: amount_or(&self.annual_rent_costs, 0.0)?,
                other_annual_costs: amount_or(&self.other_annual_costs, 0.0)?,
            },
            selling,
        }))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SellVsKeepPayload {
    inflation_rate: Option<AmountField>,
    investment_return_rate: Option<AmountField>,
    projection_years: Option<u32>,

    purchase_price: Option<AmountField>,
    market_value: Option<AmountField>,
    annual_insurance: Option<AmountField>,
    annual_taxes: Option<AmountField>,
    monthly_expenses: Option<AmountField>,
    annual_income: Option<AmountField>,
    appreciation_rate: Option<RatesField>,

    loan_amount: Option<AmountField>,
    loan_rate: Option<AmountField>,
    loan_duration: Option<DurationField>,
    remaining_loan_duration: Option<DurationField>,
    interest_deduction_rate: Option<AmountField>,
    include_refinance: bool,
    refinance_amount: Option<AmountField>,
    refinance_rate: Option<AmountField>,
    refinance_duration: Option<DurationField>,
    refinance_payoff_balance: Option<AmountField>,
    refinance_closing_costs: Option<AmountField>,

    agent_commission: Option<AmountField>,
    staging_costs: Option<AmountField>,
    tax_free_limit: Option<RatesField>,
    capital_gains_tax: Option<AmountField>,

    include_renting: bool,
    rent_deposit: Option<AmountField>,
    monthly_rent: Option<AmountField>,
    annual_rent_costs: Option<AmountField>,
    other_annual_costs: Option<AmountField>,
}

impl SellVsKeepPayload {
    pub fn into_inputs(self) -> Result<CalculatorInputs, String> {
        let purchase_price = amount_or(&self.purchase_price, 0.0)?;
        let market_value = match &self.market_value {
            Some(field) => field.value()?,
            None => purchase_price,
        };

        let refinance = if self.include_refinance {
            Some(RefinanceTerms {
                new_loan_amount: amount_or(&self.refinance_amount, 0.0)?,
                new_annual_rate: amount_or(&self.refinance_rate, 0.0)?,
                new_term_months: duration_or_zero(&self.refinance_duration)?,
                payoff_balance: amount_or(&self.refinance_payoff_balance, 0.0)?,
                closing_costs: amount_or(&self.refinance_closing_costs, 0.0)?,
            })
        } else {
            None
        };

        let remaining_term_months = match &self.remaining_loan_duration {
            Some(field) => Some(field.months()?),
            None => None,
        };

        let replacement_rent = if self.include_renting {
            Some(RentingTerms {
                deposit: amount_or(&self.rent_deposit, 0.0)?,
                monthly_rent: amount_or(&self.monthly_rent, 0.0)?,
                annual_rent_costs: amount_or(&self.annual_rent_costs, 0.0)?,
                other_annual_costs: amount_or(&self.other_annual_costs, 0.0)?,
            })
        } else {
            None
        };

        Ok(CalculatorInputs::SellVsKeep(SellVsKeepInputs {
            economy: EconomicAssumptions {
                inflation_rate: amount_or(&self.inflation_rate, 0.0)?,
                investment_return_rate: amount_or(&self.investment_return_rate, 0.0)?,
                projection_years: self.projection_years.unwrap_or(DEFAULT_PROJECTION_YEARS),
            },
            asset: AssetTerms {
                purchase_price,
                market_value,
                annual_insurance: amount_or(&self.annual_insurance, 0.0)?,
                annual_taxes: amount_or(&self.annual_taxes, 0.0)?,
                monthly_expenses: amount_or(&self.monthly_expenses, 0.0)?,
                annual_income: amount_or(&self.annual_income, 0.0)?,
                appreciation_rates: schedule_or_flat_zero(&self.appreciation_rate)?,
            },
            loan: LoanTerms {
                amount: amount_or(&self.loan_amount, 0.0)?,
                annual_rate: amount_or(&self.loan_rate, 0.0)?,
                term_months: duration_or_zero(&self.loan_duration)?,
                remaining_term_months,
                refinance,
                interest_deduction_rate: amount_or(&self.interest_deduction_rate, 0.0)?,
            },
            selling: SellingTerms {
                agent_commission: amount_or(&self.agent_commission, 0.0)?,
                staging_costs: amount_or(&self.staging_costs, 0.0)?,
                tax_free_limits: schedule_or_flat_zero(&self.tax_free_limit)?,
                capital_gains_tax_rate: amount_or(&self.capital_gains_tax, 0.0)?,
            },
            replacement_rent,
        }))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PayoffVsInvestPayload {
    inflation_rate: Option<AmountField>,
    investment_return_rate: Option<AmountField>,
    projection_years: Option<u32>,

    loan_amount: Option<AmountField>,
    loan_rate: Option<AmountField>,
    loan_duration: Option<DurationField>,
    remaining_loan_duration: Option<DurationField>,
    interest_deduction_rate: Option<AmountField>,
    include_refinance: bool,
    refinance_amount: Option<AmountField>,
    refinance_rate: Option<AmountField>,
    refinance_duration: Option<DurationField>,
    refinance_payoff_balance: Option<AmountField>,
    refinance_closing_costs: Option<AmountField>,

    extra_monthly_payment: Option<AmountField>,
    upfront_payment: Option<AmountField>,
}

impl PayoffVsInvestPayload {
    pub fn into_inputs(self) -> Result<CalculatorInputs, String> {
        let refinance = if self.include_refinance {
            Some(RefinanceTerms {
                new_loan_amount: amount_or(&self.refinance_amount, 0.0)?,
                new_annual_rate: amount_or(&self.refinance_rate, 0.0)?,
                new_term_months: duration_or_zero(&self.refinance_duration)?,
                payoff_balance: amount_or(&self.refinance_payoff_balance, 0.0)?,
                closing_costs: amount_or(&self.refinance_closing_costs, 0.0)?,
            })
        } else {
            None
        };

        let remaining_term_months = match &self.remaining_loan_duration {
            Some(field) => Some(field.months()?),
            None => None,
        };

        Ok(CalculatorInputs::PayoffVsInvest(PayoffVsInvestInputs {
            economy: EconomicAssumptions {
                inflation_rate: amount_or(&self.inflation_rate, 0.0)?,
                investment_return_rate: amount_or(&self.investment_return_rate, 0.0)?,
                projection_years: self.projection_years.unwrap_or(DEFAULT_PROJECTION_YEARS),
            },
            loan: LoanTerms {
                amount: amount_or(&self.loan_amount, 0.0)?,
                annual_rate: amount_or(&self.loan_rate, 0.0)?,
                term_months: duration_or_zero(&self.loan_duration)?,
                remaining_term_months,
                refinance,
                interest_deduction_rate: amount_or(&self.interest_deduction_rate, 0.0)?,
            },
            extra_monthly_payment: amount_or(&self.extra_monthly_payment, 0.0)?,
            upfront_payment: amount_or(&self.upfront_payment, 0.0)?,
        }))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliScenario {
    BuyVsRent,
    SellVsKeep,
    PayoffVsInvest,
}

/// One-shot projection for the CLI: parse a raw JSON payload, run the
/// engine, and pretty-print the report.
pub fn run_from_json(scenario: CliScenario, raw: &str) -> Result<String, String> {
    let inputs = match scenario {
        CliScenario::BuyVsRent => serde_json::from_str::<BuyVsRentPayload>(raw)
            .map_err(|error| error.to_string())?
            .into_inputs()?,
        CliScenario::SellVsKeep => serde_json::from_str::<SellVsKeepPayload>(raw)
            .map_err(|error| error.to_string())?
            .into_inputs()?,
        CliScenario::PayoffVsInvest => serde_json::from_str::<PayoffVsInvestPayload>(raw)
            .map_err(|error| error.to_string())?
            .into_inputs()?,
    };
    let report = calculate(&inputs)?;
    serde_json::to_string_pretty(&report).map_err(|error| error.to_string())
}

fn run_projection(inputs: Result<CalculatorInputs, String>) -> Response {
    match inputs.and_then(|inputs| calculate(&inputs)) {
        Ok(report) => Json(report).into_response(),
        Err(message) => (StatusCode::BAD_REQUEST, message).into_response(),
    }
}

async fn buy_vs_rent_handler(Json(payload): Json<BuyVsRentPayload>) -> Response {
    run_projection(payload.into_inputs())
}

async fn sell_vs_keep_handler(Json(payload): Json<SellVsKeepPayload>) -> Response {
    run_projection(payload.into_inputs())
}

async fn payoff_vs_invest_handler(Json(payload): Json<PayoffVsInvestPayload>) -> Response {
    run_projection(payload.into_inputs())
}

async fn health_handler() -> &'static str {
    "ok"
}

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/buy-vs-rent", post(buy_vs_rent_handler))
        .route("/api/sell-vs-keep", post(sell_vs_keep_handler))
        .route("/api/payoff-vs-invest", post(payoff_vs_invest_handler))
}

pub async fn run_http_server(port: u16) -> Result<(), std::io::Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    println!("Listening on http://{addr}");
    axum::serve(listener, router()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ProjectionReport;

    #[test]
    fn amounts_parse_with_suffixes() {
        assert_eq!(parse_amount("500k").unwrap(), 500_000.0);
        assert_eq!(parse_amount("1.5m").unwrap(), 1_500_000.0);
        assert_eq!(parse_amount("2b").unwrap(), 2_000_000_000.0);
        assert_eq!(parse_amount("250 K").unwrap(), 250_000.0);
        assert_eq!(parse_amount("6.5").unwrap(), 6.5);
    }

    #[test]
    fn amounts_strip_percent_signs() {
        assert_eq!(parse_amount("-10%").unwrap(), -10.0);
        assert_eq!(parse_amount("3 %").unwrap(), 3.0);
    }

    #[test]
    fn empty_amount_is_zero() {
        assert_eq!(parse_amount("").unwrap(), 0.0);
        assert_eq!(parse_amount("   ").unwrap(), 0.0);
    }

    #[test]
    fn malformed_amounts_are_rejected() {
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("12x").is_err());
    }

    #[test]
    fn durations_parse_years_and_months() {
        assert_eq!(parse_duration("30y").unwrap(), 360);
        assert_eq!(parse_duration("5y6m").unwrap(), 66);
        assert_eq!(parse_duration("6m").unwrap(), 6);
        assert_eq!(parse_duration("1Y").unwrap(), 12);
    }

    #[test]
    fn zero_or_malformed_durations_are_rejected() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("0y").is_err());
        assert!(parse_duration("abc").is_err());
    }

    #[test]
    fn rate_lists_split_on_commas() {
        assert_eq!(parse_rate_list("10,5,3").unwrap(), vec![10.0, 5.0, 3.0]);
        assert_eq!(parse_rate_list("-20,-10").unwrap(), vec![-20.0, -10.0]);
        assert_eq!(parse_rate_list("3%").unwrap(), vec![3.0]);
        assert_eq!(parse_rate_list("").unwrap(), vec![0.0]);
        assert!(parse_rate_list("10,x").is_err());
    }

    #[test]
    fn buy_vs_rent_payload_derives_loan_amount() {
        let payload: BuyVsRentPayload = serde_json::from_str(
            r#"{
                "purchasePrice": "500k",
                "downpayment": "100k",
                "loanRate": 6.5,
                "loanDuration": "30y",
                "monthlyRent": 2200
            }"#,
        )
        .expect("payload");
        let inputs = payload.into_inputs().expect("inputs");
        let CalculatorInputs::BuyVsRent(inputs) = inputs else {
            panic!("wrong scenario");
        };
        assert_eq!(inputs.loan.amount, 400_000.0);
        assert_eq!(inputs.loan.term_months, 360);
        assert_eq!(inputs.asset.market_value, 500_000.0);
        assert!(inputs.selling.is_none());
    }

    #[test]
    fn sell_vs_keep_payload_defaults_market_value_to_purchase_price() {
        let payload: SellVsKeepPayload = serde_json::from_str(
            r#"{
                "purchasePrice": 400000,
                "loanAmount": "250k",
                "loanRate": "4.5%",
                "loanDuration": "30y",
                "remainingLoanDuration": "22y",
                "agentCommission": 5,
                "taxFreeLimit": "250k,500k"
            }"#,
        )
        .expect("payload");
        let inputs = payload.into_inputs().expect("inputs");
        let CalculatorInputs::SellVsKeep(inputs) = inputs else {
            panic!("wrong scenario");
        };
        assert_eq!(inputs.asset.market_value, 400_000.0);
        assert_eq!(inputs.loan.remaining_term_months, Some(264));
        assert_eq!(inputs.selling.tax_free_limits.for_year(0), 250_000.0);
        assert_eq!(inputs.selling.tax_free_limits.for_year(5), 500_000.0);
        assert!(inputs.replacement_rent.is_none());
    }

    #[test]
    fn payoff_payload_round_trips_through_the_engine() {
        let report = run_from_json(
            CliScenario::PayoffVsInvest,
            r#"{
                "loanAmount": "200k",
                "loanRate": 6,
                "loanDuration": "30y",
                "extraMonthlyPayment": 200,
                "investmentReturnRate": 7
            }"#,
        )
        .expect("report");
        assert!(report.contains("\"scenario\""));
        assert!(report.contains("payoffWealth"));
    }

    #[test]
    fn run_from_json_rejects_malformed_payloads() {
        assert!(run_from_json(CliScenario::BuyVsRent, "{not json").is_err());
        assert!(
            run_from_json(
                CliScenario::BuyVsRent,
                r#"{"purchasePrice": "half a million"}"#
            )
            .is_err()
        );
    }

    #[test]
    fn buy_vs_rent_report_serializes_with_scenario_tag() {
        let payload: BuyVsRentPayload = serde_json::from_str(
            r#"{
                "purchasePrice": "500k",
                "downpayment": "100k",
                "loanRate": 6.5,
                "loanDuration": "30y",
                "monthlyRent": 2200,
                "investmentReturnRate": 7,
                "inflationRate": 2,
                "appreciationRate": "3"
            }"#,
        )
        .expect("payload");
        let inputs = payload.into_inputs().expect("inputs");
        let report = calculate(&inputs).expect("report");
        assert!(matches!(report, ProjectionReport::BuyVsRent(_)));
        let json = serde_json::to_string(&report).expect("serialize");
        assert!(json.contains("\"scenario\":\"buyVsRent\""));
        assert!(json.contains("\"rentingNetWorth\""));
    }
}
