use serde::Serialize;

/// Fixed simulation horizon. Every monthly series spans 30 years no matter
/// how short the requested projection is, so period rows never re-simulate.
pub const PROJECTION_MONTHS: usize = 360;

/// Per-year percentage (or dollar-limit) sequence where the last entry
/// applies to every year past the end of the sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSchedule {
    rates: Vec<f64>,
}

impl RateSchedule {
    pub fn new(rates: Vec<f64>) -> Result<Self, String> {
        if rates.is_empty() {
            return Err("rate schedule must contain at least one entry".to_string());
        }
        Ok(Self { rates })
    }

    pub fn flat(rate: f64) -> Self {
        Self { rates: vec![rate] }
    }

    pub fn for_year(&self, year: usize) -> f64 {
        self.rates[year.min(self.rates.len() - 1)]
    }
}

#[derive(Debug, Clone)]
pub struct EconomicAssumptions {
    pub inflation_rate: f64,
    pub investment_return_rate: f64,
    pub projection_years: u32,
}

#[derive(Debug, Clone)]
pub struct AssetTerms {
    /// Original cost basis, used for capital gains.
    pub purchase_price: f64,
    /// Value the appreciation compounding starts from. Equal to
    /// `purchase_price` for a fresh purchase.
    pub market_value: f64,
    pub annual_insurance: f64,
    pub annual_taxes: f64,
    pub monthly_expenses: f64,
    pub annual_income: f64,
    pub appreciation_rates: RateSchedule,
}

impl AssetTerms {
    /// Net recurring holding cost per month before any loan payment.
    pub fn monthly_recurring_cost(&self) -> f64 {
        (self.annual_insurance + self.annual_taxes - self.annual_income) / 12.0
            + self.monthly_expenses
    }
}

#[derive(Debug, Clone)]
pub struct RefinanceTerms {
    pub new_loan_amount: f64,
    pub new_annual_rate: f64,
    pub new_term_months: u32,
    pub payoff_balance: f64,
    pub closing_costs: f64,
}

#[derive(Debug, Clone)]
pub struct LoanTerms {
    pub amount: f64,
    pub annual_rate: f64,
    pub term_months: u32,
    /// For an existing loan partway through its schedule.
    pub remaining_term_months: Option<u32>,
    /// Replaces the original loan entirely when present.
    pub refinance: Option<RefinanceTerms>,
    /// Percent of mortgage interest deductible from the cash cost.
    pub interest_deduction_rate: f64,
}

impl LoanTerms {
    pub fn none() -> Self {
        Self {
            amount: 0.0,
            annual_rate: 0.0,
            term_months: 0,
            remaining_term_months: None,
            refinance: None,
            interest_deduction_rate: 0.0,
        }
    }

    /// Annual rate of whichever loan actually runs.
    pub fn effective_annual_rate(&self) -> f64 {
        match &self.refinance {
            Some(refinance) => refinance.new_annual_rate,
            None => self.annual_rate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RentingTerms {
    pub deposit: f64,
    pub monthly_rent: f64,
    pub annual_rent_costs: f64,
    pub other_annual_costs: f64,
}

impl RentingTerms {
    pub fn monthly_cost(&self) -> f64 {
        self.monthly_rent + self.annual_rent_costs / 12.0 + self.other_annual_costs / 12.0
    }
}

#[derive(Debug, Clone)]
pub struct SellingTerms {
    pub agent_commission: f64,
    pub staging_costs: f64,
    pub tax_free_limits: RateSchedule,
    pub capital_gains_tax_rate: f64,
}

#[derive(Debug, Clone)]
pub struct BuyVsRentInputs {
    pub economy: EconomicAssumptions,
    pub asset: AssetTerms,
    pub downpayment: f64,
    pub loan: LoanTerms,
    pub renting: RentingTerms,
    /// `None` disables the selling analysis entirely.
    pub selling: Option<SellingTerms>,
}

#[derive(Debug, Clone)]
pub struct SellVsKeepInputs {
    pub economy: EconomicAssumptions,
    pub asset: AssetTerms,
    pub loan: LoanTerms,
    pub selling: SellingTerms,
    /// Renting costs after selling a home you live in. `None` models an
    /// investment property where selling frees no housing obligation.
    pub replacement_rent: Option<RentingTerms>,
}

#[derive(Debug, Clone)]
pub struct PayoffVsInvestInputs {
    pub economy: EconomicAssumptions,
    pub loan: LoanTerms,
    pub extra_monthly_payment: f64,
    pub upfront_payment: f64,
}

#[derive(Debug, Clone)]
pub enum CalculatorInputs {
    BuyVsRent(BuyVsRentInputs),
    SellVsKeep(SellVsKeepInputs),
    PayoffVsInvest(PayoffVsInvestInputs),
}

/// Resolved (balance, term, payment) triple every downstream component
/// consumes. Derived once per run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveLoanValues {
    pub effective_loan_amount: f64,
    pub effective_loan_term: u32,
    pub monthly_loan_payment: f64,
    pub refinance_cash_out: f64,
}

impl EffectiveLoanValues {
    pub fn zero() -> Self {
        Self {
            effective_loan_amount: 0.0,
            effective_loan_term: 0,
            monthly_loan_payment: 0.0,
            refinance_cash_out: 0.0,
        }
    }
}

/// The five shared month-indexed arrays, produced once by the simulator and
/// read-only afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    pub buying_cost: Vec<f64>,
    pub renting_cost: Vec<f64>,
    pub loan_balance: Vec<f64>,
    pub principal_paid: Vec<f64>,
    pub interest_paid: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub label: String,
    pub months: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationRow {
    pub period: Period,
    pub principal_paid: f64,
    pub interest_paid: f64,
    pub loan_balance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenditureRow {
    pub period: Period,
    pub buying_expenditure: f64,
    pub renting_expenditure: f64,
    pub difference: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleProceedsRow {
    pub period: Period,
    pub sale_price: f64,
    pub selling_costs: f64,
    pub loan_payoff: f64,
    pub capital_gains: f64,
    pub tax_on_gains: f64,
    pub net_proceeds: f64,
}

/// Positive `difference` means renting wins.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub period: Period,
    pub asset_value: f64,
    pub buying_net_worth: f64,
    pub cumulative_savings: f64,
    pub market_return: f64,
    pub renting_net_worth: f64,
    pub difference: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeepExpensesRow {
    pub period: Period,
    /// Cash actually spent on the loan (after any interest deduction).
    pub loan_cash_paid: f64,
    /// Insurance, taxes, upkeep net of asset income.
    pub holding_costs: f64,
    pub total_outlay: f64,
    /// Running invest-or-deficit balance of the holding cash flow.
    pub net_position: f64,
}

/// Positive `difference` means selling now wins.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellVsKeepRow {
    pub period: Period,
    pub keep_asset_value: f64,
    pub keep_sale_proceeds: f64,
    pub keep_net_position: f64,
    pub keep_net_worth: f64,
    pub sell_net_worth: f64,
    pub difference: f64,
}

/// Positive `difference` means investing the extra cash wins.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffVsInvestRow {
    pub period: Period,
    pub payoff_loan_balance: f64,
    pub payoff_investment: f64,
    pub payoff_wealth: f64,
    pub invest_loan_balance: f64,
    pub invest_investment: f64,
    pub invest_wealth: f64,
    pub difference: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyVsRentReport {
    pub effective_loan: EffectiveLoanValues,
    /// Empty when no loan runs.
    pub amortization: Vec<AmortizationRow>,
    pub expenditure: Vec<ExpenditureRow>,
    /// Empty when selling analysis is disabled.
    pub sale_proceeds: Vec<SaleProceedsRow>,
    pub comparison: Vec<ComparisonRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellVsKeepReport {
    pub effective_loan: EffectiveLoanValues,
    pub keep_expenses: Vec<KeepExpensesRow>,
    pub sale_proceeds: Vec<SaleProceedsRow>,
    pub comparison: Vec<SellVsKeepRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffVsInvestReport {
    pub effective_loan: EffectiveLoanValues,
    pub amortization: Vec<AmortizationRow>,
    pub comparison: Vec<PayoffVsInvestRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "scenario")]
pub enum ProjectionReport {
    BuyVsRent(BuyVsRentReport),
    SellVsKeep(SellVsKeepReport),
    PayoffVsInvest(PayoffVsInvestReport),
}
