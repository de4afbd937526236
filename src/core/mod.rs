mod engine;
mod types;

pub use engine::{
    asset_value_at, calculate, monthly_payment, projection_periods, renting_net_worth,
    resolve_effective_loan, sale_proceeds_at, simulate_monthly_costs, track_investment,
    InvestmentTrack, SaleProceeds,
};
pub use types::{
    AmortizationRow, AssetTerms, BuyVsRentInputs, BuyVsRentReport, CalculatorInputs,
    ComparisonRow, EconomicAssumptions, EffectiveLoanValues, ExpenditureRow, KeepExpensesRow,
    LoanTerms, MonthlySeries, PayoffVsInvestInputs, PayoffVsInvestReport, PayoffVsInvestRow,
    Period, ProjectionReport, RateSchedule, RefinanceTerms, RentingTerms, SaleProceedsRow,
    SellVsKeepInputs, SellVsKeepReport, SellVsKeepRow, SellingTerms, PROJECTION_MONTHS,
};
