use super::types::{
    AmortizationRow, BuyVsRentInputs, BuyVsRentReport, CalculatorInputs, ComparisonRow,
    EffectiveLoanValues, ExpenditureRow, KeepExpensesRow, LoanTerms, MonthlySeries,
    PayoffVsInvestInputs, PayoffVsInvestReport, PayoffVsInvestRow, Period, ProjectionReport,
    RateSchedule, SaleProceedsRow, SellVsKeepInputs, SellVsKeepReport, SellVsKeepRow,
    SellingTerms, PROJECTION_MONTHS,
};

const RECOVERABLE_DEPOSIT_SHARE: f64 = 0.75;

pub fn calculate(inputs: &CalculatorInputs) -> Result<ProjectionReport, String> {
    validate(inputs)?;
    Ok(match inputs {
        CalculatorInputs::BuyVsRent(scenario) => {
            ProjectionReport::BuyVsRent(build_buy_vs_rent(scenario))
        }
        CalculatorInputs::SellVsKeep(scenario) => {
            ProjectionReport::SellVsKeep(build_sell_vs_keep(scenario))
        }
        CalculatorInputs::PayoffVsInvest(scenario) => {
            ProjectionReport::PayoffVsInvest(build_payoff_vs_invest(scenario))
        }
    })
}

fn validate(inputs: &CalculatorInputs) -> Result<(), String> {
    let loan = match inputs {
        CalculatorInputs::BuyVsRent(scenario) => &scenario.loan,
        CalculatorInputs::SellVsKeep(scenario) => &scenario.loan,
        CalculatorInputs::PayoffVsInvest(scenario) => &scenario.loan,
    };
    if loan.annual_rate / 100.0 / 12.0 == -1.0 {
        return Err("loan rate implies a -100% monthly rate, which cannot amortize".to_string());
    }
    if let Some(refinance) = &loan.refinance {
        if refinance.new_annual_rate / 100.0 / 12.0 == -1.0 {
            return Err(
                "refinance rate implies a -100% monthly rate, which cannot amortize".to_string()
            );
        }
    }
    Ok(())
}

/// Fixed-payment amortization: M = P * r(1+r)^n / ((1+r)^n - 1).
pub fn monthly_payment(principal: f64, monthly_rate: f64, months: u32) -> f64 {
    if months == 0 {
        return 0.0;
    }
    if monthly_rate == 0.0 {
        return principal / months as f64;
    }
    let factor = (1.0 + monthly_rate).powi(months as i32);
    principal * (monthly_rate * factor) / (factor - 1.0)
}

/// Collapses original loan, elapsed time, and refinance into the one
/// (balance, term, payment) triple everything downstream consumes.
pub fn resolve_effective_loan(loan: &LoanTerms) -> EffectiveLoanValues {
    if let Some(refinance) = &loan.refinance {
        // A refinance restarts the clock; elapsed time on the old loan is
        // irrelevant once its balance has been paid off.
        if refinance.new_loan_amount <= 0.0 {
            return EffectiveLoanValues::zero();
        }
        let monthly_rate = refinance.new_annual_rate / 100.0 / 12.0;
        return EffectiveLoanValues {
            effective_loan_amount: refinance.new_loan_amount,
            effective_loan_term: refinance.new_term_months,
            monthly_loan_payment: monthly_payment(
                refinance.new_loan_amount,
                monthly_rate,
                refinance.new_term_months,
            ),
            refinance_cash_out: refinance.new_loan_amount
                - refinance.payoff_balance
                - refinance.closing_costs,
        };
    }

    if loan.amount <= 0.0 || loan.term_months == 0 {
        return EffectiveLoanValues::zero();
    }

    let monthly_rate = loan.annual_rate / 100.0 / 12.0;
    match loan.remaining_term_months {
        Some(remaining) if remaining < loan.term_months => {
            // Replay the elapsed payments to find the true balance; early
            // payments are interest-heavy, so linear interpolation would
            // overstate the principal already paid.
            let original_payment = monthly_payment(loan.amount, monthly_rate, loan.term_months);
            let months_elapsed = loan.term_months - remaining;
            let mut balance = loan.amount;
            for _ in 0..months_elapsed {
                let interest = balance * monthly_rate;
                balance -= original_payment - interest;
            }
            let balance = balance.max(0.0);
            EffectiveLoanValues {
                effective_loan_amount: balance,
                effective_loan_term: remaining,
                monthly_loan_payment: monthly_payment(balance, monthly_rate, remaining),
                refinance_cash_out: 0.0,
            }
        }
        _ => EffectiveLoanValues {
            effective_loan_amount: loan.amount,
            effective_loan_term: loan.term_months,
            monthly_loan_payment: monthly_payment(loan.amount, monthly_rate, loan.term_months),
            refinance_cash_out: 0.0,
        },
    }
}

/// Walks the full 360-month horizon once, producing the five shared series.
/// Inflation is an annual step applied at each anniversary, not a monthly
/// compounding rate, so costs plateau within a year.
pub fn simulate_monthly_costs(
    effective: &EffectiveLoanValues,
    monthly_loan_rate: f64,
    monthly_recurring_cost: f64,
    monthly_renting_cost: f64,
    inflation_rate: f64,
    interest_deduction_rate: f64,
) -> MonthlySeries {
    let mut series = MonthlySeries {
        buying_cost: vec![0.0; PROJECTION_MONTHS],
        renting_cost: vec![0.0; PROJECTION_MONTHS],
        loan_balance: vec![0.0; PROJECTION_MONTHS],
        principal_paid: vec![0.0; PROJECTION_MONTHS],
        interest_paid: vec![0.0; PROJECTION_MONTHS],
    };

    let inflation_step = 1.0 + inflation_rate / 100.0;
    let deduction = interest_deduction_rate / 100.0;
    let mut renting_cost = monthly_renting_cost;
    let mut recurring_cost = monthly_recurring_cost;
    let mut balance = effective.effective_loan_amount;
    let mut total_principal = 0.0;
    let mut total_interest = 0.0;

    for month in 0..PROJECTION_MONTHS {
        if month > 0 && month % 12 == 0 {
            renting_cost *= inflation_step;
            recurring_cost *= inflation_step;
        }

        series.renting_cost[month] = renting_cost;

        if (month as u32) < effective.effective_loan_term {
            let interest = balance * monthly_loan_rate;
            let principal = effective.monthly_loan_payment - interest;
            balance -= principal;
            total_principal += principal;
            total_interest += interest;

            // The deduction lowers the cash cost of the interest portion;
            // the nominal interest still accumulates for reporting.
            series.buying_cost[month] = principal + interest * (1.0 - deduction) + recurring_cost;
            series.loan_balance[month] = balance;
        } else {
            series.buying_cost[month] = recurring_cost;
            series.loan_balance[month] = 0.0;
        }
        series.principal_paid[month] = total_principal;
        series.interest_paid[month] = total_interest;
    }

    series
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentTrack {
    pub net_position: Vec<f64>,
    pub cumulative_returns: Vec<f64>,
}

/// Compounds a running net position from a cost-signed monthly flow
/// (positive = expense, negative = income). A position may go negative;
/// deficits earn nothing and are not charged interest, they simply sit
/// unfunded until future inflow clears them.
pub fn track_investment(
    monthly_costs: &[f64],
    annual_return_rate: f64,
    months: usize,
    initial_balance: f64,
) -> InvestmentTrack {
    let monthly_rate = annual_return_rate / 100.0 / 12.0;
    let horizon = months.min(monthly_costs.len());
    let mut track = InvestmentTrack {
        net_position: Vec::with_capacity(horizon),
        cumulative_returns: Vec::with_capacity(horizon),
    };

    let mut position = initial_balance;
    let mut total_returns = 0.0;
    for cost in &monthly_costs[..horizon] {
        position -= cost;
        if position > 0.0 {
            let earned = position * monthly_rate;
            position += earned;
            total_returns += earned;
        }
        track.net_position.push(position);
        track.cumulative_returns.push(total_returns);
    }
    track
}

/// Compounds per-year appreciation rates; the last rate persists for all
/// later years and a trailing partial year compounds fractionally.
pub fn asset_value_at(start_price: f64, months: u32, rates: &RateSchedule) -> f64 {
    let full_years = (months / 12) as usize;
    let remaining_months = months % 12;

    let mut value = start_price;
    for year in 0..full_years {
        value *= 1.0 + rates.for_year(year) / 100.0;
    }
    if remaining_months > 0 {
        let rate = rates.for_year(full_years);
        value *= (1.0 + rate / 100.0).powf(remaining_months as f64 / 12.0);
    }
    value
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaleProceeds {
    pub sale_price: f64,
    pub selling_costs: f64,
    pub loan_payoff: f64,
    pub capital_gains: f64,
    pub tax_on_gains: f64,
    pub net_proceeds: f64,
}

/// Sale outcome at a given month. With `selling` absent the asset is simply
/// marked to value minus payoff; the cost, gain, and tax fields come back
/// zero and callers must not assume otherwise.
#[allow(clippy::too_many_arguments)]
pub fn sale_proceeds_at(
    months: u32,
    current_value: f64,
    cost_basis: f64,
    appreciation_rates: &RateSchedule,
    series: &MonthlySeries,
    effective: &EffectiveLoanValues,
    selling: Option<&SellingTerms>,
    inflation_rate: f64,
) -> SaleProceeds {
    let sale_price = asset_value_at(current_value, months, appreciation_rates);

    // At month 0 no payment has happened yet; read the resolved amount
    // rather than a month index that does not exist.
    let loan_payoff = if months == 0 {
        effective.effective_loan_amount
    } else {
        series.loan_balance[(months as usize - 1).min(series.loan_balance.len() - 1)]
    };

    let Some(selling) = selling else {
        return SaleProceeds {
            sale_price,
            selling_costs: 0.0,
            loan_payoff,
            capital_gains: 0.0,
            tax_on_gains: 0.0,
            net_proceeds: sale_price - loan_payoff,
        };
    };

    let elapsed_years = months / 12;
    let staging = selling.staging_costs * (1.0 + inflation_rate / 100.0).powi(elapsed_years as i32);
    let selling_costs = sale_price * selling.agent_commission / 100.0 + staging;
    let capital_gains = sale_price - cost_basis - selling_costs;
    let tax_free_limit = selling.tax_free_limits.for_year(elapsed_years as usize);
    let tax_on_gains =
        (capital_gains - tax_free_limit).max(0.0) * selling.capital_gains_tax_rate / 100.0;

    SaleProceeds {
        sale_price,
        selling_costs,
        loan_payoff,
        capital_gains,
        tax_on_gains,
        net_proceeds: sale_price - selling_costs - loan_payoff - tax_on_gains,
    }
}

/// Net worth of the renter: the downpayment they kept plus every month's
/// cost difference, dollar-cost-averaged into the market, plus the
/// recoverable share of the deposit.
pub fn renting_net_worth(
    series: &MonthlySeries,
    months: u32,
    downpayment: f64,
    rent_deposit: f64,
    annual_return_rate: f64,
) -> f64 {
    let monthly_rate = annual_return_rate / 100.0 / 12.0;
    let horizon = (months as usize).min(series.buying_cost.len());

    let mut investment = downpayment - rent_deposit;
    for month in 0..horizon {
        investment += series.buying_cost[month] - series.renting_cost[month];
        investment *= 1.0 + monthly_rate;
    }
    investment + rent_deposit * RECOVERABLE_DEPOSIT_SHARE
}

fn duration_label(months: u32) -> String {
    let years = months / 12;
    let rest = months % 12;
    if years == 0 {
        format!("{rest}m")
    } else if rest == 0 {
        format!("{years}y")
    } else {
        format!("{years}y{rest}m")
    }
}

/// Year-boundary display periods for the requested horizon, with a marker
/// row for the loan payoff month when it falls inside the horizon. A payoff
/// on a year boundary relabels that row instead of duplicating it.
pub fn projection_periods(projection_years: u32, loan_term_months: u32) -> Vec<Period> {
    let horizon_years = projection_years.min(30);
    let loan_label = format!("{} (loan term)", duration_label(loan_term_months));
    let mut inserted = loan_term_months == 0 || loan_term_months > horizon_years * 12;

    let mut periods = Vec::with_capacity(horizon_years as usize + 1);
    for year in 1..=horizon_years {
        let months = year * 12;
        if !inserted && loan_term_months < months {
            periods.push(Period {
                label: loan_label.clone(),
                months: loan_term_months,
            });
            inserted = true;
        }
        if !inserted && loan_term_months == months {
            periods.push(Period {
                label: loan_label.clone(),
                months,
            });
            inserted = true;
        } else {
            periods.push(Period {
                label: duration_label(months),
                months,
            });
        }
    }
    periods
}

fn month_index(months: u32, series_len: usize) -> usize {
    (months.max(1) as usize - 1).min(series_len - 1)
}

fn prefix_sum(values: &[f64], months: u32) -> f64 {
    values[..(months as usize).min(values.len())].iter().sum()
}

fn amortization_rows(periods: &[Period], series: &MonthlySeries) -> Vec<AmortizationRow> {
    periods
        .iter()
        .map(|period| {
            let index = month_index(period.months, series.loan_balance.len());
            AmortizationRow {
                period: period.clone(),
                principal_paid: series.principal_paid[index],
                interest_paid: series.interest_paid[index],
                loan_balance: series.loan_balance[index],
            }
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn sale_proceeds_rows(
    periods: &[Period],
    current_value: f64,
    cost_basis: f64,
    appreciation_rates: &RateSchedule,
    series: &MonthlySeries,
    effective: &EffectiveLoanValues,
    selling: &SellingTerms,
    inflation_rate: f64,
) -> Vec<SaleProceedsRow> {
    periods
        .iter()
        .map(|period| {
            let proceeds = sale_proceeds_at(
                period.months,
                current_value,
                cost_basis,
                appreciation_rates,
                series,
                effective,
                Some(selling),
                inflation_rate,
            );
            SaleProceedsRow {
                period: period.clone(),
                sale_price: proceeds.sale_price,
                selling_costs: proceeds.selling_costs,
                loan_payoff: proceeds.loan_payoff,
                capital_gains: proceeds.capital_gains,
                tax_on_gains: proceeds.tax_on_gains,
                net_proceeds: proceeds.net_proceeds,
            }
        })
        .collect()
}

fn build_buy_vs_rent(inputs: &BuyVsRentInputs) -> BuyVsRentReport {
    let effective = resolve_effective_loan(&inputs.loan);
    let series = simulate_monthly_costs(
        &effective,
        inputs.loan.effective_annual_rate() / 100.0 / 12.0,
        inputs.asset.monthly_recurring_cost(),
        inputs.renting.monthly_cost(),
        inputs.economy.inflation_rate,
        inputs.loan.interest_deduction_rate,
    );
    let periods = projection_periods(
        inputs.economy.projection_years,
        effective.effective_loan_term,
    );

    let amortization = if effective.effective_loan_term > 0 {
        amortization_rows(&periods, &series)
    } else {
        Vec::new()
    };

    let expenditure = periods
        .iter()
        .map(|period| {
            let buying_expenditure =
                inputs.downpayment + prefix_sum(&series.buying_cost, period.months);
            let renting_expenditure =
                inputs.renting.deposit + prefix_sum(&series.renting_cost, period.months);
            ExpenditureRow {
                period: period.clone(),
                buying_expenditure,
                renting_expenditure,
                difference: buying_expenditure - renting_expenditure,
            }
        })
        .collect();

    let sale_proceeds = match &inputs.selling {
        Some(selling) => sale_proceeds_rows(
            &periods,
            inputs.asset.market_value,
            inputs.asset.purchase_price,
            &inputs.asset.appreciation_rates,
            &series,
            &effective,
            selling,
            inputs.economy.inflation_rate,
        ),
        None => Vec::new(),
    };

    let comparison = periods
        .iter()
        .map(|period| {
            let proceeds = sale_proceeds_at(
                period.months,
                inputs.asset.market_value,
                inputs.asset.purchase_price,
                &inputs.asset.appreciation_rates,
                &series,
                &effective,
                inputs.selling.as_ref(),
                inputs.economy.inflation_rate,
            );
            let renting_worth = renting_net_worth(
                &series,
                period.months,
                inputs.downpayment,
                inputs.renting.deposit,
                inputs.economy.investment_return_rate,
            );
            let cumulative_savings = inputs.downpayment - inputs.renting.deposit
                + prefix_sum(&series.buying_cost, period.months)
                - prefix_sum(&series.renting_cost, period.months);
            let market_return = renting_worth
                - cumulative_savings
                - inputs.renting.deposit * RECOVERABLE_DEPOSIT_SHARE;
            ComparisonRow {
                period: period.clone(),
                asset_value: proceeds.sale_price,
                buying_net_worth: proceeds.net_proceeds,
                cumulative_savings,
                market_return,
                renting_net_worth: renting_worth,
                difference: renting_worth - proceeds.net_proceeds,
            }
        })
        .collect();

    BuyVsRentReport {
        effective_loan: effective,
        amortization,
        expenditure,
        sale_proceeds,
        comparison,
    }
}

fn build_sell_vs_keep(inputs: &SellVsKeepInputs) -> SellVsKeepReport {
    let effective = resolve_effective_loan(&inputs.loan);
    let replacement_rent_cost = inputs
        .replacement_rent
        .as_ref()
        .map(|renting| renting.monthly_cost())
        .unwrap_or(0.0);
    let series = simulate_monthly_costs(
        &effective,
        inputs.loan.effective_annual_rate() / 100.0 / 12.0,
        inputs.asset.monthly_recurring_cost(),
        replacement_rent_cost,
        inputs.economy.inflation_rate,
        inputs.loan.interest_deduction_rate,
    );
    let periods = projection_periods(
        inputs.economy.projection_years,
        effective.effective_loan_term,
    );

    // Keep path: the holding cash flow runs through the tracker, seeded by
    // refinance cash-out when one happened (negative when the owner had to
    // bring cash to close).
    let keep_track = track_investment(
        &series.buying_cost,
        inputs.economy.investment_return_rate,
        PROJECTION_MONTHS,
        effective.refinance_cash_out,
    );

    // Sell path: liquidate today, invest the proceeds, and draw any
    // replacement rent out of that balance. The renting series is all
    // zeros when no replacement home is configured.
    let sell_now = sale_proceeds_at(
        0,
        inputs.asset.market_value,
        inputs.asset.purchase_price,
        &inputs.asset.appreciation_rates,
        &series,
        &effective,
        Some(&inputs.selling),
        inputs.economy.inflation_rate,
    );
    let sell_track = track_investment(
        &series.renting_cost,
        inputs.economy.investment_return_rate,
        PROJECTION_MONTHS,
        sell_now.net_proceeds,
    );

    let deduction = inputs.loan.interest_deduction_rate / 100.0;
    let keep_expenses = periods
        .iter()
        .map(|period| {
            let index = month_index(period.months, series.loan_balance.len());
            let loan_cash_paid =
                series.principal_paid[index] + series.interest_paid[index] * (1.0 - deduction);
            let total_outlay = prefix_sum(&series.buying_cost, period.months);
            KeepExpensesRow {
                period: period.clone(),
                loan_cash_paid,
                holding_costs: total_outlay - loan_cash_paid,
                total_outlay,
                net_position: keep_track.net_position[index],
            }
        })
        .collect();

    let sale_proceeds = sale_proceeds_rows(
        &periods,
        inputs.asset.market_value,
        inputs.asset.purchase_price,
        &inputs.asset.appreciation_rates,
        &series,
        &effective,
        &inputs.selling,
        inputs.economy.inflation_rate,
    );

    let comparison = periods
        .iter()
        .map(|period| {
            let index = month_index(period.months, series.loan_balance.len());
            let future = sale_proceeds_at(
                period.months,
                inputs.asset.market_value,
                inputs.asset.purchase_price,
                &inputs.asset.appreciation_rates,
                &series,
                &effective,
                Some(&inputs.selling),
                inputs.economy.inflation_rate,
            );
            let keep_net_position = keep_track.net_position[index];
            let keep_net_worth = future.net_proceeds + keep_net_position;
            let sell_net_worth = sell_track.net_position[index];
            SellVsKeepRow {
                period: period.clone(),
                keep_asset_value: future.sale_price,
                keep_sale_proceeds: future.net_proceeds,
                keep_net_position,
                keep_net_worth,
                sell_net_worth,
                difference: sell_net_worth - keep_net_worth,
            }
        })
        .collect();

    SellVsKeepReport {
        effective_loan: effective,
        keep_expenses,
        sale_proceeds,
        comparison,
    }
}

struct PayoffPaths {
    payoff_balance: Vec<f64>,
    payoff_investment: Vec<f64>,
    invest_investment: Vec<f64>,
}

/// Two parallel uses of the same cash budget. Both paths commit
/// `payment + extra` per month for the life of the scheduled loan; the
/// accelerated path throws it at principal until the balance closes and
/// invests the freed payment afterwards, the other pays the schedule and
/// invests the extra from month one.
fn simulate_payoff_paths(
    effective: &EffectiveLoanValues,
    monthly_loan_rate: f64,
    monthly_invest_rate: f64,
    extra_monthly_payment: f64,
    upfront_payment: f64,
) -> PayoffPaths {
    let term = effective.effective_loan_term as usize;
    let budget = effective.monthly_loan_payment + extra_monthly_payment;

    let mut paths = PayoffPaths {
        payoff_balance: vec![0.0; PROJECTION_MONTHS],
        payoff_investment: vec![0.0; PROJECTION_MONTHS],
        invest_investment: vec![0.0; PROJECTION_MONTHS],
    };

    let mut balance = (effective.effective_loan_amount - upfront_payment).max(0.0);
    let mut payoff_investment = 0.0;
    let mut invest_investment = upfront_payment;

    for month in 0..PROJECTION_MONTHS {
        if month < term {
            if balance > 0.0 {
                let interest = balance * monthly_loan_rate;
                let due = balance + interest;
                let paid = budget.min(due);
                balance = (balance - (paid - interest)).max(0.0);
                payoff_investment += budget - paid;
            } else {
                payoff_investment += budget;
            }
            invest_investment += extra_monthly_payment;
        }
        payoff_investment *= 1.0 + monthly_invest_rate;
        invest_investment *= 1.0 + monthly_invest_rate;

        paths.payoff_balance[month] = balance;
        paths.payoff_investment[month] = payoff_investment;
        paths.invest_investment[month] = invest_investment;
    }
    paths
}

fn build_payoff_vs_invest(inputs: &PayoffVsInvestInputs) -> PayoffVsInvestReport {
    let effective = resolve_effective_loan(&inputs.loan);
    let monthly_loan_rate = inputs.loan.effective_annual_rate() / 100.0 / 12.0;
    let series = simulate_monthly_costs(
        &effective,
        monthly_loan_rate,
        0.0,
        0.0,
        inputs.economy.inflation_rate,
        inputs.loan.interest_deduction_rate,
    );
    let periods = projection_periods(
        inputs.economy.projection_years,
        effective.effective_loan_term,
    );

    let paths = simulate_payoff_paths(
        &effective,
        monthly_loan_rate,
        inputs.economy.investment_return_rate / 100.0 / 12.0,
        inputs.extra_monthly_payment,
        inputs.upfront_payment,
    );

    let amortization = if effective.effective_loan_term > 0 {
        amortization_rows(&periods, &series)
    } else {
        Vec::new()
    };

    let comparison = periods
        .iter()
        .map(|period| {
            let index = month_index(period.months, series.loan_balance.len());
            let payoff_wealth = paths.payoff_investment[index] - paths.payoff_balance[index];
            let invest_wealth = paths.invest_investment[index] - series.loan_balance[index];
            PayoffVsInvestRow {
                period: period.clone(),
                payoff_loan_balance: paths.payoff_balance[index],
                payoff_investment: paths.payoff_investment[index],
                payoff_wealth,
                invest_loan_balance: series.loan_balance[index],
                invest_investment: paths.invest_investment[index],
                invest_wealth,
                difference: invest_wealth - payoff_wealth,
            }
        })
        .collect();

    PayoffVsInvestReport {
        effective_loan: effective,
        amortization,
        comparison,
    }
}
