use tracing::{debug, trace};

use super::schedule::{PeriodSchedule, PeriodSlot};
use super::tax::tax_rate;
use super::types::{ChartPoint, InvestmentType, ProjectionParameters, ProjectionResult};

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct SimulationState {
    portfolio_value: f64,
    total_invested: f64,
    total_entry_fees: f64,
    total_mgmt_fees: f64,
    total_tax: f64,
    yearly_gross_growth: f64,
    yearly_mgmt_fees: f64,
}

/// Percent inputs converted to per-period decimals.
#[derive(Debug, Clone, Copy)]
struct PeriodRates {
    periods_per_year: f64,
    growth: f64,
    management_fee: f64,
    entry_fee: f64,
}

impl PeriodRates {
    fn new(params: &ProjectionParameters, periods_per_year: u32) -> Self {
        let periods = periods_per_year as f64;
        Self {
            periods_per_year: periods,
            growth: params.expected_return / 100.0 / periods,
            management_fee: params.management_fee / 100.0 / periods,
            entry_fee: params.entry_fee / 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ContributionFlow {
    income: f64,
    gross: f64,
    entry_fee: f64,
}

/// Projects one parameter set period by period. Pure: equal inputs give equal outputs.
pub fn run_projection(params: &ProjectionParameters) -> ProjectionResult {
    let schedule = PeriodSchedule::new(params.years, params.frequency);
    let rates = PeriodRates::new(params, schedule.periods_per_year());
    let mut state = SimulationState::default();
    let mut chart_data = Vec::with_capacity(params.years as usize + 1);

    apply_initial_investment(params, &rates, &mut state);
    chart_data.push(snapshot(0, &state));

    for slot in schedule.slots() {
        advance_period(params, &rates, slot, &mut state);
        if slot.is_year_boundary {
            chart_data.push(snapshot(slot.year_fraction.round() as u32, &state));
        }
    }

    if schedule.total_periods() > 0 {
        apply_liquidation_fee(&rates, &mut state);
    }

    assemble_result(&state, chart_data)
}

fn apply_initial_investment(
    params: &ProjectionParameters,
    rates: &PeriodRates,
    state: &mut SimulationState,
) {
    if params.initial_investment <= 0.0 {
        return;
    }
    let entry_fee = params.initial_investment * rates.entry_fee;
    state.total_invested += params.initial_investment;
    state.total_entry_fees += entry_fee;
    state.portfolio_value += params.initial_investment - entry_fee;
    debug!(
        gross = params.initial_investment,
        entry_fee,
        portfolio_value = state.portfolio_value,
        "initial investment"
    );
}

// Step order is contribution, growth, management fee, tax. Reordering changes results.
fn advance_period(
    params: &ProjectionParameters,
    rates: &PeriodRates,
    slot: PeriodSlot,
    state: &mut SimulationState,
) {
    if slot.opens_tax_year {
        state.yearly_gross_growth = 0.0;
        state.yearly_mgmt_fees = 0.0;
    }
    let flow = apply_contribution(params, rates, slot, state);
    apply_growth(rates, slot, state);
    apply_management_fee(rates, slot, state);
    if slot.is_year_boundary {
        close_tax_year(params, flow.income, slot, state);
    }
}

fn income_for_year(params: &ProjectionParameters, year: u32) -> f64 {
    params.starting_income * (1.0 + params.salary_growth_rate / 100.0).powi(year as i32)
}

fn apply_contribution(
    params: &ProjectionParameters,
    rates: &PeriodRates,
    slot: PeriodSlot,
    state: &mut SimulationState,
) -> ContributionFlow {
    let income = income_for_year(params, slot.year);
    let requested = match params.investment_type {
        InvestmentType::Fixed => params.fixed_amount,
        InvestmentType::PercentOfSalary => {
            (income / rates.periods_per_year) * (params.salary_percentage / 100.0)
        }
    };
    let gross = requested.max(0.0);
    let entry_fee = gross * rates.entry_fee;

    state.total_invested += gross;
    state.total_entry_fees += entry_fee;
    state.portfolio_value += gross - entry_fee;

    let flow = ContributionFlow {
        income,
        gross,
        entry_fee,
    };
    trace!(
        period = slot.period,
        income = flow.income,
        contribution = flow.gross,
        entry_fee = flow.entry_fee,
        "contribution"
    );
    flow
}

fn apply_growth(rates: &PeriodRates, slot: PeriodSlot, state: &mut SimulationState) {
    if state.portfolio_value <= 0.0 {
        return;
    }
    let growth = state.portfolio_value * rates.growth;
    state.portfolio_value += growth;
    state.yearly_gross_growth += growth;
    trace!(
        period = slot.period,
        growth,
        portfolio_value = state.portfolio_value,
        "growth"
    );
}

fn apply_management_fee(rates: &PeriodRates, slot: PeriodSlot, state: &mut SimulationState) {
    if state.portfolio_value <= 0.0 {
        return;
    }
    let fee = state.portfolio_value * rates.management_fee;
    state.portfolio_value -= fee;
    state.total_mgmt_fees += fee;
    state.yearly_mgmt_fees += fee;
    trace!(
        period = slot.period,
        fee,
        portfolio_value = state.portfolio_value,
        "management fee"
    );
}

/// Taxes the gains accumulated since the tax year opened, net of fees.
fn close_tax_year(
    params: &ProjectionParameters,
    income: f64,
    slot: PeriodSlot,
    state: &mut SimulationState,
) {
    if state.portfolio_value > 0.0 {
        let taxable_gain = (state.yearly_gross_growth - state.yearly_mgmt_fees).max(0.0);
        let tax = taxable_gain * tax_rate(params.tax_rule, income);
        state.portfolio_value -= tax;
        state.total_tax += tax;
        debug!(
            period = slot.period,
            income,
            taxable_gain,
            tax,
            portfolio_value = state.portfolio_value,
            "closed tax year"
        );
    }
}

fn apply_liquidation_fee(rates: &PeriodRates, state: &mut SimulationState) {
    if state.portfolio_value <= 0.0 || rates.entry_fee <= 0.0 {
        return;
    }
    let fee = state.portfolio_value * rates.entry_fee;
    state.portfolio_value -= fee;
    state.total_entry_fees += fee;
    debug!(
        fee,
        portfolio_value = state.portfolio_value,
        "liquidation fee"
    );
}

fn round_currency(value: f64) -> i64 {
    value.round() as i64
}

fn snapshot(year: u32, state: &SimulationState) -> ChartPoint {
    ChartPoint {
        year,
        invested: round_currency(state.total_invested),
        portfolio_value: round_currency(state.portfolio_value),
        total_wealth: round_currency(state.portfolio_value),
    }
}

fn assemble_result(state: &SimulationState, chart_data: Vec<ChartPoint>) -> ProjectionResult {
    let total_wealth = state.portfolio_value;
    let net_return = if state.total_invested > 0.0 {
        (total_wealth - state.total_invested) / state.total_invested * 100.0
    } else {
        0.0
    };

    ProjectionResult {
        total_invested: round_currency(state.total_invested),
        portfolio_value: round_currency(state.portfolio_value),
        total_entry_fees: round_currency(state.total_entry_fees),
        total_mgmt_fees: round_currency(state.total_mgmt_fees),
        tax: round_currency(state.total_tax),
        total_wealth: round_currency(total_wealth),
        net_return,
        chart_data,
    }
}
