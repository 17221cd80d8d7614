use serde::Serialize;

use crate::error::ParameterError;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InvestmentType {
    Fixed,
    PercentOfSalary,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TaxRule {
    Pir,
    Fif,
    None,
}

/// Compounding periods per year.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Frequency {
    Annually,
    Quarterly,
    Monthly,
    Fortnightly,
}

impl Frequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            Frequency::Annually => 1,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
            Frequency::Fortnightly => 26,
        }
    }
}

impl TryFrom<u32> for Frequency {
    type Error = ParameterError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Frequency::Annually),
            4 => Ok(Frequency::Quarterly),
            12 => Ok(Frequency::Monthly),
            26 => Ok(Frequency::Fortnightly),
            other => Err(ParameterError::UnsupportedFrequency(other)),
        }
    }
}

/// One simulation run's inputs. Rates and fees are percentages (8.0 means 8%).
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionParameters {
    pub starting_income: f64,
    pub salary_growth_rate: f64,
    pub initial_investment: f64,
    pub investment_type: InvestmentType,
    pub fixed_amount: f64,
    pub salary_percentage: f64,
    pub years: u32,
    pub frequency: Frequency,
    pub expected_return: f64,
    pub entry_fee: f64,
    pub management_fee: f64,
    pub tax_rule: TaxRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub year: u32,
    pub invested: i64,
    pub portfolio_value: i64,
    pub total_wealth: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub total_invested: i64,
    pub portfolio_value: i64,
    pub total_entry_fees: i64,
    pub total_mgmt_fees: i64,
    pub tax: i64,
    pub total_wealth: i64,
    pub net_return: f64,
    pub chart_data: Vec<ChartPoint>,
}
