use super::types::Frequency;

/// Where a 1-based period index falls in the calendar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodSlot {
    pub period: u32,
    pub year_fraction: f64,
    pub year: u32,
    pub is_year_boundary: bool,
    /// Yearly tax accumulators restart before this period's cashflows.
    pub opens_tax_year: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct PeriodSchedule {
    periods_per_year: u32,
    total_periods: u32,
}

impl PeriodSchedule {
    pub fn new(years: u32, frequency: Frequency) -> Self {
        let periods_per_year = frequency.periods_per_year();
        Self {
            periods_per_year,
            total_periods: years.saturating_mul(periods_per_year),
        }
    }

    pub fn periods_per_year(&self) -> u32 {
        self.periods_per_year
    }

    pub fn total_periods(&self) -> u32 {
        self.total_periods
    }

    pub fn slot(&self, period: u32) -> PeriodSlot {
        let whole_years = period / self.periods_per_year;
        let remainder = period % self.periods_per_year;
        let year_fraction = whole_years as f64 + remainder as f64 / self.periods_per_year as f64;
        PeriodSlot {
            period,
            year_fraction,
            year: year_fraction.floor() as u32,
            // A trailing partial year still closes as a full tax year.
            is_year_boundary: remainder == 0 || period == self.total_periods,
            opens_tax_year: remainder == 0,
        }
    }

    pub fn slots(&self) -> impl Iterator<Item = PeriodSlot> + '_ {
        (1..=self.total_periods).map(|period| self.slot(period))
    }
}
