use super::types::TaxRule;

/// Income band closing at `upper_inclusive`, taxed at `rate` (a decimal).
#[derive(Debug, Clone, Copy)]
pub struct TaxBracket {
    pub upper_inclusive: f64,
    pub rate: f64,
}

const fn bracket(upper_inclusive: f64, rate: f64) -> TaxBracket {
    TaxBracket {
        upper_inclusive,
        rate,
    }
}

pub const PIR_BRACKETS: &[TaxBracket] = &[
    bracket(48_000.0, 0.105),
    bracket(78_000.0, 0.175),
    bracket(f64::INFINITY, 0.28),
];

pub const FIF_BRACKETS: &[TaxBracket] = &[
    bracket(15_600.0, 0.105),
    bracket(53_500.0, 0.175),
    bracket(78_100.0, 0.30),
    bracket(180_000.0, 0.33),
    bracket(f64::INFINITY, 0.39),
];

pub fn brackets(rule: TaxRule) -> &'static [TaxBracket] {
    match rule {
        TaxRule::Pir => PIR_BRACKETS,
        TaxRule::Fif => FIF_BRACKETS,
        TaxRule::None => &[],
    }
}

/// Flat rate applied to a year's taxable gain for the given annual income.
pub fn tax_rate(rule: TaxRule, annual_income: f64) -> f64 {
    brackets(rule)
        .iter()
        .find(|b| annual_income <= b.upper_inclusive)
        .map_or(0.0, |b| b.rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rate(rule: TaxRule, income: f64, expected: f64) {
        let actual = tax_rate(rule, income);
        assert!(
            (actual - expected).abs() < 1e-12,
            "{rule:?} at {income}: expected {expected}, got {actual}"
        );
    }

    #[test]
    fn pir_upper_bounds_are_inclusive() {
        assert_rate(TaxRule::Pir, 0.0, 0.105);
        assert_rate(TaxRule::Pir, 48_000.0, 0.105);
        assert_rate(TaxRule::Pir, 48_000.01, 0.175);
        assert_rate(TaxRule::Pir, 78_000.0, 0.175);
        assert_rate(TaxRule::Pir, 78_000.01, 0.28);
        assert_rate(TaxRule::Pir, 1_000_000.0, 0.28);
    }

    #[test]
    fn fif_walks_all_five_bands() {
        assert_rate(TaxRule::Fif, 15_600.0, 0.105);
        assert_rate(TaxRule::Fif, 15_600.5, 0.175);
        assert_rate(TaxRule::Fif, 53_500.0, 0.175);
        assert_rate(TaxRule::Fif, 78_100.0, 0.30);
        assert_rate(TaxRule::Fif, 120_000.0, 0.33);
        assert_rate(TaxRule::Fif, 180_000.0, 0.33);
        assert_rate(TaxRule::Fif, 180_000.01, 0.39);
    }

    #[test]
    fn untaxed_rule_is_zero_for_any_income() {
        for income in [0.0, 48_000.0, 250_000.0] {
            assert_rate(TaxRule::None, income, 0.0);
        }
    }

    #[test]
    fn bracket_tables_are_sorted_and_open_ended() {
        for table in [PIR_BRACKETS, FIF_BRACKETS] {
            assert!(
                table
                    .windows(2)
                    .all(|pair| pair[0].upper_inclusive < pair[1].upper_inclusive)
            );
            assert_eq!(
                table.last().map(|b| b.upper_inclusive),
                Some(f64::INFINITY)
            );
        }
    }
}
