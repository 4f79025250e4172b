use crate::models::{finite, round_to, QuoteInfo, ScoreBreakdown, ScoreDetail};

pub const MAX_SCORE: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

/// Bracket table for one metric. Brackets are checked top-down with strict
/// comparisons; `fallback` applies when none matches.
struct MetricRule {
    max: u32,
    direction: Direction,
    brackets: &'static [(f64, u32)],
    fallback: u32,
    display_decimals: i32,
}

impl MetricRule {
    fn points(&self, value: f64) -> u32 {
        for &(bound, points) in self.brackets {
            let hit = match self.direction {
                Direction::LowerIsBetter => value < bound,
                Direction::HigherIsBetter => value > bound,
            };
            if hit {
                return points;
            }
        }
        self.fallback
    }

    fn evaluate(&self, value: f64) -> ScoreDetail {
        ScoreDetail {
            value: round_to(value, self.display_decimals),
            score: self.points(value),
            max: self.max,
        }
    }
}

const PE: MetricRule = MetricRule {
    max: 25,
    direction: Direction::LowerIsBetter,
    brackets: &[(15.0, 25), (20.0, 20), (25.0, 15), (35.0, 10), (50.0, 5)],
    fallback: 2,
    display_decimals: 2,
};

const PB: MetricRule = MetricRule {
    max: 20,
    direction: Direction::LowerIsBetter,
    brackets: &[(1.0, 20), (2.0, 16), (4.0, 10), (8.0, 5)],
    fallback: 2,
    display_decimals: 2,
};

const ROE: MetricRule = MetricRule {
    max: 20,
    direction: Direction::HigherIsBetter,
    brackets: &[(30.0, 20), (20.0, 16), (10.0, 10), (0.0, 5)],
    fallback: 0,
    display_decimals: 1,
};

const GROSS_MARGIN: MetricRule = MetricRule {
    max: 15,
    direction: Direction::HigherIsBetter,
    brackets: &[(50.0, 15), (35.0, 12), (20.0, 8), (10.0, 4)],
    fallback: 1,
    display_decimals: 1,
};

const NET_MARGIN: MetricRule = MetricRule {
    max: 10,
    direction: Direction::HigherIsBetter,
    brackets: &[(20.0, 10), (10.0, 8), (5.0, 5), (0.0, 2)],
    fallback: 0,
    display_decimals: 1,
};

const DEBT_TO_EQUITY: MetricRule = MetricRule {
    max: 10,
    direction: Direction::LowerIsBetter,
    brackets: &[(0.3, 10), (0.8, 8), (1.5, 5), (3.0, 2)],
    fallback: 0,
    display_decimals: 2,
};

const CURRENT_RATIO: MetricRule = MetricRule {
    max: 10,
    direction: Direction::HigherIsBetter,
    brackets: &[(2.0, 10), (1.5, 8), (1.0, 5), (0.8, 2)],
    fallback: 0,
    display_decimals: 2,
};

const REVENUE_GROWTH: MetricRule = MetricRule {
    max: 10,
    direction: Direction::HigherIsBetter,
    brackets: &[(15.0, 10), (8.0, 8), (3.0, 5), (0.0, 2)],
    fallback: 0,
    display_decimals: 1,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreCard {
    pub score: u32,
    pub details: ScoreBreakdown,
}

/// Scores a quote against the fixed bracket tables.
///
/// P/E and P/B only count when positive. The remaining metrics count whenever
/// present, scoring the lowest bracket when they fall below every threshold.
/// Fractions (ROE, margins, growth) are compared as percentages.
pub fn score_quote(info: &QuoteInfo) -> ScoreCard {
    let positive = |value: Option<f64>| finite(value).filter(|v| *v > 0.0);
    let as_percent = |value: Option<f64>| finite(value).map(|v| v * 100.0);

    let details = ScoreBreakdown {
        pe: positive(info.trailing_pe).map(|v| PE.evaluate(v)),
        pb: positive(info.price_to_book).map(|v| PB.evaluate(v)),
        roe: as_percent(info.return_on_equity).map(|v| ROE.evaluate(v)),
        gross_margin: as_percent(info.gross_margins).map(|v| GROSS_MARGIN.evaluate(v)),
        net_margin: as_percent(info.profit_margins).map(|v| NET_MARGIN.evaluate(v)),
        debt_to_equity: finite(info.debt_to_equity).map(|v| DEBT_TO_EQUITY.evaluate(v)),
        current_ratio: finite(info.current_ratio).map(|v| CURRENT_RATIO.evaluate(v)),
        revenue_growth: as_percent(info.revenue_growth).map(|v| REVENUE_GROWTH.evaluate(v)),
    };

    ScoreCard {
        score: details.total(),
        details,
    }
}
