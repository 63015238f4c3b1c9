use async_graphql::Enum;
use serde::Serialize;

#[derive(Enum, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Definition,
    Trend,
    Comparison,
    Aggregate,
    /// Fallback when no other rule matches.
    Filter,
}

struct Rule {
    intent: Intent,
    any_of: &'static [&'static str],
    none_of: &'static [&'static str],
}

impl Rule {
    fn matches(&self, text: &str) -> bool {
        self.any_of.iter().any(|k| text.contains(k))
            && !self.none_of.iter().any(|k| text.contains(k))
    }
}

/// Evaluated top to bottom, first match wins. `Aggregate` shares keywords
/// with `Trend` and `Comparison`, so it must stay below them.
const RULES: [Rule; 4] = [
    Rule {
        intent: Intent::Definition,
        any_of: &["define", "what is", "who is", "details of", "information on"],
        none_of: &["trend"],
    },
    Rule {
        intent: Intent::Trend,
        any_of: &[
            "trend",
            "over time",
            "by month",
            "timeseries",
            "daily",
            "weekly",
            "monthly",
        ],
        none_of: &[],
    },
    Rule {
        intent: Intent::Comparison,
        any_of: &["compare", "versus", "vs", "comparison"],
        none_of: &[],
    },
    Rule {
        intent: Intent::Aggregate,
        any_of: &[
            "avg",
            "average",
            "sum",
            "total",
            "count",
            "max",
            "min",
            "top",
            "trend",
            "compare",
            "comparison",
            "distribution",
        ],
        none_of: &[],
    },
];

#[cfg(test)]
pub fn classify_intent(question: &str) -> Intent {
    classify_lowercase(&question.to_lowercase())
}

pub(super) fn classify_lowercase(text: &str) -> Intent {
    RULES
        .iter()
        .find(|rule| rule.matches(text))
        .map_or(Intent::Filter, |rule| rule.intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_phrases() {
        assert_eq!(classify_intent("What is a savings account?"), Intent::Definition);
        assert_eq!(classify_intent("Details of customer C102"), Intent::Definition);
        assert_eq!(classify_intent("define accounts"), Intent::Definition);
    }

    #[test]
    fn trend_wins_over_definition() {
        assert_eq!(classify_intent("Define the spend trend"), Intent::Trend);
        assert_eq!(classify_intent("what is the trend of refunds"), Intent::Trend);
    }

    #[test]
    fn trend_keywords() {
        for question in [
            "Trend of grocery spend",
            "spend over time",
            "total debit by month",
            "weekly card spend",
            "Monthly refunds",
        ] {
            assert_eq!(classify_intent(question), Intent::Trend, "{question}");
        }
    }

    #[test]
    fn comparison_precedes_aggregate() {
        assert_eq!(
            classify_intent("Compare average spend by category"),
            Intent::Comparison
        );
        assert_eq!(classify_intent("upi versus card total"), Intent::Comparison);
    }

    #[test]
    fn aggregate_keywords() {
        assert_eq!(
            classify_intent("Top 5 merchants by total debit this month"),
            Intent::Aggregate
        );
        assert_eq!(classify_intent("sum of refunds in 2024"), Intent::Aggregate);
        assert_eq!(classify_intent("distribution of spend"), Intent::Aggregate);
    }

    #[test]
    fn falls_back_to_filter() {
        assert_eq!(
            classify_intent("show transactions where category is groceries"),
            Intent::Filter
        );
        assert_eq!(classify_intent(""), Intent::Filter);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(classify_intent("TREND OF SPEND"), Intent::Trend);
    }
}
