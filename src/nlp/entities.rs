use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::{query::Collection, time_window::TimeWindowTag};

/// Structured slots extracted from a question. Every slot is optional and
/// independent of the others.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EntityRecord {
    pub collection: Option<Collection>,
    pub field: Option<String>,
    pub value: Option<String>,
    pub time_window: Option<TimeWindowTag>,
    /// A field path, or the logical key `month`.
    pub groupby: Option<String>,
    pub topk: Option<usize>,
}

/// First set with a matching keyword wins.
const COLLECTION_KEYWORDS: [(Collection, &[&str]); 3] = [
    (
        Collection::Transactions,
        &[
            "transaction",
            "spend",
            "merchant",
            "debit",
            "credit",
            "refund",
            "upi",
            "card",
        ],
    ),
    (
        Collection::Accounts,
        &["account", "balance", "savings", "current", "loan"],
    ),
    (
        Collection::Customers,
        &["customer", "kyc", "risk", "age", "city"],
    ),
];

/// First matching phrase wins; `by city` outranks the rest.
const GROUP_BY_PHRASES: [(&str, &str); 4] = [
    ("by city", "location.city"),
    ("by month", "month"),
    ("by category", "category"),
    ("by merchant", "merchant"),
];

const TIME_WINDOW_PHRASES: [(TimeWindowTag, &[&str]); 3] = [
    (TimeWindowTag::ThisMonth, &["this month", "current month"]),
    (TimeWindowTag::LastMonth, &["last month", "previous month"]),
    (
        TimeWindowTag::LastSixMonths,
        &["last 6 months", "past 6 months", "six months"],
    ),
];

static FIELD_VALUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(category|merchant|type|status|city|account type|account_type|balance|age|risk(?: score)?)\b\s*(?:(?:is\b|=|:)\s*)?([a-z0-9_]+)",
    )
    .expect("Invalid regex")
});
static TOPK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btop\s+([0-9]+)").expect("Invalid regex"));
static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([1-9][0-9]{3})\b").expect("Invalid regex"));

#[cfg(test)]
pub fn extract_entities(question: &str) -> EntityRecord {
    extract_lowercase(&question.to_lowercase())
}

pub(super) fn extract_lowercase(text: &str) -> EntityRecord {
    let (field, value) = field_value(text).unzip();
    EntityRecord {
        collection: collection(text),
        field,
        value,
        time_window: time_window(text),
        groupby: groupby(text),
        topk: topk(text),
    }
}

fn collection(text: &str) -> Option<Collection> {
    COLLECTION_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(collection, _)| *collection)
}

/// Only the first field/value pair in the text is returned.
fn field_value(text: &str) -> Option<(String, String)> {
    let caps = FIELD_VALUE_PATTERN.captures(text)?;
    Some((caps[1].replace(' ', "_"), caps[2].to_string()))
}

fn topk(text: &str) -> Option<usize> {
    let caps = TOPK_PATTERN.captures(text)?;
    caps[1].parse().ok().filter(|k| *k > 0)
}

fn groupby(text: &str) -> Option<String> {
    GROUP_BY_PHRASES
        .iter()
        .find(|(phrase, _)| text.contains(phrase))
        .map(|(_, key)| (*key).to_string())
}

fn time_window(text: &str) -> Option<TimeWindowTag> {
    TIME_WINDOW_PHRASES
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| text.contains(p)))
        .map(|(tag, _)| *tag)
        .or_else(|| {
            let caps = YEAR_PATTERN.captures(text)?;
            caps[1].parse().ok().map(TimeWindowTag::Year)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_and_value_with_copula() {
        let entities = extract_entities("show transactions where category is groceries");
        assert_eq!(entities.field.as_deref(), Some("category"));
        assert_eq!(entities.value.as_deref(), Some("groceries"));
        assert_eq!(entities.collection, Some(Collection::Transactions));
    }

    #[test]
    fn field_and_value_without_copula() {
        let entities = extract_entities("customers in city Mumbai");
        assert_eq!(entities.field.as_deref(), Some("city"));
        assert_eq!(entities.value.as_deref(), Some("mumbai"));
        assert_eq!(entities.collection, Some(Collection::Customers));

        let entities = extract_entities("status: pending");
        assert_eq!(entities.field.as_deref(), Some("status"));
        assert_eq!(entities.value.as_deref(), Some("pending"));
    }

    #[test]
    fn multiword_field_names_use_underscores() {
        let entities = extract_entities("accounts where account type = savings");
        assert_eq!(entities.field.as_deref(), Some("account_type"));
        assert_eq!(entities.value.as_deref(), Some("savings"));

        let entities = extract_entities("customers with risk score 9");
        assert_eq!(entities.field.as_deref(), Some("risk_score"));
        assert_eq!(entities.value.as_deref(), Some("9"));
    }

    #[test]
    fn only_the_first_pair_is_extracted() {
        let entities = extract_entities("status is pending and category is travel");
        assert_eq!(entities.field.as_deref(), Some("status"));
        assert_eq!(entities.value.as_deref(), Some("pending"));
    }

    #[test]
    fn field_names_end_at_word_boundary() {
        let entities = extract_entities("top 7 merchants by spend");
        assert_eq!(entities.field, None);
        assert_eq!(entities.value, None);
    }

    #[test]
    fn copula_must_be_a_whole_word() {
        let entities = extract_entities("city island");
        assert_eq!(entities.value.as_deref(), Some("island"));
    }

    #[test]
    fn topk() {
        let entities = extract_entities("top 7 merchants by spend");
        assert_eq!(entities.topk, Some(7));
        assert_eq!(extract_entities("top merchants").topk, None);
        assert_eq!(extract_entities("top 0 merchants").topk, None);
        assert_eq!(
            extract_entities("top 99999999999999999999999 merchants").topk,
            None
        );
    }

    #[test]
    fn groupby_phrases() {
        assert_eq!(
            extract_entities("spend by merchant").groupby.as_deref(),
            Some("merchant")
        );
        assert_eq!(
            extract_entities("spend by category").groupby.as_deref(),
            Some("category")
        );
        assert_eq!(
            extract_entities("spend by month").groupby.as_deref(),
            Some("month")
        );
        assert_eq!(
            extract_entities("spend by city").groupby.as_deref(),
            Some("location.city")
        );
    }

    #[test]
    fn groupby_order_when_phrases_co_occur() {
        assert_eq!(
            extract_entities("spend by merchant and by category")
                .groupby
                .as_deref(),
            Some("category")
        );
        assert_eq!(
            extract_entities("spend by category by month").groupby.as_deref(),
            Some("month")
        );
        assert_eq!(
            extract_entities("spend by month by city").groupby.as_deref(),
            Some("location.city")
        );
    }

    #[test]
    fn time_windows() {
        assert_eq!(
            extract_entities("spend this month").time_window,
            Some(TimeWindowTag::ThisMonth)
        );
        assert_eq!(
            extract_entities("spend in the current month").time_window,
            Some(TimeWindowTag::ThisMonth)
        );
        assert_eq!(
            extract_entities("refunds previous month").time_window,
            Some(TimeWindowTag::LastMonth)
        );
        assert_eq!(
            extract_entities("debits over the past 6 months").time_window,
            Some(TimeWindowTag::LastSixMonths)
        );
        assert_eq!(extract_entities("spend").time_window, None);
    }

    #[test]
    fn relative_windows_take_precedence_over_years() {
        assert_eq!(
            extract_entities("this month versus 2023").time_window,
            Some(TimeWindowTag::ThisMonth)
        );
    }

    #[test]
    fn any_four_digit_year() {
        assert_eq!(
            extract_entities("transactions in 2019").time_window,
            Some(TimeWindowTag::Year(2019))
        );
        assert_eq!(
            extract_entities("spend 2024").time_window,
            Some(TimeWindowTag::Year(2024))
        );
        assert_eq!(
            extract_entities("spend in 1850").time_window,
            Some(TimeWindowTag::Year(1850))
        );
        assert_eq!(
            extract_entities("spend in 3100").time_window,
            Some(TimeWindowTag::Year(3100))
        );
        assert_eq!(extract_entities("card 12345").time_window, None);
        // non-ASCII digits are not years
        assert_eq!(extract_entities("spend in ٢٠٢٤").time_window, None);
        assert_eq!(extract_entities("top ٥ merchants").topk, None);
        assert_eq!(extract_entities("pin 0420").time_window, None);
    }

    #[test]
    fn collection_priority() {
        assert_eq!(
            extract_entities("card balance").collection,
            Some(Collection::Transactions)
        );
        assert_eq!(
            extract_entities("loan balance").collection,
            Some(Collection::Accounts)
        );
        assert_eq!(
            extract_entities("kyc pending").collection,
            Some(Collection::Customers)
        );
        assert_eq!(extract_entities("hello").collection, None);
    }

    #[test]
    fn no_matches_yield_empty_record() {
        assert_eq!(extract_entities("hello there"), EntityRecord::default());
    }
}
