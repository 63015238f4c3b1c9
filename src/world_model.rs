use anyhow::Result;
use async_graphql::SimpleObject;
use serde::Serialize;
use serde_json::Value;

use crate::{
    database::Store,
    query::{lookup, Collection, Document, Filter},
};

const CUSTOMER_SAMPLE: usize = 500;
const ACCOUNT_SAMPLE: usize = 500;
const TRANSACTION_SAMPLE: usize = 1000;
const HIGH_RISK_SCORE: f64 = 0.7;

/// Counts of records that need attention. A gap is `None` when its
/// collection had no records to inspect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, SimpleObject)]
pub struct DataGaps {
    pub missing_kyc: Option<usize>,
    pub high_risk_customers: Option<usize>,
    pub frozen_accounts: Option<usize>,
    pub pending_txn: Option<usize>,
    pub reversed_txn: Option<usize>,
}

pub fn data_gaps_summary(
    customers: &[Document],
    accounts: &[Document],
    transactions: &[Document],
) -> DataGaps {
    let mut gaps = DataGaps::default();
    if !customers.is_empty() {
        gaps.missing_kyc = Some(count(customers, |c| {
            lookup(c, "kyc.pan_verified") != Some(&Value::Bool(true))
        }));
        gaps.high_risk_customers = Some(count(customers, |c| {
            lookup(c, "kyc.risk_score")
                .and_then(Value::as_f64)
                .is_some_and(|score| score > HIGH_RISK_SCORE)
        }));
    }
    if !accounts.is_empty() {
        gaps.frozen_accounts = Some(count(accounts, |a| has_status(a, "frozen")));
    }
    if !transactions.is_empty() {
        gaps.pending_txn = Some(count(transactions, |t| has_status(t, "pending")));
        gaps.reversed_txn = Some(count(transactions, |t| has_status(t, "reversed")));
    }
    gaps
}

/// One recommendation per non-zero gap, in a fixed order.
pub fn actionable_insights(gaps: &DataGaps) -> Vec<&'static str> {
    let checks = [
        (
            gaps.missing_kyc,
            "Initiate KYC completion campaigns for customers without PAN verification.",
        ),
        (
            gaps.high_risk_customers,
            "Increase monitoring or set tighter limits for high risk score customers (>0.7).",
        ),
        (
            gaps.frozen_accounts,
            "Review frozen accounts for potential reactivation or closure.",
        ),
        (
            gaps.pending_txn,
            "Investigate stuck/pending transactions to improve customer experience.",
        ),
        (
            gaps.reversed_txn,
            "Analyze reversed transactions to reduce operational errors/chargebacks.",
        ),
    ];
    let insights: Vec<_> = checks
        .into_iter()
        .filter(|(gap, _)| gap.unwrap_or(0) > 0)
        .map(|(_, insight)| insight)
        .collect();
    if insights.is_empty() {
        vec!["No critical gaps detected. Continue routine monitoring."]
    } else {
        insights
    }
}

/// Computes the gaps over a bounded sample of each collection.
pub fn scan<S: Store + ?Sized>(store: &S) -> Result<DataGaps> {
    let all = Filter::new();
    let customers = store.find(Collection::Customers, &all, None, CUSTOMER_SAMPLE)?;
    let accounts = store.find(Collection::Accounts, &all, None, ACCOUNT_SAMPLE)?;
    let transactions = store.find(Collection::Transactions, &all, None, TRANSACTION_SAMPLE)?;
    Ok(data_gaps_summary(&customers, &accounts, &transactions))
}

fn count(docs: &[Document], pred: impl Fn(&Document) -> bool) -> usize {
    docs.iter().filter(|doc| pred(doc)).count()
}

fn has_status(doc: &Document, status: &str) -> bool {
    doc.get("status").and_then(Value::as_str) == Some(status)
}
