//! Canonical monetary amount resolution.
//!
//! "Amount" is named differently across record kinds. Each resolver walks
//! one fixed priority chain and ends at zero, so a record with no usable
//! amount still contributes to counts.

use crate::models::{Claim, MoneyAmount, Payment, Policy, ScheduledDue};

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn nested(value: Option<&MoneyAmount>) -> Option<f64> {
    finite(value.and_then(|m| m.amount))
}

/// `approvedAmount -> claimAmount -> 0`.
pub fn claim_amount(claim: &Claim) -> f64 {
    finite(claim.approved_amount)
        .or_else(|| finite(claim.claim_amount))
        .unwrap_or(0.0)
}

/// `amount -> dueAmount.amount -> paidAmount.amount -> 0`.
pub fn payment_amount(payment: &Payment) -> f64 {
    finite(payment.amount)
        .or_else(|| nested(payment.due_amount.as_ref()))
        .or_else(|| nested(payment.paid_amount.as_ref()))
        .unwrap_or(0.0)
}

/// `amount -> dueAmount.amount -> 0`.
pub fn due_amount(due: &ScheduledDue) -> f64 {
    finite(due.amount)
        .or_else(|| nested(due.due_amount.as_ref()))
        .unwrap_or(0.0)
}

/// `premiumAmount -> sum of scheduled dues -> 0`.
pub fn policy_premium(policy: &Policy) -> f64 {
    finite(policy.premium_amount)
        .unwrap_or_else(|| policy.payment_schedule.iter().map(due_amount).sum())
}
