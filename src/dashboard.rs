//! Dashboard assembly.
//!
//! [`recompute`] wires the analysis modules together for each chart and
//! returns a fresh [`Dashboard`]. It keeps no state between calls; the
//! caller decides when inputs have changed and a refresh is due.

use crate::analysis::aggregator::{bucketize, distribute, BucketSeries, PeriodFilter};
use crate::analysis::amount::{claim_amount, due_amount, payment_amount, policy_premium};
use crate::analysis::classifier::{
    claim_status_label, due_status_label, Classifier, Dimension, PaymentBucket, Record,
};
use crate::analysis::metrics::{
    average, average_processing_days, count_rate, cumulative, growth_rate, net_revenue, rate,
    sanitize, shares, Share,
};
use crate::analysis::period::{month_buckets, Period, Window};
use crate::error::AnalyticsError;
use crate::models::{
    Claim, ClaimStatus, Customer, DueStatus, Payment, PolicyStatus, PortalSnapshot,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A dashboard widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chart {
    Revenue,
    Claims,
    Policies,
    Customers,
    Payments,
}

impl Chart {
    pub const ALL: [Chart; 5] = [
        Chart::Revenue,
        Chart::Claims,
        Chart::Policies,
        Chart::Customers,
        Chart::Payments,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Chart::Revenue => "revenue",
            Chart::Claims => "claims",
            Chart::Policies => "policies",
            Chart::Customers => "customers",
            Chart::Payments => "payments",
        }
    }
}

impl fmt::Display for Chart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Chart {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chart::ALL
            .into_iter()
            .find(|chart| chart.name() == s.trim().to_lowercase())
            .ok_or_else(|| AnalyticsError::InvalidChart(s.to_string()))
    }
}

/// Which charts a recomputation should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardOptions {
    pub charts: Vec<Chart>,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            charts: Chart::ALL.to_vec(),
        }
    }
}

impl DashboardOptions {
    pub fn includes(&self, chart: Chart) -> bool {
        self.charts.contains(&chart)
    }
}

/// One month of the revenue chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueRow {
    pub label: String,
    pub premium_revenue: f64,
    pub paid_claims: f64,
    pub net_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueChart {
    pub rows: Vec<RevenueRow>,
    pub total_premium: f64,
    pub total_paid_claims: f64,
    pub total_net: f64,
}

/// One month of the claims chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimsRow {
    pub label: String,
    pub submitted: u64,
    pub approved: u64,
    pub rejected: u64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimsChart {
    pub by_status: Vec<Share>,
    pub by_type: Vec<Share>,
    pub monthly: Vec<ClaimsRow>,
    pub total_claims: u64,
    pub total_amount: f64,
    pub approval_rate: f64,
    pub rejection_rate: f64,
    pub average_amount: f64,
    pub average_processing_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyChart {
    /// Share amounts are premiums.
    pub by_type: Vec<Share>,
    pub by_status: Vec<Share>,
    /// Scheduled dues of the admitted policies, by due status.
    pub schedule: Vec<Share>,
    pub total_policies: u64,
    pub active_policies: u64,
    pub schedule_compliance: f64,
}

/// One month of the customer growth chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthRow {
    pub label: String,
    pub new_customers: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerGrowthChart {
    pub rows: Vec<GrowthRow>,
    pub by_status: Vec<Share>,
    pub new_customers: u64,
    pub total_customers: u64,
    pub active_customers: u64,
    pub growth_rate: f64,
}

/// One month of the payment chart, by due date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRow {
    pub label: String,
    pub paid: f64,
    pub overdue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentChart {
    pub by_bucket: Vec<Share>,
    pub monthly: Vec<PaymentRow>,
    pub collection_rate: f64,
    pub on_time_rate: f64,
    pub overdue_count: u64,
    pub overdue_amount: f64,
}

/// Flat set of headline KPIs.
///
/// Rates are whole percentages in `[0, 100]`; `customer_growth_rate` is a
/// signed change and may be negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricSummary {
    pub total_revenue: f64,
    pub total_paid_claims: f64,
    pub net_revenue: f64,
    pub total_claims: u64,
    pub approval_rate: f64,
    pub rejection_rate: f64,
    pub average_claim_amount: f64,
    pub average_processing_days: f64,
    pub collection_rate: f64,
    pub on_time_rate: f64,
    pub overdue_payments: u64,
    pub total_policies: u64,
    pub active_policies: u64,
    pub total_customers: u64,
    pub active_customers: u64,
    pub new_customers: u64,
    pub customer_growth_rate: f64,
}

/// Everything one refresh produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub period: Period,
    pub generated_at: NaiveDateTime,
    pub window: Window,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<RevenueChart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<ClaimsChart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policies: Option<PolicyChart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customers: Option<CustomerGrowthChart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payments: Option<PaymentChart>,
    pub summary: MetricSummary,
}

/// Every normalizable timestamp in the snapshot, for anchoring `all`.
fn snapshot_timestamps(snapshot: &PortalSnapshot) -> Vec<NaiveDateTime> {
    let claims = snapshot.claims.iter().filter_map(Claim::submitted_at);
    let payments = snapshot
        .payments
        .paid
        .iter()
        .chain(&snapshot.payments.overdue)
        .filter_map(Payment::settled_at);
    let policies = snapshot.policies.iter().filter_map(|p| p.effective_at());
    let customers = snapshot.customers.iter().filter_map(Customer::joined_at);

    claims.chain(payments).chain(policies).chain(customers).collect()
}

/// Rebuild the full dashboard from the current inputs.
pub fn recompute(
    snapshot: &PortalSnapshot,
    period: Period,
    now: NaiveDateTime,
    options: &DashboardOptions,
) -> Dashboard {
    let window = Window::resolve_anchored(period, now, snapshot_timestamps(snapshot));
    debug!(
        "Recomputing {} dashboard over [{}, {}) from {} records",
        period,
        window.start,
        window.end,
        snapshot.record_count()
    );

    let classifier = Classifier::new(now);

    let revenue = revenue_chart(snapshot, &window);
    let claims = claims_chart(&snapshot.claims, &window, &classifier);
    let policies = policy_chart(snapshot, &window, &classifier, now);
    let customers = customer_growth_chart(&snapshot.customers, &window, &classifier);
    let payments = payment_chart(snapshot, &window, &classifier);

    let summary = MetricSummary {
        total_revenue: revenue.total_premium,
        total_paid_claims: revenue.total_paid_claims,
        net_revenue: revenue.total_net,
        total_claims: claims.total_claims,
        approval_rate: claims.approval_rate,
        rejection_rate: claims.rejection_rate,
        average_claim_amount: claims.average_amount,
        average_processing_days: claims.average_processing_days,
        collection_rate: payments.collection_rate,
        on_time_rate: payments.on_time_rate,
        overdue_payments: payments.overdue_count,
        total_policies: policies.total_policies,
        active_policies: policies.active_policies,
        total_customers: customers.total_customers,
        active_customers: customers.active_customers,
        new_customers: customers.new_customers,
        customer_growth_rate: customers.growth_rate,
    };

    Dashboard {
        period,
        generated_at: now,
        window,
        revenue: options.includes(Chart::Revenue).then_some(revenue),
        claims: options.includes(Chart::Claims).then_some(claims),
        policies: options.includes(Chart::Policies).then_some(policies),
        customers: options.includes(Chart::Customers).then_some(customers),
        payments: options.includes(Chart::Payments).then_some(payments),
        summary,
    }
}

fn revenue_chart(snapshot: &PortalSnapshot, window: &Window) -> RevenueChart {
    let buckets = month_buckets(window);
    let filter = PeriodFilter::time_series(*window);

    let paid = filter.apply(&snapshot.payments.paid, Payment::settled_at);
    let premium = bucketize(
        &buckets,
        paid,
        |p| p.settled_at(),
        |_| "premium".to_string(),
        |p| payment_amount(p),
    );

    let paid_claims: Vec<&Claim> = filter
        .apply(&snapshot.claims, Claim::submitted_at)
        .into_iter()
        .filter(|c| c.status == ClaimStatus::Paid)
        .collect();
    let payouts = bucketize(
        &buckets,
        paid_claims,
        |c| c.submitted_at(),
        |_| "claims".to_string(),
        |c| claim_amount(c),
    );

    let rows: Vec<RevenueRow> = premium
        .rows
        .iter()
        .zip(&payouts.rows)
        .map(|(p, c)| RevenueRow {
            label: p.bucket.label.clone(),
            premium_revenue: sanitize(p.amount),
            paid_claims: sanitize(c.amount),
            net_revenue: net_revenue(p.amount, c.amount),
        })
        .collect();

    let total_premium = sanitize(premium.amounts().iter().sum());
    let total_paid_claims = sanitize(payouts.amounts().iter().sum());

    debug!(
        "Revenue: {} bucket(s), premium {:.2}, paid claims {:.2}",
        rows.len(),
        total_premium,
        total_paid_claims
    );

    RevenueChart {
        rows,
        total_premium,
        total_paid_claims,
        total_net: net_revenue(total_premium, total_paid_claims),
    }
}

fn claims_chart(claims: &[Claim], window: &Window, classifier: &Classifier) -> ClaimsChart {
    let admitted = PeriodFilter::distribution(*window).apply(claims, Claim::submitted_at);

    let by_status = distribute(
        admitted.iter().copied(),
        |c| classifier.classify(Record::Claim(c), Dimension::ClaimStatus),
        |c| claim_amount(c),
    );
    let by_type = distribute(
        admitted.iter().copied(),
        |c| classifier.classify(Record::Claim(c), Dimension::ClaimType),
        |c| claim_amount(c),
    );

    let buckets = month_buckets(window);
    let dated = PeriodFilter::time_series(*window).apply(claims, Claim::submitted_at);
    let monthly = claims_monthly(bucketize(
        &buckets,
        dated,
        |c| c.submitted_at(),
        |c| classifier.classify(Record::Claim(c), Dimension::ClaimStatus),
        |c| claim_amount(c),
    ));

    let total = by_status.total_count;
    let approved = admitted.iter().filter(|c| c.status.is_approved()).count() as u64;
    let rejected = admitted
        .iter()
        .filter(|c| c.status == ClaimStatus::Rejected)
        .count() as u64;

    debug!(
        "Claims: {} admitted, {} status categories, {} type categories",
        total,
        by_status.slices.len(),
        by_type.slices.len()
    );

    ClaimsChart {
        by_status: shares(&by_status),
        by_type: shares(&by_type),
        monthly,
        total_claims: total,
        total_amount: sanitize(by_status.total_amount),
        approval_rate: count_rate(approved, total),
        rejection_rate: count_rate(rejected, total),
        average_amount: average(by_status.total_amount, total),
        average_processing_days: average_processing_days(admitted.iter().copied()),
    }
}

fn claims_monthly(series: BucketSeries) -> Vec<ClaimsRow> {
    let approved_label = claim_status_label(&ClaimStatus::Approved);
    let paid_label = claim_status_label(&ClaimStatus::Paid);
    let rejected_label = claim_status_label(&ClaimStatus::Rejected);

    series
        .rows
        .into_iter()
        .map(|row| ClaimsRow {
            submitted: row.count,
            approved: row.count_of(&approved_label) + row.count_of(&paid_label),
            rejected: row.count_of(&rejected_label),
            amount: sanitize(row.amount),
            label: row.bucket.label,
        })
        .collect()
}

fn policy_chart(
    snapshot: &PortalSnapshot,
    window: &Window,
    classifier: &Classifier,
    now: NaiveDateTime,
) -> PolicyChart {
    let admitted =
        PeriodFilter::distribution(*window).apply(&snapshot.policies, |p| p.effective_at());

    let by_type = distribute(
        admitted.iter().copied(),
        |p| classifier.classify(Record::Policy(p), Dimension::PolicyType),
        |p| policy_premium(p),
    );
    let by_status = distribute(
        admitted.iter().copied(),
        |p| classifier.classify(Record::Policy(p), Dimension::PolicyStatus),
        |p| policy_premium(p),
    );
    let schedule = distribute(
        admitted.iter().flat_map(|p| p.payment_schedule.iter()),
        |d| classifier.classify(Record::Due(d), Dimension::DueStatus),
        |d| due_amount(d),
    );

    let active_policies = admitted
        .iter()
        .filter(|p| p.effective_status(now) == PolicyStatus::Active)
        .count() as u64;
    let paid_dues = schedule.count_of(&due_status_label(&DueStatus::Paid));

    PolicyChart {
        by_type: shares(&by_type),
        by_status: shares(&by_status),
        schedule_compliance: count_rate(paid_dues, schedule.total_count),
        schedule: shares(&schedule),
        total_policies: by_type.total_count,
        active_policies,
    }
}

fn customer_growth_chart(
    customers: &[Customer],
    window: &Window,
    classifier: &Classifier,
) -> CustomerGrowthChart {
    let joined = PeriodFilter::time_series(*window).apply(customers, Customer::joined_at);

    // The axis starts at the first join rather than an empty prefix of months.
    let growth_window = joined
        .iter()
        .filter_map(|c| c.joined_at())
        .min()
        .map_or(*window, |first| window.starting_no_earlier_than(first));
    let buckets = month_buckets(&growth_window);

    let series = bucketize(
        &buckets,
        joined.iter().copied(),
        |c| c.joined_at(),
        |_| "new".to_string(),
        |_| 0.0,
    );
    let new_counts = series.counts();
    let totals = cumulative(&new_counts);

    let rows: Vec<GrowthRow> = series
        .labels()
        .into_iter()
        .zip(new_counts.iter().zip(&totals))
        .map(|(label, (&new_customers, &total))| GrowthRow {
            label,
            new_customers,
            total,
        })
        .collect();

    let growth = match new_counts.as_slice() {
        [.., previous, last] => growth_rate(*previous as f64, *last as f64),
        _ => 0.0,
    };

    let admitted = PeriodFilter::distribution(*window).apply(customers, Customer::joined_at);
    let by_status = distribute(
        admitted.iter().copied(),
        |c| classifier.classify(Record::Customer(c), Dimension::CustomerStatus),
        |_| 0.0,
    );
    let active_customers = admitted.iter().filter(|c| c.is_active()).count() as u64;

    debug!(
        "Customers: {} joined in window across {} bucket(s)",
        joined.len(),
        rows.len()
    );

    CustomerGrowthChart {
        rows,
        by_status: shares(&by_status),
        new_customers: joined.len() as u64,
        total_customers: by_status.total_count,
        active_customers,
        growth_rate: growth,
    }
}

/// The instant a payment is placed at: paid ones when settled, the rest
/// when due.
fn payment_timestamp(bucket: PaymentBucket, payment: &Payment) -> Option<NaiveDateTime> {
    match bucket {
        PaymentBucket::Paid => payment.settled_at(),
        PaymentBucket::Upcoming | PaymentBucket::Overdue => payment.due_at(),
    }
}

fn payment_chart(
    snapshot: &PortalSnapshot,
    window: &Window,
    classifier: &Classifier,
) -> PaymentChart {
    let payments = &snapshot.payments;
    let filter = PeriodFilter::distribution(*window);

    // Upcoming payments are not held to the window.
    let tagged: Vec<(PaymentBucket, &Payment)> = filter
        .apply(&payments.paid, |p| {
            payment_timestamp(PaymentBucket::Paid, p)
        })
        .into_iter()
        .map(|p| (PaymentBucket::Paid, p))
        .chain(payments.upcoming.iter().map(|p| (PaymentBucket::Upcoming, p)))
        .chain(
            filter
                .apply(&payments.overdue, |p| {
                    payment_timestamp(PaymentBucket::Overdue, p)
                })
                .into_iter()
                .map(|p| (PaymentBucket::Overdue, p)),
        )
        .collect();

    let by_bucket = distribute(
        tagged.iter(),
        |(bucket, p)| classifier.classify(Record::Payment(*bucket, p), Dimension::PaymentBucket),
        |(_, p)| payment_amount(p),
    );

    let buckets = month_buckets(window);
    let series = bucketize(
        &buckets,
        tagged
            .iter()
            .filter(|(bucket, _)| *bucket != PaymentBucket::Upcoming),
        |(bucket, p)| payment_timestamp(*bucket, p),
        |(bucket, _)| bucket.label().to_string(),
        |(_, p)| payment_amount(p),
    );
    let paid_label = PaymentBucket::Paid.label();
    let overdue_label = PaymentBucket::Overdue.label();
    let monthly = series
        .rows
        .iter()
        .map(|row| PaymentRow {
            label: row.bucket.label.clone(),
            paid: sanitize(row.amount_of(paid_label)),
            overdue: sanitize(row.amount_of(overdue_label)),
        })
        .collect();

    let paid_amount = by_bucket.amount_of(paid_label);
    let overdue_amount = by_bucket.amount_of(overdue_label);

    let (on_time, comparable) = tagged
        .iter()
        .filter(|(bucket, _)| *bucket == PaymentBucket::Paid)
        .filter_map(|(_, p)| Some((p.paid_at()?, p.due_at()?)))
        .fold((0u64, 0u64), |(on_time, total), (paid, due)| {
            (on_time + u64::from(paid.date() <= due.date()), total + 1)
        });

    PaymentChart {
        by_bucket: shares(&by_bucket),
        monthly,
        collection_rate: rate(paid_amount, paid_amount + overdue_amount),
        on_time_rate: count_rate(on_time, comparable),
        overdue_count: by_bucket.count_of(overdue_label),
        overdue_amount: sanitize(overdue_amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::timestamp::RawTimestamp;
    use crate::models::{CustomerStatus, MoneyAmount, PaymentBuckets, Policy, ScheduledDue};
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn claim(id: &str, status: ClaimStatus, date: &str, amount: f64) -> Claim {
        Claim {
            id: id.to_string(),
            status,
            submission_date: Some(RawTimestamp::from(date)),
            approved_amount: Some(amount),
            ..Default::default()
        }
    }

    fn payment(id: &str, due: &str, paid: Option<&str>, amount: f64) -> Payment {
        Payment {
            id: id.to_string(),
            due_date: Some(due.into()),
            paid_date: paid.map(RawTimestamp::from),
            amount: Some(amount),
            ..Default::default()
        }
    }

    fn customer(id: &str, joined: &str, status: Option<CustomerStatus>) -> Customer {
        Customer {
            id: id.to_string(),
            join_date: Some(joined.into()),
            status,
        }
    }

    fn sample_snapshot() -> PortalSnapshot {
        PortalSnapshot {
            claims: vec![
                claim("c1", ClaimStatus::Approved, "2024-01-10", 100.0),
                claim("c2", ClaimStatus::Paid, "2024-02-05", 300.0),
                claim("c3", ClaimStatus::Rejected, "2024-02-20", 50.0),
                claim("c4", ClaimStatus::Pending, "2024-02-25", 80.0),
            ],
            payments: PaymentBuckets {
                paid: vec![
                    payment("p1", "2024-01-05", Some("2024-01-03"), 1000.0),
                    payment("p2", "2024-02-05", Some("2024-02-09"), 1000.0),
                ],
                upcoming: vec![payment("p3", "2024-04-05", None, 1000.0)],
                overdue: vec![payment("p4", "2024-02-15", None, 500.0)],
            },
            policies: vec![
                Policy {
                    id: "pol1".to_string(),
                    product_type: Some("HEALTH".to_string()),
                    effective_date: Some("2024-01-01".into()),
                    expiry_date: Some("2025-01-01".into()),
                    premium_amount: Some(1200.0),
                    payment_schedule: vec![
                        ScheduledDue {
                            status: "PAID".to_string().into(),
                            amount: Some(100.0),
                            ..Default::default()
                        },
                        ScheduledDue {
                            status: "OVERDUE".to_string().into(),
                            due_amount: Some(MoneyAmount {
                                amount: Some(100.0),
                                currency: Some("USD".to_string()),
                            }),
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                },
                Policy {
                    id: "pol2".to_string(),
                    product_type: Some("MOTOR".to_string()),
                    effective_date: Some("2023-01-01".into()),
                    expiry_date: Some("2024-01-01".into()),
                    premium_amount: Some(600.0),
                    ..Default::default()
                },
            ],
            customers: vec![
                customer("u1", "2024-01-15", Some(CustomerStatus::Active)),
                customer("u2", "2024-02-10", Some(CustomerStatus::Inactive)),
            ],
        }
    }

    #[test]
    fn test_chart_from_str() {
        assert_eq!("revenue".parse::<Chart>().unwrap(), Chart::Revenue);
        assert_eq!(" Payments ".parse::<Chart>().unwrap(), Chart::Payments);
        assert!("pie".parse::<Chart>().is_err());
    }

    #[test]
    fn test_claims_status_scenario() {
        let snapshot = PortalSnapshot {
            claims: vec![
                claim("a", ClaimStatus::Approved, "2024-01-01", 100.0),
                claim("b", ClaimStatus::Approved, "2024-01-02", 200.0),
                claim("c", ClaimStatus::Rejected, "2024-01-03", 50.0),
            ],
            ..Default::default()
        };

        let dashboard = recompute(
            &snapshot,
            Period::All,
            at(2024, 3, 1),
            &DashboardOptions::default(),
        );
        let claims = dashboard.claims.unwrap();

        let approved = claims.by_status.iter().find(|s| s.category == "Approved").unwrap();
        let rejected = claims.by_status.iter().find(|s| s.category == "Rejected").unwrap();
        assert_eq!(approved.percentage, 67);
        assert_eq!(approved.amount, 300.0);
        assert_eq!(rejected.percentage, 33);
        assert_eq!(claims.approval_rate, 67.0);
        assert_eq!(dashboard.summary.approval_rate, 67.0);
        assert_eq!(dashboard.summary.rejection_rate, 33.0);
    }

    #[test]
    fn test_customer_growth_scenario() {
        let snapshot = PortalSnapshot {
            customers: vec![
                customer("u1", "2024-01-15", None),
                customer("u2", "2024-02-10", None),
            ],
            ..Default::default()
        };

        let dashboard = recompute(
            &snapshot,
            Period::LastYear,
            at(2024, 3, 1),
            &DashboardOptions::default(),
        );
        let growth = dashboard.customers.unwrap();

        let labels: Vec<_> = growth.rows.iter().map(|r| r.label.as_str()).collect();
        let new: Vec<_> = growth.rows.iter().map(|r| r.new_customers).collect();
        let total: Vec<_> = growth.rows.iter().map(|r| r.total).collect();
        assert_eq!(labels, vec!["Jan 2024", "Feb 2024", "Mar 2024"]);
        assert_eq!(new, vec![1, 1, 0]);
        assert_eq!(total, vec![1, 2, 2]);
        assert_eq!(growth.new_customers, 2);
        assert_eq!(growth.growth_rate, -100.0);
    }

    #[test]
    fn test_payment_due_amount_fallback_scenario() {
        let snapshot = PortalSnapshot {
            payments: PaymentBuckets {
                paid: vec![Payment {
                    id: "p".to_string(),
                    paid_date: Some("2024-02-01".into()),
                    due_amount: Some(MoneyAmount {
                        amount: Some(500.0),
                        currency: None,
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            },
            ..Default::default()
        };

        let dashboard = recompute(
            &snapshot,
            Period::Last90Days,
            at(2024, 3, 1),
            &DashboardOptions::default(),
        );
        assert_eq!(dashboard.summary.total_revenue, 500.0);
        let payments = dashboard.payments.unwrap();
        assert_eq!(payments.by_bucket[0].amount, 500.0);
    }

    #[test]
    fn test_unparsable_claim_date_scenario() {
        let mut snapshot = sample_snapshot();
        snapshot.claims.push(Claim {
            id: "bad".to_string(),
            status: ClaimStatus::Paid,
            submission_date: Some("yesterday-ish".into()),
            approved_amount: Some(9999.0),
            ..Default::default()
        });

        let dashboard = recompute(
            &snapshot,
            Period::All,
            at(2024, 3, 1),
            &DashboardOptions::default(),
        );

        // Only c2 contributes to paid claims on the time axis.
        assert_eq!(dashboard.revenue.as_ref().unwrap().total_paid_claims, 300.0);

        let claims = dashboard.claims.unwrap();
        assert_eq!(claims.total_claims, 5);
        let paid = claims.by_status.iter().find(|s| s.category == "Paid").unwrap();
        assert_eq!(paid.count, 2);
        let monthly_total: u64 = claims.monthly.iter().map(|r| r.submitted).sum();
        assert_eq!(monthly_total, 4);
    }

    #[test]
    fn test_revenue_rows() {
        let dashboard = recompute(
            &sample_snapshot(),
            Period::Last90Days,
            at(2024, 3, 1),
            &DashboardOptions::default(),
        );
        let revenue = dashboard.revenue.unwrap();

        let labels: Vec<_> = revenue.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Dec 2023", "Jan 2024", "Feb 2024", "Mar 2024"]);
        assert_eq!(revenue.rows[1].premium_revenue, 1000.0);
        assert_eq!(revenue.rows[2].premium_revenue, 1000.0);
        assert_eq!(revenue.rows[2].paid_claims, 300.0);
        assert_eq!(revenue.rows[2].net_revenue, 700.0);
        assert_eq!(revenue.total_net, 1700.0);
    }

    #[test]
    fn test_payment_metrics() {
        let dashboard = recompute(
            &sample_snapshot(),
            Period::Last90Days,
            at(2024, 3, 1),
            &DashboardOptions::default(),
        );
        let payments = dashboard.payments.unwrap();

        // 2000 paid of 2500 collectable.
        assert_eq!(payments.collection_rate, 80.0);
        // p1 early, p2 late.
        assert_eq!(payments.on_time_rate, 50.0);
        assert_eq!(payments.overdue_count, 1);
        assert_eq!(payments.overdue_amount, 500.0);

        let upcoming = payments.by_bucket.iter().find(|s| s.category == "Upcoming").unwrap();
        assert_eq!(upcoming.count, 1);

        let feb = payments.monthly.iter().find(|r| r.label == "Feb 2024").unwrap();
        assert_eq!(feb.paid, 1000.0);
        assert_eq!(feb.overdue, 500.0);
    }

    #[test]
    fn test_late_payment_lands_in_month_it_was_paid() {
        let snapshot = PortalSnapshot {
            payments: PaymentBuckets {
                paid: vec![payment("p1", "2023-11-05", Some("2024-02-09"), 1000.0)],
                overdue: vec![payment("p2", "2024-01-20", None, 250.0)],
                ..Default::default()
            },
            ..Default::default()
        };

        let dashboard = recompute(
            &snapshot,
            Period::Last90Days,
            at(2024, 3, 1),
            &DashboardOptions::default(),
        );
        let payments = dashboard.payments.unwrap();

        let paid = payments.by_bucket.iter().find(|s| s.category == "Paid").unwrap();
        let monthly_paid: f64 = payments.monthly.iter().map(|r| r.paid).sum();
        let monthly_overdue: f64 = payments.monthly.iter().map(|r| r.overdue).sum();
        assert_eq!(paid.amount, 1000.0);
        assert_eq!(monthly_paid, paid.amount);
        assert_eq!(monthly_overdue, payments.overdue_amount);

        let feb = payments.monthly.iter().find(|r| r.label == "Feb 2024").unwrap();
        assert_eq!(feb.paid, 1000.0);
        assert_eq!(payments.on_time_rate, 0.0);
    }

    #[test]
    fn test_policy_metrics() {
        let dashboard = recompute(
            &sample_snapshot(),
            Period::All,
            at(2024, 3, 1),
            &DashboardOptions::default(),
        );
        let policies = dashboard.policies.unwrap();

        assert_eq!(policies.total_policies, 2);
        assert_eq!(policies.active_policies, 1);
        assert_eq!(policies.schedule_compliance, 50.0);

        let health = policies
            .by_type
            .iter()
            .find(|s| s.category == "Health Insurance")
            .unwrap();
        assert_eq!(health.amount, 1200.0);
        let expired = policies.by_status.iter().find(|s| s.category == "Expired").unwrap();
        assert_eq!(expired.count, 1);
    }

    #[test]
    fn test_empty_snapshot_is_all_zero() {
        let dashboard = recompute(
            &PortalSnapshot::default(),
            Period::Last30Days,
            at(2024, 3, 1),
            &DashboardOptions::default(),
        );

        assert_eq!(dashboard.summary, MetricSummary::default());
        let claims = dashboard.claims.unwrap();
        assert!(claims.by_status.is_empty());
        assert!(claims.monthly.iter().all(|r| r.submitted == 0));
        let customers = dashboard.customers.unwrap();
        assert!(customers.rows.iter().all(|r| r.total == 0));
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let snapshot = sample_snapshot();
        let options = DashboardOptions::default();
        let first = recompute(&snapshot, Period::All, at(2024, 3, 1), &options);
        let second = recompute(&snapshot, Period::All, at(2024, 3, 1), &options);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_options_select_charts() {
        let options = DashboardOptions {
            charts: vec![Chart::Claims],
        };
        let dashboard = recompute(&sample_snapshot(), Period::All, at(2024, 3, 1), &options);

        assert!(dashboard.claims.is_some());
        assert!(dashboard.revenue.is_none());
        assert!(dashboard.payments.is_none());
        // The summary is always complete.
        assert_eq!(dashboard.summary.total_revenue, 2000.0);
    }

    #[test]
    fn test_rates_stay_in_range() {
        for period in [
            Period::Last7Days,
            Period::Last30Days,
            Period::Last90Days,
            Period::LastYear,
            Period::All,
        ] {
            let summary = recompute(
                &sample_snapshot(),
                period,
                at(2024, 3, 1),
                &DashboardOptions::default(),
            )
            .summary;

            for value in [
                summary.approval_rate,
                summary.rejection_rate,
                summary.collection_rate,
                summary.on_time_rate,
            ] {
                assert!((0.0..=100.0).contains(&value), "{} out of range", value);
            }
        }
    }
}
