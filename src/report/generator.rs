//! Markdown and JSON report generation.
//!
//! This module renders a computed [`Dashboard`] as a Markdown document
//! (tables per chart) or as pretty-printed JSON.

use crate::analysis::metrics::{top_shares, Share};
use crate::config::ReportConfig;
use crate::dashboard::{
    ClaimsChart, CustomerGrowthChart, Dashboard, MetricSummary, PaymentChart, PolicyChart,
    RevenueChart,
};
use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::Path;

/// Metadata about the report run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Snapshot file the records came from.
    pub source: String,
    /// Reference instant the period was resolved against.
    pub reference_time: NaiveDateTime,
    /// Total records in the snapshot.
    pub records: usize,
}

/// A dashboard plus the context it was computed in.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub dashboard: Dashboard,
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, config: &ReportConfig) -> String {
    let dashboard = &report.dashboard;
    let mut output = String::new();

    output.push_str("# Portal Analytics Dashboard\n\n");
    output.push_str(&generate_metadata_section(report));
    output.push_str(&generate_table_of_contents(dashboard));
    output.push_str(&generate_summary_section(&dashboard.summary));

    if let Some(ref revenue) = dashboard.revenue {
        output.push_str(&generate_revenue_section(revenue, config));
    }
    if let Some(ref claims) = dashboard.claims {
        output.push_str(&generate_claims_section(claims, config));
    }
    if let Some(ref policies) = dashboard.policies {
        output.push_str(&generate_policies_section(policies, config));
    }
    if let Some(ref customers) = dashboard.customers {
        output.push_str(&generate_customers_section(customers, config));
    }
    if let Some(ref payments) = dashboard.payments {
        output.push_str(&generate_payments_section(payments, config));
    }

    output.push_str(&generate_footer());

    output
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

/// Generate the metadata section.
fn generate_metadata_section(report: &Report) -> String {
    let dashboard = &report.dashboard;
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", report.metadata.source));
    section.push_str(&format!(
        "- **Period:** {} (`{}`)\n",
        dashboard.period.describe(),
        dashboard.period
    ));
    section.push_str(&format!(
        "- **Window:** {} to {}\n",
        dashboard.window.start.format("%Y-%m-%d %H:%M"),
        dashboard.window.end.format("%Y-%m-%d %H:%M")
    ));
    section.push_str(&format!(
        "- **Reference Time:** {}\n",
        report.metadata.reference_time.format("%Y-%m-%d %H:%M:%S")
    ));
    section.push_str(&format!("- **Records:** {}\n", report.metadata.records));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(dashboard: &Dashboard) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Key Metrics](#key-metrics)\n");

    let sections = [
        (dashboard.revenue.is_some(), "Revenue", "revenue"),
        (dashboard.claims.is_some(), "Claims", "claims"),
        (dashboard.policies.is_some(), "Policies", "policies"),
        (dashboard.customers.is_some(), "Customer Growth", "customer-growth"),
        (dashboard.payments.is_some(), "Payments", "payments"),
    ];
    for (present, title, anchor) in sections {
        if present {
            toc.push_str(&format!("- [{}](#{})\n", title, anchor));
        }
    }

    toc.push('\n');

    toc
}

/// Generate the key metrics section.
fn generate_summary_section(summary: &MetricSummary) -> String {
    let mut section = String::new();

    section.push_str("## Key Metrics\n\n");
    section.push_str("| Metric | Value |\n");
    section.push_str("|:---|---:|\n");

    let rows = [
        ("Premium Revenue", money(summary.total_revenue)),
        ("Paid Claims", money(summary.total_paid_claims)),
        ("Net Revenue", money(summary.net_revenue)),
        ("Total Claims", summary.total_claims.to_string()),
        ("Approval Rate", format!("{}%", summary.approval_rate)),
        ("Rejection Rate", format!("{}%", summary.rejection_rate)),
        ("Average Claim", money(summary.average_claim_amount)),
        (
            "Avg. Processing Days",
            format!("{:.1}", summary.average_processing_days),
        ),
        ("Collection Rate", format!("{}%", summary.collection_rate)),
        ("On-time Rate", format!("{}%", summary.on_time_rate)),
        ("Overdue Payments", summary.overdue_payments.to_string()),
        ("Policies", summary.total_policies.to_string()),
        ("Active Policies", summary.active_policies.to_string()),
        ("Customers", summary.total_customers.to_string()),
        ("Active Customers", summary.active_customers.to_string()),
        ("New Customers", summary.new_customers.to_string()),
        (
            "Customer Growth",
            format!("{:+.1}%", summary.customer_growth_rate),
        ),
    ];

    for (name, value) in rows {
        section.push_str(&format!("| {} | {} |\n", name, value));
    }
    section.push('\n');

    section
}

/// Render a distribution as a table, largest categories first.
fn generate_share_table(title: &str, shares: &[Share], max_categories: usize) -> String {
    let mut table = String::new();

    table.push_str(&format!("### {}\n\n", title));

    if shares.is_empty() {
        table.push_str("No records in this period.\n\n");
        return table;
    }

    table.push_str("| Category | Count | Amount | Share |\n");
    table.push_str("|:---|:---:|---:|---:|\n");

    for share in top_shares(shares, max_categories) {
        table.push_str(&format!(
            "| {} | {} | {} | {}% |\n",
            share.category,
            share.count,
            money(share.amount),
            share.percentage
        ));
    }
    table.push('\n');

    table
}

/// Generate the revenue section.
fn generate_revenue_section(revenue: &RevenueChart, config: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str("## Revenue\n\n");
    section.push_str(&format!(
        "*Premium: {} | Paid claims: {} | Net: {}*\n\n",
        money(revenue.total_premium),
        money(revenue.total_paid_claims),
        money(revenue.total_net)
    ));

    if config.include_series {
        section.push_str("| Month | Premium | Paid Claims | Net |\n");
        section.push_str("|:---|---:|---:|---:|\n");
        for row in &revenue.rows {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                row.label,
                money(row.premium_revenue),
                money(row.paid_claims),
                money(row.net_revenue)
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the claims section.
fn generate_claims_section(claims: &ClaimsChart, config: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str("## Claims\n\n");
    section.push_str(&format!(
        "*Claims: {} | Approval: {}% | Rejection: {}% | Avg. amount: {}*\n\n",
        claims.total_claims,
        claims.approval_rate,
        claims.rejection_rate,
        money(claims.average_amount)
    ));

    section.push_str(&generate_share_table(
        "By Status",
        &claims.by_status,
        config.max_categories,
    ));
    section.push_str(&generate_share_table(
        "By Type",
        &claims.by_type,
        config.max_categories,
    ));

    if config.include_series {
        section.push_str("### Monthly\n\n");
        section.push_str("| Month | Submitted | Approved | Rejected | Amount |\n");
        section.push_str("|:---|:---:|:---:|:---:|---:|\n");
        for row in &claims.monthly {
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                row.label,
                row.submitted,
                row.approved,
                row.rejected,
                money(row.amount)
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the policies section.
fn generate_policies_section(policies: &PolicyChart, config: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str("## Policies\n\n");
    section.push_str(&format!(
        "*Policies: {} | Active: {} | Schedule compliance: {}%*\n\n",
        policies.total_policies, policies.active_policies, policies.schedule_compliance
    ));

    section.push_str(&generate_share_table(
        "By Product Type",
        &policies.by_type,
        config.max_categories,
    ));
    section.push_str(&generate_share_table(
        "By Status",
        &policies.by_status,
        config.max_categories,
    ));
    section.push_str(&generate_share_table(
        "Payment Schedule",
        &policies.schedule,
        config.max_categories,
    ));

    section
}

/// Generate the customer growth section.
fn generate_customers_section(customers: &CustomerGrowthChart, config: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str("## Customer Growth\n\n");
    section.push_str(&format!(
        "*New: {} | Active: {} of {} | Growth: {:+.1}%*\n\n",
        customers.new_customers,
        customers.active_customers,
        customers.total_customers,
        customers.growth_rate
    ));

    if config.include_series {
        section.push_str("| Month | New Customers | Total |\n");
        section.push_str("|:---|:---:|:---:|\n");
        for row in &customers.rows {
            section.push_str(&format!(
                "| {} | {} | {} |\n",
                row.label, row.new_customers, row.total
            ));
        }
        section.push('\n');
    }

    section.push_str(&generate_share_table(
        "By Status",
        &customers.by_status,
        config.max_categories,
    ));

    section
}

/// Generate the payments section.
fn generate_payments_section(payments: &PaymentChart, config: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str("## Payments\n\n");
    section.push_str(&format!(
        "*Collection: {}% | On-time: {}% | Overdue: {} ({})*\n\n",
        payments.collection_rate,
        payments.on_time_rate,
        payments.overdue_count,
        money(payments.overdue_amount)
    ));

    section.push_str(&generate_share_table(
        "By Status",
        &payments.by_bucket,
        config.max_categories,
    ));

    if config.include_series {
        section.push_str("### Monthly (by due date)\n\n");
        section.push_str("| Month | Paid | Overdue |\n");
        section.push_str("|:---|---:|---:|\n");
        for row in &payments.monthly {
            section.push_str(&format!(
                "| {} | {} | {} |\n",
                row.label,
                money(row.paid),
                money(row.overdue)
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by portal-analytics v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file, or to stdout for `-`.
pub fn write_output(content: &str, path: &Path) -> Result<()> {
    if path == Path::new("-") {
        print!("{}", content);
        return Ok(());
    }

    std::fs::write(path, content)?;
    Ok(())
}
