//! Input record models.
//!
//! These mirror the JSON returned by the portal's REST layer. Every field
//! other than the identifier is optional on the wire; missing values are
//! resolved later by the classifier and amount resolvers rather than
//! rejected here.

use crate::analysis::timestamp::{normalize_opt, RawTimestamp};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Upper-cases a raw code and folds spaces and hyphens into underscores.
fn canonical_code(raw: &str) -> String {
    raw.trim().to_uppercase().replace([' ', '-'], "_")
}

/// Reads an explicit `null` the same way as an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Lifecycle state of a claim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum ClaimStatus {
    Pending,
    UnderReview,
    Approved,
    Paid,
    Rejected,
    Cancelled,
    Expired,
    /// A code outside the known set, kept verbatim.
    Other(String),
}

impl Default for ClaimStatus {
    fn default() -> Self {
        ClaimStatus::Other(String::new())
    }
}

impl ClaimStatus {
    /// Whether the claim counts towards the approval rate.
    pub fn is_approved(&self) -> bool {
        matches!(self, ClaimStatus::Approved | ClaimStatus::Paid)
    }

    /// The raw wire code.
    pub fn code(&self) -> &str {
        match self {
            ClaimStatus::Pending => "PENDING",
            ClaimStatus::UnderReview => "UNDER_REVIEW",
            ClaimStatus::Approved => "APPROVED",
            ClaimStatus::Paid => "PAID",
            ClaimStatus::Rejected => "REJECTED",
            ClaimStatus::Cancelled => "CANCELLED",
            ClaimStatus::Expired => "EXPIRED",
            ClaimStatus::Other(raw) => raw,
        }
    }
}

impl From<&str> for ClaimStatus {
    fn from(s: &str) -> Self {
        match canonical_code(s).as_str() {
            "PENDING" => ClaimStatus::Pending,
            "UNDER_REVIEW" | "IN_REVIEW" => ClaimStatus::UnderReview,
            "APPROVED" => ClaimStatus::Approved,
            "PAID" => ClaimStatus::Paid,
            "REJECTED" | "DENIED" => ClaimStatus::Rejected,
            "CANCELLED" | "CANCELED" => ClaimStatus::Cancelled,
            "EXPIRED" => ClaimStatus::Expired,
            _ => ClaimStatus::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for ClaimStatus {
    fn from(s: String) -> Self {
        ClaimStatus::from(s.as_str())
    }
}

/// `null` on the wire is an unknown status, not an error.
impl From<Option<String>> for ClaimStatus {
    fn from(s: Option<String>) -> Self {
        ClaimStatus::from(s.unwrap_or_default())
    }
}

impl From<ClaimStatus> for String {
    fn from(status: ClaimStatus) -> Self {
        status.code().to_string()
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Lifecycle state of a policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum PolicyStatus {
    Active,
    Inactive,
    Pending,
    Expired,
    Cancelled,
    Other(String),
}

impl PolicyStatus {
    pub fn code(&self) -> &str {
        match self {
            PolicyStatus::Active => "ACTIVE",
            PolicyStatus::Inactive => "INACTIVE",
            PolicyStatus::Pending => "PENDING",
            PolicyStatus::Expired => "EXPIRED",
            PolicyStatus::Cancelled => "CANCELLED",
            PolicyStatus::Other(raw) => raw,
        }
    }
}

impl From<&str> for PolicyStatus {
    fn from(s: &str) -> Self {
        match canonical_code(s).as_str() {
            "ACTIVE" => PolicyStatus::Active,
            "INACTIVE" | "LAPSED" => PolicyStatus::Inactive,
            "PENDING" => PolicyStatus::Pending,
            "EXPIRED" => PolicyStatus::Expired,
            "CANCELLED" | "CANCELED" => PolicyStatus::Cancelled,
            _ => PolicyStatus::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for PolicyStatus {
    fn from(s: String) -> Self {
        PolicyStatus::from(s.as_str())
    }
}

impl From<Option<String>> for PolicyStatus {
    fn from(s: Option<String>) -> Self {
        PolicyStatus::from(s.unwrap_or_default())
    }
}

impl From<PolicyStatus> for String {
    fn from(status: PolicyStatus) -> Self {
        status.code().to_string()
    }
}

/// State of one scheduled premium due inside a policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum DueStatus {
    Paid,
    Pending,
    Upcoming,
    Overdue,
    Other(String),
}

impl Default for DueStatus {
    fn default() -> Self {
        DueStatus::Other(String::new())
    }
}

impl DueStatus {
    pub fn code(&self) -> &str {
        match self {
            DueStatus::Paid => "PAID",
            DueStatus::Pending => "PENDING",
            DueStatus::Upcoming => "UPCOMING",
            DueStatus::Overdue => "OVERDUE",
            DueStatus::Other(raw) => raw,
        }
    }
}

impl From<&str> for DueStatus {
    fn from(s: &str) -> Self {
        match canonical_code(s).as_str() {
            "PAID" | "COMPLETED" => DueStatus::Paid,
            "PENDING" | "DUE" => DueStatus::Pending,
            "UPCOMING" | "SCHEDULED" => DueStatus::Upcoming,
            "OVERDUE" | "LATE" => DueStatus::Overdue,
            _ => DueStatus::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for DueStatus {
    fn from(s: String) -> Self {
        DueStatus::from(s.as_str())
    }
}

impl From<Option<String>> for DueStatus {
    fn from(s: Option<String>) -> Self {
        DueStatus::from(s.unwrap_or_default())
    }
}

impl From<DueStatus> for String {
    fn from(status: DueStatus) -> Self {
        status.code().to_string()
    }
}

/// Account state of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum CustomerStatus {
    Active,
    Inactive,
    Other(String),
}

impl CustomerStatus {
    pub fn code(&self) -> &str {
        match self {
            CustomerStatus::Active => "ACTIVE",
            CustomerStatus::Inactive => "INACTIVE",
            CustomerStatus::Other(raw) => raw,
        }
    }
}

impl From<&str> for CustomerStatus {
    fn from(s: &str) -> Self {
        match canonical_code(s).as_str() {
            "ACTIVE" => CustomerStatus::Active,
            "INACTIVE" | "DISABLED" | "SUSPENDED" => CustomerStatus::Inactive,
            _ => CustomerStatus::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for CustomerStatus {
    fn from(s: String) -> Self {
        CustomerStatus::from(s.as_str())
    }
}

impl From<Option<String>> for CustomerStatus {
    fn from(s: Option<String>) -> Self {
        CustomerStatus::from(s.unwrap_or_default())
    }
}

impl From<CustomerStatus> for String {
    fn from(status: CustomerStatus) -> Self {
        status.code().to_string()
    }
}

/// A nested `{ amount, currency }` value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoneyAmount {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// An insurance claim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: String,
    #[serde(default)]
    pub status: ClaimStatus,
    #[serde(default)]
    pub claim_type: Option<String>,
    #[serde(default)]
    pub submission_date: Option<RawTimestamp>,
    #[serde(default)]
    pub approved_amount: Option<f64>,
    #[serde(default, alias = "claimedAmount")]
    pub claim_amount: Option<f64>,
    #[serde(default)]
    pub processing_days: Option<f64>,
    #[serde(default)]
    pub is_processed: Option<bool>,
}

impl Claim {
    /// Normalized submission instant.
    pub fn submitted_at(&self) -> Option<NaiveDateTime> {
        normalize_opt(self.submission_date.as_ref())
    }
}

/// A premium payment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    #[serde(default)]
    pub due_date: Option<RawTimestamp>,
    #[serde(default)]
    pub paid_date: Option<RawTimestamp>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub due_amount: Option<MoneyAmount>,
    #[serde(default)]
    pub paid_amount: Option<MoneyAmount>,
}

impl Payment {
    pub fn due_at(&self) -> Option<NaiveDateTime> {
        normalize_opt(self.due_date.as_ref())
    }

    pub fn paid_at(&self) -> Option<NaiveDateTime> {
        normalize_opt(self.paid_date.as_ref())
    }

    /// When the money arrived, falling back to when it was due.
    pub fn settled_at(&self) -> Option<NaiveDateTime> {
        self.paid_at().or_else(|| self.due_at())
    }
}

/// Payments pre-partitioned by the retrieval layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentBuckets {
    #[serde(default, deserialize_with = "null_as_default")]
    pub paid: Vec<Payment>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub upcoming: Vec<Payment>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overdue: Vec<Payment>,
}

impl PaymentBuckets {
    /// Total number of payments across all three collections.
    pub fn len(&self) -> usize {
        self.paid.len() + self.upcoming.len() + self.overdue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One scheduled due inside a policy's payment schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledDue {
    #[serde(default)]
    pub due_date: Option<RawTimestamp>,
    #[serde(default)]
    pub status: DueStatus,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub due_amount: Option<MoneyAmount>,
}

impl ScheduledDue {
    pub fn due_at(&self) -> Option<NaiveDateTime> {
        normalize_opt(self.due_date.as_ref())
    }
}

/// An insurance policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    #[serde(default, alias = "policyType")]
    pub product_type: Option<String>,
    #[serde(default)]
    pub status: Option<PolicyStatus>,
    #[serde(default, alias = "startDate")]
    pub effective_date: Option<RawTimestamp>,
    #[serde(default, alias = "endDate")]
    pub expiry_date: Option<RawTimestamp>,
    #[serde(default)]
    pub premium_amount: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_schedule: Vec<ScheduledDue>,
}

impl Policy {
    pub fn effective_at(&self) -> Option<NaiveDateTime> {
        normalize_opt(self.effective_date.as_ref())
    }

    pub fn expires_at(&self) -> Option<NaiveDateTime> {
        normalize_opt(self.expiry_date.as_ref())
    }

    /// Explicit status, or one inferred from the policy dates.
    ///
    /// A policy with neither a status nor any valid date is reported as
    /// `Other("")`, which the classifier labels `Unknown`.
    pub fn effective_status(&self, now: NaiveDateTime) -> PolicyStatus {
        if let Some(status) = &self.status {
            return status.clone();
        }

        let effective = self.effective_at();
        let expiry = self.expires_at();

        match (effective, expiry) {
            (_, Some(end)) if end < now => PolicyStatus::Expired,
            (Some(start), _) if start > now => PolicyStatus::Pending,
            (None, None) => PolicyStatus::Other(String::new()),
            _ => PolicyStatus::Active,
        }
    }
}

/// A portal customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    #[serde(default, alias = "createdAt")]
    pub join_date: Option<RawTimestamp>,
    #[serde(default)]
    pub status: Option<CustomerStatus>,
}

impl Customer {
    pub fn joined_at(&self) -> Option<NaiveDateTime> {
        normalize_opt(self.join_date.as_ref())
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, Some(CustomerStatus::Active))
    }
}

/// Everything one dashboard recomputation consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortalSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub claims: Vec<Claim>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payments: PaymentBuckets,
    #[serde(default, deserialize_with = "null_as_default")]
    pub policies: Vec<Policy>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customers: Vec<Customer>,
}

impl PortalSnapshot {
    /// Number of records of every kind.
    pub fn record_count(&self) -> usize {
        self.claims.len() + self.payments.len() + self.policies.len() + self.customers.len()
    }
}
