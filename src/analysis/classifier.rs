//! Record classification.
//!
//! Maps raw status and type codes to display categories. Known codes go
//! through fixed lookup tables; anything else is turned into a readable
//! label so that no record ever falls out of a category total.

use crate::analysis::aggregator::OTHER_LABEL;
use crate::models::{
    Claim, ClaimStatus, Customer, CustomerStatus, DueStatus, Payment, Policy, PolicyStatus,
    ScheduledDue,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Label used when a raw value is missing or blank.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// What a raw `OTHER` code is shown as, since [`OTHER_LABEL`] is reserved
/// for folded slices.
pub const REPORTED_OTHER_LABEL: &str = "Other (raw)";

/// The categorical axis a chart groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    ClaimStatus,
    ClaimType,
    PolicyType,
    PolicyStatus,
    PaymentBucket,
    DueStatus,
    CustomerStatus,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::ClaimStatus => "claim status",
            Dimension::ClaimType => "claim type",
            Dimension::PolicyType => "policy type",
            Dimension::PolicyStatus => "policy status",
            Dimension::PaymentBucket => "payment bucket",
            Dimension::DueStatus => "due status",
            Dimension::CustomerStatus => "customer status",
        };
        write!(f, "{}", name)
    }
}

/// Which pre-partitioned collection a payment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentBucket {
    Paid,
    Upcoming,
    Overdue,
}

impl PaymentBucket {
    pub const ALL: [PaymentBucket; 3] = [
        PaymentBucket::Paid,
        PaymentBucket::Upcoming,
        PaymentBucket::Overdue,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PaymentBucket::Paid => "Paid",
            PaymentBucket::Upcoming => "Upcoming",
            PaymentBucket::Overdue => "Overdue",
        }
    }
}

const CLAIM_TYPE_LABELS: &[(&str, &str)] = &[
    ("HOSPITALIZATION", "Hospitalization"),
    ("INPATIENT", "Hospitalization"),
    ("OPD", "Outpatient"),
    ("OUTPATIENT", "Outpatient"),
    ("ACCIDENT", "Accident"),
    ("ACCIDENTAL_DAMAGE", "Accident"),
    ("DEATH", "Death Benefit"),
    ("LIFE", "Death Benefit"),
    ("DENTAL", "Dental"),
    ("VISION", "Vision"),
    ("MATERNITY", "Maternity"),
    ("CRITICAL_ILLNESS", "Critical Illness"),
    ("THEFT", "Theft"),
    ("FIRE", "Fire Damage"),
    ("NATURAL_DISASTER", "Natural Disaster"),
    ("TRAVEL", "Travel"),
    ("MEDICAL", "Medical"),
];

const POLICY_TYPE_LABELS: &[(&str, &str)] = &[
    ("HEALTH", "Health Insurance"),
    ("HEALTH_INSURANCE", "Health Insurance"),
    ("LIFE", "Life Insurance"),
    ("LIFE_INSURANCE", "Life Insurance"),
    ("MOTOR", "Motor Insurance"),
    ("AUTO", "Motor Insurance"),
    ("VEHICLE", "Motor Insurance"),
    ("HOME", "Home Insurance"),
    ("PROPERTY", "Home Insurance"),
    ("TRAVEL", "Travel Insurance"),
    ("TERM", "Term Life"),
    ("TERM_LIFE", "Term Life"),
];

fn lookup(table: &[(&str, &'static str)], raw: &str) -> Option<&'static str> {
    let code = raw.trim().to_uppercase().replace([' ', '-'], "_");
    table
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, label)| *label)
}

/// Fallback label: `"CRITICAL_CARE"` becomes `"Critical Care"`.
///
/// Blank input becomes [`UNKNOWN_LABEL`].
pub fn title_case_label(raw: &str) -> String {
    let words: Vec<String> = raw
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect();

    let label = words.join(" ");
    if label.is_empty() {
        UNKNOWN_LABEL.to_string()
    } else if label == OTHER_LABEL {
        REPORTED_OTHER_LABEL.to_string()
    } else {
        label
    }
}

pub fn claim_status_label(status: &ClaimStatus) -> String {
    match status {
        ClaimStatus::Pending => "Pending".to_string(),
        ClaimStatus::UnderReview => "Under Review".to_string(),
        ClaimStatus::Approved => "Approved".to_string(),
        ClaimStatus::Paid => "Paid".to_string(),
        ClaimStatus::Rejected => "Rejected".to_string(),
        ClaimStatus::Cancelled => "Cancelled".to_string(),
        ClaimStatus::Expired => "Expired".to_string(),
        ClaimStatus::Other(raw) => title_case_label(raw),
    }
}

pub fn claim_type_label(claim_type: Option<&str>) -> String {
    let raw = claim_type.unwrap_or_default();
    lookup(CLAIM_TYPE_LABELS, raw)
        .map(str::to_string)
        .unwrap_or_else(|| title_case_label(raw))
}

pub fn policy_type_label(product_type: Option<&str>) -> String {
    let raw = product_type.unwrap_or_default();
    lookup(POLICY_TYPE_LABELS, raw)
        .map(str::to_string)
        .unwrap_or_else(|| title_case_label(raw))
}

pub fn policy_status_label(status: &PolicyStatus) -> String {
    match status {
        PolicyStatus::Active => "Active".to_string(),
        PolicyStatus::Inactive => "Inactive".to_string(),
        PolicyStatus::Pending => "Pending".to_string(),
        PolicyStatus::Expired => "Expired".to_string(),
        PolicyStatus::Cancelled => "Cancelled".to_string(),
        PolicyStatus::Other(raw) => title_case_label(raw),
    }
}

pub fn due_status_label(status: &DueStatus) -> String {
    match status {
        DueStatus::Paid => "Paid".to_string(),
        DueStatus::Pending => "Pending".to_string(),
        DueStatus::Upcoming => "Upcoming".to_string(),
        DueStatus::Overdue => "Overdue".to_string(),
        DueStatus::Other(raw) => title_case_label(raw),
    }
}

/// Customers without a status are reported as `Unknown`, not `Active`.
pub fn customer_status_label(customer: &Customer) -> String {
    match &customer.status {
        Some(CustomerStatus::Active) => "Active".to_string(),
        Some(CustomerStatus::Inactive) => "Inactive".to_string(),
        Some(CustomerStatus::Other(raw)) => title_case_label(raw),
        None => UNKNOWN_LABEL.to_string(),
    }
}

/// A borrowed record of any kind, as seen by the [`Classifier`].
#[derive(Debug, Clone, Copy)]
pub enum Record<'a> {
    Claim(&'a Claim),
    Policy(&'a Policy),
    Due(&'a ScheduledDue),
    /// A payment tagged with the collection it was delivered in.
    Payment(PaymentBucket, &'a Payment),
    Customer(&'a Customer),
}

impl Record<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Record::Claim(_) => "claim",
            Record::Policy(_) => "policy",
            Record::Due(_) => "scheduled due",
            Record::Payment(..) => "payment",
            Record::Customer(_) => "customer",
        }
    }
}

/// Labels records along a [`Dimension`].
///
/// Policy status depends on the reference instant when a policy carries
/// no explicit status, so the classifier is bound to one.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    now: NaiveDateTime,
}

impl Classifier {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// Display category of `record` along `dimension`.
    ///
    /// A dimension the record does not carry yields [`UNKNOWN_LABEL`].
    pub fn classify(&self, record: Record<'_>, dimension: Dimension) -> String {
        match (record, dimension) {
            (Record::Claim(claim), Dimension::ClaimStatus) => claim_status_label(&claim.status),
            (Record::Claim(claim), Dimension::ClaimType) => {
                claim_type_label(claim.claim_type.as_deref())
            }
            (Record::Policy(policy), Dimension::PolicyType) => {
                policy_type_label(policy.product_type.as_deref())
            }
            (Record::Policy(policy), Dimension::PolicyStatus) => {
                policy_status_label(&policy.effective_status(self.now))
            }
            (Record::Due(due), Dimension::DueStatus) => due_status_label(&due.status),
            (Record::Payment(bucket, _), Dimension::PaymentBucket) => bucket.label().to_string(),
            (Record::Customer(customer), Dimension::CustomerStatus) => {
                customer_status_label(customer)
            }
            (record, dimension) => {
                debug!("A {} has no {}", record.kind(), dimension);
                UNKNOWN_LABEL.to_string()
            }
        }
    }
}

/// Chart palette. Order is part of the output contract.
pub const PALETTE: [&str; 10] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#06b6d4", "#ec4899", "#84cc16",
    "#f97316", "#6366f1",
];

/// 32-bit string hash: `h = c + (h << 5) - h`, wrapping.
fn stable_hash(label: &str) -> i32 {
    label.chars().fold(0i32, |hash, c| {
        (c as i32)
            .wrapping_add(hash.wrapping_shl(5))
            .wrapping_sub(hash)
    })
}

/// Deterministic colour key for a category label.
pub fn category_color(label: &str) -> &'static str {
    let index = stable_hash(label).unsigned_abs() as usize % PALETTE.len();
    PALETTE[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case_label() {
        assert_eq!(title_case_label("CRITICAL_CARE"), "Critical Care");
        assert_eq!(title_case_label("under-review"), "Under Review");
        assert_eq!(title_case_label("  mixed_Case  value "), "Mixed Case Value");
        assert_eq!(title_case_label(""), UNKNOWN_LABEL);
        assert_eq!(title_case_label("___"), UNKNOWN_LABEL);
    }

    #[test]
    fn test_raw_other_code_does_not_collide_with_fold() {
        assert_eq!(title_case_label("OTHER"), REPORTED_OTHER_LABEL);
        assert_eq!(title_case_label(" other "), REPORTED_OTHER_LABEL);
        assert_eq!(claim_type_label(Some("OTHER")), REPORTED_OTHER_LABEL);
        assert_eq!(title_case_label("OTHER_PARTY"), "Other Party");
    }

    #[test]
    fn test_classify_by_dimension() {
        let now = NaiveDateTime::default();
        let classifier = Classifier::new(now);

        let claim = Claim {
            id: "c".to_string(),
            status: ClaimStatus::UnderReview,
            claim_type: Some("OPD".to_string()),
            ..Default::default()
        };
        assert_eq!(
            classifier.classify(Record::Claim(&claim), Dimension::ClaimStatus),
            "Under Review"
        );
        assert_eq!(
            classifier.classify(Record::Claim(&claim), Dimension::ClaimType),
            "Outpatient"
        );

        let policy = Policy {
            id: "p".to_string(),
            product_type: Some("HEALTH".to_string()),
            ..Default::default()
        };
        assert_eq!(
            classifier.classify(Record::Policy(&policy), Dimension::PolicyType),
            "Health Insurance"
        );
        assert_eq!(
            classifier.classify(Record::Policy(&policy), Dimension::PolicyStatus),
            UNKNOWN_LABEL
        );

        let payment = Payment::default();
        assert_eq!(
            classifier.classify(
                Record::Payment(PaymentBucket::Overdue, &payment),
                Dimension::PaymentBucket
            ),
            "Overdue"
        );

        let due = ScheduledDue {
            status: DueStatus::Paid,
            ..Default::default()
        };
        assert_eq!(
            classifier.classify(Record::Due(&due), Dimension::DueStatus),
            "Paid"
        );
    }

    #[test]
    fn test_classify_mismatched_dimension_is_unknown() {
        let classifier = Classifier::new(NaiveDateTime::default());
        let customer = Customer {
            id: "u".to_string(),
            status: Some(CustomerStatus::Active),
            ..Default::default()
        };

        assert_eq!(
            classifier.classify(Record::Customer(&customer), Dimension::CustomerStatus),
            "Active"
        );
        assert_eq!(
            classifier.classify(Record::Customer(&customer), Dimension::ClaimType),
            UNKNOWN_LABEL
        );
    }

    #[test]
    fn test_claim_status_labels() {
        assert_eq!(claim_status_label(&ClaimStatus::UnderReview), "Under Review");
        assert_eq!(claim_status_label(&ClaimStatus::Approved), "Approved");
        assert_eq!(
            claim_status_label(&ClaimStatus::Other("ON_HOLD".to_string())),
            "On Hold"
        );
        assert_eq!(claim_status_label(&ClaimStatus::default()), UNKNOWN_LABEL);
    }

    #[test]
    fn test_type_tables_and_fallback() {
        assert_eq!(claim_type_label(Some("OPD")), "Outpatient");
        assert_eq!(claim_type_label(Some("hospitalization")), "Hospitalization");
        assert_eq!(claim_type_label(Some("PET_CARE")), "Pet Care");
        assert_eq!(claim_type_label(None), UNKNOWN_LABEL);

        assert_eq!(policy_type_label(Some("health")), "Health Insurance");
        assert_eq!(policy_type_label(Some("AUTO")), "Motor Insurance");
        assert_eq!(policy_type_label(Some("CYBER_LIABILITY")), "Cyber Liability");
    }

    #[test]
    fn test_customer_status_label_defaults_to_unknown() {
        let customer = Customer {
            id: "c".to_string(),
            ..Default::default()
        };
        assert_eq!(customer_status_label(&customer), UNKNOWN_LABEL);

        let active = Customer {
            status: Some(CustomerStatus::Active),
            ..customer
        };
        assert_eq!(customer_status_label(&active), "Active");
    }

    #[test]
    fn test_stable_hash_known_values() {
        assert_eq!(stable_hash(""), 0);
        assert_eq!(stable_hash("a"), 97);
        assert_eq!(stable_hash("ab"), 97 * 31 + 98);
    }

    #[test]
    fn test_category_color_is_deterministic() {
        for label in ["Approved", "Rejected", "Health Insurance", "Unknown", ""] {
            let first = category_color(label);
            assert_eq!(first, category_color(label));
            assert!(PALETTE.contains(&first));
        }
        // "a" hashes to 97 -> index 7.
        assert_eq!(category_color("a"), PALETTE[7]);
    }

    #[test]
    fn test_payment_bucket_labels() {
        let labels: Vec<_> = PaymentBucket::ALL.iter().map(|b| b.label()).collect();
        assert_eq!(labels, vec!["Paid", "Upcoming", "Overdue"]);
    }
}
