#![forbid(unsafe_code)]

//! Subscription snapshot model and the billing collaborator.
//!
//! The snapshot is owned by the billing service; the shell only reads it.
//! Its JSON form uses camelCase keys at the top level and snake_case inside
//! `subscription`, and unknown plan/status strings are kept as `Other`.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Trial plans at or below this many remaining days get the upgrade prompt.
pub const UPGRADE_PROMPT_MAX_DAYS: i64 = 7;

/// Cross-component signal carried on the shared bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingEvent {
    /// Something changed the plan; every mounted shell should refetch.
    SubscriptionUpdated,
}

/// Billing plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlanType {
    Trial,
    Monthly,
    Semiannual,
    Annual,
    Other(String),
}

impl PlanType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Trial => "trial",
            Self::Monthly => "monthly",
            Self::Semiannual => "semiannual",
            Self::Annual => "annual",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for PlanType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "trial" => Self::Trial,
            "monthly" => Self::Monthly,
            "semiannual" => Self::Semiannual,
            "annual" => Self::Annual,
            _ => Self::Other(s),
        }
    }
}

impl From<PlanType> for String {
    fn from(p: PlanType) -> Self {
        match p {
            PlanType::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

/// Subscription status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlanStatus {
    Active,
    Cancelled,
    Expired,
    PastDue,
    Other(String),
}

impl PlanStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::PastDue => "past_due",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for PlanStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "active" => Self::Active,
            "cancelled" => Self::Cancelled,
            "expired" => Self::Expired,
            "past_due" => Self::PastDue,
            _ => Self::Other(s),
        }
    }
}

impl From<PlanStatus> for String {
    fn from(p: PlanStatus) -> Self {
        match p {
            PlanStatus::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

/// Plan details inside a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    pub plan_type: PlanType,
    pub status: PlanStatus,
}

/// Subscription status as reported by the billing service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriptionSnapshot {
    pub has_access: bool,
    pub subscription: Option<SubscriptionInfo>,
    pub days_remaining: Option<i64>,
    pub is_expired: bool,
    pub billing_period_text: String,
    pub billing_period_accurate: bool,
}

impl SubscriptionSnapshot {
    /// An active trial with `days` left.
    pub fn trial(days: i64) -> Self {
        Self {
            has_access: true,
            subscription: Some(SubscriptionInfo {
                plan_type: PlanType::Trial,
                status: PlanStatus::Active,
            }),
            days_remaining: Some(days),
            is_expired: false,
            billing_period_text: format!("{days} days left in trial"),
            billing_period_accurate: true,
        }
    }

    /// An active paid plan.
    pub fn paid(plan_type: PlanType) -> Self {
        Self {
            has_access: true,
            subscription: Some(SubscriptionInfo {
                plan_type,
                status: PlanStatus::Active,
            }),
            days_remaining: None,
            is_expired: false,
            billing_period_text: String::new(),
            billing_period_accurate: true,
        }
    }

    pub fn plan_type(&self) -> Option<&PlanType> {
        self.subscription.as_ref().map(|s| &s.plan_type)
    }

    pub fn status(&self) -> Option<&PlanStatus> {
        self.subscription.as_ref().map(|s| &s.status)
    }

    /// Days left when on a trial plan.
    pub fn trial_days(&self) -> Option<i64> {
        match self.plan_type() {
            Some(PlanType::Trial) => self.days_remaining,
            _ => None,
        }
    }
}

/// Whether the upgrade call-to-action is shown for `snapshot`.
///
/// True only for a trial plan whose `days_remaining` is present and at most
/// [`UPGRADE_PROMPT_MAX_DAYS`]. No snapshot means no prompt.
pub fn should_show_upgrade(snapshot: Option<&SubscriptionSnapshot>) -> bool {
    snapshot
        .and_then(SubscriptionSnapshot::trial_days)
        .is_some_and(|days| days <= UPGRADE_PROMPT_MAX_DAYS)
}

/// Billing fetch failure.
#[derive(Debug)]
pub enum BillingError {
    /// The snapshot source could not be read.
    Io(io::Error),
    /// The snapshot source held malformed JSON.
    Decode(serde_json::Error),
    /// The service refused or is down.
    Unavailable(String),
    /// The service panicked while fetching.
    Panicked(String),
    /// The owning shell was unmounted before the fetch ran.
    Cancelled,
}

impl fmt::Display for BillingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "billing source unreadable: {e}"),
            Self::Decode(e) => write!(f, "billing snapshot malformed: {e}"),
            Self::Unavailable(why) => write!(f, "billing service unavailable: {why}"),
            Self::Panicked(msg) => write!(f, "billing service panicked: {msg}"),
            Self::Cancelled => write!(f, "billing fetch cancelled"),
        }
    }
}

impl std::error::Error for BillingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for BillingError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for BillingError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e)
    }
}

/// Result of one fetch.
pub type FetchResult = Result<SubscriptionSnapshot, BillingError>;

/// The subscription collaborator.
///
/// Called from a background task; may block.
pub trait BillingService: Send + Sync {
    fn check_subscription_access(&self, user_id: &str) -> FetchResult;
}

/// Reads the snapshot from a JSON file on every call, so edits to the file
/// show up on the next refresh.
#[derive(Debug, Clone)]
pub struct JsonFileBilling {
    path: PathBuf,
}

impl JsonFileBilling {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl BillingService for JsonFileBilling {
    fn check_subscription_access(&self, user_id: &str) -> FetchResult {
        tracing::trace!(user_id, path = %self.path.display(), "reading snapshot file");
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Always answers with the same snapshot.
#[derive(Debug, Clone)]
pub struct FixedBilling {
    snapshot: SubscriptionSnapshot,
}

impl FixedBilling {
    pub fn new(snapshot: SubscriptionSnapshot) -> Self {
        Self { snapshot }
    }
}

impl Default for FixedBilling {
    fn default() -> Self {
        Self::new(SubscriptionSnapshot::trial(5))
    }
}

impl BillingService for FixedBilling {
    fn check_subscription_access(&self, _user_id: &str) -> FetchResult {
        Ok(self.snapshot.clone())
    }
}
