// Backup configuration model: one record per database, plus the plan
// envelope the validator enforces it against.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::period::Period;

/// How a database decides which backups to keep.
///
/// Stored as loose text by the platform; unknown values are preserved in
/// [`RetentionPolicyType::Other`] so old rows stay readable, and the empty
/// string folds into [`RetentionPolicyType::TimePeriod`] on the read path.
/// The validator and the cleaner share this parse, so both treat legacy
/// empty values the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RetentionPolicyType {
    /// Keep backups younger than a named period.
    #[default]
    TimePeriod,
    /// Keep the newest N completed backups.
    Count,
    /// Grandfather-Father-Son slot rotation.
    Gfs,
    /// Unrecognized value; rejected by the validator.
    Other(String),
}

impl RetentionPolicyType {
    /// Wire name of the policy type.
    pub fn as_str(&self) -> &str {
        match self {
            RetentionPolicyType::TimePeriod => "TIME_PERIOD",
            RetentionPolicyType::Count => "COUNT",
            RetentionPolicyType::Gfs => "GFS",
            RetentionPolicyType::Other(s) => s,
        }
    }
}

impl From<String> for RetentionPolicyType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "TIME_PERIOD" | "" => RetentionPolicyType::TimePeriod,
            "COUNT" => RetentionPolicyType::Count,
            "GFS" => RetentionPolicyType::Gfs,
            _ => RetentionPolicyType::Other(s),
        }
    }
}

impl From<RetentionPolicyType> for String {
    fn from(p: RetentionPolicyType) -> Self {
        p.as_str().to_string()
    }
}

impl std::fmt::Display for RetentionPolicyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether backup blobs are encrypted at rest.
///
/// Loose text like the policy type: the empty string reads as
/// [`BackupEncryption::None`], anything unrecognized lands in `Other` and
/// fails validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BackupEncryption {
    /// Plain blobs.
    #[default]
    None,
    /// Encrypted blobs; mandatory in cloud mode.
    Encrypted,
    /// Unrecognized value; rejected by the validator.
    Other(String),
}

impl From<String> for BackupEncryption {
    fn from(s: String) -> Self {
        match s.as_str() {
            "NONE" | "" => BackupEncryption::None,
            "ENCRYPTED" => BackupEncryption::Encrypted,
            _ => BackupEncryption::Other(s),
        }
    }
}

impl From<BackupEncryption> for String {
    fn from(e: BackupEncryption) -> Self {
        match e {
            BackupEncryption::None => "NONE".to_string(),
            BackupEncryption::Encrypted => "ENCRYPTED".to_string(),
            BackupEncryption::Other(s) => s,
        }
    }
}

/// Events a user can subscribe to. Opaque to the retention engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackupNotificationType {
    /// A scheduled backup failed.
    BackupFailed,
    /// A scheduled backup completed.
    BackupSuccess,
}

/// Cadence of the backup schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleInterval {
    /// Every hour.
    Hourly,
    /// Every day.
    Daily,
    /// Every week.
    Weekly,
    /// Every month.
    Monthly,
}

/// Schedule descriptor supplied by the platform. The engine only reads its
/// presence; the backup scheduler interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInterval {
    /// Cadence of the schedule.
    pub interval: ScheduleInterval,
    /// Wall-clock time of day for daily-or-slower cadences, `"HH:MM"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
}

/// Backup configuration of one database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupConfig {
    /// Database identity; primary key.
    pub database_id: Uuid,

    /// Master switch; the cleaner ignores disabled configs.
    pub is_backups_enabled: bool,

    /// Active retention strategy.
    #[serde(default)]
    pub retention_policy_type: RetentionPolicyType,

    /// Period for the time-based strategy. The platform stores the empty
    /// string for "unset"; both read as `None` here.
    #[serde(
        default,
        deserialize_with = "period_from_wire",
        serialize_with = "period_to_wire"
    )]
    pub retention_time_period: Option<Period>,

    /// Newest-N budget for the count strategy.
    #[serde(default)]
    pub retention_count: u32,

    /// GFS hourly slot budget.
    #[serde(default)]
    pub retention_gfs_hours: u32,
    /// GFS daily slot budget.
    #[serde(default)]
    pub retention_gfs_days: u32,
    /// GFS weekly slot budget.
    #[serde(default)]
    pub retention_gfs_weeks: u32,
    /// GFS monthly slot budget.
    #[serde(default)]
    pub retention_gfs_months: u32,
    /// GFS yearly slot budget.
    #[serde(default)]
    pub retention_gfs_years: u32,

    /// Reference to a stored schedule.
    #[serde(default)]
    pub backup_interval_id: Option<Uuid>,
    /// Inline schedule descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_interval: Option<BackupInterval>,

    /// Target object store.
    #[serde(default)]
    pub storage_id: Option<Uuid>,

    /// Notification subscriptions; opaque to the engine.
    #[serde(default)]
    pub send_notifications_on: Vec<BackupNotificationType>,

    /// Retry failed backups.
    #[serde(default)]
    pub is_retry_if_failed: bool,
    /// Retry budget; must be positive when retries are enabled.
    #[serde(default)]
    pub max_failed_tries_count: i32,

    /// At-rest encryption of blobs.
    #[serde(default)]
    pub encryption: BackupEncryption,

    /// Per-backup size cap in MiB. 0 = unlimited.
    #[serde(default)]
    pub max_backup_size_mb: i64,
    /// Total-footprint cap in MiB. 0 = unlimited.
    #[serde(default)]
    pub max_backups_total_size_mb: i64,
}

impl BackupConfig {
    /// Clones this configuration for a newly created database. The stored
    /// schedule reference is reset (it belongs to the source database); an
    /// inline descriptor is carried over.
    pub fn copy_for_database(&self, new_database_id: Uuid) -> Self {
        Self {
            database_id: new_database_id,
            backup_interval_id: None,
            ..self.clone()
        }
    }
}

/// Per-database policy envelope. Zero means unlimited.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabasePlan {
    /// Largest allowed single backup in MiB.
    pub max_backup_size_mb: i64,
    /// Largest allowed total footprint in MiB.
    pub max_backups_total_size_mb: i64,
    /// Longest allowed retention period.
    pub max_storage_period: Period,
}

impl DatabasePlan {
    /// A plan with no limits.
    pub fn unlimited() -> Self {
        Self {
            max_backup_size_mb: 0,
            max_backups_total_size_mb: 0,
            max_storage_period: Period::Forever,
        }
    }
}

fn period_from_wire<'de, D>(deserializer: D) -> Result<Option<Period>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn period_to_wire<S>(period: &Option<Period>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match period {
        Some(p) => serializer.serialize_str(p.as_str()),
        None => serializer.serialize_str(""),
    }
}
