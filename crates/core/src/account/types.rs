//! Core account record data types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Status of an account record.
///
/// State machine flow:
/// ```text
/// new -> incomplete                          (validation failure, terminal)
/// new -> processing -> pending               (creation succeeded, awaiting verification)
/// new -> processing -> error                 (creation failed, comment holds the reason)
/// new -> processing -> fatal_error           (exception escaped the runner's own handling)
///
/// pending -> verified | soon | rejected | error   (verification outcome)
/// soon    -> verified | soon | rejected | error   (re-checked later)
/// ```
///
/// The status doubles as the claim marker: `processing` signals that a run
/// is working on the record. The claim is a plain write after the batch
/// read, not an atomic reservation; see the orchestrator for the caveats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Imported and waiting to be processed.
    New,
    /// Validation failed; required fields or the identity image are missing.
    Incomplete,
    /// Claimed by a registration run.
    Processing,
    /// Account created; awaiting verification by the target service.
    Pending,
    /// Creation workflow failed; the comment carries the reason.
    Error,
    /// An exception escaped the workflow runner's own handling.
    FatalError,
    /// Verification found the account still being reviewed.
    Soon,
    /// Verification found the account rejected by the target service.
    Rejected,
    /// Verification succeeded.
    Verified,
}

impl AccountStatus {
    /// Returns the status as its datastore string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::New => "new",
            AccountStatus::Incomplete => "incomplete",
            AccountStatus::Processing => "processing",
            AccountStatus::Pending => "pending",
            AccountStatus::Error => "error",
            AccountStatus::FatalError => "fatal_error",
            AccountStatus::Soon => "soon",
            AccountStatus::Rejected => "rejected",
            AccountStatus::Verified => "verified",
        }
    }

    /// Returns true for outcomes a registration run can never revisit.
    pub fn is_terminal_for_creation(&self) -> bool {
        matches!(
            self,
            AccountStatus::Incomplete | AccountStatus::Error | AccountStatus::FatalError
        )
    }

    /// Returns true if the record is past creation and eligible for
    /// verification checks.
    pub fn is_post_creation(&self) -> bool {
        matches!(
            self,
            AccountStatus::Pending
                | AccountStatus::Soon
                | AccountStatus::Verified
                | AccountStatus::Rejected
        )
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(AccountStatus::New),
            "incomplete" => Ok(AccountStatus::Incomplete),
            "processing" => Ok(AccountStatus::Processing),
            "pending" => Ok(AccountStatus::Pending),
            "error" => Ok(AccountStatus::Error),
            "fatal_error" => Ok(AccountStatus::FatalError),
            "soon" => Ok(AccountStatus::Soon),
            "rejected" => Ok(AccountStatus::Rejected),
            "verified" => Ok(AccountStatus::Verified),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a status string that is not part of the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl std::fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown account status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

/// One identity profile targeted at one external service.
///
/// Records are created by an upstream import step with status `new` and are
/// only ever mutated by the orchestrators; they are never deleted here.
/// Serde field names are the datastore column names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountRecord {
    /// Unique identifier assigned by the datastore.
    pub id: String,

    /// Given name.
    pub given_name: String,

    /// Family name.
    pub family_name: String,

    /// Sex as recorded on the identity document ("F" or "M").
    pub sex: String,

    /// Birth date.
    pub birth_date: Option<NaiveDate>,

    /// Birth place.
    pub birth_place: String,

    /// Street address.
    pub address: String,

    /// City.
    pub city: String,

    /// Postal code.
    pub postal_code: String,

    /// Phone number; workflows substitute a fallback when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Generated mailbox address the account is registered under.
    pub mailbox: String,

    /// Target service this record applies to.
    pub service: String,

    /// Current status; see [`AccountStatus`] for the state machine.
    pub status: AccountStatus,

    /// Free-text diagnostic, overwritten on every transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// When the record was imported.
    pub created_at: DateTime<Utc>,

    /// Last status mutation.
    pub updated_at: DateTime<Utc>,
}

impl AccountRecord {
    /// Returns the full name as it appears on the identity document.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_round_trips_through_str() {
        let all = [
            AccountStatus::New,
            AccountStatus::Incomplete,
            AccountStatus::Processing,
            AccountStatus::Pending,
            AccountStatus::Error,
            AccountStatus::FatalError,
            AccountStatus::Soon,
            AccountStatus::Rejected,
            AccountStatus::Verified,
        ];
        for status in all {
            assert_eq!(AccountStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let err = AccountStatus::from_str("exploded").unwrap_err();
        assert_eq!(err.to_string(), "unknown account status: exploded");
    }

    #[test]
    fn test_status_serializes_as_snake_case() {
        let json = serde_json::to_string(&AccountStatus::FatalError).unwrap();
        assert_eq!(json, r#""fatal_error""#);

        let back: AccountStatus = serde_json::from_str(r#""soon""#).unwrap();
        assert_eq!(back, AccountStatus::Soon);
    }

    #[test]
    fn test_terminal_and_post_creation_predicates() {
        assert!(AccountStatus::Incomplete.is_terminal_for_creation());
        assert!(AccountStatus::FatalError.is_terminal_for_creation());
        assert!(!AccountStatus::Pending.is_terminal_for_creation());

        assert!(AccountStatus::Pending.is_post_creation());
        assert!(AccountStatus::Soon.is_post_creation());
        assert!(!AccountStatus::New.is_post_creation());
        assert!(!AccountStatus::Processing.is_post_creation());
    }

    #[test]
    fn test_record_deserializes_from_datastore_row() {
        let json = r#"{
            "id": "a1",
            "given_name": "Jean",
            "family_name": "Dupont",
            "sex": "M",
            "birth_date": "1990-04-12",
            "birth_place": "Lyon",
            "address": "4 rue des Lilas",
            "city": "Lyon",
            "postal_code": "69003",
            "phone": null,
            "mailbox": "jean.dupont@example.net",
            "service": "demo",
            "status": "new",
            "comment": null,
            "created_at": "2025-06-01T10:00:00Z",
            "updated_at": "2025-06-01T10:00:00Z"
        }"#;

        let record: AccountRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, AccountStatus::New);
        assert_eq!(record.birth_date.unwrap().to_string(), "1990-04-12");
        assert!(record.phone.is_none());
        assert_eq!(record.full_name(), "Jean Dupont");
    }
}
