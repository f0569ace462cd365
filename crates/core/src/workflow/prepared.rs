use std::path::PathBuf;

use crate::account::AccountRecord;
use crate::validation::image_slug;

/// Phone number typed into forms when a record carries none.
pub const FALLBACK_PHONE: &str = "0612345678";

/// Form-ready projection of an account record.
///
/// Everything a workflow types into a page, precomputed once: the fixed
/// password, the phone fallback, the `DD/MM/YYYY` birth date and the
/// identity-image path resolved by validation.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedAccount {
    pub mailbox: String,
    pub password: String,
    pub given_name: String,
    pub family_name: String,
    pub full_name: String,
    pub sex: String,
    pub phone: String,
    pub birth_date: String,
    pub birth_place: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub image_path: PathBuf,
    pub name_slug: String,
}

impl PreparedAccount {
    pub fn from_record(
        record: &AccountRecord,
        image_path: PathBuf,
        password: impl Into<String>,
    ) -> Self {
        let phone = record
            .phone
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_PHONE.to_string());
        let birth_date = record
            .birth_date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default();

        Self {
            mailbox: record.mailbox.clone(),
            password: password.into(),
            given_name: record.given_name.clone(),
            family_name: record.family_name.clone(),
            full_name: record.full_name(),
            sex: record.sex.clone(),
            phone,
            birth_date,
            birth_place: record.birth_place.clone(),
            address: record.address.clone(),
            city: record.city.clone(),
            postal_code: record.postal_code.clone(),
            image_path,
            name_slug: image_slug(&record.given_name, &record.family_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_projection_from_record() {
        let record = fixtures::account_record("demo");
        let prepared = PreparedAccount::from_record(
            &record,
            PathBuf::from("/assets/jean-dupont.jpg"),
            "S3cret-Pass",
        );

        assert_eq!(prepared.mailbox, record.mailbox);
        assert_eq!(prepared.password, "S3cret-Pass");
        assert_eq!(prepared.full_name, "Jean Dupont");
        assert_eq!(prepared.birth_date, "12/04/1990");
        assert_eq!(prepared.name_slug, "jean-dupont");
        assert_eq!(prepared.image_path, PathBuf::from("/assets/jean-dupont.jpg"));
    }

    #[test]
    fn test_missing_phone_falls_back() {
        let mut record = fixtures::account_record("demo");
        record.phone = None;
        let prepared =
            PreparedAccount::from_record(&record, PathBuf::from("/assets/x.jpg"), "pw");
        assert_eq!(prepared.phone, FALLBACK_PHONE);

        record.phone = Some("  ".to_string());
        let prepared =
            PreparedAccount::from_record(&record, PathBuf::from("/assets/x.jpg"), "pw");
        assert_eq!(prepared.phone, FALLBACK_PHONE);
    }

    #[test]
    fn test_present_phone_is_kept() {
        let mut record = fixtures::account_record("demo");
        record.phone = Some("0711223344".to_string());
        let prepared =
            PreparedAccount::from_record(&record, PathBuf::from("/assets/x.jpg"), "pw");
        assert_eq!(prepared.phone, "0711223344");
    }
}
