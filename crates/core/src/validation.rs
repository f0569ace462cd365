//! Record validation gate.
//!
//! Checks that a record carries every mandatory identity field and that a
//! matching identity-image asset exists on disk. The gate never fails; it
//! reports a structured result and callers treat an invalid record as a
//! terminal `incomplete` transition, not a retryable error.

use std::path::{Path, PathBuf};

use crate::account::AccountRecord;

/// Result of validating one record.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// True when every required field is present and the identity image
    /// was resolved.
    pub is_valid: bool,
    /// Human-readable labels for everything that is missing.
    pub missing_fields: Vec<String>,
    /// Resolved identity-image path, when found.
    pub image_path: Option<PathBuf>,
}

/// Validates records against the required-field list and the identity-image
/// directory. Deterministic given the same record and directory contents;
/// the only I/O is filesystem reads.
pub struct ValidationGate {
    image_dir: PathBuf,
}

impl ValidationGate {
    /// Create a gate resolving identity images under `image_dir`.
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
        }
    }

    /// Validate one record.
    pub fn validate(&self, record: &AccountRecord) -> ValidationReport {
        let mut missing_fields = Vec::new();

        let required: [(&str, &str); 9] = [
            ("given name", &record.given_name),
            ("family name", &record.family_name),
            ("mailbox address", &record.mailbox),
            (
                "birth date",
                match record.birth_date {
                    Some(_) => "set",
                    None => "",
                },
            ),
            ("birth place", &record.birth_place),
            ("sex", &record.sex),
            ("address", &record.address),
            ("city", &record.city),
            ("postal code", &record.postal_code),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                missing_fields.push(label.to_string());
            }
        }

        let names_present = !record.given_name.trim().is_empty()
            && !record.family_name.trim().is_empty();

        let image_path = if names_present {
            let resolved =
                resolve_identity_image(&self.image_dir, &record.given_name, &record.family_name);
            if resolved.is_none() {
                let searched = self
                    .image_dir
                    .join(canonical_image_name(&record.given_name, &record.family_name));
                missing_fields.push(format!("identity image (searched: {})", searched.display()));
            }
            resolved
        } else {
            None
        };

        ValidationReport {
            is_valid: missing_fields.is_empty(),
            missing_fields,
            image_path,
        }
    }
}

/// Folds the accented characters that appear in identity documents down to
/// their ASCII base letter. Anything else passes through unchanged.
fn fold_diacritics(c: char) -> char {
    match c {
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'à' | 'â' | 'ä' => 'a',
        'ù' | 'û' | 'ü' => 'u',
        'ô' | 'ö' => 'o',
        'î' | 'ï' => 'i',
        'ç' => 'c',
        other => other,
    }
}

fn normalize(part: &str) -> String {
    part.trim()
        .to_lowercase()
        .chars()
        .map(fold_diacritics)
        .collect()
}

/// Normalized name slug: lower-cased first token of the given name, a
/// hyphen, then the family-name tokens hyphen-joined, diacritics folded.
pub fn image_slug(given_name: &str, family_name: &str) -> String {
    let given = normalize(given_name);
    let first_token = given.split_whitespace().next().unwrap_or_default();
    let family = normalize(family_name)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("{first_token}-{family}")
}

/// Canonical identity-image filename for a record.
pub fn canonical_image_name(given_name: &str, family_name: &str) -> String {
    format!("{}.jpg", image_slug(given_name, family_name))
}

/// Resolve the identity image for a name: the canonical filename if it
/// exists, otherwise the first file (in sorted order, for determinism)
/// whose name starts with the slug.
pub fn resolve_identity_image(
    image_dir: &Path,
    given_name: &str,
    family_name: &str,
) -> Option<PathBuf> {
    let exact = image_dir.join(canonical_image_name(given_name, family_name));
    if exact.is_file() {
        return Some(exact);
    }

    let slug = image_slug(given_name, family_name);
    let mut names: Vec<String> = std::fs::read_dir(image_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(&slug))
        .collect();
    names.sort();
    names.first().map(|name| image_dir.join(name))
}
