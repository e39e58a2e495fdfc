//! Student directory: contact details to access key, one row per student.

use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::keygen::{generate_key, KEY_LENGTH};
use crate::model::{Record, Row, StudentIdentity};
use crate::store::Storage;

pub const DIRECTORY_TABLE: &str = "access_keys";

/// Redraws allowed when a fresh key collides with an issued one.
const MAX_KEY_DRAWS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub access_key: String,
    pub created: bool,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn normalize_phone(phone: &str) -> String {
    phone.trim().to_string()
}

pub fn list_students(storage: &dyn Storage) -> Result<Vec<StudentIdentity>> {
    let Some(table) = storage.load_table(DIRECTORY_TABLE)? else {
        return Ok(Vec::new());
    };
    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, fields)| {
            StudentIdentity::from_row(&Row::new(&table.header, fields)).map_err(|reason| {
                StoreError::CorruptRow {
                    table: DIRECTORY_TABLE.to_string(),
                    row: i + 1,
                    reason,
                }
            })
        })
        .collect()
}

pub fn is_valid_key(storage: &dyn Storage, key: &str) -> Result<bool> {
    let key = key.trim();
    if key.is_empty() {
        return Ok(false);
    }
    Ok(list_students(storage)?.iter().any(|s| s.access_key == key))
}

pub fn find_by_key(storage: &dyn Storage, key: &str) -> Result<Option<StudentIdentity>> {
    let key = key.trim();
    Ok(list_students(storage)?
        .into_iter()
        .find(|s| s.access_key == key))
}

pub fn resolve_or_create(storage: &mut dyn Storage, email: &str, phone: &str) -> Result<Resolved> {
    resolve_or_create_with(storage, email, phone, || generate_key(KEY_LENGTH))
}

/// Same as [`resolve_or_create`] with the key source supplied by the caller.
///
/// An email match and a phone match must agree on the student. When they point
/// at different rows the call fails with `IdentityConflict` instead of picking
/// one.
pub fn resolve_or_create_with<F>(
    storage: &mut dyn Storage,
    email: &str,
    phone: &str,
    mut next_key: F,
) -> Result<Resolved>
where
    F: FnMut() -> String,
{
    let email = normalize_email(email);
    let phone = normalize_phone(phone);
    if email.is_empty() && phone.is_empty() {
        return Err(StoreError::Validation(
            "an email or a phone number is required".into(),
        ));
    }

    let students = list_students(storage)?;
    let by_email = (!email.is_empty())
        .then(|| students.iter().find(|s| normalize_email(&s.email) == email))
        .flatten();
    let by_phone = (!phone.is_empty())
        .then(|| students.iter().find(|s| normalize_phone(&s.phone) == phone))
        .flatten();

    match (by_email, by_phone) {
        (Some(a), Some(b)) if a.access_key != b.access_key => {
            return Err(StoreError::IdentityConflict);
        }
        (Some(found), _) | (None, Some(found)) => {
            debug!("access key resolved for existing student");
            return Ok(Resolved {
                access_key: found.access_key.clone(),
                created: false,
            });
        }
        (None, None) => {}
    }

    let mut access_key = None;
    for _ in 0..MAX_KEY_DRAWS {
        let candidate = next_key();
        if !students.iter().any(|s| s.access_key == candidate) {
            access_key = Some(candidate);
            break;
        }
    }
    let access_key = access_key.ok_or(StoreError::KeySpaceExhausted(MAX_KEY_DRAWS))?;

    let identity = StudentIdentity {
        email,
        phone,
        access_key: access_key.clone(),
    };
    let header = match storage.load_table(DIRECTORY_TABLE)? {
        Some(t) if !t.header.is_empty() => t.header,
        _ => StudentIdentity::default_header(),
    };
    storage.append_rows(DIRECTORY_TABLE, &header, &[identity.to_fields(&header)])?;
    info!(students = students.len() + 1, "registered new student");

    Ok(Resolved {
        access_key,
        created: true,
    })
}
