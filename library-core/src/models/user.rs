//! User accounts and profile fields

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::validation::{bounded, ValidationError};

const MAX_EMAIL_LEN: usize = 254;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_NAME_LEN: usize = 100;
const MAX_BIO_LEN: usize = 2000;
const MAX_INTERESTS: usize = 20;
const MAX_INTEREST_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub bio: Option<String>,
    pub interests: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User plus stored password hash, only used by login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Normalized email address (trimmed, lowercased).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let email = bounded("email", s, MAX_EMAIL_LEN)?.to_lowercase();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(Self(email)),
            _ => Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "expected an address like name@example.com",
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Plaintext password that passed length checks. Never logged.
pub struct Password(String);

impl Password {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let len = s.chars().count();
        if len < MIN_PASSWORD_LEN {
            return Err(ValidationError::TooShort {
                field: "password",
                min: MIN_PASSWORD_LEN,
            });
        }
        if len > MAX_PASSWORD_LEN {
            return Err(ValidationError::TooLong {
                field: "password",
                max: MAX_PASSWORD_LEN,
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Validated registration input. The password is hashed before storage,
/// so the store only ever sees `password_hash`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub name: String,
    pub password_hash: String,
}

pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    bounded("name", name, MAX_NAME_LEN)
}

/// Partial profile update. `None` leaves a field untouched; an empty bio
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<Option<String>>,
    pub interests: Option<Vec<String>>,
}

impl ProfileUpdate {
    pub fn new(
        name: Option<&str>,
        bio: Option<&str>,
        interests: Option<&[String]>,
    ) -> Result<Self, ValidationError> {
        let name = name.map(validate_name).transpose()?;

        let bio = bio
            .map(|b| {
                let b = b.trim();
                if b.is_empty() {
                    Ok(None)
                } else {
                    bounded("bio", b, MAX_BIO_LEN).map(Some)
                }
            })
            .transpose()?;

        let interests = interests.map(normalize_interests).transpose()?;

        Ok(Self {
            name,
            bio,
            interests,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.bio.is_none() && self.interests.is_none()
    }

    /// Apply to an in-memory user record.
    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(bio) = &self.bio {
            user.bio = bio.clone();
        }
        if let Some(interests) = &self.interests {
            user.interests = interests.clone();
        }
    }
}

/// Trim, drop case-insensitive duplicates, keep first-seen order.
fn normalize_interests(raw: &[String]) -> Result<Vec<String>, ValidationError> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for item in raw {
        let item = bounded("interests", item, MAX_INTEREST_LEN)?;
        if !out.iter().any(|seen| seen.eq_ignore_ascii_case(&item)) {
            out.push(item);
        }
    }
    if out.len() > MAX_INTERESTS {
        return Err(ValidationError::TooMany {
            field: "interests",
            max: MAX_INTERESTS,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        let email = Email::new("  Ada@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "ada@example.com");
        assert!(Email::new("not-an-email").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("ada@localhost").is_err());
    }

    #[test]
    fn password_length_bounds() {
        assert!(matches!(
            Password::new("short"),
            Err(ValidationError::TooShort { min: 8, .. })
        ));
        assert!(Password::new("correct horse").is_ok());
        assert_eq!(format!("{:?}", Password::new("correct horse").unwrap()), "Password(***)");
    }

    #[test]
    fn profile_update_normalizes() {
        let interests = vec![" Rust ".to_string(), "rust".to_string(), "maps".to_string()];
        let update = ProfileUpdate::new(Some(" Ada "), Some(""), Some(&interests)).unwrap();
        assert_eq!(update.name.as_deref(), Some("Ada"));
        assert_eq!(update.bio, Some(None));
        assert_eq!(update.interests, Some(vec!["Rust".to_string(), "maps".to_string()]));
    }

    #[test]
    fn too_many_interests_rejected() {
        let interests: Vec<String> = (0..21).map(|i| format!("topic-{i}")).collect();
        assert!(matches!(
            ProfileUpdate::new(None, None, Some(&interests)),
            Err(ValidationError::TooMany { max: 20, .. })
        ));
    }

    #[test]
    fn apply_leaves_untouched_fields() {
        let now = Utc::now();
        let mut user = User {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            name: "Ada".into(),
            bio: Some("math".into()),
            interests: vec![],
            created_at: now,
            updated_at: now,
        };
        let update = ProfileUpdate::new(Some("Ada L."), None, None).unwrap();
        update.apply(&mut user);
        assert_eq!(user.name, "Ada L.");
        assert_eq!(user.bio.as_deref(), Some("math"));
    }
}
