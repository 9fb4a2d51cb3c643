use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::users::repo_types::{User, UserFields};

/// Body of `POST /users` and `POST /users/{id}`. Every field is optional at
/// the serde level so missing ones produce a 400 naming the field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub streak: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UserSaved {
    pub status: &'static str,
    pub message: String,
    pub user: User,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::invalid(format!("Missing required field: {field}"))),
    }
}

impl UserBody {
    /// Validates the body. `path_id`, when given, overrides any `userId` in
    /// the body.
    pub fn into_fields(self, path_id: Option<&str>) -> Result<UserFields, AppError> {
        let user_id = match path_id {
            Some(id) => required(Some(id.to_string()), "userId")?,
            None => required(self.user_id, "userId")?,
        };
        let user_name = required(self.user_name, "userName")?;
        let user_email = required(self.user_email, "userEmail")?.to_lowercase();
        if !is_valid_email(&user_email) {
            return Err(AppError::invalid("Invalid email"));
        }
        if let Some(streak) = self.streak {
            if streak < 0 {
                return Err(AppError::invalid("streak must not be negative"));
            }
        }

        Ok(UserFields {
            user_id,
            user_email,
            user_name,
            streak: self.streak,
        })
    }
}
