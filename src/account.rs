//! Profile-local student "login".
//!
//! There is a single account per profile and the password sits in the store
//! as plain text. This only gates what the dashboard greets you with; it is
//! not authentication.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::Storage;

pub const MIN_PASSWORD_LEN: usize = 6;

const ACCOUNT_KEY: &str = "classroom_student_account";
const SESSION_KEY: &str = "classroom_student_session";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("name, email and a password of at least {MIN_PASSWORD_LEN} characters are required")]
    InvalidRegistration,

    #[error("Invalid login credentials. Use registered account details.")]
    InvalidCredentials,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub email: String,
}

impl Session {
    pub fn status_line(session: Option<&Session>) -> String {
        match session {
            Some(s) => format!("Logged in as {} ({})", s.name, s.email),
            None => "Not logged in. Login to sync your classroom activity on this profile."
                .to_string(),
        }
    }
}

impl From<&Account> for Session {
    fn from(account: &Account) -> Self {
        Self {
            name: account.name.clone(),
            email: account.email.clone(),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone, Copy)]
pub struct Accounts<'a> {
    storage: Storage<'a>,
}

impl<'a> Accounts<'a> {
    pub fn new(storage: Storage<'a>) -> Self {
        Self { storage }
    }

    /// Replaces any existing account and logs the new one in.
    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<Session, AccountError> {
        let account = Account {
            name: name.trim().to_string(),
            email: normalize_email(email),
            password: password.to_string(),
        };
        if account.name.is_empty()
            || account.email.is_empty()
            || account.password.chars().count() < MIN_PASSWORD_LEN
        {
            return Err(AccountError::InvalidRegistration);
        }

        let session = Session::from(&account);
        self.storage.write_json(ACCOUNT_KEY, &account);
        self.storage.write_json(SESSION_KEY, &session);
        tracing::info!(email = session.email.as_str(), "student registered");
        Ok(session)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Session, AccountError> {
        let email = normalize_email(email);
        let account: Account = self
            .storage
            .read_json(ACCOUNT_KEY)
            .ok_or(AccountError::InvalidCredentials)?;
        if account.email != email || account.password != password {
            return Err(AccountError::InvalidCredentials);
        }

        let session = Session::from(&account);
        self.storage.write_json(SESSION_KEY, &session);
        tracing::info!(email = session.email.as_str(), "student logged in");
        Ok(session)
    }

    pub fn logout(&self) {
        self.storage.remove(SESSION_KEY);
    }

    pub fn session(&self) -> Option<Session> {
        self.storage.read_json(SESSION_KEY)
    }
}
