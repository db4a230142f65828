use sqlx::PgPool;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo_types::{Account, AccountSummary, NewAccount};
use crate::db::is_unique_violation;
use crate::error::RegistrationError;
use crate::records::{self, Record};
use crate::validation::{is_valid_email, is_valid_password, is_valid_username};

pub const REGISTRATION_SUCCESSFUL: &str = "Registration successful";

/// The reason text a caller shows for a registration outcome.
pub fn registration_message(outcome: &Result<Account, RegistrationError>) -> String {
    match outcome {
        Ok(_) => REGISTRATION_SUCCESSFUL.to_string(),
        Err(reason) => reason.to_string(),
    }
}

impl Record for AccountSummary {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str = "id, username, email, user_type AS role, created_at";
    const ORDER_BY: &'static str = "created_at ASC, id ASC";
}

/// Input shape checks, in the order callers see them: email, username, password.
pub fn validate_new_account(input: &NewAccount) -> Result<(), RegistrationError> {
    if !is_valid_email(&input.email) {
        return Err(RegistrationError::InvalidEmail);
    }
    if !is_valid_username(&input.username) {
        return Err(RegistrationError::InvalidUsername);
    }
    if !is_valid_password(&input.password) {
        return Err(RegistrationError::PasswordTooShort);
    }
    Ok(())
}

/// Register a new account. Nothing is written unless every check passes.
#[instrument(skip(db, input), fields(username = %input.username, email = %input.email))]
pub async fn register(db: &PgPool, input: NewAccount) -> Result<Account, RegistrationError> {
    if let Err(reason) = validate_new_account(&input) {
        warn!(%reason, "registration rejected");
        return Err(reason);
    }

    match Account::identity_taken(db, &input.email, &input.username).await {
        Ok(false) => {}
        Ok(true) => {
            info!("registration conflict: email or username taken");
            return Err(RegistrationError::AlreadyExists);
        }
        Err(e) => {
            error!(error = %e, "registration lookup failed");
            return Err(RegistrationError::Failed);
        }
    }

    let hash = hash_password(&input.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        RegistrationError::Failed
    })?;

    // A concurrent registration can pass the check above; the unique
    // constraints decide the winner.
    match Account::insert(db, &input.username, &input.email, &hash, input.role).await {
        Ok(account) => {
            info!(user_id = %account.id, "{REGISTRATION_SUCCESSFUL}");
            Ok(account)
        }
        Err(e) if is_unique_violation(&e) => {
            info!("registration conflict on insert");
            Err(RegistrationError::AlreadyExists)
        }
        Err(e) => {
            error!(error = %e, "create account failed");
            Err(RegistrationError::Failed)
        }
    }
}

/// Check credentials. Unknown email and wrong password both yield `None`;
/// only the log tells them apart.
#[instrument(skip(db, password))]
pub async fn authenticate(db: &PgPool, email: &str, password: &str) -> Option<Account> {
    let account = match Account::find_by_email(db, email).await {
        Ok(Some(a)) => a,
        Ok(None) => {
            info!("auth failed: user not found");
            return None;
        }
        Err(e) => {
            error!(error = %e, "auth lookup failed");
            return None;
        }
    };

    match verify_password(password, &account.password_hash) {
        Ok(true) => {
            info!(user_id = %account.id, "auth success");
            Some(account)
        }
        Ok(false) => {
            info!(user_id = %account.id, "auth failed: wrong password");
            None
        }
        Err(e) => {
            error!(error = %e, user_id = %account.id, "stored password hash unusable");
            None
        }
    }
}

#[instrument(skip(db))]
pub async fn get_by_id(db: &PgPool, id: Uuid) -> Option<Account> {
    Account::find_by_id(db, id).await.unwrap_or_else(|e| {
        error!(error = %e, "get account failed");
        None
    })
}

/// All accounts, oldest first, without password hashes.
#[instrument(skip(db))]
pub async fn list_all(db: &PgPool) -> Vec<AccountSummary> {
    records::list_all::<AccountSummary>(db).await.unwrap_or_else(|e| {
        error!(error = %e, "list accounts failed");
        Vec::new()
    })
}

#[instrument(skip(db))]
pub async fn count(db: &PgPool) -> i64 {
    records::count::<AccountSummary>(db).await.unwrap_or_else(|e| {
        error!(error = %e, "count accounts failed");
        0
    })
}

/// Set or clear the account's profile image reference.
#[instrument(skip(db))]
pub async fn set_profile_image(db: &PgPool, id: Uuid, profile_image: Option<&str>) -> bool {
    match Account::update_profile_image(db, id, profile_image).await {
        Ok(changed) => {
            if !changed {
                warn!("profile image not updated: no such account");
            }
            changed
        }
        Err(e) => {
            error!(error = %e, "update profile image failed");
            false
        }
    }
}
