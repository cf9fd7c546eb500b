use std::sync::Arc;

use uuid::Uuid;

use crate::auth::{hash_password, verify_password, TokenKind, TokenService};
use crate::domain::errors::DomainError;
use crate::domain::ports::UserRepository;
use crate::domain::user::{NewUser, User};

/// Column width of `users.email` and `users.name`.
const MAX_USER_FIELD_LEN: usize = 255;

/// Emails are stored and looked up without surrounding whitespace.
fn normalize_email(email: &str) -> &str {
    email.trim()
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub active: bool,
    /// Only honoured when the caller is an authenticated admin.
    pub admin: bool,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    pub fn signup(&self, account: NewAccount, caller: Option<&User>) -> Result<User, DomainError> {
        let email = normalize_email(&account.email);
        if email.is_empty() {
            return Err(DomainError::InvalidInput("email is required".to_string()));
        }
        for (field, value) in [("email", email), ("name", account.name.as_str())] {
            if value.chars().count() > MAX_USER_FIELD_LEN {
                return Err(DomainError::InvalidInput(format!(
                    "{} must be at most {} characters",
                    field, MAX_USER_FIELD_LEN
                )));
            }
        }
        if account.password.is_empty() {
            return Err(DomainError::InvalidInput("password is required".to_string()));
        }
        if self.users.find_by_email(email)?.is_some() {
            return Err(DomainError::DuplicateEmail);
        }

        let is_admin = account.admin && caller.is_some_and(|c| c.is_admin);
        if account.admin && !is_admin {
            log::warn!("Ignoring admin flag on signup for {} from a non-admin caller", email);
        }

        let user = self.users.create(NewUser {
            name: account.name,
            email: email.to_string(),
            password_hash: hash_password(&account.password)?,
            active: account.active,
            is_admin,
        })?;
        log::info!("Created account {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Does not reveal whether the email exists.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let Some(user) = self.users.find_by_email(normalize_email(email))? else {
            return Err(DomainError::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash) {
            return Err(DomainError::InvalidCredentials);
        }
        Ok(user)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<TokenPair, DomainError> {
        let user = self.authenticate(email, password)?;
        log::info!("User {} logged in", user.id);
        Ok(TokenPair {
            access_token: self.tokens.issue_access(user.id)?,
            refresh_token: self.tokens.issue_refresh(user.id)?,
        })
    }

    /// Form-based password exchange; yields an access token only.
    pub fn login_form(&self, username: &str, password: &str) -> Result<String, DomainError> {
        let user = self.authenticate(username, password)?;
        self.tokens.issue_access(user.id)
    }

    pub fn refresh(&self, refresh_token: &str) -> Result<String, DomainError> {
        let user_id = self.verify(refresh_token, TokenKind::Refresh)?;
        let user = self.user(user_id)?;
        self.tokens.issue_access(user.id)
    }

    pub fn resolve_principal(&self, access_token: &str) -> Result<User, DomainError> {
        let user_id = self.verify(access_token, TokenKind::Access)?;
        self.user(user_id)
    }

    /// Creates the admin account if no user owns `email` yet. Returns whether
    /// an account was created.
    pub fn ensure_admin_account(&self, email: &str, password: &str) -> Result<bool, DomainError> {
        let email = normalize_email(email);
        if self.users.find_by_email(email)?.is_some() {
            return Ok(false);
        }
        let user = self.users.create(NewUser {
            name: "Administrator".to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            active: true,
            is_admin: true,
        })?;
        log::info!("Bootstrapped admin account {} ({})", user.id, user.email);
        Ok(true)
    }

    #[cfg(test)]
    pub(crate) fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    fn verify(&self, token: &str, kind: TokenKind) -> Result<Uuid, DomainError> {
        self.tokens.verify_kind(token, kind).inspect_err(|e| {
            log::warn!("Rejected bearer token: {}", e);
        })
    }

    fn user(&self, id: Uuid) -> Result<User, DomainError> {
        self.users.find_by_id(id)?.ok_or(DomainError::Unauthorized)
    }
}
