use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::user::User;

pub fn authorize_owner_or_admin(principal: &User, resource_owner_id: Uuid) -> bool {
    principal.is_admin || principal.id == resource_owner_id
}

pub fn require_admin(principal: &User) -> bool {
    principal.is_admin
}

pub fn ensure_owner_or_admin(principal: &User, resource_owner_id: Uuid) -> Result<(), DomainError> {
    if authorize_owner_or_admin(principal, resource_owner_id) {
        Ok(())
    } else {
        Err(DomainError::Unauthorized)
    }
}

pub fn ensure_admin(principal: &User) -> Result<(), DomainError> {
    if require_admin(principal) {
        Ok(())
    } else {
        Err(DomainError::Unauthorized)
    }
}
