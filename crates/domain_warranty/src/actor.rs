//! The calling user and their roles

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use core_kernel::{CustomerId, UserId};
use crate::error::WarrantyError;

/// Roles granted by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    EvmStaff,
    ScStaff,
    ScTechnician,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::EvmStaff => "EVM_STAFF",
            Role::ScStaff => "SC_STAFF",
            Role::ScTechnician => "SC_TECHNICIAN",
            Role::Customer => "CUSTOMER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role name the identity provider sent that this system does not know
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    /// Accepts the bare name or the `ROLE_` prefixed authority form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.strip_prefix("ROLE_").unwrap_or(&upper) {
            "ADMIN" => Ok(Role::Admin),
            "EVM_STAFF" => Ok(Role::EvmStaff),
            "SC_STAFF" => Ok(Role::ScStaff),
            "SC_TECHNICIAN" => Ok(Role::ScTechnician),
            "CUSTOMER" => Ok(Role::Customer),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub roles: BTreeSet<Role>,
    /// Set when the user is linked to a customer record
    pub customer_id: Option<CustomerId>,
}

impl Actor {
    pub fn new(user_id: UserId, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            user_id,
            roles: roles.into_iter().collect(),
            customer_id: None,
        }
    }

    pub fn with_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.roles.contains(r))
    }

    pub fn require_any(&self, roles: &[Role]) -> Result<(), WarrantyError> {
        if self.has_any(roles) {
            Ok(())
        } else {
            let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
            Err(WarrantyError::forbidden(format!(
                "requires one of [{}]",
                names.join(", ")
            )))
        }
    }

    /// The customer the caller acts for; fails unless the caller is a linked customer
    pub fn require_customer(&self) -> Result<CustomerId, WarrantyError> {
        self.require_any(&[Role::Customer])?;
        self.customer_id
            .ok_or_else(|| WarrantyError::forbidden("user is not linked to a customer"))
    }
}
