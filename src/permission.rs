//! Access grants applied to newly uploaded files
//!
//! Grants are parsed once at the configuration boundary into closed enums,
//! so an invalid role or principal can never reach the Drive API.

use std::fmt;
use std::str::FromStr;

use google_drive3::api::Permission;
use serde::Deserialize;

/// Permission validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    #[error("unknown role {0:?} (expected owner, reader, writer or commenter)")]
    UnknownRole(String),

    #[error("unknown principal type {0:?} (expected user, group, domain or anyone)")]
    UnknownPrincipalType(String),

    #[error("principal type {0} requires a value")]
    MissingValue(PrincipalType),

    #[error("principal type anyone does not take a value (got {0:?})")]
    UnexpectedValue(String),
}

/// Role granted by a permission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Reader,
    Writer,
    Commenter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Reader => "reader",
            Role::Writer => "writer",
            Role::Commenter => "commenter",
        }
    }
}

impl FromStr for Role {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "reader" => Ok(Role::Reader),
            "writer" => Ok(Role::Writer),
            "commenter" => Ok(Role::Commenter),
            other => Err(PermissionError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of principal a grant applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalType {
    User,
    Group,
    Domain,
    Anyone,
}

impl PrincipalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalType::User => "user",
            PrincipalType::Group => "group",
            PrincipalType::Domain => "domain",
            PrincipalType::Anyone => "anyone",
        }
    }
}

impl FromStr for PrincipalType {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(PrincipalType::User),
            "group" => Ok(PrincipalType::Group),
            "domain" => Ok(PrincipalType::Domain),
            "anyone" => Ok(PrincipalType::Anyone),
            other => Err(PermissionError::UnknownPrincipalType(other.to_string())),
        }
    }
}

impl fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity a grant applies to, carrying its address where one is needed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// A single account, by e-mail address
    User(String),
    /// A Google group, by e-mail address
    Group(String),
    /// Everyone in a domain
    Domain(String),
    /// Anyone with the link
    Anyone,
}

impl Principal {
    pub fn principal_type(&self) -> PrincipalType {
        match self {
            Principal::User(_) => PrincipalType::User,
            Principal::Group(_) => PrincipalType::Group,
            Principal::Domain(_) => PrincipalType::Domain,
            Principal::Anyone => PrincipalType::Anyone,
        }
    }
}

/// Untyped grant as it appears in configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawPermission {
    pub role: String,
    #[serde(rename = "type")]
    pub principal_type: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// A validated access grant
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawPermission")]
pub struct PermissionGrant {
    pub role: Role,
    pub principal: Principal,
}

impl PermissionGrant {
    pub fn new(role: Role, principal: Principal) -> Self {
        Self { role, principal }
    }

    /// Public read access, the default grant
    pub fn anyone_reader() -> Self {
        Self::new(Role::Reader, Principal::Anyone)
    }

    /// Validate an untyped (role, type, value) triple
    pub fn parse(
        role: &str,
        principal_type: &str,
        value: Option<&str>,
    ) -> Result<Self, PermissionError> {
        let role = role.parse::<Role>()?;
        let principal_type = principal_type.parse::<PrincipalType>()?;

        let principal = match (principal_type, value) {
            (PrincipalType::Anyone, None) => Principal::Anyone,
            (PrincipalType::Anyone, Some(v)) => {
                return Err(PermissionError::UnexpectedValue(v.to_string()))
            }
            (t, None) => return Err(PermissionError::MissingValue(t)),
            (PrincipalType::User, Some(v)) => Principal::User(v.to_string()),
            (PrincipalType::Group, Some(v)) => Principal::Group(v.to_string()),
            (PrincipalType::Domain, Some(v)) => Principal::Domain(v.to_string()),
        };

        Ok(Self { role, principal })
    }

    /// Build the Drive v3 permission resource for this grant
    pub fn to_request_body(&self) -> Permission {
        let mut body = Permission {
            role: Some(self.role.as_str().to_string()),
            type_: Some(self.principal.principal_type().as_str().to_string()),
            ..Default::default()
        };
        match &self.principal {
            Principal::User(email) | Principal::Group(email) => {
                body.email_address = Some(email.clone())
            }
            Principal::Domain(domain) => body.domain = Some(domain.clone()),
            Principal::Anyone => {}
        }
        body
    }
}

impl TryFrom<RawPermission> for PermissionGrant {
    type Error = PermissionError;

    fn try_from(raw: RawPermission) -> Result<Self, Self::Error> {
        Self::parse(&raw.role, &raw.principal_type, raw.value.as_deref())
    }
}

/// Ordered grants applied to every newly created file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSet {
    grants: Vec<PermissionGrant>,
}

impl PermissionSet {
    pub fn new(grants: Vec<PermissionGrant>) -> Self {
        Self { grants }
    }

    /// A set that applies no grants; files stay private to the service account
    pub fn empty() -> Self {
        Self { grants: Vec::new() }
    }

    /// Validate every raw grant, failing on the first invalid one
    pub fn from_raw(raw: Vec<RawPermission>) -> Result<Self, PermissionError> {
        let grants = raw
            .into_iter()
            .map(PermissionGrant::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { grants })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PermissionGrant> {
        self.grants.iter()
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self::new(vec![PermissionGrant::anyone_reader()])
    }
}
