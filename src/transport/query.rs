//! Structured search filters
//!
//! A [`DriveQuery`] renders to the Drive `q` language for the real API and
//! can also be evaluated directly against a [`File`], which is how the
//! in-memory transport answers queries.

use google_drive3::api::File;

use super::FOLDER_MIME_TYPE;

/// Constraint on an object's MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeFilter {
    Is(String),
    IsNot(String),
}

/// Search filter over Drive objects; unset fields do not constrain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveQuery {
    /// Exact name match
    pub name: Option<String>,
    pub mime_type: Option<MimeFilter>,
    /// Id of a folder the object must be directly inside
    pub parent: Option<String>,
}

impl DriveQuery {
    /// Every object visible to the account
    pub fn all() -> Self {
        Self::default()
    }

    /// Objects of any type with exactly this name
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Folders with exactly this name
    pub fn folder_named(name: &str) -> Self {
        Self::named(name).only_folders()
    }

    /// Direct children of a folder
    pub fn children_of(parent: &str) -> Self {
        Self::all().in_parent(Some(parent))
    }

    /// Restrict to direct children of `parent`; `None` leaves the query unscoped
    pub fn in_parent(mut self, parent: Option<&str>) -> Self {
        self.parent = parent.map(str::to_string);
        self
    }

    pub fn only_folders(mut self) -> Self {
        self.mime_type = Some(MimeFilter::Is(FOLDER_MIME_TYPE.to_string()));
        self
    }

    pub fn excluding_folders(mut self) -> Self {
        self.mime_type = Some(MimeFilter::IsNot(FOLDER_MIME_TYPE.to_string()));
        self
    }

    /// Render as a Drive v3 search expression. Trashed objects are always excluded.
    pub fn to_query_string(&self) -> String {
        let mut clauses = Vec::new();
        if let Some(name) = &self.name {
            clauses.push(format!("name = '{}'", escape_value(name)));
        }
        match &self.mime_type {
            Some(MimeFilter::Is(m)) => clauses.push(format!("mimeType = '{}'", escape_value(m))),
            Some(MimeFilter::IsNot(m)) => {
                clauses.push(format!("mimeType != '{}'", escape_value(m)))
            }
            None => {}
        }
        if let Some(parent) = &self.parent {
            clauses.push(format!("'{}' in parents", escape_value(parent)));
        }
        clauses.push("trashed = false".to_string());
        clauses.join(" and ")
    }

    /// Evaluate the filter against an object
    pub fn matches(&self, file: &File) -> bool {
        if let Some(name) = &self.name {
            if file.name.as_deref() != Some(name.as_str()) {
                return false;
            }
        }
        let mime = file.mime_type.as_deref();
        match &self.mime_type {
            Some(MimeFilter::Is(m)) if mime != Some(m.as_str()) => return false,
            Some(MimeFilter::IsNot(m)) if mime == Some(m.as_str()) => return false,
            _ => {}
        }
        if let Some(parent) = &self.parent {
            let in_parent = file
                .parents
                .as_ref()
                .map(|ps| ps.iter().any(|p| p == parent))
                .unwrap_or(false);
            if !in_parent {
                return false;
            }
        }
        true
    }
}

/// Escape a string literal for the Drive query language
fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
