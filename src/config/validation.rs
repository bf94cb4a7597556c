//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route records (non-empty paths, unique names)
//! - Check host pages reference each other consistently
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::RouterConfig;

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `routes[2].name`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut names = HashSet::new();
    for (i, route) in config.routes.iter().enumerate() {
        if route.path.trim().is_empty() {
            errors.push(ValidationError::new(format!("routes[{i}].path"), "must not be empty"));
        }
        if !route.name.is_empty() && !names.insert(route.name.as_str()) {
            errors.push(ValidationError::new(
                format!("routes[{i}].name"),
                format!("duplicate route name `{}`", route.name),
            ));
        }
    }

    let host = &config.host;
    if host.max_stack_depth == 0 {
        errors.push(ValidationError::new("host.max_stack_depth", "must be greater than 0"));
    }
    if host.entry_page.trim().is_empty() {
        errors.push(ValidationError::new("host.entry_page", "must not be empty"));
    }

    if !host.pages.is_empty() {
        let known: HashSet<&str> = host.pages.iter().map(|p| trim(p)).collect();
        if !host.entry_page.is_empty() && !known.contains(trim(&host.entry_page)) {
            errors.push(ValidationError::new(
                "host.entry_page",
                format!("`{}` is not listed in host.pages", host.entry_page),
            ));
        }
        for (i, tab) in host.tab_pages.iter().enumerate() {
            if !known.contains(trim(tab)) {
                errors.push(ValidationError::new(
                    format!("host.tab_pages[{i}]"),
                    format!("`{tab}` is not listed in host.pages"),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn trim(page: &str) -> &str {
    page.trim_start_matches('/')
}
