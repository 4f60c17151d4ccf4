//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (buffer size > 0, request count)
//! - Detect conflicting modes (receive vs. stream vs. named source)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: OfferConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::ToSocketAddrs;
use std::path::Path;

use crate::config::schema::{OfferConfig, UNLIMITED_REQUESTS};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint, collecting all failures.
pub fn validate_config(config: &OfferConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Host names are allowed; they must resolve to at least one address.
    let resolves = config
        .listener
        .bind_address
        .to_socket_addrs()
        .map(|mut addrs| addrs.next().is_some())
        .unwrap_or(false);
    if !resolves {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} does not resolve to a socket address", config.listener.bind_address),
        ));
    }

    if config.payload.buffer_size == 0 {
        errors.push(ValidationError::new("payload.buffer_size", "must be greater than 0"));
    }

    let max = config.limits.max_requests;
    if max != UNLIMITED_REQUESTS && max < 1 {
        errors.push(ValidationError::new(
            "limits.max_requests",
            format!("{max}: must be {UNLIMITED_REQUESTS} (unlimited) or at least 1"),
        ));
    }

    if let Some(name) = &config.payload.disposition {
        if !is_plain_file_name(name) {
            errors.push(ValidationError::new(
                "payload.disposition",
                format!("{name:?} is not a plain file name"),
            ));
        }
    }

    if config.payload.stream && !config.payload.reads_stdin() {
        errors.push(ValidationError::new(
            "payload.stream",
            "stream mode only applies to standard input",
        ));
    }

    if config.receive.enabled {
        if config.payload.stream {
            errors.push(ValidationError::new("receive.enabled", "cannot be combined with stream mode"));
        }
        if !config.payload.reads_stdin() {
            errors.push(ValidationError::new("receive.enabled", "cannot be combined with a file to offer"));
        }
    }

    if let Some(auth) = &config.auth {
        if auth.username.is_empty() || auth.username.contains(':') {
            errors.push(ValidationError::new("auth.username", "must be non-empty and without ':'"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('"')
        && !name.chars().any(char::is_control)
        && Path::new(name).file_name().map(|base| base == name).unwrap_or(false)
}
