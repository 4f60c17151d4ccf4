//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → cli.rs (command line flags override file values)
//!     → validation.rs (semantic checks)
//!     → OfferConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::AuthConfig;
pub use schema::ListenerConfig;
pub use schema::OfferConfig;
pub use schema::PayloadConfig;
pub use schema::ReceiveDestination;
pub use schema::RequestBudget;
