// Church Admin - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod entities;
pub mod error;
pub mod registry;
pub mod store;
pub mod validation;
pub mod views;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use auth::{AdminCredentials, AuthError, Authenticator, HostedAuthenticator, StaticAuthenticator, User};
pub use config::{AppConfig, AuthMode, Backend};
pub use context::ChurchContext;
pub use db::{KeyValueStorage, MemoryStorage, SqliteStorage};
pub use entities::{
    ChurchEvent, ChurchEventPatch, Entity, EventStatus, EventType,
    FinanceRecord, FinanceRecordPatch, FinanceType, Gender,
    Member, MemberPatch, MemberStatus,
    NewChurchEvent, NewFinanceRecord, NewMember,
};
pub use error::{ConfigError, StoreError};
pub use registry::{ChurchRegistry, Registry};
pub use store::{EntityStore, LocalStore, RemoteStore, RestClient};
pub use validation::{Validate, ValidationError};
pub use views::{DashboardSummary, FinanceSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
