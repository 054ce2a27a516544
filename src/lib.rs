#![doc = include_str!("../README.md")]

pub mod error;
pub mod memory;
pub mod middleware;
pub mod password;
pub mod scoring;
pub mod seed;
pub mod service;
pub mod task;
pub mod token;
pub mod types;
pub mod web;

// Re-exports for convenient access
pub use error::{CredentialError, Error, IdentityError, ServiceError};
pub use scoring::{ScoreSnapshot, score};
pub use task::{Priority, Task, TaskStatus};
pub use token::{Credential, CredentialAuthority, VerifiedSubject};
pub use types::{Account, AccountSummary, Identity, SessionId, TaskId, UserId};
