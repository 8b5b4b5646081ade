//! Saga orchestration for the user onboarding workflow.
//!
//! Onboarding spans four independently-deployed services, coordinated
//! purely through asynchronous messages:
//!
//! 1. Create credentials (auth service)
//! 2. Deliver the confirmation code (mail service)
//! 3. Assign the default role (auth service)
//! 4. Create the user profile (user service)
//!
//! The [`OnboardingEngine`] owns the transition table: each inbound event
//! is correlated to its instance, applied under a per-instance lock, and
//! typically emits the next command. A step failure terminates the
//! instance in `Failed`; completed steps are never compensated.
//!
//! This crate also hosts the two request/response workflows that live
//! alongside the saga: the [`UserDirectory`] fan-out aggregator and the
//! [`AccountDeletion`] ordered deletion sequence.

pub mod config;
pub mod deletion;
pub mod directory;
pub mod engine;
pub mod error;
pub mod instance;
pub mod memory;
pub mod postgres;
pub mod state;
pub mod store;

pub use config::Config;
pub use deletion::{AccountDeletion, DeletionReceipt};
pub use directory::{DirectoryTimeouts, UserDirectory};
pub use engine::OnboardingEngine;
pub use error::{DeletionError, DeletionStep, DirectoryError, SagaError, StoreError};
pub use instance::SagaInstance;
pub use memory::InMemorySagaStore;
pub use postgres::PostgresSagaStore;
pub use state::OnboardingState;
pub use store::SagaStore;
