//! Automation engine: persistence, scheduling, polling, and dispatch.
//!
//! An [`Engine`] owns the automation store and runs due automations on
//! each tick. A run polls its source, skips items already handled,
//! optionally invokes the coding assistant, and fans the result out to
//! the configured output channels, writing a marker-delimited block to
//! the automation's run log.

pub mod agent;
pub mod dedup;
pub mod engine;
pub mod gate;
pub mod output;
pub mod runlog;
pub mod source;
pub mod store;
pub mod template;

pub use agent::AgentRunner;
pub use engine::{Engine, EnginePaths};
pub use store::{AutomationStore, StoreError};
