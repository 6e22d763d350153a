//! AlloKoli gateway: Vapi webhook ingestion and the authenticated Vapi
//! CRUD proxy behind the voice-assistant dashboard.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod configurator;
pub mod error;
pub mod gateway;
pub mod tools;
pub mod vapi;
pub mod webhook;

pub use config::Config;
pub use error::{Error, Result};
