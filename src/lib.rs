//! `mailgunner`: compose transactional email for batch-capable provider APIs.
//!
//! This crate provides the core library for parsing free-text address
//! lists, composing provider-shaped messages in single or batch mode, and
//! staging attachment bytes as temporary files that are always cleaned up.

pub mod compose;
pub mod config;
pub mod error;
pub mod mailer;
pub mod model;
pub mod staging;
pub mod transport;
