//! Core data model types: addresses, attachments, and composed messages.

pub mod address;
pub mod attachment;
pub mod message;
