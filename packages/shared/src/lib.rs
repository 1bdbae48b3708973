//! Utilities shared by the Fieldlink server and console.

pub mod logger;
pub mod time;
