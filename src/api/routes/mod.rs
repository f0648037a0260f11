//! API route modules.

pub mod convert;
pub mod info;
