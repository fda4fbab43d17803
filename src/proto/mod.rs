//! RouterOS binary API wire protocol: length-prefixed words, incremental
//! sentence assembly, and the authenticated command session.

pub mod codec;
pub mod parser;
pub mod session;
