//! Basic DNS data.
//!
//! For now this is only the IANA parameter registries. Everything that
//! deals with wire format lives in the resolution engine.

#[macro_use]
pub mod iana;

pub use self::iana::{Class, Opcode, Rcode, Rtype};
