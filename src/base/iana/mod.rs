//! IANA Definitions for DNS.
//!
//! This module contains the parameters from IANA registries that show up in
//! queries and replies. Each of them is a newtype around the raw integer
//! with associated constants for the well-defined values, so values the
//! registry doesn't (yet) know can still be represented.
//!
//! There are two methods `from_int()` and `to_int()` to convert from and to
//! raw integer values as well as implementations of the `From` trait for
//! these. `Display` prints the mnemonic where there is one.

pub use self::class::Class;
pub use self::opcode::Opcode;
pub use self::rcode::Rcode;
pub use self::rtype::Rtype;

#[macro_use]
mod macros;

pub mod class;
pub mod opcode;
pub mod rcode;
pub mod rtype;
