//! Payment Network core library.
//!
//! This library provides the protocol layer of the Payment Network gateway:
//! the field model, the canonical request signer and the field encoder shared
//! by the hosted form and the direct API. Nothing in this crate performs I/O.

pub mod encoding;
pub mod errors;
pub mod signature;
pub mod types;
