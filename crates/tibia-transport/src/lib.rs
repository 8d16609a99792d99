//! Framed, optionally-XTEA-encrypted transport over an async byte stream.
//!
//! A session owns one [`Endpoint`] per side of a proxied connection. Each
//! endpoint splits its stream into an exclusively-owned read half (driven by
//! that side's pump task) and a mutex-guarded write half (shared with
//! automation modules that inject packets out of band).

mod endpoint;
mod error;
mod frame;

pub use endpoint::Endpoint;
pub use error::{Result, TransportError};
pub use frame::{read_message, write_message};
