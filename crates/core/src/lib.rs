//! Thinner Core - Fundamental types shared by every codec

mod error;
mod id;
mod types;

pub use error::*;
pub use id::*;
pub use types::*;
