#![allow(unreachable_pub)]

mod error;

pub use error::ErrorKind;

/// The tft `Result` type
pub type Result<T> = std::result::Result<T, crate::ErrorKind>;
