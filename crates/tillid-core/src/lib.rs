#![forbid(unsafe_code)]

//! Core types shared by every Tillid crate: the error taxonomy and the
//! namespace / algorithm URI constants used by DGWS, OIOSAML and
//! Liberty ID-WSF messages.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, ErrorKind, Result};
