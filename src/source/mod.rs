//! Source acquisition
//!
//! Turns a `[SOURCE]` string into an isolated checkout directory.

pub mod checkout;
pub mod reference;

pub use checkout::{overlay_changes, CheckoutBuilder};
pub use reference::{Provider, SourceReference};
