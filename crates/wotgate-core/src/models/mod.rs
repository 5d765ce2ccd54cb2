//! Shared data models for Things and Offerings

mod form;
mod offering;
mod thing;

pub use form::*;
pub use offering::*;
pub use thing::*;
