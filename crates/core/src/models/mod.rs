//! Data models for Kula

mod room;
mod membership;
mod item;
mod claim;

pub use room::*;
pub use membership::*;
pub use item::*;
pub use claim::*;
