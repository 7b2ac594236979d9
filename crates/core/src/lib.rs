//! Kula Core Library
//!
//! Round progression, item and claim lifecycles, commitment derivation,
//! snapshot assembly, and SQLite storage for gift circles.

pub mod claims;
pub mod commitments;
pub mod error;
pub mod events;
pub mod invariants;
pub mod models;
pub mod rounds;
pub mod service;
pub mod snapshot;
pub mod storage;

pub use commitments::{derive_commitments, CommitmentEntry, CommitmentMap, MemberCommitments};
pub use error::{Error, Result};
pub use events::{EventSink, NullSink, RoomEvent};
pub use models::*;
pub use rounds::{RoomAction, Round, RoundInfo};
pub use service::{ItemPatch, RoomService};
pub use snapshot::{build_snapshot, MemberView, RoomSnapshot, RoundStatus};
pub use storage::{
    ClaimRepository, Database, ItemRepository, MembershipRepository, RoomRepository, Storage,
};
