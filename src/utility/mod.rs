//! Utility model.
//!
//! Converts the raw preference tables into per-(student, course) utilities:
//!
//! - **Base**: the student's own rank of the course, scaled to `[0, 1]`.
//! - **Friend bonus**: the summed preference weights of friends that hold
//!   the course *right now*. The bonus is re-evaluated against the live
//!   allocation at every decision point.
//! - **Combined**: `U = (1-λ)·Base + λ·FriendBonus / MaxFriendBonus`.
//!
//! The tables are built once and never change; only the allocation passed
//! in alongside them does.

mod model;
mod policy;
mod scale;

pub use model::{FriendEdge, UtilityModel, UtilityParts};
pub use policy::FriendPrefPolicy;
pub use scale::{pos_u, pos_u_friend, ScoreRange};
