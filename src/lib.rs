//! Seeded social snake-draft course allocation.
//!
//! Allocates students to capacity-limited courses in three phases:
//!
//! - **Draft**: a snake draft over a seeded turn order. Each pick maximizes
//!   a utility that blends the student's own ranking with a bonus for
//!   friends already placed in the course.
//! - **Improve**: bounded local search, either pairwise course swaps or
//!   add-drop passes, with exact welfare deltas.
//! - **Measure**: per-student welfare, Gini/Jain/Theil/Atkinson indices and
//!   descriptive statistics.
//!
//! Every run is reproducible from its seed: ties between courses are broken
//! by a fixed cascade that ends in the course id, and all randomness comes
//! from one seeded stream consumed in a fixed order.
//!
//! # Example
//!
//! ```
//! use draft_alloc::{AllocationEngine, FriendPreferenceRecord, PreferenceRecord, RunConfig};
//!
//! let prefs = vec![
//!     PreferenceRecord::new("ana", "chem", 8.0, 1),
//!     PreferenceRecord::new("ana", "bio", 6.0, 2),
//!     PreferenceRecord::new("ben", "bio", 9.0, 1),
//!     PreferenceRecord::new("ben", "chem", 5.0, 2),
//! ];
//! let friends = vec![FriendPreferenceRecord::new("ana", "ben", "bio", 1, None)];
//! let config = RunConfig::default().with_cap_default(2).with_max_courses(1).with_seed(3);
//!
//! let result = AllocationEngine::new(&prefs, &friends, &[], config)?.run();
//! assert_eq!(result.allocation.len(), 2);
//! # Ok::<(), draft_alloc::AllocError>(())
//! ```
//!
//! # Logging
//!
//! Phases emit [`tracing`] events (`info` per phase, `debug` per pick or
//! applied move). The crate never installs a subscriber.

pub mod config;
pub mod draft;
pub mod engine;
pub mod error;
pub mod improve;
pub mod metrics;
pub mod ranking;
pub mod records;
pub mod rng;
pub mod state;
pub mod utility;

pub use config::{ImproveMode, RunConfig};
pub use engine::{AllocationEngine, RunResult};
pub use error::{AllocError, AllocResult};
pub use records::{CourseId, FriendPreferenceRecord, LambdaRecord, PreferenceRecord, StudentId};
pub use utility::FriendPrefPolicy;
