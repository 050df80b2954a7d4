//! ObjectIO Placement - keyed-hash set assignment and consistent-hash
//! ring for disk-level distribution of auxiliary state.
//!
//! # Algorithms
//!
//! - **object_to_set**: deterministic `SipHash(deployment_key, name) mod
//!   set_count` assignment of an object name to an erasure set.
//! - **ConsistentHashRing**: virtual-node ring for mapping arbitrary keys
//!   (registry shards, cache partitions) onto physical disks with
//!   minimal remapping as nodes join or leave.
//! - **jump_hash**: Google's jump-consistent hash for dense, contiguous
//!   bucket ranges.
//!
//! # Example
//! ```
//! use objectio_placement::{object_to_set, ConsistentHashRing};
//! use objectio_common::DeploymentId;
//!
//! let id = DeploymentId::from_bytes([0u8; 16]);
//! let set = object_to_set(b"bucket/key", &id, 8).unwrap();
//! assert!(set < 8);
//!
//! let mut ring = ConsistentHashRing::new(1);
//! ring.add_node("disk-0", "disk-0");
//! assert_eq!(ring.lookup(b"bucket/key"), Some("disk-0"));
//! ```

pub mod jump;
pub mod object_to_set;
pub mod ring;

pub use jump::jump_hash;
pub use object_to_set::object_to_set;
pub use ring::{ConsistentHashRing, DEFAULT_VNODES};
