//! Consistent-hash ring with virtual nodes for disk-level distribution
//! of auxiliary state (registry shards, cache partitions, etc.).

use objectio_common::hash::xxhash64;
use std::collections::HashMap;

/// Default number of virtual nodes per physical node.
pub const DEFAULT_VNODES: u32 = 100;

#[derive(Clone, Debug)]
struct VNode {
    hash: u64,
    node_id: String,
}

/// A consistent-hash ring. Each physical node expands into `vnodes`
/// virtual positions; lookups binary-search the sorted vnode table.
pub struct ConsistentHashRing {
    seed: u64,
    vnodes_per_node: u32,
    vnodes: Vec<VNode>,
    node_names: HashMap<String, String>,
}

impl ConsistentHashRing {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_vnodes(seed, DEFAULT_VNODES)
    }

    #[must_use]
    pub fn with_vnodes(seed: u64, vnodes_per_node: u32) -> Self {
        Self {
            seed,
            vnodes_per_node,
            vnodes: Vec::new(),
            node_names: HashMap::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_names.is_empty()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_names.len()
    }

    /// Adds a physical node, expanding it into `vnodes_per_node` ring
    /// positions, each at `xxhash(seed, "<node_name>:<i>")`.
    pub fn add_node(&mut self, node_id: &str, node_name: &str) {
        self.node_names
            .insert(node_id.to_string(), node_name.to_string());
        for i in 0..self.vnodes_per_node {
            let key = format!("{node_name}:{i}");
            let hash = xxhash64(self.seed, key.as_bytes());
            self.vnodes.push(VNode {
                hash,
                node_id: node_id.to_string(),
            });
        }
        self.vnodes.sort_by_key(|v| v.hash);
    }

    /// Removes a physical node and all of its virtual nodes.
    pub fn remove_node(&mut self, node_id: &str) {
        self.node_names.remove(node_id);
        self.vnodes.retain(|v| v.node_id != node_id);
    }

    /// Returns the physical node owning `name`, or `None` if the ring is
    /// empty.
    #[must_use]
    pub fn lookup(&self, name: &[u8]) -> Option<&str> {
        self.lookup_n(name, 1).into_iter().next()
    }

    /// Walks the ring clockwise from `name`'s position, collecting up to
    /// `n` distinct physical node ids.
    #[must_use]
    pub fn lookup_n(&self, name: &[u8], n: usize) -> Vec<&str> {
        if self.vnodes.is_empty() || n == 0 {
            return Vec::new();
        }
        let target = xxhash64(self.seed, name);
        let start = self
            .vnodes
            .partition_point(|v| v.hash < target)
            .min(self.vnodes.len() - 1);

        let mut out = Vec::with_capacity(n);
        let len = self.vnodes.len();
        for offset in 0..len {
            let idx = (start + offset) % len;
            let id = self.vnodes[idx].node_id.as_str();
            if !out.contains(&id) {
                out.push(id);
                if out.len() == n {
                    break;
                }
            }
        }
        out
    }
}
