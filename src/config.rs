//! Sizing knobs for a [`Stack`](crate::stack::Stack).

use std::env;
use std::sync::OnceLock;

use crate::errors::{AdError, Result};

const ARENA_BYTES_VAR: &str = "REVAD_ARENA_BYTES";
const NODE_CAPACITY_VAR: &str = "REVAD_NODE_CAPACITY";

static ENV_CONFIG: OnceLock<Result<StackConfig>> = OnceLock::new();

/// Initial capacities for the arena and the node list.
///
/// Both only affect warm-up: the arena and the list grow on demand, and after
/// the first few evaluate/recover cycles they stop allocating regardless of
/// the starting size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackConfig {
    /// Bytes reserved for the first arena chunk.
    pub arena_bytes: usize,
    /// Node references reserved in the node list.
    pub node_capacity: usize,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            arena_bytes: 64 * 1024,
            node_capacity: 1024,
        }
    }
}

impl StackConfig {
    /// Sets the first arena chunk size.
    pub fn with_arena_bytes(mut self, bytes: usize) -> Self {
        self.arena_bytes = bytes;
        self
    }

    /// Sets the node list capacity.
    pub fn with_node_capacity(mut self, nodes: usize) -> Self {
        self.node_capacity = nodes;
        self
    }

    /// Reads `REVAD_ARENA_BYTES` and `REVAD_NODE_CAPACITY`, falling back to the
    /// defaults for unset or blank variables.
    ///
    /// The environment is read once per process; later calls return the
    /// cached outcome.
    pub fn from_env() -> Result<Self> {
        ENV_CONFIG
            .get_or_init(|| {
                Self::from_lookup(|key| env::var(key).ok())
            })
            .clone()
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            arena_bytes: parse_usize(ARENA_BYTES_VAR, lookup(ARENA_BYTES_VAR))?
                .unwrap_or(defaults.arena_bytes),
            node_capacity: parse_usize(NODE_CAPACITY_VAR, lookup(NODE_CAPACITY_VAR))?
                .unwrap_or(defaults.node_capacity),
        })
    }
}

fn parse_usize(key: &str, raw: Option<String>) -> Result<Option<usize>> {
    match raw {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AdError::Config(format!("{key}={value:?} is not a byte count"))),
        _ => Ok(None),
    }
}
