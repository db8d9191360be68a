//! Document id generation.
//!
//! The default [`TimestampIdGenerator`] produces ids of the form
//! `doc_<unix millis>_<9 base-36 chars>`. The random suffix makes collisions
//! within one millisecond improbable, not impossible; callers that need
//! stronger guarantees across writers can switch to [`UuidIdGenerator`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc};
use uuid::Uuid;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Source of ids for documents created without an explicit id.
pub trait IdGenerator: Send + Sync + Debug {
    fn generate(&self) -> String;
}

/// `<prefix>_<unix millis>_<random base-36 suffix>`.
#[derive(Debug, Clone)]
pub struct TimestampIdGenerator {
    prefix: String,
}

impl TimestampIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for TimestampIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ID_PREFIX)
    }
}

impl IdGenerator for TimestampIdGenerator {
    fn generate(&self) -> String {
        format!(
            "{}_{}_{}",
            self.prefix,
            Utc::now().timestamp_millis(),
            random_suffix()
        )
    }
}

fn random_suffix() -> String {
    // The low bits of a v4 uuid are all random.
    let mut bits = Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(SUFFIX_LEN);

    for _ in 0..SUFFIX_LEN {
        suffix.push(BASE36[(bits % 36) as usize] as char);
        bits /= 36;
    }

    suffix
}

/// Random v4 uuids in hyphenated form.
#[derive(Debug, Clone, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

pub const DEFAULT_ID_PREFIX: &str = "doc";

/// Serializable choice of id generator, used by
/// [`StoreConfig`](crate::config::StoreConfig).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdStrategy {
    /// Timestamp plus random suffix, with the given prefix.
    Timestamp {
        #[serde(default = "default_prefix")]
        prefix: String,
    },
    /// Random v4 uuids.
    Uuid,
}

fn default_prefix() -> String {
    DEFAULT_ID_PREFIX.to_string()
}

impl Default for IdStrategy {
    fn default() -> Self {
        IdStrategy::Timestamp { prefix: default_prefix() }
    }
}

impl IdStrategy {
    pub fn generator(&self) -> Arc<dyn IdGenerator> {
        match self {
            IdStrategy::Timestamp { prefix } => Arc::new(TimestampIdGenerator::new(prefix.clone())),
            IdStrategy::Uuid => Arc::new(UuidIdGenerator),
        }
    }
}
