//! # Extranonce Prefix Factories
//!
//! Every channel opened by a server must search a distinct part of the nonce space. The server
//! does so by giving each channel a unique extranonce prefix: the bytes at the start of the
//! extranonce that the downstream can not change.
//!
//! A prefix is made of a static part, unique per server, followed by a big-endian counter. The
//! counter is incremented exactly once per allocated prefix and is never reused while the
//! factory lives.
//!
//! - [`ExtranoncePrefixFactoryStandard`] allocates full 32 bytes prefixes, standard channels can
//!   not roll the extranonce.
//! - [`ExtranoncePrefixFactoryExtended`] allocates `32 - allocation_size` bytes prefixes,
//!   leaving `allocation_size` bytes for the extended channel to roll.
//!
//! Factories are `Send + Sync` and meant to be shared between connections behind an
//! [`std::sync::Arc`].
//!
//! ```rust
//! use channels_sv2::extranonce_prefix::ExtranoncePrefixFactoryExtended;
//!
//! let factory = ExtranoncePrefixFactoryExtended::new(24, vec![0x01]).unwrap();
//! let prefix = factory.next_extranonce_prefix(8).unwrap();
//! assert_eq!(prefix, vec![0x01, 0, 0, 0, 0, 0, 0, 1]);
//! assert!(factory.next_extranonce_prefix(25).is_err());
//! ```

use std::{fmt, sync::Mutex};

use mining_sv2::MAX_EXTRANONCE_LEN;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtranoncePrefixFactoryError {
    /// The static prefix leaves no room for the counter.
    StaticPrefixTooLong,
    /// The allocation size is larger than an extranonce, or leaves no room for the counter.
    InvalidAllocationSize,
    /// The downstream asked for more rolling bytes than the factory leaves.
    RequestedMinExtranonceSizeTooLarge,
    /// The counter mutex is poisoned.
    LockError,
    /// Every counter value that fits in the prefix was already used.
    MaxValueReached,
}

impl fmt::Display for ExtranoncePrefixFactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ExtranoncePrefixFactoryError::*;
        match self {
            StaticPrefixTooLong => write!(f, "Static prefix leaves no room for the counter"),
            InvalidAllocationSize => write!(f, "Invalid allocation size"),
            RequestedMinExtranonceSizeTooLarge => {
                write!(f, "Requested min extranonce size is too large")
            }
            LockError => write!(f, "Extranonce prefix counter lock poisoned"),
            MaxValueReached => write!(f, "No more extranonce prefixes available"),
        }
    }
}

impl std::error::Error for ExtranoncePrefixFactoryError {}

/// Static prefix and counter shared by both factories.
#[derive(Debug)]
struct PrefixCounter {
    static_prefix: Vec<u8>,
    // last value handed out, the first prefix uses 1
    counter: Mutex<u64>,
}

impl PrefixCounter {
    fn new(static_prefix: Vec<u8>) -> Self {
        Self {
            static_prefix,
            counter: Mutex::new(0),
        }
    }

    /// Returns `static_prefix || be(counter)`, `prefix_len` bytes long.
    fn next(&self, prefix_len: usize) -> Result<Vec<u8>, ExtranoncePrefixFactoryError> {
        let counter_len = prefix_len - self.static_prefix.len();
        let mut counter = self
            .counter
            .lock()
            .map_err(|_| ExtranoncePrefixFactoryError::LockError)?;
        let next = counter
            .checked_add(1)
            .ok_or(ExtranoncePrefixFactoryError::MaxValueReached)?;
        let counter_bytes =
            counter_to_bytes(next, counter_len).ok_or(ExtranoncePrefixFactoryError::MaxValueReached)?;
        *counter = next;
        drop(counter);

        let mut prefix = Vec::with_capacity(prefix_len);
        prefix.extend_from_slice(&self.static_prefix);
        prefix.extend_from_slice(&counter_bytes);
        Ok(prefix)
    }

    fn current(&self) -> Result<u64, ExtranoncePrefixFactoryError> {
        self.counter
            .lock()
            .map(|c| *c)
            .map_err(|_| ExtranoncePrefixFactoryError::LockError)
    }
}

/// Big-endian `value` on exactly `len` bytes, `None` if it does not fit.
fn counter_to_bytes(value: u64, len: usize) -> Option<Vec<u8>> {
    let be = value.to_be_bytes();
    if len >= be.len() {
        let mut bytes = vec![0; len - be.len()];
        bytes.extend_from_slice(&be);
        Some(bytes)
    } else {
        let (dropped, kept) = be.split_at(be.len() - len);
        if dropped.iter().any(|b| *b != 0) {
            return None;
        }
        Some(kept.to_vec())
    }
}

/// Allocates 32 bytes extranonce prefixes for standard channels.
#[derive(Debug)]
pub struct ExtranoncePrefixFactoryStandard {
    inner: PrefixCounter,
}

impl ExtranoncePrefixFactoryStandard {
    /// Fails with `StaticPrefixTooLong` if `static_prefix` is 32 bytes or more.
    pub fn new(static_prefix: Vec<u8>) -> Result<Self, ExtranoncePrefixFactoryError> {
        if static_prefix.len() >= MAX_EXTRANONCE_LEN {
            return Err(ExtranoncePrefixFactoryError::StaticPrefixTooLong);
        }
        Ok(Self {
            inner: PrefixCounter::new(static_prefix),
        })
    }

    pub fn next_extranonce_prefix(&self) -> Result<Vec<u8>, ExtranoncePrefixFactoryError> {
        let prefix = self.inner.next(MAX_EXTRANONCE_LEN)?;
        debug!("Allocated standard extranonce prefix {}", hex::encode(&prefix));
        Ok(prefix)
    }

    pub fn get_static_prefix(&self) -> &[u8] {
        &self.inner.static_prefix
    }

    /// Last counter value handed out, 0 if no prefix was allocated yet.
    pub fn get_counter(&self) -> Result<u64, ExtranoncePrefixFactoryError> {
        self.inner.current()
    }
}

/// Allocates extranonce prefixes for extended channels, leaving `allocation_size` bytes of the
/// extranonce to the downstream.
#[derive(Debug)]
pub struct ExtranoncePrefixFactoryExtended {
    inner: PrefixCounter,
    allocation_size: usize,
}

impl ExtranoncePrefixFactoryExtended {
    /// Fails with `InvalidAllocationSize` unless the `32 - allocation_size` bytes prefix has at
    /// least one byte for the counter after `static_prefix`.
    pub fn new(
        allocation_size: usize,
        static_prefix: Vec<u8>,
    ) -> Result<Self, ExtranoncePrefixFactoryError> {
        if allocation_size > MAX_EXTRANONCE_LEN
            || MAX_EXTRANONCE_LEN - allocation_size <= static_prefix.len()
        {
            return Err(ExtranoncePrefixFactoryError::InvalidAllocationSize);
        }
        Ok(Self {
            inner: PrefixCounter::new(static_prefix),
            allocation_size,
        })
    }

    /// Allocates a new prefix if the downstream can roll at least `min_required_len` bytes on
    /// top of it. A rejected request does not consume a counter value.
    pub fn next_extranonce_prefix(
        &self,
        min_required_len: usize,
    ) -> Result<Vec<u8>, ExtranoncePrefixFactoryError> {
        if min_required_len > self.allocation_size {
            debug!(
                "Requested {} rolling bytes, only {} available",
                min_required_len, self.allocation_size
            );
            return Err(ExtranoncePrefixFactoryError::RequestedMinExtranonceSizeTooLarge);
        }
        let prefix = self.inner.next(self.prefix_len())?;
        debug!("Allocated extended extranonce prefix {}", hex::encode(&prefix));
        Ok(prefix)
    }

    pub fn get_allocation_size(&self) -> usize {
        self.allocation_size
    }

    /// Length of the allocated prefixes, `32 - allocation_size`.
    pub fn prefix_len(&self) -> usize {
        MAX_EXTRANONCE_LEN - self.allocation_size
    }

    pub fn get_static_prefix(&self) -> &[u8] {
        &self.inner.static_prefix
    }

    pub fn get_counter(&self) -> Result<u64, ExtranoncePrefixFactoryError> {
        self.inner.current()
    }
}
