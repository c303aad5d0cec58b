//! Identifier types and the Snowflake ID generator.
//!
//! Every identifier minted by the ledger comes from an [`IdGenerator`]: a
//! 63-bit, time-ordered integer laid out as
//!
//! ```text
//! | 41 bits: ms since EPOCH_MILLIS | 10 bits: worker id | 12 bits: sequence |
//! ```
//!
//! External identifiers (orders, ledger entries) wrap a generator ID in the
//! human-readable `<PREFIX>_<unix_seconds>_<id>` form.
//!
//! # Macro-based ID Types
//!
//! The `prefixed_id_type!` macro reduces boilerplate for the external identifier
//! types, ensuring consistent serialization, parsing, and display.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// ============================================================================
// Layout
// ============================================================================

/// Custom epoch: 2024-01-01 00:00:00 UTC, in milliseconds.
pub const EPOCH_MILLIS: i64 = 1_704_067_200_000;

/// Number of bits reserved for the worker ID.
pub const WORKER_ID_BITS: u32 = 10;

/// Number of bits reserved for the per-millisecond sequence.
pub const SEQUENCE_BITS: u32 = 12;

/// Largest valid worker ID (1023).
pub const MAX_WORKER_ID: u16 = (1 << WORKER_ID_BITS) - 1;

/// Largest sequence value within one millisecond (4095).
pub const MAX_SEQUENCE: i64 = (1 << SEQUENCE_BITS) - 1;

const WORKER_ID_SHIFT: u32 = SEQUENCE_BITS;
const TIMESTAMP_SHIFT: u32 = WORKER_ID_BITS + SEQUENCE_BITS;

// ============================================================================
// Snowflake
// ============================================================================

/// A generator-issued 63-bit identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snowflake(i64);

impl Snowflake {
    /// Wrap a raw value (e.g. read back from storage).
    #[must_use]
    pub const fn from_i64(value: i64) -> Self {
        Self(value)
    }

    /// Return the raw value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Unix timestamp in milliseconds encoded in this ID.
    #[must_use]
    pub const fn timestamp_millis(self) -> i64 {
        (self.0 >> TIMESTAMP_SHIFT) + EPOCH_MILLIS
    }

    /// Worker ID encoded in this ID.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn worker_id(self) -> u16 {
        ((self.0 >> WORKER_ID_SHIFT) & MAX_WORKER_ID as i64) as u16
    }

    /// Sequence number encoded in this ID.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn sequence(self) -> u16 {
        (self.0 & MAX_SEQUENCE) as u16
    }

    /// Big-endian bytes; sorts the same way as the numeric value for IDs >= 0.
    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Debug for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snowflake({})", self.0)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Snowflake {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<i64>() {
            Ok(value) if value >= 0 => Ok(Self(value)),
            _ => Err(IdError::InvalidFormat {
                kind: "snowflake",
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Millisecond wall clock consulted by the generator.
pub trait Clock: Send + Sync {
    /// Current Unix time in milliseconds.
    fn now_millis(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

// ============================================================================
// Generator
// ============================================================================

#[derive(Debug)]
struct GeneratorState {
    last_millis: i64,
    sequence: i64,
}

/// Snowflake ID generator.
///
/// One instance per worker node; no two live generators in a deployment may
/// share a worker ID. The instance is shared through `Arc` by every component
/// that mints IDs.
pub struct IdGenerator {
    worker_id: u16,
    clock: Arc<dyn Clock>,
    state: Mutex<GeneratorState>,
}

impl IdGenerator {
    /// Create a generator backed by the system clock.
    ///
    /// # Errors
    ///
    /// Returns `IdError::InvalidWorkerId` if `worker_id` exceeds [`MAX_WORKER_ID`].
    pub fn new(worker_id: u16) -> Result<Self, IdError> {
        Self::with_clock(worker_id, Arc::new(SystemClock))
    }

    /// Create a generator backed by a custom clock.
    ///
    /// # Errors
    ///
    /// Returns `IdError::InvalidWorkerId` if `worker_id` exceeds [`MAX_WORKER_ID`].
    pub fn with_clock(worker_id: u16, clock: Arc<dyn Clock>) -> Result<Self, IdError> {
        if worker_id > MAX_WORKER_ID {
            return Err(IdError::InvalidWorkerId { worker_id });
        }

        Ok(Self {
            worker_id,
            clock,
            state: Mutex::new(GeneratorState {
                last_millis: EPOCH_MILLIS,
                sequence: 0,
            }),
        })
    }

    /// The worker ID baked into every emitted ID.
    #[must_use]
    pub const fn worker_id(&self) -> u16 {
        self.worker_id
    }

    /// Emit the next ID.
    ///
    /// When the 12-bit sequence is exhausted within one millisecond the call
    /// spins until the clock advances.
    ///
    /// # Errors
    ///
    /// Returns `IdError::ClockRegression` if the clock reads earlier than the
    /// last emitted timestamp. The generator must then be treated as unhealthy.
    pub fn next_id(&self) -> Result<Snowflake, IdError> {
        let mut state = self.state.lock();
        let mut now = self.clock.now_millis();

        if now < state.last_millis {
            tracing::error!(
                worker_id = self.worker_id,
                last_millis = state.last_millis,
                now_millis = now,
                "Clock moved backwards, refusing to issue ID"
            );
            return Err(IdError::ClockRegression {
                last_millis: state.last_millis,
                now_millis: now,
            });
        }

        if now == state.last_millis {
            state.sequence = (state.sequence + 1) & MAX_SEQUENCE;
            if state.sequence == 0 {
                while now <= state.last_millis {
                    std::hint::spin_loop();
                    now = self.clock.now_millis();
                }
            }
        } else {
            state.sequence = 0;
        }

        state.last_millis = now;

        Ok(Snowflake(
            ((now - EPOCH_MILLIS) << TIMESTAMP_SHIFT)
                | (i64::from(self.worker_id) << WORKER_ID_SHIFT)
                | state.sequence,
        ))
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator")
            .field("worker_id", &self.worker_id)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Account IDs
// ============================================================================

/// An opaque account identifier supplied by the surrounding system.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i64);

impl AccountId {
    /// Wrap a raw account ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Return the raw value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for AccountId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(Self)
            .map_err(|_| IdError::InvalidFormat {
                kind: "account",
                value: s.to_string(),
            })
    }
}

// ============================================================================
// External IDs
// ============================================================================

/// Macro to define a `<PREFIX>_<unix_seconds>_<id>` identifier type.
///
/// The generated type orders by its generator ID, so sorting by ID is sorting
/// by issue time. It serializes as its string form.
macro_rules! prefixed_id_type {
    ($name:ident, $prefix:literal, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name {
            id: Snowflake,
            issued_at: i64,
        }

        impl $name {
            /// Prefix used in the string form.
            pub const PREFIX: &'static str = $prefix;

            /// Mint a new identifier from the generator.
            ///
            /// # Errors
            ///
            /// Propagates `IdError::ClockRegression` from the generator.
            pub fn issue(generator: &IdGenerator) -> Result<Self, IdError> {
                let id = generator.next_id()?;
                Ok(Self::from_snowflake(id))
            }

            /// Build the identifier for an existing generator ID.
            #[must_use]
            pub const fn from_snowflake(id: Snowflake) -> Self {
                Self {
                    id,
                    issued_at: id.timestamp_millis().div_euclid(1000),
                }
            }

            /// The generator-issued numeric suffix.
            #[must_use]
            pub const fn snowflake(&self) -> Snowflake {
                self.id
            }

            /// Unix seconds embedded in the string form.
            #[must_use]
            pub const fn issued_at(&self) -> i64 {
                self.issued_at
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let invalid = || IdError::InvalidFormat {
                    kind: stringify!($name),
                    value: s.to_string(),
                };

                let mut parts = s.splitn(3, '_');
                let (Some(prefix), Some(issued_at), Some(id)) =
                    (parts.next(), parts.next(), parts.next())
                else {
                    return Err(invalid());
                };

                if prefix != Self::PREFIX {
                    return Err(invalid());
                }
                let issued_at = issued_at.parse::<i64>().map_err(|_| invalid())?;
                let id = id.parse::<Snowflake>().map_err(|_| invalid())?;

                Ok(Self { id, issued_at })
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}_{}", Self::PREFIX, self.issued_at, self.id)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }
    };
}

prefixed_id_type!(OrderId, "RCHORD", "A recharge order identifier (`RCHORD_<unix_seconds>_<id>`).");
prefixed_id_type!(TransactionId, "TX", "A ledger entry identifier (`TX_<unix_seconds>_<id>`).");

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur when issuing or parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The clock reads earlier than the last emitted timestamp.
    #[error("clock moved backwards: last={last_millis}ms, now={now_millis}ms")]
    ClockRegression {
        /// Last timestamp the generator emitted (or the epoch).
        last_millis: i64,
        /// Timestamp the clock just returned.
        now_millis: i64,
    },

    /// Worker ID does not fit in 10 bits.
    #[error("worker ID must be between 0 and {max}, got {worker_id}", max = MAX_WORKER_ID)]
    InvalidWorkerId {
        /// The rejected worker ID.
        worker_id: u16,
    },

    /// The input is not a valid identifier of the given kind.
    #[error("invalid {kind} identifier: {value:?}")]
    InvalidFormat {
        /// Identifier kind.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}
