//! Snowflake comment ids.
//!
//! From the high bits down a snowflake holds the milliseconds since an
//! [`Epoch`] (42 bits), a worker id (5 bits), a process id (5 bits) and a
//! sequence number within the millisecond (12 bits). Printed in decimal they
//! sort by creation time.
//!
//! See <https://discord.com/developers/docs/reference#snowflakes>

use derive_where::derive_where;
use std::{
    fmt::{Display, Formatter},
    marker::PhantomData,
};
use thiserror::Error;
use time::UtcDateTime;

const TIMESTAMP_BITS: u32 = 42;
const WORKER_ID_BITS: u32 = 5;
const PROCESS_ID_BITS: u32 = 5;
const SEQUENCE_BITS: u32 = 12;

const PROCESS_ID_SHIFT: u32 = SEQUENCE_BITS;
const WORKER_ID_SHIFT: u32 = PROCESS_ID_SHIFT + PROCESS_ID_BITS;
const TIMESTAMP_SHIFT: u32 = WORKER_ID_SHIFT + WORKER_ID_BITS;

const MAX_TIMESTAMP: u64 = (1 << TIMESTAMP_BITS) - 1;
const MAX_SEQUENCE: u16 = (1 << SEQUENCE_BITS) - 1;

pub trait Epoch {
    const EPOCH_TIME: UtcDateTime;
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Snowflake part was out of range for creation: {0}")]
pub struct SnowflakePartOutOfRangeError<TInt>(TInt);

macro_rules! snowflake_part {
    ($(#[$meta:meta])* $name:ident, bits = $bits:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
        pub struct $name(u8);

        impl $name {
            #[must_use]
            pub fn new(id: u8) -> Option<Self> {
                (u32::from(id) < 1 << $bits).then_some(Self(id))
            }

            #[must_use]
            pub fn new_unchecked(id: u8) -> Self {
                Self::new(id).expect(concat!(stringify!($name), " out of range."))
            }

            #[must_use]
            pub fn get(self) -> u8 {
                self.0
            }
        }

        impl TryFrom<u8> for $name {
            type Error = SnowflakePartOutOfRangeError<u8>;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                Self::new(value).ok_or(SnowflakePartOutOfRangeError(value))
            }
        }
    };
}

snowflake_part!(
    /// Tells apart machines allocating from the same id space.
    WorkerId,
    bits = WORKER_ID_BITS
);
snowflake_part!(
    /// Tells apart processes on one worker.
    ProcessId,
    bits = PROCESS_ID_BITS
);

#[derive_where(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct Snowflake<SnowflakeEpoch>(u64, PhantomData<SnowflakeEpoch>);

impl<SnowflakeEpoch> Snowflake<SnowflakeEpoch> {
    fn from_parts(millis: u64, worker_id: WorkerId, process_id: ProcessId, sequence: u16) -> Self {
        let snowflake = (millis & MAX_TIMESTAMP) << TIMESTAMP_SHIFT
            | u64::from(worker_id.get()) << WORKER_ID_SHIFT
            | u64::from(process_id.get()) << PROCESS_ID_SHIFT
            | u64::from(sequence & MAX_SEQUENCE);

        Self(snowflake, PhantomData)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl<SnowflakeEpoch> Display for Snowflake<SnowflakeEpoch> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Milliseconds from the epoch to `time`. Times before the epoch count as the
/// epoch itself.
fn millis_since<SnowflakeEpoch: Epoch>(time: UtcDateTime) -> u64 {
    u64::try_from((time - SnowflakeEpoch::EPOCH_TIME).whole_milliseconds())
        .unwrap_or(0)
        .min(MAX_TIMESTAMP)
}

/// Hands out snowflakes for one worker/process pair.
///
/// Every snowflake is larger than the one before it. When a millisecond's
/// 4096 sequence numbers run out, or the clock steps backwards, the generator
/// keeps counting from the last millisecond it used instead of reusing one.
#[derive_where(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct SnowflakeGenerator<SnowflakeEpoch> {
    worker_id: WorkerId,
    process_id: ProcessId,
    last: Option<(u64, u16)>,
    phantom_data: PhantomData<SnowflakeEpoch>,
}

impl<SnowflakeEpoch: Epoch> SnowflakeGenerator<SnowflakeEpoch> {
    #[must_use]
    pub fn new(worker_id: WorkerId, process_id: ProcessId) -> Self {
        Self {
            worker_id,
            process_id,
            last: None,
            phantom_data: PhantomData,
        }
    }

    pub fn generate_at(&mut self, time: UtcDateTime) -> Snowflake<SnowflakeEpoch> {
        let now = millis_since::<SnowflakeEpoch>(time);
        let (millis, sequence) = match self.last {
            Some((last, sequence)) if now <= last => {
                if sequence < MAX_SEQUENCE {
                    (last, sequence + 1)
                } else {
                    (last + 1, 0)
                }
            }
            _ => (now, 0),
        };
        self.last = Some((millis, sequence));

        Snowflake::from_parts(millis, self.worker_id, self.process_id, sequence)
    }

    pub fn generate(&mut self) -> Snowflake<SnowflakeEpoch> {
        self.generate_at(UtcDateTime::now())
    }
}
