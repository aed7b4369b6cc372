//! Decrypt attempt limiting: at most `max_attempts` per identity per window,
//! counted locally for anonymous users and by a remote transactional counter
//! for signed-in users.

pub mod clock;
pub mod config;
pub mod counter;
pub mod error;
pub mod gate;
pub mod identity;
pub mod limiter;
pub mod local;
pub mod record;
pub mod remote;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LimiterConfig;
pub use counter::TransactionalCounter;
pub use error::LimiterError;
pub use gate::AttemptGate;
pub use identity::Identity;
pub use limiter::AttemptLimiter;
pub use local::LocalAttemptLimiter;
pub use record::AttemptRecord;
pub use remote::{
    AttemptTransport, RemoteAttemptLimiter, RemoteAttemptResponse, TransportError,
    TransportErrorKind,
};
pub use store::{KeyValueStore, MemoryStore};
pub use types::{AttemptAction, AttemptStatus};
