pub mod machine;
pub mod message;
pub mod session;

pub use machine::{DropReason, Step, SyncEvent, SyncMachine, TimerToken};
pub use message::HostMessage;
pub use session::{SessionClosed, SessionHandle, Snapshot, spawn};
