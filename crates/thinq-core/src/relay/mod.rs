//! Change-feed relay.
//!
//! Subscribes to one collection and forwards every change to the desk device
//! as a `create`/`update`/`delete` envelope. Changes are not deduplicated
//! across restarts: a fresh subscription replays existing documents as
//! `create`, so the device must apply actions idempotently per id.

mod bookkeeping;
mod forwarder;
mod listener;


pub use forwarder::{DeviceForwarder, PingOutcome};
pub use listener::{ChangeFeedRelay, StartOutcome};
