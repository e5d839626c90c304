//! Block or await until a named event is resolved or rejected by another thread.
//!
//! Platform Bluetooth stacks report the completion of an operation through
//! delegate callbacks on their own threads. This crate turns that into a call
//! that returns the result: a caller registers interest in an event key (for
//! example `didDiscoverPeripheral:<peripheral id>`), issues the command that
//! triggers it, and then blocks or awaits until a callback thread calls
//! [`EventRegistry::resolve`] or [`EventRegistry::reject`] for the same key.
//!
//! ```no_run
//! # use std::thread;
//! use event_semaphore::{EventKey, EventRegistry, Outcome};
//!
//! let registry = EventRegistry::<i16>::new();
//! let key = EventKey::scoped("didReadRSSI", "1F2E3D4C");
//!
//! let outcome = registry.wait_for_with(key.clone(), || {
//!     let delegate = registry.clone();
//!     let key = key.clone();
//!     // issue the command; the stack calls back on another thread
//!     thread::spawn(move || delegate.resolve(key.as_str(), -61));
//! });
//!
//! match outcome {
//!     Outcome::Success(rssi) => println!("{rssi} dBm"),
//!     Outcome::Failure(error) => eprintln!("read failed: {error}"),
//!     Outcome::TimedOut => eprintln!("no response"),
//! }
//! ```
//!
//! See the `examples` directory for a simulated delegate.

pub mod error;
mod key;
mod outcome;
mod pending;
mod registry;
mod util;

pub use error::{Error, ErrorKind, Result};
pub use key::*;
pub use outcome::*;
pub use pending::*;
pub use registry::*;
