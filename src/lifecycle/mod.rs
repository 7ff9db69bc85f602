//! Host Lifecycle
//!
//! The host application reports its own transitions here; add-ons such as
//! [`SignalBundle`](crate::bundle::SignalBundle) observe them by registering a
//! [`LifecycleListener`].
//!
//! # Lifecycle Phases
//!
//! ```text
//! 1. Configuration Loading
//!    ↓
//! 2. Bundle run (listeners registered)
//!    ↓
//! 3. starting                          ← Listener hook
//!    ↓
//! 4. Server bind / startup work
//!    ↓
//! 5. started  | failure                ← Listener hook
//!    ↓
//! [Running...]
//!    ↓
//! 6. Shutdown Signal (SIGTERM/SIGINT)
//!    ↓
//! 7. stopping                          ← Listener hook
//!    ↓
//! 8. stopped                           ← Listener hook
//! ```
//!
//! A failure reported while stopping or stopped carries that fact in its
//! [`FailureContext`].

mod environment;
mod error;
mod shutdown;
mod traits;

pub use environment::{HostState, LifecycleEnvironment};
pub use error::{LifecycleError, Result};
pub use shutdown::{ShutdownHandler, shutdown_signal};
pub use traits::{FailureContext, LifecycleListener, LifecyclePhase};
