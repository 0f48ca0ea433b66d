//! Graceful shutdown coordination.
//!
//! The exporter runs in the foreground under a process supervisor
//! (systemd, a container runtime) rather than self-daemonizing, so this
//! module is limited to signal handling.

pub mod signals;
