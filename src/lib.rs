//! evgate: route authorization guard for the EV-charging marketplace.
//!
//! One pure [`policy`] drives two evaluators: the authoritative
//! [`edge`] evaluator (request time, validates credentials) and the advisory
//! [`client`] evaluator (page mount, cached identity only).

pub mod client;
pub mod config;
pub mod edge;
pub mod error;
pub mod identity;
pub mod policy;
pub mod server;

pub use client::{ClientEvaluator, NavigationHint, Navigator};
pub use edge::{AuthoritativeDecision, EdgeEvaluator};
pub use policy::{Decision, Identity, Policy, Role};

// Test-only printing helper: expands to eprintln! during tests and debug builds.
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In non-test builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        // Preserve formatting checks in release without producing code
        if false { let _ = format!($($arg)*); }
    });
}
