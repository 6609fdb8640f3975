//! EventSphere client library: session state, role-gated routing, dashboard
//! menus and typed clients for the REST backend.

pub mod api;
pub mod app;
pub mod boundary;
pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod notify;
pub mod pages;
pub mod routing;
pub mod validation;

// Debug printing helper: expands to eprintln! in test and debug builds.
// Usage in tests: tprintln!("debug: {}", value);
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
