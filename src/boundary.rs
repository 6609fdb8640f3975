//! Catches panics raised while a page loads or renders.
//!
//! A caught panic trips the boundary: it shows a [`FailurePanel`] instead of
//! the page until the user picks [`Recovery::Reset`] or [`Recovery::Reload`].
//! Ordinary `AppError`s are not failures of the boundary; they pass through
//! for the page to show as a banner.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use parking_lot::Mutex;
use tracing::error;

use crate::error::{AppError, AppResult};

pub const FAILURE_TITLE: &str = "Something went wrong!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Clear the boundary and render the page again.
    Reset,
    /// Rebuild application state from durable storage, then render again.
    Reload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailurePanel {
    pub title: &'static str,
    pub detail: String,
}

impl FailurePanel {
    pub fn recoveries(&self) -> [Recovery; 2] { [Recovery::Reset, Recovery::Reload] }

    pub fn to_error(&self) -> AppError { AppError::internal("render_panic", self.detail.as_str()) }
}

#[derive(Debug)]
pub enum Rendered<T> {
    Ok(T),
    /// A regular failure for the page to display.
    Failed(AppError),
    Crashed(FailurePanel),
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

#[derive(Debug, Default)]
pub struct ErrorBoundary {
    tripped: Mutex<Option<FailurePanel>>,
}

impl ErrorBoundary {
    pub fn new() -> Self { Self::default() }

    pub fn failure(&self) -> Option<FailurePanel> { self.tripped.lock().clone() }

    /// Run `work` unless the boundary is already tripped.
    pub async fn run<T, F>(&self, work: F) -> Rendered<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        if let Some(panel) = self.failure() {
            return Rendered::Crashed(panel);
        }
        match AssertUnwindSafe(work).catch_unwind().await {
            Ok(Ok(value)) => Rendered::Ok(value),
            Ok(Err(e)) => Rendered::Failed(e),
            Err(payload) => {
                let detail = panic_message(payload.as_ref());
                error!(target: "boundary", "page render panicked: {detail}");
                let panel = FailurePanel { title: FAILURE_TITLE, detail };
                *self.tripped.lock() = Some(panel.clone());
                Rendered::Crashed(panel)
            }
        }
    }

    /// Clear the tripped state. Returns whether there was anything to clear.
    pub fn reset(&self) -> bool { self.tripped.lock().take().is_some() }
}
