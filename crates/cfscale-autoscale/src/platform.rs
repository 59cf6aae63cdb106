//! The hosting platform as seen by the autoscaler.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use cfscale_core::{AppId, AppSnapshot};

/// Snapshots of every application, keyed by platform id.
pub type Apps = BTreeMap<AppId, AppSnapshot>;

/// Boxed, sendable future returned by [`Platform`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Reads application state from, and sends scale requests to, the
/// hosting platform.
pub trait Platform: Send + Sync {
    /// Fetch a fresh snapshot of every application.
    ///
    /// Either every application is returned or the call fails; the
    /// autoscaler never acts on a partial listing.
    fn fetch_apps(&self) -> BoxFuture<'_, anyhow::Result<Apps>>;

    /// Ask the platform to run `desired` instances of `app`.
    fn scale<'a>(&'a self, app: &'a AppSnapshot, desired: u32) -> BoxFuture<'a, anyhow::Result<()>>;
}
