//! cfscale-platform — Cloud Foundry v2 client for the autoscaler.
//!
//! Implements [`cfscale_autoscale::Platform`] over HTTP/1 using the
//! hyper client stack, with rustls for `https://` endpoints.
//!
//! # Endpoints
//!
//! | Method | Path | Used for |
//! |---|---|---|
//! | GET | `/v2/apps` | application list (paginated via `next_url`) |
//! | GET | `/v2/spaces/{guid}` | space name and owning org |
//! | GET | `/v2/organizations/{guid}` | org name |
//! | GET | `/v2/apps/{guid}/stats` | per-instance CPU and memory samples |
//! | PUT | `/v2/apps/{guid}?async=true` | set the instance count |
//!
//! Paths are relative to the configured API url, including any path
//! prefix. Stats are only requested for started applications; instance
//! entries that fail to decode are kept out of the averages. Space and
//! org names are cached for the duration of a single fetch.

pub mod client;
pub mod error;
mod tls;
pub mod v2;

pub use client::{CfClient, ClientConfig};
pub use error::{PlatformError, PlatformResult};
