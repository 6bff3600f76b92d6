//! Microsoft Graph plumbing for freetime.
//!
//! [`GraphContext`] is the entry point: it owns the configuration, the HTTP
//! client and the [`CredentialStore`], and runs every [`QueryKind`] through
//! the [`ResilientFetcher`], which refreshes an expired access token once
//! and replays the request.

pub mod config;
pub mod context;
pub mod credential;
pub mod error;
pub mod fetcher;
pub mod oauth;
pub mod query;
pub mod request;
pub mod schedule;

pub use config::GraphConfig;
pub use context::{FreeTime, GraphContext};
pub use credential::{Credential, CredentialStore};
pub use error::{GraphError, GraphErrorCode, GraphResult};
pub use fetcher::ResilientFetcher;
pub use oauth::{OAuthClient, TokenResponse};
pub use query::{CalendarEvent, Person, QueryKind, QueryOutput, UserProfile, subject_path};
pub use request::{FetchResponse, HttpMethod, RequestSpec, execute};
pub use schedule::{AvailabilityQuery, ScheduleRequest};
