//! Error type definitions.
//!
//! This module defines the error types for every stage of the pipeline and the
//! outcome categories tracked by the gateway.

use std::path::PathBuf;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Fatal errors raised while provisioning the GeoIP database.
///
/// None of these are retried; the caller decides whether to abort the process.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// The GeoIP directory could not be created for a reason other than already existing.
    #[error("Failed to create GeoIP directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The archive download could not be started or streamed.
    #[error("Failed to download GeoIP archive: {0}")]
    Download(#[from] ReqwestError),

    /// The archive source answered with a non-success status.
    #[error("GeoIP archive source responded with {0}")]
    DownloadStatus(reqwest::StatusCode),

    /// The archive was not on disk when extraction started.
    #[error("GeoIP archive {0:?} doesn't exist")]
    ArchiveMissing(PathBuf),

    /// Filesystem error while writing the archive or extracting entries.
    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    /// The blocking extraction task panicked or was cancelled.
    #[error("GeoIP extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The database file is missing or corrupt.
    #[error("Failed to open GeoIP database {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: maxminddb::MaxMindDbError,
    },
}

impl ProvisionError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ProvisionError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Request-level GeoIP lookup failures.
///
/// "Address not found" is not an error; it resolves to an empty location.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// The candidate passed syntactic validation but is not a usable address.
    #[error("Address {0:?} passed validation but could not be parsed")]
    InvalidAddress(String),

    /// The database failed while answering the query.
    #[error("GeoIP lookup failed: {0}")]
    Lookup(#[from] maxminddb::MaxMindDbError),

    /// The blocking lookup task panicked or was cancelled.
    #[error("GeoIP lookup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The lookup pool has been shut down.
    #[error("GeoIP lookup pool is closed")]
    PoolClosed,
}

/// Errors computing the next hop of a redirect.
#[derive(Error, Debug)]
pub enum RedirectError {
    /// The `Location` header could not be resolved against the request URL.
    #[error("Malformed redirect location {location:?}: {source}")]
    InvalidLocation {
        location: String,
        source: url::ParseError,
    },

    /// The `Location` header is not valid visible ASCII.
    #[error("Redirect location header is not valid text")]
    UnreadableLocation,

    /// The resolved redirect target has no host.
    #[error("Redirect target {0} has no host")]
    MissingHost(String),
}

/// Errors forwarding a record to the remote store.
///
/// A response with an unexpected status is not an error here; the caller
/// decides what a non-201 status means.
#[derive(Error, Debug)]
pub enum ForwardError {
    /// Connection or protocol failure, no response received.
    #[error("Store request failed: {0}")]
    Transport(#[from] ReqwestError),

    /// A redirect from the store could not be followed.
    #[error("Store redirect could not be followed: {0}")]
    Redirect(#[from] RedirectError),

    /// The record could not be encoded as JSON.
    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    /// The configured store URL is not a valid absolute URL.
    #[error("Invalid store URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    /// The API key cannot be sent as a header value.
    #[error("Store API key is not a valid header value")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),
}

/// Client errors in the inbound telemetry body.
#[derive(Error, Debug)]
pub enum EventError {
    /// The body is not JSON, or a field has the wrong type.
    #[error("Malformed telemetry body: {0}")]
    Malformed(#[from] serde_json::Error),

    /// `max_heap` is neither numeric nor the "unknown" sentinel.
    #[error("max_heap {0:?} is not an integer")]
    InvalidMaxHeap(String),
}

/// Caller-visible outcome of one ingress request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum OutcomeType {
    /// Store answered 201, caller gets 200
    Stored,
    /// Store answered something other than 201, caller gets 404
    StoreRejected,
    /// GeoIP lookup failed, caller gets 502
    ResolverFailed,
    /// Store unreachable or redirect unusable, caller gets 502
    ForwardFailed,
    /// Body could not be parsed, caller gets 400
    BadRequest,
}

impl OutcomeType {
    /// Counter key used in the status endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeType::Stored => "stored",
            OutcomeType::StoreRejected => "store_rejected",
            OutcomeType::ResolverFailed => "resolver_failed",
            OutcomeType::ForwardFailed => "forward_failed",
            OutcomeType::BadRequest => "bad_request",
        }
    }
}
