//! Configuration constants.
//!
//! This module defines the fixed paths, file names, and limits used throughout
//! the gateway.

// Ingress
/// Versioned prefix for every ingress route
pub const API_PREFIX: &str = "/api/v1";
/// Default TCP port for the ingress listener
pub const DEFAULT_PORT: u16 = 8080;
/// Default bind address for the ingress listener
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

// Telemetry store
/// Collection path that accepts new run records
pub const STORE_INSERT_PATH: &str = "/db/moquette_instances:main/tables/runs/data";
/// Collection path used for cursor-paginated queries
pub const STORE_QUERY_PATH: &str = "/db/moquette_instances:main/tables/runs/query";
/// Domain suffix for workspace-specific store hosts (`<workspace>.<region>.xata.sh`)
pub const STORE_DOMAIN: &str = "xata.sh";
/// Maximum number of redirect hops followed for a single forward.
/// After this many hops the last response is treated as final.
pub const MAX_REDIRECT_HOPS: usize = 16;
/// Bookkeeping key the store attaches to every record; stripped on export
pub const STORE_METADATA_KEY: &str = "xata";
/// Default page size for bulk export
pub const DEFAULT_EXPORT_PAGE_SIZE: usize = 200;
/// Default output file for bulk export
pub const DEFAULT_EXPORT_FILE: &str = "rows.json";

// GeoIP provisioning
/// Default local directory holding the GeoIP archive and database
pub const DEFAULT_GEOIP_DIR: &str = "geolite";
/// MaxMind download host
pub const MAXMIND_DOWNLOAD_BASE: &str = "https://download.maxmind.com";
/// Download path on the MaxMind host
pub const MAXMIND_DOWNLOAD_PATH: &str = "/app/geoip_download";
/// MaxMind edition fetched on first run
pub const GEOIP_EDITION: &str = "GeoLite2-City";
/// File name of the downloaded archive inside the GeoIP directory
pub const GEOIP_ARCHIVE_FILE: &str = "geolite.tar.gz";
/// File name of the extracted database inside the GeoIP directory
pub const GEOIP_DATABASE_FILE: &str = "GeoLite2-City.mmdb";
/// Buffer size used when streaming archive entries to disk (8 KiB)
pub const EXTRACT_BUFFER_SIZE: usize = 8 * 1024;

// GeoIP lookup
/// Default number of database lookups allowed in flight at once
pub const DEFAULT_LOOKUP_CONCURRENCY: usize = 16;
/// Latitude reported for addresses that fail validation
pub const FALLBACK_LATITUDE: f64 = 0.0;
/// Longitude reported for addresses that fail validation
pub const FALLBACK_LONGITUDE: f64 = 0.0;

// Event fields
/// Literal `max_heap` value meaning the caller could not determine it
pub const MAX_HEAP_UNKNOWN: &str = "undefined";
/// Timestamp format for `startup_date` (UTC, no numeric offset)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
