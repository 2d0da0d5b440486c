//! GeoIP provisioning and lookup using the MaxMind GeoLite2-City database.
//!
//! The database goes through a single lifecycle at startup
//! (absent → downloading → extracting → ready) in [`ensure_ready`]. The
//! resulting [`GeoDatabase`] is the only way to build a [`GeoResolver`], so no
//! lookup can run before provisioning has completed.

mod extract;
mod provision;
mod resolver;
mod types;
pub mod validate;

// Re-export public API
pub use extract::extract_archive;
pub use provision::{download_url, ensure_ready};
pub use resolver::GeoResolver;
pub use types::{CityLocation, GeoLocation};

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use maxminddb::Reader;

use crate::error_handling::{ProvisionError, ResolverError};

/// A blocking city-level lookup source.
///
/// Implemented by [`GeoDatabase`]; tests substitute their own implementation.
/// Implementations are called from the blocking pool, never from the event loop.
pub trait GeoLookup: Send + Sync + 'static {
    /// Returns `Ok(None)` when the address is not in the database.
    fn city(&self, ip: IpAddr) -> Result<Option<CityLocation>, ResolverError>;
}

/// An opened, read-only GeoLite2-City database.
pub struct GeoDatabase {
    reader: Reader<Vec<u8>>,
    path: PathBuf,
}

impl GeoDatabase {
    /// Opens the database file. A missing or corrupt file is a provisioning failure.
    pub fn open(path: &Path) -> Result<Self, ProvisionError> {
        let reader = Reader::open_readfile(path).map_err(|source| ProvisionError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!(
            "Opened GeoIP database {} (build_{})",
            path.display(),
            reader.metadata.build_epoch
        );
        Ok(GeoDatabase {
            reader,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Database build version, e.g. `build_1700000000`.
    pub fn version(&self) -> String {
        format!("build_{}", self.reader.metadata.build_epoch)
    }
}

impl GeoLookup for GeoDatabase {
    fn city(&self, ip: IpAddr) -> Result<Option<CityLocation>, ResolverError> {
        // maxminddb 0.27: lookup() succeeds for absent addresses, has_data() tells them apart
        let lookup = self.reader.lookup(ip)?;
        if !lookup.has_data() {
            return Ok(None);
        }

        let city: maxminddb::geoip2::City = match lookup.decode()? {
            Some(city) => city,
            None => return Ok(None),
        };

        Ok(Some(CityLocation {
            nation: city.country.names.english.map(|s| s.to_string()),
            // Most specific subdivision is the last one
            region: city
                .subdivisions
                .last()
                .and_then(|s| s.names.english)
                .map(|s| s.to_string()),
            city: city.city.names.english.map(|s| s.to_string()),
            latitude: city.location.latitude,
            longitude: city.location.longitude,
        }))
    }
}
