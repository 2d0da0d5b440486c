//! Address resolution against the provisioned database.

use std::sync::Arc;

use tokio::sync::Semaphore;

use super::types::GeoLocation;
use super::validate::{is_valid, parse_address};
use super::GeoLookup;
use crate::error_handling::ResolverError;

/// Resolves caller addresses to a [`GeoLocation`].
///
/// Cheap to clone; all clones share the same database handle and lookup limit.
#[derive(Clone)]
pub struct GeoResolver {
    lookup: Arc<dyn GeoLookup>,
    permits: Arc<Semaphore>,
}

impl GeoResolver {
    /// Creates a resolver over a ready lookup source.
    ///
    /// `permits` bounds how many blocking lookups run at once.
    pub fn new(lookup: Arc<dyn GeoLookup>, permits: Arc<Semaphore>) -> Self {
        GeoResolver { lookup, permits }
    }

    /// Resolves `ip` without blocking the calling task.
    ///
    /// - Fails validation → `GeoLocation::Fallback` echoing `ip`
    /// - Valid but not in the database → `GeoLocation::Unmapped`
    /// - Database error → `ResolverError`, never an empty location
    pub async fn resolve(&self, ip: &str) -> Result<GeoLocation, ResolverError> {
        if !is_valid(ip) {
            log::debug!("Address {:?} failed validation, using fallback location", ip);
            return Ok(GeoLocation::Fallback(ip.to_string()));
        }
        let addr =
            parse_address(ip).ok_or_else(|| ResolverError::InvalidAddress(ip.to_string()))?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ResolverError::PoolClosed)?;

        let lookup = Arc::clone(&self.lookup);
        let found = tokio::task::spawn_blocking(move || lookup.city(addr)).await??;

        match found {
            Some(location) => {
                log::debug!("Resolved {} to {:?}", ip, location);
                Ok(GeoLocation::Located(location))
            }
            None => {
                log::debug!("Address {} not found in GeoIP database", ip);
                Ok(GeoLocation::Unmapped)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geoip::CityLocation;
    use std::net::IpAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Knows exactly one address; counts how often it is queried.
    struct OneAddress {
        calls: AtomicUsize,
    }

    impl GeoLookup for OneAddress {
        fn city(&self, ip: IpAddr) -> Result<Option<CityLocation>, ResolverError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if ip == "8.8.8.8".parse::<IpAddr>().unwrap() {
                Ok(Some(CityLocation {
                    nation: Some("United States".to_string()),
                    region: Some("California".to_string()),
                    city: Some("Mountain View".to_string()),
                    latitude: Some(37.386),
                    longitude: Some(-122.0838),
                }))
            } else {
                Ok(None)
            }
        }
    }

    struct Corrupt;

    impl GeoLookup for Corrupt {
        fn city(&self, _ip: IpAddr) -> Result<Option<CityLocation>, ResolverError> {
            match maxminddb::Reader::from_source(b"corrupt search tree".to_vec()) {
                Err(e) => Err(ResolverError::Lookup(e)),
                Ok(_) => panic!("garbage bytes must not parse as a database"),
            }
        }
    }

    fn resolver_with(lookup: Arc<dyn GeoLookup>) -> GeoResolver {
        GeoResolver::new(lookup, Arc::new(Semaphore::new(2)))
    }

    #[tokio::test]
    async fn test_resolve_found() {
        let resolver = resolver_with(Arc::new(OneAddress {
            calls: AtomicUsize::new(0),
        }));
        match resolver.resolve("8.8.8.8").await.unwrap() {
            GeoLocation::Located(loc) => {
                assert_eq!(loc.nation.as_deref(), Some("United States"));
                assert_eq!(loc.city.as_deref(), Some("Mountain View"));
            }
            other => panic!("expected located, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_not_found_is_unmapped() {
        let resolver = resolver_with(Arc::new(OneAddress {
            calls: AtomicUsize::new(0),
        }));
        assert_eq!(
            resolver.resolve("203.0.113.5").await.unwrap(),
            GeoLocation::Unmapped
        );
        assert_eq!(resolver.resolve("2001:db8::1").await.unwrap(), GeoLocation::Unmapped);
    }

    #[tokio::test]
    async fn test_resolve_invalid_is_fallback_without_lookup() {
        let source = Arc::new(OneAddress {
            calls: AtomicUsize::new(0),
        });
        let resolver = resolver_with(source.clone());

        for candidate in ["not-an-ip", "", "localhost", "300.1.1.1"] {
            assert_eq!(
                resolver.resolve(candidate).await.unwrap(),
                GeoLocation::Fallback(candidate.to_string())
            );
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_zero_padded_ipv4_is_looked_up() {
        let source = Arc::new(OneAddress {
            calls: AtomicUsize::new(0),
        });
        let resolver = resolver_with(source.clone());

        assert!(matches!(
            resolver.resolve("008.008.008.008").await.unwrap(),
            GeoLocation::Located(_)
        ));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_database_error_is_not_masked() {
        let resolver = resolver_with(Arc::new(Corrupt));
        let result = resolver.resolve("8.8.8.8").await;
        assert!(matches!(result, Err(ResolverError::Lookup(_))));
    }

    #[tokio::test]
    async fn test_resolve_pattern_valid_but_unparseable() {
        let resolver = resolver_with(Arc::new(Corrupt));
        let result = resolver.resolve("1:2:3:4:5:6:7:8::9").await;
        assert!(matches!(result, Err(ResolverError::InvalidAddress(_))));
    }
}
