//! GeoIP data structures.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::{FALLBACK_LATITUDE, FALLBACK_LONGITUDE};

/// City-level metadata for an address found in the database.
///
/// Name fields are `None` when the database has no English name for them;
/// they are still emitted (as `null`) so a located record always carries all
/// five keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityLocation {
    pub nation: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Result of resolving one address. Never partially populated.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoLocation {
    /// Found in the database: all five fields are emitted.
    Located(CityLocation),
    /// Valid address absent from the database: no fields are emitted.
    Unmapped,
    /// The input failed validation: the original string is echoed into
    /// nation/region/city and the coordinates are the sentinel pair.
    Fallback(String),
}

impl GeoLocation {
    /// Writes this location's keys into an in-progress JSON map.
    pub(crate) fn write_fields<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        match self {
            GeoLocation::Located(loc) => {
                map.serialize_entry("nation", &loc.nation)?;
                map.serialize_entry("region", &loc.region)?;
                map.serialize_entry("city", &loc.city)?;
                map.serialize_entry("latitude", &loc.latitude)?;
                map.serialize_entry("longitude", &loc.longitude)?;
            }
            GeoLocation::Unmapped => {}
            GeoLocation::Fallback(original) => {
                map.serialize_entry("nation", original)?;
                map.serialize_entry("region", original)?;
                map.serialize_entry("city", original)?;
                map.serialize_entry("latitude", &FALLBACK_LATITUDE)?;
                map.serialize_entry("longitude", &FALLBACK_LONGITUDE)?;
            }
        }
        Ok(())
    }
}

impl Serialize for GeoLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.write_fields(&mut map)?;
        map.end()
    }
}
