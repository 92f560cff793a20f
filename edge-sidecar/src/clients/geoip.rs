//! Geo-IP lookup (`GEOIP_MMDB_PATH`, optional). Out-of-core per spec §1
//! ("a geo-IP lookup library" is listed as an external collaborator), so
//! this is a thin wrapper, not a from-scratch MMDB parser.

use std::net::IpAddr;

use crate::wire::event::GeoInfo;

pub struct GeoIpLookup {
    reader: Option<maxminddb::Reader<Vec<u8>>>,
}

impl GeoIpLookup {
    pub fn open(path: Option<&str>) -> anyhow::Result<Self> {
        let reader = match path {
            Some(path) => Some(maxminddb::Reader::open_readfile(path)?),
            None => None,
        };
        Ok(Self { reader })
    }

    pub fn lookup(&self, host: &str) -> Option<GeoInfo> {
        let reader = self.reader.as_ref()?;
        let ip: IpAddr = host.parse().ok()?;

        let city: maxminddb::geoip2::City<'_> = reader.lookup(ip).ok()?;

        let country = city
            .country
            .as_ref()
            .and_then(|c| c.names.as_ref())
            .and_then(|names| names.get("en"))
            .map(|s| (*s).to_owned());

        let city_name = city
            .city
            .as_ref()
            .and_then(|c| c.names.as_ref())
            .and_then(|names| names.get("en"))
            .map(|s| (*s).to_owned());

        let (latitude, longitude) = city
            .location
            .as_ref()
            .map(|loc| (loc.latitude, loc.longitude))
            .unwrap_or((None, None));

        Some(GeoInfo {
            country,
            city: city_name,
            latitude,
            longitude,
        })
    }
}
