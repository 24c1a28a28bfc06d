//! Geohash codec
//!
//! Standard interleaved-bit geohash: longitude and latitude ranges are
//! alternately bisected (longitude first), one bit per step, five bits
//! per base-32 output character. Altitude is carried in [`Coordinates`]
//! but never enters the interleaved bits; it travels only through the
//! `encode_with_data` payload combinator.

use serde::{Deserialize, Serialize};

/// The 32-symbol geohash alphabet: digits and letters minus a, i, l, o.
const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("coordinates out of range: lat {latitude}, lon {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("precision level {0} outside 1..=12")]
    InvalidPrecision(u8),
}

/// Geographic position. Altitude is in meters and optional in spirit:
/// the interleaved geohash encodes latitude/longitude only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Rectangular cell a geohash denotes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn center(&self) -> Coordinates {
        Coordinates::new(
            (self.lat_min + self.lat_max) / 2.0,
            (self.lon_min + self.lon_max) / 2.0,
            0.0,
        )
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.lat_min
            && latitude <= self.lat_max
            && longitude >= self.lon_min
            && longitude <= self.lon_max
    }

    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }
}

/// Output length in characters, 1..=12. Level 9 cells are roughly
/// 4.8 m × 4.8 m; level 12 is sub-centimeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeohashPrecision(u8);

impl GeohashPrecision {
    pub fn new(level: u8) -> Result<Self, GeoError> {
        if !(1..=12).contains(&level) {
            return Err(GeoError::InvalidPrecision(level));
        }
        Ok(Self(level))
    }

    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Default for GeohashPrecision {
    fn default() -> Self {
        Self(9)
    }
}

/// Geohash engine. Precision is engine state and mutable; decoding takes
/// its precision from the input string itself.
#[derive(Debug, Clone, Default)]
pub struct Geohash {
    precision: GeohashPrecision,
}

impl Geohash {
    pub fn new(precision: GeohashPrecision) -> Self {
        Self { precision }
    }

    pub fn precision(&self) -> GeohashPrecision {
        self.precision
    }

    pub fn set_precision(&mut self, precision: GeohashPrecision) {
        self.precision = precision;
    }

    pub fn encode(&self, latitude: f64, longitude: f64) -> Result<String, GeoError> {
        encode_at(latitude, longitude, self.precision.level() as usize)
    }

    /// Center of the cell the geohash denotes, altitude 0. Malformed
    /// strings are expected at trust boundaries, so this is absent
    /// rather than an error.
    pub fn decode(&self, geohash: &str) -> Option<Coordinates> {
        self.bounding_box(geohash).map(|bbox| bbox.center())
    }

    pub fn bounding_box(&self, geohash: &str) -> Option<BoundingBox> {
        if !self.is_valid(geohash) {
            return None;
        }
        let mut lat = (-90.0, 90.0);
        let mut lon = (-180.0, 180.0);
        let mut even = true;
        for ch in geohash.bytes() {
            let value = BASE32.iter().position(|&c| c == ch)? as u8;
            for shift in (0..5).rev() {
                let bit = (value >> shift) & 1;
                let range = if even { &mut lon } else { &mut lat };
                let mid = (range.0 + range.1) / 2.0;
                if bit == 1 {
                    range.0 = mid;
                } else {
                    range.1 = mid;
                }
                even = !even;
            }
        }
        Some(BoundingBox {
            lat_min: lat.0,
            lat_max: lat.1,
            lon_min: lon.0,
            lon_max: lon.1,
        })
    }

    /// The 8 compass-adjacent cells (N, NE, E, SE, S, SW, W, NW), each at
    /// the input's own precision. Longitude wraps at the antimeridian;
    /// latitude is clamped at the poles, so for cells in the outermost
    /// latitude band the poleward offsets fold back into that band and
    /// the returned cells are not all distinct.
    pub fn neighbors(&self, geohash: &str) -> Option<[String; 8]> {
        let bbox = self.bounding_box(geohash)?;
        let center = bbox.center();
        let dlat = bbox.lat_span();
        let dlon = bbox.lon_span();
        let precision = geohash.len();

        let offsets = [
            (dlat, 0.0),
            (dlat, dlon),
            (0.0, dlon),
            (-dlat, dlon),
            (-dlat, 0.0),
            (-dlat, -dlon),
            (0.0, -dlon),
            (dlat, -dlon),
        ];
        let mut out: [String; 8] = Default::default();
        for (slot, (dl, dn)) in out.iter_mut().zip(offsets) {
            let lat = (center.latitude + dl).clamp(-90.0, 90.0);
            let lon = wrap_longitude(center.longitude + dn);
            *slot = encode_at(lat, lon, precision).ok()?;
        }
        Some(out)
    }

    /// Great-circle distance in meters between the centers of two cells.
    pub fn distance(&self, a: &str, b: &str) -> Option<f64> {
        let ca = self.decode(a)?;
        let cb = self.decode(b)?;
        Some(haversine(
            ca.latitude,
            ca.longitude,
            cb.latitude,
            cb.longitude,
        ))
    }

    pub fn is_valid(&self, geohash: &str) -> bool {
        !geohash.is_empty() && geohash.bytes().all(|ch| BASE32.contains(&ch))
    }

    /// Prefix a payload with a length-tagged geohash of the coordinates:
    /// `[geohash_len u8][geohash][payload]` — a geotagged binary record.
    pub fn encode_with_data(&self, data: &[u8], coords: &Coordinates) -> Result<Vec<u8>, GeoError> {
        let geohash = self.encode(coords.latitude, coords.longitude)?;
        let mut out = Vec::with_capacity(1 + geohash.len() + data.len());
        out.push(geohash.len() as u8);
        out.extend_from_slice(geohash.as_bytes());
        out.extend_from_slice(data);
        Ok(out)
    }

    pub fn decode_with_data(&self, data: &[u8]) -> Option<(Vec<u8>, Coordinates)> {
        let (&len, rest) = data.split_first()?;
        let len = len as usize;
        if rest.len() < len {
            return None;
        }
        let geohash = std::str::from_utf8(&rest[..len]).ok()?;
        let coords = self.decode(geohash)?;
        Some((rest[len..].to_vec(), coords))
    }
}

fn encode_at(latitude: f64, longitude: f64, precision: usize) -> Result<String, GeoError> {
    if !Coordinates::new(latitude, longitude, 0.0).is_valid() {
        return Err(GeoError::InvalidCoordinates {
            latitude,
            longitude,
        });
    }
    let mut lat = (-90.0, 90.0);
    let mut lon = (-180.0, 180.0);
    let mut even = true;
    let mut out = String::with_capacity(precision);
    let mut ch = 0u8;
    let mut bit = 0;
    while out.len() < precision {
        let (coord, range) = if even {
            (longitude, &mut lon)
        } else {
            (latitude, &mut lat)
        };
        let mid = (range.0 + range.1) / 2.0;
        if coord >= mid {
            ch |= 1 << (4 - bit);
            range.0 = mid;
        } else {
            range.1 = mid;
        }
        even = !even;
        bit += 1;
        if bit == 5 {
            out.push(BASE32[ch as usize] as char);
            ch = 0;
            bit = 0;
        }
    }
    Ok(out)
}

fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1) = (lat1.to_radians(), lon1.to_radians());
    let (lat2, lon2) = (lat2.to_radians(), lon2.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        // Classic reference point: Jutland lighthouse.
        let gh = Geohash::new(GeohashPrecision::new(11).unwrap());
        assert_eq!(gh.encode(57.64911, 10.40744).unwrap(), "u4pruydqqvj");
    }

    #[test]
    fn test_decode_within_cell() {
        let gh = Geohash::new(GeohashPrecision::new(6).unwrap());
        let code = gh.encode(37.8324, 112.5584).unwrap();
        assert_eq!(code.len(), 6);

        let bbox = gh.bounding_box(&code).unwrap();
        assert!(bbox.contains(37.8324, 112.5584));

        // Precision-6 cells are ~1.22 km x 0.61 km.
        let center = gh.decode(&code).unwrap();
        let err_m = haversine(center.latitude, center.longitude, 37.8324, 112.5584);
        assert!(err_m < 1000.0, "decoded center {} m away", err_m);
    }

    #[test]
    fn test_all_precision_levels_round_trip() {
        for level in 1..=12 {
            let gh = Geohash::new(GeohashPrecision::new(level).unwrap());
            let code = gh.encode(-33.8688, 151.2093).unwrap();
            assert_eq!(code.len(), level as usize);
            let bbox = gh.bounding_box(&code).unwrap();
            assert!(bbox.contains(-33.8688, 151.2093), "level {}", level);
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let gh = Geohash::default();
        assert!(gh.encode(91.0, 0.0).is_err());
        assert!(gh.encode(0.0, 181.0).is_err());
        assert!(!gh.is_valid(""));
        assert!(!gh.is_valid("abc")); // 'a' is outside the alphabet
        assert!(gh.decode("ai").is_none());
        assert!(GeohashPrecision::new(0).is_err());
        assert!(GeohashPrecision::new(13).is_err());
    }

    #[test]
    fn test_neighbors() {
        let gh = Geohash::new(GeohashPrecision::new(6).unwrap());
        let code = gh.encode(37.8324, 112.5584).unwrap();
        let neighbors = gh.neighbors(&code).unwrap();

        let mut distinct: Vec<&String> = neighbors.iter().collect();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), 8);

        let origin = gh.bounding_box(&code).unwrap();
        for n in &neighbors {
            assert_eq!(n.len(), 6);
            assert_ne!(n, &code);
            let bbox = gh.bounding_box(n).unwrap();
            // Adjacent cells are within ~1.5 cell diagonals of the origin.
            let gap = haversine(
                bbox.center().latitude,
                bbox.center().longitude,
                origin.center().latitude,
                origin.center().longitude,
            );
            assert!(gap < 2500.0, "neighbor {} is {} m away", n, gap);
        }
    }

    #[test]
    fn test_neighbors_fold_at_pole() {
        // The latitude clamp keeps poleward offsets inside the top band,
        // so the N, NE and NW slots collapse onto that band's cells.
        let gh = Geohash::default();
        let code = gh.encode(90.0, 0.0).unwrap();
        let neighbors = gh.neighbors(&code).unwrap();

        let mut distinct: Vec<&String> = neighbors.iter().collect();
        distinct.sort();
        distinct.dedup();
        assert!(distinct.len() < 8);
        assert!(neighbors.contains(&code));
    }

    #[test]
    fn test_distance_symmetry() {
        let gh = Geohash::new(GeohashPrecision::new(7).unwrap());
        let a = gh.encode(48.8566, 2.3522).unwrap(); // Paris
        let b = gh.encode(51.5074, -0.1278).unwrap(); // London
        let d1 = gh.distance(&a, &b).unwrap();
        let d2 = gh.distance(&b, &a).unwrap();
        assert!((d1 - d2).abs() < 1e-6);
        assert!((300_000.0..400_000.0).contains(&d1), "got {} m", d1);
    }

    #[test]
    fn test_encode_with_data_round_trip() {
        let gh = Geohash::default();
        let coords = Coordinates::new(37.8324, 112.5584, 120.0);
        let payload = b"layer-0 checkpoint".to_vec();
        let tagged = gh.encode_with_data(&payload, &coords).unwrap();
        let (data, decoded) = gh.decode_with_data(&tagged).unwrap();
        assert_eq!(data, payload);
        assert!((decoded.latitude - coords.latitude).abs() < 1e-3);
        assert!((decoded.longitude - coords.longitude).abs() < 1e-3);
    }

    #[test]
    fn test_decode_with_data_truncated() {
        let gh = Geohash::default();
        assert!(gh.decode_with_data(&[]).is_none());
        assert!(gh.decode_with_data(&[9, b'w', b'w']).is_none());
    }
}
