// Great-circle distances between IATA airport codes.
//
// The table is static; an unknown code yields `None` and callers treat the
// missing distance as an infinite price-per-kilometre.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// (IATA code, latitude, longitude)
static AIRPORTS: &[(&str, f64, f64)] = &[
    ("AMS", 52.3105, 4.7683),
    ("ARN", 59.6498, 17.9239),
    ("ATH", 37.9364, 23.9445),
    ("BCN", 41.2971, 2.0785),
    ("BER", 52.3667, 13.5033),
    ("BKK", 13.6900, 100.7501),
    ("BOS", 42.3656, -71.0096),
    ("BUD", 47.4298, 19.2611),
    ("CDG", 49.0097, 2.5479),
    ("CPH", 55.6180, 12.6508),
    ("DEL", 28.5562, 77.1000),
    ("DOH", 25.2609, 51.6138),
    ("DUB", 53.4264, -6.2499),
    ("DXB", 25.2532, 55.3657),
    ("EWR", 40.6895, -74.1745),
    ("EZE", -34.8222, -58.5358),
    ("FCO", 41.8003, 12.2389),
    ("FRA", 50.0379, 8.5622),
    ("GDN", 54.3776, 18.4662),
    ("GRU", -23.4356, -46.4731),
    ("HAM", 53.6304, 9.9882),
    ("HEL", 60.3183, 24.9630),
    ("HND", 35.5494, 139.7798),
    ("ICN", 37.4602, 126.4407),
    ("IST", 41.2753, 28.7519),
    ("JFK", 40.6413, -73.7781),
    ("KEF", 63.9850, -22.6056),
    ("KRK", 50.0777, 19.7848),
    ("KTW", 50.4743, 19.0800),
    ("LAX", 33.9416, -118.4085),
    ("LGW", 51.1537, -0.1821),
    ("LHR", 51.4700, -0.4543),
    ("LIS", 38.7756, -9.1354),
    ("MAD", 40.4983, -3.5676),
    ("MEX", 19.4363, -99.0721),
    ("MIA", 25.7959, -80.2870),
    ("MUC", 48.3537, 11.7750),
    ("MXP", 45.6306, 8.7281),
    ("NRT", 35.7720, 140.3929),
    ("ORD", 41.9742, -87.9073),
    ("ORY", 48.7262, 2.3652),
    ("OSL", 60.1976, 11.1004),
    ("OPO", 41.2481, -8.6814),
    ("POZ", 52.4210, 16.8263),
    ("PRG", 50.1008, 14.2632),
    ("SFO", 37.6213, -122.3790),
    ("SIN", 1.3644, 103.9915),
    ("STN", 51.8860, 0.2389),
    ("TLV", 32.0114, 34.8867),
    ("VIE", 48.1103, 16.5697),
    ("WAW", 52.1657, 20.9671),
    ("WRO", 51.1027, 16.8858),
    ("YYZ", 43.6777, -79.6248),
    ("ZRH", 47.4647, 8.5492),
];

fn coordinates(code: &str) -> Option<(f64, f64)> {
    AIRPORTS
        .iter()
        .find(|(iata, _, _)| iata.eq_ignore_ascii_case(code))
        .map(|&(_, lat, lon)| (lat, lon))
}

/// Great-circle distance in kilometres between two airports, `None` when
/// either code is not in the table.
pub fn distance_km(origin: &str, destination: &str) -> Option<f64> {
    let (lat1, lon1) = coordinates(origin)?;
    let (lat2, lon2) = coordinates(destination)?;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    Some(EARTH_RADIUS_KM * c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_route_has_plausible_distance() {
        let d = distance_km("WAW", "JFK").unwrap();
        assert!((6700.0..7100.0).contains(&d), "WAW-JFK was {d} km");
    }

    #[test]
    fn short_hop_distance() {
        let d = distance_km("FRA", "HAM").unwrap();
        assert!((350.0..450.0).contains(&d), "FRA-HAM was {d} km");
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = distance_km("WAW", "LHR").unwrap();
        let ba = distance_km("LHR", "WAW").unwrap();
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn unknown_code_yields_none() {
        assert_eq!(distance_km("WAW", "XXX"), None);
        assert_eq!(distance_km("XXX", "WAW"), None);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(distance_km("waw", "jfk").is_some());
    }
}
