use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use skybook_shared::City;

/// Case-insensitive substring match on city name or phonetic key.
pub fn city_matches(city: &City, query: &str) -> bool {
    let q = query.to_lowercase();
    city.city_name.to_lowercase().contains(&q) || city.phonetic_key.to_lowercase().contains(&q)
}

/// Filter cities by an optional query and sort by phonetic key
/// ascending, the order the mobile client renders the picker in.
pub fn search_cities(mut cities: Vec<City>, query: Option<&str>) -> Vec<City> {
    if let Some(q) = query {
        if !q.is_empty() {
            cities.retain(|c| city_matches(c, q));
        }
    }
    cities.sort_by(|a, b| a.phonetic_key.cmp(&b.phonetic_key));
    cities
}

/// Half-open departure window [start of day, start of next day) in UTC
/// for a flight-search date filter.
pub fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap());
    (start, start + chrono::Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(code: &str, name: &str, key: &str) -> City {
        City {
            city_code: code.to_string(),
            city_name: name.to_string(),
            province: String::new(),
            phonetic_key: key.to_string(),
        }
    }

    #[test]
    fn test_search_matches_name_or_phonetic_key() {
        let cities = vec![
            city("BJS", "Beijing", "BJ"),
            city("SHA", "Shanghai", "SH"),
            city("CAN", "Guangzhou", "GZ"),
        ];
        let by_name = search_cities(cities.clone(), Some("shang"));
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].city_code, "SHA");

        let by_key = search_cities(cities, Some("gz"));
        assert_eq!(by_key.len(), 1);
        assert_eq!(by_key[0].city_code, "CAN");
    }

    #[test]
    fn test_no_query_returns_all_sorted_by_phonetic_key() {
        let cities = vec![
            city("SHA", "Shanghai", "SH"),
            city("BJS", "Beijing", "BJ"),
            city("CAN", "Guangzhou", "GZ"),
        ];
        let all = search_cities(cities, None);
        let keys: Vec<&str> = all.iter().map(|c| c.phonetic_key.as_str()).collect();
        assert_eq!(keys, vec!["BJ", "GZ", "SH"]);
    }

    #[test]
    fn test_day_window_is_half_open_over_one_day() {
        let (start, end) = day_window(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert_eq!(end - start, chrono::Duration::days(1));
        assert_eq!(start.to_rfc3339(), "2026-03-14T00:00:00+00:00");
    }
}
