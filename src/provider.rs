//! # Prayer Time and Geocoding Providers
//!
//! Network collaborators for the clock: the AlAdhan timings API and the
//! Nominatim reverse geocoder. Both are best-effort — a non-2xx status, a
//! malformed payload, or a transport error maps to "absent", never to a
//! fault that escapes a fetch loop. The yearly fetch relies on this: one
//! bad day becomes an absent [`DayRecord`](crate::DayRecord) without
//! aborting the remaining 364 requests.
//!
//! ## AlAdhan
//! `GET {base}/v1/timings/{DD-MM-YYYY}?latitude=..&longitude=..&method=N`
//! returns `{ code: 200, data: { timings: { Fajr: "05:01", ... } } }`.
//! The method parameter selects the calculation convention (default 4,
//! Umm al-Qura).
//!
//! ## Nominatim
//! Reverse geocoding is purely cosmetic (the location label under the
//! clock), so any failure falls back to a coordinate-string label at the
//! call site.

use std::future::Future;
use std::time::Duration;

use log::warn;
use serde::Deserialize;

use crate::{Coordinates, DailyTimings, DateKey};

/// Default calculation method (4 = Umm al-Qura, Makkah).
pub const DEFAULT_METHOD: u8 = 4;

/// Identifies us to Nominatim, which rejects anonymous clients.
const NOMINATIM_USER_AGENT: &str = "prayer-clock/0.1 (+https://github.com/prayer-clock)";

/// Supplies the five prayer times for a date and location. Absence means
/// the day could not be fetched or parsed.
pub trait PrayerDataProvider: Send + Sync {
    fn timings(
        &self,
        coords: Coordinates,
        date: &DateKey,
    ) -> impl Future<Output = Option<DailyTimings>> + Send;
}

impl<P: PrayerDataProvider> PrayerDataProvider for std::sync::Arc<P> {
    async fn timings(&self, coords: Coordinates, date: &DateKey) -> Option<DailyTimings> {
        (**self).timings(coords, date).await
    }
}

/// Best-effort place-name lookup for a coordinate pair.
pub trait GeocodingProvider: Send + Sync {
    fn reverse(&self, coords: Coordinates) -> impl Future<Output = Option<String>> + Send;
}

/// HTTP client for the AlAdhan timings API.
pub struct AladhanClient {
    http: reqwest::Client,
    base_url: String,
    method: u8,
}

impl AladhanClient {
    pub fn new(
        base_url: impl Into<String>,
        method: u8,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        Ok(AladhanClient {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            base_url: base_url.into(),
            method,
        })
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    code: i64,
    data: ApiData,
}

#[derive(Deserialize)]
struct ApiData {
    timings: ApiTimings,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiTimings {
    fajr: String,
    dhuhr: String,
    asr: String,
    maghrib: String,
    isha: String,
}

/// Parse an AlAdhan response body into timings. `None` covers both a
/// non-200 payload code and unparseable time strings.
fn parse_timings_payload(body: &str) -> Option<DailyTimings> {
    let response: ApiResponse = serde_json::from_str(body).ok()?;
    if response.code != 200 {
        return None;
    }
    let t = response.data.timings;
    DailyTimings::from_strings(&t.fajr, &t.dhuhr, &t.asr, &t.maghrib, &t.isha)
}

impl PrayerDataProvider for AladhanClient {
    async fn timings(&self, coords: Coordinates, date: &DateKey) -> Option<DailyTimings> {
        let url = format!(
            "{}/v1/timings/{}?latitude={}&longitude={}&method={}",
            self.base_url,
            date.api_format(),
            coords.lat,
            coords.lon,
            self.method,
        );

        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("prayer times request failed for {date}: {e}");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!("prayer times API error for {date}: {}", response.status());
            return None;
        }
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                warn!("prayer times body read failed for {date}: {e}");
                return None;
            }
        };

        let timings = parse_timings_payload(&body);
        if timings.is_none() {
            warn!("prayer times payload malformed for {date}");
        }
        timings
    }
}

/// HTTP client for the Nominatim reverse geocoder.
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        Self::with_base_url("https://nominatim.openstreetmap.org", timeout)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        Ok(NominatimClient {
            http: reqwest::Client::builder()
                .user_agent(NOMINATIM_USER_AGENT)
                .timeout(timeout)
                .build()?,
            base_url: base_url.into(),
        })
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    address: Option<GeocodeAddress>,
}

#[derive(Deserialize, Default)]
struct GeocodeAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl GeocodeAddress {
    /// Most specific available place name.
    fn place_label(self) -> Option<String> {
        self.city
            .or(self.town)
            .or(self.village)
            .or(self.county)
            .or(self.state)
            .or(self.country)
    }
}

impl GeocodingProvider for NominatimClient {
    async fn reverse(&self, coords: Coordinates) -> Option<String> {
        let url = format!(
            "{}/reverse?format=jsonv2&lat={}&lon={}&accept-language=en",
            self.base_url, coords.lat, coords.lon,
        );

        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("reverse geocoding request failed: {e}");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!("reverse geocoding API error: {}", response.status());
            return None;
        }
        match response.json::<GeocodeResponse>().await {
            Ok(geo) => geo.address.and_then(GeocodeAddress::place_label),
            Err(e) => {
                warn!("reverse geocoding payload malformed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClockTime;

    #[test]
    fn parses_wellformed_payload() {
        let body = r#"{
            "code": 200,
            "status": "OK",
            "data": {
                "timings": {
                    "Fajr": "05:00",
                    "Sunrise": "06:21",
                    "Dhuhr": "12:15",
                    "Asr": "15:45",
                    "Sunset": "18:30",
                    "Maghrib": "18:30",
                    "Isha": "20:00",
                    "Midnight": "00:22"
                }
            }
        }"#;
        let timings = parse_timings_payload(body).unwrap();
        assert_eq!(timings.fajr, ClockTime::new(5, 0).unwrap());
        assert_eq!(timings.isha, ClockTime::new(20, 0).unwrap());
    }

    #[test]
    fn rejects_error_code_payload() {
        let body = r#"{"code": 500, "status": "err", "data": {"timings": {
            "Fajr": "05:00", "Dhuhr": "12:15", "Asr": "15:45",
            "Maghrib": "18:30", "Isha": "20:00"}}}"#;
        assert!(parse_timings_payload(body).is_none());
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(parse_timings_payload("").is_none());
        assert!(parse_timings_payload("<html>rate limited</html>").is_none());
        assert!(parse_timings_payload(r#"{"code": 200, "data": {}}"#).is_none());
        // Valid JSON shape, unparseable time string.
        let body = r#"{"code": 200, "data": {"timings": {
            "Fajr": "dawn", "Dhuhr": "12:15", "Asr": "15:45",
            "Maghrib": "18:30", "Isha": "20:00"}}}"#;
        assert!(parse_timings_payload(body).is_none());
    }

    #[test]
    fn place_label_prefers_most_specific() {
        let addr = GeocodeAddress {
            city: Some("Jeddah".into()),
            state: Some("Makkah Province".into()),
            country: Some("Saudi Arabia".into()),
            ..Default::default()
        };
        assert_eq!(addr.place_label().as_deref(), Some("Jeddah"));

        let addr = GeocodeAddress {
            state: Some("Makkah Province".into()),
            country: Some("Saudi Arabia".into()),
            ..Default::default()
        };
        assert_eq!(addr.place_label().as_deref(), Some("Makkah Province"));

        assert_eq!(GeocodeAddress::default().place_label(), None);
    }
}
