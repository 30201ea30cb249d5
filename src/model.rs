//! Wire types owned by the backend.
//!
//! Nothing here is validated client-side: coordinates are taken as delivered.

use serde::{Deserialize, Serialize};

/// A single physical retail location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlet {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub telephone: String,
    pub waze_link: String,
}

impl Outlet {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// The one answer the backend currently holds, shared by every client.
///
/// The same shape is used as the POST body, where the field carries the
/// user's query text instead of an answer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredAnswer {
    pub llmresponse: String,
}

impl StoredAnswer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            llmresponse: text.into(),
        }
    }
}

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outlet_deserializes_backend_record() {
        let json = r#"{
            "id": 7,
            "name": "McDonald's KLCC",
            "address": "Lot 241, Suria KLCC",
            "telephone": "03-2166 1234",
            "latitude": 3.1579,
            "longitude": 101.7116,
            "waze_link": "https://waze.com/ul?ll=3.1579,101.7116"
        }"#;

        let outlet: Outlet = serde_json::from_str(json).unwrap();
        assert_eq!(outlet.id, 7);
        assert_eq!(outlet.telephone, "03-2166 1234");
        assert_eq!(outlet.position(), GeoPoint::new(3.1579, 101.7116));
    }

    #[test]
    fn test_stored_answer_uses_llmresponse_field() {
        let body = serde_json::to_string(&StoredAnswer::new("outlets near KLCC")).unwrap();
        assert_eq!(body, r#"{"llmresponse":"outlets near KLCC"}"#);
    }

    #[test]
    fn test_outlet_missing_field_is_rejected() {
        let result: Result<Outlet, _> = serde_json::from_str(r#"{"id": 1, "name": "x"}"#);
        assert!(result.is_err());
    }
}
