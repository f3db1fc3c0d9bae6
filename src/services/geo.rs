// src/services/geo.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::common::error::AppError;

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// (0, 0) é o que os geocodificadores devolvem quando "erram" sem falhar.
    pub fn is_null_island(&self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }
}

/// Distância em km entre dois pontos (fórmula de haversine).
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Endereço livre -> coordenadas. `Ok(None)` quando nada foi encontrado.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, AppError>;
}

#[derive(Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Cliente do Nominatim (OpenStreetMap). A política de uso exige User-Agent próprio.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, AppError> {
        let places: Vec<NominatimPlace> = self
            .client
            .get(&self.base_url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };

        match (place.lat.parse::<f64>(), place.lon.parse::<f64>()) {
            (Ok(lat), Ok(lon)) => Ok(Some(GeoPoint::new(lat, lon))),
            _ => {
                tracing::warn!(query, "Coordenadas inválidas vindas do geocodificador");
                Err(AppError::GeocodingFailed)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Geocodificador fixo para testes.
    pub(crate) struct StubGeocoder(pub Option<GeoPoint>);

    #[async_trait]
    impl Geocoder for StubGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<GeoPoint>, AppError> {
            Ok(self.0)
        }
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((d - 111.195).abs() < 0.01, "{d}");
    }

    #[test]
    fn same_point_is_zero() {
        let p = GeoPoint::new(-23.5505, -46.6333);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn sao_paulo_to_campinas() {
        let sp = GeoPoint::new(-23.5505, -46.6333);
        let campinas = GeoPoint::new(-22.9056, -47.0608);
        let d = haversine_km(sp, campinas);
        assert!((80.0..90.0).contains(&d), "{d}");
    }

    #[tokio::test]
    async fn stub_geocoder_answers() {
        let geocoder: Box<dyn Geocoder> = Box::new(StubGeocoder(Some(GeoPoint::new(0.0, 0.0))));
        let point = geocoder.geocode("qualquer").await.unwrap().unwrap();
        assert!(point.is_null_island());
    }
}
