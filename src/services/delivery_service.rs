// src/services/delivery_service.rs

use std::sync::Arc;

use rust_decimal::{prelude::FromPrimitive, Decimal, RoundingStrategy};
use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CashierRepository, TenantRepository},
    middleware::rbac::{PermMotoboy, PermissionDef},
    models::{
        delivery::{DeliveryDistancePayload, DeliveryQuote},
        tenancy::Motoboy,
    },
    services::geo::{haversine_km, GeoPoint, Geocoder},
};

/// Distância do depósito até o cliente e a taxa correspondente.
pub fn quote(
    customer: Option<GeoPoint>,
    depot: Option<(f64, f64)>,
    taxa_por_km: Decimal,
) -> Result<DeliveryQuote, AppError> {
    let customer = customer.ok_or(AppError::AddressNotGeocoded)?;
    if customer.is_null_island() {
        return Err(AppError::GeocodingFailed);
    }
    let (lat, lon) = depot.ok_or(AppError::DepotLocationMissing)?;

    let distance_km = haversine_km(GeoPoint::new(lat, lon), customer);
    let fee = Decimal::from_f64(distance_km)
        .map(|km| (km * taxa_por_km).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .ok_or(AppError::GeocodingFailed)?;

    Ok(DeliveryQuote { distance_km, fee })
}

#[derive(Clone)]
pub struct DeliveryService {
    tenant_repo: TenantRepository,
    cashier_repo: CashierRepository,
    geocoder: Arc<dyn Geocoder>,
}

impl DeliveryService {
    pub fn new(tenant_repo: TenantRepository, cashier_repo: CashierRepository, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            tenant_repo,
            cashier_repo,
            geocoder,
        }
    }

    pub async fn distance(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        payload: &DeliveryDistancePayload,
    ) -> Result<DeliveryQuote, AppError> {
        let point = self.geocoder.geocode(&payload.query()).await?;

        let tenant = self.tenant_repo.find_by_id(&mut *conn, tenant_id).await?;
        let fee = self.cashier_repo.get_delivery_fee(conn, tenant_id).await?;

        let result = quote(point, tenant.depot(), fee.taxa_por_km)?;
        tracing::debug!(tenant_id = %tenant_id, km = result.distance_km, "Taxa de entrega calculada");
        Ok(result)
    }

    pub async fn list_motoboys<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Motoboy>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.tenant_repo
            .list_members_with_permission(executor, tenant_id, PermMotoboy::slug())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::geo::tests::StubGeocoder;

    const DEPOT: Option<(f64, f64)> = Some((0.0, 0.0));

    #[test]
    fn fee_is_distance_times_rate() {
        let result = quote(Some(GeoPoint::new(1.0, 0.0)), DEPOT, Decimal::from(2)).unwrap();
        assert!((result.distance_km - 111.195).abs() < 0.01);
        assert_eq!(result.fee, Decimal::new(22239, 2));
    }

    #[test]
    fn address_not_found() {
        assert!(matches!(quote(None, DEPOT, Decimal::ONE), Err(AppError::AddressNotGeocoded)));
    }

    #[test]
    fn null_island_is_a_geocoding_error() {
        let result = quote(Some(GeoPoint::new(0.0, 0.0)), Some((-23.5, -46.6)), Decimal::ONE);
        assert!(matches!(result, Err(AppError::GeocodingFailed)));
    }

    #[test]
    fn tenant_without_depot() {
        let result = quote(Some(GeoPoint::new(-23.5, -46.6)), None, Decimal::ONE);
        assert!(matches!(result, Err(AppError::DepotLocationMissing)));
    }

    #[tokio::test]
    async fn quote_from_stub_geocoder() {
        let geocoder: Arc<dyn Geocoder> = Arc::new(StubGeocoder(Some(GeoPoint::new(-22.9056, -47.0608))));
        let point = geocoder.geocode("Campinas").await.unwrap();
        let result = quote(point, Some((-23.5505, -46.6333)), Decimal::ZERO).unwrap();
        assert!(result.distance_km > 80.0);
        assert_eq!(result.fee, Decimal::ZERO);
    }
}
