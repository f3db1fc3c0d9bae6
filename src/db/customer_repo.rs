// src/db/customer_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_constraint, AppError},
    models::customer::{Address, Customer, NewAddress, NewCustomer},
};

const CUSTOMER_COLUMNS: &str = "id, tenant_id, name, email, phone, cellphone, cpf_cnpj, \
     is_retail, max_credit, created_at, updated_at";

const ADDRESS_COLUMNS: &str = "id, tenant_id, customer_id, cep, street, number, complement, \
     neighborhood, city, state, country, lat, lon, distance, created_at";

#[derive(Clone, Default)]
pub struct CustomerRepository;

impl CustomerRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &NewCustomer,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (tenant_id, name, email, phone, cellphone, cpf_cnpj, is_retail, max_credit)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.cellphone)
        .bind(&payload.cpf_cnpj)
        .bind(payload.is_retail)
        .bind(payload.max_credit)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    /// Trava a linha do cliente até o fim da transação. Serializa pedidos
    /// fiados simultâneos do mesmo cliente.
    pub async fn lock_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    pub async fn update<'e, E>(&self, executor: E, customer: &Customer) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers
            SET name = $3, email = $4, phone = $5, cellphone = $6, cpf_cnpj = $7,
                is_retail = $8, max_credit = $9, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(customer.tenant_id)
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.cellphone)
        .bind(&customer.cpf_cnpj)
        .bind(customer.is_retail)
        .bind(customer.max_credit)
        .fetch_optional(executor)
        .await?;
        updated.ok_or(AppError::CustomerNotFound)
    }

    /// Remove o cliente (endereços vão junto). Pedidos vinculados impedem a remoção.
    pub async fn delete<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM customers WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(customer_id)
            .execute(executor)
            .await
            .map_err(|e| map_constraint(e, AppError::CustomerHasOrders))?;

        if result.rows_affected() == 0 {
            return Err(AppError::CustomerNotFound);
        }
        Ok(())
    }

    pub async fn list<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE tenant_id = $1 ORDER BY name"
        ))
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(customers)
    }

    // --- Endereços ---

    pub async fn insert_address<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        payload: &NewAddress,
    ) -> Result<Address, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Address>(&format!(
            r#"
            INSERT INTO addresses (tenant_id, customer_id, cep, street, number, complement,
                                   neighborhood, city, state, country, lat, lon, distance)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {ADDRESS_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(customer_id)
        .bind(&payload.cep)
        .bind(&payload.street)
        .bind(&payload.number)
        .bind(&payload.complement)
        .bind(&payload.neighborhood)
        .bind(&payload.city)
        .bind(&payload.state)
        .bind(&payload.country)
        .bind(payload.lat)
        .bind(payload.lon)
        .bind(payload.distance)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint(e, AppError::CustomerNotFound))
    }

    pub async fn find_address<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        address_id: Uuid,
    ) -> Result<Option<Address>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let address = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE tenant_id = $1 AND customer_id = $2 AND id = $3"
        ))
        .bind(tenant_id)
        .bind(customer_id)
        .bind(address_id)
        .fetch_optional(executor)
        .await?;
        Ok(address)
    }

    pub async fn update_address<'e, E>(&self, executor: E, address: &Address) -> Result<Address, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Address>(&format!(
            r#"
            UPDATE addresses
            SET cep = $3, street = $4, number = $5, complement = $6, neighborhood = $7,
                city = $8, state = $9, country = $10, lat = $11, lon = $12, distance = $13
            WHERE tenant_id = $1 AND id = $2
            RETURNING {ADDRESS_COLUMNS}
            "#
        ))
        .bind(address.tenant_id)
        .bind(address.id)
        .bind(&address.cep)
        .bind(&address.street)
        .bind(&address.number)
        .bind(&address.complement)
        .bind(&address.neighborhood)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(address.lat)
        .bind(address.lon)
        .bind(address.distance)
        .fetch_optional(executor)
        .await?;
        updated.ok_or(AppError::AddressNotFound)
    }

    pub async fn list_addresses<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<Address>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE tenant_id = $1 ORDER BY created_at"
        ))
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(addresses)
    }

    pub async fn list_addresses_for_customer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<Address>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses \
             WHERE tenant_id = $1 AND customer_id = $2 ORDER BY created_at"
        ))
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_all(executor)
        .await?;
        Ok(addresses)
    }
}
