// src/services/customer_service.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CustomerRepository,
    models::customer::{
        Address, AddressPatch, CreditSnapshot, Customer, CustomerPatch, CustomerWithAddresses,
        NewAddress, NewCustomer,
    },
    services::credit_service::CreditService,
};

/// Junta clientes, endereços e crédito usado, preservando a ordem dos clientes.
pub fn attach_addresses(
    customers: Vec<Customer>,
    addresses: Vec<Address>,
    used_credit: Vec<(Uuid, Decimal)>,
) -> Vec<CustomerWithAddresses> {
    let mut by_customer: HashMap<Uuid, Vec<Address>> = HashMap::new();
    for address in addresses {
        by_customer.entry(address.customer_id).or_default().push(address);
    }
    let used: HashMap<Uuid, Decimal> = used_credit.into_iter().collect();

    customers
        .into_iter()
        .map(|customer| CustomerWithAddresses {
            used_credit: used.get(&customer.id).copied().unwrap_or(Decimal::ZERO),
            addresses: by_customer.remove(&customer.id).unwrap_or_default(),
            customer,
        })
        .collect()
}

#[derive(Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
    credit: CreditService,
}

impl CustomerService {
    pub fn new(repo: CustomerRepository, credit: CreditService) -> Self {
        Self { repo, credit }
    }

    pub async fn create<'e, E>(&self, executor: E, tenant_id: Uuid, payload: &NewCustomer) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.insert(executor, tenant_id, payload).await
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        patch: &CustomerPatch,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let mut customer = self
            .repo
            .lock_by_id(&mut *tx, tenant_id, customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        patch.apply_to(&mut customer);
        let customer = self.repo.update(&mut *tx, &customer).await?;

        tx.commit().await?;
        Ok(customer)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, customer_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.delete(executor, tenant_id, customer_id).await
    }

    pub async fn list(&self, conn: &mut PgConnection, tenant_id: Uuid) -> Result<Vec<CustomerWithAddresses>, AppError> {
        let customers = self.repo.list(&mut *conn, tenant_id).await?;
        let addresses = self.repo.list_addresses(&mut *conn, tenant_id).await?;
        let used = self.credit.used_credit_by_customer(conn, tenant_id).await?;

        Ok(attach_addresses(customers, addresses, used))
    }

    pub async fn get(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<CustomerWithAddresses, AppError> {
        let customer = self
            .repo
            .find_by_id(&mut *conn, tenant_id, customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;
        let addresses = self
            .repo
            .list_addresses_for_customer(&mut *conn, tenant_id, customer_id)
            .await?;
        let used_credit = self.credit.used_credit(conn, tenant_id, customer_id).await?;

        Ok(CustomerWithAddresses {
            customer,
            used_credit,
            addresses,
        })
    }

    /// Limite, crédito usado e fiados vencidos do cliente.
    pub async fn credit(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<CreditSnapshot, AppError> {
        let customer = self
            .repo
            .find_by_id(&mut *conn, tenant_id, customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;
        self.credit.snapshot(conn, tenant_id, &customer, None).await
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
        self.repo.insert_address(executor, tenant_id, customer_id, payload).await
    }

    pub async fn update_address<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        address_id: Uuid,
        patch: &AddressPatch,
    ) -> Result<Address, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let mut address = self
            .repo
            .find_address(&mut *tx, tenant_id, customer_id, address_id)
            .await?
            .ok_or(AppError::AddressNotFound)?;

        patch.apply_to(&mut address);
        let address = self.repo.update_address(&mut *tx, &address).await?;

        tx.commit().await?;
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::TestStore;
    use chrono::Utc;

    fn customer(name: &str) -> Customer {
        let now = Utc::now();
        Customer {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            name: name.into(),
            email: None,
            phone: None,
            cellphone: None,
            cpf_cnpj: None,
            is_retail: true,
            max_credit: Decimal::from(200),
            created_at: now,
            updated_at: now,
        }
    }

    fn address(customer_id: Uuid) -> Address {
        Address {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            customer_id,
            cep: "13010-000".into(),
            street: "Rua Treze".into(),
            number: "13".into(),
            complement: None,
            neighborhood: "Centro".into(),
            city: "Campinas".into(),
            state: "SP".into(),
            country: "BR".into(),
            lat: None,
            lon: None,
            distance: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn addresses_and_credit_land_on_their_customer() {
        let ana = customer("Ana");
        let bia = customer("Bia");
        let addresses = vec![address(ana.id), address(bia.id), address(ana.id)];
        let used = vec![(bia.id, Decimal::from(70))];

        let rows = attach_addresses(vec![ana.clone(), bia.clone()], addresses, used);

        assert_eq!(rows[0].customer.name, "Ana");
        assert_eq!(rows[0].addresses.len(), 2);
        assert_eq!(rows[0].used_credit, Decimal::ZERO);
        assert_eq!(rows[1].addresses.len(), 1);
        assert_eq!(rows[1].used_credit, Decimal::from(70));
    }

    fn new_address(street: &str) -> NewAddress {
        NewAddress {
            cep: "13010-000".into(),
            street: street.into(),
            number: "10".into(),
            complement: None,
            neighborhood: "Centro".into(),
            city: "Campinas".into(),
            state: "SP".into(),
            country: "BR".into(),
            lat: None,
            lon: None,
            distance: None,
        }
    }

    #[tokio::test]
    async fn get_returns_only_the_customers_addresses() {
        let Some(store) = TestStore::new().await else {
            return;
        };
        let customers = &store.state.customer_service;
        let ana = store.customer(100).await;
        let bia = store.customer(100).await;

        customers
            .insert_address(store.pool(), store.tenant_id, ana.id, &new_address("Rua Um"))
            .await
            .unwrap();
        customers
            .insert_address(store.pool(), store.tenant_id, bia.id, &new_address("Rua Dois"))
            .await
            .unwrap();
        customers
            .insert_address(store.pool(), store.tenant_id, ana.id, &new_address("Rua Tres"))
            .await
            .unwrap();

        let mut conn = store.pool().acquire().await.unwrap();
        let found = customers.get(&mut conn, store.tenant_id, ana.id).await.unwrap();

        assert_eq!(found.customer.id, ana.id);
        let streets: Vec<_> = found.addresses.iter().map(|a| a.street.as_str()).collect();
        assert_eq!(streets, ["Rua Um", "Rua Tres"]);
        assert!(found.addresses.iter().all(|a| a.customer_id == ana.id));
    }
}

