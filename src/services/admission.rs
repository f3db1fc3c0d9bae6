// src/services/admission.rs
//
// Regras de admissão de pedidos. Funções puras: quem chama busca o estado
// (cliente, crédito) e só grava depois que tudo aqui passou.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        customer::{Address, CreditSnapshot, Customer},
        order::OrderStatus,
        payment::{net_cash, total_paid, NewPayment},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    Fiado,
    Paid,
    Waiting,
}

/// O cliente precisa existir e, se houver endereço, ele deve ser dele.
pub fn check_customer<'a>(
    customer: Option<&'a Customer>,
    address: Option<Option<&Address>>,
) -> Result<&'a Customer, AppError> {
    let customer = customer.ok_or(AppError::CustomerNotFound)?;
    match address {
        Some(Some(address)) if address.customer_id == customer.id => Ok(customer),
        Some(_) => Err(AppError::AddressNotFound),
        None => Ok(customer),
    }
}

/// Fiado: nada vencido em aberto e o limite comporta o novo total.
/// `used + total == max_credit` ainda é admitido.
pub fn check_credit(credit: &CreditSnapshot, total: Decimal) -> Result<(), AppError> {
    if credit.pending_expired > 0 {
        return Err(AppError::PendingExpiredFiado);
    }
    if credit.used_credit + total > credit.max_credit {
        return Err(AppError::InsufficientCredit);
    }
    Ok(())
}

/// Pedido pago: a soma dos pagamentos cobre o total (sem a taxa de entrega).
pub fn check_payments(total: Decimal, payments: &[NewPayment]) -> Result<Decimal, AppError> {
    let paid = total_paid(payments);
    if paid < total {
        return Err(AppError::InsufficientPayment);
    }
    Ok(paid)
}

/// Dinheiro sempre entra em um caixa: sem caixa, nenhum pagamento em espécie.
pub fn check_cash_cashier(payments: &[NewPayment], cashier_id: Option<Uuid>) -> Result<(), AppError> {
    let moves_cash = payments
        .iter()
        .any(|p| net_cash(p.payment_method, p.amount_paid, p.troco) > Decimal::ZERO);
    if moves_cash && cashier_id.is_none() {
        return Err(AppError::CashWithoutCashier);
    }
    Ok(())
}

pub fn require_courier(motoboy_id: Option<Uuid>) -> Result<Uuid, AppError> {
    motoboy_id.ok_or(AppError::NoCourierSelected)
}

/// Com motoboy o pedido sai confirmado; sem motoboy foi entregue no balcão.
pub fn initial_status(kind: OrderKind, motoboy_id: Option<Uuid>) -> OrderStatus {
    match (kind, motoboy_id) {
        (OrderKind::Waiting, _) | (_, Some(_)) => OrderStatus::Confirmed,
        (_, None) => OrderStatus::Delivered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payment::PaymentMethod;
    use chrono::Utc;

    fn credit(max: i64, used: i64, expired: i64) -> CreditSnapshot {
        CreditSnapshot {
            customer_id: Uuid::new_v4(),
            max_credit: Decimal::from(max),
            used_credit: Decimal::from(used),
            pending_expired: expired,
        }
    }

    fn pay(amount: i64) -> NewPayment {
        NewPayment {
            payment_method: PaymentMethod::Pix,
            amount_paid: Decimal::from(amount),
            troco: Decimal::ZERO,
        }
    }

    fn customer() -> Customer {
        let now = Utc::now();
        Customer {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Adega Central".into(),
            email: None,
            phone: None,
            cellphone: None,
            cpf_cnpj: None,
            is_retail: false,
            max_credit: Decimal::from(100),
            created_at: now,
            updated_at: now,
        }
    }

    fn address_of(customer_id: Uuid) -> Address {
        Address {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            customer_id,
            cep: "13010-000".into(),
            street: "Rua Barão".into(),
            number: "10".into(),
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
    fn credit_over_limit_is_rejected() {
        let err = check_credit(&credit(100, 80, 0), Decimal::from(30)).unwrap_err();
        assert!(matches!(err, AppError::InsufficientCredit));
    }

    #[test]
    fn credit_within_limit_is_admitted() {
        assert!(check_credit(&credit(100, 80, 0), Decimal::from(15)).is_ok());
    }

    #[test]
    fn credit_exactly_at_limit_is_admitted() {
        assert!(check_credit(&credit(100, 80, 0), Decimal::from(20)).is_ok());
    }

    #[test]
    fn expired_fiado_blocks_before_limit() {
        let err = check_credit(&credit(1000, 0, 1), Decimal::from(1)).unwrap_err();
        assert!(matches!(err, AppError::PendingExpiredFiado));
    }

    #[test]
    fn payments_covering_total_are_admitted() {
        let paid = check_payments(Decimal::from(50), &[pay(30), pay(25)]).unwrap();
        assert_eq!(paid, Decimal::from(55));
    }

    #[test]
    fn short_payment_is_rejected() {
        let err = check_payments(Decimal::from(50), &[pay(30)]).unwrap_err();
        assert!(matches!(err, AppError::InsufficientPayment));
    }

    #[test]
    fn cash_needs_a_cashier() {
        let cash = NewPayment {
            payment_method: PaymentMethod::Dinheiro,
            amount_paid: Decimal::from(30),
            troco: Decimal::ZERO,
        };
        assert!(matches!(
            check_cash_cashier(&[pay(20), cash.clone()], None),
            Err(AppError::CashWithoutCashier)
        ));
        assert!(check_cash_cashier(&[cash], Some(Uuid::new_v4())).is_ok());
    }

    #[test]
    fn pix_and_exact_change_do_not_need_a_cashier() {
        let all_change = NewPayment {
            payment_method: PaymentMethod::Dinheiro,
            amount_paid: Decimal::from(10),
            troco: Decimal::from(10),
        };
        assert!(check_cash_cashier(&[pay(50), all_change], None).is_ok());
    }

    #[test]
    fn waiting_order_needs_courier() {
        assert!(matches!(require_courier(None), Err(AppError::NoCourierSelected)));
        let courier = Uuid::new_v4();
        assert_eq!(require_courier(Some(courier)).unwrap(), courier);
    }

    #[test]
    fn initial_status_follows_courier() {
        let courier = Some(Uuid::new_v4());
        assert_eq!(initial_status(OrderKind::Fiado, None), OrderStatus::Delivered);
        assert_eq!(initial_status(OrderKind::Paid, None), OrderStatus::Delivered);
        assert_eq!(initial_status(OrderKind::Paid, courier), OrderStatus::Confirmed);
        assert_eq!(initial_status(OrderKind::Waiting, courier), OrderStatus::Confirmed);
    }

    #[test]
    fn missing_customer_is_rejected() {
        assert!(matches!(check_customer(None, None), Err(AppError::CustomerNotFound)));
    }

    #[test]
    fn address_must_belong_to_customer() {
        let customer = customer();
        let own = address_of(customer.id);
        let other = address_of(Uuid::new_v4());

        assert!(check_customer(Some(&customer), Some(Some(&own))).is_ok());
        assert!(matches!(
            check_customer(Some(&customer), Some(Some(&other))),
            Err(AppError::AddressNotFound)
        ));
        assert!(matches!(
            check_customer(Some(&customer), Some(None)),
            Err(AppError::AddressNotFound)
        ));
    }
}
