// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::OnceLock;

const DEFAULT_LANG: &str = "pt";

const PT: &[(&str, &str)] = &[
    ("validation_error", "Um ou mais campos são inválidos."),
    ("email_already_exists", "Este e-mail já está em uso."),
    ("invalid_credentials", "E-mail ou senha inválidos."),
    ("invalid_token", "Token de autenticação inválido ou ausente."),
    ("user_not_found", "Usuário não encontrado."),
    ("tenant_not_found", "Contexto da loja não encontrado."),
    ("tenant_access_denied", "Você não tem acesso a esta loja."),
    ("subdomain_already_exists", "O subdomínio '{subdomain}' já está em uso."),
    ("permission_denied", "Você precisa da permissão '{permission}' para realizar esta ação."),
    ("permission_not_found", "A permissão '{permission}' não existe."),
    ("role_not_found", "Cargo não encontrado nesta loja."),
    ("customer_not_found", "Cliente não encontrado"),
    ("address_not_found", "Endereço não encontrado para este cliente"),
    ("customer_has_orders", "Cliente possui pedidos e não pode ser removido"),
    ("pending_expired_fiado", "Cliente possui pedidos fiados pendentes e expirados"),
    ("insufficient_credit", "Cliente não possui crédito suficiente para esta compra"),
    ("insufficient_payment", "Valor pago é menor que o total da compra, adicione mais pagamentos"),
    ("cash_without_cashier", "Pagamento em dinheiro precisa de um caixa selecionado"),
    ("no_courier_selected", "Sem motoboy selecionado"),
    ("courier_not_found", "Motoboy não encontrado nesta loja"),
    ("product_not_found", "Produto não encontrado"),
    ("order_not_found", "Pedido não encontrado"),
    ("order_canceled", "Pedido cancelado não aceita pagamentos"),
    ("order_closed", "Pedido já foi encerrado ou cancelado"),
    ("not_fiado_order", "Apenas pedidos fiados possuem data de vencimento"),
    ("illegal_transition", "Não é possível alterar o status do pedido de {from} para {to}"),
    ("payment_not_found", "Pagamento não encontrado"),
    ("cashier_not_found", "Caixa não encontrado"),
    ("cashier_not_empty", "Caixa possui saldo ou movimentações e não pode ser removido"),
    ("sku_not_found", "Item de estoque não encontrado"),
    ("image_not_found", "Imagem não encontrada"),
    ("invalid_form_data", "Formulário inválido: {reason}"),
    ("address_not_geocoded", "Endereço não encontrado para calcular taxa de entrega!"),
    ("geocoding_failed", "Erro ao geocodificar endereço!"),
    ("depot_location_missing", "A loja não possui localização cadastrada"),
    ("unique_violation", "Registro duplicado ({constraint})"),
    ("geocoder_unavailable", "Serviço de geocodificação indisponível"),
    ("internal_error", "Ocorreu um erro inesperado."),
];

const EN: &[(&str, &str)] = &[
    ("validation_error", "One or more fields are invalid."),
    ("email_already_exists", "This e-mail is already in use."),
    ("invalid_credentials", "Invalid e-mail or password."),
    ("invalid_token", "Missing or invalid authentication token."),
    ("user_not_found", "User not found."),
    ("tenant_not_found", "Store context not found."),
    ("tenant_access_denied", "You do not have access to this store."),
    ("subdomain_already_exists", "The subdomain '{subdomain}' is already taken."),
    ("permission_denied", "You need the '{permission}' permission to perform this action."),
    ("permission_not_found", "The permission '{permission}' does not exist."),
    ("role_not_found", "Role not found in this store."),
    ("customer_not_found", "Customer not found"),
    ("address_not_found", "Address not found for this customer"),
    ("customer_has_orders", "Customer has orders and cannot be removed"),
    ("pending_expired_fiado", "Customer has pending expired credit orders"),
    ("insufficient_credit", "Customer does not have enough credit for this purchase"),
    ("insufficient_payment", "Amount paid is less than the total, add more payments"),
    ("cash_without_cashier", "Cash payments need a selected cashier"),
    ("no_courier_selected", "No courier selected"),
    ("courier_not_found", "Courier not found in this store"),
    ("product_not_found", "Product not found"),
    ("order_not_found", "Order not found"),
    ("order_canceled", "Canceled orders do not accept payments"),
    ("order_closed", "Order is already ended or canceled"),
    ("not_fiado_order", "Only credit orders have a due date"),
    ("illegal_transition", "Cannot change order status from {from} to {to}"),
    ("payment_not_found", "Payment not found"),
    ("cashier_not_found", "Cashier not found"),
    ("cashier_not_empty", "Cashier has a balance or transactions and cannot be removed"),
    ("sku_not_found", "Stock item not found"),
    ("image_not_found", "Image not found"),
    ("invalid_form_data", "Invalid form data: {reason}"),
    ("address_not_geocoded", "Address not found to compute the delivery fee!"),
    ("geocoding_failed", "Failed to geocode address!"),
    ("depot_location_missing", "The store has no registered location"),
    ("unique_violation", "Duplicate record ({constraint})"),
    ("geocoder_unavailable", "Geocoding service unavailable"),
    ("internal_error", "An unexpected error occurred."),
];

/// Tabelas de mensagens por idioma (subtag primário: "pt", "en").
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut messages = HashMap::new();
        messages.insert("pt", PT.iter().copied().collect());
        messages.insert("en", EN.iter().copied().collect());
        Self { messages }
    }

    pub fn global() -> &'static I18nStore {
        static STORE: OnceLock<I18nStore> = OnceLock::new();
        STORE.get_or_init(I18nStore::new)
    }

    /// Busca a mensagem no idioma pedido, cai para o português e, por último, devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str, params: &[(&str, String)]) -> String {
        let template = self
            .messages
            .get(lang)
            .and_then(|table| table.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|table| table.get(key)))
            .copied()
            .unwrap_or(key);

        params.iter().fold(template.to_string(), |acc, (name, value)| {
            acc.replace(&format!("{{{}}}", name), value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        let store = I18nStore::new();
        assert_eq!(store.translate("de", "no_courier_selected", &[]), "Sem motoboy selecionado");
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::new();
        assert_eq!(store.translate("pt", "nao_existe", &[]), "nao_existe");
    }

    #[test]
    fn placeholders_are_replaced() {
        let store = I18nStore::new();
        let msg = store.translate(
            "pt",
            "illegal_transition",
            &[("from", "DELIVERED".into()), ("to", "PENDING".into())],
        );
        assert_eq!(msg, "Não é possível alterar o status do pedido de DELIVERED para PENDING");
    }

    #[test]
    fn every_portuguese_key_has_an_english_counterpart() {
        let store = I18nStore::new();
        for (key, _) in PT {
            assert!(store.messages["en"].contains_key(key), "faltando en: {key}");
        }
    }
}
