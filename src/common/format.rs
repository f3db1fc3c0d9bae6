// src/common/format.rs
// Formatação usada nos textos do log de auditoria (padrão pt-BR).

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// 1234.5 -> "R$ 1.234,50"
pub fn format_brl(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();

    let cents = format!("{:.2}", abs);
    let (int_part, frac_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{}R$ {},{}", if negative { "-" } else { "" }, grouped, frac_part)
}

pub fn format_date_br(date: &DateTime<Utc>) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_currency_with_thousands_separator() {
        assert_eq!(format_brl(Decimal::new(123450, 2)), "R$ 1.234,50");
        assert_eq!(format_brl(Decimal::new(1234567890, 2)), "R$ 12.345.678,90");
    }

    #[test]
    fn formats_small_and_negative_values() {
        assert_eq!(format_brl(Decimal::ZERO), "R$ 0,00");
        assert_eq!(format_brl(Decimal::new(5, 1)), "R$ 0,50");
        assert_eq!(format_brl(Decimal::new(-2500, 2)), "-R$ 25,00");
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(format_brl(Decimal::new(10005, 3)), "R$ 10,01");
    }

    #[test]
    fn formats_dates_day_first() {
        let date = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        assert_eq!(format_date_br(&date), "19/10/2026");
    }
}
