// src/common/format.rs
//
// Máscaras brasileiras usadas pelos documentos e pela API.

use rust_decimal::{Decimal, RoundingStrategy};

pub fn only_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// 14 dígitos viram CNPJ, 11 viram CPF; qualquer outra coisa volta como veio.
pub fn format_cnpj_cpf(value: &str) -> String {
    let d = only_digits(value);
    match d.len() {
        14 => format!("{}.{}.{}/{}-{}", &d[0..2], &d[2..5], &d[5..8], &d[8..12], &d[12..14]),
        11 => format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11]),
        _ => value.trim().to_string(),
    }
}

pub fn format_cep(value: &str) -> String {
    let d = only_digits(value);
    if d.len() == 8 {
        format!("{}-{}", &d[0..5], &d[5..8])
    } else {
        value.trim().to_string()
    }
}

pub fn format_phone(value: &str) -> String {
    let d = only_digits(value);
    match d.len() {
        11 => format!("({}) {}-{}", &d[0..2], &d[2..7], &d[7..11]),
        10 => format!("({}) {}-{}", &d[0..2], &d[2..6], &d[6..10]),
        _ => value.trim().to_string(),
    }
}

/// `1234.5` -> `R$ 1.234,50`
pub fn format_currency(value: Decimal) -> String {
    format!("R$ {}", format_number(value, 2))
}

/// Número no padrão pt-BR com `scale` casas decimais.
pub fn format_number(value: Decimal, scale: u32) -> String {
    let rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = format!("{:.*}", scale as usize, rounded.abs());

    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (plain, None),
    };

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(&frac);
    }
    out
}

pub fn format_percent(value: Decimal) -> String {
    format!("{}%", format_number(value, 2))
}

/// Aceita `2024-03-15`, `2024-03-15T10:30:00-03:00` ou `20240315`; devolve `15/03/2024`.
pub fn format_date_br(value: &str) -> String {
    let v = value.trim();
    let date_part = v.get(0..10).unwrap_or(v);
    if let Ok(date) = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return date.format("%d/%m/%Y").to_string();
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(v, "%Y%m%d") {
        return date.format("%d/%m/%Y").to_string();
    }
    v.to_string()
}

/// Chave de acesso em grupos de 4 dígitos.
pub fn format_access_key(value: &str) -> String {
    let d = only_digits(value);
    d.as_bytes()
        .chunks(4)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
