// src/common/validation.rs
//
// Validações customizadas usadas pelos payloads (`#[validate(custom(...))]`).

use validator::ValidationError;

use crate::common::format::only_digits;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn cnpj_check_digits_ok(digits: &[u32]) -> bool {
    let calc = |len: usize| {
        let weights: Vec<u32> = if len == 12 {
            vec![5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]
        } else {
            vec![6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]
        };
        let sum: u32 = digits[..len].iter().zip(weights).map(|(d, w)| d * w).sum();
        let rest = sum % 11;
        if rest < 2 { 0 } else { 11 - rest }
    };
    calc(12) == digits[12] && calc(13) == digits[13]
}

fn cpf_check_digits_ok(digits: &[u32]) -> bool {
    let calc = |len: usize| {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        let rest = (sum * 10) % 11;
        if rest == 10 { 0 } else { rest }
    };
    calc(9) == digits[9] && calc(10) == digits[10]
}

fn digits_of(value: &str) -> Vec<u32> {
    only_digits(value).chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_equal(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

pub fn is_valid_cnpj(value: &str) -> bool {
    let d = digits_of(value);
    d.len() == 14 && !all_equal(&d) && cnpj_check_digits_ok(&d)
}

pub fn is_valid_cpf(value: &str) -> bool {
    let d = digits_of(value);
    d.len() == 11 && !all_equal(&d) && cpf_check_digits_ok(&d)
}

pub fn validate_cnpj(value: &str) -> Result<(), ValidationError> {
    if is_valid_cnpj(value) {
        Ok(())
    } else {
        Err(error("cnpj", "CNPJ inválido."))
    }
}

/// Fornecedor pode ser pessoa jurídica (CNPJ) ou física (CPF), como nas NFS-e.
pub fn validate_cnpj_or_cpf(value: &str) -> Result<(), ValidationError> {
    if is_valid_cnpj(value) || is_valid_cpf(value) {
        Ok(())
    } else {
        Err(error("cnpj", "CNPJ ou CPF inválido."))
    }
}

pub fn validate_uf(value: &str) -> Result<(), ValidationError> {
    if value.len() == 2 && value.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(error("uf", "UF deve ter duas letras maiúsculas."))
    }
}
