//! Field-level validation primitives used at the request boundary.
//!
//! Handlers walk a request's fields in declaration order, reject on the
//! first predicate that fails, and surface that field's message verbatim.
//! Nothing is persisted on failure.

/// Minimal structural email check: one `@`, non-empty local part, dotted
/// domain.
pub fn email_ok(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Phone numbers: optional leading `+`, then 10-15 characters drawn from
/// digits, spaces, dashes and parentheses.
pub fn phone_ok(phone: &str) -> bool {
    let rest = phone.strip_prefix('+').unwrap_or(phone);
    let len = rest.chars().count();
    (10..=15).contains(&len)
        && rest
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
}

/// Indian PIN codes are exactly six digits.
pub fn pincode_ok(pincode: &str) -> bool {
    pincode.len() == 6 && pincode.chars().all(|c| c.is_ascii_digit())
}
