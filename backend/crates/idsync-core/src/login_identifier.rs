use chrono::{Datelike, NaiveDate};

/// Normalize a login identifier to the 12-digit national id form when it is one.
///
/// Email addresses, member numbers and anything else that is not a 10 or 12
/// digit national id are returned unchanged. A 10-digit id gets its century
/// inferred from `today`; a `+` separator marks a holder aged 100 or more.
pub fn normalize_login_identifier(input: &str, today: NaiveDate) -> String {
    if input.contains('@') {
        return input.to_string();
    }

    let trimmed = input.trim();
    let centenarian = trimmed.contains('+');
    let digits: String = trimmed.chars().filter(|c| *c != '-' && *c != '+').collect();

    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return input.to_string();
    }

    match digits.len() {
        10 => {
            let bytes = digits.as_bytes();
            let embedded_year = i32::from((bytes[0] - b'0') * 10 + (bytes[1] - b'0'));
            let century = infer_century(embedded_year, today.year(), centenarian);
            format!("{century:02}{digits}")
        }
        12 => digits,
        _ => input.to_string(),
    }
}

fn infer_century(embedded_year: i32, current_year: i32, centenarian: bool) -> i32 {
    let current_century = current_year.div_euclid(100);
    let year_in_century = current_year.rem_euclid(100);
    let implied_age = current_year - (current_century * 100 + embedded_year);

    let century = if embedded_year > year_in_century || implied_age >= 100 {
        current_century - 1
    } else {
        current_century
    };

    if centenarian { century - 1 } else { century }
}
