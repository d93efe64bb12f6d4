use crate::{first_last, normalize_name};

use googletest::assert_that;
use googletest::prelude::{eq, none, some};
use proptest::prelude::*;

// =========================================================================
// Unit Tests - Diacritics and Separators
// =========================================================================

#[test]
fn given_umlaut_when_normalized_then_folded_to_base_letter() {
    assert_that!(normalize_name("Müller"), eq("muller"));
}

#[test]
fn given_hyphenated_name_when_normalized_then_hyphen_kept() {
    assert_that!(normalize_name("Jean-Pierre"), eq("jean-pierre"));
}

#[test]
fn given_repeated_internal_spaces_when_normalized_then_single_dot() {
    assert_that!(normalize_name("Van   Der \t Berg"), eq("van.der.berg"));
}

#[test]
fn given_dot_hyphen_run_when_normalized_then_single_hyphen() {
    assert_that!(normalize_name("Jean.-Pierre"), eq("jean-pierre"));
    assert_that!(normalize_name("Jean -. Pierre"), eq("jean-pierre"));
}

#[test]
fn given_leading_and_trailing_separators_when_normalized_then_trimmed() {
    assert_that!(normalize_name(" .-Anna-. "), eq("anna"));
}

#[test]
fn given_vietnamese_name_when_normalized_then_stacked_marks_removed() {
    assert_that!(normalize_name("Nguyễn"), eq("nguyen"));
    assert_that!(normalize_name("Phạm"), eq("pham"));
}

#[test]
fn given_turkish_name_when_normalized_then_folded() {
    assert_that!(normalize_name("Çağlar"), eq("caglar"));
    assert_that!(normalize_name("Şahin"), eq("sahin"));
}

#[test]
fn given_ligatures_when_normalized_then_expanded() {
    assert_that!(normalize_name("Æsa"), eq("aesa"));
    assert_that!(normalize_name("Straße"), eq("strasse"));
    assert_that!(normalize_name("Þór"), eq("thor"));
    assert_that!(normalize_name("Øresund"), eq("oresund"));
    assert_that!(normalize_name("Łukasz"), eq("lukasz"));
}

#[test]
fn given_symbols_when_normalized_then_dropped_and_digits_kept() {
    assert_that!(normalize_name("John@#$%"), eq("john"));
    assert_that!(normalize_name("John2"), eq("john2"));
}

#[test]
fn given_empty_or_blank_when_normalized_then_empty() {
    assert_that!(normalize_name(""), eq(""));
    assert_that!(normalize_name("   "), eq(""));
}

// =========================================================================
// Unit Tests - first.last
// =========================================================================

#[test]
fn given_both_names_when_first_last_then_joined_with_dot() {
    assert_that!(
        first_last(Some("Müller"), Some("Øresund")),
        some(eq("muller.oresund"))
    );
    assert_that!(
        first_last(Some("Jean-Pierre"), Some("Van Der Berg")),
        some(eq("jean-pierre.van.der.berg"))
    );
}

#[test]
fn given_empty_first_name_when_first_last_then_leading_dot() {
    assert_that!(first_last(Some(""), Some("Doe")), some(eq(".doe")));
    assert_that!(first_last(Some("   "), Some("Doe")), some(eq(".doe")));
}

#[test]
fn given_missing_part_when_first_last_then_none() {
    assert_that!(first_last(None, Some("Doe")), none());
    assert_that!(first_last(Some("John"), None), none());
}

// =========================================================================
// Property-Based Tests
// =========================================================================

proptest! {
    #[test]
    fn given_any_input_when_normalized_then_token_charset_is_restricted(input in "\\PC{0,40}") {
        let token = normalize_name(&input);
        prop_assert!(token.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'));
        prop_assert!(!token.starts_with(['.', '-']));
        prop_assert!(!token.ends_with(['.', '-']));
        prop_assert!(!token.contains("..") && !token.contains("--"));
    }

    #[test]
    fn given_normalized_token_when_normalized_again_then_unchanged(input in "\\PC{0,40}") {
        let once = normalize_name(&input);
        prop_assert_eq!(normalize_name(&once), once);
    }

    #[test]
    fn given_case_variants_when_normalized_then_same_token(input in "[a-zA-Z ]{1,30}") {
        prop_assert_eq!(normalize_name(&input.to_uppercase()), normalize_name(&input.to_lowercase()));
    }
}
