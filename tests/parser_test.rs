//! Integration tests for message parsing

use chrono::NaiveDate;
use gastos_bot::core::parser::parse_message;
use gastos_bot::core::CategoryRegistry;
use gastos_bot::models::{MessageContext, ParseOutcome, RejectionKind};
use rust_decimal::Decimal;
use std::str::FromStr;

fn ctx() -> MessageContext {
    MessageContext {
        actor: "Ana".to_string(),
        received_at: NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap(),
    }
}

fn registry() -> CategoryRegistry {
    CategoryRegistry::from_column(["Categoria", "Comida", "Transporte", "cafe"])
}

fn expense(text: &str) -> gastos_bot::ParsedExpense {
    match parse_message(text, &registry(), &ctx()) {
        ParseOutcome::Expense(e) => e,
        other => panic!("expected expense for {:?}, got {:?}", text, other),
    }
}

fn rejection(text: &str) -> RejectionKind {
    match parse_message(text, &registry(), &ctx()) {
        ParseOutcome::Rejected(r) => r.kind,
        other => panic!("expected rejection for {:?}, got {:?}", text, other),
    }
}

#[test]
fn test_standard_form_round_trip() {
    let e = expense("gasto 12.50 supermercado");
    assert_eq!(e.amount, Decimal::from_str("12.50").unwrap());
    assert_eq!(e.category, "Supermercado");
    assert_eq!(e.actor, "Ana");
    assert_eq!(e.description, "");
    assert_eq!(e.timestamp_string(), "2024-03-01 09:15:00");
}

#[test]
fn test_description_anywhere_in_message() {
    let e = expense("gasto 5 'con amigos' cafe");
    assert_eq!(e.description, "con amigos");
    assert_eq!(e.category, "Cafe");

    let e = expense("cafe 'después del trabajo' 3.20");
    assert_eq!(e.description, "después del trabajo");
    assert_eq!(e.amount, Decimal::from_str("3.2").unwrap());
}

#[test]
fn test_only_first_quoted_span_is_description() {
    let e = expense("gasto 5 cafe 'uno' 'dos'");
    assert_eq!(e.description, "uno");
    assert_eq!(e.category, "Cafe 'dos'");
}

#[test]
fn test_shortcut_matches_standard_form() {
    let shortcut = expense("Comida 20");
    let standard = expense("gasto 20 comida");
    assert_eq!(shortcut, standard);
}

#[test]
fn test_shortcut_without_amount() {
    assert_eq!(
        rejection("comida"),
        RejectionKind::MalformedShortcut {
            category: "comida".to_string()
        }
    );
}

#[test]
fn test_invalid_and_non_positive_amounts() {
    assert_eq!(
        rejection("gasto abc comida"),
        RejectionKind::InvalidAmount {
            token: "abc".to_string()
        }
    );
    assert_eq!(
        rejection("transporte 1e3"),
        RejectionKind::InvalidAmount {
            token: "1e3".to_string()
        }
    );
    assert_eq!(
        rejection("gasto 0 comida"),
        RejectionKind::NonPositiveAmount {
            token: "0".to_string()
        }
    );
    assert_eq!(
        rejection("gasto -4 comida"),
        RejectionKind::NonPositiveAmount {
            token: "-4".to_string()
        }
    );
}

#[test]
fn test_missing_parts() {
    assert_eq!(rejection("gasto"), RejectionKind::MalformedExpense);
    assert_eq!(rejection("GASTO 10"), RejectionKind::MalformedExpense);
}

#[test]
fn test_unrecognized_text() {
    for text in ["hola", "", "   ", "'solo descripción'", "gastos 10 comida", "ropa 30"] {
        assert_eq!(
            parse_message(text, &registry(), &ctx()),
            ParseOutcome::Unrecognized,
            "{:?}",
            text
        );
    }
}

#[test]
fn test_parsing_is_repeatable() {
    let registry = registry();
    let ctx = ctx();
    for text in ["comida 7", "gasto x comida", "gasto 9 cine 'estreno'", "hola"] {
        assert_eq!(
            parse_message(text, &registry, &ctx),
            parse_message(text, &registry, &ctx)
        );
    }
}

#[test]
fn test_category_listing_is_sorted_and_capitalized() {
    assert_eq!(registry().all(), vec!["Cafe", "Comida", "Transporte"]);
}

#[test]
fn test_multi_word_category_is_never_a_shortcut() {
    let ctx = ctx();

    let multi = CategoryRegistry::from_names(["comida rapida"]);
    assert!(multi.contains("Comida Rapida"));
    assert_eq!(
        parse_message("comida rapida 5", &multi, &ctx),
        ParseOutcome::Unrecognized
    );

    // Only the first word registered: it is the shortcut, the rest shifts
    let first_word = CategoryRegistry::from_names(["comida"]);
    match parse_message("comida rapida 5", &first_word, &ctx) {
        ParseOutcome::Rejected(r) => assert_eq!(
            r.kind,
            RejectionKind::InvalidAmount {
                token: "rapida".to_string()
            }
        ),
        other => panic!("expected invalid amount, got {:?}", other),
    }

    // The multi-word name still works through the standard form
    match parse_message("gasto 5 comida rapida", &multi, &ctx) {
        ParseOutcome::Expense(e) => assert_eq!(e.category, "Comida rapida"),
        other => panic!("expected expense, got {:?}", other),
    }
}
