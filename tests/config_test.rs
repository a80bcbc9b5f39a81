//! Startup configuration validation

use gastos_bot::models::config::*;
use gastos_bot::models::ErrorCode;
use std::collections::HashMap;
use std::time::Duration;

fn base_env() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        (ENV_TELEGRAM_TOKEN, "123:abc"),
        (ENV_AUTHORIZED_USERS, "1001, 1002"),
        (ENV_SPREADSHEET_NAME, "Finanzas"),
        (ENV_EXPENSES_SHEET, "Gastos"),
        (ENV_CATEGORIES_SHEET, "Categorias"),
        (ENV_CREDENTIALS, "credentials.json"),
    ])
}

fn load(env: &HashMap<&'static str, &'static str>) -> Result<BotConfig, gastos_bot::AppError> {
    BotConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
}

#[test]
fn test_full_config() {
    let config = load(&base_env()).unwrap();
    assert_eq!(config.authorized_users.len(), 2);
    assert!(config.authorized_users.contains(&1002));
    assert_eq!(
        config.sheets.spreadsheet,
        SpreadsheetRef::Name("Finanzas".to_string())
    );
    assert_eq!(config.poll_timeout, Duration::from_secs(30));
    assert_eq!(config.http_port, None);
    assert!(!format!("{:?}", config).contains("123:abc"));
}

#[test]
fn test_each_required_variable() {
    for key in [
        ENV_TELEGRAM_TOKEN,
        ENV_AUTHORIZED_USERS,
        ENV_EXPENSES_SHEET,
        ENV_CATEGORIES_SHEET,
        ENV_CREDENTIALS,
    ] {
        let mut env = base_env();
        env.remove(key);
        let err = load(&env).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigMissingEnv, "{}", key);
    }
}

#[test]
fn test_placeholders_rejected() {
    let mut env = base_env();
    env.insert(ENV_TELEGRAM_TOKEN, "TU_TOKEN_REAL_AQUI");
    assert_eq!(load(&env).unwrap_err().code, ErrorCode::ConfigPlaceholder);

    let mut env = base_env();
    env.insert(ENV_AUTHORIZED_USERS, "123456789");
    assert_eq!(load(&env).unwrap_err().code, ErrorCode::ConfigPlaceholder);
}

#[test]
fn test_bad_values() {
    let mut env = base_env();
    env.insert(ENV_AUTHORIZED_USERS, "1001,ana");
    assert_eq!(load(&env).unwrap_err().code, ErrorCode::ConfigInvalidValue);

    let mut env = base_env();
    env.insert(ENV_PORT, "http");
    assert_eq!(load(&env).unwrap_err().code, ErrorCode::ConfigInvalidValue);
}

#[test]
fn test_spreadsheet_id_wins() {
    let mut env = base_env();
    env.insert(ENV_SPREADSHEET_ID, "1AbC");
    env.insert(ENV_PORT, "8080");
    let config = load(&env).unwrap();
    assert_eq!(config.sheets.spreadsheet, SpreadsheetRef::Id("1AbC".to_string()));
    assert_eq!(config.http_port, Some(8080));
}
