//! Category Registry
//!
//! The set of valid category names for this process lifetime. Built once at
//! startup from the categories worksheet and shared read-only afterwards.
//!
//! Names are stored lowercased; lookups are case-insensitive.

use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::models::errors::{AppError, AppResult};
use crate::utils::text::capitalize;

/// Where the category listing comes from
#[async_trait]
pub trait CategorySource: Send + Sync {
    /// Raw first column of the categories sheet, header row included
    async fn fetch_category_column(&self) -> AppResult<Vec<String>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryRegistry {
    names: HashSet<String>,
}

impl CategoryRegistry {
    /// Fetch and build the registry.
    ///
    /// A failing fetch is fatal (`REGISTRY_LOAD_FAILED`). An empty listing is
    /// only a warning: the bot starts and simply never matches a shortcut.
    pub async fn load(source: &dyn CategorySource) -> AppResult<Self> {
        let column = source
            .fetch_category_column()
            .await
            .map_err(AppError::registry_load_failed)?;

        let registry = Self::from_column(column);

        if registry.is_empty() {
            warn!("⚠️ No categories loaded from the categories sheet");
        } else {
            info!(
                "📂 Categories loaded ({}): {}",
                registry.len(),
                registry.sorted_names().join(", ")
            );
        }

        Ok(registry)
    }

    /// Build from a sheet column: skip the header, drop blanks, lowercase
    pub fn from_column<I, S>(column: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_names(column.into_iter().skip(1))
    }

    /// Build from bare names (no header)
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        Self { names }
    }

    /// Case-insensitive membership
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.trim().to_lowercase())
    }

    /// Display list: alphabetical, each capitalized
    pub fn all(&self) -> Vec<String> {
        self.sorted_names().into_iter().map(capitalize).collect()
    }

    fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;

    struct FixedSource(AppResult<Vec<String>>);

    #[async_trait]
    impl CategorySource for FixedSource {
        async fn fetch_category_column(&self) -> AppResult<Vec<String>> {
            match &self.0 {
                Ok(col) => Ok(col.clone()),
                Err(e) => Err(AppError::new(e.code, e.message.clone())),
            }
        }
    }

    fn column(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_header_skipped_and_blanks_dropped() {
        let reg = CategoryRegistry::from_column(["Categoria", "Comida", "", "  ", "Transporte"]);
        assert_eq!(reg.len(), 2);
        assert!(reg.contains("comida"));
        assert!(reg.contains("TRANSPORTE"));
        assert!(!reg.contains("categoria"));
    }

    #[test]
    fn test_duplicates_collapse_case_insensitively() {
        let reg = CategoryRegistry::from_names(["Comida", "COMIDA", "comida "]);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_all_is_sorted_and_capitalized() {
        let reg = CategoryRegistry::from_names(["transporte", "COMIDA", "Alquiler"]);
        assert_eq!(reg.all(), vec!["Alquiler", "Comida", "Transporte"]);
    }

    #[tokio::test]
    async fn test_load_empty_is_not_fatal() {
        let source = FixedSource(Ok(column(&["Categoria"])));
        let reg = CategoryRegistry::load(&source).await.unwrap();
        assert!(reg.is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_is_fatal() {
        let source = FixedSource(Err(AppError::sheets_failed("HTTP 403")));
        let err = CategoryRegistry::load(&source).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RegistryLoadFailed);
    }
}
