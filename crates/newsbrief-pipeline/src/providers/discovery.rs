use std::sync::Arc;

use async_trait::async_trait;

use super::ArticleDiscovery;
use crate::error::ProviderError;
use crate::types::ArticleLocator;

/// Tries `primary`, then `secondary` when the primary fails or finds nothing.
pub struct FallbackDiscovery {
    primary: Arc<dyn ArticleDiscovery>,
    secondary: Arc<dyn ArticleDiscovery>,
}

impl FallbackDiscovery {
    #[must_use]
    pub fn new(primary: Arc<dyn ArticleDiscovery>, secondary: Arc<dyn ArticleDiscovery>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl ArticleDiscovery for FallbackDiscovery {
    async fn discover(&self, company_name: &str) -> Result<Vec<ArticleLocator>, ProviderError> {
        match self.primary.discover(company_name).await {
            Ok(locators) if !locators.is_empty() => return Ok(locators),
            Ok(_) => {
                tracing::info!(
                    company = company_name,
                    "primary discovery found nothing, trying fallback"
                );
            }
            Err(e) => {
                tracing::warn!(
                    company = company_name,
                    error = %e,
                    "primary discovery failed, trying fallback"
                );
            }
        }
        self.secondary.discover(company_name).await
    }
}
