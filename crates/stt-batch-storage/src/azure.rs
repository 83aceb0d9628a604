use std::sync::Arc;

use object_store::azure::MicrosoftAzureBuilder;
use object_store::ObjectStore;
use stt_batch_core::StorageLocation;

use crate::traits::{StorageError, StorageResult, StoreProvider};

/// Azure Blob Storage authorised with the SAS token embedded in each location.
#[derive(Debug, Clone, Copy, Default)]
pub struct AzureSasProvider;

impl AzureSasProvider {
    pub fn new() -> Self {
        Self
    }
}

impl StoreProvider for AzureSasProvider {
    fn connect(&self, location: &StorageLocation) -> StorageResult<Arc<dyn ObjectStore>> {
        let account = location.account_name().ok_or_else(|| {
            StorageError::ConfigError(format!(
                "Cannot derive storage account from endpoint {}",
                location.endpoint()
            ))
        })?;

        let allow_http = location.endpoint().starts_with("http://");

        let store = MicrosoftAzureBuilder::new()
            .with_account(account)
            .with_container_name(location.container_name())
            .with_endpoint(location.endpoint().to_string())
            .with_allow_http(allow_http)
            .with_sas_authorization(location.sas_query_pairs())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        tracing::debug!(
            endpoint = %location.endpoint(),
            container = %location.container_name(),
            "Connected Azure blob store"
        );

        Ok(Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connects_with_sas_location() {
        let location = StorageLocation::parse(
            "https://acct.blob.core.windows.net/container/jobs/1?sv=2023-11-03&sig=abc",
        )
        .unwrap();

        assert!(AzureSasProvider::new().connect(&location).is_ok());
    }

    #[test]
    fn allows_plain_http_endpoints() {
        let location =
            StorageLocation::parse("http://devstore.localhost:10000/container?sig=abc").unwrap();

        assert!(AzureSasProvider::new().connect(&location).is_ok());
    }
}
