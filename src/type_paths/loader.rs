use async_trait::async_trait;

use crate::fetch::FetchError;

use super::TypePaths;

/// Where a session gets the type paths published by the build step.
#[async_trait]
pub trait TypePathsSource: Send + Sync {
    /// Load the descriptor stored under `filename` (`{prefix}{digest}.json`).
    async fn load(&self, filename: &str) -> Result<TypePaths, FetchError>;
}

#[cfg(feature = "http")]
pub use http::HttpTypePathsLoader;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;
    use reqwest::header::CONTENT_TYPE;
    use reqwest::Client;
    use url::Url;

    use crate::fetch::FetchError;
    use crate::type_paths::TypePaths;

    use super::TypePathsSource;

    /// Fetches `{base_url}/{filename}` over plain HTTP. No auth.
    #[derive(Debug, Clone)]
    pub struct HttpTypePathsLoader {
        client: Client,
        base_url: Url,
    }

    impl HttpTypePathsLoader {
        /// `base_url` is the site root the build output is served from.
        pub fn new(base_url: &str) -> Result<Self, FetchError> {
            Self::with_client(Client::new(), base_url)
        }

        pub fn with_client(client: Client, base_url: &str) -> Result<Self, FetchError> {
            let mut base_url = Url::parse(base_url)?;
            if !base_url.path().ends_with('/') {
                let path = format!("{}/", base_url.path());
                base_url.set_path(&path);
            }
            Ok(Self { client, base_url })
        }

        pub fn url_for(&self, filename: &str) -> Result<Url, FetchError> {
            Ok(self.base_url.join(filename.trim_start_matches('/'))?)
        }
    }

    #[async_trait]
    impl TypePathsSource for HttpTypePathsLoader {
        async fn load(&self, filename: &str) -> Result<TypePaths, FetchError> {
            let url = self.url_for(filename)?;
            tracing::debug!(url = %url, "fetching type paths");

            let response = self
                .client
                .get(url.clone())
                .header(CONTENT_TYPE, "application/json")
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            Ok(response.json::<TypePaths>().await?)
        }
    }

}
