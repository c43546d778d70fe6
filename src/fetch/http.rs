//! reqwest-backed content API client.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, COOKIE};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use url::Url;

use crate::document::RawDocument;

use super::{ContentApi, ContentApiConnector, DocumentQuery, FetchError, PREVIEW_COOKIE};

#[derive(Debug, Deserialize)]
struct ApiMetadata {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(default, rename = "isMasterRef")]
    is_master_ref: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawDocument>,
}

/// Connects to `https://{repository}.cdn.prismic.io/api/v2`, or to a fixed
/// endpoint set with [`HttpConnector::with_endpoint`].
///
/// Holds no per-preview state; clones can serve any number of concurrent
/// sessions.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    client: Client,
    endpoint: Option<String>,
}

impl HttpConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        HttpConnector {
            client,
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn endpoint_for(&self, repository: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{}.cdn.prismic.io/api/v2", repository),
        }
    }
}

fn with_cookie(request: RequestBuilder, preview_ref: Option<&str>) -> RequestBuilder {
    match preview_ref {
        Some(token) => {
            let value: String = url::form_urlencoded::byte_serialize(token.as_bytes()).collect();
            request.header(COOKIE, format!("{}={}", PREVIEW_COOKIE, value))
        }
        None => request,
    }
}

async fn get_json<T: serde::de::DeserializeOwned>(request: RequestBuilder) -> Result<T, FetchError> {
    let response = request.header(ACCEPT, "application/json").send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: response.url().to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl ContentApiConnector for HttpConnector {
    async fn connect(
        &self,
        repository: &str,
        access_token: Option<&str>,
        preview_token: Option<&str>,
    ) -> Result<Box<dyn ContentApi>, FetchError> {
        let endpoint = Url::parse(&self.endpoint_for(repository))?;
        let preview_ref = preview_token.map(str::to_string);

        let mut request = self.client.get(endpoint.clone());
        if let Some(token) = access_token {
            request = request.query(&[("access_token", token)]);
        }
        let metadata: ApiMetadata =
            get_json(with_cookie(request, preview_ref.as_deref())).await?;

        let master_ref = metadata
            .refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or_else(|| FetchError::Decode("repository metadata has no master ref".into()))?;

        Ok(Box::new(HttpContentApi {
            client: self.client.clone(),
            endpoint,
            access_token: access_token.map(str::to_string),
            master_ref,
            preview_ref,
        }))
    }
}

/// A connected repository.
#[derive(Debug, Clone)]
pub struct HttpContentApi {
    client: Client,
    endpoint: Url,
    access_token: Option<String>,
    master_ref: String,
    /// Sent as the preview cookie and used as the query ref.
    preview_ref: Option<String>,
}

impl HttpContentApi {
    pub fn master_ref(&self) -> &str {
        &self.master_ref
    }

    /// The preview ref when connected for a preview, the master ref otherwise.
    pub fn current_ref(&self) -> &str {
        self.preview_ref.as_deref().unwrap_or(&self.master_ref)
    }

    fn search_url(&self) -> Result<Url, FetchError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(["documents", "search"]);
        Ok(url)
    }
}

#[async_trait]
impl ContentApi for HttpContentApi {
    async fn get_by_id(
        &self,
        id: &str,
        query: &DocumentQuery,
    ) -> Result<Option<RawDocument>, FetchError> {
        let mut params: Vec<(&str, String)> = vec![
            ("ref", self.current_ref().to_string()),
            ("q", format!("[[at(document.id,\"{}\")]]", id)),
        ];
        if let Some(lang) = &query.lang {
            params.push(("lang", lang.clone()));
        }
        if !query.fetch_links.is_empty() {
            params.push(("fetchLinks", query.fetch_links.join(",")));
        }
        if let Some(token) = &self.access_token {
            params.push(("access_token", token.clone()));
        }

        let request = self.client.get(self.search_url()?).query(&params);
        let response: SearchResponse =
            get_json(with_cookie(request, self.preview_ref.as_deref())).await?;
        Ok(response.results.into_iter().next())
    }
}
