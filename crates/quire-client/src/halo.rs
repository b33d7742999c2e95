//! Halo client for syncing posts with a Halo 1.x blog through its admin API.
//!
//! Every admin endpoint wraps its payload in the same envelope:
//!
//! ```json
//! {
//!     "status": 200,
//!     "message": "OK",
//!     "data": T
//! }
//! ```
//!
//! Post listings are paged inside `data`, with `content` holding the rows.

use std::sync::Arc;

use quire_core::error::AppError;
use quire_core::models::{PostQuery, PostRequest, RemotePost, TaxonomyEntry};
use quire_core::traits::RemoteApi;
use quire_core::{HttpConfig, SiteConfig};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tokio::time::sleep;

/// Header carrying the admin access token.
const AUTH_HEADER: &str = "ADMIN-Authorization";

/// Generic wrapper for Halo admin API responses.
#[derive(Deserialize, Debug)]
struct HaloResponse<T> {
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

impl<T> HaloResponse<T> {
    fn into_data(self, what: &str) -> Result<T, AppError> {
        self.data.ok_or_else(|| {
            AppError::Generic(format!(
                "Halo returned no data for {}: {}",
                what,
                self.message.unwrap_or_default()
            ))
        })
    }
}

/// One page of a paged listing.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    content: Vec<T>,
    #[serde(default)]
    has_next: bool,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize, Debug)]
struct AuthToken {
    access_token: String,
}

#[derive(Serialize)]
struct TaxonomyRequest<'a> {
    name: &'a str,
}

#[derive(Debug)]
struct Credentials {
    username: String,
    password: String,
}

/// HTTP client for the admin API of a Halo blog.
///
/// The client logs in lazily on its first request. Clones share the HTTP
/// connection pool and the access token, so a batch logs in once.
///
/// Reads are retried on transient failures. Writes are sent exactly once:
/// a retried create could duplicate a post or a taxonomy entry.
///
/// # Examples
///
/// ```no_run
/// use quire_client::HaloClient;
/// use quire_core::SiteConfig;
/// use quire_core::traits::RemoteApi;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let site = SiteConfig {
///     url: "https://blog.example.com/".to_string(),
///     username: "admin".to_string(),
///     password: "secret".to_string(),
///     meta_format: None,
/// };
/// let client = HaloClient::new(&site)?;
/// let tags = client.list_tags().await?;
/// println!("Found {} tags", tags.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HaloClient {
    client: Client,
    base_url: Url,
    credentials: Arc<Credentials>,
    token: Arc<OnceCell<String>>,
    http_config: HttpConfig,
}

impl HaloClient {
    /// Creates a client with the default HTTP configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if the site URL cannot be parsed.
    /// Returns `AppError::ConfigError` if the HTTP client cannot be built.
    pub fn new(site: &SiteConfig) -> Result<Self, AppError> {
        Self::with_http_config(site, HttpConfig::default())
    }

    pub fn with_http_config(site: &SiteConfig, http_config: HttpConfig) -> Result<Self, AppError> {
        // Keep exactly one trailing slash so relative joins stay under the base path.
        let base_url = Url::parse(&format!("{}/", site.base_url()))
            .map_err(|_| AppError::InvalidUrl(site.url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::InvalidUrl(site.url.clone()));
        }

        let client = Client::builder()
            .user_agent(concat!("Quire/", env!("CARGO_PKG_VERSION")))
            .timeout(http_config.timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            credentials: Arc::new(Credentials {
                username: site.username.clone(),
                password: site.password.clone(),
            }),
            token: Arc::new(OnceCell::new()),
            http_config,
        })
    }

    /// Base URL of the blog, always ending with a single `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::InvalidUrl(format!("{}{}: {}", self.base_url, path, e)))
    }

    fn posts_url(&self, query: &PostQuery, page: u32) -> Result<Url, AppError> {
        let mut url = self.endpoint("api/admin/posts")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("page", &page.to_string())
                .append_pair("size", &query.page_size.to_string());
            if let Some(keyword) = &query.keyword {
                pairs.append_pair("keyword", keyword);
            }
            if let Some(status) = query.status {
                pairs.append_pair("status", status.as_str());
            }
        }
        Ok(url)
    }

    /// Returns the access token, logging in on first use.
    async fn token(&self) -> Result<&str, AppError> {
        let token = self.token.get_or_try_init(|| self.login()).await?;
        Ok(token.as_str())
    }

    async fn login(&self) -> Result<String, AppError> {
        let url = self.endpoint("api/admin/login")?;
        tracing::debug!(username = self.credentials.username.as_str(), "Logging in to Halo");

        let resp = self
            .client
            .post(url)
            .json(&LoginRequest {
                username: &self.credentials.username,
                password: &self.credentials.password,
            })
            .send()
            .await
            .map_err(|e| transport_error(e, &self.http_config))?;

        let auth: AuthToken = read_envelope(resp, "login").await?.into_data("login")?;
        Ok(auth.access_token)
    }

    async fn authorized(&self, method: Method, url: Url) -> Result<RequestBuilder, AppError> {
        let token = self.token().await?;
        Ok(self.client.request(method, url).header(AUTH_HEADER, token))
    }

    /// Sends a GET request, retrying transient failures with linear backoff.
    async fn get<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T, AppError> {
        let max_retries = self.http_config.max_retries.max(1);
        let base_delay = self.http_config.retry_base_delay;

        let mut attempt = 1;
        loop {
            let result = match self.authorized(Method::GET, url.clone()).await?.send().await {
                Ok(resp) => read_envelope(resp, what)
                    .await
                    .and_then(|envelope| envelope.into_data(what)),
                Err(e) => Err(transport_error(e, &self.http_config)),
            };

            match result {
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    tracing::debug!(attempt, url = %url, error = %e, "Retrying Halo request");
                    sleep(base_delay * attempt).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Sends a write request exactly once.
    async fn send<B, T>(
        &self,
        method: Method,
        url: Url,
        body: &B,
        what: &str,
    ) -> Result<HaloResponse<T>, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .authorized(method, url)
            .await?
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(e, &self.http_config))?;
        read_envelope(resp, what).await
    }
}

/// Reads a response, mapping HTTP failures onto the error vocabulary.
async fn read_envelope<T: DeserializeOwned>(
    resp: Response,
    what: &str,
) -> Result<HaloResponse<T>, AppError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| AppError::RemoteUnavailable(format!("Failed to read response: {}", e)))?;

    if !status.is_success() {
        return Err(error_for_status(status, error_message(&body, what)));
    }

    Ok(serde_json::from_str(&body)?)
}

/// Extracts the envelope's message from an error body, if there is one.
fn error_message(body: &str, what: &str) -> String {
    serde_json::from_str::<HaloResponse<IgnoredAny>>(body)
        .ok()
        .and_then(|r| r.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| what.to_string())
}

fn error_for_status(status: StatusCode, message: String) -> AppError {
    match status {
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            AppError::RemoteUnavailable(format!("HTTP {}: {}", status.as_u16(), message))
        }
        s if s.is_server_error() => {
            AppError::RemoteUnavailable(format!("HTTP {}: {}", s.as_u16(), message))
        }
        s => AppError::RemoteRejected {
            status: s.as_u16(),
            message,
        },
    }
}

fn transport_error(e: reqwest::Error, http_config: &HttpConfig) -> AppError {
    if e.is_timeout() {
        AppError::RemoteUnavailable(format!(
            "request timed out after {}s",
            http_config.timeout.as_secs()
        ))
    } else if e.is_connect() {
        AppError::RemoteUnavailable(format!("Connection failed: {}", e))
    } else {
        AppError::RemoteUnavailable(e.to_string())
    }
}

impl RemoteApi for HaloClient {
    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<RemotePost>, AppError> {
        let mut posts = Vec::new();
        let mut page = 0;
        loop {
            let url = self.posts_url(query, page)?;
            let batch: Page<RemotePost> = self.get(url, "post listing").await?;
            let fetched = batch.content.len();
            posts.extend(batch.content);

            if !batch.has_next || fetched == 0 {
                break;
            }
            page += 1;
        }

        tracing::debug!(
            keyword = query.keyword.as_deref(),
            count = posts.len(),
            pages = page + 1,
            "Listed Halo posts"
        );
        Ok(posts)
    }

    async fn get_post(&self, id: i64) -> Result<RemotePost, AppError> {
        let url = self.endpoint(&format!("api/admin/posts/{}", id))?;
        self.get(url, &format!("post {}", id)).await
    }

    async fn create_post(&self, request: &PostRequest) -> Result<i64, AppError> {
        let url = self.endpoint("api/admin/posts")?;
        let what = format!("post '{}'", request.title);
        let post: RemotePost = self
            .send(Method::POST, url, request, &what)
            .await?
            .into_data(&what)?;
        Ok(post.id)
    }

    async fn update_post(&self, id: i64, request: &PostRequest) -> Result<(), AppError> {
        let url = self.endpoint(&format!("api/admin/posts/{}", id))?;
        let _: HaloResponse<IgnoredAny> = self
            .send(Method::PUT, url, request, &format!("post {}", id))
            .await?;
        Ok(())
    }

    async fn delete_posts(&self, ids: &[i64]) -> Result<(), AppError> {
        let url = self.endpoint("api/admin/posts")?;
        let _: HaloResponse<IgnoredAny> = self.send(Method::DELETE, url, ids, "post deletion").await?;
        tracing::debug!(count = ids.len(), "Deleted Halo posts");
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<TaxonomyEntry>, AppError> {
        let url = self.endpoint("api/admin/categories")?;
        self.get(url, "category listing").await
    }

    async fn create_category(&self, name: &str) -> Result<TaxonomyEntry, AppError> {
        let url = self.endpoint("api/admin/categories")?;
        let what = format!("category '{}'", name);
        self.send(Method::POST, url, &TaxonomyRequest { name }, &what)
            .await?
            .into_data(&what)
    }

    async fn list_tags(&self) -> Result<Vec<TaxonomyEntry>, AppError> {
        let url = self.endpoint("api/admin/tags")?;
        self.get(url, "tag listing").await
    }

    async fn create_tag(&self, name: &str) -> Result<TaxonomyEntry, AppError> {
        let url = self.endpoint("api/admin/tags")?;
        let what = format!("tag '{}'", name);
        self.send(Method::POST, url, &TaxonomyRequest { name }, &what)
            .await?
            .into_data(&what)
    }
}
