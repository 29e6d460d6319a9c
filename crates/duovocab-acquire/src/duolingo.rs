use anyhow::{Context, Result};
use duovocab_model::{VocabularyItem, WordDefinition};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::service::{MediaFetcher, VocabularyService};
use crate::types::{Language, LoginResponse, UserData, VocabularyOverview};

const BASE_URL: &str = "https://www.duolingo.com";
const USER_AGENT: &str = "duovocab/0.1 (vocabulary export tool)";

/// Authenticated client for the Duolingo web API.
///
/// Holds the session JWT as a default bearer header; every request is
/// awaited by the caller before the next one is issued.
pub struct DuolingoClient {
    client: reqwest::Client,
    /// Unauthenticated client for CDN media, so the token stays on-site.
    media_client: reqwest::Client,
    username: String,
    base_url: String,
}

impl DuolingoClient {
    /// Log in and return a client carrying the session token.
    ///
    /// A rejected login surfaces as an error whose message is fit to show
    /// the user before asking for credentials again.
    pub async fn login(username: &str, password: &str) -> Result<Self> {
        Self::login_at(BASE_URL, username, password).await
    }

    /// As [`DuolingoClient::login`], against an alternate host.
    pub async fn login_at(base_url: &str, username: &str, password: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let anonymous = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()?;

        let url = format!("{base_url}/login");
        tracing::info!(username = %username, "Logging in");
        let response = anonymous
            .post(&url)
            .json(&serde_json::json!({ "login": username, "password": password }))
            .send()
            .await
            .context("Failed to reach login endpoint")?;

        let status = response.status();
        let jwt = response
            .headers()
            .get("jwt")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .context("Failed to read login response")?;
        let (jwt, user_id) = session_token(status, jwt.as_deref(), &body)?;

        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {jwt}"))
            .context("Session token is not a valid header value")?;
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .default_headers(headers)
            .build()?;

        tracing::info!(username = %username, user_id = ?user_id, "Logged in");
        Ok(Self {
            client,
            media_client: anonymous,
            username: username.to_string(),
            base_url,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!(url = %url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;

        let status = response.status();
        anyhow::ensure!(status.is_success(), "HTTP {status} for {url}");

        response
            .json()
            .await
            .with_context(|| format!("Failed to decode response from {url}"))
    }
}

/// Decide a login attempt from its response: the session JWT and the
/// user id on success, otherwise an error message for the user.
///
/// The service reports bad credentials with a 200 and a `failure` body,
/// so the body is checked before the token header.
fn session_token(
    status: StatusCode,
    jwt: Option<&str>,
    body: &str,
) -> Result<(String, Option<serde_json::Value>)> {
    anyhow::ensure!(status.is_success(), "Login failed: HTTP {status}");

    let body: LoginResponse =
        serde_json::from_str(body).context("Login failed: unexpected response body")?;
    if let Some(failure) = body.failure {
        let detail = body.message.unwrap_or(failure);
        anyhow::bail!("Login failed: {detail}");
    }
    let jwt = jwt
        .filter(|t| !t.is_empty())
        .context("Login failed: no session token in response")?;
    Ok((jwt.to_string(), body.user_id))
}

impl VocabularyService for DuolingoClient {
    async fn languages(&self) -> Result<Vec<Language>> {
        let url = format!("{}/users/{}", self.base_url, self.username);
        let user: UserData = self.get_json(&url).await?;
        let languages = user.learning_languages();
        tracing::debug!(count = languages.len(), "Fetched learning languages");
        Ok(languages)
    }

    async fn vocabulary(&self, language_code: &str) -> Result<Vec<VocabularyItem>> {
        let url = format!(
            "{}/vocabulary/overview?language_id={language_code}",
            self.base_url
        );
        let overview: VocabularyOverview = self.get_json(&url).await?;
        tracing::info!(
            lang = %language_code,
            words = overview.vocab_overview.len(),
            "Fetched vocabulary overview"
        );
        Ok(overview.vocab_overview)
    }

    async fn definition(&self, id: &str) -> Result<WordDefinition> {
        let url = format!("{}/api/1/dictionary_page?lexeme_id={id}", self.base_url);
        self.get_json(&url).await
    }
}

impl MediaFetcher for DuolingoClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .media_client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch media {url}"))?;

        let status = response.status();
        anyhow::ensure!(status.is_success(), "HTTP {status} for {url}");

        let bytes = response
            .bytes()
            .await
            .context("Failed to read media body")?;
        tracing::debug!(url = %url, bytes = bytes.len(), "Fetched media");
        Ok(bytes.to_vec())
    }
}
