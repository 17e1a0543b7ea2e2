//! HTTP client for the finboard backend API
//!
//! Endpoints used by the import engine:
//! - `GET  {base}/categories`
//! - `GET  {base}/paymentType`
//! - `POST {base}/transactions/{categoryId}` with the draft as JSON body
//!
//! Authentication is a bearer token carried in an explicit [`RequestContext`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::domain::result::{Error, Result};
use crate::domain::{Category, CreatedTransaction, PaymentType, TransactionDraft};
use crate::ports::TransactionApi;

/// Default API location of a local backend
pub const DEFAULT_API_URL: &str = "http://localhost:8081/api/";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "FINBOARD_API_URL";

/// Environment variable holding the bearer token
pub const API_TOKEN_ENV: &str = "FINBOARD_API_TOKEN";

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Longest response body echoed back in an error message
const MAX_ERROR_BODY: usize = 200;

/// Where to send requests and how to authenticate them
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub base_url: String,
    pub token: Option<String>,
}

impl RequestContext {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

/// reqwest implementation of [`TransactionApi`]
#[derive(Debug)]
pub struct HttpTransactionApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpTransactionApi {
    pub fn new(context: RequestContext) -> Result<Self> {
        // Url::join drops the last path segment unless the base ends with '/'
        let mut base = context.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| Error::config(format!("Invalid API URL '{}': {}", context.base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token: context.token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::config(format!("Invalid API path '{}': {}", path, e)))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let response = check_response_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::Transport(format!("Failed to parse response from {}: {}", path, e)))
    }

    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Transport(format!(
                "Request timed out after {} seconds",
                REQUEST_TIMEOUT_SECS
            ))
        } else if error.is_connect() {
            Error::Transport(format!("Unable to connect to {}", self.base_url))
        } else {
            Error::Transport(format!("Request failed: {}", error))
        }
    }
}

/// Turn non-success statuses into errors, passing the response through otherwise
async fn check_response_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthorized);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unexpected response")
            .to_string()
    } else {
        body.trim().chars().take(MAX_ERROR_BODY).collect()
    };
    Err(Error::api(status.as_u16(), message))
}

#[async_trait]
impl TransactionApi for HttpTransactionApi {
    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.get_json("categories").await
    }

    async fn fetch_payment_types(&self) -> Result<Vec<PaymentType>> {
        self.get_json("paymentType").await
    }

    async fn create_transaction(
        &self,
        category_id: i64,
        draft: &TransactionDraft,
    ) -> Result<Option<CreatedTransaction>> {
        let url = self.endpoint(&format!("transactions/{}", category_id))?;
        debug!(%url, row = draft.row, "POST");

        let response = self
            .authorize(self.client.post(url))
            .json(draft)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let response = check_response_status(response).await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if body.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<CreatedTransaction>(&body) {
            Ok(created) => Ok(Some(created)),
            Err(e) => {
                debug!(%status, error = %e, "create response is not a transaction record");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::adapters::mock_api::{MockApiConfig, MockApiServer};
    use crate::domain::{CommonValues, CreditDebit, TransactionType};
    use crate::services::SubmissionDriver;

    fn draft(note: &str) -> TransactionDraft {
        let common = CommonValues {
            category_id: 1,
            payment_type_id: 2,
            transaction_type: TransactionType::Single,
            credit_debit: CreditDebit::Debit,
        };
        let mut draft =
            TransactionDraft::from_common(&common, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 1);
        draft.amount = Decimal::new(1250, 2);
        draft.note = note.to_string();
        draft
    }

    fn client_for(server: &MockApiServer, token: Option<&str>) -> HttpTransactionApi {
        HttpTransactionApi::new(RequestContext::new(
            server.base_url(),
            token.map(str::to_string),
        ))
        .unwrap()
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let api =
            HttpTransactionApi::new(RequestContext::new("http://localhost:8081/api", None)).unwrap();
        assert_eq!(api.base_url().as_str(), "http://localhost:8081/api/");
        assert_eq!(
            api.endpoint("transactions/3").unwrap().as_str(),
            "http://localhost:8081/api/transactions/3"
        );
    }

    #[test]
    fn test_rejects_invalid_url() {
        let result = HttpTransactionApi::new(RequestContext::new("not a url", None));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_blank_token_is_dropped() {
        let context = RequestContext::new(DEFAULT_API_URL, Some("  ".to_string()));
        assert!(context.token.is_none());
    }

    #[tokio::test]
    async fn test_fetch_lookups() {
        let server = MockApiServer::start(MockApiConfig::default()).unwrap();
        let api = client_for(&server, None);

        let categories = api.fetch_categories().await.unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].title, "Food");

        let payment_types = api.fetch_payment_types().await.unwrap();
        assert_eq!(payment_types[0].label(), "Visa (*0042)");
    }

    #[tokio::test]
    async fn test_create_transaction_posts_under_category() {
        let server = MockApiServer::start(MockApiConfig::default()).unwrap();
        let api = client_for(&server, None);

        let created = api.create_transaction(3, &draft("Groceries")).await.unwrap();
        assert!(created.unwrap().id > 0);

        let requests = server.created();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, 3);
        assert_eq!(requests[0].1["note"], "Groceries");
        assert_eq!(requests[0].1["transactionDate"], "2024-03-01");
    }

    #[tokio::test]
    async fn test_created_without_body_is_success() {
        let config = MockApiConfig {
            created_body: Some(String::new()),
            ..MockApiConfig::default()
        };
        let server = MockApiServer::start(config).unwrap();
        let api = client_for(&server, None);

        let created = api.create_transaction(3, &draft("Groceries")).await.unwrap();
        assert!(created.is_none());
        assert_eq!(server.created().len(), 1);

        let driver = SubmissionDriver::new(Arc::new(api));
        let outcome = driver.submit(&[draft("Rent"), draft("Power")]).await;
        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.errors, 0);
        assert_eq!(server.created().len(), 3);
    }

    #[tokio::test]
    async fn test_created_with_unexpected_body_is_success() {
        let config = MockApiConfig {
            created_body: Some(r#"{"status": "ok"}"#.to_string()),
            ..MockApiConfig::default()
        };
        let server = MockApiServer::start(config).unwrap();
        let api = client_for(&server, None);

        let created = api.create_transaction(3, &draft("Groceries")).await.unwrap();
        assert!(created.is_none());
    }

    #[tokio::test]
    async fn test_bearer_token_required() {
        let config = MockApiConfig {
            required_token: Some("secret".to_string()),
            ..MockApiConfig::default()
        };
        let server = MockApiServer::start(config).unwrap();

        let anonymous = client_for(&server, None);
        assert!(matches!(
            anonymous.fetch_categories().await,
            Err(Error::Unauthorized)
        ));

        let authorized = client_for(&server, Some("secret"));
        assert!(authorized.fetch_categories().await.is_ok());
    }

    #[tokio::test]
    async fn test_server_error_is_reported_with_status() {
        let config = MockApiConfig {
            failing_notes: vec!["Broken".to_string()],
            ..MockApiConfig::default()
        };
        let server = MockApiServer::start(config).unwrap();
        let api = client_for(&server, None);

        let err = api.create_transaction(1, &draft("Broken")).await.unwrap_err();
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 500);
                assert!(message.contains("rejected"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let api =
            HttpTransactionApi::new(RequestContext::new("http://127.0.0.1:1/api/", None)).unwrap();
        assert!(matches!(
            api.fetch_categories().await,
            Err(Error::Transport(_))
        ));
    }
}
