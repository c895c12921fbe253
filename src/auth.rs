use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppError, AppResult};

/// Turns a bearer credential into an account identity.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn verify(&self, token: &str) -> AppResult<Uuid>;
}

/// Credential from an `Authorization` header, with or without the `Bearer ` prefix.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

#[derive(Deserialize)]
struct Account {
    id: Uuid,
}

/// Asks the account service who owns a credential.
#[derive(Debug, Clone)]
pub struct RemoteAuth {
    http_client: reqwest::Client,
    account_url: String,
}

impl RemoteAuth {
    pub fn new(auth_address: &str, timeout: Duration) -> AppResult<RemoteAuth> {
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()?;

        Ok(RemoteAuth {
            http_client,
            account_url: format!("{}/accounts/me", auth_address.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Authenticator for RemoteAuth {
    async fn verify(&self, token: &str) -> AppResult<Uuid> {
        if token.is_empty() {
            return Err(AppError::Unauthorized);
        }

        let response = self.http_client
            .get(&self.account_url)
            .header(AUTHORIZATION, token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::Unauthorized),
            status if status.is_success() => {
                let Account { id } = response.json().await?;
                Ok(id)
            }
            status => Err(anyhow::anyhow!("account service answered {status}").into()),
        }
    }
}

/// Fixed set of accounts whose credential is the account id itself.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    accounts: HashSet<Uuid>,
}

impl StaticAuth {
    pub fn new(accounts: impl IntoIterator<Item = Uuid>) -> StaticAuth {
        StaticAuth {
            accounts: accounts.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Authenticator for StaticAuth {
    async fn verify(&self, token: &str) -> AppResult<Uuid> {
        match Uuid::parse_str(token) {
            Ok(id) if self.accounts.contains(&id) => Ok(id),
            _ => Err(AppError::Unauthorized),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{http::HeaderValue, response::IntoResponse, routing::get, Json, Router};
    use tokio::net::TcpListener;

    use super::*;

    const OWNER: Uuid = Uuid::from_u128(0x0192_0000_0000_7000_8000_0000_0000_0001);

    /// Account service stand-in; its answer depends on the forwarded credential.
    async fn accounts_me(headers: HeaderMap) -> axum::response::Response {
        match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some("owner-token") => Json(serde_json::json!({ "id": OWNER })).into_response(),
            Some("expired-token") => StatusCode::UNAUTHORIZED.into_response(),
            Some("banned-token") => StatusCode::FORBIDDEN.into_response(),
            Some("broken-body") => "not json".into_response(),
            _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }

    async fn account_service() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = Router::new().route("/accounts/me", get(accounts_me));
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        addr
    }

    #[test]
    fn bearer_prefix_is_optional() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn static_auth_knows_only_its_accounts() {
        let known = Uuid::now_v7();
        let auth = StaticAuth::new([known]);

        assert_eq!(auth.verify(&known.to_string()).await.unwrap(), known);
        assert!(matches!(auth.verify(&Uuid::now_v7().to_string()).await, Err(AppError::Unauthorized)));
        assert!(matches!(auth.verify("garbage").await, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn remote_auth_rejects_empty_token_without_calling_out() {
        let auth = RemoteAuth::new("http://127.0.0.1:9", Duration::from_millis(50)).unwrap();
        assert!(matches!(auth.verify("").await, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn remote_auth_maps_account_service_answers() {
        let addr = account_service().await;
        let auth = RemoteAuth::new(&format!("http://{addr}/"), Duration::from_secs(1)).unwrap();

        // the credential travels verbatim in the Authorization header
        assert_eq!(auth.verify("owner-token").await.unwrap(), OWNER);

        assert!(matches!(auth.verify("expired-token").await, Err(AppError::Unauthorized)));
        assert!(matches!(auth.verify("banned-token").await, Err(AppError::Unauthorized)));
        assert!(matches!(auth.verify("anything-else").await, Err(AppError::Internal(_))));
        assert!(matches!(auth.verify("broken-body").await, Err(AppError::Internal(_))));
    }
}
