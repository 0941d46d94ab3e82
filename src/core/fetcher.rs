use crate::domain::model::CredentialSet;
use crate::domain::ports::CapabilitySource;
use crate::utils::error::{HarvestError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Login 回應中依序探測的 token 欄位名，第一個非空字串勝出
pub const TOKEN_FIELD_CANDIDATES: [&str; 6] = [
    "token",
    "access_token",
    "accessToken",
    "jwt",
    "id_token",
    "idToken",
];

// 固定逾時上限：單一打不通的環境不能卡住整批
const LOGIN_TIMEOUT: Duration = Duration::from_secs(30);
const CAPABILITIES_TIMEOUT: Duration = Duration::from_secs(60);

/// 依候選欄位順序在 login 回應裡找 bearer token
pub fn extract_token(login_body: &Value) -> Option<&str> {
    TOKEN_FIELD_CANDIDATES.iter().find_map(|field| {
        login_body
            .get(field)
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
    })
}

/// 實際走網路的 capabilities 來源：login → token 探測 → GetCapabilities。
/// 任一步失敗只影響該憑證組。
#[derive(Debug, Clone, Default)]
pub struct HttpCapabilitySource;

impl HttpCapabilitySource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CapabilitySource for HttpCapabilitySource {
    async fn fetch(&self, credentials: &CredentialSet) -> Result<Value> {
        let target = credentials.identity();

        // 是否略過憑證驗證是逐憑證組的決定，不是全域開關
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!credentials.ssl_verify)
            .build()?;

        // Step 1: Login
        tracing::debug!("📡 {}: logging in at {}", target, credentials.login_url);
        let response = client
            .post(&credentials.login_url)
            .timeout(LOGIN_TIMEOUT)
            .json(&serde_json::json!({
                "username": credentials.username,
                "password": credentials.password,
            }))
            .send()
            .await
            .map_err(|e| HarvestError::Authentication {
                target: target.clone(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(HarvestError::Authentication {
                target,
                message: format!("login failed with status {}", response.status()),
            });
        }

        let login_body: Value =
            response
                .json()
                .await
                .map_err(|_| HarvestError::Authentication {
                    target: target.clone(),
                    message: "login response is not valid JSON".to_string(),
                })?;

        // Step 2: token 探測
        let token = extract_token(&login_body)
            .ok_or_else(|| HarvestError::TokenNotFound {
                target: target.clone(),
                keys: login_body
                    .as_object()
                    .map(|obj| obj.keys().cloned().collect())
                    .unwrap_or_default(),
            })?
            .to_string();

        // Step 3: GetCapabilities
        tracing::debug!(
            "📡 {}: fetching capabilities from {}",
            target,
            credentials.get_capabilities_url
        );
        let response = client
            .get(&credentials.get_capabilities_url)
            .timeout(CAPABILITIES_TIMEOUT)
            .bearer_auth(&token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| HarvestError::CapabilitiesFetch {
                target: target.clone(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(HarvestError::CapabilitiesFetch {
                target,
                message: format!("GetCapabilities failed with status {}", response.status()),
            });
        }

        let document: Value =
            response
                .json()
                .await
                .map_err(|_| HarvestError::CapabilitiesFetch {
                    target: target.clone(),
                    message: "GetCapabilities response is not valid JSON".to_string(),
                })?;

        Ok(document)
    }
}
