//! # CXM 認証情報の解決
//!
//! 接続先環境（live / test）ごとの CXM エンドポイントと API キーを解決する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `ConfigProvider` でパイプラインから取得方法を隠す
//! - **2 つの実装**: 環境変数（[`EnvConfigProvider`]）と Secrets Manager（[`SecretsManagerConfigProvider`]）
//! - **起動ごとに解決**: 解決した認証情報はキャッシュせず、呼び出し側が 1 回の起動の間だけ保持する
//!
//! どちらの実装も同じキー名を使う:
//!
//! | キー | 内容 |
//! |------|------|
//! | `cxmEndPointLive` | live のエンドポイント |
//! | `cxmAPIKeyLive` | live の API キー |
//! | `cxmEndPointTest` | test のエンドポイント |
//! | `cxmAPIKeyTest` | test の API キー |

use std::fmt;

use async_trait::async_trait;
use aws_sdk_secretsmanager::{Client, error::DisplayErrorContext};
use norbert_domain::instance::{CxmCredentials, Instance};
use serde::Deserialize;

use crate::InfraError;

/// 認証情報のキー名
pub mod key {
    pub const ENDPOINT_LIVE: &str = "cxmEndPointLive";
    pub const API_KEY_LIVE: &str = "cxmAPIKeyLive";
    pub const ENDPOINT_TEST: &str = "cxmEndPointTest";
    pub const API_KEY_TEST: &str = "cxmAPIKeyTest";
}

/// 認証情報の取得方法を抽象化するトレイト
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// 指定した接続先環境の CXM 認証情報を返す
    async fn credentials(&self, instance: Instance) -> Result<CxmCredentials, InfraError>;
}

/// 接続先環境 1 つ分の未検証の値
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CxmEndpointSettings {
    pub endpoint: Option<String>,
    pub api_key:  Option<String>,
}

impl fmt::Debug for CxmEndpointSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CxmEndpointSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// 各キー名と値から認証情報を組み立てる
fn build_credentials(
    endpoint_key: &str,
    endpoint: Option<&str>,
    api_key_key: &str,
    api_key: Option<&str>,
) -> Result<CxmCredentials, InfraError> {
    let endpoint = endpoint
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| InfraError::configuration(format!("{endpoint_key} is not set")))?;
    let api_key = api_key
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| InfraError::configuration(format!("{api_key_key} is not set")))?;

    CxmCredentials::new(endpoint, api_key)
        .map_err(|e| InfraError::configuration(e.detail().to_string()))
}

/// キー名の組を返す
fn keys_for(instance: Instance) -> (&'static str, &'static str) {
    match instance {
        Instance::Live => (key::ENDPOINT_LIVE, key::API_KEY_LIVE),
        Instance::Test => (key::ENDPOINT_TEST, key::API_KEY_TEST),
    }
}

// ===== EnvConfigProvider =====

/// 環境変数から認証情報を解決する
///
/// 値は起動時に読み込み、検証は `credentials()` の呼び出し時に行う
/// （不足はオーケストレータへの失敗報告として扱うため）。
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    live: CxmEndpointSettings,
    test: CxmEndpointSettings,
}

impl EnvConfigProvider {
    pub fn new(live: CxmEndpointSettings, test: CxmEndpointSettings) -> Self {
        Self { live, test }
    }

    /// 環境変数 `cxmEndPointLive` 等から読み込む
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self::new(
            CxmEndpointSettings {
                endpoint: var(key::ENDPOINT_LIVE),
                api_key:  var(key::API_KEY_LIVE),
            },
            CxmEndpointSettings {
                endpoint: var(key::ENDPOINT_TEST),
                api_key:  var(key::API_KEY_TEST),
            },
        )
    }
}

#[async_trait]
impl ConfigProvider for EnvConfigProvider {
    async fn credentials(&self, instance: Instance) -> Result<CxmCredentials, InfraError> {
        let settings = match instance {
            Instance::Live => &self.live,
            Instance::Test => &self.test,
        };
        let (endpoint_key, api_key_key) = keys_for(instance);

        build_credentials(
            endpoint_key,
            settings.endpoint.as_deref(),
            api_key_key,
            settings.api_key.as_deref(),
        )
    }
}

// ===== SecretsManagerConfigProvider =====

/// シークレットの JSON 形式
#[derive(Default, Deserialize)]
struct CxmSecret {
    #[serde(rename = "cxmEndPointLive")]
    endpoint_live: Option<String>,
    #[serde(rename = "cxmAPIKeyLive")]
    api_key_live:  Option<String>,
    #[serde(rename = "cxmEndPointTest")]
    endpoint_test: Option<String>,
    #[serde(rename = "cxmAPIKeyTest")]
    api_key_test:  Option<String>,
}

impl CxmSecret {
    fn credentials(&self, instance: Instance) -> Result<CxmCredentials, InfraError> {
        let (endpoint, api_key) = match instance {
            Instance::Live => (&self.endpoint_live, &self.api_key_live),
            Instance::Test => (&self.endpoint_test, &self.api_key_test),
        };
        let (endpoint_key, api_key_key) = keys_for(instance);

        build_credentials(
            endpoint_key,
            endpoint.as_deref(),
            api_key_key,
            api_key.as_deref(),
        )
    }
}

/// シークレット文字列から認証情報を取り出す
fn credentials_from_secret(
    secret_string: &str,
    instance: Instance,
) -> Result<CxmCredentials, InfraError> {
    let secret: CxmSecret = serde_json::from_str(secret_string)?;
    secret.credentials(instance)
}

/// Secrets Manager から認証情報を解決する
///
/// 固定のシークレット ID とバージョンステージ（例: `AWSCURRENT`）を使う。
pub struct SecretsManagerConfigProvider {
    client:        Client,
    secret_id:     String,
    version_stage: String,
}

impl SecretsManagerConfigProvider {
    pub fn new(client: Client, secret_id: String, version_stage: String) -> Self {
        Self {
            client,
            secret_id,
            version_stage,
        }
    }
}

#[async_trait]
impl ConfigProvider for SecretsManagerConfigProvider {
    async fn credentials(&self, instance: Instance) -> Result<CxmCredentials, InfraError> {
        tracing::debug!(
            secret_id = %self.secret_id,
            version_stage = %self.version_stage,
            "CXM 認証情報をシークレットから取得"
        );

        let output = self
            .client
            .get_secret_value()
            .secret_id(&self.secret_id)
            .version_stage(&self.version_stage)
            .send()
            .await
            .map_err(|e| InfraError::secrets_manager(DisplayErrorContext(&e).to_string()))?;

        let secret_string = output.secret_string().ok_or_else(|| {
            InfraError::secrets_manager(format!("secret {} has no SecretString", self.secret_id))
        })?;

        credentials_from_secret(secret_string, instance)
    }
}

/// Secrets Manager クライアントを作成する
pub fn create_client(sdk_config: &aws_config::SdkConfig) -> Client {
    Client::new(sdk_config)
}
