//! # Case Response Notifier 設定
//!
//! 環境変数から通知 Lambda の設定を読み込む。
//!
//! `instance` と `sqsEmailURL` は未設定でも起動を止めない。
//! 不足は起動ごとの失敗報告としてオーケストレータに返すため、ここでは空文字列として保持する。

use std::{env, time::Duration};

use norbert_infra::aws::AwsSettings;
use strum::EnumString;
use thiserror::Error;

const DEFAULT_SECRET_ID: &str = "cxm";
const DEFAULT_SECRET_VERSION_STAGE: &str = "AWSCURRENT";
const DEFAULT_TEMPLATE_BUCKET: &str = "norbert.templates";
const DEFAULT_TEMPLATE_KEY: &str = "email-staff-response.txt";
const DEFAULT_FROM_ADDRESS: &str = "norbert@northampton.digital";
const DEFAULT_REGION: &str = "eu-west-1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 値の形式が不正
    #[error("{name} の値が不正です: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// CXM 認証情報の取得元
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, strum::Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ConfigSource {
    /// 環境変数 `cxmEndPointLive` 等
    Env,
    /// Secrets Manager のシークレット
    SecretsManager,
}

/// Secrets Manager の参照先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretSettings {
    pub secret_id:     String,
    pub version_stage: String,
}

/// 通知 Lambda の設定
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// 接続先環境（未検証の生の値）
    pub instance:        String,
    /// CXM 認証情報の取得元
    pub config_source:   ConfigSource,
    /// Secrets Manager の参照先（`config_source` が `SecretsManager` の場合に使用）
    pub secret:          SecretSettings,
    /// メールキューの URL
    pub queue_url:       String,
    /// テンプレートのバケット名
    pub template_bucket: String,
    /// テンプレートのオブジェクトキー
    pub template_key:    String,
    /// 差出人アドレス
    pub from_address:    String,
    /// AWS 接続設定
    pub aws:             AwsSettings,
    /// CXM への HTTP リクエストのタイムアウト
    pub cxm_timeout:     Duration,
}

impl NotifierConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の取得関数から設定を読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let or_default = |name: &str, default: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let config_source = match lookup("CONFIG_SOURCE").filter(|v| !v.trim().is_empty()) {
            None => ConfigSource::Env,
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "CONFIG_SOURCE",
                value,
            })?,
        };

        Ok(Self {
            instance: lookup("instance").unwrap_or_default(),
            config_source,
            secret: SecretSettings {
                secret_id:     or_default("CXM_SECRET_ID", DEFAULT_SECRET_ID),
                version_stage: or_default("CXM_SECRET_VERSION_STAGE", DEFAULT_SECRET_VERSION_STAGE),
            },
            queue_url: lookup("sqsEmailURL").unwrap_or_default(),
            template_bucket: or_default("TEMPLATE_BUCKET", DEFAULT_TEMPLATE_BUCKET),
            template_key: or_default("TEMPLATE_KEY", DEFAULT_TEMPLATE_KEY),
            from_address: or_default("EMAIL_FROM_ADDRESS", DEFAULT_FROM_ADDRESS),
            aws: AwsSettings {
                region:            or_default("AWS_REGION_NAME", DEFAULT_REGION),
                endpoint_url:      lookup("AWS_ENDPOINT_URL").filter(|v| !v.trim().is_empty()),
                operation_timeout: seconds(&lookup, "AWS_OPERATION_TIMEOUT_SECS")?,
            },
            cxm_timeout: seconds(&lookup, "CXM_TIMEOUT_SECS")?,
        })
    }
}

/// 秒数の設定値を読む（未設定なら既定値）
fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Duration, ConfigError> {
    let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) else {
        return Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    };

    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::Invalid { name, value }),
    }
}
