//! # 接続先環境
//!
//! CXM の接続先（live / test）と、その環境で使う認証情報を定義する。
//!
//! ## 設計方針
//!
//! - **大文字小文字を区別しない**: `"LIVE"` も `"Live"` も [`Instance::Live`]
//! - **未知の値はエラー**: test へのフォールバックはしない
//! - **API キーはログに出さない**: [`CxmCredentials`] の `Debug` は API キーを伏せる

use std::fmt;

use strum::IntoStaticStr;

use crate::DomainError;

/// CXM の接続先環境
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Instance {
    /// 本番
    Live,
    /// 検証
    Test,
}

impl Instance {
    /// 設定値から接続先環境を判定する
    ///
    /// # エラー
    ///
    /// `live` / `test` 以外（大文字小文字は無視）の場合は
    /// 元の値を保持した `DomainError::UnknownInstance` を返す。
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.to_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "test" => Ok(Self::Test),
            _ => Err(DomainError::UnknownInstance(value.to_string())),
        }
    }
}

/// CXM 認証情報
///
/// 1 回の起動の間だけメモリ上に保持する。
#[derive(Clone, PartialEq, Eq)]
pub struct CxmCredentials {
    endpoint: String,
    api_key:  String,
}

impl CxmCredentials {
    /// 認証情報を作成する
    ///
    /// エンドポイント末尾の `/` は取り除く。
    ///
    /// # エラー
    ///
    /// エンドポイントまたは API キーが空の場合は `DomainError::Validation` を返す。
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self, DomainError> {
        let endpoint = endpoint.into().trim().trim_end_matches('/').to_string();
        let api_key = api_key.into();

        if endpoint.is_empty() {
            return Err(DomainError::Validation(
                "CXM endpoint is required".to_string(),
            ));
        }
        if api_key.trim().is_empty() {
            return Err(DomainError::Validation("CXM API key is required".to_string()));
        }

        Ok(Self { endpoint, api_key })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for CxmCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CxmCredentials")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
