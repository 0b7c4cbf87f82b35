//! # S3 テンプレートストア
//!
//! メールテンプレート（プレーンテキスト）を Amazon S3 / LocalStack から読み込む。
//!
//! エラーの文言はオーケストレータへの失敗報告にそのまま載るため、SDK の文言を加工しない。
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use norbert_infra::s3::{self, TemplateStore};
//!
//! async fn load(sdk_config: &aws_config::SdkConfig) -> Result<String, norbert_infra::InfraError> {
//!     let client = s3::create_client(sdk_config, false);
//!     let store = s3::S3TemplateStore::new(client, "norbert.templates".to_string());
//!     store.fetch("email-staff-response.txt").await
//! }
//! ```

use async_trait::async_trait;
use aws_sdk_s3::{Client, error::DisplayErrorContext};

use crate::InfraError;

/// テンプレートストアのインターフェース
///
/// テスト時はモックに差し替え可能。
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// テンプレートを UTF-8 テキストとして読み込む
    ///
    /// # 引数
    ///
    /// * `key` - オブジェクトキー（例: `email-staff-response.txt`）
    async fn fetch(&self, key: &str) -> Result<String, InfraError>;
}

/// S3 テンプレートストア
///
/// `aws-sdk-s3` を使用した [`TemplateStore`] の実装。
pub struct S3TemplateStore {
    client:      Client,
    bucket_name: String,
}

impl S3TemplateStore {
    /// 新しいテンプレートストアを作成する
    pub fn new(client: Client, bucket_name: String) -> Self {
        Self {
            client,
            bucket_name,
        }
    }
}

#[async_trait]
impl TemplateStore for S3TemplateStore {
    async fn fetch(&self, key: &str) -> Result<String, InfraError> {
        tracing::debug!(bucket = %self.bucket_name, key, "テンプレートを取得");

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| InfraError::s3(DisplayErrorContext(&e).to_string()))?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| InfraError::s3(e.to_string()))?
            .into_bytes();

        String::from_utf8(bytes.to_vec())
            .map_err(|e| InfraError::s3(format!("template is not valid UTF-8: {e}")))
    }
}

/// S3 クライアントを作成する
///
/// LocalStack はパススタイルが必要なため、カスタムエンドポイント使用時は
/// `force_path_style` を有効にする。
pub fn create_client(sdk_config: &aws_config::SdkConfig, force_path_style: bool) -> Client {
    let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
        .force_path_style(force_path_style)
        .build();

    Client::from_conf(s3_config)
}
