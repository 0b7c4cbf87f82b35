//! # AWS SDK 共通設定
//!
//! S3 / SQS / Step Functions / Secrets Manager の各クライアントが共有する
//! `SdkConfig` を組み立てる。
//!
//! ## 設計方針
//!
//! - **ローカル開発**: LocalStack を使用（`endpoint_url` で接続先を指定）
//! - **本番環境**: Lambda 実行ロールによる認証で AWS に接続（`endpoint_url` 未設定）
//! - **タイムアウト**: SDK のデフォルトに任せず、操作単位のタイムアウトを設定で与える

use std::time::Duration;

use aws_config::{BehaviorVersion, Region, SdkConfig, timeout::TimeoutConfig};

/// AWS 接続設定
#[derive(Debug, Clone)]
pub struct AwsSettings {
    /// リージョン（例: `eu-west-1`）
    pub region:            String,
    /// カスタムエンドポイント（LocalStack 使用時のみ）
    pub endpoint_url:      Option<String>,
    /// 1 操作（リトライ込み）のタイムアウト
    pub operation_timeout: Duration,
}

/// 全クライアント共通の SDK 設定を読み込む
///
/// 認証情報は SDK のデフォルト認証チェーンで解決する:
/// - ローカル: 環境変数 `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`（`.env` で設定）
/// - 本番: Lambda 実行ロール
pub async fn load_sdk_config(settings: &AwsSettings) -> SdkConfig {
    let timeout_config = TimeoutConfig::builder()
        .operation_timeout(settings.operation_timeout)
        .build();

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(settings.region.clone()))
        .timeout_config(timeout_config);

    if let Some(endpoint_url) = &settings.endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }

    loader.load().await
}
