//! # Norbert インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! パイプラインが使う外部システムごとにトレイトを定義し、その具体実装を提供する。
//! 外部システムの詳細をカプセル化し、ユースケースをインフラの変更から保護する。
//!
//! ## 責務
//!
//! - **CXM クライアント**: ケース詳細の取得とステータス遷移（HTTP）
//! - **認証情報**: 環境変数または Secrets Manager からの CXM 認証情報の解決
//! - **AWS クライアント**: S3（テンプレート）、SQS（メールキュー）、Step Functions（コールバック）
//!
//! ## 依存関係
//!
//! ```text
//! apps → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`aws`] - AWS SDK 共通設定
//! - [`config_provider`] - CXM 認証情報の解決
//! - [`cxm`] - CXM クライアント
//! - [`error`] - インフラ層エラー定義
//! - [`s3`] - テンプレートストア
//! - [`sqs`] - メールキュー
//! - [`step_functions`] - タスクコールバック
//! - `mock` - テスト用モック（`test-utils` feature）

pub mod aws;
pub mod config_provider;
pub mod cxm;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod s3;
pub mod sqs;
pub mod step_functions;

pub use config_provider::ConfigProvider;
pub use cxm::CaseManagementClient;
pub use error::InfraError;
pub use s3::TemplateStore;
pub use sqs::EmailQueue;
pub use step_functions::TaskCallback;
