//! # インフラ層エラー定義
//!
//! CXM や AWS サービスとの通信で発生するエラーを表現する。
//!
//! ## 設計方針
//!
//! - **エラーの変換**: reqwest::Error, serde_json::Error をラップし、AWS SDK のエラーは文字列化
//! - **ログ可能性**: Debug によりログ出力時に詳細情報を表示
//! - **SpanTrace 自動捕捉**: `From` 実装や convenience constructor で
//!   エラー生成時の呼び出し経路を自動記録する
//! - **報告用の詳細**: [`InfraError::detail`] はオーケストレータへの失敗報告に載せる
//!   下位エラーの文言を返す（日本語の接頭辞を含まない）
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別（Http, S3, Sqs 等）

use std::fmt;

use derive_more::Display;
use reqwest::StatusCode;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別（[`InfraErrorKind`]）と [`SpanTrace`]（呼び出し経路）を保持する。
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// HTTP 通信エラー
    ///
    /// 接続失敗、タイムアウト、レスポンスボディの読み取り失敗など。
    #[error("HTTP 通信エラー: {0}")]
    Http(#[source] reqwest::Error),

    /// 成功以外の HTTP ステータス
    #[error("予期しないステータス {status}")]
    UnexpectedStatus {
        /// レスポンスのステータスコード
        status: StatusCode,
        /// レスポンスボディ（ログ用）
        body:   String,
    },

    /// シリアライズ/デシリアライズエラー
    #[error("シリアライズエラー: {0}")]
    Serialization(#[source] serde_json::Error),

    /// S3 エラー
    ///
    /// AWS SDK のエラー型はジェネリクスが深く `#[from]` が困難なため、
    /// 手動で String にマップする。
    #[error("S3 エラー: {0}")]
    S3(String),

    /// SQS リクエストの構築エラー
    ///
    /// メッセージ属性の構築失敗など、送信前に検出されるエラー。
    #[error("SQS リクエスト構築エラー: {0}")]
    SqsRequest(String),

    /// SQS 送信エラー
    #[error("SQS エラー: {0}")]
    Sqs(String),

    /// Step Functions エラー
    #[error("Step Functions エラー: {0}")]
    StepFunctions(String),

    /// Secrets Manager エラー
    #[error("Secrets Manager エラー: {0}")]
    SecretsManager(String),

    /// 設定値の不足・不正
    #[error("設定エラー: {0}")]
    Configuration(String),

    /// 予期しないエラー
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

// ===== InfraError のメソッド =====

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// オーケストレータへの失敗報告に載せる詳細
    ///
    /// ステータスエラーはステータス（例: `500 Internal Server Error`）、
    /// それ以外は下位エラーの文言をそのまま返す。
    pub fn detail(&self) -> String {
        match &self.kind {
            InfraErrorKind::Http(e) => e.to_string(),
            InfraErrorKind::UnexpectedStatus { status, .. } => status.to_string(),
            InfraErrorKind::Serialization(e) => e.to_string(),
            InfraErrorKind::S3(msg)
            | InfraErrorKind::SqsRequest(msg)
            | InfraErrorKind::Sqs(msg)
            | InfraErrorKind::StepFunctions(msg)
            | InfraErrorKind::SecretsManager(msg)
            | InfraErrorKind::Configuration(msg)
            | InfraErrorKind::Unexpected(msg) => msg.clone(),
        }
    }

    /// SQS リクエストの構築段階で失敗したかどうか
    pub fn is_sqs_request(&self) -> bool {
        matches!(self.kind, InfraErrorKind::SqsRequest(_))
    }

    fn with_kind(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    // ===== Convenience constructors =====

    /// 成功以外の HTTP ステータスエラーを生成する
    pub fn unexpected_status(status: StatusCode, body: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::UnexpectedStatus {
            status,
            body: body.into(),
        })
    }

    /// S3 エラーを生成する
    pub fn s3(msg: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::S3(msg.into()))
    }

    /// SQS リクエスト構築エラーを生成する
    pub fn sqs_request(msg: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::SqsRequest(msg.into()))
    }

    /// SQS 送信エラーを生成する
    pub fn sqs(msg: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::Sqs(msg.into()))
    }

    /// Step Functions エラーを生成する
    pub fn step_functions(msg: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::StepFunctions(msg.into()))
    }

    /// Secrets Manager エラーを生成する
    pub fn secrets_manager(msg: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::SecretsManager(msg.into()))
    }

    /// 設定エラーを生成する
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::Configuration(msg.into()))
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::Unexpected(msg.into()))
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

/// URL はクエリに API キーを含むため、保持しない
impl From<reqwest::Error> for InfraError {
    fn from(source: reqwest::Error) -> Self {
        Self::with_kind(InfraErrorKind::Http(source.without_url()))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(source: serde_json::Error) -> Self {
        Self::with_kind(InfraErrorKind::Serialization(source))
    }
}
