//! # オーケストレータへの結果報告
//!
//! Step Functions から渡されるタスクトークンと、トークン宛てに返す
//! 成功・失敗の結果を定義する。
//!
//! ## 設計方針
//!
//! - **1 起動につき 1 回**: 結果は [`Outcome`] に集約し、コールバックは呼び出し側で 1 回だけ送る
//! - **cause と error**: `cause` は失敗した操作の文脈、`error` は下位エラーの詳細
//! - **文言は固定**: cause の文言はワークフロー定義側の分岐条件になるため変更しない

use std::fmt;

use serde::Serialize;

use crate::{DomainError, case::CaseReference};

/// Step Functions が受け付ける `error` の最大文字数
pub const MAX_ERROR_CHARS: usize = 256;

/// タスクトークン（値オブジェクト）
///
/// オーケストレータが一時停止中のワークフローを再開するための不透明な値。
/// 長く機密性もあるため、`Debug` では先頭のみ表示する。
#[derive(Clone, PartialEq, Eq)]
pub struct TaskToken(String);

impl TaskToken {
    /// タスクトークンを作成する
    ///
    /// # エラー
    ///
    /// 空文字列または空白のみの場合は `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::Validation("TaskToken is required".to_string()));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TaskToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: String = self.0.chars().take(8).collect();
        write!(f, "TaskToken({head}…)")
    }
}

/// 成功時にオーケストレータへ返す出力
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSuccess {
    #[serde(rename = "Result")]
    pub result:  &'static str,
    #[serde(rename = "Message")]
    pub message: &'static str,
}

impl TaskSuccess {
    /// 全ステップ完了時の固定出力
    pub const COMPLETED: Self = Self {
        result:  "Success",
        message: "Completed",
    };

    /// JSON 文字列に変換する
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// 失敗時にオーケストレータへ返す内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// 失敗した操作の文脈（例: `Getting case details for C42`）
    pub cause: String,
    /// 下位エラーの詳細
    pub error: String,
}

impl TaskFailure {
    pub fn new(cause: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
            error: error.into(),
        }
    }

    /// 入力ペイロードが不正
    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::new("Invalid Input", detail)
    }

    /// 接続先環境が live / test のいずれでもない
    pub fn unknown_instance(instance: impl Into<String>) -> Self {
        Self::new("Instance not Live or Test", instance)
    }

    /// CXM 認証情報を解決できない
    pub fn credentials(detail: impl Into<String>) -> Self {
        Self::new("Resolving CXM credentials", detail)
    }

    /// ケース詳細の取得に失敗
    pub fn case_lookup(case_reference: &CaseReference, detail: impl Into<String>) -> Self {
        Self::new(format!("Getting case details for {case_reference}"), detail)
    }

    /// スタッフ回答がまだ無い
    pub fn empty_response(case_reference: &CaseReference) -> Self {
        Self::new(
            format!("Empty Response: {case_reference}"),
            "staff_response is empty",
        )
    }

    /// テンプレートの読み込みに失敗
    pub fn template(detail: impl Into<String>) -> Self {
        Self::new("Reading Response Template", detail)
    }

    /// レンダリング結果が空
    pub fn empty_message_body(case_reference: &CaseReference) -> Self {
        Self::new(
            format!("Empty Message Body: {case_reference}"),
            "rendered email body is empty",
        )
    }

    /// キュークライアント（メッセージ）の構築に失敗
    pub fn queue_start(detail: impl Into<String>) -> Self {
        Self::new("Error starting SQS client", detail)
    }

    /// キューへの送信に失敗
    pub fn queue_send(detail: impl Into<String>) -> Self {
        Self::new("Error sending SQS message", detail)
    }

    /// 遷移先ステータスに対応する遷移動詞が無い
    pub fn unexpected_case_status(case_reference: &CaseReference, status: impl Into<String>) -> Self {
        Self::new(
            format!("Unexpected New Case Status for {case_reference}"),
            status,
        )
    }

    /// CXM の遷移 API 呼び出しに失敗
    pub fn transition(
        case_reference: &CaseReference,
        transition_to: &str,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(
            format!("CXM Failed to transition: {case_reference} to {transition_to}"),
            detail,
        )
    }

    /// Step Functions の上限に収まるよう `error` を切り詰めたもの
    ///
    /// 文字境界で切るため、マルチバイト文字を壊さない。
    pub fn error_for_callback(&self) -> String {
        self.error.chars().take(MAX_ERROR_CHARS).collect()
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.cause, self.error)
    }
}

/// 1 回の起動の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 全ステップ完了
    Succeeded,
    /// いずれかのステップで打ち切り
    Failed(TaskFailure),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl From<Result<(), TaskFailure>> for Outcome {
    fn from(result: Result<(), TaskFailure>) -> Self {
        match result {
            Ok(()) => Self::Succeeded,
            Err(failure) => Self::Failed(failure),
        }
    }
}
