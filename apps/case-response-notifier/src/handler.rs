//! # Lambda イベントハンドラ
//!
//! Step Functions から渡されるペイロードを検証し、ユースケースに渡す。
//!
//! ## 入力
//!
//! ```json
//! { "CaseReference": "C42", "TaskToken": "..." }
//! ```
//!
//! 未知のフィールドは無視する。
//!
//! ## 設計方針
//!
//! - **タスクトークンが無い場合**: 報告先が無いため、エラーとして Lambda ランタイムに返す
//! - **ケース参照番号が無い場合**: `Invalid Input` として失敗を報告する

use norbert_domain::{
    case::CaseReference,
    task::{Outcome, TaskFailure, TaskToken},
};
use norbert_shared::event_log::error;
use serde::Deserialize;

use crate::{
    error::NotifierError,
    usecase::{CaseResponseUseCase, Invocation},
};

/// 起動ペイロード
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvocationInput {
    #[serde(rename = "CaseReference", default)]
    pub case_reference: Option<String>,
    #[serde(rename = "TaskToken", default)]
    pub task_token:     Option<String>,
}

/// 1 回の起動を処理する
///
/// タスクトークンがあれば、結果は必ず 1 回だけ報告される。
pub async fn handle_invocation(
    usecase: &CaseResponseUseCase,
    input: InvocationInput,
) -> Result<Outcome, NotifierError> {
    let Ok(task_token) = TaskToken::new(input.task_token.unwrap_or_default()) else {
        tracing::error!(
            error.category = error::category::INPUT,
            error.kind = error::kind::PAYLOAD,
            case_reference = input.case_reference.as_deref().unwrap_or_default(),
            "TaskToken が無いため結果を報告できない"
        );
        return Err(NotifierError::MissingTaskToken);
    };

    match CaseReference::new(input.case_reference.unwrap_or_default()) {
        Ok(case_reference) => {
            let invocation = Invocation {
                case_reference,
                task_token,
            };
            Ok(usecase.handle(&invocation).await)
        }
        Err(e) => {
            tracing::error!(
                error.category = error::category::INPUT,
                error.kind = error::kind::PAYLOAD,
                error = %e,
                "入力ペイロードが不正"
            );
            let outcome = Outcome::Failed(TaskFailure::invalid_input(e.detail()));
            usecase.report(&task_token, &outcome).await;
            Ok(outcome)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_ペイロードを読み取り未知のフィールドは無視する() {
        let input: InvocationInput = serde_json::from_value(json!({
            "CaseReference": "C42",
            "TaskToken": "tok-1",
            "Extra": 1
        }))
        .unwrap();

        assert_eq!(input.case_reference.as_deref(), Some("C42"));
        assert_eq!(input.task_token.as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_欠落したフィールドはnoneになる() {
        let input: InvocationInput = serde_json::from_value(json!({})).unwrap();

        assert_eq!(input.case_reference, None);
        assert_eq!(input.task_token, None);
    }
}
