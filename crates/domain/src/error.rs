//! # ドメイン層エラー定義
//!
//! 入力値の検証失敗やドメイン固有の例外状態を表現するエラー型。
//!
//! ## 設計方針
//!
//! - **型による分類**: エラーの種類を列挙型で明示し、パターンマッチで処理可能に
//! - **thiserror 活用**: `#[error(...)]` マクロでエラーメッセージを自動生成
//! - **コールバックへのマッピング**: ユースケース層で `TaskFailure` の cause に変換する

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 必須フィールドが空、など入力値がルールに違反している場合に使用する。
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 接続先環境が live / test のいずれでもない
    ///
    /// 設定値をそのまま保持し、オーケストレータへの失敗報告の詳細に使う。
    #[error("不明な接続先環境: {0}")]
    UnknownInstance(String),
}

impl DomainError {
    /// 失敗報告の詳細として使う文字列を返す
    ///
    /// `Validation` はメッセージを、`UnknownInstance` は設定値そのものを返す。
    pub fn detail(&self) -> &str {
        match self {
            Self::Validation(msg) => msg,
            Self::UnknownInstance(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_instanceのdetailは設定値そのもの() {
        let err = DomainError::UnknownInstance("staging".to_string());
        assert_eq!(err.detail(), "staging");
    }

    #[test]
    fn test_validationのdetailはメッセージ() {
        let err = DomainError::Validation("To is required".to_string());
        assert_eq!(err.detail(), "To is required");
        assert_eq!(err.to_string(), "バリデーションエラー: To is required");
    }
}
