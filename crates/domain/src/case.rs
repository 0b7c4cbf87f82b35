//! # ケース
//!
//! CXM 上の問い合わせケースに関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`CaseReference`] | ケース参照番号 | CXM のケースを一意に識別する番号 |
//! | [`CaseDetails`] | ケース詳細 | 顧客情報・スタッフ回答・次のステータス |
//! | [`TransitionVerb`] | 遷移動詞 | CXM の遷移 API のパスセグメント |

use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::DomainError;

/// ケース参照番号（値オブジェクト）
///
/// # 不変条件
///
/// - 空文字列・空白のみは不可
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display("{_0}")]
pub struct CaseReference(String);

impl CaseReference {
    /// ケース参照番号を作成する
    ///
    /// # エラー
    ///
    /// 空文字列または空白のみの場合は `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::Validation(
                "CaseReference is required".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// ケース詳細
///
/// CXM のケース詳細 API のレスポンスから組み立てる。
/// 欠落したフィールドは空文字列になる。起動ごとに生成し、永続化しない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseDetails {
    /// 顧客名（`values.customer_name`）
    pub customer_name:  String,
    /// 顧客メールアドレス（`values.email`）
    pub customer_email: String,
    /// スタッフの回答本文（`values.staff_response`）
    pub staff_response: String,
    /// 回答したスタッフ名（`values.agents_name`）
    pub staff_name:     String,
    /// 遷移先ステータス（`values.new_case_status`）
    pub transition_to:  String,
}

impl CaseDetails {
    /// スタッフの回答がまだ無いかどうか
    pub fn is_awaiting_staff_response(&self) -> bool {
        self.staff_response.is_empty()
    }
}

/// CXM の遷移動詞
///
/// 遷移 API `/case/{ref}/transition/{verb}` のパスセグメントに対応する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
pub enum TransitionVerb {
    /// ケースをクローズする
    #[strum(serialize = "close-case")]
    CloseCase,
    /// 顧客からの返信待ちにする
    #[strum(serialize = "awaiting-customer")]
    AwaitingCustomer,
}

impl TransitionVerb {
    /// ケース詳細の遷移先ステータスから遷移動詞を決める
    ///
    /// 大文字小文字は区別しない。対応しないステータスは `None`。
    pub fn from_case_status(status: &str) -> Option<Self> {
        match status.to_lowercase().as_str() {
            "close" => Some(Self::CloseCase),
            "awaiting_customer_response" => Some(Self::AwaitingCustomer),
            _ => None,
        }
    }

    /// パスセグメントとして使う文字列
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}
