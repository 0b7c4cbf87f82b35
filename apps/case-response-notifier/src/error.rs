//! # Case Response Notifier エラー定義
//!
//! オーケストレータに報告できず、Lambda ランタイムへ返すしかないエラーを定義する。
//! 報告できる失敗は [`TaskFailure`](norbert_domain::task::TaskFailure) で表現する。

use thiserror::Error;

/// Lambda ランタイムに返すエラー
#[derive(Debug, Error)]
pub enum NotifierError {
    /// タスクトークンが無く、結果を報告できない
    #[error("TaskToken is required")]
    MissingTaskToken,
}
