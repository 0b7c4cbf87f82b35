//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! CloudWatch Logs Insights や `jq` で調査しやすいよう、ログフィールドの命名規約と
//! ヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! `tracing::error!` に `error.category` + `error.kind` フィールドを直接追加する。
//! 定数は [`error`] モジュールで提供。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.case_reference`: ケース参照番号
/// - `event.result`: 結果（[`event::result`] の定数を使用）
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const CASE_NOTIFICATION: &str = "case_notification";
    }

    /// イベントアクション
    pub mod action {
        // CXM
        pub const CASE_FETCHED: &str = "case.fetched";
        pub const CASE_TRANSITIONED: &str = "case.transitioned";

        // メール
        pub const EMAIL_QUEUED: &str = "email.queued";

        // オーケストレータへのコールバック
        pub const TASK_SUCCEEDED: &str = "task.succeeded";
        pub const TASK_FAILED: &str = "task.failed";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// 設定・シークレット解決
        pub const CONFIGURATION: &str = "configuration";
        /// 外部サービス呼び出し（CXM、S3、SQS、Step Functions）
        pub const EXTERNAL_SERVICE: &str = "external_service";
        /// 入力ペイロード
        pub const INPUT: &str = "input";
    }

    /// エラー種別
    pub mod kind {
        pub const INSTANCE: &str = "instance";
        pub const SECRET: &str = "secret";
        pub const CASE_LOOKUP: &str = "case_lookup";
        pub const TEMPLATE: &str = "template";
        pub const QUEUE: &str = "queue";
        pub const CASE_TRANSITION: &str = "case_transition";
        pub const TASK_CALLBACK: &str = "task_callback";
        pub const PAYLOAD: &str = "payload";
    }
}
