//! # Norbert 共有ユーティリティ
//!
//! Norbert の Lambda タスク群で共通に使うユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - 他のすべてのクレート（domain, infra, apps）から依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - 外部クレートへの依存は最小限に抑える（subscriber 初期化は feature で分離）

pub mod event_log;
pub mod observability;
