//! # Case Response Notifier ライブラリ
//!
//! 通知 Lambda の設定・ハンドラ・ユースケースを公開する。
//! 統合テストから内部モジュールへアクセスするために lib として切り出している。

pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
