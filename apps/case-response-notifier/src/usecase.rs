//! # ユースケース層
//!
//! 通知 Lambda のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: 外部システムを `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは入力の検証のみを行い、ロジックはユースケースに集約
//!
//! ## モジュール構成
//!
//! - `case_response`: スタッフ回答のお知らせ

pub mod case_response;

pub use case_response::{CaseResponseDeps, CaseResponseSettings, CaseResponseUseCase, Invocation};
