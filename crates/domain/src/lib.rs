//! # Norbert ドメイン層
//!
//! 「スタッフ回答のお知らせ」タスクのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **値オブジェクト**: ケース参照番号・タスクトークンなどを Newtype で表現し、
//!   空文字列の存在を型レベルで排除する
//! - **純粋関数**: メール本文のレンダリングやステータス変換は I/O を持たない
//! - **ドメインエラー**: ルール違反は [`DomainError`] で表現する
//!
//! ## 依存関係の方向
//!
//! ```text
//! apps → infra → domain
//!   ↘      ↓
//!     shared
//! ```
//!
//! ドメイン層はインフラ層（CXM、AWS）には一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`case`] - ケース参照番号、ケース詳細、CXM の遷移動詞
//! - [`email`] - メール本文のレンダリングと送信メッセージ
//! - [`error`] - ドメイン層エラー
//! - [`instance`] - 接続先環境（live / test）と CXM 認証情報
//! - [`task`] - タスクトークンとオーケストレータへの結果

pub mod case;
pub mod email;
pub mod error;
pub mod instance;
pub mod task;

pub use error::DomainError;
