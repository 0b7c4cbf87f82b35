//! # SQS メールキュー
//!
//! レンダリング済みのメールを SQS に投入する。実際の送信は別のメーラーが行う。
//!
//! ## メッセージ形式
//!
//! - 本文: メール本文
//! - 属性（すべて `String` 型）: `Name`, `To`, `Subject`, `From`
//!
//! `Name` が空の場合は属性を付けない（SQS は空文字列の属性値を受け付けない）。

use async_trait::async_trait;
use aws_sdk_sqs::{Client, error::DisplayErrorContext, types::MessageAttributeValue};
use norbert_domain::email::OutboundEmail;

use crate::InfraError;

/// 属性名
pub mod attribute {
    pub const NAME: &str = "Name";
    pub const TO: &str = "To";
    pub const SUBJECT: &str = "Subject";
    pub const FROM: &str = "From";
}

/// メールキューのインターフェース
#[async_trait]
pub trait EmailQueue: Send + Sync {
    /// メールをキューに投入する
    ///
    /// # 戻り値
    ///
    /// SQS が払い出したメッセージ ID（取得できなければ空文字列）
    ///
    /// # エラー
    ///
    /// - リクエストの構築に失敗した場合は `InfraErrorKind::SqsRequest`
    /// - 送信に失敗した場合は `InfraErrorKind::Sqs`
    async fn publish(&self, email: &OutboundEmail) -> Result<String, InfraError>;
}

/// SQS メールキュー
pub struct SqsEmailQueue {
    client:    Client,
    queue_url: String,
}

impl SqsEmailQueue {
    /// 新しいメールキューを作成する
    pub fn new(client: Client, queue_url: String) -> Self {
        Self { client, queue_url }
    }
}

/// `String` 型のメッセージ属性を構築する
fn string_attribute(value: &str) -> Result<MessageAttributeValue, InfraError> {
    MessageAttributeValue::builder()
        .data_type("String")
        .string_value(value)
        .build()
        .map_err(|e| InfraError::sqs_request(e.to_string()))
}

/// 送信メッセージの属性を (属性名, 値) の組に展開する
fn message_attributes(email: &OutboundEmail) -> Vec<(&'static str, &str)> {
    let attributes = &email.attributes;
    let mut pairs = Vec::with_capacity(4);
    if !attributes.name().is_empty() {
        pairs.push((attribute::NAME, attributes.name()));
    }
    pairs.push((attribute::TO, attributes.to_address()));
    pairs.push((attribute::SUBJECT, attributes.subject()));
    pairs.push((attribute::FROM, attributes.from_address()));
    pairs
}

#[async_trait]
impl EmailQueue for SqsEmailQueue {
    async fn publish(&self, email: &OutboundEmail) -> Result<String, InfraError> {
        if self.queue_url.trim().is_empty() {
            return Err(InfraError::sqs_request("queue URL is not configured"));
        }

        let mut request = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(&email.body);

        for (name, value) in message_attributes(email) {
            request = request.message_attributes(name, string_attribute(value)?);
        }

        let output = request
            .send()
            .await
            .map_err(|e| InfraError::sqs(DisplayErrorContext(&e).to_string()))?;

        Ok(output.message_id().unwrap_or_default().to_string())
    }
}

/// SQS クライアントを作成する
pub fn create_client(sdk_config: &aws_config::SdkConfig) -> Client {
    Client::new(sdk_config)
}
