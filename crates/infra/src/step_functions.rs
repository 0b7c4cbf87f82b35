//! # Step Functions タスクコールバック
//!
//! `.waitForTaskToken` で一時停止しているワークフローに結果を返す。
//!
//! - 成功: `SendTaskSuccess`（output = `{"Result":"Success","Message":"Completed"}`）
//! - 失敗: `SendTaskFailure`（cause / error）

use async_trait::async_trait;
use aws_sdk_sfn::{Client, error::DisplayErrorContext};
use norbert_domain::task::{TaskFailure, TaskSuccess, TaskToken};

use crate::InfraError;

/// タスクコールバックのインターフェース
#[async_trait]
pub trait TaskCallback: Send + Sync {
    /// 成功を報告する
    async fn send_success(
        &self,
        token: &TaskToken,
        output: &TaskSuccess,
    ) -> Result<(), InfraError>;

    /// 失敗を報告する
    async fn send_failure(
        &self,
        token: &TaskToken,
        failure: &TaskFailure,
    ) -> Result<(), InfraError>;
}

/// Step Functions タスクコールバック
pub struct SfnTaskCallback {
    client: Client,
}

impl SfnTaskCallback {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaskCallback for SfnTaskCallback {
    async fn send_success(
        &self,
        token: &TaskToken,
        output: &TaskSuccess,
    ) -> Result<(), InfraError> {
        let output = output.to_json()?;

        self.client
            .send_task_success()
            .task_token(token.as_str())
            .output(output)
            .send()
            .await
            .map_err(|e| InfraError::step_functions(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }

    async fn send_failure(
        &self,
        token: &TaskToken,
        failure: &TaskFailure,
    ) -> Result<(), InfraError> {
        self.client
            .send_task_failure()
            .task_token(token.as_str())
            .cause(&failure.cause)
            .error(failure.error_for_callback())
            .send()
            .await
            .map_err(|e| InfraError::step_functions(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}

/// Step Functions クライアントを作成する
pub fn create_client(sdk_config: &aws_config::SdkConfig) -> Client {
    Client::new(sdk_config)
}
