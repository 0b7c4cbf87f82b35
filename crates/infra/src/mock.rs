//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! norbert-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! 各モックは `Clone` で内部状態を共有するため、ユースケースに渡した後も
//! テスト側のハンドルから呼び出し記録を検査できる。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use norbert_domain::{
    case::{CaseDetails, CaseReference, TransitionVerb},
    email::OutboundEmail,
    instance::{CxmCredentials, Instance},
    task::{TaskFailure, TaskSuccess, TaskToken},
};

use crate::{
    config_provider::ConfigProvider,
    cxm::CaseManagementClient,
    error::InfraError,
    s3::TemplateStore,
    sqs::EmailQueue,
    step_functions::TaskCallback,
};

/// 失敗させる場合の指定
///
/// `InfraError` は `Clone` できないため、呼び出しのたびに生成する。
type ErrorFactory = Arc<dyn Fn() -> InfraError + Send + Sync>;

// ===== MockConfigProvider =====

#[derive(Clone, Default)]
pub struct MockConfigProvider {
    live:      Option<CxmCredentials>,
    test:      Option<CxmCredentials>,
    requested: Arc<Mutex<Vec<Instance>>>,
}

impl MockConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self, instance: Instance, credentials: CxmCredentials) -> Self {
        match instance {
            Instance::Live => self.live = Some(credentials),
            Instance::Test => self.test = Some(credentials),
        }
        self
    }

    /// 要求された接続先環境の履歴
    pub fn requested(&self) -> Vec<Instance> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfigProvider for MockConfigProvider {
    async fn credentials(&self, instance: Instance) -> Result<CxmCredentials, InfraError> {
        self.requested.lock().unwrap().push(instance);
        let credentials = match instance {
            Instance::Live => self.live.clone(),
            Instance::Test => self.test.clone(),
        };
        credentials
            .ok_or_else(|| InfraError::configuration(format!("no credentials for {instance}")))
    }
}

// ===== MockCaseManagementClient =====

/// 記録された CXM 呼び出し
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CxmCall {
    GetCase {
        endpoint:       String,
        case_reference: String,
    },
    Transition {
        endpoint:       String,
        case_reference: String,
        verb:           TransitionVerb,
    },
}

#[derive(Clone, Default)]
pub struct MockCaseManagementClient {
    details:          CaseDetails,
    get_error:        Option<ErrorFactory>,
    transition_error: Option<ErrorFactory>,
    calls:            Arc<Mutex<Vec<CxmCall>>>,
}

impl MockCaseManagementClient {
    /// 指定したケース詳細を返すモックを作成する
    pub fn new(details: CaseDetails) -> Self {
        Self {
            details,
            ..Default::default()
        }
    }

    pub fn failing_get(mut self, error: impl Fn() -> InfraError + Send + Sync + 'static) -> Self {
        self.get_error = Some(Arc::new(error));
        self
    }

    pub fn failing_transition(
        mut self,
        error: impl Fn() -> InfraError + Send + Sync + 'static,
    ) -> Self {
        self.transition_error = Some(Arc::new(error));
        self
    }

    pub fn calls(&self) -> Vec<CxmCall> {
        self.calls.lock().unwrap().clone()
    }

    /// 遷移呼び出しだけを取り出す
    pub fn transitions(&self) -> Vec<TransitionVerb> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                CxmCall::Transition { verb, .. } => Some(verb),
                CxmCall::GetCase { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl CaseManagementClient for MockCaseManagementClient {
    async fn get_case(
        &self,
        credentials: &CxmCredentials,
        case_reference: &CaseReference,
    ) -> Result<CaseDetails, InfraError> {
        self.calls.lock().unwrap().push(CxmCall::GetCase {
            endpoint:       credentials.endpoint().to_string(),
            case_reference: case_reference.as_str().to_string(),
        });
        match &self.get_error {
            Some(error) => Err(error()),
            None => Ok(self.details.clone()),
        }
    }

    async fn transition_case(
        &self,
        credentials: &CxmCredentials,
        case_reference: &CaseReference,
        verb: TransitionVerb,
    ) -> Result<(), InfraError> {
        self.calls.lock().unwrap().push(CxmCall::Transition {
            endpoint:       credentials.endpoint().to_string(),
            case_reference: case_reference.as_str().to_string(),
            verb,
        });
        match &self.transition_error {
            Some(error) => Err(error()),
            None => Ok(()),
        }
    }
}

// ===== MockTemplateStore =====

#[derive(Clone, Default)]
pub struct MockTemplateStore {
    template:  String,
    error:     Option<ErrorFactory>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl MockTemplateStore {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Default::default()
        }
    }

    pub fn failing(error: impl Fn() -> InfraError + Send + Sync + 'static) -> Self {
        Self {
            error: Some(Arc::new(error)),
            ..Default::default()
        }
    }

    /// 要求されたオブジェクトキーの履歴
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl TemplateStore for MockTemplateStore {
    async fn fetch(&self, key: &str) -> Result<String, InfraError> {
        self.requested.lock().unwrap().push(key.to_string());
        match &self.error {
            Some(error) => Err(error()),
            None => Ok(self.template.clone()),
        }
    }
}

// ===== MockEmailQueue =====

#[derive(Clone, Default)]
pub struct MockEmailQueue {
    error:     Option<ErrorFactory>,
    published: Arc<Mutex<Vec<OutboundEmail>>>,
}

impl MockEmailQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: impl Fn() -> InfraError + Send + Sync + 'static) -> Self {
        Self {
            error: Some(Arc::new(error)),
            ..Default::default()
        }
    }

    /// 投入に成功したメール
    pub fn published(&self) -> Vec<OutboundEmail> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailQueue for MockEmailQueue {
    async fn publish(&self, email: &OutboundEmail) -> Result<String, InfraError> {
        if let Some(error) = &self.error {
            return Err(error());
        }
        let mut published = self.published.lock().unwrap();
        published.push(email.clone());
        Ok(format!("mock-message-{}", published.len()))
    }
}

// ===== MockTaskCallback =====

/// 記録されたタスクコールバック
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackCall {
    Success { token: String, output: TaskSuccess },
    Failure { token: String, failure: TaskFailure },
}

#[derive(Clone, Default)]
pub struct MockTaskCallback {
    error: Option<ErrorFactory>,
    calls: Arc<Mutex<Vec<CallbackCall>>>,
}

impl MockTaskCallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// 呼び出しは記録した上でエラーを返す
    pub fn failing(error: impl Fn() -> InfraError + Send + Sync + 'static) -> Self {
        Self {
            error: Some(Arc::new(error)),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<CallbackCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: CallbackCall) -> Result<(), InfraError> {
        self.calls.lock().unwrap().push(call);
        match &self.error {
            Some(error) => Err(error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TaskCallback for MockTaskCallback {
    async fn send_success(
        &self,
        token: &TaskToken,
        output: &TaskSuccess,
    ) -> Result<(), InfraError> {
        self.record(CallbackCall::Success {
            token:  token.as_str().to_string(),
            output: output.clone(),
        })
    }

    async fn send_failure(
        &self,
        token: &TaskToken,
        failure: &TaskFailure,
    ) -> Result<(), InfraError> {
        self.record(CallbackCall::Failure {
            token:   token.as_str().to_string(),
            failure: failure.clone(),
        })
    }
}
