//! # スタッフ回答のお知らせ
//!
//! CXM のケースにスタッフが回答したことを顧客にメールで知らせ、
//! ケースを次のステータスへ進め、結果をオーケストレータに報告する。
//!
//! ## 処理の流れ
//!
//! ```text
//! 接続先解決 → ケース取得 → 回答チェック → 本文レンダリング → 本文チェック
//!            → キュー投入 → ステータス遷移 → 成功報告
//! ```
//!
//! いずれかのステップで失敗した時点で打ち切り、失敗を報告する。
//!
//! ## 設計方針
//!
//! - **1 起動につき 1 回の報告**: [`CaseResponseUseCase::run`] は結果を `Result` で返すだけで、
//!   コールバックは [`CaseResponseUseCase::handle`] が最後に 1 回だけ送る
//! - **起動ごとの値は引数で渡す**: 認証情報やケース詳細をフィールドに保持しない
//! - **依存性注入**: 外部システムは `Arc<dyn Trait>` で外部から注入

use std::sync::Arc;

use norbert_domain::{
    case::{CaseDetails, CaseReference, TransitionVerb},
    email::{OutboundEmail, render_staff_response},
    instance::{CxmCredentials, Instance},
    task::{Outcome, TaskFailure, TaskSuccess, TaskToken},
};
use norbert_infra::{CaseManagementClient, ConfigProvider, EmailQueue, TaskCallback, TemplateStore};
use norbert_shared::{
    event_log::{error, event},
    log_business_event,
};
use tracing::Instrument as _;

/// 1 回の起動の入力（検証済み）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub case_reference: CaseReference,
    pub task_token:     TaskToken,
}

/// 起動をまたいで変わらない設定値
#[derive(Debug, Clone)]
pub struct CaseResponseSettings {
    /// 接続先環境（未検証の生の値）
    pub instance:     String,
    /// テンプレートのオブジェクトキー
    pub template_key: String,
    /// 差出人アドレス
    pub from_address: String,
}

/// 外部システムへの依存
pub struct CaseResponseDeps {
    pub config_provider: Arc<dyn ConfigProvider>,
    pub cxm:             Arc<dyn CaseManagementClient>,
    pub templates:       Arc<dyn TemplateStore>,
    pub queue:           Arc<dyn EmailQueue>,
    pub callback:        Arc<dyn TaskCallback>,
}

/// スタッフ回答のお知らせユースケース
pub struct CaseResponseUseCase {
    deps:     CaseResponseDeps,
    settings: CaseResponseSettings,
}

impl CaseResponseUseCase {
    pub fn new(deps: CaseResponseDeps, settings: CaseResponseSettings) -> Self {
        Self { deps, settings }
    }

    /// 1 回の起動を処理し、結果を 1 回だけ報告する
    pub async fn handle(&self, invocation: &Invocation) -> Outcome {
        let span = tracing::info_span!(
            "case_response",
            case_reference = %invocation.case_reference
        );

        async {
            let outcome = Outcome::from(self.run(&invocation.case_reference).await);
            self.report(&invocation.task_token, &outcome).await;
            outcome
        }
        .instrument(span)
        .await
    }

    /// 結果をオーケストレータに報告する
    ///
    /// 報告自体の失敗はログに残すのみで、呼び出し元には返さない。
    pub async fn report(&self, task_token: &TaskToken, outcome: &Outcome) {
        match outcome {
            Outcome::Succeeded => {
                match self
                    .deps
                    .callback
                    .send_success(task_token, &TaskSuccess::COMPLETED)
                    .await
                {
                    Ok(()) => log_business_event!(
                        event.category = event::category::CASE_NOTIFICATION,
                        event.action = event::action::TASK_SUCCEEDED,
                        event.result = event::result::SUCCESS,
                        "タスク成功を報告"
                    ),
                    Err(e) => tracing::error!(
                        error.category = error::category::EXTERNAL_SERVICE,
                        error.kind = error::kind::TASK_CALLBACK,
                        error = %e,
                        "タスク成功の報告に失敗"
                    ),
                }
            }
            Outcome::Failed(failure) => {
                match self.deps.callback.send_failure(task_token, failure).await {
                    Ok(()) => log_business_event!(
                        event.category = event::category::CASE_NOTIFICATION,
                        event.action = event::action::TASK_FAILED,
                        event.result = event::result::FAILURE,
                        failure.cause = %failure.cause,
                        failure.error = %failure.error,
                        "タスク失敗を報告"
                    ),
                    Err(e) => tracing::error!(
                        error.category = error::category::EXTERNAL_SERVICE,
                        error.kind = error::kind::TASK_CALLBACK,
                        error = %e,
                        failure.cause = %failure.cause,
                        "タスク失敗の報告に失敗"
                    ),
                }
            }
        }
    }

    /// パイプライン本体
    ///
    /// オーケストレータへの報告は行わない。
    pub async fn run(&self, case_reference: &CaseReference) -> Result<(), TaskFailure> {
        let credentials = self.resolve_credentials().await?;

        let details = self.fetch_case(&credentials, case_reference).await?;
        if details.is_awaiting_staff_response() {
            tracing::warn!("スタッフ回答が空のため処理を中断");
            return Err(TaskFailure::empty_response(case_reference));
        }

        let body = self.render_body(case_reference, &details).await?;
        if body.is_empty() {
            tracing::warn!("レンダリング結果が空のため処理を中断");
            return Err(TaskFailure::empty_message_body(case_reference));
        }

        self.queue_email(body, case_reference, &details).await?;
        self.transition_case(&credentials, case_reference, &details).await
    }

    async fn resolve_credentials(&self) -> Result<CxmCredentials, TaskFailure> {
        let raw = self.settings.instance.as_str();
        let instance = Instance::parse(raw).map_err(|e| {
            tracing::error!(
                error.category = error::category::CONFIGURATION,
                error.kind = error::kind::INSTANCE,
                error = %e,
                instance = raw,
                "接続先環境を判定できない"
            );
            TaskFailure::unknown_instance(raw)
        })?;

        self.deps
            .config_provider
            .credentials(instance)
            .await
            .map_err(|e| {
                tracing::error!(
                    error.category = error::category::CONFIGURATION,
                    error.kind = error::kind::SECRET,
                    error = %e,
                    %instance,
                    "CXM 認証情報の解決に失敗"
                );
                TaskFailure::credentials(e.detail())
            })
    }

    async fn fetch_case(
        &self,
        credentials: &CxmCredentials,
        case_reference: &CaseReference,
    ) -> Result<CaseDetails, TaskFailure> {
        let details = self
            .deps
            .cxm
            .get_case(credentials, case_reference)
            .await
            .map_err(|e| {
                tracing::error!(
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = error::kind::CASE_LOOKUP,
                    error = %e,
                    "ケース詳細の取得に失敗"
                );
                TaskFailure::case_lookup(case_reference, e.detail())
            })?;

        log_business_event!(
            event.category = event::category::CASE_NOTIFICATION,
            event.action = event::action::CASE_FETCHED,
            event.case_reference = %case_reference,
            event.result = event::result::SUCCESS,
            case.transition_to = %details.transition_to,
            "ケース詳細を取得"
        );

        Ok(details)
    }

    async fn render_body(
        &self,
        case_reference: &CaseReference,
        details: &CaseDetails,
    ) -> Result<String, TaskFailure> {
        let template = self
            .deps
            .templates
            .fetch(&self.settings.template_key)
            .await
            .map_err(|e| {
                tracing::error!(
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = error::kind::TEMPLATE,
                    error = %e,
                    template_key = %self.settings.template_key,
                    "テンプレートの読み込みに失敗"
                );
                TaskFailure::template(e.detail())
            })?;

        Ok(render_staff_response(&template, case_reference, details))
    }

    async fn queue_email(
        &self,
        body: String,
        case_reference: &CaseReference,
        details: &CaseDetails,
    ) -> Result<(), TaskFailure> {
        let email = OutboundEmail::staff_response(
            body,
            case_reference,
            details,
            &self.settings.from_address,
        )
        .map_err(|e| {
            tracing::error!(
                error.category = error::category::EXTERNAL_SERVICE,
                error.kind = error::kind::QUEUE,
                error = %e,
                "送信メッセージを組み立てられない"
            );
            TaskFailure::queue_send(e.detail())
        })?;

        let message_id = self.deps.queue.publish(&email).await.map_err(|e| {
            tracing::error!(
                error.category = error::category::EXTERNAL_SERVICE,
                error.kind = error::kind::QUEUE,
                error = %e,
                "メールキューへの投入に失敗"
            );
            if e.is_sqs_request() {
                TaskFailure::queue_start(e.detail())
            } else {
                TaskFailure::queue_send(e.detail())
            }
        })?;

        log_business_event!(
            event.category = event::category::CASE_NOTIFICATION,
            event.action = event::action::EMAIL_QUEUED,
            event.case_reference = %case_reference,
            event.result = event::result::SUCCESS,
            email.message_id = %message_id,
            "お知らせメールをキューに投入"
        );

        Ok(())
    }

    async fn transition_case(
        &self,
        credentials: &CxmCredentials,
        case_reference: &CaseReference,
        details: &CaseDetails,
    ) -> Result<(), TaskFailure> {
        let transition_to = details.transition_to.as_str();
        let Some(verb) = TransitionVerb::from_case_status(transition_to) else {
            tracing::error!(
                error.category = error::category::INPUT,
                error.kind = error::kind::CASE_TRANSITION,
                transition_to,
                "遷移先ステータスに対応する遷移が無い"
            );
            return Err(TaskFailure::unexpected_case_status(
                case_reference,
                transition_to,
            ));
        };

        self.deps
            .cxm
            .transition_case(credentials, case_reference, verb)
            .await
            .map_err(|e| {
                tracing::error!(
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = error::kind::CASE_TRANSITION,
                    error = %e,
                    %verb,
                    "ケースの遷移に失敗"
                );
                TaskFailure::transition(case_reference, transition_to, e.detail())
            })?;

        log_business_event!(
            event.category = event::category::CASE_NOTIFICATION,
            event.action = event::action::CASE_TRANSITIONED,
            event.case_reference = %case_reference,
            event.result = event::result::SUCCESS,
            case.transition = %verb,
            "ケースを遷移"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use norbert_infra::{
        InfraError,
        mock::{
            CallbackCall,
            CxmCall,
            MockCaseManagementClient,
            MockConfigProvider,
            MockEmailQueue,
            MockTaskCallback,
            MockTemplateStore,
        },
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const TEMPLATE: &str = "Ref=AAA Resp=CCC Name=DDD Staff=NNN";

    struct Harness {
        config_provider: MockConfigProvider,
        cxm:             MockCaseManagementClient,
        templates:       MockTemplateStore,
        queue:           MockEmailQueue,
        callback:        MockTaskCallback,
        instance:        String,
    }

    impl Harness {
        fn new(details: CaseDetails) -> Self {
            Self {
                config_provider: MockConfigProvider::new()
                    .with_credentials(
                        Instance::Live,
                        CxmCredentials::new("https://live.cxm", "live-key").unwrap(),
                    )
                    .with_credentials(
                        Instance::Test,
                        CxmCredentials::new("https://test.cxm", "test-key").unwrap(),
                    ),
                cxm: MockCaseManagementClient::new(details),
                templates: MockTemplateStore::new(TEMPLATE),
                queue: MockEmailQueue::new(),
                callback: MockTaskCallback::new(),
                instance: "test".to_string(),
            }
        }

        fn usecase(&self) -> CaseResponseUseCase {
            CaseResponseUseCase::new(
                CaseResponseDeps {
                    config_provider: Arc::new(self.config_provider.clone()),
                    cxm:             Arc::new(self.cxm.clone()),
                    templates:       Arc::new(self.templates.clone()),
                    queue:           Arc::new(self.queue.clone()),
                    callback:        Arc::new(self.callback.clone()),
                },
                CaseResponseSettings {
                    instance:     self.instance.clone(),
                    template_key: "email-staff-response.txt".to_string(),
                    from_address: "norbert@northampton.digital".to_string(),
                },
            )
        }

        async fn handle(&self, case_reference: &str) -> Outcome {
            let invocation = Invocation {
                case_reference: CaseReference::new(case_reference).unwrap(),
                task_token:     TaskToken::new("tok-1").unwrap(),
            };
            self.usecase().handle(&invocation).await
        }
    }

    fn make_details(staff_response: &str, transition_to: &str) -> CaseDetails {
        CaseDetails {
            customer_name:  "A".to_string(),
            customer_email: "a@x.com".to_string(),
            staff_response: staff_response.to_string(),
            staff_name:     "B".to_string(),
            transition_to:  transition_to.to_string(),
        }
    }

    fn failure_of(outcome: Outcome) -> TaskFailure {
        match outcome {
            Outcome::Failed(failure) => failure,
            Outcome::Succeeded => panic!("失敗を期待したが成功した"),
        }
    }

    #[rstest]
    #[case("live", "https://live.cxm")]
    #[case("LIVE", "https://live.cxm")]
    #[case("Test", "https://test.cxm")]
    #[tokio::test]
    async fn test_接続先環境に応じたエンドポイントを使う(
        #[case] instance: &str,
        #[case] endpoint: &str,
    ) {
        let mut harness = Harness::new(make_details("ok", "close"));
        harness.instance = instance.to_string();

        let outcome = harness.handle("C42").await;

        assert!(outcome.is_success());
        let endpoints: Vec<String> = harness
            .cxm
            .calls()
            .into_iter()
            .map(|call| match call {
                CxmCall::GetCase { endpoint, .. } | CxmCall::Transition { endpoint, .. } => endpoint,
            })
            .collect();
        assert_eq!(endpoints, vec![endpoint.to_string(); 2]);
    }

    #[tokio::test]
    async fn test_未知の接続先環境は外部呼び出しをせず失敗を報告する() {
        let mut harness = Harness::new(make_details("ok", "close"));
        harness.instance = "staging".to_string();

        let failure = failure_of(harness.handle("C42").await);

        assert_eq!(
            failure,
            TaskFailure::new("Instance not Live or Test", "staging")
        );
        assert!(harness.config_provider.requested().is_empty());
        assert!(harness.cxm.calls().is_empty());
        assert!(harness.templates.requested().is_empty());
        assert!(harness.queue.published().is_empty());
        assert_eq!(harness.callback.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_ケース取得の失敗はステータスを詳細として報告する() {
        let mut harness = Harness::new(CaseDetails::default());
        harness.cxm = MockCaseManagementClient::default().failing_get(|| {
            InfraError::unexpected_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "")
        });

        let failure = failure_of(harness.handle("C42").await);

        assert_eq!(
            failure,
            TaskFailure::new("Getting case details for C42", "500 Internal Server Error")
        );
        assert!(harness.templates.requested().is_empty());
        assert_eq!(harness.callback.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_スタッフ回答が空なら何もせず失敗を報告する() {
        let harness = Harness::new(make_details("", "close"));

        let failure = failure_of(harness.handle("C42").await);

        assert_eq!(failure.cause, "Empty Response: C42");
        assert!(harness.templates.requested().is_empty());
        assert!(harness.queue.published().is_empty());
        assert!(harness.cxm.transitions().is_empty());
        assert_eq!(harness.callback.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_テンプレートの読み込み失敗() {
        let mut harness = Harness::new(make_details("ok", "close"));
        harness.templates = MockTemplateStore::failing(|| InfraError::s3("NoSuchKey"));

        let failure = failure_of(harness.handle("C42").await);

        assert_eq!(failure, TaskFailure::new("Reading Response Template", "NoSuchKey"));
        assert!(harness.queue.published().is_empty());
        assert_eq!(harness.callback.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_レンダリング結果が空なら失敗を報告する() {
        let mut harness = Harness::new(make_details("ok", "close"));
        harness.templates = MockTemplateStore::new("");

        let failure = failure_of(harness.handle("C42").await);

        assert_eq!(failure.cause, "Empty Message Body: C42");
        assert!(harness.queue.published().is_empty());
        assert!(harness.cxm.transitions().is_empty());
        assert_eq!(harness.callback.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_プレースホルダを置換しhtmlエスケープする() {
        let mut details = make_details("<ok>", "close");
        details.customer_name = "Jo".to_string();
        details.staff_name = "Ana".to_string();
        let harness = Harness::new(details);

        harness.handle("C100").await;

        let published = harness.queue.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].body, "Ref=C100 Resp=&lt;ok&gt; Name=Jo Staff=Ana");
    }

    #[rstest]
    #[case(true, "Error starting SQS client")]
    #[case(false, "Error sending SQS message")]
    #[tokio::test]
    async fn test_キュー投入の失敗では遷移しない(
        #[case] request_error: bool,
        #[case] cause: &str,
    ) {
        let mut harness = Harness::new(make_details("ok", "close"));
        harness.queue = MockEmailQueue::failing(move || {
            if request_error {
                InfraError::sqs_request("bad attribute")
            } else {
                InfraError::sqs("throttled")
            }
        });

        let failure = failure_of(harness.handle("C42").await);

        assert_eq!(failure.cause, cause);
        assert!(harness.cxm.transitions().is_empty());
        assert_eq!(harness.callback.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_顧客メールアドレスが無ければ送信失敗として報告する() {
        let mut details = make_details("ok", "close");
        details.customer_email = String::new();
        let harness = Harness::new(details);

        let failure = failure_of(harness.handle("C42").await);

        assert_eq!(failure, TaskFailure::new("Error sending SQS message", "To is required"));
        assert!(harness.cxm.transitions().is_empty());
        assert_eq!(harness.callback.calls().len(), 1);
    }

    #[rstest]
    #[case("close", TransitionVerb::CloseCase)]
    #[case("CLOSE", TransitionVerb::CloseCase)]
    #[case("awaiting_customer_response", TransitionVerb::AwaitingCustomer)]
    #[case("Awaiting_Customer_Response", TransitionVerb::AwaitingCustomer)]
    #[tokio::test]
    async fn test_遷移先ステータスから遷移動詞を決める(
        #[case] transition_to: &str,
        #[case] verb: TransitionVerb,
    ) {
        let harness = Harness::new(make_details("ok", transition_to));

        let outcome = harness.handle("C42").await;

        assert_eq!(outcome, Outcome::Succeeded);
        assert_eq!(harness.cxm.transitions(), vec![verb]);
    }

    #[rstest]
    #[case("")]
    #[case("open")]
    #[case("closed")]
    #[tokio::test]
    async fn test_未知の遷移先ステータスはpostせず失敗を報告する(#[case] transition_to: &str) {
        let harness = Harness::new(make_details("ok", transition_to));

        let failure = failure_of(harness.handle("C42").await);

        assert_eq!(
            failure,
            TaskFailure::new("Unexpected New Case Status for C42", transition_to)
        );
        assert!(harness.cxm.transitions().is_empty());
        assert_eq!(harness.queue.published().len(), 1);
        assert_eq!(harness.callback.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_遷移の失敗() {
        let mut harness = Harness::new(CaseDetails::default());
        harness.cxm = MockCaseManagementClient::new(make_details("ok", "close")).failing_transition(
            || InfraError::unexpected_status(reqwest::StatusCode::BAD_GATEWAY, ""),
        );

        let failure = failure_of(harness.handle("C42").await);

        assert_eq!(
            failure,
            TaskFailure::new("CXM Failed to transition: C42 to close", "502 Bad Gateway")
        );
        assert_eq!(harness.callback.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_コールバックの失敗はログのみで結果は変わらない() {
        let mut harness = Harness::new(make_details("ok", "close"));
        harness.callback = MockTaskCallback::failing(|| InfraError::step_functions("TaskTimedOut"));

        let outcome = harness.handle("C42").await;

        assert!(outcome.is_success());
        assert_eq!(harness.callback.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_成功時は完了を1回だけ報告する() {
        let harness = Harness::new(make_details("ok", "close"));

        harness.handle("C42").await;

        assert_eq!(
            harness.callback.calls(),
            vec![CallbackCall::Success {
                token:  "tok-1".to_string(),
                output: TaskSuccess::COMPLETED,
            }]
        );
    }

    #[tokio::test]
    async fn test_runはコールバックを送らない() {
        let harness = Harness::new(make_details("", "close"));
        let usecase = harness.usecase();

        let result = usecase.run(&CaseReference::new("C42").unwrap()).await;

        assert!(result.is_err());
        assert!(harness.callback.calls().is_empty());
    }
}
