//! # Case Response Notifier
//!
//! Step Functions のタスク（`.waitForTaskToken`）として起動される Lambda。
//!
//! ## 役割
//!
//! CXM のケースにスタッフが回答したことを顧客に知らせる:
//!
//! - **ケース取得**: CXM から顧客情報とスタッフ回答を取得
//! - **メール投入**: S3 のテンプレートで本文を作り、SQS のメールキューに投入
//! - **ステータス遷移**: CXM のケースを次のステータスへ進める
//! - **結果報告**: タスクトークン宛てに成功または失敗を 1 回だけ返す
//!
//! ```text
//! ┌──────────────┐   invoke   ┌──────────────┐  GET/POST  ┌──────────────┐
//! │Step Functions│──────────→│   Notifier   │──────────→│     CXM      │
//! └──────────────┘            └──────────────┘            └──────────────┘
//!        ↑                      │          │
//!        └──── callback ────────┘          ├──→ S3（テンプレート）
//!                                          └──→ SQS（メールキュー）
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `instance` | **Yes** | 接続先環境（`live` / `test`） |
//! | `sqsEmailURL` | **Yes** | メールキューの URL |
//! | `CONFIG_SOURCE` | No | 認証情報の取得元（`env` / `secrets_manager`、デフォルト: `env`） |
//! | `cxmEndPointLive` 等 | `env` の場合 | CXM のエンドポイントと API キー |
//! | `CXM_SECRET_ID` | No | シークレット ID（デフォルト: `cxm`） |
//! | `TEMPLATE_BUCKET` | No | テンプレートのバケット（デフォルト: `norbert.templates`） |
//! | `AWS_ENDPOINT_URL` | No | LocalStack 使用時のエンドポイント |
//! | `LOG_FORMAT` | No | `json` / `pretty` |
//!
//! 全項目は [`NotifierConfig`] を参照。
//!
//! ## ローカル実行
//!
//! ```bash
//! # cargo-lambda でエミュレート
//! cargo lambda watch -p norbert-case-response-notifier
//! cargo lambda invoke --data-ascii '{"CaseReference":"C42","TaskToken":"tok-1"}'
//! ```

use std::sync::Arc;

use lambda_runtime::{LambdaEvent, service_fn};
use norbert_case_response_notifier::{
    config::{ConfigSource, NotifierConfig},
    handler::{InvocationInput, handle_invocation},
    usecase::{CaseResponseDeps, CaseResponseSettings, CaseResponseUseCase},
};
use norbert_infra::{
    ConfigProvider,
    aws,
    config_provider::{self, EnvConfigProvider, SecretsManagerConfigProvider},
    cxm::CxmClient,
    s3::{self, S3TemplateStore},
    sqs::{self, SqsEmailQueue},
    step_functions::{self, SfnTaskCallback},
};
use norbert_shared::observability::{TracingConfig, init_tracing};

/// Lambda のエントリーポイント
///
/// 依存コンポーネントはコールドスタート時に 1 回だけ構築し、起動をまたいで再利用する。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(TracingConfig::from_env("case-response-notifier"));

    let config = NotifierConfig::from_env()?;
    tracing::info!(
        instance = %config.instance,
        config_source = %config.config_source,
        region = %config.aws.region,
        "Case Response Notifier を起動します"
    );

    let usecase = Arc::new(build_usecase(&config).await?);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<InvocationInput>| {
        let usecase = Arc::clone(&usecase);
        async move {
            handle_invocation(&usecase, event.payload)
                .await
                .map(|_| ())
                .map_err(lambda_runtime::Error::from)
        }
    }))
    .await
    .map_err(|e| anyhow::anyhow!(e))
}

/// 設定から依存コンポーネントを組み立てる
async fn build_usecase(config: &NotifierConfig) -> anyhow::Result<CaseResponseUseCase> {
    let sdk_config = aws::load_sdk_config(&config.aws).await;

    let config_provider: Arc<dyn ConfigProvider> = match config.config_source {
        ConfigSource::Env => Arc::new(EnvConfigProvider::from_env()),
        ConfigSource::SecretsManager => Arc::new(SecretsManagerConfigProvider::new(
            config_provider::create_client(&sdk_config),
            config.secret.secret_id.clone(),
            config.secret.version_stage.clone(),
        )),
    };

    let http_client = reqwest::Client::builder()
        .timeout(config.cxm_timeout)
        .build()?;

    // LocalStack はパススタイルのみ対応
    let force_path_style = config.aws.endpoint_url.is_some();

    let deps = CaseResponseDeps {
        config_provider,
        cxm: Arc::new(CxmClient::new(http_client)),
        templates: Arc::new(S3TemplateStore::new(
            s3::create_client(&sdk_config, force_path_style),
            config.template_bucket.clone(),
        )),
        queue: Arc::new(SqsEmailQueue::new(
            sqs::create_client(&sdk_config),
            config.queue_url.clone(),
        )),
        callback: Arc::new(SfnTaskCallback::new(step_functions::create_client(
            &sdk_config,
        ))),
    };

    let settings = CaseResponseSettings {
        instance:     config.instance.clone(),
        template_key: config.template_key.clone(),
        from_address: config.from_address.clone(),
    };

    Ok(CaseResponseUseCase::new(deps, settings))
}
