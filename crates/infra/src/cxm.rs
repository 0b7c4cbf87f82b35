//! # CXM クライアント
//!
//! 問い合わせ管理システム（CXM）のサービス API との通信を担当する。
//!
//! ## エンドポイント
//!
//! - `GET /api/service-api/norbert/case/{case_reference}?key={api_key}` - ケース詳細
//! - `POST /api/service-api/norbert/case/{case_reference}/transition/{verb}?key={api_key}` - ステータス遷移
//!
//! ## 設計方針
//!
//! - **成功判定はステータスのみ**: 2xx 以外は [`InfraErrorKind::UnexpectedStatus`](crate::error::InfraErrorKind)
//! - **認証情報は呼び出しごとに渡す**: クライアント自体は接続先を保持しない
//! - **API キーはログに出さない**: ログにはパスのみを出力する

use async_trait::async_trait;
use norbert_domain::{
    case::{CaseDetails, CaseReference, TransitionVerb},
    instance::CxmCredentials,
};
use serde_json::Value;

use crate::InfraError;

/// CXM のサービス API パス
const CASE_API_PATH: &str = "/api/service-api/norbert/case";

/// CXM クライアントトレイト
///
/// テスト時にスタブを使用できるようトレイトで定義。
#[async_trait]
pub trait CaseManagementClient: Send + Sync {
    /// ケース詳細を取得する
    async fn get_case(
        &self,
        credentials: &CxmCredentials,
        case_reference: &CaseReference,
    ) -> Result<CaseDetails, InfraError>;

    /// ケースのステータスを遷移させる
    async fn transition_case(
        &self,
        credentials: &CxmCredentials,
        case_reference: &CaseReference,
        verb: TransitionVerb,
    ) -> Result<(), InfraError>;
}

/// CXM クライアント実装
#[derive(Clone)]
pub struct CxmClient {
    client: reqwest::Client,
}

impl CxmClient {
    /// 既存の `reqwest::Client` から作成する
    ///
    /// タイムアウト等は呼び出し側でクライアントに設定しておく。
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// ケース詳細 API のパス
fn case_path(case_reference: &CaseReference) -> String {
    format!(
        "{CASE_API_PATH}/{}",
        urlencoding::encode(case_reference.as_str())
    )
}

/// 遷移 API のパス
fn transition_path(case_reference: &CaseReference, verb: TransitionVerb) -> String {
    format!("{}/transition/{}", case_path(case_reference), verb.as_str())
}

/// JSON 値をテキストとして読む
///
/// 文字列はそのまま、数値・真偽値は文字列化し、null・欠落・配列・オブジェクトは空文字列にする。
fn text_at(body: &Value, pointer: &str) -> String {
    match body.pointer(pointer) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// ケース詳細 API のレスポンスボディからケース詳細を組み立てる
pub fn parse_case_details(body: &Value) -> CaseDetails {
    CaseDetails {
        customer_name:  text_at(body, "/values/customer_name"),
        customer_email: text_at(body, "/values/email"),
        staff_response: text_at(body, "/values/staff_response"),
        staff_name:     text_at(body, "/values/agents_name"),
        transition_to:  text_at(body, "/values/new_case_status"),
    }
}

/// 2xx 以外のレスポンスをエラーに変換する
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, InfraError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(InfraError::unexpected_status(status, body))
}

#[async_trait]
impl CaseManagementClient for CxmClient {
    async fn get_case(
        &self,
        credentials: &CxmCredentials,
        case_reference: &CaseReference,
    ) -> Result<CaseDetails, InfraError> {
        let path = case_path(case_reference);
        tracing::debug!(path = %path, "CXM ケース詳細を取得");

        let response = self
            .client
            .get(format!("{}{path}", credentials.endpoint()))
            .query(&[("key", credentials.api_key())])
            .send()
            .await?;

        let body = ensure_success(response).await?.json::<Value>().await?;
        Ok(parse_case_details(&body))
    }

    async fn transition_case(
        &self,
        credentials: &CxmCredentials,
        case_reference: &CaseReference,
        verb: TransitionVerb,
    ) -> Result<(), InfraError> {
        let path = transition_path(case_reference, verb);
        tracing::debug!(path = %path, "CXM ケースを遷移");

        let response = self
            .client
            .post(format!("{}{path}", credentials.endpoint()))
            .query(&[("key", credentials.api_key())])
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use tokio::{
        io::{AsyncReadExt as _, AsyncWriteExt as _},
        net::TcpListener,
        task::JoinHandle,
    };

    use super::*;
    use crate::error::InfraErrorKind;

    /// テスト用の HTTP レスポンスを構築する
    fn make_response(status: u16, body: &str) -> reqwest::Response {
        let http_resp = http::Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(body.to_string())
            .unwrap();
        reqwest::Response::from(http_resp)
    }

    #[test]
    fn test_ケース詳細の全フィールドを読み取る() {
        let body = json!({
            "values": {
                "customer_name": "A",
                "staff_response": "All set",
                "email": "a@x.com",
                "agents_name": "B",
                "new_case_status": "close"
            }
        });

        assert_eq!(
            parse_case_details(&body),
            CaseDetails {
                customer_name:  "A".to_string(),
                customer_email: "a@x.com".to_string(),
                staff_response: "All set".to_string(),
                staff_name:     "B".to_string(),
                transition_to:  "close".to_string(),
            }
        );
    }

    #[test]
    fn test_欠落やnullのフィールドは空文字列になる() {
        let body = json!({
            "values": {
                "customer_name": null,
                "staff_response": "ok"
            }
        });

        let details = parse_case_details(&body);

        assert_eq!(details.customer_name, "");
        assert_eq!(details.customer_email, "");
        assert_eq!(details.staff_response, "ok");
        assert_eq!(details.transition_to, "");
    }

    #[test]
    fn test_valuesが無ければ全フィールド空() {
        assert_eq!(parse_case_details(&json!({})), CaseDetails::default());
        assert_eq!(parse_case_details(&json!([1, 2])), CaseDetails::default());
    }

    #[test]
    fn test_数値のフィールドは文字列化する() {
        let body = json!({ "values": { "agents_name": 42, "staff_response": true } });

        let details = parse_case_details(&body);

        assert_eq!(details.staff_name, "42");
        assert_eq!(details.staff_response, "true");
    }

    #[test]
    fn test_パスはケース参照番号をエンコードする() {
        let reference = CaseReference::new("C 1/2").unwrap();
        assert_eq!(
            case_path(&reference),
            "/api/service-api/norbert/case/C%201%2F2"
        );
    }

    #[test]
    fn test_遷移パス() {
        let reference = CaseReference::new("C42").unwrap();
        assert_eq!(
            transition_path(&reference, TransitionVerb::CloseCase),
            "/api/service-api/norbert/case/C42/transition/close-case"
        );
        assert_eq!(
            transition_path(&reference, TransitionVerb::AwaitingCustomer),
            "/api/service-api/norbert/case/C42/transition/awaiting-customer"
        );
    }

    #[tokio::test]
    async fn test_2xxはそのまま返す() {
        let response = make_response(200, r#"{"values": {}}"#);
        assert!(ensure_success(response).await.is_ok());

        let response = make_response(204, "");
        assert!(ensure_success(response).await.is_ok());
    }

    #[rstest]
    #[case(500, "500 Internal Server Error")]
    #[case(404, "404 Not Found")]
    #[case(401, "401 Unauthorized")]
    #[tokio::test]
    async fn test_2xx以外はunexpected_statusを返す(#[case] status: u16, #[case] detail: &str) {
        let response = make_response(status, "server error");

        let err = ensure_success(response).await.unwrap_err();

        match err.kind() {
            InfraErrorKind::UnexpectedStatus { status: actual, body } => {
                assert_eq!(actual.as_u16(), status);
                assert_eq!(body, "server error");
            }
            other => panic!("UnexpectedStatus を期待したが {other:?} を受け取った"),
        }
        assert_eq!(err.detail(), detail);
    }

    const SECRET_KEY: &str = "SUPER-SECRET-KEY";

    fn credentials(endpoint: &str, api_key: &str) -> CxmCredentials {
        CxmCredentials::new(endpoint, api_key).unwrap()
    }

    /// 1 リクエストだけ受け付け、固定のレスポンスを返すローカル HTTP サーバー
    ///
    /// 戻り値はエンドポイントと、受け取ったリクエスト行を返すタスク。
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();

            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (endpoint, handle)
    }

    #[tokio::test]
    async fn test_get_caseはapiキーをクエリに付けてgetする() {
        let (endpoint, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"values": {"staff_response": "All set", "new_case_status": "close"}}"#,
        )
        .await;
        let client = CxmClient::new(reqwest::Client::new());

        let details = client
            .get_case(
                &credentials(&format!("{endpoint}/"), "k"),
                &CaseReference::new("C42").unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            server.await.unwrap(),
            "GET /api/service-api/norbert/case/C42?key=k HTTP/1.1"
        );
        assert_eq!(details.staff_response, "All set");
        assert_eq!(details.transition_to, "close");
    }

    #[rstest]
    #[case(TransitionVerb::CloseCase, "close-case")]
    #[case(TransitionVerb::AwaitingCustomer, "awaiting-customer")]
    #[tokio::test]
    async fn test_transition_caseはapiキーをクエリに付けてpostする(
        #[case] verb: TransitionVerb,
        #[case] segment: &str,
    ) {
        let (endpoint, server) = serve_once("HTTP/1.1 200 OK", "").await;
        let client = CxmClient::new(reqwest::Client::new());

        client
            .transition_case(
                &credentials(&endpoint, "k"),
                &CaseReference::new("C42").unwrap(),
                verb,
            )
            .await
            .unwrap();

        assert_eq!(
            server.await.unwrap(),
            format!("POST /api/service-api/norbert/case/C42/transition/{segment}?key=k HTTP/1.1")
        );
    }

    #[tokio::test]
    async fn test_transition_caseの500はステータスを詳細に持つ() {
        let (endpoint, server) = serve_once("HTTP/1.1 500 Internal Server Error", "boom").await;
        let client = CxmClient::new(reqwest::Client::new());

        let err = client
            .transition_case(
                &credentials(&endpoint, "k"),
                &CaseReference::new("C42").unwrap(),
                TransitionVerb::CloseCase,
            )
            .await
            .unwrap_err();
        server.await.unwrap();

        assert_eq!(err.detail(), "500 Internal Server Error");
    }

    /// 接続できない場合のエラーに API キーが含まれないことを確認する
    fn assert_key_not_exposed(err: &InfraError) {
        assert!(matches!(err.kind(), InfraErrorKind::Http(_)), "{err:?}");
        let texts = [err.detail(), err.to_string(), format!("{err:?}")];
        for text in texts {
            assert!(!text.contains(SECRET_KEY), "API キーが漏れている: {text}");
        }
    }

    #[tokio::test]
    async fn test_接続できないget_caseのエラーにapiキーを含めない() {
        let client = CxmClient::new(reqwest::Client::new());

        let err = client
            .get_case(
                &credentials("http://127.0.0.1:1", SECRET_KEY),
                &CaseReference::new("C42").unwrap(),
            )
            .await
            .unwrap_err();

        assert_key_not_exposed(&err);
    }

    #[tokio::test]
    async fn test_接続できないtransition_caseのエラーにapiキーを含めない() {
        let client = CxmClient::new(reqwest::Client::new());

        let err = client
            .transition_case(
                &credentials("http://127.0.0.1:1", SECRET_KEY),
                &CaseReference::new("C42").unwrap(),
                TransitionVerb::CloseCase,
            )
            .await
            .unwrap_err();

        assert_key_not_exposed(&err);
    }
}
