//! # スタッフ回答メール
//!
//! スタッフ回答のお知らせメールの本文レンダリングと、メールキューに渡す
//! 送信メッセージを定義する。
//!
//! ## 設計方針
//!
//! - **固定トークン置換**: テンプレートは S3 上のプレーンテキストで、
//!   `AAA` / `CCC` / `DDD` / `NNN` を 1 パスで置換する（差し込んだ値は再走査しない）
//! - **HTML エスケープ**: 顧客・スタッフ由来の値のみエスケープする（ケース参照番号はそのまま）
//! - **型付き属性**: キューのメッセージ属性は [`EmailAttributes`] の名前付きフィールドで表現する

use crate::{
    DomainError,
    case::{CaseDetails, CaseReference},
};

/// ケース参照番号に置換されるトークン
pub const TOKEN_CASE_REFERENCE: &str = "AAA";
/// スタッフ回答（エスケープ済み）に置換されるトークン
pub const TOKEN_STAFF_RESPONSE: &str = "CCC";
/// 顧客名（エスケープ済み）に置換されるトークン
pub const TOKEN_CUSTOMER_NAME: &str = "DDD";
/// スタッフ名（エスケープ済み）に置換されるトークン
pub const TOKEN_STAFF_NAME: &str = "NNN";

/// 件名の固定部分
pub const SUBJECT_PREFIX: &str = "Northampton Borough Council: Your Call Number is ";

/// HTML の特殊文字をエスケープする
///
/// `&`, `<`, `>`, `"`, `'` を文字実体参照に置き換える。
/// U+00A0〜U+00FF（Latin-1 補助）は数値文字参照（例: `ë` → `&#235;`）にする。
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '\u{a0}'..='\u{ff}' => {
                escaped.push_str("&#");
                escaped.push_str(&u32::from(ch).to_string());
                escaped.push(';');
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// テンプレートにケースの値を差し込んでメール本文を生成する
///
/// トークンは左から順に 1 パスで置換するため、置換順序に依存せず、
/// 差し込んだ値に含まれるトークン文字列が再度置換されることもない。
pub fn render_staff_response(
    template: &str,
    case_reference: &CaseReference,
    details: &CaseDetails,
) -> String {
    let replacements = [
        (TOKEN_CASE_REFERENCE, case_reference.as_str().to_string()),
        (TOKEN_STAFF_RESPONSE, html_escape(&details.staff_response)),
        (TOKEN_CUSTOMER_NAME, html_escape(&details.customer_name)),
        (TOKEN_STAFF_NAME, html_escape(&details.staff_name)),
    ];

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        if let Some((token, value)) = replacements
            .iter()
            .find(|(token, _)| rest.starts_with(token))
        {
            rendered.push_str(value);
            rest = &rest[token.len()..];
            continue;
        }

        let mut chars = rest.chars();
        match chars.next() {
            Some(ch) => {
                rendered.push(ch);
                rest = chars.as_str();
            }
            None => break,
        }
    }
    rendered
}

/// 件名を生成する
pub fn subject_for(case_reference: &CaseReference) -> String {
    format!("{SUBJECT_PREFIX}{case_reference}")
}

/// メールキューのメッセージ属性
///
/// メーラーはこの属性で宛先・件名・差出人を決める。
///
/// # 不変条件
///
/// - `to`, `subject`, `from` は空でない
/// - `name` は空を許容する（空の場合は属性自体を送らない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAttributes {
    name:    String,
    to:      String,
    subject: String,
    from:    String,
}

impl EmailAttributes {
    /// メッセージ属性を作成する
    ///
    /// # エラー
    ///
    /// `to` / `subject` / `from` のいずれかが空の場合は `DomainError::Validation` を返す。
    pub fn new(
        name: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        from: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let attributes = Self {
            name:    name.into(),
            to:      to.into(),
            subject: subject.into(),
            from:    from.into(),
        };

        for (field, value) in [
            ("To", &attributes.to),
            ("Subject", &attributes.subject),
            ("From", &attributes.from),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::Validation(format!("{field} is required")));
            }
        }

        Ok(attributes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn to_address(&self) -> &str {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn from_address(&self) -> &str {
        &self.from
    }
}

/// メールキューに投入する送信メッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    /// メール本文（レンダリング済み）
    pub body:       String,
    /// メッセージ属性
    pub attributes: EmailAttributes,
}

impl OutboundEmail {
    /// スタッフ回答のお知らせメールを組み立てる
    ///
    /// 宛先はケース詳細の顧客、件名はケース参照番号から生成する。
    pub fn staff_response(
        body: String,
        case_reference: &CaseReference,
        details: &CaseDetails,
        from_address: &str,
    ) -> Result<Self, DomainError> {
        let attributes = EmailAttributes::new(
            details.customer_name.clone(),
            details.customer_email.clone(),
            subject_for(case_reference),
            from_address,
        )?;
        Ok(Self { body, attributes })
    }
}
