//! The parsed request: query string and body merged into one immutable value
//! that controllers and middleware read their input from.
//!
//! Both JSON bodies and url-encoded forms are accepted. Form keys follow the
//! browser conventions the CRM front end uses: `tags[]=a&tags[]=b` builds a
//! list, `ids[5]=on` builds a keyed map.

use std::collections::BTreeMap;

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request},
    http::{HeaderMap, header},
};
use serde_json::Value;

use crate::web::error::AppError;

/// Largest body the parser will buffer.
pub const BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputValue {
    Scalar(String),
    List(Vec<String>),
    Map(Vec<(String, String)>),
}

#[derive(Debug, Clone, Default)]
pub struct ParsedRequest {
    fields: BTreeMap<String, InputValue>,
    ajax: bool,
}

fn push_pair(fields: &mut BTreeMap<String, InputValue>, key: &str, value: String) {
    if let Some(name) = key.strip_suffix("[]") {
        match fields.get_mut(name) {
            Some(InputValue::List(items)) => items.push(value),
            _ => {
                fields.insert(name.to_string(), InputValue::List(vec![value]));
            }
        }
        return;
    }

    if let Some((name, rest)) = key.split_once('[') {
        if let Some(sub) = rest.strip_suffix(']') {
            match fields.get_mut(name) {
                Some(InputValue::Map(entries)) => entries.push((sub.to_string(), value)),
                _ => {
                    fields.insert(name.to_string(), InputValue::Map(vec![(sub.to_string(), value)]));
                }
            }
            return;
        }
    }

    fields.insert(key.to_string(), InputValue::Scalar(value));
}

fn scalar_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn parse_form(bytes: &[u8]) -> Result<BTreeMap<String, InputValue>, AppError> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_bytes(bytes).map_err(|_| AppError::MalformedRequest)?;
    let mut fields = BTreeMap::new();
    for (key, value) in pairs {
        push_pair(&mut fields, &key, value);
    }
    Ok(fields)
}

fn parse_json(bytes: &[u8]) -> Result<BTreeMap<String, InputValue>, AppError> {
    let Value::Object(object) = serde_json::from_slice::<Value>(bytes).map_err(|_| AppError::MalformedRequest)?
    else {
        return Err(AppError::MalformedRequest);
    };

    let mut fields = BTreeMap::new();
    for (key, value) in object {
        let name = key.strip_suffix("[]").unwrap_or(key.as_str()).to_string();
        let input = match value {
            Value::Array(items) => InputValue::List(items.iter().filter_map(scalar_of).collect()),
            Value::Object(entries) => InputValue::Map(
                entries
                    .iter()
                    .filter_map(|(k, v)| scalar_of(v).map(|v| (k.clone(), v)))
                    .collect(),
            ),
            other => match scalar_of(&other) {
                Some(s) => InputValue::Scalar(s),
                None => continue,
            },
        };
        fields.insert(name, input);
    }
    Ok(fields)
}

fn is_ajax(headers: &HeaderMap) -> bool {
    let requested_with = headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));
    let wants_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    requested_with || wants_json
}

impl ParsedRequest {
    /// Builds the request value from its raw pieces. Body fields override
    /// query fields of the same name.
    pub fn from_parts(headers: &HeaderMap, query: Option<&str>, body: &[u8]) -> Result<Self, AppError> {
        let mut fields = match query {
            Some(q) if !q.is_empty() => parse_form(q.as_bytes())?,
            _ => BTreeMap::new(),
        };

        if !body.is_empty() {
            let is_json = headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.starts_with("application/json"));
            let body_fields = if is_json { parse_json(body)? } else { parse_form(body)? };
            fields.extend(body_fields);
        }

        Ok(ParsedRequest {
            fields,
            ajax: is_ajax(headers),
        })
    }

    /// Splits a request into its parts and a parsed copy of its input, then
    /// reassembles it so downstream extractors still see the original body.
    pub async fn capture(req: Request) -> Result<(Request, ParsedRequest), AppError> {
        let (parts, body) = req.into_parts();
        let bytes: Bytes = axum::body::to_bytes(body, BODY_LIMIT)
            .await
            .map_err(|_| AppError::MalformedRequest)?;
        let parsed = ParsedRequest::from_parts(&parts.headers, parts.uri.query(), &bytes)?;
        Ok((Request::from_parts(parts, Body::from(bytes)), parsed))
    }

    pub fn value(&self, key: &str) -> Option<&InputValue> {
        self.fields.get(key)
    }

    /// A scalar field, trimmed; blank values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(InputValue::Scalar(s)) => Some(s.trim()).filter(|s| !s.is_empty()),
            _ => None,
        }
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(|s| s.parse().ok())
    }

    /// A keyed map field such as `ids[5]=on`, in submission order.
    pub fn id_set(&self, key: &str) -> Option<&[(String, String)]> {
        match self.fields.get(key) {
            Some(InputValue::Map(entries)) => Some(entries.as_slice()),
            _ => None,
        }
    }

    pub fn is_ajax(&self) -> bool {
        self.ajax
    }
}

impl<S> FromRequest<S> for ParsedRequest
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        // Middleware that already consumed the body leaves its parse behind.
        if let Some(parsed) = req.extensions().get::<ParsedRequest>() {
            return Ok(parsed.clone());
        }
        let (_, parsed) = ParsedRequest::capture(req).await?;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn form_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    #[test]
    fn form_brackets_build_lists_and_maps() {
        let body = b"reminder_title=Call+Bob&tags%5B%5D=a&tags%5B%5D=b&ids%5B5%5D=on&ids%5B7%5D=on";
        let parsed = ParsedRequest::from_parts(&form_headers(), None, body).unwrap();

        assert_eq!(parsed.get("reminder_title"), Some("Call Bob"));
        assert_eq!(
            parsed.value("tags"),
            Some(&InputValue::List(vec!["a".to_string(), "b".to_string()]))
        );
        assert_eq!(
            parsed.id_set("ids").unwrap(),
            &[("5".to_string(), "on".to_string()), ("7".to_string(), "on".to_string())]
        );
    }

    #[test]
    fn json_objects_become_maps() {
        let body = br#"{"reminder_title":"  Call  ","tags":["x",3],"ids":{"9":"on"},"gone":null}"#;
        let parsed = ParsedRequest::from_parts(&json_headers(), None, body).unwrap();

        assert_eq!(parsed.get("reminder_title"), Some("Call"));
        assert_eq!(
            parsed.value("tags"),
            Some(&InputValue::List(vec!["x".to_string(), "3".to_string()]))
        );
        assert_eq!(parsed.id_set("ids").unwrap(), &[("9".to_string(), "on".to_string())]);
        assert!(parsed.value("gone").is_none());
    }

    #[test]
    fn body_overrides_query() {
        let parsed = ParsedRequest::from_parts(
            &form_headers(),
            Some("source=ext&reminderresource_id=12"),
            b"source=list",
        )
        .unwrap();
        assert_eq!(parsed.get("source"), Some("list"));
        assert_eq!(parsed.get_i32("reminderresource_id"), Some(12));
    }

    #[test]
    fn blank_scalars_are_absent() {
        let parsed = ParsedRequest::from_parts(&form_headers(), None, b"reminder_title=+++").unwrap();
        assert_eq!(parsed.get("reminder_title"), None);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = ParsedRequest::from_parts(&json_headers(), None, b"[1,2]").unwrap_err();
        assert!(matches!(err, AppError::MalformedRequest));
    }

    #[test]
    fn ajax_detection() {
        let mut headers = HeaderMap::new();
        assert!(!ParsedRequest::from_parts(&headers, None, b"").unwrap().is_ajax());
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        assert!(ParsedRequest::from_parts(&headers, None, b"").unwrap().is_ajax());

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(ParsedRequest::from_parts(&headers, None, b"").unwrap().is_ajax());
    }
}
