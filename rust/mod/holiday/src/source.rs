use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A public holiday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// `YYYYMMDD`.
    pub date: String,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum HolidayError {
    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("decode: {0}")]
    Decode(String),
}

/// Where holidays come from.
#[async_trait::async_trait]
pub trait HolidaySource: Send + Sync + 'static {
    async fn holidays(&self, year: u16) -> Result<Vec<Holiday>, HolidayError>;
}

/// Upstream service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolidayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Service key issued by data.go.kr, already URL-encoded.
    #[serde(default)]
    pub service_key: String,
}

fn default_base_url() -> String {
    "http://apis.data.go.kr/B090041/openapi/service/SpcdeInfoService/getHoliDeInfo".to_string()
}

impl Default for HolidayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            service_key: String::new(),
        }
    }
}

/// Korean public holidays from the data.go.kr special-day API.
pub struct DataGoKrSource {
    http: reqwest::Client,
    config: HolidayConfig,
}

impl DataGoKrSource {
    pub fn new(config: HolidayConfig) -> Result<Self, HolidayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http, config })
    }
}

#[async_trait::async_trait]
impl HolidaySource for DataGoKrSource {
    async fn holidays(&self, year: u16) -> Result<Vec<Holiday>, HolidayError> {
        // The key is pre-encoded, so the query string is assembled by hand.
        let url = format!(
            "{}?serviceKey={}&solYear={}&numOfRows=100&_type=json",
            self.config.base_url, self.config.service_key, year
        );
        let resp = self.http.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(HolidayError::Status(resp.status().as_u16()));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| HolidayError::Decode(e.to_string()))?;
        parse_holidays(&body)
    }
}

/// Normalize the upstream body.
///
/// `response.body.items.item` is an array for several holidays, a bare
/// object for exactly one, and missing (or `items` is an empty string) for none.
pub fn parse_holidays(body: &Value) -> Result<Vec<Holiday>, HolidayError> {
    let items = body
        .pointer("/response/body")
        .ok_or_else(|| HolidayError::Decode("missing response.body".into()))?
        .get("items");

    let entries: Vec<&Value> = match items.and_then(|i| i.get("item")) {
        Some(Value::Array(list)) => list.iter().collect(),
        Some(obj @ Value::Object(_)) => vec![obj],
        _ => Vec::new(),
    };

    entries.into_iter().map(to_holiday).collect()
}

fn to_holiday(item: &Value) -> Result<Holiday, HolidayError> {
    let date = match item.get("locdate") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => return Err(HolidayError::Decode("holiday without locdate".into())),
    };
    let name = item
        .get("dateName")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(Holiday { date, name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_item_array() {
        let body = json!({"response": {"body": {"items": {"item": [
            {"dateKind": "01", "dateName": "1월1일", "isHoliday": "Y", "locdate": 20240101, "seq": 1},
            {"dateKind": "01", "dateName": "설날", "isHoliday": "Y", "locdate": 20240210, "seq": 1},
        ]}, "totalCount": 2}}});
        assert_eq!(
            parse_holidays(&body).unwrap(),
            vec![
                Holiday { date: "20240101".into(), name: "1월1일".into() },
                Holiday { date: "20240210".into(), name: "설날".into() },
            ]
        );
    }

    #[test]
    fn parses_single_item_object() {
        let body = json!({"response": {"body": {"items": {"item":
            {"dateName": "광복절", "locdate": 20240815}
        }}}});
        assert_eq!(
            parse_holidays(&body).unwrap(),
            vec![Holiday { date: "20240815".into(), name: "광복절".into() }]
        );
    }

    #[test]
    fn empty_items_yield_no_holidays() {
        let body = json!({"response": {"body": {"items": "", "totalCount": 0}}});
        assert!(parse_holidays(&body).unwrap().is_empty());
    }

    #[test]
    fn error_body_is_decode_error() {
        let body = json!({"OpenAPI_ServiceResponse": {"cmmMsgHeader": {"errMsg": "SERVICE ERROR"}}});
        assert!(matches!(parse_holidays(&body), Err(HolidayError::Decode(_))));
    }
}
