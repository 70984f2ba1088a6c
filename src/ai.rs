use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{DurationOption, Locale, NotificationLead, Repeat, Tab, TaskDraft};

const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Error)]
pub enum AiError {
    #[error("empty ai response")]
    Empty,
    #[error("failed to parse ai response as json")]
    NoJson,
    #[error("ai response json must be an object with a tasks array")]
    MissingTasks,
    #[error("missing gemini api key")]
    MissingApiKey,
    #[error("ai request failed: {0}")]
    Request(String),
    #[error("ai http {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid ai response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

impl AiConfig {
    /// `DAYFLOW_GEMINI_API_KEY` (or `GEMINI_API_KEY`), `DAYFLOW_GEMINI_MODEL`,
    /// `DAYFLOW_GEMINI_ENDPOINT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            api_key: non_empty("DAYFLOW_GEMINI_API_KEY")
                .or_else(|| non_empty("GEMINI_API_KEY"))
                .unwrap_or_default(),
            model: non_empty("DAYFLOW_GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            endpoint: non_empty("DAYFLOW_GEMINI_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        }
    }

    pub fn generate_url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct AiTask {
    pub title: String,
    /// 24-hour `HH:MM`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<DurationOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<Repeat>,
}

impl AiTask {
    pub fn parsed_time(&self) -> Option<NaiveTime> {
        self.time
            .as_deref()
            .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M").ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub struct AiSuggestions {
    pub comment: String,
    pub tasks: Vec<AiTask>,
}

pub fn build_prompt(user_text: &str, locale: Locale) -> String {
    let durations = quoted_list(DurationOption::ALL.iter().map(|d| d.label(locale)));
    let repeats = quoted_list(Repeat::ALL.iter().map(|r| r.label(locale)));
    let comment_language = match locale {
        Locale::Ko => "Korean",
        Locale::En => "English",
    };
    let instruction = format!(
        "You are a helpful assistant. Analyze the user's plan and provide a JSON response with:\n\
1. 'comment': A warm, encouraging short comment ({comment_language}).\n\
2. 'tasks': A list of tasks. Each task has:\n\
   - 'title': Name of task.\n\
   - 'time': (Optional) specifically if user mentioned time (HH:MM format, 24-hour).\n\
   - 'duration': Estimate duration strictly from this list: [{durations}].\n\
   - 'repeat': Suggest repetition strictly from: [{repeats}].\n\
\n\
Response Format:\n\
{{\n  \"comment\": \"...\",\n  \"tasks\": [ ... ]\n}}\n"
    );
    format!("{instruction}\nUser Input: {}", user_text.trim())
}

fn quoted_list<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items
        .map(|item| format!("\"{item}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn parse_suggestions_from_text(text: &str) -> Result<AiSuggestions, AiError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AiError::Empty);
    }

    let mut candidate = trimmed;
    if let Some(stripped) = strip_fenced_code_block(candidate) {
        candidate = stripped;
    }

    let value = serde_json::from_str::<Value>(candidate)
        .ok()
        .or_else(|| {
            // Models sometimes wrap the object in prose; take the outermost {...} region.
            extract_first_json_object(candidate)
                .and_then(|extracted| serde_json::from_str::<Value>(extracted).ok())
        })
        .ok_or(AiError::NoJson)?;

    suggestions_from_value(&value)
}

fn suggestions_from_value(value: &Value) -> Result<AiSuggestions, AiError> {
    let obj = value.as_object().ok_or(AiError::MissingTasks)?;
    let items = obj
        .get("tasks")
        .and_then(Value::as_array)
        .ok_or(AiError::MissingTasks)?;

    let comment = obj
        .get("comment")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();

    let tasks = items.iter().filter_map(task_from_value).collect();
    Ok(AiSuggestions { comment, tasks })
}

fn task_from_value(item: &Value) -> Option<AiTask> {
    let map = match item {
        Value::String(title) => {
            let title = title.trim();
            return (!title.is_empty()).then(|| AiTask {
                title: title.to_string(),
                time: None,
                duration: None,
                repeat: None,
            });
        }
        Value::Object(map) => map,
        _ => return None,
    };

    let title = map.get("title").and_then(Value::as_str)?.trim();
    if title.is_empty() {
        return None;
    }

    let time = map.get("time").and_then(Value::as_str).and_then(|raw| {
        let normalized = normalize_hhmm(raw);
        if normalized.is_none() && !raw.trim().is_empty() {
            log::warn!("dropping ai task time title={title} time={raw}");
        }
        normalized
    });
    let duration = map.get("duration").and_then(Value::as_str).and_then(|raw| {
        let parsed = DurationOption::parse(raw);
        if parsed.is_none() {
            log::warn!("dropping ai task duration title={title} duration={raw}");
        }
        parsed
    });
    let repeat = map.get("repeat").and_then(Value::as_str).and_then(|raw| {
        let parsed = Repeat::parse(raw);
        if parsed.is_none() {
            log::warn!("dropping ai task repeat title={title} repeat={raw}");
        }
        parsed
    });

    Some(AiTask {
        title: title.to_string(),
        time,
        duration,
        repeat,
    })
}

/// Accepts `H:MM` or `HH:MM` on a 24-hour clock and returns zero-padded `HH:MM`.
pub fn normalize_hhmm(raw: &str) -> Option<String> {
    let (hours, minutes) = raw.trim().split_once(':')?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return None;
    }
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    NaiveTime::from_hms_opt(hours, minutes, 0).map(|t| t.format("%H:%M").to_string())
}

pub fn suggestion_to_draft(task: &AiTask, fallback_time: NaiveTime) -> TaskDraft {
    let parsed = task.parsed_time();
    TaskDraft {
        title: task.title.clone(),
        tab: Tab::Flow,
        has_time: parsed.is_some(),
        time: parsed.unwrap_or(fallback_time),
        has_duration: task.duration.is_some(),
        duration: task.duration.unwrap_or_default(),
        repeat: task.repeat.unwrap_or_default(),
        notification: NotificationLead::None,
    }
}

pub fn draft_to_suggestion(draft: &TaskDraft) -> AiTask {
    AiTask {
        title: draft.title.trim().to_string(),
        time: draft
            .has_time
            .then(|| draft.time.format("%H:%M").to_string()),
        duration: draft.has_duration.then_some(draft.duration),
        repeat: Some(draft.repeat),
    }
}

pub fn extract_candidate_text(value: &Value) -> Option<&str> {
    value["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

#[cfg(feature = "app")]
pub async fn suggest_with_gemini(
    config: &AiConfig,
    user_text: &str,
    locale: Locale,
) -> Result<AiSuggestions, AiError> {
    use std::time::Duration;

    let api_key = config.api_key.trim();
    if api_key.is_empty() {
        return Err(AiError::MissingApiKey);
    }

    let payload = serde_json::json!({
        "contents": [{
            "parts": [{ "text": build_prompt(user_text, locale) }]
        }]
    });

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(45))
        .build()
        .map_err(|err| AiError::Request(format!("failed to build http client: {err}")))?;

    let resp = client
        .post(config.generate_url())
        .query(&[("key", api_key)])
        .json(&payload)
        .send()
        .await
        .map_err(|err| AiError::Request(err.to_string()))?;

    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|err| AiError::Request(format!("failed to read response: {err}")))?;

    if !status.is_success() {
        return Err(AiError::Status {
            status: status.as_u16(),
            body: text,
        });
    }

    let value: Value =
        serde_json::from_str(&text).map_err(|err| AiError::InvalidResponse(err.to_string()))?;
    let content = extract_candidate_text(&value).ok_or(AiError::Empty)?;
    log::debug!("ai response chars={}", content.len());
    parse_suggestions_from_text(content)
}

fn strip_fenced_code_block(text: &str) -> Option<&str> {
    let mut s = text.trim();
    if !s.starts_with("```") {
        return None;
    }
    let pos = s.find('\n')?;
    s = &s[pos + 1..];
    let end = s.rfind("```")?;
    Some(s[..end].trim())
}

fn extract_first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(text[start..=end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_allowed_values_and_appends_user_text() {
        let prompt = build_prompt("  내일 9시에 운동  ", Locale::Ko);
        assert!(prompt.contains("\"1.5시간\""));
        assert!(prompt.contains("\"평일(월~금)\""));
        assert!(prompt.contains("(Korean)"));
        assert!(prompt.ends_with("\nUser Input: 내일 9시에 운동"));

        let prompt = build_prompt("gym", Locale::En);
        assert!(prompt.contains("\"Every week\""));
        assert!(prompt.contains("\"4 hr\""));
    }

    #[test]
    fn parses_plain_json() {
        let parsed = parse_suggestions_from_text(
            r#"{"comment":" 좋아요 ","tasks":[{"title":"운동","time":"07:00","duration":"1시간","repeat":"매일"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.comment, "좋아요");
        assert_eq!(
            parsed.tasks,
            vec![AiTask {
                title: "운동".to_string(),
                time: Some("07:00".to_string()),
                duration: Some(DurationOption::Hour1),
                repeat: Some(Repeat::Daily),
            }]
        );
    }

    #[test]
    fn parses_fenced_and_prose_wrapped_json() {
        let fenced = "```json\n{\"comment\":\"c\",\"tasks\":[{\"title\":\"a\"}]}\n```";
        assert_eq!(parse_suggestions_from_text(fenced).unwrap().tasks.len(), 1);

        let prose = "Sure! Here it is: {\"comment\":\"c\",\"tasks\":[\"read\"]} Enjoy.";
        let parsed = parse_suggestions_from_text(prose).unwrap();
        assert_eq!(parsed.tasks[0].title, "read");
        assert_eq!(parsed.tasks[0].time, None);
    }

    #[test]
    fn invalid_optional_fields_are_dropped() {
        let parsed = parse_suggestions_from_text(
            r#"{"comment":"","tasks":[
                {"title":"a","time":"25:00","duration":"45분","repeat":"yearly"},
                {"title":"b","time":"9:05","duration":"30m","repeat":"weekdays"},
                {"title":"   "},
                {"time":"10:00"},
                42
            ]}"#,
        )
        .unwrap();
        assert_eq!(parsed.tasks.len(), 2);
        assert_eq!(parsed.tasks[0].time, None);
        assert_eq!(parsed.tasks[0].duration, None);
        assert_eq!(parsed.tasks[0].repeat, None);
        assert_eq!(parsed.tasks[1].time.as_deref(), Some("09:05"));
        assert_eq!(parsed.tasks[1].duration, Some(DurationOption::Min30));
        assert_eq!(parsed.tasks[1].repeat, Some(Repeat::Weekdays));
    }

    #[test]
    fn malformed_responses_are_errors() {
        assert!(matches!(parse_suggestions_from_text("  "), Err(AiError::Empty)));
        assert!(matches!(
            parse_suggestions_from_text("no json here"),
            Err(AiError::NoJson)
        ));
        assert!(matches!(
            parse_suggestions_from_text(r#"{"comment":"hi"}"#),
            Err(AiError::MissingTasks)
        ));
        assert!(matches!(
            parse_suggestions_from_text(r#"["a"]"#),
            Err(AiError::MissingTasks)
        ));
    }

    #[test]
    fn normalize_hhmm_rules() {
        assert_eq!(normalize_hhmm("7:30").as_deref(), Some("07:30"));
        assert_eq!(normalize_hhmm("23:59").as_deref(), Some("23:59"));
        assert_eq!(normalize_hhmm("24:00"), None);
        assert_eq!(normalize_hhmm("12:7"), None);
        assert_eq!(normalize_hhmm("noon"), None);
    }

    #[test]
    fn suggestion_and_draft_conversions() {
        let fallback = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let suggestion = AiTask {
            title: "read".to_string(),
            time: Some("21:15".to_string()),
            duration: None,
            repeat: None,
        };
        let draft = suggestion_to_draft(&suggestion, fallback);
        assert!(draft.has_time);
        assert_eq!(draft.time, NaiveTime::from_hms_opt(21, 15, 0).unwrap());
        assert!(!draft.has_duration);
        assert_eq!(draft.duration, DurationOption::Hour1);
        assert_eq!(draft.repeat, Repeat::None);
        assert_eq!(draft.tab, Tab::Flow);

        let mut edited = draft;
        edited.has_time = false;
        edited.has_duration = true;
        edited.duration = DurationOption::Min15;
        let back = draft_to_suggestion(&edited);
        assert_eq!(back.time, None);
        assert_eq!(back.duration, Some(DurationOption::Min15));
        assert_eq!(back.repeat, Some(Repeat::None));

        let untimed = suggestion_to_draft(
            &AiTask {
                title: "x".to_string(),
                time: None,
                duration: Some(DurationOption::Hour2),
                repeat: Some(Repeat::Weekly),
            },
            fallback,
        );
        assert!(!untimed.has_time);
        assert_eq!(untimed.time, fallback);
        assert!(untimed.has_duration);
    }

    #[test]
    fn candidate_text_extraction() {
        let value = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": " {\"tasks\":[]} " }] } }]
        });
        assert_eq!(extract_candidate_text(&value), Some("{\"tasks\":[]}"));
        assert_eq!(extract_candidate_text(&serde_json::json!({})), None);
    }

    #[test]
    fn config_reads_env_style_lookup() {
        let config = AiConfig::from_lookup(|name| match name {
            "GEMINI_API_KEY" => Some("k".to_string()),
            "DAYFLOW_GEMINI_API_KEY" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.api_key, "k");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(
            config.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }
}
