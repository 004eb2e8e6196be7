//! Query extraction: date expression and section from a news question.

use crate::config::Prompts;
use crate::error::Result;
use crate::llm::TextGenerator;
use crate::store::Section;
use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, instrument};

/// Surface keywords for sections, including common typos. Scanned in order;
/// the first keyword found in the question wins.
pub const SECTION_KEYWORDS: [(&str, Section); 12] = [
    ("경제", Section::Economy),
    ("정치", Section::Politics),
    ("사회", Section::Society),
    ("생활문화", Section::LifeCulture),
    ("IT과학", Section::ItScience),
    ("세계", Section::World),
    ("경재", Section::Economy),
    ("세게", Section::World),
    ("생활", Section::LifeCulture),
    ("IT", Section::ItScience),
    ("it", Section::ItScience),
    ("아이티", Section::ItScience),
];

static MONTH_DAY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})월\s*(\d{1,2})일").ok());
static SLASH_DATE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})").ok());
static EXTRACTION_LINE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"date:\s*([^,\n]*?)\s*,\s*section:\s*([^\n]*)").ok()
});

/// Date part of a news question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateExpr {
    /// A concrete day.
    Exact(NaiveDate),
    /// "최근": resolved to a rolling window at retrieval time.
    Recent,
    /// "일주일": resolved to a one-week window at retrieval time.
    Week,
}

/// Result of extraction. `None` means no constraint on that field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractedQuery {
    pub date: Option<DateExpr>,
    pub section: Option<Section>,
}

/// Turns a question into a date expression and section.
#[async_trait]
pub trait QueryExtractor: Send + Sync {
    async fn extract(&self, question: &str, today: NaiveDate) -> Result<ExtractedQuery>;
}

/// Find the first section keyword in the text, case-insensitively.
pub fn section_from_text(text: &str) -> Option<Section> {
    let lowered = text.to_lowercase();
    SECTION_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(&keyword.to_lowercase()))
        .map(|(_, section)| *section)
}

fn month_day(re: &LazyLock<Option<Regex>>, question: &str, year: i32) -> Option<NaiveDate> {
    let caps = re.as_ref()?.captures(question)?;
    let month = caps.get(1)?.as_str().parse().ok()?;
    let day = caps.get(2)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Deterministic rule for the date part.
///
/// Precedence: "어제", then an explicit month/day in the current year, then
/// "일주일"/"최근", then today.
pub fn date_from_text(question: &str, today: NaiveDate) -> DateExpr {
    if question.contains("어제") {
        if let Some(yesterday) = today.checked_sub_days(Days::new(1)) {
            return DateExpr::Exact(yesterday);
        }
    }

    let explicit = month_day(&MONTH_DAY, question, today.year())
        .or_else(|| month_day(&SLASH_DATE, question, today.year()));
    if let Some(date) = explicit {
        return DateExpr::Exact(date);
    }

    if question.contains("일주일") {
        DateExpr::Week
    } else if question.contains("최근") {
        DateExpr::Recent
    } else {
        DateExpr::Exact(today)
    }
}

/// Keyword and date-pattern extraction, no network call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleExtractor;

impl RuleExtractor {
    pub fn extract_text(question: &str, today: NaiveDate) -> ExtractedQuery {
        ExtractedQuery {
            date: Some(date_from_text(question, today)),
            section: section_from_text(question),
        }
    }
}

#[async_trait]
impl QueryExtractor for RuleExtractor {
    async fn extract(&self, question: &str, today: NaiveDate) -> Result<ExtractedQuery> {
        Ok(Self::extract_text(question, today))
    }
}

/// Parse a date value written by the model: `YYYY-MM-DD`, "최근" or "일주일".
pub fn parse_date_value(value: &str) -> Option<DateExpr> {
    let value = value.trim().trim_matches(&['"', '\''][..]).trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Some(DateExpr::Exact(date))
    } else if value.contains("일주일") {
        Some(DateExpr::Week)
    } else if value.contains("최근") {
        Some(DateExpr::Recent)
    } else {
        None
    }
}

/// Parse a `date: <value>, section: <value>` line out of a model response.
///
/// When the line is absent both fields are `None`.
pub fn parse_extraction_line(response: &str) -> ExtractedQuery {
    let Some(caps) = EXTRACTION_LINE
        .as_ref()
        .and_then(|re| re.captures(response))
    else {
        return ExtractedQuery::default();
    };

    ExtractedQuery {
        date: caps.get(1).and_then(|m| parse_date_value(m.as_str())),
        section: caps.get(2).and_then(|m| section_from_text(m.as_str())),
    }
}

/// One-shot extraction through the generation service.
pub struct LlmExtractor {
    generator: Arc<dyn TextGenerator>,
    prompts: Prompts,
}

impl LlmExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Prompts) -> Self {
        Self { generator, prompts }
    }
}

#[async_trait]
impl QueryExtractor for LlmExtractor {
    #[instrument(skip(self), fields(question = %question))]
    async fn extract(&self, question: &str, today: NaiveDate) -> Result<ExtractedQuery> {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("today".to_string(), today.format("%Y-%m-%d").to_string());
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.extract.extract, &vars);

        let response = self.generator.generate(&prompt).await?;
        let extracted = parse_extraction_line(&response);
        debug!(?extracted, "Extracted query with model");
        Ok(extracted)
    }
}
