//! HTML parsing for Naver News section and article pages.

use crate::error::{NewsdeskError, Result};
use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

static NEWLINE_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s*\n\s*").ok());

/// One headline on a section page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionItem {
    pub title: String,
    pub url: String,
    pub press: String,
}

/// Fields read from an article page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticlePage {
    /// Publication day, when the page carries a timestamp.
    pub date: Option<NaiveDate>,
    /// Raw body text, not yet normalized.
    pub content: String,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| NewsdeskError::Scrape(format!("Bad selector {}: {:?}", css, e)))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Parse the first `limit` headlines of a section page.
///
/// Items without a title or link are skipped. Links are resolved against the
/// page URL.
pub fn parse_section_page(html: &str, page_url: &Url, limit: usize) -> Result<Vec<SectionItem>> {
    let document = Html::parse_document(html);
    let item_sel = selector("div.sa_text")?;
    let title_sel = selector("strong.sa_text_strong")?;
    let link_sel = selector("a.sa_text_title")?;
    let press_sel = selector("div.sa_text_press")?;

    let items = document
        .select(&item_sel)
        .take(limit)
        .filter_map(|item| {
            let title = item.select(&title_sel).next().map(element_text)?;
            let href = item
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))?;
            let url = page_url.join(href).ok()?.to_string();
            let press = item
                .select(&press_sel)
                .next()
                .map(element_text)
                .unwrap_or_default();
            Some(SectionItem { title, url, press })
        })
        .collect();

    Ok(items)
}

/// Parse date and body from an article page.
///
/// When a video player precedes the body, only the text after the player is
/// kept.
pub fn parse_article_page(html: &str) -> Result<ArticlePage> {
    let document = Html::parse_document(html);
    let date_sel = selector("span.media_end_head_info_datestamp_time")?;
    let video_sel = selector("div.vod_player_wrap")?;
    let body_sel = selector("article#dic_area")?;

    let date = document
        .select(&date_sel)
        .next()
        .and_then(|span| span.value().attr("data-date-time"))
        .and_then(|stamp| stamp.split_whitespace().next())
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok());

    let content = match document.select(&video_sel).next() {
        Some(player) => player
            .next_siblings()
            .filter_map(|node| node.value().as_text().map(|t| t.trim().to_string()))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        None => document
            .select(&body_sel)
            .next()
            .map(|body| body.text().collect::<String>())
            .unwrap_or_default(),
    };

    Ok(ArticlePage { date, content })
}

/// Collapse newline runs (with surrounding blanks) to one space and trim.
pub fn normalize_content(text: &str, collapse_whitespace: bool) -> String {
    if !collapse_whitespace {
        return text.trim().to_string();
    }
    match NEWLINE_RUN.as_ref() {
        Some(re) => re.replace_all(text, " ").trim().to_string(),
        None => text.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTION_HTML: &str = r#"
        <html><body>
          <div class="sa_text">
            <a class="sa_text_title" href="https://n.news.naver.com/mnews/article/001/0001"><strong class="sa_text_strong">한은, 기준금리 동결</strong></a>
            <div class="sa_text_info"><div class="sa_text_press">연합뉴스</div></div>
          </div>
          <div class="sa_text">
            <a class="sa_text_title" href="/mnews/article/002/0002"><strong class="sa_text_strong"> 환율 1,450원 돌파 </strong></a>
            <div class="sa_text_press">한국경제</div>
          </div>
          <div class="sa_text">
            <strong class="sa_text_strong">링크 없는 기사</strong>
          </div>
          <div class="sa_text">
            <a class="sa_text_title" href="/mnews/article/003/0003"><strong class="sa_text_strong">네 번째</strong></a>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_section_page() {
        let page = Url::parse("https://news.naver.com/section/101").unwrap();
        let items = parse_section_page(SECTION_HTML, &page, 3).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "한은, 기준금리 동결");
        assert_eq!(items[0].press, "연합뉴스");
        assert_eq!(items[1].title, "환율 1,450원 돌파");
        assert_eq!(items[1].url, "https://news.naver.com/mnews/article/002/0002");
    }

    #[test]
    fn test_parse_article_with_body() {
        let html = r#"
            <span class="media_end_head_info_datestamp_time" data-date-time="2025-02-12 09:31:00">2025.02.12.</span>
            <article id="dic_area">첫 문단입니다.

            둘째 문단입니다.</article>
        "#;
        let page = parse_article_page(html).unwrap();

        assert_eq!(page.date, NaiveDate::from_ymd_opt(2025, 2, 12));
        assert_eq!(
            normalize_content(&page.content, true),
            "첫 문단입니다. 둘째 문단입니다."
        );
    }

    #[test]
    fn test_parse_article_after_video_player() {
        let html = r#"
            <article id="dic_area"><div class="vod_player_wrap"><video></video></div>
            영상 뒤 본문입니다.<br>
            두 번째 줄.</article>
        "#;
        let page = parse_article_page(html).unwrap();

        assert_eq!(page.date, None);
        assert_eq!(page.content, "영상 뒤 본문입니다. 두 번째 줄.");
    }

    #[test]
    fn test_missing_body_is_empty() {
        let page = parse_article_page("<html><body><p>no article</p></body></html>").unwrap();
        assert!(page.content.is_empty());
    }

    #[test]
    fn test_normalize_content() {
        assert_eq!(normalize_content("\n\n 가\n\n\n나 \n", true), "가 나");
        assert_eq!(normalize_content("  가\n나  ", false), "가\n나");
    }
}
