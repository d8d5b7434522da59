//! Page content extraction
//!
//! Pulls the title, meta description, headings and main body text out of a
//! parsed document. Extraction never fails as a whole: whatever was read
//! before a problem stays in the record and the problem is noted in
//! [`PageRecord::error`].

use chrono::{DateTime, Local};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Elements whose text never counts as page content
const NON_CONTENT: &str = "nav, header, footer, script, style, iframe";

/// Errors raised part-way through extraction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Structured text captured from one fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub meta_description: String,
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    /// Level 3 to 6 headings, each formatted as `"h<level>: <text>"`
    pub h3_plus: Vec<String>,
    pub body_text: String,
    pub captured_at: DateTime<Local>,
    pub error: Option<String>,
}

impl PageRecord {
    /// Creates an empty record stamped with the current local time
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            title: String::new(),
            meta_description: String::new(),
            h1: Vec::new(),
            h2: Vec::new(),
            h3_plus: Vec::new(),
            body_text: String::new(),
            captured_at: Local::now(),
            error: None,
        }
    }
}

/// Extracts [`PageRecord`]s using an ordered list of main-content selectors
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    selectors: Vec<String>,
}

impl ContentExtractor {
    pub fn new(selectors: Vec<String>) -> Self {
        Self { selectors }
    }

    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }

    /// Extracts a record from `document`
    ///
    /// Title, meta description and headings are read from the intact tree.
    /// Navigation, header, footer, script, style and iframe elements are then
    /// detached from `document` before the body text is read, so callers see
    /// the stripped tree afterwards.
    pub fn extract(&self, document: &mut Html, url: &str) -> PageRecord {
        let mut record = PageRecord::new(url);

        if let Err(e) = self.fill(document, &mut record) {
            let message = format!("Error extracting content: {}", e);
            tracing::error!("{} ({})", message, url);
            record.error = Some(message);
        }

        record
    }

    /// Convenience wrapper that parses `html` first
    pub fn extract_html(&self, html: &str, url: &str) -> PageRecord {
        let mut document = Html::parse_document(html);
        self.extract(&mut document, url)
    }

    fn fill(&self, document: &mut Html, record: &mut PageRecord) -> Result<(), ExtractError> {
        record.title = select_first(document, "title")?
            .map(|title| element_text(&title))
            .unwrap_or_default();

        let meta = parse_selector(r#"meta[name="description"]"#)?;
        record.meta_description = document
            .select(&meta)
            .next()
            .and_then(|element| element.value().attr("content"))
            .unwrap_or_default()
            .to_string();

        record.h1 = heading_texts(document, 1)?;
        record.h2 = heading_texts(document, 2)?;
        for level in 3..=6 {
            record.h3_plus.extend(
                heading_texts(document, level)?
                    .into_iter()
                    .map(|text| format!("h{}: {}", level, text)),
            );
        }

        strip_non_content(document)?;
        record.body_text = self.main_text(document)?;

        Ok(())
    }

    /// Text of the first matching content selector, falling back to `<body>`
    ///
    /// Runs after stripping, so only nodes still attached under the root
    /// element are searched.
    fn main_text(&self, document: &Html) -> Result<String, ExtractError> {
        for candidate in &self.selectors {
            if let Some(region) = select_first(document, candidate)? {
                tracing::trace!("Main content matched selector {}", candidate);
                return Ok(element_text(&region));
            }
        }

        Ok(select_first(document, "body")?
            .map(|body| element_text(&body))
            .unwrap_or_default())
    }
}

/// Detaches every non-content element from the tree
fn strip_non_content(document: &mut Html) -> Result<(), ExtractError> {
    let selector = parse_selector(NON_CONTENT)?;
    let ids: Vec<_> = document.select(&selector).map(|element| element.id()).collect();

    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    Ok(())
}

fn heading_texts(document: &Html, level: u8) -> Result<Vec<String>, ExtractError> {
    let selector = parse_selector(&format!("h{}", level))?;
    Ok(document
        .select(&selector)
        .map(|heading| element_text(&heading))
        .collect())
}

/// First match among the elements still attached to the document
///
/// `Html::select` walks every node in the tree's storage, detached ones
/// included, so queries go through the root element instead.
fn select_first<'a>(
    document: &'a Html,
    selector: &str,
) -> Result<Option<ElementRef<'a>>, ExtractError> {
    let selector = parse_selector(selector)?;
    Ok(document.root_element().select(&selector).next())
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Text content of an element, whitespace-normalized
///
/// Text nodes are joined with a space so adjacent block elements do not run
/// together, then every whitespace run collapses to a single space.
fn element_text(element: &ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Splits on any whitespace run and rejoins with single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
