//! HTML parsing for page-number sources
//!
//! This module turns one fetched page into candidates using the CSS
//! selectors configured for the source:
//! - `item-selector` picks one element per review
//! - content, date and rating are searched inside each item
//! - the natural id is read from an attribute of the item itself
//! - `next-selector`, when configured, tells whether a next page exists

use crate::config::SourceConfig;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// Raw fields of one review as found on a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpCandidate {
    pub natural_id: Option<String>,
    pub rating: Option<String>,
    pub date: Option<String>,
    pub content: Option<String>,
}

/// Compiled selectors of one source
#[derive(Debug, Clone)]
pub struct PageSelectors {
    item: Selector,
    content: Selector,
    date: Option<Selector>,
    rating: Option<Selector>,
    rating_attr: Option<String>,
    id_attr: Option<String>,
    next: Option<Selector>,
}

fn compile(field: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        field: field.to_string(),
        selector: selector.to_string(),
    })
}

fn compile_optional(field: &str, selector: Option<&str>) -> Result<Option<Selector>, ConfigError> {
    selector.map(|s| compile(field, s)).transpose()
}

impl PageSelectors {
    /// Compiles the selectors configured for a source
    pub fn from_config(config: &SourceConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            item: compile("item_selector", &config.item_selector)?,
            content: compile("content_selector", &config.content_selector)?,
            date: compile_optional("date_selector", config.date_selector.as_deref())?,
            rating: compile_optional("rating_selector", config.rating_selector.as_deref())?,
            rating_attr: config.rating_attr.clone(),
            id_attr: config.id_attr.clone(),
            next: compile_optional("next_selector", config.next_selector.as_deref())?,
        })
    }

    /// True when pages carry an explicit next-page marker
    pub fn has_next_marker(&self) -> bool {
        self.next.is_some()
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

fn first_text(item: ElementRef<'_>, selector: &Selector) -> Option<String> {
    item.select(selector).next().map(element_text)
}

fn read_rating(item: ElementRef<'_>, selectors: &PageSelectors) -> Option<String> {
    let element = match &selectors.rating {
        Some(selector) => item.select(selector).next()?,
        None => item,
    };

    match &selectors.rating_attr {
        Some(attr) => element.value().attr(attr).map(str::to_string),
        None if selectors.rating.is_some() => Some(element_text(element)),
        None => None,
    }
}

/// Extracts every item on a page, in document order
///
/// # Example
///
/// ```
/// use review_harvest::collector::{parse_candidates, PageSelectors};
/// use review_harvest::config::SourceConfig;
///
/// let config: SourceConfig = toml::from_str(r#"
///     name = "shop"
///     url-template = "https://example.com/r?page={page}"
///     item-selector = "li"
///     content-selector = "p"
///     id-attr = "data-id"
/// "#).unwrap();
/// let selectors = PageSelectors::from_config(&config).unwrap();
///
/// let items = parse_candidates(r#"<ul><li data-id="7"><p>Nice</p></li></ul>"#, &selectors);
/// assert_eq!(items[0].natural_id.as_deref(), Some("7"));
/// assert_eq!(items[0].content.as_deref(), Some("Nice"));
/// ```
pub fn parse_candidates(html: &str, selectors: &PageSelectors) -> Vec<HttpCandidate> {
    let document = Html::parse_document(html);

    document
        .select(&selectors.item)
        .map(|item| HttpCandidate {
            natural_id: selectors
                .id_attr
                .as_deref()
                .and_then(|attr| item.value().attr(attr))
                .map(str::to_string),
            rating: read_rating(item, selectors),
            date: selectors
                .date
                .as_ref()
                .and_then(|selector| first_text(item, selector)),
            content: first_text(item, &selectors.content),
        })
        .collect()
}

/// Returns whether the page shows the next-page marker
///
/// Always false when the source has no `next-selector`.
pub fn has_next_page(html: &str, selectors: &PageSelectors) -> bool {
    match &selectors.next {
        Some(next) => Html::parse_document(html).select(next).next().is_some(),
        None => false,
    }
}
