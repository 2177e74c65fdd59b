//! Integration tests for Review-Harvest
//!
//! These tests use wiremock to serve paginated review listings and drive
//! the collector, the SQLite storage and the harvest driver end-to-end.

mod collector_tests;
mod harvest_tests;

use review_harvest::collector::{BackoffSchedule, CollectorOptions};
use review_harvest::config::{SourceConfig, UserAgentConfig};
use std::time::Duration;

/// Renders one listing page; `(id, rating, content)` per review
pub fn listing_page(reviews: &[(&str, &str, &str)], has_next: bool) -> String {
    let mut html = String::from("<html><body><ul class=\"reviews\">\n");
    for (id, rating, content) in reviews {
        html.push_str(&format!(
            "<li class=\"review\" data-review-id=\"{}\">\
             <span class=\"stars\" data-score=\"{}\"></span>\
             <span class=\"date\">2024.05.01</span>\
             <p class=\"body\">{}</p></li>\n",
            id, rating, content
        ));
    }
    html.push_str("</ul>\n");
    if has_next {
        html.push_str("<a class=\"next\" href=\"#\">next</a>\n");
    }
    html.push_str("</body></html>");
    html
}

pub fn source_config(base_url: &str, next_selector: Option<&str>) -> SourceConfig {
    SourceConfig {
        name: "mockshop".to_string(),
        url_template: format!("{}/reviews?page={{page}}", base_url),
        start_page: 1,
        item_selector: "li.review".to_string(),
        content_selector: "p.body".to_string(),
        date_selector: Some(".date".to_string()),
        rating_selector: Some(".stars".to_string()),
        rating_attr: Some("data-score".to_string()),
        id_attr: Some("data-review-id".to_string()),
        next_selector: next_selector.map(str::to_string),
    }
}

pub fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

/// Options with delays short enough for tests
pub fn fast_options() -> CollectorOptions {
    CollectorOptions {
        checkpoint_every: 1,
        backoff: BackoffSchedule::from_millis(&[1, 2]),
        settle_timeout: Duration::from_millis(50),
        poll_interval: Duration::from_millis(5),
        expand_pass: false,
        expand_max_clicks: 10,
    }
}
