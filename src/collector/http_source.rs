use crate::collector::fetcher::{build_http_client, fetch_page};
use crate::collector::parser::{has_next_page, parse_candidates, HttpCandidate, PageSelectors};
use crate::collector::ReviewSource;
use crate::config::{SourceConfig, UserAgentConfig};
use crate::record::RawRecord;
use crate::{ConfigResult, SourceError, SourceResult};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

/// Page-number pagination over plain HTTP
///
/// Each advance fetches the next page and replaces the visible candidates.
/// The source counts as exhausted once a page comes back without items, or
/// once a page lacks the configured next-page marker.
pub struct HttpPagedSource {
    config: SourceConfig,
    selectors: PageSelectors,
    user_agent: UserAgentConfig,
    client: Option<Client>,
    page: u32,
    visible: Vec<HttpCandidate>,
    next_marker: bool,
    exhausted: bool,
}

impl HttpPagedSource {
    pub fn new(config: SourceConfig, user_agent: UserAgentConfig) -> ConfigResult<Self> {
        let selectors = PageSelectors::from_config(&config)?;
        let page = config.start_page;

        Ok(Self {
            config,
            selectors,
            user_agent,
            client: None,
            page,
            visible: Vec::new(),
            next_marker: false,
            exhausted: false,
        })
    }

    /// Page number of the visible candidates
    pub fn current_page(&self) -> u32 {
        self.page
    }

    fn client(&self) -> SourceResult<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| SourceError::Session(format!("source '{}' is not open", self.config.name)))
    }

    async fn load(&self, page: u32) -> SourceResult<(Vec<HttpCandidate>, bool)> {
        let url = self.config.page_url(page);
        let fetched = fetch_page(self.client()?, &url).await?;

        let items = parse_candidates(&fetched.body, &self.selectors);
        let next = has_next_page(&fetched.body, &self.selectors);
        debug!(
            "[{}] Page {} ({}): {} items, next marker: {}",
            self.config.name,
            page,
            fetched.url,
            items.len(),
            next
        );

        Ok((items, next))
    }
}

#[async_trait]
impl ReviewSource for HttpPagedSource {
    type Candidate = HttpCandidate;

    fn name(&self) -> &str {
        &self.config.name
    }

    async fn open(&mut self) -> SourceResult<()> {
        let client = build_http_client(&self.user_agent)
            .map_err(|e| SourceError::Session(format!("failed to build HTTP client: {}", e)))?;
        self.client = Some(client);
        self.page = self.config.start_page;
        self.exhausted = false;

        let (items, next) = self.load(self.page).await?;
        info!(
            "[{}] Opened at page {} with {} items",
            self.config.name,
            self.page,
            items.len()
        );

        self.exhausted = items.is_empty();
        self.visible = items;
        self.next_marker = next;
        Ok(())
    }

    async fn list_visible_candidates(&mut self) -> SourceResult<Vec<HttpCandidate>> {
        self.client()?;
        Ok(self.visible.clone())
    }

    async fn extract(&mut self, candidate: &HttpCandidate) -> SourceResult<RawRecord> {
        let content = candidate
            .content
            .clone()
            .ok_or_else(|| SourceError::MissingField("content".to_string()))?;

        Ok(RawRecord {
            natural_id: candidate.natural_id.clone(),
            rating: candidate.rating.clone(),
            date: candidate.date.clone(),
            content,
        })
    }

    async fn trigger_advance(&mut self) -> SourceResult<bool> {
        if self.exhausted {
            return Ok(false);
        }

        if self.selectors.has_next_marker() && !self.next_marker {
            self.exhausted = true;
            return Ok(false);
        }

        let next_page = self.page + 1;
        let (items, next) = self.load(next_page).await?;

        if items.is_empty() {
            info!("[{}] Page {} is empty", self.config.name, next_page);
            self.exhausted = true;
            return Ok(false);
        }

        self.page = next_page;
        self.visible = items;
        self.next_marker = next;
        Ok(true)
    }

    async fn has_more_indicator(&mut self) -> SourceResult<bool> {
        Ok(!self.exhausted && (!self.selectors.has_next_marker() || self.next_marker))
    }

    async fn expand_visible(&mut self, _max_clicks: usize) -> SourceResult<usize> {
        // Pages are fetched whole; nothing is truncated client-side
        Ok(0)
    }

    async fn close(&mut self) -> SourceResult<()> {
        self.client = None;
        self.visible.clear();
        debug!("[{}] Closed at page {}", self.config.name, self.page);
        Ok(())
    }
}
