//! Thin asynchronous client for the Albion Online Data Project price history API.
//!
//! - One HTTP request per batch of at most [`MAX_IDS_PER_REQUEST`] identifiers.
//! - No retries and no caching: every call goes to the network.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use time::macros::format_description;
use time::PrimitiveDateTime;
use tracing::debug;

use crate::domain::{HistoryPoint, ItemId, PriceQuote, Server};

const HOST_SUFFIX: &str = "albion-online-data.com";
const HISTORY_PATH: [&str; 4] = ["api", "v2", "stats", "history"];
const USER_AGENT: &str = concat!("craft-profit-scanner/", env!("CARGO_PKG_VERSION"));

/// Upper bound on identifiers packed into one request path.
pub const MAX_IDS_PER_REQUEST: usize = 80;

/// Bucket width in hours.
pub const DEFAULT_TIME_SCALE: u32 = 24;

#[derive(Debug, Error)]
pub enum PriceSourceError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error: {0}")]
    Api(String),
}

/// Parameters of one history lookup.
#[derive(Clone, Copy, Debug)]
pub struct HistoryQuery<'a> {
    pub server: Server,
    pub item_ids: &'a [ItemId],
    pub location: &'a str,
    pub quality: Option<u8>,
    pub time_scale: u32,
}

/// A market price backend able to answer a single history request.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_history(
        &self,
        query: &HistoryQuery<'_>,
    ) -> Result<Vec<PriceQuote>, PriceSourceError>;
}

/// Splits `query` into sequential requests of at most [`MAX_IDS_PER_REQUEST`] identifiers
/// and concatenates the results. The first failing batch aborts the whole lookup.
pub async fn fetch_history_batched<S>(
    source: &S,
    query: &HistoryQuery<'_>,
) -> Result<Vec<PriceQuote>, PriceSourceError>
where
    S: PriceSource + ?Sized,
{
    let mut quotes = Vec::new();
    for (index, chunk) in query.item_ids.chunks(MAX_IDS_PER_REQUEST).enumerate() {
        debug!(
            batch = index,
            size = chunk.len(),
            location = query.location,
            server = %query.server,
            "requesting price history batch"
        );
        let batch = HistoryQuery {
            item_ids: chunk,
            ..*query
        };
        quotes.extend(source.fetch_history(&batch).await?);
    }
    Ok(quotes)
}

#[derive(Clone)]
pub struct AlbionDataClient {
    http: Client,
    base_override: Option<Url>,
}

impl AlbionDataClient {
    pub fn new() -> Result<Self, PriceSourceError> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_override: None,
        })
    }

    /// Sends every server's requests to `base` instead (self-hosted mirrors).
    pub fn with_base_url(base: &str) -> Result<Self, PriceSourceError> {
        let mut client = Self::new()?;
        client.base_override = Some(Url::parse(base)?);
        Ok(client)
    }

    pub fn history_url(&self, query: &HistoryQuery<'_>) -> Result<Url, PriceSourceError> {
        let mut url = self.base_url(query.server)?;
        url.path_segments_mut()
            .map_err(|_| PriceSourceError::Api("base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(HISTORY_PATH)
            .push(&query.item_ids.join(","));

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("locations", query.location)
                .append_pair("time-scale", &query.time_scale.to_string());
            if let Some(quality) = query.quality {
                pairs.append_pair("qualities", &quality.to_string());
            }
        }

        Ok(url)
    }

    fn base_url(&self, server: Server) -> Result<Url, url::ParseError> {
        match &self.base_override {
            Some(url) => Ok(url.clone()),
            None => Url::parse(&format!("https://{}.{HOST_SUFFIX}/", server.as_str())),
        }
    }
}

#[async_trait]
impl PriceSource for AlbionDataClient {
    async fn fetch_history(
        &self,
        query: &HistoryQuery<'_>,
    ) -> Result<Vec<PriceQuote>, PriceSourceError> {
        if query.item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.history_url(query)?;
        debug!(%url, "requesting price history");

        let response = self.http.get(url).send().await?.error_for_status()?;
        let entries: Vec<HistoryDto> = response.json().await?;
        Ok(entries.into_iter().map(PriceQuote::from).collect())
    }
}

#[derive(Debug, Deserialize)]
struct HistoryDto {
    item_id: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    quality: u8,
    #[serde(default)]
    data: Vec<HistoryPointDto>,
}

#[derive(Debug, Deserialize)]
struct HistoryPointDto {
    avg_price: f64,
    #[serde(default)]
    item_count: Option<u64>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl From<HistoryDto> for PriceQuote {
    fn from(dto: HistoryDto) -> Self {
        Self {
            item_id: dto.item_id,
            location: dto.location,
            quality: dto.quality,
            data: dto.data.into_iter().map(HistoryPoint::from).collect(),
        }
    }
}

impl From<HistoryPointDto> for HistoryPoint {
    fn from(dto: HistoryPointDto) -> Self {
        Self {
            avg_price: dto.avg_price,
            item_count: dto.item_count,
            timestamp: dto.timestamp.as_deref().and_then(parse_timestamp),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<PrimitiveDateTime> {
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    PrimitiveDateTime::parse(raw, format).ok()
}
