//! Blocking STAC API client
//!
//! Issues `POST {url}/search` and follows `rel="next"` links until the
//! server stops returning them.

use log::{debug, info, warn};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::{ScoutError, ScoutResult};

use super::item::CatalogItem;
use super::query::SearchQuery;
use super::Catalog;

/// Most result pages followed for one search
const MAX_PAGES: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub merge: bool,
}

/// One page of search results
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub features: Vec<CatalogItem>,
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Request needed to fetch a page
#[derive(Debug, Clone, PartialEq)]
pub enum PageRequest {
    Get(String),
    Post(String, Value),
}

impl SearchPage {
    /// Request for the following page, if there is one
    ///
    /// POST links carry their own body; with `merge` set it is laid over
    /// the previous request body.
    pub fn next_request(&self, previous_body: &Value) -> Option<PageRequest> {
        let link = self.links.iter().find(|l| l.rel == "next")?;

        let is_post = link.method.as_deref()
            .map(|m| m.eq_ignore_ascii_case("POST"))
            .unwrap_or(false);
        if !is_post {
            return Some(PageRequest::Get(link.href.clone()));
        }

        let body = match (&link.body, link.merge) {
            (Some(Value::Object(extra)), true) => {
                let mut merged = match previous_body {
                    Value::Object(map) => map.clone(),
                    _ => serde_json::Map::new(),
                };
                for (key, value) in extra {
                    merged.insert(key.clone(), value.clone());
                }
                Value::Object(merged)
            },
            (Some(body), _) => body.clone(),
            (None, _) => previous_body.clone(),
        };

        Some(PageRequest::Post(link.href.clone(), body))
    }
}

/// Client for a STAC API endpoint
pub struct StacClient {
    client: Client,
    base_url: String,
}

impl StacClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        StacClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Search endpoint URL
    pub fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }

    fn fetch_page(&self, request: &PageRequest) -> ScoutResult<SearchPage> {
        let response = match request {
            PageRequest::Get(url) => self.client.get(url).send()?,
            PageRequest::Post(url, body) => self.client.post(url).json(body).send()?,
        };

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(ScoutError::CatalogError(format!(
                "Search failed with HTTP {}: {}", status, detail.chars().take(200).collect::<String>())));
        }

        let text = response.text()?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl Catalog for StacClient {
    fn search(&self, query: &SearchQuery) -> ScoutResult<Vec<CatalogItem>> {
        let body = serde_json::to_value(query.to_body())?;
        debug!("Searching {} with {}", self.search_url(), body);

        let first = PageRequest::Post(self.search_url(), body);
        let items = collect_pages(first, MAX_PAGES, |request| self.fetch_page(request))?;

        info!("Catalog returned {} items for {:?} in {}", items.len(), query.collections, query.datetime);
        Ok(items)
    }
}

/// Fetches pages starting at `first` until one is empty or has no next link
///
/// A result set that is still paging after `max_pages` pages is an error
/// rather than a silently truncated list.
pub fn collect_pages<F>(first: PageRequest, max_pages: usize, mut fetch: F) -> ScoutResult<Vec<CatalogItem>>
where
    F: FnMut(&PageRequest) -> ScoutResult<SearchPage>,
{
    let mut request = first;
    let mut items = Vec::new();

    for page_number in 1..=max_pages {
        let page = fetch(&request)?;
        debug!("Page {}: {} items", page_number, page.features.len());

        let previous_body = match &request {
            PageRequest::Post(_, body) => body.clone(),
            PageRequest::Get(_) => Value::Null,
        };
        let next = if page.features.is_empty() { None } else { page.next_request(&previous_body) };
        items.extend(page.features);

        match next {
            Some(next) => request = next,
            None => return Ok(items),
        }
    }

    warn!("Search still paging after {} pages ({} items so far)", max_pages, items.len());
    Err(ScoutError::CatalogError(format!(
        "Search did not finish within {} pages", max_pages)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_without_next_link_ends_search() {
        let page: SearchPage = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [{"id": "a", "bbox": [0, 0, 1, 1], "properties": {}}],
            "links": [{"rel": "self", "href": "https://stac/search"}]
        })).unwrap();

        assert_eq!(page.features.len(), 1);
        assert_eq!(page.next_request(&json!({})), None);
    }

    #[test]
    fn get_next_link_is_followed() {
        let page: SearchPage = serde_json::from_value(json!({
            "features": [],
            "links": [{"rel": "next", "href": "https://stac/search?token=next:abc"}]
        })).unwrap();

        assert_eq!(page.next_request(&json!({})),
                   Some(PageRequest::Get("https://stac/search?token=next:abc".to_string())));
    }

    #[test]
    fn post_next_link_merges_body() {
        let page: SearchPage = serde_json::from_value(json!({
            "features": [],
            "links": [{
                "rel": "next", "href": "https://stac/search", "method": "POST",
                "body": {"token": "next:abc"}, "merge": true
            }]
        })).unwrap();

        let previous = json!({"collections": ["landsat-c2-l2"], "limit": 100});
        match page.next_request(&previous) {
            Some(PageRequest::Post(url, body)) => {
                assert_eq!(url, "https://stac/search");
                assert_eq!(body["token"], "next:abc");
                assert_eq!(body["collections"][0], "landsat-c2-l2");
            },
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn search_url_has_single_slash() {
        let client = StacClient::new(Client::new(), "https://planetarycomputer.microsoft.com/api/stac/v1/");
        assert_eq!(client.search_url(), "https://planetarycomputer.microsoft.com/api/stac/v1/search");
    }

    fn page(ids: &[&str], next: Option<Value>) -> SearchPage {
        let features: Vec<Value> = ids.iter()
            .map(|id| json!({"id": id, "bbox": [0, 0, 1, 1], "properties": {}}))
            .collect();
        let links: Vec<Value> = next.into_iter().collect();
        serde_json::from_value(json!({"features": features, "links": links})).unwrap()
    }

    #[test]
    fn pages_are_followed_until_next_link_disappears() {
        let mut pages = vec![
            page(&["a", "b"], Some(json!({"rel": "next", "href": "https://stac/search?token=p2"}))),
            page(&["c"], Some(json!({
                "rel": "next", "href": "https://stac/search", "method": "POST",
                "body": {"token": "p3"}, "merge": true
            }))),
            page(&["d"], None),
        ].into_iter();
        let mut requests = Vec::new();

        let first = PageRequest::Post("https://stac/search".to_string(), json!({"limit": 2}));
        let items = collect_pages(first, MAX_PAGES, |request| {
            requests.push(request.clone());
            pages.next().ok_or_else(|| ScoutError::CatalogError("no more pages".to_string()))
        }).unwrap();

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1], PageRequest::Get("https://stac/search?token=p2".to_string()));
        // The GET page has no body to merge into, so only the link body remains
        assert_eq!(requests[2], PageRequest::Post("https://stac/search".to_string(), json!({"token": "p3"})));
    }

    #[test]
    fn empty_page_stops_even_with_next_link() {
        let mut calls = 0;
        let first = PageRequest::Get("https://stac/search".to_string());
        let items = collect_pages(first, MAX_PAGES, |_| {
            calls += 1;
            Ok(page(&[], Some(json!({"rel": "next", "href": "https://stac/search?token=again"}))))
        }).unwrap();

        assert!(items.is_empty());
        assert_eq!(calls, 1);
    }

    #[test]
    fn endless_paging_is_an_error() {
        let mut calls = 0;
        let first = PageRequest::Get("https://stac/search".to_string());
        let result = collect_pages(first, 3, |_| {
            calls += 1;
            Ok(page(&["same"], Some(json!({"rel": "next", "href": "https://stac/search?token=loop"}))))
        });

        assert!(matches!(result, Err(ScoutError::CatalogError(_))));
        assert_eq!(calls, 3);
    }

    #[test]
    fn fetch_errors_end_the_search() {
        let first = PageRequest::Get("https://stac/search".to_string());
        let result = collect_pages(first, MAX_PAGES, |_| Err(ScoutError::HttpError("503".to_string())));
        assert!(matches!(result, Err(ScoutError::HttpError(_))));
    }
}
