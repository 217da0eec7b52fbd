//! `web` tool — search, download and reachability checks.
//!
//! Only available with the `web-tools` feature.
//!
//! Search scrapes the DuckDuckGo HTML endpoint (no API key) with `scraper`.
//! Downloads land in [`WebToolConfig::download_dir`] unless the command names
//! a destination. A relative destination is resolved against
//! [`WebToolConfig::base_dir`], the directory the security policy checks path
//! entities against.

use addy_domain::security::path::normalize_lexically;
use addy_domain::{Entities, ExecutionResult, Intent, Tool, ToolDescriptor, ToolError};
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::http_client;

/// Canonical tool name.
pub const WEB: &str = "web";

/// Search hits kept per query.
const MAX_RESULTS: usize = 5;

/// Downloads larger than this are refused.
const MAX_DOWNLOAD_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct WebToolConfig {
    pub search_url: String,
    pub download_dir: PathBuf,
    /// Anchor for relative destinations.
    pub base_dir: PathBuf,
}

impl Default for WebToolConfig {
    fn default() -> Self {
        Self {
            search_url: "https://html.duckduckgo.com/html/".to_string(),
            download_dir: PathBuf::from("."),
            base_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Extract result links from a DuckDuckGo HTML results page.
pub fn parse_search_results(html: &str, limit: usize) -> Vec<SearchHit> {
    let (Ok(result_sel), Ok(link_sel), Ok(snippet_sel)) = (
        Selector::parse(".result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    document
        .select(&result_sel)
        .filter_map(|result| {
            let link = result.select(&link_sel).next()?;
            let title = clean_text(&link.text().collect::<String>());
            let url = link.value().attr("href")?.to_string();
            if title.is_empty() {
                return None;
            }
            let snippet = result
                .select(&snippet_sel)
                .next()
                .map(|s| clean_text(&s.text().collect::<String>()))
                .unwrap_or_default();
            Some(SearchHit {
                title,
                url,
                snippet,
            })
        })
        .take(limit)
        .collect()
}

/// Contents of the `<title>` element.
pub fn page_title(html: &str) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let document = Html::parse_document(html);
    let title = clean_text(&document.select(&selector).next()?.text().collect::<String>());
    (!title.is_empty()).then_some(title)
}

fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Add `https://` when the user said a bare host.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}

/// File name for a download, from the last URL path segment.
pub fn file_name_from_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let after_scheme = without_query
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(without_query);
    after_scheme
        .split_once('/')
        .and_then(|(_, path)| path.rsplit('/').next())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or("download")
        .to_string()
}

pub struct WebTool {
    descriptor: ToolDescriptor,
    config: WebToolConfig,
    client: reqwest::Client,
}

impl WebTool {
    pub fn new(config: WebToolConfig) -> Self {
        Self {
            descriptor: ToolDescriptor::new(WEB, "网络: 网页搜索、下载文件、检查网站")
                .with_intents([Intent::SearchWeb, Intent::DownloadFile, Intent::CheckWebsite]),
            config,
            client: http_client(),
        }
    }

    async fn search(&self, query: &str) -> Result<ExecutionResult, ToolError> {
        let response = self
            .client
            .post(&self.config.search_url)
            .form(&[("q", query)])
            .send()
            .await
            .map_err(|e| ToolError::execution_failed(format!("Search request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ToolError::execution_failed(format!(
                "Search service returned {}",
                response.status()
            )));
        }
        let html = response
            .text()
            .await
            .map_err(|e| ToolError::execution_failed(format!("Failed to read search results: {}", e)))?;

        let hits = parse_search_results(&html, MAX_RESULTS);
        if hits.is_empty() {
            return Ok(ExecutionResult::success(format!("没有找到关于 '{}' 的结果", query))
                .with_data(json!({ "query": query, "results": hits })));
        }

        let mut message = format!("关于 '{}' 的搜索结果:", query);
        for (i, hit) in hits.iter().enumerate() {
            message.push_str(&format!("\n{}. {}", i + 1, hit.title));
        }
        Ok(ExecutionResult::success(message).with_data(json!({ "query": query, "results": hits })))
    }

    fn download_target(&self, url: &str, destination: Option<&Path>) -> PathBuf {
        let file_name = file_name_from_url(url);
        match destination {
            Some(dest) => {
                let dest = if dest.is_absolute() {
                    normalize_lexically(dest)
                } else {
                    normalize_lexically(&self.config.base_dir.join(dest))
                };
                if dest.is_dir() { dest.join(file_name) } else { dest }
            }
            None => self.config.download_dir.join(file_name),
        }
    }

    async fn download(&self, url: &str, destination: Option<&Path>) -> Result<ExecutionResult, ToolError> {
        let target = self.download_target(url, destination);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::execution_failed(format!("Download failed: {}", e)))?;

        if !response.status().is_success() {
            return Ok(ExecutionResult::rejected(format!(
                "下载失败: 服务器返回 {}",
                response.status().as_u16()
            )));
        }
        if response.content_length().unwrap_or(0) > MAX_DOWNLOAD_BYTES {
            return Ok(ExecutionResult::rejected("下载失败: 文件过大"));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| ToolError::execution_failed(format!("Download failed: {}", e)))?;
        if body.len() as u64 > MAX_DOWNLOAD_BYTES {
            return Ok(ExecutionResult::rejected("下载失败: 文件过大"));
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &body).await?;
        tracing::info!(%url, path = %target.display(), bytes = body.len(), "Downloaded file");

        Ok(ExecutionResult::success(format!(
            "文件已下载到 {} ({} 字节)",
            target.display(),
            body.len()
        ))
        .with_data(json!({ "url": url, "path": target.display().to_string(), "bytes": body.len() })))
    }

    async fn check(&self, url: &str) -> Result<ExecutionResult, ToolError> {
        let start = Instant::now();
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                return Ok(ExecutionResult::rejected(format!("网站 {} 无法访问", url))
                    .with_cause(e.to_string())
                    .with_data(json!({ "url": url, "reachable": false })));
            }
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;
        let status = response.status();
        let title = response.text().await.ok().and_then(|body| page_title(&body));

        let mut message = format!(
            "网站 {} {} (状态码 {}, 响应时间 {}ms)",
            url,
            if status.is_success() { "可以访问" } else { "响应异常" },
            status.as_u16(),
            elapsed_ms
        );
        if let Some(title) = &title {
            message.push_str(&format!("\n标题: {}", title));
        }
        Ok(ExecutionResult::success(message).with_data(json!({
            "url": url,
            "reachable": true,
            "status": status.as_u16(),
            "elapsed_ms": elapsed_ms,
            "title": title,
        })))
    }
}

#[async_trait]
impl Tool for WebTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        intent: Intent,
        entities: &Entities,
        _raw_text: &str,
    ) -> Result<ExecutionResult, ToolError> {
        match intent {
            Intent::SearchWeb => match entities.text("query") {
                Some(query) => self.search(query.trim()).await,
                None => Ok(ExecutionResult::missing_parameters(&["query"])),
            },
            Intent::DownloadFile => match entities.text("url") {
                Some(url) => {
                    self.download(&normalize_url(&url), entities.path("destination"))
                        .await
                }
                None => Ok(ExecutionResult::missing_parameters(&["url"])),
            },
            Intent::CheckWebsite => match entities.text("url") {
                Some(url) => self.check(&normalize_url(&url)).await,
                None => Ok(ExecutionResult::missing_parameters(&["url"])),
            },
            other => Ok(ExecutionResult::rejected(format!("不支持的网络操作: {}", other))),
        }
    }
}
