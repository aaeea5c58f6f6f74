//! REST client (GitHub REST v3)

use super::{build_http_client, parse_body, timed_send, ApiClient, Invocation, PAGE_SIZE};
use crate::{error::Result, models::Config, types::ApiType};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use std::time::Instant;

const REST_ACCEPT: &str = "application/vnd.github.v3+json";

/// Resource/endpoint-oriented client: plain `GET`s, `token` auth
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RestClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http: build_http_client(config.timeout())?,
            base_url: config.rest_base_url.trim_end_matches('/').to_string(),
            token: config.github_token.clone(),
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header(ACCEPT, REST_ACCEPT);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {}", token));
        }
        request
    }

    async fn single(&self, request: reqwest::RequestBuilder) -> Result<Invocation> {
        let body = timed_send(request).await?;
        Ok(Invocation {
            payload: parse_body(&body.bytes)?,
            elapsed: body.elapsed,
            byte_size: body.bytes.len(),
        })
    }
}

#[async_trait]
impl ApiClient for RestClient {
    fn api_type(&self) -> ApiType {
        ApiType::Rest
    }

    async fn get_simple(&self, login: &str) -> Result<Invocation> {
        self.single(self.get(&format!("/users/{}", login))).await
    }

    async fn get_with_relations(&self, login: &str) -> Result<Invocation> {
        // Two round trips; the measured window spans both
        let start = Instant::now();
        let user = timed_send(self.get(&format!("/users/{}", login))).await?;
        let repos = timed_send(
            self.get(&format!("/users/{}/repos", login))
                .query(&[("per_page", PAGE_SIZE)]),
        )
        .await?;
        let elapsed = start.elapsed();

        let payload = serde_json::json!({
            "user": parse_body(&user.bytes)?,
            "repositories": parse_body(&repos.bytes)?,
        });

        Ok(Invocation {
            payload,
            elapsed,
            byte_size: user.bytes.len() + repos.bytes.len(),
        })
    }

    async fn search_filtered(&self, query: &str) -> Result<Invocation> {
        let per_page = PAGE_SIZE.to_string();
        self.single(self.get("/search/repositories").query(&[
            ("q", query),
            ("per_page", per_page.as_str()),
            ("sort", "stars"),
            ("order", "desc"),
        ]))
        .await
    }

    async fn get_paginated(&self, login: &str, page: u32) -> Result<Invocation> {
        let per_page = PAGE_SIZE.to_string();
        let page = page.to_string();
        self.single(self.get(&format!("/users/{}/repos", login)).query(&[
            ("per_page", per_page.as_str()),
            ("page", page.as_str()),
            ("sort", "updated"),
            ("direction", "desc"),
        ]))
        .await
    }
}
