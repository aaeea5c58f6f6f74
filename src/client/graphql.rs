//! GraphQL client (GitHub GraphQL API)

use super::{build_http_client, parse_body, timed_send, ApiClient, Invocation, PAGE_SIZE};
use crate::{
    error::{AppError, Result},
    models::Config,
    types::ApiType,
};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::{json, Value};

const USER_QUERY: &str = r#"
query($login: String!) {
  user(login: $login) {
    login name bio company location websiteUrl avatarUrl createdAt updatedAt
    followers { totalCount }
    following { totalCount }
    repositories { totalCount }
  }
}"#;

const USER_WITH_REPOS_QUERY: &str = r#"
query($login: String!, $first: Int!) {
  user(login: $login) {
    login name bio company location
    followers { totalCount }
    following { totalCount }
    repositories(first: $first, orderBy: {field: UPDATED_AT, direction: DESC}) {
      totalCount
      nodes {
        name description url stargazerCount forkCount
        primaryLanguage { name }
        createdAt updatedAt
      }
    }
  }
}"#;

const SEARCH_QUERY: &str = r#"
query($queryString: String!, $first: Int!) {
  search(query: $queryString, type: REPOSITORY, first: $first) {
    repositoryCount
    nodes {
      ... on Repository {
        name description url stargazerCount forkCount
        primaryLanguage { name }
        owner { login }
        createdAt updatedAt
      }
    }
  }
}"#;

const PAGINATED_QUERY: &str = r#"
query($login: String!, $first: Int!, $after: String) {
  user(login: $login) {
    repositories(first: $first, after: $after, orderBy: {field: UPDATED_AT, direction: DESC}) {
      totalCount
      pageInfo { hasNextPage endCursor }
      nodes {
        name description url stargazerCount forkCount
        primaryLanguage { name }
        createdAt updatedAt
      }
    }
  }
}"#;

/// Declarative query client: `POST` to a single endpoint, `bearer` auth
pub struct GraphQlClient {
    http: reqwest::Client,
    url: String,
    token: String,
}

impl GraphQlClient {
    /// Fails with a configuration error when no token is configured
    pub fn new(config: &Config) -> Result<Self> {
        let token = config
            .github_token
            .clone()
            .ok_or_else(|| AppError::config("GITHUB_TOKEN is required for the GraphQL API"))?;

        Ok(Self {
            http: build_http_client(config.timeout())?,
            url: config.graphql_url.clone(),
            token,
        })
    }

    async fn execute(&self, query: &str, variables: Value) -> Result<Invocation> {
        let request = self
            .http
            .post(&self.url)
            .header(AUTHORIZATION, format!("bearer {}", self.token))
            .json(&json!({ "query": query, "variables": variables }));

        let body = timed_send(request).await?;
        let mut response = parse_body(&body.bytes)?;

        if let Some(errors) = response.get("errors") {
            return Err(AppError::protocol(format!("GraphQL errors: {}", describe_errors(errors))));
        }

        let payload = response
            .get_mut("data")
            .map(Value::take)
            .ok_or_else(|| AppError::protocol("GraphQL response has no data member"))?;

        Ok(Invocation {
            payload,
            elapsed: body.elapsed,
            byte_size: body.bytes.len(),
        })
    }
}

fn describe_errors(errors: &Value) -> String {
    match errors.as_array() {
        Some(list) if !list.is_empty() => list
            .iter()
            .map(|e| {
                e.get("message")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .unwrap_or_else(|| e.to_string())
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => errors.to_string(),
    }
}

#[async_trait]
impl ApiClient for GraphQlClient {
    fn api_type(&self) -> ApiType {
        ApiType::GraphQl
    }

    async fn get_simple(&self, login: &str) -> Result<Invocation> {
        self.execute(USER_QUERY, json!({ "login": login })).await
    }

    async fn get_with_relations(&self, login: &str) -> Result<Invocation> {
        self.execute(USER_WITH_REPOS_QUERY, json!({ "login": login, "first": PAGE_SIZE }))
            .await
    }

    async fn search_filtered(&self, query: &str) -> Result<Invocation> {
        self.execute(SEARCH_QUERY, json!({ "queryString": query, "first": PAGE_SIZE }))
            .await
    }

    /// Cursor pagination has no page numbers: always the first page
    async fn get_paginated(&self, login: &str, _page: u32) -> Result<Invocation> {
        self.execute(PAGINATED_QUERY, json!({ "login": login, "first": PAGE_SIZE }))
            .await
    }
}
