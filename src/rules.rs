use crate::config::Config;
use crate::error::RemoteError;
use serde::{Deserialize, Serialize};
use tracing::info;

const RULES_URL: &str = "https://api.twitter.com/2/tweets/search/stream/rules";

/// One server-side filter rule. The id is assigned by the remote service and
/// is absent on rules we are about to install.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub value: String,
}

/// The rule collection as the rules endpoint returns it. A missing `data`
/// array means no rules are installed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleSet {
    pub data: Option<Vec<FilterRule>>,
}

#[derive(Debug, Serialize)]
struct AddRulesRequest {
    add: Vec<FilterRule>,
}

#[derive(Debug, Serialize)]
struct DeleteRulesRequest {
    delete: DeleteIds,
}

#[derive(Debug, Serialize)]
struct DeleteIds {
    ids: Vec<String>,
}

/// Reads, clears, and installs the single `from:<handle>` rule against the
/// filtered-stream rules endpoint.
pub struct RuleManager {
    url: String,
    bearer_token: String,
    rule_value: String,
    client: reqwest::Client,
}

impl RuleManager {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self::with_endpoint(client, config, RULES_URL)
    }

    pub fn with_endpoint(client: reqwest::Client, config: &Config, url: &str) -> Self {
        Self {
            url: url.to_string(),
            bearer_token: config.bearer_token.clone(),
            rule_value: format!("from:{}", config.username),
            client,
        }
    }

    /// Fetch whatever rules a previous run left installed.
    pub async fn fetch_rules(&self) -> Result<RuleSet, RemoteError> {
        let response = self
            .client
            .get(&self.url)
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Status {
                endpoint: "rules",
                status: response.status(),
            });
        }

        Ok(response.json().await?)
    }

    /// Delete every rule in `rules` with one batched request. A set with no
    /// rule array means there is nothing to delete; that is a no-op, not an
    /// error, and no request is issued.
    pub async fn delete_rules(&self, rules: &RuleSet) -> Result<Option<RuleSet>, RemoteError> {
        let Some(existing) = &rules.data else {
            return Ok(None);
        };

        let ids = existing.iter().filter_map(|rule| rule.id.clone()).collect();
        let body = DeleteRulesRequest {
            delete: DeleteIds { ids },
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.bearer_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Status {
                endpoint: "rules",
                status: response.status(),
            });
        }

        Ok(Some(response.json().await?))
    }

    /// Install the single tracking rule with one batched request.
    pub async fn install_rule(&self) -> Result<RuleSet, RemoteError> {
        let body = AddRulesRequest {
            add: vec![FilterRule {
                id: None,
                value: self.rule_value.clone(),
            }],
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.bearer_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Status {
                endpoint: "rules",
                status: response.status(),
            });
        }

        Ok(response.json().await?)
    }

    /// Startup reconciliation: clear whatever rule state a prior run left
    /// behind, then install the one rule this process needs. Strictly
    /// sequential; the remote service wants add and delete as separate
    /// batched operations.
    pub async fn reconcile(&self) -> Result<RuleSet, RemoteError> {
        let current = self.fetch_rules().await?;
        info!(
            existing = current.data.as_ref().map_or(0, Vec::len),
            "fetched stream rules"
        );

        self.delete_rules(&current).await?;

        let installed = self.install_rule().await?;
        info!(rule = %self.rule_value, "installed tracking rule");
        Ok(installed)
    }
}
