//! Company profile types produced by a research episode.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::EpisodeState;
use crate::tools::ToolParameters;
use crate::types::Usage;

/// Everything gathered about one company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyProfile {
    pub one_liner: String,
    pub founding_date: String,
    pub use_cases: Vec<String>,
    pub target_persona: String,
    pub features: Vec<String>,
    pub integrations: Vec<String>,
    pub investor_vcs: Vec<String>,
    pub investor_leads: Vec<String>,
    pub relevant_urls: Vec<String>,
}

impl CompanyProfile {
    /// Schema advertised for the nested `company_profile` argument.
    pub fn parameters() -> ToolParameters {
        ToolParameters::object()
            .string("one_liner", "a one liner about the company", true)
            .string("founding_date", "the date the company was founded", true)
            .string_list("use_cases", "a list of use cases for the company", true)
            .string(
                "target_persona",
                "a target user persona for the tool (e.g. Product Manager, Sales, Engineer, CEO, etc.)",
                true,
            )
            .string_list("features", "a list of features for the company", true)
            .string_list("integrations", "a list of integrations for the company", true)
            .string_list("investor_vcs", "a list of investors by VC name", true)
            .string_list("investor_leads", "a list of investors by lead investor name", true)
            .string_list("relevant_urls", "a list of relevant urls for your research", true)
            .build()
    }
}

/// Arguments of the completion tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchFindings {
    pub company_profile: CompanyProfile,
    #[serde(default)]
    pub remaining_tasks: Vec<String>,
}

impl ResearchFindings {
    /// Read findings from a final result, which may be a structured value or,
    /// when degraded, the raw argument payload as a string.
    pub fn from_result(result: &Value) -> Option<Self> {
        match result {
            Value::String(raw) => serde_json::from_str(raw).ok(),
            other => serde_json::from_value(other.clone()).ok(),
        }
    }
}

/// Outcome of researching one company.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchReport {
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_profile: Option<CompanyProfile>,
    pub remaining_tasks: Vec<String>,
    /// The model never produced a valid completion; `raw_result` is a fallback.
    pub degraded: bool,
    pub raw_result: Value,
    pub steps_taken: usize,
    pub model_calls: usize,
    pub usage: Usage,
}

impl ResearchReport {
    pub fn from_episode(company_name: impl Into<String>, episode: &EpisodeState) -> Self {
        let raw_result = episode.final_result().cloned().unwrap_or(Value::Null);
        let findings = ResearchFindings::from_result(&raw_result);
        Self {
            company_name: company_name.into(),
            degraded: episode.is_degraded() || findings.is_none(),
            company_profile: findings.as_ref().map(|f| f.company_profile.clone()),
            remaining_tasks: findings.map(|f| f.remaining_tasks).unwrap_or_default(),
            raw_result,
            steps_taken: episode.steps_taken,
            model_calls: episode.model_calls,
            usage: episode.usage.clone(),
        }
    }
}
