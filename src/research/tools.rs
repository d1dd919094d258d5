//! The research toolset: a closed set of tools over a [`ResearchBackend`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use super::backend::{trim_financials, youtube_video_id, ResearchBackend};
use super::profile::{CompanyProfile, ResearchFindings};
use crate::error::SleuthError;
use crate::tools::{Tool, ToolArguments, ToolExecutionContext, ToolOutput, ToolParameters, ToolRegistry};

const SEARCH_LIMIT: usize = 10;

/// Every tool a research episode can call, by wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum ResearchTool {
    #[strum(serialize = "ScrapeURL")]
    ScrapeUrl,
    GoogleSearch,
    GetYoutubeTranscript,
    GetCrunchbaseFinancials,
    ResearchComplete,
}

impl ResearchTool {
    pub fn description(self) -> &'static str {
        match self {
            Self::ScrapeUrl => {
                "Use this function to get the contents of a URL in markdown format with all URLs preserved"
            }
            Self::GoogleSearch => "Use this function to search google and get the top results",
            Self::GetYoutubeTranscript => {
                "Use this function to get the markdownified transcript of a URL from youtube"
            }
            Self::GetCrunchbaseFinancials => {
                "Use this function to get the financials of a company from crunchbase to understand who the investors are."
            }
            Self::ResearchComplete => {
                "When you're done with your research, use this function to fill in your answer for competitive research"
            }
        }
    }

    pub fn parameters(self) -> ToolParameters {
        match self {
            Self::ScrapeUrl => ToolParameters::object()
                .string("url", "the url to scrape", true)
                .build(),
            Self::GoogleSearch => ToolParameters::object()
                .string("company_name", "the name of the company to search for", true)
                .string("keywords", "extra keywords to search for", true)
                .build(),
            Self::GetYoutubeTranscript => ToolParameters::object()
                .string("url", "the url to scrape", true)
                .build(),
            Self::GetCrunchbaseFinancials => ToolParameters::object()
                .string("url", "the crunchbase url of the company to search for", true)
                .build(),
            Self::ResearchComplete => ToolParameters::object()
                .object(
                    "company_profile",
                    "the company profile",
                    CompanyProfile::parameters(),
                    true,
                )
                .string_list("remaining_tasks", "a list of remaining tasks to complete", true)
                .build(),
        }
    }

    /// Tools advertised by default. Crunchbase is opt-in.
    pub fn default_set() -> Vec<Self> {
        Self::iter()
            .filter(|t| *t != Self::GetCrunchbaseFinancials)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct UrlArgs {
    url: String,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    company_name: String,
    keywords: String,
}

/// A validated call to one of the research tools.
#[derive(Debug, Clone, PartialEq)]
pub enum ResearchCall {
    ScrapeUrl { url: String },
    GoogleSearch { company_name: String, keywords: String },
    GetYoutubeTranscript { url: String },
    GetCrunchbaseFinancials { url: String },
    ResearchComplete(ResearchFindings),
}

impl ResearchCall {
    pub fn from_arguments(tool: ResearchTool, args: &ToolArguments) -> Result<Self, SleuthError> {
        Ok(match tool {
            ResearchTool::ScrapeUrl => Self::ScrapeUrl {
                url: args.deserialize::<UrlArgs>()?.url,
            },
            ResearchTool::GoogleSearch => {
                let SearchArgs {
                    company_name,
                    keywords,
                } = args.deserialize()?;
                Self::GoogleSearch {
                    company_name,
                    keywords,
                }
            }
            ResearchTool::GetYoutubeTranscript => Self::GetYoutubeTranscript {
                url: args.deserialize::<UrlArgs>()?.url,
            },
            ResearchTool::GetCrunchbaseFinancials => Self::GetCrunchbaseFinancials {
                url: args.deserialize::<UrlArgs>()?.url,
            },
            ResearchTool::ResearchComplete => Self::ResearchComplete(args.deserialize()?),
        })
    }

    pub async fn execute(self, backend: &dyn ResearchBackend) -> Result<ToolOutput, SleuthError> {
        match self {
            Self::ScrapeUrl { url } => Ok(ToolOutput::Text(backend.fetch_page(&url).await?)),
            Self::GoogleSearch {
                company_name,
                keywords,
            } => {
                let query = format!("{company_name} {keywords}");
                let hits = backend.search(query.trim(), SEARCH_LIMIT).await?;
                Ok(ToolOutput::Text(serde_json::to_string_pretty(&hits)?))
            }
            Self::GetYoutubeTranscript { url } => {
                let id = youtube_video_id(&url).ok_or_else(|| {
                    SleuthError::InvalidArgument(format!("could not find a video id in {url}"))
                })?;
                Ok(ToolOutput::Text(backend.video_transcript(id).await?))
            }
            Self::GetCrunchbaseFinancials { url } => {
                let page_url = format!("{}/company_financials", url.trim_end_matches('/'));
                let page = backend.fetch_page(&page_url).await?;
                Ok(ToolOutput::Text(trim_financials(&page)?))
            }
            Self::ResearchComplete(findings) => {
                Ok(ToolOutput::Structured(serde_json::to_value(findings)?))
            }
        }
    }
}

/// A [`ResearchTool`] bound to a backend, ready for a [`ToolRegistry`].
pub struct BoundResearchTool {
    tool: ResearchTool,
    name: String,
    parameters: ToolParameters,
    backend: Arc<dyn ResearchBackend>,
}

impl BoundResearchTool {
    pub fn new(tool: ResearchTool, backend: Arc<dyn ResearchBackend>) -> Self {
        Self {
            tool,
            name: tool.to_string(),
            parameters: tool.parameters(),
            backend,
        }
    }
}

#[async_trait]
impl Tool for BoundResearchTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        self.tool.description()
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<ToolOutput, SleuthError> {
        let call = ResearchCall::from_arguments(self.tool, args)?;
        call.execute(self.backend.as_ref())
            .await
            .map_err(|e| SleuthError::tool_execution(&self.name, e.to_string()))
    }
}

impl std::fmt::Debug for BoundResearchTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundResearchTool")
            .field("tool", &self.tool)
            .finish()
    }
}

/// Build a registry holding `tools` bound to `backend`.
pub fn research_registry(
    tools: &[ResearchTool],
    backend: Arc<dyn ResearchBackend>,
) -> Result<ToolRegistry, SleuthError> {
    ToolRegistry::new(
        tools
            .iter()
            .map(|&tool| Arc::new(BoundResearchTool::new(tool, backend.clone())) as Arc<dyn Tool>)
            .collect(),
    )
}
