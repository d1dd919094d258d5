//! Company research: the toolset, its backend and a per-company runner.

pub mod backend;
pub mod profile;
pub mod prompts;
pub mod tools;

pub use backend::{HttpResearchBackend, ResearchBackend, SearchHit};
pub use profile::{CompanyProfile, ResearchFindings, ResearchReport};
pub use tools::{research_registry, BoundResearchTool, ResearchCall, ResearchTool};

use tracing::info;

use crate::agent::AgentLoop;
use crate::error::SleuthError;
use crate::provider::ModelClient;

/// Research one company to completion.
///
/// The loop's registry must hold `tools`; they are only used to render the
/// system prompt.
pub async fn run_company<C: ModelClient>(
    agent: &AgentLoop<C>,
    tools: &[ResearchTool],
    company_name: &str,
    keywords: &[String],
) -> Result<ResearchReport, SleuthError> {
    info!(company = company_name, "Researching company");
    let episode = agent
        .run(
            prompts::system_prompt(tools),
            prompts::user_prompt(company_name, keywords),
        )
        .await?;
    Ok(ResearchReport::from_episode(company_name, &episode))
}
