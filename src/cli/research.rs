//! CLI handlers for `sleuth research` and `sleuth cache`.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use futures::{stream, StreamExt};

use super::{CacheCommands, ResearchArgs};
use crate::agent::{AgentLoop, EpisodeEvent, EpisodeEventSink};
use crate::client;
use crate::config::SleuthConfig;
use crate::error::SleuthError;
use crate::provider::openai::OpenAiClient;
use crate::research::{research_registry, run_company, HttpResearchBackend, ResearchReport, ResearchTool};
use crate::types::{Role, Turn};
use crate::util::cache::ResponseCache;

const DISPLAY_LEN: usize = 400;

/// Run `sleuth research`.
pub async fn handle_research(args: ResearchArgs, config_path: Option<&Path>) -> Result<(), SleuthError> {
    let mut config = SleuthConfig::load_from(config_path)?;
    args.apply_to(&mut config);

    let companies = if args.companies.is_empty() {
        eprintln!("Enter the company urls (preferred) or names one line at a time, then an empty line:");
        read_companies(std::io::stdin().lock())?
    } else {
        args.companies.clone()
    };
    if companies.is_empty() {
        return Err(SleuthError::InvalidArgument("no companies given".into()));
    }
    let keywords = args.clean_keywords();

    let cache = config.open_cache()?;
    let transport = OpenAiClient::new(
        config.require_api_key()?,
        config.base_url.clone(),
        config.request_timeout(),
    )?;
    let model_client = client::compose(transport, config.retry_policy(), None, cache.clone());

    let tools = if args.crunchbase {
        let mut tools = ResearchTool::default_set();
        tools.insert(tools.len() - 1, ResearchTool::GetCrunchbaseFinancials);
        tools
    } else {
        ResearchTool::default_set()
    };
    let backend = Arc::new(HttpResearchBackend::new(config.request_timeout())?);
    let registry = Arc::new(research_registry(&tools, backend)?);

    let mut agent = AgentLoop::new(model_client, registry, config.agent_config())?;
    if !args.quiet {
        agent = agent.with_event_sink(conversation_printer());
    }

    let outcomes: Vec<(String, Result<ResearchReport, SleuthError>)> = stream::iter(companies)
        .map(|company| {
            let agent = &agent;
            let tools = &tools;
            let keywords = &keywords;
            async move {
                let result = run_company(agent, tools, &company, keywords).await;
                (company, result)
            }
        })
        .buffered(args.jobs.max(1))
        .collect()
        .await;

    if let Some(ref cache) = cache {
        cache.flush()?;
        tracing::debug!(stats = ?cache.stats(), "Response cache flushed");
    }

    let total = outcomes.len();
    let mut reports = Vec::with_capacity(total);
    for (company, outcome) in outcomes {
        match outcome {
            Ok(report) => reports.push(report),
            Err(err) => {
                tracing::error!(company = %company, error = %err, "Research failed");
                eprintln!(
                    "Research for {company} failed: {err} (hint: {})",
                    err.recovery_suggestion().hint()
                );
            }
        }
    }

    let rendered = serde_json::to_string_pretty(&reports)?;
    println!("{rendered}");
    if let Some(ref output) = args.output {
        std::fs::write(output, &rendered)?;
    }

    let failed = total - reports.len();
    if failed > 0 {
        return Err(SleuthError::InvalidState(format!(
            "{failed} of {total} companies failed"
        )));
    }
    Ok(())
}

/// Run `sleuth cache <command>`.
pub fn handle_cache(command: CacheCommands, config_path: Option<&Path>) -> Result<(), SleuthError> {
    let config = SleuthConfig::load_from(config_path)?;
    let path = config
        .cache_path()
        .ok_or_else(|| SleuthError::Configuration("no cache location available".into()))?;
    let cache = ResponseCache::open(&path, None, None)?;

    match command {
        CacheCommands::Stats => {
            println!("path: {}", path.display());
            println!("entries: {}", cache.len());
        }
        CacheCommands::Clear => {
            let removed = cache.len();
            cache.clear();
            cache.flush()?;
            println!("removed {removed} entries from {}", path.display());
        }
    }
    Ok(())
}

/// Read names one per line until an empty line or end of input.
pub fn read_companies<R: BufRead>(reader: R) -> Result<Vec<String>, SleuthError> {
    let mut companies = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if name.is_empty() {
            break;
        }
        companies.push(name.to_string());
    }
    Ok(companies)
}

fn conversation_printer() -> EpisodeEventSink {
    Arc::new(|event: EpisodeEvent| {
        if let EpisodeEvent::TurnAppended { turn, .. } = event {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}\n", render_turn(&turn));
        }
    })
}

/// One turn as shown in the terminal, long content truncated.
pub fn render_turn(turn: &Turn) -> String {
    let content = truncate(&turn.display_text(), DISPLAY_LEN);
    match turn.role {
        Role::ToolResult => format!(
            "Function {}:\n{content}",
            turn.tool_name.as_deref().unwrap_or_default()
        ),
        role => format!("{role}:\n{content}"),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
