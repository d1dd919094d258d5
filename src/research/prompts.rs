//! Prompts for company research episodes.

use serde_json::json;

use super::tools::ResearchTool;

/// System prompt listing the advertised tools and how to use them.
pub fn system_prompt(tools: &[ResearchTool]) -> String {
    let names: Vec<String> = tools.iter().map(ToString::to_string).collect();
    format!(
        r#"# CompetitiveAnalysis
Interaction {{
    Search and scrape information about a company to do competitive analysis
}}
Functions {{
    {names:?}
}}
Constraints {{
    Always call one of the provided functions
    Aim for the fewest steps possible, do not call any unnecessary functions
    Try to fill out everything in ResearchComplete, but add remaining tasks if you cannot
    Use crunchbase for fundraising details if you cannot find it on the company website
    Scrape the company website for other info
    Search more if the answer is not complete
    Leave strings empty if you cannot find the answer
    If the company looks like a URL, try scraping it first
}}
Workflow {{
    1. Receive a company name or company URL from the user, with any additional keywords to help your search
    2. Browse the company website to find the product offering, features and founding date
    3. Optionally: find the company's investors and founding date if you didn't find them earlier
    4. When done, return the result with the ResearchComplete function
}}
"#
    )
}

/// User turn for one company: `{"company_name": ..., "keywords": [...]}`.
pub fn user_prompt(company_name: &str, keywords: &[String]) -> String {
    json!({ "company_name": company_name, "keywords": keywords }).to_string()
}
