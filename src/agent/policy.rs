//! Forced-completion policy.

/// Directive for the next model call: the completion tool once the step
/// budget is spent, otherwise nothing.
pub fn forced_tool(steps_taken: usize, max_steps: usize, completion_tool: &str) -> Option<String> {
    (steps_taken >= max_steps).then(|| completion_tool.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_forced_below_budget() {
        assert_eq!(forced_tool(0, 3, "Done"), None);
        assert_eq!(forced_tool(2, 3, "Done"), None);
    }

    #[test]
    fn forced_exactly_at_budget() {
        assert_eq!(forced_tool(3, 3, "Done").as_deref(), Some("Done"));
    }

    #[test]
    fn forced_past_budget_and_at_zero() {
        assert_eq!(forced_tool(7, 3, "Done").as_deref(), Some("Done"));
        assert_eq!(forced_tool(0, 0, "Done").as_deref(), Some("Done"));
    }
}
