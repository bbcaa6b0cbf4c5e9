//! Action plan CLI command

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;
use std::path::Path;
use tabled::Tabled;

use crate::client::{ApiClient, AskRequest, AskResponse};
use crate::output::{
    color_confidence, format_timestamp, print_info, print_json, print_table, print_warning,
    OutputFormat,
};

#[derive(Tabled)]
struct TriageRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Assessment")]
    assessment: String,
    #[tabled(rename = "Note")]
    note: String,
}

#[derive(Tabled)]
struct AgentRow {
    #[tabled(rename = "Agent")]
    agent: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Reasoning")]
    reasoning: String,
}

/// Read an observation file, accepting either a bare observation or an
/// `{"observation": ...}` envelope
pub fn read_request(path: &Path) -> Result<AskRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let observation = match value {
        Value::Object(mut map) if map.contains_key("observation") => map
            .remove("observation")
            .unwrap_or(Value::Null),
        other => other,
    };
    if !observation.is_object() {
        anyhow::bail!("{} does not contain an observation object", path.display());
    }
    Ok(AskRequest { observation })
}

/// Ask the agents for an action plan
pub async fn ask(client: &ApiClient, file: &Path, format: OutputFormat) -> Result<()> {
    let request = read_request(file)?;
    let response: AskResponse = client.post("api/v1/agents/ask", &request).await?;

    if let OutputFormat::Json = format {
        return print_json(&response);
    }

    let plan = &response.action_plan;
    println!("{}", "Action Plan".bold());
    println!("{}", "=".repeat(60));
    println!("Generated:  {}", format_timestamp(&response.created_at));
    println!("Confidence: {}", color_confidence(plan.confidence));
    println!();

    println!("{}", "Staffing".bold());
    println!("{}", "-".repeat(60));
    println!("Doctors: {}", plan.recommended_staffing.doctors);
    println!("Nurses:  {}", plan.recommended_staffing.nurses);
    println!();

    println!("{}", "Supplies".bold());
    println!("{}", "-".repeat(60));
    println!("Beds:   {}", plan.recommended_supplies.beds);
    println!("Oxygen: {} L", plan.recommended_supplies.oxygen_liters);
    println!();

    println!("{}", "Public Messages".bold());
    println!("{}", "-".repeat(60));
    if plan.messages_for_public.is_empty() {
        print_info("No public advisories");
    }
    for message in &plan.messages_for_public {
        println!("• {}", message);
    }
    println!();

    println!("{}", "Triage Suggestions".bold());
    println!("{}", "-".repeat(60));
    print_table(
        plan.suggested_triage_templates
            .iter()
            .map(|t| TriageRow {
                code: t.code.clone(),
                priority: t.priority.clone(),
                assessment: t.suggested_assessment.clone(),
                note: t.note.clone(),
            })
            .collect(),
    );
    if let Some(disclaimer) = plan
        .evidence
        .iter()
        .find(|e| e.source == "triage_agent")
        .and_then(|e| e.data.get("disclaimer"))
        .and_then(Value::as_str)
    {
        print_warning(disclaimer);
    }
    println!();

    println!("{}", "Agents".bold());
    println!("{}", "-".repeat(60));
    print_table(
        plan.agent_actions
            .iter()
            .map(|a| AgentRow {
                agent: a.agent_type.clone(),
                confidence: color_confidence(a.confidence),
                reasoning: a.reasoning_trace.join("\n"),
            })
            .collect(),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_bare_observation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"hospital_id": "general", "environmental_context": {{"aqi": 120}}}}"#)
            .unwrap();

        let request = read_request(file.path()).unwrap();
        assert_eq!(request.observation["hospital_id"], "general");
    }

    #[test]
    fn test_read_wrapped_observation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"observation": {{"hospital_id": "general"}}}}"#).unwrap();

        let request = read_request(file.path()).unwrap();
        assert_eq!(request.observation["hospital_id"], "general");
    }

    #[test]
    fn test_rejects_non_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();
        assert!(read_request(file.path()).is_err());
    }
}
