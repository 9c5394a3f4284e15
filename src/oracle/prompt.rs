use serde_json::Value;

use crate::models::{ControlSpec, PillarId, ScanFlavor};

/// Build the assessment prompt for one pillar.
///
/// The `Pillar id:` line is machine-readable and always appears exactly once.
pub fn build_assessment_prompt(pillar: PillarId, controls: &[ControlSpec], context: &Value) -> String {
    let subject = match pillar.flavor() {
        ScanFlavor::WellArchitected => "AWS Well-Architected pillar",
        ScanFlavor::Compliance => "compliance framework",
    };

    let mut prompt = format!(
        "Assess the cloud environment below against the {} \"{}\".\n\n",
        subject,
        pillar.display_name()
    );
    prompt.push_str(&format!("Pillar id: {}\n\n", pillar.as_str()));

    prompt.push_str("**Controls**:\n");
    for control in controls {
        prompt.push_str(&format!("- {} - {}\n", control.control_id, control.control_name));
    }

    let rendered = serde_json::to_string_pretty(context).unwrap_or_else(|_| context.to_string());
    prompt.push_str("\n**Environment context**:\n```json\n");
    prompt.push_str(&rendered);
    prompt.push_str("\n```\n\n");

    prompt.push_str(
        "**Assessment Guidelines**:\n\
        1. Judge every listed control exactly once\n\
        2. Use only the environment context as evidence\n\
        3. A control with no supporting evidence is failed\n\
        4. Give severity and remediation steps for every failed control\n\n\
        **Response Format**:\n\
        Respond with a JSON array only, no explanation:\n\
        ```json\n\
        [\n\
          {\n\
            \"control_id\": \"SEC01\",\n\
            \"control_name\": \"Root account protected with MFA\",\n\
            \"status\": \"failed\",\n\
            \"severity\": \"critical\",\n\
            \"evidence\": {\"root_mfa_enabled\": false},\n\
            \"remediation_steps\": \"Enable MFA on the root account\"\n\
          }\n\
        ]\n\
        ```\n\
        status is \"passed\" or \"failed\". severity is one of critical, high, medium, low.",
    );

    prompt
}
