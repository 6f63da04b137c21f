//! The system prompt steering the agent, and memory splicing.

use crate::recall::MemoryRecord;

pub const SYSTEM_PROMPT: &str = "\
You are a production-grade assistant.

Tool-use policy:
- Use tools whenever the user asks for calculations, counting/analysis of text, dates, or live weather.
- Never guess tool outputs. Prefer tool results over assumptions.
- If a task needs multiple steps, call tools in sequence (e.g., calculate then date_offset).
- Always format tool inputs exactly as the tool schema expects (correct argument names and types).
- If a tool returns an error, explain it briefly and ask for the missing or corrected input.

Weather interpretation (current_weather tool output):
- Read weather from the `current` object.
- Use: temperature, feelslike, weather_descriptions, wind_speed, humidity.
- Provide clothing advice based on these values (light clothes if hot; jacket if cool; rain protection if the description suggests rain).

Response rules:
- Produce one final human-friendly answer.
- Include key computed/fetched values (numbers/dates/weather) in the final answer.
- Do not mention internal scratchpad or tool JSON.";

/// Splice remembered snippets into the system prompt for one turn.
pub fn compose(base: &str, records: &[MemoryRecord]) -> String {
    if records.is_empty() {
        return base.to_string();
    }

    let mut prompt = String::with_capacity(base.len() + 128);
    prompt.push_str(base);
    prompt.push_str("\n\nWhat you remember about this user from earlier conversations:\n");
    for record in records {
        prompt.push_str("- ");
        prompt.push_str(&record.memory);
        prompt.push('\n');
    }
    prompt.push_str("Use these memories when relevant; do not invent memories.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_records_prompt_is_unchanged() {
        assert_eq!(compose(SYSTEM_PROMPT, &[]), SYSTEM_PROMPT);
    }

    #[test]
    fn records_are_spliced_in() {
        let records = vec![
            MemoryRecord {
                id: "1".into(),
                memory: "Lives in Gurugram".into(),
            },
            MemoryRecord {
                id: "2".into(),
                memory: "Prefers metric units".into(),
            },
        ];
        let prompt = compose(SYSTEM_PROMPT, &records);
        assert!(prompt.contains("- Lives in Gurugram"));
        assert!(prompt.contains("- Prefers metric units"));
        assert!(prompt.starts_with(SYSTEM_PROMPT));
    }
}
