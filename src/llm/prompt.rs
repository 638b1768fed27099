// File: ./src/llm/prompt.rs
// Prompt templates for the three extraction modes.
use super::Prompt;

const ENTRY_SCHEMA: &str = r#"{
    "host": string,
    "day": "sunday" | "monday" | "tuesday" | "wednesday" | "thursday" | "friday" | "saturday" (any casing),
    "start_time": "HH:mm AM/PM" (convert times to this format),
    "end_time": "HH:mm AM/PM" (convert times to this format),
    "location": string,
    "link": string
}"#;

const FIELD_RULES: &str = "Location must be uppercase letters followed by digits (e.g. MALA5200); use \"INVALID\" when it is not given in that form.
At least one of link or location must be present. When only one is given, set the other to \"\". When neither is given, set both to \"INVALID\".
Keep missing or malformed values as \"INVALID\" rather than dropping the entry. Extract as much as possible; an empty answer should be rare.";

fn raw_data(raw: &str) -> String {
    format!("Raw Data: {raw}")
}

/// One JSON object per line, emitted as the model writes it.
pub fn stream_prompt(raw: &str) -> Prompt {
    let system = format!(
        "Parse the given data into JSONL (one object per line, no backtick fences) with this schema:\n{ENTRY_SCHEMA}\n{FIELD_RULES}\nReturn only valid JSON. Return an empty {{}} if there is no information."
    );
    Prompt::new(system, raw_data(raw))
}

/// A single JSON array of entries.
pub fn batch_prompt(raw: &str) -> Prompt {
    let system = format!(
        "Parse the given data into a list of objects with this schema:\n{ENTRY_SCHEMA}\n{FIELD_RULES}\nReturn only a valid JSON array."
    );
    Prompt::new(system, raw_data(raw))
}

/// Human readable markdown for previewing pasted text.
pub fn markdown_prompt(raw: &str) -> Prompt {
    let system = format!(
        "Parse the given data into formatted markdown of office hours, looking for these fields:\n{ENTRY_SCHEMA}\nThe host is the full name of the person holding the hours.\nLook for a table header. If it carries default values, apply them to every row.\nFormat the markdown to be as readable as possible and output only the markdown."
    );
    Prompt::new(system, raw_data(raw))
}
