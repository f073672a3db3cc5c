//! Packing checklist prompt construction and defensive parsing of the reply.

use serde_json::{Value, json};

use crate::model::{Advice, AirDaySummary, Checklist, DaySummary, Location};

pub const SYSTEM_PROMPT: &str = "You are a travel assistant. Reply with a single JSON object of the form \
{\"checklist\": [\"item\", ...], \"notes\": \"...\"} and nothing else.";

/// User prompt describing the aggregated trip conditions.
pub fn build_prompt(
    location: &Location,
    days: &[DaySummary],
    advice: &Advice,
    air_days: &[AirDaySummary],
) -> String {
    let context = json!({
        "destination": format!("{}, {}", location.name, location.country),
        "days": days,
        "advice": advice,
        "air_quality": air_days,
    });

    format!(
        "Build a concise packing checklist for this trip. Temperatures are in Celsius, \
         wind in m/s, rain in mm. Mention air-quality precautions in the notes when alerts \
         are present.\n\n{context}"
    )
}

/// Byte range of the balanced `{ ... }` block starting at `start`, if it closes.
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + c.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

/// First well-formed JSON object embedded in `text`.
pub fn first_json_object(text: &str) -> Option<Value> {
    text.match_indices('{').find_map(|(start, _)| {
        let end = balanced_object_end(text, start)?;
        serde_json::from_str::<Value>(&text[start..end])
            .ok()
            .filter(Value::is_object)
    })
}

/// Interpret generated text as a checklist, falling back to raw notes.
pub fn parse_checklist(text: &str) -> Checklist {
    let parsed = first_json_object(text).and_then(|v| serde_json::from_value::<Checklist>(v).ok());

    match parsed {
        Some(checklist) => checklist,
        None => {
            tracing::warn!("text generation reply contained no usable JSON object");
            Checklist {
                checklist: Vec::new(),
                notes: text.trim().to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json_reply() {
        let checklist =
            parse_checklist(r#"{"checklist": ["umbrella", "sweater"], "notes": "cool evenings"}"#);
        assert_eq!(checklist.checklist, vec!["umbrella", "sweater"]);
        assert_eq!(checklist.notes, "cool evenings");
    }

    #[test]
    fn code_fenced_reply_with_commentary() {
        let reply = "Sure! Here is your list:\n```json\n{\n  \"checklist\": [\"sunscreen\"],\n  \"notes\": \"bring {extra} water\"\n}\n```\nHave a nice trip.";
        let checklist = parse_checklist(reply);
        assert_eq!(checklist.checklist, vec!["sunscreen"]);
        assert_eq!(checklist.notes, "bring {extra} water");
    }

    #[test]
    fn skips_broken_candidates_before_valid_one() {
        let reply = r#"Format: {checklist: [...]} then {"checklist": ["hat"], "notes": ""}"#;
        let checklist = parse_checklist(reply);
        assert_eq!(checklist.checklist, vec!["hat"]);
    }

    #[test]
    fn missing_fields_default() {
        let checklist = parse_checklist(r#"{"checklist": ["boots"]}"#);
        assert_eq!(checklist.checklist, vec!["boots"]);
        assert!(checklist.notes.is_empty());
    }

    #[test]
    fn no_json_falls_back_to_raw_notes() {
        let checklist = parse_checklist("  Pack light and bring a raincoat.  ");
        assert!(checklist.checklist.is_empty());
        assert_eq!(checklist.notes, "Pack light and bring a raincoat.");
    }

    #[test]
    fn unterminated_object_falls_back() {
        let reply = r#"{"checklist": ["hat""#;
        let checklist = parse_checklist(reply);
        assert!(checklist.checklist.is_empty());
        assert_eq!(checklist.notes, reply);
    }

    #[test]
    fn wrongly_typed_object_falls_back() {
        let checklist = parse_checklist(r#"{"checklist": "hat"}"#);
        assert!(checklist.checklist.is_empty());
        assert_eq!(checklist.notes, r#"{"checklist": "hat"}"#);
    }

    #[test]
    fn prompt_mentions_destination_and_days() {
        let location = Location {
            lat: 48.85,
            lon: 2.35,
            name: "Paris".into(),
            country: "FR".into(),
        };
        let days = vec![DaySummary::missing("2024-06-01")];
        let advice = crate::advice::packing_advice(&days);
        let prompt = build_prompt(&location, &days, &advice, &[]);

        assert!(prompt.contains("Paris, FR"));
        assert!(prompt.contains("2024-06-01"));
    }
}
