//! Reusable structured response schemas for common audio intelligence tasks.
//!
//! Each type pairs a serde model (for parsing structured responses) with a
//! Gemini-format response schema that steers the model toward that shape.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A follow-up task discovered in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItem {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

/// Key entity referenced in the audio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMention {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Highlights for a single speaker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerInsight {
    pub speaker: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
}

/// Overall emotional tone of the audio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSnapshot {
    pub overall: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supporting_evidence: Option<String>,
}

/// Combined view of the most common audio intelligence signals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioInsights {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
    #[serde(default)]
    pub speakers: Vec<SpeakerInsight>,
    #[serde(default)]
    pub entities: Vec<EntityMention>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentSnapshot>,
}

/// Named schemas that can be requested by CLI users and library callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownSchema {
    AudioInsights,
    ActionItems,
    SpeakerSummary,
}

impl KnownSchema {
    pub const ALL: &'static [KnownSchema] = &[
        KnownSchema::AudioInsights,
        KnownSchema::ActionItems,
        KnownSchema::SpeakerSummary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            KnownSchema::AudioInsights => "audio_insights",
            KnownSchema::ActionItems => "action_items",
            KnownSchema::SpeakerSummary => "speaker_summary",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|schema| schema.name() == name)
    }

    /// The Gemini response schema for this shape
    pub fn response_schema(&self) -> Value {
        match self {
            KnownSchema::AudioInsights => audio_insights_schema(),
            KnownSchema::ActionItems => json!({
                "type": "OBJECT",
                "properties": {
                    "action_items": array_of(action_item_schema()),
                },
                "required": ["action_items"],
            }),
            KnownSchema::SpeakerSummary => json!({
                "type": "OBJECT",
                "properties": {
                    "speakers": array_of(speaker_insight_schema()),
                },
                "required": ["speakers"],
            }),
        }
    }
}

fn string_prop(description: &str) -> Value {
    json!({"type": "STRING", "description": description})
}

fn array_of(items: Value) -> Value {
    json!({"type": "ARRAY", "items": items})
}

fn action_item_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "description": string_prop("Plain-language description of the action item"),
            "owner": string_prop("Person or team responsible, if mentioned"),
            "due_date": string_prop("Due date as stated, ISO-8601 where possible"),
            "priority": string_prop("Priority label such as high, medium, or low"),
        },
        "required": ["description"],
    })
}

fn entity_mention_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": string_prop("Canonical name or label for the entity"),
            "type": string_prop("Entity type such as person, company, product, or metric"),
            "context": string_prop("How the entity was referenced in the audio"),
        },
        "required": ["name"],
    })
}

fn speaker_insight_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "speaker": string_prop("Name or label associated with the speaker"),
            "highlights": array_of(string_prop("Key point discussed by this speaker")),
            "sentiment": string_prop("Overall sentiment expressed by the speaker"),
        },
        "required": ["speaker"],
    })
}

fn sentiment_snapshot_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "overall": string_prop("Overall sentiment such as positive, neutral, or negative"),
            "confidence": string_prop("Justification for the sentiment classification"),
            "supporting_evidence": string_prop("Quotes or paraphrased evidence"),
        },
        "required": ["overall"],
    })
}

fn audio_insights_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": string_prop("Brief summary of the main outcome of the audio"),
            "key_points": array_of(string_prop("An important discussion point")),
            "action_items": array_of(action_item_schema()),
            "speakers": array_of(speaker_insight_schema()),
            "entities": array_of(entity_mention_schema()),
            "sentiment": sentiment_snapshot_schema(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        assert_eq!(
            KnownSchema::from_name("audio_insights"),
            Some(KnownSchema::AudioInsights)
        );
        assert_eq!(
            KnownSchema::from_name("action_items"),
            Some(KnownSchema::ActionItems)
        );
        assert_eq!(
            KnownSchema::from_name("speaker_summary"),
            Some(KnownSchema::SpeakerSummary)
        );
        assert_eq!(KnownSchema::from_name("unknown"), None);
    }

    #[test]
    fn test_names_round_trip() {
        for schema in KnownSchema::ALL {
            assert_eq!(KnownSchema::from_name(schema.name()), Some(*schema));
        }
    }

    #[test]
    fn test_action_items_schema_shape() {
        let schema = KnownSchema::ActionItems.response_schema();
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["properties"]["action_items"]["type"], "ARRAY");
        let item = &schema["properties"]["action_items"]["items"];
        assert_eq!(item["required"][0], "description");
        assert!(item["properties"].get("owner").is_some());
    }

    #[test]
    fn test_audio_insights_schema_shape() {
        let schema = KnownSchema::AudioInsights.response_schema();
        for key in ["summary", "key_points", "action_items", "speakers", "entities", "sentiment"] {
            assert!(schema["properties"].get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_parse_audio_insights_response() {
        let raw = serde_json::json!({
            "summary": "Quarterly planning call",
            "key_points": ["Budget approved"],
            "action_items": [
                {"description": "Send the deck", "owner": "Ana"}
            ],
            "speakers": [
                {"speaker": "Ana", "highlights": ["Owns the budget"], "sentiment": "positive"}
            ],
            "entities": [
                {"name": "Q3 budget", "type": "metric"}
            ],
            "sentiment": {"overall": "positive"}
        });

        let insights: AudioInsights = serde_json::from_value(raw).unwrap();
        assert_eq!(insights.summary.as_deref(), Some("Quarterly planning call"));
        assert_eq!(insights.action_items[0].owner.as_deref(), Some("Ana"));
        assert_eq!(insights.entities[0].entity_type.as_deref(), Some("metric"));
    }

    #[test]
    fn test_parse_tolerates_missing_optionals() {
        let insights: AudioInsights = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(insights.summary.is_none());
        assert!(insights.key_points.is_empty());
    }
}
