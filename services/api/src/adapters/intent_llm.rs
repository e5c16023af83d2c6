//! services/api/src/adapters/intent_llm.rs
//!
//! This module contains the adapter for the intent-parsing LLM.
//! It implements the `IntentParser` port from the `core` crate by asking the
//! model for a JSON object shaped like `DinnerIntent`.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client, error::OpenAIError,
};
use async_trait::async_trait;
use dinner_core::{
    domain::DinnerIntent,
    ports::{IntentParser, PortError, PortResult},
};
use tracing::debug;

const SYSTEM_INSTRUCTIONS: &str = r#"You turn a home cook's dinner request into search filters.

Respond with ONE JSON object and nothing else. Use only these keys, and omit any key the request does not mention:
- "maxTimeMinutes": integer, total time limit
- "maxCookware": integer, most pots/pans the cook will wash
- "kidFriendly": boolean
- "maxSpiceLevel": integer 0-3
- "maxOilLevel": integer 0-3
- "cookTypes": array of strings such as "roast", "stir-fry", "simmer"
- "equipment": array of kebab-case appliances such as "air-fryer", "instant-pot", "sheet-pan"
- "cuisines": array of lowercase cuisines
- "diet": array such as "vegetarian", "vegan", "gluten-free"
- "avoid": array of ingredients that must not appear
- "mustUse": array of ingredients the cook wants to use up
- "servings": integer

Never invent constraints the cook did not ask for."#;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `IntentParser` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiIntentAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiIntentAdapter {
    /// Creates a new `OpenAiIntentAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Pulls the JSON object out of a reply that may be wrapped in a code fence.
fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

fn parse_intent_reply(reply: &str) -> PortResult<DinnerIntent> {
    let json = extract_json_object(reply).ok_or_else(|| {
        PortError::Unexpected("Intent LLM reply contained no JSON object.".to_string())
    })?;
    serde_json::from_str::<DinnerIntent>(json)
        .map_err(|e| PortError::Unexpected(format!("Intent LLM returned malformed JSON: {}", e)))
}

//=========================================================================================
// `IntentParser` Trait Implementation
//=========================================================================================

#[async_trait]
impl IntentParser for OpenAiIntentAdapter {
    async fn parse_intent(&self, text: &str) -> PortResult<DinnerIntent> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(text)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let reply = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Intent LLM response contained no text content.".to_string())
            })?;
        debug!("Intent LLM reply: {}", reply);

        parse_intent_reply(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_reply() {
        let reply = "```json\n{\"maxTimeMinutes\": 30, \"avoid\": [\"peanuts\"]}\n```";
        let intent = parse_intent_reply(reply).unwrap();
        assert_eq!(intent.max_time_minutes, Some(30));
        assert_eq!(intent.avoid, vec!["peanuts".to_string()]);
    }

    #[test]
    fn rejects_reply_without_json() {
        assert!(matches!(
            parse_intent_reply("Sorry, I can't help with that."),
            Err(PortError::Unexpected(_))
        ));
    }
}
