//! crates/dinner_core/src/intent.rs
//!
//! A keyword-based `IntentParser`. It is the fallback whenever the
//! conversational-AI parser is not configured or fails, so a dinner request
//! always produces some structured intent.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::domain::DinnerIntent;
use crate::ports::{IntentParser, PortResult};

const CUISINES: &[&str] = &[
    "italian",
    "mexican",
    "chinese",
    "indian",
    "thai",
    "japanese",
    "korean",
    "mediterranean",
    "french",
    "american",
];

const DIETS: &[&str] = &["vegetarian", "vegan", "gluten-free", "dairy-free", "keto"];

/// (phrase as a user says it, canonical equipment label)
const EQUIPMENT: &[(&str, &str)] = &[
    ("air fryer", "air-fryer"),
    ("instant pot", "instant-pot"),
    ("pressure cooker", "instant-pot"),
    ("slow cooker", "slow-cooker"),
    ("crock pot", "slow-cooker"),
    ("sheet pan", "sheet-pan"),
    ("grill", "grill"),
    ("oven", "oven"),
];

const QUICK_DEFAULT_MINUTES: u32 = 30;

fn minutes_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,3})\s*-?\s*(?:min|mins|minute|minutes)\b").ok())
        .as_ref()
}

fn avoid_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:no|without|avoid|allergic to)\s+([a-z]+(?:\s+[a-z]+)?)").ok()
    })
    .as_ref()
}

fn use_up_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\buse\s+(?:up\s+)?(?:the\s+|my\s+|some\s+)?([a-z]+)").ok())
        .as_ref()
}

/// Words that follow "no"/"without" but describe a style rather than an ingredient.
const NOT_INGREDIENTS: &[&str] = &["spice", "spicy", "heat", "oil", "fuss", "mess", "time"];

/// Parses natural-language dinner requests with fixed keyword rules.
#[derive(Debug, Clone, Default)]
pub struct KeywordIntentParser;

impl KeywordIntentParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, text: &str) -> DinnerIntent {
        let text = text.to_lowercase();
        let mut intent = DinnerIntent::default();

        intent.max_time_minutes = minutes_regex()
            .and_then(|re| re.captures(&text))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok());
        if intent.max_time_minutes.is_none()
            && ["quick", "fast", "weeknight"].iter().any(|w| text.contains(w))
        {
            intent.max_time_minutes = Some(QUICK_DEFAULT_MINUTES);
        }

        if ["one pot", "one-pot", "one pan", "one-pan", "few dishes"]
            .iter()
            .any(|w| text.contains(w))
        {
            intent.max_cookware = Some(1);
        }

        if ["kid", "family", "picky"].iter().any(|w| text.contains(w)) {
            intent.kid_friendly = Some(true);
        }

        if ["not spicy", "no spice", "mild"].iter().any(|w| text.contains(w)) {
            intent.max_spice_level = Some(1);
        }

        if ["low oil", "less oil", "no oil", "light"].iter().any(|w| text.contains(w)) {
            intent.max_oil_level = Some(1);
        }

        intent.cuisines = CUISINES
            .iter()
            .filter(|c| text.contains(*c))
            .map(|c| c.to_string())
            .collect();

        intent.diet = DIETS
            .iter()
            .filter(|d| text.contains(*d) || text.contains(&d.replace('-', " ")))
            .map(|d| d.to_string())
            .collect();

        for (phrase, label) in EQUIPMENT {
            if text.contains(phrase) && !intent.equipment.iter().any(|e| e == label) {
                intent.equipment.push(label.to_string());
            }
        }

        if let Some(re) = avoid_regex() {
            for caps in re.captures_iter(&text) {
                let Some(m) = caps.get(1) else { continue };
                let phrase = m.as_str().trim();
                let first = phrase.split_whitespace().next().unwrap_or(phrase);
                if NOT_INGREDIENTS.contains(&first) {
                    continue;
                }
                // Keep the second word only when it is not a joining word.
                let item = match phrase.split_once(' ') {
                    Some((head, tail)) if ["and", "or", "please", "tonight"].contains(&tail) => head,
                    _ => phrase,
                };
                intent.avoid.push(item.to_string());
            }
        }

        if let Some(re) = use_up_regex() {
            intent.must_use = re
                .captures_iter(&text)
                .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
                .filter(|w| !["the", "my", "some", "a"].contains(&w.as_str()))
                .collect();
        }

        intent
    }
}

#[async_trait]
impl IntentParser for KeywordIntentParser {
    async fn parse_intent(&self, text: &str) -> PortResult<DinnerIntent> {
        Ok(self.parse(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_time_and_cookware() {
        let intent = KeywordIntentParser::new().parse("Something one-pot in 25 minutes please");
        assert_eq!(intent.max_time_minutes, Some(25));
        assert_eq!(intent.max_cookware, Some(1));
    }

    #[test]
    fn quick_implies_thirty_minutes() {
        let intent = KeywordIntentParser::new().parse("quick dinner for the kids");
        assert_eq!(intent.max_time_minutes, Some(30));
        assert_eq!(intent.kid_friendly, Some(true));
    }

    #[test]
    fn extracts_avoid_and_must_use() {
        let intent = KeywordIntentParser::new()
            .parse("Italian, no mushrooms and use up the spinach. Not spicy.");
        assert_eq!(intent.cuisines, vec!["italian".to_string()]);
        assert_eq!(intent.avoid, vec!["mushrooms".to_string()]);
        assert_eq!(intent.must_use, vec!["spinach".to_string()]);
        assert_eq!(intent.max_spice_level, Some(1));
    }

    #[test]
    fn recognises_equipment_and_diet() {
        let intent = KeywordIntentParser::new().parse("vegetarian air fryer dinner");
        assert_eq!(intent.equipment, vec!["air-fryer".to_string()]);
        assert_eq!(intent.diet, vec!["vegetarian".to_string()]);
    }

    #[test]
    fn empty_text_means_no_constraints() {
        assert_eq!(KeywordIntentParser::new().parse(""), DinnerIntent::default());
    }
}
