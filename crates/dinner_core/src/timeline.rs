//! crates/dinner_core/src/timeline.rs
//!
//! Deterministic placeholder timeline, used when a recipe has no authored
//! steps or the timeline lookup fails, so a cooking session can always start.

use crate::domain::TimelineStep;

pub fn placeholder_timeline() -> Vec<TimelineStep> {
    vec![
        TimelineStep {
            order: 1,
            instruction: "Gather and prep all of your ingredients.".to_string(),
            instruction_localized: None,
            estimated_minutes: 10,
            timer_seconds: 0,
            method: "prep".to_string(),
            equipment: "cutting-board".to_string(),
            concurrency_group: Some("prep".to_string()),
            cleanup_hint: Some("Wipe the board down as you go.".to_string()),
            temperature: None,
            completion_cue: None,
            icons: vec!["knife".to_string()],
        },
        TimelineStep {
            order: 2,
            instruction: "Preheat your pan over medium heat.".to_string(),
            instruction_localized: None,
            estimated_minutes: 3,
            timer_seconds: 180,
            method: "heat".to_string(),
            equipment: "skillet".to_string(),
            concurrency_group: Some("prep".to_string()),
            cleanup_hint: None,
            temperature: Some("medium".to_string()),
            completion_cue: Some("A drop of water sizzles on contact.".to_string()),
            icons: vec!["flame".to_string()],
        },
        TimelineStep {
            order: 3,
            instruction: "Cook the main components, stirring occasionally.".to_string(),
            instruction_localized: None,
            estimated_minutes: 15,
            timer_seconds: 900,
            method: "saute".to_string(),
            equipment: "skillet".to_string(),
            concurrency_group: None,
            cleanup_hint: None,
            temperature: Some("medium".to_string()),
            completion_cue: Some("Everything is cooked through.".to_string()),
            icons: vec!["pan".to_string(), "timer".to_string()],
        },
        TimelineStep {
            order: 4,
            instruction: "Plate, garnish and serve.".to_string(),
            instruction_localized: None,
            estimated_minutes: 2,
            timer_seconds: 0,
            method: "plate".to_string(),
            equipment: "plate".to_string(),
            concurrency_group: None,
            cleanup_hint: Some("Soak the pan while you eat.".to_string()),
            temperature: None,
            completion_cue: None,
            icons: vec!["plate".to_string()],
        },
    ]
}
