//! crates/dinner_core/src/ranking.rs
//!
//! The recipe ranking engine. Hard filters derived from a `DinnerIntent` narrow
//! the pool, then every survivor is scored as a weighted sum of independent,
//! normalised factors. The result is a pure function of its inputs.

use std::time::Instant;

use crate::domain::{DinnerIntent, Recipe, SearchContext, SearchOutcome, SuggestionCard};

pub const DEFAULT_LIMIT: usize = 10;

/// Cookware counts at or above this earn nothing from the cookware factor.
pub const MAX_CONSIDERED_COOKWARE: u32 = 4;

/// Recipes at or under this many minutes get the full time-fit reward.
pub const QUICK_MINUTES: u32 = 30;

const W_COOKWARE: f64 = 2.0;
const W_PANTRY: f64 = 3.0;
const W_TIME: f64 = 2.0;
const W_FAMILY: f64 = 1.0;
const W_LEFTOVER_POTENTIAL: f64 = 1.0;
const W_EQUIPMENT: f64 = 1.5;
const W_LEFTOVER_REUSE: f64 = 1.5;

const PREFERRED_APPLIANCE_MATCH: f64 = 1.0;
const CONVENIENT_APPLIANCE_MATCH: f64 = 0.4;

const CONVENIENT_APPLIANCES: &[&str] = &[
    "sheet-pan",
    "air-fryer",
    "instant-pot",
    "slow-cooker",
    "one-pot",
];

const MEAL_PREP_TAG: &str = "meal-prep";

//=========================================================================================
// Name Matching
//=========================================================================================

/// Case-insensitive containment in either direction, so "chicken" matches
/// "chicken breast" and vice versa. Blank names never match.
pub fn names_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

fn any_name_matches(name: &str, candidates: &[String]) -> bool {
    candidates.iter().any(|c| names_match(name, c))
}

fn normalise_label(label: &str) -> String {
    label.trim().to_lowercase().replace([' ', '_'], "-")
}

fn labels_equal(a: &str, b: &str) -> bool {
    normalise_label(a) == normalise_label(b)
}

/// True when `wanted` is empty or shares at least one label with `have`.
fn overlaps<'a>(wanted: &[String], have: impl IntoIterator<Item = &'a String> + Clone) -> bool {
    wanted.is_empty()
        || wanted
            .iter()
            .any(|w| have.clone().into_iter().any(|h| labels_equal(w, h)))
}

//=========================================================================================
// Hard Filters
//=========================================================================================

/// Applies every constraint the intent carries. Absent constraints always pass.
pub fn passes_filters(recipe: &Recipe, intent: &DinnerIntent) -> bool {
    if let Some(max) = intent.max_time_minutes {
        if recipe.total_time_minutes > max {
            return false;
        }
    }
    if let Some(max) = intent.max_cookware {
        if recipe.cookware_count > max {
            return false;
        }
    }
    if intent.kid_friendly == Some(true) && !recipe.kid_friendly {
        return false;
    }
    if let Some(max) = intent.max_spice_level {
        if recipe.spice_level > max {
            return false;
        }
    }
    if let Some(max) = intent.max_oil_level {
        if recipe.oil_level > max {
            return false;
        }
    }
    if !overlaps(&intent.cook_types, recipe.cook_type.iter()) {
        return false;
    }
    if !overlaps(&intent.equipment, recipe.equipment.iter()) {
        return false;
    }
    if !overlaps(&intent.cuisines, recipe.cuisine.iter()) {
        return false;
    }
    if !intent
        .diet
        .iter()
        .all(|d| recipe.diet_tags.iter().any(|t| labels_equal(d, t)))
    {
        return false;
    }
    !contains_avoided(recipe, intent)
}

fn contains_avoided(recipe: &Recipe, intent: &DinnerIntent) -> bool {
    recipe
        .ingredients
        .iter()
        .any(|ingredient| any_name_matches(&ingredient.name, &intent.avoid))
}

//=========================================================================================
// Scoring
//=========================================================================================

struct PantryCoverage {
    fraction: f64,
    substitutions: Vec<String>,
}

fn pantry_coverage(recipe: &Recipe, intent: &DinnerIntent, pantry: &[String]) -> PantryCoverage {
    let mut total = 0.0;
    let mut covered = 0.0;
    let mut substitutions = Vec::new();

    for ingredient in recipe.required_ingredients() {
        let weight = if any_name_matches(&ingredient.name, &intent.must_use) {
            2.0
        } else {
            1.0
        };
        total += weight;

        if any_name_matches(&ingredient.name, pantry) {
            covered += weight;
        } else if let Some(sub) = ingredient
            .substitutes
            .iter()
            .find(|sub| !any_name_matches(sub, &intent.avoid) && any_name_matches(sub, pantry))
        {
            covered += weight;
            substitutions.push(format!("{} -> {}", ingredient.name, sub));
        }
    }

    let fraction = if total > 0.0 { covered / total } else { 0.0 };
    PantryCoverage {
        fraction,
        substitutions,
    }
}

fn time_fit(total_minutes: u32) -> f64 {
    if total_minutes <= QUICK_MINUTES {
        1.0
    } else {
        f64::from(QUICK_MINUTES) / f64::from(total_minutes)
    }
}

fn leftover_potential(recipe: &Recipe) -> &'static str {
    if recipe.has_tag(MEAL_PREP_TAG) {
        "high"
    } else if recipe.servings >= 4 {
        "medium"
    } else {
        "low"
    }
}

/// Scores one recipe that already passed the hard filters.
pub fn score_recipe(recipe: &Recipe, intent: &DinnerIntent, context: &SearchContext) -> SuggestionCard {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    let cookware = recipe.cookware_count.min(MAX_CONSIDERED_COOKWARE);
    score += W_COOKWARE * f64::from(MAX_CONSIDERED_COOKWARE - cookware)
        / f64::from(MAX_CONSIDERED_COOKWARE);
    if recipe.cookware_count <= 1 {
        reasons.push("one-pot".to_string());
    }

    let coverage = pantry_coverage(recipe, intent, &context.pantry_snapshot);
    score += W_PANTRY * coverage.fraction;
    if coverage.fraction >= 0.5 {
        reasons.push("uses-pantry".to_string());
    }

    score += W_TIME * time_fit(recipe.total_time_minutes);
    if recipe.total_time_minutes <= QUICK_MINUTES {
        reasons.push("quick".to_string());
    }

    if intent.kid_friendly == Some(true) && recipe.kid_friendly {
        score += W_FAMILY;
        reasons.push("kid-friendly".to_string());
    }

    if recipe.has_tag(MEAL_PREP_TAG) {
        score += W_LEFTOVER_POTENTIAL;
        reasons.push(MEAL_PREP_TAG.to_string());
    }

    let preferred = context
        .preferred_appliance
        .as_deref()
        .filter(|p| recipe.equipment.iter().any(|e| labels_equal(e, p)));
    if let Some(appliance) = preferred {
        score += W_EQUIPMENT * PREFERRED_APPLIANCE_MATCH;
        reasons.push(format!("uses-{}", normalise_label(appliance)));
    } else if recipe
        .equipment
        .iter()
        .any(|e| CONVENIENT_APPLIANCES.iter().any(|c| labels_equal(e, c)))
    {
        score += W_EQUIPMENT * CONVENIENT_APPLIANCE_MATCH;
        reasons.push("easy-equipment".to_string());
    }

    let reuses_leftover = context.leftovers.iter().any(|leftover| {
        recipe
            .required_ingredients()
            .any(|ingredient| names_match(&leftover.name, &ingredient.name))
    });
    if reuses_leftover {
        score += W_LEFTOVER_REUSE;
        reasons.push("uses-leftovers".to_string());
    }

    SuggestionCard {
        recipe_id: recipe.id.clone(),
        title: recipe.title.clone(),
        image_url: recipe.image_url.clone(),
        total_time_minutes: recipe.total_time_minutes,
        cookware_count: recipe.cookware_count,
        servings: recipe.servings,
        tags: recipe.tags.clone(),
        kid_friendly: recipe.kid_friendly,
        equipment: recipe.equipment.clone(),
        substitutions: coverage.substitutions,
        leftover_potential: leftover_potential(recipe).to_string(),
        nutrition: recipe.nutrition.clone(),
        score: (score * 1000.0).round() / 1000.0,
        rank_reasons: reasons,
    }
}

//=========================================================================================
// Search
//=========================================================================================

/// Filters, scores and orders `recipes`, returning at most `context.limit` cards.
///
/// Ties keep the order recipes were supplied in. An empty pool after filtering
/// yields an empty candidate list; relaxing filters is the caller's decision.
pub fn search(recipes: &[Recipe], intent: &DinnerIntent, context: &SearchContext) -> SearchOutcome {
    let started = Instant::now();
    let limit = match context.limit {
        Some(0) | None => DEFAULT_LIMIT,
        Some(n) => n,
    };

    let mut candidates: Vec<SuggestionCard> = recipes
        .iter()
        .filter(|recipe| passes_filters(recipe, intent))
        .map(|recipe| score_recipe(recipe, intent, context))
        .collect();

    // `sort_by` is stable, which gives the fetch-order tie-break.
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(limit);

    SearchOutcome {
        candidates,
        decision_time_ms: started.elapsed().as_millis() as u64,
    }
}
