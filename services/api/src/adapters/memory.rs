//! services/api/src/adapters/memory.rs
//!
//! An in-memory implementation of the `RecipeCatalog` port. It is seeded with
//! a small mock recipe set and serves as the catalog whenever no database is
//! configured, and in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use dinner_core::domain::{Ingredient, Leftover, Nutrition, Recipe, TimelineStep};
use dinner_core::ports::{PortError, PortResult, RecipeCatalog};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    recipes: Vec<Recipe>,
    timelines: HashMap<String, Vec<TimelineStep>>,
    pantries: HashMap<String, Vec<String>>,
    leftovers: HashMap<String, Vec<Leftover>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recipes(mut self, recipes: Vec<Recipe>) -> Self {
        self.recipes = recipes;
        self
    }

    pub fn with_timeline(mut self, recipe_id: &str, steps: Vec<TimelineStep>) -> Self {
        self.timelines.insert(recipe_id.to_string(), steps);
        self
    }

    pub fn with_pantry(mut self, user_id: &str, items: Vec<String>) -> Self {
        self.pantries.insert(user_id.to_string(), items);
        self
    }

    pub fn with_leftovers(mut self, user_id: &str, leftovers: Vec<Leftover>) -> Self {
        self.leftovers.insert(user_id.to_string(), leftovers);
        self
    }

    /// The mock data set the service starts with when no database is configured.
    pub fn seeded() -> Self {
        Self::new()
            .with_recipes(seed_recipes())
            .with_timeline("sheet-pan-chicken", sheet_pan_chicken_timeline())
    }
}

//=========================================================================================
// `RecipeCatalog` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecipeCatalog for InMemoryCatalog {
    async fn list_recipes(&self) -> PortResult<Vec<Recipe>> {
        Ok(self.recipes.clone())
    }

    async fn timeline(&self, recipe_id: &str) -> PortResult<Vec<TimelineStep>> {
        if !self.recipes.iter().any(|r| r.id == recipe_id) && !self.timelines.contains_key(recipe_id) {
            return Err(PortError::NotFound(format!("Recipe {} not found", recipe_id)));
        }
        Ok(self.timelines.get(recipe_id).cloned().unwrap_or_default())
    }

    async fn pantry(&self, user_id: &str) -> PortResult<Vec<String>> {
        Ok(self.pantries.get(user_id).cloned().unwrap_or_default())
    }

    async fn leftovers(&self, user_id: &str) -> PortResult<Vec<Leftover>> {
        Ok(self.leftovers.get(user_id).cloned().unwrap_or_default())
    }
}

//=========================================================================================
// Mock Data
//=========================================================================================

fn ingredients(names: &[&str]) -> Vec<Ingredient> {
    names.iter().map(|n| Ingredient::required(n)).collect()
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn seed_recipes() -> Vec<Recipe> {
    vec![
        Recipe {
            id: "sheet-pan-chicken".to_string(),
            title: "Sheet-Pan Lemon Chicken & Veggies".to_string(),
            image_url: Some("/media/sheet-pan-chicken.jpg".to_string()),
            total_time_minutes: 35,
            cookware_count: 1,
            servings: 4,
            tags: tags(&["meal-prep", "weeknight"]),
            cuisine: Some("american".to_string()),
            cook_type: Some("roast".to_string()),
            equipment: tags(&["sheet-pan", "oven"]),
            kid_friendly: true,
            spice_level: 0,
            oil_level: 2,
            diet_tags: tags(&["gluten-free", "dairy-free"]),
            ingredients: ingredients(&["chicken thighs", "broccoli", "lemon", "olive oil"]),
            nutrition: Some(Nutrition {
                calories: 480,
                protein_g: 38.0,
                carbs_g: 14.0,
                fat_g: 28.0,
            }),
            is_golden: true,
        },
        Recipe {
            id: "one-pot-pasta".to_string(),
            title: "One-Pot Tomato Basil Pasta".to_string(),
            image_url: Some("/media/one-pot-pasta.jpg".to_string()),
            total_time_minutes: 25,
            cookware_count: 1,
            servings: 4,
            tags: tags(&["weeknight"]),
            cuisine: Some("italian".to_string()),
            cook_type: Some("boil".to_string()),
            equipment: tags(&["one-pot"]),
            kid_friendly: true,
            spice_level: 0,
            oil_level: 1,
            diet_tags: tags(&["vegetarian"]),
            ingredients: vec![
                Ingredient::required("spaghetti"),
                Ingredient::required("canned tomatoes"),
                Ingredient {
                    name: "parmesan".to_string(),
                    optional: true,
                    substitutes: Vec::new(),
                },
                Ingredient {
                    name: "fresh basil".to_string(),
                    optional: false,
                    substitutes: tags(&["dried basil", "spinach"]),
                },
            ],
            nutrition: Some(Nutrition {
                calories: 520,
                protein_g: 17.0,
                carbs_g: 88.0,
                fat_g: 11.0,
            }),
            is_golden: true,
        },
        Recipe {
            id: "beef-tacos".to_string(),
            title: "Weeknight Beef Tacos".to_string(),
            image_url: None,
            total_time_minutes: 20,
            cookware_count: 2,
            servings: 4,
            tags: tags(&["weeknight"]),
            cuisine: Some("mexican".to_string()),
            cook_type: Some("saute".to_string()),
            equipment: tags(&["skillet"]),
            kid_friendly: true,
            spice_level: 2,
            oil_level: 1,
            diet_tags: Vec::new(),
            ingredients: ingredients(&["ground beef", "tortillas", "cheddar", "lettuce"]),
            nutrition: None,
            is_golden: false,
        },
        Recipe {
            id: "thai-green-curry".to_string(),
            title: "Thai Green Curry with Tofu".to_string(),
            image_url: None,
            total_time_minutes: 40,
            cookware_count: 2,
            servings: 4,
            tags: tags(&["meal-prep"]),
            cuisine: Some("thai".to_string()),
            cook_type: Some("simmer".to_string()),
            equipment: tags(&["pot", "rice-cooker"]),
            kid_friendly: false,
            spice_level: 3,
            oil_level: 2,
            diet_tags: tags(&["vegan", "vegetarian"]),
            ingredients: ingredients(&["tofu", "coconut milk", "green curry paste", "rice"]),
            nutrition: None,
            is_golden: false,
        },
        Recipe {
            id: "air-fryer-salmon".to_string(),
            title: "Air-Fryer Honey Garlic Salmon".to_string(),
            image_url: None,
            total_time_minutes: 15,
            cookware_count: 1,
            servings: 2,
            tags: tags(&["weeknight"]),
            cuisine: Some("american".to_string()),
            cook_type: Some("air-fry".to_string()),
            equipment: tags(&["air-fryer"]),
            kid_friendly: false,
            spice_level: 0,
            oil_level: 0,
            diet_tags: tags(&["gluten-free"]),
            ingredients: ingredients(&["salmon", "honey", "garlic", "soy sauce"]),
            nutrition: None,
            is_golden: false,
        },
        Recipe {
            id: "fried-rice".to_string(),
            title: "Leftover Fried Rice".to_string(),
            image_url: None,
            total_time_minutes: 15,
            cookware_count: 1,
            servings: 2,
            tags: tags(&["weeknight", "use-it-up"]),
            cuisine: Some("chinese".to_string()),
            cook_type: Some("stir-fry".to_string()),
            equipment: tags(&["wok"]),
            kid_friendly: true,
            spice_level: 1,
            oil_level: 2,
            diet_tags: Vec::new(),
            ingredients: ingredients(&["cooked rice", "eggs", "frozen peas", "soy sauce"]),
            nutrition: None,
            is_golden: true,
        },
    ]
}

fn sheet_pan_chicken_timeline() -> Vec<TimelineStep> {
    let step = |order: u32, instruction: &str, minutes: u32, timer: u32, method: &str, equipment: &str| {
        TimelineStep {
            order,
            instruction: instruction.to_string(),
            instruction_localized: None,
            estimated_minutes: minutes,
            timer_seconds: timer,
            method: method.to_string(),
            equipment: equipment.to_string(),
            concurrency_group: None,
            cleanup_hint: None,
            temperature: None,
            completion_cue: None,
            icons: Vec::new(),
        }
    };

    let mut preheat = step(1, "Preheat the oven to 220°C.", 10, 0, "heat", "oven");
    preheat.concurrency_group = Some("prep".to_string());
    preheat.temperature = Some("220C".to_string());

    let mut chop = step(2, "Cut the broccoli and toss everything with oil and lemon.", 10, 0, "prep", "cutting-board");
    chop.concurrency_group = Some("prep".to_string());
    chop.cleanup_hint = Some("Rinse the board before it dries.".to_string());

    let mut roast = step(3, "Roast on the sheet pan until the chicken is golden.", 25, 1500, "roast", "sheet-pan");
    roast.completion_cue = Some("Juices run clear.".to_string());
    roast.icons = vec!["oven".to_string(), "timer".to_string()];

    let rest = step(4, "Rest for five minutes, then serve.", 5, 300, "rest", "sheet-pan");

    vec![preheat, chop, roast, rest]
}
