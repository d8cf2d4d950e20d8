use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{
    MAX_COOKING_TIME, MAX_INGREDIENT_AMOUNT, MIN_COOKING_TIME, MIN_INGREDIENT_AMOUNT,
    RECIPE_NAME_MAX_LENGTH, TAG_NAME_MAX_LENGTH, TAG_SLUG_MAX_LENGTH, USERNAME_MAX_LENGTH,
};
use crate::error::ValidationError;
use crate::schema::RecipeDraft;

static LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}").unwrap());
static TAG_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[A-Fa-f0-9]{6}$").unwrap());
static TAG_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap());
static USERNAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

/// A recipe name has to contain at least one letter, from any script.
/// Purely numeric or punctuation-only names are rejected.
pub fn validate_recipe_name(name: &str) -> Result<(), ValidationError> {
    if name.chars().count() > RECIPE_NAME_MAX_LENGTH || !LETTER.is_match(name) {
        return Err(ValidationError::InvalidRecipeName);
    }
    Ok(())
}

pub fn validate_tag_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.chars().count() > TAG_NAME_MAX_LENGTH {
        return Err(ValidationError::InvalidTagName);
    }
    Ok(())
}

pub fn validate_tag_color(color: &str) -> Result<(), ValidationError> {
    if !TAG_COLOR.is_match(color) {
        return Err(ValidationError::InvalidTagColor);
    }
    Ok(())
}

pub fn validate_tag_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.chars().count() > TAG_SLUG_MAX_LENGTH || !TAG_SLUG.is_match(slug) {
        return Err(ValidationError::InvalidTagSlug);
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.chars().count() > USERNAME_MAX_LENGTH || !USERNAME.is_match(username) {
        return Err(ValidationError::InvalidUsername);
    }
    Ok(())
}

pub fn validate_cooking_time(cooking_time: i32) -> Result<(), ValidationError> {
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&cooking_time) {
        return Err(ValidationError::CookingTimeOutOfRange(cooking_time));
    }
    Ok(())
}

pub fn validate_amount(amount: i32) -> Result<(), ValidationError> {
    if !(MIN_INGREDIENT_AMOUNT..=MAX_INGREDIENT_AMOUNT).contains(&amount) {
        return Err(ValidationError::AmountOutOfRange(amount));
    }
    Ok(())
}

/// Runs every rule a draft can break without touching the database:
/// tag set non-empty and distinct, composition non-empty and distinct,
/// amounts and cooking time in range, name carrying a letter. Id
/// resolution against the catalogs happens in the actions, after this
/// passes and before anything is written.
pub fn validate_recipe_draft(draft: &RecipeDraft) -> Result<(), ValidationError> {
    if draft.tags.is_empty() {
        return Err(ValidationError::EmptyTags);
    }
    let mut seen = HashSet::new();
    for tag_id in &draft.tags {
        if !seen.insert(*tag_id) {
            return Err(ValidationError::DuplicateTag(*tag_id));
        }
    }

    if draft.ingredients.is_empty() {
        return Err(ValidationError::EmptyIngredients);
    }
    let mut seen = HashSet::new();
    for item in &draft.ingredients {
        if !seen.insert(item.id) {
            return Err(ValidationError::DuplicateIngredient(item.id));
        }
    }
    for item in &draft.ingredients {
        validate_amount(item.amount)?;
    }

    validate_cooking_time(draft.cooking_time)?;
    validate_recipe_name(&draft.name)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::IngredientAmount;

    fn draft() -> RecipeDraft {
        RecipeDraft {
            name: String::from("Borscht"),
            text: String::from("Beets, mostly."),
            image: String::from("recipes/borscht.png"),
            cooking_time: 90,
            tags: vec![1, 2],
            ingredients: vec![
                IngredientAmount { id: 1, amount: 200 },
                IngredientAmount { id: 2, amount: 5 },
            ],
        }
    }

    #[test]
    fn accepts_a_complete_draft() {
        assert_eq!(validate_recipe_draft(&draft()), Ok(()));
    }

    #[test]
    fn rejects_a_draft_without_tags() {
        let mut draft = draft();
        draft.tags.clear();
        assert_eq!(validate_recipe_draft(&draft), Err(ValidationError::EmptyTags));
    }

    #[test]
    fn rejects_a_repeated_tag() {
        let mut draft = draft();
        draft.tags = vec![1, 2, 1];
        assert_eq!(
            validate_recipe_draft(&draft),
            Err(ValidationError::DuplicateTag(1))
        );
    }

    #[test]
    fn rejects_a_draft_without_ingredients() {
        let mut draft = draft();
        draft.ingredients.clear();
        assert_eq!(
            validate_recipe_draft(&draft),
            Err(ValidationError::EmptyIngredients)
        );
    }

    #[test]
    fn rejects_a_repeated_ingredient() {
        let mut draft = draft();
        draft.ingredients.push(IngredientAmount { id: 1, amount: 50 });
        assert_eq!(
            validate_recipe_draft(&draft),
            Err(ValidationError::DuplicateIngredient(1))
        );
    }

    #[test]
    fn duplicates_are_reported_before_amounts() {
        let mut draft = draft();
        draft.ingredients = vec![
            IngredientAmount { id: 1, amount: 0 },
            IngredientAmount { id: 1, amount: 3 },
        ];
        assert_eq!(
            validate_recipe_draft(&draft),
            Err(ValidationError::DuplicateIngredient(1))
        );
    }

    #[test]
    fn rejects_amounts_outside_the_range() {
        let mut draft = draft();
        draft.ingredients[0].amount = 0;
        assert_eq!(
            validate_recipe_draft(&draft),
            Err(ValidationError::AmountOutOfRange(0))
        );

        draft.ingredients[0].amount = 10001;
        assert_eq!(
            validate_recipe_draft(&draft),
            Err(ValidationError::AmountOutOfRange(10001))
        );
    }

    #[test]
    fn rejects_cooking_times_outside_the_range() {
        assert_eq!(
            validate_cooking_time(0),
            Err(ValidationError::CookingTimeOutOfRange(0))
        );
        assert_eq!(
            validate_cooking_time(1501),
            Err(ValidationError::CookingTimeOutOfRange(1501))
        );
        assert_eq!(validate_cooking_time(1), Ok(()));
        assert_eq!(validate_cooking_time(1500), Ok(()));
    }

    #[test]
    fn recipe_names_need_at_least_one_letter() {
        assert_eq!(validate_recipe_name("Pelmeni"), Ok(()));
        assert_eq!(validate_recipe_name("Сырники"), Ok(()));
        assert_eq!(validate_recipe_name("100% rye bread"), Ok(()));
        assert_eq!(
            validate_recipe_name("12345"),
            Err(ValidationError::InvalidRecipeName)
        );
        assert_eq!(
            validate_recipe_name("--- !!!"),
            Err(ValidationError::InvalidRecipeName)
        );
    }

    #[test]
    fn tag_colors_are_six_digit_hex() {
        assert_eq!(validate_tag_color("#1a2B3c"), Ok(()));
        assert_eq!(
            validate_tag_color("#12G456"),
            Err(ValidationError::InvalidTagColor)
        );
        assert_eq!(
            validate_tag_color("#abc"),
            Err(ValidationError::InvalidTagColor)
        );
        assert_eq!(
            validate_tag_color("1a2B3c"),
            Err(ValidationError::InvalidTagColor)
        );
    }

    #[test]
    fn tag_slugs_allow_ascii_words_and_dashes() {
        assert_eq!(validate_tag_slug("breakfast_1"), Ok(()));
        assert_eq!(validate_tag_slug("low-carb"), Ok(()));
        assert_eq!(
            validate_tag_slug("завтрак"),
            Err(ValidationError::InvalidTagSlug)
        );
        assert_eq!(
            validate_tag_slug("with space"),
            Err(ValidationError::InvalidTagSlug)
        );
    }

    #[test]
    fn usernames_allow_word_characters_and_address_signs() {
        assert_eq!(validate_username("chef.olga@home+1-2"), Ok(()));
        assert_eq!(
            validate_username("chef olga"),
            Err(ValidationError::InvalidUsername)
        );
        assert_eq!(
            validate_username("chef!"),
            Err(ValidationError::InvalidUsername)
        );
    }
}
