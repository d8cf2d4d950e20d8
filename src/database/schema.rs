use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, TypeError};
use crate::form::Form;

pub type Uuid = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

impl TryFrom<Value> for UserRole {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "user" => Ok(Self::User),
                "admin" => Ok(Self::Admin),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

/// Selects one of the two per-user recipe sets. Both tables have the
/// same (user_id, recipe_id) shape, so every membership action is
/// written once and parameterized by this kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipKind {
    Favorite,
    ShoppingCart,
}

impl MembershipKind {
    pub fn table(self) -> &'static str {
        match self {
            MembershipKind::Favorite => "favorites",
            MembershipKind::ShoppingCart => "shopping_cart",
        }
    }

    pub fn entry_name(self) -> &'static str {
        match self {
            MembershipKind::Favorite => "favorite",
            MembershipKind::ShoppingCart => "shopping cart entry",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MembershipKind::Favorite => "favorites",
            MembershipKind::ShoppingCart => "the shopping cart",
        }
    }
}

impl TryFrom<Value> for MembershipKind {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "favorite" => Ok(Self::Favorite),
                "shopping_cart" => Ok(Self::ShoppingCart),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: UserRole,
}

/// User as shown to other users, with the subscription flag resolved
/// for the requesting viewer.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserProfile {
    pub fn from_user(user: User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub pub_date: NaiveDate,
}

/// One line of a recipe's composition, joined to the ingredient it
/// references.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredient {
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeSummaryRow {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,

    pub count: i64,
}

impl From<RecipeSummaryRow> for RecipeSummary {
    fn from(row: RecipeSummaryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            image: row.image,
            cooking_time: row.cooking_time,
        }
    }
}

/// Full read model of a recipe: author, tags, composition and the
/// viewer's membership flags.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    pub id: Uuid,
    pub author: UserProfile,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: NaiveDate,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Subscription {
    pub user_id: Uuid,
    pub author_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionEntry {
    pub author: UserProfile,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct AuthorRecipeRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,

    pub rank: i64,
    pub total: i64,
}

/// One aggregated line of the shopping list: every cart recipe's
/// amounts for this (name, measurement unit) pair summed together.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListRow {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

impl TryFrom<Value> for IngredientAmount {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let id = value
            .get("id")
            .and_then(Value::as_i64)
            .and_then(|id| i32::try_from(id).ok());
        let amount = value
            .get("amount")
            .and_then(Value::as_i64)
            .and_then(|amount| i32::try_from(amount).ok());

        match (id, amount) {
            (Some(id), Some(amount)) => Ok(Self { id, amount }),
            _ => Err(TypeError::new("Expected an object with id and amount")),
        }
    }
}

/// Requested state of a recipe, before validation. Used unchanged by
/// both create and update; update replaces the whole tag set and
/// composition with what the draft carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientAmount>,
}

impl RecipeDraft {
    pub fn from_form(form: &Form) -> Result<Self, Error> {
        let tags = form
            .get_array("tags")?
            .into_iter()
            .map(|value| {
                value
                    .as_i64()
                    .and_then(|id| i32::try_from(id).ok())
                    .ok_or_else(|| TypeError::new("Failed to parse tag id as integer"))
            })
            .collect::<Result<Vec<Uuid>, TypeError>>()?;

        Ok(Self {
            name: form.get_str("name")?,
            text: form.get_str("text")?,
            image: form.get_str("image")?,
            cooking_time: form.get_number("cooking_time")?,
            tags,
            ingredients: form.get_list("ingredients")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ingredient_amounts_convert_from_form_values() {
        let value = json!({ "id": 3, "amount": 250 });
        assert_eq!(
            IngredientAmount::try_from(value).unwrap(),
            IngredientAmount { id: 3, amount: 250 }
        );
    }

    #[test]
    fn malformed_ingredient_amounts_are_rejected() {
        assert!(IngredientAmount::try_from(json!({ "id": 3 })).is_err());
        assert!(IngredientAmount::try_from(json!("3x250")).is_err());
    }

    #[test]
    fn recipe_drafts_convert_from_form_data() {
        let data = [
            (String::from("name"), json!("Pancakes")),
            (String::from("text"), json!("Mix and fry.")),
            (String::from("image"), json!("recipes/pancakes.png")),
            (String::from("cooking_time"), json!("20")),
            (String::from("tags"), json!([1, 2])),
            (
                String::from("ingredients"),
                json!([{ "id": 5, "amount": 300 }, { "id": 7, "amount": 2 }]),
            ),
        ]
        .into_iter()
        .collect();

        let draft = RecipeDraft::from_form(&Form::from_data(data)).unwrap();
        assert_eq!(draft.name, "Pancakes");
        assert_eq!(draft.cooking_time, 20);
        assert_eq!(draft.tags, vec![1, 2]);
        assert_eq!(draft.ingredients.len(), 2);
        assert_eq!(draft.ingredients[1], IngredientAmount { id: 7, amount: 2 });
    }
}
