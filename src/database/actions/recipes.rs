use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use crate::{
    authentication::permissions::ActionType,
    constants::RECIPE_COUNT_PER_PAGE,
    error::{Error, QueryError},
    pagination::PageContext,
    schema::{
        IngredientAmount, MembershipKind, Recipe, RecipeDraft, RecipeIngredient, RecipeSummary,
        RecipeSummaryRow, RecipeView, Uuid,
    },
    session::SessionData,
    validate,
};

use super::ingredients::resolve_ingredients;
use super::memberships::is_member;
use super::tags::{list_recipe_tags, resolve_tags};
use super::users::get_profile;

/// Creates a recipe together with its tag set and composition, as one
/// transaction. Every rule is checked before the first write, so a
/// failure never leaves partial rows behind.
pub async fn create_recipe(
    session: &SessionData,
    draft: &RecipeDraft,
    pool: &Pool<Postgres>,
) -> Result<i32, Error> {
    session.authenticate(ActionType::CreateRecipes)?;
    validate::validate_recipe_draft(draft)?;

    resolve_tags(&draft.tags, pool).await?;
    let ingredient_ids: Vec<Uuid> = draft.ingredients.iter().map(|item| item.id).collect();
    resolve_ingredients(&ingredient_ids, pool).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    let id: (i32,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, text, image, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(session.user_id)
    .bind(&draft.name)
    .bind(&draft.text)
    .bind(&draft.image)
    .bind(draft.cooking_time)
    .fetch_one(&mut *tr)
    .await?;

    insert_recipe_tags(id.0, &draft.tags, &mut tr).await?;
    insert_recipe_ingredients(id.0, &draft.ingredients, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

    Ok(id.0)
}

/// Updates a recipe in place. The tag set and the composition are
/// fully replaced by what the draft carries, in the same transaction
/// as the recipe row itself; pub_date never changes.
pub async fn update_recipe(
    id: Uuid,
    session: &SessionData,
    draft: &RecipeDraft,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    get_recipe_mut(id, session, pool).await?;
    validate::validate_recipe_draft(draft)?;

    resolve_tags(&draft.tags, pool).await?;
    let ingredient_ids: Vec<Uuid> = draft.ingredients.iter().map(|item| item.id).collect();
    resolve_ingredients(&ingredient_ids, pool).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    sqlx::query(
        "UPDATE recipes SET name = $1, text = $2, image = $3, cooking_time = $4 WHERE id = $5",
    )
    .bind(&draft.name)
    .bind(&draft.text)
    .bind(&draft.image)
    .bind(draft.cooking_time)
    .bind(id)
    .execute(&mut *tr)
    .await?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    insert_recipe_tags(id, &draft.tags, &mut tr).await?;
    insert_recipe_ingredients(id, &draft.ingredients, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

    Ok(())
}

/// Deletes a recipe and every edge pointing at it, as one transaction.
pub async fn delete_recipe(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    get_recipe_mut(id, session, pool).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    sqlx::query("DELETE FROM favorites WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    sqlx::query("DELETE FROM shopping_cart WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

    log::debug!("deleted recipe {id} and its edges");

    Ok(())
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Fetches a recipe for mutation. Only the author may proceed, unless
/// the session may manage all recipes.
pub async fn get_recipe_mut(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    let recipe = get_recipe(id, pool).await?;
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => match session.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(recipe),
            Err(_) => {
                if recipe.author_id != session.user_id {
                    Err(Error::Permission("only the author may modify this recipe"))
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(Error::NotFound("recipe")),
    }
}

pub async fn list_recipe_ingredients(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredient>, Error> {
    let rows: Vec<RecipeIngredient> = sqlx::query_as(
        "
        SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY i.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Read composition of everything a recipe page shows: author profile,
/// tags, line-items and the viewer's membership flags.
pub async fn view_recipe(
    id: Uuid,
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, Error> {
    let recipe = get_recipe(id, pool).await?.ok_or(Error::NotFound("recipe"))?;

    let author = get_profile(viewer, recipe.author_id, pool).await?;
    let tags = list_recipe_tags(id, pool).await?;
    let ingredients = list_recipe_ingredients(id, pool).await?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(session) => (
            is_member(MembershipKind::Favorite, session.user_id, id, pool).await?,
            is_member(MembershipKind::ShoppingCart, session.user_id, id, pool).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeView {
        id: recipe.id,
        author,
        tags,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        pub_date: recipe.pub_date,
    })
}

/// Paginated listing, newest first, optionally narrowed to an author
/// and a tag slug.
pub async fn fetch_recipes(
    author: Option<Uuid>,
    tag_slug: Option<&str>,
    search: String,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeSummary>, Error> {
    let pattern = format!("%{search}%");

    let rows: Vec<RecipeSummaryRow> = match (author, tag_slug) {
        (Some(author), Some(slug)) => {
            sqlx::query_as("SELECT r.id AS id, r.name AS name, r.image AS image, r.cooking_time AS cooking_time, COUNT(*) OVER() AS count FROM recipes r INNER JOIN recipe_tags rt ON rt.recipe_id = r.id INNER JOIN tags t ON t.id = rt.tag_id WHERE r.author_id = $1 AND t.slug = $2 AND r.name ILIKE $3 ORDER BY r.pub_date DESC, r.id DESC LIMIT $4 OFFSET $5")
                .bind(author)
                .bind(slug)
                .bind(&pattern)
                .bind(RECIPE_COUNT_PER_PAGE)
                .bind(offset)
                .fetch_all(pool).await?
        },
        (Some(author), None) => {
            sqlx::query_as("SELECT r.id AS id, r.name AS name, r.image AS image, r.cooking_time AS cooking_time, COUNT(*) OVER() AS count FROM recipes r WHERE r.author_id = $1 AND r.name ILIKE $2 ORDER BY r.pub_date DESC, r.id DESC LIMIT $3 OFFSET $4")
                .bind(author)
                .bind(&pattern)
                .bind(RECIPE_COUNT_PER_PAGE)
                .bind(offset)
                .fetch_all(pool).await?
        },
        (None, Some(slug)) => {
            sqlx::query_as("SELECT r.id AS id, r.name AS name, r.image AS image, r.cooking_time AS cooking_time, COUNT(*) OVER() AS count FROM recipes r INNER JOIN recipe_tags rt ON rt.recipe_id = r.id INNER JOIN tags t ON t.id = rt.tag_id WHERE t.slug = $1 AND r.name ILIKE $2 ORDER BY r.pub_date DESC, r.id DESC LIMIT $3 OFFSET $4")
                .bind(slug)
                .bind(&pattern)
                .bind(RECIPE_COUNT_PER_PAGE)
                .bind(offset)
                .fetch_all(pool).await?
        },
        (None, None) => {
            sqlx::query_as("SELECT r.id AS id, r.name AS name, r.image AS image, r.cooking_time AS cooking_time, COUNT(*) OVER() AS count FROM recipes r WHERE r.name ILIKE $1 ORDER BY r.pub_date DESC, r.id DESC LIMIT $2 OFFSET $3")
                .bind(&pattern)
                .bind(RECIPE_COUNT_PER_PAGE)
                .bind(offset)
                .fetch_all(pool).await?
        },
    };

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let rows: Vec<RecipeSummary> = rows.into_iter().map(RecipeSummary::from).collect();

    Ok(PageContext::from_rows(
        rows,
        total_count,
        RECIPE_COUNT_PER_PAGE,
        offset,
    ))
}

/// An author's recipes, newest first, optionally truncated. Used by
/// subscription listings.
pub async fn list_author_recipes(
    author_id: Uuid,
    limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeSummary>, Error> {
    let rows: Vec<RecipeSummary> = match limit {
        Some(limit) => {
            sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE author_id = $1 ORDER BY pub_date DESC, id DESC LIMIT $2")
                .bind(author_id)
                .bind(limit)
                .fetch_all(pool).await?
        }
        None => {
            sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE author_id = $1 ORDER BY pub_date DESC, id DESC")
                .bind(author_id)
                .fetch_all(pool).await?
        }
    };

    Ok(rows)
}

async fn insert_recipe_tags(
    recipe_id: Uuid,
    tag_ids: &[Uuid],
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), Error> {
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");

    query_builder.push_values(tag_ids.iter(), |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(tag_id);
    });

    query_builder.build().execute(&mut **tr).await?;

    Ok(())
}

async fn insert_recipe_ingredients(
    recipe_id: Uuid,
    items: &[IngredientAmount],
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), Error> {
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");

    query_builder.push_values(items.iter(), |mut b, item| {
        b.push_bind(recipe_id).push_bind(item.id).push_bind(item.amount);
    });

    query_builder.build().execute(&mut **tr).await?;

    Ok(())
}
