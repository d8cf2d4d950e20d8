use std::collections::HashMap;

use sqlx::{Pool, Postgres};

use crate::{
    authentication::permissions::ActionType,
    error::{ConflictError, Error, ValidationError},
    schema::{AuthorRecipeRow, RecipeSummary, SubscriptionEntry, User, UserProfile, Uuid},
    session::SessionData,
};

use super::users::get_user_by_id;

/// Adds a follow edge from the session user to the author. The unique
/// constraint on (user_id, author_id) is what decides a race between
/// two identical requests; `rows_affected` just reads the verdict.
pub async fn subscribe(
    session: &SessionData,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    if session.user_id == author_id {
        return Err(ValidationError::SelfSubscription.into());
    }

    if get_user_by_id(pool, author_id).await?.is_none() {
        return Err(Error::NotFound("user"));
    }

    let result = sqlx::query(
        "INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(session.user_id)
    .bind(author_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ConflictError::DuplicateSubscription.into());
    }

    Ok(())
}

pub async fn unsubscribe(
    session: &SessionData,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(session.user_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("subscription"));
    }

    Ok(())
}

pub async fn is_subscribed(
    user_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let row: Option<(i32,)> = sqlx::query_as(
        "SELECT author_id FROM subscriptions WHERE user_id = $1 AND author_id = $2",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Every author the user follows, each with their newest recipes
/// truncated to `recipe_limit` and the author's total recipe count.
/// The recipes of all authors come back from one windowed query, so
/// the listing never degenerates into a per-author fetch loop.
pub async fn list_subscriptions(
    user_id: Uuid,
    recipe_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<SubscriptionEntry>, Error> {
    let authors: Vec<User> = sqlx::query_as(
        "
        SELECT u.*
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY u.id
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let rows: Vec<AuthorRecipeRow> = sqlx::query_as(
        "
        SELECT * FROM (
            SELECT r.id AS id, r.author_id AS author_id, r.name AS name, r.image AS image, r.cooking_time AS cooking_time,
                ROW_NUMBER() OVER (PARTITION BY r.author_id ORDER BY r.pub_date DESC, r.id DESC) AS rank,
                COUNT(*) OVER (PARTITION BY r.author_id) AS total
            FROM recipes r
            INNER JOIN subscriptions s ON s.author_id = r.author_id
            WHERE s.user_id = $1
        ) ranked
        WHERE rank <= $2
    ",
    )
    .bind(user_id)
    .bind(recipe_limit.unwrap_or(i64::MAX))
    .fetch_all(pool)
    .await?;

    let mut by_author: HashMap<Uuid, (Vec<RecipeSummary>, i64)> = HashMap::new();
    for row in rows {
        let entry = by_author
            .entry(row.author_id)
            .or_insert_with(|| (Vec::new(), row.total));
        entry.0.push(RecipeSummary {
            id: row.id,
            name: row.name,
            image: row.image,
            cooking_time: row.cooking_time,
        });
    }

    let entries = authors
        .into_iter()
        .map(|author| {
            let (recipes, recipes_count) = by_author.remove(&author.id).unwrap_or_default();
            SubscriptionEntry {
                author: UserProfile::from_user(author, true),
                recipes,
                recipes_count,
            }
        })
        .collect();

    Ok(entries)
}
