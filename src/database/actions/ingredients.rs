use std::collections::HashSet;

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    constants::INGREDIENT_COUNT_PER_PAGE,
    error::{ConflictError, Error, ValidationError, PG_FOREIGN_KEY_VIOLATION},
    schema::{Ingredient, Uuid},
};

pub async fn list_ingredients(pool: &Pool<Postgres>) -> Result<Vec<Ingredient>, Error> {
    let rows: Vec<Ingredient> =
        sqlx::query_as("SELECT * FROM ingredients ORDER BY name, measurement_unit")
            .fetch_all(pool)
            .await?;

    Ok(rows)
}

pub async fn get_ingredient(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, Error> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn create_ingredient(
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Postgres>,
) -> Result<i32, Error> {
    let id: Option<(i32,)> = sqlx::query_as(
        "
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING RETURNING id;
    ",
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_optional(pool)
    .await?;

    match id {
        Some(id) => Ok(id.0),
        None => Err(ConflictError::IngredientExists.into()),
    }
}

/// Bulk upsert for catalog loaders. Rows that collide with an existing
/// (name, measurement unit) pair are skipped silently; returns how
/// many were actually inserted.
pub async fn import_ingredients(
    entries: &[(String, String)],
    pool: &Pool<Postgres>,
) -> Result<u64, Error> {
    if entries.is_empty() {
        return Ok(0);
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO ingredients (name, measurement_unit) ");

    query_builder.push_values(entries.iter().take(65535 / 2), |mut b, (name, unit)| {
        b.push_bind(name).push_bind(unit);
    });
    query_builder.push(" ON CONFLICT (name, measurement_unit) DO NOTHING");

    let result = query_builder.build().execute(pool).await?;

    log::info!(
        "imported {} of {} ingredients",
        result.rows_affected(),
        entries.len()
    );

    Ok(result.rows_affected())
}

/// Case-insensitive catalog search. Names starting with the query rank
/// before names merely containing it.
pub async fn search_ingredients(
    search: &str,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, Error> {
    let rows: Vec<Ingredient> = sqlx::query_as(
        "
        SELECT * FROM ingredients
        WHERE name ILIKE '%' || $1 || '%'
        ORDER BY (name ILIKE $1 || '%') DESC, name, measurement_unit
        LIMIT $2
    ",
    )
    .bind(search)
    .bind(INGREDIENT_COUNT_PER_PAGE)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Resolves a set of distinct ingredient ids against the catalog,
/// failing on the first id that doesn't exist.
pub async fn resolve_ingredients(
    ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, Error> {
    let rows: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    if rows.len() != ids.len() {
        let known: HashSet<Uuid> = rows.iter().map(|ingredient| ingredient.id).collect();
        let missing = ids
            .iter()
            .find(|id| !known.contains(id))
            .copied()
            .unwrap_or_default();
        return Err(ValidationError::UnknownIngredient(missing).into());
    }

    Ok(rows)
}

/// Deleting a referenced ingredient is blocked, not cascaded: the
/// restrict constraint backs up this pre-flight check under races.
pub async fn delete_ingredient(id: Uuid, pool: &Pool<Postgres>) -> Result<(), Error> {
    let referenced: Option<(i32,)> = sqlx::query_as(
        "SELECT recipe_id FROM recipe_ingredients WHERE ingredient_id = $1 LIMIT 1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    if referenced.is_some() {
        return Err(ConflictError::IngredientInUse.into());
    }

    let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.code().as_deref() == Some(PG_FOREIGN_KEY_VIOLATION) {
                    return Error::Conflict(ConflictError::IngredientInUse);
                }
            }
            Error::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("ingredient"));
    }

    Ok(())
}
