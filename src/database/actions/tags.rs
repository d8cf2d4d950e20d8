use std::collections::HashSet;

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{ConflictError, Error, ValidationError},
    schema::{Tag, Uuid},
    validate,
};

/// Tag colors and slugs are validated before the insert; a name or
/// slug collision is reported as a conflict via the unique
/// constraints.
pub async fn create_tag(
    name: &str,
    color: &str,
    slug: &str,
    pool: &Pool<Postgres>,
) -> Result<i32, Error> {
    validate::validate_tag_name(name)?;
    validate::validate_tag_color(color)?;
    validate::validate_tag_slug(slug)?;

    let id: Option<(i32,)> = sqlx::query_as(
        "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING RETURNING id",
    )
    .bind(name)
    .bind(color)
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    match id {
        Some(id) => Ok(id.0),
        None => Err(ConflictError::TagExists.into()),
    }
}

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Tag>, Error> {
    let row: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_tag_by_slug(slug: &str, pool: &Pool<Postgres>) -> Result<Option<Tag>, Error> {
    let row: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let rows: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

pub async fn list_recipe_tags(recipe_id: Uuid, pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let rows: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.*
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Resolves a set of distinct tag ids, failing on the first id that
/// doesn't exist.
pub async fn resolve_tags(ids: &[Uuid], pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let rows: Vec<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    if rows.len() != ids.len() {
        let known: HashSet<Uuid> = rows.iter().map(|tag| tag.id).collect();
        let missing = ids
            .iter()
            .find(|id| !known.contains(id))
            .copied()
            .unwrap_or_default();
        return Err(ValidationError::UnknownTag(missing).into());
    }

    Ok(rows)
}

/// Bulk upsert for catalog loaders: validates every entry first, then
/// inserts in one statement, skipping rows that already exist.
pub async fn import_tags(
    entries: &[(String, String, String)],
    pool: &Pool<Postgres>,
) -> Result<u64, Error> {
    if entries.is_empty() {
        return Ok(0);
    }

    for (name, color, slug) in entries {
        validate::validate_tag_name(name)?;
        validate::validate_tag_color(color)?;
        validate::validate_tag_slug(slug)?;
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO tags (name, color, slug) ");

    query_builder.push_values(entries.iter().take(65535 / 3), |mut b, (name, color, slug)| {
        b.push_bind(name).push_bind(color).push_bind(slug);
    });
    query_builder.push(" ON CONFLICT DO NOTHING");

    let result = query_builder.build().execute(pool).await?;

    log::info!("imported {} of {} tags", result.rows_affected(), entries.len());

    Ok(result.rows_affected())
}
