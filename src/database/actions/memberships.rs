use sqlx::{Pool, Postgres};

use crate::{
    authentication::permissions::ActionType,
    constants::RECIPE_COUNT_PER_PAGE,
    error::{ConflictError, Error},
    pagination::PageContext,
    schema::{MembershipKind, RecipeSummary, RecipeSummaryRow, Uuid},
    session::SessionData,
};

use super::recipes::get_recipe;

fn membership_action(kind: MembershipKind) -> ActionType {
    match kind {
        MembershipKind::Favorite => ActionType::ManageOwnFavorites,
        MembershipKind::ShoppingCart => ActionType::ManageOwnCart,
    }
}

/// Adds the recipe to the session user's set. The existence check is a
/// pre-flight courtesy; under concurrent identical requests the unique
/// constraint lets exactly one insert through and the loser gets a
/// conflict.
pub async fn add_membership(
    kind: MembershipKind,
    session: &SessionData,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    session.authenticate(membership_action(kind))?;

    if get_recipe(recipe_id, pool).await?.is_none() {
        return Err(Error::NotFound("recipe"));
    }

    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        kind.table()
    ))
    .bind(session.user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ConflictError::DuplicateMembership(kind).into());
    }

    Ok(())
}

pub async fn remove_membership(
    kind: MembershipKind,
    session: &SessionData,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    session.authenticate(membership_action(kind))?;

    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        kind.table()
    ))
    .bind(session.user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(kind.entry_name()));
    }

    Ok(())
}

pub async fn is_member(
    kind: MembershipKind,
    user_id: Uuid,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let row: Option<(i32,)> = sqlx::query_as(&format!(
        "SELECT recipe_id FROM {} WHERE user_id = $1 AND recipe_id = $2",
        kind.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// The user's set as paginated recipe summaries, newest first.
pub async fn fetch_memberships(
    kind: MembershipKind,
    user_id: Uuid,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeSummary>, Error> {
    let rows: Vec<RecipeSummaryRow> = sqlx::query_as(&format!(
        "
        SELECT r.id AS id, r.name AS name, r.image AS image, r.cooking_time AS cooking_time, COUNT(*) OVER() AS count
        FROM {} m
        INNER JOIN recipes r ON r.id = m.recipe_id
        WHERE m.user_id = $1
        ORDER BY r.pub_date DESC, r.id DESC
        LIMIT $2 OFFSET $3
    ",
        kind.table()
    ))
    .bind(user_id)
    .bind(RECIPE_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let rows: Vec<RecipeSummary> = rows.into_iter().map(RecipeSummary::from).collect();

    Ok(PageContext::from_rows(
        rows,
        total_count,
        RECIPE_COUNT_PER_PAGE,
        offset,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_kind_maps_to_its_own_table() {
        assert_eq!(MembershipKind::Favorite.table(), "favorites");
        assert_eq!(MembershipKind::ShoppingCart.table(), "shopping_cart");
    }

    #[test]
    fn each_kind_maps_to_its_own_action() {
        assert_eq!(
            membership_action(MembershipKind::Favorite),
            ActionType::ManageOwnFavorites
        );
        assert_eq!(
            membership_action(MembershipKind::ShoppingCart),
            ActionType::ManageOwnCart
        );
    }
}
