use sqlx::{Pool, Postgres};

use crate::{
    error::Error,
    schema::{User, UserProfile, Uuid},
    session::SessionData,
    validate,
};

use super::subscriptions::is_subscribed;

pub async fn get_user(pool: &Pool<Postgres>, username: &str) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Uuid) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Creates a user. The password arrives already hashed; credential
/// handling lives in the consuming application, not here. Returns
/// false when the username or email is already taken.
pub async fn register_user(
    username: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    validate::validate_username(username)?;

    let query = sqlx::query(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING RETURNING *;
    ",
    )
    .bind(email)
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .bind(password)
    .execute(pool)
    .await?;

    Ok(query.rows_affected() > 0)
}

/// Public view of a user, with the subscription flag resolved against
/// the optional viewer.
pub async fn get_profile(
    viewer: Option<&SessionData>,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<UserProfile, Error> {
    let user = get_user_by_id(pool, user_id)
        .await?
        .ok_or(Error::NotFound("user"))?;

    let is_subscribed = match viewer {
        Some(session) => is_subscribed(session.user_id, user_id, pool).await?,
        None => false,
    };

    Ok(UserProfile::from_user(user, is_subscribed))
}
