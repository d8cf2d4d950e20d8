use sqlx::{Pool, Postgres};

use crate::error::Error;
use crate::schema::ShoppingListRow;

/// The consuming route serves the rendered report as a download under
/// this name.
pub const SHOPPING_LIST_FILENAME: &str = "shopping_cart.txt";
pub const SHOPPING_LIST_CONTENT_TYPE: &str = "text/plain";

/// Aggregates the user's whole cart in one pass: every line-item of
/// every cart recipe, grouped by (ingredient name, measurement unit)
/// and summed. Ordering is part of the contract so the rendered report
/// is stable under cart reordering.
pub async fn fetch_shopping_list(
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListRow>, Error> {
    let rows: Vec<ShoppingListRow> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, SUM(ri.amount) AS total
        FROM shopping_cart sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
        GROUP BY i.name, i.measurement_unit
        ORDER BY i.name, i.measurement_unit
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// One newline-terminated line per aggregated ingredient. An empty
/// cart renders as the empty string, never an error.
pub fn render_shopping_list(rows: &[ShoppingListRow]) -> String {
    let mut report = String::new();

    rows.iter().for_each(|row| {
        report += &format!("{} ({}) - {}\n", row.name, row.measurement_unit, row.total);
    });

    report
}

pub async fn build_shopping_list(user_id: i32, pool: &Pool<Postgres>) -> Result<String, Error> {
    let rows = fetch_shopping_list(user_id, pool).await?;

    Ok(render_shopping_list(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, total: i64) -> ShoppingListRow {
        ShoppingListRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            total,
        }
    }

    #[test]
    fn each_ingredient_renders_as_one_line() {
        let rows = vec![row("flour", "g", 300), row("salt", "g", 5)];
        assert_eq!(
            render_shopping_list(&rows),
            "flour (g) - 300\nsalt (g) - 5\n"
        );
    }

    #[test]
    fn the_same_name_with_different_units_stays_separate() {
        let rows = vec![row("milk", "ml", 500), row("milk", "tbsp", 2)];
        assert_eq!(
            render_shopping_list(&rows),
            "milk (ml) - 500\nmilk (tbsp) - 2\n"
        );
    }

    #[test]
    fn an_empty_cart_renders_an_empty_report() {
        assert_eq!(render_shopping_list(&[]), "");
    }
}
