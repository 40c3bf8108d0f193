use std::collections::{hash_map::Entry, HashMap};

use log::{info, warn};
use serde::Serialize;
use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    authentication::permissions::ActionType,
    document::{DocumentLine, DocumentRenderer},
    error::{ActionError, QueryError},
    jwt::SessionData,
    schema::{CartPart, Id, MeasurementUnit, ShoppingListItem},
    SHOPPING_LIST_FONT_SIZE, SHOPPING_LIST_TITLE, SHOPPING_LIST_TITLE_FONT_SIZE,
};

/// A rendered purchase list; the cart it came from is already empty.
#[derive(Debug, Clone, Serialize)]
pub struct ShoppingList {
    pub items: Vec<ShoppingListItem>,
    #[serde(skip)]
    pub document: Vec<u8>,
    pub content_type: &'static str,
}

/// Sums amounts per `(name, unit)`, keeping the order in which each pair
/// first appears. Equal names with different units stay separate.
pub fn aggregate(parts: Vec<CartPart>) -> Vec<ShoppingListItem> {
    let mut positions: HashMap<(String, MeasurementUnit), usize> = HashMap::new();
    let mut items: Vec<ShoppingListItem> = vec![];

    for part in parts {
        match positions.entry((part.name.clone(), part.measurement_unit)) {
            Entry::Occupied(entry) => items[*entry.get()].amount += i64::from(part.amount),
            Entry::Vacant(entry) => {
                entry.insert(items.len());
                items.push(ShoppingListItem {
                    name: part.name,
                    measurement_unit: part.measurement_unit,
                    amount: i64::from(part.amount),
                });
            }
        }
    }

    items
}

pub fn shopping_list_lines(items: &[ShoppingListItem]) -> Vec<DocumentLine> {
    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(DocumentLine::new(
        SHOPPING_LIST_TITLE,
        SHOPPING_LIST_TITLE_FONT_SIZE,
    ));

    lines.extend(items.iter().enumerate().map(|(i, item)| {
        DocumentLine::new(
            format!(
                "{}. {} - {} ({})",
                i + 1,
                item.name,
                item.amount,
                item.measurement_unit
            ),
            SHOPPING_LIST_FONT_SIZE,
        )
    }));

    lines
}

/// Parts of the user's cart, restricted to `cart_ids` when given.
async fn list_cart_parts(
    user_id: Id,
    cart_ids: Option<&[Id]>,
    conn: &mut PgConnection,
) -> Result<Vec<CartPart>, ActionError> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "
        SELECT i.name, i.measurement_unit, ia.amount
        FROM shopping_cart sc
        INNER JOIN ingredient_amounts ia ON ia.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ia.ingredient_id
        WHERE sc.user_id = ",
    );
    query_builder.push_bind(user_id);

    if let Some(ids) = cart_ids {
        query_builder.push(" AND sc.id = ANY(");
        query_builder.push_bind(ids);
        query_builder.push(")");
    }
    query_builder.push(" ORDER BY sc.id, ia.id");

    let rows = query_builder
        .build_query_as::<CartPart>()
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows)
}

/// Row-locks the cart entries present right now. Entries added later are
/// not part of the returned set.
async fn lock_cart(user_id: Id, conn: &mut PgConnection) -> Result<Vec<Id>, ActionError> {
    let rows: Vec<(Id,)> =
        sqlx::query_as("SELECT id FROM shopping_cart WHERE user_id = $1 ORDER BY id FOR UPDATE")
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// The aggregated list without rendering it or touching the cart.
pub async fn preview_shopping_list(
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListItem>, ActionError> {
    session.authenticate(ActionType::ManageOwnShoppingCart)?;

    let mut conn = pool.acquire().await?;
    let parts = list_cart_parts(session.user_id, None, &mut conn).await?;

    Ok(aggregate(parts))
}

/// Consume-on-read: the cart is cleared only after the document rendered.
/// A renderer error rolls back and leaves the cart as it was. Only the
/// entries that were rendered are removed; an entry added concurrently
/// stays in the cart.
pub async fn download_shopping_list(
    session: &SessionData,
    renderer: &dyn DocumentRenderer,
    pool: &Pool<Postgres>,
) -> Result<ShoppingList, ActionError> {
    session.authenticate(ActionType::ManageOwnShoppingCart)?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    let cart_ids = lock_cart(session.user_id, &mut *tr).await?;
    let parts = list_cart_parts(session.user_id, Some(cart_ids.as_slice()), &mut *tr).await?;
    let items = aggregate(parts);

    let document = renderer
        .render(&shopping_list_lines(&items))
        .map_err(|e| {
            warn!("Shopping list of {} not rendered: {e}", session.username);
            e
        })?;

    sqlx::query("DELETE FROM shopping_cart WHERE id = ANY($1)")
        .bind(cart_ids.as_slice())
        .execute(&mut *tr)
        .await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

    info!(
        "Shopping list with {} items downloaded by {}",
        items.len(),
        session.username
    );
    Ok(ShoppingList {
        items,
        document,
        content_type: renderer.content_type(),
    })
}
