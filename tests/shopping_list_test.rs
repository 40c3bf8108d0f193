mod common;

use common::{count, create_ingredient, create_user, new_recipe};
use foodgram_sdk::{
    actions::{
        add_to_shopping_cart, create_recipe, download_shopping_list, preview_shopping_list,
    },
    schema::{Id, MeasurementUnit},
    DocumentLine, DocumentRenderer, PlainTextRenderer, RenderError,
};
use sqlx::{postgres::PgConnectOptions, Connection, PgConnection, PgPool};

struct FailingRenderer;

impl DocumentRenderer for FailingRenderer {
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn render(&self, _lines: &[DocumentLine]) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::new("font missing"))
    }
}

/// Commits a cart entry from another connection while the list is rendered.
struct ConcurrentAddRenderer {
    options: PgConnectOptions,
    user_id: Id,
    recipe_id: Id,
}

impl DocumentRenderer for ConcurrentAddRenderer {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn render(&self, lines: &[DocumentLine]) -> Result<Vec<u8>, RenderError> {
        std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let runtime = tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                        .unwrap();

                    runtime.block_on(async {
                        let mut conn = PgConnection::connect_with(&self.options).await.unwrap();
                        sqlx::query("INSERT INTO shopping_cart (user_id, recipe_id) VALUES ($1, $2)")
                            .bind(self.user_id)
                            .bind(self.recipe_id)
                            .execute(&mut conn)
                            .await
                            .unwrap();
                    });
                })
                .join()
                .unwrap();
        });

        PlainTextRenderer::default().render(lines)
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires a running Postgres (DATABASE_URL)"]
async fn download_aggregates_and_clears_the_cart(pool: PgPool) {
    let user = create_user(&pool, "user").await;
    let salt = create_ingredient(&pool, "Соль", MeasurementUnit::Gram).await;
    let eggs = create_ingredient(&pool, "Яйца", MeasurementUnit::Piece).await;

    let soup = create_recipe(&user, new_recipe("Суп", &[(salt, 5), (eggs, 1)], &[]), &pool)
        .await
        .unwrap();
    let salad = create_recipe(&user, new_recipe("Салат", &[(salt, 3)], &[]), &pool)
        .await
        .unwrap();
    add_to_shopping_cart(&user, soup.id, &pool).await.unwrap();
    add_to_shopping_cart(&user, salad.id, &pool).await.unwrap();

    let preview = preview_shopping_list(&user, &pool).await.unwrap();
    assert_eq!(preview[0].amount, 8);
    assert_eq!(count(&pool, "shopping_cart").await, 2);

    let list = download_shopping_list(&user, &PlainTextRenderer::default(), &pool)
        .await
        .unwrap();

    assert_eq!(list.items, preview);
    assert_eq!(
        String::from_utf8(list.document).unwrap(),
        "Список покупок:\n1. Соль - 8 (г)\n2. Яйца - 1 (шт.)\n"
    );
    assert_eq!(count(&pool, "shopping_cart").await, 0);

    let second = download_shopping_list(&user, &PlainTextRenderer::default(), &pool)
        .await
        .unwrap();
    assert!(second.items.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires a running Postgres (DATABASE_URL)"]
async fn render_failure_keeps_the_cart(pool: PgPool) {
    let user = create_user(&pool, "user").await;
    let salt = create_ingredient(&pool, "Соль", MeasurementUnit::Gram).await;
    let soup = create_recipe(&user, new_recipe("Суп", &[(salt, 5)], &[]), &pool)
        .await
        .unwrap();
    add_to_shopping_cart(&user, soup.id, &pool).await.unwrap();

    let error = download_shopping_list(&user, &FailingRenderer, &pool)
        .await
        .unwrap_err();

    assert_eq!(error.status_code(), 500);
    assert_eq!(count(&pool, "shopping_cart").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires a running Postgres (DATABASE_URL)"]
async fn other_users_carts_are_untouched(pool: PgPool) {
    let first = create_user(&pool, "first").await;
    let second = create_user(&pool, "second").await;
    let salt = create_ingredient(&pool, "Соль", MeasurementUnit::Gram).await;
    let soup = create_recipe(&first, new_recipe("Суп", &[(salt, 5)], &[]), &pool)
        .await
        .unwrap();
    add_to_shopping_cart(&first, soup.id, &pool).await.unwrap();
    add_to_shopping_cart(&second, soup.id, &pool).await.unwrap();

    download_shopping_list(&first, &PlainTextRenderer::default(), &pool)
        .await
        .unwrap();

    assert_eq!(count(&pool, "shopping_cart").await, 1);
    assert_eq!(preview_shopping_list(&second, &pool).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires a running Postgres (DATABASE_URL)"]
async fn entries_added_during_download_stay_in_the_cart(pool: PgPool) {
    let user = create_user(&pool, "user").await;
    let salt = create_ingredient(&pool, "Соль", MeasurementUnit::Gram).await;
    let eggs = create_ingredient(&pool, "Яйца", MeasurementUnit::Piece).await;
    let soup = create_recipe(&user, new_recipe("Суп", &[(salt, 5)], &[]), &pool)
        .await
        .unwrap();
    let omelette = create_recipe(&user, new_recipe("Омлет", &[(eggs, 3)], &[]), &pool)
        .await
        .unwrap();
    add_to_shopping_cart(&user, soup.id, &pool).await.unwrap();

    let renderer = ConcurrentAddRenderer {
        options: (*pool.connect_options()).clone(),
        user_id: user.user_id,
        recipe_id: omelette.id,
    };
    let list = download_shopping_list(&user, &renderer, &pool)
        .await
        .unwrap();

    assert_eq!(
        String::from_utf8(list.document).unwrap(),
        "Список покупок:\n1. Соль - 5 (г)\n"
    );
    assert_eq!(count(&pool, "shopping_cart").await, 1);

    let remaining = preview_shopping_list(&user, &pool).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "Яйца");
    assert_eq!(remaining[0].amount, 3);
}
