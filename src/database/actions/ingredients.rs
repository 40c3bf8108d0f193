use log::{info, warn};
use serde::Serialize;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    authentication::permissions::ActionType,
    error::ActionError,
    jwt::SessionData,
    schema::{Id, Ingredient, MeasurementUnit},
    seed::{parse_ingredient_csv, IngredientSeedRow},
};

pub async fn get_ingredient(id: Id, pool: &Pool<Postgres>) -> Result<Ingredient, ActionError> {
    let row: Option<Ingredient> =
        sqlx::query_as("SELECT id, name, measurement_unit FROM ingredients WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    row.ok_or_else(|| ActionError::not_found("Ingredient doesn't exist"))
}

/// Case-insensitive prefix search, ordered by name.
pub async fn list_ingredients(
    name_prefix: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, ActionError> {
    let pattern = format!("{}%", escape_like(name_prefix.unwrap_or("").trim()));

    let list: Vec<Ingredient> = sqlx::query_as(
        "SELECT id, name, measurement_unit FROM ingredients WHERE name ILIKE $1 ORDER BY name, id",
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(list)
}

pub async fn create_ingredient(
    session: &SessionData,
    name: &str,
    measurement_unit: MeasurementUnit,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, ActionError> {
    session.authenticate(ActionType::ManageIngredients)?;

    let name = name.trim();
    if name.is_empty() {
        return Err(ActionError::validation("Ingredient name must not be empty"));
    }

    let ingredient: Ingredient = sqlx::query_as(
        "
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        RETURNING id, name, measurement_unit
    ",
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_one(pool)
    .await?;

    info!("Ingredient '{}' created by {}", ingredient.name, session.username);
    Ok(ingredient)
}

/// Fails with NotFound unless every id names an ingredient.
pub(crate) async fn ensure_ingredients_exist(
    ids: &[Id],
    conn: &mut PgConnection,
) -> Result<(), ActionError> {
    if ids.is_empty() {
        return Ok(());
    }

    let (found,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ingredients WHERE id = ANY($1)")
        .bind(ids)
        .fetch_one(&mut *conn)
        .await?;

    if found != ids.len() as i64 {
        return Err(ActionError::not_found("Ingredient doesn't exist"));
    }
    Ok(())
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Inserted,
    Updated,
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidSeedLine {
    pub line: usize,
    pub info: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub inserted: usize,
    pub updated: usize,
    pub duplicates: Vec<String>,
    pub invalid: Vec<InvalidSeedLine>,
}

impl SeedReport {
    fn record(&mut self, row: &IngredientSeedRow, outcome: SeedOutcome) {
        match outcome {
            SeedOutcome::Inserted => self.inserted += 1,
            SeedOutcome::Updated => self.updated += 1,
            SeedOutcome::Duplicate => self.duplicates.push(row.name.to_owned()),
        }
    }
}

/// Upsert by name. An identical `(name, unit)` pair is left alone and
/// reported as a duplicate; a different unit overwrites the stored one.
pub async fn seed_ingredient(
    row: &IngredientSeedRow,
    pool: &Pool<Postgres>,
) -> Result<SeedOutcome, ActionError> {
    let result: Option<(bool,)> = sqlx::query_as(
        "
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET measurement_unit = EXCLUDED.measurement_unit
        WHERE ingredients.measurement_unit <> EXCLUDED.measurement_unit
        RETURNING (xmax = 0)
    ",
    )
    .bind(&row.name)
    .bind(row.measurement_unit)
    .fetch_optional(pool)
    .await?;

    Ok(match result {
        Some((true,)) => SeedOutcome::Inserted,
        Some((false,)) => SeedOutcome::Updated,
        None => SeedOutcome::Duplicate,
    })
}

/// Each row is written on its own; a duplicate never aborts the load.
pub async fn seed_ingredients(
    rows: &[IngredientSeedRow],
    pool: &Pool<Postgres>,
) -> Result<SeedReport, ActionError> {
    let mut report = SeedReport::default();

    for row in rows {
        let outcome = seed_ingredient(row, pool).await?;
        if outcome == SeedOutcome::Duplicate {
            warn!("Ingredient '{}' already exists, skipping", row.name);
        }
        report.record(row, outcome);
    }

    Ok(report)
}

pub async fn seed_ingredients_from_csv(
    input: &str,
    pool: &Pool<Postgres>,
) -> Result<SeedReport, ActionError> {
    let mut rows = vec![];
    let mut invalid = vec![];

    for parsed in parse_ingredient_csv(input) {
        match parsed.row {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!("Skipping invalid ingredient on line {}: {e}", parsed.line);
                invalid.push(InvalidSeedLine {
                    line: parsed.line,
                    info: e.to_string(),
                });
            }
        }
    }

    let mut report = seed_ingredients(&rows, pool).await?;
    report.invalid = invalid;

    info!(
        "Ingredient seed finished: {} inserted, {} updated, {} duplicates, {} invalid",
        report.inserted,
        report.updated,
        report.duplicates.len(),
        report.invalid.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_literal() {
        assert_eq!(escape_like("100%_сок"), "100\\%\\_сок");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("мука"), "мука");
    }

    #[test]
    fn report_counts_outcomes() {
        let row = IngredientSeedRow::try_from("соль,г").unwrap();
        let mut report = SeedReport::default();

        report.record(&row, SeedOutcome::Inserted);
        report.record(&row, SeedOutcome::Updated);
        report.record(&row, SeedOutcome::Duplicate);

        assert_eq!(report.inserted, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.duplicates, vec!["соль"]);
    }
}
