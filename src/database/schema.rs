use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

pub type Id = i32;

#[derive(
    Clone, Copy, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "measurement_unit")]
pub enum MeasurementUnit {
    #[sqlx(rename = "г")]
    #[serde(rename = "г")]
    Gram,
    #[sqlx(rename = "кг")]
    #[serde(rename = "кг")]
    Kilogram,
    #[sqlx(rename = "шт.")]
    #[serde(rename = "шт.")]
    Piece,
    #[sqlx(rename = "ч. л.")]
    #[serde(rename = "ч. л.")]
    Teaspoon,
    #[sqlx(rename = "ст. л.")]
    #[serde(rename = "ст. л.")]
    Tablespoon,
    #[sqlx(rename = "мл")]
    #[serde(rename = "мл")]
    Milliliter,
    #[sqlx(rename = "л")]
    #[serde(rename = "л")]
    Liter,
    #[sqlx(rename = "стакан")]
    #[serde(rename = "стакан")]
    Glass,
    #[sqlx(rename = "долька")]
    #[serde(rename = "долька")]
    Segment,
    #[sqlx(rename = "веточка")]
    #[serde(rename = "веточка")]
    Sprig,
    #[sqlx(rename = "горсть")]
    #[serde(rename = "горсть")]
    Handful,
    #[sqlx(rename = "пучок")]
    #[serde(rename = "пучок")]
    Bunch,
    #[sqlx(rename = "щепотка")]
    #[serde(rename = "щепотка")]
    Pinch,
    #[sqlx(rename = "по вкусу")]
    #[serde(rename = "по вкусу")]
    ToTaste,
    #[sqlx(rename = "кусок")]
    #[serde(rename = "кусок")]
    Chunk,
    #[sqlx(rename = "банка")]
    #[serde(rename = "банка")]
    Jar,
    #[sqlx(rename = "упаковка")]
    #[serde(rename = "упаковка")]
    Package,
    #[sqlx(rename = "батон")]
    #[serde(rename = "батон")]
    Loaf,
    #[sqlx(rename = "капля")]
    #[serde(rename = "капля")]
    Drop,
    #[sqlx(rename = "бутылка")]
    #[serde(rename = "бутылка")]
    Bottle,
    #[sqlx(rename = "зубчик")]
    #[serde(rename = "зубчик")]
    Clove,
}

impl MeasurementUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gram => "г",
            Self::Kilogram => "кг",
            Self::Piece => "шт.",
            Self::Teaspoon => "ч. л.",
            Self::Tablespoon => "ст. л.",
            Self::Milliliter => "мл",
            Self::Liter => "л",
            Self::Glass => "стакан",
            Self::Segment => "долька",
            Self::Sprig => "веточка",
            Self::Handful => "горсть",
            Self::Bunch => "пучок",
            Self::Pinch => "щепотка",
            Self::ToTaste => "по вкусу",
            Self::Chunk => "кусок",
            Self::Jar => "банка",
            Self::Package => "упаковка",
            Self::Loaf => "батон",
            Self::Drop => "капля",
            Self::Bottle => "бутылка",
            Self::Clove => "зубчик",
        }
    }
}

impl FromStr for MeasurementUnit {
    type Err = TypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "г" => Ok(Self::Gram),
            "кг" => Ok(Self::Kilogram),
            "шт." => Ok(Self::Piece),
            "ч. л." => Ok(Self::Teaspoon),
            "ст. л." => Ok(Self::Tablespoon),
            "мл" => Ok(Self::Milliliter),
            "л" => Ok(Self::Liter),
            "стакан" => Ok(Self::Glass),
            "долька" => Ok(Self::Segment),
            "веточка" => Ok(Self::Sprig),
            "горсть" => Ok(Self::Handful),
            "пучок" => Ok(Self::Bunch),
            "щепотка" => Ok(Self::Pinch),
            "по вкусу" => Ok(Self::ToTaste),
            "кусок" => Ok(Self::Chunk),
            "банка" => Ok(Self::Jar),
            "упаковка" => Ok(Self::Package),
            "батон" => Ok(Self::Loaf),
            "капля" => Ok(Self::Drop),
            "бутылка" => Ok(Self::Bottle),
            "зубчик" => Ok(Self::Clove),
            _ => Err(TypeError::new("Invalid measurement unit")),
        }
    }
}

impl fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip)]
    pub password: String,
    pub role: UserRole,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ingredient {
    pub id: Id,
    pub name: String,
    pub measurement_unit: MeasurementUnit,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: Id,
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// Tag row joined through `recipe_tags`.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct LinkedRecipeTag {
    pub recipe_id: Id,
    pub id: Id,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<LinkedRecipeTag> for Tag {
    fn from(value: LinkedRecipeTag) -> Self {
        Self {
            id: value.id,
            name: value.name,
            color: value.color,
            slug: value.slug,
        }
    }
}

/// One ingredient line of a recipe. `id` is the ingredient id.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientAmount {
    #[serde(skip)]
    pub recipe_id: Id,
    pub id: Id,
    pub name: String,
    pub measurement_unit: MeasurementUnit,
    pub amount: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

/// Recipe columns with the author and the viewer-relative flags.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeRow {
    pub id: Id,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,

    pub author_id: Id,
    pub author_email: String,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub author_is_subscribed: bool,

    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
    pub id: Id,
    pub author: Author,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<IngredientAmount>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl Recipe {
    pub fn from_row(row: RecipeRow, tags: Vec<Tag>, ingredients: Vec<IngredientAmount>) -> Self {
        Self {
            id: row.id,
            author: Author {
                id: row.author_id,
                email: row.author_email,
                username: row.author_username,
                first_name: row.author_first_name,
                last_name: row.author_last_name,
                is_subscribed: row.author_is_subscribed,
            },
            name: row.name,
            image: row.image,
            text: row.text,
            cooking_time: row.cooking_time,
            tags,
            ingredients,
            is_favorited: row.is_favorited,
            is_in_shopping_cart: row.is_in_shopping_cart,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeSummary {
    pub id: Id,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct AuthorRecipeSummary {
    pub author_id: Id,
    pub id: Id,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<AuthorRecipeSummary> for RecipeSummary {
    fn from(value: AuthorRecipeSummary) -> Self {
        Self {
            id: value.id,
            name: value.name,
            image: value.image,
            cooking_time: value.cooking_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribedAuthor {
    #[serde(flatten)]
    pub author: Author,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}

/// One `(ingredient, amount)` line reached through a user's shopping cart.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct CartPart {
    pub name: String,
    pub measurement_unit: MeasurementUnit,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: MeasurementUnit,
    pub amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MEASUREMENT_UNITS;

    #[test]
    fn every_measurement_unit_round_trips() {
        for unit in MEASUREMENT_UNITS {
            let parsed: MeasurementUnit = unit.parse().unwrap();
            assert_eq!(parsed.as_str(), *unit);
            assert_eq!(parsed.to_string(), *unit);
        }
    }

    #[test]
    fn unknown_measurement_unit_is_rejected() {
        assert!("cl".parse::<MeasurementUnit>().is_err());
        assert!("".parse::<MeasurementUnit>().is_err());
    }

    #[test]
    fn measurement_unit_serializes_as_its_label() {
        let value = serde_json::to_value(MeasurementUnit::Teaspoon).unwrap();
        assert_eq!(value, serde_json::json!("ч. л."));
    }

    #[test]
    fn subscribed_author_flattens_author_fields() {
        let entry = SubscribedAuthor {
            author: Author {
                id: 3,
                email: "chef@example.com".to_owned(),
                username: "chef".to_owned(),
                first_name: "Anna".to_owned(),
                last_name: "Petrova".to_owned(),
                is_subscribed: true,
            },
            recipes: vec![],
            recipes_count: 0,
        };

        let value = serde_json::to_value(entry).unwrap();
        assert_eq!(value["username"], "chef");
        assert_eq!(value["is_subscribed"], true);
        assert_eq!(value["recipes_count"], 0);
    }
}
