use std::{collections::HashSet, str::FromStr};

use serde::Deserialize;

use crate::{
    error::{ActionError, DUPLICATE_INGREDIENT},
    schema::Id,
    RECIPE_NAME_MAX_LENGTH, USERNAME_MAX_LENGTH,
};

/// Query string parameters, keeping repeated keys.
pub struct Form {
    inner: Vec<(String, String)>,
}

impl Form {
    pub fn from_query(query: &str) -> Self {
        Self {
            inner: url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.inner
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.to_owned())
            .collect()
    }

    pub fn get_number<T>(&self, key: &str) -> Option<T>
    where
        T: FromStr,
    {
        self.get_str(key).and_then(|v| v.trim().parse().ok())
    }

    /// `1`/`true` and `0`/`false`; anything else counts as absent.
    pub fn get_flag(&self, key: &str) -> Option<bool> {
        match self.get_str(key)? {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<Id>,
    pub tags: Vec<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

impl From<&Form> for RecipeFilter {
    fn from(form: &Form) -> Self {
        Self {
            author: form.get_number("author"),
            tags: form
                .get_all("tags")
                .into_iter()
                .filter(|tag| !tag.is_empty())
                .collect(),
            is_favorited: form.get_flag("is_favorited"),
            is_in_shopping_cart: form.get_flag("is_in_shopping_cart"),
        }
    }
}

/// `recipes_limit`; missing, negative or non-numeric means no limit.
pub fn recipes_limit(form: &Form) -> Option<usize> {
    form.get_number("recipes_limit")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IngredientAmountForm {
    pub id: Id,
    pub amount: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    #[serde(default)]
    pub tags: Vec<Id>,
    pub ingredients: Vec<IngredientAmountForm>,
}

impl NewRecipe {
    pub fn validate(&self) -> Result<(), ActionError> {
        validate_name(&self.name)?;
        validate_cooking_time(self.cooking_time)?;
        validate_ingredients(&self.ingredients)
    }
}

/// Scalar fields left as `None` keep their stored value; tags and
/// ingredients always replace the stored sets.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    #[serde(default)]
    pub tags: Vec<Id>,
    pub ingredients: Vec<IngredientAmountForm>,
}

impl RecipeChanges {
    pub fn validate(&self) -> Result<(), ActionError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(cooking_time) = self.cooking_time {
            validate_cooking_time(cooking_time)?;
        }
        validate_ingredients(&self.ingredients)
    }
}

fn validate_name(name: &str) -> Result<(), ActionError> {
    if name.trim().is_empty() {
        return Err(ActionError::validation("Recipe name must not be empty"));
    }
    if name.chars().count() > RECIPE_NAME_MAX_LENGTH {
        return Err(ActionError::Validation(format!(
            "Recipe name must be at most {RECIPE_NAME_MAX_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_cooking_time(cooking_time: i32) -> Result<(), ActionError> {
    if cooking_time < 1 {
        return Err(ActionError::validation(
            "Cooking time must be at least 1 minute",
        ));
    }
    Ok(())
}

fn validate_ingredients(ingredients: &[IngredientAmountForm]) -> Result<(), ActionError> {
    if ingredients.iter().any(|ingredient| ingredient.amount < 1) {
        return Err(ActionError::validation("Amount must be at least 1"));
    }

    let mut seen = HashSet::with_capacity(ingredients.len());
    if !ingredients.iter().all(|ingredient| seen.insert(ingredient.id)) {
        return Err(ActionError::conflict(DUPLICATE_INGREDIENT));
    }

    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ActionError> {
        let username = self.username.as_str();
        if username.is_empty() || username.chars().count() > USERNAME_MAX_LENGTH {
            return Err(ActionError::Validation(format!(
                "Username must be between 1 and {USERNAME_MAX_LENGTH} characters"
            )));
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
        {
            return Err(ActionError::validation(
                "Username may only contain letters, digits and @/./+/-/_",
            ));
        }

        match self.email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => return Err(ActionError::validation("Invalid email address")),
        }

        if self.password.is_empty() {
            return Err(ActionError::validation("Password must not be empty"));
        }
        Ok(())
    }
}

/// Tag ids are a set; the first occurrence wins.
pub fn unique_ids(ids: &[Id]) -> Vec<Id> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
