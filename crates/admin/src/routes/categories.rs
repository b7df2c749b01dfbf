//! Category management route handlers.
//!
//! Every change drops the cached category tree so the storefront
//! navigation picks it up on the next request through this client.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::Path,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tidewater_api::{Category, CategoryInput};
use tidewater_core::CategoryId;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::flash::Flash;
use crate::middleware::{Backend, RequireAdmin};
use crate::routes::{form_errors, non_blank, parse_optional, redirect_with};
use crate::views::{PageContext, SelectOption};

/// One row of the indented category table.
pub struct CategoryRow {
    pub depth: usize,
    pub category: Category,
}

/// Category tree template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub page: PageContext,
    pub rows: Vec<CategoryRow>,
}

/// Category form as posted.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub sort_order: String,
    /// Checkbox; present only when ticked.
    pub is_active: Option<String>,
}

impl CategoryForm {
    fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description.clone().unwrap_or_default(),
            parent_id: category
                .parent_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            sort_order: category.sort_order.to_string(),
            is_active: category.is_active.then(|| "on".to_string()),
        }
    }

    fn blank() -> Self {
        Self {
            sort_order: "0".to_string(),
            is_active: Some("on".to_string()),
            ..Self::default()
        }
    }

    /// Build the backend payload. A category cannot be its own parent.
    fn to_input(&self, editing: Option<CategoryId>) -> std::result::Result<CategoryInput, Vec<String>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Name is required".to_string());
        }
        let slug = self.slug.trim();
        if slug.is_empty() {
            errors.push("Slug is required".to_string());
        } else if !is_valid_slug(slug) {
            errors.push("Slug may only contain lowercase letters, digits and hyphens".to_string());
        }
        let parent_id =
            parse_optional::<i64>(&self.parent_id, "Parent", &mut errors).map(CategoryId::new);
        if parent_id.is_some() && parent_id == editing {
            errors.push("A category cannot be its own parent".to_string());
        }
        let sort_order = parse_optional::<i32>(&self.sort_order, "Sort order", &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(CategoryInput {
            name: self.name.trim().to_string(),
            slug: slug.to_string(),
            description: non_blank(&self.description),
            parent_id,
            sort_order,
            is_active: self.is_active.is_some(),
        })
    }
}

fn is_valid_slug(slug: &str) -> bool {
    slug.bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// New/edit category form template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub page: PageContext,
    pub title: String,
    pub action: String,
    pub category_id: Option<CategoryId>,
    pub form: CategoryForm,
    pub parents: Vec<SelectOption>,
    pub errors: Vec<String>,
}

/// Parent choices, leaving out the edited category and its descendants.
fn parent_options(
    tree: &[Category],
    editing: Option<CategoryId>,
    current: &str,
) -> Vec<SelectOption> {
    let mut options = Vec::new();
    let mut skip_below: Option<usize> = None;
    for (depth, category) in Category::flatten(tree) {
        if let Some(limit) = skip_below {
            if depth > limit {
                continue;
            }
            skip_below = None;
        }
        if Some(category.id) == editing {
            skip_below = Some(depth);
            continue;
        }
        options.push(SelectOption::new(
            category.id.to_string(),
            format!("{}{}", "- ".repeat(depth), category.name),
            Some(current),
        ));
    }
    options
}

async fn render_form(
    backend: &mut Backend,
    page: PageContext,
    category_id: Option<CategoryId>,
    form: CategoryForm,
    errors: Vec<String>,
) -> Result<Response> {
    let all = backend.api().all_categories().await;
    backend.save().await?;
    let parents = match all {
        Ok(all) => parent_options(&Category::nest(all), category_id, &form.parent_id),
        Err(e) if e.is_unauthenticated() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories");
            Vec::new()
        }
    };
    let (title, action) = match category_id {
        Some(id) => ("Edit category".to_string(), format!("/categories/{id}")),
        None => ("New category".to_string(), "/categories".to_string()),
    };
    Ok(CategoryFormTemplate {
        page,
        title,
        action,
        category_id,
        form,
        parents,
        errors,
    }
    .into_response())
}

/// Category tree, indented.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let result = backend.api().category_tree().await;
    backend.save().await?;
    let tree = result?;
    let rows = Category::flatten(&tree)
        .into_iter()
        .map(|(depth, category)| CategoryRow {
            depth,
            category: Category {
                children: Vec::new(),
                ..category.clone()
            },
        })
        .collect();
    Ok(CategoriesIndexTemplate { page, rows })
}

/// Blank category form.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn new(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
) -> Result<Response> {
    render_form(&mut backend, page, None, CategoryForm::blank(), Vec::new()).await
}

/// Create a category.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let input = match form.to_input(None) {
        Ok(input) => input,
        Err(errors) => return render_form(&mut backend, page, None, form, errors).await,
    };

    let result = backend.api().create_category(&input).await;
    backend.save().await?;
    match result {
        Ok(category) => {
            backend.client().invalidate_categories().await;
            tracing::info!(category_id = %category.id, "Category created");
            redirect_with(
                &backend,
                Flash::notice(format!("Category {} created", category.name)),
                "/categories",
            )
            .await
        }
        Err(e) if e.is_unauthenticated() => Err(e.into()),
        Err(e) => {
            let errors = form_errors(&e, "Could not create the category");
            render_form(&mut backend, page, None, form, errors).await
        }
    }
}

/// Edit form pre-filled from the backend.
#[instrument(skip_all, fields(admin_id = %admin.id, category_id = %id))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Path(id): Path<CategoryId>,
) -> Result<Response> {
    let result = backend.api().category(id).await;
    backend.save().await?;
    let category = result?;
    render_form(
        &mut backend,
        page,
        Some(id),
        CategoryForm::from_category(&category),
        Vec::new(),
    )
    .await
}

/// Update a category.
#[instrument(skip_all, fields(admin_id = %admin.id, category_id = %id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let input = match form.to_input(Some(id)) {
        Ok(input) => input,
        Err(errors) => return render_form(&mut backend, page, Some(id), form, errors).await,
    };

    let result = backend.api().update_category(id, &input).await;
    backend.save().await?;
    match result {
        Ok(_) => {
            backend.client().invalidate_categories().await;
            redirect_with(&backend, Flash::notice("Category updated"), "/categories").await
        }
        Err(e) if e.is_unauthenticated() => Err(e.into()),
        Err(e) => {
            let errors = form_errors(&e, "Could not update the category");
            render_form(&mut backend, page, Some(id), form, errors).await
        }
    }
}

/// Delete a category. The backend refuses categories that still have
/// children or products.
#[instrument(skip_all, fields(admin_id = %admin.id, category_id = %id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<CategoryId>,
) -> Result<Response> {
    let result = backend.api().delete_category(id).await;
    backend.save().await?;
    if result.is_ok() {
        backend.client().invalidate_categories().await;
    }
    let flash = Flash::from_result(result, "Category deleted", "Could not delete the category")?;
    redirect_with(&backend, flash, "/categories").await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tree() -> Vec<Category> {
        serde_json::from_str(
            r#"[
                {"id":1,"name":"Tops","slug":"tops","children":[
                    {"id":2,"parent_id":1,"name":"Shirts","slug":"shirts","children":[
                        {"id":3,"parent_id":2,"name":"Oxford","slug":"oxford"}]}]},
                {"id":4,"name":"Bags","slug":"bags"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parent_options_exclude_own_subtree() {
        let options = parent_options(&tree(), Some(CategoryId::new(2)), "1");
        let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["1", "4"]);
        assert!(options[0].selected);
    }

    #[test]
    fn test_parent_options_for_new_category() {
        let options = parent_options(&tree(), None, "");
        assert_eq!(options.len(), 4);
        assert_eq!(options[2].label, "- - Oxford");
    }

    #[test]
    fn test_category_form_validation() {
        let form = CategoryForm {
            name: "Shirts".to_string(),
            slug: "Shirts!".to_string(),
            parent_id: "2".to_string(),
            ..CategoryForm::blank()
        };
        let errors = form.to_input(Some(CategoryId::new(2))).unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Slug may only contain lowercase letters, digits and hyphens".to_string(),
                "A category cannot be its own parent".to_string(),
            ]
        );
    }

    #[test]
    fn test_category_form_to_input() {
        let form = CategoryForm {
            name: " Shirts ".to_string(),
            slug: "shirts".to_string(),
            parent_id: "1".to_string(),
            ..CategoryForm::blank()
        };
        let input = form.to_input(None).unwrap();
        assert_eq!(input.name, "Shirts");
        assert_eq!(input.parent_id, Some(CategoryId::new(1)));
        assert_eq!(input.sort_order, Some(0));
        assert!(input.is_active);
        assert!(input.description.is_none());
    }
}
