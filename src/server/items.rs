use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::dto::{ItemsResponse, MessageResponse, SearchParams};
use crate::server::response::{ApiError, ServiceResultExt};
use crate::service::{ImageUpload, ItemUpdate, NewItem, UpdateOutcome};

/// Fields of a multipart item form. Every field is optional here; the
/// service decides which ones an operation requires.
#[derive(Debug, Default)]
struct ItemForm {
    name: Option<String>,
    category: Option<String>,
    image: Option<ImageUpload>,
}

async fn parse_item_form(multipart: &mut Multipart) -> Result<ItemForm, ApiError> {
    let mut form = ItemForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart: {e}")))?
    {
        match field.name() {
            Some("name") => {
                form.name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Failed to read name: {e}")))?,
                );
            }
            Some("category") => {
                form.category = Some(field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read category: {e}"))
                })?);
            }
            Some("image") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read image: {e}")))?;

                // Browsers send an empty part when no file was chosen.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }

                form.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

/// GET / - Liveness check
pub async fn hello() -> impl IntoResponse {
    Json(MessageResponse::new("Hello, world!"))
}

/// POST /items - Create an item from a multipart form
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = parse_item_form(&mut multipart).await?;

    let name = form
        .name
        .ok_or_else(|| ApiError::bad_request("name is required"))?;
    let category = form
        .category
        .ok_or_else(|| ApiError::bad_request("category is required"))?;
    let message = format!("item received: {name}");
    let subject = format!("name={name}");

    state
        .items
        .add_item(NewItem {
            name,
            category,
            image: form.image,
        })
        .await
        .api_err_for("Failed to add item", subject)?;

    Ok(Json(MessageResponse::new(message)))
}

/// GET /items - List every item
pub async fn list_items(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let items = state.items.list_items().api_err("Failed to list items")?;

    Ok::<_, ApiError>(Json(ItemsResponse { items }))
}

/// GET /items/{id} - Fetch one item
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let item = state
        .items
        .get_item(id)
        .api_err_for("Failed to get item", format!("id={id}"))?;

    Ok::<_, ApiError>(Json(item))
}

/// PATCH /items/{id} - Update the supplied fields of an item
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = parse_item_form(&mut multipart).await?;

    let outcome = state
        .items
        .update_item(
            id,
            ItemUpdate {
                name: form.name,
                category: form.category,
                image: form.image,
            },
        )
        .await
        .api_err_for("Failed to update item", format!("id={id}"))?;

    let message = match outcome {
        UpdateOutcome::Updated => format!("item updated: {id}"),
        UpdateOutcome::Unchanged => "no changes".to_string(),
    };

    Ok(Json(MessageResponse::new(message)))
}

/// DELETE /items/{id} - Delete an item and release its image
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .items
        .delete_item(id)
        .await
        .api_err_for("Failed to delete item", format!("id={id}"))?;

    Ok(Json(MessageResponse::new(format!("item deleted: {id}"))))
}

/// GET /search?keyword= - Items whose name or category contains the keyword
pub async fn search_items(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let keyword = params.keyword.unwrap_or_default();
    let items = state
        .items
        .search_items(&keyword)
        .api_err("Failed to search items")?;

    Ok::<_, ApiError>(Json(ItemsResponse { items }))
}
