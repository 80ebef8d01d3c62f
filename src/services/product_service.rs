use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{CreateProductRequest, ProductList, RemoveImageRequest, UpdateProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products},
    error::{AppError, AppResult, unique_violation},
    lifecycle::{ProductStatus, ProductTransition},
    middleware::auth::{AuthUser, ensure_catalog_manager},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, contains_pattern, escape_like},
    state::AppState,
};

const BARCODE_TAKEN: &str = "barcode is already assigned to another product";

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Category).ilike(pattern)),
        );
    }

    if let Some(category) = query.category.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Category).ilike(escape_like(category)));
    }

    if let Some(status) = query.status {
        condition = condition.add(Column::Status.eq(status));
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt)
        .order_by_asc(Column::Id);

    let total = finder.clone().count(&state.orm).await?;

    let items = finder
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items, total },
        Some(meta),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Product::from)
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn find_by_barcode(state: &AppState, code: &str) -> AppResult<Product> {
    Products::find()
        .filter(Column::Barcode.eq(code.trim()))
        .one(&state.orm)
        .await?
        .map(Product::from)
        .ok_or(AppError::NotFound)
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_catalog_manager(user)?;
    let new = payload.validate()?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(new.name),
        description: Set(new.description),
        price: Set(new.price),
        category: Set(new.category),
        images: Set(new.images.into()),
        highlights: Set(new.highlights.into()),
        discount: Set(new.discount),
        status: Set(ProductStatus::Available),
        barcode: Set(new.barcode),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| unique_violation(err, BARCODE_TAKEN))?;

    tracing::info!(product_id = %product.id, "product created");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_catalog_manager(user)?;
    let changes = payload.validate()?;

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = changes.name {
        active.name = Set(name);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(price) = changes.price {
        active.price = Set(price);
    }
    if let Some(category) = changes.category {
        active.category = Set(category);
    }
    if let Some(images) = changes.images {
        active.images = Set(images.into());
    }
    if let Some(highlights) = changes.highlights {
        active.highlights = Set(highlights.into());
    }
    if let Some(discount) = changes.discount {
        active.discount = Set(discount);
    }
    if let Some(barcode) = changes.barcode {
        active.barcode = Set(barcode);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active
        .update(&state.orm)
        .await
        .map_err(|err| unique_violation(err, BARCODE_TAKEN))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

/// Orders keep their own copy of name and price, so nothing cascades. A
/// product reserved by an open order cannot be deleted.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_catalog_manager(user)?;
    let result = Products::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::Status.ne(ProductStatus::PendingShipment))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        let exists = Products::find_by_id(id).count(&state.orm).await? > 0;
        return Err(if exists {
            AppError::conflict("product is reserved by an open order")
        } else {
            AppError::NotFound
        });
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Removing a path that is not on the product is reported as `NotFound`.
pub async fn remove_image(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: RemoveImageRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_catalog_manager(user)?;
    let image_path = payload.image_path.trim();

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut images = Product::from(product.clone()).images;
    let index = images
        .iter()
        .position(|image| image == image_path)
        .ok_or(AppError::NotFound)?;
    images.remove(index);

    let mut active: ActiveModel = product.into();
    active.images = Set(images.into());
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_image_remove",
        "products",
        serde_json::json!({ "product_id": id, "image": image_path }),
    )
    .await;

    Ok(ApiResponse::success(
        "Image removed",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

/// Check-and-set on availability for every product in `ids`.
///
/// With `require_all`, every id must exist and be in `transition.from`. Without
/// it, products deleted from the catalog since the order was placed are
/// skipped, but every remaining one must still match. Any mismatch is a
/// `Conflict`; callers run this inside their transaction so nothing is applied.
pub async fn transition_products<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
    transition: ProductTransition,
    require_all: bool,
) -> AppResult<()> {
    debug_assert!(
        transition.from.can_transition_to(transition.to),
        "{:?} -> {:?} is not a product transition",
        transition.from,
        transition.to
    );
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(());
    }

    let existing = Products::find()
        .filter(Column::Id.is_in(ids.clone()))
        .count(conn)
        .await?;
    if require_all && existing != ids.len() as u64 {
        return Err(AppError::NotFound);
    }

    let result = Products::update_many()
        .col_expr(Column::Status, Expr::value(transition.to))
        .col_expr(Column::UpdatedAt, Expr::current_timestamp().into())
        .filter(Column::Id.is_in(ids.clone()))
        .filter(Column::Status.eq(transition.from))
        .exec(conn)
        .await?;

    if result.rows_affected != existing {
        tracing::warn!(
            expected = existing,
            affected = result.rows_affected,
            from = %transition.from,
            to = %transition.to,
            "product availability changed concurrently"
        );
        return Err(AppError::conflict(format!(
            "one or more products are no longer {}",
            transition.from
        )));
    }

    Ok(())
}
