use sea_orm::{ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    dto::addresses::AddressList,
    entity::addresses::{Column as AddrCol, Entity as Addresses, Model as AddressModel},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Resolve an address id, but only if it belongs to `user_id`.
pub async fn find_owned<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    address_id: Uuid,
) -> Result<Option<AddressModel>, DbErr> {
    Addresses::find()
        .filter(
            Condition::all()
                .add(AddrCol::Id.eq(address_id))
                .add(AddrCol::UserId.eq(user_id)),
        )
        .one(conn)
        .await
}

/// Default address first, then newest.
pub async fn list_for_user<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> Result<Vec<Address>, DbErr> {
    let items = Addresses::find()
        .filter(AddrCol::UserId.eq(user_id))
        .order_by_desc(AddrCol::IsDefault)
        .order_by_desc(AddrCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();
    Ok(items)
}

pub async fn list_addresses(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<AddressList>> {
    let items = list_for_user(&state.orm, user.user_id).await?;
    Ok(ApiResponse::success(
        "OK",
        AddressList { items },
        Some(Meta::empty()),
    ))
}
