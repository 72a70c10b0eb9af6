use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::AddressList,
        cart::{AddToCartRequest, CartCount, CartItemUpdated, CartView, UpdateCartRequest},
        orders::{
            CommitOrderRequest, CommitOrderResult, OrderList, OrderWithLines,
            PaymentConfirmationRequest, PlaceOrderPreview, PlaceOrderRequest, ReviewEntry,
            ReviewRequest,
        },
        skus::{PriceUpdateRequest, RestockRequest, SkuList},
    },
    entity::order_headers::{OrderStatus, PaymentMethod},
    models::{Address, CartLineView, OrderHeader, OrderLine, OrderLineView, Sku},
    response::{ApiResponse, Meta},
    routes::{addresses, admin, cart, health, orders, params, skus},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        skus::list_skus,
        skus::get_sku,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::cart_count,
        addresses::list_addresses,
        orders::list_orders,
        orders::place_order,
        orders::commit_order,
        orders::get_order,
        orders::confirm_payment,
        orders::submit_review,
        admin::list_low_stock,
        admin::restock,
        admin::set_price
    ),
    components(
        schemas(
            Sku,
            Address,
            OrderHeader,
            OrderLine,
            OrderLineView,
            CartLineView,
            PaymentMethod,
            OrderStatus,
            SkuList,
            AddressList,
            CartView,
            CartCount,
            CartItemUpdated,
            AddToCartRequest,
            UpdateCartRequest,
            PlaceOrderRequest,
            PlaceOrderPreview,
            CommitOrderRequest,
            CommitOrderResult,
            PaymentConfirmationRequest,
            ReviewEntry,
            ReviewRequest,
            OrderWithLines,
            OrderList,
            RestockRequest,
            PriceUpdateRequest,
            params::Pagination,
            params::OrderListQuery,
            params::LowStockQuery,
            Meta,
            ApiResponse<Sku>,
            ApiResponse<SkuList>,
            ApiResponse<CartView>,
            ApiResponse<CommitOrderResult>,
            ApiResponse<OrderWithLines>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Catalog", description = "Sku catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Addresses", description = "Shipping address endpoints"),
        (name = "Orders", description = "Checkout and order endpoints"),
        (name = "Admin", description = "Inventory and pricing endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
