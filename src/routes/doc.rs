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
    checkout::{StockWarning, SubmissionOutcome},
    dto::{
        auth::{LoginRequest, LoginResponse, SessionResponse},
        cart::{AddToCartRequest, CartView, UpdateQuantityRequest},
        orders::{OrderList, RejectOrderRequest, SubmissionView},
        products::{CreateProductRequest, PhotoUploadResponse, ProductList, UpdateProductRequest},
        wishlist::{AddWishlistRequest, WishlistList},
    },
    lifecycle::OrderStatus,
    models::{CartLine, Customer, Order, Product, WishlistEntry},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, health, orders, params, products, wishlist},
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
        auth::login,
        auth::logout,
        auth::session,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::upload_photo,
        cart::cart_view,
        cart::add_to_cart,
        cart::update_quantity,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::submit_order,
        orders::get_order,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::approve_order,
        admin::reject_order,
        admin::ship_order,
        admin::complete_order,
        admin::pending_wishlist,
        admin::mark_wishlist_notified,
        wishlist::add_to_wishlist,
        wishlist::list_wishlist,
        wishlist::remove_from_wishlist
    ),
    components(
        schemas(
            Product,
            CartLine,
            Customer,
            Order,
            OrderStatus,
            WishlistEntry,
            StockWarning,
            SubmissionOutcome,
            SubmissionView,
            CartView,
            AddToCartRequest,
            UpdateQuantityRequest,
            CreateProductRequest,
            UpdateProductRequest,
            PhotoUploadResponse,
            ProductList,
            OrderList,
            RejectOrderRequest,
            AddWishlistRequest,
            WishlistList,
            LoginRequest,
            LoginResponse,
            SessionResponse,
            params::Pagination,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<SubmissionView>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Session cart endpoints"),
        (name = "Orders", description = "Order submission and lookup"),
        (name = "Admin", description = "Back-office endpoints"),
        (name = "Auth", description = "Administrator authentication"),
        (name = "Wishlist", description = "Restock interest endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
