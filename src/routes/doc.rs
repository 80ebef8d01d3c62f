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
        account::{
            AddressRequest, ChangePasswordRequest, PaymentMethodRequest, UpdateProfileRequest,
            UserLookup,
        },
        auth::{LoginRequest, LoginResponse, LoginUser, RegisterRequest},
        orders::{
            CreateOrderRequest, CustomerSnapshot, LineItemInput, OrderList, OrderWithItems,
            UpdateOrderStatusRequest,
        },
        pos::PosSaleRequest,
        products::{
            CreateProductRequest, ListInput, ProductList, RemoveImageRequest, UpdateProductRequest,
        },
        returns::{CreateReturnRequest, ReturnItemInput, ReturnList, UpdateReturnStatusRequest},
    },
    entity::users::UserRole,
    lifecycle::{OrderStatus, ProductStatus, ReturnStatus, SalesChannel},
    models::{Address, Order, OrderItem, PaymentMethod, Product, ReturnItem, ReturnTicket, User},
    response::{ApiResponse, Meta},
    routes::{
        account, admin, auth, health, orders, params, pos, products as product_routes, returns,
    },
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
        auth::register,
        product_routes::list_products,
        product_routes::get_product,
        product_routes::create_product,
        product_routes::update_product,
        product_routes::delete_product,
        product_routes::remove_image,
        orders::create_order,
        orders::get_order,
        orders::update_order_status,
        orders::cancel_order,
        orders::request_return,
        orders::list_customer_orders,
        returns::list_returns,
        returns::update_return_status,
        pos::list_sellable,
        pos::scan_barcode,
        pos::record_sale,
        account::get_profile,
        account::update_profile,
        account::change_password,
        account::list_addresses,
        account::add_address,
        account::update_address,
        account::delete_address,
        account::list_payment_methods,
        account::add_payment_method,
        account::update_payment_method,
        account::delete_payment_method,
        account::lookup_user,
        admin::list_all_orders,
        admin::get_order_admin
    ),
    components(
        schemas(
            User,
            UserRole,
            Product,
            ProductStatus,
            Order,
            OrderStatus,
            OrderItem,
            SalesChannel,
            ReturnTicket,
            ReturnItem,
            ReturnStatus,
            Address,
            PaymentMethod,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            LoginUser,
            ListInput,
            CreateProductRequest,
            UpdateProductRequest,
            RemoveImageRequest,
            ProductList,
            CustomerSnapshot,
            LineItemInput,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            OrderWithItems,
            OrderList,
            ReturnItemInput,
            CreateReturnRequest,
            UpdateReturnStatusRequest,
            ReturnList,
            PosSaleRequest,
            UpdateProfileRequest,
            ChangePasswordRequest,
            AddressRequest,
            PaymentMethodRequest,
            UserLookup,
            params::Pagination,
            params::SortOrder,
            params::ProductQuery,
            params::OrderListQuery,
            params::ReturnListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<ReturnTicket>,
            ApiResponse<ReturnList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Orders", description = "Order lifecycle endpoints"),
        (name = "Returns", description = "Return ticket endpoints"),
        (name = "Point of sale", description = "In-store till endpoints"),
        (name = "Account", description = "Profile, address book and saved cards"),
        (name = "Admin", description = "Staff order views"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
