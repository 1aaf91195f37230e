//! Data transfer objects for the mugshop API.

pub mod query;
pub mod request;
pub mod response;
pub mod validation;

pub use query::{AuditListQuery, OrderListQuery, Pagination, ProductListQuery, UserListQuery};
pub use request::{
    ChangePasswordRequest, CreateOrderRequest, CreateProductRequest, CreateUserRequest,
    LoginRequest, RegisterRequest, UpdateOrderStatusRequest, UpdateProductRequest,
    UpdateProfileRequest, UpdateUserRequest,
};
pub use response::{HealthResponse, ListResponse, LoginResponse, MessageResponse, UserResponse};
pub use validation::ValidatedJson;
