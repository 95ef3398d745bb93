//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod app_user;
pub mod product;
pub mod role;
pub mod session;
pub mod user_role;

// Re-export specific types to avoid conflicts
pub use app_user::{Column as AppUserColumn, Entity as AppUser, Model as AppUserModel};
pub use product::{
    Column as ProductColumn, Entity as Product, Model as ProductModel, ProductType,
};
pub use role::{Column as IdentityRoleColumn, Entity as IdentityRole, Model as IdentityRoleModel};
pub use session::{Column as SessionColumn, Entity as Session, Model as SessionModel};
pub use user_role::{Column as UserRoleColumn, Entity as UserRole, Model as UserRoleModel};
