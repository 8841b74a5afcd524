pub mod page;
pub mod product;
pub mod user;

pub use page::{PageRequest, ProductPage};
pub use product::{NewProduct, Product, ProductUpdate};
pub use user::{validate_registration, User};
