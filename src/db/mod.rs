mod photos;
mod schema;

pub use photos::{NewPhoto, Photo};
pub use schema::Database;
