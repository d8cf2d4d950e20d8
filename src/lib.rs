mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod pagination;
    pub mod report;
    pub mod schema;
    pub mod validate;
}
mod authentication {
    pub mod permissions;
    pub mod session;
}
mod constants;

pub use authentication::*;
pub use constants::*;
pub use database::*;
pub use report::*;
