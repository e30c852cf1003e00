//! Records mirrored from the sheet: quotations, products and customers.

mod customer;
mod entity;
pub mod lenient;
mod product;
mod quotation;
mod validation;

pub use customer::Customer;
pub use entity::{new_id, Entity, EntityKind};
pub use product::Product;
pub use quotation::{Quotation, QuotationLineItem, QuotationStatus};
pub use validation::ValidationError;
