mod entity_form;
mod entity_list;
mod quotation_detail;

pub use entity_form::EntityFormView;
pub use entity_list::EntityListView;
pub use quotation_detail::QuotationDetailView;
