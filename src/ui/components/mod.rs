pub mod chat_area;
pub mod connections;
pub mod feed_card;
pub mod input_bar;
pub mod login_form;
pub mod profile_form;
pub mod requests;
pub mod sidebar;
