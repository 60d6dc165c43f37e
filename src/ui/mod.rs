pub mod dashboard;
pub mod login;
pub mod table;
pub mod thread_view;
