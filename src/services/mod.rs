pub mod events;
pub mod menu;
pub mod pages;
pub mod questionnaire;
pub mod session;
pub mod users;
