pub mod kluctl;
pub mod views;
