pub mod fragment;
pub mod health;
