// src/handlers.rs

pub mod auth;
pub mod courses;
pub mod gamification;
pub mod professors;
pub mod projects;
pub mod teams;
pub mod users;
