// src/services.rs

pub mod auth;
pub mod gamification_service;
pub mod hierarchy_service;
pub mod professor_service;
pub mod team_service;
pub mod token;
pub mod user_service;
