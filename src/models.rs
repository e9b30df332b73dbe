// src/models.rs

pub mod auth;
pub mod gamification;
pub mod hierarchy;
pub mod team;
