// src/handlers/mod.rs

pub mod auth;
pub mod exam_info;
pub mod exam_paper;
pub mod question;
pub mod topic;
