// src/models/mod.rs

pub mod answer;
pub mod exam_info;
pub mod question;
pub mod topic;
pub mod user;
