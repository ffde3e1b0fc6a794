//! # quire-entity
//!
//! Domain entity models for the Quire publication backend. Every struct in
//! this crate is either a persisted row handed across a collaborator
//! boundary (drafts, articles, tags, asset maps) or a value object
//! travelling through the job queue. All entities derive `Debug`, `Clone`,
//! `Serialize`, `Deserialize`; queue rows additionally derive
//! `sqlx::FromRow`.

pub mod article;
pub mod asset;
pub mod draft;
pub mod job;
pub mod message;
pub mod notice;
pub mod search;
pub mod tag;
pub mod user;
