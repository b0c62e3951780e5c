//! Typescope Core Types and Definitions
//!
//! This crate provides the foundational types shared by every Typescope crate:
//!
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Points, sizes and bounding boxes ([`geometry`] module)
//! - **Tweens**: Easing curves and interpolation ([`tween`] module)
//! - **Catalog**: The type catalog rendered as a graph ([`catalog`] module)
//! - **Introspection**: Predicates answering questions about catalog entities
//!   ([`introspection`] module)

pub mod catalog;
pub mod color;
pub mod geometry;
pub mod identifier;
pub mod introspection;
pub mod tween;
