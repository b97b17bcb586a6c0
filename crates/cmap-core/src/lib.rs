//! cmap Core Types and Definitions
//!
//! This crate provides the foundational types shared by the cmap diagram
//! engine and its hosts. It includes:
//!
//! - **Geometry**: Points, sizes, bounds and the rounded-rectangle outline
//!   used to anchor links on shapes ([`geometry`] module)
//! - **Colors**: Color handling with CSS color support ([`color::Color`])

pub mod color;
pub mod geometry;
