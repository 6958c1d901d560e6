// SPDX-License-Identifier: MIT

pub mod adk;
pub mod college;
pub mod config;
pub mod error;

pub use error::AppError;
