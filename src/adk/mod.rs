// SPDX-License-Identifier: MIT

//! Agent development kit: models, tools and the agent loop

pub mod agent;
pub mod model;
pub mod tool;
