// SPDX-License-Identifier: MIT

//! The college information service: entities, storage, services, the
//! assistant and the HTTP routes in front of them

pub mod assistant;
pub mod auth;
pub mod entity;
pub mod geo;
pub mod server;
pub mod service;
pub mod store;
