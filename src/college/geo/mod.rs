// SPDX-License-Identifier: MIT

//! Geometry text and map services

pub mod amap;
pub mod wkt;

pub use amap::{strip_segments, AmapClient, GeoService, Geocode};
pub use wkt::{Coord, Geometry, Wkt};
