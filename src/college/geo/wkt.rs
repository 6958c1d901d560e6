// SPDX-License-Identifier: MIT

//! Well-Known Text geometry parsing
//!
//! Accepts `POINT`, `LINESTRING`, `POLYGON`, `MULTIPOINT`, `MULTILINESTRING`
//! and `MULTIPOLYGON` in two dimensions, each optionally `EMPTY`, with an
//! optional `SRID=n;` prefix. Keywords are case-insensitive. Parsed values
//! render back as canonical WKT, e.g. `POINT(112.93 28.17)`.

use crate::error::AppError;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// `None` for `POINT EMPTY`
    Point(Option<Coord>),
    LineString(Vec<Coord>),
    Polygon(Vec<Vec<Coord>>),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
}

/// A validated WKT geometry
#[derive(Debug, Clone, PartialEq)]
pub struct Wkt {
    srid: Option<u32>,
    geometry: Geometry,
}

impl Wkt {
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let mut cursor = Cursor::new(input);
        let srid = cursor.srid()?;
        let geometry = cursor.geometry()?;
        cursor.skip_ws();
        if !cursor.at_end() {
            return Err(cursor.error("unexpected trailing input"));
        }
        Ok(Self { srid, geometry })
    }

    /// `POINT(lng lat)`
    pub fn point(lng: f64, lat: f64) -> Self {
        Self {
            srid: None,
            geometry: Geometry::Point(Some(Coord { x: lng, y: lat })),
        }
    }

    pub fn srid(&self) -> Option<u32> {
        self.srid
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn as_point(&self) -> Option<Coord> {
        match self.geometry {
            Geometry::Point(point) => point,
            _ => None,
        }
    }
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: &str) -> AppError {
        AppError::validation(format!("invalid WKT at offset {}: {}", self.pos, message))
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), AppError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c)))
        }
    }

    fn keyword(&mut self) -> String {
        self.skip_ws();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .to_ascii_uppercase()
    }

    fn srid(&mut self) -> Result<Option<u32>, AppError> {
        self.skip_ws();
        let start = self.pos;
        if self.keyword() != "SRID" {
            self.pos = start;
            return Ok(None);
        }
        self.expect('=')?;
        self.skip_ws();
        let digits_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[digits_start..self.pos].iter().collect();
        let srid = digits
            .parse::<u32>()
            .map_err(|_| self.error("expected SRID number"))?;
        self.expect(';')?;
        Ok(Some(srid))
    }

    /// True when the next keyword is `EMPTY` (consumed)
    fn empty(&mut self) -> bool {
        let start = self.pos;
        if self.keyword() == "EMPTY" {
            true
        } else {
            self.pos = start;
            false
        }
    }

    fn geometry(&mut self) -> Result<Geometry, AppError> {
        let tag = self.keyword();
        let geometry = match tag.as_str() {
            "POINT" => {
                if self.empty() {
                    Geometry::Point(None)
                } else {
                    self.expect('(')?;
                    let coord = self.coord()?;
                    self.expect(')')?;
                    Geometry::Point(Some(coord))
                }
            }
            "LINESTRING" => Geometry::LineString(self.or_empty(Self::line)?),
            "POLYGON" => Geometry::Polygon(self.or_empty(Self::polygon)?),
            "MULTIPOINT" => Geometry::MultiPoint(self.or_empty(Self::multi_point)?),
            "MULTILINESTRING" => {
                Geometry::MultiLineString(self.or_empty(|c| c.list(Self::line))?)
            }
            "MULTIPOLYGON" => Geometry::MultiPolygon(self.or_empty(|c| c.list(Self::polygon))?),
            "" => return Err(self.error("expected geometry type")),
            other => return Err(self.error(&format!("unsupported geometry type {}", other))),
        };
        Ok(geometry)
    }

    fn or_empty<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Vec<T>, AppError>,
    ) -> Result<Vec<T>, AppError> {
        if self.empty() {
            Ok(Vec::new())
        } else {
            parse(self)
        }
    }

    fn number(&mut self) -> Result<f64, AppError> {
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        match text.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            _ => Err(self.error("expected number")),
        }
    }

    fn coord(&mut self) -> Result<Coord, AppError> {
        let x = self.number()?;
        if !self.peek().is_some_and(char::is_whitespace) {
            return Err(self.error("expected whitespace between coordinates"));
        }
        let y = self.number()?;
        Ok(Coord { x, y })
    }

    /// `( item, item, ... )`
    fn list<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T, AppError>,
    ) -> Result<Vec<T>, AppError> {
        self.expect('(')?;
        let mut items = vec![item(self)?];
        while self.eat(',') {
            items.push(item(self)?);
        }
        self.expect(')')?;
        Ok(items)
    }

    fn line(&mut self) -> Result<Vec<Coord>, AppError> {
        let coords = self.list(Self::coord)?;
        if coords.len() < 2 {
            return Err(self.error("a line needs at least two points"));
        }
        Ok(coords)
    }

    fn ring(&mut self) -> Result<Vec<Coord>, AppError> {
        let coords = self.list(Self::coord)?;
        if coords.len() < 4 {
            return Err(self.error("a polygon ring needs at least four points"));
        }
        if coords.first() != coords.last() {
            return Err(self.error("polygon ring is not closed"));
        }
        Ok(coords)
    }

    fn polygon(&mut self) -> Result<Vec<Vec<Coord>>, AppError> {
        self.list(Self::ring)
    }

    /// Both `MULTIPOINT(1 2, 3 4)` and `MULTIPOINT((1 2), (3 4))`
    fn multi_point(&mut self) -> Result<Vec<Coord>, AppError> {
        self.list(|c| {
            if c.eat('(') {
                let coord = c.coord()?;
                c.expect(')')?;
                Ok(coord)
            } else {
                c.coord()
            }
        })
    }
}

struct Coords<'a>(&'a [Coord]);

impl fmt::Display for Coords<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{} {}", c.x, c.y)?;
        }
        write!(f, ")")
    }
}

fn write_group<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    each: impl Fn(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    write!(f, "(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        each(f, item)?;
    }
    write!(f, ")")
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (tag, empty) = match self {
            Geometry::Point(p) => ("POINT", p.is_none()),
            Geometry::LineString(v) => ("LINESTRING", v.is_empty()),
            Geometry::Polygon(v) => ("POLYGON", v.is_empty()),
            Geometry::MultiPoint(v) => ("MULTIPOINT", v.is_empty()),
            Geometry::MultiLineString(v) => ("MULTILINESTRING", v.is_empty()),
            Geometry::MultiPolygon(v) => ("MULTIPOLYGON", v.is_empty()),
        };
        if empty {
            return write!(f, "{} EMPTY", tag);
        }
        write!(f, "{}", tag)?;
        match self {
            Geometry::Point(Some(c)) => write!(f, "({} {})", c.x, c.y),
            Geometry::Point(None) => Ok(()),
            Geometry::LineString(line) | Geometry::MultiPoint(line) => {
                write!(f, "{}", Coords(line))
            }
            Geometry::Polygon(rings) | Geometry::MultiLineString(rings) => {
                write_group(f, rings, |f, ring| write!(f, "{}", Coords(ring)))
            }
            Geometry::MultiPolygon(polygons) => write_group(f, polygons, |f, rings| {
                write_group(f, rings, |f, ring| write!(f, "{}", Coords(ring)))
            }),
        }
    }
}

impl fmt::Display for Wkt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(srid) = self.srid {
            write!(f, "SRID={};", srid)?;
        }
        write!(f, "{}", self.geometry)
    }
}

impl FromStr for Wkt {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Wkt::parse(s)
    }
}

impl Serialize for Wkt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Wkt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Wkt::parse(&text).map_err(serde::de::Error::custom)
    }
}

impl ToSql for Wkt {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Wkt {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Wkt::parse(value.as_str()?).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
