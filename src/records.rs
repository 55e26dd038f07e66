use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::slug::slugify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Planned,
    Ongoing,
    Completed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Planned => write!(f, "PLANNED"),
            Status::Ongoing => write!(f, "ONGOING"),
            Status::Completed => write!(f, "COMPLETED"),
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "PLANNED" => Ok(Status::Planned),
            "ONGOING" => Ok(Status::Ongoing),
            "COMPLETED" => Ok(Status::Completed),
            _ => Err(format!("unknown project status: {value}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub e_mail: String,
}

/// Release date of a product. "Planned" is a valid value, not a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released {
    Date(NaiveDate),
    Planned,
}

impl Serialize for Released {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Released::Date(date) => serializer.collect_str(&date.format("%Y-%m-%d")),
            Released::Planned => serializer.serialize_str("Planned"),
        }
    }
}

impl Released {
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if value.eq_ignore_ascii_case("planned") {
            return Some(Released::Planned);
        }
        match parse_calendar_date(value) {
            Some(date) => Some(Released::Date(date)),
            None => {
                tracing::warn!(value, "unparseable release date, treating as absent");
                None
            }
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Released::Date(date) => Some(*date),
            Released::Planned => None,
        }
    }
}

pub type Position = [f64; 2];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    Polygon(Vec<Vec<Position>>),
}

impl Geometry {
    /// Parses the JSON coordinate notation used in the product tables.
    ///
    /// `[x, y]` is a point and `[[[x, y], ...], ...]` a polygon whose first
    /// ring is the shell. Anything else, including the free-text
    /// "Multipolygon" marker, yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.starts_with("Multipolygon") {
            return None;
        }
        let raw: Value = match serde_json::from_str(value) {
            Ok(raw) => raw,
            Err(_) => {
                tracing::warn!(value, "malformed geometry, treating as absent");
                return None;
            }
        };
        match depth(&raw) {
            1 => position(&raw).map(Geometry::Point),
            3 => {
                let rings = raw
                    .as_array()?
                    .iter()
                    .map(|ring| ring.as_array()?.iter().map(position).collect::<Option<Vec<_>>>())
                    .collect::<Option<Vec<Vec<Position>>>>()?;
                Some(Geometry::Polygon(rings))
            }
            _ => None,
        }
    }

    /// `[min_x, min_y, max_x, max_y]`
    pub fn bbox(&self) -> [f64; 4] {
        let points: Vec<Position> = match self {
            Geometry::Point(point) => vec![*point],
            Geometry::Polygon(rings) => rings.iter().flatten().copied().collect(),
        };
        points.iter().fold(
            [f64::MAX, f64::MAX, f64::MIN, f64::MIN],
            |[min_x, min_y, max_x, max_y], [x, y]| {
                [min_x.min(*x), min_y.min(*y), max_x.max(*x), max_y.max(*y)]
            },
        )
    }
}

fn depth(value: &Value) -> usize {
    match value.as_array().and_then(|items| items.first()) {
        Some(first) => depth(first) + 1,
        None => 0,
    }
}

fn position(value: &Value) -> Option<Position> {
    let items = value.as_array()?;
    match items.as_slice() {
        [x, y, ..] => Some([x.as_f64()?, y.as_f64()?]),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub description: String,
    pub link: Option<String>,
    pub image: Option<String>,
}

impl Theme {
    pub fn key(&self) -> String {
        slugify(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub description: String,
    pub link: Option<String>,
    pub themes: Vec<String>,
}

impl Variable {
    pub fn key(&self) -> String {
        slugify(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EoMission {
    pub name: String,
    pub description: String,
    pub link: Option<String>,
}

impl EoMission {
    pub fn key(&self) -> String {
        slugify(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub status: Status,
    pub name: String,
    /// Short name. Products and processes reference projects by this value.
    pub title: String,
    pub description: String,
    pub website: String,
    pub consortium: Vec<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub technical_officer: Contact,
    #[serde(default)]
    pub themes: Vec<String>,
}

impl Project {
    pub fn key(&self) -> String {
        slugify(&self.title)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    #[default]
    Product,
    Benchmark,
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductKind::Product => write!(f, "Product"),
            ProductKind::Benchmark => write!(f, "Benchmark"),
        }
    }
}

/// A product or benchmark row. Benchmarks share every field with products.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Product {
    pub kind: ProductKind,
    pub id: String,
    pub title: String,
    pub description: String,
    pub project: String,
    pub variables: Vec<String>,
    pub themes: Vec<String>,
    pub access: String,
    pub website: Option<String>,
    pub notebook: Option<String>,
    pub doi: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub geometry: Option<Geometry>,
    pub region: Option<String>,
    pub released: Option<Released>,
    pub eo_missions: Vec<String>,
    pub keywords: Vec<String>,
    pub format: Option<String>,
    pub category: Option<String>,
    pub coordinate: Option<String>,
    pub spatial_resolution: Option<String>,
    pub temporal_resolution: Option<String>,
    pub collection: Option<String>,
    pub provider: Option<String>,
}

impl Product {
    pub fn key(&self) -> String {
        self.id.clone()
    }

    pub fn collection_key(&self) -> Option<&str> {
        self.collection
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Process {
    pub name: String,
    pub project: String,
    pub description: String,
    pub link: Option<String>,
    pub asset: Option<String>,
    pub released: Option<Released>,
    pub languages: Vec<String>,
}

impl Process {
    pub fn key(&self) -> String {
        slugify(&format!("{} {}", self.project, self.name))
    }
}

/// Synthetic parent standing in for every product that shares a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSegmentation {
    pub title: String,
    pub project: String,
    pub themes: Vec<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub geometry: Option<Geometry>,
    pub released: Option<Released>,
    pub region: Option<String>,
    pub variables: Vec<String>,
    pub eo_missions: Vec<String>,
}

impl ProductSegmentation {
    pub fn key(&self) -> String {
        self.title.clone()
    }
}

pub fn parse_list(value: &str, delimiter: char) -> Vec<String> {
    value
        .split(delimiter)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Start-of-day UTC timestamp for any date notation the tables use.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match parse_calendar_date(value) {
        Some(date) => Some(date.and_time(NaiveTime::MIN).and_utc()),
        None => {
            tracing::warn!(value, "unparseable date, treating as absent");
            None
        }
    }
}

fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(value) {
        return Some(stamp.date_naive());
    }
    for pattern in ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, pattern) {
            return Some(date);
        }
    }
    if let Some(prefix) = value.get(..10)
        && let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
    {
        return Some(date);
    }
    parse_decimal_date(value)
}

/// `YYYY`, `YYYY.M` (zero-based month) or `YYYY.M.D`.
pub fn parse_decimal_date(value: &str) -> Option<NaiveDate> {
    let parts = value
        .trim()
        .split('.')
        .map(|part| part.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?;
    match parts.as_slice() {
        [year] => NaiveDate::from_ymd_opt(i32::try_from(*year).ok()?, 1, 1),
        [year, month] => {
            NaiveDate::from_ymd_opt(i32::try_from(*year).ok()?, month.checked_add(1)?, 1)
        }
        [year, month, day] => NaiveDate::from_ymd_opt(i32::try_from(*year).ok()?, *month, *day),
        _ => None,
    }
}

/// DOI from either a bare identifier or a resolver URL.
pub fn parse_doi(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let path = match value.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path).unwrap_or(""),
        None => value,
    };
    (!path.is_empty()).then(|| path.to_string())
}
