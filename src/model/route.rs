//! Route document and its embedded types
//!
//! A route is the unit of record: two named endpoints, an ordered stop
//! sequence, fare and timing details, community tips, and the reputation
//! metadata the verification state machine operates on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Geographic point (WGS84 degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Haversine distance in meters
    pub fn distance_m(&self, other: &Coordinates) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}

/// Named place, optionally geocoded. Used for endpoints and stops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coords: Option<Coordinates>,
}

/// Closed set of transport modes the directory covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportType {
    #[serde(rename = "Shared Auto")]
    SharedAuto,
    #[serde(rename = "Private Bus")]
    PrivateBus,
    #[serde(rename = "City Bus")]
    CityBus,
    #[serde(rename = "E-rickshaw")]
    ERickshaw,
}

impl TransportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportType::SharedAuto => "Shared Auto",
            TransportType::PrivateBus => "Private Bus",
            TransportType::CityBus => "City Bus",
            TransportType::ERickshaw => "E-rickshaw",
        }
    }

    /// Parse a query-string value; `all` and unknown values mean "no filter"
    pub fn parse_filter(value: &str) -> Option<TransportType> {
        match value {
            "Shared Auto" => Some(TransportType::SharedAuto),
            "Private Bus" => Some(TransportType::PrivateBus),
            "City Bus" => Some(TransportType::CityBus),
            "E-rickshaw" => Some(TransportType::ERickshaw),
            _ => None,
        }
    }
}

/// Vehicle body colors riders identify routes by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleColor {
    Green,
    Blue,
    Red,
    Yellow,
    White,
    Orange,
}

/// How locals recognize the vehicle: color plus nickname, optional number
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    pub color: VehicleColor,
    pub local_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fare {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub peak_hour_surcharge: f64,
    #[serde(default)]
    pub student_discount: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
    pub first_service: String,
    pub last_service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
}

/// Community annotation on a route. Append-only, ordered oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tip {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub text: String,
    pub votes: u32,
    pub created_at: DateTime<Utc>,
}

/// Verification lifecycle of a route.
///
/// `Flagged` is reserved for a future moderation trigger; nothing in the
/// vote path transitions into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteStatus {
    Pending,
    Verified,
    Flagged,
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStatus::Pending => "pending",
            RouteStatus::Verified => "verified",
            RouteStatus::Flagged => "flagged",
        }
    }

    pub fn parse(value: &str) -> Option<RouteStatus> {
        match value {
            "pending" => Some(RouteStatus::Pending),
            "verified" => Some(RouteStatus::Verified),
            "flagged" => Some(RouteStatus::Flagged),
            _ => None,
        }
    }
}

/// Reputation counters and verification status.
///
/// Invariant: `verified_votes <= upvotes`. Every upvote also counts toward
/// verification pressure, so the two move together on the up path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetadata {
    pub upvotes: u64,
    pub downvotes: u64,
    pub verified_votes: u64,
    pub status: RouteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_verified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: Uuid,
    pub from: Place,
    pub to: Place,
    pub transport_type: TransportType,
    pub identifier: Identifier,
    pub stops: Vec<Place>,
    pub fare: Fare,
    pub timings: Timings,
    pub tips: Vec<Tip>,
    pub metadata: RouteMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Route creation payload. Everything the client supplies; identity,
/// reputation metadata and tips are initialized server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoute {
    pub from: Place,
    pub to: Place,
    pub transport_type: TransportType,
    pub identifier: Identifier,
    #[serde(default)]
    pub stops: Vec<Place>,
    pub fare: Fare,
    pub timings: Timings,
}

impl NewRoute {
    /// Validate before any state is initialized. A failure here means
    /// nothing was written anywhere.
    pub fn validate(&self) -> Result<(), String> {
        if self.from.name.trim().is_empty() {
            return Err("from.name must not be empty".to_string());
        }
        if self.to.name.trim().is_empty() {
            return Err("to.name must not be empty".to_string());
        }
        if self.identifier.local_name.trim().is_empty() {
            return Err("identifier.localName must not be empty".to_string());
        }
        if self.fare.min < 0.0 || self.fare.max < 0.0 {
            return Err("fare bounds must be non-negative".to_string());
        }
        if self.fare.min > self.fare.max {
            return Err("fare.min must not exceed fare.max".to_string());
        }
        if self.fare.peak_hour_surcharge < 0.0 {
            return Err("fare.peakHourSurcharge must be non-negative".to_string());
        }
        if self.timings.first_service.trim().is_empty()
            || self.timings.last_service.trim().is_empty()
        {
            return Err("timings.firstService and timings.lastService are required".to_string());
        }
        for stop in &self.stops {
            if stop.name.trim().is_empty() {
                return Err("stop names must not be empty".to_string());
            }
        }
        Ok(())
    }
}
