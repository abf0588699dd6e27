//! Domain types shared by the fare client, the reducers and the CLI.
//!
//! Choice enums serialize as the canonical names the fare service accepts
//! (`"Taxi"`, `"Morning"`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

macro_rules! choice {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Canonical name, as sent to the fare service
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),+
                }
            }

            /// Parse an exact canonical name
            #[must_use]
            pub fn from_canonical(value: &str) -> Option<Self> {
                match value {
                    $(stringify!($variant) => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice! {
    /// Vehicle class
    RideType {
        /// Two-wheeler
        Bike,
        /// Car
        Taxi,
    }
}

impl RideType {
    /// Lowercase name used by the smart prediction endpoint
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Bike => "bike",
            Self::Taxi => "taxi",
        }
    }
}

impl Default for RideType {
    fn default() -> Self {
        Self::Taxi
    }
}

choice! {
    /// Part of the day the ride starts in
    TimeOfDay { Morning, Afternoon, Evening, Night }
}

choice! {
    /// Working day or weekend
    DayType { Weekday, Weekend }
}

choice! {
    /// Coarse ride-request volume
    DemandLevel { Low, Medium, High }
}

choice! {
    /// Road traffic
    TrafficCondition { Light, Moderate, Heavy }
}

choice! {
    /// Weather at pickup
    WeatherCondition { Clear, Rainy, Cloudy }
}

/// Canonical fare request for the manual prediction endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidePayload {
    /// Vehicle class
    pub ride_type: RideType,
    /// Trip distance in kilometres
    pub distance: f64,
    /// Part of the day
    pub time_of_day: TimeOfDay,
    /// Weekday or weekend
    pub day_type: DayType,
    /// Demand the rider observed
    pub demand_level: DemandLevel,
    /// Traffic the rider observed
    pub traffic_condition: TrafficCondition,
    /// Weather the rider observed
    pub weather_condition: WeatherCondition,
    /// Pickup area, title cased
    pub pickup_zone: String,
}

/// Manual prediction response; other fields are ignored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualPredictResponse {
    /// Fare after surge
    pub final_fare: f64,
    /// Applied surge multiplier
    pub surge_multiplier: f64,
}

/// A latitude/longitude pair, `[lat, lon]` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Coordinates {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl Coordinates {
    /// Create a coordinate pair
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<(f64, f64)> for Coordinates {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<Coordinates> for (f64, f64) {
    fn from(coordinates: Coordinates) -> Self {
        (coordinates.latitude, coordinates.longitude)
    }
}

/// Request for the smart prediction endpoint
///
/// Missing coordinates are sent as `null`, never omitted; the service then
/// geocodes the text itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmartPredictRequest {
    /// Pickup text as typed or selected
    pub pickup: String,
    /// Drop text as typed or selected
    pub drop: String,
    /// Vehicle class, lowercase on the wire
    #[serde(serialize_with = "lowercase_ride_type")]
    pub ride_type: RideType,
    /// Coordinates of a selected pickup suggestion
    pub pickup_coords: Option<Coordinates>,
    /// Coordinates of a selected drop suggestion
    pub drop_coords: Option<Coordinates>,
}

fn lowercase_ride_type<S: Serializer>(ride_type: &RideType, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(ride_type.wire_name())
}

/// Conditions the fare service resolved for a smart request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideContext {
    /// Road distance
    pub distance_km: f64,
    /// Expected trip duration
    pub duration_min: f64,
    /// Weather label
    pub weather: String,
    /// Traffic label
    pub traffic: String,
    /// Demand label
    pub demand: String,
}

/// Human-readable impact of each condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareExplanation {
    /// Effect of traffic on the fare
    pub traffic_impact: String,
    /// Effect of weather on the fare
    pub weather_impact: String,
    /// Effect of demand on the fare
    pub demand_impact: String,
}

/// Smart prediction response; every field is required
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartPredictResponse {
    /// Fare before surge
    pub base_fare: f64,
    /// Fare after surge
    pub final_fare: f64,
    /// Applied surge multiplier
    pub surge_multiplier: f64,
    /// Resolved trip conditions
    pub context: RideContext,
    /// Per-condition explanations
    pub explanation: FareExplanation,
}

/// A committed smart-mode fare estimate
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// Fare before surge
    pub base_fare: f64,
    /// Fare after surge
    pub final_fare: f64,
    /// Applied surge multiplier
    pub surge_multiplier: f64,
    /// Road distance
    pub distance_km: f64,
    /// Expected trip duration
    pub duration_min: f64,
    /// Weather label
    pub weather: String,
    /// Traffic label
    pub traffic: String,
    /// Demand label
    pub demand: String,
    /// "How was this calculated" lines
    pub explanation: Vec<String>,
    /// Vehicle class the estimate was requested for
    pub ride_type: RideType,
    /// When the response arrived
    pub received_at: DateTime<Utc>,
}

impl PredictionResult {
    /// Build the displayed result from a service response
    #[must_use]
    pub fn from_response(
        response: SmartPredictResponse,
        ride_type: RideType,
        received_at: DateTime<Utc>,
    ) -> Self {
        let SmartPredictResponse {
            base_fare,
            final_fare,
            surge_multiplier,
            context,
            explanation,
        } = response;

        let lines = vec![
            format!(
                "Real Map Data: We calculated the exact road distance of {} km between the selected points.",
                context.distance_km
            ),
            format!(
                "Live Conditions: {} and {} were detected and factored into the price.",
                explanation.weather_impact, explanation.traffic_impact
            ),
            format!("Base Rate: Standard {ride_type} pricing model applied."),
        ];

        Self {
            base_fare,
            final_fare,
            surge_multiplier,
            distance_km: context.distance_km,
            duration_min: context.duration_min,
            weather: context.weather,
            traffic: context.traffic,
            demand: context.demand,
            explanation: lines,
            ride_type,
            received_at,
        }
    }
}

/// A manual-mode fare estimate
#[derive(Debug, Clone, PartialEq)]
pub struct ManualEstimate {
    /// Fare after surge
    pub fare: f64,
    /// Applied surge multiplier
    pub surge_multiplier: f64,
    /// Surge badge tier, taken from the demand the user selected
    pub demand_status: DemandLevel,
    /// When the response arrived
    pub estimated_at: DateTime<Utc>,
}

/// A place candidate from the place search service
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSuggestion {
    /// Full place name
    pub display_name: String,
    /// Parsed coordinates
    pub coordinates: Coordinates,
}

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// The user must fix the input
    Warning,
    /// A request failed
    Error,
}

/// A single message shown to the user (a toast)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity
    pub level: NotificationLevel,
    /// Fixed, friendly text
    pub message: String,
}

impl Notification {
    /// A warning notification
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }

    /// An error notification
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn smart_request_sends_null_coordinates() {
        let request = SmartPredictRequest {
            pickup: "MG Road".to_string(),
            drop: "Airport".to_string(),
            ride_type: RideType::Bike,
            pickup_coords: None,
            drop_coords: Some(Coordinates::new(12.97, 77.59)),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "pickup": "MG Road",
                "drop": "Airport",
                "ride_type": "bike",
                "pickup_coords": null,
                "drop_coords": [12.97, 77.59],
            })
        );
    }

    #[test]
    fn choices_use_canonical_names() {
        assert_eq!(serde_json::to_value(WeatherCondition::Cloudy).unwrap(), json!("Cloudy"));
        assert_eq!(TrafficCondition::from_canonical("Light"), Some(TrafficCondition::Light));
        assert_eq!(TrafficCondition::from_canonical("light"), None);
        assert_eq!(TimeOfDay::ALL.len(), 4);
    }

    #[test]
    fn smart_response_requires_context_and_explanation() {
        let partial = json!({ "base_fare": 100.0, "final_fare": 120.0, "surge_multiplier": 1.2 });
        assert!(serde_json::from_value::<SmartPredictResponse>(partial).is_err());
    }

    #[test]
    fn prediction_result_explains_the_fare() {
        let response = SmartPredictResponse {
            base_fare: 180.0,
            final_fare: 216.0,
            surge_multiplier: 1.2,
            context: RideContext {
                distance_km: 12.4,
                duration_min: 31.0,
                weather: "Rainy".to_string(),
                traffic: "Heavy".to_string(),
                demand: "High".to_string(),
            },
            explanation: FareExplanation {
                traffic_impact: "Heavy traffic".to_string(),
                weather_impact: "Rain".to_string(),
                demand_impact: "High demand".to_string(),
            },
        };

        let result = PredictionResult::from_response(response, RideType::Taxi, Utc::now());

        assert_eq!(result.distance_km, 12.4);
        assert_eq!(result.explanation.len(), 3);
        assert!(result.explanation[1].contains("Rain and Heavy traffic"));
        assert!(result.explanation[2].contains("Standard Taxi"));
    }
}
