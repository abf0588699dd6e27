//! Turns raw form selections into a canonical [`RidePayload`].
//!
//! Choice values are capitalized and matched against the service vocabulary.
//! Two values have no service equivalent and are remapped: traffic `low`
//! becomes [`TrafficCondition::Light`] and weather `foggy` becomes
//! [`WeatherCondition::Cloudy`]. The weather remap is lossy; the service
//! accepts no closer category.
//!
//! Normalizing an already normalized payload returns it unchanged.

use crate::error::NormalizeError;
use crate::types::{
    DayType, DemandLevel, RidePayload, RideType, TimeOfDay, TrafficCondition, WeatherCondition,
};

/// Form input as the user left it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRideInput {
    /// `bike` or `taxi`
    pub ride_type: Option<String>,
    /// Trip distance in kilometres
    pub distance_km: Option<f64>,
    /// `morning`, `afternoon`, `evening` or `night`
    pub time_of_day: Option<String>,
    /// `weekday` or `weekend`
    pub day_type: Option<String>,
    /// `low`, `medium` or `high`
    pub demand_level: Option<String>,
    /// `low`, `moderate` or `heavy`
    pub traffic_condition: Option<String>,
    /// `clear`, `rainy` or `foggy`
    pub weather_condition: Option<String>,
    /// Free-text pickup area
    pub pickup_zone: Option<String>,
}

impl RawRideInput {
    /// Whether every required field holds a non-blank value
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let filled = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());

        filled(&self.ride_type)
            && self.distance_km.is_some()
            && filled(&self.time_of_day)
            && filled(&self.day_type)
            && filled(&self.demand_level)
            && filled(&self.traffic_condition)
            && filled(&self.weather_condition)
            && filled(&self.pickup_zone)
    }
}

impl From<&RidePayload> for RawRideInput {
    fn from(payload: &RidePayload) -> Self {
        Self {
            ride_type: Some(payload.ride_type.to_string()),
            distance_km: Some(payload.distance),
            time_of_day: Some(payload.time_of_day.to_string()),
            day_type: Some(payload.day_type.to_string()),
            demand_level: Some(payload.demand_level.to_string()),
            traffic_condition: Some(payload.traffic_condition.to_string()),
            weather_condition: Some(payload.weather_condition.to_string()),
            pickup_zone: Some(payload.pickup_zone.clone()),
        }
    }
}

/// Normalize complete form input
///
/// # Errors
///
/// - [`NormalizeError::MissingField`] if a field is unset or blank
/// - [`NormalizeError::Unrecognized`] if a choice is outside its vocabulary
/// - [`NormalizeError::InvalidDistance`] if the distance is not positive
pub fn normalize(input: &RawRideInput) -> Result<RidePayload, NormalizeError> {
    let distance = input
        .distance_km
        .ok_or(NormalizeError::MissingField("distance"))?;
    if !distance.is_finite() || distance <= 0.0 {
        return Err(NormalizeError::InvalidDistance(distance));
    }

    Ok(RidePayload {
        ride_type: ride_type(required(&input.ride_type, "ride_type")?),
        distance,
        time_of_day: choice(
            required(&input.time_of_day, "time_of_day")?,
            "time_of_day",
            TimeOfDay::from_canonical,
            TimeOfDay::ALL,
        )?,
        day_type: choice(
            required(&input.day_type, "day_type")?,
            "day_type",
            DayType::from_canonical,
            DayType::ALL,
        )?,
        demand_level: choice(
            required(&input.demand_level, "demand_level")?,
            "demand_level",
            DemandLevel::from_canonical,
            DemandLevel::ALL,
        )?,
        traffic_condition: traffic(required(&input.traffic_condition, "traffic_condition")?)?,
        weather_condition: weather(required(&input.weather_condition, "weather_condition")?)?,
        pickup_zone: title_case(required(&input.pickup_zone, "pickup_zone")?),
    })
}

/// `bike` (any case) is [`RideType::Bike`]; anything else is a taxi
#[must_use]
pub fn ride_type(value: &str) -> RideType {
    if value.trim().eq_ignore_ascii_case("bike") {
        RideType::Bike
    } else {
        RideType::Taxi
    }
}

/// Upper-case the first character, leave the rest as is
///
/// ```
/// assert_eq!(farecast::normalize::capitalize("rainy"), "Rainy");
/// ```
#[must_use]
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Title-case every whitespace-separated word
///
/// Leading punctuation of a word is kept, its first letter or digit is
/// upper-cased and the rest lower-cased. Whitespace is preserved.
///
/// ```
/// assert_eq!(farecast::normalize::title_case("MG road area"), "Mg Road Area");
/// ```
#[must_use]
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            in_word = false;
            out.push(ch);
        } else if in_word {
            out.extend(ch.to_lowercase());
        } else if ch.is_alphanumeric() || ch == '_' {
            in_word = true;
            let mut upper = ch.to_uppercase();
            // Multi-character expansions (ß -> SS) would not be stable
            match (upper.next(), upper.next()) {
                (Some(single), None) => out.push(single),
                _ => out.push(ch),
            }
        } else {
            out.push(ch);
        }
    }

    out
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, NormalizeError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(NormalizeError::MissingField(field))
}

fn choice<T: Copy + std::fmt::Display>(
    raw: &str,
    field: &'static str,
    parse: fn(&str) -> Option<T>,
    all: &[T],
) -> Result<T, NormalizeError> {
    parse(&capitalize(raw))
        .or_else(|| all.iter().copied().find(|c| c.to_string().eq_ignore_ascii_case(raw)))
        .ok_or_else(|| NormalizeError::Unrecognized {
            field,
            value: raw.to_string(),
        })
}

fn traffic(raw: &str) -> Result<TrafficCondition, NormalizeError> {
    if raw.eq_ignore_ascii_case("low") {
        return Ok(TrafficCondition::Light);
    }
    choice(
        raw,
        "traffic_condition",
        TrafficCondition::from_canonical,
        TrafficCondition::ALL,
    )
}

fn weather(raw: &str) -> Result<WeatherCondition, NormalizeError> {
    if raw.eq_ignore_ascii_case("foggy") {
        return Ok(WeatherCondition::Cloudy);
    }
    choice(
        raw,
        "weather_condition",
        WeatherCondition::from_canonical,
        WeatherCondition::ALL,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input(traffic: &str, weather: &str) -> RawRideInput {
        RawRideInput {
            ride_type: Some("taxi".to_string()),
            distance_km: Some(5.0),
            time_of_day: Some("morning".to_string()),
            day_type: Some("weekday".to_string()),
            demand_level: Some("high".to_string()),
            traffic_condition: Some(traffic.to_string()),
            weather_condition: Some(weather.to_string()),
            pickup_zone: Some("mg road".to_string()),
        }
    }

    #[test]
    fn manual_form_normalizes_to_canonical_payload() {
        let payload = normalize(&input("heavy", "foggy")).unwrap();

        assert_eq!(
            payload,
            RidePayload {
                ride_type: RideType::Taxi,
                distance: 5.0,
                time_of_day: TimeOfDay::Morning,
                day_type: DayType::Weekday,
                demand_level: DemandLevel::High,
                traffic_condition: TrafficCondition::Heavy,
                weather_condition: WeatherCondition::Cloudy,
                pickup_zone: "Mg Road".to_string(),
            }
        );
    }

    #[test]
    fn low_traffic_is_light_and_fog_is_cloudy() {
        let payload = normalize(&input("low", "foggy")).unwrap();
        assert_eq!(payload.traffic_condition, TrafficCondition::Light);
        assert_eq!(payload.weather_condition, WeatherCondition::Cloudy);

        let payload = normalize(&input("LOW", "Foggy")).unwrap();
        assert_eq!(payload.traffic_condition, TrafficCondition::Light);
        assert_eq!(payload.weather_condition, WeatherCondition::Cloudy);
    }

    #[test]
    fn anything_but_bike_is_a_taxi() {
        assert_eq!(ride_type("bike"), RideType::Bike);
        assert_eq!(ride_type("Bike"), RideType::Bike);
        assert_eq!(ride_type("auto"), RideType::Taxi);
    }

    #[test]
    fn missing_fields_abort() {
        let mut raw = input("heavy", "clear");
        raw.day_type = None;
        assert_eq!(normalize(&raw), Err(NormalizeError::MissingField("day_type")));

        let mut raw = input("heavy", "clear");
        raw.pickup_zone = Some("   ".to_string());
        assert!(!raw.is_complete());
        assert_eq!(normalize(&raw), Err(NormalizeError::MissingField("pickup_zone")));
    }

    #[test]
    fn unknown_choices_and_bad_distances_are_rejected() {
        assert!(matches!(
            normalize(&input("gridlock", "clear")),
            Err(NormalizeError::Unrecognized { field: "traffic_condition", .. })
        ));

        let mut raw = input("heavy", "clear");
        raw.distance_km = Some(0.0);
        assert_eq!(normalize(&raw), Err(NormalizeError::InvalidDistance(0.0)));
    }

    #[test]
    fn title_case_lowers_the_rest_of_each_word() {
        assert_eq!(title_case("MG road area"), "Mg Road Area");
        assert_eq!(title_case("koramangala  5th block"), "Koramangala  5th Block");
        assert_eq!(title_case("(old) airport"), "(Old) Airport");
    }

    fn choice_of(values: &'static [&'static str]) -> impl Strategy<Value = String> {
        proptest::sample::select(values).prop_flat_map(|v| {
            prop_oneof![
                Just(v.to_string()),
                Just(v.to_uppercase()),
                Just(capitalize(v)),
            ]
        })
    }

    fn raw_input() -> impl Strategy<Value = RawRideInput> {
        (
            choice_of(&["bike", "taxi"]),
            1u32..=100,
            choice_of(&["morning", "afternoon", "evening", "night"]),
            choice_of(&["weekday", "weekend"]),
            choice_of(&["low", "medium", "high"]),
            choice_of(&["low", "light", "moderate", "heavy"]),
            choice_of(&["clear", "rainy", "foggy", "cloudy"]),
            "[a-zA-Z0-9 ]{0,12}[a-zA-Z][a-zA-Z0-9 ]{0,12}",
        )
            .prop_map(|(ride, half_km, time, day, demand, traffic, weather, zone)| RawRideInput {
                ride_type: Some(ride),
                distance_km: Some(f64::from(half_km) / 2.0),
                time_of_day: Some(time),
                day_type: Some(day),
                demand_level: Some(demand),
                traffic_condition: Some(traffic),
                weather_condition: Some(weather),
                pickup_zone: Some(zone),
            })
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(raw in raw_input()) {
            let once = normalize(&raw).unwrap();
            let twice = normalize(&RawRideInput::from(&once)).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn output_uses_canonical_vocabulary(raw in raw_input()) {
            let payload = normalize(&raw).unwrap();
            let json = serde_json::to_value(&payload).unwrap();

            prop_assert!(["Bike", "Taxi"].contains(&json["ride_type"].as_str().unwrap()));
            prop_assert!(["Light", "Moderate", "Heavy"].contains(&json["traffic_condition"].as_str().unwrap()));
            prop_assert!(["Clear", "Rainy", "Cloudy"].contains(&json["weather_condition"].as_str().unwrap()));
            prop_assert_eq!(title_case(&payload.pickup_zone), payload.pickup_zone.clone());
        }

        #[test]
        fn title_case_is_idempotent(text in "[\\p{L}\\p{N} .()'-]{0,24}") {
            let once = title_case(&text);
            prop_assert_eq!(title_case(&once), once);
        }
    }
}
