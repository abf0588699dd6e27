//! Smart booking flows against the real store and in-memory services

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use farecast::config::Timings;
use farecast::location::LocationAction;
use farecast::mocks::{MockFareApi, MockPlaceSearch, place, smart_response};
use farecast::ride_status::{RideOutcome, RideStage};
use farecast::smart::{
    FAILURE_MESSAGE, FINALIZING, NARRATION, NARRATION_STEPS, SMART_REQUEST, SmartAction,
    SmartBookingReducer, SmartBookingState,
};
use farecast::types::{Notification, RideType};
use farecast::{BookingEnvironment, FareError};
use farecast_runtime::Store;
use farecast_testing::{init_test_tracing, test_clock};
use std::sync::Arc;
use std::time::Duration;

type SmartStore = Store<SmartBookingState, SmartAction, BookingEnvironment, SmartBookingReducer>;

fn store(fare_api: &MockFareApi, places: &MockPlaceSearch) -> SmartStore {
    init_test_tracing();
    let env = BookingEnvironment::new(
        Arc::new(fare_api.clone()),
        Arc::new(places.clone()),
        Arc::new(test_clock()),
        Timings::default(),
    );
    Store::new(SmartBookingState::default(), SmartBookingReducer::new(), env)
}

async fn fill(store: &SmartStore) {
    store
        .send(SmartAction::Pickup(LocationAction::TextChanged("MG Road".to_string())))
        .await
        .unwrap();
    store
        .send(SmartAction::Drop(LocationAction::TextChanged("Airport".to_string())))
        .await
        .unwrap();
}

async fn narration(store: &SmartStore) -> Option<&'static str> {
    store.state(|s| s.narration).await
}

#[tokio::test(start_paused = true)]
async fn narration_advances_until_the_response_then_settles() {
    let fare_api = MockFareApi::new().with_smart_reply(Duration::from_secs(3), Ok(smart_response(150.0, 1.2)));
    let store = store(&fare_api, &MockPlaceSearch::default());
    fill(&store).await;

    store.send(SmartAction::Submit).await.unwrap();
    assert_eq!(narration(&store).await, Some(NARRATION_STEPS[0]));

    tokio::time::sleep(Duration::from_millis(801)).await;
    assert_eq!(narration(&store).await, Some(NARRATION_STEPS[1]));

    tokio::time::sleep(Duration::from_millis(1600)).await;
    assert_eq!(narration(&store).await, Some(NARRATION_STEPS[3]));

    // Response at 3 s
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(narration(&store).await, Some(FINALIZING));
    assert_eq!(store.running_effects(&NARRATION), 0);
    assert!(store.state(|s| s.prediction.is_none()).await);

    // Settle delay ends at 3.6 s
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(narration(&store).await, Some(FINALIZING));

    tokio::time::sleep(Duration::from_millis(200)).await;
    let (loading, narration, fare) = store
        .state(|s| (s.loading, s.narration, s.prediction.as_ref().map(|p| p.final_fare)))
        .await;
    assert!(!loading);
    assert_eq!(narration, None);
    assert_eq!(fare, Some(180.0));
}

#[tokio::test(start_paused = true)]
async fn narration_stops_at_the_last_step() {
    let fare_api = MockFareApi::new().with_smart_reply(Duration::from_secs(30), Ok(smart_response(150.0, 1.2)));
    let store = store(&fare_api, &MockPlaceSearch::default());
    fill(&store).await;
    store.send(SmartAction::Submit).await.unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(narration(&store).await, Some(NARRATION_STEPS[NARRATION_STEPS.len() - 1]));
}

#[tokio::test(start_paused = true)]
async fn resubmitting_supersedes_the_running_prediction() {
    let fare_api = MockFareApi::new()
        .with_smart_reply(Duration::from_secs(3), Ok(smart_response(100.0, 1.0)))
        .with_smart_reply(Duration::from_secs(1), Ok(smart_response(200.0, 1.5)));
    let store = store(&fare_api, &MockPlaceSearch::default());
    fill(&store).await;

    store.send(SmartAction::Submit).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    store.send(SmartAction::Submit).await.unwrap();

    assert_eq!(store.running_effects(&NARRATION), 1);
    assert_eq!(store.running_effects(&SMART_REQUEST), 1);
    assert_eq!(narration(&store).await, Some(NARRATION_STEPS[0]));

    tokio::time::sleep(Duration::from_secs(5)).await;
    let result = store.state(|s| s.prediction.clone()).await.expect("committed");
    assert_eq!(result.base_fare, 200.0);
    assert_eq!(fare_api.smart_requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn failure_restores_the_previous_result() {
    let fare_api = MockFareApi::new()
        .with_smart_reply(Duration::ZERO, Ok(smart_response(150.0, 1.2)))
        .with_smart_reply(
            Duration::from_millis(100),
            Err(FareError::Status {
                status: 500,
                message: "Traceback (most recent call last)".to_string(),
            }),
        );
    let store = store(&fare_api, &MockPlaceSearch::default());
    fill(&store).await;

    store.send(SmartAction::Submit).await.unwrap();
    tokio::time::sleep(Duration::from_millis(700)).await;
    let first = store.state(|s| s.prediction.clone()).await.expect("committed");

    store.send(SmartAction::Submit).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(store.state(|s| s.prediction.is_none()).await);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let (loading, restored, notifications) = store
        .state(|s| (s.loading, s.prediction.clone(), s.notifications.clone()))
        .await;
    assert!(!loading);
    assert_eq!(restored, Some(first));
    assert_eq!(notifications, vec![Notification::error(FAILURE_MESSAGE)]);
    assert_eq!(store.running_effects(&NARRATION), 0);
}

#[tokio::test(start_paused = true)]
async fn selected_suggestions_send_coordinates() {
    let places = MockPlaceSearch::new(vec![
        place("MG Road, Bengaluru", 12.9756, 77.6066),
        place("Kempegowda International Airport", 13.1986, 77.7066),
    ]);
    let fare_api = MockFareApi::new();
    let store = store(&fare_api, &places);

    store.send(SmartAction::RideTypeSelected(RideType::Bike)).await.unwrap();
    store
        .send(SmartAction::Pickup(LocationAction::TextChanged("mg road".to_string())))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let first = store
        .state(|s| s.pickup.suggestions.first().cloned())
        .await
        .expect("suggestion loaded");
    store
        .send(SmartAction::Pickup(LocationAction::SuggestionSelected(first)))
        .await
        .unwrap();
    store
        .send(SmartAction::Drop(LocationAction::TextChanged("Airport".to_string())))
        .await
        .unwrap();
    store.send(SmartAction::Submit).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let requests = fare_api.smart_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].pickup, "MG Road, Bengaluru");
    assert!(requests[0].pickup_coords.is_some());
    assert_eq!(requests[0].drop_coords, None);
    assert_eq!(requests[0].ride_type, RideType::Bike);
    assert_eq!(places.queries(), vec!["mg road".to_string(), "Airport".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn confirming_runs_the_ride_lifecycle() {
    let fare_api = MockFareApi::new();
    let store = store(&fare_api, &MockPlaceSearch::default());
    fill(&store).await;

    store.send(SmartAction::ConfirmBooking).await.unwrap();
    assert_eq!(store.state(|s| s.ride.stage).await, None);

    store.send(SmartAction::Submit).await.unwrap();
    tokio::time::sleep(Duration::from_millis(700)).await;
    store.send(SmartAction::ConfirmBooking).await.unwrap();
    assert_eq!(store.state(|s| s.ride.stage).await, Some(RideStage::Booked));

    tokio::time::sleep(Duration::from_millis(4001)).await;
    assert_eq!(store.state(|s| s.ride.stage).await, Some(RideStage::Assigned));

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(store.state(|s| s.ride.outcome).await, Some(RideOutcome::Completed));
}
