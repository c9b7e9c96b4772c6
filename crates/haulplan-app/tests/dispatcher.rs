use async_trait::async_trait;
use chrono::Utc;
use haulplan_api::{
    CreateTripRequest, RawTripLeg, ReverseGeocodeResult, SearchResult, SvgLogsResponse,
    TripResponse,
};
use haulplan_app::{AppController, AppSettings, Dispatcher, FixedLocation, RevealState};
use haulplan_client::{ClientError, TripBackend};
use haulplan_core::{Coord, LegType, LocationRole, TripId};
use haulplan_events::Event;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Default)]
struct InMemoryBackend {
    created: Mutex<Vec<CreateTripRequest>>,
}

#[async_trait]
impl TripBackend for InMemoryBackend {
    async fn create_trip(&self, request: &CreateTripRequest) -> Result<TripResponse, ClientError> {
        self.created.lock().unwrap().push(request.clone());
        let leg = |leg_type, lat: f64| RawTripLeg {
            leg_type,
            start_lat: Some(lat),
            start_lon: Some(-76.0),
            duration_hours: Some(2.0),
            distance_miles: Some(100.0),
            ..Default::default()
        };
        Ok(TripResponse {
            id: 21,
            legs: vec![
                leg(LegType::Pickup, 40.0),
                leg(LegType::Drive, 40.5),
                leg(LegType::Dropoff, 41.0),
            ],
        })
    }

    async fn search(&self, _: &str) -> Result<Vec<SearchResult>, ClientError> {
        Ok(Vec::new())
    }

    async fn reverse(&self, coord: Coord) -> Result<ReverseGeocodeResult, ClientError> {
        Ok(ReverseGeocodeResult {
            display_name: Some(format!("Near {coord}")),
        })
    }

    async fn generate_svgs(&self, _: TripId) -> Result<(), ClientError> {
        Ok(())
    }

    async fn svg_logs(&self, _: TripId) -> Result<SvgLogsResponse, ClientError> {
        Ok(SvgLogsResponse {
            svg_urls: vec!["/media/logs/21/day1.svg".into()],
        })
    }

    async fn download_logs(&self, _: TripId) -> Result<Vec<u8>, ClientError> {
        Ok(b"%PDF-1.4".to_vec())
    }
}

fn settle(app: &mut AppController<Dispatcher>) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        app.pump(Instant::now());
        if !app.is_busy() {
            return;
        }
        assert!(Instant::now() < deadline, "app did not settle");
        std::thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn full_flow_through_tokio_dispatcher() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let backend = Arc::new(InMemoryBackend::default());
    let dispatcher = Dispatcher::new(runtime.handle().clone(), backend.clone())
        .with_geolocation(Arc::new(FixedLocation(Coord::new(39.0, -77.0))));
    let completions = dispatcher.completions();
    let settings = AppSettings {
        reveal_interval_ms: 1,
        ..AppSettings::default()
    };
    let mut app = AppController::new(settings, dispatcher, completions);

    app.open_picker(LocationRole::Current);
    assert!(app.use_device_location());
    settle(&mut app);

    for (role, lat) in [(LocationRole::Pickup, 40.0), (LocationRole::Dropoff, 41.0)] {
        app.open_picker(role);
        app.picker_moved(Coord::new(lat, -76.0));
        app.confirm_location();
        settle(&mut app);
    }
    assert!(app.planner().locations().is_complete());
    assert_eq!(
        app.planner().locations().current.as_ref().map(|p| p.label.as_str()),
        Some("Near 39.00000, -77.00000")
    );

    app.set_cycle_hours(8.0).unwrap();
    assert!(app.submit_trip(Utc::now()).unwrap());
    settle(&mut app);

    assert_eq!(backend.created.lock().unwrap().len(), 1);
    assert_eq!(app.view().reveal_state(), RevealState::Complete);
    assert_eq!(app.view().visible_legs().len(), 3);
    let summary = app.view().summary().unwrap();
    assert_eq!(summary.total_miles, 300.0);

    assert!(app.request_logs(TripId(21)));
    assert!(app.download_logs(TripId(21)));
    settle(&mut app);
    assert_eq!(app.logs().svg_urls().len(), 1);
    let pdf = app.take_pdf().unwrap();
    assert_eq!(pdf.file_name, "DailyLogs-21.pdf");

    let events: Vec<Event> = app.events().try_iter().collect();
    assert!(events.contains(&Event::RevealComplete { trip: TripId(21) }));
}
