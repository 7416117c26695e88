//! Sample route data for empty deployments
//!
//! Mirrors the hand-collected Asansol routes the project launched with.
//! Seeding is skipped entirely once the store holds any route.

use tracing::info;

use crate::directory::{DirectoryError, RouteDirectory};
use crate::model::{
    Coordinates, Fare, Identifier, NewRoute, Place, Timings, TransportType, VehicleColor,
};

fn place(name: &str, lat: f64, lng: f64) -> Place {
    Place {
        name: name.to_string(),
        coords: Some(Coordinates { lat, lng }),
    }
}

fn sample_routes() -> Vec<(NewRoute, Vec<&'static str>)> {
    vec![
        (
            NewRoute {
                from: place("Asansol Railway Station", 23.6831, 86.9826),
                to: place("Kazi Nazrul University", 23.7200, 87.1200),
                transport_type: TransportType::SharedAuto,
                identifier: Identifier {
                    color: VehicleColor::Green,
                    local_name: "University Auto".to_string(),
                    route_number: None,
                },
                stops: vec![
                    place("Burnpur Market", 23.6950, 87.0100),
                    place("IISCO Steel Plant", 23.7050, 87.0500),
                ],
                fare: Fare {
                    min: 20.0,
                    max: 25.0,
                    peak_hour_surcharge: 5.0,
                    student_discount: true,
                },
                timings: Timings {
                    first_service: "06:00".to_string(),
                    last_service: "21:00".to_string(),
                    frequency: Some("Every 10 mins".to_string()),
                },
            },
            vec!["Ask for 'KNU' not just 'University'"],
        ),
        (
            NewRoute {
                from: place("Asansol Bus Stand", 23.6850, 86.9750),
                to: place("Asansol Engineering College", 23.6890, 86.9280),
                transport_type: TransportType::CityBus,
                identifier: Identifier {
                    color: VehicleColor::Blue,
                    local_name: "College Bus".to_string(),
                    route_number: Some("12A".to_string()),
                },
                stops: vec![
                    place("Court More", 23.6840, 86.9600),
                    place("Kanyapur", 23.6870, 86.9450),
                ],
                fare: Fare {
                    min: 15.0,
                    max: 25.0,
                    peak_hour_surcharge: 0.0,
                    student_discount: true,
                },
                timings: Timings {
                    first_service: "05:30".to_string(),
                    last_service: "22:00".to_string(),
                    frequency: Some("Every 20 mins".to_string()),
                },
            },
            vec!["Front seats fill up at Court More during college hours"],
        ),
        (
            NewRoute {
                from: place("Murgasol", 23.6780, 86.9900),
                to: place("District Hospital", 23.6820, 87.0020),
                transport_type: TransportType::ERickshaw,
                identifier: Identifier {
                    color: VehicleColor::Yellow,
                    local_name: "Hospital Toto".to_string(),
                    route_number: None,
                },
                stops: vec![place("GT Road Crossing", 23.6800, 86.9960)],
                fare: Fare {
                    min: 10.0,
                    max: 15.0,
                    peak_hour_surcharge: 0.0,
                    student_discount: false,
                },
                timings: Timings {
                    first_service: "07:00".to_string(),
                    last_service: "20:00".to_string(),
                    frequency: Some("On demand".to_string()),
                },
            },
            vec!["Shared seating; say 'hospital gate' for the main entrance"],
        ),
    ]
}

/// Insert the sample routes if the store is empty. Returns how many routes
/// were created.
pub async fn seed_sample_routes(directory: &RouteDirectory) -> Result<usize, DirectoryError> {
    let stats = directory.stats().await?;
    if stats.total_routes > 0 {
        info!(
            existing = stats.total_routes,
            "Store already has routes, skipping seed data"
        );
        return Ok(0);
    }

    let samples = sample_routes();
    let mut created = 0;
    for (payload, tips) in samples {
        let route = directory.create_route(payload, None).await?;
        for tip in tips {
            directory.add_tip(route.id, tip.to_string(), None).await?;
        }
        created += 1;
    }

    info!(created, "Seeded sample routes");
    Ok(created)
}
