//! Domain documents for the route directory
//!
//! Wire names (camelCase, e.g. `metadata.verifiedVotes`, `tips[].createdAt`)
//! are an external contract shared with existing clients and must not change.

mod contributor;
mod edit;
mod route;

pub use contributor::{Contributor, ContributorRole, ContributorStats};
pub use edit::{EditProposal, EditStatus, EditType, NewEdit};
pub use route::{
    Coordinates, Fare, Identifier, NewRoute, Place, Route, RouteMetadata, RouteStatus, Timings,
    Tip, TransportType, VehicleColor,
};
