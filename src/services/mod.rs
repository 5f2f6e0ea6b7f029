// Directory services - business operations over the graph store

pub mod event_service;
pub mod user_service;
pub mod venue_service;

pub use event_service::{EventPatch, EventService, NewEvent};
pub use user_service::{NewUser, UserPatch, UserService};
pub use venue_service::{NewVenue, VenuePatch, VenueService};
