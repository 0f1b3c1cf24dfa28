pub mod error;
pub mod distance;
pub mod region;
pub mod types;

pub use error::{NearbyError, Result};
pub use distance::distance_km;
pub use region::ServiceRegion;
pub use types::*;
