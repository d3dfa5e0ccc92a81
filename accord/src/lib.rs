pub mod aggregate;
pub mod clock;
pub mod collection;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod filter;
pub mod form;
pub mod money;
pub mod reports;
pub mod sample;
pub mod schema;
pub mod settings;
pub mod store;
pub mod surface;
pub mod validation;
pub mod view;

pub use clock::{Clock, FixedClock, SystemClock};
pub use collection::Collection;
pub use dashboard::Dashboard;
pub use error::{AccordError, Result};
pub use money::Money;
pub use schema::{ChurchData, Entity, Record, RecordId};
pub use settings::Settings;
pub use store::Store;
