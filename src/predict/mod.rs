mod classifier;
mod error;
mod events;
mod observer;
mod pass_finder;
mod propagator;
mod satellite;
mod sequencer;
mod sun;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use classifier::VisibilityThresholds;
pub use error::PredictError;
pub use observer::Observer;
pub use pass_finder::{predict_passes, SearchOptions};
pub use propagator::{Propagator, Sgp4Propagator};
pub use satellite::Satellite;
pub use types::VisiblePass;
#[cfg(test)]
pub use types::{EventKind, RawEvent};

#[cfg(test)]
pub(crate) use satellite::fixtures;
