pub mod config;
pub mod error;
pub mod fsops;
pub mod organizer;
pub mod progress;
pub mod pruner;
pub mod trackers;

pub use config::{AppConfig, OrganizeConfig, OrganizeMode, PruneAction, PruneConfig, TrackerConfig};
pub use error::Error;
pub use organizer::{Organizer, OrganizeSummary};
pub use progress::{ProgressReporter, SilentReporter};
pub use pruner::{Pruner, PruneSummary};
pub use trackers::{ProbeOutcome, ProbeStatus, ProbeSummary, TrackerProber};
