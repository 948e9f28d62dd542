pub mod orchestrator;
pub mod poller;
pub mod reader;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use orchestrator::ScrapeOrchestrator;
pub use poller::{wait_for_run, RunPhase};
pub use reader::CommentReader;
pub use traits::{ActorService, ApifyActorService};
