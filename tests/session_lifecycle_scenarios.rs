//! Behaviour tests for session initialization and shutdown.

mod session_lifecycle_steps;

use rstest_bdd_macros::scenario;
use session_lifecycle_steps::world::{SessionWorld, world};

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Initialize, converse, and close a session"
)]
#[tokio::test(flavor = "multi_thread")]
async fn initialize_converse_and_close(world: SessionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Reject a second initialize"
)]
#[tokio::test(flavor = "multi_thread")]
async fn reject_second_initialize(world: SessionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Negotiate the latest version for an unknown request"
)]
#[tokio::test(flavor = "multi_thread")]
async fn negotiate_latest_version(world: SessionWorld) {
    let _ = world;
}
