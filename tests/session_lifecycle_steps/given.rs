//! Given steps for session lifecycle BDD scenarios.

use super::world::{SessionWorld, run_async, server_info};
use eyre::WrapErr;
use parley::session::domain::ServerCapabilities;
use rstest_bdd_macros::given;

#[given("an open session")]
fn an_open_session(world: &mut SessionWorld) -> Result<(), eyre::Report> {
    let session = run_async(
        world
            .service
            .open(server_info(), ServerCapabilities::standard(true)),
    )
    .wrap_err("open session for scenario")?;
    world.session = Some(session);
    Ok(())
}
