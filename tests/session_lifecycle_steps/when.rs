//! When steps for session lifecycle BDD scenarios.

use super::world::{SessionWorld, run_async};
use eyre::WrapErr;
use mockable::DefaultClock;
use parley::session::domain::Implementation;
use rstest_bdd_macros::when;

#[when(r#"the client "{name}" initializes with protocol version "{version}""#)]
fn client_initializes(
    world: &mut SessionWorld,
    name: String,
    version: String,
) -> Result<(), eyre::Report> {
    let id = world.session()?.id();
    let result = run_async(world.service.initialize(
        id,
        Implementation::new(name, "1.0.0"),
        &version,
    ));
    match result {
        Ok(negotiated) => world.negotiated_version = Some(negotiated),
        Err(err) => world.last_error = Some(err),
    }
    Ok(())
}

#[when(r#"a conversation is created for model "{model}""#)]
fn conversation_created(world: &mut SessionWorld, model: String) -> Result<(), eyre::Report> {
    world
        .session()?
        .create_conversation(model, &DefaultClock)
        .wrap_err("create conversation on ready session")?;
    Ok(())
}

#[when("the session is closed")]
fn session_closed(world: &mut SessionWorld) -> Result<(), eyre::Report> {
    let id = world.session()?.id();
    run_async(world.service.close(id)).wrap_err("close session")?;
    Ok(())
}
