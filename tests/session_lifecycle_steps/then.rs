//! Then steps for session lifecycle BDD scenarios.

use super::world::SessionWorld;
use mockable::DefaultClock;
use parley::{
    conversation::domain::ConversationStatus,
    session::{domain::SessionError, services::SessionServiceError},
};
use rstest_bdd_macros::then;

#[then(r#"the session state is "{state}""#)]
fn session_state_is(world: &SessionWorld, state: String) -> Result<(), eyre::Report> {
    let actual = world.session()?.state();
    if actual.as_str() != state {
        return Err(eyre::eyre!("expected state '{state}', found '{actual}'"));
    }
    Ok(())
}

#[then("every conversation is closed")]
fn every_conversation_closed(world: &SessionWorld) -> Result<(), eyre::Report> {
    let conversations = world.session()?.list_conversations();
    if conversations.is_empty() {
        return Err(eyre::eyre!("scenario expected at least one conversation"));
    }
    if let Some(open) = conversations
        .iter()
        .find(|conversation| conversation.status() != ConversationStatus::Closed)
    {
        return Err(eyre::eyre!(
            "conversation {} is still {}",
            open.id(),
            open.status()
        ));
    }
    Ok(())
}

#[then("creating another conversation fails because the session is closed")]
fn creating_conversation_fails(world: &SessionWorld) -> Result<(), eyre::Report> {
    match world
        .session()?
        .create_conversation("claude-sonnet", &DefaultClock)
    {
        Err(SessionError::SessionClosed) => Ok(()),
        Err(other) => Err(eyre::eyre!("expected SessionClosed, got {other:?}")),
        Ok(_) => Err(eyre::eyre!("closed session accepted a conversation")),
    }
}

#[then(r#"a "{kind}" event was published"#)]
fn event_was_published(world: &SessionWorld, kind: String) -> Result<(), eyre::Report> {
    let published = world.publisher.published();
    if !published.iter().any(|event| event.kind().as_str() == kind) {
        return Err(eyre::eyre!(
            "no '{kind}' event among {} published events",
            published.len()
        ));
    }
    Ok(())
}

#[then("initialization fails because the session is already initialized")]
fn initialization_fails(world: &SessionWorld) -> Result<(), eyre::Report> {
    let error = world
        .last_error
        .as_ref()
        .ok_or_else(|| eyre::eyre!("expected an initialize error"))?;
    if !matches!(
        error,
        SessionServiceError::Session(SessionError::AlreadyInitialized { .. })
    ) {
        return Err(eyre::eyre!("expected AlreadyInitialized, got {error:?}"));
    }
    Ok(())
}

#[then(r#"the session client is "{name}""#)]
fn session_client_is(world: &SessionWorld, name: String) -> Result<(), eyre::Report> {
    let client = world
        .session()?
        .client_info()
        .ok_or_else(|| eyre::eyre!("session has no client info"))?;
    if client.name != name {
        return Err(eyre::eyre!("expected client '{name}', found '{}'", client.name));
    }
    Ok(())
}

#[then(r#"the negotiated protocol version is "{version}""#)]
fn negotiated_version_is(world: &SessionWorld, version: String) -> Result<(), eyre::Report> {
    match world.negotiated_version.as_deref() {
        Some(actual) if actual == version => Ok(()),
        other => Err(eyre::eyre!("expected version '{version}', found {other:?}")),
    }
}
