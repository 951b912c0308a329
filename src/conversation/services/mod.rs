//! Orchestration services for conversations.

mod turn;

pub use turn::{
    ConversationTurnError, ConversationTurnResult, ConversationTurnService, MAX_MODEL_ROUND_TRIPS,
    TurnOutcome,
};
