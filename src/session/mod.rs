mod store;
mod types;

pub use store::SessionStore;
pub use types::{
    ActionOutcome, ActionState, ExecuteRequest, REJECTION_MESSAGE, Session, SessionAction,
};
