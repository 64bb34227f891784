use serde::{Serialize, Deserialize};

/// Forward-pass mode, stated explicitly at every call site.
///
/// `Train` activates dropout; `Eval` makes every layer deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Train,
    Eval,
}

impl Mode {
    pub fn is_train(self) -> bool {
        self == Mode::Train
    }
}
