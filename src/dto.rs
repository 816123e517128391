use serde::Serialize;

/// Body of every boolean operation. `false` never says why.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

impl From<bool> for Ack {
    fn from(ok: bool) -> Self {
        Self { ok }
    }
}
