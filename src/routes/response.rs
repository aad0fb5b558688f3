use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse {
    Health { status: &'static str },
    Ping { ok: bool },
}
