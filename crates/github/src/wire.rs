//! Wire-format DTOs for the GitHub REST API.
//!
//! Only the fields ClassHub reads are declared; everything else in a
//! response is ignored.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct Membership {
    pub state: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Team {
    pub id: u64,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitRef {
    pub object: GitObject,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitObject {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Invitation {
    pub id: u64,
    pub login: Option<String>,
}
