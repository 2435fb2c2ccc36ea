//! Operations the UI calls, one request at a time, on behalf of a single user.
//!
//! Every operation validates its input, checks ownership, talks to storage through the
//! `database::db` functions and reports failures as [`ServiceError`](crate::error::ServiceError).

pub mod flashcards;
pub mod generation;
pub mod reviews;
pub mod statistics;

use rusqlite::Connection;

/// Per-request state: the connection to use and the user the request acts for.
#[derive(Clone, Copy)]
pub struct RequestContext<'a> {
    pub conn: &'a Connection,
    pub user_id: &'a str,
}

impl<'a> RequestContext<'a> {
    pub fn new(conn: &'a Connection, user_id: &'a str) -> Self {
        Self { conn, user_id }
    }
}
