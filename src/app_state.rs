//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, currency::CurrencyCode, db::initialize, timezone::LedgerClock};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection.
    ///
    /// Writes to the ledger hold this lock for their whole transaction, so
    /// they are applied one at a time.
    pub db_connection: Arc<Mutex<Connection>>,

    /// Where "today" comes from, which decides which expenses have already happened.
    pub clock: LedgerClock,

    /// The currency given to expenses and recurring expenses entered without one.
    pub default_currency: CurrencyCode,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        clock: LedgerClock,
        default_currency: CurrencyCode,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            clock,
            default_currency,
        })
    }
}
